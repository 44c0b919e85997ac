//! Inserts advance ops so the runtime's slot cursor is positioned on each
//! update instruction's target before it executes.
//!
//! The cursor starts at slot zero; consecutive updates against the same slot
//! need no advance, and updates never move the cursor backwards.
//!
//! Precondition: within each view, update ops arrive in nondecreasing target
//! slot order. The front end emits them in document order and no phase
//! reorders them, so a backwards target is a construction bug and fails the
//! compile with an assertion.

use crate::compilation::CompilationJob;
use crate::error::{CompileError, Result};
use crate::ir::handle::XrefId;
use crate::ir::ops::UpdateOp;
use crate::phases::slot_allocation::global_slot_map;

pub fn generate_advance(job: &mut CompilationJob) -> Result<()> {
    let slot_map = global_slot_map(job);
    let xrefs: Vec<XrefId> = job.units.keys().copied().collect();
    for xref in xrefs {
        let ops = job.unit_mut(xref)?.update.take();
        let mut result = Vec::with_capacity(ops.len());
        let mut cursor = 0u32;
        for op in ops {
            if let Some(target) = op.target() {
                let slot = *slot_map
                    .get(&target)
                    .ok_or(CompileError::MissingSlot(target))?;
                if slot > cursor {
                    result.push(UpdateOp::Advance {
                        delta: slot - cursor,
                    });
                    cursor = slot;
                } else if slot < cursor {
                    return Err(CompileError::Assertion(format!(
                        "update op targets slot {} behind cursor {}",
                        slot, cursor
                    )));
                }
            }
            result.push(op);
        }
        job.unit_mut(xref)?.update.ops = result;
    }
    Ok(())
}
