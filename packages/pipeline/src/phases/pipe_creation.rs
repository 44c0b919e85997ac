//! Creates a pipe op for every pipe invocation found in update expressions.
//!
//! Pipes are stateful runtime instances: each invocation site gets its own
//! create-time op (and therefore its own slot), appended to the owning
//! view's create list in first-use order. The binding expression is linked
//! to its op by xref; slot allocation later turns that into a slot address.

use crate::compilation::CompilationJob;
use crate::error::Result;
use crate::ir::expression::transform_expressions_in_update_op;
use crate::ir::handle::{SlotHandle, XrefId};
use crate::ir::ops::CreateOp;
use crate::output::Expression;

pub fn create_pipes(job: &mut CompilationJob) -> Result<()> {
    let xrefs: Vec<XrefId> = job.units.keys().copied().collect();
    for xref in xrefs {
        let mut ops = job.unit_mut(xref)?.update.take();
        let mut new_pipes: Vec<(XrefId, String)> = Vec::new();
        for op in ops.iter_mut() {
            transform_expressions_in_update_op(op, &mut |expr, _| {
                Ok(match expr {
                    Expression::PipeBinding {
                        target: None,
                        target_slot,
                        name,
                        args,
                    } => {
                        let pipe_xref = job.allocate_xref();
                        new_pipes.push((pipe_xref, name.clone()));
                        Expression::PipeBinding {
                            target: Some(pipe_xref),
                            target_slot,
                            name,
                            args,
                        }
                    }
                    other => other,
                })
            })?;
        }
        let unit = job.unit_mut(xref)?;
        unit.update.ops = ops;
        for (pipe_xref, name) in new_pipes {
            unit.create.push(CreateOp::Pipe {
                xref: pipe_xref,
                name,
                handle: SlotHandle::new(),
            });
        }
    }
    Ok(())
}
