//! Assigns data slots.
//!
//! Slots are allocated per view in final create-list order, densely from
//! zero, so slot numbers match emitted instruction order exactly. Multi-slot
//! ops (repeaters with their template and empty fallback, deferred blocks
//! with their sub-views, elements with local refs) reserve a contiguous run
//! whether or not every slot is reachable at runtime. A second pass pushes
//! the assigned numbers into every slot-addressed field and expression.

use crate::compilation::CompilationJob;
use crate::error::{CompileError, Result};
use crate::ir::expression::{
    transform_expressions_in_create_op, transform_expressions_in_update_op,
};
use crate::ir::handle::{SlotHandle, XrefId};
use crate::ir::ops::{CreateOp, DeferTrigger};
use crate::output::Expression;
use std::collections::HashMap;

pub fn allocate_slots(job: &mut CompilationJob) -> Result<()> {
    let mut slot_map = HashMap::new();
    assign(job, &mut slot_map);
    propagate(job, &slot_map)
}

fn assign(job: &mut CompilationJob, slot_map: &mut HashMap<XrefId, u32>) {
    for unit in job.units.values_mut() {
        let mut next = 0u32;
        for op in unit.create.iter_mut() {
            let (xref, handle, used) = match op {
                CreateOp::ElementStart {
                    xref,
                    local_refs,
                    handle,
                    ..
                } => {
                    let used = 1 + local_refs.len() as u32;
                    (*xref, handle, used)
                }
                CreateOp::Text { xref, handle, .. } => (*xref, handle, 1),
                CreateOp::Template {
                    xref,
                    local_refs,
                    handle,
                    ..
                } => {
                    let used = 1 + local_refs.len() as u32;
                    (*xref, handle, used)
                }
                CreateOp::RepeaterCreate {
                    xref,
                    empty_view,
                    handle,
                    ..
                } => {
                    let used = if empty_view.is_some() { 3 } else { 2 };
                    (*xref, handle, used)
                }
                CreateOp::Pipe { xref, handle, .. } => (*xref, handle, 1),
                CreateOp::Defer { xref, handle, .. } => {
                    // One slot for the block itself, one per sub-view.
                    (*xref, handle, 1)
                }
                _ => continue,
            };
            *handle = SlotHandle::with_slot(next);
            slot_map.insert(xref, next);

            // Declared views address the slots after their declaring op,
            // except a plain template, which shares its op's slot.
            let views = op.declared_views();
            let view_base = match op {
                CreateOp::Template { .. } => next,
                _ => next + 1,
            };
            for (index, view) in views.iter().enumerate() {
                slot_map.insert(*view, view_base + index as u32);
            }
            let used = match op {
                CreateOp::Defer { .. } => used + views.len() as u32,
                _ => used,
            };
            next += used;
        }
        unit.decls = Some(next);
    }
}

fn propagate(job: &mut CompilationJob, slot_map: &HashMap<XrefId, u32>) -> Result<()> {
    let mut fill = |expr: Expression, _| {
        Ok(match expr {
            Expression::Reference { target, offset, .. } => Expression::Reference {
                target,
                target_slot: handle_for(slot_map, target)?,
                offset,
            },
            Expression::SlotLiteral { target, .. } => Expression::SlotLiteral {
                target,
                target_slot: handle_for(slot_map, target)?,
            },
            Expression::PipeBinding {
                target: Some(pipe),
                name,
                args,
                ..
            } => Expression::PipeBinding {
                target: Some(pipe),
                target_slot: handle_for(slot_map, pipe)?,
                name,
                args,
            },
            other => other,
        })
    };

    for unit in job.units.values_mut() {
        for op in unit.create.iter_mut() {
            transform_expressions_in_create_op(op, &mut fill)?;
            if let CreateOp::DeferOn { trigger, .. } = op {
                if let DeferTrigger::Hover(target)
                | DeferTrigger::Interaction(target)
                | DeferTrigger::Viewport(target) = trigger
                {
                    if let Some(xref) = target.xref {
                        target.slot = handle_for(slot_map, xref)?;
                    }
                }
            }
        }
        for op in unit.update.iter_mut() {
            transform_expressions_in_update_op(op, &mut fill)?;
            if let crate::ir::ops::UpdateOp::Conditional { conditions, .. } = op {
                for case in conditions.iter_mut() {
                    case.target_slot = handle_for(slot_map, case.target)?;
                }
            }
        }
    }
    Ok(())
}

fn handle_for(slot_map: &HashMap<XrefId, u32>, xref: XrefId) -> Result<SlotHandle> {
    slot_map
        .get(&xref)
        .map(|slot| SlotHandle::with_slot(*slot))
        .ok_or(CompileError::MissingSlot(xref))
}

/// Rebuilds the xref-to-slot map from already-assigned handles, for phases
/// that run after allocation.
pub(crate) fn global_slot_map(job: &CompilationJob) -> HashMap<XrefId, u32> {
    let mut slot_map = HashMap::new();
    for unit in job.units.values() {
        for op in unit.create.iter() {
            let (xref, handle) = match op {
                CreateOp::ElementStart { xref, handle, .. }
                | CreateOp::Text { xref, handle, .. }
                | CreateOp::Template { xref, handle, .. }
                | CreateOp::RepeaterCreate { xref, handle, .. }
                | CreateOp::Pipe { xref, handle, .. }
                | CreateOp::Defer { xref, handle, .. } => (*xref, handle),
                _ => continue,
            };
            let slot = match handle.slot {
                Some(slot) => slot,
                None => continue,
            };
            slot_map.insert(xref, slot);
            let view_base = match op {
                CreateOp::Template { .. } => slot,
                _ => slot + 1,
            };
            for (index, view) in op.declared_views().iter().enumerate() {
                slot_map.insert(*view, view_base + index as u32);
            }
        }
    }
    slot_map
}
