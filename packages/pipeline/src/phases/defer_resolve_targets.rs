//! Resolves the element targets named by interaction-style defer triggers.
//!
//! A trigger like "on interaction(btn)" names a template local reference.
//! The element it refers to may live in the trigger's own view, any ancestor
//! view, or inside the defer block's placeholder view; the search covers all
//! three, placeholder first, and records how many view hops separate the
//! trigger from its target.

use crate::compilation::{CompilationJob, CompilationUnit};
use crate::error::{CompileError, Result};
use crate::ir::handle::XrefId;
use crate::ir::ops::{CreateOp, DeferTrigger};

struct Resolution {
    unit: XrefId,
    op_index: usize,
    target_xref: XrefId,
    view_steps: i32,
}

pub fn resolve_defer_target_names(job: &mut CompilationJob) -> Result<()> {
    let mut resolutions = Vec::new();
    for (unit_xref, unit) in &job.units {
        for (op_index, op) in unit.create.iter().enumerate() {
            let (defer, trigger) = match op {
                CreateOp::DeferOn { defer, trigger, .. } => (*defer, trigger),
                _ => continue,
            };
            let target = match trigger {
                DeferTrigger::Hover(target)
                | DeferTrigger::Interaction(target)
                | DeferTrigger::Viewport(target) => target,
                _ => continue,
            };

            let placeholder = unit.create.iter().find_map(|other| match other {
                CreateOp::Defer {
                    xref,
                    placeholder_view,
                    ..
                } if *xref == defer => *placeholder_view,
                _ => None,
            });

            let mut found = None;
            if let Some(placeholder) = placeholder {
                if let Some(element) = find_local_ref(job.unit(placeholder)?, &target.name) {
                    found = Some((element, -1));
                }
            }
            if found.is_none() {
                for (steps, view) in job.ancestry(*unit_xref)?.into_iter().enumerate() {
                    if let Some(element) = find_local_ref(job.unit(view)?, &target.name) {
                        found = Some((element, steps as i32));
                        break;
                    }
                }
            }
            match found {
                Some((target_xref, view_steps)) => resolutions.push(Resolution {
                    unit: *unit_xref,
                    op_index,
                    target_xref,
                    view_steps,
                }),
                None => {
                    return Err(CompileError::UnresolvedDeferTarget {
                        name: target.name.clone(),
                    })
                }
            }
        }
    }

    for resolution in resolutions {
        let ops = &mut job.unit_mut(resolution.unit)?.create.ops;
        if let Some(CreateOp::DeferOn { trigger, .. }) = ops.get_mut(resolution.op_index) {
            if let DeferTrigger::Hover(target)
            | DeferTrigger::Interaction(target)
            | DeferTrigger::Viewport(target) = trigger
            {
                target.xref = Some(resolution.target_xref);
                target.view_steps = Some(resolution.view_steps);
            }
        }
    }
    Ok(())
}

fn find_local_ref(unit: &CompilationUnit, name: &str) -> Option<XrefId> {
    for op in unit.create.iter() {
        let (xref, local_refs) = match op {
            CreateOp::ElementStart {
                xref, local_refs, ..
            }
            | CreateOp::Template {
                xref, local_refs, ..
            } => (*xref, local_refs),
            _ => continue,
        };
        if local_refs.iter().any(|local_ref| local_ref.name == name) {
            return Some(xref);
        }
    }
    None
}
