//! Assigns final names to view functions and declared variables, and fills
//! the names into variable reads.
//!
//! View names encode the path from the component down through the declaring
//! ops, e.g. `MyComp_For_3_Template`; variable names append a job-wide
//! counter so shadowed declarations stay distinct in the output.

use crate::compilation::CompilationJob;
use crate::error::{CompileError, Result};
use crate::ir::expression::{
    transform_expressions_in_create_op, transform_expressions_in_update_op,
};
use crate::ir::handle::{SlotHandle, XrefId};
use crate::ir::ops::{CreateOp, UpdateOp, VariableOp};
use crate::ir::variable::SemanticVariable;
use crate::output::Expression;
use std::collections::{HashMap, VecDeque};

pub fn name_functions_and_variables(job: &mut CompilationJob) -> Result<()> {
    name_views(job)?;
    name_variables(job)
}

fn name_views(job: &mut CompilationJob) -> Result<()> {
    let suffix = job.fn_suffix();
    let root_name = format!("{}_{}", job.component_name, suffix);
    job.unit_mut(job.root)?.fn_name = Some(root_name);

    let mut queue = VecDeque::from([job.root]);
    while let Some(xref) = queue.pop_front() {
        let unit = job.unit(xref)?;
        let fn_name = unit
            .fn_name
            .clone()
            .ok_or(CompileError::UnnamedView(xref))?;
        let prefix = fn_name
            .strip_suffix(&format!("_{}", suffix))
            .unwrap_or(&fn_name)
            .to_owned();

        let mut named = Vec::new();
        for op in unit.create.iter() {
            match op {
                CreateOp::Template {
                    xref: op_xref,
                    view,
                    tag,
                    handle,
                    ..
                } => {
                    let label = tag.as_deref().map(sanitize).unwrap_or_else(|| "ng_template".to_owned());
                    named.push((*view, label, slot(handle, *op_xref)?));
                }
                CreateOp::RepeaterCreate {
                    xref: op_xref,
                    view,
                    empty_view,
                    handle,
                    ..
                } => {
                    let slot = slot(handle, *op_xref)?;
                    named.push((*view, "For".to_owned(), slot));
                    if let Some(empty) = empty_view {
                        named.push((*empty, "ForEmpty".to_owned(), slot));
                    }
                }
                CreateOp::Defer {
                    xref: op_xref,
                    main_view,
                    loading_view,
                    placeholder_view,
                    error_view,
                    handle,
                    ..
                } => {
                    let slot = slot(handle, *op_xref)?;
                    named.push((*main_view, "Defer".to_owned(), slot));
                    if let Some(view) = loading_view {
                        named.push((*view, "DeferLoading".to_owned(), slot));
                    }
                    if let Some(view) = placeholder_view {
                        named.push((*view, "DeferPlaceholder".to_owned(), slot));
                    }
                    if let Some(view) = error_view {
                        named.push((*view, "DeferError".to_owned(), slot));
                    }
                }
                _ => {}
            }
        }
        for (view, label, slot) in named {
            job.unit_mut(view)?.fn_name =
                Some(format!("{}_{}_{}_{}", prefix, label, slot, suffix));
            queue.push_back(view);
        }
    }
    Ok(())
}

fn name_variables(job: &mut CompilationJob) -> Result<()> {
    let mut names: HashMap<XrefId, String> = HashMap::new();
    let mut counter = 0u32;
    for unit in job.units.values_mut() {
        for op in unit.create.iter_mut() {
            match op {
                CreateOp::Variable(var) => assign(var, &mut counter, &mut names),
                CreateOp::Listener { handler, .. } => {
                    for handler_op in handler.iter_mut() {
                        if let UpdateOp::Variable(var) = handler_op {
                            assign(var, &mut counter, &mut names);
                        }
                    }
                }
                _ => {}
            }
        }
        for op in unit.update.iter_mut() {
            if let UpdateOp::Variable(var) = op {
                assign(var, &mut counter, &mut names);
            }
        }
    }

    let mut fill = |expr: Expression, _| {
        Ok(match expr {
            Expression::ReadVariable { xref, name: None } => Expression::ReadVariable {
                xref,
                name: names.get(&xref).cloned(),
            },
            other => other,
        })
    };
    for unit in job.units.values_mut() {
        for op in unit.create.iter_mut() {
            transform_expressions_in_create_op(op, &mut fill)?;
        }
        for op in unit.update.iter_mut() {
            transform_expressions_in_update_op(op, &mut fill)?;
        }
    }
    Ok(())
}

fn assign(var: &mut VariableOp, counter: &mut u32, names: &mut HashMap<XrefId, String>) {
    let name = match &var.variable {
        SemanticVariable::Context { .. } => format!("ctx_r{}", counter),
        SemanticVariable::Identifier { name } | SemanticVariable::Alias { name } => {
            format!("{}_r{}", sanitize(name), counter)
        }
        SemanticVariable::SavedView { .. } => format!("_r{}", counter),
    };
    *counter += 1;
    names.insert(var.xref, name.clone());
    var.name = Some(name);
}

fn slot(handle: &SlotHandle, xref: XrefId) -> Result<u32> {
    handle.slot.ok_or(CompileError::MissingSlot(xref))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
