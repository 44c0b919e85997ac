//! Declares, per view, a variable for every name lexically visible in it.
//!
//! The visible set is propagated down the view tree: a child view sees its
//! own context variables, aliases, and local references, plus everything its
//! ancestors expose. Each view receives its own copies (fresh xrefs) because
//! a generated view function can only read variables declared in its own
//! body; cross-view access happens through the initializers, which read the
//! appropriate ancestor context.
//!
//! Declaration order is outermost scope first, so a reverse scan during name
//! resolution yields the innermost declaration (shadowing).

use crate::compilation::CompilationJob;
use crate::error::Result;
use crate::ir::handle::{SlotHandle, XrefId};
use crate::ir::ops::{CreateOp, UpdateOp, VariableOp};
use crate::ir::variable::SemanticVariable;
use crate::output::Expression;

#[derive(Clone)]
struct ScopeEntry {
    variable: SemanticVariable,
    initializer: Expression,
}

pub fn generate_variables(job: &mut CompilationJob) -> Result<()> {
    let root = job.root;
    process_view(job, root, &[])
}

fn process_view(job: &mut CompilationJob, xref: XrefId, inherited: &[ScopeEntry]) -> Result<()> {
    let unit = job.unit(xref)?;

    let mut own = Vec::new();
    if unit.parent.is_none() {
        // The component context itself, used as the resolution target for
        // names not declared anywhere in the template.
        own.push(ScopeEntry {
            variable: SemanticVariable::Context { view: xref },
            initializer: Expression::Context(xref),
        });
    }
    for (name, property) in &unit.context_variables {
        own.push(ScopeEntry {
            variable: SemanticVariable::Identifier { name: name.clone() },
            initializer: Expression::Context(xref).prop(property.clone()),
        });
    }
    for alias in &unit.aliases {
        own.push(ScopeEntry {
            variable: SemanticVariable::Alias {
                name: alias.name.clone(),
            },
            initializer: alias.expression.clone(),
        });
    }
    for op in unit.create.iter() {
        let (op_xref, local_refs) = match op {
            CreateOp::ElementStart {
                xref, local_refs, ..
            }
            | CreateOp::Template {
                xref, local_refs, ..
            } => (*xref, local_refs),
            _ => continue,
        };
        for (offset, local_ref) in local_refs.iter().enumerate() {
            own.push(ScopeEntry {
                variable: SemanticVariable::Identifier {
                    name: local_ref.name.clone(),
                },
                initializer: Expression::Reference {
                    target: op_xref,
                    target_slot: SlotHandle::new(),
                    offset,
                },
            });
        }
    }

    let mut visible = inherited.to_vec();
    visible.extend(own);

    let declarations = declare(job, &visible);
    job.unit_mut(xref)?.update.prepend(declarations);

    // Listener handlers are separate functions; they need their own copies,
    // inserted after the restored-context declaration if one is present.
    let listener_indices: Vec<usize> = job
        .unit(xref)?
        .create
        .iter()
        .enumerate()
        .filter(|(_, op)| matches!(op, CreateOp::Listener { .. }))
        .map(|(index, _)| index)
        .collect();
    for index in listener_indices {
        let copies = declare(job, &visible);
        if let Some(CreateOp::Listener { handler, .. }) =
            job.unit_mut(xref)?.create.ops.get_mut(index)
        {
            let insert_at = handler.iter().take_while(|op| restores_context(op)).count();
            handler.splice(insert_at..insert_at, copies);
        }
    }

    let children: Vec<XrefId> = job
        .units
        .values()
        .filter(|unit| unit.parent == Some(xref))
        .map(|unit| unit.xref)
        .collect();
    for child in children {
        process_view(job, child, &visible)?;
    }
    Ok(())
}

fn declare(job: &mut CompilationJob, entries: &[ScopeEntry]) -> Vec<UpdateOp> {
    entries
        .iter()
        .map(|entry| {
            UpdateOp::Variable(VariableOp {
                xref: job.allocate_xref(),
                variable: entry.variable.clone(),
                initializer: entry.initializer.clone(),
                name: None,
            })
        })
        .collect()
}

fn restores_context(op: &UpdateOp) -> bool {
    matches!(
        op,
        UpdateOp::Variable(var) if matches!(var.initializer, Expression::RestoreView(_))
    )
}
