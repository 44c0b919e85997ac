//! Resolves lexical reads, context references, and view restoration against
//! the variables declared by the earlier phases.
//!
//! Resolution is declaration-before-use: each list is walked in order and a
//! read only sees variables declared above it. Shadowing falls out of scan
//! direction: declarations are scanned innermost-last, so a reverse scan
//! returns the nearest one. Reads that match no declaration resolve to a
//! property read on the component context; reads that cannot reach any
//! context are a fatal compile error.

use crate::compilation::CompilationJob;
use crate::error::{CompileError, Result};
use crate::ir::expression::{
    transform_expressions_in_create_op, transform_expressions_in_update_op,
};
use crate::ir::handle::XrefId;
use crate::ir::ops::{CreateOp, UpdateOp, VariableOp};
use crate::ir::variable::SemanticVariable;
use crate::output::{Expression, RestoreViewTarget};

pub fn resolve_names(job: &mut CompilationJob) -> Result<()> {
    let xrefs: Vec<XrefId> = job.units.keys().copied().collect();
    for xref in xrefs {
        resolve_unit(job, xref)?;
    }
    Ok(())
}

fn resolve_unit(job: &mut CompilationJob, xref: XrefId) -> Result<()> {
    let root = job.root;
    // Ancestry chain, current view first; a view's position is the number of
    // context hops needed to reach it.
    let ancestry = job.ancestry(xref)?;

    // Saved views declared in this unit, for restore-view resolution.
    let saved_views: Vec<(XrefId, XrefId)> = job
        .unit(xref)?
        .create
        .iter()
        .filter_map(|op| match op {
            CreateOp::Variable(VariableOp {
                xref: var_xref,
                variable: SemanticVariable::SavedView { view },
                ..
            }) => Some((*view, *var_xref)),
            _ => None,
        })
        .collect();

    let mut update_ops = job.unit_mut(xref)?.update.take();
    let mut defs: Vec<(SemanticVariable, XrefId)> = Vec::new();
    for op in update_ops.iter_mut() {
        transform_expressions_in_update_op(op, &mut |expr, _| {
            resolve_expr(expr, &defs, &saved_views, &ancestry, root, false)
        })?;
        if let UpdateOp::Variable(var) = op {
            defs.push((var.variable.clone(), var.xref));
        }
    }
    job.unit_mut(xref)?.update.ops = update_ops;

    let mut create_ops = job.unit_mut(xref)?.create.take();
    for op in create_ops.iter_mut() {
        if let CreateOp::Listener { handler, .. } = op {
            let mut defs: Vec<(SemanticVariable, XrefId)> = Vec::new();
            for handler_op in handler.iter_mut() {
                transform_expressions_in_update_op(handler_op, &mut |expr, _| {
                    resolve_expr(expr, &defs, &saved_views, &ancestry, root, true)
                })?;
                if let UpdateOp::Variable(var) = handler_op {
                    defs.push((var.variable.clone(), var.xref));
                }
            }
        } else {
            transform_expressions_in_create_op(op, &mut |expr, _| {
                resolve_expr(expr, &[], &saved_views, &ancestry, root, false)
            })?;
        }
    }
    job.unit_mut(xref)?.create.ops = create_ops;
    Ok(())
}

fn read_def(var_xref: XrefId) -> Expression {
    Expression::ReadVariable {
        xref: var_xref,
        name: None,
    }
}

fn resolve_expr(
    expr: Expression,
    defs: &[(SemanticVariable, XrefId)],
    saved_views: &[(XrefId, XrefId)],
    ancestry: &[XrefId],
    root: XrefId,
    in_handler: bool,
) -> Result<Expression> {
    let current = ancestry[0];
    match expr {
        Expression::LexicalRead { name } => {
            for (variable, var_xref) in defs.iter().rev() {
                if variable.lexical_name() == Some(name.as_str()) {
                    return Ok(read_def(*var_xref));
                }
            }
            // Not declared anywhere: an implicit component property read.
            if current == root {
                return Ok(Expression::Context(root).prop(name));
            }
            for (variable, var_xref) in defs.iter().rev() {
                if matches!(variable, SemanticVariable::Context { view } if *view == root) {
                    return Ok(read_def(*var_xref).prop(name));
                }
            }
            Err(CompileError::UnresolvedReference { name })
        }
        Expression::Context(target) => {
            // Inside a handler the current view's context comes from the
            // restored-view variable, never from an enclosing `ctx` param.
            if !in_handler && target == current {
                return Ok(Expression::Context(target));
            }
            for (variable, var_xref) in defs.iter().rev() {
                if matches!(variable, SemanticVariable::Context { view } if *view == target) {
                    return Ok(read_def(*var_xref));
                }
            }
            if target == current {
                return Ok(Expression::Context(target));
            }
            match ancestry.iter().position(|view| *view == target) {
                Some(steps) => Ok(Expression::NextContext {
                    steps: steps as u32,
                }),
                None => Err(CompileError::UnknownView(target)),
            }
        }
        Expression::RestoreView(RestoreViewTarget::View(view)) => {
            for (saved_view, var_xref) in saved_views {
                if *saved_view == view {
                    return Ok(Expression::RestoreView(RestoreViewTarget::Variable(
                        Box::new(read_def(*var_xref)),
                    )));
                }
            }
            Err(CompileError::MissingSavedView(view))
        }
        other => Ok(other),
    }
}
