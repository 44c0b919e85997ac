//! Assembles fully-lowered operation lists into per-view function
//! definitions.
//!
//! Every op must be a `Statement` by now; anything else means a phase failed
//! to lower it and emission aborts. Each view function takes a render-flag
//! integer and a context object, and guards its create and update blocks on
//! separate flag bits so one function serves both passes. Child views are
//! declared into the constant pool before their parent is built, since the
//! parent's create block refers to them by name.

use crate::compilation::CompilationJob;
use crate::error::{CompileError, Result};
use crate::ir::handle::XrefId;
use crate::ir::ops::{CreateOp, OpList, UpdateOp};
use crate::output::{int_lit, variable, BinaryOperator, Expression, Statement};

pub const RENDER_FLAG_CREATE: i64 = 1;
pub const RENDER_FLAG_UPDATE: i64 = 2;

/// Emits the root view function for a template job. Child view functions and
/// shared constants end up in the job's constant pool statements.
pub fn emit_template_function(job: &mut CompilationJob) -> Result<Expression> {
    declare_consts(job);
    let root = job.root;
    let (name, params, body) = emit_view(job, root)?;
    Ok(Expression::Function {
        name: Some(name),
        params,
        body,
    })
}

/// Emits the host binding function for a host job, or nothing when the job
/// produced no bindings at all.
pub fn emit_host_binding_function(job: &mut CompilationJob) -> Result<Option<Expression>> {
    declare_consts(job);
    let root = job.root;
    let unit = job.unit(root)?;
    if unit.create.is_empty() && unit.update.is_empty() {
        return Ok(None);
    }
    let (name, params, body) = emit_view(job, root)?;
    Ok(Some(Expression::Function {
        name: Some(name),
        params,
        body,
    }))
}

fn declare_consts(job: &mut CompilationJob) {
    for (index, expr) in job.consts.clone().into_iter().enumerate() {
        job.pool.push_statement(Statement::DeclareVar {
            name: format!("{}{}", crate::constant_pool::CONSTANT_PREFIX, index),
            init: Some(expr),
        });
    }
}

fn emit_view(job: &mut CompilationJob, xref: XrefId) -> Result<(String, Vec<String>, Vec<Statement>)> {
    // Depth-first: a child's declaration must precede its uses in the
    // parent's create block.
    let children: Vec<XrefId> = job
        .units
        .values()
        .filter(|unit| unit.parent == Some(xref))
        .map(|unit| unit.xref)
        .collect();
    for child in children {
        let (name, params, body) = emit_view(job, child)?;
        job.pool
            .push_statement(Statement::DeclareFn { name, params, body });
    }

    let unit = job.unit(xref)?;
    let fn_name = unit
        .fn_name
        .clone()
        .ok_or(CompileError::UnnamedView(xref))?;
    let create_stmts = collect_create(&unit.create)?;
    let update_stmts = collect_update(&unit.update)?;

    let mut body = Vec::new();
    if !create_stmts.is_empty() {
        body.push(guarded(RENDER_FLAG_CREATE, create_stmts));
    }
    if !update_stmts.is_empty() {
        body.push(guarded(RENDER_FLAG_UPDATE, update_stmts));
    }
    Ok((fn_name, vec!["rf".to_owned(), "ctx".to_owned()], body))
}

fn guarded(flag: i64, body: Vec<Statement>) -> Statement {
    Statement::If {
        condition: Expression::Binary {
            op: BinaryOperator::BitwiseAnd,
            lhs: Box::new(variable("rf")),
            rhs: Box::new(int_lit(flag)),
        },
        body,
    }
}

fn collect_create(ops: &OpList<CreateOp>) -> Result<Vec<Statement>> {
    ops.iter()
        .map(|op| match op {
            CreateOp::Statement(stmt) => Ok(stmt.clone()),
            other => Err(CompileError::NotLowered {
                kind: other.kind_name(),
            }),
        })
        .collect()
}

fn collect_update(ops: &OpList<UpdateOp>) -> Result<Vec<Statement>> {
    ops.iter()
        .map(|op| match op {
            UpdateOp::Statement(stmt) => Ok(stmt.clone()),
            other => Err(CompileError::NotLowered {
                kind: other.kind_name(),
            }),
        })
        .collect()
}
