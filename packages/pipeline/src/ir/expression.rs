//! Expression rewriting over operations.
//!
//! Phases that rewrite expressions (name resolution, pipe creation, slot
//! propagation, reification) all go through these walkers, so each phase only
//! states what it rewrites, not where expressions hide inside ops. Transforms
//! are post-order: children are rewritten before the callback sees the parent.

use crate::error::Result;
use crate::ir::ops::{CreateOp, UpdateOp};
use crate::output::{Expression, LiteralValue, RestoreViewTarget, Statement};
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VisitFlags: u8 {
        /// The expression lives inside a child operation (a listener's
        /// handler) rather than directly in the op being visited.
        const IN_CHILD_OPERATION = 1 << 0;
    }
}

/// Callback applied to every expression node, post-order.
pub type ExprTransform<'a> = &'a mut dyn FnMut(Expression, VisitFlags) -> Result<Expression>;

pub fn transform_expressions_in_expression(
    expr: Expression,
    f: ExprTransform<'_>,
    flags: VisitFlags,
) -> Result<Expression> {
    let expr = match expr {
        Expression::ReadProp { receiver, name } => Expression::ReadProp {
            receiver: Box::new(transform_expressions_in_expression(*receiver, f, flags)?),
            name,
        },
        Expression::Invoke { target, args, pure } => Expression::Invoke {
            target: Box::new(transform_expressions_in_expression(*target, f, flags)?),
            args: args
                .into_iter()
                .map(|arg| transform_expressions_in_expression(arg, f, flags))
                .collect::<Result<_>>()?,
            pure,
        },
        Expression::Binary { op, lhs, rhs } => Expression::Binary {
            op,
            lhs: Box::new(transform_expressions_in_expression(*lhs, f, flags)?),
            rhs: Box::new(transform_expressions_in_expression(*rhs, f, flags)?),
        },
        Expression::Conditional {
            test,
            then,
            otherwise,
        } => Expression::Conditional {
            test: Box::new(transform_expressions_in_expression(*test, f, flags)?),
            then: Box::new(transform_expressions_in_expression(*then, f, flags)?),
            otherwise: Box::new(transform_expressions_in_expression(*otherwise, f, flags)?),
        },
        Expression::LiteralArray(entries) => Expression::LiteralArray(
            entries
                .into_iter()
                .map(|entry| transform_expressions_in_expression(entry, f, flags))
                .collect::<Result<_>>()?,
        ),
        Expression::Function { name, params, body } => Expression::Function {
            name,
            params,
            body: body
                .into_iter()
                .map(|stmt| transform_expressions_in_statement(stmt, f, flags))
                .collect::<Result<_>>()?,
        },
        Expression::Arrow { params, body } => Expression::Arrow {
            params,
            body: Box::new(transform_expressions_in_expression(*body, f, flags)?),
        },
        Expression::RestoreView(RestoreViewTarget::Variable(inner)) => {
            Expression::RestoreView(RestoreViewTarget::Variable(Box::new(
                transform_expressions_in_expression(*inner, f, flags)?,
            )))
        }
        Expression::PipeBinding {
            target,
            target_slot,
            name,
            args,
        } => Expression::PipeBinding {
            target,
            target_slot,
            name,
            args: args
                .into_iter()
                .map(|arg| transform_expressions_in_expression(arg, f, flags))
                .collect::<Result<_>>()?,
        },
        leaf => leaf,
    };
    f(expr, flags)
}

pub fn transform_expressions_in_statement(
    stmt: Statement,
    f: ExprTransform<'_>,
    flags: VisitFlags,
) -> Result<Statement> {
    Ok(match stmt {
        Statement::Expression(expr) => {
            Statement::Expression(transform_expressions_in_expression(expr, f, flags)?)
        }
        Statement::Return(expr) => {
            Statement::Return(transform_expressions_in_expression(expr, f, flags)?)
        }
        Statement::If { condition, body } => Statement::If {
            condition: transform_expressions_in_expression(condition, f, flags)?,
            body: body
                .into_iter()
                .map(|stmt| transform_expressions_in_statement(stmt, f, flags))
                .collect::<Result<_>>()?,
        },
        Statement::DeclareVar { name, init } => Statement::DeclareVar {
            name,
            init: init
                .map(|init| transform_expressions_in_expression(init, f, flags))
                .transpose()?,
        },
        Statement::DeclareFn { name, params, body } => Statement::DeclareFn {
            name,
            params,
            body: body
                .into_iter()
                .map(|stmt| transform_expressions_in_statement(stmt, f, flags))
                .collect::<Result<_>>()?,
        },
    })
}

fn take(slot: &mut Expression) -> Expression {
    std::mem::replace(slot, Expression::Literal(LiteralValue::Null))
}

fn apply(slot: &mut Expression, f: ExprTransform<'_>, flags: VisitFlags) -> Result<()> {
    *slot = transform_expressions_in_expression(take(slot), f, flags)?;
    Ok(())
}

/// Rewrites every expression embedded in a create op.
///
/// Tracking expressions are deliberately not visited: they are closed over
/// their own `$index`/`$item` parameters and have a dedicated optimization
/// phase.
pub fn transform_expressions_in_create_op(op: &mut CreateOp, f: ExprTransform<'_>) -> Result<()> {
    match op {
        CreateOp::Listener { handler, .. } => {
            for handler_op in handler.iter_mut() {
                transform_expressions_in_update_op_with_flags(
                    handler_op,
                    f,
                    VisitFlags::IN_CHILD_OPERATION,
                )?;
            }
        }
        CreateOp::Defer { resolver_fn, .. } => {
            if let Some(resolver_fn) = resolver_fn {
                apply(resolver_fn, f, VisitFlags::empty())?;
            }
        }
        CreateOp::Variable(var) => apply(&mut var.initializer, f, VisitFlags::empty())?,
        CreateOp::Statement(stmt) => {
            let taken = std::mem::replace(stmt, Statement::Return(Expression::GetCurrentView));
            *stmt = transform_expressions_in_statement(taken, f, VisitFlags::empty())?;
        }
        CreateOp::ElementStart { .. }
        | CreateOp::ElementEnd { .. }
        | CreateOp::Text { .. }
        | CreateOp::Template { .. }
        | CreateOp::RepeaterCreate { .. }
        | CreateOp::Pipe { .. }
        | CreateOp::DeferOn { .. }
        | CreateOp::I18nMessage { .. } => {}
    }
    Ok(())
}

/// Rewrites every expression embedded in an update op.
pub fn transform_expressions_in_update_op(op: &mut UpdateOp, f: ExprTransform<'_>) -> Result<()> {
    transform_expressions_in_update_op_with_flags(op, f, VisitFlags::empty())
}

fn transform_expressions_in_update_op_with_flags(
    op: &mut UpdateOp,
    f: ExprTransform<'_>,
    flags: VisitFlags,
) -> Result<()> {
    match op {
        UpdateOp::Property { expression, .. } => apply(expression, f, flags)?,
        UpdateOp::InterpolateText { interpolation, .. } => {
            for expr in interpolation.expressions.iter_mut() {
                apply(expr, f, flags)?;
            }
        }
        UpdateOp::Conditional {
            test,
            conditions,
            processed,
            ..
        } => {
            if let Some(test) = test {
                apply(test, f, flags)?;
            }
            for case in conditions.iter_mut() {
                if let Some(expr) = &mut case.expr {
                    apply(expr, f, flags)?;
                }
            }
            if let Some(processed) = processed {
                apply(processed, f, flags)?;
            }
        }
        UpdateOp::Repeater { collection, .. } => apply(collection, f, flags)?,
        UpdateOp::DeferWhen { expr, .. } => apply(expr, f, flags)?,
        UpdateOp::Variable(var) => apply(&mut var.initializer, f, flags)?,
        UpdateOp::Statement(stmt) => {
            let taken = std::mem::replace(stmt, Statement::Return(Expression::GetCurrentView));
            *stmt = transform_expressions_in_statement(taken, f, flags)?;
        }
        UpdateOp::Advance { .. } => {}
    }
    Ok(())
}
