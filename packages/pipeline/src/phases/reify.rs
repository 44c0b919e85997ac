//! Lowers every remaining op and IR-only expression into plain statements
//! over runtime instruction calls. After this phase the operation lists
//! contain only `Statement` ops (emission checks that) and the expressions
//! contain no IR-only variants.

use crate::compilation::CompilationJob;
use crate::constant_pool::CONSTANT_PREFIX;
use crate::error::{CompileError, Result};
use crate::instruction::{call, call_expr, Instruction};
use crate::ir::expression::{transform_expressions_in_statement, VisitFlags};
use crate::ir::handle::{ConstIndex, SlotHandle, XrefId};
use crate::ir::ops::{CreateOp, DeferTrigger, DeferTriggerTarget, Interpolation, UpdateOp};
use crate::output::{
    int_lit, str_lit, variable, Expression, LiteralValue, RestoreViewTarget, Statement,
};

pub fn reify(job: &mut CompilationJob) -> Result<()> {
    let xrefs: Vec<XrefId> = job.units.keys().copied().collect();
    for xref in xrefs {
        reify_unit(job, xref)?;
    }
    Ok(())
}

fn reify_unit(job: &mut CompilationJob, xref: XrefId) -> Result<()> {
    let create_ops = job.unit_mut(xref)?.create.take();
    let mut new_create = Vec::with_capacity(create_ops.len());
    for op in create_ops {
        let stmt = match op {
            CreateOp::ElementStart {
                xref: op_xref,
                tag,
                handle,
                ..
            } => call(
                Instruction::ElementStart,
                vec![slot_arg(&handle, op_xref)?, str_lit(tag)],
            ),
            CreateOp::ElementEnd { .. } => call(Instruction::ElementEnd, vec![]),
            CreateOp::Text {
                xref: op_xref,
                initial_value,
                handle,
            } => call(
                Instruction::Text,
                vec![slot_arg(&handle, op_xref)?, str_lit(initial_value)],
            ),
            CreateOp::Template {
                xref: op_xref,
                view,
                tag,
                handle,
                ..
            } => {
                let mut args = vec![slot_arg(&handle, op_xref)?];
                args.extend(view_fn_args(job, view)?);
                args.push(tag.map(str_lit).unwrap_or_else(null));
                call(Instruction::Template, args)
            }
            CreateOp::RepeaterCreate {
                xref: op_xref,
                view,
                empty_view,
                tag,
                empty_tag,
                track_by_fn,
                uses_component_instance,
                handle,
                ..
            } => {
                let track_by_fn = track_by_fn.ok_or_else(|| {
                    CompileError::Assertion(
                        "repeater reached reification without a tracking function".to_owned(),
                    )
                })?;
                let mut args = vec![slot_arg(&handle, op_xref)?];
                args.extend(view_fn_args(job, view)?);
                args.push(tag.map(str_lit).unwrap_or_else(null));
                args.push(track_by_fn);
                if uses_component_instance {
                    args.push(Expression::Literal(LiteralValue::Bool(true)));
                }
                if let Some(empty) = empty_view {
                    args.extend(view_fn_args(job, empty)?);
                    args.push(empty_tag.map(str_lit).unwrap_or_else(null));
                }
                call(Instruction::RepeaterCreate, args)
            }
            CreateOp::Listener { name, handler, .. } => {
                let mut body = Vec::with_capacity(handler.len());
                for handler_op in handler {
                    body.push(reify_update_op(handler_op)?);
                }
                call(
                    Instruction::Listener,
                    vec![
                        str_lit(name),
                        Expression::Function {
                            name: None,
                            params: vec!["$event".to_owned()],
                            body,
                        },
                    ],
                )
            }
            CreateOp::Pipe {
                xref: op_xref,
                name,
                handle,
            } => call(
                Instruction::Pipe,
                vec![slot_arg(&handle, op_xref)?, str_lit(name)],
            ),
            CreateOp::Defer {
                xref: op_xref,
                main_view,
                loading_view,
                placeholder_view,
                error_view,
                resolver_fn,
                loading_config,
                placeholder_config,
                handle,
                ..
            } => {
                let mut args = vec![slot_arg(&handle, op_xref)?];
                args.extend(view_fn_args(job, main_view)?);
                args.push(resolver_fn.unwrap_or_else(null));
                args.push(opt_view_fn(job, loading_view)?);
                args.push(opt_view_fn(job, placeholder_view)?);
                args.push(opt_view_fn(job, error_view)?);
                args.push(const_arg(loading_config));
                args.push(const_arg(placeholder_config));
                call(Instruction::Defer, args)
            }
            CreateOp::DeferOn {
                trigger, prefetch, ..
            } => reify_defer_on(trigger, prefetch)?,
            CreateOp::Variable(var) => Statement::DeclareVar {
                name: var
                    .name
                    .ok_or(CompileError::UnnamedVariable(var.xref))?,
                init: Some(var.initializer),
            },
            leftover @ CreateOp::I18nMessage { .. } => {
                new_create.push(leftover);
                continue;
            }
            CreateOp::Statement(stmt) => stmt,
        };
        new_create.push(CreateOp::Statement(stmt));
    }

    let update_ops = job.unit_mut(xref)?.update.take();
    let mut new_update = Vec::with_capacity(update_ops.len());
    for op in update_ops {
        new_update.push(UpdateOp::Statement(reify_update_op(op)?));
    }

    // Final expression lowering over everything produced above.
    for op in new_create.iter_mut() {
        if let CreateOp::Statement(stmt) = op {
            lower_statement(stmt, xref)?;
        }
    }
    for op in new_update.iter_mut() {
        if let UpdateOp::Statement(stmt) = op {
            lower_statement(stmt, xref)?;
        }
    }

    let unit = job.unit_mut(xref)?;
    unit.create.ops = new_create;
    unit.update.ops = new_update;
    Ok(())
}

fn reify_update_op(op: UpdateOp) -> Result<Statement> {
    Ok(match op {
        UpdateOp::Advance { delta } => call(Instruction::Advance, vec![int_lit(delta as i64)]),
        UpdateOp::Property {
            name, expression, ..
        } => call(Instruction::Property, vec![str_lit(name), expression]),
        UpdateOp::InterpolateText { interpolation, .. } => reify_interpolation(interpolation),
        UpdateOp::Conditional { processed, .. } => {
            let processed = processed.ok_or_else(|| {
                CompileError::Assertion(
                    "conditional reached reification without being processed".to_owned(),
                )
            })?;
            call(Instruction::Conditional, vec![processed])
        }
        UpdateOp::Repeater { collection, .. } => call(Instruction::Repeater, vec![collection]),
        UpdateOp::DeferWhen { prefetch, expr, .. } => {
            let instruction = if prefetch {
                Instruction::DeferPrefetchWhen
            } else {
                Instruction::DeferWhen
            };
            call(instruction, vec![expr])
        }
        UpdateOp::Variable(var) => Statement::DeclareVar {
            name: var
                .name
                .ok_or(CompileError::UnnamedVariable(var.xref))?,
            init: Some(var.initializer),
        },
        UpdateOp::Statement(stmt) => stmt,
    })
}

fn reify_interpolation(interpolation: Interpolation) -> Statement {
    let Interpolation {
        strings,
        expressions,
    } = interpolation;
    if expressions.len() == 1 && strings.iter().all(String::is_empty) {
        let mut expressions = expressions;
        let expr = expressions.remove(0);
        return call(Instruction::TextInterpolate(0), vec![expr]);
    }
    let count = expressions.len();
    let mut args = Vec::with_capacity(count * 2 + 1);
    let mut strings = strings.into_iter();
    args.push(str_lit(strings.next().unwrap_or_default()));
    for expr in expressions {
        args.push(expr);
        args.push(str_lit(strings.next().unwrap_or_default()));
    }
    call(Instruction::TextInterpolate(count), args)
}

fn reify_defer_on(trigger: DeferTrigger, prefetch: bool) -> Result<Statement> {
    let (instruction, args) = match (trigger, prefetch) {
        (DeferTrigger::Idle, false) => (Instruction::DeferOnIdle, vec![]),
        (DeferTrigger::Idle, true) => (Instruction::DeferPrefetchOnIdle, vec![]),
        (DeferTrigger::Immediate, false) => (Instruction::DeferOnImmediate, vec![]),
        (DeferTrigger::Immediate, true) => (Instruction::DeferPrefetchOnImmediate, vec![]),
        (DeferTrigger::Timer { delay_ms }, false) => {
            (Instruction::DeferOnTimer, vec![int_lit(delay_ms as i64)])
        }
        (DeferTrigger::Timer { delay_ms }, true) => (
            Instruction::DeferPrefetchOnTimer,
            vec![int_lit(delay_ms as i64)],
        ),
        (DeferTrigger::Hover(target), false) => (Instruction::DeferOnHover, target_args(target)?),
        (DeferTrigger::Hover(target), true) => {
            (Instruction::DeferPrefetchOnHover, target_args(target)?)
        }
        (DeferTrigger::Interaction(target), false) => {
            (Instruction::DeferOnInteraction, target_args(target)?)
        }
        (DeferTrigger::Interaction(target), true) => {
            (Instruction::DeferPrefetchOnInteraction, target_args(target)?)
        }
        (DeferTrigger::Viewport(target), false) => {
            (Instruction::DeferOnViewport, target_args(target)?)
        }
        (DeferTrigger::Viewport(target), true) => {
            (Instruction::DeferPrefetchOnViewport, target_args(target)?)
        }
    };
    Ok(call(instruction, args))
}

fn target_args(target: DeferTriggerTarget) -> Result<Vec<Expression>> {
    let xref = target
        .xref
        .ok_or_else(|| CompileError::UnresolvedDeferTarget {
            name: target.name.clone(),
        })?;
    let slot = target.slot.slot.ok_or(CompileError::MissingSlot(xref))?;
    let steps = target.view_steps.ok_or_else(|| {
        CompileError::Assertion("defer trigger target resolved without view steps".to_owned())
    })?;
    Ok(vec![int_lit(slot as i64), int_lit(steps as i64)])
}

fn lower_statement(stmt: &mut Statement, current: XrefId) -> Result<()> {
    let taken = std::mem::replace(stmt, Statement::Return(Expression::GetCurrentView));
    *stmt = transform_expressions_in_statement(
        taken,
        &mut |expr, _| lower_expr(expr, current),
        VisitFlags::empty(),
    )?;
    Ok(())
}

fn lower_expr(expr: Expression, current: XrefId) -> Result<Expression> {
    Ok(match expr {
        Expression::Context(view) => {
            if view == current {
                variable("ctx")
            } else {
                return Err(CompileError::Assertion(format!(
                    "unresolved context for view {:?} inside view {:?}",
                    view, current
                )));
            }
        }
        Expression::NextContext { steps } => {
            let args = if steps == 1 {
                vec![]
            } else {
                vec![int_lit(steps as i64)]
            };
            call_expr(Instruction::NextContext, args)
        }
        Expression::GetCurrentView => call_expr(Instruction::GetCurrentView, vec![]),
        Expression::RestoreView(RestoreViewTarget::Variable(inner)) => {
            call_expr(Instruction::RestoreView, vec![*inner])
        }
        Expression::RestoreView(RestoreViewTarget::View(view)) => {
            return Err(CompileError::MissingSavedView(view))
        }
        Expression::ReadVariable { xref, name } => match name {
            Some(name) => variable(name),
            None => return Err(CompileError::UnnamedVariable(xref)),
        },
        Expression::Reference {
            target,
            target_slot,
            offset,
        } => {
            let slot = target_slot.slot.ok_or(CompileError::MissingSlot(target))?;
            call_expr(
                Instruction::Reference,
                vec![int_lit(slot as i64 + 1 + offset as i64)],
            )
        }
        Expression::SlotLiteral {
            target,
            target_slot,
        } => int_lit(target_slot.slot.ok_or(CompileError::MissingSlot(target))? as i64),
        Expression::TrackContext { .. } => variable("this"),
        Expression::PipeBinding {
            target,
            target_slot,
            args,
            ..
        } => {
            let target = target.ok_or_else(|| {
                CompileError::Assertion(
                    "pipe binding was never associated with a pipe op".to_owned(),
                )
            })?;
            let slot = target_slot.slot.ok_or(CompileError::MissingSlot(target))?;
            let count = args.len();
            let mut call_args = Vec::with_capacity(count + 1);
            call_args.push(int_lit(slot as i64));
            call_args.extend(args);
            call_expr(Instruction::PipeBind(count), call_args)
        }
        Expression::LexicalRead { name } => {
            return Err(CompileError::UnresolvedReference { name })
        }
        other => other,
    })
}

fn slot_arg(handle: &SlotHandle, xref: XrefId) -> Result<Expression> {
    handle
        .slot
        .map(|slot| int_lit(slot as i64))
        .ok_or(CompileError::MissingSlot(xref))
}

fn view_fn_args(job: &CompilationJob, view: XrefId) -> Result<Vec<Expression>> {
    let unit = job.unit(view)?;
    let fn_name = unit
        .fn_name
        .clone()
        .ok_or(CompileError::UnnamedView(view))?;
    let decls = unit.decls.ok_or_else(|| {
        CompileError::Assertion(format!("view {:?} reified before slot allocation", view))
    })?;
    let vars = unit.vars.ok_or_else(|| {
        CompileError::Assertion(format!("view {:?} reified before variable counting", view))
    })?;
    Ok(vec![
        variable(fn_name),
        int_lit(decls as i64),
        int_lit(vars as i64),
    ])
}

fn opt_view_fn(job: &CompilationJob, view: Option<XrefId>) -> Result<Expression> {
    match view {
        Some(view) => {
            let unit = job.unit(view)?;
            unit.fn_name
                .clone()
                .map(variable)
                .ok_or(CompileError::UnnamedView(view))
        }
        None => Ok(null()),
    }
}

fn const_arg(index: Option<ConstIndex>) -> Expression {
    match index {
        Some(ConstIndex(index)) => variable(format!("{}{}", CONSTANT_PREFIX, index)),
        None => null(),
    }
}

fn null() -> Expression {
    Expression::Literal(LiteralValue::Null)
}
