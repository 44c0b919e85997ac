//! Turns repeater tracking expressions into tracking functions.
//!
//! `$index` and `$item` alone map onto the runtime's built-in tracking
//! helpers. Anything else becomes a function over ($index, $item): pure
//! expressions with no component state are pooled, so structurally identical
//! track expressions across repeaters share one function; expressions that
//! call methods or read component state get their own function each time,
//! since merging their side effects or captures would be wrong.

use crate::compilation::CompilationJob;
use crate::error::Result;
use crate::instruction::Instruction;
use crate::ir::expression::{transform_expressions_in_expression, VisitFlags};
use crate::ir::ops::CreateOp;
use crate::output::{variable, Expression, LiteralValue, Statement};

const TRACK_FN_PREFIX: &str = "_forTrack";

pub fn optimize_track_fns(job: &mut CompilationJob) -> Result<()> {
    let units = &mut job.units;
    let pool = &mut job.pool;
    for unit in units.values_mut() {
        let view = unit.xref;
        for op in unit.create.iter_mut() {
            let (track, track_by_fn, uses_component_instance) = match op {
                CreateOp::RepeaterCreate {
                    track,
                    track_by_fn,
                    uses_component_instance,
                    ..
                } => (track, track_by_fn, uses_component_instance),
                _ => continue,
            };

            if *track == variable("$item") {
                *track_by_fn = Some(Expression::RuntimeFn(Instruction::RepeaterTrackByIdentity));
                continue;
            }
            if *track == variable("$index") {
                *track_by_fn = Some(Expression::RuntimeFn(Instruction::RepeaterTrackByIndex));
                continue;
            }

            // Reads not bound to the tracking parameters are component state;
            // they retarget to the bound component instance.
            let mut uses_component = false;
            let taken = std::mem::replace(track, Expression::Literal(LiteralValue::Null));
            let rewritten = transform_expressions_in_expression(
                taken,
                &mut |expr, _| {
                    Ok(match expr {
                        Expression::LexicalRead { name } => {
                            uses_component = true;
                            Expression::TrackContext { view }.prop(name)
                        }
                        Expression::Context(_) => {
                            uses_component = true;
                            Expression::TrackContext { view }
                        }
                        other => other,
                    })
                },
                VisitFlags::empty(),
            )?;
            *track = rewritten.clone();
            *uses_component_instance = uses_component;

            let params = vec!["$index".to_owned(), "$item".to_owned()];
            if !uses_component && rewritten.is_pure() {
                *track_by_fn = Some(pool.get_shared_function_reference(
                    Expression::Arrow {
                        params,
                        body: Box::new(rewritten),
                    },
                    TRACK_FN_PREFIX,
                ));
            } else {
                *track_by_fn = Some(Expression::Function {
                    name: None,
                    params,
                    body: vec![Statement::Return(rewritten)],
                });
            }
        }
    }
    Ok(())
}
