//! Lowers deferred block timing settings into shared constant arrays.
//!
//! The runtime takes loading and placeholder timing as constant config
//! arrays; blocks with identical settings share one pooled constant.

use crate::compilation::CompilationJob;
use crate::error::Result;
use crate::ir::handle::{ConstIndex, XrefId};
use crate::ir::ops::CreateOp;
use crate::output::{int_lit, Expression, LiteralValue};

struct Pending {
    unit: XrefId,
    op_index: usize,
    loading: Option<Expression>,
    placeholder: Option<Expression>,
}

pub fn configure_defer_instructions(job: &mut CompilationJob) -> Result<()> {
    let mut pending = Vec::new();
    for (unit_xref, unit) in &job.units {
        for (op_index, op) in unit.create.iter().enumerate() {
            let (loading_min, loading_after, placeholder_min) = match op {
                CreateOp::Defer {
                    loading_min_time_ms,
                    loading_after_time_ms,
                    placeholder_min_time_ms,
                    ..
                } => (*loading_min_time_ms, *loading_after_time_ms, *placeholder_min_time_ms),
                _ => continue,
            };

            let loading = if loading_min.is_some() || loading_after.is_some() {
                Some(Expression::LiteralArray(vec![
                    ms_or_null(loading_min),
                    ms_or_null(loading_after),
                ]))
            } else {
                None
            };
            let placeholder =
                placeholder_min.map(|ms| Expression::LiteralArray(vec![int_lit(ms as i64)]));
            if loading.is_none() && placeholder.is_none() {
                continue;
            }
            pending.push(Pending {
                unit: *unit_xref,
                op_index,
                loading,
                placeholder,
            });
        }
    }

    for entry in pending {
        let loading_index = entry.loading.map(|expr| job.add_const(expr));
        let placeholder_index = entry.placeholder.map(|expr| job.add_const(expr));
        let ops = &mut job.unit_mut(entry.unit)?.create.ops;
        if let Some(CreateOp::Defer {
            loading_config,
            placeholder_config,
            ..
        }) = ops.get_mut(entry.op_index)
        {
            set_config(loading_config, loading_index);
            set_config(placeholder_config, placeholder_index);
        }
    }
    Ok(())
}

fn ms_or_null(ms: Option<u64>) -> Expression {
    match ms {
        Some(ms) => int_lit(ms as i64),
        None => Expression::Literal(LiteralValue::Null),
    }
}

fn set_config(slot: &mut Option<ConstIndex>, index: Option<ConstIndex>) {
    if let Some(index) = index {
        *slot = Some(index);
    }
}
