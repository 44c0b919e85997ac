//! Counts the binding variables each view's update block consumes, for the
//! declaration metadata passed alongside nested view functions.

use crate::compilation::CompilationJob;
use crate::error::Result;
use crate::ir::ops::UpdateOp;

pub fn count_variables(job: &mut CompilationJob) -> Result<()> {
    for unit in job.units.values_mut() {
        let mut vars = 0u32;
        for op in unit.update.iter() {
            vars += match op {
                UpdateOp::Property { .. } => 1,
                UpdateOp::InterpolateText { interpolation, .. } => {
                    interpolation.expressions.len() as u32
                }
                UpdateOp::Conditional { .. } => 1,
                UpdateOp::Repeater { .. } => 1,
                UpdateOp::DeferWhen { .. } => 1,
                UpdateOp::Variable(_) => 1,
                UpdateOp::Advance { .. } | UpdateOp::Statement(_) => 0,
            };
        }
        unit.vars = Some(vars);
    }
    Ok(())
}
