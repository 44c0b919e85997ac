//! Lowers structured conditional ops into a single branch-selecting
//! expression.
//!
//! Cases are folded, in reverse source order, into a chain of ternaries
//! yielding the slot of the first branch whose test passes; with no match the
//! chain yields the default branch's slot, or -1 meaning render nothing.
//! A switch-style shared test is evaluated once into a temporary variable so
//! its side effects are not repeated per case.

use crate::compilation::CompilationJob;
use crate::error::Result;
use crate::ir::handle::XrefId;
use crate::ir::ops::{UpdateOp, VariableOp};
use crate::ir::variable::SemanticVariable;
use crate::output::{int_lit, BinaryOperator, Expression};

pub fn generate_conditionals(job: &mut CompilationJob) -> Result<()> {
    let xrefs: Vec<XrefId> = job.units.keys().copied().collect();
    for xref in xrefs {
        let ops = job.unit_mut(xref)?.update.take();
        let mut result = Vec::with_capacity(ops.len());
        for mut op in ops {
            if let UpdateOp::Conditional {
                test,
                conditions,
                processed,
                ..
            } = &mut op
            {
                let test_var = match test.take() {
                    Some(test_expr) => {
                        let var_xref = job.allocate_xref();
                        result.push(UpdateOp::Variable(VariableOp {
                            xref: var_xref,
                            variable: SemanticVariable::Identifier {
                                name: "cond".to_owned(),
                            },
                            initializer: test_expr,
                            name: None,
                        }));
                        Some(var_xref)
                    }
                    None => None,
                };

                // The caseless branch is the default; no default means no
                // branch renders when every test fails.
                let mut chain = match conditions.iter().find(|case| case.expr.is_none()) {
                    Some(default) => Expression::SlotLiteral {
                        target: default.target,
                        target_slot: default.target_slot,
                    },
                    None => int_lit(-1),
                };
                for case in conditions.iter_mut().rev() {
                    let case_expr = match case.expr.take() {
                        Some(expr) => expr,
                        None => continue,
                    };
                    let case_test = match test_var {
                        Some(var_xref) => Expression::Binary {
                            op: BinaryOperator::Identical,
                            lhs: Box::new(Expression::ReadVariable {
                                xref: var_xref,
                                name: None,
                            }),
                            rhs: Box::new(case_expr),
                        },
                        None => case_expr,
                    };
                    chain = Expression::Conditional {
                        test: Box::new(case_test),
                        then: Box::new(Expression::SlotLiteral {
                            target: case.target,
                            target_slot: case.target_slot,
                        }),
                        otherwise: Box::new(chain),
                    };
                }
                *processed = Some(chain);
            }
            result.push(op);
        }
        job.unit_mut(xref)?.update.ops = result;
    }
    Ok(())
}
