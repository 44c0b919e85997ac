//! Saves the current view in embedded views that declare listeners, and
//! restores it at the top of each listener's handler.
//!
//! Listeners fire long after the create pass, so an embedded view's listener
//! cannot rely on the ambient view state. A saved-view variable is declared
//! at the head of the view's create list, and the handler opens by restoring
//! it; restoring also yields the view's context, declared here as a context
//! variable so later phases can resolve reads against it.

use crate::compilation::CompilationJob;
use crate::error::Result;
use crate::ir::handle::XrefId;
use crate::ir::ops::{CreateOp, UpdateOp, VariableOp};
use crate::ir::variable::SemanticVariable;
use crate::output::{Expression, RestoreViewTarget};

pub fn save_and_restore_view(job: &mut CompilationJob) -> Result<()> {
    let xrefs: Vec<XrefId> = job.units.keys().copied().collect();
    for xref in xrefs {
        let unit = job.unit(xref)?;
        if unit.parent.is_none() {
            continue;
        }
        let listener_count = unit
            .create
            .iter()
            .filter(|op| matches!(op, CreateOp::Listener { .. }))
            .count();
        if listener_count == 0 {
            continue;
        }

        let saved_view_xref = job.allocate_xref();
        let mut restored_ctx_xrefs = Vec::with_capacity(listener_count);
        for _ in 0..listener_count {
            restored_ctx_xrefs.push(job.allocate_xref());
        }

        let unit = job.unit_mut(xref)?;
        unit.create.prepend(vec![CreateOp::Variable(VariableOp {
            xref: saved_view_xref,
            variable: SemanticVariable::SavedView { view: xref },
            initializer: Expression::GetCurrentView,
            name: None,
        })]);

        let mut next_ctx_xref = restored_ctx_xrefs.into_iter();
        for op in unit.create.iter_mut() {
            if let CreateOp::Listener { handler, .. } = op {
                let ctx_xref = match next_ctx_xref.next() {
                    Some(ctx_xref) => ctx_xref,
                    None => break,
                };
                handler.insert(
                    0,
                    UpdateOp::Variable(VariableOp {
                        xref: ctx_xref,
                        variable: SemanticVariable::Context { view: xref },
                        initializer: Expression::RestoreView(RestoreViewTarget::View(xref)),
                        name: None,
                    }),
                );
            }
        }
    }
    Ok(())
}
