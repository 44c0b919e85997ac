//! Structured fatal errors raised by the pipeline.
//!
//! No phase catches or recovers from another phase's failure: the first error
//! aborts the whole job and no output is produced. Variants distinguish
//! internal invariant violations (pipeline bugs or malformed upstream input)
//! from unresolvable references surfaced against the template source.

use crate::ir::handle::XrefId;
use crate::ir::ops::OpKindName;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// A cross-reference pointed at a view that does not exist in the job.
    #[error("reference to unknown view {0:?}")]
    UnknownView(XrefId),

    /// A lexical read survived name resolution.
    #[error("unresolved reference to `{name}`")]
    UnresolvedReference { name: String },

    /// A listener tried to restore a view that was never saved.
    #[error("no saved view for {0:?} in the current scope")]
    MissingSavedView(XrefId),

    /// A defer trigger named a reference target that no enclosing view declares.
    #[error("defer trigger target `{name}` could not be resolved")]
    UnresolvedDeferTarget { name: String },

    /// An operation reached a point where its slot must be known, but none
    /// was ever assigned.
    #[error("slot not assigned for {0:?}")]
    MissingSlot(XrefId),

    /// Emission encountered an operation that was never lowered to a raw
    /// statement.
    #[error("operation {kind} reached emission without being lowered")]
    NotLowered { kind: OpKindName },

    /// A view reached emission without an assigned function name.
    #[error("view {0:?} is unnamed")]
    UnnamedView(XrefId),

    /// A variable read whose declaration was never given a name.
    #[error("variable {0:?} is unnamed")]
    UnnamedVariable(XrefId),

    /// A phase observed state that an earlier phase was required to rule out.
    #[error("assertion failure: {0}")]
    Assertion(String),
}

pub type Result<T> = std::result::Result<T, CompileError>;
