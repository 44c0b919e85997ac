//! Semantic classification of the variables declared by the pipeline.
//!
//! Variable operations carry one of these alongside their initializer, so
//! later phases can tell what a variable means without re-deriving it from
//! the initializer's shape.

use crate::ir::handle::XrefId;
use crate::output::Expression;

#[derive(Debug, Clone, PartialEq)]
pub enum SemanticVariable {
    /// The context object of a particular view.
    Context { view: XrefId },
    /// A named value pulled out of a view context (loop items, indices,
    /// implicit template variables).
    Identifier { name: String },
    /// A snapshot of the active view, saved so a listener can restore it.
    SavedView { view: XrefId },
    /// An alias introduced by a conditional block (`@if (expr; as name)`),
    /// visible to the branch's whole subtree.
    Alias { name: String },
}

impl SemanticVariable {
    /// The lexical name this variable answers to, if it has one.
    pub fn lexical_name(&self) -> Option<&str> {
        match self {
            SemanticVariable::Identifier { name } | SemanticVariable::Alias { name } => Some(name),
            SemanticVariable::Context { .. } | SemanticVariable::SavedView { .. } => None,
        }
    }
}

/// An alias declared on a compilation unit, to be materialized as a variable
/// by the variable generation phase.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasVariable {
    pub name: String,
    pub expression: Expression,
}
