//! Intermediate representation: operations, handles, variables, and the
//! expression rewriting utilities the phases are built on.

pub mod expression;
pub mod handle;
pub mod i18n;
pub mod ops;
pub mod variable;
