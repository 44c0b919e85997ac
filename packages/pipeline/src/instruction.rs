//! The runtime instruction set, treated as opaque call targets.
//!
//! The pipeline never reasons about what these instructions do at runtime; it
//! only needs stable symbol names for the generated calls. Arities live in
//! the reify phase, which knows how each operation lowers.

use crate::output::{Expression, Statement};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    ElementStart,
    ElementEnd,
    Text,
    TextInterpolate(usize),
    Template,
    Listener,
    Advance,
    Property,
    Conditional,
    RepeaterCreate,
    Repeater,
    RepeaterTrackByIndex,
    RepeaterTrackByIdentity,
    Pipe,
    PipeBind(usize),
    NextContext,
    GetCurrentView,
    RestoreView,
    Reference,
    Defer,
    DeferWhen,
    DeferPrefetchWhen,
    DeferOnIdle,
    DeferOnImmediate,
    DeferOnTimer,
    DeferOnHover,
    DeferOnInteraction,
    DeferOnViewport,
    DeferPrefetchOnIdle,
    DeferPrefetchOnImmediate,
    DeferPrefetchOnTimer,
    DeferPrefetchOnHover,
    DeferPrefetchOnInteraction,
    DeferPrefetchOnViewport,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::ElementStart => write!(f, "elementStart"),
            Instruction::ElementEnd => write!(f, "elementEnd"),
            Instruction::Text => write!(f, "text"),
            Instruction::TextInterpolate(0) => write!(f, "textInterpolate"),
            Instruction::TextInterpolate(n) => write!(f, "textInterpolate{}", n),
            Instruction::Template => write!(f, "template"),
            Instruction::Listener => write!(f, "listener"),
            Instruction::Advance => write!(f, "advance"),
            Instruction::Property => write!(f, "property"),
            Instruction::Conditional => write!(f, "conditional"),
            Instruction::RepeaterCreate => write!(f, "repeaterCreate"),
            Instruction::Repeater => write!(f, "repeater"),
            Instruction::RepeaterTrackByIndex => write!(f, "repeaterTrackByIndex"),
            Instruction::RepeaterTrackByIdentity => write!(f, "repeaterTrackByIdentity"),
            Instruction::Pipe => write!(f, "pipe"),
            Instruction::PipeBind(n) => write!(f, "pipeBind{}", n),
            Instruction::NextContext => write!(f, "nextContext"),
            Instruction::GetCurrentView => write!(f, "getCurrentView"),
            Instruction::RestoreView => write!(f, "restoreView"),
            Instruction::Reference => write!(f, "reference"),
            Instruction::Defer => write!(f, "defer"),
            Instruction::DeferWhen => write!(f, "deferWhen"),
            Instruction::DeferPrefetchWhen => write!(f, "deferPrefetchWhen"),
            Instruction::DeferOnIdle => write!(f, "deferOnIdle"),
            Instruction::DeferOnImmediate => write!(f, "deferOnImmediate"),
            Instruction::DeferOnTimer => write!(f, "deferOnTimer"),
            Instruction::DeferOnHover => write!(f, "deferOnHover"),
            Instruction::DeferOnInteraction => write!(f, "deferOnInteraction"),
            Instruction::DeferOnViewport => write!(f, "deferOnViewport"),
            Instruction::DeferPrefetchOnIdle => write!(f, "deferPrefetchOnIdle"),
            Instruction::DeferPrefetchOnImmediate => write!(f, "deferPrefetchOnImmediate"),
            Instruction::DeferPrefetchOnTimer => write!(f, "deferPrefetchOnTimer"),
            Instruction::DeferPrefetchOnHover => write!(f, "deferPrefetchOnHover"),
            Instruction::DeferPrefetchOnInteraction => write!(f, "deferPrefetchOnInteraction"),
            Instruction::DeferPrefetchOnViewport => write!(f, "deferPrefetchOnViewport"),
        }
    }
}

/// Build a call expression invoking a runtime instruction.
pub fn call_expr(instruction: Instruction, args: Vec<Expression>) -> Expression {
    Expression::Invoke {
        target: Box::new(Expression::RuntimeFn(instruction)),
        args,
        pure: false,
    }
}

/// Build a call statement invoking a runtime instruction.
pub fn call(instruction: Instruction, args: Vec<Expression>) -> Statement {
    Statement::Expression(call_expr(instruction, args))
}
