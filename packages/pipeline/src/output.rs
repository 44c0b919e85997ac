//! Abstract output AST.
//!
//! The final product of the pipeline is a list of these statements per view.
//! A textual back end (not part of this crate) turns them into source code;
//! here they only need structural equality (for constant deduplication) and a
//! deterministic printed form (for pool keys and tests).
//!
//! The enum also carries the IR-only expression variants (lexical reads,
//! context references, variable reads, slot literals). Those are produced by
//! the front end and by early phases, and every one of them must be rewritten
//! into a plain output expression by the reify phase before emission.

use crate::instruction::Instruction;
use crate::ir::handle::{SlotHandle, XrefId};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    And,
    Or,
    Identical,
    NotIdentical,
    BitwiseAnd,
    Plus,
}

impl BinaryOperator {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
            BinaryOperator::Identical => "===",
            BinaryOperator::NotIdentical => "!==",
            BinaryOperator::BitwiseAnd => "&",
            BinaryOperator::Plus => "+",
        }
    }
}

/// Target of a restore-view expression: initially the view's xref, rewritten
/// by name resolution to a read of the corresponding saved-view variable.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreViewTarget {
    View(XrefId),
    Variable(Box<Expression>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(LiteralValue),
    ReadVar(String),
    ReadProp {
        receiver: Box<Expression>,
        name: String,
    },
    Invoke {
        target: Box<Expression>,
        args: Vec<Expression>,
        /// Pure calls have no observable side effects and may be deduplicated.
        pure: bool,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Conditional {
        test: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    LiteralArray(Vec<Expression>),
    Function {
        name: Option<String>,
        params: Vec<String>,
        body: Vec<Statement>,
    },
    Arrow {
        params: Vec<String>,
        body: Box<Expression>,
    },
    /// Reference to an opaque runtime instruction symbol.
    RuntimeFn(Instruction),

    // --- IR-only variants below; none may survive reification. ---
    /// A read of a name within the lexical scope of a view, not yet resolved
    /// to a declaration.
    LexicalRead { name: String },
    /// The context object of a particular view.
    Context(XrefId),
    /// A hop up the view context chain by the given number of levels.
    NextContext { steps: u32 },
    /// Snapshot of the currently active view, taken in a create block.
    GetCurrentView,
    /// Restores a previously saved view inside a listener.
    RestoreView(RestoreViewTarget),
    /// A read of a declared semantic variable.
    ReadVariable {
        xref: XrefId,
        name: Option<String>,
    },
    /// A read of a template local reference, addressed by the slot of the
    /// element declaring it plus the reference's position on that element.
    Reference {
        target: XrefId,
        target_slot: SlotHandle,
        offset: usize,
    },
    /// The slot number of a targeted operation, as a literal. Used by
    /// conditional tests before slots are assigned.
    SlotLiteral {
        target: XrefId,
        target_slot: SlotHandle,
    },
    /// A component context read inside a non-inlined tracking function, which
    /// is emitted against the bound instance rather than the view context.
    TrackContext { view: XrefId },
    /// An invocation of a pipe within an update expression. Replaced with a
    /// slot-addressed binding call once the pipe creation op exists.
    PipeBinding {
        target: Option<XrefId>,
        target_slot: SlotHandle,
        name: String,
        args: Vec<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expression),
    Return(Expression),
    If {
        condition: Expression,
        body: Vec<Statement>,
    },
    DeclareVar {
        name: String,
        init: Option<Expression>,
    },
    DeclareFn {
        name: String,
        params: Vec<String>,
        body: Vec<Statement>,
    },
}

pub fn literal(value: LiteralValue) -> Expression {
    Expression::Literal(value)
}

pub fn str_lit(value: impl Into<String>) -> Expression {
    Expression::Literal(LiteralValue::Str(value.into()))
}

pub fn int_lit(value: i64) -> Expression {
    Expression::Literal(LiteralValue::Int(value))
}

pub fn variable(name: impl Into<String>) -> Expression {
    Expression::ReadVar(name.into())
}

impl Expression {
    pub fn prop(self, name: impl Into<String>) -> Expression {
        Expression::ReadProp {
            receiver: Box::new(self),
            name: name.into(),
        }
    }

    pub fn call(self, args: Vec<Expression>) -> Expression {
        Expression::Invoke {
            target: Box::new(self),
            args,
            pure: false,
        }
    }

    /// Structural equivalence; used for constant deduplication.
    pub fn is_equivalent(&self, other: &Expression) -> bool {
        self == other
    }

    /// Whether evaluating this expression has no observable side effects.
    ///
    /// Conservative: any non-pure invocation (including method calls and pipe
    /// bindings) makes the whole expression impure.
    pub fn is_pure(&self) -> bool {
        match self {
            Expression::Literal(_)
            | Expression::ReadVar(_)
            | Expression::RuntimeFn(_)
            | Expression::LexicalRead { .. }
            | Expression::Context(_)
            | Expression::ReadVariable { .. }
            | Expression::Reference { .. }
            | Expression::SlotLiteral { .. }
            | Expression::TrackContext { .. } => true,
            Expression::ReadProp { receiver, .. } => receiver.is_pure(),
            Expression::Invoke { target, args, pure } => {
                *pure && target.is_pure() && args.iter().all(Expression::is_pure)
            }
            Expression::Binary { lhs, rhs, .. } => lhs.is_pure() && rhs.is_pure(),
            Expression::Conditional {
                test,
                then,
                otherwise,
            } => test.is_pure() && then.is_pure() && otherwise.is_pure(),
            Expression::LiteralArray(entries) => entries.iter().all(Expression::is_pure),
            // Closures are values; creating one is pure.
            Expression::Function { .. } | Expression::Arrow { .. } => true,
            Expression::NextContext { .. }
            | Expression::GetCurrentView
            | Expression::RestoreView(_)
            | Expression::PipeBinding { .. } => false,
        }
    }
}

// --- Deterministic printer ------------------------------------------------
//
// Produces a stable, JS-like rendition. Compiling the same input twice must
// yield byte-identical output, so nothing here may depend on hashing order.

fn escape_str(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

fn write_statements(f: &mut fmt::Formatter<'_>, stmts: &[Statement], indent: usize) -> fmt::Result {
    let pad = "  ".repeat(indent);
    for stmt in stmts {
        match stmt {
            Statement::Expression(expr) => writeln!(f, "{}{};", pad, expr)?,
            Statement::Return(expr) => writeln!(f, "{}return {};", pad, expr)?,
            Statement::If { condition, body } => {
                writeln!(f, "{}if ({}) {{", pad, condition)?;
                write_statements(f, body, indent + 1)?;
                writeln!(f, "{}}}", pad)?;
            }
            Statement::DeclareVar { name, init } => match init {
                Some(init) => writeln!(f, "{}const {} = {};", pad, name, init)?,
                None => writeln!(f, "{}let {};", pad, name)?,
            },
            Statement::DeclareFn { name, params, body } => {
                writeln!(f, "{}function {}({}) {{", pad, name, params.join(", "))?;
                write_statements(f, body, indent + 1)?;
                writeln!(f, "{}}}", pad)?;
            }
        }
    }
    Ok(())
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_statements(f, std::slice::from_ref(self), 0)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(LiteralValue::Str(s)) => write!(f, "\"{}\"", escape_str(s)),
            Expression::Literal(LiteralValue::Int(n)) => write!(f, "{}", n),
            Expression::Literal(LiteralValue::Bool(b)) => write!(f, "{}", b),
            Expression::Literal(LiteralValue::Null) => write!(f, "null"),
            Expression::ReadVar(name) => write!(f, "{}", name),
            Expression::ReadProp { receiver, name } => write!(f, "{}.{}", receiver, name),
            Expression::Invoke { target, args, .. } => {
                write!(f, "{}(", target)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expression::Binary { op, lhs, rhs } => {
                write!(f, "({} {} {})", lhs, op.symbol(), rhs)
            }
            Expression::Conditional {
                test,
                then,
                otherwise,
            } => write!(f, "({} ? {} : {})", test, then, otherwise),
            Expression::LiteralArray(entries) => {
                write!(f, "[")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", entry)?;
                }
                write!(f, "]")
            }
            Expression::Function { name, params, body } => {
                writeln!(
                    f,
                    "function {}({}) {{",
                    name.as_deref().unwrap_or(""),
                    params.join(", ")
                )?;
                write_statements(f, body, 1)?;
                write!(f, "}}")
            }
            Expression::Arrow { params, body } => {
                write!(f, "({}) => {}", params.join(", "), body)
            }
            Expression::RuntimeFn(instruction) => write!(f, "{}", instruction),
            // IR-only variants print a diagnostic form; they never reach
            // emitted output.
            Expression::LexicalRead { name } => write!(f, "<lexical {}>", name),
            Expression::Context(xref) => write!(f, "<ctx {}>", xref.0),
            Expression::NextContext { steps } => write!(f, "<nextContext {}>", steps),
            Expression::GetCurrentView => write!(f, "<getCurrentView>"),
            Expression::RestoreView(RestoreViewTarget::View(xref)) => {
                write!(f, "<restoreView {}>", xref.0)
            }
            Expression::RestoreView(RestoreViewTarget::Variable(expr)) => {
                write!(f, "<restoreView {}>", expr)
            }
            Expression::ReadVariable { xref, name } => match name {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "<var {}>", xref.0),
            },
            Expression::Reference { target, .. } => write!(f, "<ref {}>", target.0),
            Expression::SlotLiteral { target_slot, .. } => match target_slot.slot {
                Some(slot) => write!(f, "{}", slot),
                None => write!(f, "<slot?>"),
            },
            Expression::TrackContext { .. } => write!(f, "this"),
            Expression::PipeBinding { name, args, .. } => {
                write!(f, "<pipe {}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")>")
            }
        }
    }
}
