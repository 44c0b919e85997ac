//! A multi-phase view template compiler.
//!
//! Consumes an operation graph built by a front end (views, create and
//! update op lists, cross-references) and lowers it, through an ordered
//! sequence of in-place transformation phases, into per-view functions over
//! an opaque runtime instruction set. See DESIGN.md for the phase dependency
//! graph.

pub mod compilation;
pub mod constant_pool;
pub mod emit;
pub mod error;
pub mod instruction;
pub mod ir;
pub mod output;
pub mod phases;

pub use compilation::{CompilationJob, CompilationUnit, JobKind};
pub use emit::{emit_host_binding_function, emit_template_function};
pub use error::{CompileError, Result};
pub use phases::transform;

use crate::ir::i18n::I18nMessage;
use crate::output::{Expression, Statement};

/// Everything a template compile produces: the root view function, the
/// supporting top-level declarations (child view functions, shared
/// constants, pooled tracking functions), and the formatted message table.
#[derive(Debug)]
pub struct CompiledTemplate {
    pub function: Expression,
    pub pool_statements: Vec<Statement>,
    pub i18n_messages: Vec<I18nMessage>,
}

/// Runs the full pipeline over a template job and emits the result.
pub fn compile_template(mut job: CompilationJob) -> Result<CompiledTemplate> {
    transform(&mut job)?;
    let function = emit_template_function(&mut job)?;
    Ok(CompiledTemplate {
        function,
        pool_statements: job.pool.statements,
        i18n_messages: job.i18n_messages,
    })
}

/// Runs the full pipeline over a host binding job and emits the result,
/// which is absent when the job has no bindings.
pub fn compile_host_binding(mut job: CompilationJob) -> Result<Option<Expression>> {
    transform(&mut job)?;
    emit_host_binding_function(&mut job)
}
