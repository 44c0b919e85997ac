//! Shared constant pool.
//!
//! Holds the top-level declarations the emitted view functions refer to:
//! shared literal constants, deduplicated helper functions (tracking
//! functions), and the per-view function definitions themselves. Sharing is
//! keyed on the printed form of the initializer, which is deterministic.

use indexmap::IndexMap;
use crate::output::{Expression, Statement};

pub const CONSTANT_PREFIX: &str = "_c";

#[derive(Debug, Default)]
pub struct ConstantPool {
    /// Top-level declarations, in the order they were created.
    pub statements: Vec<Statement>,
    /// Printed initializer form to declared name.
    shared: IndexMap<String, String>,
    /// Next counter value per name prefix.
    counters: IndexMap<String, u32>,
}

impl ConstantPool {
    pub fn new() -> Self {
        ConstantPool::default()
    }

    /// Returns a fresh name with the given prefix, unique within this pool.
    pub fn unique_name(&mut self, prefix: &str) -> String {
        let counter = self.counters.entry(prefix.to_owned()).or_insert(0);
        let name = format!("{}{}", prefix, counter);
        *counter += 1;
        name
    }

    /// Returns a reference to a pooled function with the given initializer,
    /// declaring it on first use. Two structurally identical initializers
    /// share one declaration.
    pub fn get_shared_function_reference(
        &mut self,
        initializer: Expression,
        prefix: &str,
    ) -> Expression {
        let key = initializer.to_string();
        if let Some(name) = self.shared.get(&key) {
            return Expression::ReadVar(name.clone());
        }
        let name = self.unique_name(prefix);
        self.statements.push(Statement::DeclareVar {
            name: name.clone(),
            init: Some(initializer),
        });
        self.shared.insert(key, name.clone());
        Expression::ReadVar(name)
    }

    /// Declares a top-level statement without sharing.
    pub fn push_statement(&mut self, statement: Statement) {
        self.statements.push(statement);
    }
}
