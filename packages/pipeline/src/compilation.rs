//! Compilation jobs and units.
//!
//! A job is the whole mutable state of one compile request. Units (views)
//! form a tree, but the tree is navigated by xref lookup in the job's unit
//! table, never through embedded references, so ops in different units can
//! refer to each other freely.

use crate::constant_pool::ConstantPool;
use crate::error::{CompileError, Result};
use crate::ir::handle::{ConstIndex, XrefId};
use crate::ir::i18n::I18nMessage;
use crate::ir::ops::{CreateOp, OpList, UpdateOp};
use crate::ir::variable::AliasVariable;
use indexmap::IndexMap;
use crate::output::Expression;

/// Which kind of compile request this job serves. The phase driver gates
/// phases on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// Compiles a component's view template.
    Template,
    /// Compiles a directive's host bindings.
    Host,
}

#[derive(Debug)]
pub struct CompilationJob {
    pub kind: JobKind,
    /// Name of the component or directive being compiled; used to derive
    /// generated function names.
    pub component_name: String,
    pub pool: ConstantPool,
    /// The root view's xref.
    pub root: XrefId,
    /// All units in this job, keyed by xref. Insertion order is creation
    /// order, which keeps iteration deterministic.
    pub units: IndexMap<XrefId, CompilationUnit>,
    /// Shared constants referenced by generated code, deduplicated.
    pub consts: Vec<Expression>,
    /// Formatted localized messages, filled by the extraction phase.
    pub i18n_messages: Vec<I18nMessage>,
    next_xref: u32,
}

impl CompilationJob {
    fn new(kind: JobKind, component_name: impl Into<String>) -> Self {
        let root = XrefId(0);
        let mut units = IndexMap::new();
        units.insert(root, CompilationUnit::new(root, None));
        CompilationJob {
            kind,
            component_name: component_name.into(),
            pool: ConstantPool::new(),
            root,
            units,
            consts: Vec::new(),
            i18n_messages: Vec::new(),
            next_xref: 1,
        }
    }

    pub fn new_template(component_name: impl Into<String>) -> Self {
        CompilationJob::new(JobKind::Template, component_name)
    }

    pub fn new_host_binding(directive_name: impl Into<String>) -> Self {
        CompilationJob::new(JobKind::Host, directive_name)
    }

    /// Allocates a fresh xref. Identifiers are never reused within a job.
    pub fn allocate_xref(&mut self) -> XrefId {
        let xref = XrefId(self.next_xref);
        self.next_xref += 1;
        xref
    }

    /// Creates a new child view under `parent` and returns its xref.
    pub fn create_view(&mut self, parent: XrefId) -> XrefId {
        let xref = self.allocate_xref();
        self.units.insert(xref, CompilationUnit::new(xref, Some(parent)));
        xref
    }

    pub fn unit(&self, xref: XrefId) -> Result<&CompilationUnit> {
        self.units.get(&xref).ok_or(CompileError::UnknownView(xref))
    }

    pub fn unit_mut(&mut self, xref: XrefId) -> Result<&mut CompilationUnit> {
        self.units
            .get_mut(&xref)
            .ok_or(CompileError::UnknownView(xref))
    }

    /// The view ancestry chain starting at `xref`, root last.
    pub fn ancestry(&self, xref: XrefId) -> Result<Vec<XrefId>> {
        let mut chain = Vec::new();
        let mut current = Some(xref);
        while let Some(xref) = current {
            chain.push(xref);
            current = self.unit(xref)?.parent;
        }
        Ok(chain)
    }

    /// Adds a shared constant, reusing an existing entry when an equivalent
    /// expression is already pooled.
    pub fn add_const(&mut self, expr: Expression) -> ConstIndex {
        for (index, existing) in self.consts.iter().enumerate() {
            if existing.is_equivalent(&expr) {
                return ConstIndex(index);
            }
        }
        self.consts.push(expr);
        ConstIndex(self.consts.len() - 1)
    }

    /// Suffix for generated function names.
    pub fn fn_suffix(&self) -> &'static str {
        match self.kind {
            JobKind::Template => "Template",
            JobKind::Host => "HostBindings",
        }
    }
}

/// One view: a create list, an update list, and the declarations the view
/// contributes to its subtree's lexical scope.
#[derive(Debug)]
pub struct CompilationUnit {
    pub xref: XrefId,
    /// The parent view; `None` only for the root.
    pub parent: Option<XrefId>,
    /// Generated function name, assigned by the naming phase.
    pub fn_name: Option<String>,
    /// Lexical name to context property, e.g. `item` -> `$implicit`.
    /// Declaration order is scope order.
    pub context_variables: IndexMap<String, String>,
    /// Aliases introduced by conditional blocks on this view.
    pub aliases: Vec<AliasVariable>,
    /// Number of declaration slots, assigned by slot allocation.
    pub decls: Option<u32>,
    /// Number of binding variables, assigned by variable counting.
    pub vars: Option<u32>,
    pub create: OpList<CreateOp>,
    pub update: OpList<UpdateOp>,
}

impl CompilationUnit {
    pub fn new(xref: XrefId, parent: Option<XrefId>) -> Self {
        CompilationUnit {
            xref,
            parent,
            fn_name: None,
            context_variables: IndexMap::new(),
            aliases: Vec::new(),
            decls: None,
            vars: None,
            create: OpList::new(),
            update: OpList::new(),
        }
    }
}
