//! The operation model: tagged create-time and update-time IR nodes.
//!
//! Operations are closed sum types. Each phase matches on the kinds it cares
//! about and leaves the rest untouched; by the end of the pipeline every op
//! must have been rewritten into the `Statement` kind, which emission checks.

use crate::ir::handle::{ConstIndex, SlotHandle, XrefId};
use crate::ir::i18n::I18nParams;
use crate::ir::variable::SemanticVariable;
use crate::output::{Expression, Statement};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Human-readable op kind tag, carried by diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKindName {
    ElementStart,
    ElementEnd,
    Text,
    Template,
    RepeaterCreate,
    Listener,
    Pipe,
    Defer,
    DeferOn,
    I18nMessage,
    Variable,
    Statement,
    Advance,
    Property,
    InterpolateText,
    Conditional,
    Repeater,
    DeferWhen,
}

impl fmt::Display for OpKindName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A template local reference (`#name`) declared on an element or template.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalRef {
    pub name: String,
}

/// A declared variable. Appears in both create lists (saved views) and
/// update lists (context variables, aliases); the naming phase assigns the
/// final `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableOp {
    pub xref: XrefId,
    pub variable: SemanticVariable,
    pub initializer: Expression,
    pub name: Option<String>,
}

/// Trigger condition for a deferred block.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferTrigger {
    Idle,
    Immediate,
    Timer { delay_ms: u64 },
    Hover(DeferTriggerTarget),
    Interaction(DeferTriggerTarget),
    Viewport(DeferTriggerTarget),
}

/// Target of an interaction-style defer trigger. The name is resolved to a
/// concrete element by walking the view ancestry (and the defer block's own
/// placeholder view); the resolution phase fills in the remaining fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferTriggerTarget {
    pub name: String,
    pub xref: Option<XrefId>,
    pub slot: SlotHandle,
    /// View hops from the trigger's view to the target's view. Negative one
    /// means the target lives inside the defer block's placeholder view.
    pub view_steps: Option<i32>,
}

impl DeferTriggerTarget {
    pub fn named(name: impl Into<String>) -> Self {
        DeferTriggerTarget {
            name: name.into(),
            xref: None,
            slot: SlotHandle::new(),
            view_steps: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateOp {
    ElementStart {
        xref: XrefId,
        tag: String,
        local_refs: Vec<LocalRef>,
        handle: SlotHandle,
    },
    ElementEnd {
        xref: XrefId,
    },
    Text {
        xref: XrefId,
        initial_value: String,
        handle: SlotHandle,
    },
    /// Declares a nested view rendered by a structural template.
    Template {
        xref: XrefId,
        view: XrefId,
        tag: Option<String>,
        local_refs: Vec<LocalRef>,
        handle: SlotHandle,
    },
    /// Declares a repeated block and, optionally, its empty fallback view.
    RepeaterCreate {
        xref: XrefId,
        view: XrefId,
        empty_view: Option<XrefId>,
        tag: Option<String>,
        empty_tag: Option<String>,
        /// The per-item identity expression, over `$index` and `$item`.
        track: Expression,
        /// Filled by the tracking function optimization phase.
        track_by_fn: Option<Expression>,
        /// Whether the tracking function reads component state and must be
        /// invoked with the component as its receiver.
        uses_component_instance: bool,
        handle: SlotHandle,
    },
    Listener {
        target: XrefId,
        name: String,
        handler: Vec<UpdateOp>,
    },
    Pipe {
        xref: XrefId,
        name: String,
        handle: SlotHandle,
    },
    /// Declares a deferred block and its sub-views.
    Defer {
        xref: XrefId,
        main_view: XrefId,
        loading_view: Option<XrefId>,
        placeholder_view: Option<XrefId>,
        error_view: Option<XrefId>,
        /// Dependency loader reference, or none when everything is bundled
        /// eagerly.
        resolver_fn: Option<Expression>,
        loading_min_time_ms: Option<u64>,
        loading_after_time_ms: Option<u64>,
        placeholder_min_time_ms: Option<u64>,
        /// Shared-constant indices, filled by the config lowering phase.
        loading_config: Option<ConstIndex>,
        placeholder_config: Option<ConstIndex>,
        handle: SlotHandle,
    },
    /// Registers one trigger condition on a deferred block.
    DeferOn {
        defer: XrefId,
        trigger: DeferTrigger,
        prefetch: bool,
    },
    /// A localized message with its raw placeholder parameters. Removed from
    /// the create list by the message extraction phase.
    I18nMessage {
        xref: XrefId,
        message_id: String,
        params: I18nParams,
    },
    Variable(VariableOp),
    Statement(Statement),
}

/// A text interpolation: n expressions woven between n+1 literal strings.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolation {
    pub strings: Vec<String>,
    pub expressions: Vec<Expression>,
}

impl Interpolation {
    pub fn new(strings: Vec<String>, expressions: Vec<Expression>) -> Self {
        debug_assert_eq!(strings.len(), expressions.len() + 1);
        Interpolation {
            strings,
            expressions,
        }
    }
}

/// One branch of a conditional op. `expr` is the branch test; the single
/// branch with no test is the default.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalCase {
    pub target: XrefId,
    pub target_slot: SlotHandle,
    pub expr: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    /// Moves the runtime's slot cursor forward. Inserted late, once slots
    /// are known.
    Advance {
        delta: u32,
    },
    Property {
        target: XrefId,
        name: String,
        expression: Expression,
    },
    InterpolateText {
        target: XrefId,
        interpolation: Interpolation,
    },
    /// A structured conditional (if/else chain or switch). Lowered to a
    /// single `processed` expression selecting a branch slot.
    Conditional {
        target: XrefId,
        /// Switch-style shared test; branch tests compare against it.
        test: Option<Expression>,
        conditions: Vec<ConditionalCase>,
        processed: Option<Expression>,
    },
    Repeater {
        target: XrefId,
        collection: Expression,
    },
    DeferWhen {
        defer: XrefId,
        prefetch: bool,
        expr: Expression,
    },
    Variable(VariableOp),
    Statement(Statement),
}

impl CreateOp {
    pub fn kind_name(&self) -> OpKindName {
        match self {
            CreateOp::ElementStart { .. } => OpKindName::ElementStart,
            CreateOp::ElementEnd { .. } => OpKindName::ElementEnd,
            CreateOp::Text { .. } => OpKindName::Text,
            CreateOp::Template { .. } => OpKindName::Template,
            CreateOp::RepeaterCreate { .. } => OpKindName::RepeaterCreate,
            CreateOp::Listener { .. } => OpKindName::Listener,
            CreateOp::Pipe { .. } => OpKindName::Pipe,
            CreateOp::Defer { .. } => OpKindName::Defer,
            CreateOp::DeferOn { .. } => OpKindName::DeferOn,
            CreateOp::I18nMessage { .. } => OpKindName::I18nMessage,
            CreateOp::Variable(_) => OpKindName::Variable,
            CreateOp::Statement(_) => OpKindName::Statement,
        }
    }

    /// The nested views this op declares, in slot order.
    pub fn declared_views(&self) -> SmallVec<[XrefId; 2]> {
        match self {
            CreateOp::Template { view, .. } => smallvec![*view],
            CreateOp::RepeaterCreate {
                view, empty_view, ..
            } => {
                let mut views = smallvec![*view];
                views.extend(empty_view.iter().copied());
                views
            }
            CreateOp::Defer {
                main_view,
                loading_view,
                placeholder_view,
                error_view,
                ..
            } => {
                let mut views = smallvec![*main_view];
                views.extend(loading_view.iter().copied());
                views.extend(placeholder_view.iter().copied());
                views.extend(error_view.iter().copied());
                views
            }
            _ => SmallVec::new(),
        }
    }
}

impl UpdateOp {
    pub fn kind_name(&self) -> OpKindName {
        match self {
            UpdateOp::Advance { .. } => OpKindName::Advance,
            UpdateOp::Property { .. } => OpKindName::Property,
            UpdateOp::InterpolateText { .. } => OpKindName::InterpolateText,
            UpdateOp::Conditional { .. } => OpKindName::Conditional,
            UpdateOp::Repeater { .. } => OpKindName::Repeater,
            UpdateOp::DeferWhen { .. } => OpKindName::DeferWhen,
            UpdateOp::Variable(_) => OpKindName::Variable,
            UpdateOp::Statement(_) => OpKindName::Statement,
        }
    }

    /// The op this update targets, for cursor advancement.
    pub fn target(&self) -> Option<XrefId> {
        match self {
            UpdateOp::Property { target, .. }
            | UpdateOp::InterpolateText { target, .. }
            | UpdateOp::Conditional { target, .. }
            | UpdateOp::Repeater { target, .. } => Some(*target),
            UpdateOp::DeferWhen { defer, .. } => Some(*defer),
            UpdateOp::Advance { .. } | UpdateOp::Variable(_) | UpdateOp::Statement(_) => None,
        }
    }
}

/// An ordered operation list. Phases mutate these in place; replacing one op
/// with several is done by taking the vector and rebuilding it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpList<T> {
    pub ops: Vec<T>,
}

impl<T> OpList<T> {
    pub fn new() -> Self {
        OpList { ops: Vec::new() }
    }

    pub fn push(&mut self, op: T) {
        self.ops.push(op);
    }

    /// Inserts ops at the head of the list, preserving their order.
    pub fn prepend(&mut self, ops: Vec<T>) {
        self.ops.splice(0..0, ops);
    }

    /// Takes the current ops out, leaving the list empty. Used by phases
    /// that rebuild the list with insertions or removals.
    pub fn take(&mut self) -> Vec<T> {
        std::mem::take(&mut self.ops)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.ops.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.ops.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<'a, T> IntoIterator for &'a OpList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut OpList<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter_mut()
    }
}
