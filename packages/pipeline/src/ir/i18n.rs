//! I18n placeholder parameter values and the formatted message record.
//!
//! Raw parameter maps are keyed by placeholder name and ordered (`BTreeMap`),
//! so serialization is deterministic without an explicit sort step. The
//! extraction phase turns the raw map into the flat string map stored on the
//! job's message table.

use bitflags::bitflags;
use std::collections::BTreeMap;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct I18nParamValueFlags: u8 {
        const ELEMENT_TAG = 1 << 0;
        const TEMPLATE_TAG = 1 << 1;
        const OPEN_TAG = 1 << 2;
        const CLOSE_TAG = 1 << 3;
        /// The value only makes sense after the runtime postprocessing step.
        const POSTPROCESSING = 1 << 4;
    }
}

/// One substitution value for a placeholder. A placeholder may collect
/// several of these; they are serialized as a delimited list.
#[derive(Debug, Clone, PartialEq)]
pub struct I18nParamValue {
    pub value: String,
    /// Index of the sub-template this value belongs to, if not the root.
    pub sub_template_index: Option<u32>,
    pub flags: I18nParamValueFlags,
}

impl I18nParamValue {
    pub fn new(value: impl Into<String>) -> Self {
        I18nParamValue {
            value: value.into(),
            sub_template_index: None,
            flags: I18nParamValueFlags::empty(),
        }
    }

    pub fn with_flags(mut self, flags: I18nParamValueFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_sub_template_index(mut self, index: u32) -> Self {
        self.sub_template_index = Some(index);
        self
    }
}

/// Raw placeholder map attached to an i18n message op.
pub type I18nParams = BTreeMap<String, Vec<I18nParamValue>>;

/// A fully formatted message, as stored in the job's message table.
#[derive(Debug, Clone, PartialEq)]
pub struct I18nMessage {
    pub id: String,
    /// Placeholder name to serialized value, in sorted key order.
    pub params: BTreeMap<String, String>,
    /// Whether the runtime must run its postprocessing pass on this message.
    pub needs_postprocessing: bool,
}
