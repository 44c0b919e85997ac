//! Extracts i18n message ops into the job's message table, formatting their
//! placeholder parameters into catalog-ready strings.
//!
//! The serialized placeholder format wraps each value in escape characters,
//! with optional close-tag and element/template markers and a sub-template
//! index suffix. Keys come out in sorted order; a placeholder with several
//! values serializes as a delimited list and flags the message for runtime
//! postprocessing.

use crate::compilation::CompilationJob;
use crate::error::Result;
use crate::ir::handle::XrefId;
use crate::ir::i18n::{I18nMessage, I18nParamValue, I18nParamValueFlags, I18nParams};
use crate::ir::ops::CreateOp;
use std::collections::BTreeMap;
use std::fmt::Write;

const ESCAPE: char = '\u{FFFD}';
const ELEMENT_MARKER: char = '#';
const TEMPLATE_MARKER: char = '*';
const TAG_CLOSE_MARKER: char = '/';
const CONTEXT_MARKER: char = ':';
const LIST_START_MARKER: char = '[';
const LIST_END_MARKER: char = ']';
const LIST_DELIMITER: char = '|';

pub fn extract_i18n_messages(job: &mut CompilationJob) -> Result<()> {
    let xrefs: Vec<XrefId> = job.units.keys().copied().collect();
    for xref in xrefs {
        let ops = job.unit_mut(xref)?.create.take();
        let mut kept = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                CreateOp::I18nMessage {
                    message_id, params, ..
                } => {
                    job.i18n_messages.push(format_message(message_id, &params));
                }
                other => kept.push(other),
            }
        }
        job.unit_mut(xref)?.create.ops = kept;
    }
    Ok(())
}

fn format_message(id: String, params: &I18nParams) -> I18nMessage {
    let (params, needs_postprocessing) = format_params(params);
    I18nMessage {
        id,
        params,
        needs_postprocessing,
    }
}

/// Formats a raw placeholder map into serialized strings, reporting whether
/// the message needs the runtime postprocessing pass. Keys with no values
/// are dropped.
pub fn format_params(params: &I18nParams) -> (BTreeMap<String, String>, bool) {
    let mut formatted = BTreeMap::new();
    let mut needs_postprocessing = false;
    for (key, values) in params {
        if values.is_empty() {
            continue;
        }
        if values.len() > 1
            || values
                .iter()
                .any(|value| value.flags.contains(I18nParamValueFlags::POSTPROCESSING))
        {
            needs_postprocessing = true;
        }
        formatted.insert(key.clone(), format_param_values(values));
    }
    (formatted, needs_postprocessing)
}

fn format_param_values(values: &[I18nParamValue]) -> String {
    if let [value] = values {
        return format_value(value);
    }
    let mut out = String::new();
    out.push(LIST_START_MARKER);
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            out.push(LIST_DELIMITER);
        }
        out.push_str(&format_value(value));
    }
    out.push(LIST_END_MARKER);
    out
}

/// Serializes one value as an escaped token. A self-closing tag (open and
/// close flags both set) serializes as its open form followed by its close
/// form, since the catalog format requires tags to come in pairs.
pub fn format_value(value: &I18nParamValue) -> String {
    let both = I18nParamValueFlags::OPEN_TAG | I18nParamValueFlags::CLOSE_TAG;
    if value.flags.contains(both) {
        let open = value
            .clone()
            .with_flags(value.flags - I18nParamValueFlags::CLOSE_TAG);
        let close = value
            .clone()
            .with_flags(value.flags - I18nParamValueFlags::OPEN_TAG);
        return format!("{}{}", format_value(&open), format_value(&close));
    }

    let mut out = String::new();
    out.push(ESCAPE);
    if value.flags.contains(I18nParamValueFlags::CLOSE_TAG) {
        out.push(TAG_CLOSE_MARKER);
    }
    if value.flags.contains(I18nParamValueFlags::ELEMENT_TAG) {
        out.push(ELEMENT_MARKER);
    } else if value.flags.contains(I18nParamValueFlags::TEMPLATE_TAG) {
        out.push(TEMPLATE_MARKER);
    }
    out.push_str(&value.value);
    if let Some(index) = value.sub_template_index {
        let _ = write!(out, "{}{}", CONTEXT_MARKER, index);
    }
    out.push(ESCAPE);
    out
}
