//! Shared builders for assembling the operation graphs a front end would
//! normally produce.
#![allow(dead_code)]

use view_pipeline::compilation::CompilationJob;
use view_pipeline::ir::handle::{SlotHandle, XrefId};
use view_pipeline::ir::ops::{CreateOp, Interpolation, LocalRef, UpdateOp};
use view_pipeline::output::Expression;

pub fn lexical(name: &str) -> Expression {
    Expression::LexicalRead {
        name: name.to_owned(),
    }
}

pub fn element(job: &mut CompilationJob, view: XrefId, tag: &str) -> XrefId {
    element_with_refs(job, view, tag, &[])
}

pub fn element_with_refs(
    job: &mut CompilationJob,
    view: XrefId,
    tag: &str,
    refs: &[&str],
) -> XrefId {
    let xref = job.allocate_xref();
    let unit = job.unit_mut(view).unwrap();
    unit.create.push(CreateOp::ElementStart {
        xref,
        tag: tag.to_owned(),
        local_refs: refs
            .iter()
            .map(|name| LocalRef {
                name: (*name).to_owned(),
            })
            .collect(),
        handle: SlotHandle::new(),
    });
    unit.create.push(CreateOp::ElementEnd { xref });
    xref
}

pub fn text_node(job: &mut CompilationJob, view: XrefId, initial_value: &str) -> XrefId {
    let xref = job.allocate_xref();
    job.unit_mut(view).unwrap().create.push(CreateOp::Text {
        xref,
        initial_value: initial_value.to_owned(),
        handle: SlotHandle::new(),
    });
    xref
}

pub fn interpolate_text(
    job: &mut CompilationJob,
    view: XrefId,
    target: XrefId,
    strings: &[&str],
    expressions: Vec<Expression>,
) {
    job.unit_mut(view)
        .unwrap()
        .update
        .push(UpdateOp::InterpolateText {
            target,
            interpolation: Interpolation::new(
                strings.iter().map(|s| (*s).to_owned()).collect(),
                expressions,
            ),
        });
}

pub fn property(job: &mut CompilationJob, view: XrefId, target: XrefId, name: &str, expr: Expression) {
    job.unit_mut(view).unwrap().update.push(UpdateOp::Property {
        target,
        name: name.to_owned(),
        expression: expr,
    });
}

pub fn child_template(job: &mut CompilationJob, parent: XrefId, tag: Option<&str>) -> (XrefId, XrefId) {
    let view = job.create_view(parent);
    let xref = job.allocate_xref();
    job.unit_mut(parent)
        .unwrap()
        .create
        .push(CreateOp::Template {
            xref,
            view,
            tag: tag.map(str::to_owned),
            local_refs: Vec::new(),
            handle: SlotHandle::new(),
        });
    (xref, view)
}

/// A repeated block binding `item` and `idx`, with its repeater update op.
pub fn repeater(
    job: &mut CompilationJob,
    parent: XrefId,
    track: Expression,
    collection: Expression,
    with_empty: bool,
) -> (XrefId, XrefId, Option<XrefId>) {
    let view = job.create_view(parent);
    {
        let unit = job.unit_mut(view).unwrap();
        unit.context_variables
            .insert("item".to_owned(), "$implicit".to_owned());
        unit.context_variables
            .insert("idx".to_owned(), "$index".to_owned());
    }
    let empty_view = if with_empty {
        Some(job.create_view(parent))
    } else {
        None
    };
    let xref = job.allocate_xref();
    let unit = job.unit_mut(parent).unwrap();
    unit.create.push(CreateOp::RepeaterCreate {
        xref,
        view,
        empty_view,
        tag: None,
        empty_tag: None,
        track,
        track_by_fn: None,
        uses_component_instance: false,
        handle: SlotHandle::new(),
    });
    unit.update.push(UpdateOp::Repeater {
        target: xref,
        collection,
    });
    (xref, view, empty_view)
}
