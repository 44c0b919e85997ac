mod common;

use common::*;
use view_pipeline::compilation::CompilationJob;
use view_pipeline::instruction::Instruction;
use view_pipeline::ir::ops::CreateOp;
use view_pipeline::output::{variable, Expression, Statement};
use view_pipeline::phases::track_fn_optimization::optimize_track_fns;

/// All (track_by_fn, uses_component_instance) pairs in the root create list.
fn track_fns(job: &CompilationJob) -> Vec<(Expression, bool)> {
    job.unit(job.root)
        .unwrap()
        .create
        .iter()
        .filter_map(|op| match op {
            CreateOp::RepeaterCreate {
                track_by_fn,
                uses_component_instance,
                ..
            } => Some((track_by_fn.clone().unwrap(), *uses_component_instance)),
            _ => None,
        })
        .collect()
}

#[test]
fn item_and_index_map_to_builtin_helpers() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    repeater(&mut job, root, variable("$item"), lexical("as"), false);
    repeater(&mut job, root, variable("$index"), lexical("bs"), false);

    optimize_track_fns(&mut job).unwrap();

    let fns = track_fns(&job);
    assert_eq!(
        fns[0].0,
        Expression::RuntimeFn(Instruction::RepeaterTrackByIdentity)
    );
    assert_eq!(
        fns[1].0,
        Expression::RuntimeFn(Instruction::RepeaterTrackByIndex)
    );
    assert!(job.pool.statements.is_empty());
}

#[test]
fn identical_pure_track_expressions_share_one_function() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    repeater(&mut job, root, variable("$item").prop("id"), lexical("as"), false);
    repeater(&mut job, root, variable("$item").prop("id"), lexical("bs"), false);

    optimize_track_fns(&mut job).unwrap();

    let fns = track_fns(&job);
    assert_eq!(fns[0].0, variable("_forTrack0"));
    assert_eq!(fns[1].0, variable("_forTrack0"));

    // One pooled declaration backs both repeaters.
    assert_eq!(job.pool.statements.len(), 1);
    match &job.pool.statements[0] {
        Statement::DeclareVar {
            name,
            init: Some(Expression::Arrow { params, .. }),
        } => {
            assert_eq!(name, "_forTrack0");
            assert_eq!(params, &["$index".to_owned(), "$item".to_owned()]);
        }
        other => panic!("unexpected pool statement: {:?}", other),
    }
}

#[test]
fn distinct_pure_track_expressions_get_distinct_functions() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    repeater(&mut job, root, variable("$item").prop("id"), lexical("as"), false);
    repeater(&mut job, root, variable("$item").prop("key"), lexical("bs"), false);

    optimize_track_fns(&mut job).unwrap();

    let fns = track_fns(&job);
    assert_eq!(fns[0].0, variable("_forTrack0"));
    assert_eq!(fns[1].0, variable("_forTrack1"));
    assert_eq!(job.pool.statements.len(), 2);
}

#[test]
fn impure_track_expressions_are_never_shared() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let track = || variable("$item").prop("id").call(vec![]);
    repeater(&mut job, root, track(), lexical("as"), false);
    repeater(&mut job, root, track(), lexical("bs"), false);

    optimize_track_fns(&mut job).unwrap();

    // Identical in shape, but each keeps its own inline function.
    let fns = track_fns(&job);
    for (track_by_fn, uses_component) in &fns {
        assert!(!*uses_component);
        match track_by_fn {
            Expression::Function { name, params, body } => {
                assert_eq!(*name, None);
                assert_eq!(params, &["$index".to_owned(), "$item".to_owned()]);
                assert!(matches!(body[0], Statement::Return(_)));
            }
            other => panic!("expected inline function, got {:?}", other),
        }
    }
    assert!(job.pool.statements.is_empty());
}

#[test]
fn component_reads_bind_the_tracking_function_to_the_instance() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let track = lexical("compareItems").call(vec![variable("$index"), variable("$item")]);
    repeater(&mut job, root, track, lexical("items"), false);

    optimize_track_fns(&mut job).unwrap();

    let fns = track_fns(&job);
    let (track_by_fn, uses_component) = &fns[0];
    assert!(*uses_component);
    match track_by_fn {
        Expression::Function { body, .. } => match &body[0] {
            Statement::Return(Expression::Invoke { target, .. }) => {
                assert_eq!(
                    **target,
                    Expression::TrackContext { view: root }.prop("compareItems")
                );
            }
            other => panic!("unexpected body: {:?}", other),
        },
        other => panic!("expected inline function, got {:?}", other),
    }
    assert!(job.pool.statements.is_empty());
}
