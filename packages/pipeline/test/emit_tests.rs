mod common;

use common::*;
use view_pipeline::compilation::CompilationJob;
use view_pipeline::error::CompileError;
use view_pipeline::ir::handle::SlotHandle;
use view_pipeline::ir::ops::{ConditionalCase, OpKindName, UpdateOp};
use view_pipeline::output::{str_lit, Expression, Statement};
use view_pipeline::{compile_template, emit_host_binding_function, emit_template_function, transform};

fn simple_template() -> CompilationJob {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let div = element(&mut job, root, "div");
    property(&mut job, root, div, "title", lexical("heading"));
    let text = text_node(&mut job, root, "");
    interpolate_text(&mut job, root, text, &["", ""], vec![lexical("name")]);
    job
}

#[test]
fn unlowered_create_op_fails_emission() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    element(&mut job, root, "div");
    job.unit_mut(root).unwrap().fn_name = Some("Comp_Template".to_owned());

    // The pipeline never ran, so the element op is still structured.
    match emit_template_function(&mut job) {
        Err(CompileError::NotLowered { kind }) => assert_eq!(kind, OpKindName::ElementStart),
        other => panic!("expected a not-lowered failure, got {:?}", other),
    }
}

#[test]
fn unlowered_update_op_fails_emission() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let div = element(&mut job, root, "div");
    job.unit_mut(root).unwrap().create.take();
    property(&mut job, root, div, "title", lexical("heading"));
    job.unit_mut(root).unwrap().fn_name = Some("Comp_Template".to_owned());

    match emit_template_function(&mut job) {
        Err(CompileError::NotLowered { kind }) => assert_eq!(kind, OpKindName::Property),
        other => panic!("expected a not-lowered failure, got {:?}", other),
    }
}

#[test]
fn create_and_update_blocks_are_guarded_by_render_flags() {
    let compiled = compile_template(simple_template()).unwrap();
    let printed = compiled.function.to_string();

    assert!(printed.starts_with("function Comp_Template(rf, ctx) {"));
    assert!(printed.contains("if ((rf & 1)) {"));
    assert!(printed.contains("if ((rf & 2)) {"));

    // Create instructions under the create flag, bindings under update.
    let create_block = printed.find("if ((rf & 1))").unwrap();
    let update_block = printed.find("if ((rf & 2))").unwrap();
    assert!(create_block < update_block);
    let element_call = printed.find("elementStart(0, \"div\")").unwrap();
    let property_call = printed.find("property(\"title\", ctx.heading)").unwrap();
    assert!(element_call > create_block && element_call < update_block);
    assert!(property_call > update_block);
    assert!(printed.contains("textInterpolate(ctx.name)"));
}

#[test]
fn update_block_advances_the_slot_cursor_between_targets() {
    let compiled = compile_template(simple_template()).unwrap();
    let printed = compiled.function.to_string();

    // The property targets slot 0; the interpolation targets slot 1.
    let property_call = printed.find("property(").unwrap();
    let advance_call = printed.find("advance(1)").unwrap();
    let interpolate_call = printed.find("textInterpolate(").unwrap();
    assert!(property_call < advance_call && advance_call < interpolate_call);
}

#[test]
fn update_ops_targeting_an_earlier_slot_fail_the_compile() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let first = element(&mut job, root, "div");
    let second = element(&mut job, root, "span");
    // Out of document order: the span binding comes before the div binding.
    property(&mut job, root, second, "title", lexical("a"));
    property(&mut job, root, first, "title", lexical("b"));

    match compile_template(job) {
        Err(CompileError::Assertion(message)) => assert!(message.contains("behind")),
        other => panic!("expected an ordering assertion, got {:?}", other),
    }
}

#[test]
fn child_view_functions_are_declared_before_their_parent_uses_them() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let (_, view) = child_template(&mut job, root, Some("span"));
    let text = text_node(&mut job, view, "");
    interpolate_text(&mut job, view, text, &["", ""], vec![lexical("name")]);

    let compiled = compile_template(job).unwrap();
    let child_name = "Comp_span_0_Template";
    assert!(compiled.pool_statements.iter().any(|stmt| matches!(
        stmt,
        Statement::DeclareFn { name, .. } if name == child_name
    )));
    let printed = compiled.function.to_string();
    // decls: the text node; vars: the inherited context copy plus the
    // interpolated expression.
    assert!(printed.contains("template(0, Comp_span_0_Template, 1, 2, \"span\")"));
}

#[test]
fn shared_constants_are_declared_with_stable_names() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    element(&mut job, root, "div");
    job.add_const(str_lit("shared"));

    transform(&mut job).unwrap();
    emit_template_function(&mut job).unwrap();

    let printed: Vec<String> = job
        .pool
        .statements
        .iter()
        .map(ToString::to_string)
        .collect();
    assert!(printed.iter().any(|s| s == "const _c0 = \"shared\";\n"));
}

#[test]
fn host_binding_job_emits_update_only_function() {
    let mut job = CompilationJob::new_host_binding("Dir");
    let root = job.root;
    let target = job.allocate_xref();
    property(&mut job, root, target, "id", lexical("hostId"));

    transform(&mut job).unwrap();
    let function = emit_host_binding_function(&mut job).unwrap().unwrap();
    let printed = function.to_string();

    assert!(printed.starts_with("function Dir_HostBindings(rf, ctx) {"));
    assert!(!printed.contains("rf & 1"));
    assert!(printed.contains("if ((rf & 2)) {"));
    assert!(printed.contains("property(\"id\", ctx.hostId)"));
}

#[test]
fn empty_host_binding_job_emits_nothing() {
    let mut job = CompilationJob::new_host_binding("Dir");
    transform(&mut job).unwrap();
    assert!(emit_host_binding_function(&mut job).unwrap().is_none());
}

#[test]
fn conditional_lowers_to_a_branch_selecting_chain() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let (then_op, _) = child_template(&mut job, root, None);
    let (else_op, _) = child_template(&mut job, root, None);
    job.unit_mut(root).unwrap().update.push(UpdateOp::Conditional {
        target: then_op,
        test: None,
        conditions: vec![
            ConditionalCase {
                target: then_op,
                target_slot: SlotHandle::new(),
                expr: Some(lexical("show")),
            },
            ConditionalCase {
                target: else_op,
                target_slot: SlotHandle::new(),
                expr: None,
            },
        ],
        processed: None,
    });

    let compiled = compile_template(job).unwrap();
    let printed = compiled.function.to_string();
    assert!(printed.contains("conditional((ctx.show ? 0 : 1))"));
}

#[test]
fn switch_test_is_evaluated_once_into_a_temporary() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let (case_op, _) = child_template(&mut job, root, None);
    job.unit_mut(root).unwrap().update.push(UpdateOp::Conditional {
        target: case_op,
        test: Some(lexical("mode")),
        conditions: vec![ConditionalCase {
            target: case_op,
            target_slot: SlotHandle::new(),
            expr: Some(str_lit("compact")),
        }],
        processed: None,
    });

    let compiled = compile_template(job).unwrap();
    let printed = compiled.function.to_string();
    // The shared test lands in a declaration; the case compares against it
    // and the caseless fallthrough renders nothing.
    assert!(printed.contains(" = ctx.mode;"));
    assert!(printed.contains("=== \"compact\") ? 0 : -1))"));
    assert!(!printed.contains("conditional(ctx.mode"));
}

#[test]
fn pipe_bindings_create_pipe_ops_and_bind_by_slot() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let div = element(&mut job, root, "div");
    property(
        &mut job,
        root,
        div,
        "when",
        Expression::PipeBinding {
            target: None,
            target_slot: SlotHandle::new(),
            name: "date".to_owned(),
            args: vec![lexical("now")],
        },
    );

    let compiled = compile_template(job).unwrap();
    let printed = compiled.function.to_string();
    assert!(printed.contains("pipe(1, \"date\")"));
    assert!(printed.contains("property(\"when\", pipeBind1(1, ctx.now))"));
}

#[test]
fn compiling_the_same_input_twice_is_byte_identical() {
    let first = compile_template(simple_template()).unwrap();
    let second = compile_template(simple_template()).unwrap();

    assert_eq!(first.function.to_string(), second.function.to_string());
    let pool = |stmts: &[Statement]| {
        stmts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<String>>()
    };
    assert_eq!(pool(&first.pool_statements), pool(&second.pool_statements));
}
