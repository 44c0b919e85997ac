mod common;

use common::*;
use view_pipeline::compilation::CompilationJob;
use view_pipeline::error::CompileError;
use view_pipeline::ir::handle::XrefId;
use view_pipeline::ir::ops::{CreateOp, UpdateOp, VariableOp};
use view_pipeline::ir::variable::{AliasVariable, SemanticVariable};
use view_pipeline::output::{Expression, RestoreViewTarget, Statement};
use view_pipeline::phases::generate_variables::generate_variables;
use view_pipeline::phases::resolve_names::resolve_names;
use view_pipeline::phases::save_restore_view::save_and_restore_view;

/// The variable op in `unit`'s update list declaring `xref`.
fn find_def(job: &CompilationJob, view: XrefId, xref: XrefId) -> VariableOp {
    job.unit(view)
        .unwrap()
        .update
        .iter()
        .find_map(|op| match op {
            UpdateOp::Variable(var) if var.xref == xref => Some(var.clone()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no declaration for {:?} in view {:?}", xref, view))
}

fn resolved_read(op: &UpdateOp) -> XrefId {
    match op {
        UpdateOp::InterpolateText { interpolation, .. } => match &interpolation.expressions[0] {
            Expression::ReadVariable { xref, .. } => *xref,
            other => panic!("read did not resolve: {:?}", other),
        },
        other => panic!("unexpected op: {:?}", other),
    }
}

#[test]
fn innermost_declaration_shadows_outer_ones() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    // Three nested repeated blocks, each binding `item` and `idx`.
    let (_, v1, _) = repeater(&mut job, root, lexical("$item"), lexical("as"), false);
    let (_, v2, _) = repeater(&mut job, v1, lexical("$item"), lexical("bs"), false);
    let (_, v3, _) = repeater(&mut job, v2, lexical("$item"), lexical("cs"), false);
    let text = text_node(&mut job, v3, "");
    interpolate_text(&mut job, v3, text, &["", ""], vec![lexical("item")]);

    generate_variables(&mut job).unwrap();
    resolve_names(&mut job).unwrap();

    let unit = job.unit(v3).unwrap();
    let read = resolved_read(unit.update.iter().last().unwrap());
    let def = find_def(&job, v3, read);
    assert_eq!(
        def.variable,
        SemanticVariable::Identifier {
            name: "item".to_owned()
        }
    );
    // The winning declaration is the innermost block's own binding, reading
    // its view's context, not an ancestor's.
    assert_eq!(
        def.initializer,
        Expression::Context(v3).prop("$implicit")
    );
}

#[test]
fn every_view_declares_copies_of_inherited_variables() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let (_, v1, _) = repeater(&mut job, root, lexical("$item"), lexical("as"), false);
    let (_, v2, _) = repeater(&mut job, v1, lexical("$item"), lexical("bs"), false);

    generate_variables(&mut job).unwrap();
    resolve_names(&mut job).unwrap();

    // v2 sees the root context plus two bindings from each enclosing block.
    let names: Vec<Option<String>> = job
        .unit(v2)
        .unwrap()
        .update
        .iter()
        .filter_map(|op| match op {
            UpdateOp::Variable(var) => Some(var.variable.lexical_name().map(str::to_owned)),
            _ => None,
        })
        .collect();
    assert_eq!(
        names,
        vec![
            None, // root context
            Some("item".to_owned()),
            Some("idx".to_owned()),
            Some("item".to_owned()),
            Some("idx".to_owned()),
        ]
    );

    // Inherited copies reach their ancestor context by hopping up one view
    // per nesting level.
    let root_ctx = job
        .unit(v2)
        .unwrap()
        .update
        .iter()
        .find_map(|op| match op {
            UpdateOp::Variable(var)
                if var.variable == (SemanticVariable::Context { view: root }) =>
            {
                Some(var.initializer.clone())
            }
            _ => None,
        })
        .unwrap();
    assert_eq!(root_ctx, Expression::NextContext { steps: 2 });
}

#[test]
fn undeclared_name_falls_back_to_component_property() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let text = text_node(&mut job, root, "");
    interpolate_text(&mut job, root, text, &["", ""], vec![lexical("title")]);

    generate_variables(&mut job).unwrap();
    resolve_names(&mut job).unwrap();

    let unit = job.unit(root).unwrap();
    match unit.update.iter().last().unwrap() {
        UpdateOp::InterpolateText { interpolation, .. } => {
            assert_eq!(
                interpolation.expressions[0],
                Expression::Context(root).prop("title")
            );
        }
        other => panic!("unexpected op: {:?}", other),
    }
}

#[test]
fn declarations_are_only_visible_after_their_own_position() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    // `first` reads `second`, which is declared below it; the read must fall
    // back to the component context rather than see the later declaration.
    let unit = job.unit_mut(root).unwrap();
    unit.aliases.push(AliasVariable {
        name: "first".to_owned(),
        expression: lexical("second"),
    });
    unit.aliases.push(AliasVariable {
        name: "second".to_owned(),
        expression: lexical("flag"),
    });

    generate_variables(&mut job).unwrap();
    resolve_names(&mut job).unwrap();

    let initializers: Vec<Expression> = job
        .unit(root)
        .unwrap()
        .update
        .iter()
        .filter_map(|op| match op {
            UpdateOp::Variable(var)
                if matches!(var.variable, SemanticVariable::Alias { .. }) =>
            {
                Some(var.initializer.clone())
            }
            _ => None,
        })
        .collect();
    assert_eq!(initializers[0], Expression::Context(root).prop("second"));
    assert_eq!(initializers[1], Expression::Context(root).prop("flag"));
}

#[test]
fn branch_alias_shadows_outer_names_throughout_its_subtree() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    // The same name is aliased on the root view and again on a branch view;
    // everything inside the branch must see the branch binding.
    job.unit_mut(root).unwrap().aliases.push(AliasVariable {
        name: "total".to_owned(),
        expression: lexical("a"),
    });
    let (_, branch) = child_template(&mut job, root, None);
    job.unit_mut(branch).unwrap().aliases.push(AliasVariable {
        name: "total".to_owned(),
        expression: lexical("b"),
    });
    let (_, inner) = child_template(&mut job, branch, None);
    let text = text_node(&mut job, inner, "");
    interpolate_text(&mut job, inner, text, &["", ""], vec![lexical("total")]);
    let button = element(&mut job, branch, "button");
    job.unit_mut(branch).unwrap().create.push(CreateOp::Listener {
        target: button,
        name: "click".to_owned(),
        handler: vec![UpdateOp::Statement(Statement::Expression(lexical(
            "total",
        )))],
    });

    generate_variables(&mut job).unwrap();
    resolve_names(&mut job).unwrap();

    fn root_ctx_copy<'a>(ops: impl Iterator<Item = &'a UpdateOp>, root: XrefId) -> XrefId {
        let mut ops = ops;
        ops.find_map(|op| match op {
            UpdateOp::Variable(var)
                if var.variable == (SemanticVariable::Context { view: root }) =>
            {
                Some(var.xref)
            }
            _ => None,
        })
        .unwrap()
    }

    // A read in a view nested inside the branch resolves to the branch
    // alias, whose copy evaluates `b` against the component context.
    let unit = job.unit(inner).unwrap();
    let read = resolved_read(unit.update.iter().last().unwrap());
    let def = find_def(&job, inner, read);
    assert_eq!(
        def.variable,
        SemanticVariable::Alias {
            name: "total".to_owned()
        }
    );
    let inner_ctx = root_ctx_copy(unit.update.iter(), root);
    assert_eq!(
        def.initializer,
        Expression::ReadVariable {
            xref: inner_ctx,
            name: None,
        }
        .prop("b")
    );

    // A listener handler in the branch gets its own copies; its read picks
    // the branch alias over the outer one too.
    let handler = job
        .unit(branch)
        .unwrap()
        .create
        .iter()
        .find_map(|op| match op {
            CreateOp::Listener { handler, .. } => Some(handler),
            _ => None,
        })
        .unwrap();
    let read = match handler.last().unwrap() {
        UpdateOp::Statement(Statement::Expression(Expression::ReadVariable { xref, .. })) => *xref,
        other => panic!("handler read did not resolve: {:?}", other),
    };
    let def = handler
        .iter()
        .find_map(|op| match op {
            UpdateOp::Variable(var) if var.xref == read => Some(var.clone()),
            _ => None,
        })
        .unwrap_or_else(|| panic!("handler read resolved outside the handler"));
    assert_eq!(
        def.variable,
        SemanticVariable::Alias {
            name: "total".to_owned()
        }
    );
    let handler_ctx = root_ctx_copy(handler.iter(), root);
    assert_eq!(
        def.initializer,
        Expression::ReadVariable {
            xref: handler_ctx,
            name: None,
        }
        .prop("b")
    );
}

#[test]
fn listener_in_embedded_view_saves_and_restores_the_view() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let (_, v1, _) = repeater(&mut job, root, lexical("$item"), lexical("items"), false);
    let button = element(&mut job, v1, "button");
    job.unit_mut(v1).unwrap().create.push(CreateOp::Listener {
        target: button,
        name: "click".to_owned(),
        handler: vec![UpdateOp::Statement(Statement::Expression(lexical("item")))],
    });

    save_and_restore_view(&mut job).unwrap();
    generate_variables(&mut job).unwrap();
    resolve_names(&mut job).unwrap();

    // The view snapshot is taken at creation time.
    let unit = job.unit(v1).unwrap();
    let saved_xref = match unit.create.iter().next().unwrap() {
        CreateOp::Variable(var) => {
            assert_eq!(var.variable, SemanticVariable::SavedView { view: v1 });
            assert_eq!(var.initializer, Expression::GetCurrentView);
            var.xref
        }
        other => panic!("expected saved view declaration, got {:?}", other),
    };

    let handler = unit
        .create
        .iter()
        .find_map(|op| match op {
            CreateOp::Listener { handler, .. } => Some(handler),
            _ => None,
        })
        .unwrap();

    // The handler re-enters the view through the saved snapshot, and its
    // body reads resolve to the handler's own variable copies.
    let restored = match &handler[0] {
        UpdateOp::Variable(var) => {
            assert_eq!(var.variable, SemanticVariable::Context { view: v1 });
            assert_eq!(
                var.initializer,
                Expression::RestoreView(RestoreViewTarget::Variable(Box::new(
                    Expression::ReadVariable {
                        xref: saved_xref,
                        name: None,
                    }
                )))
            );
            var.xref
        }
        other => panic!("expected restored context, got {:?}", other),
    };

    let handler_defs: Vec<XrefId> = handler
        .iter()
        .filter_map(|op| match op {
            UpdateOp::Variable(var) => Some(var.xref),
            _ => None,
        })
        .collect();
    match handler.last().unwrap() {
        UpdateOp::Statement(Statement::Expression(Expression::ReadVariable { xref, .. })) => {
            assert!(*xref != restored);
            assert!(handler_defs.contains(xref));
        }
        other => panic!("handler read did not resolve: {:?}", other),
    }
}

#[test]
fn restoring_an_unsaved_view_is_an_error() {
    let mut job = CompilationJob::new_template("Comp");
    let root = job.root;
    let (_, v1, _) = repeater(&mut job, root, lexical("$item"), lexical("items"), false);
    let button = element(&mut job, v1, "button");
    let ctx_var = job.allocate_xref();
    job.unit_mut(v1).unwrap().create.push(CreateOp::Listener {
        target: button,
        name: "click".to_owned(),
        handler: vec![UpdateOp::Variable(VariableOp {
            xref: ctx_var,
            variable: SemanticVariable::Context { view: v1 },
            initializer: Expression::RestoreView(RestoreViewTarget::View(v1)),
            name: None,
        })],
    });

    // No save pass ran, so there is nothing to restore from.
    match resolve_names(&mut job) {
        Err(CompileError::MissingSavedView(view)) => assert_eq!(view, v1),
        other => panic!("expected missing saved view, got {:?}", other),
    }
}
