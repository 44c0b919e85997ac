//! The phase pipeline.
//!
//! Phases are registered in a statically fixed order and run exactly once per
//! job, gated only by the job kind. Each phase mutates the job in place and
//! returns nothing; ordering encodes the data dependencies between them (a
//! phase that consumes a fact runs after the phase that produces it). See
//! DESIGN.md for the dependency graph.

pub mod conditionals;
pub mod defer_configs;
pub mod defer_resolve_targets;
pub mod extract_i18n_messages;
pub mod generate_advance;
pub mod generate_variables;
pub mod naming;
pub mod pipe_creation;
pub mod reify;
pub mod resolve_names;
pub mod save_restore_view;
pub mod slot_allocation;
pub mod track_fn_optimization;
pub mod var_counting;

use crate::compilation::{CompilationJob, JobKind};
use crate::error::Result;

/// Which job kinds a phase applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppliesTo {
    Template,
    Host,
    Both,
}

impl AppliesTo {
    fn matches(self, kind: JobKind) -> bool {
        match self {
            AppliesTo::Template => kind == JobKind::Template,
            AppliesTo::Host => kind == JobKind::Host,
            AppliesTo::Both => true,
        }
    }
}

struct Phase {
    name: &'static str,
    applies_to: AppliesTo,
    run: fn(&mut CompilationJob) -> Result<()>,
}

/// The fixed phase order. Do not reorder without checking the dependency
/// graph: later phases assume the invariants established by earlier ones.
const PHASES: &[Phase] = &[
    Phase {
        name: "save_restore_view",
        applies_to: AppliesTo::Template,
        run: save_restore_view::save_and_restore_view,
    },
    Phase {
        name: "generate_variables",
        applies_to: AppliesTo::Template,
        run: generate_variables::generate_variables,
    },
    Phase {
        name: "resolve_names",
        applies_to: AppliesTo::Both,
        run: resolve_names::resolve_names,
    },
    Phase {
        name: "conditionals",
        applies_to: AppliesTo::Template,
        run: conditionals::generate_conditionals,
    },
    Phase {
        name: "track_fn_optimization",
        applies_to: AppliesTo::Template,
        run: track_fn_optimization::optimize_track_fns,
    },
    Phase {
        name: "pipe_creation",
        applies_to: AppliesTo::Template,
        run: pipe_creation::create_pipes,
    },
    Phase {
        name: "defer_resolve_targets",
        applies_to: AppliesTo::Template,
        run: defer_resolve_targets::resolve_defer_target_names,
    },
    Phase {
        name: "defer_configs",
        applies_to: AppliesTo::Template,
        run: defer_configs::configure_defer_instructions,
    },
    Phase {
        name: "extract_i18n_messages",
        applies_to: AppliesTo::Template,
        run: extract_i18n_messages::extract_i18n_messages,
    },
    Phase {
        name: "slot_allocation",
        applies_to: AppliesTo::Template,
        run: slot_allocation::allocate_slots,
    },
    Phase {
        name: "var_counting",
        applies_to: AppliesTo::Both,
        run: var_counting::count_variables,
    },
    Phase {
        name: "generate_advance",
        applies_to: AppliesTo::Template,
        run: generate_advance::generate_advance,
    },
    Phase {
        name: "naming",
        applies_to: AppliesTo::Both,
        run: naming::name_functions_and_variables,
    },
    Phase {
        name: "reify",
        applies_to: AppliesTo::Both,
        run: reify::reify,
    },
];

/// Runs every applicable phase over the job, in registration order.
pub fn transform(job: &mut CompilationJob) -> Result<()> {
    for phase in PHASES {
        if !phase.applies_to.matches(job.kind) {
            continue;
        }
        log::debug!("phase {} ({})", phase.name, job.component_name);
        (phase.run)(job)?;
    }
    Ok(())
}
