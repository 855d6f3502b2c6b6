//! Rule engine.
//!
//! This module is the *public entry point* for the rule machinery. The
//! implementation is split into focused submodules under `src/engine/` while
//! the public paths stay flat (for example `crate::engine::RuleEngine` and
//! `crate::engine::RecognitionRule`).
//!
//! ## How the parts work together
//!
//! Rules are loaded once and then run over any number of documents:
//!
//! ```text
//! *.rule / *.ruleblock ──┐
//!                        │  parse_source            (rule_file.rs)
//!                        │  LoadRule::from_fields   (recognition.rs / normalisation.rs)
//!                        │    - Pattern::compile    (pattern.rs, guards.rs)
//!                        │    - Expr::parse         (expr.rs)
//!                        v
//!              RuleEngine::load_dir (plan.rs)
//!                - default ids, blocks
//!                - duplicate / unresolved `After` checks
//!                - Kahn schedule over `After` edges
//!                        │
//! document ──────────────┼──────────────────────────────
//!                        v
//!              RuleEngine::recognise (recognition.rs)
//!                - per sentence, optionally on rayon
//!                - create or squelch tags
//!                        │
//!                        v
//!              RuleEngine::normalise (normalisation.rs)
//!                - per tag, document order
//!                - evaluate actions, thread the reference context
//!                        │
//!                        v
//!              annotated Document + Diagnostics + RunMetrics
//! ```
//!
//! Loading never stops at the first problem: every error in every file is
//! collected into [`LoadErrors`]. Running never fails: anything that goes
//! wrong while normalising a tag becomes a [`Warning`] and the tag keeps
//! whatever it had.
//!
//! ## Responsibilities by module
//!
//! - `rule_file.rs`: the `Field: value` file format and `---` block sections.
//! - `pattern.rs`: compiles the pattern language (`<word~POS>`, `.`,
//!   `$CLASS`) to regexes over a rendered token sequence.
//! - `guards.rs`: extra whole/before/after conditions on a match.
//! - `expr.rs`: the action expression language and its builtin functions.
//! - `rule.rs`: the [`Rule`] trait, flags and [`RuleBlock`].
//! - `plan.rs`: loading, id validation and scheduling.
//! - `recognition.rs` / `normalisation.rs`: the two phases.
//! - `diagnostics.rs`, `error.rs`, `metrics.rs`: what a run reports back.
//!
//! ## Debugging
//!
//! Set `TIMEXER_LOG=timexer=trace` to see every rule that fires.

#[path = "engine/diagnostics.rs"]
mod diagnostics;
#[path = "engine/error.rs"]
mod error;
#[path = "engine/expr.rs"]
pub mod expr;
#[path = "engine/guards.rs"]
mod guards;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/normalisation.rs"]
mod normalisation;
#[path = "engine/pattern.rs"]
pub mod pattern;
#[path = "engine/plan.rs"]
mod plan;
#[path = "engine/recognition.rs"]
mod recognition;
#[path = "engine/rule.rs"]
mod rule;
#[path = "engine/rule_file.rs"]
pub mod rule_file;

pub use diagnostics::{Diagnostics, Warning, WarningKind};
pub use error::{LoadError, LoadErrors};
#[allow(unused_imports)]
pub use expr::{EvalContext, EvalError, Expr, ExprError, Value};
#[allow(unused_imports)]
pub use guards::{Guard, GuardScope, Guards};
pub use metrics::{PhaseMetrics, RunMetrics};
pub use normalisation::{NormalisationRule, NormalisationState};
#[allow(unused_imports)]
pub use pattern::{Pattern, PatternError, RenderMode, Rendered};
pub use plan::{PlanEntry, RuleEngine};
pub use recognition::RecognitionRule;
pub use rule::{BlockMode, LoadRule, Member, Rule, RuleBlock, RuleFlags};
pub use rule_file::FieldKey;
