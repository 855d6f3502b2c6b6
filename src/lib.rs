//! Rule-driven recognition and normalisation of temporal expressions.
//!
//! `timexer` finds temporal expressions (TIMEX) in tokenised, POS-tagged text
//! and gives each one a normalised calendar value. Both steps are driven by
//! plain-text rule files:
//!
//! - **recognition** rules match token patterns and create tags over spans;
//! - **normalisation** rules match inside one tag and compute its value,
//!   resolving relative expressions ("last Friday", "three days ago")
//!   against the document timestamp or the previously mentioned point.
//!
//! The public surface is small: build a [`Document`], load a [`Tagger`]
//! from a rule directory and call [`Tagger::annotate`].

extern crate self as timexer;

#[macro_use]
mod macros;
pub mod api;
pub mod document;
pub mod engine;
pub mod temporal;

#[cfg(test)]
mod rules_tests;

pub use api::{AnnotateResult, DirectionClassifier, Options, Tagger};
pub use document::{Direction, Document, Sentence, TagFeatures, TagId, TagKind, TaggedToken, Timex, Token};
pub use engine::{Diagnostics, LoadError, LoadErrors, RunMetrics, Warning, WarningKind};
pub use temporal::TimePoint;
