//! Load-time errors.
//!
//! Loading never stops at the first problem: every file is parsed and every
//! rule validated, and the full list comes back as [`LoadErrors`].

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{file}:{line}: {message}")]
    Parse { file: String, line: usize, message: String },
    #[error("{file}:{line}: unknown field `{field}`")]
    UnknownField { file: String, line: usize, field: String },
    #[error("{file}: rule `{rule}` is missing required field `{field}`")]
    MissingField { file: String, rule: String, field: &'static str },
    #[error("{file}: rule `{rule}`: invalid `{field}`: {message}")]
    InvalidField { file: String, rule: String, field: String, message: String },
    #[error("{file}: rule `{rule}`: bad pattern `{pattern}`: {message}")]
    Pattern { file: String, rule: String, pattern: String, message: String },
    #[error("{file}: rule `{rule}`: bad `{field}` expression: {message}")]
    Expression { file: String, rule: String, field: String, message: String },
    #[error("{file}: duplicate rule id `{id}` (first defined in {first})")]
    DuplicateId { file: String, id: String, first: String },
    #[error("{file}: rule `{rule}` runs after unknown rule `{after}`")]
    UnresolvedAfter { file: String, rule: String, after: String },
    #[error("cyclic `After` dependencies: {}", ids.join(" -> "))]
    Cycle { ids: Vec<String> },
}

/// Every error found while loading one rule set.
#[derive(Debug, thiserror::Error)]
#[error("{} rule load error(s):\n{}", .0.len(), render_list(.0))]
pub struct LoadErrors(pub Vec<LoadError>);

impl LoadErrors {
    pub fn errors(&self) -> &[LoadError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LoadError> {
        self.0.iter()
    }
}

impl From<Vec<LoadError>> for LoadErrors {
    fn from(errors: Vec<LoadError>) -> Self {
        LoadErrors(errors)
    }
}

fn render_list(errors: &[LoadError]) -> String {
    errors.iter().map(|err| format!("  {err}")).collect::<Vec<_>>().join("\n")
}
