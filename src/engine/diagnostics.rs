//! Warning channel for rule application.
//!
//! Nothing that goes wrong while tagging one document aborts the run: the
//! affected rule is skipped and a [`Warning`] is recorded here. Each warning
//! is also emitted as a `tracing` event.

use crate::document::TagId;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningKind {
    /// A value expression failed to evaluate.
    ExpressionFailed,
    /// A date string (timestamp or literal) did not parse.
    MalformedDate,
    /// A rule needed a reference time and the document has none.
    MissingTimestamp,
    /// A fractional offset was truncated.
    FractionalOffset,
    /// The reference is not specific enough for the requested arithmetic.
    ReferenceUnavailable,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningKind::ExpressionFailed => "expression-failed",
            WarningKind::MalformedDate => "malformed-date",
            WarningKind::MissingTimestamp => "missing-timestamp",
            WarningKind::FractionalOffset => "fractional-offset",
            WarningKind::ReferenceUnavailable => "reference-unavailable",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    /// Rule being applied, when known.
    pub rule: Option<String>,
    /// Tag being normalised, when known.
    pub tag: Option<TagId>,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(rule) = &self.rule {
            write!(f, " rule `{rule}`")?;
        }
        if let Some(tag) = self.tag {
            write!(f, " on {tag}")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn warn(&mut self, kind: WarningKind, message: String) {
        tracing::warn!(kind = %kind, "{message}");
        self.warnings.push(Warning { kind, rule: None, tag: None, message });
    }

    pub fn warn_for(&mut self, kind: WarningKind, rule: &str, tag: Option<TagId>, message: String) {
        tracing::warn!(kind = %kind, rule, tag = ?tag, "{message}");
        self.warnings.push(Warning { kind, rule: Some(rule.to_string()), tag, message });
    }

    /// Move `other`'s warnings into `self`, filling in the rule and tag where
    /// they were not recorded.
    pub fn absorb(&mut self, other: Diagnostics, rule: &str, tag: TagId) {
        for mut warning in other.warnings {
            warning.rule.get_or_insert_with(|| rule.to_string());
            warning.tag.get_or_insert(tag);
            self.warnings.push(warning);
        }
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.warnings.extend(other.warnings);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absorbed_warnings_gain_rule_and_tag() {
        let mut local = Diagnostics::default();
        local.warn(WarningKind::FractionalOffset, "truncated".to_string());

        let mut all = Diagnostics::default();
        all.absorb(local, "offsets", TagId::new(0, 2));
        let warning = &all.warnings()[0];
        assert_eq!(warning.rule.as_deref(), Some("offsets"));
        assert_eq!(warning.tag, Some(TagId::new(0, 2)));
        assert_eq!(warning.to_string(), "[fractional-offset] rule `offsets` on t0.2: truncated");
    }
}
