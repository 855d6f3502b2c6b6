//! Positive and negative guard patterns.

use super::pattern::{Pattern, PatternError, RenderMode};

/// Which text a guard is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardScope {
    /// Prefix, body and suffix together.
    Whole,
    /// Text preceding the body.
    Before,
    /// Text following the body.
    After,
}

#[derive(Debug, Clone)]
pub struct Guard {
    pattern: Pattern,
    negated: bool,
}

impl Guard {
    /// Compile a guard; a leading `!` means the pattern must *not* match.
    pub fn compile(spec: &str, mode: &RenderMode, case_sensitive: bool) -> Result<Guard, PatternError> {
        let spec = spec.trim();
        let (negated, source) = match spec.strip_prefix('!') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, spec),
        };
        Ok(Guard { pattern: Pattern::compile(source, mode, case_sensitive)?, negated })
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn passes(&self, text: &str) -> bool {
        self.pattern.is_match(text) != self.negated
    }
}

/// Guards of one rule, grouped by scope.
#[derive(Debug, Clone, Default)]
pub struct Guards {
    whole: Vec<Guard>,
    before: Vec<Guard>,
    after: Vec<Guard>,
}

impl Guards {
    pub fn push(&mut self, scope: GuardScope, guard: Guard) {
        match scope {
            GuardScope::Whole => self.whole.push(guard),
            GuardScope::Before => self.before.push(guard),
            GuardScope::After => self.after.push(guard),
        }
    }

    /// Every guard of `scope` passes on `text`. An empty scope passes.
    pub fn check(&self, scope: GuardScope, text: &str) -> bool {
        let guards = match scope {
            GuardScope::Whole => &self.whole,
            GuardScope::Before => &self.before,
            GuardScope::After => &self.after,
        };
        guards.iter().all(|guard| guard.passes(text))
    }

    pub fn is_empty(&self) -> bool {
        self.whole.is_empty() && self.before.is_empty() && self.after.is_empty()
    }

    pub fn len(&self) -> usize {
        self.whole.len() + self.before.len() + self.after.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard(spec: &str) -> Guard {
        Guard::compile(spec, &RenderMode::Tokenised, false).unwrap()
    }

    #[test]
    fn negated_guard_passes_on_no_match() {
        let positive = guard("<ago~RB>");
        let negative = guard("!<ago~RB>");
        assert!(negative.is_negated());
        assert!(!positive.passes(""));
        assert!(negative.passes(""));
        assert!(positive.passes("<ago~RB>"));
        assert!(!negative.passes("<three~CD><days~NNS><ago~RB>"));
    }

    #[test]
    fn scopes_are_and_ed() {
        let mut guards = Guards::default();
        guards.push(GuardScope::Whole, guard("<May~.+>"));
        guards.push(GuardScope::Whole, guard("!<May~MD>"));
        guards.push(GuardScope::After, guard("<\\d+~CD>"));
        assert_eq!(guards.len(), 3);

        assert!(guards.check(GuardScope::Whole, "<in~IN><May~NNP>"));
        assert!(!guards.check(GuardScope::Whole, "<you~PRP><may~MD><go~VB>"));
        assert!(guards.check(GuardScope::Before, "anything"));
        assert!(!guards.check(GuardScope::After, "<.~.>"));
    }
}
