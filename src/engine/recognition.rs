//! Recognition rules: find spans and create (or squelch) tags.

use super::error::LoadError;
use super::guards::{Guard, GuardScope, Guards};
use super::metrics::PhaseMetrics;
use super::pattern::{Pattern, PatternError, RenderMode, Rendered, parse_bool};
use super::plan::RuleEngine;
use super::rule::{LoadRule, Rule, RuleFlags};
use super::rule_file::{FieldKey, FieldSet};
use crate::document::{Document, Sentence, TagKind, Timex};
use rayon::prelude::*;
use std::ops::RangeInclusive;
use std::time::Instant;

const ALLOWED: &[FieldKey] = &[
    FieldKey::Type,
    FieldKey::Match,
    FieldKey::Id,
    FieldKey::Guard,
    FieldKey::BeforeGuard,
    FieldKey::AfterGuard,
    FieldKey::After,
    FieldKey::Squelch,
    FieldKey::CaseSensitive,
    FieldKey::Tokenise,
];

#[derive(Debug, Clone)]
pub struct RecognitionRule {
    id: String,
    kind: TagKind,
    pattern: Pattern,
    guards: Guards,
    mode: RenderMode,
    flags: RuleFlags,
}

impl RecognitionRule {
    pub fn new(id: impl Into<String>, kind: TagKind, pattern: &str, mode: RenderMode, flags: RuleFlags) -> Result<Self, PatternError> {
        let pattern = Pattern::compile(pattern, &mode, flags.contains(RuleFlags::CASE_SENSITIVE))?;
        Ok(RecognitionRule { id: id.into(), kind, pattern, guards: Guards::default(), mode, flags })
    }

    pub fn with_guard(mut self, scope: GuardScope, spec: &str) -> Result<Self, PatternError> {
        let guard = Guard::compile(spec, &self.mode, self.flags.contains(RuleFlags::CASE_SENSITIVE))?;
        self.guards.push(scope, guard);
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn is_squelch(&self) -> bool {
        self.flags.contains(RuleFlags::SQUELCH)
    }

    /// Token ranges of accepted matches, in sentence order.
    fn accepted_ranges(&self, sentence: &Sentence) -> Vec<RangeInclusive<usize>> {
        let rendered = Rendered::new(sentence.tokens(), &self.mode);
        if !self.guards.check(GuardScope::Whole, &rendered.text) {
            return Vec::new();
        }
        self.pattern
            .find_spans(&rendered.text)
            .into_iter()
            .filter(|span| {
                self.guards.check(GuardScope::Before, &rendered.text[..span.start])
                    && self.guards.check(GuardScope::After, &rendered.text[span.end..])
            })
            .filter_map(|span| rendered.token_range(span.start, span.end))
            .collect()
    }
}

impl Rule<Sentence> for RecognitionRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, sentence: &mut Sentence) -> bool {
        let ranges = self.accepted_ranges(sentence);
        for range in &ranges {
            if self.is_squelch() {
                tracing::debug!(rule = %self.id, sentence = sentence.index(), tokens = ?range, "squelched");
                sentence.clear_tags(range.clone());
            } else {
                let id = sentence.push_tag(Timex::new(self.kind));
                sentence.attach(range.clone(), id);
                tracing::debug!(rule = %self.id, tag = %id, tokens = ?range, "recognised");
            }
        }
        !ranges.is_empty()
    }
}

impl LoadRule for RecognitionRule {
    const KIND: &'static str = "recognition rules";

    fn from_fields(file: &str, id: &str, fields: &FieldSet) -> Result<Self, Vec<LoadError>> {
        let mut errors = Vec::new();
        fields.check_allowed(file, id, Self::KIND, ALLOWED, &mut errors);

        let invalid = |field: FieldKey, message: String| LoadError::InvalidField {
            file: file.to_string(),
            rule: id.to_string(),
            field: field.name().to_string(),
            message,
        };
        let missing =
            |field: FieldKey| LoadError::MissingField { file: file.to_string(), rule: id.to_string(), field: field.name() };

        let kind = match fields.first(FieldKey::Type) {
            Some(text) => TagKind::parse(text).ok_or_else(|| invalid(FieldKey::Type, format!("unknown type `{text}`"))),
            None => Err(missing(FieldKey::Type)),
        };
        let mut flags = RuleFlags::empty();
        for (key, flag) in [(FieldKey::CaseSensitive, RuleFlags::CASE_SENSITIVE), (FieldKey::Squelch, RuleFlags::SQUELCH)] {
            if let Some(text) = fields.first(key) {
                match parse_bool(text) {
                    Some(value) => flags.set(flag, value),
                    None => errors.push(invalid(key, format!("expected a boolean, found `{text}`"))),
                }
            }
        }
        let mode = fields.first(FieldKey::Tokenise).map(RenderMode::from_field).unwrap_or_default();

        let kind = kind.map_err(|err| errors.push(err)).ok();
        let source = fields.first(FieldKey::Match);
        if source.is_none() {
            errors.push(missing(FieldKey::Match));
        }
        let pattern_error = |pattern: &str, err: PatternError| LoadError::Pattern {
            file: file.to_string(),
            rule: id.to_string(),
            pattern: pattern.to_string(),
            message: err.to_string(),
        };

        let case_sensitive = flags.contains(RuleFlags::CASE_SENSITIVE);
        let pattern = source.and_then(|source| {
            Pattern::compile(source, &mode, case_sensitive).map_err(|err| errors.push(pattern_error(source, err))).ok()
        });
        let mut rule = match (kind, pattern) {
            (Some(kind), Some(pattern)) => Some(RecognitionRule {
                id: id.to_string(),
                kind,
                pattern,
                guards: Guards::default(),
                mode: mode.clone(),
                flags,
            }),
            _ => None,
        };

        for (key, scope) in
            [(FieldKey::Guard, GuardScope::Whole), (FieldKey::BeforeGuard, GuardScope::Before), (FieldKey::AfterGuard, GuardScope::After)]
        {
            for field in fields.all(key) {
                match Guard::compile(&field.value, &mode, case_sensitive) {
                    Ok(guard) => {
                        if let Some(rule) = rule.as_mut() {
                            rule.guards.push(scope, guard);
                        }
                    }
                    Err(err) => errors.push(pattern_error(&field.value, err)),
                }
            }
        }

        match rule {
            Some(rule) if errors.is_empty() => Ok(rule),
            _ => Err(errors),
        }
    }
}

impl RuleEngine<RecognitionRule> {
    /// Run the plan over every sentence. Sentences are independent, so with
    /// `parallel` they are processed on the rayon pool.
    pub fn recognise(&self, document: &mut Document, parallel: bool) -> PhaseMetrics {
        let started = Instant::now();
        let run = |sentence: &mut Sentence| {
            let before = sentence.tag_count();
            let fired = self.apply(sentence);
            (fired, sentence.tag_count() - before)
        };
        let add = |a: (usize, usize), b: (usize, usize)| (a.0 + b.0, a.1 + b.1);
        let (rules_fired, tags_touched) = if parallel {
            document.sentences_mut().par_iter_mut().map(run).reduce(|| (0, 0), add)
        } else {
            document.sentences_mut().iter_mut().map(run).fold((0, 0), add)
        };
        let metrics = PhaseMetrics { duration: started.elapsed(), rules_fired, tags_touched };
        tracing::debug!(tags = tags_touched, rules = rules_fired, parallel, "recognition finished");
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rule_file::{RuleSource, parse_source};

    fn sentence() -> Sentence {
        Sentence::from_pairs(
            0,
            &[("He", "PRP"), ("left", "VBD"), ("last", "JJ"), ("Friday", "NNP"), ("and", "CC"), ("Friday", "NNP")],
        )
    }

    fn load(text: &str) -> Result<RecognitionRule, Vec<LoadError>> {
        let RuleSource::Single(fields) = parse_source("test.rule", text).unwrap() else {
            panic!("expected a single rule");
        };
        RecognitionRule::from_fields("test.rule", "test", &fields)
    }

    #[test]
    fn each_match_creates_a_tag() {
        let rule = load("Type: date\nMatch: <$DAYS~NNP>").unwrap();
        let mut sentence = sentence();
        assert!(rule.apply(&mut sentence));
        assert_eq!(sentence.tags_in_order(), vec![(0, 3..=3), (1, 5..=5)]);
        assert_eq!(sentence.tag(0).map(|t| t.kind()), Some(TagKind::Date));
    }

    #[test]
    fn tags_accumulate_on_shared_tokens() {
        let days = load("Type: date\nMatch: <$DAYS~NNP>").unwrap();
        let phrase = load("Type: date\nMatch: <last~JJ><$DAYS~NNP>").unwrap();
        let mut sentence = sentence();
        days.apply(&mut sentence);
        phrase.apply(&mut sentence);
        assert_eq!(sentence.tokens()[3].tags.len(), 2);
        assert_eq!(sentence.extent(2), Some(2..=3));
    }

    #[test]
    fn flanking_guards_see_exact_context() {
        let rule = load("Type: date\nMatch: <$DAYS~NNP>\nBefore-Guard: <last~JJ>$\n").unwrap();
        let mut sentence = sentence();
        assert!(rule.apply(&mut sentence));
        assert_eq!(sentence.tags_in_order(), vec![(0, 3..=3)]);

        let negated = load("Type: date\nMatch: <$DAYS~NNP>\nAfter-Guard: !^<and~CC>\n").unwrap();
        let mut sentence = self::sentence();
        negated.apply(&mut sentence);
        assert_eq!(sentence.tags_in_order(), vec![(0, 5..=5)]);
    }

    #[test]
    fn whole_guard_blocks_the_sentence() {
        let rule = load("Type: date\nMatch: <$DAYS~NNP>\nGuard: !<left~VBD>").unwrap();
        let mut sentence = sentence();
        assert!(!rule.apply(&mut sentence));
        assert!(sentence.tags_in_order().is_empty());
    }

    #[test]
    fn squelch_is_idempotent() {
        let tagger = load("Type: date\nMatch: <last~JJ><$DAYS~NNP>").unwrap();
        let squelch = load("Type: date\nMatch: <Friday~.+>\nSquelch: true").unwrap();
        assert!(squelch.is_squelch());

        let mut sentence = sentence();
        tagger.apply(&mut sentence);
        assert!(squelch.apply(&mut sentence));
        let once = sentence.clone();
        assert!(squelch.apply(&mut sentence));
        assert_eq!(sentence, once);
        assert!(sentence.tokens()[3].tags.is_empty() && sentence.tokens()[5].tags.is_empty());
        // `last` keeps the tag; only the matched tokens are cleared.
        assert_eq!(sentence.extent(0), Some(2..=2));
    }

    #[test]
    fn joined_mode_matches_plain_words() {
        let rule = load("Type: date\nMatch: last friday\nTokenise: false").unwrap();
        let mut sentence = sentence();
        assert!(rule.apply(&mut sentence));
        assert_eq!(sentence.tags_in_order(), vec![(0, 2..=3)]);
    }

    #[test]
    fn load_errors_are_collected() {
        let errors = load("Type: moment\nSquelch: maybe\nGuard: <(oops~NN>\nValue: 1").unwrap_err();
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| matches!(e, LoadError::InvalidField { field, .. } if field == "Value")));
        assert!(errors.iter().any(|e| matches!(e, LoadError::InvalidField { field, .. } if field == "Type")));
        assert!(errors.iter().any(|e| matches!(e, LoadError::InvalidField { field, .. } if field == "Squelch")));
        assert!(errors.iter().any(|e| matches!(e, LoadError::MissingField { field: "Match", .. })));
        assert!(errors.iter().any(|e| matches!(e, LoadError::Pattern { .. })));
    }

    #[test]
    fn api_construction_with_guards() {
        let rule = RecognitionRule::new("fri", TagKind::Date, "<Friday~NNP>", RenderMode::Tokenised, RuleFlags::empty())
            .and_then(|rule| rule.with_guard(GuardScope::Before, "<and~CC>$"))
            .unwrap();
        let mut sentence = sentence();
        assert!(rule.apply(&mut sentence));
        assert_eq!(sentence.tags_in_order(), vec![(0, 5..=5)]);
    }
}
