//! Normalisation rules and the document-order normalisation pass.
//!
//! A normalisation rule looks at one tag at a time. Its primary pattern is
//! searched in the rendered tag body; guards see the body together with the
//! rest of the sentence. When the pattern matches, the rule's action
//! expressions are evaluated against the captures and written to the tag.
//!
//! The reference context flows through the rules of a tag and on to the next
//! tag:
//!
//! ```text
//! tracker ─► rule 1 ─► rule 2 ─► ... ─► tracker'   (per tag, document order)
//! ```

use super::diagnostics::{Diagnostics, WarningKind};
use super::error::LoadError;
use super::expr::{EvalContext, EvalError, Expr};
use super::guards::{Guard, GuardScope, Guards};
use super::metrics::PhaseMetrics;
use super::pattern::{Pattern, PatternError, RenderMode, Rendered, parse_bool};
use super::plan::RuleEngine;
use super::rule::{LoadRule, Rule, RuleFlags};
use super::rule_file::{FieldKey, FieldSet};
use crate::document::{DirectionClassifier, Document, TagId, TagKind, TaggedToken, Timex, features_for};
use crate::temporal::{ReferenceTracker, TimePoint};
use std::time::Instant;

const ALLOWED: &[FieldKey] = &[
    FieldKey::Type,
    FieldKey::Match,
    FieldKey::Id,
    FieldKey::Guard,
    FieldKey::BeforeGuard,
    FieldKey::AfterGuard,
    FieldKey::After,
    FieldKey::CaseSensitive,
    FieldKey::Tokenise,
    FieldKey::Value,
    FieldKey::ChangeType,
    FieldKey::Freq,
    FieldKey::Quant,
    FieldKey::Mod,
];

const ACTIONS: &[FieldKey] = &[FieldKey::Value, FieldKey::ChangeType, FieldKey::Freq, FieldKey::Quant, FieldKey::Mod];

/// What a normalisation rule sees and may change.
pub struct NormalisationState<'a> {
    pub tag: TagId,
    pub timex: &'a mut Timex,
    /// Reference context; rules hand the updated context back through here.
    pub context: ReferenceTracker,
    pub body: &'a [TaggedToken],
    pub before: &'a [TaggedToken],
    pub after: &'a [TaggedToken],
    pub diagnostics: &'a mut Diagnostics,
}

#[derive(Debug, Clone)]
pub struct NormalisationRule {
    id: String,
    kind: Option<TagKind>,
    pattern: Pattern,
    guards: Guards,
    mode: RenderMode,
    actions: Vec<(FieldKey, Expr)>,
}

impl NormalisationRule {
    /// Build a rule that applies to tags of `kind` (any kind when `None`).
    pub fn new(id: impl Into<String>, kind: Option<TagKind>, pattern: &str, mode: RenderMode, flags: RuleFlags) -> Result<Self, PatternError> {
        let pattern = Pattern::compile(pattern, &mode, flags.contains(RuleFlags::CASE_SENSITIVE))?;
        Ok(NormalisationRule { id: id.into(), kind, pattern, guards: Guards::default(), mode, actions: Vec::new() })
    }

    pub fn with_guard(mut self, scope: GuardScope, spec: &str, case_sensitive: bool) -> Result<Self, PatternError> {
        self.guards.push(scope, Guard::compile(spec, &self.mode, case_sensitive)?);
        Ok(self)
    }

    /// Add an action; `key` must be one of `Value`, `Change-Type`, `Freq`,
    /// `Quant` or `Mod`.
    pub fn with_action(mut self, key: FieldKey, expr: Expr) -> Self {
        debug_assert!(ACTIONS.contains(&key), "{} is not an action field", key.name());
        self.actions.push((key, expr));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> Option<TagKind> {
        self.kind
    }

    fn guards_pass(&self, body: &Rendered, before: &Rendered, after: &Rendered) -> bool {
        if self.guards.is_empty() {
            return true;
        }
        let separator = self.mode.separator();
        let whole = [&before.text, &body.text, &after.text]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(separator);
        self.guards.check(GuardScope::Whole, &whole)
            && self.guards.check(GuardScope::Before, &before.text)
            && self.guards.check(GuardScope::After, &after.text)
    }

    fn evaluate(&self, cx: &mut EvalContext<'_>) -> Result<Vec<(FieldKey, String)>, (FieldKey, EvalError)> {
        let mut out = Vec::with_capacity(self.actions.len());
        for (key, expr) in &self.actions {
            let value = expr.eval(cx).map_err(|err| (*key, err))?;
            let value = value.to_string();
            if *key == FieldKey::ChangeType && TagKind::parse(&value).is_none() {
                return Err((*key, EvalError::Conversion { func: "Change-Type", input: value }));
            }
            out.push((*key, value));
        }
        Ok(out)
    }
}

impl<'a> Rule<NormalisationState<'a>> for NormalisationRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, state: &mut NormalisationState<'a>) -> bool {
        if let Some(kind) = self.kind {
            if state.timex.kind() != kind {
                return false;
            }
        }
        let body = Rendered::new(state.body, &self.mode);
        let before = Rendered::new(state.before, &self.mode);
        let after = Rendered::new(state.after, &self.mode);
        if !self.guards_pass(&body, &before, &after) {
            return false;
        }
        let Some(captures) = self.pattern.captures(&body.text) else {
            return false;
        };

        let text = state.body.iter().map(|t| t.token.text.as_str()).collect::<Vec<_>>().join(" ");
        let mut local = Diagnostics::default();
        let outcome = {
            let mut cx = EvalContext {
                captures: &captures,
                text: &text,
                kind: state.timex.kind(),
                context: &state.context,
                direction: state.timex.direction,
                diagnostics: &mut local,
            };
            self.evaluate(&mut cx)
        };
        state.diagnostics.absorb(local, &self.id, state.tag);

        let results = match outcome {
            Ok(results) => results,
            Err((key, EvalError::Unresolved)) => {
                tracing::debug!(rule = %self.id, tag = %state.tag, field = key.name(), "point left unresolved");
                return false;
            }
            Err((key, err)) => {
                state.diagnostics.warn_for(
                    WarningKind::ExpressionFailed,
                    &self.id,
                    Some(state.tag),
                    format!("{}: {err}", key.name()),
                );
                return false;
            }
        };

        let mut produced_value = None;
        for (key, value) in results {
            match key {
                FieldKey::Value => produced_value = Some(value),
                FieldKey::ChangeType => {
                    let kind = TagKind::parse(&value);
                    state.timex.kind_override = kind;
                    if kind == Some(TagKind::Set) {
                        state.timex.set = true;
                    }
                }
                FieldKey::Freq => state.timex.freq = Some(value),
                FieldKey::Quant => state.timex.quant = Some(value),
                FieldKey::Mod => state.timex.modifier = Some(value),
                _ => {}
            }
        }
        if let Some(value) = produced_value {
            if state.timex.effective_kind().is_point() {
                if let Ok(point) = TimePoint::parse(&value) {
                    if state.context.update(point) {
                        tracing::trace!(tag = %state.tag, %point, "reference updated");
                    }
                }
            }
            tracing::debug!(rule = %self.id, tag = %state.tag, %value, "normalised");
            state.timex.value = Some(value);
        }
        true
    }
}

impl LoadRule for NormalisationRule {
    const KIND: &'static str = "normalisation rules";

    fn from_fields(file: &str, id: &str, fields: &FieldSet) -> Result<Self, Vec<LoadError>> {
        let mut errors = Vec::new();
        fields.check_allowed(file, id, Self::KIND, ALLOWED, &mut errors);

        let invalid = |field: FieldKey, message: String| LoadError::InvalidField {
            file: file.to_string(),
            rule: id.to_string(),
            field: field.name().to_string(),
            message,
        };
        let pattern_error = |pattern: &str, err: PatternError| LoadError::Pattern {
            file: file.to_string(),
            rule: id.to_string(),
            pattern: pattern.to_string(),
            message: err.to_string(),
        };

        let kind = match fields.first(FieldKey::Type) {
            Some(text) => match TagKind::parse(text) {
                Some(kind) => Some(kind),
                None => {
                    errors.push(invalid(FieldKey::Type, format!("unknown type `{text}`")));
                    None
                }
            },
            None => None,
        };
        let mut flags = RuleFlags::empty();
        if let Some(text) = fields.first(FieldKey::CaseSensitive) {
            match parse_bool(text) {
                Some(value) => flags.set(RuleFlags::CASE_SENSITIVE, value),
                None => errors.push(invalid(FieldKey::CaseSensitive, format!("expected a boolean, found `{text}`"))),
            }
        }
        let case_sensitive = flags.contains(RuleFlags::CASE_SENSITIVE);
        let mode = fields.first(FieldKey::Tokenise).map(RenderMode::from_field).unwrap_or_default();

        let mut rule = match fields.first(FieldKey::Match) {
            Some(source) => match NormalisationRule::new(id, kind, source, mode.clone(), flags) {
                Ok(rule) => Some(rule),
                Err(err) => {
                    errors.push(pattern_error(source, err));
                    None
                }
            },
            None => {
                errors.push(LoadError::MissingField { file: file.to_string(), rule: id.to_string(), field: "Match" });
                None
            }
        };
        let groups = rule.as_ref().map(|rule| rule.pattern.group_count());

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

        for &key in ACTIONS {
            let Some(source) = fields.first(key) else {
                continue;
            };
            let parsed = Expr::parse(source).and_then(|expr| match groups {
                Some(groups) => expr.check_captures(groups).map(|()| expr),
                None => Ok(expr),
            });
            match parsed {
                Ok(expr) => {
                    if let Some(rule) = rule.as_mut() {
                        rule.actions.push((key, expr));
                    }
                }
                Err(err) => errors.push(LoadError::Expression {
                    file: file.to_string(),
                    rule: id.to_string(),
                    field: key.name().to_string(),
                    message: err.to_string(),
                }),
            }
        }

        match rule {
            Some(rule) if errors.is_empty() => Ok(rule),
            _ => Err(errors),
        }
    }
}

impl RuleEngine<NormalisationRule> {
    /// Normalise every attached tag of `document`: sentences in order, tags by
    /// their first token. `context` is read and advanced as tags resolve.
    pub fn normalise(
        &self,
        document: &mut Document,
        context: &mut ReferenceTracker,
        classifier: Option<&dyn DirectionClassifier>,
        diagnostics: &mut Diagnostics,
    ) -> PhaseMetrics {
        let started = Instant::now();
        let mut metrics = PhaseMetrics::default();
        for sentence in document.sentences_mut() {
            for (index, range) in sentence.tags_in_order() {
                let tag = TagId::new(sentence.index(), index);
                if let Some(classifier) = classifier {
                    let unlabelled = sentence.tag(index).filter(|timex| timex.direction.is_none()).map(Timex::kind);
                    if let Some(kind) = unlabelled {
                        let direction = classifier.classify(&features_for(kind, sentence.tokens(), range.clone()));
                        if let Some(timex) = sentence.tag_mut(index) {
                            timex.direction = direction;
                        }
                    }
                }

                let Some((timex, tokens)) = sentence.tag_and_tokens_mut(index) else {
                    continue;
                };
                let mut state = NormalisationState {
                    tag,
                    timex,
                    context: *context,
                    body: &tokens[range.clone()],
                    before: &tokens[..*range.start()],
                    after: &tokens[range.end() + 1..],
                    diagnostics: &mut *diagnostics,
                };
                let fired = self.apply(&mut state);
                *context = state.context;
                metrics.rules_fired += fired;
                if fired > 0 {
                    metrics.tags_touched += 1;
                }
            }
        }
        metrics.duration = started.elapsed();
        tracing::debug!(tags = metrics.tags_touched, rules = metrics.rules_fired, "normalisation finished");
        metrics
    }
}
