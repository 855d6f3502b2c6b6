//! End-to-end checks of the rule set shipped in `rules/`.

use crate::api::{Options, Tagger};
use crate::document::{Direction, Document, TagFeatures, TagKind};
use crate::engine::WarningKind;
use once_cell::sync::Lazy;
use std::sync::Arc;

const DCT: &str = "2010-08-04";

static TAGGER: Lazy<Tagger> = Lazy::new(|| {
    let rules = concat!(env!("CARGO_MANIFEST_DIR"), "/rules");
    Tagger::from_rules_dir(rules).unwrap_or_else(|errors| panic!("shipped rules failed to load:\n{errors}"))
});

/// `(span text, value)` of every tag, in document order.
fn values(tagger: &Tagger, document: Document) -> Vec<(String, Option<String>)> {
    let out = tagger.annotate(document);
    out.document
        .tags()
        .into_iter()
        .map(|(id, timex)| (out.document.span_text(id).unwrap_or_default(), timex.value.clone()))
        .collect()
}

fn tag(sentences: &[&[(&str, &str)]]) -> Vec<(String, Option<String>)> {
    values(&TAGGER, Document::from_pairs(sentences).with_dct(DCT))
}

fn pair(span: &str, value: &str) -> (String, Option<String>) {
    (span.to_string(), Some(value.to_string()))
}

#[test]
fn shipped_rules_load_in_dependency_order() {
    let ids = TAGGER.recogniser().ids();
    assert_eq!(ids.len(), 15);
    let position = |id: &str| ids.iter().position(|x| *x == id).unwrap_or_else(|| panic!("no rule `{id}`"));
    assert!(position("relative-days") < position("day-before-clock"));
    assert!(position("day-before-clock") < position("clock-time"));
    assert!(position("month-date") < position("modal-may"));

    let ids = TAGGER.normaliser().ids();
    assert_eq!(ids, vec!["dates", "durations", "sets", "times", "year-modifiers"]);
}

#[test]
fn relative_days_and_weekdays() {
    let got = tag(&[&[
        ("He", "PRP"),
        ("left", "VBD"),
        ("yesterday", "NN"),
        ("and", "CC"),
        ("returned", "VBD"),
        ("last", "JJ"),
        ("Friday", "NNP"),
        (".", "."),
    ]]);
    assert_eq!(got, vec![pair("yesterday", "2010-08-03"), pair("last Friday", "2010-07-30")]);
}

#[test]
fn anaphoric_offset_follows_the_previous_date() {
    let got = tag(&[
        &[("The", "DT"), ("plant", "NN"), ("closed", "VBD"), ("in", "IN"), ("March", "NNP"), ("2006", "CD"), (".", ".")],
        &[("It", "PRP"), ("reopened", "VBD"), ("two", "CD"), ("months", "NNS"), ("later", "RB"), (".", ".")],
    ]);
    assert_eq!(got, vec![pair("March 2006", "2006-03"), pair("two months later", "2006-05")]);
}

#[test]
fn weekday_and_month_date_form_one_tag() {
    let got = tag(&[&[
        ("It", "PRP"),
        ("closed", "VBD"),
        ("on", "IN"),
        ("Friday", "NNP"),
        (",", ","),
        ("July", "NNP"),
        ("30", "CD"),
        (".", "."),
    ]]);
    assert_eq!(got, vec![pair("Friday , July 30", "2010-07-30")]);
}

#[test]
fn modal_may_is_squelched() {
    let got = tag(&[&[("Prices", "NNS"), ("may", "MD"), ("rise", "VB"), ("in", "IN"), ("May", "NNP"), (".", ".")]]);
    assert_eq!(got, vec![pair("May", "2010-05")]);
}

#[test]
fn clock_time_claims_the_relative_day() {
    let got = tag(&[&[
        ("We", "PRP"),
        ("meet", "VBP"),
        ("tomorrow", "NN"),
        ("at", "IN"),
        ("9", "CD"),
        ("a.m.", "RB"),
        (".", "."),
    ]]);
    assert_eq!(got, vec![pair("tomorrow at 9 a.m.", "2010-08-05T09:00")]);
}

#[test]
fn durations_and_sets() {
    let doc = Document::from_pairs(&[
        &[("The", "DT"), ("strike", "NN"), ("lasted", "VBD"), ("three", "CD"), ("weeks", "NNS"), (".", ".")],
        &[("They", "PRP"), ("meet", "VBP"), ("every", "DT"), ("Monday", "NNP"), (".", ".")],
    ])
    .with_dct(DCT);
    let out = TAGGER.annotate(doc);
    let tags = out.document.tags();
    assert_eq!(tags.len(), 2);

    let (_, duration) = tags[0];
    assert_eq!(duration.kind(), TagKind::Duration);
    assert_eq!(duration.value.as_deref(), Some("P3W"));

    let (id, set) = tags[1];
    assert_eq!(out.document.span_text(id).as_deref(), Some("every Monday"));
    assert!(set.set);
    assert_eq!(set.value.as_deref(), Some("XXXX-WXX-1"));
    assert_eq!(set.quant.as_deref(), Some("EVERY"));
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
}

#[test]
fn year_modifier_runs_after_the_value() {
    let doc = Document::from_pairs(&[&[
        ("Sales", "NNS"),
        ("rose", "VBD"),
        ("in", "IN"),
        ("early", "JJ"),
        ("2010", "CD"),
        (".", "."),
    ]])
    .with_dct(DCT);
    let out = TAGGER.annotate(doc);
    let (_, timex) = out.document.tags()[0];
    assert_eq!(timex.value.as_deref(), Some("2010"));
    assert_eq!(timex.modifier.as_deref(), Some("START"));
}

#[test]
fn holidays_and_decades() {
    let got = tag(&[&[
        ("We", "PRP"),
        ("met", "VBD"),
        ("on", "IN"),
        ("Christmas", "NNP"),
        ("Day", "NNP"),
        ("in", "IN"),
        ("the", "DT"),
        ("1990s", "NNS"),
        (".", "."),
    ]]);
    assert_eq!(got, vec![pair("Christmas Day", "2010-12-25"), pair("the 1990s", "199")]);
}

#[test]
fn missing_timestamp_leaves_relative_values_empty() {
    let doc = Document::from_pairs(&[&[("It", "PRP"), ("rained", "VBD"), ("yesterday", "NN"), (".", ".")]]);
    let out = TAGGER.annotate(doc);
    assert_eq!(out.document.tags()[0].1.value, None);
    assert!(out.warnings.warnings().iter().any(|w| w.kind == WarningKind::MissingTimestamp));
}

#[test]
fn classifier_direction_moves_an_ambiguous_month() {
    let sentence: &[(&str, &str)] = &[("He", "PRP"), ("arrived", "VBD"), ("in", "IN"), ("August", "NNP"), (".", ".")];
    assert_eq!(tag(&[sentence]), vec![pair("August", "2010-08")]);

    let past_tense = |features: &TagFeatures| features.verb_tags.iter().any(|pos| pos == "VBD").then_some(Direction::Before);
    let tagger = TAGGER.clone().with_options(Options { classifier: Some(Arc::new(past_tense)), ..Options::default() });
    let got = values(&tagger, Document::from_pairs(&[sentence]).with_dct(DCT));
    assert_eq!(got, vec![pair("August", "2009-08")]);
}

#[test]
fn huge_offsets_and_impossible_dates_leave_no_value() {
    let doc = Document::from_pairs(&[
        &[("It", "PRP"), ("ends", "VBZ"), ("in", "IN"), ("99999999999999999999", "CD"), ("years", "NNS"), (".", ".")],
        &[("It", "PRP"), ("opened", "VBD"), ("on", "IN"), ("February", "NNP"), ("29", "CD"), (".", ".")],
    ])
    .with_dct(DCT);
    let out = TAGGER.annotate(doc);
    let tags = out.document.tags();
    assert_eq!(tags.len(), 2);
    assert!(tags.iter().all(|(_, timex)| timex.value.is_none()), "{tags:?}");
    assert!(out.warnings.warnings().iter().any(|w| w.kind == WarningKind::ReferenceUnavailable));
    assert!(out.warnings.warnings().iter().any(|w| w.kind == WarningKind::MalformedDate));
}
