//! Pre-normalisation: common English shapes reduced to a structural class
//! plus a partial literal, or directly to a value string.
//!
//! Rule files reach this through the `prenormalise(text)` expression
//! function; the class is then resolved against the reference tracker.

use super::point::{Component, TimePoint};
use super::reference::Anchoring;
use super::resolve::PreNormal;
use super::unit::{Unit, split_fractional};
use super::words::{date_to_iso, day_to_num, decade, month_to_num, ordinal_to_num, words_to_num};
use crate::document::{Direction, TagKind};
use crate::engine::Diagnostics;
use once_cell::sync::Lazy;
use regex::Regex;

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";
const WEEKDAY: &str = r"(monday|tuesday|wednesday|thursday|friday|saturday|sunday|mon|tues?|wed|thu(?:rs)?|fri|sat|sun)\.?";
const DAY: &str = r"(\d{1,2}(?:st|nd|rd|th)?|[a-z]+(?:-[a-z]+)?)";

static MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:{WEEKDAY} )?{MONTH} {DAY}(?: (\d{{4}}))?$")).unwrap()
});
static DAY_MONTH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:{WEEKDAY} )?(?:the )?{DAY} (?:of )?{MONTH}(?: (\d{{4}}))?$")).unwrap()
});
static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^{MONTH}(?: (?:of )?(\d{{4}}))?$")).unwrap());
static BARE_WEEKDAY: Lazy<Regex> = Lazy::new(|| Regex::new(&format!(r"^{WEEKDAY}$")).unwrap());

/// Outcome of pre-normalisation.
#[derive(Debug, Clone, PartialEq)]
pub enum PreNormalised {
    /// A point still to be resolved against a reference.
    Point(PreNormal),
    /// A final value (durations, sets, `PRESENT_REF`, decades).
    Value(String),
}

/// Pre-normalise the surface `text` of a tag of the given kind.
pub fn prenormalise(kind: TagKind, text: &str, diagnostics: &mut Diagnostics) -> Option<PreNormalised> {
    let text = clean(text);
    if text.is_empty() {
        return None;
    }
    let out = match kind {
        TagKind::Date | TagKind::Time => point(&text),
        TagKind::Duration => duration(&text, diagnostics).map(PreNormalised::Value),
        TagKind::Set => set(&text, diagnostics).map(PreNormalised::Value),
    };
    tracing::trace!(%text, ?out, "prenormalised");
    out
}

/// ISO 8601 duration for `magnitude` units; fractions spill into the next
/// finer unit (`1.5 hours` is `PT1H30M`).
pub fn duration_value(unit: Unit, magnitude: f64, diagnostics: &mut Diagnostics) -> String {
    let steps = split_fractional(unit, magnitude.abs(), diagnostics);
    let mut date = String::new();
    let mut time = String::new();
    for (unit, n) in &steps {
        let (designator, is_time) = unit.duration_designator();
        let target = if is_time { &mut time } else { &mut date };
        target.push_str(&format!("{n}{designator}"));
    }
    if steps.is_empty() {
        let (designator, is_time) = unit.duration_designator();
        return if is_time { format!("PT0{designator}") } else { format!("P0{designator}") };
    }
    if time.is_empty() { format!("P{date}") } else { format!("P{date}T{time}") }
}

/// Lowercase, drop punctuation-only tokens and collapse whitespace.
fn clean(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| word.chars().any(|c| c.is_alphanumeric()))
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

fn point(text: &str) -> Option<PreNormalised> {
    if matches!(text, "now" | "currently" | "the present" | "present" | "right now") {
        return Some(PreNormalised::Value("PRESENT_REF".to_string()));
    }
    if let Some(iso) = date_to_iso(text) {
        return TimePoint::parse(&iso).ok().map(|p| PreNormalised::Point(PreNormal::absolute(p)));
    }
    if let Some(value) = decade(text.trim_start_matches("the ")) {
        return Some(PreNormalised::Value(value));
    }

    let (had_article, text) = match text.strip_prefix("the ") {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let text = text.strip_prefix("on ").or_else(|| text.strip_prefix("at ")).unwrap_or(text);

    // "tomorrow at 3 pm", "3 pm today"
    if let Some((day, clock)) = split_clock(text) {
        let mut pre = relative_day(day)?;
        pre.literal = pre.literal.merge(&clock);
        return Some(PreNormalised::Point(pre));
    }

    relative_day(text)
        .or_else(|| demonstrative(text))
        .or_else(|| modified(text, had_article))
        .or_else(|| offset(text))
        .or_else(|| calendar_date(text))
        .or_else(|| clock_time(text).map(|clock| PreNormal::reference(Anchoring::Deictic, Some(Unit::Day), clock)))
        .map(PreNormalised::Point)
}

fn relative_day(text: &str) -> Option<PreNormal> {
    let pre = match text {
        "today" | "tonight" | "this morning" | "this afternoon" | "this evening" => {
            PreNormal::reference(Anchoring::Deictic, Some(Unit::Day), TimePoint::default())
        }
        "yesterday" | "last night" => PreNormal::offset(Anchoring::Deictic, Unit::Day, -1.0),
        "tomorrow" => PreNormal::offset(Anchoring::Deictic, Unit::Day, 1.0),
        "day before yesterday" => PreNormal::offset(Anchoring::Deictic, Unit::Day, -2.0),
        "day after tomorrow" => PreNormal::offset(Anchoring::Deictic, Unit::Day, 2.0),
        "day before" | "previous day" => PreNormal::offset(Anchoring::Anaphoric, Unit::Day, -1.0),
        "day after" | "next day" | "following day" => PreNormal::offset(Anchoring::Anaphoric, Unit::Day, 1.0),
        _ => return None,
    };
    Some(pre)
}

fn demonstrative(text: &str) -> Option<PreNormal> {
    let rest = text.strip_prefix("that ")?;
    let (unit, _) = Unit::from_word(rest)?;
    Some(PreNormal::reference(Anchoring::Demonstrative, Some(unit), TimePoint::default()))
}

/// `this|next|last|coming|past|previous|following|current` + unit, weekday or month.
fn modified(text: &str, had_article: bool) -> Option<PreNormal> {
    let (modifier, rest) = text.split_once(' ')?;
    let step: i64 = match modifier {
        "this" | "current" => 0,
        "next" | "coming" | "following" => 1,
        "last" | "past" | "previous" => -1,
        _ => return None,
    };
    let anchor = if had_article || matches!(modifier, "following" | "previous") {
        Anchoring::Anaphoric
    } else {
        Anchoring::Deictic
    };

    if let Some((unit, multiplier)) = Unit::from_word(rest) {
        return Some(match step {
            0 => PreNormal::reference(anchor, Some(unit), TimePoint::default()),
            _ => PreNormal::offset(anchor, unit, (step * multiplier) as f64),
        });
    }
    if let Some(weekday) = day_to_num(rest) {
        return Some(PreNormal::relative_weekday(anchor, weekday, step));
    }
    if let Some(month) = month_to_num(rest) {
        let literal = TimePoint { month: Component::Value(month as i32), ..TimePoint::default() };
        let direction = match step {
            0 => None,
            1 => Some(Direction::After),
            _ => Some(Direction::Before),
        };
        return Some(PreNormal::reference(anchor, Some(Unit::Year), literal).with_direction(direction));
    }
    None
}

/// `N units ago|earlier|before|later|after|afterwards|from now|hence`, `in N units`.
fn offset(text: &str) -> Option<PreNormal> {
    let spaced = text.replace('-', " ");
    let caps = regex!(r"^(?:in )?(.+?) ([a-z]+) (ago|earlier|before|later|after|afterwards|from now|hence)$")
        .captures(&spaced)
        .or_else(|| regex!(r"^(in) (.+?) ([a-z]+)()$").captures(&spaced))?;

    let (count, unit_word, relation) = if &caps[1] == "in" && caps[4].is_empty() {
        (caps[2].to_string(), caps[3].to_string(), "from now".to_string())
    } else {
        (caps[1].to_string(), caps[2].to_string(), caps[3].to_string())
    };
    let (unit, multiplier) = Unit::from_word(&unit_word)?;
    let count = words_to_num(&count)?;
    let (anchor, sign) = match relation.as_str() {
        "ago" => (Anchoring::Deictic, -1.0),
        "from now" | "hence" => (Anchoring::Deictic, 1.0),
        "earlier" | "before" => (Anchoring::Anaphoric, -1.0),
        _ => (Anchoring::Anaphoric, 1.0),
    };
    Some(PreNormal::offset(anchor, unit, sign * count * multiplier as f64))
}

fn calendar_date(text: &str) -> Option<PreNormal> {
    if let Some(caps) = regex!(r"^(?:in )?(\d{4})$").captures(text) {
        let year: i32 = caps[1].parse().ok()?;
        return Some(PreNormal::absolute(TimePoint { year: Component::Value(year), ..TimePoint::default() }));
    }

    let (weekday, month, day, year) = if let Some(caps) = MONTH_DAY.captures(text) {
        (caps.get(1), caps.get(2), caps.get(3), caps.get(4))
    } else if let Some(caps) = DAY_MONTH.captures(text) {
        (caps.get(1), caps.get(3), caps.get(2), caps.get(4))
    } else if let Some(caps) = MONTH_YEAR.captures(text) {
        (None, caps.get(1), None, caps.get(2))
    } else if let Some(caps) = BARE_WEEKDAY.captures(text) {
        let weekday = day_to_num(&caps[1])?;
        let literal = TimePoint { weekday: Component::Value(weekday as i32), ..TimePoint::default() };
        return Some(PreNormal::reference(Anchoring::Ambiguous, None, literal));
    } else {
        return None;
    };

    let mut literal = TimePoint { month: Component::Value(month_to_num(month?.as_str())? as i32), ..TimePoint::default() };
    if let Some(day) = day {
        let day = ordinal_to_num(day.as_str()).filter(|d| (1..=31).contains(d))?;
        literal.day = Component::Value(day as i32);
    }
    if let Some(weekday) = weekday {
        literal.weekday = Component::Value(day_to_num(weekday.as_str())? as i32);
    }
    if let Some(year) = year {
        literal.year = Component::Value(year.as_str().parse().ok()?);
    }
    literal.validate().ok()?;
    match year {
        Some(_) => Some(PreNormal::absolute(literal)),
        None => Some(PreNormal::reference(Anchoring::Deictic, None, literal)),
    }
}

fn clock_time(text: &str) -> Option<TimePoint> {
    let (hour, minute) = match text {
        "noon" | "midday" => (12, 0),
        "midnight" => (0, 0),
        _ => {
            if let Some(caps) = regex!(r"^(\d{1,2})(?::(\d{2}))? ?([ap])\.?m\.?$").captures(text) {
                let hour: i32 = caps[1].parse().ok()?;
                let minute: i32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
                if !(1..=12).contains(&hour) {
                    return None;
                }
                let hour = match (&caps[3], hour) {
                    ("a", 12) => 0,
                    ("p", 12) => 12,
                    ("p", h) => h + 12,
                    (_, h) => h,
                };
                (hour, minute)
            } else if let Some(caps) = regex!(r"^(\d{1,2}):(\d{2})$").captures(text) {
                (caps[1].parse().ok()?, caps[2].parse().ok()?)
            } else if let Some(caps) = regex!(r"^(\d{1,2}) o'?clock$").captures(text) {
                (caps[1].parse().ok()?, 0)
            } else {
                return None;
            }
        }
    };
    if !(0..=23).contains(&hour) || !(0..=59).contains(&minute) {
        return None;
    }
    Some(TimePoint { hour: Component::Value(hour), minute: Component::Value(minute), ..TimePoint::default() })
}

/// Split `"<relative day> at <clock>"` or `"<clock> <relative day>"`.
fn split_clock(text: &str) -> Option<(&str, TimePoint)> {
    if let Some((day, clock)) = text.split_once(" at ") {
        return Some((day, clock_time(clock)?));
    }
    let (clock, day) = text.rsplit_once(' ')?;
    relative_day(day)?;
    Some((day, clock_time(clock)?))
}

fn duration(text: &str, diagnostics: &mut Diagnostics) -> Option<String> {
    let spaced = text.replace('-', " ");
    let mut text = spaced.as_str();
    for prefix in ["for ", "about ", "around ", "some ", "nearly ", "almost ", "over ", "more than ", "less than ", "the past ", "the last "] {
        text = text.strip_prefix(prefix).unwrap_or(text);
    }
    let text = text.strip_suffix(" long").or_else(|| text.strip_suffix(" old")).unwrap_or(text);

    if let Some(caps) = regex!(r"^half (?:a|an) ([a-z]+)$").captures(text) {
        let (unit, multiplier) = Unit::from_word(&caps[1])?;
        return Some(duration_value(unit, 0.5 * multiplier as f64, diagnostics));
    }
    if let Some(caps) = regex!(r"^(.+?) ([a-z]+) and a half$").captures(text) {
        let (unit, multiplier) = Unit::from_word(&caps[2])?;
        let count = words_to_num(&caps[1])? + 0.5;
        return Some(duration_value(unit, count * multiplier as f64, diagnostics));
    }
    if let Some((unit, _)) = Unit::from_word(text) {
        let (designator, is_time) = unit.duration_designator();
        return Some(if is_time { format!("PTX{designator}") } else { format!("PX{designator}") });
    }
    let (count, unit_word) = text.rsplit_once(' ')?;
    let (unit, multiplier) = Unit::from_word(unit_word)?;
    if matches!(count, "several" | "few" | "a few" | "many" | "some") {
        let (designator, is_time) = unit.duration_designator();
        return Some(if is_time { format!("PTX{designator}") } else { format!("PX{designator}") });
    }
    let count = words_to_num(count)?;
    Some(duration_value(unit, count * multiplier as f64, diagnostics))
}

fn set(text: &str, diagnostics: &mut Diagnostics) -> Option<String> {
    let single = match text {
        "daily" => Some((Unit::Day, 1)),
        "weekly" => Some((Unit::Week, 1)),
        "monthly" => Some((Unit::Month, 1)),
        "yearly" | "annually" => Some((Unit::Year, 1)),
        "hourly" => Some((Unit::Hour, 1)),
        "quarterly" => Some((Unit::Month, 3)),
        _ => None,
    };
    if let Some((unit, count)) = single {
        return Some(duration_value(unit, count as f64, diagnostics));
    }

    let rest = text.strip_prefix("every ").or_else(|| text.strip_prefix("each "))?;
    let (count, rest) = match rest.strip_prefix("other ") {
        Some(rest) => (2.0, rest),
        None => (1.0, rest),
    };
    if let Some(weekday) = day_to_num(rest) {
        return Some(format!("XXXX-WXX-{weekday}"));
    }
    if let Some((unit, multiplier)) = Unit::from_word(rest) {
        return Some(duration_value(unit, count * multiplier as f64, diagnostics));
    }
    let (amount, unit_word) = rest.rsplit_once(' ')?;
    let (unit, multiplier) = Unit::from_word(unit_word)?;
    Some(duration_value(unit, words_to_num(amount)? * multiplier as f64, diagnostics))
}
