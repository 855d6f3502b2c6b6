//! From a pre-normalised literal to a concrete point.
//!
//! ```text
//! PreNormal ──► anchor (ReferenceTracker) ──► truncate / extend ──► merge literal
//!                                                                     │
//!             normalised() ◄── direction nudge ◄── weekday year fix ◄─┘
//! ```

use super::calendar::{relative_weekday, weekday_number};
use super::point::{Component, TimePoint};
use super::reference::{Anchoring, ReferenceTracker};
use super::unit::{Unit, split_fractional};
use crate::document::Direction;
use crate::engine::{Diagnostics, WarningKind};
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Structural class of a pre-normalised point.
#[derive(Debug, Clone, PartialEq)]
pub enum PointClass {
    /// The literal needs no reference.
    Absolute,
    /// Fill the literal's gaps from a reference truncated to `unit` (derived
    /// from the literal when `None`).
    Reference { anchor: Anchoring, unit: Option<Unit> },
    /// Move `magnitude` units away from the reference.
    Offset { anchor: Anchoring, unit: Unit, magnitude: f64 },
    /// The `n`-th `weekday` strictly before (`n < 0`) or after the reference;
    /// `n == 0` stays inside the reference's ISO week.
    RelativeWeekday { anchor: Anchoring, weekday: u32, n: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreNormal {
    pub class: PointClass,
    pub literal: TimePoint,
    pub direction: Option<Direction>,
}

impl PreNormal {
    pub fn absolute(literal: TimePoint) -> Self {
        PreNormal { class: PointClass::Absolute, literal, direction: None }
    }

    pub fn reference(anchor: Anchoring, unit: Option<Unit>, literal: TimePoint) -> Self {
        PreNormal { class: PointClass::Reference { anchor, unit }, literal, direction: None }
    }

    pub fn offset(anchor: Anchoring, unit: Unit, magnitude: f64) -> Self {
        PreNormal { class: PointClass::Offset { anchor, unit, magnitude }, literal: TimePoint::default(), direction: None }
    }

    pub fn relative_weekday(anchor: Anchoring, weekday: u32, n: i64) -> Self {
        PreNormal {
            class: PointClass::RelativeWeekday { anchor, weekday, n },
            literal: TimePoint::default(),
            direction: None,
        }
    }

    pub fn with_direction(mut self, direction: Option<Direction>) -> Self {
        self.direction = direction;
        self
    }
}

/// Resolve `pre` against `context`. Failures are reported through
/// `diagnostics` and yield `None`.
pub fn resolve(pre: &PreNormal, context: &ReferenceTracker, diagnostics: &mut Diagnostics) -> Option<TimePoint> {
    let anchor = match &pre.class {
        PointClass::Absolute => return checked(pre.literal.normalised(), diagnostics),
        PointClass::Reference { anchor, .. }
        | PointClass::Offset { anchor, .. }
        | PointClass::RelativeWeekday { anchor, .. } => *anchor,
    };
    let Some(reference) = context.anchor(anchor) else {
        diagnostics.warn(WarningKind::MissingTimestamp, "no document timestamp or earlier point to anchor to".to_string());
        return None;
    };
    tracing::trace!(?anchor, %reference, literal = %pre.literal, "resolving point");

    match &pre.class {
        PointClass::Absolute => checked(pre.literal.normalised(), diagnostics),
        PointClass::Reference { unit, .. } => {
            let unit = unit.or_else(|| implied_unit(&pre.literal)).unwrap_or(Unit::Day);
            let base = reference.truncate(unit).extend_nonspecific(unit);
            let mut merged = base.merge(&pre.literal);
            let year_from_reference = !pre.literal.year.is_concrete() && merged.year.is_concrete();
            let corrected = year_from_reference && correct_year_by_weekday(&mut merged);
            if !corrected {
                if let Some(direction) = pre.direction {
                    merged = nudge(merged, &reference, unit, direction);
                }
            }
            checked(merged.normalised(), diagnostics)
        }
        PointClass::Offset { unit, magnitude, .. } => {
            let steps = split_fractional(*unit, *magnitude, diagnostics);
            let finest = steps.iter().map(|(unit, _)| *unit).max().unwrap_or(*unit);
            let mut point = reference.truncate(finest);
            for (step_unit, n) in steps {
                point = match point.add_units(step_unit, n) {
                    Ok(point) => point,
                    Err(err) => {
                        diagnostics.warn(WarningKind::ReferenceUnavailable, format!("offset from {reference}: {err}"));
                        return None;
                    }
                };
            }
            checked(point.merge(&pre.literal).normalised(), diagnostics)
        }
        PointClass::RelativeWeekday { weekday, n, .. } => {
            let Some(date) = reference.normalised().date() else {
                diagnostics.warn(
                    WarningKind::ReferenceUnavailable,
                    format!("reference {reference} is not a concrete date for weekday placement"),
                );
                return None;
            };
            let Some(target) = relative_weekday(date, *weekday, *n) else {
                diagnostics.warn(WarningKind::ReferenceUnavailable, format!("weekday {weekday} is out of range"));
                return None;
            };
            Some(TimePoint::from_date(target))
        }
    }
}

/// Reject a resolved point whose concrete components fall outside the
/// calendar, such as February 29 merged into a common year.
fn checked(point: TimePoint, diagnostics: &mut Diagnostics) -> Option<TimePoint> {
    match point.validate() {
        Ok(()) => Some(point),
        Err(err) => {
            diagnostics.warn(WarningKind::MalformedDate, format!("resolved value {point} is not a calendar date: {err}"));
            None
        }
    }
}

/// Reference granularity implied by what the literal supplies.
fn implied_unit(literal: &TimePoint) -> Option<Unit> {
    if literal.hour.is_present() {
        Some(Unit::Day)
    } else if literal.weekday.is_present() && literal.month.is_absent() && literal.day.is_absent() {
        Some(Unit::Week)
    } else if literal.day.is_present() && literal.month.is_absent() {
        Some(Unit::Month)
    } else if literal.month.is_present() || literal.week.is_present() {
        Some(Unit::Year)
    } else {
        None
    }
}

/// Pick the year among `{year, year-1, year+1}` whose calendar agrees with the
/// concrete weekday. Returns whether the weekday decided the year.
pub fn correct_year_by_weekday(point: &mut TimePoint) -> bool {
    let (Some(year), Some(month), Some(day), Some(weekday)) =
        (point.year.value(), point.month.value(), point.day.value(), point.weekday.value())
    else {
        return false;
    };
    for candidate in [year, year - 1, year + 1] {
        let Some(date) = NaiveDate::from_ymd_opt(candidate, month as u32, day as u32) else {
            continue;
        };
        if weekday_number(date) as i32 == weekday {
            if candidate != year {
                tracing::debug!(from = year, to = candidate, "weekday moved year");
            }
            point.year = Component::Value(candidate);
            return true;
        }
    }
    false
}

/// Step one `unit` towards `direction` when the point does not already lie on
/// that side of the reference, keeping the step only if it then does.
fn nudge(point: TimePoint, reference: &TimePoint, unit: Unit, direction: Direction) -> TimePoint {
    let (wanted, step) = match direction {
        Direction::Before => (Ordering::Less, -1),
        Direction::After => (Ordering::Greater, 1),
        Direction::Same => return point,
    };
    if point.compare(reference) == Some(wanted) {
        return point;
    }
    match point.add_units(unit, step) {
        Ok(moved) if moved.compare(reference) == Some(wanted) => {
            tracing::debug!(%point, %moved, ?direction, "direction nudge");
            moved
        }
        _ => point,
    }
}
