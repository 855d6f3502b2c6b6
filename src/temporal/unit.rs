//! Calendar units and fractional-offset conversion.

use crate::engine::{Diagnostics, WarningKind};

/// Calendar unit, ordered from coarsest to finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Unit {
    Year,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
}

impl Unit {
    /// Parse a unit word, returning the unit and how many of it the word stands for
    /// (`"decades"` is ten years, `"fortnight"` two weeks).
    pub fn from_word(word: &str) -> Option<(Unit, i64)> {
        let word = word.trim().trim_end_matches('.').to_lowercase();
        let unit = match word.as_str() {
            "year" | "years" | "yr" | "yrs" => (Unit::Year, 1),
            "decade" | "decades" => (Unit::Year, 10),
            "century" | "centuries" => (Unit::Year, 100),
            "quarter" | "quarters" => (Unit::Month, 3),
            "month" | "months" | "mo" | "mos" => (Unit::Month, 1),
            "fortnight" | "fortnights" => (Unit::Week, 2),
            "week" | "weeks" | "wk" | "wks" => (Unit::Week, 1),
            "day" | "days" => (Unit::Day, 1),
            "hour" | "hours" | "hr" | "hrs" => (Unit::Hour, 1),
            "minute" | "minutes" | "min" | "mins" => (Unit::Minute, 1),
            "second" | "seconds" | "sec" | "secs" => (Unit::Second, 1),
            _ => return None,
        };
        Some(unit)
    }

    pub fn name(self) -> &'static str {
        match self {
            Unit::Year => "year",
            Unit::Month => "month",
            Unit::Week => "week",
            Unit::Day => "day",
            Unit::Hour => "hour",
            Unit::Minute => "minute",
            Unit::Second => "second",
        }
    }

    /// Next finer unit and how many of it make one of `self`.
    pub fn finer(self) -> Option<(Unit, f64)> {
        match self {
            Unit::Year => Some((Unit::Month, 12.0)),
            Unit::Month => Some((Unit::Day, 30.0)),
            Unit::Week => Some((Unit::Day, 7.0)),
            Unit::Day => Some((Unit::Hour, 24.0)),
            Unit::Hour => Some((Unit::Minute, 60.0)),
            Unit::Minute => Some((Unit::Second, 60.0)),
            Unit::Second => None,
        }
    }

    /// Whether a fractional magnitude is meaningful at this unit.
    pub fn allows_fraction(self) -> bool {
        matches!(self, Unit::Hour | Unit::Minute | Unit::Second)
    }

    /// ISO 8601 duration designator and whether it belongs after the `T`.
    pub fn duration_designator(self) -> (char, bool) {
        match self {
            Unit::Year => ('Y', false),
            Unit::Month => ('M', false),
            Unit::Week => ('W', false),
            Unit::Day => ('D', false),
            Unit::Hour => ('H', true),
            Unit::Minute => ('M', true),
            Unit::Second => ('S', true),
        }
    }
}

/// Split a possibly fractional magnitude into integer steps.
///
/// The integer part is applied at `unit`; the remainder becomes an integer at
/// the next finer unit (1.5 years is 1 year and 6 months, 3.5 months is
/// 3 months and 15 days). What is still fractional after that is truncated,
/// with a warning unless the unit is clock-scale.
pub fn split_fractional(unit: Unit, magnitude: f64, diagnostics: &mut Diagnostics) -> Vec<(Unit, i64)> {
    let whole = magnitude.trunc();
    let fraction = magnitude - whole;
    let mut steps = Vec::new();
    if whole != 0.0 {
        steps.push((unit, whole as i64));
    }
    if fraction.abs() < 1e-9 {
        return steps;
    }

    match unit.finer() {
        Some((finer, factor)) => {
            let converted = fraction * factor;
            let rounded = converted.round();
            let converted = if (converted - rounded).abs() < 1e-6 { rounded } else { converted };
            let whole_finer = converted.trunc();
            if (converted - whole_finer).abs() > 1e-9 && !finer.allows_fraction() {
                diagnostics.warn(
                    WarningKind::FractionalOffset,
                    format!("offset of {magnitude} {}s truncated to whole {}s", unit.name(), finer.name()),
                );
            }
            if whole_finer != 0.0 {
                steps.push((finer, whole_finer as i64));
            }
        }
        None => {
            if !unit.allows_fraction() {
                diagnostics.warn(
                    WarningKind::FractionalOffset,
                    format!("offset of {magnitude} {}s truncated to {}", unit.name(), whole),
                );
            }
        }
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_words_carry_multipliers() {
        assert_eq!(Unit::from_word("Months"), Some((Unit::Month, 1)));
        assert_eq!(Unit::from_word("decades"), Some((Unit::Year, 10)));
        assert_eq!(Unit::from_word("fortnight"), Some((Unit::Week, 2)));
        assert_eq!(Unit::from_word("eons"), None);
    }

    #[test]
    fn fractional_years_become_months() {
        let mut diag = Diagnostics::default();
        assert_eq!(split_fractional(Unit::Year, 1.5, &mut diag), vec![(Unit::Year, 1), (Unit::Month, 6)]);
        assert!(diag.is_empty());
    }

    #[test]
    fn fractional_months_become_days() {
        let mut diag = Diagnostics::default();
        assert_eq!(split_fractional(Unit::Month, 3.5, &mut diag), vec![(Unit::Month, 3), (Unit::Day, 15)]);
        assert_eq!(split_fractional(Unit::Month, -3.5, &mut diag), vec![(Unit::Month, -3), (Unit::Day, -15)]);
        assert!(diag.is_empty());
    }

    #[test]
    fn leftover_fraction_is_truncated_with_warning() {
        let mut diag = Diagnostics::default();
        // 0.33 months is 9.9 days: nine days survive, the rest is dropped.
        assert_eq!(split_fractional(Unit::Month, 0.33, &mut diag), vec![(Unit::Day, 9)]);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.warnings()[0].kind, WarningKind::FractionalOffset);
    }

    #[test]
    fn clock_units_absorb_fractions_quietly() {
        let mut diag = Diagnostics::default();
        assert_eq!(split_fractional(Unit::Hour, 1.5, &mut diag), vec![(Unit::Hour, 1), (Unit::Minute, 30)]);
        assert_eq!(split_fractional(Unit::Second, 2.25, &mut diag), vec![(Unit::Second, 2)]);
        assert!(diag.is_empty());
    }
}
