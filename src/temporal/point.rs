//! Partial calendar values.
//!
//! A [`TimePoint`] keeps every component (year down to second, plus ISO week
//! and weekday) independently absent, unknown (`X` placeholder) or concrete.
//! Relative expressions are resolved by truncating a reference point, filling
//! the gaps with placeholders and overlaying the literal read from the text.

use super::calendar::{
    add_days, add_months, date_from_iso_week, days_in_month, iso_week, shift_month, weekday_number,
    weeks_in_iso_year,
};
use super::unit::Unit;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use std::cmp::Ordering;
use std::fmt;

/// One component of a [`TimePoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Component {
    #[default]
    Absent,
    /// Present but not known (`XX` in the rendered value).
    Unknown,
    Value(i32),
}

impl Component {
    pub fn value(self) -> Option<i32> {
        match self {
            Component::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_absent(self) -> bool {
        self == Component::Absent
    }

    pub fn is_present(self) -> bool {
        !self.is_absent()
    }

    pub fn is_concrete(self) -> bool {
        matches!(self, Component::Value(_))
    }

    fn fill(self) -> Component {
        if self.is_absent() { Component::Unknown } else { self }
    }

    fn render(self, width: usize) -> String {
        match self {
            Component::Value(v) => format!("{v:0width$}"),
            _ => "X".repeat(width),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PointError {
    #[error("malformed point literal `{0}`")]
    Malformed(String),
    #[error("{component} {value} is out of range")]
    OutOfRange { component: &'static str, value: i32 },
    #[error("cannot add {unit}s to a point that is not concrete down to the {unit}")]
    NotConcrete { unit: &'static str },
    #[error("date arithmetic overflowed")]
    Overflow,
}

/// A partially specified calendar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimePoint {
    pub year: Component,
    pub month: Component,
    pub day: Component,
    pub hour: Component,
    pub minute: Component,
    pub second: Component,
    pub week: Component,
    pub weekday: Component,
}

impl TimePoint {
    /// Parse an extended (`2010-08-04T14:30`, `XXXX-08`, `2010-W31-3`,
    /// `T15:00`) or compact (`20100804T1430`) literal.
    pub fn parse(text: &str) -> Result<TimePoint, PointError> {
        let text = text.trim();
        let malformed = || PointError::Malformed(text.to_string());
        if text.is_empty() {
            return Err(malformed());
        }
        let (date_part, time_part) = match text.find('T') {
            Some(idx) => (&text[..idx], Some(&text[idx + 1..])),
            None => (text, None),
        };

        let mut point = TimePoint::default();
        if date_part.len() == 8 && date_part.bytes().all(|b| b.is_ascii_digit()) {
            point.year = component(&date_part[0..4], 4).ok_or_else(malformed)?;
            point.month = component(&date_part[4..6], 2).ok_or_else(malformed)?;
            point.day = component(&date_part[6..8], 2).ok_or_else(malformed)?;
        } else if let Some((year, rest)) = date_part.split_once("-W") {
            point.year = component(year, 4).ok_or_else(malformed)?;
            let (week, weekday) = match rest.split_once('-') {
                Some((week, weekday)) => (week, Some(weekday)),
                None => (rest, None),
            };
            point.week = component(week, 2).ok_or_else(malformed)?;
            if let Some(weekday) = weekday {
                point.weekday = component(weekday, 1).ok_or_else(malformed)?;
            }
        } else if !date_part.is_empty() {
            let parts: Vec<&str> = date_part.split('-').collect();
            if parts.len() > 3 {
                return Err(malformed());
            }
            let slots = [(&mut point.year, 4), (&mut point.month, 2), (&mut point.day, 2)];
            for ((slot, width), part) in slots.into_iter().zip(parts) {
                *slot = component(part, width).ok_or_else(malformed)?;
            }
        } else if time_part.is_none() {
            return Err(malformed());
        }

        if let Some(time) = time_part {
            let parts: Vec<&str> = if time.contains(':') {
                time.split(':').collect()
            } else if time.is_ascii() && time.len() % 2 == 0 && !time.is_empty() {
                (0..time.len()).step_by(2).map(|idx| &time[idx..idx + 2]).collect()
            } else {
                return Err(malformed());
            };
            if parts.is_empty() || parts.len() > 3 {
                return Err(malformed());
            }
            let slots = [&mut point.hour, &mut point.minute, &mut point.second];
            for (slot, part) in slots.into_iter().zip(parts) {
                *slot = component(part, 2).ok_or_else(malformed)?;
            }
        }

        point.validate()?;
        Ok(point)
    }

    pub fn from_date(date: NaiveDate) -> TimePoint {
        let mut point = TimePoint::default();
        point.set_date(date);
        point
    }

    pub fn from_datetime(datetime: NaiveDateTime) -> TimePoint {
        let mut point = TimePoint::from_date(datetime.date());
        point.hour = Component::Value(datetime.hour() as i32);
        point.minute = Component::Value(datetime.minute() as i32);
        point.second = Component::Value(datetime.second() as i32);
        point
    }

    /// Calendar date, when year, month and day are all concrete.
    pub fn date(&self) -> Option<NaiveDate> {
        let year = self.year.value()?;
        let month = u32::try_from(self.month.value()?).ok()?;
        let day = u32::try_from(self.day.value()?).ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// True when every calendar component down to the second is concrete.
    pub fn is_fully_concrete(&self) -> bool {
        [self.year, self.month, self.day, self.hour, self.minute, self.second].iter().all(|c| c.is_concrete())
    }

    /// Week-form points carry a week or weekday but no month or day.
    pub fn is_week_form(&self) -> bool {
        (self.week.is_present() || self.weekday.is_present()) && self.month.is_absent() && self.day.is_absent()
    }

    /// Finest unit with a present component.
    pub fn finest_unit(&self) -> Option<Unit> {
        if self.second.is_present() {
            Some(Unit::Second)
        } else if self.minute.is_present() {
            Some(Unit::Minute)
        } else if self.hour.is_present() {
            Some(Unit::Hour)
        } else if self.day.is_present() || self.weekday.is_present() {
            Some(Unit::Day)
        } else if self.week.is_present() {
            Some(Unit::Week)
        } else if self.month.is_present() {
            Some(Unit::Month)
        } else if self.year.is_present() {
            Some(Unit::Year)
        } else {
            None
        }
    }

    /// Drop every component finer than `unit`. Truncating a concrete date to
    /// a week switches it to ISO week form.
    pub fn truncate(&self, unit: Unit) -> TimePoint {
        let mut out = *self;
        if unit < Unit::Second {
            out.second = Component::Absent;
        }
        if unit < Unit::Minute {
            out.minute = Component::Absent;
        }
        if unit < Unit::Hour {
            out.hour = Component::Absent;
        }
        match unit {
            Unit::Year => {
                out.month = Component::Absent;
                out.day = Component::Absent;
                out.week = Component::Absent;
                out.weekday = Component::Absent;
            }
            Unit::Month => {
                out.day = Component::Absent;
                out.week = Component::Absent;
                out.weekday = Component::Absent;
            }
            Unit::Week => {
                if out.week.is_absent() {
                    match out.date() {
                        Some(_) => out.to_week_form(),
                        None => out.week = Component::Unknown,
                    }
                }
                out.month = Component::Absent;
                out.day = Component::Absent;
                out.weekday = Component::Absent;
            }
            Unit::Day | Unit::Hour | Unit::Minute | Unit::Second => {}
        }
        out
    }

    /// Mark every absent component down to `unit` as unknown.
    pub fn extend_nonspecific(&self, unit: Unit) -> TimePoint {
        let mut out = *self;
        out.year = out.year.fill();
        match unit {
            Unit::Year => {}
            Unit::Month => out.month = out.month.fill(),
            Unit::Week => out.week = out.week.fill(),
            _ => {
                if out.is_week_form() {
                    out.week = out.week.fill();
                    out.weekday = out.weekday.fill();
                } else {
                    out.month = out.month.fill();
                    out.day = out.day.fill();
                }
                if unit >= Unit::Hour {
                    out.hour = out.hour.fill();
                }
                if unit >= Unit::Minute {
                    out.minute = out.minute.fill();
                }
                if unit >= Unit::Second {
                    out.second = out.second.fill();
                }
            }
        }
        out
    }

    /// Overlay `literal` on `self`: a concrete literal component wins, then a
    /// concrete base component, then a placeholder from either side.
    pub fn merge(&self, literal: &TimePoint) -> TimePoint {
        let mut base = *self;
        let literal_calendar = literal.month.is_present() || literal.day.is_present();
        let literal_week = literal.week.is_present() || literal.weekday.is_present();
        if literal_calendar {
            base.week = Component::Absent;
            base.weekday = Component::Absent;
        } else if literal_week && base.date().is_some() {
            base.to_week_form();
        }

        TimePoint {
            year: overlay(base.year, literal.year),
            month: overlay(base.month, literal.month),
            day: overlay(base.day, literal.day),
            hour: overlay(base.hour, literal.hour),
            minute: overlay(base.minute, literal.minute),
            second: overlay(base.second, literal.second),
            week: overlay(base.week, literal.week),
            weekday: overlay(base.weekday, literal.weekday),
        }
    }

    /// Shift by `n` units. Every component down to `unit` must be concrete;
    /// month and year shifts clamp the day to the target month.
    pub fn add_units(&self, unit: Unit, n: i64) -> Result<TimePoint, PointError> {
        let not_concrete = || PointError::NotConcrete { unit: unit.name() };
        let mut out = *self;
        match unit {
            Unit::Year => {
                let year = self.year.value().ok_or_else(not_concrete)?;
                let year = i64::from(year).checked_add(n).ok_or(PointError::Overflow)?;
                let year = i32::try_from(year).map_err(|_| PointError::Overflow)?;
                out.year = Component::Value(year);
                out.clamp_day();
                if let Component::Value(week) = out.week {
                    out.week = Component::Value(week.min(weeks_in_iso_year(year) as i32));
                }
            }
            Unit::Month => {
                let year = self.year.value().ok_or_else(not_concrete)?;
                let month = self.month.value().ok_or_else(not_concrete)?;
                match self.date() {
                    Some(date) => out.set_date(add_months(date, n).ok_or(PointError::Overflow)?),
                    None => {
                        let (year, month) = shift_month(year, month as u32, n).ok_or(PointError::Overflow)?;
                        out.year = Component::Value(year);
                        out.month = Component::Value(month as i32);
                        out.clamp_day();
                    }
                }
            }
            Unit::Week => {
                let days = n.checked_mul(7).ok_or(PointError::Overflow)?;
                if let Some(date) = self.date() {
                    out.set_date(shift_days(date, days)?);
                } else {
                    let year = self.year.value().ok_or_else(not_concrete)?;
                    let week = self.week.value().ok_or_else(not_concrete)?;
                    let monday = date_from_iso_week(year, week as u32, 1).ok_or_else(not_concrete)?;
                    let (year, week) = iso_week(shift_days(monday, days)?);
                    out.year = Component::Value(year);
                    out.week = Component::Value(week as i32);
                }
            }
            Unit::Day => {
                out = self.normalised();
                let date = out.date().ok_or_else(not_concrete)?;
                out.set_date(shift_days(date, n)?);
            }
            Unit::Hour | Unit::Minute | Unit::Second => {
                out = self.normalised();
                let date = out.date().ok_or_else(not_concrete)?;
                let hour = out.hour.value().ok_or_else(not_concrete)?;
                let minute = match unit {
                    Unit::Hour => out.minute.value().unwrap_or(0),
                    _ => out.minute.value().ok_or_else(not_concrete)?,
                };
                let second = match unit {
                    Unit::Second => out.second.value().ok_or_else(not_concrete)?,
                    _ => out.second.value().unwrap_or(0),
                };
                let start = date
                    .and_hms_opt(hour as u32, minute as u32, second as u32)
                    .ok_or(PointError::OutOfRange { component: "hour", value: hour })?;
                let delta = match unit {
                    Unit::Hour => Duration::try_hours(n),
                    Unit::Minute => Duration::try_minutes(n),
                    _ => Duration::try_seconds(n),
                }
                .ok_or(PointError::Overflow)?;
                let shifted = start.checked_add_signed(delta).ok_or(PointError::Overflow)?;
                out.set_date(shifted.date());
                out.hour = Component::Value(shifted.hour() as i32);
                if out.minute.is_concrete() {
                    out.minute = Component::Value(shifted.minute() as i32);
                }
                if out.second.is_concrete() {
                    out.second = Component::Value(shifted.second() as i32);
                }
            }
        }
        Ok(out)
    }

    /// Order two points. A point containing the other (coarser, or with a
    /// placeholder where the other is concrete) compares equal. `None` when
    /// either year is not concrete.
    pub fn compare(&self, other: &TimePoint) -> Option<Ordering> {
        let a = self.normalised();
        let b = other.normalised();
        a.year.value()?;
        b.year.value()?;
        let (left, right) =
            if a.is_week_form() || b.is_week_form() { (a.week_key(), b.week_key()) } else { (a.calendar_key(), b.calendar_key()) };
        for (x, y) in left.iter().zip(right.iter()) {
            match (x, y) {
                (Some(x), Some(y)) => match x.cmp(y) {
                    Ordering::Equal => continue,
                    other => return Some(other),
                },
                _ => return Some(Ordering::Equal),
            }
        }
        Some(Ordering::Equal)
    }

    /// Canonical representation: a concrete year/week/weekday becomes a date,
    /// and week fields are dropped once the date is concrete.
    pub fn normalised(&self) -> TimePoint {
        let mut out = *self;
        if out.month.is_absent() && out.day.is_absent() {
            if let (Some(year), Some(week), Some(weekday)) = (out.year.value(), out.week.value(), out.weekday.value()) {
                if let Some(date) = date_from_iso_week(year, week as u32, weekday as u32) {
                    out.set_date(date);
                }
            }
        }
        if out.date().is_some() {
            out.week = Component::Absent;
            out.weekday = Component::Absent;
        }
        out
    }

    fn set_date(&mut self, date: NaiveDate) {
        self.year = Component::Value(date.year());
        self.month = Component::Value(date.month() as i32);
        self.day = Component::Value(date.day() as i32);
        self.week = Component::Absent;
        self.weekday = Component::Absent;
    }

    fn to_week_form(&mut self) {
        if let Some(date) = self.date() {
            let (year, week) = iso_week(date);
            self.year = Component::Value(year);
            self.week = Component::Value(week as i32);
            self.weekday = Component::Value(weekday_number(date) as i32);
            self.month = Component::Absent;
            self.day = Component::Absent;
        }
    }

    fn clamp_day(&mut self) {
        if let (Some(year), Some(month), Component::Value(day)) = (self.year.value(), self.month.value(), self.day) {
            let last = days_in_month(year, month as u32) as i32;
            self.day = Component::Value(day.min(last));
        }
    }

    fn calendar_key(&self) -> [Option<i32>; 6] {
        [
            self.year.value(),
            self.month.value(),
            self.day.value(),
            self.hour.value(),
            self.minute.value(),
            self.second.value(),
        ]
    }

    fn week_key(&self) -> [Option<i32>; 6] {
        let (year, week, weekday) = match self.date() {
            Some(date) => {
                let (year, week) = iso_week(date);
                (Some(year), Some(week as i32), Some(weekday_number(date) as i32))
            }
            None => (self.year.value(), self.week.value(), self.weekday.value()),
        };
        [year, week, weekday, self.hour.value(), self.minute.value(), self.second.value()]
    }

    /// Check every concrete component against its calendar bounds. Once year,
    /// month and day are all concrete the day must exist in that month.
    pub fn validate(&self) -> Result<(), PointError> {
        let bounds: [(&'static str, Component, i32, i32); 7] = [
            ("month", self.month, 1, 12),
            ("day", self.day, 1, 31),
            ("hour", self.hour, 0, 23),
            ("minute", self.minute, 0, 59),
            ("second", self.second, 0, 59),
            ("week", self.week, 1, 53),
            ("weekday", self.weekday, 1, 7),
        ];
        for (component, value, lower, upper) in bounds {
            if let Component::Value(value) = value {
                if value < lower || value > upper {
                    return Err(PointError::OutOfRange { component, value });
                }
            }
        }
        if let (Component::Value(month), Component::Value(day)) = (self.month, self.day) {
            let last = match self.year {
                Component::Value(year) => days_in_month(year, month as u32),
                _ => days_in_month(2000, month as u32),
            };
            if day as u32 > last {
                return Err(PointError::OutOfRange { component: "day", value: day });
            }
        }
        if let (Component::Value(year), Component::Value(week)) = (self.year, self.week) {
            if week as u32 > weeks_in_iso_year(year) {
                return Err(PointError::OutOfRange { component: "week", value: week });
            }
        }
        Ok(())
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let has_clock = self.hour.is_present() || self.minute.is_present() || self.second.is_present();
        if self.is_week_form() {
            write!(f, "{}-W{}", self.year.render(4), self.week.render(2))?;
            if self.weekday.is_present() {
                write!(f, "-{}", self.weekday.render(1))?;
            }
        } else {
            f.write_str(&self.year.render(4))?;
            if self.month.is_present() || self.day.is_present() || has_clock {
                write!(f, "-{}", self.month.render(2))?;
            }
            if self.day.is_present() || has_clock {
                write!(f, "-{}", self.day.render(2))?;
            }
        }
        if has_clock {
            write!(f, "T{}", self.hour.render(2))?;
            if self.minute.is_present() || self.second.is_present() {
                write!(f, ":{}", self.minute.render(2))?;
            }
            if self.second.is_present() {
                write!(f, ":{}", self.second.render(2))?;
            }
        }
        Ok(())
    }
}

fn overlay(base: Component, literal: Component) -> Component {
    match (base, literal) {
        (_, Component::Value(v)) => Component::Value(v),
        (Component::Value(v), _) => Component::Value(v),
        (Component::Unknown, _) | (_, Component::Unknown) => Component::Unknown,
        _ => Component::Absent,
    }
}

fn component(text: &str, width: usize) -> Option<Component> {
    if text.len() != width {
        return None;
    }
    if text.bytes().all(|b| b == b'X' || b == b'x') {
        return Some(Component::Unknown);
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse().ok().map(Component::Value);
    }
    None
}

fn shift_days(date: NaiveDate, days: i64) -> Result<NaiveDate, PointError> {
    add_days(date, days).ok_or(PointError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Component::{Absent, Unknown, Value};

    fn point(text: &str) -> TimePoint {
        TimePoint::parse(text).unwrap()
    }

    #[test]
    fn extended_literals_render_back_unchanged() {
        for text in ["2010", "2010-08", "2010-08-04", "2010-08-04T14:30", "2010-08-04T14:30:05", "XXXX-08", "XXXX-XX-25", "2010-W31", "2010-W31-3", "XXXX-WXX-5", "XXXX-XX-XXT15:00"] {
            assert_eq!(point(text).to_string(), text);
        }
    }

    #[test]
    fn compact_and_time_only_literals() {
        assert_eq!(point("20100804").to_string(), "2010-08-04");
        assert_eq!(point("20100804T1430").to_string(), "2010-08-04T14:30");
        let clock = point("T15:00");
        assert_eq!(clock.year, Absent);
        assert_eq!(clock.hour, Value(15));
    }

    #[test]
    fn malformed_and_out_of_range_literals_are_rejected() {
        assert!(matches!(TimePoint::parse("PRESENT_REF"), Err(PointError::Malformed(_))));
        assert!(matches!(TimePoint::parse("20X0-08"), Err(PointError::Malformed(_))));
        assert!(matches!(TimePoint::parse("2010-13"), Err(PointError::OutOfRange { component: "month", .. })));
        assert!(matches!(TimePoint::parse("2010-02-29"), Err(PointError::OutOfRange { component: "day", .. })));
        assert!(TimePoint::parse("2012-02-29").is_ok());
        assert!(matches!(TimePoint::parse("2010-W53"), Err(PointError::OutOfRange { component: "week", .. })));
    }

    #[test]
    fn truncate_to_week_switches_to_iso_week() {
        let week = point("2010-08-04T10:00").truncate(Unit::Week);
        assert_eq!(week.to_string(), "2010-W31");
        assert_eq!(point("2010-08-04T10:00").truncate(Unit::Month).to_string(), "2010-08");
        assert_eq!(point("2010-08-04T10:00").truncate(Unit::Day).to_string(), "2010-08-04");
    }

    #[test]
    fn extend_fills_placeholders_without_inventing_values() {
        let year = point("2010").extend_nonspecific(Unit::Day);
        assert_eq!(year.to_string(), "2010-XX-XX");
        assert_eq!(year.month, Unknown);
        let week = point("2010-W31").extend_nonspecific(Unit::Day);
        assert_eq!(week.to_string(), "2010-W31-X");
    }

    #[test]
    fn concrete_literal_survives_any_reference() {
        let literal = point("2006-12-25T09:15:00");
        let references = ["2010-08-04", "2010-W31-3", "XXXX", "1999-01-01T23:59:59", "2010-08"];
        let units = [Unit::Year, Unit::Month, Unit::Week, Unit::Day, Unit::Hour, Unit::Minute, Unit::Second];
        for reference in references {
            for unit in units {
                let base = point(reference).truncate(unit).extend_nonspecific(unit);
                assert_eq!(base.merge(&literal), literal, "reference {reference} at {unit:?}");
            }
        }
    }

    #[test]
    fn merge_prefers_concrete_components() {
        let base = point("2010-XX-XX");
        assert_eq!(base.merge(&point("XXXX-08-15")).to_string(), "2010-08-15");
        let weekday = TimePoint { weekday: Value(5), ..TimePoint::default() };
        let merged = point("2010-08-04").merge(&weekday);
        assert_eq!(merged.to_string(), "2010-W31-5");
        assert_eq!(merged.normalised().to_string(), "2010-08-06");
    }

    #[test]
    fn add_units_clamps_to_month_end() {
        assert_eq!(point("2012-02-29").add_units(Unit::Year, 1).unwrap().to_string(), "2013-02-28");
        assert_eq!(point("2010-03-31").add_units(Unit::Month, -1).unwrap().to_string(), "2010-02-28");
        assert_eq!(point("2010-11").add_units(Unit::Month, 3).unwrap().to_string(), "2011-02");
        assert_eq!(point("2010-12-30").add_units(Unit::Week, 1).unwrap().to_string(), "2011-01-06");
        assert_eq!(point("2010-W52").add_units(Unit::Week, 1).unwrap().to_string(), "2011-W01");
        assert_eq!(point("2010-08-04T23:30").add_units(Unit::Hour, 2).unwrap().to_string(), "2010-08-05T01:30");
        assert_eq!(point("2010-08-04").add_units(Unit::Day, -4).unwrap().to_string(), "2010-07-31");
    }

    #[test]
    fn add_units_requires_concrete_components() {
        assert_eq!(
            point("XXXX-08").add_units(Unit::Month, 1),
            Err(PointError::NotConcrete { unit: "month" })
        );
        assert!(point("2010-08-04").add_units(Unit::Hour, 1).is_err());
    }

    #[test]
    fn huge_shifts_overflow_instead_of_panicking() {
        for (text, unit) in [
            ("2010", Unit::Year),
            ("2010-08", Unit::Month),
            ("2010-08-04", Unit::Month),
            ("2010-W31", Unit::Week),
            ("2010-08-04", Unit::Week),
            ("2010-08-04", Unit::Day),
            ("2010-08-04T10:00", Unit::Hour),
        ] {
            for n in [i64::MAX, i64::MIN] {
                assert_eq!(point(text).add_units(unit, n), Err(PointError::Overflow), "{text} + {n} {unit:?}");
            }
        }
    }

    #[test]
    fn month_and_day_must_exist_in_a_concrete_year() {
        assert!(point("XXXX-02-29").validate().is_ok());
        let shifted = TimePoint { year: Value(2010), ..point("XXXX-02-29") };
        assert_eq!(shifted.validate(), Err(PointError::OutOfRange { component: "day", value: 29 }));
    }

    #[test]
    fn compare_treats_containment_as_equal() {
        assert_eq!(point("2010-08-04").compare(&point("2010-07-30")), Some(Ordering::Greater));
        assert_eq!(point("2010-08").compare(&point("2010-08-04")), Some(Ordering::Equal));
        assert_eq!(point("2010-W31").compare(&point("2010-08-04")), Some(Ordering::Equal));
        assert_eq!(point("2010-W30").compare(&point("2010-08-04")), Some(Ordering::Less));
        assert_eq!(point("XXXX-08").compare(&point("2010-08-04")), None);
    }

    #[test]
    fn normalised_turns_week_dates_into_calendar_dates() {
        assert_eq!(point("2010-W31-5").normalised().to_string(), "2010-08-06");
        let both = TimePoint { week: Value(31), weekday: Value(3), ..point("2010-08-04") };
        assert_eq!(both.normalised().to_string(), "2010-08-04");
        assert_eq!(point("2010-W31").normalised().to_string(), "2010-W31");
    }

    #[test]
    fn finest_unit_follows_present_components() {
        assert_eq!(point("2010-08").finest_unit(), Some(Unit::Month));
        assert_eq!(point("2010-W31").finest_unit(), Some(Unit::Week));
        assert_eq!(point("XXXX-WXX-5").finest_unit(), Some(Unit::Day));
        assert_eq!(TimePoint::default().finest_unit(), None);
    }
}
