//! Calendar arithmetic on `chrono` dates: month shifts with day clamping, ISO
//! weeks, nth-weekday placement and the holiday table.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Clamp `value` into `lower..=upper`.
///
/// Panics when `lower > upper`; callers always pass calendar bounds.
pub fn clamp(value: u32, lower: u32, upper: u32) -> u32 {
    assert!(lower <= upper, "clamp called with lower bound {lower} above upper bound {upper}");
    value.max(lower).min(upper)
}

/// Shift `(year, month)` by `months`, wrapping across year boundaries.
pub fn shift_month(year: i32, month: u32, months: i64) -> Option<(i32, u32)> {
    let zero_based = (i64::from(month) - 1).checked_add(months)?;
    let year = i64::from(year).checked_add(zero_based.div_euclid(12))?;
    let month = zero_based.rem_euclid(12) as u32 + 1;
    Some((i32::try_from(year).ok()?, month))
}

/// Add calendar months to a date, clamping the day to the target month's length.
pub fn add_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let (year, month) = shift_month(date.year(), date.month(), months)?;
    let day = clamp(date.day(), 1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::try_days(days)?)
}

/// ISO weekday number, Monday = 1 .. Sunday = 7.
pub fn weekday_number(date: NaiveDate) -> u32 {
    date.weekday().number_from_monday()
}

pub fn weekday_from_number(number: u32) -> Option<Weekday> {
    match number {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

/// ISO `(year, week)` containing `date`.
pub fn iso_week(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

pub fn weeks_in_iso_year(year: i32) -> u32 {
    NaiveDate::from_ymd_opt(year, 12, 28).map(|d| d.iso_week().week()).unwrap_or(52)
}

pub fn date_from_iso_week(year: i32, week: u32, weekday: u32) -> Option<NaiveDate> {
    NaiveDate::from_isoywd_opt(year, week, weekday_from_number(weekday)?)
}

/// Step from `from` to the `count`-th matching weekday strictly before
/// (`count < 0`) or after (`count > 0`) it. `count == 0` picks the matching day
/// inside `from`'s ISO week.
pub fn relative_weekday(from: NaiveDate, weekday: u32, count: i64) -> Option<NaiveDate> {
    let target = weekday_from_number(weekday)?;
    if count == 0 {
        let (year, week) = iso_week(from);
        return NaiveDate::from_isoywd_opt(year, week, target);
    }
    let step = count.signum();
    let first = (1..=7).filter_map(|k| add_days(from, step * k)).find(|d| d.weekday() == target)?;
    let weeks = i64::try_from(count.unsigned_abs() - 1).ok()?;
    add_days(first, weeks.checked_mul(7 * step)?)
}

/// The `n`-th `weekday` of a month; negative `n` counts from the end (-1 = last).
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: i32) -> Option<NaiveDate> {
    if n == 0 {
        return None;
    }
    if n > 0 {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let offset = (7 + weekday.num_days_from_monday() as i64 - first.weekday().num_days_from_monday() as i64) % 7;
        let date = add_days(first, offset + 7 * (i64::from(n) - 1))?;
        return (date.month() == month).then_some(date);
    }
    let last = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month))?;
    let offset = (7 + last.weekday().num_days_from_monday() as i64 - weekday.num_days_from_monday() as i64) % 7;
    let date = add_days(last, -(offset + 7 * (i64::from(-n) - 1)))?;
    (date.month() == month).then_some(date)
}

/// Gregorian Easter Sunday (anonymous computus).
pub fn easter(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HolidayRule {
    Fixed(u32, u32),
    NthWeekday { n: i32, weekday: Weekday, month: u32 },
    Easter(i64),
}

fn holiday_rule(name: &str) -> Option<HolidayRule> {
    let rule = match name.trim().to_lowercase().as_str() {
        "christmas" | "xmas" => HolidayRule::Fixed(12, 25),
        "halloween" => HolidayRule::Fixed(10, 31),
        "hogmanay" => HolidayRule::Fixed(12, 31),
        "epiphany" => HolidayRule::Fixed(1, 6),
        "valentines" | "valentine's" => HolidayRule::Fixed(2, 14),
        "thanksgiving" => HolidayRule::NthWeekday { n: 4, weekday: Weekday::Thu, month: 11 },
        "mlk" => HolidayRule::NthWeekday { n: 3, weekday: Weekday::Mon, month: 1 },
        "presidents" | "presidents'" => HolidayRule::NthWeekday { n: 3, weekday: Weekday::Mon, month: 2 },
        "memorial" => HolidayRule::NthWeekday { n: -1, weekday: Weekday::Mon, month: 5 },
        "labor" | "labour" => HolidayRule::NthWeekday { n: 1, weekday: Weekday::Mon, month: 9 },
        "columbus" => HolidayRule::NthWeekday { n: 2, weekday: Weekday::Mon, month: 10 },
        "easter" => HolidayRule::Easter(0),
        "ascension" => HolidayRule::Easter(39),
        "pentecost" | "whitsun" => HolidayRule::Easter(49),
        _ => return None,
    };
    Some(rule)
}

/// Date of a named holiday in `year`.
pub fn holiday_date(name: &str, year: i32) -> Option<NaiveDate> {
    match holiday_rule(name)? {
        HolidayRule::Fixed(month, day) => NaiveDate::from_ymd_opt(year, month, day),
        HolidayRule::NthWeekday { n, weekday, month } => nth_weekday_of_month(year, month, weekday, n),
        HolidayRule::Easter(offset) => add_days(easter(year)?, offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_shift_clamps_day() {
        assert_eq!(add_months(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
        assert_eq!(add_months(date(2023, 1, 31), 1), Some(date(2023, 2, 28)));
        assert_eq!(add_months(date(2010, 1, 15), -2), Some(date(2009, 11, 15)));
    }

    #[test]
    fn month_shift_overflow_is_none() {
        assert_eq!(shift_month(2010, 8, i64::MAX), None);
        assert_eq!(shift_month(2010, 8, i64::MIN), None);
        assert_eq!(shift_month(2010, 8, -20), Some((2008, 12)));
    }

    #[test]
    fn leap_years_follow_gregorian_rules() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2024));
        assert_eq!(days_in_month(2023, 2), 28);
    }

    #[test]
    #[should_panic(expected = "lower bound")]
    fn clamp_rejects_inverted_bounds() {
        clamp(5, 10, 1);
    }

    #[test]
    fn iso_week_round_trips() {
        assert_eq!(iso_week(date(2010, 8, 4)), (2010, 31));
        assert_eq!(date_from_iso_week(2010, 31, 3), Some(date(2010, 8, 4)));
        // 2010-01-01 belongs to the last ISO week of 2009.
        assert_eq!(iso_week(date(2010, 1, 1)), (2009, 53));
        assert_eq!(weeks_in_iso_year(2009), 53);
        assert_eq!(weeks_in_iso_year(2010), 52);
    }

    #[test]
    fn relative_weekday_is_strict() {
        // 2010-08-04 is a Wednesday.
        assert_eq!(relative_weekday(date(2010, 8, 4), 5, -1), Some(date(2010, 7, 30)));
        assert_eq!(relative_weekday(date(2010, 8, 4), 3, -1), Some(date(2010, 7, 28)));
        assert_eq!(relative_weekday(date(2010, 8, 4), 1, 1), Some(date(2010, 8, 9)));
        assert_eq!(relative_weekday(date(2010, 8, 4), 5, 0), Some(date(2010, 8, 6)));
        assert_eq!(relative_weekday(date(2010, 8, 4), 5, -2), Some(date(2010, 7, 23)));
        assert_eq!(relative_weekday(date(2010, 8, 4), 5, i64::MAX), None);
        assert_eq!(relative_weekday(date(2010, 8, 4), 5, i64::MIN), None);
    }

    #[test]
    fn holidays_resolve_per_year() {
        assert_eq!(holiday_date("Thanksgiving", 2010), Some(date(2010, 11, 25)));
        assert_eq!(holiday_date("memorial", 2010), Some(date(2010, 5, 31)));
        assert_eq!(holiday_date("easter", 2010), Some(date(2010, 4, 4)));
        assert_eq!(holiday_date("xmas", 2006), Some(date(2006, 12, 25)));
        assert_eq!(holiday_date("arbor", 2006), None);
    }
}
