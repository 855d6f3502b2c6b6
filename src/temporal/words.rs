//! Word tables and conversions used by patterns and value expressions.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use std::collections::HashMap;

pub(crate) static MONTH_NAME: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("january", 1),
        ("jan", 1),
        ("february", 2),
        ("feb", 2),
        ("march", 3),
        ("mar", 3),
        ("april", 4),
        ("apr", 4),
        ("may", 5),
        ("june", 6),
        ("jun", 6),
        ("july", 7),
        ("jul", 7),
        ("august", 8),
        ("aug", 8),
        ("september", 9),
        ("sept", 9),
        ("sep", 9),
        ("october", 10),
        ("oct", 10),
        ("november", 11),
        ("nov", 11),
        ("december", 12),
        ("dec", 12),
    ])
});

pub(crate) static DAY_OF_WEEK: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("monday", 1),
        ("mon", 1),
        ("tuesday", 2),
        ("tue", 2),
        ("tues", 2),
        ("wednesday", 3),
        ("wed", 3),
        ("thursday", 4),
        ("thu", 4),
        ("thurs", 4),
        ("friday", 5),
        ("fri", 5),
        ("saturday", 6),
        ("sat", 6),
        ("sunday", 7),
        ("sun", 7),
    ])
});

static SMALL_NUMBERS: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    HashMap::from([
        ("zero", 0),
        ("one", 1),
        ("two", 2),
        ("three", 3),
        ("four", 4),
        ("five", 5),
        ("six", 6),
        ("seven", 7),
        ("eight", 8),
        ("nine", 9),
        ("ten", 10),
        ("eleven", 11),
        ("twelve", 12),
        ("thirteen", 13),
        ("fourteen", 14),
        ("fifteen", 15),
        ("sixteen", 16),
        ("seventeen", 17),
        ("eighteen", 18),
        ("nineteen", 19),
    ])
});

static TENS: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    HashMap::from([
        ("twenty", 20),
        ("thirty", 30),
        ("forty", 40),
        ("fifty", 50),
        ("sixty", 60),
        ("seventy", 70),
        ("eighty", 80),
        ("ninety", 90),
    ])
});

static ORDINALS: Lazy<HashMap<&'static str, i64>> = Lazy::new(|| {
    HashMap::from([
        ("first", 1),
        ("second", 2),
        ("third", 3),
        ("fourth", 4),
        ("fifth", 5),
        ("sixth", 6),
        ("seventh", 7),
        ("eighth", 8),
        ("ninth", 9),
        ("tenth", 10),
        ("eleventh", 11),
        ("twelfth", 12),
        ("thirteenth", 13),
        ("fourteenth", 14),
        ("fifteenth", 15),
        ("sixteenth", 16),
        ("seventeenth", 17),
        ("eighteenth", 18),
        ("nineteenth", 19),
        ("twentieth", 20),
        ("thirtieth", 30),
    ])
});

const DAY_HOLIDAYS: &[&str] =
    &["christmas", "thanksgiving", "labor", "labour", "memorial", "columbus", "presidents", "valentines", "valentine's"];
const NTH_DOW_HOLIDAYS: &[&str] = &["thanksgiving", "mlk", "presidents", "presidents'", "memorial", "labor", "labour", "columbus"];
const FIXED_HOLIDAYS: &[&str] = &["christmas", "xmas", "halloween", "hogmanay", "epiphany", "valentines", "valentine's"];
const LUNAR_HOLIDAYS: &[&str] = &["easter", "ascension", "pentecost", "whitsun"];
const RELATIVE_DAYS: &[&str] = &["today", "tonight", "tomorrow", "yesterday", "now"];
const RELATIVE_MODIFIERS: &[&str] = &["this", "next", "last", "coming", "past", "previous", "following", "current"];
const SEASONS: &[&str] = &["spring", "summer", "autumn", "fall", "winter"];
const UNITS: &[&str] = &[
    "year", "years", "decade", "decades", "century", "centuries", "quarter", "quarters", "month", "months", "fortnight",
    "fortnights", "week", "weeks", "day", "days", "hour", "hours", "minute", "minutes", "second", "seconds",
];
const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september", "october", "november",
    "december",
];
const MONTH_ABBRS: &[&str] =
    &["jan", "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "jan.", "feb.", "mar.", "apr.", "jun.", "jul.", "aug.", "sep.", "sept.", "oct.", "nov.", "dec."];
const DAYS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "mon", "tue", "tues", "wed", "thu",
    "thurs", "fri", "sat", "sun",
];

/// Closed word lists available to patterns as `$NAME`.
static SYMBOLIC_CLASSES: Lazy<HashMap<&'static str, Vec<String>>> = Lazy::new(|| {
    let owned = |words: &[&str]| words.iter().map(|w| w.to_string()).collect::<Vec<_>>();

    let mut ordinal_words: Vec<String> = ORDINALS.keys().map(|w| w.to_string()).collect();
    for tens in ["twenty", "thirty"] {
        for unit in ["first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth"] {
            if tens == "thirty" && unit != "first" {
                continue;
            }
            ordinal_words.push(format!("{tens}-{unit}"));
        }
    }
    let ordinal_nums: Vec<String> = (1..=31).map(|n| format!("{n}{}", ordinal_suffix(n))).collect();
    let mut number_words: Vec<String> = SMALL_NUMBERS.keys().chain(TENS.keys()).map(|w| w.to_string()).collect();
    number_words.extend(owned(&["hundred", "thousand", "a", "an", "half", "couple", "dozen"]));

    HashMap::from([
        ("ORDINAL_WORDS", ordinal_words),
        ("ORDINAL_NUMS", ordinal_nums),
        ("DAYS", owned(DAYS)),
        ("MONTHS", owned(MONTHS)),
        ("MONTH_ABBRS", owned(MONTH_ABBRS)),
        ("RELATIVE_DAYS", owned(RELATIVE_DAYS)),
        ("DAY_HOLIDAYS", owned(DAY_HOLIDAYS)),
        ("NTH_DOW_HOLIDAYS", owned(NTH_DOW_HOLIDAYS)),
        ("FIXED_HOLIDAYS", owned(FIXED_HOLIDAYS)),
        ("LUNAR_HOLIDAYS", owned(LUNAR_HOLIDAYS)),
        ("UNITS", owned(UNITS)),
        ("NUMBER_WORDS", number_words),
        ("SEASONS", owned(SEASONS)),
        ("RELATIVE_MODIFIERS", owned(RELATIVE_MODIFIERS)),
    ])
});

/// Words of the symbolic class `name` (without the leading `$`).
pub fn symbolic_class(name: &str) -> Option<&'static [String]> {
    SYMBOLIC_CLASSES.get(name).map(Vec::as_slice)
}

fn ordinal_suffix(n: i64) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

pub fn month_to_num(word: &str) -> Option<u32> {
    MONTH_NAME.get(word.trim().trim_end_matches('.').to_lowercase().as_str()).copied()
}

/// ISO weekday number (Monday = 1).
pub fn day_to_num(word: &str) -> Option<u32> {
    DAY_OF_WEEK.get(word.trim().trim_end_matches('.').to_lowercase().as_str()).copied()
}

/// `"3rd"`, `"third"`, `"twenty-first"` → 3, 3, 21.
pub fn ordinal_to_num(text: &str) -> Option<i64> {
    let text = text.trim().to_lowercase();
    if text.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        let digits = text.trim_end_matches(|c: char| c.is_ascii_alphabetic());
        return digits.parse().ok();
    }
    let words: Vec<&str> = text.split(|c: char| c == '-' || c.is_whitespace()).filter(|w| !w.is_empty()).collect();
    match words.as_slice() {
        [word] => ORDINALS.get(word).copied(),
        [tens, unit] => Some(TENS.get(tens)? + ORDINALS.get(unit).filter(|n| **n < 10)?),
        _ => None,
    }
}

/// Cardinal numbers written as digits or words: `"12"`, `"1.5"`, `"twenty-five"`,
/// `"three and a half"`, `"a couple"`.
pub fn words_to_num(text: &str) -> Option<f64> {
    let text = text.trim().to_lowercase();
    if text.starts_with(|c: char| c.is_ascii_digit() || c == '.' || c == '-') {
        if let Ok(value) = text.replace(',', "").parse::<f64>() {
            return Some(value);
        }
    }
    for suffix in [" and a half", " and half"] {
        if let Some(whole) = text.strip_suffix(suffix) {
            return Some(words_to_num(whole)? + 0.5);
        }
    }
    if text == "half" || text == "a half" {
        return Some(0.5);
    }

    let mut total = 0i64;
    let mut current = 0i64;
    let mut seen = false;
    for word in text.split(|c: char| c == '-' || c.is_whitespace()).filter(|w| !w.is_empty()) {
        match word {
            "and" | "of" => continue,
            "a" | "an" => current = current.max(1),
            "couple" => current = 2,
            "dozen" => current = current.max(1) * 12,
            "hundred" => current = current.max(1) * 100,
            "thousand" => {
                total += current.max(1) * 1000;
                current = 0;
            }
            _ => {
                if let Some(n) = SMALL_NUMBERS.get(word).or_else(|| TENS.get(word)) {
                    current += n;
                } else if let Ok(n) = word.parse::<i64>() {
                    current += n;
                } else {
                    return None;
                }
            }
        }
        seen = true;
    }
    seen.then_some((total + current) as f64)
}

/// TIMEX season code.
pub fn season(word: &str) -> Option<&'static str> {
    match word.trim().to_lowercase().as_str() {
        "spring" => Some("SP"),
        "summer" => Some("SU"),
        "autumn" | "fall" => Some("FA"),
        "winter" => Some("WI"),
        _ => None,
    }
}

/// Decade value: `"1990s"`, `"'90s"`, `"nineties"` → `"199"`.
pub fn decade(text: &str) -> Option<String> {
    let text = text.trim().trim_start_matches(['\'', '’']).to_lowercase();
    if let Some(digits) = text.strip_suffix("s").map(|t| t.trim_end_matches('\'')) {
        if digits.len() == 4 && digits.ends_with('0') && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Some(digits[..3].to_string());
        }
        if digits.len() == 2 && digits.ends_with('0') && digits.bytes().all(|b| b.is_ascii_digit()) {
            return Some(format!("19{}", &digits[..1]));
        }
    }
    let tens = match text.as_str() {
        "twenties" => 2,
        "thirties" => 3,
        "forties" => 4,
        "fifties" => 5,
        "sixties" => 6,
        "seventies" => 7,
        "eighties" => 8,
        "nineties" => 9,
        _ => return None,
    };
    Some(format!("19{tens}"))
}

/// Numeric dates (`2010-08-04`, `20100804`, `8/4/2010`, `8/4/10`) as `YYYY-MM-DD`.
pub fn date_to_iso(text: &str) -> Option<String> {
    let text = text.trim();
    let (year, month, day) = if let Some(caps) = regex!(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").captures(text) {
        (caps[1].parse::<i32>().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
    } else if let Some(caps) = regex!(r"^(\d{4})(\d{2})(\d{2})$").captures(text) {
        (caps[1].parse::<i32>().ok()?, caps[2].parse().ok()?, caps[3].parse().ok()?)
    } else if let Some(caps) = regex!(r"^(\d{1,2})/(\d{1,2})/(\d{2}|\d{4})$").captures(text) {
        let year: i32 = caps[3].parse().ok()?;
        let year = match caps[3].len() {
            2 if year < 50 => 2000 + year,
            2 => 1900 + year,
            _ => year,
        };
        (year, caps[1].parse().ok()?, caps[2].parse().ok()?)
    } else {
        return None;
    };
    NaiveDate::from_ymd_opt(year, month, day).map(|date| date.format("%Y-%m-%d").to_string())
}
