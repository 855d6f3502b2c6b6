//! Per-document reference time.

use super::point::TimePoint;
use crate::engine::{Diagnostics, WarningKind};

/// How an expression picks its reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchoring {
    /// Relative to the speech time ("tomorrow", "two years ago").
    Deictic,
    /// Relative to the last mentioned time ("the next day").
    Anaphoric,
    /// Pointing at the last mentioned time ("that week").
    Demonstrative,
    /// Either; the last mentioned time is preferred.
    Ambiguous,
}

impl Anchoring {
    pub fn parse(text: &str) -> Option<Anchoring> {
        match text.trim().to_ascii_lowercase().as_str() {
            "deictic" => Some(Anchoring::Deictic),
            "anaphoric" => Some(Anchoring::Anaphoric),
            "demonstrative" => Some(Anchoring::Demonstrative),
            "ambiguous" => Some(Anchoring::Ambiguous),
            _ => None,
        }
    }
}

/// Document timestamp plus the most recently normalised concrete point.
///
/// The tracker is `Copy`; normalisation rules receive one by value and hand
/// back the (possibly updated) context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReferenceTracker {
    dct: Option<TimePoint>,
    last: Option<TimePoint>,
}

impl ReferenceTracker {
    pub fn new(dct: Option<TimePoint>) -> Self {
        ReferenceTracker { dct: dct.filter(|p| p.year.is_concrete()), last: None }
    }

    /// Build a tracker from a document timestamp string (`20100804`,
    /// `2010-08-04T10:00`, `2010-08-04 10:00:00`). A timestamp that does not
    /// parse to a point with a concrete year is reported and ignored.
    pub fn from_timestamp(dct: Option<&str>, diagnostics: &mut Diagnostics) -> Self {
        let Some(text) = dct else {
            return ReferenceTracker::default();
        };
        match TimePoint::parse(&text.trim().replacen(' ', "T", 1)) {
            Ok(point) if point.year.is_concrete() => ReferenceTracker::new(Some(point)),
            Ok(_) => {
                diagnostics.warn(WarningKind::MalformedDate, format!("document timestamp `{text}` has no concrete year"));
                ReferenceTracker::default()
            }
            Err(err) => {
                diagnostics.warn(WarningKind::MalformedDate, format!("document timestamp: {err}"));
                ReferenceTracker::default()
            }
        }
    }

    pub fn dct(&self) -> Option<TimePoint> {
        self.dct
    }

    pub fn last(&self) -> Option<TimePoint> {
        self.last
    }

    /// Most specific reference currently known.
    pub fn current(&self) -> Option<TimePoint> {
        self.last.or(self.dct)
    }

    pub fn anchor(&self, anchoring: Anchoring) -> Option<TimePoint> {
        match anchoring {
            Anchoring::Deictic => self.dct.or(self.last),
            Anchoring::Anaphoric | Anchoring::Demonstrative | Anchoring::Ambiguous => self.last.or(self.dct),
        }
    }

    /// Record `point` as the latest reference. Points without a concrete
    /// year cannot anchor anything and are ignored.
    pub fn update(&mut self, point: TimePoint) -> bool {
        if !point.year.is_concrete() {
            return false;
        }
        self.last = Some(point);
        true
    }
}
