//! Token-pattern compilation and matching.
//!
//! Rules match against a *rendering* of the sentence rather than against the
//! token list directly. In tokenised mode every token becomes `<surface~POS>`
//! and the pattern language is rewritten so that wildcards stay inside one
//! token:
//!
//! ```text
//! pattern   <last~JJ><$DAYS~NNP>
//! regex     (?i)(?:<(?:last~JJ)>)(?:<(?:(?:wednesday|thursday|...)~NNP)>)
//! rendered  <He~PRP><left~VBD><last~JJ><Friday~NNP><.~.>
//! ```
//!
//! Every rendered token records its byte span, which is how a match is turned
//! back into an inclusive token range.

use crate::document::TaggedToken;
use crate::temporal::words::symbolic_class;
use regex::Regex;
use std::ops::{Range, RangeInclusive};

/// How tokens are turned into text before matching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// `<surface~POS>` per token, no separator.
    #[default]
    Tokenised,
    /// Surfaces only, joined by the given delimiter.
    Joined(String),
}

impl RenderMode {
    /// Interpret a `Tokenise:` field value. Booleans select the mode; anything
    /// else is taken verbatim as the delimiter.
    pub fn from_field(value: &str) -> RenderMode {
        match parse_bool(value) {
            Some(true) => RenderMode::Tokenised,
            Some(false) => RenderMode::Joined(" ".to_string()),
            None => RenderMode::Joined(value.to_string()),
        }
    }

    pub fn is_tokenised(&self) -> bool {
        matches!(self, RenderMode::Tokenised)
    }

    /// Text placed between two adjacent renderings (body and flanks).
    pub fn separator(&self) -> &str {
        match self {
            RenderMode::Tokenised => "",
            RenderMode::Joined(delimiter) => delimiter,
        }
    }
}

pub(crate) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// A rendered token slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Byte span of each token inside `text`.
    pub spans: Vec<Range<usize>>,
}

impl Rendered {
    pub fn new(tokens: &[TaggedToken], mode: &RenderMode) -> Rendered {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(tokens.len());
        for (idx, tagged) in tokens.iter().enumerate() {
            if idx > 0 {
                text.push_str(mode.separator());
            }
            let start = text.len();
            match mode {
                RenderMode::Tokenised => {
                    text.push('<');
                    text.push_str(&tagged.token.text);
                    text.push('~');
                    text.push_str(&tagged.token.pos);
                    text.push('>');
                }
                RenderMode::Joined(_) => text.push_str(&tagged.token.text),
            }
            spans.push(start..text.len());
        }
        Rendered { text, spans }
    }

    /// Inclusive range of the tokens overlapped by bytes `start..end`.
    pub fn token_range(&self, start: usize, end: usize) -> Option<RangeInclusive<usize>> {
        let first = self.spans.iter().position(|span| span.end > start)?;
        let last = self.spans.iter().rposition(|span| span.start < end)?;
        (first <= last).then_some(first..=last)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("unknown symbolic class `${0}`")]
    UnknownClass(String),
    #[error("{0}")]
    Regex(String),
}

/// A compiled rule pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn compile(source: &str, mode: &RenderMode, case_sensitive: bool) -> Result<Pattern, PatternError> {
        let expanded = expand_classes(source)?;
        let body = if mode.is_tokenised() { tokenise(&expanded) } else { expanded };
        let full = if case_sensitive { body } else { format!("(?i){body}") };
        let regex = Regex::new(&full).map_err(|err| PatternError::Regex(err.to_string()))?;
        Ok(Pattern { source: source.to_string(), regex })
    }

    /// Pattern as written in the rule file.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of capture groups, not counting the whole match.
    pub fn group_count(&self) -> usize {
        self.regex.captures_len() - 1
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Byte spans of successive non-overlapping, non-empty matches.
    pub fn find_spans(&self, text: &str) -> Vec<Range<usize>> {
        self.regex.find_iter(text).map(|m| m.range()).filter(|range| !range.is_empty()).collect()
    }

    /// Captures of the first match; index 0 is the whole match and groups that
    /// did not participate are empty.
    pub fn captures(&self, text: &str) -> Option<Vec<String>> {
        let caps = self.regex.captures(text)?;
        Some(caps.iter().map(|group| group.map(|m| m.as_str().to_string()).unwrap_or_default()).collect())
    }
}

/// Replace `$NAME` with an alternation of the class's words, longest first.
fn expand_classes(source: &str) -> Result<String, PatternError> {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '$' if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                let mut name = String::new();
                while let Some(n) = chars.peek().copied() {
                    if !(n.is_ascii_alphanumeric() || n == '_') {
                        break;
                    }
                    name.push(n);
                    chars.next();
                }
                let words = symbolic_class(&name).ok_or(PatternError::UnknownClass(name))?;
                let mut sorted: Vec<&String> = words.iter().collect();
                sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
                let alternation: Vec<String> = sorted.iter().map(|word| regex::escape(word)).collect();
                out.push_str("(?:");
                out.push_str(&alternation.join("|"));
                out.push(')');
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

/// Rewrite a pattern for `<surface~POS>` renderings.
fn tokenise(source: &str) -> String {
    let mut out = String::with_capacity(source.len() * 2);
    let mut in_class = false;
    let mut chars = source.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            ']' if in_class => {
                in_class = false;
                out.push(c);
            }
            _ if in_class => out.push(c),
            '[' => {
                in_class = true;
                out.push(c);
            }
            c if c.is_whitespace() => {}
            '<' => out.push_str("(?:<(?:"),
            '>' => out.push_str(")>)"),
            '.' => out.push_str("[^<>]"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Sentence;

    fn sentence() -> Sentence {
        Sentence::from_pairs(0, &[("He", "PRP"), ("left", "VBD"), ("last", "JJ"), ("Friday", "NNP"), (".", ".")])
    }

    #[test]
    fn tokenised_rendering_records_spans() {
        let rendered = Rendered::new(sentence().tokens(), &RenderMode::Tokenised);
        assert_eq!(rendered.text, "<He~PRP><left~VBD><last~JJ><Friday~NNP><.~.>");
        assert_eq!(&rendered.text[rendered.spans[3].clone()], "<Friday~NNP>");
    }

    #[test]
    fn joined_rendering_uses_delimiter() {
        let rendered = Rendered::new(sentence().tokens(), &RenderMode::from_field("false"));
        assert_eq!(rendered.text, "He left last Friday .");
        let rendered = Rendered::new(sentence().tokens(), &RenderMode::from_field("_"));
        assert_eq!(rendered.text, "He_left_last_Friday_.");
    }

    #[test]
    fn match_maps_back_to_token_range() {
        let rendered = Rendered::new(sentence().tokens(), &RenderMode::Tokenised);
        let pattern = Pattern::compile("<last~JJ><$DAYS~NNP>", &RenderMode::Tokenised, false).unwrap();
        let spans = pattern.find_spans(&rendered.text);
        assert_eq!(spans.len(), 1);
        assert_eq!(rendered.token_range(spans[0].start, spans[0].end), Some(2..=3));
    }

    #[test]
    fn wildcards_stay_inside_one_token() {
        let rendered = Rendered::new(sentence().tokens(), &RenderMode::Tokenised);
        let pattern = Pattern::compile("<left~.+>", &RenderMode::Tokenised, false).unwrap();
        let spans = pattern.find_spans(&rendered.text);
        assert_eq!(&rendered.text[spans[0].clone()], "<left~VBD>");

        let greedy = Pattern::compile("<l.+Friday~NNP>", &RenderMode::Tokenised, false).unwrap();
        assert!(!greedy.is_match(&rendered.text));
    }

    #[test]
    fn case_sensitivity_is_opt_in() {
        let lower = Pattern::compile("<friday~NNP>", &RenderMode::Tokenised, false).unwrap();
        assert!(lower.is_match("<Friday~NNP>"));
        let strict = Pattern::compile("<friday~NNP>", &RenderMode::Tokenised, true).unwrap();
        assert!(!strict.is_match("<Friday~NNP>"));
    }

    #[test]
    fn captures_include_whole_match_and_missing_groups() {
        let pattern = Pattern::compile("<(\\d+)~CD><($UNITS)~NNS>(<ago~RB>)?", &RenderMode::Tokenised, false).unwrap();
        assert_eq!(pattern.group_count(), 3);
        let caps = pattern.captures("<3~CD><days~NNS><later~RB>").unwrap();
        assert_eq!(caps, vec!["<3~CD><days~NNS>", "3", "days", ""]);
    }

    #[test]
    fn character_classes_are_left_alone() {
        let pattern = Pattern::compile("<[0-9 .]+~CD>", &RenderMode::Tokenised, false).unwrap();
        assert!(pattern.is_match("<1.5~CD>"));
        assert!(pattern.is_match("<1 5~CD>"));
    }

    #[test]
    fn bad_patterns_are_reported() {
        assert_eq!(
            Pattern::compile("<$WEEKDAYZ~NNP>", &RenderMode::Tokenised, false).unwrap_err(),
            PatternError::UnknownClass("WEEKDAYZ".to_string())
        );
        assert!(matches!(Pattern::compile("a{5,2}", &RenderMode::Tokenised, false), Err(PatternError::Regex(_))));
        assert!(matches!(Pattern::compile("<(a~NN>", &RenderMode::Tokenised, false), Err(PatternError::Regex(_))));
    }
}
