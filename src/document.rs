//! Token stream and tag arena.
//!
//! A [`Document`] owns its sentences; each [`Sentence`] owns its tokens and the
//! tags ([`Timex`]) created on it. Tags never span more than one sentence, so
//! the sentence is the natural owner of the tag arena and recognition can run
//! on every sentence independently.
//!
//! Tokens refer to tags (and tags to other tags) through [`TagId`] handles:
//!
//! ```text
//! Document
//!  └─ Sentence #1
//!      ├─ tokens: [ (three/CD, {t1.0}), (days/NNS, {t1.0}), (ago/RB, {t1.0}) ]
//!      └─ tags:   [ Timex { kind: date, value: Some("2010-08-01"), .. } ]
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

/// A word and its part-of-speech tag, as produced by an upstream tagger.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub text: String,
    pub pos: String,
}

impl Token {
    pub fn new(text: impl Into<String>, pos: impl Into<String>) -> Self {
        Token { text: text.into(), pos: pos.into() }
    }
}

/// Handle to a [`Timex`] stored in a sentence's tag arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId {
    sentence: usize,
    index: usize,
}

impl TagId {
    pub fn new(sentence: usize, index: usize) -> Self {
        TagId { sentence, index }
    }

    /// Index of the owning sentence within its document.
    pub fn sentence(self) -> usize {
        self.sentence
    }

    /// Index into the owning sentence's tag arena.
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}.{}", self.sentence, self.index)
    }
}

/// TIMEX type of a recognised expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Date,
    Time,
    Duration,
    Set,
}

impl TagKind {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "date" => Some(TagKind::Date),
            "time" => Some(TagKind::Time),
            "duration" => Some(TagKind::Duration),
            "set" => Some(TagKind::Set),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TagKind::Date => "date",
            TagKind::Time => "time",
            TagKind::Duration => "duration",
            TagKind::Set => "set",
        }
    }

    /// Date and time tags denote points and can become a reference for later tags.
    pub fn is_point(self) -> bool {
        matches!(self, TagKind::Date | TagKind::Time)
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relation of a point to its reference time, as labelled by a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Before,
    After,
    Same,
}

impl Direction {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "before" => Some(Direction::Before),
            "after" => Some(Direction::After),
            "same" => Some(Direction::Same),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Before => "before",
            Direction::After => "after",
            Direction::Same => "same",
        }
    }
}

/// A recognised temporal expression and its normalisation attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Timex {
    kind: TagKind,
    /// Type reported to callers after a `Change-Type` action; the recognised
    /// `kind` itself never changes.
    pub kind_override: Option<TagKind>,
    pub value: Option<String>,
    pub set: bool,
    pub modifier: Option<String>,
    pub freq: Option<String>,
    pub quant: Option<String>,
    pub direction: Option<Direction>,
    pub begin: Option<TagId>,
    pub end: Option<TagId>,
    pub anchor: Option<TagId>,
}

impl Timex {
    pub fn new(kind: TagKind) -> Self {
        Timex {
            kind,
            kind_override: None,
            value: None,
            set: kind == TagKind::Set,
            modifier: None,
            freq: None,
            quant: None,
            direction: None,
            begin: None,
            end: None,
            anchor: None,
        }
    }

    /// Kind assigned at recognition time.
    pub fn kind(&self) -> TagKind {
        self.kind
    }

    /// Kind after any `Change-Type` override.
    pub fn effective_kind(&self) -> TagKind {
        self.kind_override.unwrap_or(self.kind)
    }
}

/// A token together with the tags attached to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub token: Token,
    pub tags: BTreeSet<TagId>,
}

impl TaggedToken {
    pub fn new(token: Token) -> Self {
        TaggedToken { token, tags: BTreeSet::new() }
    }
}

/// One sentence: its tokens and the arena of tags created on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    index: usize,
    tokens: Vec<TaggedToken>,
    tags: Vec<Timex>,
}

impl Sentence {
    pub fn new(index: usize, tokens: impl IntoIterator<Item = Token>) -> Self {
        Sentence { index, tokens: tokens.into_iter().map(TaggedToken::new).collect(), tags: Vec::new() }
    }

    /// Build a sentence from `(word, pos)` pairs.
    pub fn from_pairs(index: usize, pairs: &[(&str, &str)]) -> Self {
        Self::new(index, pairs.iter().map(|(text, pos)| Token::new(*text, *pos)))
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[TaggedToken] {
        &self.tokens
    }

    /// Number of tags ever created on this sentence, attached or not.
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn tag(&self, index: usize) -> Option<&Timex> {
        self.tags.get(index)
    }

    pub fn tag_mut(&mut self, index: usize) -> Option<&mut Timex> {
        self.tags.get_mut(index)
    }

    /// Store a new tag in this sentence's arena without attaching it to tokens.
    pub fn push_tag(&mut self, timex: Timex) -> TagId {
        self.tags.push(timex);
        TagId::new(self.index, self.tags.len() - 1)
    }

    /// Attach `id` to every token in `range`, keeping tags already present.
    pub fn attach(&mut self, range: RangeInclusive<usize>, id: TagId) {
        debug_assert_eq!(id.sentence(), self.index, "tags never cross sentence boundaries");
        for token in self.tokens.iter_mut().take(range.end() + 1).skip(*range.start()) {
            token.tags.insert(id);
        }
    }

    /// Remove every tag reference from the tokens in `range`.
    pub fn clear_tags(&mut self, range: RangeInclusive<usize>) {
        for token in self.tokens.iter_mut().take(range.end() + 1).skip(*range.start()) {
            token.tags.clear();
        }
    }

    /// Inclusive token range covered by tag `index`, if it is still attached anywhere.
    pub fn extent(&self, index: usize) -> Option<RangeInclusive<usize>> {
        let id = TagId::new(self.index, index);
        let first = self.tokens.iter().position(|t| t.tags.contains(&id))?;
        let last = self.tokens.iter().rposition(|t| t.tags.contains(&id))?;
        Some(first..=last)
    }

    /// Attached tags ordered by the first token of their extent.
    pub fn tags_in_order(&self) -> Vec<(usize, RangeInclusive<usize>)> {
        let mut out: Vec<(usize, RangeInclusive<usize>)> =
            (0..self.tags.len()).filter_map(|idx| self.extent(idx).map(|range| (idx, range))).collect();
        out.sort_by_key(|(idx, range)| (*range.start(), *idx));
        out
    }

    /// Split borrow used by normalisation: the tag is mutated while its
    /// surrounding tokens are read.
    pub(crate) fn tag_and_tokens_mut(&mut self, index: usize) -> Option<(&mut Timex, &[TaggedToken])> {
        let Sentence { tokens, tags, .. } = self;
        Some((tags.get_mut(index)?, tokens.as_slice()))
    }
}

/// Fixed feature record describing one tag and its immediate context.
///
/// This is what an injected direction classifier sees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFeatures {
    pub kind: TagKind,
    pub words: Vec<String>,
    pub pos: Vec<String>,
    pub preceding_word: Option<String>,
    pub preceding_pos: Option<String>,
    pub following_word: Option<String>,
    pub following_pos: Option<String>,
    /// POS tags of every verb (`VB*`) in the sentence, in order.
    pub verb_tags: Vec<String>,
}

/// Decides whether an ambiguous expression points before or after its anchor.
///
/// Implementations see a fixed [`TagFeatures`] record and must be usable
/// from any thread.
pub trait DirectionClassifier: Send + Sync {
    fn classify(&self, features: &TagFeatures) -> Option<Direction>;
}

impl<F> DirectionClassifier for F
where
    F: Fn(&TagFeatures) -> Option<Direction> + Send + Sync,
{
    fn classify(&self, features: &TagFeatures) -> Option<Direction> {
        self(features)
    }
}

/// A document: ordered sentences plus an optional creation timestamp.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    sentences: Vec<Sentence>,
    dct: Option<String>,
}

impl Document {
    pub fn new(sentences: impl IntoIterator<Item = Vec<Token>>) -> Self {
        let sentences = sentences.into_iter().enumerate().map(|(idx, tokens)| Sentence::new(idx, tokens)).collect();
        Document { sentences, dct: None }
    }

    /// Build a document from sentences of `(word, pos)` pairs.
    pub fn from_pairs(sentences: &[&[(&str, &str)]]) -> Self {
        Self::new(sentences.iter().map(|pairs| pairs.iter().map(|(text, pos)| Token::new(*text, *pos)).collect()))
    }

    pub fn with_dct(mut self, dct: impl Into<String>) -> Self {
        self.dct = Some(dct.into());
        self
    }

    pub fn dct(&self) -> Option<&str> {
        self.dct.as_deref()
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn sentences_mut(&mut self) -> &mut [Sentence] {
        &mut self.sentences
    }

    pub fn tag(&self, id: TagId) -> Option<&Timex> {
        self.sentences.get(id.sentence())?.tag(id.index())
    }

    pub fn tag_mut(&mut self, id: TagId) -> Option<&mut Timex> {
        self.sentences.get_mut(id.sentence())?.tag_mut(id.index())
    }

    /// Attach a pre-existing tag (e.g. from an annotated corpus) to `range` of a sentence.
    pub fn add_tag(&mut self, sentence: usize, range: RangeInclusive<usize>, timex: Timex) -> Option<TagId> {
        let sent = self.sentences.get_mut(sentence)?;
        if *range.end() >= sent.len() || range.start() > range.end() {
            return None;
        }
        let id = sent.push_tag(timex);
        sent.attach(range, id);
        Some(id)
    }

    /// Every tag that is still attached to at least one token, in document order.
    pub fn tags(&self) -> Vec<(TagId, &Timex)> {
        let mut out = Vec::new();
        for sentence in &self.sentences {
            for (idx, _) in sentence.tags_in_order() {
                if let Some(timex) = sentence.tag(idx) {
                    out.push((TagId::new(sentence.index(), idx), timex));
                }
            }
        }
        out
    }

    pub fn extent(&self, id: TagId) -> Option<RangeInclusive<usize>> {
        self.sentences.get(id.sentence())?.extent(id.index())
    }

    /// Surface words covered by `id`, joined by single spaces.
    pub fn span_text(&self, id: TagId) -> Option<String> {
        let range = self.extent(id)?;
        let sentence = self.sentences.get(id.sentence())?;
        let words: Vec<&str> = sentence.tokens()[range].iter().map(|t| t.token.text.as_str()).collect();
        Some(words.join(" "))
    }

    pub fn features(&self, id: TagId) -> Option<TagFeatures> {
        let sentence = self.sentences.get(id.sentence())?;
        let timex = sentence.tag(id.index())?;
        let range = sentence.extent(id.index())?;
        Some(features_for(timex.kind(), sentence.tokens(), range))
    }
}

pub(crate) fn features_for(kind: TagKind, tokens: &[TaggedToken], range: RangeInclusive<usize>) -> TagFeatures {
    let body = &tokens[range.clone()];
    let preceding = range.start().checked_sub(1).and_then(|idx| tokens.get(idx));
    let following = tokens.get(range.end() + 1);
    TagFeatures {
        kind,
        words: body.iter().map(|t| t.token.text.clone()).collect(),
        pos: body.iter().map(|t| t.token.pos.clone()).collect(),
        preceding_word: preceding.map(|t| t.token.text.clone()),
        preceding_pos: preceding.map(|t| t.token.pos.clone()),
        following_word: following.map(|t| t.token.text.clone()),
        following_pos: following.map(|t| t.token.pos.clone()),
        verb_tags: tokens.iter().filter(|t| t.token.pos.starts_with("VB")).map(|t| t.token.pos.clone()).collect(),
    }
}
