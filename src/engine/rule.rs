//! The rule abstraction shared by recognition and normalisation.
//!
//! Both phases run the same machinery over different state: a recognition
//! rule mutates a [`Sentence`](crate::document::Sentence), a normalisation
//! rule mutates one tag and its reference context. [`RuleBlock`] groups
//! rules of either kind and is itself a rule.

use super::error::LoadError;
use super::rule_file::FieldSet;

/// A rule applicable to state `S`.
pub trait Rule<S: ?Sized> {
    fn id(&self) -> &str;

    /// Apply to `state`; returns whether the rule matched.
    fn apply(&self, state: &mut S) -> bool;
}

/// A rule kind that can be built from a rule file section.
pub trait LoadRule: Sized {
    /// Human-readable kind, used in load errors.
    const KIND: &'static str;

    fn from_fields(file: &str, id: &str, fields: &FieldSet) -> Result<Self, Vec<LoadError>>;
}

bitflags::bitflags! {
    /// Boolean switches read from a rule file.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RuleFlags: u8 {
        const CASE_SENSITIVE = 1 << 0;
        const SQUELCH        = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    /// Run every member; succeed if any did.
    All,
    /// Stop at the first member that succeeds.
    UntilSuccess,
}

impl BlockMode {
    pub fn parse(text: &str) -> Option<BlockMode> {
        match text.trim().to_ascii_lowercase().as_str() {
            "run-all" | "all" => Some(BlockMode::All),
            "run-until-success" | "until-success" => Some(BlockMode::UntilSuccess),
            _ => None,
        }
    }
}

/// One schedulable unit: a rule or a nested block.
#[derive(Debug, Clone)]
pub enum Member<R> {
    Rule(R),
    Block(RuleBlock<R>),
}

#[derive(Debug, Clone)]
pub struct RuleBlock<R> {
    id: String,
    mode: BlockMode,
    members: Vec<Member<R>>,
}

impl<R> RuleBlock<R> {
    pub fn new(id: impl Into<String>, mode: BlockMode, members: Vec<Member<R>>) -> Self {
        RuleBlock { id: id.into(), mode, members }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn mode(&self) -> BlockMode {
        self.mode
    }

    pub fn members(&self) -> &[Member<R>] {
        &self.members
    }
}

impl<S: ?Sized, R: Rule<S>> Rule<S> for RuleBlock<R> {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&self, state: &mut S) -> bool {
        let mut success = false;
        for member in &self.members {
            let fired = member.apply(state);
            success |= fired;
            if fired && self.mode == BlockMode::UntilSuccess {
                break;
            }
        }
        tracing::trace!(block = %self.id, success, "block applied");
        success
    }
}

impl<S: ?Sized, R: Rule<S>> Rule<S> for Member<R> {
    fn id(&self) -> &str {
        match self {
            Member::Rule(rule) => rule.id(),
            Member::Block(block) => block.id(),
        }
    }

    fn apply(&self, state: &mut S) -> bool {
        match self {
            Member::Rule(rule) => rule.apply(state),
            Member::Block(block) => block.apply(state),
        }
    }
}
