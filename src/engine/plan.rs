//! Rule loading and scheduling.
//!
//! This module holds the *static* side of the engine: everything derived from
//! the rule files once, before any document is seen.
//!
//! 1. **Load** every `*.rule` / `*.ruleblock` source into a [`PlanEntry`].
//! 2. **Validate** ids: duplicates and `After` references to unknown rules.
//! 3. **Schedule** with Kahn's algorithm. A rule runs only once everything it
//!    lists under `After` has run; among ready rules the one loaded first
//!    wins, so a rule set without constraints runs in file-name order.
//!
//! Every problem found along the way is collected. If there is any, no plan
//! is produced and the caller gets the whole list as [`LoadErrors`].
//!
//! ## Invariants
//!
//! - `RuleEngine::plan` is a topological order of the `After` graph.
//! - Block members are not schedulable on their own; only the block's id is
//!   visible to `After`.

use super::error::{LoadError, LoadErrors};
use super::rule::{BlockMode, LoadRule, Member, Rule, RuleBlock};
use super::rule_file::{FieldKey, RuleSource, parse_source};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::path::Path;
use walkdir::WalkDir;

/// One schedulable unit together with its scheduling metadata.
#[derive(Debug, Clone)]
pub struct PlanEntry<R> {
    id: String,
    file: String,
    after: Vec<String>,
    member: Member<R>,
}

impl<R> PlanEntry<R> {
    pub fn new(id: impl Into<String>, member: Member<R>, after: Vec<String>) -> Self {
        PlanEntry { id: id.into(), file: "<api>".to_string(), after, member }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Source the entry was loaded from.
    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn after(&self) -> &[String] {
        &self.after
    }

    pub fn member(&self) -> &Member<R> {
        &self.member
    }
}

/// A loaded, scheduled rule set.
#[derive(Debug, Clone)]
pub struct RuleEngine<R> {
    plan: Vec<PlanEntry<R>>,
}

impl<R> RuleEngine<R> {
    /// Schedule entries built through the API.
    pub fn from_entries(entries: Vec<PlanEntry<R>>) -> Result<Self, LoadErrors> {
        let mut errors = Vec::new();
        let plan = schedule(entries, &mut errors);
        if errors.is_empty() { Ok(RuleEngine { plan }) } else { Err(LoadErrors(errors)) }
    }

    pub fn len(&self) -> usize {
        self.plan.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plan.is_empty()
    }

    pub fn entries(&self) -> &[PlanEntry<R>] {
        &self.plan
    }

    /// Entry ids in execution order.
    pub fn ids(&self) -> Vec<&str> {
        self.plan.iter().map(|entry| entry.id.as_str()).collect()
    }

    /// Run the plan once over `state`; returns how many entries fired.
    pub fn apply<S: ?Sized>(&self, state: &mut S) -> usize
    where
        R: Rule<S>,
    {
        let mut fired = 0;
        for entry in &self.plan {
            if entry.member.apply(state) {
                tracing::trace!(rule = %entry.id, "rule fired");
                fired += 1;
            }
        }
        fired
    }
}

impl<R: LoadRule> RuleEngine<R> {
    /// Load from in-memory `(file name, text)` pairs. The extension decides
    /// whether a source is a single rule or a block.
    pub fn from_sources<N, T>(sources: impl IntoIterator<Item = (N, T)>) -> Result<Self, LoadErrors>
    where
        N: AsRef<str>,
        T: AsRef<str>,
    {
        Self::build(sources, Vec::new())
    }

    /// Load every `*.rule` and `*.ruleblock` file below `dir`, in file-name order.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, LoadErrors> {
        let dir = dir.as_ref();
        let mut errors = Vec::new();
        let mut sources = Vec::new();
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(dir).to_path_buf();
                    errors.push(LoadError::Io { path, source: err.into() });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !matches!(path.extension().and_then(|e| e.to_str()), Some("rule" | "ruleblock")) {
                continue;
            }
            let name = path.strip_prefix(dir).unwrap_or(path).to_string_lossy().into_owned();
            match std::fs::read_to_string(path) {
                Ok(text) => sources.push((name, text)),
                Err(source) => errors.push(LoadError::Io { path: path.to_path_buf(), source }),
            }
        }
        tracing::debug!(dir = %dir.display(), files = sources.len(), "loading rule files");
        Self::build(sources, errors)
    }

    fn build<N, T>(sources: impl IntoIterator<Item = (N, T)>, mut errors: Vec<LoadError>) -> Result<Self, LoadErrors>
    where
        N: AsRef<str>,
        T: AsRef<str>,
    {
        let mut entries = Vec::new();
        for (name, text) in sources {
            match load_source::<R>(name.as_ref(), text.as_ref()) {
                Ok(entry) => entries.push(entry),
                Err(mut errs) => errors.append(&mut errs),
            }
        }
        let plan = schedule(entries, &mut errors);
        if errors.is_empty() {
            tracing::debug!(kind = R::KIND, entries = plan.len(), "rule plan ready");
            Ok(RuleEngine { plan })
        } else {
            Err(LoadErrors(errors))
        }
    }
}

fn load_source<R: LoadRule>(file: &str, text: &str) -> Result<PlanEntry<R>, Vec<LoadError>> {
    let stem = Path::new(file).file_stem().and_then(|s| s.to_str()).unwrap_or(file).to_string();
    match parse_source(file, text)? {
        RuleSource::Single(fields) => {
            let id = fields.first(FieldKey::Id).map(str::to_string).unwrap_or(stem);
            let rule = R::from_fields(file, &id, &fields)?;
            Ok(PlanEntry { id, file: file.to_string(), after: fields.after_ids(), member: Member::Rule(rule) })
        }
        RuleSource::Block { header, members } => {
            let id = header.first(FieldKey::Id).map(str::to_string).unwrap_or(stem);
            let mut errors = Vec::new();
            header.check_allowed(file, &id, "block headers", &[FieldKey::BlockType, FieldKey::Id, FieldKey::After], &mut errors);
            let mode = match header.first(FieldKey::BlockType) {
                Some(text) => BlockMode::parse(text).or_else(|| {
                    errors.push(LoadError::InvalidField {
                        file: file.to_string(),
                        rule: id.clone(),
                        field: FieldKey::BlockType.name().to_string(),
                        message: format!("expected `run-all` or `run-until-success`, found `{text}`"),
                    });
                    None
                }),
                None => {
                    errors.push(LoadError::MissingField { file: file.to_string(), rule: id.clone(), field: "Block-Type" });
                    None
                }
            };

            let mut rules = Vec::with_capacity(members.len());
            for (n, fields) in members.iter().enumerate() {
                let member_id = fields.first(FieldKey::Id).map(str::to_string).unwrap_or_else(|| format!("{id}#{}", n + 1));
                if fields.contains(FieldKey::After) {
                    errors.push(LoadError::InvalidField {
                        file: file.to_string(),
                        rule: member_id.clone(),
                        field: FieldKey::After.name().to_string(),
                        message: "block members are scheduled with their block".to_string(),
                    });
                }
                match R::from_fields(file, &member_id, fields) {
                    Ok(rule) => rules.push(Member::Rule(rule)),
                    Err(mut errs) => errors.append(&mut errs),
                }
            }

            match mode {
                Some(mode) if errors.is_empty() => Ok(PlanEntry {
                    id: id.clone(),
                    file: file.to_string(),
                    after: header.after_ids(),
                    member: Member::Block(RuleBlock::new(id, mode, rules)),
                }),
                _ => Err(errors),
            }
        }
    }
}

/// Validate ids and order `entries` topologically. Problems go to `errors`.
fn schedule<R>(entries: Vec<PlanEntry<R>>, errors: &mut Vec<LoadError>) -> Vec<PlanEntry<R>> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut nodes: Vec<PlanEntry<R>> = Vec::with_capacity(entries.len());
    for entry in entries {
        if let Some(&first) = index.get(&entry.id) {
            errors.push(LoadError::DuplicateId { file: entry.file, id: entry.id, first: nodes[first].file.clone() });
            continue;
        }
        index.insert(entry.id.clone(), nodes.len());
        nodes.push(entry);
    }

    // Edge `dep -> node` for every `After: dep` of `node`.
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    let mut indegree = vec![0usize; nodes.len()];
    for (node, entry) in nodes.iter().enumerate() {
        for dep in &entry.after {
            match index.get(dep) {
                Some(&dep) => {
                    successors[dep].push(node);
                    predecessors[node].push(dep);
                    indegree[node] += 1;
                }
                None => errors.push(LoadError::UnresolvedAfter {
                    file: entry.file.clone(),
                    rule: entry.id.clone(),
                    after: dep.clone(),
                }),
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> =
        (0..nodes.len()).filter(|&node| indegree[node] == 0).map(Reverse).collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for &next in &successors[node] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() < nodes.len() {
        let mut pending = vec![true; nodes.len()];
        for &node in &order {
            pending[node] = false;
        }
        for cycle in find_cycles(&predecessors, &pending) {
            let ids = cycle.iter().map(|&node| nodes[node].id.clone()).collect();
            errors.push(LoadError::Cycle { ids });
        }
    }

    let mut slots: Vec<Option<PlanEntry<R>>> = nodes.into_iter().map(Some).collect();
    order.into_iter().filter_map(|node| slots[node].take()).collect()
}

/// Cycles among the `pending` nodes, each closed by repeating its first node.
///
/// Every pending node has a pending predecessor (otherwise Kahn would have
/// released it), so walking predecessors always ends on a cycle.
fn find_cycles(predecessors: &[Vec<usize>], pending: &[bool]) -> Vec<Vec<usize>> {
    let mut visited = vec![false; pending.len()];
    let mut cycles = Vec::new();
    for start in 0..pending.len() {
        if !pending[start] || visited[start] {
            continue;
        }
        let mut path: Vec<usize> = Vec::new();
        let mut position: HashMap<usize, usize> = HashMap::new();
        let mut node = start;
        let closing = loop {
            if let Some(&at) = position.get(&node) {
                break Some(at);
            }
            if visited[node] {
                break None;
            }
            position.insert(node, path.len());
            path.push(node);
            match predecessors[node].iter().copied().find(|&p| pending[p]) {
                Some(next) => node = next,
                None => break None,
            }
        };
        for &node in &path {
            visited[node] = true;
        }
        if let Some(at) = closing {
            let mut cycle = path[at..].to_vec();
            cycle.push(path[at]);
            cycles.push(cycle);
        }
    }
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecognitionRule;

    fn rule(extra: &str) -> String {
        format!("Type: date\nMatch: <x~NN>\n{extra}")
    }

    fn load(sources: &[(&str, String)]) -> Result<RuleEngine<RecognitionRule>, LoadErrors> {
        RuleEngine::from_sources(sources.iter().map(|(name, text)| (*name, text.as_str())))
    }

    #[test]
    fn ids_default_to_file_stems_and_load_order_breaks_ties() {
        let engine = load(&[("b.rule", rule("")), ("a.rule", rule("")), ("c.rule", rule("ID: custom"))]).unwrap();
        assert_eq!(engine.ids(), vec!["b", "a", "custom"]);
    }

    #[test]
    fn after_constraints_reorder_the_plan() {
        let engine = load(&[
            ("first.rule", rule("After: last")),
            ("middle.rule", rule("After: first")),
            ("last.rule", rule("")),
        ])
        .unwrap();
        assert_eq!(engine.ids(), vec!["last", "first", "middle"]);
    }

    #[test]
    fn plan_respects_every_constraint() {
        // A small layered graph with several valid orders.
        let specs: &[(&str, &str)] = &[
            ("r0", "After: r3, r5"),
            ("r1", ""),
            ("r2", "After: r1"),
            ("r3", "After: r1\nAfter: r2"),
            ("r4", "After: r0"),
            ("r5", ""),
            ("r6", "After: r4, r2"),
            ("r7", "After: r6\nAfter: r5"),
        ];
        let sources: Vec<(String, String)> = specs.iter().map(|(id, extra)| (format!("{id}.rule"), rule(extra))).collect();
        let engine: RuleEngine<RecognitionRule> = RuleEngine::from_sources(sources.iter().map(|(n, t)| (n.as_str(), t.as_str()))).unwrap();

        let position: HashMap<&str, usize> = engine.ids().into_iter().enumerate().map(|(pos, id)| (id, pos)).collect();
        assert_eq!(position.len(), specs.len());
        for entry in engine.entries() {
            for dep in entry.after() {
                assert!(position[dep.as_str()] < position[entry.id()], "{dep} must run before {}", entry.id());
            }
        }
    }

    #[test]
    fn unresolved_after_is_the_only_error() {
        let errors = load(&[("a.rule", rule("After: nowhere")), ("b.rule", rule(""))]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors.errors()[0], LoadError::UnresolvedAfter { rule, after, .. } if rule == "a" && after == "nowhere"));
    }

    #[test]
    fn unresolved_after_down_a_chain_is_reported_once() {
        let errors = load(&[("a.rule", rule("After: b")), ("b.rule", rule("After: missing"))]).unwrap_err();
        assert_eq!(errors.len(), 1, "{errors}");
        assert!(matches!(&errors.errors()[0], LoadError::UnresolvedAfter { rule, after, .. } if rule == "b" && after == "missing"));
    }

    #[test]
    fn cycles_fail_to_load() {
        let errors = load(&[
            ("a.rule", rule("After: b")),
            ("b.rule", rule("After: c")),
            ("c.rule", rule("After: a")),
            ("d.rule", rule("After: a")),
            ("e.rule", rule("After: e")),
        ])
        .unwrap_err();
        let cycles: Vec<&Vec<String>> = errors
            .iter()
            .filter_map(|err| match err {
                LoadError::Cycle { ids } => Some(ids),
                _ => None,
            })
            .collect();
        assert_eq!(cycles.len(), 2, "{errors}");
        assert_eq!(cycles[0], &vec!["a", "b", "c", "a"]);
        assert_eq!(cycles[1], &vec!["e", "e"]);
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let errors = load(&[("one.rule", rule("ID: same")), ("two.rule", rule("ID: same"))]).unwrap_err();
        assert!(matches!(&errors.errors()[0], LoadError::DuplicateId { file, first, .. } if file == "two.rule" && first == "one.rule"));
    }

    #[test]
    fn errors_from_every_file_are_collected() {
        let errors = load(&[("bad.rule", "Type: date".to_string()), ("worse.rule", "Match: (".to_string())]).unwrap_err();
        // bad.rule: missing Match; worse.rule: missing Type and a bad pattern never compiled.
        assert_eq!(errors.len(), 3, "{errors}");
    }

    #[test]
    fn blocks_load_with_member_ids() {
        let block = "Block-Type: run-until-success\nAfter: plain\n---\nType: date\nMatch: <a~NN>\n---\nID: named\nType: date\nMatch: <b~NN>\n";
        let engine = load(&[("grp.ruleblock", block.to_string()), ("plain.rule", rule(""))]).unwrap();
        assert_eq!(engine.ids(), vec!["plain", "grp"]);
        let Member::Block(block) = engine.entries()[1].member() else {
            panic!("expected a block");
        };
        assert_eq!(block.mode(), BlockMode::UntilSuccess);
        let ids: Vec<&str> = block
            .members()
            .iter()
            .map(|member| match member {
                Member::Rule(rule) => rule.id(),
                Member::Block(inner) => inner.id(),
            })
            .collect();
        assert_eq!(ids, vec!["grp#1", "named"]);
    }

    #[test]
    fn block_header_problems() {
        let errors = load(&[("grp.ruleblock", "Type: date\n---\nType: date\nMatch: <a~NN>\nAfter: x\n".to_string())]).unwrap_err();
        let text = errors.to_string();
        assert!(text.contains("invalid `Type`"), "{text}");
        assert!(text.contains("missing required field `Block-Type`"), "{text}");
        assert!(text.contains("invalid `After`"), "{text}");
    }

    #[test]
    fn load_dir_walks_in_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.rule"), rule("")).unwrap();
        std::fs::write(dir.path().join("a.rule"), rule("")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.rule"), rule("After: b")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a rule").unwrap();

        let engine: RuleEngine<RecognitionRule> = RuleEngine::load_dir(dir.path()).unwrap();
        assert_eq!(engine.ids(), vec!["a", "b", "c"]);
        assert_eq!(engine.entries()[2].file(), Path::new("nested").join("c.rule").to_string_lossy());
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let errors = RuleEngine::<RecognitionRule>::load_dir(dir.path().join("absent")).unwrap_err();
        assert!(matches!(&errors.errors()[0], LoadError::Io { .. }));
    }

    #[test]
    fn api_entries_are_scheduled_too() {
        let make = |id: &str| {
            RecognitionRule::new(id, crate::document::TagKind::Date, "<x~NN>", Default::default(), Default::default()).unwrap()
        };
        let engine = RuleEngine::from_entries(vec![
            PlanEntry::new("late", Member::Rule(make("late")), vec!["early".to_string()]),
            PlanEntry::new("early", Member::Rule(make("early")), Vec::new()),
        ])
        .unwrap();
        assert_eq!(engine.ids(), vec!["early", "late"]);
    }
}
