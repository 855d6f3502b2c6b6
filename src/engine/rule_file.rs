//! Rule file syntax.
//!
//! A `.rule` file holds one rule as `Key: value` lines. A `.ruleblock` file
//! holds a header followed by member rules, each section separated by a line
//! of dashes:
//!
//! ```text
//! Block-Type: run-until-success
//! ID: clock
//! ---
//! Type: time
//! Match: <noon~NN>
//! Value: "T12:00"
//! ---
//! Type: time
//! Match: <midnight~NN>
//! Value: "T00:00"
//! ```
//!
//! Blank lines and `#` comments are ignored. Keys are case-insensitive. An
//! indented line continues the previous field's value:
//!
//! ```text
//! Match: <\d{1,2}:\d\d~CD>
//!      | <(noon|midnight)~NN>
//! ```

use super::error::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    Type,
    Match,
    Id,
    Guard,
    BeforeGuard,
    AfterGuard,
    After,
    Squelch,
    CaseSensitive,
    Value,
    ChangeType,
    Freq,
    Quant,
    Mod,
    Tokenise,
    BlockType,
}

impl FieldKey {
    pub fn parse(name: &str) -> Option<FieldKey> {
        let key = match name.trim().to_ascii_lowercase().as_str() {
            "type" => FieldKey::Type,
            "match" => FieldKey::Match,
            "id" => FieldKey::Id,
            "guard" => FieldKey::Guard,
            "before-guard" => FieldKey::BeforeGuard,
            "after-guard" => FieldKey::AfterGuard,
            "after" => FieldKey::After,
            "squelch" => FieldKey::Squelch,
            "case-sensitive" => FieldKey::CaseSensitive,
            "value" => FieldKey::Value,
            "change-type" => FieldKey::ChangeType,
            "freq" => FieldKey::Freq,
            "quant" => FieldKey::Quant,
            "mod" => FieldKey::Mod,
            "tokenise" | "tokenize" => FieldKey::Tokenise,
            "block-type" => FieldKey::BlockType,
            _ => return None,
        };
        Some(key)
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldKey::Type => "Type",
            FieldKey::Match => "Match",
            FieldKey::Id => "ID",
            FieldKey::Guard => "Guard",
            FieldKey::BeforeGuard => "Before-Guard",
            FieldKey::AfterGuard => "After-Guard",
            FieldKey::After => "After",
            FieldKey::Squelch => "Squelch",
            FieldKey::CaseSensitive => "Case-Sensitive",
            FieldKey::Value => "Value",
            FieldKey::ChangeType => "Change-Type",
            FieldKey::Freq => "Freq",
            FieldKey::Quant => "Quant",
            FieldKey::Mod => "Mod",
            FieldKey::Tokenise => "Tokenise",
            FieldKey::BlockType => "Block-Type",
        }
    }

    pub fn repeatable(self) -> bool {
        matches!(self, FieldKey::Guard | FieldKey::BeforeGuard | FieldKey::AfterGuard | FieldKey::After)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub key: FieldKey,
    pub value: String,
    pub line: usize,
}

/// The fields of one rule (or block header), in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    pub fields: Vec<Field>,
}

impl FieldSet {
    pub fn first(&self, key: FieldKey) -> Option<&str> {
        self.fields.iter().find(|f| f.key == key).map(|f| f.value.as_str())
    }

    pub fn all(&self, key: FieldKey) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(move |f| f.key == key)
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.fields.iter().any(|f| f.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Ids listed by every `After` field.
    pub fn after_ids(&self) -> Vec<String> {
        self.all(FieldKey::After)
            .flat_map(|f| f.value.split(','))
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Report fields outside `allowed` and repeated single-valued fields.
    pub(crate) fn check_allowed(&self, file: &str, rule: &str, kind: &str, allowed: &[FieldKey], errors: &mut Vec<LoadError>) {
        let mut seen: Vec<FieldKey> = Vec::new();
        for field in &self.fields {
            if !allowed.contains(&field.key) {
                errors.push(LoadError::InvalidField {
                    file: file.to_string(),
                    rule: rule.to_string(),
                    field: field.key.name().to_string(),
                    message: format!("not valid for {kind} (line {})", field.line),
                });
            } else if seen.contains(&field.key) && !field.key.repeatable() {
                errors.push(LoadError::InvalidField {
                    file: file.to_string(),
                    rule: rule.to_string(),
                    field: field.key.name().to_string(),
                    message: format!("given more than once (line {})", field.line),
                });
            }
            seen.push(field.key);
        }
    }
}

/// Parsed contents of one rule file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    Single(FieldSet),
    Block { header: FieldSet, members: Vec<FieldSet> },
}

pub fn is_block_file(name: &str) -> bool {
    name.ends_with(".ruleblock")
}

/// Parse the text of `file`. The file name decides between single rule and block.
pub fn parse_source(file: &str, text: &str) -> Result<RuleSource, Vec<LoadError>> {
    let block = is_block_file(file);
    let mut errors = Vec::new();
    let mut sections = vec![FieldSet::default()];

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if raw.starts_with([' ', '\t']) {
            match sections.last_mut().and_then(|section| section.fields.last_mut()) {
                Some(field) => {
                    field.value.push(' ');
                    field.value.push_str(line);
                }
                None => errors.push(LoadError::Parse {
                    file: file.to_string(),
                    line: line_no,
                    message: "continuation line before any field".to_string(),
                }),
            }
            continue;
        }
        if line.len() >= 3 && line.chars().all(|c| c == '-') {
            if block {
                sections.push(FieldSet::default());
            } else {
                errors.push(LoadError::Parse {
                    file: file.to_string(),
                    line: line_no,
                    message: "section separator outside a .ruleblock file".to_string(),
                });
            }
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            errors.push(LoadError::Parse {
                file: file.to_string(),
                line: line_no,
                message: format!("expected `Key: value`, found `{line}`"),
            });
            continue;
        };
        let Some(key) = FieldKey::parse(key) else {
            errors.push(LoadError::UnknownField { file: file.to_string(), line: line_no, field: key.trim().to_string() });
            continue;
        };
        if let Some(section) = sections.last_mut() {
            section.fields.push(Field { key, value: value.trim().to_string(), line: line_no });
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }
    if !block {
        return Ok(RuleSource::Single(sections.pop().unwrap_or_default()));
    }
    let mut sections = sections.into_iter();
    let header = sections.next().unwrap_or_default();
    let members = sections.filter(|section| !section.is_empty()).collect();
    Ok(RuleSource::Block { header, members })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_rule_fields_in_order() {
        let text = "# comment\nType: date\nMATCH: <today~NN>\n\nAfter: a, b\nafter: c\n";
        let RuleSource::Single(fields) = parse_source("today.rule", text).unwrap() else {
            panic!("expected a single rule");
        };
        assert_eq!(fields.first(FieldKey::Type), Some("date"));
        assert_eq!(fields.first(FieldKey::Match), Some("<today~NN>"));
        assert_eq!(fields.after_ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn values_may_contain_colons() {
        let RuleSource::Single(fields) = parse_source("t.rule", "Value: \"T12:00\"").unwrap() else {
            panic!("expected a single rule");
        };
        assert_eq!(fields.first(FieldKey::Value), Some("\"T12:00\""));
    }

    #[test]
    fn indented_lines_continue_the_previous_value() {
        let text = "Type: time\nMatch: <noon~NN>\n  | <midnight~NN>\n\tAfter-Guard: x\n";
        let RuleSource::Single(fields) = parse_source("t.rule", text).unwrap() else {
            panic!("expected a single rule");
        };
        assert_eq!(fields.first(FieldKey::Match), Some("<noon~NN> | <midnight~NN> After-Guard: x"));

        let errors = parse_source("t.rule", "  Match: x\n").unwrap_err();
        assert!(matches!(&errors[0], LoadError::Parse { line: 1, .. }));
    }

    #[test]
    fn block_sections_split_on_dashes() {
        let text = "Block-Type: run-all\nID: clock\n---\nType: time\nMatch: <noon~NN>\n---\n---\nType: time\nMatch: x\n";
        let RuleSource::Block { header, members } = parse_source("clock.ruleblock", text).unwrap() else {
            panic!("expected a block");
        };
        assert_eq!(header.first(FieldKey::BlockType), Some("run-all"));
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn every_bad_line_is_reported() {
        let errors = parse_source("bad.rule", "Type: date\nnonsense\nColour: red\n---\n").unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(matches!(&errors[0], LoadError::Parse { line: 2, .. }));
        assert!(matches!(&errors[1], LoadError::UnknownField { field, .. } if field == "Colour"));
        assert!(matches!(&errors[2], LoadError::Parse { line: 4, .. }));
    }

    #[test]
    fn disallowed_and_repeated_fields() {
        let RuleSource::Single(fields) = parse_source("r.rule", "Type: date\nType: time\nValue: 1\n").unwrap() else {
            panic!("expected a single rule");
        };
        let mut errors = Vec::new();
        fields.check_allowed("r.rule", "r", "recognition rules", &[FieldKey::Type, FieldKey::Match], &mut errors);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].to_string().contains("given more than once"));
        assert!(errors[1].to_string().contains("`Value`"));
    }
}
