use timexer::{AnnotateResult, Document, RunMetrics, TagId, Timex};

/// Terminal styling for the report, keyed by what is being shown.
mod style {
    #[derive(Clone, Copy)]
    pub enum Role {
        Title,
        Divider,
        Span,
        Kind,
        Value,
        Timing,
        Warning,
        Muted,
    }

    impl Role {
        fn sgr(self) -> &'static str {
            match self {
                Role::Title => "1;36",
                Role::Divider => "90",
                Role::Span => "1",
                Role::Kind => "34",
                Role::Value | Role::Timing => "32",
                Role::Warning => "33",
                Role::Muted => "2",
            }
        }
    }

    pub struct Styler {
        color: bool,
    }

    impl Styler {
        pub fn new(color: bool) -> Self {
            Self { color }
        }

        pub fn apply(&self, role: Role, text: impl AsRef<str>) -> String {
            let text = text.as_ref();
            if self.color { format!("\x1b[{}m{text}\x1b[0m", role.sgr()) } else { text.to_string() }
        }

        pub fn section(&self, title: &str) {
            println!("\n{}", self.apply(Role::Divider, format!("━━━ {title} ━━━")));
        }
    }
}

use style::{Role, Styler};

pub fn print_run(result: &AnnotateResult, color: bool) {
    let styler = Styler::new(color);
    let document = &result.document;
    let dct = document.dct().unwrap_or("none");
    println!("\n{}", styler.apply(Role::Title, format!("⚙  Annotating (dct: {dct})")));

    styler.section("Tags");
    print_tags(document, &styler);

    styler.section("Warnings");
    if result.warnings.is_empty() {
        println!("  {}", styler.apply(Role::Muted, "none"));
    }
    for warning in result.warnings.warnings() {
        println!("  {} {warning}", styler.apply(Role::Warning, "!"));
    }

    styler.section("Timing");
    print_metrics(&result.metrics, &styler);
    println!();
}

fn print_tags(document: &Document, styler: &Styler) {
    let tags = document.tags();
    if tags.is_empty() {
        println!("  {}", styler.apply(Role::Muted, "No temporal expressions found"));
        return;
    }
    for sentence in document.sentences() {
        let mut in_sentence = tags.iter().filter(|(id, _)| id.sentence() == sentence.index()).peekable();
        if in_sentence.peek().is_none() {
            continue;
        }
        let words: Vec<&str> = sentence.tokens().iter().map(|t| t.token.text.as_str()).collect();
        println!("  {} {}", styler.apply(Role::Muted, format!("s{}:", sentence.index())), words.join(" "));
        for (id, timex) in in_sentence {
            println!("    {}", tag_line(document, *id, timex, styler));
        }
    }
}

fn print_metrics(metrics: &RunMetrics, styler: &Styler) {
    println!(
        "  Total: {}  │  Recognition: {}  │  Normalisation: {}",
        styler.apply(Role::Timing, format!("{:?}", metrics.total)),
        styler.apply(Role::Timing, format!("{:?}", metrics.recognition.duration)),
        styler.apply(Role::Timing, format!("{:?}", metrics.normalisation.duration)),
    );
    let counters = format!(
        "recognition: {} rules fired, {} tags created  │  normalisation: {} rules fired, {} tags touched",
        metrics.recognition.rules_fired,
        metrics.recognition.tags_touched,
        metrics.normalisation.rules_fired,
        metrics.normalisation.tags_touched,
    );
    println!("  {}", styler.apply(Role::Muted, counters));
}

/// `t0.1 "last Friday" date 2010-07-30  dir=before`
fn tag_line(document: &Document, id: TagId, timex: &Timex, styler: &Styler) -> String {
    let span = document.span_text(id).unwrap_or_default();
    let value = match &timex.value {
        Some(value) => styler.apply(Role::Value, value),
        None => styler.apply(Role::Muted, "(no value)"),
    };
    let attributes: Vec<String> = [
        timex.set.then(|| "set".to_string()),
        timex.modifier.as_ref().map(|m| format!("mod={m}")),
        timex.freq.as_ref().map(|f| format!("freq={f}")),
        timex.quant.as_ref().map(|q| format!("quant={q}")),
        timex.direction.map(|d| format!("dir={}", d.as_str())),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut line = format!(
        "{} {} {} {value}",
        styler.apply(Role::Muted, id.to_string()),
        styler.apply(Role::Span, format!("\"{span}\"")),
        styler.apply(Role::Kind, timex.effective_kind().as_str()),
    );
    if !attributes.is_empty() {
        line.push_str("  ");
        line.push_str(&styler.apply(Role::Muted, attributes.join(" ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use timexer::{Direction, TagKind};

    #[test]
    fn tag_line_lists_only_present_attributes() {
        let mut document = Document::from_pairs(&[&[("every", "DT"), ("Monday", "NNP")]]);
        let mut set = Timex::new(TagKind::Set);
        set.value = Some("XXXX-WXX-1".to_string());
        set.quant = Some("EVERY".to_string());
        set.direction = Some(Direction::After);
        let id = document.add_tag(0, 0..=1, set).unwrap();
        let timex = document.tag(id).unwrap();
        assert_eq!(
            tag_line(&document, id, timex, &Styler::new(false)),
            format!("{id} \"every Monday\" set XXXX-WXX-1  set quant=EVERY dir={}", Direction::After.as_str())
        );
    }

    #[test]
    fn styling_is_skipped_without_color() {
        assert_eq!(Styler::new(false).apply(Role::Warning, "!"), "!");
        assert_eq!(Styler::new(true).apply(Role::Warning, "!"), "\x1b[33m!\x1b[0m");
    }
}
