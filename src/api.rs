pub use crate::document::DirectionClassifier;
use crate::document::Document;
use crate::engine::{Diagnostics, LoadErrors, NormalisationRule, RecognitionRule, RuleEngine, RunMetrics};
use crate::temporal::ReferenceTracker;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Options that affect tagging.
#[derive(Clone)]
pub struct Options {
    /// Consulted for every tag that reaches normalisation without a direction.
    pub classifier: Option<Arc<dyn DirectionClassifier>>,
    /// Run recognition on the rayon pool, one sentence per task.
    pub parallel_recognition: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { classifier: None, parallel_recognition: true }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("classifier", &self.classifier.as_ref().map(|_| "<classifier>"))
            .field("parallel_recognition", &self.parallel_recognition)
            .finish()
    }
}

/// Result from [`Tagger::annotate`].
#[derive(Debug, Clone)]
pub struct AnnotateResult {
    /// The input document with tags attached and normalised.
    pub document: Document,
    pub warnings: Diagnostics,
    pub metrics: RunMetrics,
}

/// A recogniser and a normaliser, loaded once and reused across documents.
#[derive(Debug, Clone)]
pub struct Tagger {
    recogniser: RuleEngine<RecognitionRule>,
    normaliser: RuleEngine<NormalisationRule>,
    options: Options,
}

impl Tagger {
    pub fn new(recogniser: RuleEngine<RecognitionRule>, normaliser: RuleEngine<NormalisationRule>) -> Self {
        Tagger { recogniser, normaliser, options: Options::default() }
    }

    /// Load both rule directories concurrently.
    ///
    /// Errors from both directories are reported together.
    pub fn from_dirs(recognition: impl AsRef<Path>, normalisation: impl AsRef<Path>) -> Result<Self, LoadErrors> {
        let (recognition, normalisation) = (recognition.as_ref(), normalisation.as_ref());
        let (recogniser, normaliser) = rayon::join(
            || RuleEngine::<RecognitionRule>::load_dir(recognition),
            || RuleEngine::<NormalisationRule>::load_dir(normalisation),
        );
        match (recogniser, normaliser) {
            (Ok(recogniser), Ok(normaliser)) => Ok(Tagger::new(recogniser, normaliser)),
            (recogniser, normaliser) => {
                let mut errors = Vec::new();
                errors.extend(recogniser.err().map(|e| e.0).unwrap_or_default());
                errors.extend(normaliser.err().map(|e| e.0).unwrap_or_default());
                Err(LoadErrors(errors))
            }
        }
    }

    /// Load `root/recognition` and `root/normalisation`.
    ///
    /// # Example
    /// ```no_run
    /// use timexer::{Document, Tagger};
    ///
    /// let tagger = Tagger::from_rules_dir("rules").unwrap();
    /// let doc = Document::from_pairs(&[&[("yesterday", "NN")]]).with_dct("2010-08-04");
    /// let out = tagger.annotate(doc);
    /// assert_eq!(out.document.tags()[0].1.value.as_deref(), Some("2010-08-03"));
    /// ```
    pub fn from_rules_dir(root: impl AsRef<Path>) -> Result<Self, LoadErrors> {
        let root = root.as_ref();
        Self::from_dirs(root.join("recognition"), root.join("normalisation"))
    }

    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn recogniser(&self) -> &RuleEngine<RecognitionRule> {
        &self.recogniser
    }

    pub fn normaliser(&self) -> &RuleEngine<NormalisationRule> {
        &self.normaliser
    }

    /// Run recognition only.
    pub fn recognise(&self, document: &mut Document) {
        self.recogniser.recognise(document, self.options.parallel_recognition);
    }

    /// Normalise tags already attached to `document` (for example from an
    /// annotated corpus).
    pub fn normalise(&self, document: &mut Document) -> Diagnostics {
        let mut diagnostics = Diagnostics::default();
        let mut context = ReferenceTracker::from_timestamp(document.dct(), &mut diagnostics);
        self.normaliser.normalise(document, &mut context, self.options.classifier.as_deref(), &mut diagnostics);
        diagnostics
    }

    /// Recognise, then normalise.
    pub fn annotate(&self, mut document: Document) -> AnnotateResult {
        let started = Instant::now();
        let mut warnings = Diagnostics::default();
        let recognition = self.recogniser.recognise(&mut document, self.options.parallel_recognition);
        let mut context = ReferenceTracker::from_timestamp(document.dct(), &mut warnings);
        let normalisation =
            self.normaliser.normalise(&mut document, &mut context, self.options.classifier.as_deref(), &mut warnings);
        let metrics = RunMetrics { total: started.elapsed(), recognition, normalisation };
        tracing::debug!(tags = document.tags().len(), warnings = warnings.len(), total = ?metrics.total, "document annotated");
        AnnotateResult { document, warnings, metrics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Direction, TagFeatures, TagKind, Timex};
    use crate::engine::WarningKind;

    fn tagger() -> Tagger {
        let recogniser = RuleEngine::<RecognitionRule>::from_sources([
            ("days.rule", "Type: date\nMatch: <$DAYS~NNP>"),
            ("relative.rule", "Type: date\nMatch: <$RELATIVE_DAYS~NN>"),
        ])
        .unwrap();
        let normaliser = RuleEngine::<NormalisationRule>::from_sources([
            ("days.rule", "Type: date\nMatch: <($DAYS)~NNP>\nValue: relative_weekday({#1}, 0)"),
            ("relative.rule", "Type: date\nMatch: <($RELATIVE_DAYS)~NN>\nValue: prenormalise()"),
        ])
        .unwrap();
        Tagger::new(recogniser, normaliser)
    }

    #[test]
    fn annotate_recognises_and_normalises() {
        let doc = Document::from_pairs(&[&[("He", "PRP"), ("left", "VBD"), ("yesterday", "NN")]]).with_dct("2010-08-04");
        let out = tagger().annotate(doc);
        let tags = out.document.tags();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].1.value.as_deref(), Some("2010-08-03"));
        assert!(out.warnings.is_empty());
        assert_eq!(out.metrics.recognition.tags_touched, 1);
        assert_eq!(out.metrics.normalisation.tags_touched, 1);
    }

    #[test]
    fn sequential_and_parallel_recognition_agree() {
        let doc = Document::from_pairs(&[
            &[("Friday", "NNP"), ("and", "CC"), ("today", "NN")],
            &[("Monday", "NNP")],
            &[("nothing", "NN")],
        ])
        .with_dct("2010-08-04");
        let parallel = tagger().annotate(doc.clone());
        let sequential =
            tagger().with_options(Options { parallel_recognition: false, ..Options::default() }).annotate(doc);
        assert_eq!(parallel.document, sequential.document);
        assert_eq!(parallel.document.tags().len(), 3);
    }

    #[test]
    fn missing_dct_is_a_warning() {
        let doc = Document::from_pairs(&[&[("yesterday", "NN")]]);
        let out = tagger().annotate(doc);
        assert_eq!(out.document.tags()[0].1.value, None);
        assert!(out.warnings.warnings().iter().any(|w| w.kind == WarningKind::MissingTimestamp));
    }

    #[test]
    fn classifier_labels_undirected_tags() {
        let classifier = |features: &TagFeatures| {
            features.verb_tags.iter().any(|pos| pos == "VBD").then_some(Direction::Before)
        };
        let tagger = tagger().with_options(Options { classifier: Some(Arc::new(classifier)), ..Options::default() });
        let doc = Document::from_pairs(&[&[("He", "PRP"), ("left", "VBD"), ("Friday", "NNP")]]).with_dct("2010-08-04");
        let out = tagger.annotate(doc);
        assert_eq!(out.document.tags()[0].1.direction, Some(Direction::Before));
    }

    #[test]
    fn normalise_accepts_preexisting_tags() {
        let mut doc = Document::from_pairs(&[&[("on", "IN"), ("Monday", "NNP")]]).with_dct("2010-08-04");
        let id = doc.add_tag(0, 1..=1, Timex::new(TagKind::Date)).unwrap();
        let warnings = tagger().normalise(&mut doc);
        assert!(warnings.is_empty());
        assert_eq!(doc.tag(id).and_then(|t| t.value.as_deref()), Some("2010-08-02"));
    }

    #[test]
    fn load_errors_from_both_directories_are_merged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("recognition")).unwrap();
        std::fs::create_dir(dir.path().join("normalisation")).unwrap();
        std::fs::write(dir.path().join("recognition/a.rule"), "Match: <x~NN>").unwrap();
        std::fs::write(dir.path().join("normalisation/b.rule"), "Type: date").unwrap();
        let errors = Tagger::from_rules_dir(dir.path()).unwrap_err();
        assert_eq!(errors.len(), 2, "{errors}");
    }
}
