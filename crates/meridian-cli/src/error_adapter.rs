//! Error adapter for converting MeridianError to miette diagnostics.
//!
//! This module provides the bridge between the library's error types and
//! miette's rich diagnostic formatting used in the CLI.
//!
//! # Multi-Error Support
//!
//! A [`meridian::BuildError`] carries every diagnostic of the failing build
//! phase; each one is rendered independently.
//!
//! # Label Placement
//!
//! Diagnostic labels name element paths rather than byte offsets. A label is
//! placed on the `"path"` member of the entity it names in the JSON source,
//! or on the first quoted occurrence of the path when no entity has it.
//! Labels whose path doesn't occur in the source are dropped.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use meridian::{Diagnostic, Label, MeridianError, Severity};

/// Adapter for a single build diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    src: &'a str,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create a new diagnostic adapter.
    pub fn new(diag: &'a Diagnostic, src: &'a str) -> Self {
        Self { diag, src }
    }

    fn labeled_span(&self, label: &Label) -> Option<LabeledSpan> {
        let span = locate_path(self.src, label.path())?;
        let message = Some(label.message().to_string());
        Some(if label.is_primary() {
            LabeledSpan::new_primary_with_span(message, span)
        } else {
            LabeledSpan::new_with_span(message, span)
        })
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diag.severity() {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let spans: Vec<LabeledSpan> = self
            .diag
            .labels()
            .iter()
            .filter_map(|label| self.labeled_span(label))
            .collect();
        if spans.is_empty() {
            return None;
        }
        Some(Box::new(spans.into_iter()))
    }
}

/// Adapter for non-diagnostic [`MeridianError`] variants.
pub struct ErrorAdapter<'a>(pub &'a MeridianError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            MeridianError::Io(_) => "meridian::io",
            MeridianError::Build { .. } => return None,
            MeridianError::Serialize(_) => "meridian::serialize",
            MeridianError::Graph(_) => "meridian::graph",
            MeridianError::ServiceStore(_) => "meridian::service_store",
            MeridianError::Json(_) => "meridian::json",
            MeridianError::Roundtrip { .. } => "meridian::roundtrip",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            MeridianError::Roundtrip { .. } => Some(Box::new(
                "run with --output to inspect the serialized entities",
            )),
            _ => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A build diagnostic located in the JSON source.
    Diagnostic(DiagnosticAdapter<'a>),
    /// A simple error without source location.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Diagnostic(d) => fmt::Display::fmt(d, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Diagnostic(_) => None,
            Reportable::Error(e) => e.source(),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            Reportable::Diagnostic(d) => d.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Diagnostic(d) => d.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Diagnostic(d) => d.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Diagnostic(d) => d.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Finds the quoted occurrence of `path` in `src`, preferring the value of
/// a `"path"` member.
fn locate_path(src: &str, path: &str) -> Option<SourceSpan> {
    let needle = format!("\"{path}\"");
    let mut first = None;
    for (offset, _) in src.match_indices(&needle) {
        first.get_or_insert(offset);
        let before = src[..offset].trim_end();
        if let Some(key) = before.strip_suffix(':') {
            if key.trim_end().ends_with("\"path\"") {
                return Some(SourceSpan::new(offset.into(), needle.len()));
            }
        }
    }
    first.map(|offset| SourceSpan::new(offset.into(), needle.len()))
}

/// Convert a [`MeridianError`] into a list of reportable errors.
///
/// For [`MeridianError::Build`], this returns one [`Reportable`] for each
/// diagnostic in the error. For other error variants, this returns a single
/// [`Reportable`].
pub fn to_reportables(err: &MeridianError) -> Vec<Reportable<'_>> {
    match err {
        MeridianError::Build {
            err: build_err,
            src,
        } => build_err
            .diagnostics()
            .iter()
            .map(|d| Reportable::Diagnostic(DiagnosticAdapter::new(d, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use meridian::{BuildError, ErrorCode};

    use super::*;

    const SRC: &str = r#"{"entities": [
  {"path": "model::Firm", "classifierPath": "c", "content": {"superTypes": ["model::Person"]}},
  {"path": "model::Person", "classifierPath": "c", "content": {}}
]}"#;

    #[test]
    fn test_single_diagnostic() {
        let diag = Diagnostic::error("test error")
            .with_code(ErrorCode::E201)
            .with_label("model::Firm", "here")
            .with_help("try this");
        let err = MeridianError::new_build_error(BuildError::from(diag), SRC);

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);

        match &reportables[0] {
            Reportable::Diagnostic(d) => {
                assert_eq!(d.to_string(), "test error");
                assert_eq!(d.code().unwrap().to_string(), "E201");
                assert_eq!(d.help().unwrap().to_string(), "try this");
            }
            Reportable::Error(_) => panic!("Expected Diagnostic"),
        }
    }

    #[test]
    fn test_multiple_diagnostics() {
        let err = MeridianError::new_build_error(
            BuildError::new(vec![
                Diagnostic::error("first error").with_code(ErrorCode::E200),
                Diagnostic::error("second error").with_code(ErrorCode::E201),
                Diagnostic::warning("third error"),
            ]),
            SRC,
        );

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 3);
        assert_eq!(reportables[0].to_string(), "first error");
        assert_eq!(reportables[1].to_string(), "second error");
        assert_eq!(reportables[2].severity(), Some(miette::Severity::Warning));
    }

    #[test]
    fn test_non_build_error() {
        let err = MeridianError::Roundtrip {
            paths: vec!["model::Firm".to_string()],
        };

        let reportables = to_reportables(&err);

        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "Round trip changed 1 entities: model::Firm");
                assert_eq!(e.code().unwrap().to_string(), "meridian::roundtrip");
            }
            Reportable::Diagnostic(_) => panic!("Expected Error"),
        }
    }

    #[test]
    fn test_labels_point_at_entity_paths() {
        let diag = Diagnostic::error("error with labels")
            .with_label("model::Person", "primary label")
            .with_secondary_label("model::Firm", "secondary label");

        let adapter = DiagnosticAdapter::new(&diag, SRC);

        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].label(), Some("primary label"));
        assert!(labels[0].primary());
        assert!(!labels[1].primary());

        // The entity path, not the super type reference that comes first.
        let person = SRC.rfind("\"model::Person\"").unwrap();
        assert_eq!(labels[0].offset(), person);
        assert_eq!(labels[0].len(), "\"model::Person\"".len());
    }

    #[test]
    fn test_unknown_label_paths_are_dropped() {
        let diag = Diagnostic::error("error").with_label("model::Missing", "nowhere");

        let adapter = DiagnosticAdapter::new(&diag, SRC);

        assert!(adapter.labels().is_none());
    }

    #[test]
    fn test_locate_path_falls_back_to_first_occurrence() {
        let src = r#"{"includes": ["store::Base"]}"#;

        let span = locate_path(src, "store::Base").unwrap();

        assert_eq!(span.offset(), src.find("\"store::Base\"").unwrap());
    }
}
