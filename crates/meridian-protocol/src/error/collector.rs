//! Collector for accumulating diagnostics during a build phase.
//!
//! The [`DiagnosticCollector`] allows phases to report multiple errors
//! and warnings instead of failing on the first error encountered.

use log::warn;

use crate::error::{BuildError, Diagnostic};

/// A collector for accumulating diagnostics during a build phase.
///
/// # Example
///
/// ```text
/// let mut collector = DiagnosticCollector::new();
///
/// collector.emit(
///     Diagnostic::error("duplicate entity `model::Person`")
///         .with_code(ErrorCode::E002)
///         .with_label("model::Person", "duplicate definition")
/// );
///
/// // Finish and convert to Result
/// let result = collector.finish();
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    ///
    /// The diagnostic is added to the collection and if it's an error,
    /// the collector is marked as having errors.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Finish collection and return a result.
    ///
    /// - If there are errors, returns `Err(BuildError)` with all diagnostics.
    /// - If there are no errors, returns `Ok(())`.
    ///
    /// Warnings are logged in the success case.
    pub fn finish(self) -> Result<(), BuildError> {
        if self.has_errors {
            Err(BuildError::new(self.diagnostics))
        } else {
            for diagnostic in &self.diagnostics {
                warn!(diagnostic:%; "Build warning");
            }
            Ok(())
        }
    }
}
