//! The core diagnostic type for the Meridian error system.
//!
//! A [`Diagnostic`] represents a single error or warning with optional
//! error code, labeled element paths, help text and the graph error that
//! caused it.

use std::fmt;

use meridian_core::GraphError;

use crate::error::{Severity, error_code::ErrorCode, label::Label};

/// A rich diagnostic message naming the elements involved.
///
/// Diagnostics provide detailed information about errors and warnings,
/// including:
/// - A severity level
/// - An optional error code for documentation and searchability
/// - A primary message describing the issue
/// - One or more labeled element paths
/// - Optional help text with suggestions
///
/// # Example
///
/// ```text
/// error[E002]: entity `model::Person` is defined multiple times
///   --> model.json:12:15
///    |
/// 12 |     "path": "model::Person",
///    |              ^^^^^^^^^^^^^ duplicate definition
///    |
///    = help: remove the duplicate or use a different path
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    cause: Option<GraphError>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use meridian_protocol::error::{Diagnostic, ErrorCode};
    ///
    /// let diag = Diagnostic::error("can't find class `model::Foo`")
    ///     .with_code(ErrorCode::E200)
    ///     .with_label("model::Person", "referenced here")
    ///     .with_help("did you mean `model::Firm`?");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create an error diagnostic from an error reported by the graph.
    ///
    /// The error code is derived from the error variant, and the element
    /// path carried by the error becomes the primary label.
    ///
    /// # Arguments
    ///
    /// * `error` - The graph error to report.
    /// * `owner` - Path of the element being processed when the error
    ///   occurred, if it differs from the path carried by the error.
    pub fn from_graph_error(error: GraphError, owner: Option<&str>) -> Self {
        let code = match &error {
            GraphError::DuplicatePath { .. } => Some(ErrorCode::E100),
            GraphError::InvalidPath { .. } => Some(ErrorCode::E101),
            GraphError::ElementNotFound { .. }
            | GraphError::UnresolvedReference { .. }
            | GraphError::ReferenceResolution { .. } => Some(ErrorCode::E200),
            GraphError::ClassMappingNotFound { .. } => Some(ErrorCode::E300),
            GraphError::PropertyNotFound { .. } | GraphError::PropertyMappingNotFound { .. } => {
                Some(ErrorCode::E301)
            }
            GraphError::EnumerationMappingNotFound { .. } => Some(ErrorCode::E304),
            GraphError::ImmutableElementMutation { .. } => Some(ErrorCode::E400),
            GraphError::DisposedElementAccess { .. } => Some(ErrorCode::E401),
            GraphError::DuplicateExtension { .. } => None,
        };

        let mut diagnostic = Self::error(error.to_string());
        diagnostic.code = code;

        match (owner, error.path()) {
            (Some(owner), Some(path)) if owner != path => {
                diagnostic = diagnostic
                    .with_label(owner, "referenced here")
                    .with_secondary_label(path, "target");
            }
            (Some(path), _) | (None, Some(path)) => {
                diagnostic = diagnostic.with_label(path, error_label(&error));
            }
            (None, None) => {}
        }

        if let GraphError::ReferenceResolution {
            found_kind: Some(found),
            expected_kind,
            ..
        } = &error
        {
            diagnostic = diagnostic.with_help(format!(
                "the element at this path is a {found}, not a {expected_kind}"
            ));
        }

        diagnostic.cause = Some(error);
        diagnostic
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Get the graph error behind this diagnostic, if any.
    pub fn cause(&self) -> Option<&GraphError> {
        self.cause.as_ref()
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, path: impl Into<String>, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(path, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(
        mut self,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.labels.push(Label::secondary(path, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Create a new diagnostic with the given severity and message.
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            cause: None,
        }
    }
}

fn error_label(error: &GraphError) -> &'static str {
    match error {
        GraphError::DuplicatePath { .. } => "already defined",
        GraphError::InvalidPath { .. } => "invalid path",
        GraphError::ElementNotFound { .. }
        | GraphError::UnresolvedReference { .. }
        | GraphError::ReferenceResolution { .. } => "not found",
        GraphError::ClassMappingNotFound { .. }
        | GraphError::EnumerationMappingNotFound { .. } => "in this mapping",
        GraphError::PropertyNotFound { .. } => "on this element",
        GraphError::ImmutableElementMutation { .. } => "frozen",
        GraphError::DisposedElementAccess { .. } => "disposed",
        GraphError::PropertyMappingNotFound { .. } | GraphError::DuplicateExtension { .. } => {
            "here"
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}
