//! Error and diagnostic system for building model graphs.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labels naming the element paths involved
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which represents
//! a single error or warning message with optional error code, labels, help
//! text and the underlying [`GraphError`](meridian_core::GraphError) when the
//! problem was reported by the graph. Multiple diagnostics are wrapped in
//! [`BuildError`] for returning from a build.
//!
//! # Example
//!
//! ```
//! # use meridian_protocol::error::{Diagnostic, ErrorCode};
//!
//! let diag = Diagnostic::error("entity `model::Person` is defined multiple times")
//!     .with_code(ErrorCode::E002)
//!     .with_label("model::Person", "duplicate definition")
//!     .with_help("remove the duplicate or use a different path");
//!
//! assert_eq!(
//!     diag.to_string(),
//!     "error[E002]: entity `model::Person` is defined multiple times"
//! );
//! ```

mod build_error;
mod collector;
mod diagnostic;
mod error_code;
mod label;
mod severity;

pub(crate) use collector::DiagnosticCollector;

pub use build_error::BuildError;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use severity::Severity;
