//! Error codes for the Meridian diagnostic system.
//!
//! Error codes are organized by build phase:
//! - `E0xx` - Entity errors
//! - `E1xx` - Registration errors
//! - `E2xx` - Resolution and validation errors
//! - `E3xx` - Mapping errors
//! - `E4xx` - Lifecycle errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Entity Errors (E0xx)
    // =========================================================================
    /// Malformed entity collection.
    ///
    /// The input is not a JSON array of entities (or an object with an
    /// `entities` array).
    E001,

    /// Duplicate entity path.
    ///
    /// Two entities of the collection declare the same path.
    E002,

    /// Invalid entity path.
    ///
    /// The path is empty, has an empty segment or contains whitespace.
    E003,

    /// Entity content disagrees with its path.
    ///
    /// The `name` and `package` of the content must join to the entity path.
    E004,

    /// Unknown classifier path.
    ///
    /// Neither the core nor any installed plugin handles the classifier.
    E005,

    /// Malformed entity content.
    ///
    /// The content could not be read as the protocol form of its kind.
    E006,

    /// Content type mismatch.
    ///
    /// The content `_type` does not match the classifier path.
    E007,

    // =========================================================================
    // Registration Errors (E1xx)
    // =========================================================================
    /// Duplicate element path.
    ///
    /// The graph already holds a live element at this path.
    E100,

    /// Path conflict.
    ///
    /// An ancestor of the path is an element other than a package.
    E101,

    // =========================================================================
    // Resolution Errors (E2xx)
    // =========================================================================
    /// Unresolved reference.
    ///
    /// No element of the expected kind exists at the referenced path.
    E200,

    /// Unknown stereotype.
    ///
    /// The referenced profile does not declare the stereotype.
    E201,

    /// Unknown tag.
    ///
    /// The referenced profile does not declare the tag.
    E202,

    /// Unknown table.
    ///
    /// The table is not declared by the database or any store it includes.
    E203,

    /// Unknown join.
    ///
    /// The join is not declared by the database or any store it includes.
    E204,

    // =========================================================================
    // Mapping Errors (E3xx)
    // =========================================================================
    /// Class mapping not found.
    ///
    /// A target or operation parameter names a class mapping id that does
    /// not exist in the mapping or its includes.
    E300,

    /// Mapped property not found.
    ///
    /// A property mapping names a property its class does not have.
    E301,

    /// Duplicate class mapping id.
    ///
    /// Two set implementations of the same mapping share an id.
    E302,

    /// Unknown class mapping type.
    ///
    /// No installed mapping extension handles the class mapping `_type`.
    E303,

    /// Enumeration mapping not found.
    ///
    /// A property mapping names an enumeration mapping id that does not exist.
    E304,

    // =========================================================================
    // Lifecycle Errors (E4xx)
    // =========================================================================
    /// Read-only element modified.
    ///
    /// A frozen element or graph was mutated.
    E400,

    /// Disposed element accessed.
    E401,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            // Entity errors
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E005 => "E005",
            ErrorCode::E006 => "E006",
            ErrorCode::E007 => "E007",
            // Registration errors
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            // Resolution errors
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            // Mapping errors
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            // Lifecycle errors
            ErrorCode::E400 => "E400",
            ErrorCode::E401 => "E401",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            // Entity errors
            ErrorCode::E001 => "malformed entity collection",
            ErrorCode::E002 => "duplicate entity path",
            ErrorCode::E003 => "invalid entity path",
            ErrorCode::E004 => "content disagrees with path",
            ErrorCode::E005 => "unknown classifier path",
            ErrorCode::E006 => "malformed entity content",
            ErrorCode::E007 => "content type mismatch",
            // Registration errors
            ErrorCode::E100 => "duplicate element path",
            ErrorCode::E101 => "path conflict",
            // Resolution errors
            ErrorCode::E200 => "unresolved reference",
            ErrorCode::E201 => "unknown stereotype",
            ErrorCode::E202 => "unknown tag",
            ErrorCode::E203 => "unknown table",
            ErrorCode::E204 => "unknown join",
            // Mapping errors
            ErrorCode::E300 => "class mapping not found",
            ErrorCode::E301 => "mapped property not found",
            ErrorCode::E302 => "duplicate class mapping id",
            ErrorCode::E303 => "unknown class mapping type",
            ErrorCode::E304 => "enumeration mapping not found",
            // Lifecycle errors
            ErrorCode::E400 => "read-only element modified",
            ErrorCode::E401 => "disposed element accessed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
