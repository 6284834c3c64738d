//! Interned identifiers and element paths.
//!
//! This module provides the [`Id`] type backed by a global string interner.
//! Element paths (`model::domain::Person`) are interned as a whole, so path
//! comparison and hashing are symbol comparisons.

use std::{
    fmt,
    sync::{Mutex, OnceLock},
};

use string_interner::{DefaultStringInterner, DefaultSymbol};

/// Separator between the segments of an element path.
pub const PATH_DELIMITER: &str = "::";

/// Global string interner for identifier storage.
///
/// # Thread Safety
///
/// This uses `Mutex` for thread-safe access to the string interner.
static INTERNER: OnceLock<Mutex<DefaultStringInterner>> = OnceLock::new();

fn with_interner<R>(f: impl FnOnce(&mut DefaultStringInterner) -> R) -> R {
    let mut interner = INTERNER
        .get_or_init(|| Mutex::new(DefaultStringInterner::new()))
        .lock()
        .expect("Failed to acquire interner lock");
    f(&mut interner)
}

/// Interned identifier used for element names and `::` separated paths.
///
/// # Examples
///
/// ```
/// use meridian_core::identifier::Id;
///
/// let package = Id::new("model::domain");
/// let path = package.create_nested("Person");
/// assert_eq!(path, "model::domain::Person");
/// assert_eq!(path.name(), "Person");
/// assert_eq!(path.package_path(), Some(Id::new("model::domain")));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(DefaultSymbol);

impl Id {
    /// Creates an `Id` from &str.
    ///
    /// # Arguments
    ///
    /// * `name` - The string representation of the identifier
    pub fn new(name: &str) -> Self {
        Self(with_interner(|interner| interner.get_or_intern(name)))
    }

    /// Creates a nested path by appending `child` with the `::` separator.
    ///
    /// # Examples
    ///
    /// ```
    /// use meridian_core::identifier::Id;
    ///
    /// let nested = Id::new("model").create_nested("Firm");
    /// assert_eq!(nested, "model::Firm");
    /// ```
    pub fn create_nested(&self, child: &str) -> Self {
        let nested = format!("{self}{PATH_DELIMITER}{child}");
        Self::new(&nested)
    }

    /// Joins an optional package path and a simple name into an element path.
    pub fn join(package: Option<Id>, name: &str) -> Self {
        match package {
            Some(package) => package.create_nested(name),
            None => Self::new(name),
        }
    }

    /// Returns the owned string value of this identifier.
    pub fn as_string(&self) -> String {
        with_interner(|interner| {
            interner
                .resolve(self.0)
                .expect("Symbol should exist in interner")
                .to_string()
        })
    }

    /// Returns the last path segment.
    pub fn name(&self) -> String {
        let path = self.as_string();
        match path.rsplit_once(PATH_DELIMITER) {
            Some((_, name)) => name.to_string(),
            None => path,
        }
    }

    /// Returns the path of the owning package, or `None` for a top-level path.
    pub fn package_path(&self) -> Option<Id> {
        let path = self.as_string();
        path.rsplit_once(PATH_DELIMITER)
            .map(|(package, _)| Id::new(package))
    }

    /// Splits the path into its segments.
    pub fn segments(&self) -> Vec<String> {
        self.as_string()
            .split(PATH_DELIMITER)
            .map(str::to_string)
            .collect()
    }

    /// Converts an element path into the default mapping element id
    /// (`model::Person` becomes `model_Person`).
    pub fn to_mapping_element_id(&self) -> String {
        self.as_string().replace(PATH_DELIMITER, "_")
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.as_string();
        f.write_str(&value)
    }
}

impl std::str::FromStr for Id {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Id {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Id {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        with_interner(|interner| interner.resolve(self.0) == Some(other))
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

/// Validates an element path: non-empty segments separated by `::`.
///
/// Returns the reason on failure.
pub fn validate_path(path: &str) -> Result<(), String> {
    if path.is_empty() {
        return Err("path is empty".to_string());
    }
    for segment in path.split(PATH_DELIMITER) {
        if segment.is_empty() {
            return Err("path contains an empty segment".to_string());
        }
        if segment.contains(':') {
            return Err(format!("segment `{segment}` contains a stray `:`"));
        }
        if segment.chars().any(char::is_whitespace) {
            return Err(format!("segment `{segment}` contains whitespace"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_equality() {
        let a = Id::new("model::Person");
        let b: Id = "model::Person".into();
        assert_eq!(a, b);
        assert_eq!(a, "model::Person");
        assert_ne!(a, Id::new("model::Firm"));
    }

    #[test]
    fn test_create_nested() {
        let nested = Id::new("apps::pure").create_nested("Person");
        assert_eq!(nested, "apps::pure::Person");
        assert_eq!(nested.to_string(), "apps::pure::Person");
    }

    #[test]
    fn test_join_without_package() {
        assert_eq!(Id::join(None, "Person"), "Person");
        assert_eq!(Id::join(Some(Id::new("model")), "Person"), "model::Person");
    }

    #[test]
    fn test_name_and_package_path() {
        let path = Id::new("a::b::C");
        assert_eq!(path.name(), "C");
        assert_eq!(path.package_path(), Some(Id::new("a::b")));

        let top = Id::new("C");
        assert_eq!(top.name(), "C");
        assert_eq!(top.package_path(), None);
    }

    #[test]
    fn test_segments() {
        assert_eq!(Id::new("a::b::C").segments(), vec!["a", "b", "C"]);
    }

    #[test]
    fn test_mapping_element_id() {
        assert_eq!(
            Id::new("apps::pure::studio::model::simple::Person").to_mapping_element_id(),
            "apps_pure_studio_model_simple_Person"
        );
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("model::Person").is_ok());
        assert!(validate_path("Person").is_ok());
        assert!(validate_path("").is_err());
        assert!(validate_path("model::").is_err());
        assert!(validate_path("::Person").is_err());
        assert!(validate_path("model:Person").is_err());
        assert!(validate_path("model::Per son").is_err());
    }
}
