//! Labels attaching messages to element paths.

/// A message attached to the element (or entity) at `path`.
///
/// Primary labels mark where the problem is; secondary labels add context,
/// e.g. where a conflicting definition lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    path: String,
    message: String,
    primary: bool,
}

impl Label {
    /// Create a primary label.
    pub fn primary(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            primary: true,
        }
    }

    /// Create a secondary label.
    pub fn secondary(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            primary: false,
        }
    }

    /// The element path this label points at.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_kinds() {
        let primary = Label::primary("model::Person", "here");
        let secondary = Label::secondary("model::Firm", "related");

        assert!(primary.is_primary());
        assert!(!primary.is_secondary());
        assert!(secondary.is_secondary());
        assert_eq!(primary.path(), "model::Person");
        assert_eq!(secondary.message(), "related");
    }
}
