//! Element-level differences between two graphs, by structural hash.

use std::fmt;

use indexmap::IndexMap;

use crate::{error::Result, graph::Graph, hash::HashCode};

/// Paths added, removed and modified between two graphs.
///
/// All lists are sorted by path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl GraphDiff {
    /// Compares the hash indexes of `before` and `after`.
    ///
    /// # Errors
    ///
    /// Returns the first hashing failure of either graph.
    pub fn between(before: &Graph, after: &Graph) -> Result<Self> {
        Ok(Self::from_indexes(&before.hash_index()?, &after.hash_index()?))
    }

    /// Compares two hash indexes as returned by [`Graph::hash_index`].
    pub fn from_indexes(before: &IndexMap<String, HashCode>, after: &IndexMap<String, HashCode>) -> Self {
        let mut diff = Self::default();
        for (path, code) in after {
            match before.get(path) {
                None => diff.added.push(path.clone()),
                Some(previous) if previous != code => diff.modified.push(path.clone()),
                Some(_) => {}
            }
        }
        diff.removed = before
            .keys()
            .filter(|path| !after.contains_key(*path))
            .cloned()
            .collect();

        diff.added.sort();
        diff.removed.sort();
        diff.modified.sort();
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Number of changed paths.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

impl fmt::Display for GraphDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for path in &self.added {
            writeln!(f, "+ {path}")?;
        }
        for path in &self.removed {
            writeln!(f, "- {path}")?;
        }
        for path in &self.modified {
            writeln!(f, "~ {path}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Class, ElementBody, Multiplicity, Property};
    use crate::reference::Reference;

    fn graph(paths: &[&str]) -> Graph {
        let mut graph = Graph::default();
        for path in paths {
            graph
                .create_element(path, ElementBody::Class(Class::default()))
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_identical_graphs_have_no_diff() {
        let diff = GraphDiff::between(&graph(&["model::A"]), &graph(&["model::A"])).unwrap();
        assert!(diff.is_empty());
        assert_eq!(diff.to_string(), "");
    }

    #[test]
    fn test_added_removed_modified() {
        let before = graph(&["model::A", "model::B"]);
        let mut after = graph(&["model::B", "model::C"]);
        after
            .get_mut::<Class>("model::B")
            .unwrap()
            .add_property(Property::new("name", Multiplicity::ONE, Reference::new("String")));

        let diff = GraphDiff::between(&before, &after).unwrap();
        assert_eq!(diff.added, vec!["model::C"]);
        assert_eq!(diff.removed, vec!["model::A"]);
        assert_eq!(diff.modified, vec!["model::B"]);
        assert_eq!(diff.len(), 3);
        assert_eq!(diff.to_string(), "+ model::C\n- model::A\n~ model::B\n");
    }
}
