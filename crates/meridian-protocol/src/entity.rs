//! The Entity exchange format.
//!
//! An entity is one packageable element in transit: its full path, the
//! classifier path naming its kind, and its protocol content. A model is
//! exchanged as a flat collection of entities, either as a bare JSON array
//! or wrapped in an object with an `entities` array.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Diagnostic, ErrorCode};

/// Members every entity content carries. The builder checks them against the
/// entity path and the serializer writes them back; documents never see them.
pub const HEADER_MEMBERS: [&str; 3] = ["_type", "name", "package"];

/// One packageable element in the exchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub path: String,
    pub classifier_path: String,
    pub content: Value,
}

impl Entity {
    pub fn new(path: impl Into<String>, classifier_path: impl Into<String>, content: Value) -> Self {
        Self {
            path: path.into(),
            classifier_path: classifier_path.into(),
            content,
        }
    }

    /// The `_type` member of the content.
    pub fn content_type(&self) -> Option<&str> {
        self.content.get("_type").and_then(Value::as_str)
    }

    /// The content without its [`HEADER_MEMBERS`]: the document of the
    /// element kind.
    pub fn document(&self) -> Value {
        without_members(&self.content, &HEADER_MEMBERS)
    }

    /// Returns this entity with its content in canonical form.
    pub fn canonical(&self) -> Self {
        Self {
            path: self.path.clone(),
            classifier_path: self.classifier_path.clone(),
            content: canonical(&self.content),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntityCollection {
    Bare(Vec<Entity>),
    Wrapped { entities: Vec<Entity> },
}

/// Reads an entity collection from JSON text.
///
/// # Errors
///
/// Returns an [`ErrorCode::E001`] diagnostic when the text is not a JSON
/// array of entities or an object with an `entities` array.
///
/// # Examples
///
/// ```
/// let entities = meridian_protocol::parse_entities(
///     r#"{"entities": [{
///         "path": "model::Person",
///         "classifierPath": "meta::pure::metamodel::type::Class",
///         "content": {"_type": "class", "name": "Person", "package": "model"}
///     }]}"#,
/// )
/// .unwrap();
///
/// assert_eq!(entities[0].path, "model::Person");
/// ```
pub fn parse_entities(json: &str) -> Result<Vec<Entity>, Diagnostic> {
    match serde_json::from_str::<EntityCollection>(json) {
        Ok(EntityCollection::Bare(entities)) | Ok(EntityCollection::Wrapped { entities }) => {
            Ok(entities)
        }
        Err(err) => Err(Diagnostic::error(format!("invalid entity collection: {err}"))
            .with_code(ErrorCode::E001)
            .with_help("expected a JSON array of entities or an object with an `entities` array")),
    }
}

/// Writes an entity collection as pretty-printed JSON wrapped in an object
/// with an `entities` array.
pub fn entities_to_json(entities: &[Entity]) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct Wrapped<'a> {
        entities: &'a [Entity],
    }
    serde_json::to_string_pretty(&Wrapped { entities })
}

/// Returns `value` with `null` members, `null` array items and empty arrays
/// removed, recursively.
///
/// Those are not semantic in the protocol, so two documents describing the
/// same model have equal canonical forms.
pub fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(members) => {
            let mut result = Map::new();
            for (key, member) in members {
                if is_absent(member) {
                    continue;
                }
                let member = canonical(member);
                if !is_absent(&member) {
                    result.insert(key.clone(), member);
                }
            }
            Value::Object(result)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(canonical)
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Returns `value` without the named members. Values other than objects are
/// returned unchanged.
pub fn without_members(value: &Value, members: &[&str]) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .filter(|(key, _)| !members.contains(&key.as_str()))
                .map(|(key, member)| (key.clone(), member.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Canonical forms of `entities`, sorted by path.
pub fn canonical_entities(entities: &[Entity]) -> Vec<Entity> {
    let mut canonical: Vec<Entity> = entities.iter().map(Entity::canonical).collect();
    canonical.sort_by(|a, b| a.path.cmp(&b.path));
    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bare_array() {
        let entities = parse_entities(
            r#"[{"path": "model::A", "classifierPath": "x", "content": {"_type": "class"}}]"#,
        )
        .unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].classifier_path, "x");
        assert_eq!(entities[0].content_type(), Some("class"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let diag = parse_entities(r#"{"elements": []}"#).unwrap_err();
        assert_eq!(diag.code(), Some(ErrorCode::E001));
        assert!(diag.help().is_some());
    }

    #[test]
    fn test_canonical_drops_non_semantic_members() {
        let value = json!({
            "name": "Person",
            "superTypes": [],
            "stereotypes": null,
            "properties": [{"name": "age", "taggedValues": [], "upper": null}],
            "nested": {"empty": []}
        });

        assert_eq!(
            canonical(&value),
            json!({
                "name": "Person",
                "properties": [{"name": "age"}],
                "nested": {}
            })
        );
    }

    #[test]
    fn test_canonical_drops_arrays_emptied_by_nulls() {
        let value = json!({"values": [null, null], "keep": [0, false, ""]});
        assert_eq!(canonical(&value), json!({"keep": [0, false, ""]}));
    }

    #[test]
    fn test_canonical_entities_sorted() {
        let entities = vec![
            Entity::new("b::B", "x", json!({"list": []})),
            Entity::new("a::A", "x", json!({})),
        ];
        let canonical = canonical_entities(&entities);

        assert_eq!(canonical[0].path, "a::A");
        assert_eq!(canonical[1].content, json!({}));
    }

    #[test]
    fn test_document_drops_header_members() {
        let entity = Entity::new(
            "docs::README",
            "x",
            json!({"_type": "text", "name": "README", "package": "docs", "content": "# Hi"}),
        );

        assert_eq!(entity.document(), json!({"content": "# Hi"}));
        assert_eq!(without_members(&json!([1]), &HEADER_MEMBERS), json!([1]));
    }

    #[test]
    fn test_entities_to_json_reparses() {
        let entities = vec![Entity::new("a::A", "x", json!({"_type": "class"}))];
        let text = entities_to_json(&entities).unwrap();

        assert_eq!(parse_entities(&text).unwrap(), entities);
    }
}

#[cfg(test)]
mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    // =========================================================================
    // Strategies
    // =========================================================================

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(Value::from),
            "[a-z]{0,4}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,3}", inner, 0..4)
                    .prop_map(|members| Value::Object(members.into_iter().collect())),
            ]
        })
    }

    fn contains_absent_member(value: &Value) -> bool {
        match value {
            Value::Object(members) => members
                .values()
                .any(|member| is_absent(member) || contains_absent_member(member)),
            Value::Array(items) => items
                .iter()
                .any(|item| item.is_null() || contains_absent_member(item)),
            _ => false,
        }
    }

    // =========================================================================
    // Property Test Functions
    // =========================================================================

    fn check_canonical_idempotent(value: &Value) -> Result<(), TestCaseError> {
        let once = canonical(value);
        let twice = canonical(&once);
        prop_assert_eq!(once, twice);
        Ok(())
    }

    fn check_canonical_has_no_absent_members(value: &Value) -> Result<(), TestCaseError> {
        prop_assert!(!contains_absent_member(&canonical(value)));
        Ok(())
    }

    // =========================================================================
    // Proptest Wrappers
    // =========================================================================

    proptest! {
        #[test]
        fn canonical_idempotent(value in json_value()) {
            check_canonical_idempotent(&value)?;
        }

        #[test]
        fn canonical_has_no_absent_members(value in json_value()) {
            check_canonical_has_no_absent_members(&value)?;
        }
    }
}
