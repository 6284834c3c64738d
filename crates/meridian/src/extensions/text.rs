//! Free-form text elements (`_type: "text"`).

use std::any::Any;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use meridian_core::{
    Graph,
    element::ExtensionElement,
    hash::{HashBuilder, HashCode},
    identifier::Id,
    plugin::{ElementKindPlugin, GraphPlugin},
};

use super::wrong_body;

pub const CLASSIFIER_PATH: &str = "meta::pure::metamodel::text::Text";
pub const PROTOCOL_TYPE: &str = "text";

/// A text element: content plus the format it is written in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Text {
    /// Content format, e.g. `markdown` or `plainText`.
    #[serde(rename = "type", default)]
    pub text_type: String,
    #[serde(default)]
    pub content: String,
}

impl Text {
    pub fn element_kind() -> Id {
        Id::new("Text")
    }
}

impl ExtensionElement for Text {
    fn kind(&self) -> Id {
        Text::element_kind()
    }

    fn hash_code(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::extension("TEXT");
        builder.str(path).str(&self.text_type).str(&self.content);
        builder.finish()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct TextKind;

impl ElementKindPlugin for TextKind {
    fn kind(&self) -> Id {
        Text::element_kind()
    }

    fn classifier_path(&self) -> &str {
        CLASSIFIER_PATH
    }

    fn protocol_type(&self) -> &str {
        PROTOCOL_TYPE
    }

    fn build(&self, content: &Value) -> serde_json::Result<Box<dyn ExtensionElement>> {
        let text = Text::deserialize(content)?;
        Ok(Box::new(text))
    }

    fn serialize(&self, element: &dyn ExtensionElement, _graph: &Graph) -> serde_json::Result<Value> {
        let text = element
            .as_any()
            .downcast_ref::<Text>()
            .ok_or_else(|| wrong_body("Text"))?;
        serde_json::to_value(text)
    }
}

/// Preset contributing the [`Text`] element kind.
#[derive(Debug, Default)]
pub struct TextPlugin;

impl GraphPlugin for TextPlugin {
    fn name(&self) -> &str {
        "text"
    }

    fn supported_element_kinds(&self) -> Vec<Box<dyn ElementKindPlugin>> {
        vec![Box::new(TextKind)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_and_serialize() {
        let content = json!({"type": "markdown", "content": "# People"});

        let element = TextKind.build(&content).unwrap();
        let text = element.as_any().downcast_ref::<Text>().unwrap();
        assert_eq!(text.text_type, "markdown");

        let written = TextKind.serialize(element.as_ref(), &Graph::default()).unwrap();
        assert_eq!(written, json!({"type": "markdown", "content": "# People"}));
    }

    #[test]
    fn test_unknown_member_is_rejected() {
        let err = TextKind
            .build(&json!({"type": "markdown", "content": "# People", "author": "ops"}))
            .unwrap_err();

        assert!(err.to_string().contains("author"));
    }

    #[test]
    fn test_hash_covers_content() {
        let a = Text {
            text_type: "markdown".to_string(),
            content: "a".to_string(),
        };
        let b = Text {
            content: "b".to_string(),
            ..a.clone()
        };

        assert_eq!(a.hash_code("docs::A"), a.clone().hash_code("docs::A"));
        assert_ne!(a.hash_code("docs::A"), b.hash_code("docs::A"));
        assert_ne!(a.hash_code("docs::A"), a.hash_code("docs::B"));
    }
}
