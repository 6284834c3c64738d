//! Documents of the relational store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A relational column type, e.g. `{"_type": "Varchar", "size": 200}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnType {
    #[serde(rename = "_type")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u64>,
}

impl ColumnType {
    /// Renders the type in its textual form: `Varchar(200)`,
    /// `Decimal(10,2)` or `Integer`.
    pub fn to_data_type(&self) -> String {
        match (self.size, self.precision, self.scale) {
            (Some(size), _, _) => format!("{}({size})", self.name),
            (None, Some(precision), Some(scale)) => {
                format!("{}({precision},{scale})", self.name)
            }
            (None, Some(precision), None) => format!("{}({precision})", self.name),
            (None, None, _) => self.name.clone(),
        }
    }

    /// Parses the textual form produced by [`ColumnType::to_data_type`].
    ///
    /// A single argument is read as a size, two arguments as precision and
    /// scale. Returns `None` when an argument is not a number.
    pub fn from_data_type(data_type: &str) -> Option<Self> {
        let Some((name, arguments)) = data_type.split_once('(') else {
            return Some(Self::named(data_type));
        };
        let arguments = arguments.strip_suffix(')')?;
        let numbers = arguments
            .split(',')
            .map(|argument| argument.trim().parse::<u64>().ok())
            .collect::<Option<Vec<u64>>>()?;

        let mut column_type = Self::named(name);
        match numbers.as_slice() {
            [size] => column_type.size = Some(*size),
            [precision, scale] => {
                column_type.precision = Some(*precision);
                column_type.scale = Some(*scale);
            }
            _ => return None,
        }
        Some(column_type)
    }

    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            size: None,
            precision: None,
            scale: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub nullable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Table {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Join {
    pub name: String,
    pub operation: RelationalOperation,
}

/// Database document (`_type: "relational"`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DatabaseDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_stores: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemas: Vec<Schema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<Join>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TablePointer {
    #[serde(rename = "_type", default = "TablePointer::table")]
    pub kind: String,
    pub table: String,
    pub schema: String,
    pub database: String,
}

impl TablePointer {
    pub const TABLE: &'static str = "Table";

    pub fn new(database: String, schema: String, table: String) -> Self {
        Self {
            kind: Self::table(),
            table,
            schema,
            database,
        }
    }

    fn table() -> String {
        Self::TABLE.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JoinPointer {
    pub db: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", deny_unknown_fields)]
pub enum RelationalOperation {
    #[serde(rename = "column", rename_all = "camelCase")]
    Column {
        table: TablePointer,
        table_alias: String,
        column: String,
    },
    #[serde(rename = "dynaFunc", rename_all = "camelCase")]
    DynaFunction {
        func_name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        parameters: Vec<RelationalOperation>,
    },
    #[serde(rename = "literal")]
    Literal { value: Value },
    #[serde(rename = "elemtWithJoins", rename_all = "camelCase")]
    ElementWithJoins {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        joins: Vec<JoinPointer>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        relational_element: Option<Box<RelationalOperation>>,
    },
}
