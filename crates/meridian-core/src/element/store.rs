//! Stores and the relational database model.

use std::fmt;

use crate::{
    hash::{HashBuilder, HashCode, HashStructure, Hashable},
    reference::{Reference, Resolvable},
};

/// Elements that hold data a mapping can read from.
pub trait Store: fmt::Debug {
    /// Returns the stores included by this store.
    fn includes(&self) -> &[Reference<dyn Store>];
}

/// A relational database: schemas, tables and joins.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub includes: Vec<Reference<dyn Store>>,
    pub schemas: Vec<Schema>,
    pub joins: Vec<Join>,
}

impl Database {
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.iter().find(|schema| schema.name == name)
    }

    /// Finds a table declared directly in this database.
    pub fn table(&self, schema: &str, table: &str) -> Option<&Table> {
        self.schema(schema)?
            .tables
            .iter()
            .find(|candidate| candidate.name == table)
    }

    /// Finds a join declared directly in this database.
    pub fn join(&self, name: &str) -> Option<&Join> {
        self.joins.iter().find(|join| join.name == name)
    }

    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = self
            .includes
            .iter()
            .map(|include| include as &dyn Resolvable)
            .collect();
        for join in &self.joins {
            references.extend(join.operation.references());
        }
        references
    }

    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Database);
        builder
            .str(path)
            .list(&self.includes)
            .list(&self.schemas)
            .list(&self.joins);
        builder.finish()
    }
}

impl Store for Database {
    fn includes(&self) -> &[Reference<dyn Store>] {
        &self.includes
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub tables: Vec<Table>,
}

impl Hashable for Schema {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Schema);
        builder.str(&self.name).list(&self.tables);
        builder.finish()
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
}

impl Table {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }
}

impl Hashable for Table {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Table);
        builder
            .str(&self.name)
            .list(&self.columns)
            .strings(&self.primary_key);
        builder.finish()
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// SQL type as written, e.g. `VARCHAR(200)`.
    pub data_type: String,
    pub nullable: bool,
}

impl Hashable for Column {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Column);
        builder
            .str(&self.name)
            .str(&self.data_type)
            .bool(self.nullable);
        builder.finish()
    }
}

/// A named join condition between tables.
#[derive(Debug, Clone)]
pub struct Join {
    pub name: String,
    pub operation: RelationalOperation,
}

impl Hashable for Join {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Join);
        builder.str(&self.name).hashable(&self.operation);
        builder.finish()
    }
}

/// Pointer to a table of a database.
#[derive(Debug, Clone)]
pub struct TablePointer {
    pub database: Reference<Database>,
    pub schema: String,
    pub table: String,
}

impl Hashable for TablePointer {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::TablePointer);
        builder
            .str(&self.database.path().as_string())
            .str(&self.schema)
            .str(&self.table);
        builder.finish()
    }
}

/// Pointer to a join of a database.
#[derive(Debug, Clone)]
pub struct JoinPointer {
    pub database: Reference<Database>,
    pub name: String,
    pub join_type: Option<String>,
}

/// Relational expression used by joins, primary keys and property mappings.
#[derive(Debug, Clone)]
pub enum RelationalOperation {
    Column {
        table: TablePointer,
        table_alias: String,
        column: String,
    },
    DynaFunction {
        name: String,
        parameters: Vec<RelationalOperation>,
    },
    Literal(serde_json::Value),
    ElementWithJoins {
        joins: Vec<JoinPointer>,
        element: Option<Box<RelationalOperation>>,
    },
}

impl RelationalOperation {
    /// Returns every database reference in this expression.
    pub fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = Vec::new();
        self.collect_references(&mut references);
        references
    }

    fn collect_references<'a>(&'a self, references: &mut Vec<&'a dyn Resolvable>) {
        match self {
            RelationalOperation::Column { table, .. } => references.push(&table.database),
            RelationalOperation::DynaFunction { parameters, .. } => {
                for parameter in parameters {
                    parameter.collect_references(references);
                }
            }
            RelationalOperation::Literal(_) => {}
            RelationalOperation::ElementWithJoins { joins, element } => {
                references.extend(joins.iter().map(|join| &join.database as &dyn Resolvable));
                if let Some(element) = element {
                    element.collect_references(references);
                }
            }
        }
    }

    /// Returns the table pointers used in this expression.
    pub fn table_pointers(&self) -> Vec<&TablePointer> {
        match self {
            RelationalOperation::Column { table, .. } => vec![table],
            RelationalOperation::DynaFunction { parameters, .. } => parameters
                .iter()
                .flat_map(RelationalOperation::table_pointers)
                .collect(),
            RelationalOperation::Literal(_) => Vec::new(),
            RelationalOperation::ElementWithJoins { element, .. } => element
                .as_deref()
                .map(RelationalOperation::table_pointers)
                .unwrap_or_default(),
        }
    }

    /// Returns the join pointers used in this expression.
    pub fn join_pointers(&self) -> Vec<&JoinPointer> {
        match self {
            RelationalOperation::Column { .. } | RelationalOperation::Literal(_) => Vec::new(),
            RelationalOperation::DynaFunction { parameters, .. } => parameters
                .iter()
                .flat_map(RelationalOperation::join_pointers)
                .collect(),
            RelationalOperation::ElementWithJoins { joins, element } => {
                let mut pointers: Vec<&JoinPointer> = joins.iter().collect();
                if let Some(element) = element {
                    pointers.extend(element.join_pointers());
                }
                pointers
            }
        }
    }
}

impl Hashable for RelationalOperation {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::RelationalOperation);
        match self {
            RelationalOperation::Column {
                table,
                table_alias,
                column,
            } => {
                builder
                    .str("column")
                    .hashable(table)
                    .str(table_alias)
                    .str(column);
            }
            RelationalOperation::DynaFunction { name, parameters } => {
                builder.str("dynaFunc").str(name).list(parameters);
            }
            RelationalOperation::Literal(value) => {
                builder.str("literal").json(value);
            }
            RelationalOperation::ElementWithJoins { joins, element } => {
                builder.str("elemtWithJoins");
                for join in joins {
                    builder
                        .str(&join.database.path().as_string())
                        .str(&join.name)
                        .opt_str(join.join_type.as_deref());
                }
                builder.opt_hashable(element.as_deref());
            }
        }
        builder.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(table: &str, name: &str) -> RelationalOperation {
        RelationalOperation::Column {
            table: TablePointer {
                database: Reference::new("store::DB"),
                schema: "default".to_string(),
                table: table.to_string(),
            },
            table_alias: table.to_string(),
            column: name.to_string(),
        }
    }

    fn firm_person_join() -> Join {
        Join {
            name: "Firm_Person".to_string(),
            operation: RelationalOperation::DynaFunction {
                name: "equal".to_string(),
                parameters: vec![column("firmTable", "ID"), column("personTable", "FIRMID")],
            },
        }
    }

    #[test]
    fn test_table_lookup() {
        let database = Database {
            schemas: vec![Schema {
                name: "default".to_string(),
                tables: vec![Table {
                    name: "personTable".to_string(),
                    columns: vec![Column {
                        name: "ID".to_string(),
                        data_type: "INTEGER".to_string(),
                        nullable: false,
                    }],
                    primary_key: vec!["ID".to_string()],
                }],
            }],
            ..Database::default()
        };

        let table = database.table("default", "personTable").unwrap();
        assert!(table.column("ID").is_some());
        assert!(database.table("default", "firmTable").is_none());
        assert!(database.table("other", "personTable").is_none());
    }

    #[test]
    fn test_join_references_point_at_database() {
        let join = firm_person_join();
        let paths: Vec<String> = join
            .operation
            .references()
            .iter()
            .map(|reference| reference.path().as_string())
            .collect();
        assert_eq!(paths, vec!["store::DB", "store::DB"]);
        assert_eq!(join.operation.table_pointers().len(), 2);
    }

    #[test]
    fn test_join_pointers_nested() {
        let operation = RelationalOperation::ElementWithJoins {
            joins: vec![JoinPointer {
                database: Reference::new("store::DB"),
                name: "Firm_Person".to_string(),
                join_type: None,
            }],
            element: Some(Box::new(column("firmTable", "LEGALNAME"))),
        };

        assert_eq!(operation.join_pointers().len(), 1);
        assert_eq!(operation.table_pointers().len(), 1);
        assert_eq!(operation.references().len(), 2);
    }

    #[test]
    fn test_operation_hash_differs_by_column() {
        assert_ne!(
            column("personTable", "ID").hash_code(),
            column("personTable", "NAME").hash_code()
        );
    }
}
