use std::fmt;

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::de::{port_number, unique_columns, unique_keys};

/// A schema document: database connections plus the tables that live on them.
///
/// Maps keep the order in which keys appear in the source text; that order is
/// the iteration order used by validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Connections keyed by database alias.
    #[serde(deserialize_with = "unique_keys")]
    #[schemars(with = "IndexMap<String, DatabaseConnection>")]
    pub databases: IndexMap<String, DatabaseConnection>,
    /// Table definitions keyed by table name.
    #[serde(deserialize_with = "unique_keys")]
    #[schemars(with = "IndexMap<String, TableDefinition>")]
    pub tables: IndexMap<String, TableDefinition>,
}

/// Connection parameters for one database alias.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConnection {
    pub host: String,
    /// TCP port, 1-65535.
    #[serde(deserialize_with = "port_number")]
    #[schemars(with = "u16")]
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for DatabaseConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

/// A table hosted on one of the document's databases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TableDefinition {
    /// Alias of the database that owns the table.
    pub db: String,
    /// Column names in declaration order.
    #[serde(deserialize_with = "unique_columns")]
    #[schemars(with = "Vec<String>")]
    pub columns: Vec<String>,
    /// Named relations from this table to another table of the document.
    #[serde(default, deserialize_with = "unique_keys")]
    #[schemars(with = "IndexMap<String, Relation>")]
    pub relations: IndexMap<String, Relation>,
}

impl TableDefinition {
    /// Returns true when `column` is declared on this table (case-sensitive).
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| name == column)
    }
}

/// Foreign-key linkage from the owning table to `table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Relation {
    /// Column of the owning table.
    pub foreign_key: String,
    /// Column of the target table.
    pub reference: String,
    /// Target table name.
    pub table: String,
}

impl SchemaDocument {
    /// Look up a table by name.
    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    /// Iterate over `(table name, relation name, relation)` in document order.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &str, &Relation)> {
        self.tables.iter().flat_map(|(table_name, table)| {
            table
                .relations
                .iter()
                .map(move |(name, relation)| (table_name.as_str(), name.as_str(), relation))
        })
    }
}
