use serde::{Deserialize, Serialize};

use crate::document::{DatabaseConnection, SchemaDocument};

const MASK: &str = "***";

/// Connection metadata with the password masked, safe to log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactedConnection {
    pub alias: String,
    pub user: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    /// `user:***@host:port/database`
    pub redacted: String,
}

/// Describe a connection without its password.
pub fn redact_connection(alias: &str, connection: &DatabaseConnection) -> RedactedConnection {
    let auth = if connection.password.is_empty() {
        connection.user.clone()
    } else {
        format!("{}:{MASK}", connection.user)
    };

    RedactedConnection {
        alias: alias.to_string(),
        user: connection.user.clone(),
        host: connection.host.clone(),
        port: connection.port,
        database: connection.database.clone(),
        redacted: format!(
            "{auth}@{}:{}/{}",
            connection.host, connection.port, connection.database
        ),
    }
}

/// Copy of `document` with every password replaced by a mask.
pub fn redact_document(document: &SchemaDocument) -> SchemaDocument {
    let mut redacted = document.clone();
    for connection in redacted.databases.values_mut() {
        if !connection.password.is_empty() {
            connection.password = MASK.to_string();
        }
    }
    redacted
}
