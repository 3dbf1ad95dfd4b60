use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use schemaload_core::SchemaDocument;

use crate::error::LoadError;

/// Success acknowledgment returned by the backend loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Success marker; backends may omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
}

/// Trait implemented by transports that can hand a document to the loader.
///
/// Implementations must not retry; a retry is an operator decision.
#[async_trait]
pub trait ConfigClient: Send + Sync {
    /// Send the document and interpret the backend's answer.
    async fn load(&self, document: SchemaDocument) -> Result<Ack, LoadError>;
}
