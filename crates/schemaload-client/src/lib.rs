//! Transport to the backend configuration loader.

pub mod client;
pub mod error;
pub mod http;
pub mod options;

pub use client::{Ack, ConfigClient};
pub use error::LoadError;
pub use http::HttpConfigClient;
pub use options::ClientOptions;

pub use schemaload_core::SchemaDocument;
