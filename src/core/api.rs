/// Collection API contract and error taxonomy
///
/// Everything above the transport talks to a `CollectionApi`; the reqwest
/// implementation lives in `core::http`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use super::record::{FormPayload, PageResult, Record};

/// Failure of a single API call.
///
/// Errors are never recovered inside the client; each one is scoped to the
/// call that produced it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Transport failure (unreachable host, timeout, broken connection)
    #[error("network error: {0}")]
    Network(String),

    /// Response body was not the structured data we expected
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Non-success status without field-level detail
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Non-success status rejecting specific payload fields
    #[error("validation failed: {message}")]
    Validation {
        status: u16,
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },
}

impl ApiError {
    /// Short label shown in banners and CLI output
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Network(_) => "network",
            ApiError::Decode(_) => "decode",
            ApiError::Server { .. } => "server",
            ApiError::Validation { .. } => "validation",
        }
    }

    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            ApiError::Validation { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

/// List, create and delete over one collection endpoint.
///
/// `page` is always 1-based here; wire numbering is the client's concern.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CollectionApi: Send + Sync {
    async fn list(&self, endpoint: &str, page: u32) -> Result<PageResult, ApiError>;

    async fn create(&self, endpoint: &str, payload: &FormPayload) -> Result<Record, ApiError>;

    async fn delete(&self, endpoint: &str, id: &Value) -> Result<(), ApiError>;
}
