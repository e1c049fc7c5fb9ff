//! The data source seam.

use std::future::Future;

use carto_model::TableQuery;
use serde_json::Value;
use thiserror::Error;

/// Why a fetch produced no rows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected payload: {0}")]
    Payload(String),

    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

/// Something that can run a [`TableQuery`] and return raw rows.
///
/// Rows are JSON objects keyed by column name. Decoding and validation
/// happen in the sync pipeline, not here.
pub trait DataSource: Send + Sync {
    fn fetch(
        &self,
        query: TableQuery,
    ) -> impl Future<Output = Result<Vec<Value>, FetchError>> + Send;
}
