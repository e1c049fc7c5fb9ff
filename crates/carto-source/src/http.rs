//! Shared HTTP plumbing for the Supabase endpoints.

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::SupabaseConfig;
use crate::error::{Result, SourceError};

const USER_AGENT_VALUE: &str = concat!("carto-layers/", env!("CARGO_PKG_VERSION"));

const APIKEY: HeaderName = HeaderName::from_static("apikey");
const ACCEPT_PROFILE: HeaderName = HeaderName::from_static("accept-profile");

/// Builds a client that sends the project key and schema with every request.
pub(crate) fn client(config: &SupabaseConfig) -> Result<reqwest::Client> {
    config.validate()?;

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(APIKEY, header_value(config.anon_key.trim())?);
    headers.insert(ACCEPT_PROFILE, header_value(config.schema.trim())?);

    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .map_err(|e| SourceError::Network(format!("failed to create HTTP client: {e}")))
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| SourceError::InvalidConfig("value contains invalid characters".to_string()))
}

/// Picks the human-readable part of a Supabase error body.
pub(crate) fn error_message(body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            ["error_description", "msg", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str))
        })
        .map_or_else(|| body.trim().to_string(), str::to_string)
}
