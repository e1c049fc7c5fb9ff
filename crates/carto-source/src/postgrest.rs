//! Reading the map views through Supabase's PostgREST endpoint.

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use carto_core::{DataSource, FetchError};
use carto_model::{TableQuery, json_kind};
use reqwest::Url;
use serde_json::Value;

use crate::config::SupabaseConfig;
use crate::error::{Result, SourceError};
use crate::http;

/// Row source backed by `GET /rest/v1/<view>?select=<columns>`.
///
/// Requests are made with the anonymous key until a user access token is
/// installed with [`set_access_token`](Self::set_access_token).
#[derive(Debug)]
pub struct PostgrestSource {
    client: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl PostgrestSource {
    pub fn new(config: &SupabaseConfig) -> Result<Self> {
        Ok(Self {
            client: http::client(config)?,
            base_url: config.base_url().to_string(),
            anon_key: config.anon_key.trim().to_string(),
            access_token: RwLock::new(None),
        })
    }

    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.anon_key.clone())
    }

    pub fn table_url(&self, query: &TableQuery) -> Result<Url> {
        Url::parse_with_params(
            &format!("{}/rest/v1/{}", self.base_url, query.table),
            &[("select", query.select_clause())],
        )
        .map_err(|e| SourceError::InvalidConfig(format!("invalid project URL: {e}")))
    }

    async fn get_rows(&self, query: TableQuery) -> std::result::Result<Vec<Value>, FetchError> {
        let url = self
            .table_url(&query)
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;
        tracing::debug!(%url, table = query.table, "fetching rows");

        let response = self
            .client
            .get(url)
            .bearer_auth(self.bearer())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: http::error_message(&body),
            });
        }

        match response.json::<Value>().await {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(other) => Err(FetchError::Payload(format!(
                "expected a JSON array from {}, got {}",
                query.table,
                json_kind(&other)
            ))),
            Err(e) => Err(FetchError::Payload(e.to_string())),
        }
    }
}

impl DataSource for PostgrestSource {
    fn fetch(
        &self,
        query: TableQuery,
    ) -> impl Future<Output = std::result::Result<Vec<Value>, FetchError>> + Send {
        self.get_rows(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carto_model::Category;

    fn source() -> PostgrestSource {
        PostgrestSource::new(&SupabaseConfig {
            url: "https://abcd.supabase.co/".to_string(),
            anon_key: "anon-key".to_string(),
            ..SupabaseConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_table_url_selects_columns() {
        let url = source().table_url(&Category::FieldAgents.query()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://abcd.supabase.co/rest/v1/vw_intervenants_geo?select=id_intervenant%2Ccouleur%2Cid_equipe%2Cgeojson"
        );
    }

    #[test]
    fn test_bearer_switches_to_access_token() {
        let source = source();
        assert_eq!(source.bearer(), "anon-key");
        source.set_access_token(Some("user-token".to_string()));
        assert!(source.has_access_token());
        assert_eq!(source.bearer(), "user-token");
        source.set_access_token(None);
        assert_eq!(source.bearer(), "anon-key");
    }
}
