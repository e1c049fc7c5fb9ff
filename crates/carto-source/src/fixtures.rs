//! Rows read from JSON files, one per view.

use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use carto_core::{DataSource, FetchError};
use carto_model::{TableQuery, json_kind};
use serde_json::Value;

/// Serves `<dir>/<view>.json`, each holding a JSON array of rows.
///
/// A missing file is reported as an unavailable source, the same way a
/// missing view would fail remotely.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    dir: PathBuf,
}

impl FixtureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, query: &TableQuery) -> PathBuf {
        self.dir.join(format!("{}.json", query.table))
    }

    async fn read_rows(&self, query: TableQuery) -> Result<Vec<Value>, FetchError> {
        let path = self.path_for(&query);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FetchError::Unavailable(format!(
                    "no fixture at {}",
                    path.display()
                )));
            }
            Err(e) => return Err(FetchError::Network(format!("{}: {e}", path.display()))),
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(rows)) => Ok(rows),
            Ok(other) => Err(FetchError::Payload(format!(
                "{} holds {}, expected an array",
                path.display(),
                json_kind(&other)
            ))),
            Err(e) => Err(FetchError::Payload(format!("{}: {e}", path.display()))),
        }
    }
}

impl DataSource for FixtureSource {
    fn fetch(
        &self,
        query: TableQuery,
    ) -> impl Future<Output = Result<Vec<Value>, FetchError>> + Send {
        self.read_rows(query)
    }
}
