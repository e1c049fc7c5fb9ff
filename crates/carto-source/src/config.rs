//! Application configuration.
//!
//! Read from `config.toml` in the platform config directory unless a path
//! is given explicitly:
//! - macOS: ~/Library/Application Support/org.carto.Carto Layers/
//! - Windows: %APPDATA%/Carto Layers/config/
//! - Linux: ~/.config/carto-layers/
//!
//! `CARTO_SUPABASE_*` environment variables override file values.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SourceError};

const APP_QUALIFIER: &str = "org";
const APP_ORG: &str = "carto";
const APP_NAME: &str = "Carto Layers";
const CONFIG_FILENAME: &str = "config.toml";

pub const DEFAULT_SCHEMA: &str = "projet_carto_amelie";
pub const DEFAULT_CENTER: [f64; 2] = [50.969, 2.436];
pub const DEFAULT_ZOOM: u8 = 13;
const MAX_ZOOM: u8 = 22;

pub const ENV_URL: &str = "CARTO_SUPABASE_URL";
pub const ENV_ANON_KEY: &str = "CARTO_SUPABASE_ANON_KEY";
pub const ENV_SCHEMA: &str = "CARTO_SUPABASE_SCHEMA";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub supabase: SupabaseConfig,
    pub map: MapConfig,
}

/// Connection settings for the Supabase project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    pub url: String,
    /// Public anonymous key. Row-level security applies on top of it.
    pub anon_key: String,
    /// Database schema holding the map views.
    pub schema: String,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            anon_key: String::new(),
            schema: DEFAULT_SCHEMA.to_string(),
        }
    }
}

impl SupabaseConfig {
    /// The project URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.url.trim().trim_end_matches('/')
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url();
        if url.is_empty() {
            return Err(SourceError::InvalidConfig("supabase.url is not set".to_string()));
        }
        if !url.starts_with("https://") || !url.contains(".supabase.co") {
            return Err(SourceError::InvalidConfig(format!(
                "supabase.url must be an https://<project>.supabase.co address, got '{url}'"
            )));
        }
        if self.anon_key.trim().is_empty() {
            return Err(SourceError::InvalidConfig(
                "supabase.anon_key is not set".to_string(),
            ));
        }
        if self.schema.trim().is_empty() {
            return Err(SourceError::InvalidConfig("supabase.schema is empty".to_string()));
        }
        Ok(())
    }
}

/// Initial map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// `[lat, lon]`.
    pub center: [f64; 2],
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

impl MapConfig {
    /// Replaces out-of-range values with the defaults.
    pub fn normalized(&self) -> Self {
        let [lat, lon] = self.center;
        let center = if lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon)
        {
            self.center
        } else {
            DEFAULT_CENTER
        };
        let zoom = if self.zoom <= MAX_ZOOM {
            self.zoom
        } else {
            DEFAULT_ZOOM
        };
        Self { center, zoom }
    }
}

impl AppConfig {
    /// Default location of the configuration file.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
            .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. The default path may be missing, in
    /// which case defaults are returned.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from(path);
        }
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            Some(path) => {
                tracing::debug!(path = %path.display(), "no configuration file, using defaults");
                Ok(Self::default())
            }
            None => {
                tracing::warn!("configuration directory unknown, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SourceError::ConfigRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| SourceError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Applies environment overrides read through `lookup`. Returns the
    /// names of the variables that were applied.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<&'static str> {
        let mut applied = Vec::new();
        let targets: [(&'static str, &mut String); 3] = [
            (ENV_URL, &mut self.supabase.url),
            (ENV_ANON_KEY, &mut self.supabase.anon_key),
            (ENV_SCHEMA, &mut self.supabase.schema),
        ];
        for (name, target) in targets {
            if let Some(value) = lookup(name).filter(|v| !v.trim().is_empty()) {
                *target = value.trim().to_string();
                applied.push(name);
            }
        }
        applied
    }

    /// Applies overrides from the process environment.
    pub fn apply_process_env(&mut self) -> Vec<&'static str> {
        self.apply_env(|name| std::env::var(name).ok())
    }

    pub fn validate(&self) -> Result<()> {
        self.supabase.validate()
    }

    /// A copy safe to print: the anonymous key is masked.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.supabase.anon_key.is_empty() {
            let tail: String = copy
                .supabase
                .anon_key
                .chars()
                .rev()
                .take(4)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            copy.supabase.anon_key = format!("****{tail}");
        }
        copy
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SourceError::InvalidConfig(e.to_string()))
    }

    /// A commented starting point for a configuration file.
    pub fn example() -> &'static str {
        concat!(
            "[supabase]\n",
            "url = \"https://your-project.supabase.co\"\n",
            "anon_key = \"your-anon-key\"\n",
            "schema = \"projet_carto_amelie\"\n",
            "\n",
            "[map]\n",
            "# [lat, lon]\n",
            "center = [50.969, 2.436]\n",
            "zoom = 13\n",
        )
    }
}
