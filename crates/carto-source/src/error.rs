//! Error types for configuration and remote access.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SourceError {
    #[error("failed to read {path}: {message}")]
    ConfigRead { path: PathBuf, message: String },

    #[error("failed to parse {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("network error: {0}")]
    Network(String),

    /// The auth endpoint rejected the credentials.
    #[error("sign-in rejected: {0}")]
    Auth(String),

    #[error("remote returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Payload(String),
}

impl SourceError {
    /// Returns a short message suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::ConfigRead { .. } => "The configuration file could not be read.",
            Self::ConfigParse { .. } => "The configuration file is not valid TOML.",
            Self::InvalidConfig(_) => "The data source is not configured.",
            Self::Network(_) => "Could not reach the data server.",
            Self::Auth(_) => "Sign-in failed.",
            Self::Status { .. } | Self::Payload(_) => "The data server returned an error.",
        }
    }

    /// Returns a hint for fixing the problem, if there is one.
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ConfigRead { .. } => Some("Check the path passed with --config."),
            Self::ConfigParse { .. } => {
                Some("Compare the file with the output of `carto config --example`.")
            }
            Self::InvalidConfig(_) => Some(
                "Set [supabase] url and anon_key, or CARTO_SUPABASE_URL and CARTO_SUPABASE_ANON_KEY.",
            ),
            Self::Network(_) => Some("Check your internet connection and the project URL."),
            Self::Auth(_) => Some("Check the e-mail address and password."),
            Self::Status { .. } | Self::Payload(_) => None,
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
