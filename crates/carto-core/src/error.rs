//! Error types for visibility and lifecycle operations.

use carto_model::{Category, RecordId};
use thiserror::Error;

/// Rejected visibility change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    #[error("{category} has no per-record toggles")]
    NotCompound { category: Category },

    #[error("{category} has no record with id {id}")]
    UnknownRecord { category: Category, id: RecordId },
}

impl LayerError {
    pub fn user_message(&self) -> String {
        match self {
            Self::NotCompound { category } => {
                format!("{} can only be shown or hidden as a whole", category.label())
            }
            Self::UnknownRecord { category, id } => {
                format!("No {} entry named '{}' is loaded", category.label(), id)
            }
        }
    }
}

/// Rejected lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("no active session")]
    NotAuthenticated,
}
