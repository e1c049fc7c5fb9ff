//! The closed set of record categories shown on the map.
//!
//! Every category knows which remote view it is read from, how its records
//! are drawn, and whether the layer panel offers per-record checkboxes for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

/// A kind of geo-located record.
///
/// The declaration order is the layer panel order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// People receiving visits. Drawn as triangles, master toggle only.
    Beneficiaries,
    /// Field agents. Drawn as circles, one checkbox per agent.
    FieldAgents,
    /// Area covered by each agent. Filled polygons, one checkbox per agent.
    AgentSectors,
    /// Area covered by each team. Outlined polygons, one checkbox per team.
    TeamSectors,
}

/// Whether a category tracks per-record overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    /// Master toggle only.
    Simple,
    /// Master toggle plus per-record overrides.
    Compound,
}

/// How the records of a category are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    PointMarker,
    AreaPolygon,
}

impl RenderStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PointMarker => "point marker",
            Self::AreaPolygon => "area polygon",
        }
    }
}

/// One read query against the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableQuery {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

impl TableQuery {
    /// Columns joined the way a `select=` parameter expects them.
    pub fn select_clause(&self) -> String {
        self.columns.join(",")
    }
}

impl Category {
    /// All categories, in panel order.
    pub const ALL: [Category; 4] = [
        Category::Beneficiaries,
        Category::FieldAgents,
        Category::AgentSectors,
        Category::TeamSectors,
    ];

    /// Position in [`Category::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable key used in configuration, logs and command-line arguments.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Beneficiaries => "beneficiaries",
            Self::FieldAgents => "field_agents",
            Self::AgentSectors => "agent_sectors",
            Self::TeamSectors => "team_sectors",
        }
    }

    /// Human-readable panel label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Beneficiaries => "Beneficiaries",
            Self::FieldAgents => "Field agents",
            Self::AgentSectors => "Agent sectors",
            Self::TeamSectors => "Team sectors",
        }
    }

    pub fn kind(&self) -> CategoryKind {
        match self {
            Self::Beneficiaries => CategoryKind::Simple,
            Self::FieldAgents | Self::AgentSectors | Self::TeamSectors => CategoryKind::Compound,
        }
    }

    pub fn is_compound(&self) -> bool {
        self.kind() == CategoryKind::Compound
    }

    pub fn render_strategy(&self) -> RenderStrategy {
        match self {
            Self::Beneficiaries | Self::FieldAgents => RenderStrategy::PointMarker,
            Self::AgentSectors | Self::TeamSectors => RenderStrategy::AreaPolygon,
        }
    }

    /// The remote view and columns this category is read from.
    pub fn query(&self) -> TableQuery {
        match self {
            Self::Beneficiaries => TableQuery {
                table: "vw_beneficiaires_geo",
                columns: &[
                    "id_beneficiaire",
                    "adresse",
                    "geojson",
                    "n_intervenants",
                    "couleur1",
                    "couleur2",
                ],
            },
            Self::FieldAgents => TableQuery {
                table: "vw_intervenants_geo",
                columns: &["id_intervenant", "couleur", "id_equipe", "geojson"],
            },
            Self::AgentSectors => TableQuery {
                table: "vw_secteur_intervenant_geo",
                columns: &["id_intervenant", "couleur", "geojson"],
            },
            Self::TeamSectors => TableQuery {
                table: "vw_secteur_equipe_geo",
                columns: &["id_equipe", "nom_equipe", "couleur", "geojson"],
            },
        }
    }

    /// Column holding the record identity.
    pub fn id_column(&self) -> &'static str {
        match self {
            Self::Beneficiaries => "id_beneficiaire",
            Self::FieldAgents | Self::AgentSectors => "id_intervenant",
            Self::TeamSectors => "id_equipe",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    /// Accepts the stable key, the remote view name, or the legacy dashboard
    /// key (case-insensitive, `-` and `_` interchangeable).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "beneficiaries" | "beneficiaires" | "vw_beneficiaires_geo" => Ok(Self::Beneficiaries),
            "field_agents" | "agents" | "intervenants" | "vw_intervenants_geo" => {
                Ok(Self::FieldAgents)
            }
            "agent_sectors" | "secteurs_intervenant" | "vw_secteur_intervenant_geo" => {
                Ok(Self::AgentSectors)
            }
            "team_sectors" | "secteurs_equipe" | "vw_secteur_equipe_geo" => {
                Ok(Self::TeamSectors)
            }
            _ => Err(ModelError::UnknownCategory(s.to_string())),
        }
    }
}
