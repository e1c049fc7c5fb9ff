//! Typed records, one variant per category.
//!
//! Rows arrive as loosely shaped JSON objects. They are decoded here, once,
//! into a variant whose fields are known to be usable; rows that cannot be
//! decoded never reach the rest of the system.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::category::Category;
use crate::error::RowError;
use crate::geometry::{Geometry, LatLng};
use crate::ids::{Color, RecordId};
use crate::style::{
    AGENT_SECTOR_FILL, BENEFICIARY_CROWDED, BENEFICIARY_FILL, CROWDED_AGENT_COUNT,
    FIELD_AGENT_FILL, MarkerShape, MarkerStyle, PolygonStyle, Style, TEAM_SECTOR_STROKE,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: RecordId,
    pub location: LatLng,
    pub address: Option<String>,
    /// Number of agents visiting this beneficiary.
    pub agent_count: u32,
    /// Colour of the first visiting agent.
    pub primary_color: Option<Color>,
    /// Colour of the second visiting agent, drawn as the outline.
    pub secondary_color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldAgent {
    pub id: RecordId,
    /// Never empty. Several rows for one agent add positions.
    pub positions: Vec<LatLng>,
    pub color: Option<Color>,
    pub team_id: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSector {
    pub id: RecordId,
    pub area: Geometry,
    pub color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSector {
    pub id: RecordId,
    pub area: Geometry,
    pub name: Option<String>,
    pub color: Option<Color>,
}

/// One fetched row, validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum Record {
    Beneficiary(Beneficiary),
    FieldAgent(FieldAgent),
    AgentSector(AgentSector),
    TeamSector(TeamSector),
}

#[derive(Deserialize)]
struct BeneficiaryRow {
    #[serde(default)]
    id_beneficiaire: Value,
    adresse: Option<String>,
    #[serde(default)]
    geojson: Value,
    n_intervenants: Option<f64>,
    couleur1: Option<String>,
    couleur2: Option<String>,
}

#[derive(Deserialize)]
struct FieldAgentRow {
    #[serde(default)]
    id_intervenant: Value,
    couleur: Option<String>,
    #[serde(default)]
    id_equipe: Value,
    #[serde(default)]
    geojson: Value,
}

#[derive(Deserialize)]
struct AgentSectorRow {
    #[serde(default)]
    id_intervenant: Value,
    couleur: Option<String>,
    #[serde(default)]
    geojson: Value,
}

#[derive(Deserialize)]
struct TeamSectorRow {
    #[serde(default)]
    id_equipe: Value,
    nom_equipe: Option<String>,
    couleur: Option<String>,
    #[serde(default)]
    geojson: Value,
}

impl Record {
    /// Decodes one row of `category`'s remote view.
    pub fn from_row(category: Category, row: &Value) -> Result<Self, RowError> {
        if !row.is_object() {
            return Err(RowError::NotAnObject);
        }
        match category {
            Category::Beneficiaries => {
                let raw = BeneficiaryRow::deserialize(row)?;
                let id = require_id(category, &raw.id_beneficiaire)?;
                let location = require_point(category, &raw.geojson)?;
                Ok(Self::Beneficiary(Beneficiary {
                    id,
                    location,
                    address: non_blank(raw.adresse),
                    agent_count: raw.n_intervenants.map_or(0, |n| n.max(0.0) as u32),
                    primary_color: non_blank(raw.couleur1).map(Color::new),
                    secondary_color: non_blank(raw.couleur2).map(Color::new),
                }))
            }
            Category::FieldAgents => {
                let raw = FieldAgentRow::deserialize(row)?;
                let id = require_id(category, &raw.id_intervenant)?;
                let position = require_point(category, &raw.geojson)?;
                Ok(Self::FieldAgent(FieldAgent {
                    id,
                    positions: vec![position],
                    color: non_blank(raw.couleur).map(Color::new),
                    team_id: RecordId::from_json(&raw.id_equipe),
                }))
            }
            Category::AgentSectors => {
                let raw = AgentSectorRow::deserialize(row)?;
                let id = require_id(category, &raw.id_intervenant)?;
                let area = require_area(category, &raw.geojson)?;
                Ok(Self::AgentSector(AgentSector {
                    id,
                    area,
                    color: non_blank(raw.couleur).map(Color::new),
                }))
            }
            Category::TeamSectors => {
                let raw = TeamSectorRow::deserialize(row)?;
                let id = require_id(category, &raw.id_equipe)?;
                let area = require_area(category, &raw.geojson)?;
                Ok(Self::TeamSector(TeamSector {
                    id,
                    area,
                    name: non_blank(raw.nom_equipe),
                    color: non_blank(raw.couleur).map(Color::new),
                }))
            }
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Self::Beneficiary(_) => Category::Beneficiaries,
            Self::FieldAgent(_) => Category::FieldAgents,
            Self::AgentSector(_) => Category::AgentSectors,
            Self::TeamSector(_) => Category::TeamSectors,
        }
    }

    pub fn id(&self) -> &RecordId {
        match self {
            Self::Beneficiary(r) => &r.id,
            Self::FieldAgent(r) => &r.id,
            Self::AgentSector(r) => &r.id,
            Self::TeamSector(r) => &r.id,
        }
    }

    /// Text shown next to the record's checkbox.
    pub fn label(&self) -> String {
        match self {
            Self::TeamSector(r) => r
                .name
                .clone()
                .unwrap_or_else(|| format!("Team {}", r.id)),
            _ => self.id().to_string(),
        }
    }

    /// Legend swatch colour, defaults applied.
    pub fn color(&self) -> Color {
        match self.style() {
            Style::Marker(marker) => marker.fill,
            Style::Polygon(polygon) => polygon
                .fill
                .or(polygon.stroke)
                .unwrap_or_else(|| Color::new(AGENT_SECTOR_FILL)),
        }
    }

    pub fn geometry(&self) -> Geometry {
        match self {
            Self::Beneficiary(r) => Geometry::Point(r.location),
            Self::FieldAgent(r) => match r.positions.as_slice() {
                [single] => Geometry::Point(*single),
                many => Geometry::MultiPoint(many.to_vec()),
            },
            Self::AgentSector(r) => r.area.clone(),
            Self::TeamSector(r) => r.area.clone(),
        }
    }

    pub fn style(&self) -> Style {
        match self {
            Self::Beneficiary(r) => {
                let mut fill = Color::or_default(
                    r.primary_color.as_ref().map(Color::as_str),
                    BENEFICIARY_FILL,
                );
                let mut stroke = r.secondary_color.clone();
                if r.agent_count > CROWDED_AGENT_COUNT {
                    fill = Color::new(BENEFICIARY_CROWDED);
                    stroke = Some(Color::new(BENEFICIARY_CROWDED));
                }
                Style::Marker(MarkerStyle {
                    shape: MarkerShape::Triangle,
                    fill,
                    fill_opacity: 1.0,
                    stroke_width: if stroke.is_some() { 3.0 } else { 0.0 },
                    stroke,
                    radius: 12.0,
                })
            }
            Self::FieldAgent(r) => Style::Marker(MarkerStyle {
                shape: MarkerShape::Circle,
                fill: Color::or_default(r.color.as_ref().map(Color::as_str), FIELD_AGENT_FILL),
                fill_opacity: 1.0,
                stroke: None,
                stroke_width: 0.0,
                radius: 7.0,
            }),
            Self::AgentSector(r) => Style::Polygon(PolygonStyle {
                fill: Some(Color::or_default(
                    r.color.as_ref().map(Color::as_str),
                    AGENT_SECTOR_FILL,
                )),
                fill_opacity: 0.30,
                stroke: None,
                stroke_weight: 0.0,
                stroke_opacity: 0.0,
            }),
            Self::TeamSector(r) => Style::Polygon(PolygonStyle {
                fill: None,
                fill_opacity: 0.0,
                stroke: Some(Color::or_default(
                    r.color.as_ref().map(Color::as_str),
                    TEAM_SECTOR_STROKE,
                )),
                stroke_weight: 5.0,
                stroke_opacity: 1.0,
            }),
        }
    }

    /// Folds a later row with the same identity into this record.
    ///
    /// Field agents accumulate positions; for the other categories the
    /// later row cannot be folded and `false` is returned.
    pub fn absorb(&mut self, other: &Record) -> bool {
        match (self, other) {
            (Self::FieldAgent(mine), Self::FieldAgent(theirs)) if mine.id == theirs.id => {
                mine.positions.extend(theirs.positions.iter().copied());
                if mine.color.is_none() {
                    mine.color = theirs.color.clone();
                }
                true
            }
            _ => false,
        }
    }
}

fn require_id(category: Category, value: &Value) -> Result<RecordId, RowError> {
    RecordId::from_json(value).ok_or(RowError::MissingId {
        column: category.id_column(),
    })
}

fn require_point(category: Category, value: &Value) -> Result<LatLng, RowError> {
    match Geometry::from_geojson(value)? {
        Geometry::Point(point) => Ok(point),
        other => Err(RowError::UnexpectedGeometry {
            category,
            expected: "Point",
            found: other.kind_name(),
        }),
    }
}

fn require_area(category: Category, value: &Value) -> Result<Geometry, RowError> {
    let geometry = Geometry::from_geojson(value)?;
    if geometry.is_area() {
        Ok(geometry)
    } else {
        Err(RowError::UnexpectedGeometry {
            category,
            expected: "Polygon or MultiPolygon",
            found: geometry.kind_name(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
