//! Drawing styles handed to the rendering surface.

use serde::{Deserialize, Serialize};

use crate::ids::Color;

pub const BENEFICIARY_FILL: &str = "#777";
pub const BENEFICIARY_CROWDED: &str = "#000";
pub const FIELD_AGENT_FILL: &str = "#666";
pub const AGENT_SECTOR_FILL: &str = "#888";
pub const TEAM_SECTOR_STROKE: &str = "#ff22cc";

/// Beneficiaries visited by more than this many agents are drawn in black.
pub const CROWDED_AGENT_COUNT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    Triangle,
    Circle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub fill: Color,
    pub fill_opacity: f32,
    /// `None` draws no outline.
    pub stroke: Option<Color>,
    pub stroke_width: f32,
    /// Radius in pixels for circles, half-size for icons.
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonStyle {
    /// `None` leaves the area unfilled.
    pub fill: Option<Color>,
    pub fill_opacity: f32,
    /// `None` draws no outline.
    pub stroke: Option<Color>,
    pub stroke_weight: f32,
    pub stroke_opacity: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Style {
    Marker(MarkerStyle),
    Polygon(PolygonStyle),
}
