//! Data model for the map layers.
//!
//! - [`Category`]: the closed set of record kinds and their remote queries
//! - [`Record`]: a validated row, one variant per category
//! - [`RecordSet`]: the decoded result of one fetch, with skipped rows
//! - [`Geometry`] / [`Style`]: what the rendering surface is asked to draw

pub mod category;
pub mod error;
pub mod geometry;
pub mod ids;
pub mod record;
pub mod rows;
pub mod style;

pub use category::{Category, CategoryKind, RenderStrategy, TableQuery};
pub use error::{GeometryError, ModelError, RowError};
pub use geometry::{Geometry, LatLng, Ring, json_kind};
pub use ids::{Color, RecordId};
pub use record::{AgentSector, Beneficiary, FieldAgent, Record, TeamSector};
pub use rows::{RecordSet, SkippedRow};
pub use style::{MarkerShape, MarkerStyle, PolygonStyle, Style};
