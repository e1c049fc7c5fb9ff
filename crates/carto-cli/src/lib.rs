//! Library side of the `carto` command-line tool.

pub mod logging;
pub mod report;
pub mod types;
