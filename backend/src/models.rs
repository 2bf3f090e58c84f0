use std::fmt;

use serde::{Deserialize, Serialize};

pub use shared::{
    ApiError, BatchReport, BatchRequest, BatchRow, Coordinate, CostBreakdown, LoadEntry,
    LoadOutcome, RouteResult, RouteStrategy, SegmentRecord, SurfaceClass,
};

/// Surface tag as sent by the routing service: usually a numeric code,
/// occasionally a free string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SurfaceCode {
    Numeric(i64),
    Tag(String),
}

impl SurfaceCode {
    pub fn numeric(&self) -> Option<i64> {
        match self {
            Self::Numeric(value) => Some(*value),
            Self::Tag(tag) => tag.trim().parse().ok(),
        }
    }
}

impl fmt::Display for SurfaceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value}"),
            Self::Tag(tag) => f.write_str(tag),
        }
    }
}

/// Contiguous slice `[start, end]` of the route geometry with one surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSegment {
    pub start: usize,
    pub end: usize,
    pub code: SurfaceCode,
}

/// Route as returned by the routing service, already converted to
/// latitude/longitude order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceRoute {
    pub geometry: Vec<Coordinate>,
    pub surface_segments: Vec<SurfaceSegment>,
    /// Per-response code → name entries from the service summary.
    pub surface_names: Vec<(i64, String)>,
    pub bbox: Option<Vec<f64>>,
}
