use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn interpolate(self, other: Self, t: f64) -> Self {
        Self {
            lat: self.lat + (other.lat - self.lat) * t,
            lon: self.lon + (other.lon - self.lon) * t,
        }
    }

    /// Rounds both axes to `decimals` places.
    pub fn rounded(self, decimals: i32) -> Self {
        let factor = 10f64.powi(decimals);
        Self {
            lat: (self.lat * factor).round() / factor,
            lon: (self.lon * factor).round() / factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceClass {
    Paved,
    Unpaved,
}

/// How the routing service was finally persuaded to return a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStrategy {
    Primary,
    Bypass,
    PolygonRelaxed,
    Unrestricted,
}

/// One input row of a batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_id: Option<String>,
    #[serde(default)]
    pub coordinates: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub rows: Vec<BatchRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// Tag exactly as the routing service reported it.
    pub tag: String,
    pub surface: String,
    pub class: SurfaceClass,
    pub distance_m: f64,
    pub start: Coordinate,
    pub end: Coordinate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub paved_km: f64,
    pub unpaved_km: f64,
    pub manual_km: f64,
    pub paved_cost_km: f64,
    pub unpaved_cost_km: f64,
    pub distance_km: f64,
    pub total_km: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub paved_km: f64,
    pub unpaved_km: f64,
    pub manual_km: f64,
    pub total_km: f64,
    pub by_surface: BTreeMap<String, f64>,
    pub segments: Vec<SegmentRecord>,
    pub waypoints: Vec<Coordinate>,
    pub map_link: String,
    pub strategy: RouteStrategy,
    pub cost: CostBreakdown,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    Routed(Box<RouteResult>),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadEntry {
    pub load_id: String,
    pub result: LoadOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub loads: Vec<LoadEntry>,
}

impl BatchReport {
    pub fn get(&self, load_id: &str) -> Option<&LoadOutcome> {
        self.loads
            .iter()
            .find(|entry| entry.load_id == load_id)
            .map(|entry| &entry.result)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
