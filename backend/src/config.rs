use std::{
    env,
    fs::File,
    io::{self, Read},
    net::SocketAddr,
    path::{Path, PathBuf},
};

use geo_types::{LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::cost::CostModel;
use crate::models::Coordinate;
use crate::ors::{DEFAULT_BASE_URL, DEFAULT_PROFILE};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ORS_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid listen address '{0}'")]
    InvalidAddr(String),
    #[error("failed to read pipeline config: {0}")]
    Io(#[from] io::Error),
    #[error("invalid pipeline config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("restricted zone needs at least 3 distinct lon/lat points inside valid ranges")]
    InvalidZone,
    #[error("bypass point {lat},{lon} is out of range")]
    InvalidBypass { lat: f64, lon: f64 },
}

/// Process-level settings. The routing credential is only ever read from
/// the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub listen_addr: String,
    pub config_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("ORS_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            base_url: env::var("ORS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            listen_addr: env::var("ROUTECOST_ADDR")
                .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string()),
            config_path: env::var("ROUTECOST_CONFIG").ok().map(PathBuf::from),
        }
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddr(self.listen_addr.clone()))
    }

    /// Pipeline config from `config_path`, or defaults when unset.
    pub fn pipeline(&self) -> Result<PipelineConfig, ConfigError> {
        match &self.config_path {
            Some(path) => PipelineConfig::from_file(path),
            None => Ok(PipelineConfig::default()),
        }
    }
}

/// Switches between the historical variants of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub restriction_polygon: bool,
    pub bypass_escalation: bool,
    pub load_grouping: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            restriction_polygon: true,
            bypass_escalation: true,
            load_grouping: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BypassPoint {
    pub label: String,
    pub lat: f64,
    pub lon: f64,
}

impl BypassPoint {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

impl Default for BypassPoint {
    fn default() -> Self {
        Self {
            label: "Ponte BR-262".to_string(),
            lat: -19.4577,
            lon: -57.4294,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub features: FeatureFlags,
    /// Exterior ring of the avoidance polygon as `[lon, lat]` pairs.
    pub restricted_zone: Option<Vec<[f64; 2]>>,
    pub bypass: BypassPoint,
    pub round_trip_threshold_km: f64,
    pub bypass_detection_radius_km: f64,
    pub cost: CostModel,
    pub profile: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            features: FeatureFlags::default(),
            restricted_zone: None,
            bypass: BypassPoint::default(),
            round_trip_threshold_km: 10.0,
            bypass_detection_radius_km: 2.0,
            cost: CostModel::default(),
            profile: DEFAULT_PROFILE.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.avoid_polygon()?;
        let bypass = self.bypass.coordinate();
        if bypass.lat.abs() > 90.0 || bypass.lon.abs() > 180.0 {
            return Err(ConfigError::InvalidBypass {
                lat: bypass.lat,
                lon: bypass.lon,
            });
        }
        Ok(())
    }

    /// The avoidance polygon, when the feature is on and a zone is configured.
    pub fn avoid_polygon(&self) -> Result<Option<Polygon<f64>>, ConfigError> {
        if !self.features.restriction_polygon {
            return Ok(None);
        }
        let Some(ring) = &self.restricted_zone else {
            return Ok(None);
        };

        let mut distinct: Vec<[f64; 2]> = Vec::with_capacity(ring.len());
        for point in ring {
            if point[0].abs() > 180.0 || point[1].abs() > 90.0 {
                return Err(ConfigError::InvalidZone);
            }
            if !distinct.contains(point) {
                distinct.push(*point);
            }
        }
        if distinct.len() < 3 {
            return Err(ConfigError::InvalidZone);
        }

        let exterior: LineString<f64> = ring.iter().map(|p| (p[0], p[1])).collect();
        Ok(Some(Polygon::new(exterior, vec![])))
    }
}
