use std::time::Duration;

use geo_types::Polygon;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::models::{Coordinate, ServiceRoute, SurfaceCode, SurfaceSegment};

pub const DEFAULT_BASE_URL: &str = "https://api.openrouteservice.org";
pub const DEFAULT_PROFILE: &str = "driving-hgv";

/// openrouteservice error code for "route distance exceeds server limits".
pub const DISTANCE_LIMIT_CODE: i64 = 2004;

/// Abstracts the external directions API.
///
/// Implementations must return the geometry of a single route for the
/// waypoints in order, and report a distance-limit rejection as
/// [`ServiceError::DistanceLimit`] so the caller can escalate.
pub trait RoutingService: Send + Sync {
    fn directions(&self, request: &DirectionsRequest) -> Result<ServiceRoute, ServiceError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restrictions {
    pub avoid_polygon: Option<Polygon<f64>>,
    pub avoid_ferries: bool,
}

impl Restrictions {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.avoid_polygon.is_none() && !self.avoid_ferries
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsRequest {
    pub waypoints: Vec<Coordinate>,
    pub restrictions: Restrictions,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("distance limit exceeded: {message}")]
    DistanceLimit { message: String },
    #[error("service returned HTTP {status}{}: {message}", .code.map(|c| format!(" (code {c})")).unwrap_or_default())]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("response contained no route")]
    EmptyRoute,
}

impl ServiceError {
    pub fn is_distance_limit(&self) -> bool {
        matches!(self, Self::DistanceLimit { .. })
    }
}

/// Production [`RoutingService`] backed by the openrouteservice directions API.
pub struct OrsClient {
    http: Client,
    base_url: String,
    api_key: String,
    profile: String,
}

impl OrsClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        profile: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            profile: profile.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v2/directions/{}/geojson", self.base_url, self.profile)
    }
}

impl RoutingService for OrsClient {
    fn directions(&self, request: &DirectionsRequest) -> Result<ServiceRoute, ServiceError> {
        let body = request_body(request);
        tracing::debug!(
            waypoints = request.waypoints.len(),
            polygon = request.restrictions.avoid_polygon.is_some(),
            ferries = request.restrictions.avoid_ferries,
            "requesting directions"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("Authorization", &self.api_key)
            .header("Accept", "application/geo+json, application/json")
            .json(&body)
            .send()?;
        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            let err = parse_error(status.as_u16(), &text);
            tracing::warn!(status = status.as_u16(), "directions request rejected: {err}");
            return Err(err);
        }

        parse_route(&text)
    }
}

/// JSON body for `POST /v2/directions/{profile}/geojson`.
pub fn request_body(request: &DirectionsRequest) -> Value {
    let coordinates: Vec<[f64; 2]> = request
        .waypoints
        .iter()
        .map(|point| [point.lon, point.lat])
        .collect();

    let mut body = json!({
        "coordinates": coordinates,
        "extra_info": ["surface"],
    });

    let mut options = Map::new();
    if let Some(polygon) = &request.restrictions.avoid_polygon {
        options.insert("avoid_polygons".into(), polygon_to_geojson(polygon));
    }
    if request.restrictions.avoid_ferries {
        options.insert("avoid_features".into(), json!(["ferries"]));
    }
    if !options.is_empty() {
        body["options"] = Value::Object(options);
    }
    body
}

fn polygon_to_geojson(polygon: &Polygon<f64>) -> Value {
    let ring: Vec<[f64; 2]> = polygon
        .exterior()
        .coords()
        .map(|coord| [coord.x, coord.y])
        .collect();
    json!({ "type": "Polygon", "coordinates": [ring] })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Structured {
        code: Option<i64>,
        #[serde(default)]
        message: Option<String>,
    },
    Text(String),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Maps an error response onto [`ServiceError`], singling out the distance limit.
pub fn parse_error(status: u16, body: &str) -> ServiceError {
    let (code, message) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            error: ErrorDetail::Structured { code, message },
        }) => (code, message.unwrap_or_else(|| body.to_string())),
        Ok(ErrorBody {
            error: ErrorDetail::Text(message),
        }) => (None, message),
        Err(_) => (None, body.trim().to_string()),
    };

    if code == Some(DISTANCE_LIMIT_CODE) {
        ServiceError::DistanceLimit { message }
    } else {
        ServiceError::Api {
            status,
            code,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
    #[serde(default)]
    bbox: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: LineGeometry,
    #[serde(default)]
    properties: FeatureProperties,
    #[serde(default)]
    bbox: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct LineGeometry {
    coordinates: Vec<Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct FeatureProperties {
    #[serde(default)]
    extras: Extras,
}

#[derive(Debug, Default, Deserialize)]
struct Extras {
    surface: Option<SurfaceExtra>,
}

#[derive(Debug, Deserialize)]
struct SurfaceExtra {
    #[serde(default)]
    values: Vec<(usize, usize, SurfaceCode)>,
    #[serde(default)]
    summary: Vec<SurfaceSummary>,
}

#[derive(Debug, Deserialize)]
struct SurfaceSummary {
    value: SurfaceCode,
    #[serde(default)]
    name: Option<String>,
}

/// Parses a successful GeoJSON directions response.
pub fn parse_route(body: &str) -> Result<ServiceRoute, ServiceError> {
    let collection: FeatureCollection = serde_json::from_str(body)?;
    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or(ServiceError::EmptyRoute)?;

    let geometry: Vec<Coordinate> = feature
        .geometry
        .coordinates
        .iter()
        .filter(|vertex| vertex.len() >= 2)
        .map(|vertex| Coordinate {
            lat: vertex[1],
            lon: vertex[0],
        })
        .collect();
    if geometry.is_empty() {
        return Err(ServiceError::EmptyRoute);
    }

    let (surface_segments, surface_names) = match feature.properties.extras.surface {
        Some(extra) => {
            let segments = extra
                .values
                .into_iter()
                .map(|(start, end, code)| SurfaceSegment { start, end, code })
                .collect();
            let names = extra
                .summary
                .into_iter()
                .filter_map(|entry| Some((entry.value.numeric()?, entry.name?)))
                .collect();
            (segments, names)
        }
        None => (Vec::new(), Vec::new()),
    };

    Ok(ServiceRoute {
        geometry,
        surface_segments,
        surface_names,
        bbox: collection.bbox.or(feature.bbox),
    })
}

#[cfg(test)]
mod tests {
    use geo_types::LineString;

    use super::*;

    fn waypoints() -> Vec<Coordinate> {
        vec![
            Coordinate {
                lat: -19.5724,
                lon: -57.0289,
            },
            Coordinate {
                lat: -20.5085,
                lon: -54.6549,
            },
        ]
    }

    #[test]
    fn body_uses_lon_lat_order_and_requests_surface() {
        let body = request_body(&DirectionsRequest {
            waypoints: waypoints(),
            restrictions: Restrictions::none(),
        });
        assert_eq!(body["coordinates"][0][0], json!(-57.0289));
        assert_eq!(body["coordinates"][0][1], json!(-19.5724));
        assert_eq!(body["extra_info"], json!(["surface"]));
        assert!(body.get("options").is_none());
    }

    #[test]
    fn body_carries_polygon_and_ferries() {
        let polygon = Polygon::new(
            LineString::from(vec![(-57.0, -19.0), (-56.0, -19.0), (-56.0, -20.0)]),
            vec![],
        );
        let body = request_body(&DirectionsRequest {
            waypoints: waypoints(),
            restrictions: Restrictions {
                avoid_polygon: Some(polygon),
                avoid_ferries: true,
            },
        });
        let options = &body["options"];
        assert_eq!(options["avoid_features"], json!(["ferries"]));
        assert_eq!(options["avoid_polygons"]["type"], json!("Polygon"));
        let ring = options["avoid_polygons"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.len(), 4);
    }

    #[test]
    fn distance_limit_is_recognised() {
        let body = r#"{"error":{"code":2004,"message":"Request parameters exceed the server configuration limits."},"info":{}}"#;
        let err = parse_error(400, body);
        assert!(err.is_distance_limit());
        assert!(err.to_string().contains("exceed"));
    }

    #[test]
    fn other_errors_are_opaque() {
        let err = parse_error(403, r#"{"error":"Access to this API has been disallowed"}"#);
        assert!(!err.is_distance_limit());
        assert!(err.to_string().contains("disallowed"));

        let err = parse_error(500, "upstream exploded");
        match err {
            ServiceError::Api { status, code, message } => {
                assert_eq!(status, 500);
                assert_eq!(code, None);
                assert_eq!(message, "upstream exploded");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = parse_error(
            404,
            r#"{"error":{"code":2010,"message":"Could not find routable point"}}"#,
        );
        assert!(matches!(err, ServiceError::Api { code: Some(2010), .. }));
    }

    #[test]
    fn parses_geojson_route() {
        let body = r#"{
            "type": "FeatureCollection",
            "bbox": [-57.03, -20.51, -54.65, -19.57],
            "features": [{
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[-57.0289, -19.5724], [-56.0, -20.0], [-54.6549, -20.5085]]},
                "properties": {
                    "extras": {"surface": {
                        "values": [[0, 1, 3], [1, 2, 11]],
                        "summary": [{"value": 3, "distance": 100.0, "amount": 50.0}, {"value": 11, "name": "Terra", "distance": 1.0, "amount": 50.0}]
                    }}
                }
            }]
        }"#;
        let route = parse_route(body).unwrap();
        assert_eq!(route.geometry.len(), 3);
        assert_eq!(route.geometry[0].lat, -19.5724);
        assert_eq!(route.geometry[0].lon, -57.0289);
        assert_eq!(
            route.surface_segments[1],
            SurfaceSegment {
                start: 1,
                end: 2,
                code: SurfaceCode::Numeric(11)
            }
        );
        assert_eq!(route.surface_names, vec![(11, "Terra".to_string())]);
        assert_eq!(route.bbox.unwrap().len(), 4);
    }

    #[test]
    fn route_without_features_is_empty() {
        let err = parse_route(r#"{"type":"FeatureCollection","features":[]}"#).unwrap_err();
        assert!(matches!(err, ServiceError::EmptyRoute));
    }

    #[test]
    fn route_without_extras_has_no_segments() {
        let body = r#"{"features":[{"geometry":{"coordinates":[[1.0,2.0,300.0],[1.1,2.1,310.0]]}}]}"#;
        let route = parse_route(body).unwrap();
        assert_eq!(route.geometry.len(), 2);
        assert!(route.surface_segments.is_empty());
    }
}
