#![allow(dead_code)]

use std::sync::Mutex;

use routecost::{
    models::{Coordinate, ServiceRoute, SurfaceCode, SurfaceSegment},
    ors::{DirectionsRequest, RoutingService, ServiceError},
};

type Responder =
    Box<dyn Fn(&DirectionsRequest) -> Result<ServiceRoute, ServiceError> + Send + Sync>;

/// Routing service double that answers from a closure and records requests.
pub struct MockService {
    responder: Responder,
    calls: Mutex<Vec<DirectionsRequest>>,
}

impl MockService {
    pub fn new(
        responder: impl Fn(&DirectionsRequest) -> Result<ServiceRoute, ServiceError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Answers every request with the same route.
    pub fn fixed(route: ServiceRoute) -> Self {
        Self::new(move |_| Ok(route.clone()))
    }

    pub fn calls(&self) -> Vec<DirectionsRequest> {
        self.calls.lock().unwrap().clone()
    }
}

impl RoutingService for MockService {
    fn directions(&self, request: &DirectionsRequest) -> Result<ServiceRoute, ServiceError> {
        self.calls.lock().unwrap().push(request.clone());
        (self.responder)(request)
    }
}

/// Two-vertex route along the equator whose geodesic length is `km`.
pub fn equator_route(km: f64, code: i64) -> ServiceRoute {
    let lon = (km * 1000.0 / 6_378_137.0).to_degrees();
    ServiceRoute {
        geometry: vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, lon)],
        surface_segments: vec![SurfaceSegment {
            start: 0,
            end: 1,
            code: SurfaceCode::Numeric(code),
        }],
        ..ServiceRoute::default()
    }
}

/// Straight route through the requested waypoints, 10 vertices per leg,
/// surfaced entirely with `code`.
pub fn straight_route(request: &DirectionsRequest, code: i64) -> ServiceRoute {
    let mut geometry = Vec::new();
    for pair in request.waypoints.windows(2) {
        for step in 0..10 {
            geometry.push(pair[0].interpolate(pair[1], step as f64 / 10.0));
        }
    }
    if let Some(last) = request.waypoints.last() {
        geometry.push(*last);
    }
    let end = geometry.len().saturating_sub(1);
    ServiceRoute {
        geometry,
        surface_segments: vec![SurfaceSegment {
            start: 0,
            end,
            code: SurfaceCode::Numeric(code),
        }],
        ..ServiceRoute::default()
    }
}

pub fn distance_limit() -> ServiceError {
    ServiceError::DistanceLimit {
        message: "Request parameters exceed the server configuration limits.".to_string(),
    }
}
