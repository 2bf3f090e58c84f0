use geo_types::Polygon;

use crate::{
    config::{ConfigError, PipelineConfig},
    error::LoadError,
    geodesy::{geodesic_m, nearest_vertex},
    models::{Coordinate, RouteStrategy, ServiceRoute},
    ors::{DirectionsRequest, Restrictions, RoutingService, ServiceError},
};

/// A successful routing outcome for one load.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedLoad {
    pub route: ServiceRoute,
    /// Waypoints the route actually follows, bypass included when used or
    /// passed through.
    pub waypoints: Vec<Coordinate>,
    pub strategy: RouteStrategy,
    pub warning: Option<String>,
}

/// Routes loads around the restricted zone.
///
/// openrouteservice caps the route length it computes with avoid areas, so a
/// distance-limit rejection of the primary request (polygon + no ferries)
/// escalates to the forced bypass, then the polygon-relaxed request, then no
/// options at all. Every fallback carries an advisory.
pub struct RestrictedZoneRouter<'a> {
    service: &'a dyn RoutingService,
    config: &'a PipelineConfig,
    avoid_polygon: Option<Polygon<f64>>,
}

impl<'a> RestrictedZoneRouter<'a> {
    pub fn new(
        service: &'a dyn RoutingService,
        config: &'a PipelineConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            service,
            config,
            avoid_polygon: config.avoid_polygon()?,
        })
    }

    pub fn route(&self, waypoints: &[Coordinate]) -> Result<RoutedLoad, LoadError> {
        let primary = Restrictions {
            avoid_polygon: self.avoid_polygon.clone(),
            avoid_ferries: true,
        };

        let routed = match self.request(waypoints, primary) {
            Ok(route) => RoutedLoad {
                route,
                waypoints: waypoints.to_vec(),
                strategy: RouteStrategy::Primary,
                warning: None,
            },
            Err(err) if err.is_distance_limit() => {
                tracing::warn!("primary request hit the distance limit, escalating: {err}");
                self.escalate(waypoints)?
            }
            Err(err) => return Err(err.into()),
        };

        let waypoints = self.align_with_bypass(&routed.route.geometry, routed.waypoints);
        tracing::info!(
            strategy = ?routed.strategy,
            vertices = routed.route.geometry.len(),
            waypoints = waypoints.len(),
            "route acquired"
        );
        Ok(RoutedLoad {
            waypoints,
            ..routed
        })
    }

    fn escalate(&self, waypoints: &[Coordinate]) -> Result<RoutedLoad, ServiceError> {
        if self.config.features.bypass_escalation {
            if let Some(bypassed) = self.bypass_waypoints(waypoints) {
                let no_polygon = Restrictions {
                    avoid_polygon: None,
                    avoid_ferries: true,
                };
                match self.request(&bypassed, no_polygon) {
                    Ok(route) => {
                        return Ok(RoutedLoad {
                            route,
                            waypoints: bypassed,
                            strategy: RouteStrategy::Bypass,
                            warning: Some(format!(
                                "automatic bypass detour applied via {}",
                                self.config.bypass.label
                            )),
                        });
                    }
                    Err(err) => tracing::warn!("bypass attempt failed: {err}"),
                }
            }
        }

        // Without a polygon the relaxed request would repeat the primary one.
        if self.avoid_polygon.is_some() {
            let relaxed = Restrictions {
                avoid_polygon: None,
                avoid_ferries: true,
            };
            match self.request(waypoints, relaxed) {
                Ok(route) => {
                    return Ok(RoutedLoad {
                        route,
                        waypoints: waypoints.to_vec(),
                        strategy: RouteStrategy::PolygonRelaxed,
                        warning: Some(
                            "restricted zone ignored: the route may cross the avoidance area"
                                .to_string(),
                        ),
                    });
                }
                Err(err) => tracing::warn!("polygon-relaxed attempt failed: {err}"),
            }
        }

        let route = self.request(waypoints, Restrictions::none())?;
        Ok(RoutedLoad {
            route,
            waypoints: waypoints.to_vec(),
            strategy: RouteStrategy::Unrestricted,
            warning: Some(
                "restriction ignored due to hard API limit: route computed without avoidance options"
                    .to_string(),
            ),
        })
    }

    fn request(
        &self,
        waypoints: &[Coordinate],
        restrictions: Restrictions,
    ) -> Result<ServiceRoute, ServiceError> {
        self.service.directions(&DirectionsRequest {
            waypoints: waypoints.to_vec(),
            restrictions,
        })
    }

    /// Waypoints with the bypass forced in, for the load shapes that allow it.
    fn bypass_waypoints(&self, waypoints: &[Coordinate]) -> Option<Vec<Coordinate>> {
        let bypass = self.config.bypass.coordinate();
        match *waypoints {
            [origin, destination] => Some(vec![origin, bypass, destination]),
            [origin, destination, back] if self.is_round_trip(origin, back) => {
                Some(vec![origin, bypass, destination, bypass, back])
            }
            _ => None,
        }
    }

    fn is_round_trip(&self, origin: Coordinate, back: Coordinate) -> bool {
        geodesic_m(origin, back) <= self.config.round_trip_threshold_km * 1000.0
    }

    /// Adds the bypass to `waypoints` on every leg whose geometry passes next
    /// to it, so the map link follows the real path.
    fn align_with_bypass(
        &self,
        geometry: &[Coordinate],
        mut waypoints: Vec<Coordinate>,
    ) -> Vec<Coordinate> {
        let bypass = self.config.bypass.coordinate();
        if waypoints.len() < 2 || waypoints.contains(&bypass) {
            return waypoints;
        }
        let passes = self.bypass_passes(geometry, bypass);
        if passes.is_empty() {
            return waypoints;
        }

        // Vertex at which each waypoint after the first is reached, walking
        // forward along the geometry.
        let mut reached = Vec::with_capacity(waypoints.len() - 1);
        let mut cursor = 0;
        for waypoint in &waypoints[1..] {
            let Some((offset, _)) = nearest_vertex(&geometry[cursor..], *waypoint) else {
                break;
            };
            cursor += offset;
            reached.push(cursor);
        }

        let last = waypoints.len() - 1;
        let mut positions: Vec<usize> = passes
            .iter()
            .map(|&vertex| {
                reached
                    .iter()
                    .position(|&at| at > vertex)
                    .map_or(last, |leg| leg + 1)
            })
            .collect();
        positions.dedup();

        tracing::info!(
            passes = passes.len(),
            ?positions,
            "route passes the {} bypass; adding it to the waypoints",
            self.config.bypass.label
        );
        for &position in positions.iter().rev() {
            waypoints.insert(position, bypass);
        }
        waypoints
    }

    /// Closest vertex of each separate stretch of geometry that runs within
    /// the detection radius of the bypass, in route order.
    fn bypass_passes(&self, geometry: &[Coordinate], bypass: Coordinate) -> Vec<usize> {
        let radius_m = self.config.bypass_detection_radius_km * 1000.0;
        let mut passes = Vec::new();
        let mut current: Option<(usize, f64)> = None;

        for (idx, vertex) in geometry.iter().enumerate() {
            let distance_m = geodesic_m(*vertex, bypass);
            if distance_m <= radius_m {
                if current.map_or(true, |(_, best)| distance_m < best) {
                    current = Some((idx, distance_m));
                }
            } else if let Some((closest, _)) = current.take() {
                passes.push(closest);
            }
        }
        passes.extend(current.map(|(closest, _)| closest));
        passes
    }
}
