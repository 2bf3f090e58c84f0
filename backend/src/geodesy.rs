use geo::{Distance, Geodesic, Point};

use crate::models::Coordinate;

/// Ellipsoidal (WGS84) distance in meters.
pub fn geodesic_m(a: Coordinate, b: Coordinate) -> f64 {
    Geodesic::distance(Point::new(a.lon, a.lat), Point::new(b.lon, b.lat))
}

pub fn path_length_m(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| geodesic_m(w[0], w[1])).sum()
}

/// Index and distance of the vertex of `path` closest to `target`.
pub fn nearest_vertex(path: &[Coordinate], target: Coordinate) -> Option<(usize, f64)> {
    path.iter()
        .enumerate()
        .map(|(idx, vertex)| (idx, geodesic_m(*vertex, target)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
}
