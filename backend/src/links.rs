use crate::models::Coordinate;

pub const DIRECTIONS_BASE_URL: &str = "https://www.google.com/maps/dir";

/// Directions link listing every waypoint in order as `lat,lon`.
pub fn directions_link(waypoints: &[Coordinate]) -> String {
    waypoints.iter().fold(DIRECTIONS_BASE_URL.to_string(), |mut url, point| {
        url.push_str(&format!("/{},{}", point.lat, point.lon));
        url
    })
}
