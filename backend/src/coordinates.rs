use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::LoadError;
use crate::models::Coordinate;

static DMS_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?x)
        (?P<body> (?: \d+(?:[.,]\d+)? \s* (?:°|º|''|'|′|’|"|″|”|:)? \s* ){1,3} )
        (?P<hem>[NSEWO])
        "#,
    )
    .expect("valid DMS pattern")
});

static DMS_COMPONENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?P<num>\d+(?:[.,]\d+)?)\s*(?P<mark>°|º|''|'|′|’|"|″|”|:)?"#)
        .expect("valid DMS component pattern")
});

static DECIMAL_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d),(\d)").expect("valid decimal comma pattern"));

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").expect("valid number pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Latitude,
    Longitude,
}

/// Parses one location string into a validated [`Coordinate`].
///
/// Accepts decimal pairs (`-19.5724, -57.0289`, `-19,5724; -57,0289`) and
/// degrees-minutes-seconds with hemisphere letters (`19°15'35.2"S 57°01'44"W`,
/// `O` for west as written in Portuguese).
pub fn parse_coordinate(raw: &str) -> Result<Coordinate, LoadError> {
    let normalized = raw.trim().to_uppercase();
    let parsed = if looks_like_dms(&normalized) {
        parse_dms(&normalized)
    } else {
        parse_decimal(&normalized)
    };

    match parsed {
        Some(coord) if in_range(coord) => Ok(coord),
        _ => Err(LoadError::Parse {
            raw: raw.to_string(),
        }),
    }
}

fn looks_like_dms(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, 'N' | 'S' | 'E' | 'W' | 'O' | '°' | 'º'))
}

fn parse_dms(text: &str) -> Option<Coordinate> {
    let tokens: Vec<(Axis, f64)> = DMS_TOKEN
        .captures_iter(text)
        .map(|caps| {
            let [degrees, minutes, seconds] = dms_components(caps.name("body")?.as_str())?;
            let (axis, sign) = match caps.name("hem")?.as_str() {
                "N" => (Axis::Latitude, 1.0),
                "S" => (Axis::Latitude, -1.0),
                "E" => (Axis::Longitude, 1.0),
                _ => (Axis::Longitude, -1.0),
            };
            Some((axis, sign * dms_to_decimal(degrees, minutes, seconds)))
        })
        .collect::<Option<_>>()?;

    if tokens.len() != 2 {
        return None;
    }

    let lat = tokens.iter().find(|(axis, _)| *axis == Axis::Latitude)?.1;
    let lon = tokens.iter().find(|(axis, _)| *axis == Axis::Longitude)?.1;
    Some(Coordinate { lat, lon })
}

/// Degrees, minutes and seconds of one DMS token.
///
/// A number goes to the slot named by the mark after it. Unmarked numbers
/// (or `:` separated ones) take the slot after the previous number. Slots
/// must appear in order and at most once.
fn dms_components(body: &str) -> Option<[f64; 3]> {
    let mut slots = [0.0; 3];
    let mut last: Option<usize> = None;

    for caps in DMS_COMPONENT.captures_iter(body) {
        let value = parse_number(caps.name("num")?.as_str())?;
        let next = last.map_or(0, |slot| slot + 1);
        let slot = match caps.name("mark").map(|m| m.as_str()) {
            Some("°" | "º") => 0,
            Some("'" | "′" | "’") => 1,
            Some("\"" | "''" | "″" | "”") => 2,
            _ => next,
        };
        if slot < next || slot > 2 {
            return None;
        }
        slots[slot] = value;
        last = Some(slot);
    }

    last.map(|_| slots)
}

/// Unsigned `deg + min/60 + sec/3600`.
pub fn dms_to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + minutes / 60.0 + seconds / 3600.0
}

fn parse_decimal(text: &str) -> Option<Coordinate> {
    // A comma can be either the pair separator or a decimal mark; it is only
    // a decimal mark when something else separates the pair.
    let decimal_commas = text.contains(';') || !text.contains('.');
    let spaced = text.replace(';', " ");
    let cleaned = if decimal_commas {
        DECIMAL_COMMA.replace_all(&spaced, "$1.$2").into_owned()
    } else {
        spaced
    };

    let mut numbers = NUMBER
        .find_iter(&cleaned)
        .filter_map(|m| m.as_str().parse::<f64>().ok());
    let lat = numbers.next()?;
    let lon = numbers.next()?;
    Some(Coordinate { lat, lon })
}

fn parse_number(text: &str) -> Option<f64> {
    text.replace(',', ".").parse().ok()
}

fn in_range(coord: Coordinate) -> bool {
    coord.lat.is_finite()
        && coord.lon.is_finite()
        && coord.lat.abs() <= 90.0
        && coord.lon.abs() <= 180.0
}
