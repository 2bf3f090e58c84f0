use std::collections::BTreeMap;

use crate::{
    error::LoadError,
    geodesy::path_length_m,
    models::{SegmentRecord, ServiceRoute, SurfaceClass, SurfaceCode, SurfaceSegment},
    surface::{classify, SurfaceTaxonomy},
};

/// Paved/unpaved composition of one route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceBreakdown {
    pub paved_km: f64,
    pub unpaved_km: f64,
    pub by_surface_km: BTreeMap<String, f64>,
    pub segments: Vec<SegmentRecord>,
}

impl SurfaceBreakdown {
    pub fn total_km(&self) -> f64 {
        self.paved_km + self.unpaved_km
    }
}

/// Walks the surface segments of `route` and measures each slice of geometry.
///
/// A response without surface information is measured as a single
/// `unspecified` segment so the geometry length is never lost.
pub fn segment_route(route: &ServiceRoute) -> Result<SurfaceBreakdown, LoadError> {
    let geometry = &route.geometry;
    let taxonomy = SurfaceTaxonomy::with_overrides(
        route
            .surface_names
            .iter()
            .map(|(code, name)| (*code, name.as_str())),
    );

    let whole_route;
    let segments: &[SurfaceSegment] = if route.surface_segments.is_empty() {
        if geometry.len() < 2 {
            return Ok(SurfaceBreakdown::default());
        }
        tracing::warn!(
            vertices = geometry.len(),
            "route has no surface data; measuring it as one unspecified segment"
        );
        whole_route = [SurfaceSegment {
            start: 0,
            end: geometry.len() - 1,
            code: SurfaceCode::Tag(String::new()),
        }];
        &whole_route
    } else {
        &route.surface_segments
    };

    let mut paved_m = 0.0;
    let mut unpaved_m = 0.0;
    let mut by_surface_m: BTreeMap<String, f64> = BTreeMap::new();
    let mut records = Vec::with_capacity(segments.len());

    for segment in segments {
        if segment.start >= segment.end || segment.end >= geometry.len() {
            return Err(LoadError::MalformedRoute(format!(
                "surface segment [{}, {}] does not fit a geometry of {} vertices",
                segment.start,
                segment.end,
                geometry.len()
            )));
        }

        let distance_m = path_length_m(&geometry[segment.start..=segment.end]);
        let surface = taxonomy.resolve(&segment.code);
        let class = classify(&surface);
        match class {
            SurfaceClass::Paved => paved_m += distance_m,
            SurfaceClass::Unpaved => unpaved_m += distance_m,
        }
        *by_surface_m.entry(surface.clone()).or_insert(0.0) += distance_m;

        records.push(SegmentRecord {
            tag: segment.code.to_string(),
            surface,
            class,
            distance_m: round1(distance_m),
            start: geometry[segment.start].rounded(5),
            end: geometry[segment.end].rounded(5),
        });
    }

    tracing::debug!(
        segments = records.len(),
        paved_m,
        unpaved_m,
        "segmented route"
    );

    Ok(SurfaceBreakdown {
        paved_km: paved_m / 1000.0,
        unpaved_km: unpaved_m / 1000.0,
        by_surface_km: by_surface_m
            .into_iter()
            .map(|(name, meters)| (name, meters / 1000.0))
            .collect(),
        segments: records,
    })
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
