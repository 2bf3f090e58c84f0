use std::collections::{BTreeMap, HashMap};

use crate::{
    config::{ConfigError, PipelineConfig},
    coordinates::parse_coordinate,
    cost::round2,
    error::LoadError,
    links::directions_link,
    models::{BatchReport, BatchRow, LoadEntry, LoadOutcome, RouteResult},
    ors::RoutingService,
    router::RestrictedZoneRouter,
    segmenter::segment_route,
};

/// Load id used for rows without one (or for every row when grouping is off).
pub const IMPLICIT_LOAD_ID: &str = "default";

/// Rows sharing a load id, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    pub id: String,
    pub coordinates: Vec<String>,
    pub manual_entries: Vec<f64>,
}

impl Load {
    fn new(id: String) -> Self {
        Self {
            id,
            coordinates: Vec::new(),
            manual_entries: Vec::new(),
        }
    }

    pub fn manual_km(&self) -> f64 {
        self.manual_entries.iter().sum()
    }
}

/// Groups rows by load id keeping first-seen order of loads and rows.
pub fn group_rows(rows: &[BatchRow], grouping: bool) -> Vec<Load> {
    let mut loads: Vec<Load> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let id = row
            .load_id
            .as_deref()
            .map(str::trim)
            .filter(|id| grouping && !id.is_empty())
            .unwrap_or(IMPLICIT_LOAD_ID)
            .to_string();

        let slot = *index.entry(id.clone()).or_insert_with(|| {
            loads.push(Load::new(id));
            loads.len() - 1
        });
        let load = &mut loads[slot];

        let text = row.coordinates.trim();
        if !text.is_empty() {
            load.coordinates.push(text.to_string());
        }
        if let Some(km) = row.manual_km {
            load.manual_entries.push(km);
        }
    }

    loads
}

/// Outcome of every load of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchResult {
    entries: Vec<(String, Result<RouteResult, LoadError>)>,
}

impl BatchResult {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Result<RouteResult, LoadError>)> {
        self.entries
            .iter()
            .map(|(id, outcome)| (id.as_str(), outcome))
    }

    pub fn get(&self, load_id: &str) -> Option<&Result<RouteResult, LoadError>> {
        self.entries
            .iter()
            .find(|(id, _)| id == load_id)
            .map(|(_, outcome)| outcome)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|(_, outcome)| outcome.is_err()).count()
    }

    pub fn into_report(self) -> BatchReport {
        let loads = self
            .entries
            .into_iter()
            .map(|(load_id, outcome)| LoadEntry {
                load_id,
                result: match outcome {
                    Ok(result) => LoadOutcome::Routed(Box::new(result)),
                    Err(err) => LoadOutcome::Failed {
                        error: err.to_string(),
                    },
                },
            })
            .collect();
        BatchReport { loads }
    }
}

/// Runs the parse → route → segment → cost pipeline once per load.
pub struct BatchOrchestrator<'a> {
    router: RestrictedZoneRouter<'a>,
    config: &'a PipelineConfig,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(
        service: &'a dyn RoutingService,
        config: &'a PipelineConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            router: RestrictedZoneRouter::new(service, config)?,
            config,
        })
    }

    /// Processes every load sequentially. A failing load is recorded and the
    /// batch moves on.
    pub fn run(&self, rows: &[BatchRow]) -> BatchResult {
        let loads = group_rows(rows, self.config.features.load_grouping);
        tracing::info!(rows = rows.len(), loads = loads.len(), "starting batch");

        let mut result = BatchResult::default();
        for load in &loads {
            let outcome = self.process_load(load);
            match &outcome {
                Ok(route) => tracing::info!(
                    load = %load.id,
                    total_km = route.total_km,
                    strategy = ?route.strategy,
                    "load routed"
                ),
                Err(err) => tracing::warn!(load = %load.id, "load failed: {err}"),
            }
            result.entries.push((load.id.clone(), outcome));
        }

        tracing::info!(
            loads = result.len(),
            failed = result.failures(),
            "batch finished"
        );
        result
    }

    pub fn process_load(&self, load: &Load) -> Result<RouteResult, LoadError> {
        if let Some(&value) = load.manual_entries.iter().find(|km| !(**km >= 0.0)) {
            return Err(LoadError::InvalidManualDistance { value });
        }
        let manual_km = load.manual_km();

        let waypoints = load
            .coordinates
            .iter()
            .map(|raw| parse_coordinate(raw))
            .collect::<Result<Vec<_>, _>>()?;
        if waypoints.len() < 2 {
            return Err(LoadError::InsufficientWaypoints {
                found: waypoints.len(),
            });
        }

        let routed = self.router.route(&waypoints)?;
        let surfaces = segment_route(&routed.route)?;
        let cost = self.config.cost.breakdown(
            surfaces.paved_km,
            surfaces.unpaved_km,
            manual_km,
            routed.warning.clone(),
        );

        Ok(RouteResult {
            paved_km: round2(surfaces.paved_km),
            unpaved_km: round2(surfaces.unpaved_km),
            manual_km: round2(manual_km),
            total_km: cost.total_km,
            by_surface: surfaces
                .by_surface_km
                .into_iter()
                .map(|(name, km)| (name, round2(km)))
                .collect::<BTreeMap<_, _>>(),
            segments: surfaces.segments,
            map_link: directions_link(&routed.waypoints),
            waypoints: routed.waypoints,
            strategy: routed.strategy,
            cost,
            warning: routed.warning,
            bbox: routed.route.bbox,
        })
    }
}
