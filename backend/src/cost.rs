use serde::{Deserialize, Serialize};

use crate::models::CostBreakdown;

/// Surcharge multipliers applied per surface class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostModel {
    pub paved_multiplier: f64,
    pub unpaved_multiplier: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            paved_multiplier: 1.03,
            unpaved_multiplier: 1.09,
        }
    }
}

impl CostModel {
    /// Unrounded `unpaved × m_u + paved × m_p + manual`.
    pub fn weighted_total(&self, paved_km: f64, unpaved_km: f64, manual_km: f64) -> f64 {
        unpaved_km * self.unpaved_multiplier + paved_km * self.paved_multiplier + manual_km
    }

    /// Rounded breakdown; `advisory` is carried through untouched.
    pub fn breakdown(
        &self,
        paved_km: f64,
        unpaved_km: f64,
        manual_km: f64,
        advisory: Option<String>,
    ) -> CostBreakdown {
        let paved_cost = paved_km * self.paved_multiplier;
        let unpaved_cost = unpaved_km * self.unpaved_multiplier;
        CostBreakdown {
            paved_km: round2(paved_km),
            unpaved_km: round2(unpaved_km),
            manual_km: round2(manual_km),
            paved_cost_km: round2(paved_cost),
            unpaved_cost_km: round2(unpaved_cost),
            distance_km: round2(paved_km + unpaved_km + manual_km),
            total_km: round2(self.weighted_total(paved_km, unpaved_km, manual_km)),
            advisory,
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_everywhere_costs_nothing() {
        let model = CostModel::default();
        assert_eq!(model.weighted_total(0.0, 0.0, 0.0), 0.0);
        let breakdown = model.breakdown(0.0, 0.0, 0.0, None);
        assert_eq!(breakdown.total_km, 0.0);
        assert_eq!(breakdown.distance_km, 0.0);
    }

    #[test]
    fn paved_route_with_manual_addend() {
        let breakdown = CostModel::default().breakdown(100.0, 0.0, 5.0, None);
        assert_eq!(breakdown.paved_cost_km, 103.0);
        assert_eq!(breakdown.unpaved_cost_km, 0.0);
        assert_eq!(breakdown.distance_km, 105.0);
        assert_eq!(breakdown.total_km, 108.0);
    }

    #[test]
    fn mixed_route_is_rounded_to_cents() {
        let breakdown = CostModel::default().breakdown(12.346, 6.789, 0.0, None);
        assert_eq!(breakdown.paved_km, 12.35);
        assert_eq!(breakdown.unpaved_km, 6.79);
        assert_eq!(breakdown.paved_cost_km, 12.72);
        assert_eq!(breakdown.unpaved_cost_km, 7.4);
        assert_eq!(breakdown.total_km, 20.12);
    }

    #[test]
    fn advisory_is_never_dropped() {
        let breakdown =
            CostModel::default().breakdown(1.0, 1.0, 0.0, Some("restriction ignored".into()));
        assert_eq!(breakdown.advisory.as_deref(), Some("restriction ignored"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_total_is_monotonic(
                paved in 0.0f64..10_000.0,
                unpaved in 0.0f64..10_000.0,
                manual in 0.0f64..10_000.0,
                delta in 0.001f64..100.0,
                which in 0usize..3
            ) {
                let model = CostModel::default();
                let base = model.weighted_total(paved, unpaved, manual);
                let bumped = match which {
                    0 => model.weighted_total(paved + delta, unpaved, manual),
                    1 => model.weighted_total(paved, unpaved + delta, manual),
                    _ => model.weighted_total(paved, unpaved, manual + delta),
                };
                prop_assert!(bumped > base);
            }

            #[test]
            fn prop_total_never_below_raw_distance(
                paved in 0.0f64..10_000.0,
                unpaved in 0.0f64..10_000.0,
                manual in 0.0f64..10_000.0
            ) {
                let total = CostModel::default().weighted_total(paved, unpaved, manual);
                prop_assert!(total >= paved + unpaved + manual);
            }
        }
    }
}
