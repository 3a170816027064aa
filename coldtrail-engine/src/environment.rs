//! Environmental-impact (SROI) derivation over evaluated scenarios.
//!
//! Purely a downstream consumer: it reads an evaluation's breakdown means
//! and distances, never re-runs the simulation for the chosen action.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::ActionKind;
use crate::evaluate::{EvaluateError, EvaluationParams, ScenarioResult, evaluate_scenario};
use crate::numbers::round_places;
use crate::scenario::{TelemetrySnapshot, derive_scenario};

/// EPA social cost of carbon, dollars per metric ton CO2.
pub const EPA_CARBON_MULTIPLIER: f64 = 190.0;
/// Emissions factor for medium/heavy trucks, grams CO2 per ton-mile.
pub const EMISSIONS_FACTOR_G_PER_TON_MILE: f64 = 161.8;
/// Assumed cargo weight when the caller does not supply one.
pub const DEFAULT_CARGO_TONS: f64 = 20.0;
/// Environmental runs need fewer samples than cost decisions.
pub const DEFAULT_ENVIRONMENTAL_SAMPLES: u32 = 5_000;

const GRAMS_PER_TONNE: f64 = 1_000_000.0;

/// Caller-supplied assumptions for an environmental pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactParams {
    #[serde(default = "ImpactParams::default_cargo_tons")]
    pub cargo_tons: f64,
    #[serde(default = "ImpactParams::default_carbon_price")]
    pub carbon_price: f64,
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            cargo_tons: DEFAULT_CARGO_TONS,
            carbon_price: EPA_CARBON_MULTIPLIER,
        }
    }
}

impl ImpactParams {
    const fn default_cargo_tons() -> f64 {
        DEFAULT_CARGO_TONS
    }

    const fn default_carbon_price() -> f64 {
        EPA_CARBON_MULTIPLIER
    }

    /// # Errors
    ///
    /// Returns `ImpactError` when cargo tonnage is negative or non-finite.
    pub fn validate(&self) -> Result<(), ImpactError> {
        if !self.cargo_tons.is_finite() || self.cargo_tons < 0.0 {
            return Err(ImpactError::CargoTons {
                value: self.cargo_tons,
            });
        }
        Ok(())
    }
}

/// Errors raised by the environmental deriver.
#[derive(Debug, Error, PartialEq)]
pub enum ImpactError {
    #[error("cargo_tons must be non-negative and finite (got {value})")]
    CargoTons { value: f64 },
    #[error("distance_base_miles must be non-negative and finite (got {value})")]
    Distance { value: f64 },
    #[error(transparent)]
    Evaluation(#[from] EvaluateError),
}

/// Inputs the savings figures were computed under, echoed for transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalAssumptions {
    pub epa_carbon_multiplier: f64,
    pub emissions_factor_g_per_ton_mile: f64,
    pub cargo_tons: f64,
    pub original_distance_miles: f64,
    pub optimized_distance_miles: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Carbon-side savings of choosing one route over another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalSroi {
    pub distance_saved: f64,
    pub ton_miles_saved: f64,
    pub total_tonnes_carbon_saved: f64,
    pub environmental_value: f64,
    pub assumptions: EnvironmentalAssumptions,
}

/// Expected spoilage cost of the chosen action against the continue baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpoilageSavings {
    pub baseline_expected_spoilage_cost: f64,
    pub chosen_expected_spoilage_cost: f64,
    pub expected_spoilage_cost_saved: f64,
}

/// Full per-truck sustainability report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckEnvironmentalImpact {
    pub truck_id: i64,
    pub node_id: i64,
    pub baseline_action: ActionKind,
    pub chosen_action: ActionKind,
    pub distance_saved: f64,
    pub ton_miles_saved: f64,
    pub total_tonnes_carbon_saved: f64,
    pub environmental_value: f64,
    pub expected_spoilage_cost_saved: f64,
    pub baseline_expected_spoilage_cost: f64,
    pub chosen_expected_spoilage_cost: f64,
    pub total_sustainability_value: f64,
    pub cost_difference_vs_baseline: f64,
    pub sustainability_roi_ratio: f64,
    pub carbon_saved_per_dollar: f64,
    pub assumptions: EnvironmentalAssumptions,
}

/// Carbon savings of an optimized route relative to the original.
///
/// Savings are never reported negative: an equal-or-longer optimized route
/// yields zeroes plus an explanatory note in the assumptions block.
#[must_use]
pub fn calculate_environmental_sroi(
    original_distance: f64,
    optimized_distance: f64,
    cargo_tons: f64,
    carbon_price: f64,
) -> EnvironmentalSroi {
    let distance_saved = original_distance - optimized_distance;

    if distance_saved <= 0.0 {
        return EnvironmentalSroi {
            distance_saved: 0.0,
            ton_miles_saved: 0.0,
            total_tonnes_carbon_saved: 0.0,
            environmental_value: 0.0,
            assumptions: EnvironmentalAssumptions {
                epa_carbon_multiplier: carbon_price,
                emissions_factor_g_per_ton_mile: EMISSIONS_FACTOR_G_PER_TON_MILE,
                cargo_tons,
                original_distance_miles: original_distance,
                optimized_distance_miles: optimized_distance,
                note: Some("No distance saved - optimised route is equal or longer".to_string()),
            },
        };
    }

    let ton_miles_saved = distance_saved * cargo_tons;
    let total_tonnes_carbon_saved =
        ton_miles_saved * EMISSIONS_FACTOR_G_PER_TON_MILE / GRAMS_PER_TONNE;
    let environmental_value = carbon_price * total_tonnes_carbon_saved;

    EnvironmentalSroi {
        distance_saved: round_places(distance_saved, 4),
        ton_miles_saved: round_places(ton_miles_saved, 4),
        total_tonnes_carbon_saved: round_places(total_tonnes_carbon_saved, 6),
        environmental_value: round_places(environmental_value, 4),
        assumptions: EnvironmentalAssumptions {
            epa_carbon_multiplier: carbon_price,
            emissions_factor_g_per_ton_mile: EMISSIONS_FACTOR_G_PER_TON_MILE,
            cargo_tons,
            original_distance_miles: round_places(original_distance, 4),
            optimized_distance_miles: round_places(optimized_distance, 4),
            note: None,
        },
    }
}

/// Expected spoilage saved by the chosen action, from the evaluation's
/// breakdown means.
#[must_use]
pub fn spoilage_cost_saved(result: &ScenarioResult, chosen: ActionKind) -> SpoilageSavings {
    let baseline = result
        .per_action
        .get(&ActionKind::Continue)
        .map_or(0.0, |action| action.breakdown_means.spoilage);
    let chosen_spoilage = result
        .per_action
        .get(&chosen)
        .map_or(0.0, |action| action.breakdown_means.spoilage);

    SpoilageSavings {
        baseline_expected_spoilage_cost: round_places(baseline, 2),
        chosen_expected_spoilage_cost: round_places(chosen_spoilage, 2),
        expected_spoilage_cost_saved: round_places(baseline - chosen_spoilage, 2),
    }
}

/// Full sustainability report for one evaluated truck.
///
/// # Errors
///
/// Returns `ImpactError` when `params` or the baseline distance are
/// physically meaningless.
pub fn compute_truck_environmental_impact(
    result: &ScenarioResult,
    distance_base_miles: f64,
    params: &ImpactParams,
) -> Result<TruckEnvironmentalImpact, ImpactError> {
    params.validate()?;
    if !distance_base_miles.is_finite() || distance_base_miles < 0.0 {
        return Err(ImpactError::Distance {
            value: distance_base_miles,
        });
    }

    let chosen_action = result.recommended_action;
    let baseline_action = ActionKind::Continue;

    let original_distance = baseline_action.def().adjusted_distance(distance_base_miles);
    let optimized_distance = chosen_action.def().adjusted_distance(distance_base_miles);

    let env = calculate_environmental_sroi(
        original_distance,
        optimized_distance,
        params.cargo_tons,
        params.carbon_price,
    );
    let spoilage = spoilage_cost_saved(result, chosen_action);
    let total_sustainability_value =
        env.environmental_value + spoilage.expected_spoilage_cost_saved;

    let baseline_total_cost = result
        .per_action
        .get(&baseline_action)
        .map_or(0.0, |action| action.stats.mean);
    let chosen_total_cost = result
        .per_action
        .get(&chosen_action)
        .map_or(0.0, |action| action.stats.mean);
    let cost_difference = chosen_total_cost - baseline_total_cost;

    // Floor at $1 so a near-equal cost pair cannot blow the ratio up.
    let abs_cost_diff = cost_difference.abs().max(1.0);

    Ok(TruckEnvironmentalImpact {
        truck_id: result.truck_id,
        node_id: result.node_id,
        baseline_action,
        chosen_action,
        distance_saved: env.distance_saved,
        ton_miles_saved: env.ton_miles_saved,
        total_tonnes_carbon_saved: env.total_tonnes_carbon_saved,
        environmental_value: env.environmental_value,
        expected_spoilage_cost_saved: spoilage.expected_spoilage_cost_saved,
        baseline_expected_spoilage_cost: spoilage.baseline_expected_spoilage_cost,
        chosen_expected_spoilage_cost: spoilage.chosen_expected_spoilage_cost,
        total_sustainability_value: round_places(total_sustainability_value, 4),
        cost_difference_vs_baseline: round_places(cost_difference, 2),
        sustainability_roi_ratio: round_places(total_sustainability_value / abs_cost_diff, 4),
        carbon_saved_per_dollar: round_places(env.total_tonnes_carbon_saved / abs_cost_diff, 6),
        assumptions: env.assumptions,
    })
}

/// Environmental pass over a telemetry batch: derive, evaluate per truck
/// with offset seeds, then report impacts. Sensorless trucks are skipped.
///
/// # Errors
///
/// Returns `ImpactError` when either parameter set fails validation.
pub fn compute_fleet_environmental_impact(
    trucks: &[TelemetrySnapshot],
    eval_params: &EvaluationParams,
    impact_params: &ImpactParams,
) -> Result<Vec<TruckEnvironmentalImpact>, ImpactError> {
    eval_params.validate()?;
    impact_params.validate()?;

    let mut impacts = Vec::with_capacity(trucks.len());
    for truck in trucks {
        let Some(row) = derive_scenario(truck) else {
            continue;
        };
        let result = evaluate_scenario(&row, &eval_params.for_truck(truck.truck_id))?;
        impacts.push(compute_truck_environmental_impact(
            &result,
            row.distance_base_miles,
            impact_params,
        )?);
    }
    Ok(impacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savings_scale_with_distance_and_price() {
        let env = calculate_environmental_sroi(100.0, 90.0, 20.0, 190.0);
        assert!((env.distance_saved - 10.0).abs() < 1e-9);
        assert!((env.ton_miles_saved - 200.0).abs() < 1e-9);
        // 200 ton-miles * 161.8 g / 1e6
        assert!((env.total_tonnes_carbon_saved - 0.032_36).abs() < 1e-9);
        assert!((env.environmental_value - 6.148_4).abs() < 1e-4);
        assert!(env.assumptions.note.is_none());
    }

    #[test]
    fn longer_optimized_route_reports_zero_savings_with_note() {
        let env = calculate_environmental_sroi(50.0, 58.0, 20.0, 190.0);
        assert!((env.distance_saved - 0.0).abs() < 1e-12);
        assert!((env.ton_miles_saved - 0.0).abs() < 1e-12);
        assert!((env.total_tonnes_carbon_saved - 0.0).abs() < 1e-12);
        assert!((env.environmental_value - 0.0).abs() < 1e-12);
        assert!(env.assumptions.note.is_some());
    }

    #[test]
    fn note_is_omitted_from_json_when_absent() {
        let env = calculate_environmental_sroi(100.0, 90.0, 20.0, 190.0);
        let json = serde_json::to_string(&env.assumptions).unwrap();
        assert!(!json.contains("note"));
        let env = calculate_environmental_sroi(90.0, 100.0, 20.0, 190.0);
        let json = serde_json::to_string(&env.assumptions).unwrap();
        assert!(json.contains("note"));
    }

    #[test]
    fn zero_cargo_is_valid_but_negative_is_not() {
        let zero = ImpactParams {
            cargo_tons: 0.0,
            ..ImpactParams::default()
        };
        assert!(zero.validate().is_ok());
        let negative = ImpactParams {
            cargo_tons: -1.0,
            ..ImpactParams::default()
        };
        assert_eq!(
            negative.validate(),
            Err(ImpactError::CargoTons { value: -1.0 })
        );
    }
}
