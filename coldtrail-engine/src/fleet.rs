//! Fleet-wide batch evaluation with per-truck failure isolation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluate::{EvaluateError, EvaluationParams, ScenarioResult, evaluate_scenario};
use crate::scenario::{TelemetrySnapshot, derive_scenario};

/// Outcome of one fleet pass: evaluated trucks plus the ones skipped and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetEvaluation {
    pub results: Vec<ScenarioResult>,
    pub skipped: Vec<SkippedTruck>,
}

/// One truck left out of a fleet pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTruck {
    pub truck_id: i64,
    pub reason: SkipReason,
}

/// Why a truck was skipped. A truck with no sensor telemetry yet is a
/// steady-state condition, not a fault.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    #[error("no sensor reading")]
    MissingSensor,
    #[error("evaluation failed: {message}")]
    Evaluation { message: String },
}

/// Evaluate every truck in a telemetry batch independently.
///
/// Each truck gets its own stream at `params.seed + truck_id`, so trucks may
/// be evaluated in any order (or concurrently by a caller) without changing
/// results. A per-truck failure is recorded as a skip and never aborts the
/// rest of the batch.
///
/// # Errors
///
/// Returns `EvaluateError` only when `params` themselves are invalid, which
/// would fail every truck identically.
pub fn evaluate_fleet(
    trucks: &[TelemetrySnapshot],
    params: &EvaluationParams,
) -> Result<FleetEvaluation, EvaluateError> {
    params.validate()?;

    let mut results = Vec::with_capacity(trucks.len());
    let mut skipped = Vec::new();

    for truck in trucks {
        let Some(row) = derive_scenario(truck) else {
            skipped.push(SkippedTruck {
                truck_id: truck.truck_id,
                reason: SkipReason::MissingSensor,
            });
            continue;
        };
        match evaluate_scenario(&row, &params.for_truck(truck.truck_id)) {
            Ok(result) => results.push(result),
            Err(error) => skipped.push(SkippedTruck {
                truck_id: truck.truck_id,
                reason: SkipReason::Evaluation {
                    message: error.to_string(),
                },
            }),
        }
    }

    Ok(FleetEvaluation { results, skipped })
}
