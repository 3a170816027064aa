//! Scenario evaluation: orchestrates the simulator across the action catalog
//! and applies the quantile-risk decision rule.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::actions::{ACTIONS, ActionKind};
use crate::constants::{DEFAULT_COST_SAMPLES, DEFAULT_RISK_THRESHOLD, DEFAULT_SEED};
use crate::numbers::{format_thousands, round_f64_to_i32, round_f64_to_i64};
use crate::rng::SampleStream;
use crate::scenario::{ScenarioInputs, ScenarioRow};
use crate::simulate::{ActionContext, simulate_cost_distribution};
use crate::stats::{CostStats, mean, percentile};

/// Per-evaluation score list; never grows past the catalog.
type ScoreList = SmallVec<[(ActionKind, f64); 3]>;

/// Tuning knobs for one evaluation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationParams {
    /// Tolerated cost-tail risk in [0,1]; low is conservative. Scores are
    /// taken at the `1 - risk_threshold` quantile of each distribution.
    #[serde(default = "EvaluationParams::default_risk_threshold")]
    pub risk_threshold: f64,
    /// Monte Carlo samples per action.
    #[serde(default = "EvaluationParams::default_samples")]
    pub samples: u32,
    /// Base PRNG seed; identical inputs reproduce identical results.
    #[serde(default = "EvaluationParams::default_seed")]
    pub seed: u64,
}

impl Default for EvaluationParams {
    fn default() -> Self {
        Self {
            risk_threshold: DEFAULT_RISK_THRESHOLD,
            samples: DEFAULT_COST_SAMPLES,
            seed: DEFAULT_SEED,
        }
    }
}

impl EvaluationParams {
    const fn default_risk_threshold() -> f64 {
        DEFAULT_RISK_THRESHOLD
    }

    const fn default_samples() -> u32 {
        DEFAULT_COST_SAMPLES
    }

    const fn default_seed() -> u64 {
        DEFAULT_SEED
    }

    /// Fleet convention: each truck gets its own stream at `seed + truck_id`.
    #[must_use]
    pub const fn for_truck(&self, truck_id: i64) -> Self {
        Self {
            risk_threshold: self.risk_threshold,
            samples: self.samples,
            seed: self.seed.wrapping_add_signed(truck_id),
        }
    }

    /// # Errors
    ///
    /// Returns `EvaluateError` when a parameter violates its documented
    /// bounds. Invalid parameters are rejected up front, never clamped.
    pub fn validate(&self) -> Result<(), EvaluateError> {
        if self.samples < 1 {
            return Err(EvaluateError::SampleCount {
                value: self.samples,
            });
        }
        if !self.risk_threshold.is_finite() || !(0.0..=1.0).contains(&self.risk_threshold) {
            return Err(EvaluateError::RiskThresholdRange {
                value: self.risk_threshold,
            });
        }
        Ok(())
    }
}

/// Errors raised when evaluation parameters are invalid.
#[derive(Debug, Error, PartialEq)]
pub enum EvaluateError {
    #[error("samples must be at least 1 (got {value})")]
    SampleCount { value: u32 },
    #[error("risk_threshold must be between 0.00 and 1.00 (got {value:.2})")]
    RiskThresholdRange { value: f64 },
}

/// One action's full result: distribution summary, display view, component
/// means, and the risk-adjusted score used for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    pub stats: CostStats,
    pub percentiles: PercentileView,
    pub breakdown_means: BreakdownMeans,
    pub score: f64,
}

/// Redundant percentile subset kept for display consumers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileView {
    pub p05: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl From<&CostStats> for PercentileView {
    fn from(stats: &CostStats) -> Self {
        Self {
            p05: stats.p05,
            p25: stats.p25,
            p50: stats.p50,
            p75: stats.p75,
            p95: stats.p95,
        }
    }
}

/// Mean of each cost component plus the action's flat fee.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakdownMeans {
    pub operating_travel: f64,
    pub delay_service: f64,
    pub spoilage: f64,
    pub fixed_cost: f64,
}

/// Fully-formed evaluation output, serialized verbatim by API consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub truck_id: i64,
    pub node_id: i64,
    pub inputs: ScenarioInputs,
    /// All three actions, unconditionally computed. A `BTreeMap` keeps JSON
    /// key order deterministic, which the byte-identical reproducibility
    /// contract relies on.
    pub per_action: BTreeMap<ActionKind, ActionResult>,
    pub recommended_action: ActionKind,
    pub risk_threshold: f64,
    pub quantile_used: String,
    pub rationale: String,
}

/// Evaluate one scenario across the full action catalog.
///
/// One stream, seeded once, is advanced sequentially through the actions in
/// catalog order; identical `(scenario, params)` reproduce bit-identical
/// sample arrays. An externally-supplied `recommended_action` naming a valid
/// action overrides the quantile-minimizing choice for the flagged action
/// only; every action's statistics are computed and returned regardless.
///
/// # Errors
///
/// Returns `EvaluateError` when `params` fail validation. Malformed scenario
/// fields are the deriver's responsibility, not checked here.
pub fn evaluate_scenario(
    row: &ScenarioRow,
    params: &EvaluationParams,
) -> Result<ScenarioResult, EvaluateError> {
    params.validate()?;

    let quantile_pct = 1.0 - params.risk_threshold;
    let quantile_label = format!("p{}", round_f64_to_i32(quantile_pct * 100.0));

    let mut stream = SampleStream::from_seed(params.seed);
    let mut per_action = BTreeMap::new();
    let mut scores = ScoreList::new();

    for def in &ACTIONS {
        let ctx = ActionContext::for_action(def, row);
        let set = simulate_cost_distribution(&ctx, params.samples, &mut stream);

        let mut sorted = set.total_cost.clone();
        sorted.sort_by(f64::total_cmp);
        let stats = CostStats::from_sorted(&sorted);
        let score = percentile(&sorted, quantile_pct * 100.0);

        per_action.insert(
            def.kind,
            ActionResult {
                percentiles: PercentileView::from(&stats),
                breakdown_means: BreakdownMeans {
                    operating_travel: mean(&set.operating_travel),
                    delay_service: mean(&set.delay_service),
                    spoilage: mean(&set.spoilage),
                    fixed_cost: def.fixed_cost,
                },
                stats,
                score,
            },
        );
        scores.push((def.kind, score));
    }

    let risk_label = risk_label(params.risk_threshold);
    let external = row
        .recommended_action
        .as_deref()
        .and_then(ActionKind::from_name);

    // Trust the upstream planner when it named a known action; otherwise
    // pick the lowest score, ties falling to catalog order.
    let (recommended_action, rationale) = if let Some(kind) = external {
        let score = score_for(&scores, kind);
        (
            kind,
            format!(
                "Action '{kind}' from routing decision data ({quantile_label} cost: ${} at {risk_label} risk)",
                format_thousands(round_f64_to_i64(score))
            ),
        )
    } else {
        let (kind, score) = scores
            .iter()
            .copied()
            .reduce(|best, candidate| if candidate.1 < best.1 { candidate } else { best })
            .unwrap_or((ActionKind::Continue, 0.0));
        (
            kind,
            format!(
                "Selected '{kind}' because it minimizes {quantile_label} cost (${}) at {risk_label} risk tolerance",
                format_thousands(round_f64_to_i64(score))
            ),
        )
    };

    Ok(ScenarioResult {
        truck_id: row.truck_id,
        node_id: row.node_id,
        inputs: ScenarioInputs::from_row(row),
        per_action,
        recommended_action,
        risk_threshold: params.risk_threshold,
        quantile_used: quantile_label,
        rationale,
    })
}

fn score_for(scores: &ScoreList, kind: ActionKind) -> f64 {
    scores
        .iter()
        .find(|(candidate, _)| *candidate == kind)
        .map_or(0.0, |(_, score)| *score)
}

/// Display label for the conventional risk presets; other thresholds render
/// as a bare percentage.
fn risk_label(risk_threshold: f64) -> String {
    const PRESETS: [(f64, &str); 3] = [
        (0.25, "25% Safe"),
        (0.50, "50% Balanced"),
        (0.75, "75% Cheap"),
    ];
    for (preset, label) in PRESETS {
        if (risk_threshold - preset).abs() < 1e-9 {
            return label.to_string();
        }
    }
    format!("{}%", round_f64_to_i32(risk_threshold * 100.0))
}
