//! Coldtrail Decision Engine
//!
//! Platform-agnostic risk-aware decision core for cold-chain fleets: given a
//! truck's telemetry scenario it Monte Carlo simulates the cost of
//! continuing, rerouting, or detouring, and recommends the action that
//! minimizes a configurable risk-adjusted cost quantile. A downstream
//! environmental deriver turns evaluations into sustainability metrics.
//! The crate is a pure function library: no I/O, no logging, no shared state.

pub mod actions;
pub mod constants;
pub mod environment;
pub mod evaluate;
pub mod fleet;
pub mod numbers;
pub mod rng;
pub mod sampling;
pub mod scenario;
pub mod simulate;
pub mod stats;

// Re-export commonly used types
pub use actions::{ACTIONS, ActionDef, ActionKind};
pub use environment::{
    DEFAULT_CARGO_TONS, DEFAULT_ENVIRONMENTAL_SAMPLES, EMISSIONS_FACTOR_G_PER_TON_MILE,
    EPA_CARBON_MULTIPLIER, EnvironmentalAssumptions, EnvironmentalSroi, ImpactError, ImpactParams,
    SpoilageSavings, TruckEnvironmentalImpact, calculate_environmental_sroi,
    compute_fleet_environmental_impact, compute_truck_environmental_impact, spoilage_cost_saved,
};
pub use evaluate::{
    ActionResult, BreakdownMeans, EvaluateError, EvaluationParams, PercentileView, ScenarioResult,
    evaluate_scenario,
};
pub use fleet::{FleetEvaluation, SkipReason, SkippedTruck, evaluate_fleet};
pub use rng::SampleStream;
pub use sampling::{triangular, uniform};
pub use scenario::{
    GpsFix, RoutingDecision, ScenarioInputs, ScenarioRow, SensorReading, TelemetrySnapshot,
    derive_scenario,
};
pub use simulate::{ActionContext, SampleSet, extra_violation_minutes, simulate_cost_distribution};
pub use stats::{CostStats, mean, percentile};
