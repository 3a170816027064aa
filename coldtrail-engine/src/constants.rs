//! Centralized calibration constants for the Coldtrail cost model.
//!
//! These values define the deterministic math for the decision engine.
//! They are domain calibrations, not tunables: keeping them together
//! ensures the decision policy can only change via code reviewed in
//! version control, never through external configuration.

// Operating cost sampling ---------------------------------------------------
pub(crate) const MILE_COST_RANGE: (f64, f64) = (2.20, 2.35);
pub(crate) const EFFECTIVE_SPEED_RANGE_MPH: (f64, f64) = (30.0, 55.0);
pub(crate) const HANDLING_FEE_RANGE: (f64, f64) = (100.0, 500.0);

// Delay and service cost ----------------------------------------------------
pub(crate) const OTIF_PENALTY_FRACTION: f64 = 0.03;
pub(crate) const DETENTION_RATE_RANGE: (f64, f64) = (0.5, 0.83);
pub(crate) const SHIPMENT_VALUE_TRIANGLE: (f64, f64, f64) = (50_000.0, 75_000.0, 100_000.0);

// Spoilage hazard calibration ----------------------------------------------
// Anchors: 20% cumulative loss after 1 hour, 80% after 6 hours, with the
// hazard rate ramping between the two over the 4h..6h window.
pub(crate) const SPOILAGE_EARLY_LOSS: f64 = 0.2;
pub(crate) const SPOILAGE_EARLY_ANCHOR_HOURS: f64 = 1.0;
pub(crate) const SPOILAGE_LATE_LOSS: f64 = 0.8;
pub(crate) const SPOILAGE_LATE_ANCHOR_HOURS: f64 = 6.0;
pub(crate) const SPOILAGE_RAMP_START_HOURS: f64 = 4.0;
pub(crate) const SPOILAGE_RAMP_SPAN_HOURS: f64 = 2.0;
pub(crate) const HAZARD_JITTER_RANGE: (f64, f64) = (0.95, 1.05);
pub(crate) const DOOR_OPEN_SPOILAGE_FACTOR: f64 = 1.5;
pub(crate) const HIGH_HUMIDITY_SPOILAGE_FACTOR: f64 = 1.2;

// Action geometry -----------------------------------------------------------
// Extra action minutes inflate effective distance proportionally, as a
// proxy for added fuel and wear.
pub(crate) const DISTANCE_INFLATION_DIVISOR_MINUTES: f64 = 300.0;

// Scenario derivation -------------------------------------------------------
pub(crate) const DEFAULT_EDGE_TRAVEL_MINUTES: f64 = 30.0;
pub(crate) const DEFAULT_SPEED_MPH: f64 = 42.5;
pub(crate) const SEGMENT_VIOLATION_RATE: f64 = 0.3;
pub(crate) const REROUTE_REDUCTION_RATE: f64 = 0.6;
pub(crate) const DETOUR_BENEFIT_BASE_MINUTES: f64 = 30.0;
pub(crate) const DETOUR_BENEFIT_PER_VIOLATION_MINUTE: f64 = 0.5;
pub(crate) const DETOUR_BENEFIT_CAP_MINUTES: f64 = 60.0;
pub(crate) const HIGH_HUMIDITY_THRESHOLD_PCT: f64 = 80.0;

// Evaluation defaults -------------------------------------------------------
pub(crate) const DEFAULT_RISK_THRESHOLD: f64 = 0.5;
pub(crate) const DEFAULT_COST_SAMPLES: u32 = 20_000;
pub(crate) const DEFAULT_SEED: u64 = 42;
