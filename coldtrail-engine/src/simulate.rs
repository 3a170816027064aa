//! Monte Carlo cost simulation for one candidate action.
//!
//! Each sample draws, in a fixed order: mile cost, effective speed, handling
//! fee, the shipment value when the scenario has none, the detention rate,
//! and two hazard-rate jitters. The order is load-bearing: one stream is
//! threaded sequentially through all three actions of an evaluation, so any
//! reordering changes every downstream statistic.

use rand::Rng;

use crate::actions::{ActionDef, ActionKind};
use crate::constants::{
    DETENTION_RATE_RANGE, DOOR_OPEN_SPOILAGE_FACTOR, EFFECTIVE_SPEED_RANGE_MPH, HANDLING_FEE_RANGE,
    HAZARD_JITTER_RANGE, HIGH_HUMIDITY_SPOILAGE_FACTOR, MILE_COST_RANGE, OTIF_PENALTY_FRACTION,
    SHIPMENT_VALUE_TRIANGLE, SPOILAGE_EARLY_ANCHOR_HOURS, SPOILAGE_EARLY_LOSS,
    SPOILAGE_LATE_ANCHOR_HOURS, SPOILAGE_LATE_LOSS, SPOILAGE_RAMP_SPAN_HOURS,
    SPOILAGE_RAMP_START_HOURS,
};
use crate::sampling::{triangular, uniform};
use crate::scenario::ScenarioRow;

/// Per-action inputs after applying the action's penalties to a scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActionContext {
    pub kind: ActionKind,
    pub adjusted_distance: f64,
    pub door_open: bool,
    pub high_humidity: bool,
    pub net_delay_minutes: f64,
    pub spoilage_time_hours: f64,
    pub shipment_value: Option<f64>,
    pub fixed_cost: f64,
}

impl ActionContext {
    /// Derive the simulation inputs for one action of the catalog.
    ///
    /// A detour is modeled as servicing and resealing the cargo, so its
    /// door-open and humidity risk factors are forced off.
    #[must_use]
    pub fn for_action(def: &ActionDef, row: &ScenarioRow) -> Self {
        let extra_time = def.extra_time_minutes();
        let is_detour = def.kind == ActionKind::Detour;
        let extra_violation = extra_violation_minutes(def.kind, extra_time, row);
        Self {
            kind: def.kind,
            adjusted_distance: def.adjusted_distance(row.distance_base_miles),
            door_open: !is_detour && row.door_open,
            high_humidity: !is_detour && row.high_humidity,
            net_delay_minutes: (row.delay_base_minutes + extra_time - row.slack_minutes).max(0.0),
            spoilage_time_hours: row.spoilage_time_base_hours
                + (row.minutes_above_temp + extra_violation) / 60.0,
            shipment_value: row.shipment_value,
            fixed_cost: def.fixed_cost,
        }
    }
}

/// Additional violation minutes an action feeds into spoilage time.
///
/// continue inherits the full projection; reroute shrinks it but pays its
/// own extra time when the cargo is already in violation; detour offsets its
/// extra time with the repair benefit, floored at zero.
#[must_use]
pub fn extra_violation_minutes(kind: ActionKind, extra_time: f64, row: &ScenarioRow) -> f64 {
    match kind {
        ActionKind::Continue => row.future_violation_if_continue,
        ActionKind::Reroute => {
            let reduced = (row.future_violation_if_continue - row.reroute_reduction).max(0.0);
            let pay_time = if row.minutes_above_temp > 0.0 {
                extra_time
            } else {
                0.0
            };
            reduced + pay_time
        }
        ActionKind::Detour => (extra_time - row.detour_repair_benefit).max(0.0),
    }
}

/// Sample arrays from one simulation run, kept per component so breakdown
/// means can be reported alongside the total-cost distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    pub total_cost: Vec<f64>,
    pub operating_travel: Vec<f64>,
    pub delay_service: Vec<f64>,
    pub spoilage: Vec<f64>,
}

/// Draw `samples` independent total-cost samples for one action context.
#[must_use]
pub fn simulate_cost_distribution<R: Rng + ?Sized>(
    ctx: &ActionContext,
    samples: u32,
    rng: &mut R,
) -> SampleSet {
    let n = samples as usize;
    let mut total_cost = Vec::with_capacity(n);
    let mut operating_travel = Vec::with_capacity(n);
    let mut delay_service = Vec::with_capacity(n);
    let mut spoilage = Vec::with_capacity(n);

    // Hazard rates calibrated against the two cumulative-loss anchors.
    let lambda_early_base = -(1.0 - SPOILAGE_EARLY_LOSS).ln() / SPOILAGE_EARLY_ANCHOR_HOURS;
    let lambda_late_base = -(1.0 - SPOILAGE_LATE_LOSS).ln() / SPOILAGE_LATE_ANCHOR_HOURS;

    let t = ctx.spoilage_time_hours.max(0.0);
    let delay_min = ctx.net_delay_minutes.max(0.0);
    let door_mult = if ctx.door_open {
        DOOR_OPEN_SPOILAGE_FACTOR
    } else {
        1.0
    };
    let humidity_mult = if ctx.high_humidity {
        HIGH_HUMIDITY_SPOILAGE_FACTOR
    } else {
        1.0
    };
    let multiplier = door_mult * humidity_mult;
    let known_value = ctx.shipment_value.filter(|value| *value > 0.0);

    for _ in 0..n {
        let mile_cost = uniform(rng, MILE_COST_RANGE.0, MILE_COST_RANGE.1);
        let mph = uniform(
            rng,
            EFFECTIVE_SPEED_RANGE_MPH.0,
            EFFECTIVE_SPEED_RANGE_MPH.1,
        );
        let rate_per_mile = mile_cost * mph / 60.0;
        let handling_fee = uniform(rng, HANDLING_FEE_RANGE.0, HANDLING_FEE_RANGE.1);
        let operating = rate_per_mile * ctx.adjusted_distance + handling_fee;

        // Unknown cargo value is drawn fresh per sample, not per scenario;
        // fixing it once would narrow the output distribution.
        let shipment_value = known_value.unwrap_or_else(|| {
            triangular(
                rng,
                SHIPMENT_VALUE_TRIANGLE.0,
                SHIPMENT_VALUE_TRIANGLE.1,
                SHIPMENT_VALUE_TRIANGLE.2,
            )
        });

        let otif_cost = OTIF_PENALTY_FRACTION * shipment_value;
        let detention_rate = uniform(rng, DETENTION_RATE_RANGE.0, DETENTION_RATE_RANGE.1);
        let delay = otif_cost + detention_rate * delay_min;

        let lambda_early = lambda_early_base * uniform(rng, HAZARD_JITTER_RANGE.0, HAZARD_JITTER_RANGE.1);
        let lambda_late = lambda_late_base * uniform(rng, HAZARD_JITTER_RANGE.0, HAZARD_JITTER_RANGE.1);

        let p_loss = if t <= SPOILAGE_RAMP_START_HOURS {
            1.0 - (-lambda_early * t).exp()
        } else {
            let frac = ((t - SPOILAGE_RAMP_START_HOURS) / SPOILAGE_RAMP_SPAN_HOURS).clamp(0.0, 1.0);
            let lambda_t = lambda_early + frac * (lambda_late - lambda_early);
            1.0 - (-lambda_t * t).exp()
        };

        let spoilage_cost = shipment_value * p_loss * multiplier;

        operating_travel.push(operating);
        delay_service.push(delay);
        spoilage.push(spoilage_cost);
        total_cost.push(operating + delay + spoilage_cost + ctx.fixed_cost);
    }

    SampleSet {
        total_cost,
        operating_travel,
        delay_service,
        spoilage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ACTIONS;
    use crate::rng::SampleStream;
    use crate::stats::mean;

    fn base_row() -> ScenarioRow {
        ScenarioRow {
            truck_id: 1,
            node_id: 0,
            minutes_above_temp: 20.0,
            future_violation_if_continue: 40.0,
            reroute_reduction: 24.0,
            detour_repair_benefit: 40.0,
            slack_minutes: 0.0,
            door_open: false,
            high_humidity: false,
            distance_base_miles: 50.0,
            delay_base_minutes: 10.0,
            spoilage_time_base_hours: 0.5,
            shipment_value: Some(75_000.0),
            recommended_action: None,
        }
    }

    #[test]
    fn violation_rule_continue_inherits_projection() {
        let row = base_row();
        let extra = extra_violation_minutes(ActionKind::Continue, 0.0, &row);
        assert!((extra - 40.0).abs() < 1e-12);
    }

    #[test]
    fn violation_rule_reroute_pays_time_only_when_already_violating() {
        let mut row = base_row();
        // In violation: reduced projection plus the action's own minutes.
        let extra = extra_violation_minutes(ActionKind::Reroute, 48.0, &row);
        assert!((extra - (16.0 + 48.0)).abs() < 1e-12);

        row.minutes_above_temp = 0.0;
        let extra = extra_violation_minutes(ActionKind::Reroute, 48.0, &row);
        assert!((extra - 16.0).abs() < 1e-12);

        row.reroute_reduction = 100.0;
        let extra = extra_violation_minutes(ActionKind::Reroute, 48.0, &row);
        assert!((extra - 0.0).abs() < 1e-12, "reduction floors at zero");
    }

    #[test]
    fn violation_rule_detour_offsets_its_own_time() {
        let row = base_row();
        // 80 extra minutes against a 40-minute repair benefit.
        let extra = extra_violation_minutes(ActionKind::Detour, 80.0, &row);
        assert!((extra - 40.0).abs() < 1e-12);
        let extra = extra_violation_minutes(ActionKind::Detour, 30.0, &row);
        assert!((extra - 0.0).abs() < 1e-12);
    }

    #[test]
    fn detour_context_neutralizes_door_and_humidity() {
        let mut row = base_row();
        row.door_open = true;
        row.high_humidity = true;
        let detour = ActionContext::for_action(ActionKind::Detour.def(), &row);
        assert!(!detour.door_open);
        assert!(!detour.high_humidity);
        let keep = ActionContext::for_action(ActionKind::Continue.def(), &row);
        assert!(keep.door_open);
        assert!(keep.high_humidity);
    }

    #[test]
    fn net_delay_floors_at_zero() {
        let mut row = base_row();
        row.slack_minutes = 500.0;
        let ctx = ActionContext::for_action(ActionKind::Reroute.def(), &row);
        assert!((ctx.net_delay_minutes - 0.0).abs() < 1e-12);
    }

    #[test]
    fn samples_decompose_into_components() {
        let ctx = ActionContext::for_action(ActionKind::Reroute.def(), &base_row());
        let mut stream = SampleStream::from_seed(99);
        let set = simulate_cost_distribution(&ctx, 256, &mut stream);
        assert_eq!(set.total_cost.len(), 256);
        for i in 0..set.total_cost.len() {
            let rebuilt =
                set.operating_travel[i] + set.delay_service[i] + set.spoilage[i] + ctx.fixed_cost;
            assert!((set.total_cost[i] - rebuilt).abs() < 1e-9);
        }
    }

    #[test]
    fn known_shipment_value_skips_the_triangular_draw() {
        let mut known = base_row();
        known.shipment_value = Some(75_000.0);
        let ctx = ActionContext::for_action(ActionKind::Continue.def(), &known);
        let mut stream = SampleStream::from_seed(4);
        simulate_cost_distribution(&ctx, 100, &mut stream);
        let with_value = stream.draws();

        let mut unknown = base_row();
        unknown.shipment_value = None;
        let ctx = ActionContext::for_action(ActionKind::Continue.def(), &unknown);
        let mut stream = SampleStream::from_seed(4);
        simulate_cost_distribution(&ctx, 100, &mut stream);
        assert_eq!(stream.draws(), with_value + 100, "one extra draw per sample");
    }

    #[test]
    fn non_positive_shipment_value_falls_back_to_synthetic() {
        let mut row = base_row();
        row.shipment_value = Some(0.0);
        let ctx = ActionContext::for_action(ActionKind::Continue.def(), &row);
        let mut stream = SampleStream::from_seed(4);
        simulate_cost_distribution(&ctx, 100, &mut stream);
        // 7 draws per sample, not 6.
        assert_eq!(stream.draws(), 700);
    }

    #[test]
    fn all_zero_inputs_produce_finite_near_zero_costs() {
        let row = ScenarioRow {
            truck_id: 0,
            node_id: 0,
            minutes_above_temp: 0.0,
            future_violation_if_continue: 0.0,
            reroute_reduction: 0.0,
            detour_repair_benefit: 0.0,
            slack_minutes: 0.0,
            door_open: false,
            high_humidity: false,
            distance_base_miles: 0.0,
            delay_base_minutes: 0.0,
            spoilage_time_base_hours: 0.0,
            shipment_value: Some(1.0),
            recommended_action: None,
        };
        let ctx = ActionContext::for_action(ActionKind::Continue.def(), &row);
        let mut stream = SampleStream::from_seed(1);
        let set = simulate_cost_distribution(&ctx, 500, &mut stream);
        for value in &set.total_cost {
            assert!(value.is_finite());
            // Handling fee is the only meaningful term left.
            assert!(*value < 600.0, "cost {value} too large for a zero scenario");
        }
    }

    #[test]
    fn longer_exposure_raises_expected_spoilage() {
        let mut short_row = base_row();
        short_row.spoilage_time_base_hours = 0.5;
        let mut long_row = base_row();
        long_row.spoilage_time_base_hours = 5.0;

        let def = &ACTIONS[0];
        let mut stream = SampleStream::from_seed(5);
        let short = simulate_cost_distribution(
            &ActionContext::for_action(def, &short_row),
            5_000,
            &mut stream,
        );
        let mut stream = SampleStream::from_seed(5);
        let long = simulate_cost_distribution(
            &ActionContext::for_action(def, &long_row),
            5_000,
            &mut stream,
        );
        assert!(mean(&long.spoilage) > mean(&short.spoilage) * 2.0);
    }
}
