//! Scenario inputs and the telemetry-to-scenario derivation.
//!
//! A `ScenarioRow` is the evaluator's immutable input. It is either supplied
//! pre-derived (API callers, tests) or derived from a raw fleet telemetry
//! snapshot via [`derive_scenario`]. The snapshot side is deliberately loose:
//! every field except the sensor reading itself is optional, and numeric
//! telemetry may arrive as JSON numbers or decimal strings (a quirk of the
//! upstream store), so the serde adapters here accept both.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EDGE_TRAVEL_MINUTES, DEFAULT_SPEED_MPH, DETOUR_BENEFIT_BASE_MINUTES,
    DETOUR_BENEFIT_CAP_MINUTES, DETOUR_BENEFIT_PER_VIOLATION_MINUTE, HIGH_HUMIDITY_THRESHOLD_PCT,
    REROUTE_REDUCTION_RATE, SEGMENT_VIOLATION_RATE,
};

/// One decision-evaluation input, immutable per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRow {
    pub truck_id: i64,
    pub node_id: i64,
    /// Cumulative minutes cargo has already spent outside its safe band.
    pub minutes_above_temp: f64,
    /// Projected additional out-of-band minutes if nothing is done.
    pub future_violation_if_continue: f64,
    /// Projected violation minutes avoided by rerouting.
    pub reroute_reduction: f64,
    /// Violation minutes avoided by a physical service stop.
    pub detour_repair_benefit: f64,
    /// Remaining schedule buffer; negative means already late.
    pub slack_minutes: f64,
    #[serde(with = "flag")]
    pub door_open: bool,
    #[serde(with = "flag")]
    pub high_humidity: bool,
    pub distance_base_miles: f64,
    pub delay_base_minutes: f64,
    pub spoilage_time_base_hours: f64,
    /// Known cargo value; `None` makes the simulator draw one per sample.
    #[serde(default)]
    pub shipment_value: Option<f64>,
    /// Externally-supplied action from an upstream planner, if any.
    #[serde(default)]
    pub recommended_action: Option<String>,
}

impl ScenarioRow {
    /// Parse a row from JSON.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error when the JSON does not describe a
    /// scenario row.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Echo block of the scenario fields carried into the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInputs {
    pub minutes_above_temp: f64,
    pub future_violation_if_continue: f64,
    pub reroute_reduction: f64,
    pub detour_repair_benefit: f64,
    pub slack_minutes: f64,
    #[serde(with = "flag")]
    pub door_open: bool,
    #[serde(with = "flag")]
    pub high_humidity: bool,
    pub distance_base_miles: f64,
    pub delay_base_minutes: f64,
    pub spoilage_time_base_hours: f64,
    pub shipment_value: Option<f64>,
}

impl ScenarioInputs {
    #[must_use]
    pub fn from_row(row: &ScenarioRow) -> Self {
        Self {
            minutes_above_temp: row.minutes_above_temp,
            future_violation_if_continue: row.future_violation_if_continue,
            reroute_reduction: row.reroute_reduction,
            detour_repair_benefit: row.detour_repair_benefit,
            slack_minutes: row.slack_minutes,
            door_open: row.door_open,
            high_humidity: row.high_humidity,
            distance_base_miles: row.distance_base_miles,
            delay_base_minutes: row.delay_base_minutes,
            spoilage_time_base_hours: row.spoilage_time_base_hours,
            shipment_value: row.shipment_value,
        }
    }
}

/// Raw per-truck record from the fleet store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub truck_id: i64,
    #[serde(default)]
    pub gps: Option<GpsFix>,
    #[serde(default)]
    pub sensor: Option<SensorReading>,
    #[serde(default)]
    pub decision: Option<RoutingDecision>,
}

/// Latest GPS fix; may lag or be absent entirely.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GpsFix {
    #[serde(default)]
    pub current_node: Option<i64>,
    #[serde(default)]
    pub speed_mph: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub edge_travel_time_min: Option<f64>,
}

/// Latest cargo sensor reading; mandatory for deriving a scenario.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(default)]
    pub current_node: Option<i64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub violation_min: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub edge_travel_time_min: Option<f64>,
    #[serde(default)]
    pub remaining_slack_min: Option<f64>,
    #[serde(default, deserialize_with = "loose::number")]
    pub humidity_pct: Option<f64>,
    #[serde(default, deserialize_with = "flag::loose")]
    pub door_open: bool,
    #[serde(default)]
    pub shipment_value: Option<f64>,
}

/// Prior routing decision from an upstream planner, if one exists.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoutingDecision {
    #[serde(default)]
    pub recommended_action: Option<String>,
}

/// Map a raw telemetry snapshot into the scenario the evaluator consumes.
///
/// Returns `None` when the snapshot carries no sensor reading; a truck with
/// no cargo telemetry yet is skipped for the cycle, not an error. All other
/// missing fields resolve to documented defaults.
#[must_use]
pub fn derive_scenario(truck: &TelemetrySnapshot) -> Option<ScenarioRow> {
    let sensor = truck.sensor.as_ref()?;
    let gps = truck.gps.as_ref();

    let minutes_above_temp = sensor.violation_min.unwrap_or(0.0);
    let edge_travel_min = sensor
        .edge_travel_time_min
        .or_else(|| gps.and_then(|fix| fix.edge_travel_time_min))
        .unwrap_or(DEFAULT_EDGE_TRAVEL_MINUTES);
    let speed_mph = gps
        .and_then(|fix| fix.speed_mph)
        .unwrap_or(DEFAULT_SPEED_MPH);
    let slack_min = sensor.remaining_slack_min.unwrap_or(0.0);
    let humidity_pct = sensor.humidity_pct.unwrap_or(0.0);

    // Risk accrues over the remaining segment at a fixed 30% of travel time.
    let future_violation = minutes_above_temp + edge_travel_min * SEGMENT_VIOLATION_RATE;
    let lateness_min = (-slack_min).max(0.0);

    Some(ScenarioRow {
        truck_id: truck.truck_id,
        node_id: sensor
            .current_node
            .or_else(|| gps.and_then(|fix| fix.current_node))
            .unwrap_or(0),
        minutes_above_temp,
        future_violation_if_continue: future_violation,
        reroute_reduction: future_violation * REROUTE_REDUCTION_RATE,
        detour_repair_benefit: DETOUR_BENEFIT_CAP_MINUTES.min(
            DETOUR_BENEFIT_BASE_MINUTES
                + minutes_above_temp * DETOUR_BENEFIT_PER_VIOLATION_MINUTE,
        ),
        slack_minutes: slack_min.max(0.0),
        door_open: sensor.door_open,
        high_humidity: humidity_pct >= HIGH_HUMIDITY_THRESHOLD_PCT,
        distance_base_miles: edge_travel_min * speed_mph / 60.0,
        delay_base_minutes: lateness_min,
        spoilage_time_base_hours: lateness_min / 60.0,
        shipment_value: sensor.shipment_value,
        recommended_action: truck
            .decision
            .as_ref()
            .and_then(|decision| decision.recommended_action.clone()),
    })
}

/// 0/1 wire encoding for boolean flags, accepting JSON booleans on input.
mod flag {
    use serde::de::{self, Deserializer, Unexpected, Visitor};
    use serde::ser::Serializer;
    use std::fmt;

    struct FlagVisitor;

    impl Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a boolean or a 0/1 flag")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<bool, E> {
            Ok(value != 0)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<bool, E> {
            Ok(value != 0)
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<bool, E> {
            if value == 0.0 || value == 1.0 {
                Ok(value != 0.0)
            } else {
                Err(de::Error::invalid_value(Unexpected::Float(value), &self))
            }
        }
    }

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(FlagVisitor)
    }

    /// Optional variant for telemetry fields, defaulting to `false`.
    pub fn loose<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        use serde::Deserialize;

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Bool(bool),
            Number(f64),
        }

        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Raw::Bool(value)) => value,
            Some(Raw::Number(value)) => value != 0.0,
            None => false,
        })
    }
}

/// Number-or-decimal-string telemetry fields.
mod loose {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    /// Unparseable strings resolve to `None`, which falls through to the
    /// field's documented default downstream.
    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Raw::Number(value)) => Some(value),
            Some(Raw::Text(text)) => text.trim().parse().ok(),
            None => None,
        })
    }
}
