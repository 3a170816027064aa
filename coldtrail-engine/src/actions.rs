//! The candidate-action catalog.
//!
//! Changing any penalty here changes the decision policy, so the table is a
//! versioned constant rather than configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::DISTANCE_INFLATION_DIVISOR_MINUTES;

/// One of the three candidate responses to a telemetry scenario.
///
/// The declaration order is the catalog order: it fixes both the simulation
/// order within one evaluation and the tie-break order when scores are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Continue,
    Reroute,
    Detour,
}

impl ActionKind {
    /// Wire name of this action.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Reroute => "reroute",
            Self::Detour => "detour",
        }
    }

    /// Parse an externally-supplied action name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "continue" => Some(Self::Continue),
            "reroute" => Some(Self::Reroute),
            "detour" => Some(Self::Detour),
            _ => None,
        }
    }

    /// Static definition for this action.
    #[must_use]
    pub const fn def(self) -> &'static ActionDef {
        match self {
            Self::Continue => &ACTIONS[0],
            Self::Reroute => &ACTIONS[1],
            Self::Detour => &ACTIONS[2],
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed time and cost penalties for one candidate action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub kind: ActionKind,
    pub extra_travel_minutes: f64,
    pub extra_handling_minutes: f64,
    pub fixed_cost: f64,
}

impl ActionDef {
    /// Total extra minutes this action adds to the trip.
    #[must_use]
    pub const fn extra_time_minutes(&self) -> f64 {
        self.extra_travel_minutes + self.extra_handling_minutes
    }

    /// Effective distance after the action's extra minutes inflate the base,
    /// a proxy for added fuel and wear.
    #[must_use]
    pub fn adjusted_distance(&self, distance_base_miles: f64) -> f64 {
        distance_base_miles * (1.0 + self.extra_time_minutes() / DISTANCE_INFLATION_DIVISOR_MINUTES)
    }
}

/// The catalog, in evaluation order.
pub const ACTIONS: [ActionDef; 3] = [
    ActionDef {
        kind: ActionKind::Continue,
        extra_travel_minutes: 0.0,
        extra_handling_minutes: 0.0,
        fixed_cost: 0.0,
    },
    ActionDef {
        kind: ActionKind::Reroute,
        extra_travel_minutes: 45.0,
        extra_handling_minutes: 3.0,
        fixed_cost: 500.0,
    },
    ActionDef {
        kind: ActionKind::Detour,
        extra_travel_minutes: 30.0,
        extra_handling_minutes: 50.0,
        fixed_cost: 2000.0,
    },
];
