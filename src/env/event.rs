//! Exogenous events driving the deployment simulation.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Kind of event the agent must react to at a given step.
///
/// Only [`EventKind::AgentArrival`] consults the chosen action; every other
/// kind is resolved by the environment on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EventKind {
    AgentArrival,
    AgentDeparture,
    NodeFailure,
    NodeRecovery,
    NoEvent,
}

impl EventKind {
    /// Number of distinct event kinds.
    pub const COUNT: usize = 5;

    /// Returns all event kinds in index order.
    pub fn all() -> [EventKind; Self::COUNT] {
        [
            EventKind::AgentArrival,
            EventKind::AgentDeparture,
            EventKind::NodeFailure,
            EventKind::NodeRecovery,
            EventKind::NoEvent,
        ]
    }

    /// Returns the position of this kind in [`EventKind::all`] and in the
    /// event probability vector.
    pub fn index(&self) -> usize {
        match self {
            EventKind::AgentArrival => 0,
            EventKind::AgentDeparture => 1,
            EventKind::NodeFailure => 2,
            EventKind::NodeRecovery => 3,
            EventKind::NoEvent => 4,
        }
    }

    /// Inverse of [`EventKind::index`].
    pub fn from_index(index: usize) -> Option<EventKind> {
        Self::all().get(index).copied()
    }

    /// One-hot encoding used as the leading block of every observation.
    pub fn one_hot(&self) -> [f32; Self::COUNT] {
        let mut v = [0.0; Self::COUNT];
        v[self.index()] = 1.0;
        v
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::AgentArrival => write!(f, "agent_arrival"),
            EventKind::AgentDeparture => write!(f, "agent_departure"),
            EventKind::NodeFailure => write!(f, "node_failure"),
            EventKind::NodeRecovery => write!(f, "node_recovery"),
            EventKind::NoEvent => write!(f, "no_event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips() {
        for kind in EventKind::all() {
            assert_eq!(EventKind::from_index(kind.index()), Some(kind));
        }
        assert_eq!(EventKind::from_index(EventKind::COUNT), None);
    }

    #[test]
    fn one_hot_has_single_set_bit() {
        assert_eq!(EventKind::AgentArrival.one_hot(), [1.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(EventKind::NoEvent.one_hot(), [0.0, 0.0, 0.0, 0.0, 1.0]);
        for kind in EventKind::all() {
            assert_eq!(kind.one_hot().iter().sum::<f32>(), 1.0);
        }
    }

    #[test]
    fn display_uses_snake_case() {
        assert_eq!(EventKind::NodeFailure.to_string(), "node_failure");
        assert_eq!(EventKind::NoEvent.to_string(), "no_event");
    }
}
