//! Transition types emitted by the monitors

use crate::source::{InstancePhase, SecurityEvent};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of change a monitor observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    /// A key not present in the previous observation
    Appeared,
    /// A known key whose value differs from the recorded one
    Changed,
    /// A recorded key missing from the current observation
    Disappeared,
    /// A record from an append-only stream
    NewRecord,
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::Appeared => write!(f, "appeared"),
            TransitionKind::Changed => write!(f, "changed"),
            TransitionKind::Disappeared => write!(f, "disappeared"),
            TransitionKind::NewRecord => write!(f, "new-record"),
        }
    }
}

/// A detected change between two observations of a keyed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<V> {
    Appeared { key: String, value: V },
    Changed { key: String, old: V, new: V },
    Disappeared { key: String, last: V },
}

impl<V> Transition<V> {
    pub fn kind(&self) -> TransitionKind {
        match self {
            Transition::Appeared { .. } => TransitionKind::Appeared,
            Transition::Changed { .. } => TransitionKind::Changed,
            Transition::Disappeared { .. } => TransitionKind::Disappeared,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Transition::Appeared { key, .. }
            | Transition::Changed { key, .. }
            | Transition::Disappeared { key, .. } => key,
        }
    }

    /// The value recorded before this transition
    pub fn old_value(&self) -> Option<&V> {
        match self {
            Transition::Appeared { .. } => None,
            Transition::Changed { old, .. } => Some(old),
            Transition::Disappeared { last, .. } => Some(last),
        }
    }

    /// The value recorded after this transition
    pub fn new_value(&self) -> Option<&V> {
        match self {
            Transition::Appeared { value, .. } => Some(value),
            Transition::Changed { new, .. } => Some(new),
            Transition::Disappeared { .. } => None,
        }
    }
}

/// Everything a monitor hands to its sink, one console line each
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    Instance(Transition<InstancePhase>),
    InstanceLog { instance: String, line: String },
    Security(SecurityEvent),
}

impl MonitorEvent {
    pub fn kind(&self) -> TransitionKind {
        match self {
            MonitorEvent::Instance(transition) => transition.kind(),
            MonitorEvent::InstanceLog { .. } | MonitorEvent::Security(_) => {
                TransitionKind::NewRecord
            }
        }
    }
}

impl fmt::Display for MonitorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorEvent::Instance(Transition::Appeared { key, value }) => {
                write!(f, "[{}] new instance is {}", key, value)
            }
            MonitorEvent::Instance(Transition::Changed { key, new, .. }) => {
                write!(f, "[{}] instance is now {}", key, new)
            }
            MonitorEvent::Instance(Transition::Disappeared { key, .. }) => {
                write!(f, "[{}] instance went away", key)
            }
            MonitorEvent::InstanceLog { instance, line } => write!(f, "[{}] {}", instance, line),
            MonitorEvent::Security(event) => write!(f, "{}", event),
        }
    }
}
