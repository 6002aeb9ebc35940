//! Output sinks for monitor events

use crate::transition::MonitorEvent;
use std::sync::Mutex;

/// Receives every event a monitor emits, in emission order.
///
/// Implementations must write each event as a single line; sinks shared by
/// several monitors may interleave lines but never split one.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: MonitorEvent);
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<MonitorEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return everything collected so far
    pub fn take(&self) -> Vec<MonitorEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: MonitorEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
