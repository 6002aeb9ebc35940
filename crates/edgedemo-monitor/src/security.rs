//! Security event monitor
//!
//! Follows an append-only event log. Each poll asks for events at or after
//! the watermark; once a non-empty page is forwarded the watermark moves one
//! second past its newest event. Events sharing the boundary second with a
//! later arrival can be missed, which is accepted.

use crate::Outcome;
use crate::error::{MonitorError, Result};
use crate::settings::{MonitorSettings, watermark_step};
use crate::shutdown::Shutdown;
use crate::sink::EventSink;
use crate::source::{SecurityEvent, SecurityEventSource};
use crate::transition::MonitorEvent;
use chrono::{DateTime, Utc};
use std::time::Duration;

const MONITOR_NAME: &str = "security event";

pub struct SecurityEventMonitor<S> {
    source: S,
    watermark: DateTime<Utc>,
    interval: Duration,
}

impl<S> SecurityEventMonitor<S> {
    /// Start reading `settings.backfill` into the past
    pub fn new(source: S, settings: &MonitorSettings) -> Self {
        Self::starting_at(source, settings.backfill_start(Utc::now()), settings)
    }

    /// Start reading at an explicit watermark
    pub fn starting_at(source: S, watermark: DateTime<Utc>, settings: &MonitorSettings) -> Self {
        Self {
            source,
            watermark,
            interval: settings.interval,
        }
    }

    pub fn watermark(&self) -> DateTime<Utc> {
        self.watermark
    }
}

impl<S: SecurityEventSource> SecurityEventMonitor<S> {
    /// Fetch the events past the watermark and advance it
    pub async fn poll_once(&mut self) -> Result<Vec<SecurityEvent>> {
        let events = self
            .source
            .list_security_events(self.watermark)
            .await
            .map_err(|source| MonitorError::Fetch {
                monitor: MONITOR_NAME,
                source,
            })?;

        if let Some(newest) = events.last() {
            self.watermark = newest.timestamp + watermark_step();
            tracing::debug!(
                count = events.len(),
                watermark = %self.watermark,
                "received security events"
            );
        }

        Ok(events)
    }

    /// Forward events to `sink` until shutdown is requested
    pub async fn run(&mut self, sink: &dyn EventSink, shutdown: &mut Shutdown) -> Result<Outcome> {
        loop {
            if shutdown.is_triggered() {
                return Ok(Outcome::Cancelled);
            }

            let Some(events) = shutdown.cancellable(self.poll_once()).await else {
                return Ok(Outcome::Cancelled);
            };
            for event in events? {
                sink.emit(MonitorEvent::Security(event));
            }

            if !shutdown.sleep(self.interval).await {
                return Ok(Outcome::Cancelled);
            }
        }
    }
}
