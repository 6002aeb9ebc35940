//! Monitor tuning

use crate::source::InstancePhase;
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Polling and completion settings shared by the monitors
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Fixed pause between two polls
    pub interval: Duration,

    /// How far back the first fetch of an append-only stream reaches
    pub backfill: TimeDelta,

    /// Bring-up completes only once at least this many instances exist
    pub min_instances: usize,

    /// Phase every instance must reach before bring-up completes
    pub terminal_phase: InstancePhase,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backfill: TimeDelta::days(30),
            min_instances: 3,
            terminal_phase: InstancePhase::Running,
        }
    }
}

impl MonitorSettings {
    /// Initial watermark for a stream opened at `now`
    pub fn backfill_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.backfill
    }
}

/// Distance a watermark moves past the newest record it has seen
pub(crate) fn watermark_step() -> TimeDelta {
    TimeDelta::seconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let settings = MonitorSettings::default();
        assert_eq!(settings.interval, Duration::from_secs(1));
        assert_eq!(settings.min_instances, 3);
        assert_eq!(settings.terminal_phase, InstancePhase::Running);

        let now = Utc.with_ymd_and_hms(2021, 7, 1, 0, 0, 0).unwrap();
        assert_eq!(
            settings.backfill_start(now),
            Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap()
        );
    }
}
