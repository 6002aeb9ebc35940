//! Per-instance watermarks for console log tailing
//!
//! Log lines are requested with timestamps, so each blob carries its own
//! clock. The next fetch starts one step past the newest line seen. Lines
//! without a readable timestamp fall back to the time the cycle started,
//! taken before the fetch was issued.

use crate::settings::watermark_step;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct LogCursor {
    initial: DateTime<Utc>,
    watermarks: HashMap<String, DateTime<Utc>>,
}

impl LogCursor {
    /// `initial` is where instances with no history start reading
    pub fn new(initial: DateTime<Utc>) -> Self {
        Self {
            initial,
            watermarks: HashMap::new(),
        }
    }

    pub fn since(&self, instance: &str) -> DateTime<Utc> {
        self.watermarks
            .get(instance)
            .copied()
            .unwrap_or(self.initial)
    }

    /// Split a fetched blob into printable lines and move the instance's
    /// watermark past them. An empty blob leaves the watermark alone.
    pub fn advance(
        &mut self,
        instance: &str,
        blob: &str,
        cycle_start: DateTime<Utc>,
    ) -> Vec<String> {
        let lines: Vec<String> = blob
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();

        if lines.is_empty() {
            return lines;
        }

        let next = lines
            .iter()
            .filter_map(|line| line_timestamp(line))
            .max()
            .map(|newest| newest + watermark_step())
            .unwrap_or(cycle_start);

        let current = self.since(instance);
        self.watermarks
            .insert(instance.to_string(), next.max(current));

        lines
    }

    /// Drop the watermark of an instance that went away
    pub fn forget(&mut self, instance: &str) {
        self.watermarks.remove(instance);
    }
}

/// Leading RFC 3339 timestamp of a log line, if present
fn line_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let token = line.split_whitespace().next()?;
    DateTime::parse_from_rfc3339(token)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_unknown_instance_starts_at_initial() {
        let cursor = LogCursor::new(at(0, 0, 0));
        assert_eq!(cursor.since("web-fra-0"), at(0, 0, 0));
    }

    #[test]
    fn test_advances_past_newest_line() {
        let mut cursor = LogCursor::new(at(0, 0, 0));
        let blob = "2021-06-01T12:00:01Z GET / 200\n\
                    2021-06-01T12:00:05.250Z GET /anything 200\n\
                    \n";

        let lines = cursor.advance("web-fra-0", blob, at(13, 0, 0));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "2021-06-01T12:00:05.250Z GET /anything 200");
        assert_eq!(
            cursor.since("web-fra-0"),
            at(12, 0, 6) + chrono::TimeDelta::milliseconds(250)
        );
    }

    #[test]
    fn test_empty_blob_keeps_watermark() {
        let mut cursor = LogCursor::new(at(0, 0, 0));
        cursor.advance("web-fra-0", "2021-06-01T12:00:00Z booted\n", at(13, 0, 0));

        assert!(cursor.advance("web-fra-0", "", at(14, 0, 0)).is_empty());
        assert_eq!(cursor.since("web-fra-0"), at(12, 0, 1));
    }

    #[test]
    fn test_untimestamped_lines_use_cycle_start() {
        let mut cursor = LogCursor::new(at(0, 0, 0));
        let lines = cursor.advance("web-fra-0", "plain line\nanother\n", at(13, 0, 0));

        assert_eq!(lines, vec!["plain line", "another"]);
        assert_eq!(cursor.since("web-fra-0"), at(13, 0, 0));
    }

    #[test]
    fn test_watermark_never_moves_back() {
        let mut cursor = LogCursor::new(at(0, 0, 0));
        cursor.advance("web-fra-0", "2021-06-01T12:00:00Z a\n", at(13, 0, 0));
        cursor.advance("web-fra-0", "2021-06-01T11:00:00Z late\n", at(13, 0, 1));

        assert_eq!(cursor.since("web-fra-0"), at(12, 0, 1));
    }

    #[test]
    fn test_forget_resets_to_initial() {
        let mut cursor = LogCursor::new(at(0, 0, 0));
        cursor.advance("web-fra-0", "2021-06-01T12:00:00Z a\n", at(13, 0, 0));
        cursor.forget("web-fra-0");

        assert_eq!(cursor.since("web-fra-0"), at(0, 0, 0));
    }
}
