use colored::{Color, Colorize};
use edgedemo_monitor::{EventSink, MonitorEvent, Transition};
use indicatif::ProgressBar;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

// Colors handed out to instances in order of first appearance
const INSTANCE_COLORS: [Color; 5] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
];

/// Prints monitor events to stdout, one colored line each
pub struct ConsoleSink {
    colors: Mutex<HashMap<String, Color>>,
    above: Option<ProgressBar>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            colors: Mutex::new(HashMap::new()),
            above: None,
        }
    }

    /// Print above a running spinner instead of through it
    pub fn above(progress_bar: ProgressBar) -> Self {
        Self {
            colors: Mutex::new(HashMap::new()),
            above: Some(progress_bar),
        }
    }

    fn color_for(&self, instance: &str) -> Color {
        let mut colors = self.colors.lock().unwrap_or_else(PoisonError::into_inner);
        let next = INSTANCE_COLORS[colors.len() % INSTANCE_COLORS.len()];
        *colors.entry(instance.to_string()).or_insert(next)
    }

    pub fn render(&self, event: &MonitorEvent) -> String {
        match event {
            MonitorEvent::Instance(transition) => {
                let prefix = format!("[{}]", transition.key())
                    .color(self.color_for(transition.key()))
                    .bold();
                let text = match transition {
                    Transition::Appeared { value, .. } => {
                        format!("new instance is {}", value.to_string().bold())
                    }
                    Transition::Changed { new, .. } => {
                        format!("instance is now {}", new.to_string().bold())
                    }
                    Transition::Disappeared { .. } => "instance went away".dimmed().to_string(),
                };
                format!("{} {}", prefix, text)
            }
            MonitorEvent::InstanceLog { instance, line } => {
                let prefix = format!("[{}]", instance).color(self.color_for(instance));
                format!("{} {}", prefix, line)
            }
            MonitorEvent::Security(security) => {
                let line = security.to_string();
                match security.action.as_str() {
                    "BLOCK" => line.red().to_string(),
                    "ALLOW" => line.green().to_string(),
                    _ => line,
                }
            }
        }
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: MonitorEvent) {
        let line = self.render(&event);
        match &self.above {
            // a hidden bar (stdout is not a terminal) swallows println
            Some(pb) if !pb.is_hidden() => pb.println(line),
            _ => println!("{}", line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use edgedemo_monitor::{InstancePhase, SecurityEvent};

    fn plain() -> ConsoleSink {
        colored::control::set_override(false);
        ConsoleSink::new()
    }

    #[test]
    fn test_instance_lines() {
        let sink = plain();

        let appeared = MonitorEvent::Instance(Transition::Appeared {
            key: "origin-europe-fra-0".to_string(),
            value: InstancePhase::Starting,
        });
        assert_eq!(
            sink.render(&appeared),
            "[origin-europe-fra-0] new instance is starting"
        );

        let changed = MonitorEvent::Instance(Transition::Changed {
            key: "origin-europe-fra-0".to_string(),
            old: InstancePhase::Starting,
            new: InstancePhase::Running,
        });
        assert_eq!(
            sink.render(&changed),
            "[origin-europe-fra-0] instance is now running"
        );

        let gone = MonitorEvent::Instance(Transition::Disappeared {
            key: "origin-europe-fra-0".to_string(),
            last: InstancePhase::Running,
        });
        assert_eq!(sink.render(&gone), "[origin-europe-fra-0] instance went away");
    }

    #[test]
    fn test_lines_match_event_display() {
        let sink = plain();
        let events = [
            MonitorEvent::InstanceLog {
                instance: "origin-na-dfw-0".to_string(),
                line: "GET /anything 200".to_string(),
            },
            MonitorEvent::Security(SecurityEvent {
                id: "r-1".to_string(),
                timestamp: Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap(),
                action: "BLOCK".to_string(),
                method: "GET".to_string(),
                path: "/blockme".to_string(),
                client_ip: "203.0.113.5".to_string(),
                country: "US".to_string(),
                user_agent: "curl/7.68.0".to_string(),
                rule_name: Some("block access to blockme".to_string()),
            }),
        ];

        for event in &events {
            assert_eq!(sink.render(event), event.to_string());
        }
    }

    #[test]
    fn test_instances_keep_their_color() {
        let sink = ConsoleSink::new();
        let first = sink.color_for("a");
        let second = sink.color_for("b");

        assert_ne!(first, second);
        assert_eq!(sink.color_for("a"), first);
    }
}
