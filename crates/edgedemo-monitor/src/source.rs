//! Remote collaborators consumed by the monitors
//!
//! The monitors never build requests or parse payloads themselves. Anything
//! that can list instances, read their console logs or page through security
//! events implements these traits; the StackPath client does, and so do the
//! scripted fakes in the tests.

use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Lists the current instances of a workload
#[async_trait]
pub trait InstanceSource: Send + Sync {
    async fn list_instances(&self) -> Result<Vec<InstanceInfo>, FetchError>;
}

/// Reads an instance's console output
#[async_trait]
pub trait InstanceLogSource: Send + Sync {
    /// Returns every log line written since `since` as one newline-delimited blob
    async fn instance_logs(
        &self,
        instance: &str,
        since: DateTime<Utc>,
    ) -> Result<String, FetchError>;
}

/// Pages through the append-only security event log
#[async_trait]
pub trait SecurityEventSource: Send + Sync {
    /// Returns events with a timestamp at or after `since`, oldest first
    async fn list_security_events(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SecurityEvent>, FetchError>;
}

#[async_trait]
impl<T: InstanceSource + ?Sized> InstanceSource for Arc<T> {
    async fn list_instances(&self) -> Result<Vec<InstanceInfo>, FetchError> {
        (**self).list_instances().await
    }
}

#[async_trait]
impl<T: InstanceLogSource + ?Sized> InstanceLogSource for Arc<T> {
    async fn instance_logs(
        &self,
        instance: &str,
        since: DateTime<Utc>,
    ) -> Result<String, FetchError> {
        (**self).instance_logs(instance, since).await
    }
}

#[async_trait]
impl<T: SecurityEventSource + ?Sized> SecurityEventSource for Arc<T> {
    async fn list_security_events(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SecurityEvent>, FetchError> {
        (**self).list_security_events(since).await
    }
}

/// Lifecycle phase of a compute instance
///
/// Phases the platform reports that are not listed here are kept verbatim in
/// [`InstancePhase::Other`] so they still take part in change detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstancePhase {
    Pending,
    Scheduling,
    Starting,
    Running,
    Stopped,
    Failed,
    Completed,
    Deleting,
    Other(String),
}

impl InstancePhase {
    /// The platform's spelling of the phase
    pub fn as_str(&self) -> &str {
        match self {
            InstancePhase::Pending => "PENDING",
            InstancePhase::Scheduling => "SCHEDULING",
            InstancePhase::Starting => "STARTING",
            InstancePhase::Running => "RUNNING",
            InstancePhase::Stopped => "STOPPED",
            InstancePhase::Failed => "FAILED",
            InstancePhase::Completed => "COMPLETED",
            InstancePhase::Deleting => "DELETING",
            InstancePhase::Other(phase) => phase,
        }
    }
}

impl From<&str> for InstancePhase {
    fn from(phase: &str) -> Self {
        match phase.trim().to_ascii_uppercase().as_str() {
            "PENDING" => InstancePhase::Pending,
            "SCHEDULING" => InstancePhase::Scheduling,
            "STARTING" => InstancePhase::Starting,
            "RUNNING" => InstancePhase::Running,
            "STOPPED" => InstancePhase::Stopped,
            "FAILED" => InstancePhase::Failed,
            "COMPLETED" => InstancePhase::Completed,
            "DELETING" => InstancePhase::Deleting,
            _ => InstancePhase::Other(phase.to_string()),
        }
    }
}

impl From<String> for InstancePhase {
    fn from(phase: String) -> Self {
        InstancePhase::from(phase.as_str())
    }
}

impl From<InstancePhase> for String {
    fn from(phase: InstancePhase) -> Self {
        phase.as_str().to_string()
    }
}

impl FromStr for InstancePhase {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(InstancePhase::from(s))
    }
}

impl fmt::Display for InstancePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str().to_lowercase())
    }
}

/// One instance as seen by a single poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    /// Instance name, unique within the workload
    pub name: String,

    pub phase: InstancePhase,
}

impl InstanceInfo {
    pub fn new(name: impl Into<String>, phase: impl Into<InstancePhase>) -> Self {
        Self {
            name: name.into(),
            phase: phase.into(),
        }
    }
}

/// A request recorded by the web application firewall
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: String,

    /// When the request reached the edge
    pub timestamp: DateTime<Utc>,

    /// What the firewall did (ALLOW, BLOCK, ...)
    pub action: String,

    pub method: String,
    pub path: String,
    pub client_ip: String,
    pub country: String,
    pub user_agent: String,

    /// Name of the rule that matched, if any
    pub rule_name: Option<String>,
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = match self.rule_name.as_deref() {
            Some(name) if !name.is_empty() => format!(": {}", name),
            _ => String::new(),
        };

        write!(
            f,
            "[WAF {}{}] {} {} {} - {} ({}) - {}",
            self.action,
            rule,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.method,
            self.path,
            self.client_ip,
            self.country,
            self.user_agent
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_phase_parsing() {
        assert_eq!(InstancePhase::from("RUNNING"), InstancePhase::Running);
        assert_eq!(InstancePhase::from("running"), InstancePhase::Running);
        assert_eq!(
            InstancePhase::from("MIGRATING"),
            InstancePhase::Other("MIGRATING".to_string())
        );
        assert_eq!("STOPPED".parse::<InstancePhase>(), Ok(InstancePhase::Stopped));
    }

    #[test]
    fn test_phase_display_is_lowercase() {
        assert_eq!(InstancePhase::Pending.to_string(), "pending");
        assert_eq!(InstancePhase::Other("MIGRATING".into()).to_string(), "migrating");
    }

    #[test]
    fn test_phase_deserializes_from_platform_string() {
        let info: InstanceInfo =
            serde_json::from_str(r#"{"name":"web-dfw-0","phase":"STARTING"}"#).unwrap();
        assert_eq!(info, InstanceInfo::new("web-dfw-0", InstancePhase::Starting));
    }

    #[test]
    fn test_security_event_display() {
        let mut event = SecurityEvent {
            id: "req-1".to_string(),
            timestamp: Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap(),
            action: "BLOCK".to_string(),
            method: "GET".to_string(),
            path: "/blockme".to_string(),
            client_ip: "203.0.113.9".to_string(),
            country: "NL".to_string(),
            user_agent: "curl/7.68.0".to_string(),
            rule_name: Some("block access to blockme".to_string()),
        };

        assert_eq!(
            event.to_string(),
            "[WAF BLOCK: block access to blockme] 2021-06-01T12:00:00Z GET /blockme - 203.0.113.9 (NL) - curl/7.68.0"
        );

        event.action = "ALLOW".to_string();
        event.rule_name = Some(String::new());
        assert!(event.to_string().starts_with("[WAF ALLOW] "));
    }
}
