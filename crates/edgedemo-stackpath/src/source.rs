//! Monitor sources backed by the StackPath API

use crate::client::StackPathClient;
use crate::compute::Workload;
use crate::delivery::Site;
use crate::stack::Stack;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use edgedemo_monitor::{
    FetchError, InstanceInfo, InstanceLogSource, InstanceSource, SecurityEvent,
    SecurityEventSource,
};
use std::sync::Arc;

/// The instances of one workload
#[derive(Debug, Clone)]
pub struct WorkloadInstances {
    client: Arc<StackPathClient>,
    stack: Stack,
    workload: Workload,
}

impl WorkloadInstances {
    pub fn new(client: Arc<StackPathClient>, stack: Stack, workload: Workload) -> Self {
        Self {
            client,
            stack,
            workload,
        }
    }
}

#[async_trait]
impl InstanceSource for WorkloadInstances {
    async fn list_instances(&self) -> Result<Vec<InstanceInfo>, FetchError> {
        let instances = self
            .client
            .list_instances(&self.stack, &self.workload)
            .await?;

        Ok(instances
            .into_iter()
            .map(|instance| InstanceInfo::new(instance.name, instance.phase))
            .collect())
    }
}

#[async_trait]
impl InstanceLogSource for WorkloadInstances {
    async fn instance_logs(
        &self,
        instance: &str,
        since: DateTime<Utc>,
    ) -> Result<String, FetchError> {
        Ok(self
            .client
            .instance_logs(&self.stack, &self.workload, instance, since)
            .await?)
    }
}

/// The WAF request log of one site
#[derive(Debug, Clone)]
pub struct SiteRequests {
    client: Arc<StackPathClient>,
    stack: Stack,
    site: Site,
}

impl SiteRequests {
    pub fn new(client: Arc<StackPathClient>, stack: Stack, site: Site) -> Self {
        Self {
            client,
            stack,
            site,
        }
    }
}

#[async_trait]
impl SecurityEventSource for SiteRequests {
    async fn list_security_events(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SecurityEvent>, FetchError> {
        let requests = self
            .client
            .list_waf_requests(&self.stack, &self.site, since)
            .await?;

        let mut events: Vec<SecurityEvent> = requests.into_iter().map(SecurityEvent::from).collect();
        // the monitor expects oldest first
        events.sort_by_key(|event| event.timestamp);
        Ok(events)
    }
}
