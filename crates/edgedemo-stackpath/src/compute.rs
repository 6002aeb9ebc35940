//! Edge Compute workloads and instances

use crate::client::{ResultsPage, StackPathClient, query_time};
use crate::error::Result;
use crate::stack::Stack;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;

const ANYCAST_ANNOTATION: &str = "anycast.platform.stackpath.net";
const ANYCAST_SUBNETS_ANNOTATION: &str = "anycast.platform.stackpath.net/subnets";

/// An Edge Compute workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub id: String,
    pub slug: String,
    pub name: String,

    /// Anycast address fronting every instance, without prefix length
    pub anycast_ip: Option<String>,
}

/// One VM or container of a workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub external_ip_address: Option<String>,
}

/// A group of cities a workload deploys to, with its autoscaling range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentTarget {
    pub name: String,
    pub cities: Vec<String>,
    pub min_replicas: u32,
    pub max_replicas: u32,
    /// Average CPU utilization (percent) that triggers a scale-up
    pub cpu_utilization: u32,
}

impl DeploymentTarget {
    pub fn new(name: impl Into<String>, cities: &[&str]) -> Self {
        Self {
            name: name.into(),
            cities: cities.iter().map(|c| c.to_string()).collect(),
            min_replicas: 1,
            max_replicas: 2,
            cpu_utilization: 50,
        }
    }
}

/// Shape of the container workload to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadTemplate {
    pub name: String,
    pub container_name: String,
    pub image: String,
    pub command: Vec<String>,
    pub port: u16,
    pub cpu: String,
    pub memory: String,
    pub targets: Vec<DeploymentTarget>,
}

impl Default for WorkloadTemplate {
    /// httpbin with access logs on stdout, one CPU and 2 GiB per instance,
    /// in Dallas, Frankfurt and Amsterdam
    fn default() -> Self {
        Self {
            name: "My compute origin".to_string(),
            container_name: "my-app".to_string(),
            image: "kennethreitz/httpbin:latest".to_string(),
            command: [
                "gunicorn",
                "--access-logfile",
                "-",
                "-b",
                "0.0.0.0:80",
                "httpbin:app",
                "-k",
                "gevent",
                "--worker-tmp-dir",
                "/dev/shm",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            port: 80,
            cpu: "1".to_string(),
            memory: "2Gi".to_string(),
            targets: vec![
                DeploymentTarget::new("north-america", &["DFW"]),
                DeploymentTarget::new("europe", &["FRA", "AMS"]),
            ],
        }
    }
}

impl WorkloadTemplate {
    /// Request body for the create workload call
    pub fn to_request(&self) -> serde_json::Value {
        let targets: serde_json::Map<String, serde_json::Value> = self
            .targets
            .iter()
            .map(|target| {
                (
                    target.name.clone(),
                    json!({
                        "spec": {
                            "deploymentScope": "cityCode",
                            "deployments": {
                                "minReplicas": target.min_replicas,
                                "maxReplicas": target.max_replicas,
                                "selectors": [{
                                    "key": "cityCode",
                                    "operator": "in",
                                    "values": target.cities,
                                }],
                                "scaleSettings": {
                                    "metrics": [{
                                        "metric": "cpu",
                                        "averageUtilization": target.cpu_utilization.to_string(),
                                    }]
                                }
                            }
                        }
                    }),
                )
            })
            .collect();

        json!({
            "workload": {
                "name": self.name,
                "metadata": {
                    "version": "1",
                    "annotations": { ANYCAST_ANNOTATION: "true" }
                },
                "spec": {
                    "networkInterfaces": [{ "network": "default" }],
                    "containers": {
                        self.container_name.clone(): {
                            "image": self.image,
                            "command": self.command,
                            "ports": {
                                "http": {
                                    "port": self.port,
                                    "enableImplicitNetworkPolicy": true
                                }
                            },
                            "resources": {
                                "requests": {
                                    "cpu": self.cpu,
                                    "memory": self.memory
                                }
                            }
                        }
                    }
                },
                "targets": targets
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct WorkloadEnvelope {
    workload: ApiWorkload,
}

#[derive(Debug, Deserialize)]
struct ApiWorkload {
    id: String,
    slug: String,
    name: String,
    #[serde(default)]
    metadata: ApiMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ApiMetadata {
    #[serde(default)]
    annotations: HashMap<String, String>,
}

impl From<ApiWorkload> for Workload {
    fn from(api: ApiWorkload) -> Self {
        let anycast_ip = api
            .metadata
            .annotations
            .get(ANYCAST_SUBNETS_ANNOTATION)
            .and_then(|subnet| subnet.split('/').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .map(str::to_string);

        Workload {
            id: api.id,
            slug: api.slug,
            name: api.name,
            anycast_ip,
        }
    }
}

impl StackPathClient {
    /// Create a workload from `template`
    ///
    /// See: https://stackpath.dev/reference/workloads#createworkload
    pub async fn create_workload(
        &self,
        stack: &Stack,
        template: &WorkloadTemplate,
    ) -> Result<Workload> {
        tracing::info!("Creating workload \"{}\" on stack {}", template.name, stack.slug);
        let envelope: WorkloadEnvelope = self
            .post_json(
                &format!("/workload/v1/stacks/{}/workloads", stack.slug),
                &template.to_request(),
            )
            .await?;

        Ok(envelope.workload.into())
    }

    /// Fetch an existing workload by slug or ID
    ///
    /// See: https://stackpath.dev/reference/workloads#getworkload
    pub async fn get_workload(&self, stack: &Stack, workload: &str) -> Result<Workload> {
        let envelope: WorkloadEnvelope = self
            .get_json(
                &format!("/workload/v1/stacks/{}/workloads/{}", stack.slug, workload),
                &[],
            )
            .await?;

        Ok(envelope.workload.into())
    }

    /// List a workload's instances
    ///
    /// See: https://stackpath.dev/reference/instances#getworkloadinstances
    pub async fn list_instances(&self, stack: &Stack, workload: &Workload) -> Result<Vec<Instance>> {
        let page: ResultsPage<Instance> = self
            .get_json(
                &format!(
                    "/workload/v1/stacks/{}/workloads/{}/instances",
                    stack.slug, workload.slug
                ),
                &[],
            )
            .await?;

        Ok(page.results)
    }

    /// Console output of an instance since `since`, one line per log entry,
    /// each prefixed with its timestamp
    ///
    /// See: https://stackpath.dev/reference/instance-logs#getlogs
    pub async fn instance_logs(
        &self,
        stack: &Stack,
        workload: &Workload,
        instance: &str,
        since: DateTime<Utc>,
    ) -> Result<String> {
        self.get_text(
            &format!(
                "/workload/v1/stacks/{}/workloads/{}/instances/{}/logs",
                stack.slug, workload.slug, instance
            ),
            &[
                ("timestamps", "true".to_string()),
                ("since_time", query_time(since)),
            ],
        )
        .await
    }
}
