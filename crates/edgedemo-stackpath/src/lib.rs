//! StackPath API client for Edge Demo
//!
//! A thin client over the StackPath REST API covering what the demo needs:
//! stacks, DNS zones and records, Edge Compute workloads and their instances,
//! CDN sites, certificates and the WAF.
//!
//! # Requirements
//!
//! - An API client ID and secret (Account > API Management)
//! - An existing stack and a DNS zone provisioned on it
//!
//! # Example
//!
//! ```ignore
//! use edgedemo_stackpath::{ClientConfig, StackPathClient};
//!
//! let config = ClientConfig::new("client-id", "client-secret");
//! let client = StackPathClient::authenticate(&config).await?;
//!
//! let stack = client.find_stack_by_slug("my-stack").await?;
//! ```
//!
//! # Monitoring
//!
//! [`WorkloadInstances`] and [`SiteRequests`] plug the client into the
//! monitors of `edgedemo-monitor`.

pub mod client;
pub mod compute;
pub mod delivery;
pub mod dns;
pub mod error;
pub mod source;
pub mod stack;
pub mod waf;

pub use client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, StackPathClient};
pub use compute::{DeploymentTarget, Instance, Workload, WorkloadTemplate};
pub use delivery::Site;
pub use dns::Zone;
pub use error::{Result, StackPathError};
pub use source::{SiteRequests, WorkloadInstances};
pub use stack::Stack;
pub use waf::{RuleAction, WafRequest, WafRule, demo_rules};
