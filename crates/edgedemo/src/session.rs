use crate::progress;
use anyhow::Context;
use chrono::TimeDelta;
use edgedemo_config::{DemoConfig, MonitorConfig};
use edgedemo_monitor::{InstancePhase, MonitorSettings};
use edgedemo_stackpath::{ClientConfig, Stack, StackPathClient};
use std::sync::Arc;
use std::time::Duration;

/// An authenticated client and the stack everything lives on
pub struct Session {
    pub client: Arc<StackPathClient>,
    pub stack: Stack,
}

impl Session {
    /// Authenticate and locate the configured stack, one step each
    ///
    /// The config must have passed validation.
    pub async fn connect(config: &DemoConfig) -> anyhow::Result<Self> {
        let client_config = client_config(config)?;
        let client = progress::step(
            "Authenticating to StackPath",
            async {
                StackPathClient::authenticate(&client_config)
                    .await
                    .context("Error authenticating to StackPath")
            },
            |_| "Done".to_string(),
        )
        .await?;

        let slug = config
            .stackpath
            .stack
            .as_deref()
            .context("stackpath.stack is not set")?;
        let stack = progress::step(
            format!("Locating the \"{}\" stack", slug),
            async {
                client
                    .find_stack_by_slug(slug)
                    .await
                    .context("Error locating the stack")?
                    .with_context(|| format!("Stack \"{}\" was not found", slug))
            },
            |stack| format!("Done: found stack \"{}\" (ID: {})", stack.name, stack.id),
        )
        .await?;

        tracing::info!(
            "Connected to stack {} ({}) at {}",
            stack.slug,
            stack.id,
            client.base_url()
        );
        Ok(Self {
            client: Arc::new(client),
            stack,
        })
    }
}

fn client_config(config: &DemoConfig) -> anyhow::Result<ClientConfig> {
    let stackpath = &config.stackpath;
    let client_id = stackpath
        .client_id
        .as_deref()
        .context("stackpath.client_id is not set")?;
    let client_secret = stackpath
        .client_secret
        .as_deref()
        .context("stackpath.client_secret is not set")?;

    let mut client_config = ClientConfig::new(client_id, client_secret)
        .with_base_url(stackpath.api_url.as_str())
        .with_timeout(Duration::from_secs(stackpath.request_timeout_secs));
    if let Some(user_agent) = stackpath.user_agent.as_deref() {
        client_config = client_config.with_user_agent(user_agent);
    }
    Ok(client_config)
}

pub fn monitor_settings(config: &MonitorConfig) -> MonitorSettings {
    MonitorSettings {
        interval: Duration::from_secs(config.poll_interval_secs),
        backfill: TimeDelta::days(i64::from(config.backfill_days)),
        min_instances: config.min_instances,
        terminal_phase: InstancePhase::from(config.terminal_phase.as_str()),
    }
}
