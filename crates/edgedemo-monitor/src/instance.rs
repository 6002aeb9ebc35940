//! Instance phase monitor
//!
//! Polls a workload's instances and reports phase transitions. Two completion
//! policies are supported:
//!
//! - **Bring-up**: stop once enough instances exist and all of them reached
//!   the terminal phase. Instances missing from a poll are not reported.
//! - **Continuous**: never stop on its own, report instances that went away
//!   and tail every instance's console log.

use crate::error::{MonitorError, Result};
use crate::logs::LogCursor;
use crate::settings::MonitorSettings;
use crate::shutdown::Shutdown;
use crate::sink::EventSink;
use crate::source::{InstanceLogSource, InstancePhase, InstanceSource};
use crate::state::ObservedState;
use crate::transition::{MonitorEvent, Transition};
use crate::Outcome;
use chrono::{DateTime, Utc};
use std::time::Duration;

const MONITOR_NAME: &str = "instance";

/// When an instance monitor considers its job done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionPolicy {
    BringUp {
        min_instances: usize,
        terminal_phase: InstancePhase,
    },
    Continuous,
}

impl CompletionPolicy {
    /// Whether recorded instances missing from a poll are reported and dropped
    pub fn reconciles(&self) -> bool {
        matches!(self, CompletionPolicy::Continuous)
    }
}

/// Result of a single poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cycle {
    /// Transitions since the previous poll, in emission order
    pub transitions: Vec<Transition<InstancePhase>>,

    /// Names in the current poll, first occurrence order, duplicates removed
    pub instances: Vec<String>,

    /// The completion policy is satisfied
    pub complete: bool,
}

impl Cycle {
    /// The poll returned nothing and was skipped
    pub fn is_skipped(&self) -> bool {
        self.instances.is_empty()
    }
}

pub struct InstanceMonitor<S> {
    source: S,
    state: ObservedState<InstancePhase>,
    policy: CompletionPolicy,
    interval: Duration,
    logs: LogCursor,
}

impl<S> InstanceMonitor<S> {
    /// Monitor that stops once the workload is fully up
    pub fn bring_up(source: S, settings: &MonitorSettings) -> Self {
        Self::with_policy(
            source,
            settings,
            CompletionPolicy::BringUp {
                min_instances: settings.min_instances,
                terminal_phase: settings.terminal_phase.clone(),
            },
        )
    }

    /// Monitor that runs until shut down
    pub fn continuous(source: S, settings: &MonitorSettings) -> Self {
        Self::with_policy(source, settings, CompletionPolicy::Continuous)
    }

    fn with_policy(source: S, settings: &MonitorSettings, policy: CompletionPolicy) -> Self {
        Self {
            source,
            state: ObservedState::new(),
            policy,
            interval: settings.interval,
            logs: LogCursor::new(settings.backfill_start(Utc::now())),
        }
    }

    /// Start from a previously observed state instead of an empty one, so
    /// instances another monitor already reported are not reported again
    pub fn with_state(mut self, state: ObservedState<InstancePhase>) -> Self {
        self.state = state;
        self
    }

    /// Replace the log cursor, mainly to pin the initial watermark
    pub fn with_log_cursor(mut self, logs: LogCursor) -> Self {
        self.logs = logs;
        self
    }

    pub fn policy(&self) -> &CompletionPolicy {
        &self.policy
    }

    pub fn state(&self) -> &ObservedState<InstancePhase> {
        &self.state
    }

    pub fn into_state(self) -> ObservedState<InstancePhase> {
        self.state
    }

    fn is_complete(&self, instances: &[String]) -> bool {
        match &self.policy {
            CompletionPolicy::BringUp {
                min_instances,
                terminal_phase,
            } => {
                !instances.is_empty()
                    && instances.len() >= *min_instances
                    && instances
                        .iter()
                        .all(|name| self.state.get(name) == Some(terminal_phase))
            }
            CompletionPolicy::Continuous => false,
        }
    }
}

impl<S: InstanceSource> InstanceMonitor<S> {
    /// Fetch the instance list once and diff it against the recorded state
    pub async fn poll_once(&mut self) -> Result<Cycle> {
        let fetched = self
            .source
            .list_instances()
            .await
            .map_err(|source| MonitorError::Fetch {
                monitor: MONITOR_NAME,
                source,
            })?;

        tracing::debug!(count = fetched.len(), "polled instances");

        if fetched.is_empty() {
            return Ok(Cycle::default());
        }

        let mut instances: Vec<String> = Vec::with_capacity(fetched.len());
        for info in &fetched {
            if !instances.contains(&info.name) {
                instances.push(info.name.clone());
            }
        }

        let reconcile = self.policy.reconciles();
        let transitions = self
            .state
            .observe(fetched.into_iter().map(|i| (i.name, i.phase)), reconcile);

        for transition in &transitions {
            tracing::info!(
                instance = transition.key(),
                kind = %transition.kind(),
                "instance transition"
            );
        }

        let complete = self.is_complete(&instances);
        Ok(Cycle {
            transitions,
            instances,
            complete,
        })
    }

    /// Poll until the completion policy holds or shutdown is requested
    pub async fn run(&mut self, sink: &dyn EventSink, shutdown: &mut Shutdown) -> Result<Outcome> {
        loop {
            if shutdown.is_triggered() {
                return Ok(Outcome::Cancelled);
            }

            let Some(cycle) = shutdown.cancellable(self.poll_once()).await else {
                return Ok(Outcome::Cancelled);
            };
            let cycle = cycle?;
            if cycle.is_skipped() {
                tracing::debug!("no instances listed yet");
            }
            let complete = cycle.complete;
            emit_transitions(sink, cycle.transitions);

            if complete {
                return Ok(Outcome::Completed);
            }

            if !shutdown.sleep(self.interval).await {
                return Ok(Outcome::Cancelled);
            }
        }
    }
}

impl<S: InstanceSource + InstanceLogSource> InstanceMonitor<S> {
    /// Fetch and emit new console lines for each of `instances`
    pub async fn tail_logs(
        &mut self,
        instances: &[String],
        cycle_start: DateTime<Utc>,
        sink: &dyn EventSink,
    ) -> Result<()> {
        for name in instances {
            let since = self.logs.since(name);
            let blob = self
                .source
                .instance_logs(name, since)
                .await
                .map_err(|source| MonitorError::FetchItem {
                    monitor: MONITOR_NAME,
                    key: name.clone(),
                    source,
                })?;

            for line in self.logs.advance(name, &blob, cycle_start) {
                sink.emit(MonitorEvent::InstanceLog {
                    instance: name.clone(),
                    line,
                });
            }
        }

        Ok(())
    }

    /// Like [`run`](Self::run), additionally tailing every instance's logs
    /// after each poll
    pub async fn run_with_logs(
        &mut self,
        sink: &dyn EventSink,
        shutdown: &mut Shutdown,
    ) -> Result<Outcome> {
        loop {
            if shutdown.is_triggered() {
                return Ok(Outcome::Cancelled);
            }

            let cycle_start = Utc::now();
            let Some(cycle) = shutdown.cancellable(self.poll_once()).await else {
                return Ok(Outcome::Cancelled);
            };
            let cycle = cycle?;
            if cycle.is_skipped() {
                tracing::debug!("no instances listed, nothing to tail");
            }

            for transition in &cycle.transitions {
                if let Transition::Disappeared { key, .. } = transition {
                    self.logs.forget(key);
                }
            }
            emit_transitions(sink, cycle.transitions);

            match shutdown
                .cancellable(self.tail_logs(&cycle.instances, cycle_start, sink))
                .await
            {
                Some(tailed) => tailed?,
                None => return Ok(Outcome::Cancelled),
            }

            if cycle.complete {
                return Ok(Outcome::Completed);
            }

            if !shutdown.sleep(self.interval).await {
                return Ok(Outcome::Cancelled);
            }
        }
    }
}

fn emit_transitions(sink: &dyn EventSink, transitions: Vec<Transition<InstancePhase>>) {
    for transition in transitions {
        sink.emit(MonitorEvent::Instance(transition));
    }
}
