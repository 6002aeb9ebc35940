use crate::console::ConsoleSink;
use crate::progress;
use crate::prompt::Input;
use crate::session::{self, Session};
use anyhow::Context;
use colored::Colorize;
use edgedemo_config::{DemoConfig, Purpose};
use edgedemo_monitor::{
    InstanceMonitor, InstancePhase, MonitorError, MonitorSettings, ObservedState, Outcome,
    SecurityEventMonitor, shutdown,
};
use edgedemo_stackpath::{Site, SiteRequests, Workload, WorkloadInstances};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

/// Attach the monitors to a workload and site deployed earlier
pub async fn handle(config: &DemoConfig, workload: &str, site: &str) -> anyhow::Result<()> {
    config.validate(Purpose::Monitor)?;
    let settings = session::monitor_settings(&config.monitor);
    let mut input = Input::spawn(true);

    let session = Session::connect(config).await?;

    let workload = progress::step(
        format!("Locating workload \"{}\"", workload),
        async {
            session
                .client
                .get_workload(&session.stack, workload)
                .await
                .context("Error locating the workload")
        },
        |workload| format!("Done: found workload \"{}\"", workload.name),
    )
    .await?;

    let site = progress::step(
        format!("Locating site \"{}\"", site),
        async {
            session
                .client
                .get_site(&session.stack, site)
                .await
                .context("Error locating the site")
        },
        |site| format!("Done: found site \"{}\"", site.id),
    )
    .await?;

    println!("Press [q] then [Enter] to end the program");
    watch(
        &session,
        workload,
        site,
        &settings,
        ObservedState::new(),
        &mut input,
    )
    .await
}

enum Stop {
    Interrupted,
    Quit,
    Ended(Result<Result<Outcome, MonitorError>, JoinError>),
}

/// Follow instances, their console logs and WAF events until `q`, Ctrl+C
/// or the first monitor failure
///
/// `known` holds instances that were already reported, so they are not
/// announced again.
pub async fn watch(
    session: &Session,
    workload: Workload,
    site: Site,
    settings: &MonitorSettings,
    known: ObservedState<InstancePhase>,
    input: &mut Input,
) -> anyhow::Result<()> {
    tracing::info!("Monitoring workload {} and site {}", workload.slug, site.id);

    let (trigger, mut signal) = shutdown::channel();
    let sink = Arc::new(ConsoleSink::new());
    let mut tasks = JoinSet::new();

    let instances = WorkloadInstances::new(session.client.clone(), session.stack.clone(), workload);
    let mut instance_monitor = InstanceMonitor::continuous(instances, settings).with_state(known);
    {
        let sink = sink.clone();
        let mut signal = trigger.subscribe();
        tasks.spawn(async move {
            instance_monitor
                .run_with_logs(sink.as_ref(), &mut signal)
                .await
        });
    }

    let requests = SiteRequests::new(session.client.clone(), session.stack.clone(), site);
    let mut security_monitor = SecurityEventMonitor::new(requests, settings);
    {
        let sink = sink.clone();
        tasks.spawn(async move { security_monitor.run(sink.as_ref(), &mut signal).await });
    }

    let stop = tokio::select! {
        _ = tokio::signal::ctrl_c() => Stop::Interrupted,
        _ = input.quit_requested() => Stop::Quit,
        Some(ended) = tasks.join_next() => Stop::Ended(ended),
    };
    trigger.trigger();

    let mut first_error = match stop {
        Stop::Interrupted => {
            tracing::info!("Interrupted, stopping monitors");
            None
        }
        Stop::Quit => None,
        Stop::Ended(ended) => monitor_result(ended).err(),
    };

    while let Some(ended) = tasks.join_next().await {
        if let Err(err) = monitor_result(ended) {
            first_error.get_or_insert(err);
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => {
            println!("{}", "Done".green());
            println!();
            Ok(())
        }
    }
}

fn monitor_result(ended: Result<Result<Outcome, MonitorError>, JoinError>) -> anyhow::Result<()> {
    let outcome = ended.context("Monitor task panicked")?;
    outcome.map(|_| ()).map_err(anyhow::Error::from)
}
