use super::monitor;
use crate::console::ConsoleSink;
use crate::progress::{self, Step};
use crate::prompt::Input;
use crate::session::{self, Session};
use anyhow::Context;
use colored::Colorize;
use edgedemo_config::{DemoConfig, Purpose};
use edgedemo_monitor::{
    InstanceMonitor, InstancePhase, MonitorSettings, ObservedState, Outcome, shutdown,
};
use edgedemo_stackpath::{Workload, WorkloadInstances, WorkloadTemplate};

const CONTINUE: &str = "Press [Enter] to continue.";

const INTRO: &str = "
StackPath Platform Demo
=======================

This demo deploys a container workload running a diagnostic web application
to several cities with auto-scaling, puts it behind StackPath's CDN and WAF,
publishes it under its own DNS name with demonstration WAF rules, and requests
an auto-renewing TLS certificate for it.

Once everything is up, it follows the WAF for security events and the compute
instances for console output, start up and tear down.

All that has to exist beforehand is the stack and a registered domain with an
empty zone on StackPath DNS. Everything else goes through the StackPath REST
API, live.
";

fn heading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "-".repeat(title.chars().count()));
}

/// Provision the whole demo, then monitor it
pub async fn handle(config: &DemoConfig, assume_yes: bool) -> anyhow::Result<()> {
    config.validate(Purpose::Deploy)?;
    let (Some(domain), Some(subdomain), Some(host)) = (
        config.domain.as_deref(),
        config.subdomain.as_deref(),
        config.project_host(),
    ) else {
        anyhow::bail!("domain and subdomain must both be set");
    };
    let settings = session::monitor_settings(&config.monitor);
    let mut input = Input::spawn(assume_yes);

    println!("{}", INTRO);
    input.pause(CONTINUE).await;

    heading("Checking requirements");
    let session = Session::connect(config).await?;
    let stack = &session.stack;
    let client = &session.client;

    let zone = progress::step(
        format!("Locating the \"{}\" DNS zone", domain),
        async {
            client
                .find_zone_by_name(stack, domain)
                .await
                .context("Error locating the DNS zone")?
                .with_context(|| format!("DNS zone \"{}\" was not found", domain))
        },
        |zone| format!("Done: found DNS zone \"{}\" (ID: {})", zone.name, zone.id),
    )
    .await?;

    println!("{}", "Requirements met!".green().bold());
    input.pause(CONTINUE).await;

    heading("Deploying the application");
    let workload = progress::step(
        "Creating compute workload",
        async {
            let workload = client
                .create_workload(stack, &WorkloadTemplate::default())
                .await
                .context("Error creating compute workload")?;
            anyhow::ensure!(
                workload.anycast_ip.is_some(),
                "Workload \"{}\" was created without an anycast IP",
                workload.name
            );
            anyhow::Ok(workload)
        },
        |workload| {
            format!(
                "Done: workload \"{}\" created, anycast IP: {}",
                workload.name,
                workload.anycast_ip.as_deref().unwrap_or_default()
            )
        },
    )
    .await?;
    input.pause(CONTINUE).await;

    let origin_ip = workload.anycast_ip.clone().unwrap_or_default();
    let site = progress::step(
        "Creating CDN and WAF service in front of the Edge Compute origin",
        async {
            client
                .create_site(stack, &origin_ip, &host)
                .await
                .context("Error creating CDN and WAF service")
        },
        |site| format!("Done: site \"{}\" created", site.id),
    )
    .await?;
    input.pause(CONTINUE).await;

    let known = wait_for_instances(&session, &workload, &settings).await?;
    input.pause(CONTINUE).await;

    let delivery_domain = progress::step(
        "Locating the site's delivery domain",
        async {
            client
                .find_delivery_domain(stack, &site)
                .await
                .context("Error locating the site's delivery domain")?
                .context("The site has no stackpathcdn.com delivery domain")
        },
        |domain| format!("Done: found the delivery domain \"{}\"", domain),
    )
    .await?;
    input.pause(CONTINUE).await;

    progress::step(
        format!("Creating the project DNS record: \"{}\"", host),
        async {
            client
                .create_cname_record(stack, &zone, subdomain, &delivery_domain)
                .await
                .context("Error creating project DNS CNAME")
        },
        |_| "Done".to_string(),
    )
    .await?;
    input.pause(CONTINUE).await;

    progress::step(
        "Creating an SSL certificate",
        async {
            client
                .request_certificate(stack, &site)
                .await
                .context("Error creating an SSL certificate")
        },
        |_| "Done".to_string(),
    )
    .await?;
    input.pause(CONTINUE).await;

    progress::step(
        "Creating custom WAF rules",
        async {
            client
                .create_demo_waf_rules(stack, &site)
                .await
                .context("Error creating custom WAF rules")
        },
        |_| "Done".to_string(),
    )
    .await?;
    input.pause(CONTINUE).await;

    println!(
        "{} The project is available at {}",
        "Success!".green().bold(),
        format!("https://{}", host).cyan()
    );
    println!("Press [q] then [Enter] to end the program");
    input
        .pause("Press [Enter] to begin monitoring the application")
        .await;

    monitor::watch(&session, workload, site, &settings, known, &mut input).await
}

/// Report instance changes above a spinner until the workload is fully up
///
/// Returns what was observed, so monitoring does not announce the same
/// instances a second time.
async fn wait_for_instances(
    session: &Session,
    workload: &Workload,
    settings: &MonitorSettings,
) -> anyhow::Result<ObservedState<InstancePhase>> {
    println!("Waiting for all containers to start before continuing");
    let step = Step::start("Waiting for the instances to start");
    let sink = ConsoleSink::above(step.progress_bar().clone());

    let source = WorkloadInstances::new(
        session.client.clone(),
        session.stack.clone(),
        workload.clone(),
    );
    let mut bring_up = InstanceMonitor::bring_up(source, settings);
    let (trigger, mut signal) = shutdown::channel();

    let outcome = tokio::select! {
        outcome = bring_up.run(&sink, &mut signal) => outcome,
        _ = tokio::signal::ctrl_c() => {
            trigger.trigger();
            Ok(Outcome::Cancelled)
        }
    };

    match outcome {
        Ok(Outcome::Completed) => {
            step.finish("Done");
            Ok(bring_up.into_state())
        }
        Ok(Outcome::Cancelled) => {
            step.fail();
            anyhow::bail!("Interrupted while waiting for the instances to start")
        }
        Err(err) => {
            step.fail();
            Err(err).context("Error querying instance status")
        }
    }
}
