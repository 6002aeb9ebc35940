use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::time::{Duration, Instant};

/// One provisioning step: a spinner while it runs, then the result and how
/// long it took
pub struct Step {
    message: String,
    progress_bar: ProgressBar,
    started: Instant,
}

impl Step {
    pub fn start(message: impl Into<String>) -> Self {
        let message = message.into();
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message.clone());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self {
            message,
            progress_bar: pb,
            started: Instant::now(),
        }
    }

    /// The spinner, for printing lines above it while the step runs
    pub fn progress_bar(&self) -> &ProgressBar {
        &self.progress_bar
    }

    pub fn finish(self, result: &str) {
        self.progress_bar.finish_and_clear();
        println!("{}", self.message);
        println!("| {}", result);
        println!("└ Took {}\n", format_elapsed(self.started.elapsed()));
    }

    pub fn fail(self) {
        self.progress_bar.finish_and_clear();
        println!("{}", self.message);
    }
}

/// Run `work` behind a spinner and report `summary` of its result
pub async fn step<T, F>(
    message: impl Into<String>,
    work: F,
    summary: impl FnOnce(&T) -> String,
) -> anyhow::Result<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let step = Step::start(message);
    match work.await {
        Ok(value) => {
            step.finish(&summary(&value));
            Ok(value)
        }
        Err(err) => {
            step.fail();
            Err(err)
        }
    }
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs >= 60 {
        format!("{}m{}s", secs / 60, secs % 60)
    } else if secs >= 1 {
        format!("{:.2}s", elapsed.as_secs_f64())
    } else {
        format!("{}ms", elapsed.as_millis())
    }
}
