//! Keyboard input between demo steps
//!
//! Stdin is read on a plain thread and forwarded line by line, so a pending
//! read never holds up shutdown of the runtime.

use std::io::BufRead;
use tokio::sync::mpsc;

pub struct Input {
    lines: mpsc::UnboundedReceiver<String>,
    assume_yes: bool,
}

impl Input {
    /// Start forwarding stdin. With `assume_yes`, pauses return immediately.
    pub fn spawn(assume_yes: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Self::from_lines(rx, assume_yes)
    }

    fn from_lines(lines: mpsc::UnboundedReceiver<String>, assume_yes: bool) -> Self {
        Self { lines, assume_yes }
    }

    /// Show `message` and wait for [Enter]
    pub async fn pause(&mut self, message: &str) {
        println!("{}", message);
        if self.assume_yes {
            return;
        }
        // closed stdin means nobody is there to press anything
        let _ = self.lines.recv().await;
    }

    /// Resolves once a line reading `q` comes in. Never resolves after stdin
    /// closes, leaving Ctrl+C as the only way out.
    pub async fn quit_requested(&mut self) {
        while let Some(line) = self.lines.recv().await {
            if line.trim().eq_ignore_ascii_case("q") {
                return;
            }
        }
        std::future::pending::<()>().await;
    }
}
