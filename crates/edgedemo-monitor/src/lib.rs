//! Edge Demo resource monitors
//!
//! This crate watches remote resource collections on a fixed interval and
//! reports only what changed between two observations.
//!
//! # Monitors
//!
//! - **Instance monitor**: tracks compute instances by name and phase, emits
//!   appeared / changed / disappeared transitions and tails console logs
//! - **Security event monitor**: follows the append-only WAF request log with
//!   a timestamp watermark
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  edgedemo CLI                    │
//! │              (run / monitor commands)            │
//! └─────────────────┬────────────────────────────────┘
//!                   │ EventSink + Shutdown
//! ┌─────────────────▼────────────────────────────────┐
//! │                edgedemo-monitor                  │
//! │  ┌────────────────────┐  ┌────────────────────┐  │
//! │  │  InstanceMonitor   │  │ SecurityEventMon.  │  │
//! │  │  ObservedState     │  │ watermark          │  │
//! │  └─────────┬──────────┘  └─────────┬──────────┘  │
//! └────────────┼───────────────────────┼─────────────┘
//!              │ InstanceSource        │ SecurityEventSource
//! ┌────────────▼───────────────────────▼─────────────┐
//! │               edgedemo-stackpath                 │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use edgedemo_monitor::{InstanceMonitor, MonitorSettings, shutdown};
//!
//! let (trigger, mut signal) = shutdown::channel();
//! let mut monitor = InstanceMonitor::bring_up(source, &MonitorSettings::default());
//! monitor.run(&sink, &mut signal).await?;
//! ```

pub mod error;
pub mod instance;
pub mod logs;
pub mod security;
pub mod settings;
pub mod shutdown;
pub mod sink;
pub mod source;
pub mod state;
pub mod transition;

// Re-exports
pub use error::{FetchError, MonitorError, Result};
pub use instance::{CompletionPolicy, Cycle, InstanceMonitor};
pub use logs::LogCursor;
pub use security::SecurityEventMonitor;
pub use settings::MonitorSettings;
pub use shutdown::{Shutdown, ShutdownTrigger};
pub use sink::{EventSink, MemorySink};
pub use source::{
    InstanceInfo, InstanceLogSource, InstancePhase, InstanceSource, SecurityEvent,
    SecurityEventSource,
};
pub use state::ObservedState;
pub use transition::{MonitorEvent, Transition, TransitionKind};

/// How a monitor loop ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The completion policy was satisfied
    Completed,
    /// The shutdown signal fired
    Cancelled,
}
