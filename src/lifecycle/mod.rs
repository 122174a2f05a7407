//! Lifecycle Module
//!
//! Pause/resume hooks for components that must quiesce before the host process
//! is suspended and catch up after it resumes.

mod controller;
mod notifier;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use controller::{PauseController, DEFAULT_STOP_TIMEOUT};
pub use notifier::LifecycleNotifier;

/// A participant in the pause/resume cycle.
///
/// Calls arrive in matched pairs: one `on_pause_requested`, then exactly one
/// `on_resumed` before the next pause.
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Quiesce background work. Must not return `Ok` until that work has stopped.
    async fn on_pause_requested(&self) -> Result<()>;

    /// Compensate for `paused_for` of elapsed time and restart background work.
    async fn on_resumed(&self, paused_for: Duration) -> Result<()>;
}
