//! Lifecycle Notifier
//!
//! Explicit registry of pause/resume participants. The owner of the process
//! creates one and hands it to whatever detects the suspend boundary.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{CacheError, Result};
use crate::lifecycle::Lifecycle;

/// Fans pause and resume signals out to registered participants.
///
/// Pauses run in reverse registration order and resumes in registration
/// order, so a component registered after its dependencies is quiesced first
/// and restarted last.
pub struct LifecycleNotifier {
    participants: RwLock<Vec<Arc<dyn Lifecycle>>>,
    clock: Arc<dyn Clock>,
    paused_at: Mutex<Option<i64>>,
}

impl LifecycleNotifier {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Measures pause durations with `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            participants: RwLock::new(Vec::new()),
            clock,
            paused_at: Mutex::new(None),
        }
    }

    pub fn register(&self, participant: Arc<dyn Lifecycle>) {
        info!("Registered lifecycle participant '{}'", participant.name());
        self.participants.write().push(participant);
    }

    pub fn len(&self) -> usize {
        self.participants.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.read().is_empty()
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.lock().is_some()
    }

    /// Pauses every participant. The first failure aborts the pause and is
    /// returned; participants already paused stay paused.
    pub async fn pause(&self) -> Result<()> {
        {
            let mut paused_at = self.paused_at.lock();
            if paused_at.is_some() {
                return Err(CacheError::InvalidLifecycle(
                    "pause requested while already paused".to_string(),
                ));
            }
            *paused_at = Some(self.clock.now());
        }

        let participants = self.participants.read().clone();
        for participant in participants.iter().rev() {
            if let Err(e) = participant.on_pause_requested().await {
                warn!("Participant '{}' failed to pause: {}", participant.name(), e);
                return Err(e);
            }
        }
        info!("Paused {} lifecycle participants", participants.len());
        Ok(())
    }

    /// Resumes every participant with the time elapsed since [`Self::pause`].
    pub async fn resume(&self) -> Result<()> {
        let paused_at = self.paused_at.lock().take().ok_or_else(|| {
            CacheError::InvalidLifecycle("resume requested while not paused".to_string())
        })?;
        let elapsed = self.clock.now().saturating_sub(paused_at).max(0) as u64;
        self.resume_participants(Duration::from_secs(elapsed)).await
    }

    /// Resumes every participant with an externally measured pause duration.
    pub async fn resume_after(&self, paused_for: Duration) -> Result<()> {
        if self.paused_at.lock().take().is_none() {
            return Err(CacheError::InvalidLifecycle(
                "resume requested while not paused".to_string(),
            ));
        }
        self.resume_participants(paused_for).await
    }

    async fn resume_participants(&self, paused_for: Duration) -> Result<()> {
        let participants = self.participants.read().clone();
        for participant in participants.iter() {
            if let Err(e) = participant.on_resumed(paused_for).await {
                warn!("Participant '{}' failed to resume: {}", participant.name(), e);
                return Err(e);
            }
        }
        info!(
            "Resumed {} lifecycle participants after {:?}",
            participants.len(),
            paused_for
        );
        Ok(())
    }
}

impl Default for LifecycleNotifier {
    fn default() -> Self {
        Self::new()
    }
}
