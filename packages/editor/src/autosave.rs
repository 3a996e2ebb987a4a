//! Debounced autosave.
//!
//! [`AutosaveTimer`] is plain state polled with an explicit [`Instant`];
//! [`spawn_autosave`] drives it on the tokio runtime.

use crate::store::EditorStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// One-shot deadline armed when the document first becomes dirty
#[derive(Debug, Clone)]
pub struct AutosaveTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl AutosaveTimer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Start the countdown from `now`
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Disarm and return true if the deadline has passed
    pub fn take_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

/// Run autosave for `store` until the store is disposed.
///
/// The task sleeps until the armed deadline, re-reads it whenever the store
/// signals a dirty-state change, and saves through [`EditorStore::save_draft`].
pub fn spawn_autosave(store: Arc<Mutex<EditorStore>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (signal, cancel) = {
            let guard = store.lock().await;
            (guard.autosave_signal(), guard.cancellation_token())
        };

        loop {
            let deadline = store.lock().await.autosave_deadline();

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("autosave driver stopped");
                    break;
                }
                _ = signal.notified() => continue,
                _ = sleep_until(deadline) => {
                    let mut guard = store.lock().await;
                    if !guard.take_due_autosave(Instant::now()) {
                        continue;
                    }
                    tracing::info!("autosaving draft");
                    if let Err(err) = guard.save_draft().await {
                        tracing::warn!(error = %err, "autosave failed");
                    }
                }
            }
        }
    })
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_due_at_delay() {
        let start = Instant::now();
        let mut timer = AutosaveTimer::new(Duration::from_millis(30_000));
        assert!(!timer.is_due(start));

        timer.arm(start);
        assert!(!timer.is_due(start + Duration::from_millis(29_999)));
        assert!(timer.is_due(start + Duration::from_millis(30_000)));
    }

    #[test]
    fn test_take_due_disarms() {
        let start = Instant::now();
        let mut timer = AutosaveTimer::new(Duration::from_secs(1));
        timer.arm(start);

        assert!(!timer.take_due(start));
        assert!(timer.is_armed());
        assert!(timer.take_due(start + Duration::from_secs(2)));
        assert!(!timer.is_armed());
        assert!(!timer.take_due(start + Duration::from_secs(3)));
    }

    #[test]
    fn test_disarm() {
        let start = Instant::now();
        let mut timer = AutosaveTimer::new(Duration::from_secs(1));
        timer.arm(start);
        timer.disarm();
        assert_eq!(timer.deadline(), None);
    }
}
