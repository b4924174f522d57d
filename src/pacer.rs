use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Enforces a minimum delay between consecutive outbound requests.
///
/// Clones share one clock, so every request issued through clones of the
/// same pacer (including concurrent enrichment sub-calls) is spaced by at
/// least `sleep_time`. The lock is held across the wait, which makes the
/// pacer the single writer of the last-request instant.
#[derive(Debug, Clone)]
pub struct RequestPacer {
    sleep_time: Duration,
    last_request: Arc<Mutex<Option<Instant>>>,
}

impl RequestPacer {
    pub fn new(sleep_time: Duration) -> Self {
        Self {
            sleep_time,
            last_request: Arc::new(Mutex::new(None)),
        }
    }

    pub fn sleep_time(&self) -> Duration {
        self.sleep_time
    }

    /// Waits until a request may be issued and claims the slot.
    ///
    /// The slot is claimed before the request goes out, so the delay holds
    /// whether that request later succeeds or fails.
    #[instrument(skip(self))]
    pub async fn pace(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.sleep_time {
                let wait = self.sleep_time - elapsed;
                debug!(wait_ms = wait.as_millis() as u64, "Pacing next request");
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }
}
