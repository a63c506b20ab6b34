use core::time::Duration;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;

/// Bounded worker pool gate for hosting API requests.
///
/// At most `max_concurrent` holders of a permit run at once. Any task that sees a
/// rate limit can [`pause_for`](Throttler::pause_for) the whole pool; new permits are
/// not handed out until the pause expires. Work already in flight is not interrupted.
///
/// When several tasks pause concurrently, the latest resume instant wins.
#[derive(Debug)]
pub struct Throttler {
    semaphore: Arc<Semaphore>,
    resume_at: Mutex<Option<Instant>>,
}

impl Throttler {
    /// Create a new throttler that allows at most `max_concurrent` tasks at a time.
    #[must_use]
    pub fn new(max_concurrent: usize) -> Arc<Self> {
        Arc::new(Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            resume_at: Mutex::new(None),
        })
    }

    /// Wait out any active pause, then acquire a concurrency slot.
    ///
    /// The returned permit must be held for the duration of the request.
    pub async fn acquire(&self) -> OwnedSemaphorePermit {
        loop {
            if let Some(resume_at) = self.active_pause() {
                tokio::time::sleep_until(resume_at).await;
                continue;
            }

            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .expect("semaphore is never closed");

            // A pause may have started while we were queued on the semaphore.
            if self.active_pause().is_none() {
                return permit;
            }
        }
    }

    /// Hold back new work for `duration`.
    ///
    /// Returns `true` if this call moved the resume instant later, `false` if an
    /// equal or longer pause was already in effect.
    pub fn pause_for(&self, duration: Duration) -> bool {
        let new_resume_at = Instant::now() + duration;
        let mut guard = self.resume_at.lock().expect("lock not poisoned");
        if guard.is_some_and(|existing| existing >= new_resume_at) {
            return false;
        }
        *guard = Some(new_resume_at);
        true
    }

    fn active_pause(&self) -> Option<Instant> {
        let mut guard = self.resume_at.lock().expect("lock not poisoned");
        match *guard {
            Some(resume_at) if resume_at > Instant::now() => Some(resume_at),
            Some(_) => {
                *guard = None;
                None
            }
            None => None,
        }
    }
}
