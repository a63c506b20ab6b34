//! Request tracking for monitoring outstanding HTTP requests.

use super::progress::Progress;
use core::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use owo_colors::OwoColorize;
use std::sync::Arc;

const TOPIC_COUNT: usize = 4;

/// Kinds of hosting API requests, tracked separately for progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrackedTopic {
    Branches,
    Commits,
    Details,
    Pulls,
}

impl TrackedTopic {
    const fn name(self) -> &'static str {
        match self {
            Self::Branches => "branches",
            Self::Commits => "commits",
            Self::Details => "details",
            Self::Pulls => "pulls",
        }
    }

    const fn all() -> [Self; TOPIC_COUNT] {
        [Self::Branches, Self::Commits, Self::Details, Self::Pulls]
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Visual status of a tracked topic, controlling its display color in the
/// progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TopicStatus {
    /// Normal active state (default color).
    Active = 0,
    /// Waiting for a rate limit to reset (blinks yellow).
    Blocked = 1,
}

#[derive(Debug, Default)]
struct RequestCounter {
    issued: AtomicU64,
    completed: AtomicU64,
    status: AtomicU8,
}

/// Tracks issued and completed hosting API requests per topic.
///
/// Clones share the same counters, so one tracker can be handed to every
/// concurrent fetch in a run.
#[derive(Clone)]
pub struct RequestTracker {
    counters: Arc<[RequestCounter; TOPIC_COUNT]>,
    progress: Arc<dyn Progress>,
}

impl core::fmt::Debug for RequestTracker {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RequestTracker")
            .field("counters", &self.counters)
            .field("progress", &"<dyn Progress>")
            .finish()
    }
}

impl RequestTracker {
    /// Create a new request tracker that feeds the given progress reporter.
    #[must_use]
    pub fn new(progress: &Arc<dyn Progress>) -> Self {
        let counters: Arc<[RequestCounter; TOPIC_COUNT]> = Arc::default();

        let counters_clone = Arc::clone(&counters);
        let use_colors = progress.use_colors();
        progress.set_determinate(Box::new(move || Self::progress_reporter_callback(&counters_clone, use_colors)));

        Self {
            counters,
            progress: Arc::clone(progress),
        }
    }

    /// Print a message line without disrupting the progress indicator.
    pub fn println(&self, msg: &str) {
        self.progress.println(msg);
    }

    /// Mark that a request has been issued for the given topic.
    pub fn start_request(&self, topic: TrackedTopic) {
        let _ = self.counters[topic.index()].issued.fetch_add(1, Ordering::Relaxed);
    }

    /// Mark that a request has completed (successfully or not) for the given topic.
    pub fn complete_request(&self, topic: TrackedTopic) {
        let _ = self.counters[topic.index()].completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Set the visual status of a topic.
    pub fn set_topic_status(&self, topic: TrackedTopic, status: TopicStatus) {
        self.counters[topic.index()].status.store(status as u8, Ordering::Relaxed);
    }

    /// Total requests issued across all topics.
    #[must_use]
    pub fn total_issued(&self) -> u64 {
        self.counters.iter().map(|c| c.issued.load(Ordering::Relaxed)).sum()
    }

    /// Requests issued for one topic.
    #[must_use]
    pub fn issued(&self, topic: TrackedTopic) -> u64 {
        self.counters[topic.index()].issued.load(Ordering::Relaxed)
    }

    /// Returns (`total_issued`, `total_completed`, `message`).
    fn progress_reporter_callback(counters: &[RequestCounter; TOPIC_COUNT], use_colors: bool) -> (u64, u64, String) {
        // Toggle every 500ms for the blink effect on blocked topics
        let blink_on = use_colors && {
            let ms = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis();
            (ms / 500).is_multiple_of(2)
        };

        let mut total_issued = 0u64;
        let mut total_completed = 0u64;
        let mut parts = Vec::with_capacity(TOPIC_COUNT);

        for topic in TrackedTopic::all() {
            let counter = &counters[topic.index()];
            let issued = counter.issued.load(Ordering::Relaxed);
            let completed = counter.completed.load(Ordering::Relaxed);

            if issued > 0 {
                total_issued += issued;
                total_completed += completed;

                let text = format!("{completed}/{issued} {}", topic.name());
                let blocked = counter.status.load(Ordering::Relaxed) == TopicStatus::Blocked as u8;

                let styled = if blocked && blink_on {
                    format!("{}", text.yellow())
                } else if use_colors && completed >= issued {
                    format!("{}", text.green())
                } else {
                    text
                };

                parts.push(styled);
            }
        }

        let message = if parts.is_empty() {
            "No requests".to_string()
        } else {
            parts.join(", ")
        };

        (total_issued, total_completed, message)
    }
}
