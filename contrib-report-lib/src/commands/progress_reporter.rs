use crate::facts::Progress;
use core::fmt::{Debug, Formatter};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

type Snapshot = Box<dyn Fn() -> (u64, u64, String) + Send + Sync>;

const TICK: Duration = Duration::from_millis(100);

const TEMPLATE: &str = "{prefix:>12.bold.cyan} [{bar:25}] {msg}";
const TEMPLATE_NO_COLOR: &str = "{prefix:>12} [{bar:25}] {msg}";

/// State shared between the reporter handle and its ticker task.
struct Shared {
    bar: ProgressBar,
    show_at: Instant,
    shown: AtomicBool,
    snapshot: Mutex<Snapshot>,
}

impl Shared {
    /// Reveal the bar once the delay has passed, then redraw it from the latest snapshot.
    fn tick(&self) {
        if !self.shown.load(Ordering::Relaxed) {
            if Instant::now() < self.show_at {
                return;
            }

            self.shown.store(true, Ordering::Relaxed);
            self.bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
        }

        let (total, done, message) = {
            let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);
            snapshot()
        };

        if total > 0 {
            self.bar.set_length(total);
            self.bar.set_position(done);
        }
        self.bar.set_message(message);
    }
}

async fn tick_forever(shared: Arc<Shared>) {
    let mut interval = tokio::time::interval(TICK);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    #[expect(clippy::infinite_loop, reason = "aborted by done()")]
    loop {
        let _ = interval.tick().await;
        shared.tick();
    }
}

/// Request progress on stderr.
///
/// Short runs never show anything: the bar only appears once a run has lasted past the delay.
#[derive(Clone)]
pub struct ProgressReporter {
    shared: Arc<Shared>,
    ticker: Arc<JoinHandle<()>>,
    use_colors: bool,
}

impl ProgressReporter {
    /// Create a reporter whose bar stays hidden for `delay`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(delay: Duration, use_colors: bool) -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden());
        let template = if use_colors { TEMPLATE } else { TEMPLATE_NO_COLOR };
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            bar.set_style(style.progress_chars("=> "));
        }

        let shared = Arc::new(Shared {
            bar,
            show_at: Instant::now() + delay,
            shown: AtomicBool::new(false),
            snapshot: Mutex::new(Box::new(|| (0, 0, String::new()))),
        });

        let ticker = tokio::spawn(tick_forever(Arc::clone(&shared)));

        Self {
            shared,
            ticker: Arc::new(ticker),
            use_colors,
        }
    }

    fn is_shown(&self) -> bool {
        self.shared.shown.load(Ordering::Relaxed)
    }
}

impl Progress for ProgressReporter {
    fn set_phase(&self, phase: &str) {
        self.shared.bar.set_prefix(phase.to_string());
    }

    fn set_determinate(&self, callback: Box<dyn Fn() -> (u64, u64, String) + Send + Sync + 'static>) {
        *self.shared.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = callback;
        self.shared.bar.set_length(0);
        self.shared.bar.set_position(0);
    }

    fn println(&self, msg: &str) {
        self.shared.bar.suspend(|| eprintln!("{msg}"));
    }

    fn done(&self) {
        self.ticker.abort();
        if self.is_shown() {
            self.shared.bar.finish_and_clear();
        }
    }

    fn use_colors(&self) -> bool {
        self.use_colors
    }
}

impl Debug for ProgressReporter {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("shown", &self.is_shown())
            .field("use_colors", &self.use_colors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hidden_until_delay() {
        let reporter = ProgressReporter::new(Duration::from_secs(3600), false);
        reporter.set_phase("Querying");
        reporter.set_determinate(Box::new(|| (2, 1, "1/2 commits".to_string())));
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(!reporter.is_shown());
        reporter.done();
    }

    #[tokio::test]
    async fn test_shown_after_delay() {
        let reporter = ProgressReporter::new(Duration::ZERO, false);
        reporter.set_determinate(Box::new(|| (4, 3, "3/4 details".to_string())));
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(reporter.is_shown());
        assert_eq!(reporter.shared.bar.length(), Some(4));
        assert_eq!(reporter.shared.bar.position(), 3);
        reporter.done();
    }

    #[tokio::test]
    async fn test_use_colors_is_reported() {
        let reporter = ProgressReporter::new(Duration::from_secs(3600), true);
        assert!(reporter.use_colors());
        assert!(format!("{reporter:?}").contains("use_colors: true"));
        reporter.done();
    }
}
