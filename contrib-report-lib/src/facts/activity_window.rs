use chrono::{DateTime, SecondsFormat, Utc};
use core::fmt::{Display, Formatter};

/// The trailing time window a run collects activity for.
///
/// The cutoff is computed once per run and shared read-only by every collector, so all
/// records from one run are judged against the same instant. The boundary is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityWindow {
    cutoff: DateTime<Utc>,
    weeks: u32,
}

impl ActivityWindow {
    /// Create a window that starts `weeks` weeks before `now`.
    ///
    /// A cutoff earlier than the representable range is clamped to the earliest instant.
    #[must_use]
    pub fn new(now: DateTime<Utc>, weeks: u32) -> Self {
        let cutoff = chrono::Duration::try_weeks(i64::from(weeks))
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        Self { cutoff, weeks }
    }

    /// Create a window with an explicit cutoff instant.
    #[must_use]
    pub const fn with_cutoff(cutoff: DateTime<Utc>, weeks: u32) -> Self {
        Self { cutoff, weeks }
    }

    #[must_use]
    pub const fn cutoff(&self) -> DateTime<Utc> {
        self.cutoff
    }

    #[must_use]
    pub const fn weeks(&self) -> u32 {
        self.weeks
    }

    /// Whether `ts` falls inside the window (`ts >= cutoff`).
    #[must_use]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.cutoff
    }

    /// The cutoff in the `since=` query format the hosting API expects.
    #[must_use]
    pub fn since_param(&self) -> String {
        self.cutoff.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl Display for ActivityWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} week(s) since {}", self.weeks, self.since_param())
    }
}
