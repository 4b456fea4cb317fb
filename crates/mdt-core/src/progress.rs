//! Progress tracking for one job: smoothed rate and ETA.
//!
//! Backends report progress as sparse, irregular fractions. The raw rate
//! between two samples is too noisy for a usable ETA, so the tracker keeps an
//! exponential moving average of the rate and predicts completion from that.

use std::time::{Duration, Instant};

/// Weight of the newest rate sample in the moving average.
pub const SMOOTHING: f64 = 0.5;

/// Smoothed-rate estimator for a single job.
///
/// `Copy` on purpose: the worker publishes the whole tracker as part of the
/// job snapshot, so readers always see `current_progress` and `last_update`
/// from the same accepted sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressTracker {
    current: f64,
    last_update: Instant,
    assumed_rate: Option<f64>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    /// Tracker whose first sample is measured against `start`.
    pub fn started_at(start: Instant) -> Self {
        Self {
            current: 0.0,
            last_update: start,
            assumed_rate: None,
        }
    }

    /// Fraction complete in [0.0, 1.0].
    pub fn current_progress(&self) -> f64 {
        self.current
    }

    /// Time of the last accepted sample (creation time before any sample).
    pub fn last_update(&self) -> Instant {
        self.last_update
    }

    /// Smoothed progress-per-second; `None` until the first accepted sample.
    pub fn assumed_rate(&self) -> Option<f64> {
        self.assumed_rate
    }

    /// Record a new progress fraction observed now. See [`update_at`](Self::update_at).
    pub fn update(&mut self, new_progress: f64) -> bool {
        self.update_at(new_progress, Instant::now())
    }

    /// Record a new progress fraction observed at `now`.
    ///
    /// Ignored (returns `false`) when the value does not move progress forward
    /// or when no time has passed since the last accepted sample; backends can
    /// deliver duplicate or out-of-order callbacks.
    pub fn update_at(&mut self, new_progress: f64, now: Instant) -> bool {
        if new_progress.is_nan() {
            return false;
        }
        let new_progress = new_progress.clamp(0.0, 1.0);
        if new_progress <= self.current {
            return false;
        }
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();
        if elapsed <= 0.0 {
            return false;
        }

        let latest_rate = (new_progress - self.current) / elapsed;
        self.assumed_rate = Some(match self.assumed_rate {
            None => latest_rate,
            Some(prev) => prev * (1.0 - SMOOTHING) + latest_rate * SMOOTHING,
        });
        self.current = new_progress;
        self.last_update = now;
        true
    }

    /// Predicted completion: `last_update + (1 - current_progress) * assumed_rate`,
    /// the product read as seconds.
    ///
    /// `None` before the first accepted sample: there is no rate yet.
    pub fn estimated_completion_time(&self) -> Option<Instant> {
        let rate = self.assumed_rate?;
        let remaining = Duration::try_from_secs_f64((1.0 - self.current) * rate).ok()?;
        self.last_update.checked_add(remaining)
    }

    /// Time left until the predicted completion, measured from `now`.
    pub fn eta(&self, now: Instant) -> Option<Duration> {
        self.estimated_completion_time()
            .map(|done_at| done_at.saturating_duration_since(now))
    }
}

/// Render a remaining duration as `MM:SS`, or `HH:MM:SS` past one hour.
pub fn format_eta(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let (hours, rest) = (total / 3600, total % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
