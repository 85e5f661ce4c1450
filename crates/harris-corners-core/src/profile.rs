//! Optional per-stage timing.
//!
//! The pipeline reports elapsed time per [`Stage`] to a [`ProfileHook`]. The
//! clock is only read when [`ProfileHook::enabled`] returns `true`; the
//! default [`NoProfile`] hook is zero-sized and disabled, so untimed runs
//! never touch [`Instant`].

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Pipeline stages reported to a [`ProfileHook`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Covariance,
    Smoothing,
    Response,
    Maxima,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Covariance,
        Stage::Smoothing,
        Stage::Response,
        Stage::Maxima,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Covariance => "covariance",
            Stage::Smoothing => "smoothing",
            Stage::Response => "response",
            Stage::Maxima => "maxima",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Receives stage timings from the detector.
pub trait ProfileHook {
    fn record(&mut self, stage: Stage, elapsed: Duration);

    /// Whether the detector should read the clock at all.
    #[inline(always)]
    fn enabled(&self) -> bool {
        true
    }
}

/// Start time of a stage, present only for enabled hooks.
pub(crate) struct Stopwatch(Option<Instant>);

impl Stopwatch {
    #[inline(always)]
    pub(crate) fn start<P: ProfileHook + ?Sized>(hook: &P) -> Self {
        Self(hook.enabled().then(Instant::now))
    }

    /// Elapsed time since [`Stopwatch::start`]; zero when the hook is disabled.
    #[inline(always)]
    pub(crate) fn elapsed(&self) -> Duration {
        self.0.map_or(Duration::ZERO, |t| t.elapsed())
    }

    /// Report the elapsed time to `hook` if it is enabled.
    #[inline(always)]
    pub(crate) fn stop<P: ProfileHook + ?Sized>(self, hook: &mut P, stage: Stage) -> Duration {
        let elapsed = self.elapsed();
        if self.0.is_some() {
            hook.record(stage, elapsed);
        }
        elapsed
    }
}

/// Hook that discards all timings.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProfile;

impl ProfileHook for NoProfile {
    #[inline(always)]
    fn record(&mut self, _stage: Stage, _elapsed: Duration) {}

    #[inline(always)]
    fn enabled(&self) -> bool {
        false
    }
}

/// Number of most recent samples used by [`StageStats::rolling_mean`].
pub const ROLLING_WINDOW: usize = 50;

/// Accumulated statistics for one stage (seconds).
#[derive(Clone, Debug, Default)]
pub struct StageStats {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
    recent: VecDeque<f64>,
}

impl StageStats {
    fn push(&mut self, secs: f64) {
        if self.count == 0 {
            self.min = secs;
            self.max = secs;
        } else {
            self.min = self.min.min(secs);
            self.max = self.max.max(secs);
        }
        self.count += 1;
        self.sum += secs;
        if self.recent.len() == ROLLING_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back(secs);
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// Mean over the last [`ROLLING_WINDOW`] samples.
    pub fn rolling_mean(&self) -> f64 {
        if self.recent.is_empty() {
            0.0
        } else {
            self.recent.iter().sum::<f64>() / self.recent.len() as f64
        }
    }
}

/// Hook collecting per-stage statistics across calls.
#[derive(Clone, Debug, Default)]
pub struct StageTimings {
    stats: [StageStats; 4],
}

impl StageTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self, stage: Stage) -> &StageStats {
        &self.stats[stage.index()]
    }

    /// One line per stage that has samples: name, count, mean and rolling
    /// mean in milliseconds.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for stage in Stage::ALL {
            let s = self.stats(stage);
            if s.count() == 0 {
                continue;
            }
            out.push_str(&format!(
                "{:<10} n={:<5} mean={:.3}ms rolling={:.3}ms min={:.3}ms max={:.3}ms\n",
                stage.name(),
                s.count(),
                s.mean() * 1e3,
                s.rolling_mean() * 1e3,
                s.min() * 1e3,
                s.max() * 1e3,
            ));
        }
        out
    }
}

impl ProfileHook for StageTimings {
    fn record(&mut self, stage: Stage, elapsed: Duration) {
        self.stats[stage.index()].push(elapsed.as_secs_f64());
    }
}
