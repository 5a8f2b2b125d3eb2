//! Fixed-interval tick scheduler for the Flightdeck session server.
//!
//! The server does all of its work on a single periodic tick: pump the
//! transport, sweep handshake timeouts, broadcast movement. This crate
//! decides *when* that tick runs and keeps an eye on how long it takes.
//!
//! # Integration
//!
//! The scheduler sits in a `tokio::select!` next to the shutdown signal:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         _ = &mut shutdown => break,
//!         tick = scheduler.next_tick() => {
//!             server.tick(tick.at.into_std());
//!             scheduler.finish_tick();
//!         }
//!     }
//! }
//! ```
//!
//! All timing uses [`tokio::time::Instant`], so tests can drive the
//! scheduler with a paused clock.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do with ticks missed because the previous one ran late.
///
/// Spelled `"skip"` or `"drop"` in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrunPolicy {
    /// Forget the missed ticks and schedule the next one a full interval
    /// from now.
    #[default]
    Skip,
    /// Keep the original cadence. Missed deadlines fire back to back until
    /// the schedule catches up.
    Drop,
}

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks.
    pub interval: Duration,
    pub overrun_policy: OverrunPolicy,
    /// Fraction of the interval (0.0 to 1.0) a tick may use before a
    /// warning is logged.
    pub budget_warn_ratio: f64,
    /// Upper bound of the random delay added to the first tick only.
    pub initial_jitter: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            overrun_policy: OverrunPolicy::default(),
            budget_warn_ratio: 0.80,
            initial_jitter: Duration::from_millis(2),
        }
    }
}

impl TickConfig {
    /// About 30 ticks per second.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(33);
    /// Shortest interval the scheduler will run at.
    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

    /// Default settings with the given interval.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`TickScheduler::new`].
    pub fn validated(mut self) -> Self {
        if self.interval < Self::MIN_INTERVAL {
            tracing::warn!(
                interval_us = self.interval.as_micros() as u64,
                "tick interval below minimum, clamping to 1 ms"
            );
            self.interval = Self::MIN_INTERVAL;
        }
        self.budget_warn_ratio = self.budget_warn_ratio.clamp(0.0, 1.0);
        self
    }
}

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// One fired tick, returned by [`TickScheduler::next_tick`].
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    /// Starts at 1 and increases by one per tick.
    pub number: u64,
    /// When the tick actually fired.
    pub at: Instant,
    /// The tick fired more than a tenth of an interval late.
    pub overrun: bool,
    /// Whole intervals dropped from the schedule because of the overrun.
    /// Always 0 under [`OverrunPolicy::Drop`].
    pub skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Running totals and timings.
///
/// Work times come from [`TickScheduler::finish_tick`]; ticks never
/// finished do not contribute to them.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub ticks: u64,
    pub overruns: u64,
    pub skipped: u64,
    /// Moving average of work time per tick (weight 0.1 for new samples).
    pub avg_work: Duration,
    pub max_work: Duration,
    /// Work time of the last finished tick divided by the interval.
    pub last_utilization: f64,
}

impl TickMetrics {
    const EMA_WEIGHT: f64 = 0.1;

    fn record_work(&mut self, work: Duration, interval: Duration) {
        self.max_work = self.max_work.max(work);
        self.avg_work = if self.avg_work.is_zero() {
            work
        } else {
            let prev = self.avg_work.as_secs_f64();
            Duration::from_secs_f64(
                prev * (1.0 - Self::EMA_WEIGHT) + work.as_secs_f64() * Self::EMA_WEIGHT,
            )
        };
        self.last_utilization = work.as_secs_f64() / interval.as_secs_f64();
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fires ticks at a fixed interval.
pub struct TickScheduler {
    config: TickConfig,
    deadline: Instant,
    started: Option<Instant>,
    count: u64,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a scheduler whose first tick is one interval (plus jitter)
    /// from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();

        let max_jitter = config.initial_jitter.as_micros() as u64;
        let jitter = if max_jitter > 0 {
            Duration::from_micros(rand::rng().random_range(0..max_jitter))
        } else {
            Duration::ZERO
        };

        tracing::debug!(
            interval_ms = config.interval.as_secs_f64() * 1000.0,
            policy = ?config.overrun_policy,
            "tick scheduler created"
        );

        Self {
            deadline: Instant::now() + config.interval + jitter,
            config,
            started: None,
            count: 0,
            metrics: TickMetrics::default(),
        }
    }

    /// Shorthand for [`TickConfig::every`] with default settings.
    pub fn every(interval: Duration) -> Self {
        Self::new(TickConfig::every(interval))
    }

    /// Sleeps until the next tick is due and returns it.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// schedule untouched.
    pub async fn next_tick(&mut self) -> Tick {
        time::sleep_until(self.deadline).await;

        let interval = self.config.interval;
        let now = Instant::now();
        let late_by = now.saturating_duration_since(self.deadline);
        let overrun = late_by > interval / 10;
        let mut skipped = 0;

        self.deadline = match self.config.overrun_policy {
            OverrunPolicy::Skip => {
                if overrun {
                    skipped = (late_by.as_nanos() / interval.as_nanos()) as u64;
                    tracing::warn!(
                        tick = self.count + 1,
                        skipped,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, skipping ahead"
                    );
                }
                now + interval
            }
            OverrunPolicy::Drop => {
                if overrun {
                    tracing::warn!(
                        tick = self.count + 1,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, keeping schedule"
                    );
                }
                self.deadline + interval
            }
        };

        self.count += 1;
        self.started = Some(now);
        self.metrics.ticks += 1;
        self.metrics.skipped += skipped;
        if overrun {
            self.metrics.overruns += 1;
        }
        tracing::trace!(tick = self.count, overrun, "tick fired");

        Tick {
            number: self.count,
            at: now,
            overrun,
            skipped,
        }
    }

    /// Marks the work for the current tick as done and records how long it
    /// took. Does nothing if no tick is in progress.
    pub fn finish_tick(&mut self) {
        let Some(started) = self.started.take() else {
            return;
        };
        let work = started.elapsed();
        let interval = self.config.interval;
        self.metrics.record_work(work, interval);

        if work >= interval {
            tracing::warn!(
                tick = self.count,
                work_ms = work.as_secs_f64() * 1000.0,
                interval_ms = interval.as_secs_f64() * 1000.0,
                "tick exceeded its interval"
            );
        } else if self.metrics.last_utilization >= self.config.budget_warn_ratio {
            tracing::warn!(
                tick = self.count,
                utilization_pct = format!("{:.1}", self.metrics.last_utilization * 100.0),
                "tick approaching its interval"
            );
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn overrun_policy(&self) -> OverrunPolicy {
        self.config.overrun_policy
    }
}
