//! Clock and timing utilities for the frame loop.
//!
//! Every session is anchored to a monotonic epoch recorded when the
//! session starts. This module provides:
//! - The session clock (monotonic + wall-clock anchor)
//! - A rate controller for throttling periodic work (previews)
//! - A per-frame budget tracker
//! - A rolling frames-per-second meter

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A session clock that provides monotonic timestamps relative to
/// a fixed epoch (the moment the session started).
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339).
    epoch_wall: String,
}

impl SessionClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Nanoseconds elapsed since the session started.
    pub fn elapsed_ns(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Seconds elapsed since the session started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Wall-clock time at session start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }

    /// Convert an elapsed nanosecond value to seconds.
    pub fn ns_to_secs(ns: u64) -> f64 {
        ns as f64 / 1_000_000_000.0
    }
}

/// Rate controller for periodic work driven by frame timestamps.
#[derive(Debug)]
pub struct RateController {
    target_interval_ns: u64,
    last_tick_ns: Option<u64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate. A rate of zero
    /// ticks on every call.
    pub fn new(target_hz: u32) -> Self {
        let target_interval_ns = if target_hz == 0 {
            0
        } else {
            1_000_000_000 / target_hz as u64
        };
        Self {
            target_interval_ns,
            last_tick_ns: None,
        }
    }

    /// Check if enough time has passed for the next tick.
    /// Returns true and updates internal state if ready.
    /// The first call always returns true.
    pub fn should_tick(&mut self, current_ns: u64) -> bool {
        match self.last_tick_ns {
            None => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            Some(last) if current_ns >= last + self.target_interval_ns => {
                self.last_tick_ns = Some(current_ns);
                true
            }
            _ => false,
        }
    }
}

/// Tracks how long each frame iteration takes against a fixed budget.
#[derive(Debug, Clone)]
pub struct FrameBudget {
    budget: Duration,
    overruns: u64,
    worst: Duration,
}

impl FrameBudget {
    pub fn new(budget: Duration) -> Self {
        Self {
            budget,
            overruns: 0,
            worst: Duration::ZERO,
        }
    }

    /// Record one frame's processing time. Returns `true` if it overran.
    pub fn record(&mut self, spent: Duration) -> bool {
        if spent > self.worst {
            self.worst = spent;
        }
        if spent > self.budget {
            self.overruns += 1;
            true
        } else {
            false
        }
    }

    pub fn overruns(&self) -> u64 {
        self.overruns
    }

    /// Longest frame observed so far.
    pub fn worst(&self) -> Duration {
        self.worst
    }
}

/// Rolling FPS estimate over the most recent frame timestamps.
#[derive(Debug, Clone)]
pub struct FpsMeter {
    window: usize,
    stamps_ns: VecDeque<u64>,
}

impl FpsMeter {
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(2),
            stamps_ns: VecDeque::with_capacity(window.max(2)),
        }
    }

    /// Register a frame at `timestamp_ns`.
    pub fn tick(&mut self, timestamp_ns: u64) {
        if self.stamps_ns.len() == self.window {
            self.stamps_ns.pop_front();
        }
        self.stamps_ns.push_back(timestamp_ns);
    }

    /// Frames per second over the current window, `0.0` until two frames
    /// have been seen.
    pub fn fps(&self) -> f64 {
        match (self.stamps_ns.front(), self.stamps_ns.back()) {
            (Some(&first), Some(&last)) if last > first => {
                (self.stamps_ns.len() - 1) as f64 / SessionClock::ns_to_secs(last - first)
            }
            _ => 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.stamps_ns.clear();
    }
}
