//! Landmark smoothing.
//!
//! Reduces frame-to-frame detector jitter before shapes are classified.
//! Every algorithm works per landmark index and per axis; confidence is
//! never smoothed and always comes from the latest detection.

use std::collections::VecDeque;
use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use airsketch_common::error::{SketchError, SketchResult};
use airsketch_model::landmark::{Landmark, LandmarkSet, SmoothedPose, HAND_LANDMARK_COUNT};

/// Available smoothing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingKind {
    /// Exponential blend with the previous smoothed pose.
    #[default]
    Ema,
    /// Mean of the last `window` detections.
    MovingAverage,
    /// Speed-adaptive low-pass filter (One-Euro).
    OneEuro,
    /// Pass raw landmarks through.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub algorithm: SmoothingKind,

    /// EMA weight of the current frame, in `(0.0, 1.0]`.
    pub alpha: f64,

    /// History window for the moving average.
    pub window: usize,

    /// Detections below this confidence are treated as "no hand".
    pub detection_threshold: f64,

    /// One-Euro minimum cutoff frequency (Hz).
    pub min_cutoff: f64,
    /// One-Euro speed coefficient.
    pub beta: f64,
    /// One-Euro derivative cutoff frequency (Hz).
    pub d_cutoff: f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            algorithm: SmoothingKind::Ema,
            alpha: 0.5,
            window: 5,
            detection_threshold: 0.5,
            min_cutoff: 1.0,
            beta: 0.0,
            d_cutoff: 1.0,
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> SketchResult<()> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(SketchError::config(format!(
                "smoothing.alpha must be in (0, 1], got {}",
                self.alpha
            )));
        }
        if self.window == 0 {
            return Err(SketchError::config("smoothing.window must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.detection_threshold) {
            return Err(SketchError::config(format!(
                "smoothing.detection_threshold must be in [0, 1], got {}",
                self.detection_threshold
            )));
        }
        if self.min_cutoff <= 0.0 || self.d_cutoff <= 0.0 || self.beta < 0.0 {
            return Err(SketchError::config(
                "one-euro cutoffs must be positive and beta non-negative",
            ));
        }
        Ok(())
    }
}

/// Single-step exponential smoothing.
///
/// Returns a no-hand pose when `current` is below `threshold`, the raw
/// landmarks when there is no usable previous pose, and otherwise
/// `alpha * current + (1 - alpha) * previous` per coordinate.
pub fn smooth(
    previous: Option<&SmoothedPose>,
    current: &LandmarkSet,
    alpha: f64,
    threshold: f64,
) -> SmoothedPose {
    if current.confidence < threshold {
        return SmoothedPose::no_hand(current.timestamp_ns);
    }

    let mut pose = SmoothedPose::from_raw(current);
    if let Some(prev) = previous.filter(|p| !p.is_no_hand()) {
        for (out, old) in pose.landmarks.iter_mut().zip(prev.landmarks.iter()) {
            out.x = alpha * out.x + (1.0 - alpha) * old.x;
            out.y = alpha * out.y + (1.0 - alpha) * old.y;
            out.z = alpha * out.z + (1.0 - alpha) * old.z;
        }
    }
    pose
}

/// Stateful smoother that owns whatever history its algorithm needs.
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    config: SmoothingConfig,
    previous: Option<SmoothedPose>,
    history: VecDeque<[Landmark; HAND_LANDMARK_COUNT]>,
    euro: Option<HandEuroFilter>,
}

impl LandmarkSmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            history: VecDeque::with_capacity(config.window.max(1)),
            config,
            previous: None,
            euro: None,
        }
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Smooth one detection. A no-hand result clears all history so the
    /// next detection starts from raw input.
    pub fn step(&mut self, current: &LandmarkSet) -> SmoothedPose {
        if current.confidence < self.config.detection_threshold {
            self.reset();
            let pose = SmoothedPose::no_hand(current.timestamp_ns);
            self.previous = Some(pose.clone());
            return pose;
        }

        let pose = match self.config.algorithm {
            SmoothingKind::Ema => smooth(
                self.previous.as_ref(),
                current,
                self.config.alpha,
                self.config.detection_threshold,
            ),
            SmoothingKind::MovingAverage => self.moving_average(current),
            SmoothingKind::OneEuro => {
                let (min_cutoff, beta, d_cutoff) =
                    (self.config.min_cutoff, self.config.beta, self.config.d_cutoff);
                let filter = self
                    .euro
                    .get_or_insert_with(|| HandEuroFilter::new(min_cutoff, beta, d_cutoff));
                let mut pose = SmoothedPose::from_raw(current);
                pose.landmarks = filter.filter(&current.landmarks, current.timestamp_ns);
                pose
            }
            SmoothingKind::None => SmoothedPose::from_raw(current),
        };

        self.previous = Some(pose.clone());
        pose
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.previous = None;
        self.history.clear();
        self.euro = None;
    }

    fn moving_average(&mut self, current: &LandmarkSet) -> SmoothedPose {
        let window = self.config.window.max(1);
        while self.history.len() >= window {
            self.history.pop_front();
        }
        self.history.push_back(current.landmarks);

        let n = self.history.len() as f64;
        let mut pose = SmoothedPose::from_raw(current);
        for (i, out) in pose.landmarks.iter_mut().enumerate() {
            let (sx, sy, sz) = self.history.iter().fold((0.0, 0.0, 0.0), |(sx, sy, sz), h| {
                (sx + h[i].x, sy + h[i].y, sz + h[i].z)
            });
            out.x = sx / n;
            out.y = sy / n;
            out.z = sz / n;
        }
        pose
    }
}

/// First-order low-pass filter.
#[derive(Debug, Clone, Default)]
struct LowPass {
    value: Option<f64>,
}

impl LowPass {
    fn apply(&mut self, x: f64, alpha: f64) -> f64 {
        let y = match self.value {
            Some(prev) => alpha * x + (1.0 - alpha) * prev,
            None => x,
        };
        self.value = Some(y);
        y
    }
}

/// One-Euro filter for a single scalar signal.
#[derive(Debug, Clone)]
struct OneEuro {
    x: LowPass,
    dx: LowPass,
    last_raw: Option<f64>,
}

impl OneEuro {
    fn new() -> Self {
        Self {
            x: LowPass::default(),
            dx: LowPass::default(),
            last_raw: None,
        }
    }

    fn apply(&mut self, raw: f64, dt: f64, params: &EuroParams) -> f64 {
        let derivative = match self.last_raw {
            Some(prev) => (raw - prev) / dt,
            None => 0.0,
        };
        self.last_raw = Some(raw);

        let dx_hat = self.dx.apply(derivative, smoothing_alpha(params.d_cutoff, dt));
        let cutoff = params.min_cutoff + params.beta * dx_hat.abs();
        self.x.apply(raw, smoothing_alpha(cutoff, dt))
    }
}

#[derive(Debug, Clone, Copy)]
struct EuroParams {
    min_cutoff: f64,
    beta: f64,
    d_cutoff: f64,
}

/// One-Euro state for every coordinate of a hand.
#[derive(Debug, Clone)]
struct HandEuroFilter {
    params: EuroParams,
    axes: Vec<[OneEuro; 3]>,
    last_ns: Option<u64>,
}

/// Fallback frame interval when timestamps do not advance.
const FALLBACK_DT_SECS: f64 = 1.0 / 30.0;

impl HandEuroFilter {
    fn new(min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        Self {
            params: EuroParams {
                min_cutoff,
                beta,
                d_cutoff,
            },
            axes: (0..HAND_LANDMARK_COUNT)
                .map(|_| [OneEuro::new(), OneEuro::new(), OneEuro::new()])
                .collect(),
            last_ns: None,
        }
    }

    fn filter(
        &mut self,
        landmarks: &[Landmark; HAND_LANDMARK_COUNT],
        timestamp_ns: u64,
    ) -> [Landmark; HAND_LANDMARK_COUNT] {
        let dt = match self.last_ns {
            Some(last) if timestamp_ns > last => (timestamp_ns - last) as f64 / 1e9,
            _ => FALLBACK_DT_SECS,
        };
        self.last_ns = Some(timestamp_ns);

        let mut out = *landmarks;
        for (lm, axes) in out.iter_mut().zip(self.axes.iter_mut()) {
            lm.x = axes[0].apply(lm.x, dt, &self.params);
            lm.y = axes[1].apply(lm.y, dt, &self.params);
            lm.z = axes[2].apply(lm.z, dt, &self.params);
        }
        out
    }
}

/// `1 / (1 + tau / dt)` with `tau = 1 / (2π·cutoff)`.
fn smoothing_alpha(cutoff: f64, dt: f64) -> f64 {
    let tau = 1.0 / (2.0 * PI * cutoff);
    1.0 / (1.0 + tau / dt)
}
