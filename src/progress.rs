//! Fixed-cadence progress animation.
//!
//! The bar shown while a conversion runs is a UX device, not a measurement:
//! none of the wrapped libraries report progress, so the bar fills at a fixed
//! rate and then holds at 100% until the real work is done. The controller
//! runs the animation first and only then awaits the conversion's completion
//! handle, which guarantees the bar always visibly finishes before the save
//! action appears.
//!
//! # Example
//!
//! ```rust
//! use filenode::ProgressAnimation;
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let mut seen = Vec::new();
//! let finished = ProgressAnimation::new(0.5, Duration::from_millis(1))
//!     .run(|value| {
//!         seen.push(value);
//!         true
//!     })
//!     .await;
//! assert!(finished);
//! assert_eq!(seen, vec![0.0, 0.5, 1.0]);
//! # });
//! ```

use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Clamp a progress value into `[0, 1]`; NaN becomes 0.
pub fn clamp_progress(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A progress fill that advances by `step` every `tick`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressAnimation {
    step: f32,
    tick: Duration,
}

impl ProgressAnimation {
    pub fn new(step: f32, tick: Duration) -> Self {
        Self {
            step: clamp_progress(step).max(f32::EPSILON),
            tick: tick.max(Duration::from_millis(1)),
        }
    }

    /// Number of ticks needed to reach 1.0.
    pub fn steps(&self) -> usize {
        let raw = 1.0 / self.step;
        let nearest = raw.round();
        // 1 / 0.01f32 is not exactly 100
        if (raw - nearest).abs() < 1e-3 {
            nearest as usize
        } else {
            raw.ceil() as usize
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Total time the animation takes when it is not interrupted.
    pub fn duration(&self) -> Duration {
        self.tick * self.steps() as u32
    }

    /// Drive the animation, reporting `0.0`, each intermediate value and a
    /// final exact `1.0` to `on_tick`.
    ///
    /// `on_tick` returns `false` to stop early (the run it belongs to was
    /// cancelled or superseded). Returns `true` when the animation reached
    /// 1.0.
    pub async fn run<F>(&self, mut on_tick: F) -> bool
    where
        F: FnMut(f32) -> bool,
    {
        if !on_tick(0.0) {
            return false;
        }

        let steps = self.steps();
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        interval.tick().await;

        for i in 1..=steps {
            interval.tick().await;
            let value = if i == steps {
                1.0
            } else {
                clamp_progress(i as f32 * self.step)
            };
            if !on_tick(value) {
                return false;
            }
        }
        true
    }
}
