//! Ambient-light estimation.
//!
//! The upstream statistic (median brightness of a frame, 0–255) is smoothed
//! with an exponential moving average and normalised against the 10th/90th
//! percentiles of the recent smoothed history. The result is a scene-relative
//! ambient fraction in [0, 1] rather than an absolute threshold, so the same
//! controller works on bright and dim cameras alike.

mod frame;

pub use frame::{estimate_headlights, frame_value_median};

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Fraction reported until enough history has accumulated.
pub const NEUTRAL_AMBIENT: f64 = 0.5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientParams {
    /// Weight of the new sample in the moving average.
    pub ema_alpha: f64,
    /// Number of smoothed values kept for the percentile window.
    pub window: usize,
    /// Samples required before normalisation kicks in.
    pub min_samples: usize,
    pub low_percentile: f64,
    pub high_percentile: f64,
}

impl Default for AmbientParams {
    fn default() -> Self {
        Self {
            ema_alpha: 0.2,
            window: 120,
            min_samples: 10,
            low_percentile: 10.0,
            high_percentile: 90.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AmbientEstimator {
    params: AmbientParams,
    ema: Option<f64>,
    history: VecDeque<f64>,
    last_fraction: f64,
}

impl Default for AmbientEstimator {
    fn default() -> Self {
        Self::new(AmbientParams::default())
    }
}

impl AmbientEstimator {
    pub fn new(params: AmbientParams) -> Self {
        let window = params.window.max(1);
        Self {
            params: AmbientParams { window, ..params },
            ema: None,
            history: VecDeque::with_capacity(window),
            last_fraction: NEUTRAL_AMBIENT,
        }
    }

    /// Fold one frame statistic in and return the current ambient fraction.
    ///
    /// Non-finite statistics are ignored and the previous fraction returned.
    pub fn compute(&mut self, statistic: f64) -> f64 {
        if !statistic.is_finite() {
            return self.last_fraction;
        }
        let alpha = self.params.ema_alpha;
        let ema = match self.ema {
            Some(prev) => alpha * statistic + (1.0 - alpha) * prev,
            None => statistic,
        };
        self.ema = Some(ema);
        if self.history.len() == self.params.window {
            self.history.pop_front();
        }
        self.history.push_back(ema);

        self.last_fraction = if self.history.len() < self.params.min_samples {
            NEUTRAL_AMBIENT
        } else {
            let mut sorted: Vec<f64> = self.history.iter().copied().collect();
            sorted.sort_by(f64::total_cmp);
            let lo = percentile_sorted(&sorted, self.params.low_percentile);
            let hi = percentile_sorted(&sorted, self.params.high_percentile);
            // +1 keeps a flat history finite.
            ((ema - lo) / ((hi - lo) + 1.0)).clamp(0.0, 1.0)
        };
        self.last_fraction
    }

    pub fn smoothed(&self) -> Option<f64> {
        self.ema
    }

    pub fn samples(&self) -> usize {
        self.history.len()
    }
}

/// Percentile with linear interpolation between order statistics.
/// `sorted` must be ascending and non-empty.
pub(crate) fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn neutral_until_ten_samples() {
        let mut est = AmbientEstimator::default();
        for i in 0..9 {
            assert_eq!(est.compute(i as f64 * 20.0), NEUTRAL_AMBIENT);
        }
        let f = est.compute(250.0);
        assert_ne!(f, NEUTRAL_AMBIENT);
        assert_eq!(est.samples(), 10);
    }

    #[test]
    fn ema_weights_new_sample_by_point_two() {
        let mut est = AmbientEstimator::default();
        est.compute(100.0);
        est.compute(200.0);
        assert!(approx_eq(est.smoothed().unwrap(), 120.0));
    }

    #[test]
    fn flat_scene_normalises_to_zero() {
        let mut est = AmbientEstimator::default();
        let mut f = 1.0;
        for _ in 0..20 {
            f = est.compute(80.0);
        }
        assert!(approx_eq(f, 0.0), "f={f}");
    }

    #[test]
    fn brightening_scene_rises_and_stays_bounded() {
        let mut est = AmbientEstimator::default();
        let mut last = 0.0;
        for i in 0..200 {
            last = est.compute(i as f64);
            assert!((0.0..=1.0).contains(&last));
        }
        assert!(last > 0.5, "last={last}");
    }

    #[test]
    fn window_is_bounded() {
        let mut est = AmbientEstimator::default();
        for i in 0..500 {
            est.compute(i as f64);
        }
        assert_eq!(est.samples(), 120);
    }

    #[test]
    fn out_of_range_and_nan_inputs_degrade_gracefully() {
        let mut est = AmbientEstimator::default();
        for _ in 0..15 {
            est.compute(100.0);
        }
        let before = est.compute(1.0e6);
        assert!((0.0..=1.0).contains(&before));
        assert_eq!(est.compute(f64::NAN), before);
        assert_eq!(est.samples(), 16);
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [0.0, 10.0, 20.0, 30.0, 40.0];
        assert!(approx_eq(percentile_sorted(&sorted, 10.0), 4.0));
        assert!(approx_eq(percentile_sorted(&sorted, 90.0), 36.0));
        assert!(approx_eq(percentile_sorted(&sorted, 50.0), 20.0));
    }
}
