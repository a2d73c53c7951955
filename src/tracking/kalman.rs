use log::debug;
use nalgebra::{Matrix2, Matrix4, SMatrix, Vector2, Vector4};
use serde::{Deserialize, Serialize};
use std::time::Instant;

type Matrix2x4 = SMatrix<f64, 2, 4>;

/// Noise and timing constants shared by every per-track filter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KalmanParams {
    /// Model time step in seconds (one processed frame).
    pub dt: f64,
    /// Diagonal process noise. Small values favour smoothness over reactivity.
    pub process_noise: f64,
    /// Diagonal measurement noise on the ground-plane position.
    pub measurement_noise: f64,
}

impl Default for KalmanParams {
    fn default() -> Self {
        Self {
            dt: 1.0 / 15.0,
            process_noise: 0.03,
            measurement_noise: 0.5,
        }
    }
}

/// Constant-velocity Kalman filter over `(x, y, vx, vy)`.
#[derive(Clone, Debug)]
pub struct ConstantVelocityKalman {
    state: Vector4<f64>,
    covariance: Matrix4<f64>,
    transition: Matrix4<f64>,
    observation: Matrix2x4,
    process_noise: Matrix4<f64>,
    measurement_noise: Matrix2<f64>,
    last_update: Instant,
}

impl ConstantVelocityKalman {
    /// Start a filter at the first measured position with zero velocity.
    ///
    /// The covariance starts at zero, so the estimate only begins to move once
    /// a prediction step has injected process noise.
    pub fn new(x: f64, y: f64, params: &KalmanParams, now: Instant) -> Self {
        let dt = params.dt;
        #[rustfmt::skip]
        let transition = Matrix4::new(
            1.0, 0.0, dt,  0.0,
            0.0, 1.0, 0.0, dt,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        );
        #[rustfmt::skip]
        let observation = Matrix2x4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
        );
        Self {
            state: Vector4::new(x, y, 0.0, 0.0),
            covariance: Matrix4::zeros(),
            transition,
            observation,
            process_noise: Matrix4::identity() * params.process_noise,
            measurement_noise: Matrix2::identity() * params.measurement_noise,
            last_update: now,
        }
    }

    /// Advance one time step with the motion model.
    pub fn predict(&mut self) -> [f64; 2] {
        self.state = self.transition * self.state;
        self.covariance =
            self.transition * self.covariance * self.transition.transpose() + self.process_noise;
        [self.state[0], self.state[1]]
    }

    /// Fuse a ground-plane position measurement and stamp the update time.
    pub fn update(&mut self, x: f64, y: f64, now: Instant) {
        self.last_update = now;
        let innovation = Vector2::new(x, y) - self.observation * self.state;
        let s = self.observation * self.covariance * self.observation.transpose()
            + self.measurement_noise;
        let Some(s_inv) = s.try_inverse() else {
            debug!("Kalman update: innovation covariance is singular, measurement skipped");
            return;
        };
        let gain = self.covariance * self.observation.transpose() * s_inv;
        self.state += gain * innovation;
        self.covariance = (Matrix4::identity() - gain * self.observation) * self.covariance;
    }

    /// Current smoothed `(x, y, vx, vy)`.
    pub fn state(&self) -> [f64; 4] {
        [self.state[0], self.state[1], self.state[2], self.state[3]]
    }

    pub fn last_update(&self) -> Instant {
        self.last_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_keeps_initial_position() {
        let now = Instant::now();
        let mut kf = ConstantVelocityKalman::new(3.0, 4.0, &KalmanParams::default(), now);
        kf.update(3.5, 4.5, now);
        assert_eq!(kf.state(), [3.0, 4.0, 0.0, 0.0]);
    }

    #[test]
    fn stationary_prediction_holds_position() {
        let now = Instant::now();
        let mut kf = ConstantVelocityKalman::new(1.0, 2.0, &KalmanParams::default(), now);
        for _ in 0..10 {
            kf.predict();
        }
        let [x, y, vx, vy] = kf.state();
        assert_eq!((x, y, vx, vy), (1.0, 2.0, 0.0, 0.0));
    }

    #[test]
    fn converges_on_constant_velocity_target() {
        let params = KalmanParams::default();
        let now = Instant::now();
        let speed = 6.0;
        let mut kf = ConstantVelocityKalman::new(0.0, 0.0, &params, now);
        for step in 1..=300 {
            kf.predict();
            let t = step as f64 * params.dt;
            kf.update(0.0, speed * t, now);
        }
        let [x, y, vx, vy] = kf.state();
        let expected_y = speed * 300.0 * params.dt;
        assert!(x.abs() < 1e-6, "x={x}");
        assert!((y - expected_y).abs() < 1.0, "y={y} expected {expected_y}");
        assert!(vx.abs() < 1e-6, "vx={vx}");
        assert!((vy - speed).abs() < 0.5, "vy={vy}");
    }

    #[test]
    fn smooths_a_single_outlier() {
        let params = KalmanParams::default();
        let now = Instant::now();
        let mut kf = ConstantVelocityKalman::new(10.0, 10.0, &params, now);
        for _ in 0..50 {
            kf.predict();
            kf.update(10.0, 10.0, now);
        }
        kf.predict();
        kf.update(20.0, 10.0, now);
        let [x, ..] = kf.state();
        assert!(x > 10.0 && x < 15.0, "outlier should be damped, x={x}");
    }
}
