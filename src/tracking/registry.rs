use super::kalman::{ConstantVelocityKalman, KalmanParams};
use log::debug;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Real-time window after which an unobserved track is dropped.
pub const DEFAULT_TRACK_EXPIRY: Duration = Duration::from_secs(3);

/// Per-identity Kalman filters with create / lookup / expire operations.
#[derive(Debug)]
pub struct TrackRegistry {
    params: KalmanParams,
    expiry: Duration,
    trackers: HashMap<u64, ConstantVelocityKalman>,
}

impl TrackRegistry {
    pub fn new(params: KalmanParams) -> Self {
        Self::with_expiry(params, DEFAULT_TRACK_EXPIRY)
    }

    pub fn with_expiry(params: KalmanParams, expiry: Duration) -> Self {
        Self {
            params,
            expiry,
            trackers: HashMap::new(),
        }
    }

    /// Predict every live tracker one step, observed this cycle or not.
    pub fn predict_all(&mut self) {
        for tracker in self.trackers.values_mut() {
            tracker.predict();
        }
    }

    /// Fuse a ground-plane measurement for `id`, creating its tracker on first
    /// sight. Returns the smoothed `(x, y, vx, vy)` after the update.
    pub fn observe(&mut self, id: u64, x: f64, y: f64, now: Instant) -> [f64; 4] {
        let params = &self.params;
        let tracker = self.trackers.entry(id).or_insert_with(|| {
            debug!("TrackRegistry: new track id={id} at ({x:.2}, {y:.2})");
            ConstantVelocityKalman::new(x, y, params, now)
        });
        tracker.update(x, y, now);
        tracker.state()
    }

    pub fn get(&self, id: u64) -> Option<&ConstantVelocityKalman> {
        self.trackers.get(&id)
    }

    /// Drop trackers whose last update is older than the expiry window.
    /// Returns the removed identities, sorted.
    pub fn expire_stale(&mut self, now: Instant) -> Vec<u64> {
        let expiry = self.expiry;
        let mut removed = Vec::new();
        self.trackers.retain(|&id, tracker| {
            let age = now.saturating_duration_since(tracker.last_update());
            let keep = age <= expiry;
            if !keep {
                removed.push(id);
            }
            keep
        });
        removed.sort_unstable();
        if !removed.is_empty() {
            debug!("TrackRegistry: expired {} stale track(s): {:?}", removed.len(), removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.trackers.keys().copied()
    }
}
