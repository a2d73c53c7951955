//! Anti-flicker stages: dwell-time hysteresis and rate-limited smoothing.
use super::lamp::Lamp;
use super::params::ClassParams;

/// Smallest elapsed time used by the rate limiter (seconds).
const MIN_ELAPSED: f64 = 1e-3;

/// Hold the current brightness when the target would reverse a ramp that has
/// not yet lasted its minimum dwell time.
pub fn apply_dwell(lamp: &Lamp, target: f64, dwell: &ClassParams, now: f64) -> f64 {
    let mut target = target;
    if let Some(on) = lamp.on_since {
        if now - on < dwell.min_on_s && target < lamp.brightness {
            target = lamp.brightness;
        }
    }
    if let Some(off) = lamp.off_since {
        if now - off < dwell.min_off_s && target > lamp.brightness {
            target = lamp.brightness;
        }
    }
    target
}

/// Move toward `target` by at most `rate_limit * elapsed` and update the ramp
/// timestamps from the direction of the resulting change.
pub fn smooth_toward(lamp: &mut Lamp, target: f64, rate_limit: f64, now: f64) -> f64 {
    let elapsed = (now - lamp.last_command).max(MIN_ELAPSED);
    let delta = target - lamp.brightness;
    let max_delta = rate_limit * elapsed;
    let next = if delta.abs() > max_delta {
        lamp.brightness + max_delta.copysign(delta)
    } else {
        target
    };
    if next > lamp.brightness {
        lamp.on_since.get_or_insert(now);
        lamp.off_since = None;
    } else if next < lamp.brightness {
        lamp.off_since.get_or_insert(now);
        lamp.on_since = None;
    }
    next
}
