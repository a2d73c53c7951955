use serde::{Deserialize, Serialize};

/// Brightness a lamp holds before its first command (percent).
pub const INITIAL_BRIGHTNESS: f64 = 70.0;

/// A street lamp at a fixed ground position with its ramp bookkeeping.
///
/// `on_since` / `off_since` mark when the lamp started its current upward or
/// downward ramp; at most one of them is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lamp {
    pub id: String,
    pub position: [f64; 2],
    pub brightness: f64,
    /// Time (seconds) of the last committed command.
    pub last_command: f64,
    pub on_since: Option<f64>,
    pub off_since: Option<f64>,
}

impl Lamp {
    pub fn new(id: impl Into<String>, position: [f64; 2]) -> Self {
        Self {
            id: id.into(),
            position,
            brightness: INITIAL_BRIGHTNESS,
            last_command: 0.0,
            on_since: None,
            off_since: None,
        }
    }

    pub fn with_brightness(mut self, brightness: f64) -> Self {
        self.brightness = brightness;
        self
    }

    /// +1 while ramping up, -1 while ramping down, 0 otherwise.
    pub fn ramp_direction(&self) -> i8 {
        self.on_since.is_some() as i8 - self.off_since.is_some() as i8
    }
}

/// Command for one lamp, rounded to one decimal for transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LampCommand {
    pub lamp_id: String,
    pub brightness: f64,
}

pub(crate) fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
