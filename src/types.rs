use serde::{Deserialize, Serialize};
use std::fmt;

/// Road-agent categories the controller reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    #[serde(alias = "person")]
    Pedestrian,
    Bicycle,
    Car,
    #[serde(alias = "motorbike")]
    Motorcycle,
    Bus,
    Truck,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 6] = [
        ObjectClass::Pedestrian,
        ObjectClass::Bicycle,
        ObjectClass::Car,
        ObjectClass::Motorcycle,
        ObjectClass::Bus,
        ObjectClass::Truck,
    ];

    /// Maps a COCO class id as emitted by common detectors. Ids outside the
    /// road-agent subset return `None` and are ignored upstream.
    pub fn from_coco_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(ObjectClass::Pedestrian),
            1 => Some(ObjectClass::Bicycle),
            2 => Some(ObjectClass::Car),
            3 => Some(ObjectClass::Motorcycle),
            5 => Some(ObjectClass::Bus),
            7 => Some(ObjectClass::Truck),
            _ => None,
        }
    }

    /// Everything on wheels, bicycles included.
    pub fn is_vehicle(self) -> bool {
        !matches!(self, ObjectClass::Pedestrian)
    }

    /// Motorised traffic counted as "vehicles" in published metrics.
    pub fn is_motorised(self) -> bool {
        matches!(
            self,
            ObjectClass::Car | ObjectClass::Motorcycle | ObjectClass::Bus | ObjectClass::Truck
        )
    }

    /// Classes whose boxes are checked for lit headlights in frames.
    pub fn has_headlights(self) -> bool {
        matches!(self, ObjectClass::Car | ObjectClass::Bus | ObjectClass::Truck)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectClass::Pedestrian => "pedestrian",
            ObjectClass::Bicycle => "bicycle",
            ObjectClass::Car => "car",
            ObjectClass::Motorcycle => "motorcycle",
            ObjectClass::Bus => "bus",
            ObjectClass::Truck => "truck",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Smoothed ground-plane state of one tracked road agent for a single cycle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectTrack {
    pub id: u64,
    pub class: ObjectClass,
    /// Ground-plane position (metres).
    pub position: [f64; 2],
    /// Ground-plane velocity (metres per second).
    pub velocity: [f64; 2],
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    /// Set when the agent carries a strong light source such as headlights.
    #[serde(default)]
    pub bright_emitter: bool,
    /// Simulated cycle time (seconds) at which the state was produced.
    #[serde(default)]
    pub timestamp: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl ObjectTrack {
    pub fn new(id: u64, class: ObjectClass, position: [f64; 2], velocity: [f64; 2]) -> Self {
        Self {
            id,
            class,
            position,
            velocity,
            confidence: 1.0,
            bright_emitter: false,
            timestamp: 0.0,
        }
    }

    pub fn with_bright_emitter(mut self, on: bool) -> Self {
        self.bright_emitter = on;
        self
    }

    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn speed(&self) -> f64 {
        self.velocity[0].hypot(self.velocity[1])
    }
}

/// One detection handed over by the tracking collaborator, still in image space.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub id: u64,
    pub class: ObjectClass,
    /// Image-plane contact point (bottom-centre of the bounding box), pixels.
    pub foot_point: [f64; 2],
    #[serde(default)]
    pub bright_emitter: bool,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl Observation {
    /// Builds an observation from an `[x1, y1, x2, y2]` bounding box.
    pub fn from_bbox(id: u64, class: ObjectClass, bbox: [f64; 4]) -> Self {
        let [x1, _y1, x2, y2] = bbox;
        Self {
            id,
            class,
            foot_point: [(x1 + x2) * 0.5, y2],
            bright_emitter: false,
            confidence: 1.0,
        }
    }
}
