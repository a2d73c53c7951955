use lumen_control::engine::{BrightnessEngine, EngineParams, Lamp};
use lumen_control::policy::PolicyBook;
use lumen_control::{ObjectClass, ObjectTrack};

/// Lamps along the road centre line, `spacing` metres apart, starting at y = 0.
pub fn straight_road(count: usize, spacing: f64) -> Vec<Lamp> {
    assert!(count > 0, "need at least one lamp");
    (0..count)
        .map(|i| Lamp::new(format!("L{}", i + 1), [7.5, i as f64 * spacing]))
        .collect()
}

pub fn engine(lamps: Vec<Lamp>) -> BrightnessEngine {
    BrightnessEngine::new(lamps, EngineParams::default(), PolicyBook::empty())
        .expect("default parameters and a non-empty layout are valid")
}

pub fn agent(id: u64, class: ObjectClass, position: [f64; 2], velocity: [f64; 2]) -> ObjectTrack {
    ObjectTrack::new(id, class, position, velocity)
}
