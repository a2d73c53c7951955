use lumen_control::config::RuntimeConfig;
use lumen_control::{ControlLoop, FrameInput, ObjectClass, Observation};
use std::time::{Duration, Instant};

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    // Demo stub: a pedestrian walks up the image past the default four lamps
    let config = RuntimeConfig::default();
    let dt = config.tracker.kalman.dt;
    let mut control = ControlLoop::new(config).map_err(|e| e.to_string())?;

    let start = Instant::now();
    for frame in 0..45u32 {
        let foot_y = 520.0 - 6.0 * frame as f64;
        let bbox = [420.0, foot_y - 60.0, 450.0, foot_y];
        let walker = Observation::from_bbox(1, ObjectClass::Pedestrian, bbox);
        let now = start + Duration::from_secs_f64(dt * frame as f64);
        let out = control.step(&FrameInput::new(35.0, vec![walker]), now);
        if out.cycle % 15 == 0 {
            let levels: Vec<String> = out
                .commands
                .iter()
                .map(|c| format!("{}={:.1}", c.lamp_id, c.brightness))
                .collect();
            println!(
                "t={:.2}s ambient={:.2} tracks={} {}",
                out.sim_time,
                out.ambient,
                out.tracks.len(),
                levels.join(" ")
            );
        }
    }
    Ok(())
}
