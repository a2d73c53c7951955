use lumen_control::config::replay::{load_replay, load_replay_config};
use lumen_control::io::write_json_file;
use lumen_control::transport::JsonLinesSink;
use lumen_control::{ControlLoop, CycleOutput};
use std::env;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn main() {
    let _ = env_logger::builder().format_timestamp(None).try_init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn usage(program: &str) -> String {
    format!("Usage: {program} <config.json>")
}

fn run() -> Result<(), String> {
    let mut args = env::args();
    let program = args.next().unwrap_or_else(|| "replay_demo".to_string());
    let config_path = args.next().map(PathBuf::from).ok_or_else(|| usage(&program))?;
    let mut config = load_replay_config(&config_path)?;

    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let input_path = base_dir.join(&config.input);
    let replay = load_replay(&input_path)?;
    let frame_dir = input_path.parent().map(Path::to_path_buf).unwrap_or_default();

    config.runtime.engine = config.engine.resolve(&config.runtime.engine);
    let dt = config.runtime.tracker.kalman.dt;
    let mut control = if config.runtime.output.messages.is_some() {
        ControlLoop::new(config.runtime)
    } else {
        ControlLoop::with_sink(config.runtime, Box::new(JsonLinesSink::new(std::io::stdout())))
    }
    .map_err(|e| e.to_string())?;

    // Wall-clock time is reconstructed from the frame rate so recordings
    // replay identically however fast they are processed.
    let start = Instant::now();
    let mut outputs: Vec<CycleOutput> = Vec::with_capacity(replay.frames.len());
    for (i, frame) in replay.frames.iter().enumerate() {
        let input = frame
            .to_input(&frame_dir)
            .map_err(|e| format!("frame {i}: {e}"))?;
        let now = start + Duration::from_secs_f64(dt * i as f64);
        let out = control.step(&input, now);
        if config.output.summary {
            print_summary(&out);
        }
        outputs.push(out);
    }

    if let Some(path) = &config.output.json_out {
        write_json_file(path, &outputs)?;
        eprintln!("Cycle report written to {}", path.display());
    }
    let publisher = control.publisher();
    eprintln!(
        "Replayed {} frame(s): {} message(s) published, {} failed",
        outputs.len(),
        publisher.published(),
        publisher.failures()
    );
    Ok(())
}

fn print_summary(out: &CycleOutput) {
    let m = &out.metrics.metrics;
    eprintln!(
        "cycle {:>5} t={:>7.2}s ambient={:.2} tracks={:>2} power={:>6.1} saving_vs_100={:>5.1}%",
        out.cycle,
        out.sim_time,
        out.ambient,
        out.tracks.len(),
        m.active_power,
        m.savings_vs_100
    );
}
