//! Per-cycle energy and occupancy metrics.
//!
//! Power is approximated by the sum of brightness commands (one percent of one
//! lamp ≈ one watt) and compared against two fixed baselines: every lamp at
//! 100 % and every lamp at the 70 % floor. [`EnergyTrace`] keeps a CSV
//! record of those figures per cycle.
use crate::engine::{Lamp, LampCommand};
use crate::error::{Error, Result};
use crate::io::create_output_file;
use crate::types::{ObjectClass, ObjectTrack};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

const FULL_BASELINE: f64 = 100.0;
const FLOOR_BASELINE: f64 = 70.0;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CycleMetrics {
    pub active_power: f64,
    pub baseline_100: f64,
    pub baseline_70: f64,
    pub savings_vs_100: f64,
    pub savings_vs_70: f64,
    pub brightness_dist: Vec<f64>,
    pub occupancy: usize,
    pub pedestrians: usize,
    pub vehicles: usize,
    pub class_counts: BTreeMap<ObjectClass, usize>,
    pub sim_time: f64,
}

impl CycleMetrics {
    pub fn compute(
        commands: &[LampCommand],
        lamps: &[Lamp],
        tracks: &[ObjectTrack],
        sim_time: f64,
    ) -> Self {
        let n = commands.len() as f64;
        let active: f64 = commands.iter().map(|c| c.brightness).sum();
        let baseline_100 = n * FULL_BASELINE;
        let baseline_70 = n * FLOOR_BASELINE;

        let mut class_counts = BTreeMap::new();
        for t in tracks {
            *class_counts.entry(t.class).or_insert(0) += 1;
        }
        let count = |pred: fn(ObjectClass) -> bool| {
            class_counts
                .iter()
                .filter(|(c, _)| pred(**c))
                .map(|(_, n)| *n)
                .sum::<usize>()
        };

        Self {
            active_power: round1(active),
            baseline_100,
            baseline_70,
            savings_vs_100: round1(savings(baseline_100, active)),
            savings_vs_70: round1(savings(baseline_70, active)),
            brightness_dist: lamps.iter().map(|l| round1(l.brightness)).collect(),
            occupancy: tracks.len(),
            pedestrians: count(|c| c == ObjectClass::Pedestrian),
            vehicles: count(ObjectClass::is_motorised),
            class_counts,
            sim_time: (sim_time * 100.0).round() / 100.0,
        }
    }
}

/// Percentage saved relative to `baseline`; zero for an empty installation.
fn savings(baseline: f64, active: f64) -> f64 {
    if baseline > 0.0 {
        (baseline - active) / baseline * 100.0
    } else {
        0.0
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Integer command as shown on dashboards.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StreetlightLevel {
    pub id: String,
    pub brightness: u32,
}

/// Dashboard payload: current lamp levels plus the cycle metrics.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsPayload {
    pub streetlights: Vec<StreetlightLevel>,
    pub metrics: CycleMetrics,
}

impl MetricsPayload {
    pub fn new(commands: &[LampCommand], metrics: CycleMetrics) -> Self {
        let streetlights = commands
            .iter()
            .map(|c| StreetlightLevel {
                id: c.lamp_id.clone(),
                brightness: c.brightness.max(0.0).trunc() as u32,
            })
            .collect();
        Self {
            streetlights,
            metrics,
        }
    }
}

/// One trace row; column names match the dashboards' CSV import.
#[derive(Clone, Debug, PartialEq, Serialize)]
struct EnergyRecord {
    #[serde(rename = "Frame")]
    frame: u64,
    #[serde(rename = "Sim_Time")]
    sim_time: f64,
    #[serde(rename = "Active_Watts")]
    active_watts: f64,
    #[serde(rename = "Base100_Watts")]
    base100_watts: f64,
    #[serde(rename = "Base70_Watts")]
    base70_watts: f64,
    #[serde(rename = "Savings_vs_100")]
    savings_vs_100: f64,
    #[serde(rename = "Savings_vs_70")]
    savings_vs_70: f64,
}

const ENERGY_HEADER: [&str; 7] = [
    "Frame",
    "Sim_Time",
    "Active_Watts",
    "Base100_Watts",
    "Base70_Watts",
    "Savings_vs_100",
    "Savings_vs_70",
];

/// Append-only CSV energy trace, one row per cycle after a fixed header.
pub struct EnergyTrace {
    path: PathBuf,
    out: csv::Writer<BufWriter<File>>,
}

impl EnergyTrace {
    /// Create (or truncate) the trace file, creating parent directories, and
    /// write the header row.
    pub fn create(path: &Path) -> Result<Self> {
        let file = create_output_file(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let out = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(BufWriter::new(file));
        let mut trace = Self {
            path: path.to_path_buf(),
            out,
        };
        trace.write(|out| out.write_record(ENERGY_HEADER))?;
        Ok(trace)
    }

    pub fn record(&mut self, frame: u64, metrics: &CycleMetrics) -> Result<()> {
        let record = EnergyRecord {
            frame,
            sim_time: metrics.sim_time,
            active_watts: metrics.active_power,
            base100_watts: metrics.baseline_100,
            base70_watts: metrics.baseline_70,
            savings_vs_100: metrics.savings_vs_100,
            savings_vs_70: metrics.savings_vs_70,
        };
        self.write(|out| out.serialize(&record))
    }

    fn write(
        &mut self,
        op: impl FnOnce(&mut csv::Writer<BufWriter<File>>) -> csv::Result<()>,
    ) -> Result<()> {
        op(&mut self.out).map_err(|source| Error::Csv {
            path: self.path.clone(),
            source,
        })?;
        self.out.flush().map_err(|source| Error::Io {
            path: self.path.clone(),
            source,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
