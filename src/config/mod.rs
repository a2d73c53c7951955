//! JSON runtime configuration for the control loop and demo tools.
//!
//! Every section is optional; omitted fields fall back to the tuned defaults.
//!
//! ```json
//! {
//!   "calibration": { "image": [[200,540],[860,540],[620,200],[380,200]],
//!                    "ground": [[0,0],[15,0],[15,100],[0,100]] },
//!   "lamps": [ { "id": "L1", "pixel": [350, 480] },
//!              { "id": "L2", "ground": [7.5, 40.0] } ],
//!   "policy_path": "qtables.json",
//!   "engine": { "base_min": 70, "base_max": 100 },
//!   "tracker": { "dt": 0.0667, "expiry_secs": 3.0 },
//!   "ambient": { "window": 120 },
//!   "publish": { "every_n_cycles": 5 },
//!   "output": { "energy_trace": "out/energy.csv" }
//! }
//! ```

pub mod replay;
pub mod runtime;

pub use runtime::{
    load_config, LampPlacement, LampSpec, OutputConfig, RuntimeConfig, TrackerConfig,
};
