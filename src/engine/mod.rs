//! Brightness engine: the control core.
//!
//! Overview
//! - Holds every [`Lamp`] and a static [`LampIndex`] over their positions.
//! - Per cycle, extrapolates each track along its velocity by the class
//!   reaction horizon and scores the lamps in sensing range (`scoring`).
//! - Per lamp, normalises the score, maps it onto a sublinear curve above the
//!   ambient-dependent idle level, and nudges the result with the lamp's
//!   policy table (±5 or 0).
//! - Dwell hysteresis and a rate limiter (`control`) keep the output from
//!   flickering; the result is clipped to the operating band and committed.
//!
//! Modules
//! - [`params`] – engine-wide and per-class constants.
//! - `lamp` – lamp state and command type.
//! - `spatial` – bounded-radius lookup over lamp positions.
//! - [`scoring`] – extrapolation, contribution and nominal target.
//! - [`control`] – dwell and smoothing stages.
//! - `pipeline` – [`BrightnessEngine`] tying the stages together.
//!
//! Every lamp gets a command every cycle, with or without nearby agents.

pub mod control;
mod lamp;
pub mod params;
mod pipeline;
pub mod scoring;
mod spatial;

pub use lamp::{Lamp, LampCommand, INITIAL_BRIGHTNESS};
pub use params::{ClassParams, ClassTable, EngineParams};
pub use pipeline::{BrightnessEngine, EngineReport, LampDecision};
pub use spatial::LampIndex;
