//! Publishing seam towards the message transport.
//!
//! The broker client itself lives outside this crate; it plugs in through
//! [`CommandSink`]. [`Publisher`] owns the cadence and topics and contains
//! failures: a sink error is logged and counted, never returned to the control
//! loop.
use crate::engine::LampCommand;
use crate::metrics::MetricsPayload;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Destination for serialised messages.
pub trait CommandSink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError>;
}

/// Writes `{"topic": ..., "payload": ...}` lines to any writer.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    topic: &'a str,
    payload: serde_json::Value,
}

impl<W: Write> CommandSink for JsonLinesSink<W> {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        let payload = serde_json::from_str(payload)?;
        serde_json::to_writer(&mut self.out, &Envelope { topic, payload })?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Keeps every published message in memory.
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    pub messages: Vec<(String, String)>,
}

impl CommandSink for MemorySink {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), TransportError> {
        self.messages.push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishParams {
    /// Publish on every n-th cycle (1 = every cycle).
    pub every_n_cycles: u64,
    pub commands_topic: String,
    pub metrics_topic: String,
}

impl Default for PublishParams {
    fn default() -> Self {
        Self {
            every_n_cycles: 5,
            commands_topic: "smart_streetlights/commands/brightness".to_string(),
            metrics_topic: "smart_streetlights/metrics".to_string(),
        }
    }
}

/// Fire-and-forget publisher with a fixed cadence.
pub struct Publisher {
    params: PublishParams,
    sink: Option<Box<dyn CommandSink>>,
    published: u64,
    failures: u64,
}

impl Publisher {
    pub fn new(params: PublishParams, sink: Box<dyn CommandSink>) -> Self {
        Self {
            params,
            sink: Some(sink),
            published: 0,
            failures: 0,
        }
    }

    /// A publisher without a sink; every call is a no-op.
    pub fn disabled() -> Self {
        Self {
            params: PublishParams::default(),
            sink: None,
            published: 0,
            failures: 0,
        }
    }

    pub fn is_due(&self, cycle: u64) -> bool {
        let every = self.params.every_n_cycles.max(1);
        cycle % every == 0
    }

    /// Publish commands and metrics if `cycle` is on the cadence.
    /// Returns whether anything was attempted.
    pub fn maybe_publish(
        &mut self,
        cycle: u64,
        commands: &[LampCommand],
        metrics: &MetricsPayload,
    ) -> bool {
        if self.sink.is_none() || !self.is_due(cycle) {
            return false;
        }
        let command_map: BTreeMap<&str, f64> = commands
            .iter()
            .map(|c| (c.lamp_id.as_str(), c.brightness))
            .collect();
        let commands_topic = self.params.commands_topic.clone();
        let metrics_topic = self.params.metrics_topic.clone();
        self.send(&commands_topic, serde_json::to_string(&command_map));
        self.send(&metrics_topic, serde_json::to_string(metrics));
        true
    }

    fn send(&mut self, topic: &str, payload: serde_json::Result<String>) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let result = payload
            .map_err(TransportError::from)
            .and_then(|body| sink.publish(topic, &body));
        match result {
            Ok(()) => {
                self.published += 1;
                debug!("Published to {topic}");
            }
            Err(err) => {
                self.failures += 1;
                warn!("Publish to {topic} failed: {err}");
            }
        }
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }
}
