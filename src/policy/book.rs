use super::{PolicyAgent, PolicyState, ACTION_COUNT};
use crate::error::{Error, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One table row as stored on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyEntry {
    pub state: PolicyState,
    pub values: [f64; ACTION_COUNT],
}

/// On-disk layout: lamp identity → table rows.
pub type PolicyFile = HashMap<String, Vec<PolicyEntry>>;

/// Policy tables for a whole installation, keyed by lamp identity.
#[derive(Clone, Debug, Default)]
pub struct PolicyBook {
    agents: HashMap<String, PolicyAgent>,
}

impl PolicyBook {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_file_contents(file: PolicyFile) -> Self {
        let agents = file
            .into_iter()
            .map(|(lamp_id, rows)| {
                let table = rows.into_iter().map(|row| (row.state, row.values)).collect();
                (lamp_id, PolicyAgent::new(table))
            })
            .collect();
        Self { agents }
    }

    pub fn from_json_str(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str::<PolicyFile>(json).map(Self::from_file_contents)
    }

    /// Read tables from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let book = Self::from_json_str(&data).map_err(|source| Error::Json {
            path: path.to_path_buf(),
            source,
        })?;
        info!(
            "Loaded policy tables for {} lamp(s) from {}",
            book.agents.len(),
            path.display()
        );
        Ok(book)
    }

    /// Like [`PolicyBook::load`], but a missing file only warns and yields
    /// empty tables. A present but malformed file is still an error.
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Policy file {} not found, running with empty tables",
                path.display()
            );
            return Ok(Self::empty());
        }
        Self::load(path)
    }

    pub fn insert(&mut self, lamp_id: impl Into<String>, agent: PolicyAgent) {
        self.agents.insert(lamp_id.into(), agent);
    }

    /// Remove and return the table for `lamp_id`, or an empty agent.
    pub fn take(&mut self, lamp_id: &str) -> PolicyAgent {
        self.agents.remove(lamp_id).unwrap_or_default()
    }

    pub fn lamp_ids(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
