//! Greedy execution of a pre-trained tabular policy.
//!
//! Each lamp owns a table mapping a coarse scene state to three action values.
//! The agent picks the best action (ties go to the lowest index) and never
//! updates the table: learning happens offline, the controller only reads.
//! States the table has never seen score all-zero and select
//! [`Action::Hold`].

mod book;
mod state;

pub use book::{PolicyBook, PolicyEntry, PolicyFile};
pub use state::PolicyState;

use serde::Serialize;
use std::collections::HashMap;

/// Number of discrete actions in every table row.
pub const ACTION_COUNT: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Decrease,
    Hold,
    Increase,
}

impl Action {
    pub const ALL: [Action; ACTION_COUNT] = [Action::Decrease, Action::Hold, Action::Increase];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Action::Decrease => 0,
            Action::Hold => 1,
            Action::Increase => 2,
        }
    }

    /// Signed step multiplier: -1, 0 or +1.
    pub fn sign(self) -> f64 {
        self.index() as f64 - 1.0
    }
}

/// Immutable state → action-value table for one lamp.
#[derive(Clone, Debug, Default)]
pub struct PolicyAgent {
    table: HashMap<PolicyState, [f64; ACTION_COUNT]>,
}

impl PolicyAgent {
    pub fn new(table: HashMap<PolicyState, [f64; ACTION_COUNT]>) -> Self {
        Self { table }
    }

    /// Action values for `state`; unseen states are all zero.
    pub fn values(&self, state: &PolicyState) -> [f64; ACTION_COUNT] {
        self.table.get(state).copied().unwrap_or([0.0; ACTION_COUNT])
    }

    /// Greedy action. The first maximum wins; NaN values never win. A state
    /// missing from the table holds.
    pub fn act(&self, state: &PolicyState) -> Action {
        let Some(values) = self.table.get(state) else {
            return Action::Hold;
        };
        let mut best = Action::Hold.index();
        let mut best_val = f64::NEG_INFINITY;
        for (i, &v) in values.iter().enumerate() {
            if v > best_val {
                best_val = v;
                best = i;
            }
        }
        Action::from_index(best).unwrap_or(Action::Hold)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
