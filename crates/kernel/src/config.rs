// Copyright (C) 2026 Ryan Daum <ryan.daum@gmail.com> This program is free
// software: you can redistribute it and/or modify it under the terms of the GNU
// General Public License as published by the Free Software Foundation, version
// 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Config is created by the host daemon and handed to the simulation when it is built. Used to
//! hold things typically configured by CLI flags or the YAML config file.

use crate::tasks::action_gate::DEFAULT_ACTION_COST;
use crate::tasks::clock::DEFAULT_TICK_RATE;
use crate::tasks::entropy::DEFAULT_ENTROPY_WINDOW;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seed string used when neither the config nor the host supplies one.
pub const DEFAULT_SEED: &str = "tickworld";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Ticks per real-time second.
    pub tick_rate: u32,
    /// String the RNG seed is derived from on a fresh start. Ignored when resuming from a
    /// snapshot, which carries its own seed.
    pub initial_seed: Option<String>,
    /// Number of scheduling observations kept in the entropy window.
    pub entropy_window: usize,
    /// Cooldown, in seconds, given to every action kind of a freshly created gate.
    pub default_action_cost: f64,
    /// How often the host should checkpoint the scheduler state. `None` or zero disables it.
    pub checkpoint_interval_seconds: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            initial_seed: None,
            entropy_window: DEFAULT_ENTROPY_WINDOW,
            default_action_cost: DEFAULT_ACTION_COST,
            checkpoint_interval_seconds: None,
        }
    }
}

impl SchedulerConfig {
    pub fn checkpoint_interval(&self) -> Option<Duration> {
        self.checkpoint_interval_seconds
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
    }

    pub fn seed(&self) -> &str {
        self.initial_seed.as_deref().unwrap_or(DEFAULT_SEED)
    }
}
