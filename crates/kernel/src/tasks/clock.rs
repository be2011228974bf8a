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

use std::time::Duration;
use tickworld_common::tasks::{SchedulerError, Tick};

pub const DEFAULT_TICK_RATE: u32 = 60;

/// Monotonic tick counter plus the rate used to turn seconds into ticks.
///
/// `current_tick` is always the next tick whose batch will be drained. `advance` bumps it before
/// any of the drained tasks run, so anything scheduled while a batch executes can only land on a
/// later tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    current_tick: Tick,
    tick_rate: u32,
}

impl TickClock {
    pub fn new(tick_rate: u32) -> Self {
        Self::starting_at(0, tick_rate)
    }

    pub fn starting_at(current_tick: Tick, tick_rate: u32) -> Self {
        Self {
            current_tick,
            tick_rate: tick_rate.max(1),
        }
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Real-time length of one tick.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate))
    }

    /// Move to the next tick, returning the tick that is now due.
    pub fn advance(&mut self) -> Tick {
        let due = self.current_tick;
        self.current_tick += 1;
        due
    }

    /// Whole ticks covered by `delay_seconds`, rounded down.
    pub fn ticks_for(&self, delay_seconds: f64) -> Result<Tick, SchedulerError> {
        if !delay_seconds.is_finite() || delay_seconds < 0.0 {
            return Err(SchedulerError::InvalidDelay(delay_seconds));
        }
        Ok((delay_seconds * f64::from(self.tick_rate)).floor() as Tick)
    }

    /// `floor(current_tick + delay_seconds * tick_rate)`.
    pub fn target_tick(&self, delay_seconds: f64) -> Result<Tick, SchedulerError> {
        Ok(self
            .current_tick
            .saturating_add(self.ticks_for(delay_seconds)?))
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE)
    }
}
