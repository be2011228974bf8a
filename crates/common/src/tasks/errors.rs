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

use crate::model::EntityId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Scheduler not responding")]
    SchedulerNotResponding,
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),
    #[error("Invalid delay: {0} seconds")]
    InvalidDelay(f64),
    #[error("Invalid random bound: {0}")]
    InvalidRandomBound(i32),
    #[error("Checkpoint failed: {0}")]
    CheckpointFailed(String),
}
