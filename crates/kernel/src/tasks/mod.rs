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

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tickworld_common::tasks::TaskId;

pub mod action_gate;
pub mod clock;
pub mod entropy;
pub mod operation;
pub mod scheduler;
pub mod scheduler_client;
pub mod scheduler_message;
pub mod simulation;
pub mod snapshot;
pub mod task;
pub mod task_q;
pub mod tasks_db;
pub mod ticker;
pub mod timeline;

pub use action_gate::{ActionGate, ActionKind};
pub use entropy::{DeterministicRng, EntropyPool, RngError};
pub use operation::{Direction, Operation, OperationRegistry, OperationTag};
pub use snapshot::{SchedulerSnapshot, SnapshotError};
pub use task::TaskError;
pub use tasks_db::{NoopTasksDb, TasksDb, TasksDbError};

/// Opaque handle returned to whoever scheduled a task, usable to cancel it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle(pub TaskId);

impl TaskHandle {
    pub fn task_id(&self) -> TaskId {
        self.0
    }
}

impl Display for TaskHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "task:{}", self.0)
    }
}
