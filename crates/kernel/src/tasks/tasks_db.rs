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

use crate::tasks::snapshot::{SchedulerSnapshot, SnapshotError};

#[derive(Debug, thiserror::Error)]
pub enum TasksDbError {
    #[error("Could not load snapshot")]
    CouldNotLoadSnapshot,
    #[error("Could not save snapshot")]
    CouldNotSaveSnapshot,
    #[error("Could not delete snapshot")]
    CouldNotDeleteSnapshot,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Durable home for the scheduler's state between runs.
pub trait TasksDb: Send {
    /// `None` on a fresh store.
    fn load_snapshot(&self) -> Result<Option<SchedulerSnapshot>, TasksDbError>;
    fn save_snapshot(&self, snapshot: &SchedulerSnapshot) -> Result<(), TasksDbError>;
    fn delete_snapshot(&self) -> Result<(), TasksDbError>;

    /// Flush and compact the underlying storage. Called after every checkpoint.
    fn compact(&self);
}

pub struct NoopTasksDb {}

impl TasksDb for NoopTasksDb {
    fn load_snapshot(&self) -> Result<Option<SchedulerSnapshot>, TasksDbError> {
        Ok(None)
    }

    fn save_snapshot(&self, _snapshot: &SchedulerSnapshot) -> Result<(), TasksDbError> {
        Ok(())
    }

    fn delete_snapshot(&self) -> Result<(), TasksDbError> {
        Ok(())
    }

    fn compact(&self) {
        // Nothing to compact when nothing is stored
    }
}
