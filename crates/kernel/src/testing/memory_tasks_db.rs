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

use std::sync::{Arc, Mutex};

use crate::tasks::snapshot::SchedulerSnapshot;
use crate::tasks::tasks_db::{TasksDb, TasksDbError};

/// Keeps the encoded snapshot in memory. Clones share the same storage, so a test can hand one
/// to a scheduler and inspect the other.
#[derive(Clone, Default)]
pub struct InMemoryTasksDb {
    stored: Arc<Mutex<Option<Vec<u8>>>>,
}

impl InMemoryTasksDb {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TasksDb for InMemoryTasksDb {
    fn load_snapshot(&self) -> Result<Option<SchedulerSnapshot>, TasksDbError> {
        let stored = self
            .stored
            .lock()
            .map_err(|_| TasksDbError::CouldNotLoadSnapshot)?;
        stored
            .as_deref()
            .map(SchedulerSnapshot::from_bytes)
            .transpose()
            .map_err(TasksDbError::from)
    }

    fn save_snapshot(&self, snapshot: &SchedulerSnapshot) -> Result<(), TasksDbError> {
        let bytes = snapshot.to_bytes()?;
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| TasksDbError::CouldNotSaveSnapshot)?;
        *stored = Some(bytes);
        Ok(())
    }

    fn delete_snapshot(&self) -> Result<(), TasksDbError> {
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| TasksDbError::CouldNotDeleteSnapshot)?;
        *stored = None;
        Ok(())
    }

    fn compact(&self) {}
}
