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

use crate::tasks::entropy::RngError;
use crate::tasks::operation::{Operation, OperationTag};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickworld_common::model::EntityId;
use tickworld_common::tasks::{SchedulerError, TaskId};

/// Present on tasks that put themselves back on the queue after each successful run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    pub delay_seconds: f64,
}

/// One unit of deferred work. Lives in exactly one queue slot until its tick is drained, and is
/// executed at most once per slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredTask {
    pub(crate) task_id: TaskId,
    pub(crate) operation: Operation,
    #[serde(default)]
    pub(crate) owner: Option<EntityId>,
    #[serde(default)]
    pub(crate) cancelled: bool,
    #[serde(default)]
    pub(crate) recurrence: Option<Recurrence>,
}

impl DeferredTask {
    pub fn new(
        task_id: TaskId,
        operation: Operation,
        owner: Option<EntityId>,
        recurrence: Option<Recurrence>,
    ) -> Self {
        Self {
            task_id,
            operation,
            owner,
            cancelled: false,
            recurrence,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub fn recurrence(&self) -> Option<Recurrence> {
        self.recurrence
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Idempotent. A cancelled task is still drained from its slot, it just doesn't run.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Every entity this task needs resolved before it can run.
    pub fn entity_refs(&self) -> impl Iterator<Item = EntityId> + '_ {
        std::iter::once(self.operation.subject()).chain(self.owner)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    #[error("No handler registered for {0:?}")]
    NoHandler(OperationTag),
    #[error("Entity {0} no longer exists")]
    UnresolvedEntity(EntityId),
    #[error("Handler for {0:?} was given a different operation")]
    MismatchedOperation(OperationTag),
    #[error("Task panicked: {0}")]
    Panicked(String),
    #[error("Task failed: {0}")]
    Failed(String),
    #[error(transparent)]
    Scheduling(#[from] SchedulerError),
    #[error(transparent)]
    Rng(#[from] RngError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_idempotent() {
        let mut task = DeferredTask::new(
            1,
            Operation::Spawn {
                entity: EntityId(1),
            },
            None,
            None,
        );
        task.cancel();
        task.cancel();
        assert!(task.is_cancelled());
    }

    #[test]
    fn entity_refs_include_owner() {
        let task = DeferredTask::new(
            1,
            Operation::Think {
                entity: EntityId(4),
            },
            Some(EntityId(2)),
            Some(Recurrence { delay_seconds: 3.0 }),
        );
        assert!(task.is_recurring());
        assert_eq!(
            task.entity_refs().collect::<Vec<_>>(),
            vec![EntityId(4), EntityId(2)]
        );
    }

    #[test]
    fn missing_optional_fields_default() {
        let task: DeferredTask = serde_json::from_str(
            r#"{"task_id": 5, "operation": {"op": "despawn", "args": {"entity": 8}}}"#,
        )
        .unwrap();
        assert_eq!(task.owner(), None);
        assert!(!task.is_cancelled());
        assert!(!task.is_recurring());
    }
}
