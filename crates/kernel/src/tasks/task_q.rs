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

use ahash::AHasher;
use std::{
    collections::{BTreeMap, HashMap},
    hash::BuildHasherDefault,
};
use tickworld_common::tasks::{TaskId, Tick};

use crate::tasks::task::DeferredTask;

/// Pending tasks keyed by the tick they are due on.
#[derive(Debug, Default)]
pub struct TaskQ {
    /// Slots in tick order. A slot's tasks are kept in insertion order, and a key is only present
    /// while its slot is non-empty.
    pending: BTreeMap<Tick, Vec<DeferredTask>>,
    /// Which slot each pending task sits in, for cancellation by id.
    locations: HashMap<TaskId, Tick, BuildHasherDefault<AHasher>>,
}

impl TaskQ {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tick: Tick, task: DeferredTask) {
        self.locations.insert(task.task_id(), tick);
        self.pending.entry(tick).or_default().push(task);
    }

    /// Remove and return the whole slot for `tick`, leaving no key behind.
    pub fn pop_batch(&mut self, tick: Tick) -> Vec<DeferredTask> {
        let batch = self.pending.remove(&tick).unwrap_or_default();
        for task in &batch {
            self.locations.remove(&task.task_id());
        }
        batch
    }

    /// Flag a pending task as cancelled. Returns false if no such task is waiting.
    pub fn cancel(&mut self, task_id: TaskId) -> bool {
        let Some(tick) = self.locations.get(&task_id) else {
            return false;
        };
        let Some(task) = self
            .pending
            .get_mut(tick)
            .and_then(|slot| slot.iter_mut().find(|t| t.task_id() == task_id))
        else {
            return false;
        };
        task.cancel();
        true
    }

    pub fn get(&self, task_id: TaskId) -> Option<(Tick, &DeferredTask)> {
        let tick = *self.locations.get(&task_id)?;
        let task = self
            .pending
            .get(&tick)?
            .iter()
            .find(|t| t.task_id() == task_id)?;
        Some((tick, task))
    }

    /// Every pending `(tick, task)` pair, in execution order.
    pub fn iter(&self) -> impl Iterator<Item = (Tick, &DeferredTask)> {
        self.pending
            .iter()
            .flat_map(|(tick, slot)| slot.iter().map(move |task| (*tick, task)))
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_tick(&self) -> Option<Tick> {
        self.pending.keys().next().copied()
    }
}
