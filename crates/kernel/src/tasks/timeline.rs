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

use tickworld_common::model::EntityId;
use tickworld_common::tasks::{SchedulerError, TaskId, Tick};
use tracing::trace;

use crate::tasks::TaskHandle;
use crate::tasks::clock::TickClock;
use crate::tasks::entropy::{DeterministicRng, EntropyPool, RngError};
use crate::tasks::operation::Operation;
use crate::tasks::task::{DeferredTask, Recurrence};
use crate::tasks::task_q::TaskQ;

/// The task currently being executed, if any. Cancelling it cannot stop the current run, but
/// does stop a recurring task from being put back on the queue.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    task_id: TaskId,
    cancelled: bool,
}

/// Scheduling state shared by the simulation and the tasks it runs: the clock, the queue, and
/// the entropy-fed RNG.
#[derive(Debug)]
pub struct Timeline {
    clock: TickClock,
    queue: TaskQ,
    rng: DeterministicRng,
    entropy: EntropyPool,
    next_task_id: TaskId,
    in_flight: Option<InFlight>,
}

impl Timeline {
    pub fn new(clock: TickClock, rng: DeterministicRng, entropy: EntropyPool) -> Self {
        Self::resume(clock, rng, entropy, 0)
    }

    pub(crate) fn resume(
        clock: TickClock,
        rng: DeterministicRng,
        entropy: EntropyPool,
        next_task_id: TaskId,
    ) -> Self {
        Self {
            clock,
            queue: TaskQ::new(),
            rng,
            entropy,
            next_task_id,
            in_flight: None,
        }
    }

    pub fn clock(&self) -> &TickClock {
        &self.clock
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick()
    }

    pub fn queue(&self) -> &TaskQ {
        &self.queue
    }

    pub fn rng(&self) -> &DeterministicRng {
        &self.rng
    }

    pub fn entropy(&self) -> &EntropyPool {
        &self.entropy
    }

    pub fn next_task_id(&self) -> TaskId {
        self.next_task_id
    }

    pub fn schedule(
        &mut self,
        delay_seconds: f64,
        operation: Operation,
        owner: Option<EntityId>,
    ) -> Result<TaskHandle, SchedulerError> {
        let tick = self.clock.target_tick(delay_seconds)?;
        Ok(self.schedule_at(tick, operation, owner, None))
    }

    pub fn schedule_recurring(
        &mut self,
        delay_seconds: f64,
        operation: Operation,
        owner: Option<EntityId>,
    ) -> Result<TaskHandle, SchedulerError> {
        let tick = self.clock.target_tick(delay_seconds)?;
        Ok(self.schedule_at(tick, operation, owner, Some(Recurrence { delay_seconds })))
    }

    /// Queue work on an absolute tick. Ticks already drained are moved up to the current one.
    pub(crate) fn schedule_at(
        &mut self,
        tick: Tick,
        operation: Operation,
        owner: Option<EntityId>,
        recurrence: Option<Recurrence>,
    ) -> TaskHandle {
        let task_id = self.next_task_id;
        self.next_task_id += 1;
        self.enqueue(tick, DeferredTask::new(task_id, operation, owner, recurrence));
        TaskHandle(task_id)
    }

    /// Put a recurring task back on the queue under its original id, `delay_seconds` after the
    /// tick it just fired on.
    pub(crate) fn reschedule(
        &mut self,
        fired_tick: Tick,
        task: DeferredTask,
    ) -> Result<Tick, SchedulerError> {
        let delay_seconds = task.recurrence().map_or(0.0, |r| r.delay_seconds);
        let tick = fired_tick.saturating_add(self.clock.ticks_for(delay_seconds)?);
        Ok(self.enqueue(tick, task))
    }

    fn enqueue(&mut self, tick: Tick, task: DeferredTask) -> Tick {
        let tick = tick.max(self.clock.current_tick());
        self.entropy.observe_bool(task.is_recurring());
        self.entropy.observe_tick(tick);
        self.entropy.observe_str(task.operation().name());
        trace!(
            task_id = task.task_id(),
            tick,
            operation = task.operation().name(),
            "Scheduled task"
        );
        self.queue.insert(tick, task);
        tick
    }

    /// Restore a persisted task exactly where it was, without feeding the entropy window.
    pub(crate) fn restore_task(&mut self, tick: Tick, task: DeferredTask) {
        self.queue.insert(tick.max(self.clock.current_tick()), task);
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        if self.queue.cancel(handle.task_id()) {
            return true;
        }
        match self.in_flight.as_mut() {
            Some(in_flight) if in_flight.task_id == handle.task_id() => {
                in_flight.cancelled = true;
                true
            }
            _ => false,
        }
    }

    pub fn random_integer(&mut self, bound: i32) -> Result<i32, RngError> {
        self.rng.draw(&self.entropy, bound)
    }

    /// Advance the clock and take everything due on the tick just left behind.
    pub(crate) fn take_due_batch(&mut self) -> (Tick, Vec<DeferredTask>) {
        let due = self.clock.advance();
        (due, self.queue.pop_batch(due))
    }

    pub(crate) fn begin_task(&mut self, task_id: TaskId) {
        self.in_flight = Some(InFlight {
            task_id,
            cancelled: false,
        });
    }

    /// Returns whether the task was cancelled while it ran.
    pub(crate) fn finish_task(&mut self) -> bool {
        self.in_flight.take().is_some_and(|f| f.cancelled)
    }
}
