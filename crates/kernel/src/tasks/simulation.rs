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

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tickworld_common::model::EntityId;
use tickworld_common::tasks::{SchedulerError, Tick};
use tracing::{debug, error, trace, warn};

use crate::config::SchedulerConfig;
use crate::task_context::TaskContext;
use crate::tasks::TaskHandle;
use crate::tasks::action_gate::{self, ActionKind};
use crate::tasks::clock::TickClock;
use crate::tasks::entropy::{DeterministicRng, EntropyPool, RngError};
use crate::tasks::operation::{Operation, OperationRegistry};
use crate::tasks::snapshot::{
    PendingTaskRecord, SNAPSHOT_VERSION, SchedulerSnapshot, SnapshotError, check_version,
};
use crate::tasks::task::{DeferredTask, TaskError};
use crate::tasks::timeline::Timeline;
use crate::world::World;

/// What happened during one call to [`Simulation::advance`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub tick: Tick,
    pub executed: usize,
    /// Cancelled tasks, and tasks whose entities no longer exist.
    pub skipped: usize,
    pub failed: usize,
}

/// The single-writer simulation core: owns the timeline, the world, and the operation registry.
/// Everything here runs on one thread; see `Scheduler` for the threaded front end.
pub struct Simulation<W: World> {
    timeline: Timeline,
    world: W,
    registry: OperationRegistry<W>,
}

impl<W: World> Simulation<W> {
    pub fn new(config: &SchedulerConfig, world: W, registry: OperationRegistry<W>) -> Self {
        let timeline = Timeline::new(
            TickClock::new(config.tick_rate),
            DeterministicRng::from_seed_string(config.seed()),
            EntropyPool::new(config.entropy_window),
        );
        Self {
            timeline,
            world,
            registry,
        }
    }

    /// Rebuild a simulation from a snapshot. Tasks naming entities the world no longer has are
    /// dropped with a warning; the rest go back on their original ticks in their original order.
    /// Permits with a pending `ReopenGate` are closed again until the tick they were due to reopen.
    pub fn restore(
        snapshot: SchedulerSnapshot,
        mut world: W,
        registry: OperationRegistry<W>,
    ) -> Result<Self, SnapshotError> {
        check_version(snapshot.version)?;
        let mut timeline = Timeline::resume(
            TickClock::starting_at(snapshot.current_tick, snapshot.tick_rate),
            DeterministicRng::from_seed(snapshot.rng_seed),
            EntropyPool::from_samples(snapshot.entropy_window, snapshot.entropy),
            snapshot.next_task_id,
        );
        let mut dropped = 0;
        let mut closed_gates = 0;
        for PendingTaskRecord { tick, task } in snapshot.pending_tasks {
            if let Some(missing) = task.entity_refs().find(|e| !world.contains(*e)) {
                warn!(
                    task_id = task.task_id(),
                    tick,
                    entity = %missing,
                    operation = task.operation().name(),
                    "Dropping persisted task for missing entity"
                );
                dropped += 1;
                continue;
            }
            if let Operation::ReopenGate { entity, kind } = task.operation() {
                let gate = world
                    .action_gate_mut(*entity)
                    .filter(|_| !task.is_cancelled());
                if let Some(gate) = gate {
                    gate.close_until(*kind, action_gate::reopen_tick(tick));
                    closed_gates += 1;
                }
            }
            timeline.restore_task(tick, task);
        }
        debug!(
            current_tick = snapshot.current_tick,
            restored = timeline.queue().len(),
            dropped,
            closed_gates,
            "Restored scheduler snapshot"
        );
        Ok(Self {
            timeline,
            world,
            registry,
        })
    }

    pub fn snapshot(&self) -> SchedulerSnapshot {
        SchedulerSnapshot {
            version: SNAPSHOT_VERSION,
            current_tick: self.timeline.current_tick(),
            tick_rate: self.timeline.clock().tick_rate(),
            rng_seed: self.timeline.rng().seed(),
            entropy_window: self.timeline.entropy().capacity(),
            entropy: self.timeline.entropy().samples().collect(),
            next_task_id: self.timeline.next_task_id(),
            pending_tasks: self
                .timeline
                .queue()
                .iter()
                .map(|(tick, task)| PendingTaskRecord {
                    tick,
                    task: task.clone(),
                })
                .collect(),
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn current_tick(&self) -> Tick {
        self.timeline.current_tick()
    }

    pub fn schedule_task(
        &mut self,
        delay_seconds: f64,
        operation: Operation,
        owner: Option<EntityId>,
    ) -> Result<TaskHandle, SchedulerError> {
        self.timeline.schedule(delay_seconds, operation, owner)
    }

    pub fn schedule_recurring_task(
        &mut self,
        delay_seconds: f64,
        operation: Operation,
        owner: Option<EntityId>,
    ) -> Result<TaskHandle, SchedulerError> {
        self.timeline
            .schedule_recurring(delay_seconds, operation, owner)
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.timeline.cancel(handle)
    }

    pub fn request_action(
        &mut self,
        entity: EntityId,
        kind: ActionKind,
        effect: Operation,
    ) -> Result<bool, SchedulerError> {
        action_gate::request(&mut self.timeline, &mut self.world, entity, kind, effect)
    }

    pub fn random_integer(&mut self, bound: i32) -> Result<i32, RngError> {
        self.timeline.random_integer(bound)
    }

    /// Run one tick: bump the clock, then execute everything that was due on the previous value
    /// in insertion order. A failing or panicking task is logged and the batch carries on.
    pub fn advance(&mut self) -> TickSummary {
        let (tick, batch) = self.timeline.take_due_batch();
        let mut summary = TickSummary {
            tick,
            ..TickSummary::default()
        };

        for task in batch {
            if task.is_cancelled() {
                trace!(task_id = task.task_id(), tick, "Skipping cancelled task");
                summary.skipped += 1;
                continue;
            }

            self.timeline.begin_task(task.task_id());
            let result = self.execute(tick, &task);
            let cancelled_while_running = self.timeline.finish_task();

            match result {
                Ok(()) => {
                    summary.executed += 1;
                    if task.is_recurring() && !cancelled_while_running {
                        let task_id = task.task_id();
                        if let Err(e) = self.timeline.reschedule(tick, task) {
                            error!(task_id, error = %e, "Could not reschedule recurring task");
                        }
                    }
                }
                Err(TaskError::UnresolvedEntity(entity)) => {
                    debug!(
                        task_id = task.task_id(),
                        tick,
                        %entity,
                        operation = task.operation().name(),
                        "Skipping task for missing entity"
                    );
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!(
                        task_id = task.task_id(),
                        tick,
                        operation = task.operation().name(),
                        recurring = task.is_recurring(),
                        error = %e,
                        "Task failed"
                    );
                    summary.failed += 1;
                }
            }
        }

        if summary.executed + summary.skipped + summary.failed > 0 {
            trace!(
                tick,
                executed = summary.executed,
                skipped = summary.skipped,
                failed = summary.failed,
                "Tick complete"
            );
        }
        summary
    }

    fn execute(&mut self, tick: Tick, task: &DeferredTask) -> Result<(), TaskError> {
        if let Some(missing) = task.entity_refs().find(|e| !self.world.contains(*e)) {
            return Err(TaskError::UnresolvedEntity(missing));
        }

        if let Operation::ReopenGate { entity, kind } = task.operation() {
            let gate = self
                .world
                .action_gate_mut(*entity)
                .ok_or(TaskError::UnresolvedEntity(*entity))?;
            let now = self.timeline.current_tick();
            if gate.is_open(*kind, now) {
                trace!(%entity, %kind, now, "Gate reopened");
            } else {
                trace!(
                    %entity,
                    %kind,
                    reopens_at = gate.reopens_at(*kind),
                    "Gate already closed again by a later request"
                );
            }
            return Ok(());
        }

        let Self {
            timeline,
            world,
            registry,
        } = self;
        let mut ctx = TaskContext {
            timeline,
            world,
            task_id: task.task_id(),
            owner: task.owner(),
            tick,
        };
        catch_unwind(AssertUnwindSafe(|| {
            registry.dispatch(&mut ctx, task.operation())
        }))
        .unwrap_or_else(|panic| Err(TaskError::Panicked(panic_message(panic.as_ref()))))
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
