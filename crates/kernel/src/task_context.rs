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

//! What a running operation handler can see and do.

use tickworld_common::model::EntityId;
use tickworld_common::tasks::{SchedulerError, TaskId, Tick};

use crate::tasks::action_gate::{self, ActionKind};
use crate::tasks::entropy::RngError;
use crate::tasks::operation::Operation;
use crate::tasks::timeline::Timeline;
use crate::tasks::TaskHandle;
use crate::world::World;

/// Handed to an operation handler for the duration of one task execution. All scheduling done
/// through it lands on a later tick than the one being executed.
pub struct TaskContext<'a, W: World> {
    pub(crate) timeline: &'a mut Timeline,
    pub(crate) world: &'a mut W,
    pub(crate) task_id: TaskId,
    pub(crate) owner: Option<EntityId>,
    pub(crate) tick: Tick,
}

impl<W: World> TaskContext<'_, W> {
    pub fn world(&self) -> &W {
        &*self.world
    }

    pub fn world_mut(&mut self) -> &mut W {
        &mut *self.world
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    /// The tick whose batch is running.
    pub fn executing_tick(&self) -> Tick {
        self.tick
    }

    /// The tick a zero-delay task scheduled now would run on.
    pub fn current_tick(&self) -> Tick {
        self.timeline.current_tick()
    }

    /// Schedule follow-up work, owned by the operation's subject.
    pub fn schedule(
        &mut self,
        delay_seconds: f64,
        operation: Operation,
    ) -> Result<TaskHandle, SchedulerError> {
        let owner = Some(operation.subject());
        self.timeline.schedule(delay_seconds, operation, owner)
    }

    pub fn schedule_recurring(
        &mut self,
        delay_seconds: f64,
        operation: Operation,
    ) -> Result<TaskHandle, SchedulerError> {
        let owner = Some(operation.subject());
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
        action_gate::request(&mut *self.timeline, &mut *self.world, entity, kind, effect)
    }

    pub fn random_integer(&mut self, bound: i32) -> Result<i32, RngError> {
        self.timeline.random_integer(bound)
    }
}
