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

use tickworld_common::model::EntityId;
use tickworld_common::tasks::{SchedulerError, Tick};

use crate::tasks::TaskHandle;
use crate::tasks::action_gate::ActionKind;
use crate::tasks::operation::Operation;
use crate::tasks::scheduler_message::SchedulerClientSender;
use crate::tasks::snapshot::SchedulerSnapshot;

const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// A handle for talking to the scheduler from other threads: network handlers, AI drivers, the
/// checkpoint thread, tests. Every request is marshalled onto the scheduler thread and answered
/// over a oneshot channel.
#[derive(Clone)]
pub struct SchedulerClient {
    scheduler_sender: SchedulerClientSender,
}

impl SchedulerClient {
    pub fn new(scheduler_sender: SchedulerClientSender) -> Self {
        Self { scheduler_sender }
    }

    fn request<T>(
        &self,
        msg: impl FnOnce(oneshot::Sender<Result<T, SchedulerError>>) -> SchedulerClientMsg,
    ) -> Result<T, SchedulerError> {
        let (reply, receive) = oneshot::channel();
        self.scheduler_sender
            .send(msg(reply))
            .map_err(|_| SchedulerError::SchedulerNotResponding)?;

        receive
            .recv_timeout(REPLY_TIMEOUT)
            .map_err(|_| SchedulerError::SchedulerNotResponding)?
    }

    /// Schedule `operation` to run `delay_seconds` from now.
    pub fn schedule_task(
        &self,
        delay_seconds: f64,
        operation: Operation,
        owner: Option<EntityId>,
    ) -> Result<TaskHandle, SchedulerError> {
        self.request(|reply| SchedulerClientMsg::ScheduleTask {
            delay_seconds,
            operation,
            owner,
            recurring: false,
            reply,
        })
    }

    /// Like `schedule_task`, but the task puts itself back on the queue after every successful
    /// run until cancelled.
    pub fn schedule_recurring_task(
        &self,
        delay_seconds: f64,
        operation: Operation,
        owner: Option<EntityId>,
    ) -> Result<TaskHandle, SchedulerError> {
        self.request(|reply| SchedulerClientMsg::ScheduleTask {
            delay_seconds,
            operation,
            owner,
            recurring: true,
            reply,
        })
    }

    pub fn cancel(&self, handle: TaskHandle) -> Result<bool, SchedulerError> {
        self.request(|reply| SchedulerClientMsg::CancelTask { handle, reply })
    }

    pub fn request_action(
        &self,
        entity: EntityId,
        kind: ActionKind,
        effect: Operation,
    ) -> Result<bool, SchedulerError> {
        self.request(|reply| SchedulerClientMsg::RequestAction {
            entity,
            kind,
            effect,
            reply,
        })
    }

    pub fn random_integer(&self, bound: i32) -> Result<i32, SchedulerError> {
        self.request(|reply| SchedulerClientMsg::RandomInteger { bound, reply })
    }

    pub fn current_tick(&self) -> Result<Tick, SchedulerError> {
        self.request(SchedulerClientMsg::CurrentTick)
    }

    pub fn snapshot(&self) -> Result<SchedulerSnapshot, SchedulerError> {
        self.request(SchedulerClientMsg::Snapshot)
    }

    /// Persist the scheduler state to its tasks database.
    pub fn request_checkpoint(&self) -> Result<(), SchedulerError> {
        self.request(SchedulerClientMsg::Checkpoint)
    }

    /// Checkpoint one last time and stop the scheduler loop.
    pub fn submit_shutdown(&self, msg: &str) -> Result<(), SchedulerError> {
        self.request(|reply| SchedulerClientMsg::Shutdown(msg.to_string(), reply))
    }

    /// Check if the scheduler is alive and responding. Since requests are handled in order, a
    /// reply also means every earlier request has been handled.
    pub fn check_status(&self) -> Result<(), SchedulerError> {
        self.request(SchedulerClientMsg::CheckStatus)
    }
}

pub enum SchedulerClientMsg {
    /// Schedule a new task, optionally recurring.
    ScheduleTask {
        delay_seconds: f64,
        operation: Operation,
        owner: Option<EntityId>,
        recurring: bool,
        reply: oneshot::Sender<Result<TaskHandle, SchedulerError>>,
    },
    /// Cancel a pending task.
    CancelTask {
        handle: TaskHandle,
        reply: oneshot::Sender<Result<bool, SchedulerError>>,
    },
    /// Ask an entity's action gate to start an effect.
    RequestAction {
        entity: EntityId,
        kind: ActionKind,
        effect: Operation,
        reply: oneshot::Sender<Result<bool, SchedulerError>>,
    },
    /// Draw from the scheduler's RNG.
    RandomInteger {
        bound: i32,
        reply: oneshot::Sender<Result<i32, SchedulerError>>,
    },
    CurrentTick(oneshot::Sender<Result<Tick, SchedulerError>>),
    Snapshot(oneshot::Sender<Result<SchedulerSnapshot, SchedulerError>>),
    /// Submit a request to checkpoint the scheduler state.
    Checkpoint(oneshot::Sender<Result<(), SchedulerError>>),
    /// Submit a request to shutdown the scheduler
    Shutdown(String, oneshot::Sender<Result<(), SchedulerError>>),
    /// Check if the scheduler is alive and responding (lightweight operation)
    CheckStatus(oneshot::Sender<Result<(), SchedulerError>>),
}
