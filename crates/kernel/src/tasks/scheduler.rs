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

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use flume::{Receiver, Sender};
use tickworld_common::tasks::SchedulerError;
use tracing::{debug, error, info};

use crate::tasks::scheduler_client::{SchedulerClient, SchedulerClientMsg};
use crate::tasks::scheduler_message::{SchedulerClientSender, SchedulerMessage};
use crate::tasks::simulation::Simulation;
use crate::tasks::tasks_db::TasksDb;
use crate::tasks::ticker::Ticker;
use crate::world::World;

/// Owns the simulation on a dedicated thread. Ticks and client requests arrive on one channel
/// and are handled strictly in order, so no task ever runs concurrently with another task or
/// with a mutation of the queue.
pub struct Scheduler<W: World> {
    simulation: Simulation<W>,
    sender: Sender<SchedulerMessage>,
    receiver: Receiver<SchedulerMessage>,
    tick_pending: Arc<AtomicBool>,
    tasks_db: Box<dyn TasksDb>,
}

impl<W: World> Scheduler<W> {
    pub fn new(simulation: Simulation<W>, tasks_db: Box<dyn TasksDb>) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            simulation,
            sender,
            receiver,
            tick_pending: Arc::new(AtomicBool::new(false)),
            tasks_db,
        }
    }

    pub fn client(&self) -> SchedulerClient {
        SchedulerClient::new(SchedulerClientSender::new(self.sender.clone()))
    }

    pub fn ticker(&self) -> Ticker {
        Ticker::new(self.sender.clone(), self.tick_pending.clone())
    }

    /// Process messages until shutdown. Returns the simulation so callers can inspect it.
    pub fn run(mut self) -> Simulation<W> {
        info!(
            tick = self.simulation.current_tick(),
            pending = self.simulation.timeline().queue().len(),
            "Scheduler started"
        );
        while let Ok(msg) = self.receiver.recv() {
            match msg {
                SchedulerMessage::Tick => {
                    self.simulation.advance();
                    self.tick_pending.store(false, Ordering::Release);
                }
                SchedulerMessage::Client(msg) => {
                    if self.handle_client_msg(msg).is_break() {
                        break;
                    }
                }
            }
        }
        info!(tick = self.simulation.current_tick(), "Scheduler done.");
        self.simulation
    }

    fn handle_client_msg(&mut self, msg: SchedulerClientMsg) -> ControlFlow<()> {
        match msg {
            SchedulerClientMsg::ScheduleTask {
                delay_seconds,
                operation,
                owner,
                recurring,
                reply,
            } => {
                let result = if recurring {
                    self.simulation
                        .schedule_recurring_task(delay_seconds, operation, owner)
                } else {
                    self.simulation
                        .schedule_task(delay_seconds, operation, owner)
                };
                reply.send(result).ok();
            }
            SchedulerClientMsg::CancelTask { handle, reply } => {
                reply.send(Ok(self.simulation.cancel(handle))).ok();
            }
            SchedulerClientMsg::RequestAction {
                entity,
                kind,
                effect,
                reply,
            } => {
                reply
                    .send(self.simulation.request_action(entity, kind, effect))
                    .ok();
            }
            SchedulerClientMsg::RandomInteger { bound, reply } => {
                reply
                    .send(self.simulation.random_integer(bound).map_err(Into::into))
                    .ok();
            }
            SchedulerClientMsg::CurrentTick(reply) => {
                reply.send(Ok(self.simulation.current_tick())).ok();
            }
            SchedulerClientMsg::Snapshot(reply) => {
                reply.send(Ok(self.simulation.snapshot())).ok();
            }
            SchedulerClientMsg::Checkpoint(reply) => {
                reply.send(self.checkpoint()).ok();
            }
            SchedulerClientMsg::CheckStatus(reply) => {
                reply.send(Ok(())).ok();
            }
            SchedulerClientMsg::Shutdown(msg, reply) => {
                info!(reason = %msg, "Shutting down scheduler");
                let result = self.checkpoint();
                reply.send(result).ok();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn checkpoint(&self) -> Result<(), SchedulerError> {
        let snapshot = self.simulation.snapshot();
        if let Err(e) = self.tasks_db.save_snapshot(&snapshot) {
            error!(error = %e, "Checkpoint failed");
            return Err(SchedulerError::CheckpointFailed(e.to_string()));
        }
        self.tasks_db.compact();
        debug!(
            tick = snapshot.current_tick,
            pending = snapshot.pending_tasks.len(),
            "Checkpoint complete"
        );
        Ok(())
    }
}
