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

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use flume::Sender;
use minstant::Instant;
use tracing::{info, warn};

use crate::tasks::scheduler_message::SchedulerMessage;

/// The fixed-interval signal that drives the scheduler. It never runs tasks itself; it only asks
/// the scheduler loop to advance by one tick.
///
/// At most one tick is ever outstanding. If the scheduler has not consumed the previous tick yet,
/// the new one is not sent, so a stalled loop is never hit with a burst of catch-up ticks.
#[derive(Clone)]
pub struct Ticker {
    sender: Sender<SchedulerMessage>,
    tick_pending: Arc<AtomicBool>,
}

impl Ticker {
    pub(crate) fn new(sender: Sender<SchedulerMessage>, tick_pending: Arc<AtomicBool>) -> Self {
        Self {
            sender,
            tick_pending,
        }
    }

    /// Signal one tick. Returns false if a tick is already pending or the scheduler is gone.
    pub fn tick(&self) -> bool {
        if self.tick_pending.swap(true, Ordering::AcqRel) {
            return false;
        }
        if self.sender.send(SchedulerMessage::Tick).is_err() {
            self.tick_pending.store(false, Ordering::Release);
            return false;
        }
        true
    }

    /// Start a thread that ticks every `interval` until `kill_switch` is set or the scheduler
    /// goes away.
    pub fn spawn(
        self,
        interval: Duration,
        kill_switch: Arc<AtomicBool>,
    ) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("tickworld-ticker".to_string())
            .spawn(move || {
                info!(?interval, "Ticker started");
                let mut deadline = Instant::now() + interval;
                let mut dropped: u64 = 0;
                while !kill_switch.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    if now < deadline {
                        std::thread::sleep(deadline.duration_since(now));
                    }
                    if !self.tick() {
                        if self.sender.is_disconnected() {
                            break;
                        }
                        dropped += 1;
                        if dropped.is_power_of_two() {
                            warn!(dropped, "Scheduler is falling behind; tick not delivered");
                        }
                    }
                    deadline = deadline + interval;
                    let now = Instant::now();
                    if deadline < now {
                        // Stalled past a whole interval: restart the cadence rather than catch up.
                        deadline = now + interval;
                    }
                }
                info!("Ticker stopped");
            })
    }
}
