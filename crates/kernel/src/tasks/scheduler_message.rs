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

//! Unified message type for the scheduler's main loop.
//! Ticks and client requests share one channel so they are handled in arrival order.

use flume::Sender;

use crate::tasks::scheduler_client::SchedulerClientMsg;

pub enum SchedulerMessage {
    /// One tick has elapsed - sent by the ticker thread
    Tick,
    /// Client message (scheduling, cancellation, checkpoint, shutdown, etc.)
    Client(SchedulerClientMsg),
}

/// Wrapper sender for scheduler client messages that converts to SchedulerMessage
#[derive(Clone)]
pub struct SchedulerClientSender {
    inner: Sender<SchedulerMessage>,
}

impl SchedulerClientSender {
    pub fn new(inner: Sender<SchedulerMessage>) -> Self {
        Self { inner }
    }

    pub fn send(
        &self,
        msg: SchedulerClientMsg,
    ) -> Result<(), flume::SendError<SchedulerClientMsg>> {
        self.inner
            .send(SchedulerMessage::Client(msg))
            .map_err(|e| match e.into_inner() {
                SchedulerMessage::Client(m) => flume::SendError(m),
                SchedulerMessage::Tick => unreachable!(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn test_scheduler_message_size() {
        // Should be reasonably sized - dominated by the largest variant
        let size = size_of::<SchedulerMessage>();
        assert!(
            size <= 160,
            "SchedulerMessage is unexpectedly large: {} bytes",
            size
        );
    }
}
