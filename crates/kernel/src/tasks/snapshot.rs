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

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickworld_common::DATA_LAYOUT_VERSION;
use tickworld_common::tasks::{TaskId, Tick};

use crate::tasks::task::DeferredTask;

pub const SNAPSHOT_VERSION: u32 = DATA_LAYOUT_VERSION;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Unsupported snapshot version {found} (this build reads version {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Everything needed to resume the scheduler where it stopped.
///
/// The entropy window, capacity included, is carried along with the seed so that draws after a
/// restore match the draws an uninterrupted run would have made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSnapshot {
    pub version: u32,
    pub current_tick: Tick,
    pub tick_rate: u32,
    pub rng_seed: u64,
    pub entropy_window: usize,
    #[serde(default)]
    pub entropy: Vec<u64>,
    pub next_task_id: TaskId,
    pub pending_tasks: Vec<PendingTaskRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingTaskRecord {
    pub tick: Tick,
    #[serde(flatten)]
    pub task: DeferredTask,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl SchedulerSnapshot {
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a persisted snapshot. The version is checked before anything else is interpreted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let probe: VersionProbe = serde_json::from_slice(bytes)?;
        check_version(probe.version)?;
        Ok(serde_json::from_slice(bytes)?)
    }
}

pub(crate) fn check_version(found: u32) -> Result<(), SnapshotError> {
    if found != SNAPSHOT_VERSION {
        return Err(SnapshotError::UnsupportedVersion {
            found,
            expected: SNAPSHOT_VERSION,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::operation::Operation;
    use crate::tasks::task::Recurrence;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tickworld_common::model::EntityId;

    fn sample() -> SchedulerSnapshot {
        SchedulerSnapshot {
            version: SNAPSHOT_VERSION,
            current_tick: 42,
            tick_rate: 60,
            rng_seed: 123_456,
            entropy_window: 16,
            entropy: vec![1, 42, 99],
            next_task_id: 8,
            pending_tasks: vec![PendingTaskRecord {
                tick: 180,
                task: DeferredTask::new(
                    7,
                    Operation::Think {
                        entity: EntityId(2),
                    },
                    Some(EntityId(2)),
                    Some(Recurrence { delay_seconds: 3.0 }),
                ),
            }],
        }
    }

    #[test]
    fn pending_task_layout_is_flat() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            value["pending_tasks"][0],
            json!({
                "tick": 180,
                "task_id": 7,
                "operation": {"op": "think", "args": {"entity": 2}},
                "owner": 2,
                "cancelled": false,
                "recurrence": {"delay_seconds": 3.0},
            })
        );
    }

    #[test]
    fn bytes_decode_to_the_same_snapshot() {
        let snapshot = sample();
        let decoded = SchedulerSnapshot::from_bytes(&snapshot.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, snapshot);
    }

    #[test]
    fn unknown_version_is_fatal() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["version"] = json!(SNAPSHOT_VERSION + 1);
        let err = SchedulerSnapshot::from_bytes(&serde_json::to_vec(&value).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            SnapshotError::UnsupportedVersion { found, .. } if found == SNAPSHOT_VERSION + 1
        ));
    }

    #[test]
    fn version_is_checked_before_the_body() {
        let err = SchedulerSnapshot::from_bytes(br#"{"version": 99, "pending_tasks": "?"}"#)
            .unwrap_err();
        assert!(matches!(err, SnapshotError::UnsupportedVersion { .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(
            SchedulerSnapshot::from_bytes(b"not json"),
            Err(SnapshotError::Malformed(_))
        ));
    }
}
