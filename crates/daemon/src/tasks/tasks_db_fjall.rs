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

use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use tickworld_kernel::tasks::{SchedulerSnapshot, TasksDb, TasksDbError};
use tracing::error;

/// The scheduler keeps exactly one live snapshot, always under this key.
const SNAPSHOT_KEY: &[u8] = b"scheduler";

pub struct FjallTasksDB {
    keyspace: Keyspace,
    snapshots_partition: PartitionHandle,
}

impl FjallTasksDB {
    /// Open (or create) the store at `path`. The flag is true when the keyspace was empty.
    pub fn open(path: &Path) -> Result<(Self, bool), fjall::Error> {
        let keyspace = Config::new(path).open()?;
        let fresh = keyspace.partition_count() == 0;
        let snapshots_partition =
            keyspace.open_partition("snapshots", PartitionCreateOptions::default())?;
        Ok((
            Self {
                keyspace,
                snapshots_partition,
            },
            fresh,
        ))
    }
}

impl TasksDb for FjallTasksDB {
    fn load_snapshot(&self) -> Result<Option<SchedulerSnapshot>, TasksDbError> {
        let Some(bytes) = self.snapshots_partition.get(SNAPSHOT_KEY).map_err(|e| {
            error!("Failed to read snapshot record: {:?}", e);
            TasksDbError::CouldNotLoadSnapshot
        })?
        else {
            return Ok(None);
        };
        let snapshot = SchedulerSnapshot::from_bytes(bytes.as_ref()).inspect_err(|e| {
            error!("Failed to decode snapshot record: {}", e);
        })?;
        Ok(Some(snapshot))
    }

    fn save_snapshot(&self, snapshot: &SchedulerSnapshot) -> Result<(), TasksDbError> {
        let bytes = snapshot.to_bytes().map_err(|e| {
            error!("Failed to serialize snapshot: {}", e);
            TasksDbError::CouldNotSaveSnapshot
        })?;
        self.snapshots_partition
            .insert(SNAPSHOT_KEY, bytes)
            .map_err(|e| {
                error!("Failed to insert snapshot record: {:?}", e);
                TasksDbError::CouldNotSaveSnapshot
            })
    }

    fn delete_snapshot(&self) -> Result<(), TasksDbError> {
        self.snapshots_partition.remove(SNAPSHOT_KEY).map_err(|e| {
            error!("Failed to delete snapshot record: {:?}", e);
            TasksDbError::CouldNotDeleteSnapshot
        })
    }

    fn compact(&self) {
        if let Err(e) = self.keyspace.persist(fjall::PersistMode::SyncAll) {
            error!("Failed to compact tasks database: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tickworld_common::model::EntityId;
    use tickworld_kernel::tasks::{Operation, SnapshotError};
    use tickworld_kernel::testing::mock_simulation;

    const HERO: EntityId = EntityId(1);

    fn snapshot_with_pending(n: usize) -> SchedulerSnapshot {
        let mut simulation = mock_simulation([HERO]);
        for i in 0..n {
            simulation
                .schedule_task(i as f64, Operation::Action { entity: HERO }, Some(HERO))
                .unwrap();
        }
        simulation.advance();
        simulation.snapshot()
    }

    // Verify creation of an empty DB, including creation of the partition.
    #[test]
    fn open_reopen() {
        let tmpdir = tempfile::tempdir().expect("Unable to create temporary directory");
        let path = tmpdir.path();
        {
            let (db, is_fresh) = FjallTasksDB::open(path).unwrap();
            assert!(is_fresh);
            assert!(db.load_snapshot().unwrap().is_none());
        }
        {
            let (db, is_fresh) = FjallTasksDB::open(path).unwrap();
            assert!(!is_fresh);
            assert!(db.load_snapshot().unwrap().is_none());
        }
    }

    // Save a snapshot, close the store, reopen it and get the same snapshot back.
    #[test]
    fn save_load() {
        let snapshot = snapshot_with_pending(3);
        let tmpdir = tempfile::tempdir().expect("Unable to create temporary directory");
        let path = tmpdir.path();
        {
            let (db, _) = FjallTasksDB::open(path).unwrap();
            db.save_snapshot(&snapshot).unwrap();
            db.compact();
        }
        let (db, is_fresh) = FjallTasksDB::open(path).unwrap();
        assert!(!is_fresh);
        assert_eq!(db.load_snapshot().unwrap(), Some(snapshot));
    }

    #[test]
    fn later_checkpoint_replaces_earlier() {
        let tmpdir = tempfile::tempdir().expect("Unable to create temporary directory");
        let (db, _) = FjallTasksDB::open(tmpdir.path()).unwrap();
        db.save_snapshot(&snapshot_with_pending(5)).unwrap();
        let latest = snapshot_with_pending(2);
        db.save_snapshot(&latest).unwrap();
        let loaded = db.load_snapshot().unwrap().unwrap();
        assert_eq!(loaded.pending_tasks.len(), 1);
        assert_eq!(loaded, latest);
    }

    #[test]
    fn delete_leaves_store_empty() {
        let tmpdir = tempfile::tempdir().expect("Unable to create temporary directory");
        let (db, _) = FjallTasksDB::open(tmpdir.path()).unwrap();
        db.save_snapshot(&snapshot_with_pending(1)).unwrap();
        db.delete_snapshot().unwrap();
        assert!(db.load_snapshot().unwrap().is_none());
    }

    #[test]
    fn unknown_version_aborts_load() {
        let tmpdir = tempfile::tempdir().expect("Unable to create temporary directory");
        let (db, _) = FjallTasksDB::open(tmpdir.path()).unwrap();
        db.snapshots_partition
            .insert(
                SNAPSHOT_KEY,
                br#"{"version": 99, "current_tick": 0, "rng_seed": 0}"#.as_slice(),
            )
            .unwrap();
        let err = db.load_snapshot().unwrap_err();
        assert!(matches!(
            err,
            TasksDbError::Snapshot(SnapshotError::UnsupportedVersion { found: 99, .. })
        ));
    }
}
