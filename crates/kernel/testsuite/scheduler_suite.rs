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

//! Drives the scheduler through its client and ticker from other threads, the way a host
//! process does.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use tickworld_common::model::EntityId;
use tickworld_common::tasks::SchedulerError;
use tickworld_kernel::tasks::scheduler::Scheduler;
use tickworld_kernel::tasks::ticker::Ticker;
use tickworld_kernel::tasks::{ActionKind, Direction, Operation, TasksDb};
use tickworld_kernel::testing::{InMemoryTasksDb, MockWorld, recording_registry};
use tickworld_kernel::{SchedulerClient, SchedulerConfig, Simulation};

const HERO: EntityId = EntityId(1);

fn act() -> Operation {
    Operation::Action { entity: HERO }
}

fn start(
    simulation: Simulation<MockWorld>,
    db: &InMemoryTasksDb,
) -> (SchedulerClient, Ticker, JoinHandle<Simulation<MockWorld>>) {
    let scheduler = Scheduler::new(simulation, Box::new(db.clone()));
    let client = scheduler.client();
    let ticker = scheduler.ticker();
    let jh = std::thread::Builder::new()
        .name("tickworld-scheduler".to_string())
        .spawn(move || scheduler.run())
        .expect("Could not start scheduler thread");
    (client, ticker, jh)
}

fn fresh_simulation() -> Simulation<MockWorld> {
    Simulation::new(
        &SchedulerConfig::default(),
        MockWorld::with_entities([HERO]),
        recording_registry(),
    )
}

/// Deliver `n` ticks, one at a time, then wait until the scheduler has processed all of them.
fn tick_n(client: &SchedulerClient, ticker: &Ticker, n: usize) {
    for _ in 0..n {
        while !ticker.tick() {
            std::thread::yield_now();
        }
    }
    client.check_status().unwrap();
}

#[test]
fn client_requests_run_on_the_scheduler_thread() {
    let db = InMemoryTasksDb::new();
    let (client, ticker, jh) = start(fresh_simulation(), &db);

    let handle = client.schedule_task(0.05, act(), Some(HERO)).unwrap();
    let cancelled = client.schedule_task(0.05, act(), Some(HERO)).unwrap();
    assert!(client.cancel(cancelled).unwrap());
    tick_n(&client, &ticker, 5);
    assert_eq!(client.current_tick().unwrap(), 5);

    client.submit_shutdown("test over").unwrap();
    let simulation = jh.join().unwrap();
    assert_eq!(simulation.world().timeline(), vec![(3, handle.task_id())]);
}

#[test]
fn gate_and_rng_are_reachable_through_the_client() {
    let db = InMemoryTasksDb::new();
    let (client, ticker, jh) = start(fresh_simulation(), &db);

    let step = Operation::Move {
        entity: HERO,
        direction: Direction::South,
        range: 1,
    };
    assert!(client.request_action(HERO, ActionKind::Move, step.clone()).unwrap());
    assert!(!client.request_action(HERO, ActionKind::Move, step.clone()).unwrap());
    tick_n(&client, &ticker, 6);
    assert!(client.request_action(HERO, ActionKind::Move, step).unwrap());

    assert_eq!(
        client.request_action(EntityId(99), ActionKind::Move, act()),
        Err(SchedulerError::EntityNotFound(EntityId(99)))
    );
    assert_eq!(
        client.random_integer(0),
        Err(SchedulerError::InvalidRandomBound(0))
    );
    let roll = client.random_integer(6).unwrap();
    assert!((0..6).contains(&roll));

    client.submit_shutdown("test over").unwrap();
    jh.join().unwrap();
}

#[test]
fn shutdown_checkpoints_and_a_restart_resumes() {
    let db = InMemoryTasksDb::new();
    let (client, ticker, jh) = start(fresh_simulation(), &db);
    let think = client
        .schedule_recurring_task(0.1, Operation::Think { entity: HERO }, Some(HERO))
        .unwrap();
    tick_n(&client, &ticker, 10);
    let before = client.snapshot().unwrap();
    client.submit_shutdown("restart").unwrap();
    jh.join().unwrap();

    let saved = db.load_snapshot().unwrap().expect("snapshot was checkpointed");
    assert_eq!(saved, before);
    assert_eq!(saved.current_tick, 10);

    let restored = Simulation::restore(
        saved,
        MockWorld::with_entities([HERO]),
        recording_registry(),
    )
    .unwrap();
    let (client, ticker, jh) = start(restored, &db);
    tick_n(&client, &ticker, 10);
    client.submit_shutdown("done").unwrap();
    let simulation = jh.join().unwrap();
    let id = think.task_id();
    assert_eq!(simulation.world().timeline(), vec![(12, id), (18, id)]);
}

#[test]
fn explicit_checkpoint_writes_the_store() {
    let db = InMemoryTasksDb::new();
    let (client, _ticker, jh) = start(fresh_simulation(), &db);
    client.schedule_task(10.0, act(), None).unwrap();
    assert!(db.load_snapshot().unwrap().is_none());
    client.request_checkpoint().unwrap();
    let saved = db.load_snapshot().unwrap().unwrap();
    assert_eq!(saved.pending_tasks.len(), 1);
    assert_eq!(saved.pending_tasks[0].tick, 600);
    client.submit_shutdown("done").unwrap();
    jh.join().unwrap();
}

#[test]
fn ticker_thread_drives_time_until_killed() {
    let db = InMemoryTasksDb::new();
    let (client, ticker, jh) = start(fresh_simulation(), &db);
    let kill_switch = Arc::new(AtomicBool::new(false));
    let ticker_jh = ticker
        .spawn(Duration::from_millis(1), kill_switch.clone())
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while client.current_tick().unwrap() < 20 {
        assert!(Instant::now() < deadline, "ticker never reached tick 20");
        std::thread::sleep(Duration::from_millis(5));
    }
    kill_switch.store(true, Ordering::Relaxed);
    ticker_jh.join().unwrap();

    client.submit_shutdown("done").unwrap();
    jh.join().unwrap();
    assert_eq!(
        client.check_status(),
        Err(SchedulerError::SchedulerNotResponding)
    );
}
