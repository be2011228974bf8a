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

use crate::args::Args;
use crate::sandbox::handlers::sandbox_registry;
use crate::sandbox::{SandboxWorld, schedule_initial_spawns};
use crate::tasks::tasks_db_fjall::FjallTasksDB;
use ::tracing::{error, info, warn};
use clap::Parser;
use eyre::{Report, bail, eyre};
use fs2::FileExt;
use mimalloc::MiMalloc;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tickworld_common::tracing;
use tickworld_kernel::Simulation;
use tickworld_kernel::tasks::TasksDb;
use tickworld_kernel::tasks::scheduler::Scheduler;

mod args;
mod sandbox;
mod tasks;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// How often the main thread looks at the kill switch.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Acquire an exclusive lock on the data directory to prevent multiple daemon instances
/// from operating on the same data.
fn acquire_data_directory_lock(data_dir: &Path) -> Result<File, Report> {
    std::fs::create_dir_all(data_dir)?;

    let lock_file_path = data_dir.join(".tickworld-daemon.lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&lock_file_path)?;

    match lock_file.try_lock_exclusive() {
        Ok(()) => {
            info!("Acquired exclusive lock on data directory: {:?}", data_dir);
            Ok(lock_file)
        }
        Err(e) => {
            error!(
                "Failed to acquire lock on data directory {:?}. Another tickworld-daemon instance may already be running in this directory.",
                data_dir
            );
            bail!("Directory lock acquisition failed: {}", e);
        }
    }
}

/// Host for the tickworld scheduler.
///   * Opens the tasks database and resumes from its checkpoint, if any
///   * Populates the sandbox world
///   * Drives the scheduler from a real-time ticker until signalled to stop
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let args = Args::parse();
    tracing::init_tracing(args.debug).map_err(|e| eyre!("Unable to configure logging: {}", e))?;

    let mut config = args.load_config()?;
    let _data_dir_lock = acquire_data_directory_lock(&args.data_dir)?;

    let tasks_db_path = args.resolved_tasks_db_path();
    let (tasks_db, fresh) = FjallTasksDB::open(&tasks_db_path)
        .map_err(|e| eyre!("Unable to open tasks database at {:?}: {}", tasks_db_path, e))?;
    let checkpoint = if fresh {
        None
    } else {
        tasks_db
            .load_snapshot()
            .map_err(|e| eyre!("Unable to load checkpoint from {:?}: {}", tasks_db_path, e))?
    };

    let mut world = SandboxWorld::new(
        config.sandbox.clone(),
        config.scheduler.default_action_cost,
    );
    let population = world.populate();
    let registry = sandbox_registry();

    let simulation = match checkpoint {
        Some(snapshot) => {
            if snapshot.tick_rate != config.scheduler.tick_rate {
                warn!(
                    configured = config.scheduler.tick_rate,
                    persisted = snapshot.tick_rate,
                    "Ignoring configured tick rate; the checkpoint keeps its own"
                );
            }
            info!(
                current_tick = snapshot.current_tick,
                pending = snapshot.pending_tasks.len(),
                "Resuming from checkpoint"
            );
            if snapshot.entropy_window != config.scheduler.entropy_window {
                warn!(
                    configured = config.scheduler.entropy_window,
                    persisted = snapshot.entropy_window,
                    "Ignoring configured entropy window; the checkpoint keeps its own"
                );
            }
            Simulation::restore(snapshot, world, registry)?
        }
        None => {
            if config.scheduler.initial_seed.is_none() {
                let seed = format!("{:016x}", rand::random::<u64>());
                info!(%seed, "No seed configured; generated one");
                config.scheduler.initial_seed = Some(seed);
            }
            let mut simulation = Simulation::new(&config.scheduler, world, registry);
            schedule_initial_spawns(&mut simulation, &population)?;
            info!(entities = population.len(), "Starting fresh world");
            simulation
        }
    };

    let tick_interval = simulation.timeline().clock().interval();
    let scheduler = Scheduler::new(simulation, Box::new(tasks_db));
    let scheduler_client = scheduler.client();
    let ticker = scheduler.ticker();

    let kill_switch = Arc::new(AtomicBool::new(false));

    // Background checkpoint thread
    (|| -> Result<(), Report> {
        let Some(checkpoint_interval) = config.scheduler.checkpoint_interval() else {
            info!("Periodic checkpointing disabled - no interval configured.");
            return Ok(());
        };

        let checkpoint_kill_switch = kill_switch.clone();
        let checkpoint_scheduler_client = scheduler_client.clone();
        info!(
            "Checkpointing enabled to {}. Interval: {:?}",
            tasks_db_path.display(),
            checkpoint_interval
        );

        std::thread::Builder::new()
            .name("tickworld-checkpoint".to_string())
            .spawn(move || {
                loop {
                    std::thread::sleep(checkpoint_interval);
                    if checkpoint_kill_switch.load(Ordering::Relaxed) {
                        info!("Checkpointing thread exiting.");
                        break;
                    }
                    if let Err(e) = checkpoint_scheduler_client.request_checkpoint() {
                        error!("Failed to submit checkpoint request: {}", e);
                    }
                }
            })?;
        Ok(())
    })()?;

    let scheduler_loop_jh = std::thread::Builder::new()
        .name("tickworld-scheduler".to_string())
        .spawn(move || scheduler.run())?;

    let ticker_jh = ticker.spawn(tick_interval, kill_switch.clone())?;

    signal_hook::flag::register(signal_hook::consts::SIGTERM, kill_switch.clone())?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, kill_switch.clone())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = ?args.data_dir,
        ?tick_interval,
        "Daemon started."
    );

    while !kill_switch.load(Ordering::Relaxed) {
        if scheduler_loop_jh.is_finished() {
            error!("Scheduler thread exited unexpectedly");
            kill_switch.store(true, Ordering::Relaxed);
            break;
        }
        std::thread::sleep(SHUTDOWN_POLL_INTERVAL);
    }
    warn!("Kill switch set. Departing...");

    if let Err(e) = ticker_jh.join() {
        error!("Ticker thread panicked: {:?}", e);
    }

    if let Err(e) = scheduler_client.submit_shutdown("System shutting down") {
        error!("Failed to send shutdown signal to scheduler: {}", e);
    }

    match scheduler_loop_jh.join() {
        Ok(simulation) => info!(
            final_tick = simulation.current_tick(),
            entities = simulation.world().len(),
            "Scheduler stopped"
        ),
        Err(e) => error!("Scheduler thread panicked: {:?}", e),
    }

    info!("Done.");
    Ok(())
}
