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

use crate::sandbox::SandboxConfig;
use clap::builder::ValueHint;
use clap_derive::Parser;
use eyre::eyre;
use figment::Figment;
use figment::providers::{Format as ProviderFormat, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tickworld_kernel::SchedulerConfig;

#[derive(Parser, Debug, Serialize, Deserialize)]
pub struct Args {
    #[arg(
        value_name = "data-dir",
        help = "Directory to store all database files under",
        value_hint = ValueHint::DirPath,
        default_value = "./tickworld-data"
    )]
    pub data_dir: PathBuf,

    #[command(flatten)]
    scheduler_args: Option<SchedulerArgs>,

    #[command(flatten)]
    sandbox_args: Option<SandboxArgs>,

    #[arg(
        long,
        value_name = "config",
        help = "Path to configuration (YAML) file to use, if any. If not specified, defaults are used.\
                Configuration file values can be overridden by command line arguments.",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[arg(
        short = 'x',
        long,
        value_name = "tasks-db",
        help = "Path to persistent tasks database to use or create (relative to data-dir if not absolute)",
        value_hint = ValueHint::FilePath
    )]
    pub tasks_db: Option<PathBuf>,

    #[arg(long, help = "Enable debug logging", default_value = "false")]
    pub debug: bool,
}

#[derive(Parser, Debug, Serialize, Deserialize)]
pub struct SchedulerArgs {
    #[arg(long, value_name = "tick-rate", help = "Ticks per second")]
    pub tick_rate: Option<u32>,

    #[arg(
        long,
        value_name = "seed",
        help = "Seed string for the world's random number generator. Only used when starting a fresh world."
    )]
    pub seed: Option<String>,

    #[arg(
        long,
        value_name = "entropy-window",
        help = "Number of scheduling observations mixed into each random draw"
    )]
    pub entropy_window: Option<usize>,

    #[arg(
        long,
        value_name = "checkpoint-interval-seconds",
        help = "Interval in seconds between scheduler checkpoints"
    )]
    pub checkpoint_interval_seconds: Option<u64>,
}

impl SchedulerArgs {
    pub fn merge_config(&self, config: &mut SchedulerConfig) -> Result<(), eyre::Report> {
        if let Some(tick_rate) = self.tick_rate {
            if tick_rate == 0 {
                return Err(eyre!("Tick rate must be at least 1"));
            }
            config.tick_rate = tick_rate;
        }
        if let Some(seed) = self.seed.as_ref() {
            config.initial_seed = Some(seed.clone());
        }
        if let Some(window) = self.entropy_window {
            config.entropy_window = window;
        }
        if let Some(seconds) = self.checkpoint_interval_seconds {
            config.checkpoint_interval_seconds = Some(seconds);
        }
        Ok(())
    }
}

#[derive(Parser, Debug, Serialize, Deserialize)]
pub struct SandboxArgs {
    #[arg(long, value_name = "spawners", help = "Number of monster spawners placed in a fresh world")]
    pub spawners: Option<u32>,

    #[arg(long, value_name = "players", help = "Number of idle players placed in a fresh world")]
    pub players: Option<u32>,
}

impl SandboxArgs {
    pub fn merge_config(&self, config: &mut SandboxConfig) -> Result<(), eyre::Report> {
        if let Some(spawners) = self.spawners {
            config.spawners = spawners;
        }
        if let Some(players) = self.players {
            config.players = players;
        }
        Ok(())
    }
}

/// Everything the daemon reads from its YAML configuration file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub scheduler: SchedulerConfig,
    pub sandbox: SandboxConfig,
}

impl Args {
    fn merge_config(&self, mut config: DaemonConfig) -> Result<DaemonConfig, eyre::Report> {
        if let Some(args) = self.scheduler_args.as_ref() {
            args.merge_config(&mut config.scheduler)?;
        }
        if let Some(args) = self.sandbox_args.as_ref() {
            args.merge_config(&mut config.sandbox)?;
        }
        Ok(config)
    }

    /// Load the configuration file if we have it, and then we'll merge the arguments into it.
    pub fn load_config(&self) -> Result<DaemonConfig, eyre::Report> {
        // Figment can't merge the clap args directly because they're nested through flattening.
        let config = match self.config_file.clone() {
            Some(config_path) => Figment::new()
                .merge(Serialized::defaults(DaemonConfig::default()))
                .merge(Yaml::file(config_path.clone()))
                .extract::<DaemonConfig>()
                .map_err(|e| {
                    eyre!(
                        "Failed to parse configuration from {:?}: {}",
                        config_path,
                        e
                    )
                })?,
            None => DaemonConfig::default(),
        };
        self.merge_config(config)
    }

    /// Resolve the tasks database path relative to data_dir
    pub(crate) fn resolved_tasks_db_path(&self) -> PathBuf {
        match &self.tasks_db {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.data_dir.join(path),
            None => self.data_dir.join("tasks.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use std::path::Path;

    fn write_config(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("daemon-config.yaml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn no_config_file_means_defaults() {
        let args = Args::try_parse_from(["tickworld-daemon"]).unwrap();
        assert_eq!(args.load_config().unwrap(), DaemonConfig::default());
        assert_eq!(
            args.resolved_tasks_db_path(),
            PathBuf::from("./tickworld-data/tasks.db")
        );
    }

    #[test]
    fn file_values_apply_and_flags_override_them() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = write_config(
            tmpdir.path(),
            "scheduler:\n  tick_rate: 20\n  initial_seed: from-file\n  checkpoint_interval_seconds: 30\nsandbox:\n  spawners: 3\n",
        );
        let args = Args::try_parse_from([
            "tickworld-daemon",
            "--config-file",
            path.to_str().unwrap(),
            "--seed",
            "from-flag",
            "--players",
            "2",
        ])
        .unwrap();
        let config = args.load_config().unwrap();
        assert_eq!(config.scheduler.tick_rate, 20);
        assert_eq!(config.scheduler.initial_seed.as_deref(), Some("from-flag"));
        assert_eq!(config.scheduler.checkpoint_interval_seconds, Some(30));
        assert_eq!(config.scheduler.entropy_window, SchedulerConfig::default().entropy_window);
        assert_eq!(config.sandbox.spawners, 3);
        assert_eq!(config.sandbox.players, 2);
    }

    #[test]
    fn malformed_config_is_reported() {
        let tmpdir = tempfile::tempdir().unwrap();
        let path = write_config(tmpdir.path(), "scheduler:\n  tick_rate: fast\n");
        let args =
            Args::try_parse_from(["tickworld-daemon", "--config-file", path.to_str().unwrap()])
                .unwrap();
        let err = args.load_config().unwrap_err();
        assert!(err.to_string().starts_with("Failed to parse configuration"));
    }

    #[test]
    fn zero_tick_rate_is_refused() {
        let args = Args::try_parse_from(["tickworld-daemon", "--tick-rate", "0"]).unwrap();
        assert!(args.load_config().is_err());
    }

    #[test]
    fn tasks_db_path_resolution() {
        let args =
            Args::try_parse_from(["tickworld-daemon", "/srv/world", "-x", "snapshots.db"]).unwrap();
        assert_eq!(
            args.resolved_tasks_db_path(),
            PathBuf::from("/srv/world/snapshots.db")
        );
        let args =
            Args::try_parse_from(["tickworld-daemon", "/srv/world", "-x", "/var/lib/tasks.db"])
                .unwrap();
        assert_eq!(
            args.resolved_tasks_db_path(),
            PathBuf::from("/var/lib/tasks.db")
        );
    }
}
