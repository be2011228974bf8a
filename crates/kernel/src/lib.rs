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

pub use crate::config::SchedulerConfig;
pub use crate::task_context::TaskContext;
pub use crate::tasks::scheduler_client::SchedulerClient;
pub use crate::tasks::simulation::{Simulation, TickSummary};
pub use crate::tasks::task::DeferredTask;
pub use crate::world::World;
pub use tickworld_common::tasks::{TaskId, Tick};

pub mod config;
pub mod task_context;
pub mod tasks;
pub mod world;

pub mod testing;
