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

use std::collections::BTreeMap;

use strum::IntoEnumIterator;
use tickworld_common::model::EntityId;
use tickworld_common::tasks::{TaskId, Tick};

use crate::config::SchedulerConfig;
use crate::task_context::TaskContext;
use crate::tasks::action_gate::ActionGate;
use crate::tasks::operation::{Operation, OperationRegistry, OperationTag};
use crate::tasks::simulation::Simulation;
use crate::tasks::task::TaskError;
use crate::world::World;

/// A task run observed by the mock world.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub tick: Tick,
    pub task_id: TaskId,
    pub operation: Operation,
}

/// Entities with nothing but an action gate, plus a log of every operation executed against them.
#[derive(Debug, Default)]
pub struct MockWorld {
    entities: BTreeMap<EntityId, ActionGate>,
    executions: Vec<Execution>,
}

impl MockWorld {
    pub fn with_entities(entities: impl IntoIterator<Item = EntityId>) -> Self {
        let mut world = Self::default();
        for entity in entities {
            world.add_entity(entity);
        }
        world
    }

    pub fn add_entity(&mut self, entity: EntityId) {
        self.add_entity_with_gate(entity, ActionGate::default());
    }

    pub fn add_entity_with_gate(&mut self, entity: EntityId, gate: ActionGate) {
        self.entities.insert(entity, gate);
    }

    pub fn remove_entity(&mut self, entity: EntityId) -> bool {
        self.entities.remove(&entity).is_some()
    }

    pub fn record(&mut self, execution: Execution) {
        self.executions.push(execution);
    }

    pub fn executions(&self) -> &[Execution] {
        &self.executions
    }

    /// `(tick, task_id)` for every recorded run, in execution order.
    pub fn timeline(&self) -> Vec<(Tick, TaskId)> {
        self.executions
            .iter()
            .map(|e| (e.tick, e.task_id))
            .collect()
    }
}

impl World for MockWorld {
    fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn action_gate(&self, entity: EntityId) -> Option<&ActionGate> {
        self.entities.get(&entity)
    }

    fn action_gate_mut(&mut self, entity: EntityId) -> Option<&mut ActionGate> {
        self.entities.get_mut(&entity)
    }
}

/// Handler that appends the operation to the [`MockWorld`] execution log.
pub fn record_execution(
    ctx: &mut TaskContext<'_, MockWorld>,
    operation: &Operation,
) -> Result<(), TaskError> {
    let execution = Execution {
        tick: ctx.executing_tick(),
        task_id: ctx.task_id(),
        operation: operation.clone(),
    };
    ctx.world_mut().record(execution);
    Ok(())
}

/// A registry where every operation just records itself in the [`MockWorld`].
pub fn recording_registry() -> OperationRegistry<MockWorld> {
    let mut registry = OperationRegistry::new();
    for tag in OperationTag::iter().filter(|t| *t != OperationTag::ReopenGate) {
        registry.register(tag, record_execution);
    }
    registry
}

pub fn mock_simulation(entities: impl IntoIterator<Item = EntityId>) -> Simulation<MockWorld> {
    Simulation::new(
        &SchedulerConfig::default(),
        MockWorld::with_entities(entities),
        recording_registry(),
    )
}
