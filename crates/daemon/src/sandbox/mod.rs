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

//! A small world for the daemon to run: idle players and monster spawners whose monsters wander
//! around a square map. Entity state is not persisted; the same layout is rebuilt on every start.

pub mod entity;
pub mod handlers;

use crate::sandbox::entity::{Entity, EntityFactory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tickworld_common::model::EntityId;
use tickworld_common::tasks::SchedulerError;
use tickworld_kernel::tasks::{ActionGate, Operation};
use tickworld_kernel::{Simulation, World};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub spawners: u32,
    pub players: u32,
    /// Side length of the map. Positions are clamped to `0..world_size`.
    pub world_size: i32,
    pub max_monsters_per_spawner: u32,
    pub spawn_interval_seconds: f64,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            spawners: 1,
            players: 1,
            world_size: 64,
            max_monsters_per_spawner: 4,
            spawn_interval_seconds: 3.0,
        }
    }
}

pub struct SandboxWorld {
    config: SandboxConfig,
    factory: EntityFactory,
    entities: BTreeMap<EntityId, Entity>,
    next_entity_id: u64,
    action_cost: f64,
}

impl SandboxWorld {
    /// `action_cost` is the cooldown given to every gate of every entity this world creates.
    pub fn new(config: SandboxConfig, action_cost: f64) -> Self {
        Self {
            config,
            factory: EntityFactory::default(),
            entities: BTreeMap::new(),
            next_entity_id: 1,
            action_cost,
        }
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Place the configured players and spawners. Returns their ids in creation order.
    pub fn populate(&mut self) -> Vec<EntityId> {
        let mut created = vec![];
        let centre = self.config.world_size / 2;
        for _ in 0..self.config.players {
            created.extend(self.create("player", centre, centre));
        }
        let spacing = (self.config.world_size / (self.config.spawners as i32 + 1)).max(1);
        for i in 0..self.config.spawners {
            let offset = spacing * (i as i32 + 1);
            created.extend(self.create("monster_spawner", offset, offset));
        }
        created
    }

    /// Create an entity of the named class at `(x, y)`. `None` for an unknown class.
    pub fn create(&mut self, class: &str, x: i32, y: i32) -> Option<EntityId> {
        let id = EntityId(self.next_entity_id);
        let mut entity = self.factory.create(class, id)?;
        self.next_entity_id += 1;
        (entity.x, entity.y) = self.clamp_position(x, y);
        entity.gate = ActionGate::with_uniform_cost(self.action_cost);
        self.entities.insert(id, entity);
        Some(id)
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn clamp_position(&self, x: i32, y: i32) -> (i32, i32) {
        let max = (self.config.world_size - 1).max(0);
        (x.clamp(0, max), y.clamp(0, max))
    }
}

impl World for SandboxWorld {
    fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    fn action_gate(&self, entity: EntityId) -> Option<&ActionGate> {
        self.entities.get(&entity).map(|e| &e.gate)
    }

    fn action_gate_mut(&mut self, entity: EntityId) -> Option<&mut ActionGate> {
        self.entities.get_mut(&entity).map(|e| &mut e.gate)
    }
}

/// Bring freshly populated entities to life on the next tick.
pub fn schedule_initial_spawns(
    simulation: &mut Simulation<SandboxWorld>,
    entities: &[EntityId],
) -> Result<(), SchedulerError> {
    for entity in entities {
        simulation.schedule_task(0.0, Operation::Spawn { entity: *entity }, Some(*entity))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::entity::EntityClass;
    use pretty_assertions::assert_eq;
    use tickworld_kernel::tasks::ActionKind;

    #[test]
    fn populate_is_deterministic() {
        let config = SandboxConfig {
            spawners: 3,
            players: 2,
            ..Default::default()
        };
        let layout = |world: &SandboxWorld| {
            world
                .entities()
                .map(|e| (e.id, e.class, e.x, e.y))
                .collect::<Vec<_>>()
        };
        let mut a = SandboxWorld::new(config.clone(), 0.1);
        let mut b = SandboxWorld::new(config, 0.1);
        assert_eq!(a.populate(), b.populate());
        assert_eq!(layout(&a), layout(&b));
        assert_eq!(a.len(), 5);
        assert_eq!(
            a.entities().filter(|e| e.class == EntityClass::MonsterSpawner).count(),
            3
        );
    }

    #[test]
    fn created_entities_are_clamped_and_gated() {
        let mut world = SandboxWorld::new(SandboxConfig::default(), 0.5);
        let id = world.create("monster", -5, 1000).unwrap();
        let monster = world.get(id).unwrap();
        assert_eq!((monster.x, monster.y), (0, 63));
        assert_eq!(monster.gate.cost(ActionKind::Move), 0.5);
        assert!(world.contains(id));
        assert!(world.action_gate(id).unwrap().is_open(ActionKind::Create, 0));
    }

    #[test]
    fn unknown_class_consumes_no_id() {
        let mut world = SandboxWorld::new(SandboxConfig::default(), 0.1);
        assert_eq!(world.create("dragon", 0, 0), None);
        assert_eq!(world.create("player", 0, 0), Some(EntityId(1)));
    }
}
