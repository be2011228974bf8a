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

//! Entities living in the sandbox world, and the registry that builds them from a class name.

use ahash::AHasher;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use strum::Display;
use tickworld_common::model::EntityId;
use tickworld_kernel::tasks::ActionGate;

pub const MAX_GOLD: u64 = 100_000;
pub const INVENTORY_SLOTS: usize = 45;
pub const MAX_STACK_SIZE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EntityClass {
    Player,
    Monster,
    MonsterSpawner,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Purse {
    gold: u64,
}

impl Purse {
    pub fn gold(&self) -> u64 {
        self.gold
    }

    /// Adds as much of `gold` as fits under [`MAX_GOLD`] and returns what was taken.
    pub fn add(&mut self, gold: u64) -> u64 {
        let taken = gold.min(MAX_GOLD - self.gold);
        self.gold += taken;
        taken
    }

    /// Removes up to `gold` and returns what was actually removed.
    pub fn remove(&mut self, gold: u64) -> u64 {
        let removed = gold.min(self.gold);
        self.gold -= removed;
        removed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStack {
    pub item: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Inventory {
    slots: Vec<Option<ItemStack>>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            slots: vec![None; INVENTORY_SLOTS],
        }
    }
}

impl Inventory {
    pub fn slot(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Tops up existing stacks of `item` first, then opens new stacks in the first free slots.
    /// Returns the count that did not fit.
    pub fn add(&mut self, item: &str, mut count: u32) -> u32 {
        for stack in self.slots.iter_mut().flatten() {
            if count == 0 {
                break;
            }
            if stack.item == item {
                let n = count.min(MAX_STACK_SIZE - stack.count);
                stack.count += n;
                count -= n;
            }
        }
        for slot in self.slots.iter_mut().filter(|s| s.is_none()) {
            if count == 0 {
                break;
            }
            let n = count.min(MAX_STACK_SIZE);
            *slot = Some(ItemStack {
                item: item.to_string(),
                count: n,
            });
            count -= n;
        }
        count
    }

    /// Takes up to `count` items out of `slot`, emptying it when the stack runs out.
    pub fn remove(&mut self, slot: usize, count: u32) -> Option<ItemStack> {
        let entry = self.slots.get_mut(slot)?;
        let stack = entry.as_mut()?;
        let n = count.min(stack.count);
        stack.count -= n;
        let removed = ItemStack {
            item: stack.item.clone(),
            count: n,
        };
        if stack.count == 0 {
            *entry = None;
        }
        Some(removed)
    }

    pub fn total(&self, item: &str) -> u32 {
        self.slots
            .iter()
            .flatten()
            .filter(|s| s.item == item)
            .map(|s| s.count)
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub class: EntityClass,
    pub x: i32,
    pub y: i32,
    pub spawned: bool,
    pub health: i32,
    pub max_health: i32,
    pub invincible: bool,
    pub purse: Purse,
    pub inventory: Inventory,
    /// The spawner a monster came from.
    pub owner: Option<EntityId>,
    /// Live monsters, for spawners.
    pub monster_count: u32,
    pub gate: ActionGate,
}

impl Entity {
    fn new(id: EntityId, class: EntityClass, max_health: i32) -> Self {
        Self {
            id,
            class,
            x: 0,
            y: 0,
            spawned: false,
            health: max_health,
            max_health,
            invincible: false,
            purse: Purse::default(),
            inventory: Inventory::default(),
            owner: None,
            monster_count: 0,
            gate: ActionGate::default(),
        }
    }

    pub fn player(id: EntityId) -> Self {
        Self::new(id, EntityClass::Player, 100)
    }

    pub fn monster(id: EntityId) -> Self {
        Self::new(id, EntityClass::Monster, 20)
    }

    pub fn monster_spawner(id: EntityId) -> Self {
        let mut spawner = Self::new(id, EntityClass::MonsterSpawner, 1);
        spawner.invincible = true;
        spawner
    }
}

pub type EntityConstructor = fn(EntityId) -> Entity;

/// Builds entities from the class names that appear in `CreateEntity` operations.
pub struct EntityFactory {
    constructors: HashMap<String, EntityConstructor, BuildHasherDefault<AHasher>>,
}

impl Default for EntityFactory {
    fn default() -> Self {
        let mut factory = Self {
            constructors: HashMap::default(),
        };
        factory
            .register(EntityClass::Player, Entity::player)
            .register(EntityClass::Monster, Entity::monster)
            .register(EntityClass::MonsterSpawner, Entity::monster_spawner);
        factory
    }
}

impl EntityFactory {
    pub fn register(&mut self, class: EntityClass, constructor: EntityConstructor) -> &mut Self {
        self.constructors.insert(class.to_string(), constructor);
        self
    }

    pub fn create(&self, class: &str, id: EntityId) -> Option<Entity> {
        self.constructors.get(class).map(|constructor| constructor(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test]
    fn purse_is_capped() {
        let mut purse = Purse::default();
        assert_eq!(purse.add(MAX_GOLD - 10), MAX_GOLD - 10);
        assert_eq!(purse.add(25), 10);
        assert_eq!(purse.gold(), MAX_GOLD);
        assert_eq!(purse.remove(MAX_GOLD + 1), MAX_GOLD);
        assert_eq!(purse.gold(), 0);
    }

    #[test]
    fn inventory_fills_existing_stacks_first() {
        let mut inventory = Inventory::default();
        assert_eq!(inventory.add("arrow", 30), 0);
        assert_eq!(inventory.add("potion", 1), 0);
        assert_eq!(inventory.add("arrow", 30), 0);
        assert_eq!(
            inventory.slot(0),
            Some(&ItemStack {
                item: "arrow".to_string(),
                count: MAX_STACK_SIZE
            })
        );
        assert_eq!(inventory.slot(1).unwrap().item, "potion");
        assert_eq!(inventory.slot(2).unwrap().count, 10);
        assert_eq!(inventory.total("arrow"), 60);
    }

    #[test]
    fn inventory_overflow_is_returned() {
        let mut inventory = Inventory::default();
        let capacity = INVENTORY_SLOTS as u32 * MAX_STACK_SIZE;
        assert_eq!(inventory.add("rock", capacity + 7), 7);
        assert_eq!(inventory.add("gem", 1), 1);
    }

    #[test]
    fn removing_a_whole_stack_frees_the_slot() {
        let mut inventory = Inventory::default();
        inventory.add("potion", 2);
        assert_eq!(inventory.remove(0, 1).unwrap().count, 1);
        assert_eq!(inventory.remove(0, 5).unwrap().count, 1);
        assert_eq!(inventory.slot(0), None);
        assert_eq!(inventory.remove(0, 1), None);
        assert_eq!(inventory.remove(INVENTORY_SLOTS, 1), None);
    }

    #[test_case("player", EntityClass::Player)]
    #[test_case("monster", EntityClass::Monster)]
    #[test_case("monster_spawner", EntityClass::MonsterSpawner)]
    fn factory_builds_known_classes(name: &str, class: EntityClass) {
        let entity = EntityFactory::default().create(name, EntityId(4)).unwrap();
        assert_eq!(entity.class, class);
        assert_eq!(entity.id, EntityId(4));
    }

    #[test]
    fn factory_rejects_unknown_classes() {
        assert!(EntityFactory::default().create("dragon", EntityId(1)).is_none());
    }
}
