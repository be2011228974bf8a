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

use crate::sandbox::SandboxWorld;
use crate::sandbox::entity::{Entity, EntityClass};
use strum::{EnumCount, IntoEnumIterator};
use tickworld_common::model::EntityId;
use tickworld_kernel::TaskContext;
use tickworld_kernel::tasks::{
    ActionKind, Direction, Operation, OperationRegistry, OperationTag, TaskError,
};
use tracing::debug;

/// Seconds between a monster's wandering decisions.
pub const MONSTER_THINK_SECONDS: f64 = 1.0;
pub const POTION: &str = "potion";
pub const POTION_HEALTH: i32 = 10;

type Ctx<'a> = TaskContext<'a, SandboxWorld>;

/// Handlers for every operation the sandbox understands. Gate reopening is handled by the
/// simulation and never reaches the registry.
pub fn sandbox_registry() -> OperationRegistry<SandboxWorld> {
    let mut registry = OperationRegistry::new();
    registry
        .register(OperationTag::Spawn, spawn)
        .register(OperationTag::Despawn, despawn)
        .register(OperationTag::Move, move_entity)
        .register(OperationTag::Teleport, teleport)
        .register(OperationTag::Action, action)
        .register(OperationTag::AddHealth, add_health)
        .register(OperationTag::MakeInvincible, make_invincible)
        .register(OperationTag::ClearInvincible, clear_invincible)
        .register(OperationTag::CreateEntity, create_entity)
        .register(OperationTag::AddToPurse, add_to_purse)
        .register(OperationTag::DropFromPurse, drop_from_purse)
        .register(OperationTag::AddToInventory, add_to_inventory)
        .register(OperationTag::ConsumeFromInventory, consume_from_inventory)
        .register(OperationTag::DropFromInventory, drop_from_inventory)
        .register(OperationTag::Think, think);
    registry
}

fn mismatched(op: &Operation) -> TaskError {
    TaskError::MismatchedOperation(op.tag())
}

fn entity<'w>(ctx: &'w Ctx<'_>, id: EntityId) -> Result<&'w Entity, TaskError> {
    ctx.world().get(id).ok_or(TaskError::UnresolvedEntity(id))
}

fn entity_mut<'w>(ctx: &'w mut Ctx<'_>, id: EntityId) -> Result<&'w mut Entity, TaskError> {
    ctx.world_mut()
        .get_mut(id)
        .ok_or(TaskError::UnresolvedEntity(id))
}

fn spawn(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::Spawn { entity: id } = *op else {
        return Err(mismatched(op));
    };
    let spawned = entity_mut(ctx, id)?;
    spawned.spawned = true;
    let class = spawned.class;
    match class {
        EntityClass::MonsterSpawner => {
            let interval = ctx.world().config().spawn_interval_seconds;
            ctx.schedule_recurring(interval, Operation::Think { entity: id })?;
        }
        EntityClass::Monster => {
            ctx.schedule_recurring(MONSTER_THINK_SECONDS, Operation::Think { entity: id })?;
        }
        EntityClass::Player => {}
    }
    debug!(entity = %id, %class, tick = ctx.executing_tick(), "Spawned");
    Ok(())
}

fn despawn(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::Despawn { entity: id } = *op else {
        return Err(mismatched(op));
    };
    let removed = ctx
        .world_mut()
        .remove(id)
        .ok_or(TaskError::UnresolvedEntity(id))?;
    if let Some(owner) = removed.owner
        && let Some(spawner) = ctx.world_mut().get_mut(owner)
    {
        spawner.monster_count = spawner.monster_count.saturating_sub(1);
    }
    debug!(entity = %id, class = %removed.class, "Despawned");
    Ok(())
}

fn move_entity(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::Move {
        entity: id,
        direction,
        range,
    } = *op
    else {
        return Err(mismatched(op));
    };
    let (dx, dy) = direction.offset();
    let steps = i32::try_from(range).unwrap_or(i32::MAX);
    let (x, y) = {
        let mover = entity(ctx, id)?;
        (
            mover.x.saturating_add(dx.saturating_mul(steps)),
            mover.y.saturating_add(dy.saturating_mul(steps)),
        )
    };
    let (x, y) = ctx.world().clamp_position(x, y);
    let mover = entity_mut(ctx, id)?;
    (mover.x, mover.y) = (x, y);
    Ok(())
}

fn teleport(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::Teleport { entity: id, x, y } = *op else {
        return Err(mismatched(op));
    };
    let (x, y) = ctx.world().clamp_position(x, y);
    let traveller = entity_mut(ctx, id)?;
    (traveller.x, traveller.y) = (x, y);
    Ok(())
}

fn action(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::Action { entity: id } = *op else {
        return Err(mismatched(op));
    };
    let class = entity(ctx, id)?.class;
    debug!(entity = %id, %class, tick = ctx.executing_tick(), "Action performed");
    Ok(())
}

fn add_health(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::AddHealth { entity: id, amount } = *op else {
        return Err(mismatched(op));
    };
    let target = entity_mut(ctx, id)?;
    if amount < 0 && target.invincible {
        return Ok(());
    }
    target.health = target.health.saturating_add(amount).clamp(0, target.max_health);
    if target.health == 0 {
        ctx.schedule(0.0, Operation::Despawn { entity: id })?;
    }
    Ok(())
}

fn make_invincible(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::MakeInvincible { entity: id, seconds } = *op else {
        return Err(mismatched(op));
    };
    entity_mut(ctx, id)?.invincible = true;
    ctx.schedule(seconds, Operation::ClearInvincible { entity: id })?;
    Ok(())
}

fn clear_invincible(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::ClearInvincible { entity: id } = *op else {
        return Err(mismatched(op));
    };
    entity_mut(ctx, id)?.invincible = false;
    Ok(())
}

fn create_entity(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::CreateEntity {
        entity: creator,
        class,
    } = op
    else {
        return Err(mismatched(op));
    };
    let creator = *creator;
    let (x, y) = {
        let parent = entity(ctx, creator)?;
        (parent.x, parent.y)
    };
    let created = ctx
        .world_mut()
        .create(class, x, y)
        .ok_or_else(|| TaskError::Failed(format!("unknown entity class {class:?}")))?;
    entity_mut(ctx, created)?.owner = Some(creator);
    let parent = entity_mut(ctx, creator)?;
    if parent.class == EntityClass::MonsterSpawner {
        parent.monster_count += 1;
    }
    ctx.schedule(0.0, Operation::Spawn { entity: created })?;
    debug!(%creator, %created, class, "Created entity");
    Ok(())
}

fn add_to_purse(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::AddToPurse { entity: id, gold } = *op else {
        return Err(mismatched(op));
    };
    let taken = entity_mut(ctx, id)?.purse.add(gold);
    if taken < gold {
        debug!(entity = %id, offered = gold, taken, "Purse full");
    }
    Ok(())
}

fn drop_from_purse(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::DropFromPurse { entity: id, gold } = *op else {
        return Err(mismatched(op));
    };
    entity_mut(ctx, id)?.purse.remove(gold);
    Ok(())
}

fn add_to_inventory(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::AddToInventory { entity: id, item } = op else {
        return Err(mismatched(op));
    };
    let left_over = entity_mut(ctx, *id)?.inventory.add(item, 1);
    if left_over > 0 {
        debug!(entity = %id, item, "Inventory full");
    }
    Ok(())
}

fn consume_from_inventory(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::ConsumeFromInventory { entity: id, slot } = *op else {
        return Err(mismatched(op));
    };
    let consumed = entity_mut(ctx, id)?
        .inventory
        .remove(slot, 1)
        .ok_or_else(|| TaskError::Failed(format!("inventory slot {slot} is empty")))?;
    if consumed.item == POTION {
        ctx.schedule(
            0.0,
            Operation::AddHealth {
                entity: id,
                amount: POTION_HEALTH,
            },
        )?;
    }
    Ok(())
}

fn drop_from_inventory(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::DropFromInventory {
        entity: id,
        slot,
        count,
    } = *op
    else {
        return Err(mismatched(op));
    };
    entity_mut(ctx, id)?
        .inventory
        .remove(slot, count)
        .ok_or_else(|| TaskError::Failed(format!("inventory slot {slot} is empty")))?;
    Ok(())
}

/// Periodic AI. Spawners top up their monsters; monsters take a random walk. Both go through the
/// entity's action gate, so a decision made while the gate is closed is simply dropped.
fn think(ctx: &mut Ctx<'_>, op: &Operation) -> Result<(), TaskError> {
    let Operation::Think { entity: id } = *op else {
        return Err(mismatched(op));
    };
    let (class, monster_count) = {
        let thinker = entity(ctx, id)?;
        (thinker.class, thinker.monster_count)
    };
    match class {
        EntityClass::MonsterSpawner => {
            if monster_count < ctx.world().config().max_monsters_per_spawner {
                let spawn = Operation::CreateEntity {
                    entity: id,
                    class: EntityClass::Monster.to_string(),
                };
                ctx.request_action(id, ActionKind::Create, spawn)?;
            }
        }
        EntityClass::Monster => {
            let roll = ctx.random_integer(Direction::COUNT as i32)?;
            let direction = Direction::iter()
                .nth(roll as usize)
                .unwrap_or(Direction::North);
            let range = 1 + ctx.random_integer(2)? as u32;
            let step = Operation::Move {
                entity: id,
                direction,
                range,
            };
            ctx.request_action(id, ActionKind::Move, step)?;
        }
        EntityClass::Player => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{SandboxConfig, schedule_initial_spawns};
    use pretty_assertions::assert_eq;
    use tickworld_kernel::tasks::action_gate::DEFAULT_ACTION_COST;
    use tickworld_kernel::{SchedulerConfig, Simulation};

    fn sandbox(spawners: u32, players: u32) -> (Simulation<SandboxWorld>, Vec<EntityId>) {
        let config = SandboxConfig {
            spawners,
            players,
            ..Default::default()
        };
        let mut world = SandboxWorld::new(config, DEFAULT_ACTION_COST);
        let ids = world.populate();
        let mut simulation =
            Simulation::new(&SchedulerConfig::default(), world, sandbox_registry());
        schedule_initial_spawns(&mut simulation, &ids).unwrap();
        (simulation, ids)
    }

    fn run(simulation: &mut Simulation<SandboxWorld>, ticks: u64) {
        for _ in 0..ticks {
            simulation.advance();
        }
    }

    fn schedule(simulation: &mut Simulation<SandboxWorld>, delay: f64, op: Operation) {
        let owner = Some(op.subject());
        simulation.schedule_task(delay, op, owner).unwrap();
    }

    #[test]
    fn every_operation_but_gate_reopening_has_a_handler() {
        let registry = sandbox_registry();
        for tag in OperationTag::iter() {
            assert_eq!(
                registry.contains(tag),
                tag != OperationTag::ReopenGate,
                "{tag:?}"
            );
        }
    }

    #[test]
    fn spawner_fills_up_to_its_limit() {
        let (mut simulation, ids) = sandbox(1, 0);
        let spawner = ids[0];
        // Thinks every 180 ticks and creates one monster each time until four are alive.
        run(&mut simulation, 1000);
        let world = simulation.world();
        assert_eq!(world.get(spawner).unwrap().monster_count, 4);
        let monsters: Vec<_> = world
            .entities()
            .filter(|e| e.class == EntityClass::Monster)
            .collect();
        assert_eq!(monsters.len(), 4);
        for monster in monsters {
            assert!(monster.spawned);
            assert_eq!(monster.owner, Some(spawner));
            assert_eq!(world.clamp_position(monster.x, monster.y), (monster.x, monster.y));
        }
    }

    #[test]
    fn despawned_monster_frees_a_place() {
        let (mut simulation, ids) = sandbox(1, 0);
        run(&mut simulation, 1000);
        let victim = simulation
            .world()
            .entities()
            .find(|e| e.class == EntityClass::Monster)
            .map(|e| e.id)
            .unwrap();
        schedule(&mut simulation, 0.0, Operation::Despawn { entity: victim });
        run(&mut simulation, 1);
        assert!(simulation.world().get(victim).is_none());
        assert_eq!(simulation.world().get(ids[0]).unwrap().monster_count, 3);
        // Next spawner think is at tick 1081.
        run(&mut simulation, 90);
        assert_eq!(simulation.world().get(ids[0]).unwrap().monster_count, 4);
    }

    #[test]
    fn identical_sandboxes_stay_identical() {
        let positions = |simulation: &Simulation<SandboxWorld>| {
            simulation
                .world()
                .entities()
                .map(|e| (e.id, e.x, e.y))
                .collect::<Vec<_>>()
        };
        let (mut a, _) = sandbox(2, 1);
        let (mut b, _) = sandbox(2, 1);
        run(&mut a, 2000);
        run(&mut b, 2000);
        assert_eq!(positions(&a), positions(&b));
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn lethal_damage_despawns() {
        let (mut simulation, ids) = sandbox(0, 1);
        let player = ids[0];
        schedule(
            &mut simulation,
            0.0,
            Operation::AddHealth {
                entity: player,
                amount: -150,
            },
        );
        run(&mut simulation, 1);
        assert_eq!(simulation.world().get(player).unwrap().health, 0);
        run(&mut simulation, 1);
        assert!(simulation.world().get(player).is_none());
    }

    #[test]
    fn invincibility_blocks_damage_until_it_expires() {
        let (mut simulation, ids) = sandbox(0, 1);
        let player = ids[0];
        schedule(
            &mut simulation,
            0.0,
            Operation::MakeInvincible {
                entity: player,
                seconds: 1.0,
            },
        );
        let hit = Operation::AddHealth {
            entity: player,
            amount: -10,
        };
        schedule(&mut simulation, 0.5, hit.clone());
        schedule(&mut simulation, 2.0, hit);
        run(&mut simulation, 60);
        assert_eq!(simulation.world().get(player).unwrap().health, 100);
        run(&mut simulation, 100);
        let player = simulation.world().get(player).unwrap();
        assert!(!player.invincible);
        assert_eq!(player.health, 90);
    }

    #[test]
    fn purse_and_potions() {
        let (mut simulation, ids) = sandbox(0, 1);
        let player = ids[0];
        for op in [
            Operation::AddToPurse {
                entity: player,
                gold: 150_000,
            },
            Operation::DropFromPurse {
                entity: player,
                gold: 1,
            },
            Operation::AddHealth {
                entity: player,
                amount: -30,
            },
            Operation::AddToInventory {
                entity: player,
                item: POTION.to_string(),
            },
            Operation::ConsumeFromInventory {
                entity: player,
                slot: 0,
            },
        ] {
            schedule(&mut simulation, 0.0, op);
        }
        run(&mut simulation, 2);
        let player = simulation.world().get(player).unwrap();
        assert_eq!(player.purse.gold(), 99_999);
        assert_eq!(player.health, 80);
        assert_eq!(player.inventory.slot(0), None);
    }

    #[test]
    fn empty_slot_fails_the_task_only() {
        let (mut simulation, ids) = sandbox(0, 1);
        let player = ids[0];
        schedule(
            &mut simulation,
            0.0,
            Operation::DropFromInventory {
                entity: player,
                slot: 3,
                count: 1,
            },
        );
        schedule(&mut simulation, 0.0, Operation::Action { entity: player });
        let summary = simulation.advance();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.executed, 2);
    }

    #[test]
    fn unknown_class_fails_creation() {
        let (mut simulation, ids) = sandbox(0, 1);
        schedule(
            &mut simulation,
            0.0,
            Operation::CreateEntity {
                entity: ids[0],
                class: "dragon".to_string(),
            },
        );
        let summary = simulation.advance();
        assert_eq!(summary.failed, 1);
        assert_eq!(simulation.world().len(), 1);
    }

    #[test]
    fn moves_are_clamped_to_the_map() {
        let (mut simulation, ids) = sandbox(0, 1);
        let player = ids[0];
        schedule(
            &mut simulation,
            0.0,
            Operation::Teleport {
                entity: player,
                x: 2,
                y: 2,
            },
        );
        schedule(
            &mut simulation,
            0.1,
            Operation::Move {
                entity: player,
                direction: Direction::West,
                range: 10,
            },
        );
        run(&mut simulation, 10);
        let player = simulation.world().get(player).unwrap();
        assert_eq!((player.x, player.y), (0, 2));
    }
}
