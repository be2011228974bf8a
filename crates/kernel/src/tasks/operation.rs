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

//! The closed vocabulary of deferred work.
//!
//! Every task names one [`Operation`]: a tag plus a typed argument record that refers to
//! entities by id only. Persistence stores the tag and the arguments. Behaviour is attached at
//! runtime by registering a handler per [`OperationTag`] in an [`OperationRegistry`].

use crate::task_context::TaskContext;
use crate::tasks::action_gate::ActionKind;
use crate::tasks::task::TaskError;
use crate::world::World;
use ahash::AHasher;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::BuildHasherDefault;
use strum::{Display, EnumCount, EnumDiscriminants, EnumIter, IntoStaticStr};
use tickworld_common::model::EntityId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumCount,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn offset(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, EnumDiscriminants, IntoStaticStr)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[strum_discriminants(name(OperationTag), derive(Hash, EnumIter))]
pub enum Operation {
    /// Restore a permit closed by an accepted action request. Handled by the simulation itself.
    ReopenGate { entity: EntityId, kind: ActionKind },
    Spawn { entity: EntityId },
    Despawn { entity: EntityId },
    Move {
        entity: EntityId,
        direction: Direction,
        range: u32,
    },
    Teleport { entity: EntityId, x: i32, y: i32 },
    Action { entity: EntityId },
    AddHealth { entity: EntityId, amount: i32 },
    MakeInvincible { entity: EntityId, seconds: f64 },
    ClearInvincible { entity: EntityId },
    /// `entity` is the creator; the new entity is placed at its position.
    CreateEntity { entity: EntityId, class: String },
    AddToPurse { entity: EntityId, gold: u64 },
    DropFromPurse { entity: EntityId, gold: u64 },
    AddToInventory { entity: EntityId, item: String },
    ConsumeFromInventory { entity: EntityId, slot: usize },
    DropFromInventory {
        entity: EntityId,
        slot: usize,
        count: u32,
    },
    Think { entity: EntityId },
}

impl Operation {
    pub fn tag(&self) -> OperationTag {
        OperationTag::from(self)
    }

    /// Stable snake_case name, as used in persisted records and logs.
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// The entity the operation acts on.
    pub fn subject(&self) -> EntityId {
        match self {
            Operation::ReopenGate { entity, .. }
            | Operation::Spawn { entity }
            | Operation::Despawn { entity }
            | Operation::Move { entity, .. }
            | Operation::Teleport { entity, .. }
            | Operation::Action { entity }
            | Operation::AddHealth { entity, .. }
            | Operation::MakeInvincible { entity, .. }
            | Operation::ClearInvincible { entity }
            | Operation::CreateEntity { entity, .. }
            | Operation::AddToPurse { entity, .. }
            | Operation::DropFromPurse { entity, .. }
            | Operation::AddToInventory { entity, .. }
            | Operation::ConsumeFromInventory { entity, .. }
            | Operation::DropFromInventory { entity, .. }
            | Operation::Think { entity } => *entity,
        }
    }
}

pub type OperationHandler<W> =
    Box<dyn Fn(&mut TaskContext<'_, W>, &Operation) -> Result<(), TaskError> + Send>;

/// Lookup table from operation tag to behaviour. Populated explicitly by the host at startup.
pub struct OperationRegistry<W: World> {
    handlers: HashMap<OperationTag, OperationHandler<W>, BuildHasherDefault<AHasher>>,
}

impl<W: World> Default for OperationRegistry<W> {
    fn default() -> Self {
        Self {
            handlers: HashMap::default(),
        }
    }
}

impl<W: World> OperationRegistry<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `handler` to `tag`, replacing any previous registration.
    pub fn register<F>(&mut self, tag: OperationTag, handler: F) -> &mut Self
    where
        F: Fn(&mut TaskContext<'_, W>, &Operation) -> Result<(), TaskError> + Send + 'static,
    {
        self.handlers.insert(tag, Box::new(handler));
        self
    }

    pub fn contains(&self, tag: OperationTag) -> bool {
        self.handlers.contains_key(&tag)
    }

    pub fn dispatch(
        &self,
        ctx: &mut TaskContext<'_, W>,
        operation: &Operation,
    ) -> Result<(), TaskError> {
        let tag = operation.tag();
        let handler = self.handlers.get(&tag).ok_or(TaskError::NoHandler(tag))?;
        handler(ctx, operation)
    }
}
