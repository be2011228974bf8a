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

use crate::tasks::ActionGate;
use tickworld_common::model::EntityId;

/// The scheduler's view of the entity registry.
///
/// Tasks carry only entity ids. Before a task runs, the simulation asks the world whether the
/// entities it names still exist; action gates live on the entities themselves and are reached
/// through here as well.
pub trait World: Send + 'static {
    fn contains(&self, entity: EntityId) -> bool;

    fn action_gate(&self, entity: EntityId) -> Option<&ActionGate>;

    fn action_gate_mut(&mut self, entity: EntityId) -> Option<&mut ActionGate>;
}
