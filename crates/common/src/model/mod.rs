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

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Stable identifier for an entity in the world.
///
/// Scheduled work never holds on to entities themselves, only to their ids. The world resolves
/// an id back to a live entity at execution time, and an id that no longer resolves simply means
/// the entity has gone away.
#[derive(
    Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::EntityId;

    #[test]
    fn display_uses_hash_prefix() {
        assert_eq!(EntityId(42).to_string(), "#42");
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&EntityId(7)).unwrap();
        assert_eq!(json, "7");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, EntityId(7));
    }
}
