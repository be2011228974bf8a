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

//! Per-entity debounce for mutating operations.
//!
//! Each entity carries one permit per [`ActionKind`]. An accepted request closes the permit until
//! the kind's cost has elapsed, queues the effect for the next tick and queues a `ReopenGate`
//! task in the last batch of the closed period. Requests against a closed permit are dropped.
//!
//! Whether a permit is open is decided from the tick it reopens at, never from the position of
//! the `ReopenGate` task inside its batch. The task marks the end of the closed period and is
//! what a restored snapshot rebuilds closed permits from.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter};
use tickworld_common::model::EntityId;
use tickworld_common::tasks::{SchedulerError, Tick};
use tracing::trace;

use crate::tasks::operation::Operation;
use crate::tasks::timeline::Timeline;
use crate::world::World;

/// Cooldown, in seconds, of every kind unless configured otherwise.
pub const DEFAULT_ACTION_COST: f64 = 0.1;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Move,
    Action,
    Inventory,
    Purse,
    Create,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Permit {
    /// First tick at which a request is accepted again.
    reopens_at: Tick,
    cost_seconds: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionGate {
    permits: [Permit; ActionKind::COUNT],
}

impl Default for ActionGate {
    fn default() -> Self {
        Self::with_uniform_cost(DEFAULT_ACTION_COST)
    }
}

impl ActionGate {
    pub fn with_uniform_cost(cost_seconds: f64) -> Self {
        Self {
            permits: [Permit {
                reopens_at: 0,
                cost_seconds,
            }; ActionKind::COUNT],
        }
    }

    pub fn with_cost(mut self, kind: ActionKind, cost_seconds: f64) -> Self {
        self.set_cost(kind, cost_seconds);
        self
    }

    pub fn cost(&self, kind: ActionKind) -> f64 {
        self.permits[kind as usize].cost_seconds
    }

    pub fn set_cost(&mut self, kind: ActionKind, cost_seconds: f64) {
        self.permits[kind as usize].cost_seconds = cost_seconds;
    }

    pub fn is_open(&self, kind: ActionKind, now: Tick) -> bool {
        now >= self.permits[kind as usize].reopens_at
    }

    pub fn reopens_at(&self, kind: ActionKind) -> Tick {
        self.permits[kind as usize].reopens_at
    }

    /// Keep the permit closed for requests made before `until`. Never shortens a closed period.
    pub(crate) fn close_until(&mut self, kind: ActionKind, until: Tick) {
        let permit = &mut self.permits[kind as usize];
        permit.reopens_at = permit.reopens_at.max(until);
    }
}

/// Try to start `effect` under the `kind` permit of `entity`.
///
/// With a cost of `c` ticks, an acceptance while the clock reads `t` denies requests made while
/// the clock reads `t..t+c` and accepts the first one made at `t+c`, wherever it falls inside a
/// batch. The `ReopenGate` task runs in the batch of tick `t+c-1`, the last one executed before
/// the clock reads `t+c`. A cost below one tick closes nothing.
pub(crate) fn request<W: World>(
    timeline: &mut Timeline,
    world: &mut W,
    entity: EntityId,
    kind: ActionKind,
    effect: Operation,
) -> Result<bool, SchedulerError> {
    let now = timeline.current_tick();
    let gate = world
        .action_gate_mut(entity)
        .ok_or(SchedulerError::EntityNotFound(entity))?;
    if !gate.is_open(kind, now) {
        trace!(
            %entity,
            %kind,
            now,
            reopens_at = gate.reopens_at(kind),
            "Action denied, gate closed"
        );
        return Ok(false);
    }
    let cost_ticks = timeline.clock().ticks_for(gate.cost(kind))?;
    if cost_ticks > 0 {
        let reopens_at = now + cost_ticks;
        gate.close_until(kind, reopens_at);
        timeline.schedule_at(
            reopens_at - 1,
            Operation::ReopenGate { entity, kind },
            Some(entity),
            None,
        );
    }
    timeline.schedule_at(now, effect, Some(entity), None);
    trace!(%entity, %kind, now, cost_ticks, "Action accepted");
    Ok(true)
}

/// The tick a permit reopens at, given the batch its `ReopenGate` task is queued on.
pub(crate) fn reopen_tick(reopen_task_tick: Tick) -> Tick {
    reopen_task_tick + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::clock::TickClock;
    use crate::tasks::entropy::{DeterministicRng, EntropyPool};
    use crate::testing::MockWorld;
    use strum::IntoEnumIterator;

    fn timeline() -> Timeline {
        Timeline::new(
            TickClock::new(60),
            DeterministicRng::from_seed(1),
            EntropyPool::default(),
        )
    }

    #[test]
    fn kinds_are_independent() {
        let mut gate = ActionGate::default().with_cost(ActionKind::Purse, 2.0);
        gate.close_until(ActionKind::Move, 6);
        assert!(!gate.is_open(ActionKind::Move, 5));
        for kind in ActionKind::iter().filter(|k| *k != ActionKind::Move) {
            assert!(gate.is_open(kind, 0), "{kind} should be open");
        }
        assert_eq!(gate.cost(ActionKind::Purse), 2.0);
        assert_eq!(gate.cost(ActionKind::Create), DEFAULT_ACTION_COST);
        assert!(gate.is_open(ActionKind::Move, 6));
    }

    #[test]
    fn closing_never_shortens_a_closed_period() {
        let mut gate = ActionGate::default();
        gate.close_until(ActionKind::Action, 12);
        gate.close_until(ActionKind::Action, 8);
        assert_eq!(gate.reopens_at(ActionKind::Action), 12);
    }

    #[test]
    fn accepted_request_queues_reopen_then_effect() {
        let entity = EntityId(1);
        let mut world = MockWorld::with_entities([entity]);
        let mut tl = timeline();
        let effect = Operation::Move {
            entity,
            direction: crate::tasks::Direction::North,
            range: 1,
        };
        assert!(request(&mut tl, &mut world, entity, ActionKind::Move, effect.clone()).unwrap());
        assert!(!request(&mut tl, &mut world, entity, ActionKind::Move, effect.clone()).unwrap());

        let queued: Vec<_> = tl
            .queue()
            .iter()
            .map(|(tick, t)| (tick, t.operation().clone()))
            .collect();
        assert_eq!(
            queued,
            vec![
                (0, effect),
                (
                    5,
                    Operation::ReopenGate {
                        entity,
                        kind: ActionKind::Move
                    }
                ),
            ]
        );
    }

    #[test]
    fn sub_tick_cost_closes_nothing() {
        let entity = EntityId(3);
        let mut world = MockWorld::default();
        world.add_entity_with_gate(
            entity,
            ActionGate::default().with_cost(ActionKind::Action, 0.001),
        );
        let mut tl = timeline();
        let effect = Operation::Action { entity };
        assert!(request(&mut tl, &mut world, entity, ActionKind::Action, effect.clone()).unwrap());
        assert!(request(&mut tl, &mut world, entity, ActionKind::Action, effect.clone()).unwrap());
        let queued: Vec<_> = tl
            .queue()
            .iter()
            .map(|(tick, t)| (tick, t.operation().clone()))
            .collect();
        assert_eq!(queued, vec![(0, effect.clone()), (0, effect)]);
    }

    #[test]
    fn unknown_entity_is_an_error() {
        let mut world = MockWorld::default();
        let mut tl = timeline();
        let result = request(
            &mut tl,
            &mut world,
            EntityId(5),
            ActionKind::Action,
            Operation::Action {
                entity: EntityId(5),
            },
        );
        assert_eq!(result, Err(SchedulerError::EntityNotFound(EntityId(5))));
    }
}
