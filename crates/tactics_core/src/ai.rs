//! Enemy turn logic.
//!
//! The director walks the enemy roster once per enemy turn, one unit per
//! pacing interval. Each unit picks the nearest opposing unit, attacks it if
//! it can, and otherwise takes a single greedy step towards it.
//!
//! Pacing only decides *when* a unit acts. With an interval of zero the
//! whole turn runs inside a single tick.

use std::collections::VecDeque;

use crate::battlefield::Battlefield;
use crate::events::BattleEvent;
use crate::math::GridPos;
use crate::rng::RandomSource;
use crate::unit::UnitId;

/// Default pacing between enemy unit actions.
pub const DEFAULT_STEP_MS: u32 = 500;

/// Decision for one enemy unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AiPlan {
    /// Chosen target, if any opposing unit exists.
    pub target: Option<UnitId>,
    /// Cell to step into before attacking.
    pub step: Option<GridPos>,
    /// Whether to attack the target (after the step, if any).
    pub strike: bool,
}

impl AiPlan {
    const IDLE: Self = Self {
        target: None,
        step: None,
        strike: false,
    };
}

/// Decide what `id` does. Pure; the battlefield is not modified.
#[must_use]
pub fn plan(bf: &Battlefield, id: UnitId) -> AiPlan {
    let Some(unit) = bf.unit(id) else {
        return AiPlan::IDLE;
    };

    // min_by_key keeps the first of equal keys, so roster order breaks ties.
    let Some(target) = bf
        .units_of(unit.faction.opponent())
        .min_by_key(|other| unit.position.manhattan(other.position))
    else {
        return AiPlan::IDLE;
    };

    let distance = unit.position.manhattan(target.position);
    if distance <= unit.attack_range {
        return AiPlan {
            target: Some(target.id),
            step: None,
            strike: !unit.has_attacked,
        };
    }
    if unit.has_moved || unit.move_range == 0 {
        return AiPlan {
            target: Some(target.id),
            ..AiPlan::IDLE
        };
    }

    let mut best: Option<(GridPos, u32)> = None;
    for cell in unit.position.orthogonal_neighbors() {
        if !bf.grid().is_open(cell) {
            continue;
        }
        let d = cell.manhattan(target.position);
        let current = best.map_or(distance, |(_, d)| d);
        if d < current {
            best = Some((cell, d));
        }
    }

    AiPlan {
        target: Some(target.id),
        step: best.map(|(cell, _)| cell),
        strike: best.is_some_and(|(_, d)| d <= unit.attack_range) && !unit.has_attacked,
    }
}

/// Paces the enemy turn across ticks.
#[derive(Debug, Clone)]
pub struct AiDirector {
    interval_ms: u32,
    accumulated_ms: u64,
    pending: VecDeque<UnitId>,
}

impl AiDirector {
    /// Create a director acting once every `interval_ms` (0 = all at once).
    #[must_use]
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            accumulated_ms: 0,
            pending: VecDeque::new(),
        }
    }

    /// Pacing interval.
    #[must_use]
    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Queue every unit of the acting roster.
    pub fn begin_turn(&mut self, roster: &[UnitId]) {
        self.pending = roster.iter().copied().collect();
        self.accumulated_ms = 0;
    }

    /// Drop any queued work.
    pub fn cancel(&mut self) {
        self.pending.clear();
        self.accumulated_ms = 0;
    }

    /// Units still waiting to act this turn.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Whether every queued unit has acted.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    /// Accumulate `elapsed_ms` and return how many units may act now.
    pub fn advance(&mut self, elapsed_ms: u64) -> usize {
        if self.interval_ms == 0 {
            return self.pending.len();
        }
        self.accumulated_ms += elapsed_ms;
        let interval = u64::from(self.interval_ms);
        let due = self.accumulated_ms / interval;
        self.accumulated_ms %= interval;
        usize::try_from(due).unwrap_or(usize::MAX).min(self.pending.len())
    }

    /// Let the next queued unit act. Units that died before their slot are
    /// skipped without spending the slot. Returns `false` when the queue is empty.
    pub fn act_next<R: RandomSource + ?Sized>(
        &mut self,
        bf: &mut Battlefield,
        rng: &mut R,
        events: &mut Vec<BattleEvent>,
    ) -> bool {
        while let Some(id) = self.pending.pop_front() {
            if bf.unit(id).is_none() {
                continue;
            }
            execute(bf, id, rng, events);
            return true;
        }
        false
    }
}

fn execute<R: RandomSource + ?Sized>(
    bf: &mut Battlefield,
    id: UnitId,
    rng: &mut R,
    events: &mut Vec<BattleEvent>,
) {
    let decision = plan(bf, id);
    tracing::debug!(unit = %id, ?decision, "AI plan");

    if let Some(to) = decision.step {
        let from = bf.unit(id).map(|u| u.position);
        let distance = bf.move_unit(id, to);
        if let Some(from) = from {
            events.push(BattleEvent::UnitMoved {
                unit: id,
                from,
                to,
                distance,
            });
        }
    }
    if let (true, Some(target)) = (decision.strike, decision.target) {
        let roll = rng.next_fraction();
        bf.apply_attack(id, target, roll, events);
    }
}
