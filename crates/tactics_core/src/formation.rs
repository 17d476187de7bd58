//! Cooldown-gated formation abilities.
//!
//! A formation performs exactly one roster-level effect per activation.
//! Effects that find no valid cell or unit are silent no-ops, but the
//! cooldown is consumed either way.

use serde::{Deserialize, Serialize};

use crate::battlefield::Battlefield;
use crate::data::{FormationEffect, FormationTemplate, SummonArea, UnitClass};
use crate::events::BattleEvent;
use crate::factions::Faction;
use crate::math::GridPos;
use crate::unit::UnitId;

/// A formation available in this battle and its cooldown counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationState {
    /// Catalog template.
    pub template: FormationTemplate,
    /// Turn transitions left before it can fire again.
    pub cooldown_remaining: u32,
}

impl FormationState {
    /// A ready formation.
    #[must_use]
    pub fn new(template: FormationTemplate) -> Self {
        Self {
            template,
            cooldown_remaining: 0,
        }
    }

    /// Formation id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.template.id
    }

    /// Whether the cooldown has run out.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.cooldown_remaining == 0
    }

    /// Start the full cooldown.
    pub fn trigger(&mut self) {
        self.cooldown_remaining = self.template.cooldown;
    }

    /// Count the cooldown down by one.
    pub fn tick_cooldown(&mut self) {
        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(1);
    }
}

/// What an activation did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormationOutcome {
    /// New units were created.
    Summoned {
        /// Summoned units.
        units: Vec<UnitId>,
    },
    /// An existing unit was promoted.
    Promoted {
        /// Promoted unit.
        unit: UnitId,
    },
    /// Opposing units changed sides.
    Converted {
        /// Converted units.
        units: Vec<UnitId>,
    },
    /// Nothing qualified.
    NoEffect,
}

/// Run a formation's effect for `faction`.
pub fn execute(
    bf: &mut Battlefield,
    template: &FormationTemplate,
    faction: Faction,
    events: &mut Vec<BattleEvent>,
) -> FormationOutcome {
    let Some(effect) = template.effect() else {
        return FormationOutcome::NoEffect;
    };

    let outcome = match effect {
        FormationEffect::Reinforcement {
            unit,
            count,
            health_bonus,
            area,
        } => reinforce(bf, &unit, count, health_bonus, area, faction, events),
        FormationEffect::EliteSummon {
            unit,
            attack_bonus,
            area,
        } => summon_elite(bf, &unit, attack_bonus, area, faction, events),
        FormationEffect::MobilityBoost {
            promoted_name,
            attack_bonus,
            move_bonus,
        } => promote(bf, &promoted_name, attack_bonus, move_bonus, faction, events),
        FormationEffect::Conversion {
            eligible_units,
            max_targets,
        } => convert(bf, &eligible_units, max_targets, faction, events),
        FormationEffect::Unknown(kind) => {
            tracing::warn!(formation = %template.id, kind = %kind, "Formation kind has no effect");
            FormationOutcome::NoEffect
        }
    };

    if outcome == FormationOutcome::NoEffect {
        tracing::warn!(formation = %template.id, "Formation found no target");
    } else if let Some(buff) = &template.buff {
        for id in affected_units(&outcome) {
            if let Err(rejection) = bf.apply_buff(id, buff, events) {
                tracing::warn!(formation = %template.id, buff = %buff, %rejection, "Formation buff not applied");
            }
        }
    }
    outcome
}

fn affected_units(outcome: &FormationOutcome) -> Vec<UnitId> {
    match outcome {
        FormationOutcome::Summoned { units } | FormationOutcome::Converted { units } => units.clone(),
        FormationOutcome::Promoted { unit } => vec![*unit],
        FormationOutcome::NoEffect => Vec::new(),
    }
}

fn summon_cells(bf: &Battlefield, faction: Faction, area: SummonArea, count: usize) -> Vec<GridPos> {
    bf.grid()
        .open_cells_in(bf.rear(faction), area.rows, area.cols)
        .take(count)
        .collect()
}

fn spawn(
    bf: &mut Battlefield,
    template_id: &str,
    faction: Faction,
    pos: GridPos,
    events: &mut Vec<BattleEvent>,
) -> Option<UnitId> {
    match bf.spawn_unit(template_id, faction, pos) {
        Ok(id) => {
            events.push(BattleEvent::UnitSummoned {
                unit: id,
                template: template_id.to_string(),
                position: pos,
                faction,
            });
            Some(id)
        }
        Err(e) => {
            tracing::warn!(unit = template_id, %pos, error = %e, "Summon failed");
            None
        }
    }
}

fn reinforce(
    bf: &mut Battlefield,
    template_id: &str,
    count: u32,
    health_bonus: u32,
    area: SummonArea,
    faction: Faction,
    events: &mut Vec<BattleEvent>,
) -> FormationOutcome {
    let cells = summon_cells(bf, faction, area, count as usize);
    let summoned: Vec<UnitId> = cells
        .into_iter()
        .filter_map(|pos| spawn(bf, template_id, faction, pos, events))
        .collect();
    if summoned.is_empty() {
        return FormationOutcome::NoEffect;
    }

    // Decide every bonus before granting any.
    let bonused: Vec<UnitId> = summoned
        .iter()
        .filter(|id| {
            bf.unit(**id).is_some_and(|unit| {
                unit.position.surrounding().iter().any(|pos| {
                    bf.unit_at(*pos).is_some_and(|other| {
                        summoned.contains(&other.id) && other.template_id == unit.template_id
                    })
                })
            })
        })
        .copied()
        .collect();
    for id in bonused {
        if let Some(unit) = bf.unit_mut(id) {
            unit.grant_health(health_bonus);
        }
    }

    FormationOutcome::Summoned { units: summoned }
}

fn summon_elite(
    bf: &mut Battlefield,
    template_id: &str,
    attack_bonus: u32,
    area: SummonArea,
    faction: Faction,
    events: &mut Vec<BattleEvent>,
) -> FormationOutcome {
    let Some(pos) = summon_cells(bf, faction, area, 1).into_iter().next() else {
        return FormationOutcome::NoEffect;
    };
    let Some(id) = spawn(bf, template_id, faction, pos, events) else {
        return FormationOutcome::NoEffect;
    };
    if let Some(unit) = bf.unit_mut(id) {
        unit.attack = unit.attack.saturating_add(attack_bonus);
    }
    FormationOutcome::Summoned { units: vec![id] }
}

fn promote(
    bf: &mut Battlefield,
    promoted_name: &str,
    attack_bonus: u32,
    move_bonus: u32,
    faction: Faction,
    events: &mut Vec<BattleEvent>,
) -> FormationOutcome {
    let candidate = bf
        .units_of(faction)
        .find(|u| u.class == UnitClass::Cavalry && !u.promoted)
        .map(|u| u.id);
    let Some(id) = candidate else {
        return FormationOutcome::NoEffect;
    };
    let Some(unit) = bf.unit_mut(id) else {
        return FormationOutcome::NoEffect;
    };
    unit.name = promoted_name.to_string();
    unit.attack = unit.attack.saturating_add(attack_bonus);
    unit.move_range = unit.move_range.saturating_add(move_bonus);
    unit.pursuit_ready = true;
    unit.promoted = true;
    events.push(BattleEvent::UnitPromoted {
        unit: id,
        name: promoted_name.to_string(),
    });
    FormationOutcome::Promoted { unit: id }
}

fn convert(
    bf: &mut Battlefield,
    eligible: &[String],
    max_targets: u32,
    faction: Faction,
    events: &mut Vec<BattleEvent>,
) -> FormationOutcome {
    let targets: Vec<UnitId> = bf
        .units_of(faction.opponent())
        .filter(|u| eligible.contains(&u.template_id))
        .take(max_targets as usize)
        .map(|u| u.id)
        .collect();
    if targets.is_empty() {
        return FormationOutcome::NoEffect;
    }
    for id in &targets {
        bf.transfer_unit(*id, faction);
        // Turncoats sit out the turn they defect on.
        bf.exhaust(*id);
        events.push(BattleEvent::UnitConverted {
            unit: *id,
            faction,
        });
    }
    FormationOutcome::Converted { units: targets }
}
