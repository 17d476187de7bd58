//! Events reported to the render layer.
//!
//! Every command and tick returns the events it caused, in the order they
//! happened. Hosts replay them as animations or log lines; the engine never
//! reads them back.

use serde::{Deserialize, Serialize};

use crate::factions::Faction;
use crate::formation::FormationOutcome;
use crate::math::GridPos;
use crate::turn::BattleOutcome;
use crate::unit::UnitId;

/// Something observable that happened during a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    /// A unit became the selection.
    UnitSelected {
        /// Selected unit.
        unit: UnitId,
    },
    /// A unit changed cells.
    UnitMoved {
        /// Moving unit.
        unit: UnitId,
        /// Origin cell.
        from: GridPos,
        /// Destination cell.
        to: GridPos,
        /// Manhattan distance covered.
        distance: u32,
    },
    /// An attack was resolved.
    AttackResolved {
        /// Attacking unit.
        attacker: UnitId,
        /// Defending unit.
        defender: UnitId,
        /// Damage dealt.
        damage: u32,
        /// Critical hit.
        critical: bool,
        /// Defender health afterwards.
        defender_health: u32,
    },
    /// A unit was removed from the board and its roster.
    UnitDefeated {
        /// Removed unit.
        unit: UnitId,
        /// Its former owner.
        faction: Faction,
    },
    /// A promoted unit earned another move from a kill.
    PursuitTriggered {
        /// Pursuing unit.
        unit: UnitId,
    },
    /// A new buff instance took effect.
    BuffApplied {
        /// Buffed unit.
        unit: UnitId,
        /// Buff template.
        buff: String,
    },
    /// An existing buff gained a stack and a fresh duration.
    BuffStacked {
        /// Buffed unit.
        unit: UnitId,
        /// Buff template.
        buff: String,
        /// Stacks now.
        stacks: u32,
    },
    /// A buff ran out or was removed and its effect reverted.
    BuffExpired {
        /// Formerly buffed unit.
        unit: UnitId,
        /// Buff template.
        buff: String,
    },
    /// A formation was selected and awaits confirmation.
    FormationArmed {
        /// Formation id.
        formation: String,
    },
    /// A formation fired.
    FormationActivated {
        /// Formation id.
        formation: String,
        /// What it did.
        outcome: FormationOutcome,
        /// Cooldown now remaining.
        cooldown: u32,
    },
    /// A formation created a unit.
    UnitSummoned {
        /// New unit.
        unit: UnitId,
        /// Template.
        template: String,
        /// Cell.
        position: GridPos,
        /// Owner.
        faction: Faction,
    },
    /// A unit was promoted.
    UnitPromoted {
        /// Promoted unit.
        unit: UnitId,
        /// New display name.
        name: String,
    },
    /// A unit changed sides.
    UnitConverted {
        /// Converted unit.
        unit: UnitId,
        /// New owner.
        faction: Faction,
    },
    /// A faction's turn began.
    TurnStarted {
        /// Acting faction.
        faction: Faction,
        /// Turn number (player turns count up from 1).
        turn: u32,
    },
    /// The battle reached its terminal state.
    BattleEnded {
        /// Final result.
        outcome: BattleOutcome,
    },
}
