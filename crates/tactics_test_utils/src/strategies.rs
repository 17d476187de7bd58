//! Proptest strategies for battle inputs.

use proptest::prelude::*;
use tactics_core::data::{Trait, UnitClass, UnitTemplate};
use tactics_core::events::BattleEvent;
use tactics_core::math::{percent, Fixed, GridPos};
use tactics_core::rng::RandomSource;
use tactics_core::turn::TurnController;

/// A host command, as a property test issues it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BattleCommand {
    /// Select the unit on a cell.
    Select(GridPos),
    /// Move the selection.
    Move(GridPos),
    /// Attack with the selection.
    Attack(GridPos),
    /// Arm or fire a formation.
    Formation(String),
    /// Pass the player turn.
    EndTurn,
    /// Advance AI pacing.
    Tick(u64),
}

impl BattleCommand {
    /// Issue the command. Rejections yield no events.
    pub fn apply<R: RandomSource>(&self, tc: &mut TurnController<R>) -> Vec<BattleEvent> {
        let result = match self {
            Self::Select(pos) => tc.select_unit(*pos),
            Self::Move(pos) => tc.request_move(*pos),
            Self::Attack(pos) => tc.request_attack(*pos),
            Self::Formation(id) => tc.activate_formation(id),
            Self::EndTurn => tc.end_turn(),
            Self::Tick(ms) => Ok(tc.tick(*ms)),
        };
        result.unwrap_or_default()
    }
}

/// Any cell of a `rows` x `cols` grid, plus a one-cell border outside it.
pub fn arb_grid_pos(rows: i32, cols: i32) -> impl Strategy<Value = GridPos> {
    (-1..=rows, -1..=cols).prop_map(|(row, col)| GridPos::new(row, col))
}

/// A random draw in `[0, 1)`.
pub fn arb_fraction() -> impl Strategy<Value = Fixed> {
    any::<u32>().prop_map(|bits| Fixed::from_bits(i64::from(bits)))
}

/// A fraction in whole percent, `0..=max`.
pub fn arb_percent(max: i32) -> impl Strategy<Value = Fixed> {
    (0..=max).prop_map(percent)
}

fn arb_trait() -> impl Strategy<Value = Trait> {
    prop_oneof![
        Just(Trait::DeepStrike),
        Just(Trait::Precision),
        Just(Trait::Steadfast),
        Just(Trait::Fragile),
        Just(Trait::Unknown("mystery".to_string())),
    ]
}

fn arb_class() -> impl Strategy<Value = UnitClass> {
    prop_oneof![
        Just(UnitClass::Infantry),
        Just(UnitClass::Cavalry),
        Just(UnitClass::Archer),
    ]
}

/// A valid unit template with arbitrary stats and traits.
pub fn arb_unit_template() -> impl Strategy<Value = UnitTemplate> {
    (
        arb_class(),
        1u32..200,
        0u32..80,
        1u32..4,
        0u32..5,
        arb_percent(100),
        prop::collection::vec(arb_trait(), 0..3),
    )
        .prop_map(
            |(class, health, attack, attack_range, move_range, critical_chance, traits)| {
                UnitTemplate {
                    id: "arb".to_string(),
                    name: "Arbitrary".to_string(),
                    description: String::new(),
                    class,
                    health,
                    attack,
                    attack_range,
                    move_range,
                    attack_speed: Fixed::ONE,
                    critical_chance,
                    traits,
                }
            },
        )
}

/// One command aimed at a `rows` x `cols` grid.
pub fn arb_command(rows: i32, cols: i32, formations: Vec<String>) -> BoxedStrategy<BattleCommand> {
    let cell = || arb_grid_pos(rows, cols);
    let basic = prop_oneof![
        4 => cell().prop_map(BattleCommand::Select),
        4 => cell().prop_map(BattleCommand::Move),
        4 => cell().prop_map(BattleCommand::Attack),
        1 => Just(BattleCommand::EndTurn),
        2 => (0u64..2000).prop_map(BattleCommand::Tick),
    ];
    if formations.is_empty() {
        return basic.boxed();
    }
    prop_oneof![
        14 => basic,
        1 => prop::sample::select(formations).prop_map(BattleCommand::Formation),
    ]
    .boxed()
}

/// A command stream of up to `max_len` commands.
pub fn arb_commands(
    rows: i32,
    cols: i32,
    formations: Vec<String>,
    max_len: usize,
) -> impl Strategy<Value = Vec<BattleCommand>> {
    prop::collection::vec(arb_command(rows, cols, formations), 0..max_len)
}
