//! Test fixtures and helpers.
//!
//! Pre-built catalogs, scenarios and random sources for consistent
//! testing.

use std::sync::Arc;

use fixed::types::I32F32;
use tactics_core::data::{
    BuffTemplate, Catalog, EffectDetails, FormationParams, FormationTemplate, Trait, UnitClass,
    UnitTemplate,
};
use tactics_core::math::{Fixed, GridPos};
use tactics_core::rng::{FixedRoll, RandomSource};
use tactics_core::scenario::{Placement, Scenario};
use tactics_core::turn::TurnController;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In engine code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// A draw that never lands under any critical chance.
#[must_use]
pub fn no_crit() -> FixedRoll {
    FixedRoll(Fixed::ONE - Fixed::DELTA)
}

/// A draw that lands under every non-zero critical chance.
#[must_use]
pub fn always_crit() -> FixedRoll {
    FixedRoll(Fixed::ZERO)
}

// ========================================
// Random sources
// ========================================

/// Replays a fixed list of draws, cycling when it runs out.
///
/// An empty script behaves like [`no_crit`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    rolls: Vec<Fixed>,
    cursor: usize,
}

impl ScriptedRolls {
    /// Create a source replaying `rolls` in order.
    #[must_use]
    pub fn new(rolls: Vec<Fixed>) -> Self {
        Self { rolls, cursor: 0 }
    }

    /// Number of draws taken so far.
    #[must_use]
    pub const fn draws(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRolls {
    fn next_fraction(&mut self) -> Fixed {
        let roll = if self.rolls.is_empty() {
            Fixed::ONE - Fixed::DELTA
        } else {
            self.rolls[self.cursor % self.rolls.len()]
        };
        self.cursor += 1;
        roll
    }
}

// ========================================
// Templates
// ========================================

/// A plain infantry template: range 1, move 2, no crits, no traits.
#[must_use]
pub fn unit_template(id: &str, health: u32, attack: u32) -> UnitTemplate {
    UnitTemplate {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        class: UnitClass::Infantry,
        health,
        attack,
        attack_range: 1,
        move_range: 2,
        attack_speed: Fixed::ONE,
        critical_chance: Fixed::ZERO,
        traits: Vec::new(),
    }
}

/// Build a unit template carrying `traits`.
#[must_use]
pub fn with_traits(mut template: UnitTemplate, traits: &[Trait]) -> UnitTemplate {
    template.traits = traits.to_vec();
    template
}

/// A damage reduction buff.
#[must_use]
pub fn damage_reduction_buff(id: &str, reduction: Fixed, duration: u32) -> BuffTemplate {
    BuffTemplate {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        effect_type: "damage_reduction".to_string(),
        effect: EffectDetails {
            damage_reduction: Some(reduction),
            ..EffectDetails::default()
        },
        duration,
        max_stacks: 1,
    }
}

/// A reinforcement formation summoning `count` copies of `unit`.
#[must_use]
pub fn reinforcement_formation(id: &str, unit: &str, count: u32, cooldown: u32) -> FormationTemplate {
    FormationTemplate {
        id: id.to_string(),
        name: id.to_string(),
        glyph: String::new(),
        description: String::new(),
        effect_type: "reinforcement".to_string(),
        params: FormationParams {
            unit: Some(unit.to_string()),
            count: Some(count),
            ..FormationParams::default()
        },
        buff: None,
        cooldown,
    }
}

/// Builder for in-memory catalogs.
///
/// # Example
///
/// ```
/// use tactics_test_utils::fixtures::{unit_template, CatalogBuilder};
///
/// let catalog = CatalogBuilder::new()
///     .unit(unit_template("soldier", 10, 3))
///     .build();
/// assert!(catalog.unit("soldier").is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    /// Start from an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit template.
    #[must_use]
    pub fn unit(mut self, template: UnitTemplate) -> Self {
        self.catalog.units.push(template);
        self
    }

    /// Add a buff template.
    #[must_use]
    pub fn buff(mut self, template: BuffTemplate) -> Self {
        self.catalog.buffs.push(template);
        self
    }

    /// Add a formation template.
    #[must_use]
    pub fn formation(mut self, template: FormationTemplate) -> Self {
        self.catalog.formations.push(template);
        self
    }

    /// Finish and share.
    #[must_use]
    pub fn build(self) -> Arc<Catalog> {
        Arc::new(self.catalog)
    }
}

/// The Oracle War catalog, as shipped with the headless runner.
pub const ORACLE_WAR_CATALOG: &str = include_str!("../../tactics_headless/assets/data/catalog.ron");

/// Parse [`ORACLE_WAR_CATALOG`].
///
/// # Panics
///
/// Panics if the embedded catalog is invalid.
#[must_use]
pub fn oracle_war_catalog() -> Arc<Catalog> {
    let catalog = Catalog::from_ron_str(ORACLE_WAR_CATALOG, "<fixture>")
        .unwrap_or_else(|e| panic!("fixture catalog is invalid: {e}"));
    Arc::new(catalog)
}

/// A catalog with a 10 hp soldier, a 50 hp brute hitting for 100, a 0.5
/// damage reduction buff and a one-unit reinforcement on a 2 turn cooldown.
#[must_use]
pub fn duel_catalog() -> Arc<Catalog> {
    CatalogBuilder::new()
        .unit(unit_template("soldier", 10, 3))
        .unit(unit_template("brute", 50, 100))
        .buff(damage_reduction_buff("guard", fixed_f(0.5), 1))
        .formation(reinforcement_formation("levy", "soldier", 1, 2))
        .build()
}

// ========================================
// Scenarios
// ========================================

/// An open field with rears in opposite corners, synchronous AI and seed 0.
#[must_use]
pub fn skirmish(rows: i32, cols: i32, player: Vec<Placement>, enemy: Vec<Placement>) -> Scenario {
    Scenario {
        name: "skirmish".to_string(),
        rows,
        cols,
        terrain: Vec::new(),
        player_units: player,
        enemy_units: enemy,
        formations: Vec::new(),
        player_rear: GridPos::new(rows - 1, 0),
        enemy_rear: GridPos::new(0, cols - 1),
        ai_step_ms: 0,
        seed: 0,
    }
}

/// A controller whose attacks never crit.
///
/// # Panics
///
/// Panics if the scenario does not build against the catalog.
#[must_use]
pub fn controller(catalog: Arc<Catalog>, scenario: Scenario) -> TurnController<FixedRoll> {
    TurnController::with_rng(catalog, scenario, no_crit())
        .unwrap_or_else(|e| panic!("fixture scenario failed to build: {e}"))
}
