//! Formation templates.

use serde::{Deserialize, Serialize};

/// Rectangular search window anchored at a faction's rear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummonArea {
    /// Rows scanned from the anchor.
    pub rows: i32,
    /// Columns scanned from the anchor.
    pub cols: i32,
}

impl SummonArea {
    /// Create a new search window.
    #[must_use]
    pub const fn new(rows: i32, cols: i32) -> Self {
        Self { rows, cols }
    }
}

/// Formation parameters as authored in the catalog.
///
/// Which fields matter depends on the formation's `effect_type`; absent
/// values fall back to the defaults documented on [`FormationEffect`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationParams {
    /// Unit template summoned (reinforcement, elite summon).
    #[serde(default)]
    pub unit: Option<String>,
    /// Number of units summoned (reinforcement).
    #[serde(default)]
    pub count: Option<u32>,
    /// Health granted to adjacent summoned units (reinforcement).
    #[serde(default)]
    pub health_bonus: Option<u32>,
    /// Flat attack bonus (elite summon, mobility boost).
    #[serde(default)]
    pub attack_bonus: Option<u32>,
    /// Extra move range (mobility boost).
    #[serde(default)]
    pub move_bonus: Option<u32>,
    /// New display name of the promoted unit (mobility boost).
    #[serde(default)]
    pub promoted_name: Option<String>,
    /// Unit templates eligible for conversion.
    #[serde(default)]
    pub eligible_units: Vec<String>,
    /// Maximum number of units converted.
    #[serde(default)]
    pub max_targets: Option<u32>,
    /// Search window for summoning.
    #[serde(default)]
    pub area: Option<SummonArea>,
}

/// Typed formation effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationEffect {
    /// Summon `count` basic units near the rear (default 3 in a 3x3 window);
    /// each summoned unit touching another of the same kind gains
    /// `health_bonus` (default 3).
    Reinforcement {
        /// Template summoned.
        unit: String,
        /// Units summoned.
        count: u32,
        /// Adjacency health bonus.
        health_bonus: u32,
        /// Search window.
        area: SummonArea,
    },
    /// Summon one elite unit in the first open cell of the window
    /// (default 2x2) with `attack_bonus` (default 2).
    EliteSummon {
        /// Template summoned.
        unit: String,
        /// Flat attack bonus.
        attack_bonus: u32,
        /// Search window.
        area: SummonArea,
    },
    /// Promote the first unpromoted cavalry unit of the roster.
    MobilityBoost {
        /// New display name.
        promoted_name: String,
        /// Flat attack bonus (default 2).
        attack_bonus: u32,
        /// Extra move range (default 1).
        move_bonus: u32,
    },
    /// Re-own up to `max_targets` (default 2) opposing units whose template
    /// is listed in `eligible_units`.
    Conversion {
        /// Eligible template ids.
        eligible_units: Vec<String>,
        /// Conversion cap.
        max_targets: u32,
    },
    /// A formation type this engine has no rules for.
    Unknown(String),
}

/// Data-driven formation definition.
///
/// # Example RON
///
/// ```ron
/// FormationTemplate(
///     id: "zhong",
///     name: "Massed Levy",
///     glyph: "众",
///     effect_type: "reinforcement",
///     params: (unit: "militia", count: 3, health_bonus: 3),
///     cooldown: 3,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormationTemplate {
    /// Unique string identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Oracle-bone glyph shown on the formation button.
    #[serde(default)]
    pub glyph: String,

    /// Free-text effect description.
    #[serde(default)]
    pub description: String,

    /// Effect key: `reinforcement`, `elite_summon`, `mobility_boost` or `conversion`.
    pub effect_type: String,

    /// Effect parameters.
    #[serde(default)]
    pub params: FormationParams,

    /// Buff granted to every unit the effect summons, promotes or converts.
    #[serde(default)]
    pub buff: Option<String>,

    /// Cooldown in turn transitions.
    #[serde(default = "default_cooldown")]
    pub cooldown: u32,
}

/// Default formation cooldown.
const fn default_cooldown() -> u32 {
    3
}

impl FormationTemplate {
    /// Resolve the typed effect.
    ///
    /// Returns `None` when a summon formation does not name its unit.
    #[must_use]
    pub fn effect(&self) -> Option<FormationEffect> {
        let p = &self.params;
        let effect = match self.effect_type.as_str() {
            "reinforcement" => FormationEffect::Reinforcement {
                unit: p.unit.clone()?,
                count: p.count.unwrap_or(3),
                health_bonus: p.health_bonus.unwrap_or(3),
                area: p.area.unwrap_or(SummonArea::new(3, 3)),
            },
            "elite_summon" => FormationEffect::EliteSummon {
                unit: p.unit.clone()?,
                attack_bonus: p.attack_bonus.unwrap_or(2),
                area: p.area.unwrap_or(SummonArea::new(2, 2)),
            },
            "mobility_boost" => FormationEffect::MobilityBoost {
                promoted_name: p
                    .promoted_name
                    .clone()
                    .unwrap_or_else(|| "Charioteer".to_string()),
                attack_bonus: p.attack_bonus.unwrap_or(2),
                move_bonus: p.move_bonus.unwrap_or(1),
            },
            "conversion" => FormationEffect::Conversion {
                eligible_units: p.eligible_units.clone(),
                max_targets: p.max_targets.unwrap_or(2),
            },
            other => FormationEffect::Unknown(other.to_string()),
        };
        Some(effect)
    }

    /// Unit templates this formation references.
    pub fn referenced_units(&self) -> impl Iterator<Item = &str> {
        self.params
            .unit
            .iter()
            .chain(self.params.eligible_units.iter())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinforcement_defaults() {
        let ron = r#"FormationTemplate(
            id: "zhong",
            name: "Massed Levy",
            glyph: "众",
            effect_type: "reinforcement",
            params: (unit: "militia"),
        )"#;
        let template: FormationTemplate = crate::data::ron_options().from_str(ron).unwrap();
        assert_eq!(template.cooldown, 3);
        assert_eq!(
            template.effect(),
            Some(FormationEffect::Reinforcement {
                unit: "militia".to_string(),
                count: 3,
                health_bonus: 3,
                area: SummonArea::new(3, 3),
            })
        );
    }

    #[test]
    fn test_summon_without_unit_is_invalid() {
        let template = FormationTemplate {
            id: "fa".to_string(),
            name: "Vanguard".to_string(),
            glyph: String::new(),
            description: String::new(),
            effect_type: "elite_summon".to_string(),
            params: FormationParams::default(),
            buff: None,
            cooldown: 3,
        };
        assert_eq!(template.effect(), None);
    }

    #[test]
    fn test_referenced_units() {
        let template = FormationTemplate {
            id: "hua".to_string(),
            name: "Turncoats".to_string(),
            glyph: String::new(),
            description: String::new(),
            effect_type: "conversion".to_string(),
            params: FormationParams {
                eligible_units: vec!["militia".to_string(), "infantry".to_string()],
                ..FormationParams::default()
            },
            buff: None,
            cooldown: 3,
        };
        let refs: Vec<_> = template.referenced_units().collect();
        assert_eq!(refs, vec!["militia", "infantry"]);
    }
}
