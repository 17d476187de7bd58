//! The template catalog and the capability that supplies it.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{BuffEffect, BuffTemplate, FormationEffect, FormationTemplate, UnitTemplate};
use crate::error::{Result, SetupError};
use crate::math::Fixed;

/// Every template a battle may reference.
///
/// # Example RON
///
/// ```ron
/// Catalog(
///     units: [ UnitTemplate(id: "militia", ...) ],
///     buffs: [ BuffTemplate(id: "shield_wall", ...) ],
///     formations: [ FormationTemplate(id: "zhong", ...) ],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Unit templates.
    #[serde(default)]
    pub units: Vec<UnitTemplate>,
    /// Buff templates.
    #[serde(default)]
    pub buffs: Vec<BuffTemplate>,
    /// Formation templates, in display order.
    #[serde(default)]
    pub formations: Vec<FormationTemplate>,
}

impl Catalog {
    /// Parse a catalog from RON text and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::CatalogParse`] on malformed text, or any
    /// validation error from [`Catalog::validate`].
    pub fn from_ron_str(text: &str, origin: &str) -> Result<Self> {
        let catalog: Self =
            super::ron_options()
                .from_str(text)
                .map_err(|e| SetupError::CatalogParse {
                    origin: origin.to_string(),
                    message: e.to_string(),
                })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Append every template of `other`. Call [`Catalog::validate`] afterwards.
    pub fn extend(&mut self, other: Self) {
        self.units.extend(other.units);
        self.buffs.extend(other.buffs);
        self.formations.extend(other.formations);
    }

    /// Look up a unit template.
    #[must_use]
    pub fn unit(&self, id: &str) -> Option<&UnitTemplate> {
        self.units.iter().find(|u| u.id == id)
    }

    /// Look up a buff template.
    #[must_use]
    pub fn buff(&self, id: &str) -> Option<&BuffTemplate> {
        self.buffs.iter().find(|b| b.id == id)
    }

    /// Look up a formation template.
    #[must_use]
    pub fn formation(&self, id: &str) -> Option<&FormationTemplate> {
        self.formations.iter().find(|f| f.id == id)
    }

    /// Check cross references and value ranges.
    ///
    /// Unrecognised traits, buff kinds and formation kinds are tolerated and
    /// only logged; they resolve to no-op effects at runtime.
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids, out-of-range stats, a recognised effect kind
    /// missing its parameter, or a formation referencing a missing template.
    pub fn validate(&self) -> Result<()> {
        check_unique("unit", self.units.iter().map(|u| u.id.as_str()))?;
        check_unique("buff", self.buffs.iter().map(|b| b.id.as_str()))?;
        check_unique("formation", self.formations.iter().map(|f| f.id.as_str()))?;

        for unit in &self.units {
            if unit.health == 0 {
                return Err(invalid(&unit.id, "health must be positive"));
            }
            if unit.critical_chance < Fixed::ZERO || unit.critical_chance > Fixed::ONE {
                return Err(invalid(&unit.id, "critical_chance must lie in [0, 1]"));
            }
            if unit.attack_speed < Fixed::ZERO {
                return Err(invalid(&unit.id, "attack_speed must not be negative"));
            }
            for name in unit.unknown_traits() {
                tracing::warn!(unit = %unit.id, trait_name = name, "Unrecognised trait ignored");
            }
        }

        for buff in &self.buffs {
            if buff.max_stacks == 0 {
                return Err(invalid(&buff.id, "max_stacks must be at least 1"));
            }
            match buff.effect() {
                None => {
                    return Err(invalid(
                        &buff.id,
                        &format!("effect '{}' is missing its parameter", buff.effect_type),
                    ))
                }
                Some(BuffEffect::Unknown(kind)) => {
                    tracing::warn!(buff = %buff.id, kind = %kind, "Unrecognised buff kind ignored");
                }
                Some(_) => {}
            }
        }

        for formation in &self.formations {
            match formation.effect() {
                None => {
                    return Err(invalid(
                        &formation.id,
                        &format!("effect '{}' needs a unit", formation.effect_type),
                    ))
                }
                Some(FormationEffect::Unknown(kind)) => {
                    tracing::warn!(
                        formation = %formation.id,
                        kind = %kind,
                        "Unrecognised formation kind ignored"
                    );
                }
                Some(_) => {}
            }
            for unit in formation.referenced_units() {
                if self.unit(unit).is_none() {
                    return Err(SetupError::UnknownUnitTemplate(unit.to_string()));
                }
            }
            if let Some(buff) = &formation.buff {
                if self.buff(buff).is_none() {
                    return Err(SetupError::UnknownBuff(buff.clone()));
                }
            }
        }

        Ok(())
    }
}

fn check_unique<'a>(family: &'static str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SetupError::DuplicateId {
                family,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn invalid(id: &str, message: &str) -> SetupError {
    SetupError::InvalidTemplate {
        id: id.to_string(),
        message: message.to_string(),
    }
}

/// Capability that supplies the catalog to a battle.
///
/// The engine never decides where catalog data lives; the host injects a
/// source (in-memory text, files on disk, a bundled asset).
pub trait CatalogSource {
    /// Load and validate a catalog.
    ///
    /// # Errors
    ///
    /// Returns a [`SetupError`] when the data cannot be read, parsed or validated.
    fn load(&self) -> Result<Catalog>;
}

/// Catalog source backed by RON text held in memory.
#[derive(Debug, Clone)]
pub struct RonCatalogSource {
    text: String,
    origin: String,
}

impl RonCatalogSource {
    /// Wrap RON text; `origin` labels parse errors.
    pub fn new(text: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: origin.into(),
        }
    }
}

impl CatalogSource for RonCatalogSource {
    fn load(&self) -> Result<Catalog> {
        Catalog::from_ron_str(&self.text, &self.origin)
    }
}

impl CatalogSource for Catalog {
    fn load(&self) -> Result<Catalog> {
        self.validate()?;
        Ok(self.clone())
    }
}
