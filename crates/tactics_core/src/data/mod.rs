//! Data structures for the template catalog.
//!
//! This module contains pure data structures that define unit, buff and
//! formation templates. All structs are designed to be deserialized from
//! RON text.
//!
//! **Note:** This module contains no file IO. Reading catalogs from disk is
//! handled by `tactics_headless`, which hands the text to a
//! [`CatalogSource`].

mod buff_data;
mod catalog;
mod formation_data;
mod unit_data;

pub use buff_data::{BuffEffect, BuffTemplate, EffectDetails};
pub use catalog::{Catalog, CatalogSource, RonCatalogSource};
pub use formation_data::{FormationEffect, FormationParams, FormationTemplate, SummonArea};
pub use unit_data::{Trait, UnitClass, UnitTemplate};

/// RON options shared by every catalog and scenario parser.
///
/// Enables implicit `Some` so optional parameters can be written bare
/// (`damage_reduction: 0.25`).
#[must_use]
pub fn ron_options() -> ron::Options {
    ron::Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}
