//! Catalog and scenario loading from disk.
//!
//! Catalogs are RON files. A path may name a single file or a directory, in
//! which case every `.ron` file inside is loaded in name order and merged.

use std::fs;
use std::path::{Path, PathBuf};

use tactics_core::data::{ron_options, Catalog, CatalogSource};
use tactics_core::error::SetupError;
use tactics_core::scenario::Scenario;
use thiserror::Error;

/// Environment variable overriding the catalog search path.
pub const DATA_DIR_ENV: &str = "TACTICS_DATA_DIR";

/// Errors that can occur while loading data files.
#[derive(Error, Debug)]
pub enum CatalogLoadError {
    /// Path does not exist.
    #[error("Data path not found: {0}")]
    NotFound(String),
    /// Failed to read a file.
    #[error("Failed to read data file: {0}")]
    Read(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse data file: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// Parsed data failed validation.
    #[error(transparent)]
    Invalid(#[from] SetupError),
}

/// Catalog read from a file or a directory of `.ron` files.
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    /// Source reading `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Source reading the default data directory.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogLoadError::NotFound`] when no candidate exists.
    pub fn from_default_dir() -> Result<Self, CatalogLoadError> {
        default_data_dir()
            .map(Self::new)
            .ok_or_else(|| CatalogLoadError::NotFound("catalog data directory".to_string()))
    }

    /// Path this source reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load, merge and validate the catalog.
    ///
    /// # Errors
    ///
    /// Fails on missing paths, unreadable files, malformed RON and invalid
    /// catalog contents.
    pub fn load_catalog(&self) -> Result<Catalog, CatalogLoadError> {
        if !self.path.exists() {
            return Err(CatalogLoadError::NotFound(self.path.display().to_string()));
        }

        let catalog = if self.path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(&self.path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
                .collect();
            files.sort();

            let mut merged = Catalog::default();
            for file in &files {
                merged.extend(read_catalog_file(file)?);
            }
            tracing::info!(
                path = %self.path.display(),
                files = files.len(),
                "Loaded catalog directory"
            );
            merged
        } else {
            read_catalog_file(&self.path)?
        };

        catalog.validate()?;
        tracing::info!(
            units = catalog.units.len(),
            buffs = catalog.buffs.len(),
            formations = catalog.formations.len(),
            "Catalog ready"
        );
        Ok(catalog)
    }
}

impl CatalogSource for FileCatalogSource {
    fn load(&self) -> tactics_core::error::Result<Catalog> {
        self.load_catalog().map_err(|e| match e {
            CatalogLoadError::Invalid(inner) => inner,
            CatalogLoadError::Parse(e) => SetupError::CatalogParse {
                origin: self.path.display().to_string(),
                message: e.to_string(),
            },
            other => SetupError::CatalogIo {
                origin: self.path.display().to_string(),
                message: other.to_string(),
            },
        })
    }
}

fn read_catalog_file(path: &Path) -> Result<Catalog, CatalogLoadError> {
    let text = fs::read_to_string(path)?;
    let catalog: Catalog = ron_options().from_str(&text)?;
    tracing::debug!(path = %path.display(), units = catalog.units.len(), "Read catalog file");
    Ok(catalog)
}

/// Load a scenario from a RON file.
///
/// # Errors
///
/// Fails on missing or unreadable files and malformed RON.
pub fn load_scenario(path: &Path) -> Result<Scenario, CatalogLoadError> {
    if !path.exists() {
        return Err(CatalogLoadError::NotFound(path.display().to_string()));
    }
    let text = fs::read_to_string(path)?;
    let scenario: Scenario = ron_options().from_str(&text)?;
    tracing::info!(path = %path.display(), name = %scenario.name, "Loaded scenario");
    Ok(scenario)
}

/// Resolve the default catalog directory.
///
/// Looks in order at:
/// 1. Environment variable `TACTICS_DATA_DIR`
/// 2. `./crates/tactics_headless/assets/data/` (repo root)
/// 3. `./assets/data/` (running from the crate)
pub fn default_data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        let path = PathBuf::from(dir);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!(path = %path.display(), "{} does not exist, ignoring", DATA_DIR_ENV);
    }

    let candidates = ["crates/tactics_headless/assets/data", "assets/data"];
    candidates
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}
