// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: TOML description of a grid run
//! OWNERS: @runtime
//! STATUS: Functional
//! TEST_COVERAGE: Unit tests (inline TOML + tempfile)
//!
//! ```toml
//! [grid]
//! width = 4
//! height = 2
//! backend = "emulated"
//!
//! [dispatch]
//! idle_spins = 64
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use grid_abi::{Geometry, GeometryError};
use grid_rpc::DispatchConfig;
use log::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::backend::BackendKind;

/// Errors raised while loading or checking a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read grid config {path}: {source}")]
    Io {
        /// Location of the file.
        path: PathBuf,
        /// Underlying operating system error.
        source: std::io::Error,
    },
    /// The text is not a valid configuration.
    #[error("failed to parse grid config: {source}")]
    Parse {
        /// Error returned by the TOML deserializer.
        source: toml::de::Error,
    },
    /// Width or height out of range.
    #[error("invalid grid geometry: {0}")]
    Geometry(#[from] GeometryError),
    /// `dispatch.idle_spins` must be positive.
    #[error("dispatch.idle_spins must be greater than zero")]
    ZeroIdleSpins,
}

/// A full grid run description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridConfig {
    /// Shape and backend.
    pub grid: GridSection,
    /// Host loop tuning.
    #[serde(default)]
    pub dispatch: DispatchSection,
}

/// `[grid]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GridSection {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Lock backend.
    #[serde(default)]
    pub backend: BackendKind,
}

/// `[dispatch]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchSection {
    /// Empty scan passes between two yields.
    #[serde(default = "default_idle_spins")]
    pub idle_spins: u32,
}

impl Default for DispatchSection {
    fn default() -> Self {
        Self { idle_spins: default_idle_spins() }
    }
}

fn default_idle_spins() -> u32 {
    DispatchConfig::default().idle_spins
}

impl GridConfig {
    /// Configuration for a `width` x `height` grid with default tuning.
    pub fn new(width: u32, height: u32, backend: BackendKind) -> Self {
        Self { grid: GridSection { width, height, backend }, dispatch: DispatchSection::default() }
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|source| ConfigError::Parse { source })
    }

    /// Reads and parses the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    /// Checks the values and returns the grid geometry.
    pub fn validate(&self) -> Result<Geometry, ConfigError> {
        let geometry = Geometry::new(self.grid.width, self.grid.height)?;
        if self.dispatch.idle_spins == 0 {
            return Err(ConfigError::ZeroIdleSpins);
        }
        if self.grid.backend == BackendKind::Polled && geometry.tile_count() > available_cores() {
            warn!(
                "polled backend with {} tiles on {} cores; spinning tiles will compete for cpu time",
                geometry.tile_count(),
                available_cores()
            );
        }
        Ok(geometry)
    }

    /// Host loop tuning derived from `[dispatch]`.
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig { idle_spins: self.dispatch.idle_spins }
    }
}

fn available_cores() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}
