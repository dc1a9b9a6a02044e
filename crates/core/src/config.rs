//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Services never read environment variables during request
//! handling; the CLI resolves them and builds a `CoreConfig`.

use crate::constants::DEFAULT_IDENTIFIER_SYSTEMS;
use crate::{CoreError, CoreResult};
use carelink_types::NonEmptyText;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    identifier_systems: Vec<NonEmptyText>,
    records_path: Option<PathBuf>,
}

/// On-disk shape of a configuration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    identifier_systems: Option<Vec<NonEmptyText>>,
    #[serde(default)]
    records_path: Option<PathBuf>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if no identifier systems are given or any of them
    /// is blank.
    pub fn new<S: AsRef<str>>(
        identifier_systems: Vec<S>,
        records_path: Option<PathBuf>,
    ) -> CoreResult<Self> {
        let identifier_systems = identifier_systems
            .iter()
            .map(NonEmptyText::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| {
                CoreError::InvalidInput("identifier_systems cannot contain blank entries".into())
            })?;
        Self::from_systems(identifier_systems, records_path)
    }

    fn from_systems(
        identifier_systems: Vec<NonEmptyText>,
        records_path: Option<PathBuf>,
    ) -> CoreResult<Self> {
        if identifier_systems.is_empty() {
            return Err(CoreError::InvalidInput(
                "identifier_systems cannot be empty".into(),
            ));
        }

        Ok(Self {
            identifier_systems,
            records_path,
        })
    }

    /// Parse a configuration document.
    ///
    /// Omitted `identifier_systems` fall back to the built-in directory.
    pub fn from_yaml(yaml_text: &str) -> CoreResult<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml_text)?;
        let systems = file.identifier_systems.unwrap_or_else(default_identifier_systems);
        Self::from_systems(systems, file.records_path)
    }

    /// Read and parse a configuration file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn identifier_systems(&self) -> &[NonEmptyText] {
        &self.identifier_systems
    }

    pub fn records_path(&self) -> Option<&Path> {
        self.records_path.as_deref()
    }

    /// Returns a copy with the record fixture path replaced.
    pub fn with_records_path(mut self, records_path: Option<PathBuf>) -> Self {
        if records_path.is_some() {
            self.records_path = records_path;
        }
        self
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            identifier_systems: default_identifier_systems(),
            records_path: None,
        }
    }
}

fn default_identifier_systems() -> Vec<NonEmptyText> {
    DEFAULT_IDENTIFIER_SYSTEMS
        .iter()
        .filter_map(|s| NonEmptyText::new(s).ok())
        .collect()
}
