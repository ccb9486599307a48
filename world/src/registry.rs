//! Named tower and layout templates with their persisted document form, and
//! the simulation settings loaded next to them.

use std::collections::BTreeMap;

use plot_defence_core::{
    BlockPosition, LayoutTemplate, SimulationConfig, TowerTemplate, WorldAdapter, LAYOUT_SIZE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{trace_path, Layout, LayoutError};

/// Errors raised while reading or writing registry documents.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The document is not valid TOML.
    #[error("failed to parse registry document: {0}")]
    Parse(#[from] toml::de::Error),
    /// A template could not be rendered to TOML.
    #[error("failed to render registry document: {0}")]
    Render(#[from] toml::ser::Error),
    /// A tower entry does not match the template schema.
    #[error("tower `{name}` is malformed: {source}")]
    MalformedTower {
        /// Registry key of the entry.
        name: String,
        /// Underlying decoding failure.
        source: toml::de::Error,
    },
    /// A layout entry does not match the template schema.
    #[error("layout `{name}` is malformed: {source}")]
    MalformedLayout {
        /// Registry key of the entry.
        name: String,
        /// Underlying decoding failure.
        source: toml::de::Error,
    },
    /// A tower entry decoded but violates a template invariant.
    #[error("tower `{name}` is invalid: {reason}")]
    InvalidTower {
        /// Registry key of the entry.
        name: String,
        /// Violated invariant.
        reason: String,
    },
    /// A layout entry decoded but violates a template invariant.
    #[error("layout `{name}` is invalid: {reason}")]
    InvalidLayout {
        /// Registry key of the entry.
        name: String,
        /// Violated invariant.
        reason: String,
    },
    /// A simulation setting that paces the loops is zero.
    #[error("simulation setting `{field}` must be at least 1")]
    InvalidSimulation {
        /// Name of the offending setting.
        field: &'static str,
    },
}

/// Parses simulation settings from TOML text, rejecting zero cadences.
pub fn parse_simulation_config(text: &str) -> Result<SimulationConfig, ConfigError> {
    let config: SimulationConfig = toml::from_str(text)?;
    validate_simulation_config(&config)?;
    Ok(config)
}

/// Checks that spawning and movement advance at all.
pub fn validate_simulation_config(config: &SimulationConfig) -> Result<(), ConfigError> {
    if config.spawn_period_ticks == 0 {
        return Err(ConfigError::InvalidSimulation {
            field: "spawn_period_ticks",
        });
    }
    if config.movement_substeps == 0 {
        return Err(ConfigError::InvalidSimulation {
            field: "movement_substeps",
        });
    }
    Ok(())
}

/// Persisted form of a [`TemplateRegistry`].
///
/// Entries are kept as raw TOML values so that one malformed template does
/// not prevent the rest of the document from loading.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryDocument {
    /// Tower templates keyed by name.
    #[serde(default)]
    pub towers: BTreeMap<String, toml::Value>,
    /// Layout templates keyed by name.
    #[serde(default)]
    pub layouts: BTreeMap<String, toml::Value>,
}

impl RegistryDocument {
    /// Parses a document from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Renders the document as TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }
}

/// Registry of named tower and layout templates.
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    towers: BTreeMap<String, TowerTemplate>,
    layouts: BTreeMap<String, LayoutTemplate>,
}

impl TemplateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every valid template of `document`.
    ///
    /// Malformed or invalid entries are skipped and reported alongside the
    /// registry.
    #[must_use]
    pub fn load(document: &RegistryDocument) -> (Self, Vec<ConfigError>) {
        let mut registry = Self::new();
        let mut errors = Vec::new();

        for (name, value) in &document.towers {
            match decode_tower(name, value) {
                Ok(template) => {
                    let _ = registry.insert_tower(template);
                }
                Err(error) => {
                    warn!(%error, "skipping tower template");
                    errors.push(error);
                }
            }
        }

        for (name, value) in &document.layouts {
            match decode_layout(name, value) {
                Ok(template) => {
                    let _ = registry.insert_layout(template);
                }
                Err(error) => {
                    warn!(%error, "skipping layout template");
                    errors.push(error);
                }
            }
        }

        debug!(
            towers = registry.towers.len(),
            layouts = registry.layouts.len(),
            skipped = errors.len(),
            "template registry loaded"
        );
        (registry, errors)
    }

    /// Parses TOML text and loads it; see [`TemplateRegistry::load`].
    pub fn from_toml_str(text: &str) -> Result<(Self, Vec<ConfigError>), ConfigError> {
        let document = RegistryDocument::from_toml_str(text)?;
        Ok(Self::load(&document))
    }

    /// Produces the persisted form of the registry.
    pub fn save(&self) -> Result<RegistryDocument, ConfigError> {
        let mut document = RegistryDocument::default();
        for (name, template) in &self.towers {
            let _ = document
                .towers
                .insert(name.clone(), toml::Value::try_from(template)?);
        }
        for (name, template) in &self.layouts {
            let _ = document
                .layouts
                .insert(name.clone(), toml::Value::try_from(template)?);
        }
        Ok(document)
    }

    /// Renders the registry as TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        self.save()?.to_toml_string()
    }

    /// Adds a tower template, returning the one it replaced.
    pub fn insert_tower(&mut self, template: TowerTemplate) -> Option<TowerTemplate> {
        self.towers.insert(template.name.clone(), template)
    }

    /// Adds a layout template, returning the one it replaced.
    pub fn insert_layout(&mut self, template: LayoutTemplate) -> Option<LayoutTemplate> {
        self.layouts.insert(template.name.clone(), template)
    }

    /// Removes a tower template.
    pub fn remove_tower(&mut self, name: &str) -> Option<TowerTemplate> {
        self.towers.remove(name)
    }

    /// Removes a layout template.
    pub fn remove_layout(&mut self, name: &str) -> Option<LayoutTemplate> {
        self.layouts.remove(name)
    }

    /// Tower template with the provided name.
    #[must_use]
    pub fn tower(&self, name: &str) -> Option<&TowerTemplate> {
        self.towers.get(name)
    }

    /// Layout template with the provided name.
    #[must_use]
    pub fn layout(&self, name: &str) -> Option<&LayoutTemplate> {
        self.layouts.get(name)
    }

    /// Tower templates ordered by name.
    pub fn towers(&self) -> impl Iterator<Item = &TowerTemplate> {
        self.towers.values()
    }

    /// Layout templates ordered by name.
    pub fn layouts(&self) -> impl Iterator<Item = &LayoutTemplate> {
        self.layouts.values()
    }

    /// Builds a layout from the named template.
    pub fn instantiate_layout<W: WorldAdapter>(
        &self,
        name: &str,
        origin: BlockPosition,
        world: W,
        config: &SimulationConfig,
    ) -> Result<Layout<W>, LayoutError> {
        let template = self
            .layout(name)
            .ok_or_else(|| LayoutError::UnknownTemplate {
                name: name.to_owned(),
            })?;
        Layout::new(template, origin, world, config)
    }
}

fn decode_tower(name: &str, value: &toml::Value) -> Result<TowerTemplate, ConfigError> {
    let mut template: TowerTemplate =
        value
            .clone()
            .try_into()
            .map_err(|source| ConfigError::MalformedTower {
                name: name.to_owned(),
                source,
            })?;
    template.name = name.to_owned();

    let invalid = |reason: String| ConfigError::InvalidTower {
        name: name.to_owned(),
        reason,
    };
    let pattern = &template.pattern;
    if !pattern.is_consistent() {
        return Err(invalid(format!(
            "pattern {}x{}x{} needs {} blocks but lists {}",
            pattern.width,
            pattern.depth,
            pattern.height,
            pattern.expected_len(),
            pattern.blocks.len()
        )));
    }
    let emission = template.emission_point;
    if emission.x >= pattern.width || emission.z >= pattern.depth {
        return Err(invalid(format!(
            "emission point ({}, {}) lies outside the {}x{} footprint",
            emission.x, emission.z, pattern.width, pattern.depth
        )));
    }
    if template.targets == 0 {
        return Err(invalid("tower must target at least one enemy".to_owned()));
    }
    Ok(template)
}

fn decode_layout(name: &str, value: &toml::Value) -> Result<LayoutTemplate, ConfigError> {
    let mut template: LayoutTemplate =
        value
            .clone()
            .try_into()
            .map_err(|source| ConfigError::MalformedLayout {
                name: name.to_owned(),
                source,
            })?;
    template.name = name.to_owned();

    let invalid = |reason: String| ConfigError::InvalidLayout {
        name: name.to_owned(),
        reason,
    };
    let pattern = &template.pattern;
    if !pattern.is_consistent() {
        return Err(invalid(format!(
            "pattern {}x{}x{} needs {} blocks but lists {}",
            pattern.width,
            pattern.depth,
            pattern.height,
            pattern.expected_len(),
            pattern.blocks.len()
        )));
    }
    if pattern.width != LAYOUT_SIZE || pattern.depth != LAYOUT_SIZE {
        return Err(invalid(format!(
            "layout must be {LAYOUT_SIZE}x{LAYOUT_SIZE} but is {}x{}",
            pattern.width, pattern.depth
        )));
    }
    let _ = trace_path(template.start, &template.path, pattern.width, pattern.depth)
        .map_err(|error| invalid(error.to_string()))?;
    Ok(template)
}
