//! Layered configuration loading.
//!
//! Layers come from the user's home, the project root and the working
//! directory, with runtime files stacked on top. Each layer is schema-checked
//! on its own, then objects are merged and decoded into `ParleyConfig`.

mod discovery;
mod merge;
mod schema;


use crate::{ConfigError, ParleyConfig};
use log::{debug, info};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// File name looked up in each discovered layer.
pub const CONFIG_FILE_NAME: &str = "parley.json5";
/// Directory under the home directory holding user-level files.
pub const USER_DIR_NAME: &str = ".parley";
const PROJECT_MARKERS: &[&str] = &[".git"];

/// Merged config plus the layers that produced it, lowest precedence first.
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub config: ParleyConfig,
    pub layers: Vec<ConfigLayer>,
}

/// Where a config layer was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// `~/.parley/parley.json5`.
    User,
    /// `parley.json5` at the nearest ancestor holding a project marker.
    Project,
    /// `parley.json5` in the working directory.
    Cwd,
    /// Files passed explicitly, applied last.
    Runtime,
}

impl ConfigLayerSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigLayerSource::User => "user",
            ConfigLayerSource::Project => "project",
            ConfigLayerSource::Cwd => "cwd",
            ConfigLayerSource::Runtime => "runtime",
        }
    }
}

/// A config file that contributed to the merged config.
#[derive(Debug, Clone)]
pub struct ConfigLayer {
    pub source: ConfigLayerSource,
    pub path: PathBuf,
}

impl ConfigLayer {
    /// Label used in error messages, e.g. `cwd(/srv/bot/parley.json5)`.
    pub fn origin(&self) -> String {
        format!("{}({})", self.source.as_str(), self.path.display())
    }
}

/// Controls which layers are discovered and which runtime files are applied.
#[derive(Debug, Clone)]
pub struct LayeredConfigOptions {
    pub cwd: PathBuf,
    /// User-level file; `None` skips the layer.
    pub user_config_path: Option<PathBuf>,
    pub runtime_paths: Vec<PathBuf>,
    pub project_root_markers: Vec<String>,
}

impl LayeredConfigOptions {
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self {
            cwd: cwd.as_ref().to_path_buf(),
            user_config_path: discovery::user_config_path(),
            runtime_paths: Vec::new(),
            project_root_markers: PROJECT_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Replace the user-level file, or drop the layer with `None`.
    pub fn with_user_config(mut self, path: Option<PathBuf>) -> Self {
        self.user_config_path = path;
        self
    }

    /// Apply `path` after every discovered layer. Runtime files must exist.
    pub fn with_runtime_path(mut self, path: impl AsRef<Path>) -> Self {
        self.runtime_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Discovered layer candidates, lowest precedence first.
    fn candidates(&self, cwd: &Path) -> Vec<ConfigLayer> {
        let mut found = Vec::new();
        if let Some(path) = &self.user_config_path {
            found.push(ConfigLayer {
                source: ConfigLayerSource::User,
                path: path.clone(),
            });
        }
        match discovery::project_root(cwd, &self.project_root_markers) {
            Some(root) => found.push(ConfigLayer {
                source: ConfigLayerSource::Project,
                path: root.join(CONFIG_FILE_NAME),
            }),
            None => debug!("no project root above {}", cwd.display()),
        }
        found.push(ConfigLayer {
            source: ConfigLayerSource::Cwd,
            path: cwd.join(CONFIG_FILE_NAME),
        });
        found
    }
}

impl ParleyConfig {
    /// Parse inline JSON5 contents.
    pub fn load_from_str(contents: &str) -> Result<Self, ConfigError> {
        debug!("parsing inline config (len={})", contents.len());
        let value: Value = json5::from_str(contents).map_err(|source| ConfigError::Syntax {
            origin: "inline".to_string(),
            source,
        })?;
        decode(value, "inline")
    }

    /// Load layers in precedence order: user, project, cwd, runtime.
    ///
    /// Missing discovered files are skipped; a file reached through two
    /// layers (the project root is the cwd) is read once.
    pub fn load_layered_with_options(
        options: LayeredConfigOptions,
    ) -> Result<LayeredConfig, ConfigError> {
        let cwd = discovery::canonical_or_same(&options.cwd);
        let mut seen = HashSet::new();
        let mut stack = Vec::new();

        for layer in options.candidates(&cwd) {
            if !layer.path.is_file() {
                debug!("config layer absent (origin={})", layer.origin());
                continue;
            }
            if !seen.insert(discovery::canonical_or_same(&layer.path)) {
                debug!("config layer already loaded (origin={})", layer.origin());
                continue;
            }
            stack.push(read_layer(layer)?);
        }
        for path in &options.runtime_paths {
            stack.push(read_layer(ConfigLayer {
                source: ConfigLayerSource::Runtime,
                path: path.clone(),
            })?);
        }

        let mut merged = Value::Object(serde_json::Map::new());
        let mut layers = Vec::with_capacity(stack.len());
        for (layer, value) in stack {
            merge::overlay(&mut merged, value);
            layers.push(layer);
        }
        let config = decode(merged, "effective")?;
        info!(
            "layered config loaded (layers={}, cwd={})",
            layers.len(),
            cwd.display()
        );
        Ok(LayeredConfig { config, layers })
    }

    /// Validate configuration invariants that cannot be expressed in serde.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assistant.prefix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "assistant.prefix must not be empty".to_string(),
            ));
        }
        if self.assistant.apology.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "assistant.apology must not be empty".to_string(),
            ));
        }
        if self.memory.context_turns == 0 {
            return Err(ConfigError::Invalid(
                "memory.context_turns must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("model.reply_temperature", self.model.reply_temperature),
            ("model.summary_temperature", self.model.summary_temperature),
        ] {
            if !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be between 0 and 2 (got {value})"
                )));
            }
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "model.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn read_layer(layer: ConfigLayer) -> Result<(ConfigLayer, Value), ConfigError> {
    let origin = layer.origin();
    debug!("reading config layer (origin={})", origin);
    let value = discovery::read_json5(&layer.path, &origin)?;
    schema::validate_layer_schema(&value, &origin)?;
    Ok((layer, value))
}

fn decode(value: Value, origin: &str) -> Result<ParleyConfig, ConfigError> {
    schema::validate_layer_schema(&value, origin)?;
    let config: ParleyConfig = serde_json::from_value(value)?;
    config.validate()?;
    Ok(config)
}
