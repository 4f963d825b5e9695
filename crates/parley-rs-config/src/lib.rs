//! Parley configuration: the `parley.json5` model, its schema checks and
//! layered discovery.

mod error;
mod loader;
mod model;

pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{
    CONFIG_FILE_NAME, ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions,
    USER_DIR_NAME,
};
/// Configuration schema models.
pub use model::*;
