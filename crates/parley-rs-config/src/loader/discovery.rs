//! Locating and reading config files.

use super::{CONFIG_FILE_NAME, USER_DIR_NAME};
use crate::ConfigError;
use directories::UserDirs;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// `~/.parley/parley.json5`, when a home directory is known.
pub(super) fn user_config_path() -> Option<PathBuf> {
    let dirs = UserDirs::new()?;
    Some(dirs.home_dir().join(USER_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Nearest ancestor of `cwd` (itself included) that holds one of `markers`.
pub(super) fn project_root(cwd: &Path, markers: &[String]) -> Option<PathBuf> {
    cwd.ancestors()
        .find(|dir| markers.iter().any(|marker| dir.join(marker).exists()))
        .map(Path::to_path_buf)
}

/// Resolved form of `path`, or `path` itself when it cannot be resolved.
pub(super) fn canonical_or_same(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Read a JSON5 file into a JSON value.
pub(super) fn read_json5(path: &Path, origin: &str) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    json5::from_str(&contents).map_err(|source| ConfigError::Syntax {
        origin: origin.to_string(),
        source,
    })
}
