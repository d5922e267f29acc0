//! Reading structured configuration sources (YAML or TOML) into a generic tree.

use std::path::Path;

use config::{Config, ConfigError, File};
use serde_json::Value;

/// File extensions accepted for configuration and theme files.
pub(crate) const EXTENSIONS: &[&str] = &["yaml", "yml", "toml"];

pub(crate) fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// Read and parse a YAML or TOML file into a tree.
///
/// An empty YAML document parses to an empty mapping.
pub(crate) fn read_tree(path: &Path) -> Result<Value, ConfigError> {
    Config::builder().add_source(File::from(path)).build()?.try_deserialize()
}
