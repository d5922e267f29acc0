//! Layered site configuration with theme resolution.
//!
//! A [`SiteConfig`] starts from hardcoded defaults. If the configuration file
//! exists it is layered on top with the `config` crate: mappings merge key by
//! key, anything else replaces the default outright. Scalars convert
//! leniently (`site_name: 2024`, `port: "5000"`). A value that still does not
//! fit the schema is dropped on its own and its default kept. A file that
//! cannot be read or parsed is logged and ignored, so loading always yields a
//! usable configuration.
//!
//! Theme resolution order:
//! 1. an inline `theme` mapping with both `dark` and `light` variants,
//! 2. `theme_name: custom` with a `custom_theme` palette,
//! 3. a named theme file from the themes directory,
//! 4. the built-in default palette.
//!
//! [`ConfigHandle`] owns the current snapshot. Reloads and theme switches
//! build a complete new snapshot and swap it in atomically.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use config::{Config, ConfigError, File, Source, ValueKind};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::theme::{ResolvedTheme, Theme, ThemeInfo, ThemeLoader, DEFAULT_THEME};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Theme name selecting the palette embedded under `custom_theme`.
pub const CUSTOM_THEME: &str = "custom";

/// `active_theme_name` reported for inline dark/light definitions.
pub const INLINE_THEME: &str = "inline";

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub site_name: String,
    pub author: String,
    pub description: String,
    pub theme_name: String,
    pub server: ServerConfig,
    pub directories: DirectoriesConfig,
    pub features: FeaturesConfig,
    pub export: ExportConfig,

    /// Theme picked by resolution (set after loading).
    #[serde(skip)]
    pub theme: ResolvedTheme,
    /// Name of the theme in use (set after loading).
    #[serde(skip)]
    pub active_theme_name: String,
    /// Merged configuration before theme resolution.
    #[serde(skip)]
    merged: Value,
    /// Merged configuration with the resolved theme, for dotted lookups.
    #[serde(skip)]
    tree: Value,
    #[serde(skip)]
    themes: ThemeLoader,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "Documentation".into(),
            author: "Unknown Author".into(),
            description: "Documentation built from markdown".into(),
            theme_name: DEFAULT_THEME.into(),
            server: ServerConfig::default(),
            directories: DirectoriesConfig::default(),
            features: FeaturesConfig::default(),
            export: ExportConfig::default(),
            theme: ResolvedTheme::default(),
            active_theme_name: DEFAULT_THEME.into(),
            merged: Value::Null,
            tree: Value::Null,
            themes: ThemeLoader::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            debug: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct DirectoriesConfig {
    pub docs: PathBuf,
    #[serde(rename = "static")]
    pub static_files: PathBuf,
    pub templates: PathBuf,
    pub themes: PathBuf,
}

impl Default for DirectoriesConfig {
    fn default() -> Self {
        Self {
            docs: "docs".into(),
            static_files: "static".into(),
            templates: "templates".into(),
            themes: "config/themes".into(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct FeaturesConfig {
    pub table_of_contents: bool,
    pub syntax_highlighting: bool,
    pub auto_reload: bool,
    pub search: bool,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            table_of_contents: true,
            syntax_highlighting: true,
            auto_reload: true,
            search: false,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct ExportConfig {
    pub qmd: QmdExportConfig,
    pub show_on_all_pages: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            qmd: QmdExportConfig::default(),
            show_on_all_pages: true,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct QmdExportConfig {
    pub enabled: bool,
    pub button_text: String,
    pub project_name: Option<String>,
}

impl Default for QmdExportConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            button_text: "Export Documentation".into(),
            project_name: None,
        }
    }
}

/// Export settings the presentation layer needs to show export controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSettings {
    pub qmd_enabled: bool,
    pub qmd_button_text: String,
    pub show_on_all_pages: bool,
}

impl SiteConfig {
    /// Look up a dotted key such as `server.port`.
    ///
    /// Returns `default` as soon as a segment is missing, a value is null, an
    /// intermediate value is not a mapping, or the value does not convert to
    /// `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get_value(key)
            .and_then(|value| T::deserialize(value).ok())
            .unwrap_or(default)
    }

    /// Raw value at a dotted key.
    pub fn get_value(&self, key: &str) -> Option<&Value> {
        lookup(&self.tree, key)
    }

    /// Name used for export artifacts: `export.qmd.project_name`, else `site_name`.
    pub fn project_name(&self) -> &str {
        self.export
            .qmd
            .project_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.site_name)
    }

    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings {
            qmd_enabled: self.export.qmd.enabled,
            qmd_button_text: self.export.qmd.button_text.clone(),
            show_on_all_pages: self.export.show_on_all_pages,
        }
    }

    /// Whether `name` is accepted by [`ConfigHandle::switch_theme`].
    pub fn is_selectable_theme(&self, name: &str) -> bool {
        name == CUSTOM_THEME || self.themes.contains(name)
    }

    fn to_tree(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Bring the merged tree, theme list and resolved theme in line with the
    /// typed fields. Extension keys in the merged tree are kept.
    fn refresh(&mut self) {
        self.merged = deep_merge(std::mem::take(&mut self.merged), self.to_tree());
        self.themes = ThemeLoader::discover(&self.directories.themes);
        self.resolve_theme();
    }

    fn resolve_theme(&mut self) {
        if let Some(Value::Object(inline)) = self.merged.get("theme")
            && inline.contains_key("dark")
            && inline.contains_key("light")
        {
            self.theme = ResolvedTheme::Variants(inline.clone());
            self.active_theme_name = INLINE_THEME.into();
        } else {
            let palette = if self.theme_name == CUSTOM_THEME {
                self.custom_palette()
            } else {
                self.themes.load_theme(&self.theme_name)
            };
            self.theme = ResolvedTheme::Palette(palette);
            self.active_theme_name = self.theme_name.clone();
        }

        let mut tree = self.merged.clone();
        if let Value::Object(map) = &mut tree {
            map.insert("theme_name".into(), Value::String(self.theme_name.clone()));
            map.insert(
                "theme".into(),
                serde_json::to_value(&self.theme).unwrap_or(Value::Null),
            );
            map.insert(
                "active_theme_name".into(),
                Value::String(self.active_theme_name.clone()),
            );
        }
        self.tree = tree;
    }

    /// Copy of this snapshot using theme `name`, re-resolved.
    fn with_theme(&self, name: &str) -> SiteConfig {
        let mut next = self.clone();
        next.theme_name = name.to_owned();
        if let Value::Object(map) = &mut next.merged {
            map.insert("theme_name".into(), Value::String(name.to_owned()));
        }
        next.resolve_theme();
        next
    }

    fn custom_palette(&self) -> Theme {
        let Some(custom) = self.merged.get("custom_theme") else {
            tracing::warn!("theme_name is \"custom\" but no custom_theme is configured");
            return Theme::default();
        };

        Theme::from_value(custom).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "invalid custom_theme, using default palette");
            Theme::default()
        })
    }
}

/// Deep-merge `update` onto `base`.
///
/// When both sides hold a mapping for a key the mappings are merged
/// recursively; otherwise the value from `update` wins.
pub fn deep_merge(base: Value, update: Value) -> Value {
    match (base, update) {
        (Value::Object(mut base), Value::Object(update)) => {
            for (key, value) in update {
                let merged = match base.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            Value::Object(base)
        }
        (_, update) => update,
    }
}

fn lookup<'a>(tree: &'a Value, key: &str) -> Option<&'a Value> {
    let mut value = tree;
    for segment in key.split('.') {
        value = value.as_object()?.get(segment)?;
        if value.is_null() {
            return None;
        }
    }
    Some(value)
}

/// Builds [`SiteConfig`] snapshots from a configuration file.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    config_path: PathBuf,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_PATH)
    }
}

impl ConfigResolver {
    pub fn new<P: AsRef<Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Build a fresh snapshot. Never fails; problems with the config file
    /// are logged and the defaults are kept.
    pub fn load(&self) -> SiteConfig {
        let mut config = if self.config_path.exists() {
            self.load_overrides().unwrap_or_else(|e| {
                tracing::warn!(
                    path = %self.config_path.display(),
                    error = %e,
                    "error loading configuration, using defaults"
                );
                SiteConfig::default()
            })
        } else {
            tracing::debug!(path = %self.config_path.display(), "no configuration file, using defaults");
            SiteConfig::default()
        };

        config.refresh();
        config
    }

    fn load_overrides(&self) -> Result<SiteConfig, ConfigError> {
        let defaults = Config::builder().add_source(Config::try_from(&SiteConfig::default())?);
        let file = Config::builder()
            .add_source(File::from(self.config_path.as_path()))
            .build()?;

        let layered = defaults.clone().add_source(file.clone()).build()?;
        let layered = match layered.clone().try_deserialize::<SiteConfig>() {
            Ok(_) => layered,
            Err(e) => {
                tracing::warn!(
                    path = %self.config_path.display(),
                    error = %e,
                    "configuration has invalid values, keeping the valid ones"
                );
                salvage(defaults, &file)?
            }
        };

        let mut config: SiteConfig = layered.clone().try_deserialize()?;
        config.merged = layered.try_deserialize()?;
        Ok(config)
    }
}

/// Apply the file one leaf key at a time, skipping keys that break the
/// schema.
fn salvage(
    defaults: config::ConfigBuilder<config::builder::DefaultState>,
    file: &Config,
) -> Result<Config, ConfigError> {
    let mut leaves = Vec::new();
    flatten("", file.collect()?, &mut leaves);

    let mut accepted = defaults;
    for (key, value) in leaves {
        let candidate = accepted.clone().set_override(key.as_str(), value).and_then(|candidate| {
            candidate.build_cloned()?.try_deserialize::<SiteConfig>()?;
            Ok(candidate)
        });
        match candidate {
            Ok(candidate) => accepted = candidate,
            Err(e) => tracing::warn!(key = %key, error = %e, "ignoring invalid configuration value"),
        }
    }
    accepted.build()
}

/// Collect the leaf values of a table as dotted keys.
fn flatten(
    prefix: &str,
    table: impl IntoIterator<Item = (String, config::Value)>,
    leaves: &mut Vec<(String, config::Value)>,
) {
    for (key, value) in table {
        let path = if prefix.is_empty() { key } else { format!("{prefix}.{key}") };
        match value.kind {
            ValueKind::Table(table) if !table.is_empty() => flatten(&path, table, leaves),
            kind => leaves.push((path, config::Value::new(None, kind))),
        }
    }
}

/// Shared owner of the current configuration snapshot.
///
/// Readers get an `Arc<SiteConfig>` that stays consistent for as long as
/// they hold it, even if a reload happens meanwhile.
pub struct ConfigHandle {
    resolver: ConfigResolver,
    current: ArcSwap<SiteConfig>,
}

impl ConfigHandle {
    /// Load the configuration at `config_path`.
    pub fn open<P: AsRef<Path>>(config_path: P) -> Self {
        Self::new(ConfigResolver::new(config_path))
    }

    pub fn new(resolver: ConfigResolver) -> Self {
        let config = resolver.load();
        tracing::info!(
            site = %config.site_name,
            theme = %config.active_theme_name,
            "configuration loaded"
        );
        Self {
            resolver,
            current: ArcSwap::from_pointee(config),
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<SiteConfig> {
        self.current.load_full()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.current.load().get(key, default)
    }

    /// Recompute configuration and theme from scratch and swap them in.
    pub fn reload(&self) {
        let config = self.resolver.load();
        tracing::info!(theme = %config.active_theme_name, "configuration reloaded");
        self.current.store(Arc::new(config));
    }

    /// Switch to theme `name`.
    ///
    /// Only `"custom"` and discovered theme names are accepted. Returns
    /// whether the switch happened; a rejected name leaves the configuration
    /// untouched.
    pub fn switch_theme(&self, name: &str) -> bool {
        let mut switched = false;
        self.current.rcu(|current| {
            switched = current.is_selectable_theme(name);
            if switched {
                Arc::new(current.with_theme(name))
            } else {
                Arc::clone(current)
            }
        });

        if switched {
            tracing::info!(theme = name, "theme switched");
        } else {
            tracing::debug!(theme = name, "rejected unknown theme");
        }
        switched
    }

    pub fn available_themes(&self) -> BTreeMap<String, ThemeInfo> {
        self.current.load().themes.list_themes()
    }

    /// Replace the snapshot with a modified copy of the current one.
    ///
    /// The dotted-key tree and the resolved theme follow the change. `f` may
    /// run more than once if another update races with this one.
    pub fn update<F: Fn(&mut SiteConfig)>(&self, f: F) {
        self.current.rcu(|current| {
            let mut next = SiteConfig::clone(current);
            f(&mut next);
            next.refresh();
            Arc::new(next)
        });
    }
}
