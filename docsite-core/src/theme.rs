//! Named colour palettes loaded from a themes directory.
//!
//! Each file in the themes directory (`*.yaml`, `*.yml` or `*.toml`) defines
//! one theme, keyed by its file stem:
//!
//! ```yaml
//! name: Ocean
//! description: Deep blue palette
//! author: someone
//! colors:
//!   primary_color: "#3b82f6"
//!   # ... all eleven colour keys
//! ```
//!
//! A palette is all-or-nothing: a theme that cannot be read, lacks a
//! `colors` section, or misses any colour key resolves to [`Theme::default`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::source;

/// Identifier substituted for unknown theme names.
pub const DEFAULT_THEME: &str = "default";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ThemeError {
    #[error(transparent)]
    Source(#[from] config::ConfigError),

    #[error("theme has no colors section")]
    MissingColors,

    #[error("invalid palette: {0}")]
    Palette(#[from] serde_json::Error),
}

/// A complete interface palette.
///
/// Every field is required when deserializing, so a partially specified
/// palette never makes it into a `Theme`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub primary_color: String,
    pub secondary_color: String,
    pub background_color: String,
    pub surface_color: String,
    pub text_color: String,
    pub text_secondary: String,
    pub accent_color: String,
    pub border_color: String,
    pub code_background: String,
    pub link_color: String,
    pub link_hover: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "#3b82f6".into(),
            secondary_color: "#8b5cf6".into(),
            background_color: "#0f1e35".into(),
            surface_color: "#1a2942".into(),
            text_color: "#e8edf5".into(),
            text_secondary: "#a8b5d1".into(),
            accent_color: "#06b6d4".into(),
            border_color: "#2a4365".into(),
            code_background: "#132336".into(),
            link_color: "#60a5fa".into(),
            link_hover: "#93c5fd".into(),
        }
    }
}

impl Theme {
    /// Build a palette from a generic mapping, requiring all eleven keys.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// `(css variable name, value)` pairs in canonical order.
    pub fn entries(&self) -> [(&'static str, &str); 11] {
        [
            ("primary", self.primary_color.as_str()),
            ("secondary", self.secondary_color.as_str()),
            ("background", self.background_color.as_str()),
            ("surface", self.surface_color.as_str()),
            ("text", self.text_color.as_str()),
            ("text-secondary", self.text_secondary.as_str()),
            ("accent", self.accent_color.as_str()),
            ("border", self.border_color.as_str()),
            ("code-background", self.code_background.as_str()),
            ("link", self.link_color.as_str()),
            ("link-hover", self.link_hover.as_str()),
        ]
    }

    /// Render the palette as a `:root` block of CSS custom properties.
    pub fn css_variables(&self) -> String {
        let mut css = String::from(":root {\n");
        for (name, value) in self.entries() {
            css.push_str(&format!("  --color-{name}: {value};\n"));
        }
        css.push_str("}\n");
        css
    }
}

/// The theme a configuration ends up with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedTheme {
    /// A single validated palette (file-backed, custom, or the default).
    Palette(Theme),
    /// An inline definition carrying both `dark` and `light` variants,
    /// passed through exactly as configured.
    Variants(Map<String, Value>),
}

impl Default for ResolvedTheme {
    fn default() -> Self {
        Self::Palette(Theme::default())
    }
}

impl ResolvedTheme {
    pub fn palette(&self) -> Option<&Theme> {
        match self {
            Self::Palette(theme) => Some(theme),
            Self::Variants(_) => None,
        }
    }
}

/// Descriptive information about a theme file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThemeInfo {
    pub name: String,
    pub description: String,
    pub author: String,
}

/// Discovers theme files and loads palettes from them.
#[derive(Debug, Clone, Default)]
pub struct ThemeLoader {
    themes: BTreeMap<String, PathBuf>,
}

impl ThemeLoader {
    /// Enumerate theme files in `themes_dir`.
    ///
    /// A missing or unreadable directory yields a loader with no themes.
    /// File contents are not looked at here.
    pub fn discover<P: AsRef<Path>>(themes_dir: P) -> Self {
        let themes_dir = themes_dir.as_ref();
        let mut themes = BTreeMap::new();

        let Ok(entries) = std::fs::read_dir(themes_dir) else {
            tracing::debug!(dir = %themes_dir.display(), "themes directory not readable");
            return Self { themes };
        };

        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if !path.is_file() || !source::is_supported(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                themes.insert(stem.to_string_lossy().into_owned(), path);
            }
        }

        tracing::debug!(count = themes.len(), dir = %themes_dir.display(), "discovered themes");
        Self { themes }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.themes.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.themes.keys().map(String::as_str)
    }

    /// Load the palette for `name`.
    ///
    /// Unknown names fall back to [`DEFAULT_THEME`]; any failure after that
    /// yields [`Theme::default`].
    pub fn load_theme(&self, name: &str) -> Theme {
        let name = if self.contains(name) { name } else { DEFAULT_THEME };

        let Some(path) = self.themes.get(name) else {
            return Theme::default();
        };

        match load_palette(path) {
            Ok(theme) => theme,
            Err(e) => {
                tracing::warn!(theme = name, error = %e, "failed to load theme, using default palette");
                Theme::default()
            }
        }
    }

    /// Read a theme's name, description and author without validating colours.
    pub fn get_theme_info(&self, name: &str) -> Option<ThemeInfo> {
        let path = self.themes.get(name)?;

        let tree = match source::read_tree(path) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::warn!(theme = name, error = %e, "failed to read theme info");
                return None;
            }
        };

        let field = |key: &str| tree.get(key).and_then(Value::as_str).map(str::to_owned);

        Some(ThemeInfo {
            name: field("name").unwrap_or_else(|| name.to_owned()),
            description: field("description").unwrap_or_default(),
            author: field("author").unwrap_or_default(),
        })
    }

    /// Info for every discovered theme whose file could be read.
    pub fn list_themes(&self) -> BTreeMap<String, ThemeInfo> {
        self.themes
            .keys()
            .filter_map(|name| Some((name.clone(), self.get_theme_info(name)?)))
            .collect()
    }
}

fn load_palette(path: &Path) -> Result<Theme, ThemeError> {
    let tree = source::read_tree(path)?;
    let colors = tree.get("colors").ok_or(ThemeError::MissingColors)?;
    Ok(Theme::from_value(colors)?)
}
