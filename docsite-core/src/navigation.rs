//! Navigation built from the documentation tree.
//!
//! Every `.md` file below the docs root becomes one [`NavEntry`]. Titles
//! come from a leading `#` heading (or the file stem); ordering comes from
//! front matter `order`, overridden by a numeric filename prefix such as
//! `02-setup.md`. Entries sort by `(order, lowercase title)`.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::frontmatter::FrontMatter;

/// Order for documents that specify none.
pub const DEFAULT_ORDER: i64 = 999;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub title: String,
    /// URL path relative to the docs root, without extension, `/`-separated.
    pub path: String,
    /// Source file relative to the docs root.
    pub file: PathBuf,
    pub order: i64,
}

impl NavEntry {
    fn sort_key(&self) -> (i64, String) {
        (self.order, self.title.to_lowercase())
    }

    /// Whether this entry serves the requested logical path.
    pub fn matches(&self, path: &str) -> bool {
        self.path == path || self.path.ends_with(path)
    }
}

/// Sorted navigation entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Navigation {
    entries: Vec<NavEntry>,
}

impl Navigation {
    pub fn new(mut entries: Vec<NavEntry>) -> Self {
        entries.sort_by(compare_entries);
        Self { entries }
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NavEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.title.as_str())
    }

    /// Previous and next entries around the first entry matching `path`.
    pub fn neighbors(&self, path: &str) -> (Option<&NavEntry>, Option<&NavEntry>) {
        let Some(index) = self.entries.iter().position(|entry| entry.matches(path)) else {
            return (None, None);
        };
        let prev = index.checked_sub(1).and_then(|i| self.entries.get(i));
        (prev, self.entries.get(index + 1))
    }
}

impl<'a> IntoIterator for &'a Navigation {
    type Item = &'a NavEntry;
    type IntoIter = std::slice::Iter<'a, NavEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Entries order by `(order, lowercase title)`; the URL path breaks any
/// remaining tie so the result never depends on scan order.
fn compare_entries(a: &NavEntry, b: &NavEntry) -> Ordering {
    a.sort_key()
        .cmp(&b.sort_key())
        .then_with(|| a.path.cmp(&b.path))
}

/// Scans a docs root into a [`Navigation`].
///
/// Holds no state between builds; every call rescans the filesystem.
#[derive(Debug, Clone)]
pub struct NavigationBuilder {
    docs_dir: PathBuf,
}

impl NavigationBuilder {
    pub fn new<P: AsRef<Path>>(docs_dir: P) -> Self {
        Self {
            docs_dir: docs_dir.as_ref().to_path_buf(),
        }
    }

    pub fn build(&self) -> Navigation {
        let mut entries = Vec::new();

        for path in get_all_markdown_files(&self.docs_dir) {
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable document");
                    continue;
                }
            };

            let Ok(relative) = path.strip_prefix(&self.docs_dir) else {
                continue;
            };
            entries.push(entry_for(relative, &content));
        }

        tracing::debug!(count = entries.len(), dir = %self.docs_dir.display(), "built navigation");
        Navigation::new(entries)
    }
}

/// Derive a navigation entry from a file path (relative to the docs root)
/// and its content.
pub fn entry_for(relative: &Path, content: &str) -> NavEntry {
    let stem = relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let first_line = content.lines().next().unwrap_or("").trim();
    let mut title = if first_line.starts_with('#') {
        first_line.trim_start_matches('#').trim().to_owned()
    } else {
        stem.clone()
    };

    let mut order = FrontMatter::parse(content)
        .and_then(|fm| fm.order)
        .unwrap_or(DEFAULT_ORDER);

    // A numeric filename prefix wins over front matter
    if let Some((prefix, _)) = stem.split_once('-')
        && !prefix.is_empty()
        && prefix.chars().all(|c| c.is_ascii_digit())
        && let Ok(n) = prefix.parse::<i64>()
    {
        order = n;
        if let Some(rest) = title.strip_prefix(prefix) {
            title = rest.trim_start_matches(['-', ' ']).to_owned();
        }
    }

    NavEntry {
        title,
        path: url_path(relative),
        file: relative.to_path_buf(),
        order,
    }
}

/// `guides/01-setup.md` -> `guides/01-setup`, whatever the host separator.
fn url_path(relative: &Path) -> String {
    relative
        .with_extension("")
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn get_all_markdown_files<P: AsRef<Path>>(path: P) -> Vec<PathBuf> {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|p| p.path().is_file() && p.path().extension().is_some_and(|ext| ext == "md"))
        .map(|p| p.path().to_path_buf())
        .collect()
}
