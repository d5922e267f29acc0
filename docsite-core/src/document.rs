//! Mapping logical document paths to source files.

use std::path::{Path, PathBuf};

use crate::navigation::Navigation;

/// Index documents tried, in order, for the root path.
const INDEX_FILES: [&str; 2] = ["01-index.md", "index.md"];

/// Logical path that also means "the index".
const INDEX_PATH: &str = "index";

/// Raw text of a resolved document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// The logical path that was requested.
    pub path: String,
    /// File the path resolved to.
    pub file: PathBuf,
    pub text: String,
}

/// Finds documents under a docs root. Every call looks at the filesystem
/// afresh.
#[derive(Debug, Clone)]
pub struct DocumentResolver {
    docs_dir: PathBuf,
}

impl DocumentResolver {
    pub fn new<P: AsRef<Path>>(docs_dir: P) -> Self {
        Self {
            docs_dir: docs_dir.as_ref().to_path_buf(),
        }
    }

    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Resolve `path` and read its text.
    ///
    /// `None` means there is no such document, which is an ordinary outcome.
    pub fn resolve(&self, path: &str) -> Option<SourceDocument> {
        let file = self.locate(path)?;

        let text = match std::fs::read_to_string(&file) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(path = %file.display(), error = %e, "failed to read document");
                return None;
            }
        };

        Some(SourceDocument {
            path: path.to_owned(),
            file,
            text,
        })
    }

    /// File backing `path`, if it exists.
    pub fn locate(&self, path: &str) -> Option<PathBuf> {
        let candidate = if path.is_empty() || path == INDEX_PATH {
            self.index_file()
        } else {
            self.suffix_match(path)
                .unwrap_or_else(|| self.docs_dir.join(format!("{path}.md")))
        };

        tracing::debug!(path, file = %candidate.display(), "resolved document path");
        candidate.is_file().then_some(candidate)
    }

    fn index_file(&self) -> PathBuf {
        let primary = self.docs_dir.join(INDEX_FILES[0]);
        if primary.exists() {
            primary
        } else {
            self.docs_dir.join(INDEX_FILES[1])
        }
    }

    /// First top-level markdown file whose stem equals or ends with `path`,
    /// in directory enumeration order.
    fn suffix_match(&self, path: &str) -> Option<PathBuf> {
        std::fs::read_dir(&self.docs_dir)
            .ok()?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "md"))
            .find(|p| {
                p.file_stem()
                    .map(|stem| stem.to_string_lossy())
                    .is_some_and(|stem| stem == path || stem.ends_with(path))
            })
    }

    /// Read the source of every navigation entry, in navigation order.
    ///
    /// Returns `(title, text)` pairs; entries whose file has gone missing
    /// are skipped.
    pub fn collect(&self, navigation: &Navigation) -> Vec<(String, String)> {
        navigation
            .iter()
            .filter_map(|entry| {
                let file = self.docs_dir.join(&entry.file);
                match std::fs::read_to_string(&file) {
                    Ok(text) => Some((entry.title.clone(), text)),
                    Err(e) => {
                        tracing::debug!(path = %file.display(), error = %e, "skipping missing export source");
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::NavigationBuilder;
    use tempfile::TempDir;

    fn docs(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(path, content).unwrap();
        }
        dir
    }

    #[test]
    fn test_root_resolves_primary_index() {
        let dir = docs(&[("01-index.md", "# Primary"), ("index.md", "# Fallback")]);
        let resolver = DocumentResolver::new(dir.path());

        let doc = resolver.resolve("").unwrap();
        assert_eq!(doc.text, "# Primary");
        assert_eq!(doc.path, "");
        assert_eq!(resolver.resolve("index").unwrap().text, "# Primary");
    }

    #[test]
    fn test_root_falls_back_to_plain_index() {
        let dir = docs(&[("index.md", "# Fallback")]);
        let doc = DocumentResolver::new(dir.path()).resolve("").unwrap();
        assert_eq!(doc.text, "# Fallback");
    }

    #[test]
    fn test_root_without_index_is_none() {
        let dir = docs(&[("setup.md", "# Setup")]);
        assert!(DocumentResolver::new(dir.path()).resolve("").is_none());
    }

    #[test]
    fn test_suffix_match() {
        let dir = docs(&[("02-setup.md", "# Setup")]);
        let doc = DocumentResolver::new(dir.path()).resolve("setup").unwrap();
        assert_eq!(doc.file, dir.path().join("02-setup.md"));
        assert_eq!(doc.path, "setup");
    }

    #[test]
    fn test_exact_stem_match() {
        let dir = docs(&[("guide.md", "# Guide")]);
        assert_eq!(DocumentResolver::new(dir.path()).resolve("guide").unwrap().text, "# Guide");
    }

    #[test]
    fn test_direct_nested_lookup() {
        let dir = docs(&[("guides/deploy.md", "# Deploy")]);
        let doc = DocumentResolver::new(dir.path()).resolve("guides/deploy").unwrap();
        assert_eq!(doc.text, "# Deploy");
    }

    #[test]
    fn test_missing_document_is_none() {
        let dir = docs(&[("guide.md", "# Guide")]);
        assert!(DocumentResolver::new(dir.path()).resolve("missing").is_none());
    }

    #[test]
    fn test_missing_docs_dir_is_none() {
        assert!(DocumentResolver::new("/nonexistent/docs").resolve("x").is_none());
    }

    #[test]
    fn test_collect_follows_navigation() {
        let dir = docs(&[("02-b.md", "# B\nbody b"), ("01-a.md", "# A\nbody a")]);
        let nav = NavigationBuilder::new(dir.path()).build();
        std::fs::remove_file(dir.path().join("02-b.md")).unwrap();

        let collected = DocumentResolver::new(dir.path()).collect(&nav);
        assert_eq!(collected, vec![("A".to_owned(), "# A\nbody a".to_owned())]);
    }
}
