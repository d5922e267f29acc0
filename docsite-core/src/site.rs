//! The assembled site: configuration, navigation, pages and exports.

use std::sync::Arc;

use serde::Serialize;

use crate::config::{ConfigHandle, SiteConfig};
use crate::document::DocumentResolver;
use crate::export::{
    Artifact, Byline, ExportDocument, ExportError, ExportJob, Exporter, PdfExporter, QmdExporter, RenderEngine,
};
use crate::markdown::{MarkdownPipeline, RenderedDocument};
use crate::navigation::{NavEntry, Navigation, NavigationBuilder};

/// Everything needed to show one document.
#[derive(Debug, Clone, Serialize)]
pub struct PageView {
    pub document: RenderedDocument,
    /// `"<document title> - <site name>"`, or just the site name.
    pub title: String,
    pub prev: Option<NavEntry>,
    pub next: Option<NavEntry>,
}

pub struct Site {
    config: Arc<ConfigHandle>,
    engine: Option<Arc<dyn RenderEngine>>,
}

impl Site {
    pub fn new(config: ConfigHandle) -> Self {
        Self::shared(Arc::new(config))
    }

    pub fn shared(config: Arc<ConfigHandle>) -> Self {
        Self { config, engine: None }
    }

    /// Use `engine` for PDF exports.
    pub fn with_engine(mut self, engine: Option<Arc<dyn RenderEngine>>) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &ConfigHandle {
        &self.config
    }

    /// Navigation for the current docs directory, scanned afresh.
    pub fn navigation(&self) -> Navigation {
        let config = self.config.snapshot();
        NavigationBuilder::new(&config.directories.docs).build()
    }

    /// Render the document at `path`, or `None` if there is no such document.
    pub fn document(&self, path: &str) -> Option<PageView> {
        let config = self.config.snapshot();
        let source = DocumentResolver::new(&config.directories.docs).resolve(path)?;
        let document = pipeline(&config).convert(&source.text);

        let title = match document.title() {
            Some(title) => format!("{} - {}", title, config.site_name),
            None => config.site_name.clone(),
        };

        let navigation = NavigationBuilder::new(&config.directories.docs).build();
        let (prev, next) = navigation.neighbors(path);

        Some(PageView {
            title,
            prev: prev.cloned(),
            next: next.cloned(),
            document,
        })
    }

    /// All documents, in navigation order, as one Quarto document.
    pub fn export_qmd_all(&self) -> Result<Artifact, ExportError> {
        let config = self.config.snapshot();
        let job = collect_job(&config, false);
        QmdExporter::new(byline(&config))?.export(&job)
    }

    /// All documents, in navigation order, as one PDF.
    pub fn export_pdf_all(&self) -> Result<Artifact, ExportError> {
        let config = self.config.snapshot();
        let exporter = PdfExporter::new(self.engine.clone(), byline(&config))?;
        // Fail before rendering any markdown
        exporter.ensure_available()?;
        exporter.export(&collect_job(&config, true))
    }

    /// A Quarto book project: `_quarto.yml` and one chapter per document.
    pub fn export_quarto_project(&self) -> Result<Vec<Artifact>, ExportError> {
        let config = self.config.snapshot();
        let job = collect_job(&config, false);
        QmdExporter::new(byline(&config))?.export_project(&job)
    }

    /// The document at `path` as a standalone Quarto document.
    pub fn export_qmd_document(&self, path: &str) -> Result<Artifact, ExportError> {
        let config = self.config.snapshot();
        let document = single_document(&config, path, false).ok_or(ExportError::NoDocuments)?;
        QmdExporter::new(byline(&config))?.export_document(&document)
    }

    /// The document at `path` as a standalone PDF.
    pub fn export_pdf_document(&self, path: &str) -> Result<Artifact, ExportError> {
        let config = self.config.snapshot();
        let exporter = PdfExporter::new(self.engine.clone(), byline(&config))?;
        exporter.ensure_available()?;
        let document = single_document(&config, path, true).ok_or(ExportError::NoDocuments)?;
        exporter.export_document(&document, config.project_name())
    }
}

fn pipeline(config: &SiteConfig) -> MarkdownPipeline {
    MarkdownPipeline::new().syntax_highlighting(config.features.syntax_highlighting)
}

fn byline(config: &SiteConfig) -> Byline {
    Byline::today(config.author.clone())
}

/// Read every navigation entry's source, rendering HTML when asked.
fn collect_job(config: &SiteConfig, render: bool) -> ExportJob {
    let navigation = NavigationBuilder::new(&config.directories.docs).build();
    let sources = DocumentResolver::new(&config.directories.docs).collect(&navigation);

    let mut pipeline = pipeline(config);
    let documents = sources
        .into_iter()
        .map(|(title, markdown)| {
            let html = if render { pipeline.convert(&markdown).html } else { String::new() };
            ExportDocument::new(title, markdown).with_html(html)
        })
        .collect();

    ExportJob {
        documents,
        navigation,
        project_name: config.project_name().to_owned(),
    }
}

fn single_document(config: &SiteConfig, path: &str, render: bool) -> Option<ExportDocument> {
    let source = DocumentResolver::new(&config.directories.docs).resolve(path)?;
    let navigation = NavigationBuilder::new(&config.directories.docs).build();

    let mut pipeline = pipeline(config);
    let rendered = pipeline.convert(&source.text);

    let title = navigation
        .iter()
        .find(|entry| entry.matches(path))
        .map(|entry| entry.title.clone())
        .or_else(|| rendered.title().map(str::to_owned))
        .unwrap_or_else(|| config.project_name().to_owned());

    let html = if render { rendered.html } else { String::new() };
    Some(ExportDocument::new(title, source.text).with_html(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site(files: &[(&str, &str)]) -> (TempDir, Site) {
        let dir = TempDir::new().unwrap();
        let docs = dir.path().join("docs");
        std::fs::create_dir_all(&docs).unwrap();
        for (name, content) in files {
            std::fs::write(docs.join(name), content).unwrap();
        }
        let config_path = dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            format!(
                "site_name: Handbook\ndirectories:\n  docs: {}\n  themes: {}\n",
                docs.display(),
                dir.path().join("themes").display()
            ),
        )
        .unwrap();
        let site = Site::new(ConfigHandle::open(&config_path));
        (dir, site)
    }

    #[test]
    fn test_page_title_from_metadata() {
        let (_dir, site) = site(&[("guide.md", "---\ntitle: Guide\n---\n# Guide\n")]);
        let page = site.document("guide").unwrap();
        assert_eq!(page.title, "Guide - Handbook");
        assert!(page.document.html.contains("<h1"));
    }

    #[test]
    fn test_page_title_falls_back_to_site_name() {
        let (_dir, site) = site(&[("guide.md", "# Guide\n")]);
        assert_eq!(site.document("guide").unwrap().title, "Handbook");
    }

    #[test]
    fn test_page_neighbors() {
        let (_dir, site) = site(&[("01-a.md", "# A\n"), ("02-b.md", "# B\n"), ("03-c.md", "# C\n")]);
        let page = site.document("b").unwrap();
        assert_eq!(page.prev.unwrap().title, "A");
        assert_eq!(page.next.unwrap().title, "C");
    }

    #[test]
    fn test_missing_page() {
        let (_dir, site) = site(&[("guide.md", "# Guide\n")]);
        assert!(site.document("nope").is_none());
    }

    #[test]
    fn test_exports_with_no_documents() {
        let (_dir, site) = site(&[]);
        assert!(matches!(site.export_qmd_all(), Err(ExportError::NoDocuments)));
        assert!(matches!(site.export_quarto_project(), Err(ExportError::NoDocuments)));
        assert!(matches!(site.export_qmd_document("x"), Err(ExportError::NoDocuments)));
    }

    #[test]
    fn test_pdf_without_engine_is_unavailable() {
        let (_dir, site) = site(&[("guide.md", "# Guide\n")]);
        assert!(matches!(site.export_pdf_all(), Err(ExportError::CapabilityUnavailable(_))));
        assert!(matches!(site.export_pdf_document("guide"), Err(ExportError::CapabilityUnavailable(_))));
    }

    #[test]
    fn test_single_qmd_uses_navigation_title() {
        let (_dir, site) = site(&[("02-setup.md", "# Setup\nInstall it.\n")]);
        let artifact = site.export_qmd_document("setup").unwrap();
        assert_eq!(artifact.filename, "Setup.qmd");
        assert!(artifact.text().contains("Install it."));
    }
}
