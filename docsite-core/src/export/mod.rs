//! Aggregating documents into downloadable artifacts.
//!
//! Two exporters share the [`Exporter`] contract:
//! - [`QmdExporter`] concatenates raw markdown into one Quarto document.
//! - [`PdfExporter`] assembles rendered HTML with a cover page and contents
//!   list, then hands it to an external [`RenderEngine`].
//!
//! An export with no documents is an error, never an empty artifact.

mod engine;
mod pdf;
mod qmd;
mod templates;

use chrono::NaiveDate;

use crate::navigation::Navigation;

pub use engine::{CommandEngine, EngineError, RenderEngine, detect_engine};
pub use pdf::PdfExporter;
pub use qmd::QmdExporter;
pub use templates::ExportTemplates;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("No documents found to export")]
    NoDocuments,

    #[error("PDF rendering is unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl ExportError {
    /// Whether the caller should treat this like a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoDocuments)
    }
}

/// One document going into an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportDocument {
    /// Navigation title.
    pub title: String,
    /// Raw markdown source.
    pub markdown: String,
    /// Rendered HTML body.
    pub html: String,
}

impl ExportDocument {
    pub fn new(title: impl Into<String>, markdown: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            markdown: markdown.into(),
            html: String::new(),
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportJob {
    pub documents: Vec<ExportDocument>,
    pub navigation: Navigation,
    pub project_name: String,
}

impl ExportJob {
    fn ensure_documents(&self) -> Result<(), ExportError> {
        if self.documents.is_empty() {
            return Err(ExportError::NoDocuments);
        }
        Ok(())
    }
}

/// A finished export: bytes plus a suggested download name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: &'static str,
}

impl Artifact {
    /// Artifact contents as text (lossy for binary formats).
    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

pub trait Exporter {
    fn export(&self, job: &ExportJob) -> Result<Artifact, ExportError>;
}

/// Author and date stamped onto generated artifacts.
#[derive(Debug, Clone)]
pub struct Byline {
    pub author: String,
    pub date: NaiveDate,
}

impl Byline {
    /// Byline dated today (local time).
    pub fn today(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            date: chrono::Local::now().date_naive(),
        }
    }
}

/// `My Project` -> `My_Project`.
fn file_stem(name: &str) -> String {
    name.replace(' ', "_")
}
