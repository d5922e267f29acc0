use std::sync::Arc;

use serde::Serialize;

use super::templates::PDF_DOCUMENT;
use super::{Artifact, Byline, ExportDocument, ExportError, ExportJob, ExportTemplates, Exporter, RenderEngine, file_stem};

const MIME_TYPE: &str = "application/pdf";
const PRINT_STYLES: &str = include_str!("print.css");

#[derive(Serialize)]
struct DocumentContext<'a> {
    project_name: &'a str,
    author: &'a str,
    date: String,
    styles: &'static str,
    toc_title: &'static str,
    toc: Vec<&'a str>,
    sections: Vec<&'a str>,
}

/// Assembles rendered HTML into a printable book and hands it to a
/// [`RenderEngine`].
pub struct PdfExporter {
    engine: Option<Arc<dyn RenderEngine>>,
    templates: ExportTemplates,
    byline: Byline,
}

impl PdfExporter {
    pub fn new(engine: Option<Arc<dyn RenderEngine>>, byline: Byline) -> Result<Self, ExportError> {
        Ok(Self {
            engine,
            templates: ExportTemplates::new()?,
            byline,
        })
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    /// Fail with [`ExportError::CapabilityUnavailable`] when there is no engine.
    pub fn ensure_available(&self) -> Result<(), ExportError> {
        self.engine().map(|_| ())
    }

    fn engine(&self) -> Result<&dyn RenderEngine, ExportError> {
        self.engine.as_deref().ok_or_else(|| {
            ExportError::CapabilityUnavailable("install weasyprint and make sure it is on PATH".to_owned())
        })
    }

    /// The complete HTML for a multi-document export.
    pub fn assemble(&self, job: &ExportJob) -> Result<String, ExportError> {
        let context = DocumentContext {
            project_name: &job.project_name,
            author: &self.byline.author,
            date: self.byline.date.format("%B %d, %Y").to_string(),
            styles: PRINT_STYLES,
            toc_title: "Table of Contents",
            toc: job.navigation.titles().collect(),
            sections: job.documents.iter().map(|doc| doc.html.as_str()).collect(),
        };
        Ok(self.templates.render(PDF_DOCUMENT, &context)?)
    }

    /// One document with its own cover page.
    pub fn export_document(&self, document: &ExportDocument, project_name: &str) -> Result<Artifact, ExportError> {
        let engine = self.engine()?;

        let context = DocumentContext {
            project_name,
            author: &self.byline.author,
            date: self.byline.date.format("%B %d, %Y").to_string(),
            styles: PRINT_STYLES,
            toc_title: "Contents",
            toc: Vec::new(),
            sections: vec![document.html.as_str()],
        };
        let html = self.templates.render(PDF_DOCUMENT, &context)?;

        Ok(Artifact {
            bytes: engine.render_pdf(&html)?,
            filename: format!("{}.pdf", file_stem(&document.title)),
            mime_type: MIME_TYPE,
        })
    }
}

impl Exporter for PdfExporter {
    fn export(&self, job: &ExportJob) -> Result<Artifact, ExportError> {
        let engine = self.engine()?;
        job.ensure_documents()?;

        let html = self.assemble(job)?;
        let bytes = engine.render_pdf(&html)?;

        tracing::info!(documents = job.documents.len(), engine = engine.name(), "exported pdf");
        Ok(Artifact {
            bytes,
            filename: format!("{}_documentation.pdf", file_stem(&job.project_name)),
            mime_type: MIME_TYPE,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::EngineError;
    use crate::navigation::{NavEntry, Navigation};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Records the HTML it was given and returns it as the "PDF".
    #[derive(Default)]
    struct EchoEngine {
        seen: Mutex<Vec<String>>,
    }

    impl RenderEngine for EchoEngine {
        fn name(&self) -> &str {
            "echo"
        }

        fn render_pdf(&self, html: &str) -> Result<Vec<u8>, EngineError> {
            self.seen.lock().unwrap().push(html.to_owned());
            Ok(html.as_bytes().to_vec())
        }
    }

    fn byline() -> Byline {
        Byline {
            author: "Ada".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
        }
    }

    fn entry(title: &str, order: i64) -> NavEntry {
        NavEntry {
            title: title.into(),
            path: title.to_lowercase(),
            file: format!("{}.md", title.to_lowercase()).into(),
            order,
        }
    }

    fn job() -> ExportJob {
        ExportJob {
            documents: vec![
                ExportDocument::new("Intro", "").with_html("<h1>Intro</h1>"),
                ExportDocument::new("Setup", "").with_html("<h1>Setup</h1>"),
            ],
            navigation: Navigation::new(vec![entry("Intro", 1), entry("Setup", 2)]),
            project_name: "My Project".into(),
        }
    }

    #[test]
    fn test_unavailable_engine_fails_before_anything_else() {
        let exporter = PdfExporter::new(None, byline()).unwrap();
        assert!(!exporter.is_available());

        let empty = ExportJob::default();
        assert!(matches!(exporter.export(&empty), Err(ExportError::CapabilityUnavailable(_))));
        assert!(matches!(
            exporter.export_document(&ExportDocument::default(), "x"),
            Err(ExportError::CapabilityUnavailable(_))
        ));
    }

    #[test]
    fn test_no_documents() {
        let engine: Arc<dyn RenderEngine> = Arc::new(EchoEngine::default());
        let exporter = PdfExporter::new(Some(engine), byline()).unwrap();
        assert!(matches!(exporter.export(&ExportJob::default()), Err(ExportError::NoDocuments)));
    }

    #[test]
    fn test_assembled_html() {
        let engine = Arc::new(EchoEngine::default());
        let shared: Arc<dyn RenderEngine> = engine.clone();
        let exporter = PdfExporter::new(Some(shared), byline()).unwrap();

        let artifact = exporter.export(&job()).unwrap();
        assert_eq!(artifact.filename, "My_Project_documentation.pdf");
        assert_eq!(artifact.mime_type, "application/pdf");

        let html = engine.seen.lock().unwrap().pop().unwrap();
        assert!(html.contains("<h1 class=\"pdf-title\">My Project</h1>"));
        assert!(html.contains("By Ada"));
        assert!(html.contains("March 09, 2024"));
        assert!(html.contains("<li class=\"pdf-toc-item\">Intro</li>"));
        assert!(html.contains("<div class=\"\"><h1>Intro</h1></div>"));
        assert!(html.contains("<div class=\"pdf-doc-section\"><h1>Setup</h1></div>"));
        assert!(html.contains("@page"));
    }

    #[test]
    fn test_single_document() {
        let engine = Arc::new(EchoEngine::default());
        let shared: Arc<dyn RenderEngine> = engine.clone();
        let exporter = PdfExporter::new(Some(shared), byline()).unwrap();

        let doc = ExportDocument::new("Getting Started", "").with_html("<p>hi</p>");
        let artifact = exporter.export_document(&doc, "Docs").unwrap();
        assert_eq!(artifact.filename, "Getting_Started.pdf");

        let html = artifact.text();
        assert!(html.contains("<h2 class=\"pdf-toc-title\">Contents</h2>"));
        assert!(!html.contains("<ul class=\"pdf-toc-list\">"));
        assert!(html.contains("<p>hi</p>"));
    }

    #[test]
    fn test_engine_failure_propagates() {
        struct Broken;
        impl RenderEngine for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn render_pdf(&self, _: &str) -> Result<Vec<u8>, EngineError> {
                Err(EngineError::Failed {
                    program: "broken".into(),
                    code: 1,
                    message: "no fonts".into(),
                })
            }
        }

        let engine: Arc<dyn RenderEngine> = Arc::new(Broken);
        let exporter = PdfExporter::new(Some(engine), byline()).unwrap();
        let err = exporter.export(&job()).unwrap_err();
        assert!(err.to_string().contains("no fonts"));
    }
}
