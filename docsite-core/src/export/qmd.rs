use serde::Serialize;

use super::templates::{QMD_FRONTMATTER, QMD_TRAILER, QUARTO_PROJECT, yaml_quoted};
use super::{Artifact, Byline, ExportDocument, ExportError, ExportJob, ExportTemplates, Exporter, file_stem};
use crate::frontmatter;

const MIME_TYPE: &str = "text/markdown";
const PROJECT_FILE: &str = "_quarto.yml";

#[derive(Serialize)]
struct FrontmatterContext<'a> {
    title: String,
    author: String,
    date: String,
    format: &'a str,
}

#[derive(Serialize)]
struct ProjectContext {
    title: String,
    author: String,
    date: String,
    chapters: Vec<String>,
}

/// Concatenates raw markdown into Quarto (`.qmd`) documents.
pub struct QmdExporter {
    templates: ExportTemplates,
    byline: Byline,
}

impl QmdExporter {
    pub fn new(byline: Byline) -> Result<Self, ExportError> {
        Ok(Self {
            templates: ExportTemplates::new()?,
            byline,
        })
    }

    /// YAML header opening every exported document.
    pub fn frontmatter(&self, title: &str) -> Result<String, ExportError> {
        let context = FrontmatterContext {
            title: yaml_quoted(title),
            author: yaml_quoted(&self.byline.author),
            date: self.byline.date.format("%Y-%m-%d").to_string(),
            format: "pdf",
        };
        Ok(self.templates.render(QMD_FRONTMATTER, &context)?)
    }

    fn trailer(&self, filename: &str) -> Result<String, ExportError> {
        Ok(self
            .templates
            .render(QMD_TRAILER, &serde_json::json!({ "filename": filename }))?)
    }

    /// One document on its own, titled by the document.
    pub fn export_document(&self, document: &ExportDocument) -> Result<Artifact, ExportError> {
        let filename = format!("{}.qmd", file_stem(&document.title));

        let mut out = self.frontmatter(&document.title)?;
        out.push('\n');
        out.push_str(frontmatter::strip(&document.markdown));
        out.push_str("\n\n");
        out.push_str(&self.trailer(&filename)?);

        Ok(Artifact {
            bytes: out.into_bytes(),
            filename,
            mime_type: MIME_TYPE,
        })
    }

    /// A Quarto book project: `_quarto.yml` followed by one chapter per
    /// document.
    pub fn export_project(&self, job: &ExportJob) -> Result<Vec<Artifact>, ExportError> {
        job.ensure_documents()?;

        let chapters: Vec<String> = (1..=job.documents.len())
            .map(|n| format!("chapter_{n}.qmd"))
            .collect();

        let context = ProjectContext {
            title: yaml_quoted(&job.project_name),
            author: yaml_quoted(&self.byline.author),
            date: self.byline.date.format("%Y-%m-%d").to_string(),
            chapters: chapters.clone(),
        };
        let config = self.templates.render(QUARTO_PROJECT, &context)?;

        let mut files = vec![Artifact {
            bytes: config.into_bytes(),
            filename: PROJECT_FILE.to_owned(),
            mime_type: "application/yaml",
        }];

        for (document, filename) in job.documents.iter().zip(chapters) {
            let body = format!("# {}\n\n{}\n", document.title, frontmatter::strip(&document.markdown));
            files.push(Artifact {
                bytes: body.into_bytes(),
                filename,
                mime_type: MIME_TYPE,
            });
        }

        tracing::info!(chapters = files.len() - 1, "exported quarto project");
        Ok(files)
    }
}

impl Exporter for QmdExporter {
    /// Every document in one `.qmd`, in job order.
    fn export(&self, job: &ExportJob) -> Result<Artifact, ExportError> {
        job.ensure_documents()?;

        let filename = format!("{}_documentation.qmd", file_stem(&job.project_name));

        let mut out = self.frontmatter(&job.project_name)?;
        out.push('\n');

        for (i, document) in job.documents.iter().enumerate() {
            if i > 0 {
                out.push_str("\n\n# ");
                out.push_str(&document.title);
                out.push_str("\n\n");
            }
            out.push_str(frontmatter::strip(&document.markdown));
            out.push_str("\n\n");
        }

        out.push_str(&self.trailer(&filename)?);

        tracing::info!(documents = job.documents.len(), %filename, "exported qmd");
        Ok(Artifact {
            bytes: out.into_bytes(),
            filename,
            mime_type: MIME_TYPE,
        })
    }
}
