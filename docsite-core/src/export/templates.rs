use serde::Serialize;
use tera::{Context, Tera};

/// Templates for the text synthesized around exported content.
///
/// `.html` templates are autoescaped by Tera; bodies that are already HTML
/// go through the `safe` filter.
pub struct ExportTemplates {
    tera: Tera,
}

pub(crate) const QMD_FRONTMATTER: &str = "frontmatter.qmd";
pub(crate) const QMD_TRAILER: &str = "trailer.qmd";
pub(crate) const QUARTO_PROJECT: &str = "_quarto.yml";
pub(crate) const PDF_DOCUMENT: &str = "document.html";

const FRONTMATTER_TEMPLATE: &str = r#"---
title: "{{ title }}"
subtitle: "Documentation"
author: "{{ author }}"
date: "{{ date }}"
format:
  {{ format }}:
    documentclass: article
    papersize: a4
    geometry:
      - margin=2.5cm
    toc: true
    toc-depth: 3
    toc-title: "Table of Contents"
    number-sections: true
    colorlinks: true
    linkcolor: blue
    urlcolor: blue
    fig-pos: 'h'
    code-block-bg: true
    code-block-border-left: true
    highlight-style: github
---

"#;

const TRAILER_TEMPLATE: &str = "
<!--
To render this document to PDF:
  quarto render {{ filename }} --to pdf

To render to HTML:
  quarto render {{ filename }} --to html

To render to Word:
  quarto render {{ filename }} --to docx

For more information about Quarto, visit: https://quarto.org
-->
";

const QUARTO_PROJECT_TEMPLATE: &str = r#"project:
  type: book
  output-dir: _output

book:
  title: "{{ title }}"
  author: "{{ author }}"
  date: "{{ date }}"
  chapters:
{% for chapter in chapters %}    - {{ chapter }}
{% endfor %}
format:
  html:
    theme: cosmo
    toc: true
  pdf:
    documentclass: book
    toc: true
"#;

const PDF_DOCUMENT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{{ project_name }}</title>
<style>
{{ styles | safe }}
</style>
</head>
<body>
<div class="pdf-cover">
  <div class="pdf-cover-content">
    <h1 class="pdf-title">{{ project_name }}</h1>
    <div class="pdf-subtitle">Documentation</div>
    <div class="pdf-metadata">
      <p class="pdf-author">By {{ author }}</p>
      <p class="pdf-date">{{ date }}</p>
    </div>
  </div>
</div>
<div style="page-break-after: always;"></div>
<div class="pdf-toc">
  <h2 class="pdf-toc-title">{{ toc_title }}</h2>
{% if toc %}  <ul class="pdf-toc-list">
{% for title in toc %}    <li class="pdf-toc-item">{{ title }}</li>
{% endfor %}  </ul>
{% endif %}</div>
<div style="page-break-after: always;"></div>
<div class="pdf-content">
{% for section in sections %}<div class="{% if not loop.first %}pdf-doc-section{% endif %}">{{ section | safe }}</div>
{% endfor %}</div>
</body>
</html>
"#;

impl ExportTemplates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (QMD_FRONTMATTER, FRONTMATTER_TEMPLATE),
            (QMD_TRAILER, TRAILER_TEMPLATE),
            (QUARTO_PROJECT, QUARTO_PROJECT_TEMPLATE),
            (PDF_DOCUMENT, PDF_DOCUMENT_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    /// Render a template with a context built from `values`.
    pub fn render<T: Serialize>(&self, template: &str, values: &T) -> Result<String, tera::Error> {
        let context = Context::from_serialize(values)?;
        self.tera.render(template, &context)
    }
}

/// Escape a value for use inside a double-quoted YAML scalar.
pub(crate) fn yaml_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
