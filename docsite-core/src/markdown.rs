use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use pulldown_cmark::{BlockQuoteKind, CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use serde::Serialize;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::frontmatter;

// Initialize syntax highlighting resources once
static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const HIGHLIGHT_THEME: &str = "base16-ocean.dark";

/// Document metadata: each key maps to its values in order. The first value
/// is the canonical one.
pub type Metadata = BTreeMap<String, Vec<String>>;

/// Output of converting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenderedDocument {
    pub html: String,
    pub metadata: Metadata,
    pub toc: String,
}

impl RenderedDocument {
    /// First `title` metadata value, if any.
    pub fn title(&self) -> Option<&str> {
        self.metadata
            .get("title")
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone)]
struct TocHeading {
    level: u8,
    id: String,
    text: String,
}

/// Markdown to HTML converter.
///
/// Holds per-document state (heading ids seen so far, collected headings)
/// which is cleared at the start of every [`convert`](Self::convert), so one
/// pipeline can be reused across documents.
#[derive(Debug)]
pub struct MarkdownPipeline {
    highlight: bool,
    used_ids: HashSet<String>,
    headings: Vec<TocHeading>,
}

impl Default for MarkdownPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownPipeline {
    pub fn new() -> Self {
        Self {
            highlight: true,
            used_ids: HashSet::new(),
            headings: Vec::new(),
        }
    }

    /// Toggle syntect highlighting of fenced code blocks.
    pub fn syntax_highlighting(mut self, enabled: bool) -> Self {
        self.highlight = enabled;
        self
    }

    fn reset(&mut self) {
        self.used_ids.clear();
        self.headings.clear();
    }

    pub fn convert(&mut self, text: &str) -> RenderedDocument {
        self.reset();

        let (metadata, body) = match frontmatter::split(text) {
            Some((block, body)) => (parse_metadata(block), body),
            None => (Metadata::new(), text),
        };

        let source = expand_admonitions(body);
        let parser = Parser::new_ext(&source, options());

        let events: Vec<Event> = parser.collect();
        let mut processed_events = Vec::with_capacity(events.len());
        let mut i = 0;

        while i < events.len() {
            match &events[i] {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    // Gather the heading's inline events to derive its text
                    let start = i + 1;
                    let mut end = start;
                    let mut text = String::new();
                    while end < events.len() {
                        match &events[end] {
                            Event::End(TagEnd::Heading(_)) => break,
                            Event::Text(t) | Event::Code(t) => text.push_str(t),
                            _ => {}
                        }
                        end += 1;
                    }

                    let id = match id {
                        Some(id) => self.register_id(id),
                        None => self.register_id(&slugify(&text)),
                    };
                    self.headings.push(TocHeading {
                        level: *level as u8,
                        id: id.clone(),
                        text: text.trim().to_owned(),
                    });

                    processed_events.push(Event::Start(Tag::Heading {
                        level: *level,
                        id: Some(id.into()),
                        classes: classes.clone(),
                        attrs: attrs.clone(),
                    }));
                    processed_events.extend(events[start..end].iter().cloned());
                    if end < events.len() {
                        processed_events.push(events[end].clone());
                    }
                    i = end;
                }
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
                        CodeBlockKind::Indented => "",
                    };

                    // Collect all text events until the end of the code block
                    let mut code_content = String::new();
                    i += 1;
                    while i < events.len() {
                        match &events[i] {
                            Event::End(TagEnd::CodeBlock) => break,
                            Event::Text(text) => code_content.push_str(text),
                            _ => {}
                        }
                        i += 1;
                    }

                    processed_events.push(Event::Html(self.code_block(lang, &code_content).into()));
                }
                Event::Start(Tag::BlockQuote(Some(kind))) => {
                    let (class, title) = alert_labels(*kind);
                    processed_events.push(Event::Html(admonition_open(class, Some(title)).into()));
                }
                Event::End(TagEnd::BlockQuote(Some(_))) => {
                    processed_events.push(Event::Html("</div>\n".into()));
                }
                event => processed_events.push(event.clone()),
            }
            i += 1;
        }

        let mut out = String::new();
        html::push_html(&mut out, processed_events.into_iter());

        RenderedDocument {
            html: out,
            metadata,
            toc: render_toc(&self.headings),
        }
    }

    /// Reserve a unique heading id, suffixing `_1`, `_2`, ... on collisions.
    fn register_id(&mut self, base: &str) -> String {
        let base = if base.is_empty() { "section" } else { base };
        let mut id = base.to_owned();
        let mut n = 1;
        while self.used_ids.contains(&id) {
            id = format!("{base}_{n}");
            n += 1;
        }
        self.used_ids.insert(id.clone());
        id
    }

    fn code_block(&self, lang: &str, code: &str) -> String {
        let plain = || {
            let class = if lang.is_empty() {
                String::new()
            } else {
                format!(" class=\"language-{}\"", html_escape::encode_double_quoted_attribute(lang))
            };
            format!("<pre><code{class}>{}</code></pre>\n", html_escape::encode_text(code))
        };

        if !self.highlight || lang.is_empty() {
            return plain();
        }

        let syntax = SYNTAX_SET.find_syntax_by_token(lang).or_else(|| {
            // Fallback mappings for unsupported languages
            match lang {
                "toml" => SYNTAX_SET.find_syntax_by_name("YAML"),
                "jsonc" => SYNTAX_SET.find_syntax_by_name("JSON"),
                _ => None,
            }
        });

        match syntax {
            Some(syntax) => {
                let theme = &THEME_SET.themes[HIGHLIGHT_THEME];
                highlighted_html_for_string(code, &SYNTAX_SET, syntax, theme)
                    .map(|highlighted| format!("<div class=\"codehilite\">{highlighted}</div>\n"))
                    .unwrap_or_else(|_| plain())
            }
            None => plain(),
        }
    }
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

/// Convert a YAML block into ordered string values per lowercased key.
///
/// Anything that is not a YAML mapping yields no metadata.
fn parse_metadata(block: &str) -> Metadata {
    let mapping = match serde_yaml::from_str::<serde_yaml::Value>(block) {
        Ok(serde_yaml::Value::Mapping(mapping)) => mapping,
        Ok(_) => return Metadata::new(),
        Err(e) => {
            tracing::debug!(error = %e, "ignoring malformed metadata block");
            return Metadata::new();
        }
    };

    mapping
        .into_iter()
        .filter_map(|(key, value)| {
            let key = scalar_to_string(&key)?.to_lowercase();
            let values = match value {
                serde_yaml::Value::Sequence(items) => items.iter().filter_map(scalar_to_string).collect(),
                other => scalar_to_string(&other).into_iter().collect(),
            };
            Some((key, values))
        })
        .collect()
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => None,
        other => serde_yaml::to_string(other).ok().map(|s| s.trim().to_owned()),
    }
}

/// Heading slug: lowercase, word characters, spaces and hyphens kept, runs of
/// spaces/hyphens collapsed into a single hyphen.
pub fn slugify(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_lowercase();

    let mut slug = String::with_capacity(cleaned.len());
    let mut pending_sep = false;
    for c in cleaned.chars() {
        if c == '-' || c.is_whitespace() {
            pending_sep = true;
        } else {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.push(c);
        }
    }
    slug
}

fn render_toc(headings: &[TocHeading]) -> String {
    let Some(first) = headings.first() else {
        return String::new();
    };

    let mut out = String::from("<div class=\"toc\">\n<ul>\n");
    let mut levels = vec![first.level];

    for (i, heading) in headings.iter().enumerate() {
        if i > 0 {
            let current = levels.last().copied().unwrap_or(heading.level);
            if heading.level > current {
                out.push_str("\n<ul>\n");
                levels.push(heading.level);
            } else {
                out.push_str("</li>\n");
                // Close lists until the parent item is shallower than this heading
                while levels.len() > 1 && heading.level <= levels[levels.len() - 2] {
                    levels.pop();
                    out.push_str("</ul>\n</li>\n");
                }
                if let Some(top) = levels.last_mut() {
                    *top = (*top).min(heading.level);
                }
            }
        }
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            html_escape::encode_double_quoted_attribute(&heading.id),
            html_escape::encode_text(&heading.text)
        ));
    }

    out.push_str("</li>\n");
    while levels.len() > 1 {
        levels.pop();
        out.push_str("</ul>\n</li>\n");
    }
    out.push_str("</ul>\n</div>\n");
    out
}

fn alert_labels(kind: BlockQuoteKind) -> (&'static str, &'static str) {
    match kind {
        BlockQuoteKind::Note => ("note", "Note"),
        BlockQuoteKind::Tip => ("tip", "Tip"),
        BlockQuoteKind::Important => ("important", "Important"),
        BlockQuoteKind::Warning => ("warning", "Warning"),
        BlockQuoteKind::Caution => ("caution", "Caution"),
    }
}

fn admonition_open(kind: &str, title: Option<&str>) -> String {
    let mut html = format!(
        "<div class=\"admonition {}\">\n",
        html_escape::encode_double_quoted_attribute(kind)
    );
    if let Some(title) = title {
        html.push_str(&format!(
            "<p class=\"admonition-title\">{}</p>\n",
            html_escape::encode_text(title)
        ));
    }
    html
}

/// Rewrite `!!! type "Title"` blocks into HTML wrappers.
///
/// The indented body is dedented and left as markdown between the opening
/// and closing `<div>` so it is still converted. An explicit empty title
/// (`!!! note ""`) drops the title paragraph. Fenced code is left alone.
fn expand_admonitions(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let mut out = String::with_capacity(text.len());
    let mut fence: Option<&str> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();

        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
        } else if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            fence = Some(&trimmed[..3]);
        } else if let Some((kind, title)) = parse_admonition_header(line) {
            let mut body = String::new();
            i += 1;
            while i < lines.len() {
                let next = lines[i];
                if next.trim().is_empty() {
                    body.push('\n');
                } else if let Some(inner) = next.strip_prefix("    ").or_else(|| next.strip_prefix('\t')) {
                    body.push_str(inner);
                    body.push('\n');
                } else {
                    break;
                }
                i += 1;
            }

            out.push_str(&admonition_open(&kind, title.as_deref()));
            out.push('\n');
            out.push_str(body.trim_end());
            out.push_str("\n\n</div>\n\n");
            continue;
        }

        out.push_str(line);
        out.push('\n');
        i += 1;
    }

    out
}

/// Parse `!!! kind` or `!!! kind "Title"` into `(kind, title)`.
///
/// Without a quoted title the kind, capitalized, is used.
fn parse_admonition_header(line: &str) -> Option<(String, Option<String>)> {
    let rest = line.strip_prefix("!!!")?.trim();
    let (kind, title) = match rest.split_once(char::is_whitespace) {
        Some((kind, title)) => (kind, Some(title.trim())),
        None => (rest, None),
    };
    if kind.is_empty() || !kind.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
        return None;
    }

    let title = match title {
        Some(quoted) if quoted.len() >= 2 && quoted.starts_with('"') && quoted.ends_with('"') => {
            let inner = &quoted[1..quoted.len() - 1];
            if inner.is_empty() { None } else { Some(inner.to_owned()) }
        }
        _ => {
            let mut chars = kind.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect::<String>())
        }
    };

    Some((kind.to_lowercase(), title))
}
