use std::path::Path;
use std::sync::{Arc, Mutex};

use docsite_core::export::{EngineError, RenderEngine};
use docsite_core::{ConfigHandle, ExportError, ResolvedTheme, Site};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A project directory with `config/config.yaml`, themes and docs.
struct Project {
    dir: TempDir,
}

impl Project {
    fn new(config: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let project = Self { dir };
        project.write(
            "config/config.yaml",
            &format!(
                "directories:\n  docs: {}\n  themes: {}\n{config}",
                project.path("docs").display(),
                project.path("config/themes").display()
            ),
        );
        std::fs::create_dir_all(project.path("docs")).unwrap();
        project
    }

    fn path(&self, relative: &str) -> std::path::PathBuf {
        self.dir.path().join(relative)
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn doc(&self, name: &str, content: &str) {
        self.write(&format!("docs/{name}"), content);
    }

    fn theme(&self, name: &str, primary: &str) {
        let colors = [
            "primary_color",
            "secondary_color",
            "background_color",
            "surface_color",
            "text_color",
            "text_secondary",
            "accent_color",
            "border_color",
            "code_background",
            "link_color",
            "link_hover",
        ];
        let mut yaml = format!("name: {name}\ndescription: The {name} theme\nauthor: Tester\ncolors:\n");
        for (i, key) in colors.iter().enumerate() {
            let value = if i == 0 { primary.to_owned() } else { "#000000".to_owned() };
            yaml.push_str(&format!("  {key}: \"{value}\"\n"));
        }
        self.write(&format!("config/themes/{name}.yaml"), &yaml);
    }

    fn config(&self) -> ConfigHandle {
        ConfigHandle::open(self.path("config/config.yaml"))
    }

    fn site(&self) -> Site {
        Site::new(self.config())
    }
}

fn primary(config: &ConfigHandle) -> String {
    match &config.snapshot().theme {
        ResolvedTheme::Palette(theme) => theme.primary_color.clone(),
        ResolvedTheme::Variants(_) => panic!("expected a palette"),
    }
}

#[test]
fn partial_override_keeps_every_other_default() {
    let project = Project::new("server:\n  port: 8080\n");
    let config = project.config();

    assert_eq!(config.get("server.port", 0u16), 8080);
    assert_eq!(config.get("server.host", String::new()), "0.0.0.0");
    assert!(config.get("server.debug", false));
    assert_eq!(config.get("site_name", String::new()), "Documentation");
    assert_eq!(config.get("missing.key", 7), 7);
}

#[test]
fn unknown_theme_name_falls_back_to_default_file() {
    let project = Project::new("theme_name: nonexistent\n");
    project.theme("default", "#defa17");
    project.theme("ocean", "#0cea40");

    assert_eq!(primary(&project.config()), "#defa17");
}

#[test]
fn theme_switch_and_reload() {
    let project = Project::new("theme_name: default\n");
    project.theme("default", "#defa17");
    project.theme("ocean", "#0cea40");
    let config = project.config();

    assert!(config.switch_theme("ocean"));
    assert_eq!(primary(&config), "#0cea40");
    assert!(!config.switch_theme("nope"));
    assert_eq!(primary(&config), "#0cea40");

    config.reload();
    assert_eq!(primary(&config), "#defa17");
    assert_eq!(config.available_themes().keys().collect::<Vec<_>>(), vec!["default", "ocean"]);
}

#[test]
fn filename_prefix_beats_front_matter_order() {
    let project = Project::new("");
    project.doc("01-intro.md", "---\norder: 5\n---\n# Intro\n");
    project.doc("02-setup.md", "# Setup\n");
    project.doc("zeta.md", "---\norder: 3\n---\n# Zeta\n");

    let navigation = project.site().navigation();
    let titles: Vec<_> = navigation.iter().map(|e| (e.order, e.title.as_str())).collect();
    // No heading on the first line, so the title is the stem minus its prefix
    assert_eq!(titles, vec![(1, "intro"), (2, "Setup"), (3, "zeta")]);
}

#[test]
fn heading_prefix_is_stripped_from_titles() {
    let project = Project::new("");
    project.doc("03-getting-started.md", "# 03 Getting Started\n");

    let navigation = project.site().navigation();
    assert_eq!(navigation.entries()[0].title, "Getting Started");
    assert_eq!(navigation.entries()[0].order, 3);
}

#[test]
fn equal_order_sorts_case_insensitively() {
    let project = Project::new("");
    project.doc("b.md", "# banana\n");
    project.doc("a.md", "# Apple\n");

    let titles: Vec<_> = project.site().navigation().titles().map(str::to_owned).collect();
    assert_eq!(titles, vec!["Apple", "banana"]);
}

#[test]
fn suffix_resolution_and_index() {
    let project = Project::new("site_name: Handbook\n");
    project.doc("01-index.md", "# Welcome\n");
    project.doc("02-setup.md", "---\ntitle: Setup\n---\n# Setup\nInstall.\n");

    let site = project.site();
    let page = site.document("setup").unwrap();
    assert_eq!(page.title, "Setup - Handbook");
    assert!(page.document.html.contains("Install."));
    assert_eq!(page.prev.map(|e| e.title), Some("Welcome".to_owned()));

    let index = site.document("").unwrap();
    assert!(index.document.html.contains("Welcome"));
    assert!(site.document("missing").is_none());
}

#[test]
fn docs_are_rescanned_on_every_call() {
    let project = Project::new("");
    let site = project.site();
    assert!(site.navigation().is_empty());

    project.doc("late.md", "# Late\n");
    assert_eq!(site.navigation().len(), 1);
    assert!(site.document("late").is_some());
}

#[test]
fn qmd_export_of_two_documents() {
    let project = Project::new("site_name: My Docs\nauthor: Ada\n");
    project.doc("01-intro.md", "# Intro\nHello\n");
    project.doc("02-setup.md", "---\ntitle: Setup\n---\nInstall\n");

    let artifact = project.site().export_qmd_all().unwrap();
    let text = artifact.text();

    assert_eq!(artifact.filename, "My_Docs_documentation.qmd");
    assert!(text.starts_with("---\ntitle: \"My Docs\"\n"));
    assert!(text.contains("author: \"Ada\""));
    assert!(text.contains("---\n\n\n# Intro\nHello"));
    assert_eq!(text.matches("\n\n# setup\n\n").count(), 1);
    assert!(!text.contains("title: Setup"));
}

#[test]
fn export_project_name_overrides_site_name() {
    let project = Project::new("site_name: Site\nexport:\n  qmd:\n    project_name: Manual\n");
    project.doc("a.md", "# A\n");

    assert_eq!(project.site().export_qmd_all().unwrap().filename, "Manual_documentation.qmd");
}

#[test]
fn export_with_no_documents_fails() {
    let project = Project::new("");
    let site = project.site();

    assert!(matches!(site.export_qmd_all(), Err(ExportError::NoDocuments)));
    assert!(matches!(site.export_quarto_project(), Err(ExportError::NoDocuments)));
}

#[test]
fn pdf_export_without_engine_is_unavailable() {
    let project = Project::new("");
    assert!(matches!(
        project.site().export_pdf_all(),
        Err(ExportError::CapabilityUnavailable(_))
    ));
}

#[derive(Default)]
struct CapturingEngine {
    html: Mutex<Option<String>>,
}

impl RenderEngine for CapturingEngine {
    fn name(&self) -> &str {
        "capture"
    }

    fn render_pdf(&self, html: &str) -> Result<Vec<u8>, EngineError> {
        *self.html.lock().unwrap() = Some(html.to_owned());
        Ok(b"%PDF-1.7".to_vec())
    }
}

#[test]
fn pdf_export_renders_documents_in_navigation_order() {
    let project = Project::new("site_name: Guide\nauthor: Ada\n");
    project.doc("02-b.md", "# Second\n");
    project.doc("01-a.md", "# First\n");

    let engine = Arc::new(CapturingEngine::default());
    let shared: Arc<dyn RenderEngine> = engine.clone();
    let site = project.site().with_engine(Some(shared));

    let artifact = site.export_pdf_all().unwrap();
    assert_eq!(artifact.bytes, b"%PDF-1.7");
    assert_eq!(artifact.filename, "Guide_documentation.pdf");

    let html = engine.html.lock().unwrap().clone().unwrap();
    let first = html.find(">First</h1>").unwrap();
    let second = html.find(">Second</h1>").unwrap();
    assert!(first < second);
    assert!(html.contains("<li class=\"pdf-toc-item\">First</li>"));
    assert!(html.contains("By Ada"));
}

#[test]
fn quarto_project_has_one_chapter_per_document() {
    let project = Project::new("");
    project.doc("a.md", "# A\n");
    project.doc("b.md", "# B\n");

    let files = project.site().export_quarto_project().unwrap();
    let names: Vec<_> = files.iter().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["_quarto.yml", "chapter_1.qmd", "chapter_2.qmd"]);
}

#[test]
fn malformed_config_keeps_defaults() {
    let project = Project::new("");
    project.write("config/config.yaml", "site_name: [unclosed\n");

    let config = project.config();
    assert_eq!(config.snapshot().site_name, "Documentation");
    assert_eq!(config.snapshot().directories.docs, Path::new("docs"));
}
