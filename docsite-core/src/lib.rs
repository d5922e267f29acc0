pub mod config;
pub mod document;
pub mod export;
pub mod frontmatter;
pub mod markdown;
pub mod navigation;
pub mod site;
pub mod theme;

mod source;

// Re-export main types
pub use crate::config::{ConfigHandle, ConfigResolver, SiteConfig};
pub use document::{DocumentResolver, SourceDocument};
pub use export::{Artifact, ExportDocument, ExportError, ExportJob};
pub use markdown::{MarkdownPipeline, Metadata, RenderedDocument};
pub use navigation::{NavEntry, Navigation, NavigationBuilder};
pub use site::{PageView, Site};
pub use theme::{ResolvedTheme, Theme, ThemeInfo, ThemeLoader};
