use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to run `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with code {code}: {message}")]
    Failed {
        program: String,
        code: i32,
        message: String,
    },
}

/// Something that turns a complete HTML document into PDF bytes.
pub trait RenderEngine: Send + Sync {
    fn name(&self) -> &str;

    fn render_pdf(&self, html: &str) -> Result<Vec<u8>, EngineError>;
}

/// An external program that reads HTML on stdin and writes PDF to stdout.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `weasyprint - -`, if `weasyprint` is on `PATH`.
    pub fn weasyprint() -> Option<Self> {
        let program = which::which("weasyprint").ok()?;
        Some(Self::new(program, vec!["-".into(), "-".into()]))
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }
}

impl RenderEngine for CommandEngine {
    fn name(&self) -> &str {
        self.program
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("external")
    }

    fn render_pdf(&self, html: &str) -> Result<Vec<u8>, EngineError> {
        let program = self.program_name();
        let io_error = |source| EngineError::Io {
            program: program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(io_error)?;

        // Write stdin
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(html.as_bytes()).map_err(io_error)?;
        }

        let output = child.wait_with_output().map_err(io_error)?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(EngineError::Failed {
                program,
                code: output.status.code().unwrap_or(-1),
                message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

/// Look for an available PDF engine. Meant to be called once at startup.
pub fn detect_engine() -> Option<Arc<dyn RenderEngine>> {
    match CommandEngine::weasyprint() {
        Some(engine) => {
            tracing::info!(engine = %engine.program.display(), "PDF export enabled");
            Some(Arc::new(engine))
        }
        None => {
            tracing::warn!("weasyprint not found on PATH, PDF export disabled");
            None
        }
    }
}
