use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

use anyhow::Context;

use crate::{
    browser_controller::ChromeRenderer,
    types::{ExportError, RenderStatus},
};

/// Turns a normalized HTML document into a PDF file at `output`.
pub trait Renderer {
    fn name(&self) -> &str;

    fn render(&self, html: &str, output: &Path) -> Result<RenderStatus, ExportError>;
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Wkhtmltopdf,
    Chrome,
}

impl RendererKind {
    /// Builds the renderer, failing when its binary cannot be found.
    pub fn create(&self) -> anyhow::Result<Box<dyn Renderer>> {
        match self {
            RendererKind::Wkhtmltopdf => Ok(Box::new(Wkhtmltopdf::locate()?)),
            RendererKind::Chrome => Ok(Box::new(
                ChromeRenderer::new().context("could not launch chrome")?,
            )),
        }
    }
}

// page layout handed to wkhtmltopdf
const WKHTMLTOPDF_OPTIONS: [&str; 19] = [
    "--quiet",
    "--page-size",
    "Letter",
    "--margin-top",
    "0.50in",
    "--margin-right",
    "0.50in",
    "--margin-bottom",
    "0.50in",
    "--margin-left",
    "0.50in",
    "--load-error-handling",
    "ignore",
    "--load-media-error-handling",
    "ignore",
    "--disable-javascript",
    "--disable-local-file-access",
    "--zoom",
    "1.2",
];

pub struct Wkhtmltopdf {
    binary: PathBuf,
}

impl Wkhtmltopdf {
    pub fn locate() -> Result<Self, ExportError> {
        let binary = which::which("wkhtmltopdf")
            .map_err(|_| ExportError::RendererMissing("wkhtmltopdf".into()))?;
        debug!("using wkhtmltopdf at {:?}", binary);
        Ok(Wkhtmltopdf { binary })
    }

    /// Uses `binary` as is, without searching `PATH`.
    pub fn with_binary(binary: PathBuf) -> Self {
        Wkhtmltopdf { binary }
    }
}

impl Renderer for Wkhtmltopdf {
    fn name(&self) -> &str {
        "wkhtmltopdf"
    }

    fn render(&self, html: &str, output: &Path) -> Result<RenderStatus, ExportError> {
        let mut child = Command::new(&self.binary)
            .args(WKHTMLTOPDF_OPTIONS)
            .arg("-")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ExportError::Render(format!("could not spawn wkhtmltopdf: {}", e)))?;

        // stdin is fed from its own thread so a chatty stderr cannot block us
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ExportError::Render("wkhtmltopdf stdin unavailable".into()))?;
        let body = html.to_string();
        let writer = thread::spawn(move || stdin.write_all(body.as_bytes()));

        let out = child
            .wait_with_output()
            .map_err(|e| ExportError::Render(format!("wkhtmltopdf did not finish: {}", e)))?;
        match writer.join() {
            Ok(Err(e)) => debug!("wkhtmltopdf closed stdin early: {}", e),
            Err(_) => warn!("wkhtmltopdf stdin writer panicked"),
            Ok(Ok(())) => {}
        }

        let stderr = String::from_utf8_lossy(&out.stderr);
        if out.status.success() {
            return Ok(RenderStatus::Complete);
        }

        let reason = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| format!("wkhtmltopdf exited with {}", out.status));
        if produced_output(output) {
            Ok(RenderStatus::Degraded(reason))
        } else {
            Err(ExportError::Render(reason))
        }
    }
}

pub fn produced_output(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}
