use anyhow::{anyhow, Context, Result};
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{browser::default_executable, Browser, LaunchOptions, Tab};
use reqwest::Url;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    renderer::Renderer,
    types::{ExportError, RenderStatus},
    utils::get_tmp_html_path,
};

/// Prints pages to PDF through a headless Chrome. The browser is started on
/// the first render and kept for the rest of the run.
pub struct ChromeRenderer {
    executable: PathBuf,
    browser: RefCell<Option<Browser>>,
}

impl ChromeRenderer {
    pub fn new() -> Result<Self> {
        let executable = default_executable()
            .map_err(|_| ExportError::RendererMissing("chrome".into()))?;
        debug!("using chrome at {:?}", executable);
        Ok(ChromeRenderer {
            executable,
            browser: RefCell::new(None),
        })
    }

    pub fn is_launched(&self) -> bool {
        self.browser.borrow().is_some()
    }

    fn launch(&self) -> Result<Browser> {
        let is_docker = std::env::var("IN_DOCKER").is_ok();
        let options = LaunchOptions::default_builder()
            .path(Some(self.executable.clone()))
            .idle_browser_timeout(Duration::from_secs(300))
            // warning only do this if in docker env
            .sandbox(!is_docker)
            .build()
            .map_err(|e| anyhow!("invalid chrome launch options: {}", e))?;
        let browser = Browser::new(options).context("browser launching error")?;
        debug!("chrome launched");
        Ok(browser)
    }

    fn with_browser<T>(&self, f: impl FnOnce(&Browser) -> Result<T>) -> Result<T> {
        let mut slot = self.browser.borrow_mut();
        if slot.is_none() {
            *slot = Some(self.launch()?);
        }
        match slot.as_ref() {
            Some(browser) => f(browser),
            None => Err(anyhow!("chrome is not running")),
        }
    }

    fn print(&self, html: &str) -> Result<Vec<u8>> {
        let tmp = get_tmp_html_path();
        fs::write(&tmp, html).context(format!("could not write {:?}", tmp))?;
        let url = Url::from_file_path(&tmp).map_err(|_| anyhow!("bad temporary path {:?}", tmp))?;

        let result = self.print_url(&url);

        if let Err(e) = fs::remove_file(&tmp) {
            debug!("could not remove {:?}: {}", tmp, e);
        }
        result
    }

    fn print_url(&self, url: &Url) -> Result<Vec<u8>> {
        self.with_browser(|browser| {
            let tab = browser.new_tab().context("could not create new tab")?;
            let pdf = Self::print_tab(&tab, url);
            // closed on every path, the browser outlives this record
            if let Err(e) = tab.close(true) {
                debug!("could not close tab: {}", e);
            }
            pdf
        })
    }

    fn print_tab(tab: &Tab, url: &Url) -> Result<Vec<u8>> {
        tab.navigate_to(url.as_str())?.wait_until_navigated()?;
        tab.print_to_pdf(Some(PrintToPdfOptions {
            paper_width: Some(8.5),
            paper_height: Some(11.0),
            margin_top: Some(0.5),
            margin_bottom: Some(0.5),
            margin_left: Some(0.5),
            margin_right: Some(0.5),
            print_background: Some(true),
            ..Default::default()
        }))
    }
}

impl Renderer for ChromeRenderer {
    fn name(&self) -> &str {
        "chrome"
    }

    fn render(&self, html: &str, output: &Path) -> Result<RenderStatus, ExportError> {
        let pdf = self
            .print(html)
            .map_err(|e| ExportError::Render(format!("chrome: {:#}", e)))?;
        fs::write(output, pdf)
            .map_err(|e| ExportError::Render(format!("could not write {:?}: {}", output, e)))?;
        Ok(RenderStatus::Complete)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    #[ignore = "needs chrome"]
    fn browser_starts_on_first_render() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let renderer = ChromeRenderer::new()?;
        assert!(!renderer.is_launched());

        for name in ["a.pdf", "b.pdf"] {
            let out = dir.path().join(name);
            assert_eq!(
                renderer.render("<html><body>hello</body></html>", &out)?,
                RenderStatus::Complete
            );
            assert!(fs::read(&out)?.starts_with(b"%PDF"));
        }
        assert!(renderer.is_launched());
        Ok(())
    }
}
