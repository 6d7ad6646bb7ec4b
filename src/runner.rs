use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    config::ContentTypeSelector,
    fetcher::fetch_page,
    normalizer::Normalizer,
    renderer::{produced_output, Renderer},
    salsa::Session,
    types::{Record, RecordOutcome, RenderStatus, RunSummary},
    utils::{artifact_path, assure_parent_dir, DEFAULT_PDF_DIR},
};

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct ExportOptions {
    // root of the per-type PDF directories
    #[builder(default = "self.default_pdf_dir()")]
    pdf_dir: PathBuf,
    // where normalized HTML copies go, if anywhere
    #[builder(default = "None")]
    html_dir: Option<PathBuf>,
    // "<date> <key> <title>" instead of "<key>"
    #[builder(default = "false")]
    descriptive_names: bool,
    // re-render records whose PDF already exists
    #[builder(default = "false")]
    overwrite: bool,
    // retired -> canonical pairs on top of the built-in ones
    #[builder(default = "vec![]")]
    domain_rewrites: Vec<(String, String)>,
}

impl ExportOptions {
    pub fn default_builder() -> ExportOptionsBuilder {
        ExportOptionsBuilder::default()
    }
}

impl ExportOptionsBuilder {
    fn default_pdf_dir(&self) -> PathBuf {
        PathBuf::from(DEFAULT_PDF_DIR)
    }
}

/// Runs fetch -> normalize -> render -> write for every selected record.
pub struct Exporter<'a> {
    session: &'a Session,
    renderer: &'a dyn Renderer,
    normalizer: Normalizer,
    options: ExportOptions,
}

impl<'a> Exporter<'a> {
    pub fn new(session: &'a Session, renderer: &'a dyn Renderer, options: ExportOptions) -> Self {
        let normalizer = Normalizer::new(session.host()).with_rewrites(&options.domain_rewrites);
        Exporter {
            session,
            renderer,
            normalizer,
            options,
        }
    }

    pub fn run(&self, selector: &ContentTypeSelector) -> RunSummary {
        let mut summary = RunSummary::default();

        for content_type in selector.iter() {
            let records = match self.session.records(content_type) {
                Ok(r) => r,
                Err(e) => {
                    error!("could not list {}: {:#}", content_type, e);
                    summary.unlisted.push(content_type);
                    continue;
                }
            };
            info!("{}: {} records", content_type, records.len());

            for record in records {
                let outcome = self.export_record(&record);
                match &outcome {
                    RecordOutcome::Written(path) => info!("wrote {:?}", path),
                    RecordOutcome::Partial { path, reason } => {
                        warn!("wrote {:?} with problems: {}", path, reason)
                    }
                    RecordOutcome::Skipped(path) => info!("{:?} exists, skipped", path),
                    RecordOutcome::Failed(reason) => {
                        warn!("{} {} failed: {}", content_type, record.key, reason)
                    }
                }
                summary.record(content_type, &outcome);
            }
        }
        summary
    }

    /// Exports one record. Never fails the run; problems end up in the outcome.
    pub fn export_record(&self, record: &Record) -> RecordOutcome {
        let pdf = artifact_path(
            &self.options.pdf_dir,
            record,
            self.options.descriptive_names,
            "pdf",
        );
        // an empty file is what a crashed renderer leaves behind
        if !self.options.overwrite && produced_output(&pdf) {
            return RecordOutcome::Skipped(pdf);
        }

        let url = self.session.public_url(record);
        debug!("fetching {}", url);
        let mut page = match fetch_page(self.session.client(), &url, record.content_type) {
            Ok(p) => p,
            Err(e) => return RecordOutcome::Failed(e.to_string()),
        };
        page.html = self.normalizer.normalize_html(&page.html);

        if let Some(html_dir) = &self.options.html_dir {
            let html = artifact_path(html_dir, record, self.options.descriptive_names, "html");
            if let Err(e) = write_html(&html, &page.html) {
                warn!("{:#}", e);
            }
        }

        if let Err(e) = assure_parent_dir(&pdf) {
            return RecordOutcome::Failed(format!("could not create directory for {:?}: {}", pdf, e));
        }

        let rendered = self.renderer.render(&page.html, &pdf);
        match (rendered, page.degraded) {
            (Ok(RenderStatus::Complete), None) => RecordOutcome::Written(pdf),
            (Ok(RenderStatus::Complete), Some(reason))
            | (Ok(RenderStatus::Degraded(reason)), None) => RecordOutcome::Partial { path: pdf, reason },
            (Ok(RenderStatus::Degraded(render)), Some(fetch)) => RecordOutcome::Partial {
                path: pdf,
                reason: format!("{}; {}", fetch, render),
            },
            (Err(e), _) => {
                if pdf.exists() {
                    if let Err(rm) = fs::remove_file(&pdf) {
                        warn!("could not remove unfinished {:?}: {}", pdf, rm);
                    }
                }
                RecordOutcome::Failed(format!("{} ({})", e, self.renderer.name()))
            }
        }
    }
}

fn write_html(path: &Path, html: &str) -> anyhow::Result<()> {
    assure_parent_dir(path)?;
    fs::write(path, html).context(format!("could not write html copy {:?}", path))?;
    Ok(())
}
