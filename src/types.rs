use std::{collections::BTreeMap, fmt, path::PathBuf};

use thiserror::Error;

use crate::content::ContentType;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("config: {0}")]
    Config(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("no organization found for account {0}")]
    NoOrganization(String),
    #[error("renderer {0} not found on PATH")]
    RendererMissing(String),
    #[error("fetch: {0}")]
    Fetch(String),
    #[error("render: {0}")]
    Render(String),
}

/// One addressable content item returned by the listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: String,
    pub content_type: ContentType,
    pub title: String,
    pub date: Option<String>,
}

#[derive(Debug)]
pub struct PageDocument {
    pub url: String,
    pub content_type: ContentType,
    pub html: String,
    // set when the server answered with a non-success status
    pub degraded: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    Complete,
    Degraded(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Written(PathBuf),
    Partial { path: PathBuf, reason: String },
    Skipped(PathBuf),
    Failed(String),
}

impl RecordOutcome {
    pub fn is_artifact(&self) -> bool {
        matches!(self, RecordOutcome::Written(_) | RecordOutcome::Partial { .. })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TypeSummary {
    pub written: usize,
    pub partial: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl TypeSummary {
    pub fn artifacts(&self) -> usize {
        self.written + self.partial
    }
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub per_type: BTreeMap<ContentType, TypeSummary>,
    // content types whose listing call failed
    pub unlisted: Vec<ContentType>,
}

impl RunSummary {
    pub fn record(&mut self, content_type: ContentType, outcome: &RecordOutcome) {
        let entry = self.per_type.entry(content_type).or_default();
        match outcome {
            RecordOutcome::Written(_) => entry.written += 1,
            RecordOutcome::Partial { .. } => entry.partial += 1,
            RecordOutcome::Skipped(_) => entry.skipped += 1,
            RecordOutcome::Failed(_) => entry.failed += 1,
        }
    }

    pub fn artifacts(&self) -> usize {
        self.per_type.values().map(TypeSummary::artifacts).sum()
    }

    pub fn failures(&self) -> usize {
        self.per_type.values().map(|s| s.failed).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (content_type, s) in &self.per_type {
            writeln!(
                f,
                "{:<18} written: {}, partial: {}, skipped: {}, failed: {}",
                content_type.as_str(),
                s.written,
                s.partial,
                s.skipped,
                s.failed
            )?;
        }
        for content_type in &self.unlisted {
            writeln!(f, "{:<18} could not be listed", content_type.as_str())?;
        }
        write!(
            f,
            "{} artifacts, {} failures",
            self.artifacts(),
            self.failures()
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn artifacts_count_written_and_partial_only() {
        let mut summary = RunSummary::default();
        summary.record(
            ContentType::DonatePage,
            &RecordOutcome::Written(PathBuf::from("a.pdf")),
        );
        summary.record(
            ContentType::DonatePage,
            &RecordOutcome::Partial {
                path: PathBuf::from("b.pdf"),
                reason: "404".into(),
            },
        );
        summary.record(
            ContentType::EmailBlast,
            &RecordOutcome::Skipped(PathBuf::from("c.pdf")),
        );
        summary.record(ContentType::EmailBlast, &RecordOutcome::Failed("boom".into()));

        assert_eq!(summary.artifacts(), 2);
        assert_eq!(summary.failures(), 1);
        assert_eq!(summary.per_type[&ContentType::EmailBlast].skipped, 1);
        assert!(summary.to_string().ends_with("2 artifacts, 1 failures"));
    }
}
