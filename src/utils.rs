use chrono::NaiveDateTime;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::types::Record;

pub const DEFAULT_PDF_DIR: &str = "./pdfs";
pub const SALSA_DATE_FORMAT: &str = "%a %b %d %Y %H:%M:%S";

lazy_static! {
    pub static ref USER_AGENT: String = format!(
        "salsa-pdfs/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );
    static ref TITLE_JUNK: Regex = Regex::new(r"[^A-Za-z0-9\s]").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Parses a Salsa Classic timestamp like "Mon Oct 09 2017 19:25:56 GMT-0400"
/// into "2017-10-09".
pub fn parse_salsa_date(value: &str) -> Option<String> {
    let local = value.split(" GMT").next()?.trim();
    NaiveDateTime::parse_from_str(local, SALSA_DATE_FORMAT)
        .ok()
        .map(|t| t.format("%Y-%m-%d").to_string())
}

/// Keeps ASCII letters, digits and single spaces.
pub fn sanitize_title(title: &str) -> String {
    let cleaned = TITLE_JUNK.replace_all(title, "");
    WHITESPACE.replace_all(cleaned.trim(), " ").to_string()
}

/// File stem for a record: its key, or "<date> <key> <title>" when descriptive.
pub fn file_stem(record: &Record, descriptive: bool) -> String {
    let key = sanitize_key(&record.key);
    if !descriptive {
        return key;
    }
    let mut parts = vec![];
    if let Some(date) = record.date.as_deref().and_then(parse_salsa_date) {
        parts.push(date);
    }
    parts.push(key);
    let title = sanitize_title(&record.title);
    if !title.is_empty() {
        parts.push(title);
    }
    parts.join(" ")
}

// keys are numeric in practice, but they end up in a path
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

/// `<dir>/<content-type>/<stem>.<ext>`
pub fn artifact_path(dir: &Path, record: &Record, descriptive: bool, ext: &str) -> PathBuf {
    let mut p = dir.to_path_buf();
    p.push(record.content_type.as_str());
    p.push(format!("{}.{}", file_stem(record, descriptive), ext));
    p
}

pub fn assure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            debug!("creating directory {:?}", parent);
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn get_random_string(len: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn get_tmp_html_path() -> PathBuf {
    std::env::temp_dir().join(format!("salsa-pdfs-{}.html", get_random_string(11)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::content::ContentType;

    fn record() -> Record {
        Record {
            key: "4321".into(),
            content_type: ContentType::EmailBlast,
            title: "Spring Appeal: Give $5 today!".into(),
            date: Some("Mon Oct 09 2017 19:25:56 GMT-0400".into()),
        }
    }

    #[test]
    fn parses_salsa_dates() {
        assert_eq!(
            parse_salsa_date("Mon Oct 09 2017 19:25:56 GMT-0400").as_deref(),
            Some("2017-10-09")
        );
        assert_eq!(parse_salsa_date(""), None);
        assert_eq!(parse_salsa_date("yesterday"), None);
    }

    #[test]
    fn plain_names_use_the_key() {
        let p = artifact_path(Path::new("./pdfs"), &record(), false, "pdf");
        assert_eq!(p, PathBuf::from("./pdfs/email_blast/4321.pdf"));
    }

    #[test]
    fn descriptive_names_carry_date_and_title() {
        let p = artifact_path(Path::new("out"), &record(), true, "pdf");
        assert_eq!(
            p,
            PathBuf::from("out/email_blast/2017-10-09 4321 Spring Appeal Give 5 today.pdf")
        );

        let mut r = record();
        r.date = None;
        r.title = "".into();
        assert_eq!(file_stem(&r, true), "4321");
    }

    #[test]
    fn keys_cannot_escape_the_directory() {
        let mut r = record();
        r.key = "../../etc".into();
        assert_eq!(file_stem(&r, false), "______etc");
    }

    #[test]
    fn tmp_paths_are_unique() {
        assert_ne!(get_tmp_html_path(), get_tmp_html_path());
    }
}
