use std::{
    collections::{BTreeMap, BTreeSet},
    fmt, fs,
    path::Path,
};

use anyhow::Context;
use serde::Deserialize;

use crate::{content::ContentType, types::ExportError};

#[derive(Debug, Deserialize)]
struct LoginFile {
    host: Option<String>,
    email: Option<String>,
    password: Option<String>,
    #[serde(default)]
    content_types: Option<Vec<String>>,
    #[serde(default)]
    domain_rewrites: Option<BTreeMap<String, String>>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("email", &self.email)
            .field("password", &"********")
            .finish()
    }
}

/// The set of content types a run exports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypeSelector {
    enabled: BTreeSet<ContentType>,
}

impl ContentTypeSelector {
    pub fn all() -> Self {
        Self::from_types(ContentType::ALL)
    }

    pub fn from_types(types: impl IntoIterator<Item = ContentType>) -> Self {
        ContentTypeSelector {
            enabled: types.into_iter().collect(),
        }
    }

    /// Narrows the selection to email blasts. Composes with the allow-list:
    /// blasts excluded by the config stay excluded.
    pub fn just_blasts(&self) -> Self {
        Self::from_types(
            self.enabled
                .iter()
                .copied()
                .filter(|t| *t == ContentType::EmailBlast),
        )
    }

    pub fn contains(&self, content_type: ContentType) -> bool {
        self.enabled.contains(&content_type)
    }

    pub fn is_empty(&self) -> bool {
        self.enabled.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ContentType> + '_ {
        self.enabled.iter().copied()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub selector: ContentTypeSelector,
    // extra retired -> canonical domain pairs
    pub domain_rewrites: Vec<(String, String)>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .context(format!("could not read login file {:?}", path))?;
        let config = Self::from_yaml(&raw).context(format!("invalid login file {:?}", path))?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ExportError> {
        let file: LoginFile =
            serde_yaml::from_str(raw).map_err(|e| ExportError::Config(e.to_string()))?;

        let credentials = Credentials {
            host: required("host", file.host)?,
            email: required("email", file.email)?,
            password: required("password", file.password)?,
        };

        let selector = match file.content_types {
            Some(tags) if !tags.is_empty() => ContentTypeSelector::from_types(
                tags.iter()
                    .map(|t| t.parse::<ContentType>())
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            _ => ContentTypeSelector::all(),
        };

        let domain_rewrites = file
            .domain_rewrites
            .unwrap_or_default()
            .into_iter()
            .map(|(from, to)| (from.trim().to_lowercase(), to.trim().to_string()))
            .collect();

        Ok(Config {
            credentials,
            selector,
            domain_rewrites,
        })
    }
}

fn required(name: &str, value: Option<String>) -> Result<String, ExportError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ExportError::Config(format!("'{}' is required", name))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn loads_credentials_and_selection() {
        let c = Config::from_yaml(
            r#"
host: salsa4.salsalabs.com
email: someone@example.org
password: secret
content_types:
  - donate_page
  # - event
  - email_blast
"#,
        )
        .unwrap();
        assert_eq!(c.credentials.host, "salsa4.salsalabs.com");
        assert!(c.selector.contains(ContentType::DonatePage));
        assert!(c.selector.contains(ContentType::EmailBlast));
        assert!(!c.selector.contains(ContentType::Event));
        assert!(c.domain_rewrites.is_empty());
    }

    #[test]
    fn missing_list_selects_everything() {
        let c = Config::from_yaml("host: h\nemail: e\npassword: p\ncontent_types:\n").unwrap();
        assert_eq!(c.selector, ContentTypeSelector::all());
    }

    #[test]
    fn missing_password_is_an_error() {
        let err = Config::from_yaml("host: h\nemail: e\n").unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn unknown_content_type_is_an_error() {
        let err =
            Config::from_yaml("host: h\nemail: e\npassword: p\ncontent_types: [post_card]\n")
                .unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn just_blasts_intersects_allow_list() {
        let s = ContentTypeSelector::from_types([ContentType::DonatePage, ContentType::EmailBlast]);
        assert_eq!(s.just_blasts().iter().collect::<Vec<_>>(), vec![ContentType::EmailBlast]);

        let s = ContentTypeSelector::from_types([ContentType::DonatePage]);
        assert!(s.just_blasts().is_empty());
    }

    #[test]
    fn password_is_masked() {
        let c = Credentials {
            host: "h".into(),
            email: "e".into(),
            password: "hunter2".into(),
        };
        assert!(!format!("{:?}", c).contains("hunter2"));
    }
}
