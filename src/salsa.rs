// talks to the Salsa Classic API
use std::{collections::HashSet, time::Duration};

use anyhow::{anyhow, Context};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::{
    config::Credentials,
    content::ContentType,
    types::{ExportError, Record},
    utils::USER_AGENT,
};

/// Rows per getObjects.sjs page.
pub const PAGE_SIZE: usize = 500;

#[derive(Builder, Debug, Clone)]
#[builder(setter(into))]
pub struct SessionOptions {
    #[builder(default = "self.default_scheme()")]
    scheme: String,
    // request timeout in seconds
    #[builder(default = "60")]
    timeout: u64,
}

impl SessionOptions {
    pub fn default_builder() -> SessionOptionsBuilder {
        SessionOptionsBuilder::default()
    }
}

impl SessionOptionsBuilder {
    fn default_scheme(&self) -> String {
        String::from("https")
    }
}

/// An authenticated API session. Read-only once created.
#[derive(Debug)]
pub struct Session {
    client: Client,
    base_url: String,
    host: String,
    org_key: String,
    org_name: String,
}

impl Session {
    /// Logs in and resolves the organization the account belongs to.
    pub fn authenticate(credentials: &Credentials, options: &SessionOptions) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT.as_str())
            .cookie_store(true)
            .timeout(Duration::from_secs(options.timeout))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("could not build http client")?;
        let base_url = format!("{}://{}", options.scheme, credentials.host);

        debug!("authenticating {} against {}", credentials.email, base_url);
        let res: Value = client
            .get(format!("{}/api/authenticate.sjs", base_url))
            .query(&[
                ("email", credentials.email.as_str()),
                ("password", credentials.password.as_str()),
                ("json", "true"),
            ])
            .send()
            .context(format!("could not reach {}", base_url))?
            .json()
            .context("authentication reply is not json")?;

        if res.get("status").and_then(Value::as_str) == Some("error") {
            return Err(ExportError::Authentication(res.to_string()).into());
        }

        let mut session = Session {
            client,
            base_url,
            host: credentials.host.clone(),
            org_key: String::new(),
            org_name: String::new(),
        };
        session.load_organization(&credentials.email)?;
        info!(
            "authenticated as {} for {} ({})",
            credentials.email, session.org_name, session.org_key
        );
        Ok(session)
    }

    fn load_organization(&mut self, email: &str) -> anyhow::Result<()> {
        let rows = self.get_objects(&[
            ("object", "organization".to_string()),
            ("limit", "0,2".to_string()),
            ("include", "organization_KEY,name".to_string()),
        ])?;

        // key 0 is a placeholder row
        let org = rows.iter().find(|row| {
            field(row, "organization_KEY")
                .and_then(|k| k.parse::<u64>().ok())
                .map(|k| k > 0)
                .unwrap_or(false)
        });
        match org {
            Some(row) => {
                self.org_key = field(row, "organization_KEY").unwrap_or_default();
                self.org_name = field(row, "name").unwrap_or_default();
                Ok(())
            }
            None => Err(ExportError::NoOrganization(email.into()).into()),
        }
    }

    /// Lists every record of `content_type`, one page at a time.
    pub fn records(&self, content_type: ContentType) -> anyhow::Result<Vec<Record>> {
        let spec = content_type.spec();
        let key_field = content_type.key_field();
        let mut include = vec![key_field.clone(), spec.title_field.into(), spec.date_field.into()];
        if content_type == ContentType::EmailBlast {
            include.push("Stage".into());
        }

        let mut records = vec![];
        let mut seen = HashSet::new();
        let mut offset = 0;
        loop {
            let rows = self.get_objects(&[
                ("object", content_type.as_str().to_string()),
                ("limit", format!("{},{}", offset, PAGE_SIZE)),
                ("include", include.join(",")),
            ])?;
            let count = rows.len();
            debug!(
                "{}: {} rows at offset {}",
                content_type.as_str(),
                count,
                offset
            );

            let mut repeated = None;
            for row in rows {
                let key = match field(&row, &key_field) {
                    Some(k) if !k.is_empty() => k,
                    _ => {
                        warn!("{} row without {}: {}", content_type, key_field, row);
                        continue;
                    }
                };
                if !seen.insert(key.clone()) {
                    repeated = Some(key);
                    break;
                }
                if content_type == ContentType::EmailBlast {
                    if let Some(stage) = field(&row, "Stage") {
                        if stage != "Complete" {
                            debug!("skipping email blast {} in stage {}", key, stage);
                            continue;
                        }
                    }
                }
                records.push(Record {
                    key,
                    content_type,
                    title: field(&row, spec.title_field).unwrap_or_default(),
                    date: field(&row, spec.date_field).filter(|d| !d.is_empty()),
                });
            }

            // an API that ignores the offset would page forever
            if let Some(key) = repeated {
                warn!(
                    "{}: key {} returned again at offset {}, stopping",
                    content_type, key, offset
                );
                break;
            }
            if count < PAGE_SIZE {
                break;
            }
            offset += count;
        }
        Ok(records)
    }

    fn get_objects(&self, params: &[(&str, String)]) -> anyhow::Result<Vec<Value>> {
        let url = format!("{}/api/getObjects.sjs", self.base_url);
        let res = self
            .client
            .get(&url)
            .query(params)
            .query(&[("json", "true")])
            .send()
            .context(format!("could not reach {}", url))?
            .error_for_status()?;
        let body: Value = res.json().context("getObjects reply is not json")?;
        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(anyhow!("unexpected getObjects reply: {}", other)),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn org_key(&self) -> &str {
        &self.org_key
    }

    pub fn org_name(&self) -> &str {
        &self.org_name
    }

    /// Public URL of a record.
    pub fn public_url(&self, record: &Record) -> String {
        record
            .content_type
            .public_url(&self.base_url, &self.org_key, &record.key)
    }
}

// the API returns most values as strings, but not always
fn field(row: &Value, name: &str) -> Option<String> {
    match row.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
