use reqwest::blocking::Client;

use crate::{
    content::ContentType,
    types::{ExportError, PageDocument},
};

/// Fetches a public page. Transport failures are errors; a non-success
/// status still yields the body, marked as degraded.
pub fn fetch_page(
    client: &Client,
    url: &str,
    content_type: ContentType,
) -> Result<PageDocument, ExportError> {
    let resp = client
        .get(url)
        .send()
        .map_err(|e| ExportError::Fetch(format!("{}: {}", url, e)))?;

    let status = resp.status();
    let degraded = if status.is_success() {
        None
    } else {
        Some(format!("status {}", status))
    };

    let html = match resp.text() {
        Ok(body) => body,
        Err(e) if degraded.is_some() => {
            debug!("could not read error body for {}: {}", url, e);
            String::new()
        }
        Err(e) => return Err(ExportError::Fetch(format!("{}: {}", url, e))),
    };

    if html.trim().is_empty() {
        return Err(ExportError::Fetch(format!(
            "{}: empty body ({})",
            url,
            degraded.unwrap_or_else(|| format!("status {}", status))
        )));
    }

    Ok(PageDocument {
        url: url.to_string(),
        content_type,
        html,
        degraded,
    })
}
