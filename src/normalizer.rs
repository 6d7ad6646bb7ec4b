//! Rewrites resource references in fetched pages so the renderer can resolve
//! them against live infrastructure.

use lol_html::{element, rewrite_str, RewriteStrSettings};
use reqwest::Url;

lazy_static! {
    /// Hostnames that no longer serve anything, with their replacements.
    pub static ref RETIRED_DOMAINS: Vec<(String, String)> = vec![
        ("org2.democracyinaction.org".into(), "org2.salsalabs.com".into()),
        ("salsa.democracyinaction.org".into(), "org.salsalabs.com".into()),
        ("hq.demaction.org".into(), "org.salsalabs.com".into()),
    ];
}

const REWRITTEN: [(&str, &str); 8] = [
    ("a[href]", "href"),
    ("a[src]", "src"),
    ("link[href]", "href"),
    ("link[src]", "src"),
    ("img[href]", "href"),
    ("img[src]", "src"),
    ("script[href]", "href"),
    ("script[src]", "src"),
];

pub struct Normalizer {
    // https://<host>/, what host-relative references are joined onto
    base: Option<Url>,
    rewrites: Vec<(String, String)>,
}

impl Normalizer {
    pub fn new(host: &str) -> Self {
        let host = host.trim().trim_end_matches('/');
        let base = match Url::parse(&format!("https://{}/", host)) {
            Ok(base) => Some(base),
            Err(e) => {
                warn!("host {:?} is not usable in urls, relative references stay as is: {}", host, e);
                None
            }
        };
        Normalizer {
            base,
            rewrites: RETIRED_DOMAINS.clone(),
        }
    }

    /// Adds retired -> canonical pairs on top of the built-in table.
    pub fn with_rewrites(mut self, extra: &[(String, String)]) -> Self {
        for (from, to) in extra {
            self.rewrites.retain(|(f, _)| !f.eq_ignore_ascii_case(from));
            self.rewrites.push((from.to_lowercase(), to.clone()));
        }
        self
    }

    /// Rewrites every href/src in `html`. Returns the input untouched when the
    /// markup cannot be processed.
    pub fn normalize_html(&self, html: &str) -> String {
        let handlers = REWRITTEN
            .iter()
            .map(|(selector, attr)| {
                let attr = *attr;
                element!(*selector, move |el| {
                    if let Some(value) = el.get_attribute(attr) {
                        let normalized = self.normalize_reference(&value);
                        if normalized != value {
                            el.set_attribute(attr, &normalized)?;
                        }
                    }
                    Ok(())
                })
            })
            .collect::<Vec<_>>();

        match rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: handlers,
                ..RewriteStrSettings::default()
            },
        ) {
            Ok(out) => out,
            Err(e) => {
                warn!("could not rewrite references, keeping page as is: {}", e);
                html.to_string()
            }
        }
    }

    /// Normalizes a single reference. Anything not recognized is returned as is,
    /// and only references that change are re-serialized.
    pub fn normalize_reference(&self, reference: &str) -> String {
        let trimmed = reference.trim();

        // host-relative and protocol-relative references
        if trimmed.starts_with('/') {
            let joined = self.base.as_ref().map(|base| base.join(trimmed));
            return match joined {
                Some(Ok(url)) => self.swap_retired_host(url).unwrap_or_else(|url| url).to_string(),
                Some(Err(e)) => {
                    debug!("could not resolve {:?}: {}", reference, e);
                    reference.to_string()
                }
                None => reference.to_string(),
            };
        }

        match Url::parse(trimmed) {
            Ok(url) => match self.swap_retired_host(url) {
                Ok(swapped) => swapped.to_string(),
                Err(_) => reference.to_string(),
            },
            Err(_) => reference.to_string(),
        }
    }

    /// `Ok` with the canonical host when `url` points at a retired domain,
    /// `Err` with the url untouched otherwise.
    fn swap_retired_host(&self, mut url: Url) -> Result<Url, Url> {
        let canonical = match url.host_str().and_then(|host| {
            self.rewrites
                .iter()
                .find(|(retired, _)| retired.eq_ignore_ascii_case(host))
        }) {
            Some((_, canonical)) => canonical.clone(),
            None => return Err(url),
        };
        match url.set_host(Some(&canonical)) {
            Ok(()) => Ok(url),
            Err(e) => {
                warn!("could not swap host of {} for {}: {}", url, canonical, e);
                Err(url)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::new("salsa4.salsalabs.com")
    }

    #[test]
    fn retired_host_is_replaced() {
        let n = normalizer();
        assert_eq!(
            n.normalize_reference("http://org2.democracyinaction.org/o/123/images/logo.png?v=2#top"),
            "http://org2.salsalabs.com/o/123/images/logo.png?v=2#top"
        );
        assert_eq!(
            n.normalize_reference("https://user@HQ.demaction.org:8443/dia/x.css"),
            "https://user@org.salsalabs.com:8443/dia/x.css"
        );
        assert_eq!(
            n.normalize_reference("https://salsa.democracyinaction.org"),
            "https://org.salsalabs.com/"
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        let n = normalizer();
        assert_eq!(
            n.normalize_reference(" /salsa/include/x.js"),
            "https://salsa4.salsalabs.com/salsa/include/x.js"
        );
        assert_eq!(
            n.normalize_reference("\n/dia/style.css "),
            "https://salsa4.salsalabs.com/dia/style.css"
        );
        assert_eq!(
            n.normalize_reference("  http://hq.demaction.org/a.js\n"),
            "http://org.salsalabs.com/a.js"
        );
    }

    #[test]
    fn backslash_ends_the_host() {
        assert_eq!(
            normalizer().normalize_reference("http://hq.demaction.org\\a.js"),
            "http://org.salsalabs.com/a.js"
        );
    }

    #[test]
    fn host_relative_gets_configured_host() {
        assert_eq!(
            normalizer().normalize_reference("/salsa/include/whatever.js"),
            "https://salsa4.salsalabs.com/salsa/include/whatever.js"
        );
    }

    #[test]
    fn protocol_relative_gets_https() {
        let n = normalizer();
        assert_eq!(
            n.normalize_reference("//cdn.example.com/a.js"),
            "https://cdn.example.com/a.js"
        );
        assert_eq!(
            n.normalize_reference("//hq.demaction.org/a.js"),
            "https://org.salsalabs.com/a.js"
        );
    }

    #[test]
    fn live_and_unclassified_references_are_untouched() {
        let n = normalizer();
        for r in [
            "https://www.example.org/page?a=1#b",
            "https://org2.democracyinaction.org.example.com/x",
            "images/photo.jpg",
            "#section",
            "mailto:someone@example.org",
            "javascript:void(0)",
            "",
        ] {
            assert_eq!(n.normalize_reference(r), r);
        }
    }

    #[test]
    fn extra_rewrites_extend_the_table() {
        let n = normalizer().with_rewrites(&[("old.example.org".into(), "new.example.org".into())]);
        assert_eq!(
            n.normalize_reference("https://old.example.org/x"),
            "https://new.example.org/x"
        );
        assert_eq!(
            n.normalize_reference("https://hq.demaction.org/x"),
            "https://org.salsalabs.com/x"
        );
    }

    #[test]
    fn rewrites_document_attributes() {
        let html = r#"<html><head><link rel="stylesheet" href="/dia/style.css"><script src="http://hq.demaction.org/a.js"></script></head><body><a href="https://www.example.org/">x</a><img src="/o/1/images/logo.png"><p data-src="/ignored">y</p></body></html>"#;
        let out = normalizer().normalize_html(html);
        assert!(out.contains(r#"href="https://salsa4.salsalabs.com/dia/style.css""#));
        assert!(out.contains(r#"src="http://org.salsalabs.com/a.js""#));
        assert!(out.contains(r#"href="https://www.example.org/""#));
        assert!(out.contains(r#"src="https://salsa4.salsalabs.com/o/1/images/logo.png""#));
        assert!(out.contains(r#"data-src="/ignored""#));
    }
}
