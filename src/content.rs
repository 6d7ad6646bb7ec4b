use std::{fmt, str::FromStr};

use crate::types::ExportError;

/// The public-facing page kinds that can be exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContentType {
    Action,
    BlogEntry,
    DonatePage,
    EmailBlast,
    Event,
    Petition,
    Questionnaire,
    SignupPage,
    UnsubscribePage,
}

/// Where a content type lives in the API and on the public site.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub title_field: &'static str,
    pub date_field: &'static str,
    // {org} and {key} are substituted
    pub path: &'static str,
}

impl ContentType {
    pub const ALL: [ContentType; 9] = [
        ContentType::Action,
        ContentType::BlogEntry,
        ContentType::DonatePage,
        ContentType::EmailBlast,
        ContentType::Event,
        ContentType::Petition,
        ContentType::Questionnaire,
        ContentType::SignupPage,
        ContentType::UnsubscribePage,
    ];

    /// API table name, also used as the output directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Action => "action",
            ContentType::BlogEntry => "blog_entry",
            ContentType::DonatePage => "donate_page",
            ContentType::EmailBlast => "email_blast",
            ContentType::Event => "event",
            ContentType::Petition => "petition",
            ContentType::Questionnaire => "questionnaire",
            ContentType::SignupPage => "signup_page",
            ContentType::UnsubscribePage => "unsubscribe_page",
        }
    }

    pub fn key_field(&self) -> String {
        format!("{}_KEY", self.as_str())
    }

    pub fn spec(&self) -> PageSpec {
        match self {
            ContentType::Action => PageSpec {
                title_field: "Reference_Name",
                date_field: "Date_Created",
                path: "/o/{org}/p/dia/action4/common/public/?action_KEY={key}",
            },
            ContentType::BlogEntry => PageSpec {
                title_field: "Title",
                date_field: "Display_Date",
                path: "/o/{org}/p/salsa/web/blog/public/index.sjs?blog_entry_KEY={key}",
            },
            ContentType::DonatePage => PageSpec {
                title_field: "Reference_Name",
                date_field: "Date_Created",
                path: "/o/{org}/p/salsa/donation/common/public/?donate_page_KEY={key}",
            },
            ContentType::EmailBlast => PageSpec {
                title_field: "Subject",
                date_field: "Date_Created",
                path: "/o/{org}/t/0/blastContent.jsp?email_blast_KEY={key}",
            },
            ContentType::Event => PageSpec {
                title_field: "Event_Name",
                date_field: "Date_Created",
                path: "/o/{org}/p/salsa/event/common/public/?event_KEY={key}",
            },
            ContentType::Petition => PageSpec {
                title_field: "Reference_Name",
                date_field: "Date_Created",
                path: "/o/{org}/p/dia/action4/common/public/?petition_KEY={key}",
            },
            ContentType::Questionnaire => PageSpec {
                title_field: "Reference_Name",
                date_field: "Date_Created",
                path: "/o/{org}/p/salsa/web/questionnaire/public/?questionnaire_KEY={key}",
            },
            ContentType::SignupPage => PageSpec {
                title_field: "Title",
                date_field: "Date_Created",
                path: "/o/{org}/p/salsa/web/common/public/signup?signup_page_KEY={key}",
            },
            ContentType::UnsubscribePage => PageSpec {
                title_field: "Title",
                date_field: "Date_Created",
                path: "/o/{org}/p/salsa/supporter/unsubscribe/public/?unsubscribe_page_KEY={key}",
            },
        }
    }

    /// Public URL of one record of this type.
    pub fn public_url(&self, base: &str, org_key: &str, key: &str) -> String {
        let path = self
            .spec()
            .path
            .replace("{org}", org_key)
            .replace("{key}", key);
        format!("{}{}", base.trim_end_matches('/'), path)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        ContentType::ALL
            .iter()
            .find(|t| t.as_str() == tag)
            .copied()
            .ok_or_else(|| ExportError::Config(format!("unknown content type '{}'", tag)))
    }
}
