/// Browser tabs: the data we read from `chrome.tabs` and the matcher run against it
use crate::line_item::{MatchType, TabColor};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Information about a browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: i32,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub index: i32,
}

impl TabInfo {
    pub fn new(id: i32, url: &str, title: &str) -> TabInfo {
        TabInfo {
            id,
            url: Some(url.to_string()),
            title: Some(title.to_string()),
            pinned: false,
            index: id,
        }
    }

    fn field(&self, field: MatchType) -> Option<&str> {
        match field {
            MatchType::Title => self.title.as_deref(),
            MatchType::Url => self.url.as_deref(),
        }
    }
}

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum TabsError {
    #[error("tabs API error: {0}")]
    Backend(String),

    #[error("failed to convert tab data: {0}")]
    Conversion(String),
}

/// The tab operations rule execution needs from the browser
#[allow(async_fn_in_trait)]
pub trait TabsApi {
    /// Every open tab across all windows
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, TabsError>;

    /// Put `tab_ids` into one group titled `group_title`
    async fn group_tabs(
        &self,
        tab_ids: &[i32],
        group_title: &str,
        color: Option<TabColor>,
    ) -> Result<(), TabsError>;

    /// Ungroup every grouped tab
    async fn clear_groups(&self) -> Result<(), TabsError>;
}

enum Matcher {
    Literal { needle: String, case_sensitive: bool },
    Pattern(Regex),
}

impl Matcher {
    fn new(pattern: &str, case_sensitive: bool, regex: bool) -> Result<Matcher, MatchError> {
        if regex {
            RegexBuilder::new(pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .map(Matcher::Pattern)
                .map_err(|source| MatchError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })
        } else if case_sensitive {
            Ok(Matcher::Literal {
                needle: pattern.to_string(),
                case_sensitive,
            })
        } else {
            Ok(Matcher::Literal {
                needle: pattern.to_lowercase(),
                case_sensitive,
            })
        }
    }

    fn is_match(&self, haystack: &str) -> bool {
        match self {
            Matcher::Literal {
                needle,
                case_sensitive: true,
            } => haystack.contains(needle.as_str()),
            Matcher::Literal { needle, .. } => haystack.to_lowercase().contains(needle.as_str()),
            Matcher::Pattern(re) => re.is_match(haystack),
        }
    }
}

/// Tabs whose `field` matches `pattern`, in input order.
///
/// A tab without the field (no URL permission, still loading) never matches.
pub fn find_matching_tabs<'a>(
    tabs: &'a [TabInfo],
    pattern: &str,
    field: MatchType,
    case_sensitive: bool,
    regex: bool,
) -> Result<Vec<&'a TabInfo>, MatchError> {
    let matcher = Matcher::new(pattern, case_sensitive, regex)?;
    Ok(tabs
        .iter()
        .filter(|tab| tab.field(field).is_some_and(|value| matcher.is_match(value)))
        .collect())
}
