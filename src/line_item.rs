/// Line items: the tab-grouping rules a user keeps in the popup board
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Upper bound (exclusive) of the random term added to the timestamp id
const ID_JITTER: u32 = 10_000;

/// Which tab attribute a rule matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Title,
    #[default]
    Url,
}

/// Tab group colors accepted by `chrome.tabGroups`, plus the empty "no color" value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabColor {
    #[default]
    #[serde(rename = "")]
    Unset,
    Grey,
    Blue,
    Red,
    Yellow,
    Green,
    Pink,
    Purple,
    Cyan,
    Orange,
}

impl TabColor {
    pub const ALL: [TabColor; 10] = [
        TabColor::Unset,
        TabColor::Grey,
        TabColor::Blue,
        TabColor::Red,
        TabColor::Yellow,
        TabColor::Green,
        TabColor::Pink,
        TabColor::Purple,
        TabColor::Cyan,
        TabColor::Orange,
    ];

    /// The color to hand to the grouping API, `None` when unset
    pub fn explicit(self) -> Option<TabColor> {
        match self {
            TabColor::Unset => None,
            color => Some(color),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TabColor::Unset => "",
            TabColor::Grey => "grey",
            TabColor::Blue => "blue",
            TabColor::Red => "red",
            TabColor::Yellow => "yellow",
            TabColor::Green => "green",
            TabColor::Pink => "pink",
            TabColor::Purple => "purple",
            TabColor::Cyan => "cyan",
            TabColor::Orange => "orange",
        }
    }

    pub fn from_str_lossy(s: &str) -> TabColor {
        TabColor::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .unwrap_or_default()
    }
}

/// Auxiliary grouping hint, passed through untouched.
///
/// Older records stored a boolean, newer ones a set of strings; both load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AutoGroup {
    Flag(bool),
    Groups(BTreeSet<String>),
}

impl AutoGroup {
    /// `false` and the empty set mean the same thing
    fn normalized(&self) -> AutoGroup {
        match self {
            AutoGroup::Flag(false) => AutoGroup::Groups(BTreeSet::new()),
            other => other.clone(),
        }
    }
}

impl Default for AutoGroup {
    fn default() -> Self {
        AutoGroup::Groups(BTreeSet::new())
    }
}

/// A single rule in the list.
///
/// Fields missing from a stored record load with their default value; a
/// missing `id` gets a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    pub id: i64,
    pub apply_changes: bool,
    pub auto_group: AutoGroup,
    pub case_sensitive: bool,
    pub color: TabColor,
    pub group_title: String,
    pub match_type: MatchType,
    pub regex: bool,
    pub text: String,
}

impl LineItem {
    /// The default rule with a freshly generated id
    pub fn new_default() -> LineItem {
        LineItem::default_with_id(generate_id())
    }

    /// The default rule with an id that no entry of `existing` already uses
    pub fn new_unique(existing: &[LineItem]) -> LineItem {
        let mut item = LineItem::new_default();
        while existing.iter().any(|other| other.id == item.id) {
            item.id = generate_id();
        }
        item
    }

    fn default_with_id(id: i64) -> LineItem {
        LineItem {
            id,
            apply_changes: true,
            auto_group: AutoGroup::default(),
            case_sensitive: false,
            color: TabColor::Unset,
            group_title: String::new(),
            match_type: MatchType::Url,
            regex: false,
            text: String::new(),
        }
    }

    /// True when every field apart from `id` still holds its default value
    pub fn is_default_equivalent(&self) -> bool {
        let baseline = LineItem::default_with_id(self.id);
        let candidate = LineItem {
            auto_group: self.auto_group.normalized(),
            ..self.clone()
        };
        candidate == baseline
    }
}

impl Default for LineItem {
    fn default() -> Self {
        LineItem::new_default()
    }
}

/// A change to one field of a line item
#[derive(Debug, Clone, PartialEq)]
pub enum LineItemEdit {
    ApplyChanges(bool),
    CaseSensitive(bool),
    Color(TabColor),
    GroupTitle(String),
    MatchType(MatchType),
    Regex(bool),
    Text(String),
}

impl LineItemEdit {
    pub fn apply(self, item: &mut LineItem) {
        match self {
            LineItemEdit::ApplyChanges(value) => item.apply_changes = value,
            LineItemEdit::CaseSensitive(value) => item.case_sensitive = value,
            LineItemEdit::Color(value) => item.color = value,
            LineItemEdit::GroupTitle(value) => item.group_title = value,
            LineItemEdit::MatchType(value) => item.match_type = value,
            LineItemEdit::Regex(value) => item.regex = value,
            LineItemEdit::Text(value) => item.text = value,
        }
    }
}

/// Timestamp in milliseconds plus a random jitter
pub fn generate_id() -> i64 {
    now_ms() + jitter()
}

#[cfg(target_arch = "wasm32")]
fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

#[cfg(not(target_arch = "wasm32"))]
fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn jitter() -> i64 {
    let mut buf = [0u8; 4];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => i64::from(u32::from_le_bytes(buf) % ID_JITTER),
        Err(e) => {
            log::warn!("No randomness available for id jitter: {}", e);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fields() {
        let item = LineItem::new_default();

        assert!(item.apply_changes);
        assert!(!item.case_sensitive);
        assert!(!item.regex);
        assert_eq!(item.match_type, MatchType::Url);
        assert_eq!(item.color, TabColor::Unset);
        assert_eq!(item.group_title, "");
        assert_eq!(item.text, "");
        assert_eq!(item.auto_group, AutoGroup::Groups(BTreeSet::new()));
    }

    #[test]
    fn test_id_is_timestamp_plus_jitter() {
        let before = now_ms();
        let id = generate_id();
        let after = now_ms();

        assert!(id >= before);
        assert!(id < after + i64::from(ID_JITTER));
    }

    #[test]
    fn test_new_unique_avoids_existing_ids() {
        let existing: Vec<LineItem> = (0..50).map(|_| LineItem::new_default()).collect();

        let item = LineItem::new_unique(&existing);

        assert!(existing.iter().all(|other| other.id != item.id));
    }

    #[test]
    fn test_default_equivalent_ignores_id() {
        let mut item = LineItem::new_default();
        item.id = 42;

        assert!(item.is_default_equivalent());
    }

    #[test]
    fn test_modified_item_is_not_default() {
        let mut item = LineItem::new_default();
        item.text = "github.com".to_string();
        assert!(!item.is_default_equivalent());

        let mut item = LineItem::new_default();
        item.color = TabColor::Blue;
        assert!(!item.is_default_equivalent());

        let mut item = LineItem::new_default();
        item.apply_changes = false;
        assert!(!item.is_default_equivalent());
    }

    #[test]
    fn test_legacy_false_auto_group_is_default() {
        let mut item = LineItem::new_default();
        item.auto_group = AutoGroup::Flag(false);
        assert!(item.is_default_equivalent());

        item.auto_group = AutoGroup::Flag(true);
        assert!(!item.is_default_equivalent());
    }

    #[test]
    fn test_serialized_shape() {
        let item = LineItem::default_with_id(7);

        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "applyChanges": true,
                "autoGroup": [],
                "caseSensitive": false,
                "color": "",
                "groupTitle": "",
                "matchType": "url",
                "regex": false,
                "text": ""
            })
        );
    }

    #[test]
    fn test_deserialize_legacy_record() {
        let json = r#"{"applyChanges":true,"autoGroup":false,"caseSensitive":true,
            "color":"red","id":1698508200000,"groupTitle":"Docs",
            "matchType":"title","regex":true,"text":"^Docs"}"#;

        let item: LineItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.id, 1698508200000);
        assert_eq!(item.auto_group, AutoGroup::Flag(false));
        assert_eq!(item.color, TabColor::Red);
        assert_eq!(item.match_type, MatchType::Title);
        assert!(item.case_sensitive);
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let json = r#"{"id":5,"text":"github.com","color":"green"}"#;

        let item: LineItem = serde_json::from_str(json).unwrap();

        assert_eq!(item.id, 5);
        assert_eq!(item.text, "github.com");
        assert_eq!(item.color, TabColor::Green);
        assert!(item.apply_changes);
        assert_eq!(item.match_type, MatchType::Url);
        assert_eq!(item.auto_group, AutoGroup::default());
    }

    #[test]
    fn test_edit_changes_one_field() {
        let mut item = LineItem::default_with_id(3);
        item.text = "docs".to_string();

        LineItemEdit::Regex(true).apply(&mut item);
        LineItemEdit::Color(TabColor::Pink).apply(&mut item);

        assert_eq!(item.id, 3);
        assert_eq!(item.text, "docs");
        assert!(item.regex);
        assert_eq!(item.color, TabColor::Pink);
    }

    #[test]
    fn test_auto_group_set_ignores_order() {
        let a: AutoGroup = serde_json::from_str(r#"["b","a"]"#).unwrap();
        let b: AutoGroup = serde_json::from_str(r#"["a","b"]"#).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_color_helpers() {
        assert_eq!(TabColor::Unset.explicit(), None);
        assert_eq!(TabColor::Cyan.explicit(), Some(TabColor::Cyan));
        assert_eq!(TabColor::from_str_lossy("purple"), TabColor::Purple);
        assert_eq!(TabColor::from_str_lossy("magenta"), TabColor::Unset);
    }
}
