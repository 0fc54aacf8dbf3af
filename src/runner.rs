/// Applying the rule list to the open tabs
use crate::service::{LineItemsService, ServiceError};
use crate::store::KeyValueStore;
use crate::tabs::{TabsApi, TabsError, find_matching_tabs};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Tabs(#[from] TabsError),
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub groups_created: usize,
    pub tabs_grouped: usize,
    /// Rules skipped because their pattern doesn't compile
    pub invalid_rules: Vec<i64>,
}

/// Group tabs for every active rule, in list order.
///
/// A tab matched by several rules ends up in the group of the last one.
pub async fn run<S, T>(service: &LineItemsService<S>, tabs: &T) -> Result<RunSummary, RunError>
where
    S: KeyValueStore,
    T: TabsApi,
{
    let items = service.get().await?;
    let open_tabs = tabs.query_tabs().await?;
    let mut summary = RunSummary::default();

    for item in items.iter().filter(|item| item.apply_changes) {
        let matches = match find_matching_tabs(
            &open_tabs,
            &item.text,
            item.match_type,
            item.case_sensitive,
            item.regex,
        ) {
            Ok(matches) => matches,
            Err(e) => {
                log::warn!("Skipping line item {}: {}", item.id, e);
                summary.invalid_rules.push(item.id);
                continue;
            }
        };

        if matches.is_empty() {
            continue;
        }

        let tab_ids: Vec<i32> = matches.iter().map(|tab| tab.id).collect();
        log::debug!(
            "Grouping {} tabs under '{}' for line item {}",
            tab_ids.len(),
            item.group_title,
            item.id
        );
        tabs.group_tabs(&tab_ids, &item.group_title, item.color.explicit())
            .await?;
        summary.groups_created += 1;
        summary.tabs_grouped += tab_ids.len();
    }

    Ok(summary)
}

pub async fn clear_groups<T: TabsApi>(tabs: &T) -> Result<(), RunError> {
    tabs.clear_groups().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_item::{LineItem, MatchType, TabColor};
    use crate::store::MemoryStore;
    use crate::tabs::TabInfo;
    use futures::executor::block_on;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeTabs {
        tabs: Vec<TabInfo>,
        groups: RefCell<Vec<(Vec<i32>, String, Option<TabColor>)>>,
        cleared: Cell<bool>,
        fail_grouping: bool,
    }

    impl TabsApi for FakeTabs {
        async fn query_tabs(&self) -> Result<Vec<TabInfo>, TabsError> {
            Ok(self.tabs.clone())
        }

        async fn group_tabs(
            &self,
            tab_ids: &[i32],
            group_title: &str,
            color: Option<TabColor>,
        ) -> Result<(), TabsError> {
            if self.fail_grouping {
                return Err(TabsError::Backend("no such tab".to_string()));
            }
            self.groups
                .borrow_mut()
                .push((tab_ids.to_vec(), group_title.to_string(), color));
            Ok(())
        }

        async fn clear_groups(&self) -> Result<(), TabsError> {
            self.cleared.set(true);
            Ok(())
        }
    }

    fn fake_tabs() -> FakeTabs {
        FakeTabs {
            tabs: vec![
                TabInfo::new(1, "https://github.com/rust-lang", "GitHub"),
                TabInfo::new(2, "https://mail.google.com", "Inbox"),
                TabInfo::new(3, "https://github.com/yewstack", "GitHub"),
            ],
            ..FakeTabs::default()
        }
    }

    fn rule(id: i64, text: &str, title: &str) -> LineItem {
        LineItem {
            id,
            text: text.to_string(),
            group_title: title.to_string(),
            ..LineItem::new_default()
        }
    }

    #[test]
    fn test_run_groups_active_rules_in_order() {
        let service = LineItemsService::new(MemoryStore::new());
        let tabs = fake_tabs();
        let inactive = LineItem {
            apply_changes: false,
            ..rule(3, "google", "Ignored")
        };
        let colored = LineItem {
            color: TabColor::Blue,
            ..rule(2, "google", "Mail")
        };
        block_on(service.set(vec![rule(1, "github.com", "Code"), inactive, colored])).unwrap();

        let summary = block_on(run(&service, &tabs)).unwrap();

        assert_eq!(summary.groups_created, 2);
        assert_eq!(summary.tabs_grouped, 3);
        assert_eq!(
            *tabs.groups.borrow(),
            vec![
                (vec![1, 3], "Code".to_string(), None),
                (vec![2], "Mail".to_string(), Some(TabColor::Blue)),
            ]
        );
    }

    #[test]
    fn test_run_skips_rules_without_matches() {
        let service = LineItemsService::new(MemoryStore::new());
        let tabs = fake_tabs();
        block_on(service.set(vec![rule(1, "nothing-here", "Empty")])).unwrap();

        let summary = block_on(run(&service, &tabs)).unwrap();

        assert_eq!(summary, RunSummary::default());
        assert!(tabs.groups.borrow().is_empty());
    }

    #[test]
    fn test_run_skips_invalid_regex() {
        let service = LineItemsService::new(MemoryStore::new());
        let tabs = fake_tabs();
        let broken = LineItem {
            regex: true,
            ..rule(1, "([", "Broken")
        };
        let title_rule = LineItem {
            match_type: MatchType::Title,
            ..rule(2, "inbox", "Mail")
        };
        block_on(service.set(vec![broken, title_rule])).unwrap();

        let summary = block_on(run(&service, &tabs)).unwrap();

        assert_eq!(summary.invalid_rules, vec![1]);
        assert_eq!(summary.groups_created, 1);
        assert_eq!(tabs.groups.borrow()[0].0, vec![2]);
    }

    #[test]
    fn test_run_propagates_tab_errors() {
        let service = LineItemsService::new(MemoryStore::new());
        let tabs = FakeTabs {
            fail_grouping: true,
            ..fake_tabs()
        };
        block_on(service.set(vec![rule(1, "github", "Code")])).unwrap();

        let result = block_on(run(&service, &tabs));

        assert!(matches!(result, Err(RunError::Tabs(_))));
    }

    #[test]
    fn test_run_propagates_store_errors() {
        let service = LineItemsService::new(MemoryStore::new());
        service.store().set_fail_reads(true);

        let result = block_on(run(&service, &fake_tabs()));

        assert!(matches!(result, Err(RunError::Service(ServiceError::StoreReadFailed(_)))));
    }

    #[test]
    fn test_clear_groups() {
        let tabs = fake_tabs();

        block_on(clear_groups(&tabs)).unwrap();

        assert!(tabs.cleared.get());
    }
}
