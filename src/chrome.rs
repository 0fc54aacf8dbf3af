/// `chrome.storage.local` and `chrome.tabs` through the JS bridge

use crate::line_item::TabColor;
use crate::store::{KeyValueStore, StoreError};
use crate::tabs::{TabInfo, TabsApi, TabsError};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;

// Import JS bridge functions. Each one rejects when chrome.runtime.lastError is set.
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getStorage(key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn queryTabs() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn groupTabs(tab_ids: JsValue, title: &str, color: Option<String>) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn clearGroups() -> Result<(), JsValue>;
}

/// `chrome.storage.local`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeStorage;

impl KeyValueStore for ChromeStorage {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let value_js = getStorage(key)
            .await
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))?;

        if value_js.is_null() || value_js.is_undefined() {
            return Ok(None);
        }

        serde_wasm_bindgen::from_value(value_js)
            .map(Some)
            .map_err(|e| StoreError::Conversion(format!("{:?}", e)))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        // json_compatible keeps objects as plain objects instead of Maps
        let value_js = value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| StoreError::Conversion(format!("{:?}", e)))?;

        setStorage(key, value_js)
            .await
            .map_err(|e| StoreError::Backend(format!("{:?}", e)))
    }
}

/// `chrome.tabs` and `chrome.tabGroups`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromeTabs;

impl TabsApi for ChromeTabs {
    async fn query_tabs(&self) -> Result<Vec<TabInfo>, TabsError> {
        let tabs_js = queryTabs()
            .await
            .map_err(|e| TabsError::Backend(format!("{:?}", e)))?;

        serde_wasm_bindgen::from_value(tabs_js)
            .map_err(|e| TabsError::Conversion(format!("Failed to parse tabs: {:?}", e)))
    }

    async fn group_tabs(
        &self,
        tab_ids: &[i32],
        group_title: &str,
        color: Option<TabColor>,
    ) -> Result<(), TabsError> {
        let tab_ids_js = serde_wasm_bindgen::to_value(&tab_ids)
            .map_err(|e| TabsError::Conversion(format!("Failed to serialize: {:?}", e)))?;

        groupTabs(tab_ids_js, group_title, color.map(|c| c.as_str().to_string()))
            .await
            .map_err(|e| TabsError::Backend(format!("{:?}", e)))
    }

    async fn clear_groups(&self) -> Result<(), TabsError> {
        clearGroups()
            .await
            .map_err(|e| TabsError::Backend(format!("{:?}", e)))
    }
}
