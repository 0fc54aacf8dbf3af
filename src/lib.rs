/// Tab Grouper - Chrome Extension that groups tabs by user-defined rules
/// Built with Rust + WASM + Yew

pub mod chrome;
pub mod line_item;
pub mod runner;
pub mod service;
pub mod store;
pub mod tabs;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::board::Board>::new().render();
}

// Apply the stored rules without opening the popup (keyboard command, background worker)
#[wasm_bindgen]
pub async fn run_line_items() -> Result<JsValue, JsValue> {
    let service = service::LineItemsService::new(chrome::ChromeStorage);
    let summary = runner::run(&service, &chrome::ChromeTabs)
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&summary).map_err(|e| JsValue::from_str(&e.to_string()))
}
