// File: src/renderer.rs
// Purpose: MessageRenderer backed by a JavaScript function

use anyhow::{anyhow, Result};
use js_sys::Function;
use rusty_forms::{MessageModel, MessageRenderer};
use wasm_bindgen::JsValue;

/// Calls `render(template, model)` and expects a markup string back.
///
/// The model is passed as a plain object with camelCase keys.
pub struct JsRenderer {
    render: Function,
}

impl JsRenderer {
    pub fn new(render: Function) -> Self {
        Self { render }
    }
}

impl MessageRenderer for JsRenderer {
    fn render(&self, template: &str, model: &MessageModel) -> Result<String> {
        let model = serde_wasm_bindgen::to_value(model)
            .map_err(|e| anyhow!("failed to convert message model: {}", e))?;

        let markup = self
            .render
            .call2(&JsValue::NULL, &JsValue::from_str(template), &model)
            .map_err(|e| anyhow!("render function threw: {:?}", e))?;

        markup
            .as_string()
            .ok_or_else(|| anyhow!("render function returned a non-string for {}", template))
    }
}
