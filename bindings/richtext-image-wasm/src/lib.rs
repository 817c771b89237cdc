// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! JavaScript surface of `richtext_image`.

use std::str::FromStr;

use js_sys::Promise;
use richtext_image::toolbar::{actions, CODE_LANGUAGES};
use richtext_image::{
    BlockType, EditorCommand, EditorConfig, EditorHandle, EditorValue, ImageControls, NodeKey,
    TextAlign, ToolbarOption, ValueLoad,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

/// A document value as it arrives from JavaScript.
enum HostValue {
    /// `null` or `undefined`.
    Missing,
    Text(String),
    /// Any other value, with what `JSON.stringify` made of it.
    Object(Option<String>),
}

impl HostValue {
    fn from_js(value: &JsValue) -> Self {
        if value.is_null() || value.is_undefined() {
            HostValue::Missing
        } else if let Some(text) = value.as_string() {
            HostValue::Text(text)
        } else {
            HostValue::Object(
                js_sys::JSON::stringify(value)
                    .ok()
                    .and_then(|s| s.as_string()),
            )
        }
    }
}

fn load_value(handle: &mut EditorHandle, value: HostValue) -> ValueLoad {
    match value {
        HostValue::Missing => handle.set_value(None),
        HostValue::Text(json) => handle.set_value(Some(&EditorValue::Json(json))),
        HostValue::Object(Some(json)) => match serde_json::from_str(&json) {
            Ok(parsed) => handle.set_value(Some(&EditorValue::Parsed(parsed))),
            Err(e) => {
                log::error!("Rejected editor value: {e}");
                ValueLoad::Rejected
            }
        },
        HostValue::Object(None) => {
            log::error!("Rejected editor value: it has no JSON form");
            ValueLoad::Rejected
        }
    }
}

fn controls_json(controls: &ImageControls) -> serde_json::Value {
    let buttons: Vec<serde_json::Value> = controls
        .buttons
        .iter()
        .map(|(option, active)| serde_json::json!({"option": option.as_ref(), "active": active}))
        .collect();
    serde_json::json!({
        "buttons": buttons,
        "resizable": controls.resizable,
        "lockAspectRatio": controls.lock_aspect_ratio,
    })
}

#[wasm_bindgen]
pub struct RichTextEditor {
    inner: EditorHandle,
}

#[wasm_bindgen]
impl RichTextEditor {
    /// `config` is optional camelCase JSON; missing fields take defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: Option<String>) -> Result<RichTextEditor, JsError> {
        console_error_panic_hook::set_once();
        let config = match config {
            Some(json) => serde_json::from_str::<EditorConfig>(&json)?,
            None => EditorConfig::default(),
        };
        Ok(Self {
            inner: EditorHandle::new(config),
        })
    }

    /// Resolves to the markup of the whole document.
    pub fn export(&self) -> Promise {
        let html = self.inner.export();
        future_to_promise(async move { Ok(JsValue::from_str(&html)) })
    }

    /// `callback` receives the document JSON string after every change.
    pub fn on_change(&mut self, callback: js_sys::Function) {
        self.inner.on_change(move |json| {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from_str(json)) {
                log::error!("onChange callback failed: {e:?}");
            }
        });
    }

    /// Accepts a JSON string, a parsed object, `null` or `undefined`.
    /// Returns `unchanged`, `loaded` or `rejected`.
    pub fn set_value(&mut self, value: JsValue) -> String {
        let outcome = load_value(&mut self.inner, HostValue::from_js(&value));
        format!("{outcome:?}").to_lowercase()
    }

    pub fn set_content_from_html(&mut self, html: &str) -> Result<(), JsError> {
        Ok(self.inner.editor_mut().set_content_from_html(html)?)
    }

    /// JSON snapshot of the toolbar.
    pub fn toolbar_state(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&self.inner.toolbar())?)
    }

    pub fn toggle_bold(&mut self) -> bool {
        actions::toggle_bold(self.inner.editor_mut())
    }

    pub fn toggle_italic(&mut self) -> bool {
        actions::toggle_italic(self.inner.editor_mut())
    }

    pub fn toggle_underline(&mut self) -> bool {
        actions::toggle_underline(self.inner.editor_mut())
    }

    pub fn toggle_strikethrough(&mut self) -> bool {
        actions::toggle_strikethrough(self.inner.editor_mut())
    }

    pub fn toggle_code(&mut self) -> bool {
        actions::toggle_code(self.inner.editor_mut())
    }

    /// One of `paragraph`, `h1`, `h2`, `h3`, `code`, `quote`.
    pub fn set_block_type(&mut self, block_type: &str) -> Result<bool, JsError> {
        let block = BlockType::from_str(block_type)?;
        Ok(actions::set_block_type(self.inner.editor_mut(), block))
    }

    pub fn set_text_color(&mut self, color: &str) -> bool {
        actions::set_text_color(self.inner.editor_mut(), color)
    }

    pub fn rotate_text_alignment(&mut self) -> bool {
        actions::rotate_text_alignment(self.inner.editor_mut())
    }

    /// One of `left`, `center`, `right`, `justify`.
    pub fn set_alignment(&mut self, align: &str) -> Result<bool, JsError> {
        let align = TextAlign::from_str(align)?;
        Ok(actions::set_alignment(self.inner.editor_mut(), align))
    }

    pub fn toggle_unordered_list(&mut self) -> bool {
        actions::toggle_unordered_list(self.inner.editor_mut())
    }

    pub fn toggle_ordered_list(&mut self) -> bool {
        actions::toggle_ordered_list(self.inner.editor_mut())
    }

    pub fn indent(&mut self) -> bool {
        actions::indent(self.inner.editor_mut())
    }

    pub fn outdent(&mut self) -> bool {
        actions::outdent(self.inner.editor_mut())
    }

    pub fn code_language(&self) -> Option<String> {
        actions::code_language(self.inner.editor())
    }

    pub fn set_code_language(&mut self, language: &str) -> bool {
        actions::set_code_language(self.inner.editor_mut(), language)
    }

    /// `[value, label]` pairs for the code language picker, as JSON.
    pub fn code_languages(&self) -> Result<String, JsError> {
        Ok(serde_json::to_string(&CODE_LANGUAGES)?)
    }

    pub fn insert_link(&mut self, url: &str) -> bool {
        actions::insert_link(self.inner.editor_mut(), url)
    }

    pub fn link_url(&self) -> Option<String> {
        actions::link_url(self.inner.editor())
    }

    pub fn set_link_url(&mut self, url: &str) -> bool {
        actions::set_link_url(self.inner.editor_mut(), url)
    }

    pub fn remove_link(&mut self) -> bool {
        actions::remove_link(self.inner.editor_mut())
    }

    /// `src` is the already resolved image source, e.g. a data URL.
    pub fn insert_image(&mut self, src: &str, alt: &str) -> bool {
        actions::insert_image(self.inner.editor_mut(), src, alt)
    }

    pub fn delete_image(&mut self, key: &str) -> bool {
        self.inner
            .editor_mut()
            .dispatch_command(EditorCommand::DeleteImage {
                key: NodeKey::from(key),
            })
    }

    /// Start handling interaction for the rendered image `key`.
    pub fn attach_image(&mut self, key: &str) -> bool {
        self.inner.attach_image(NodeKey::from(key))
    }

    pub fn detach_image(&mut self, key: &str) -> bool {
        self.inner.detach_image(&NodeKey::from(key))
    }

    pub fn image_is_selected(&mut self, key: &str) -> bool {
        self.inner
            .with_image(&NodeKey::from(key), |image, _| image.is_selected())
            .unwrap_or(false)
    }

    /// A pointer press anywhere in the page.
    pub fn image_pointer_down(&mut self, key: &str, inside_image: bool) {
        self.inner.with_image(&NodeKey::from(key), |image, editor| {
            image.pointer_down(editor, inside_image)
        });
    }

    pub fn image_key_down(&mut self, key: &str, key_name: &str) -> bool {
        self.inner
            .with_image(&NodeKey::from(key), |image, editor| {
                image.key_down(editor, key_name)
            })
            .unwrap_or(false)
    }

    pub fn image_resize_stop(&mut self, key: &str, width: u32, height: u32) {
        self.inner.with_image(&NodeKey::from(key), |image, editor| {
            image.resize_stop(editor, width, height)
        });
    }

    /// CSS width to display the image at once it has loaded.
    pub fn image_loaded(
        &mut self,
        key: &str,
        natural_width: u32,
        container_width: u32,
    ) -> Option<String> {
        self.inner.with_image(&NodeKey::from(key), |image, editor| {
            image
                .image_loaded(editor.state(), natural_width, container_width)
                .to_string()
        })
    }

    /// JSON of the buttons and handles to show, or `None` while unselected.
    pub fn image_controls(&mut self, key: &str) -> Option<String> {
        self.inner
            .with_image(&NodeKey::from(key), |image, editor| image.controls(editor))
            .flatten()
            .map(|controls| controls_json(&controls).to_string())
    }

    /// `option` is a button name from `image_controls`.
    pub fn image_activate(&mut self, key: &str, option: &str) -> Result<bool, JsError> {
        let option = ToolbarOption::from_str(option)?;
        Ok(self
            .inner
            .with_image(&NodeKey::from(key), |image, editor| {
                image.activate(editor, option)
            })
            .unwrap_or(false))
    }

    pub fn undo(&mut self) -> bool {
        actions::undo(self.inner.editor_mut())
    }

    pub fn redo(&mut self) -> bool {
        actions::redo(self.inner.editor_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"root": {"type": "root", "version": 1, "children": [
        {"type": "paragraph", "version": 1, "children": [
            {"type": "text", "version": 1, "text": "hi", "format": 0}
        ]}
    ]}}"#;

    #[test]
    fn objects_without_a_json_form_are_rejected() {
        let mut handle = EditorHandle::default();
        assert_eq!(load_value(&mut handle, HostValue::Object(None)), ValueLoad::Rejected);
        assert_eq!(
            load_value(&mut handle, HostValue::Object(Some("{".to_owned()))),
            ValueLoad::Rejected
        );
        assert_eq!(load_value(&mut handle, HostValue::Missing), ValueLoad::Unchanged);
    }

    #[test]
    fn objects_and_strings_load_alike() {
        let mut handle = EditorHandle::default();
        assert_eq!(
            load_value(&mut handle, HostValue::Object(Some(DOC.to_owned()))),
            ValueLoad::Loaded
        );
        assert_eq!(
            load_value(&mut handle, HostValue::Text(DOC.to_owned())),
            ValueLoad::Unchanged
        );
        assert_eq!(handle.export(), "<p>hi</p>");
    }

    #[test]
    fn image_controls_serialize_their_buttons() {
        let controls = ImageControls {
            buttons: vec![(ToolbarOption::FloatLeft, true), (ToolbarOption::Delete, false)],
            resizable: true,
            lock_aspect_ratio: true,
        };
        assert_eq!(
            controls_json(&controls),
            serde_json::json!({
                "buttons": [
                    {"option": "FloatLeft", "active": true},
                    {"option": "Delete", "active": false},
                ],
                "resizable": true,
                "lockAspectRatio": true,
            })
        );
        assert_eq!(ToolbarOption::from_str("FloatLeft").ok(), Some(ToolbarOption::FloatLeft));
    }
}
