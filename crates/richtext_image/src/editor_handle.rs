// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The surface a host embeds: an editor with every built-in handler and a
//! toolbar already attached, markup export, change callbacks and value
//! loading that never fails loudly.

use std::collections::BTreeMap;

use crate::config::EditorConfig;
use crate::dom::serialize::SerializedEditorState;
use crate::dom::NodeKey;
use crate::editor::UpdateListenerId;
use crate::error::StateError;
use crate::image_controller::ImageController;
use crate::toolbar::{ToolbarState, ToolbarStateHandle};
use crate::{plugins, Editor};

/// A document value handed in by the host.
#[derive(Clone, Debug, PartialEq)]
pub enum EditorValue {
    Json(String),
    Parsed(serde_json::Value),
}

/// What [`EditorHandle::set_value`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueLoad {
    /// Empty, or equal to the current document.
    Unchanged,
    Loaded,
    /// Not a valid document. The current one was kept.
    Rejected,
}

pub struct EditorHandle {
    editor: Editor,
    toolbar: ToolbarStateHandle,
    change_listener: Option<UpdateListenerId>,
    images: BTreeMap<NodeKey, ImageController>,
}

impl Default for EditorHandle {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorHandle {
    pub fn new(config: EditorConfig) -> Self {
        let mut editor = Editor::new(config);
        plugins::register_plugins(&mut editor);
        let toolbar = ToolbarStateHandle::register(&mut editor);
        Self {
            editor,
            toolbar,
            change_listener: None,
            images: BTreeMap::new(),
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn toolbar(&self) -> ToolbarState {
        self.toolbar.get()
    }

    /// Markup of the whole document.
    pub fn export(&self) -> String {
        self.editor.export_html()
    }

    /// Call `callback` with the document JSON after every commit. Replaces
    /// any previous callback.
    pub fn on_change(&mut self, mut callback: impl FnMut(&str) + 'static) {
        if let Some(id) = self.change_listener.take() {
            self.editor.unregister_update_listener(id);
        }
        let id = self.editor.register_update_listener(move |update| {
            match SerializedEditorState::from_state(update.state).to_json() {
                Ok(json) => callback(&json),
                Err(e) => log::error!("Could not serialize the document: {e}"),
            }
        });
        self.change_listener = Some(id);
    }

    /// Start an interaction controller for the image `key`. Returns false
    /// when there is no such image. Attaching twice keeps the first one.
    pub fn attach_image(&mut self, key: NodeKey) -> bool {
        if self.editor.state().image(&key).is_none() {
            return false;
        }
        if !self.images.contains_key(&key) {
            let controller = ImageController::new(&mut self.editor, key.clone());
            self.images.insert(key, controller);
        }
        true
    }

    pub fn detach_image(&mut self, key: &NodeKey) -> bool {
        match self.images.remove(key) {
            Some(controller) => {
                controller.detach(&mut self.editor);
                true
            }
            None => false,
        }
    }

    /// Run `f` on the controller of an attached image.
    pub fn with_image<R>(
        &mut self,
        key: &NodeKey,
        f: impl FnOnce(&mut ImageController, &mut Editor) -> R,
    ) -> Option<R> {
        let controller = self.images.get_mut(key)?;
        Some(f(controller, &mut self.editor))
    }

    /// Load a document unless it matches the current one. Invalid values
    /// are logged and ignored.
    pub fn set_value(&mut self, value: Option<&EditorValue>) -> ValueLoad {
        let form = match value {
            None => return ValueLoad::Unchanged,
            Some(EditorValue::Json(json)) if json.is_empty() => return ValueLoad::Unchanged,
            Some(EditorValue::Parsed(serde_json::Value::Null)) => return ValueLoad::Unchanged,
            Some(EditorValue::Json(json)) => SerializedEditorState::from_json(json),
            Some(EditorValue::Parsed(parsed)) => SerializedEditorState::from_value(parsed.clone()),
        };
        match self.load(form) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("Rejected editor value: {e}");
                ValueLoad::Rejected
            }
        }
    }

    fn load(
        &mut self,
        form: Result<SerializedEditorState, StateError>,
    ) -> Result<ValueLoad, StateError> {
        let form = form?;
        if form.to_json()? == self.editor.to_json()? {
            return Ok(ValueLoad::Unchanged);
        }
        let state = self.editor.parse_editor_state(&form)?;
        self.editor.set_editor_state(state);
        Ok(ValueLoad::Loaded)
    }
}
