// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Interaction state of one rendered image.
//!
//! A controller is either unselected or selected. Pointer presses inside the
//! image select it, presses anywhere else (or the image disappearing from
//! the document) deselect it. While selected, Delete and Backspace remove
//! the image, the resize handles are live and the placement buttons are
//! offered. Selection is local to the controller and independent of the
//! editor's own selection.
//!
//! Read-only editors ignore every interaction.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::dom::nodes::{DocNode, ImageAlignment, ImageFloat, ImageNode};
use crate::dom::{EditorState, NodeKey};
use crate::editor::commands::EditorCommand;
use crate::editor::{TaskQueue, UpdateListenerId};
use crate::Editor;

/// Width an image is displayed at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DisplayWidth {
    Pixels(u32),
    /// Share of the container width, below 100.
    Percent(f64),
    Full,
}

impl DisplayWidth {
    /// Natural width relative to the container, for images never resized.
    pub fn relative(natural_width: u32, container_width: u32) -> Self {
        if container_width == 0 || natural_width >= container_width {
            DisplayWidth::Full
        } else {
            DisplayWidth::Percent(f64::from(natural_width) / f64::from(container_width) * 100.0)
        }
    }
}

impl fmt::Display for DisplayWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayWidth::Pixels(px) => write!(f, "{px}px"),
            DisplayWidth::Percent(pct) => write!(f, "{pct:.2}%"),
            DisplayWidth::Full => f.write_str("100%"),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
pub enum ToolbarOption {
    AlignLeft,
    AlignCenter,
    AlignRight,
    FloatLeft,
    FloatRight,
    FloatNone,
    Delete,
}

/// What a selected image offers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageControls {
    /// Buttons in display order, each with whether it is active.
    pub buttons: Vec<(ToolbarOption, bool)>,
    pub resizable: bool,
    pub lock_aspect_ratio: bool,
}

pub struct ImageController {
    key: NodeKey,
    selected: Rc<Cell<bool>>,
    /// Set once the user has resized the image in this session.
    resized: bool,
    width: Option<DisplayWidth>,
    height: Option<u32>,
    listener: UpdateListenerId,
}

impl ImageController {
    /// Control the image `key` of `editor`. The controller deselects itself
    /// when a commit removes the image.
    pub fn new(editor: &mut Editor, key: NodeKey) -> Self {
        let selected = Rc::new(Cell::new(false));
        let watched = key.clone();
        let flag = Rc::clone(&selected);
        let listener = editor.register_update_listener(move |update| {
            if flag.get() && update.state.image(&watched).is_none() {
                flag.set(false);
            }
        });
        let (width, height) = match editor.state().image(&key) {
            Some(image) => (
                image.width().px().map(DisplayWidth::Pixels),
                image.height().px(),
            ),
            None => (None, None),
        };
        Self {
            key,
            selected,
            resized: false,
            width,
            height,
            listener,
        }
    }

    /// Stop watching the editor.
    pub fn detach(self, editor: &mut Editor) {
        editor.unregister_update_listener(self.listener);
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn is_selected(&self) -> bool {
        self.selected.get()
    }

    pub fn display_width(&self) -> Option<DisplayWidth> {
        self.width
    }

    pub fn display_height(&self) -> Option<u32> {
        self.height
    }

    /// A pointer press somewhere in the page.
    pub fn pointer_down(&mut self, editor: &Editor, inside_image: bool) {
        if !editor.is_editable() {
            return;
        }
        if inside_image && editor.state().image(&self.key).is_some() {
            self.selected.set(true);
        } else {
            self.selected.set(false);
        }
    }

    /// Returns true when the key deleted the image.
    pub fn key_down(&mut self, editor: &mut Editor, key: &str) -> bool {
        if !editor.is_editable() || !self.is_selected() {
            return false;
        }
        match key {
            "Delete" | "Backspace" => {
                self.selected.set(false);
                editor.dispatch_command(EditorCommand::DeleteImage {
                    key: self.key.clone(),
                })
            }
            _ => false,
        }
    }

    /// Deselect now and delete the image once the current update is over.
    /// For callers that run while the editor is busy, e.g. from an update
    /// listener.
    pub fn request_delete(&mut self, tasks: &TaskQueue) {
        self.selected.set(false);
        let key = self.key.clone();
        tasks.defer(move |editor| {
            editor.dispatch_command(EditorCommand::DeleteImage { key });
        });
    }

    /// The end of a resize gesture with the measured size of the element.
    /// From now on this size is what the image is displayed at.
    pub fn resize_stop(&mut self, editor: &mut Editor, width: u32, height: u32) {
        if !editor.is_editable() || !self.is_selected() {
            return;
        }
        self.resized = true;
        self.width = Some(DisplayWidth::Pixels(width));
        self.height = Some(height);
        let key = self.key.clone();
        editor.update(|txn| {
            if let Some(image) = txn.get_writable(&key).and_then(DocNode::as_image_mut) {
                image.set_width(width);
                image.set_height(height);
            }
        });
    }

    /// The image finished loading. Picks the display width unless the user
    /// already resized it.
    pub fn image_loaded(
        &mut self,
        state: &EditorState,
        natural_width: u32,
        container_width: u32,
    ) -> DisplayWidth {
        if let (true, Some(width)) = (self.resized, self.width) {
            return width;
        }
        let width = match state.image(&self.key).and_then(|i| i.width().px()) {
            Some(px) => DisplayWidth::Pixels(px),
            None => DisplayWidth::relative(natural_width, container_width),
        };
        self.width = Some(width);
        width
    }

    /// Returns false when nothing changed.
    pub fn set_alignment(&mut self, editor: &mut Editor, alignment: ImageAlignment) -> bool {
        self.update_image(editor, |image| {
            if image.float().is_floating() || image.alignment() != alignment {
                image.set_alignment(alignment);
                true
            } else {
                false
            }
        })
    }

    /// Returns false when nothing changed.
    pub fn set_float(&mut self, editor: &mut Editor, float: ImageFloat) -> bool {
        self.update_image(editor, |image| {
            if image.float() != float {
                image.set_float(float);
                true
            } else {
                false
            }
        })
    }

    fn update_image(
        &mut self,
        editor: &mut Editor,
        change: impl FnOnce(&mut ImageNode) -> bool,
    ) -> bool {
        if !editor.is_editable() {
            return false;
        }
        let Some(mut image) = editor.state().image(&self.key).cloned() else {
            return false;
        };
        if !change(&mut image) {
            return false;
        }
        let key = self.key.clone();
        editor.update(|txn| {
            if let Some(DocNode::Image(node)) = txn.get_writable(&key) {
                *node = image;
            }
        });
        true
    }

    /// Buttons and resize handles to show, or `None` while unselected.
    pub fn controls(&self, editor: &Editor) -> Option<ImageControls> {
        if !editor.is_editable() || !self.is_selected() {
            return None;
        }
        let image = editor.state().image(&self.key)?;
        let mut buttons = Vec::new();
        if !image.float().is_floating() {
            buttons.extend([
                (ToolbarOption::AlignLeft, image.alignment() == ImageAlignment::Left),
                (ToolbarOption::AlignCenter, image.alignment() == ImageAlignment::Center),
                (ToolbarOption::AlignRight, image.alignment() == ImageAlignment::Right),
            ]);
        }
        buttons.extend([
            (ToolbarOption::FloatLeft, image.float() == ImageFloat::Left),
            (ToolbarOption::FloatRight, image.float() == ImageFloat::Right),
            (ToolbarOption::FloatNone, image.float() == ImageFloat::None),
            (ToolbarOption::Delete, false),
        ]);
        Some(ImageControls {
            buttons,
            resizable: true,
            lock_aspect_ratio: true,
        })
    }

    /// Run a toolbar button.
    pub fn activate(&mut self, editor: &mut Editor, option: ToolbarOption) -> bool {
        match option {
            ToolbarOption::AlignLeft => self.set_alignment(editor, ImageAlignment::Left),
            ToolbarOption::AlignCenter => self.set_alignment(editor, ImageAlignment::Center),
            ToolbarOption::AlignRight => self.set_alignment(editor, ImageAlignment::Right),
            ToolbarOption::FloatLeft => self.set_float(editor, ImageFloat::Left),
            ToolbarOption::FloatRight => self.set_float(editor, ImageFloat::Right),
            ToolbarOption::FloatNone => self.set_float(editor, ImageFloat::None),
            ToolbarOption::Delete => {
                if !editor.is_editable() {
                    return false;
                }
                self.selected.set(false);
                editor.dispatch_command(EditorCommand::DeleteImage {
                    key: self.key.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use super::*;
    use crate::dom::nodes::{Dimension, ImagePayload};
    use crate::{plugins, EditorConfig};

    fn editor_with_image(editable: bool) -> (Editor, ImageController) {
        let mut editor = Editor::new(EditorConfig {
            editable,
            ..Default::default()
        });
        plugins::register_plugins(&mut editor);
        editor.dispatch_command(EditorCommand::InsertImage(ImagePayload::new("a.png", "cat")));
        let key = editor.state().images()[0].key().clone();
        let controller = ImageController::new(&mut editor, key);
        (editor, controller)
    }

    #[test]
    fn pointer_presses_select_and_deselect() {
        let (editor, mut controller) = editor_with_image(true);
        assert_that!(controller.is_selected()).is_false();
        assert_that!(controller.controls(&editor)).is_none();

        controller.pointer_down(&editor, true);
        assert_that!(controller.is_selected()).is_true();
        controller.pointer_down(&editor, false);
        assert_that!(controller.is_selected()).is_false();
    }

    #[test]
    fn delete_keys_only_work_while_selected() {
        let (mut editor, mut controller) = editor_with_image(true);
        assert_that!(controller.key_down(&mut editor, "Delete")).is_false();
        assert_that!(editor.state().images()).has_length(1);

        controller.pointer_down(&editor, true);
        assert_that!(controller.key_down(&mut editor, "a")).is_false();
        assert_that!(controller.key_down(&mut editor, "Backspace")).is_true();
        assert_that!(editor.state().images()).is_empty();
        assert_that!(controller.is_selected()).is_false();
    }

    #[test]
    fn removing_the_image_elsewhere_deselects() {
        let (mut editor, mut controller) = editor_with_image(true);
        controller.pointer_down(&editor, true);
        let key = controller.key().clone();
        editor.dispatch_command(EditorCommand::DeleteImage { key });
        assert_that!(controller.is_selected()).is_false();
    }

    #[test]
    fn deferred_deletes_run_after_the_current_update() {
        let (mut editor, mut controller) = editor_with_image(true);
        controller.pointer_down(&editor, true);
        controller.request_delete(&editor.task_queue());
        assert_that!(controller.is_selected()).is_false();
        assert_that!(editor.state().images()).has_length(1);

        editor.set_selection(None);
        assert_that!(editor.state().images()).is_empty();
    }

    #[test]
    fn resizing_writes_the_size_and_sticks() {
        let (mut editor, mut controller) = editor_with_image(true);
        assert_that!(controller.image_loaded(editor.state(), 400, 800))
            .is_equal_to(DisplayWidth::Percent(50.0));

        controller.resize_stop(&mut editor, 120, 90);
        assert_that!(editor.state().images()[0].width()).is_equal_to(Dimension::Inherit);

        controller.pointer_down(&editor, true);
        controller.resize_stop(&mut editor, 120, 90);
        let image = editor.state().images()[0];
        assert_that!(image.width()).is_equal_to(Dimension::Pixels(120));
        assert_that!(image.height()).is_equal_to(Dimension::Pixels(90));
        assert_that!(controller.image_loaded(editor.state(), 1000, 800))
            .is_equal_to(DisplayWidth::Pixels(120));
    }

    #[test]
    fn relative_widths() {
        assert_eq!(DisplayWidth::relative(300, 0).to_string(), "100%");
        assert_eq!(DisplayWidth::relative(900, 600).to_string(), "100%");
        assert_eq!(DisplayWidth::relative(200, 600).to_string(), "33.33%");
        assert_eq!(DisplayWidth::Pixels(42).to_string(), "42px");
    }

    #[test]
    fn placement_changes_are_idempotent() {
        let (mut editor, mut controller) = editor_with_image(true);
        assert_that!(controller.set_alignment(&mut editor, ImageAlignment::Center)).is_true();
        let version = editor.state().version();
        assert_that!(controller.set_alignment(&mut editor, ImageAlignment::Center)).is_false();
        assert_that!(editor.state().version()).is_equal_to(version);

        assert_that!(controller.set_float(&mut editor, ImageFloat::Right)).is_true();
        assert_that!(controller.set_float(&mut editor, ImageFloat::Right)).is_false();
        let image = editor.state().images()[0];
        assert_that!(image.alignment()).is_equal_to(ImageAlignment::Left);
        assert_that!(image.float()).is_equal_to(ImageFloat::Right);
    }

    #[test]
    fn alignment_buttons_only_show_without_float() {
        let (mut editor, mut controller) = editor_with_image(true);
        controller.pointer_down(&editor, true);
        let options = |c: &ImageController, e: &Editor| -> Vec<ToolbarOption> {
            c.controls(e).unwrap().buttons.into_iter().map(|(o, _)| o).collect()
        };
        assert_that!(options(&controller, &editor)).has_length(7);

        controller.activate(&mut editor, ToolbarOption::FloatLeft);
        let controls = controller.controls(&editor).unwrap();
        assert_that!(controls.buttons).is_equal_to(vec![
            (ToolbarOption::FloatLeft, true),
            (ToolbarOption::FloatRight, false),
            (ToolbarOption::FloatNone, false),
            (ToolbarOption::Delete, false),
        ]);
        assert_that!(controls.lock_aspect_ratio).is_true();

        controller.activate(&mut editor, ToolbarOption::AlignRight);
        assert_that!(options(&controller, &editor)).contains(ToolbarOption::AlignCenter);
    }

    #[test]
    fn read_only_editors_ignore_everything() {
        let (mut editor, mut controller) = editor_with_image(false);
        controller.pointer_down(&editor, true);
        assert_that!(controller.is_selected()).is_false();
        assert_that!(controller.controls(&editor)).is_none();
        assert_that!(controller.set_float(&mut editor, ImageFloat::Left)).is_false();
        assert_that!(controller.activate(&mut editor, ToolbarOption::Delete)).is_false();
        assert_that!(editor.state().images()).has_length(1);
    }
}
