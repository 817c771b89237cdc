// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Keeps a [`ToolbarState`] in step with the editor.
//!
//! After every commit the style flags and block type are recomputed from
//! the selection. Anything other than a range selection keeps the previous
//! snapshot. Undo and redo availability come from the `CanUndo`/`CanRedo`
//! commands instead.

use std::cell::RefCell;
use std::rc::Rc;

use crate::dom::nodes::{DocNode, ElementKind, ListType, TextFormatType};
use crate::dom::selection::{RangeSelection, Selection};
use crate::dom::EditorState;
use crate::editor::commands::{
    CommandKind, CommandListenerId, CommandPriority, EditorCommand,
};
use crate::editor::UpdateListenerId;
use crate::toolbar::{BlockType, EditorStyleState, ToolbarConfig, ToolbarState};
use crate::Editor;

/// Style flags and block type at `range`.
pub fn project_style(
    state: &EditorState,
    range: &RangeSelection,
    config: &ToolbarConfig,
) -> (EditorStyleState, BlockType) {
    let anchor = &range.anchor.key;
    let top = state.top_level_element(anchor);
    let top_kind = top
        .as_ref()
        .and_then(|k| state.get(k))
        .and_then(DocNode::as_element)
        .map(|e| e.kind().clone());

    let list = state
        .nearest_list(anchor)
        .or_else(|| top.clone().filter(|_| top_kind.as_ref().is_some_and(ElementKind::is_list)))
        .and_then(|k| match state.get(&k)?.as_element()?.kind() {
            ElementKind::List(list) => Some(*list),
            _ => None,
        });

    let is_link_node = |key: Option<&crate::NodeKey>| {
        key.and_then(|k| state.get(k))
            .is_some_and(|n| n.is_element_of(ElementKind::is_link))
    };
    let is_link = is_link_node(Some(anchor)) || is_link_node(state.parent(anchor));

    let text_align = state
        .nearest_block_element(anchor)
        .and_then(|k| state.get(&k)?.as_element()?.format)
        .unwrap_or_else(|| config.default_alignment());

    let style = EditorStyleState {
        bold: range.has_format(TextFormatType::Bold),
        italic: range.has_format(TextFormatType::Italic),
        underline: range.has_format(TextFormatType::Underline),
        strikethrough: range.has_format(TextFormatType::Strikethrough),
        code: range.has_format(TextFormatType::Code),
        is_unordered_list: list == Some(ListType::Unordered),
        is_ordered_list: list == Some(ListType::Ordered),
        is_link,
        color: selection_color(state, range, config),
        text_align,
    };
    let block_type = top_kind.as_ref().map(BlockType::of).unwrap_or_default();
    (style, block_type)
}

/// The `color` shared by the selected text. A caret uses the style of the
/// selection itself. Mixed or missing colours give the palette default.
fn selection_color(state: &EditorState, range: &RangeSelection, config: &ToolbarConfig) -> String {
    let default = config.default_color();
    if range.is_collapsed() {
        return crate::dom::nodes::style_value(&range.style, "color")
            .unwrap_or_else(|| default.to_owned());
    }
    let mut colors = state
        .text_nodes_in_range(range)
        .into_iter()
        .filter_map(|k| state.get(&k)?.as_text().map(|t| t.style_value("color")))
        .map(|c| c.unwrap_or_else(|| default.to_owned()));
    match colors.next() {
        Some(first) if colors.all(|c| c == first) => first,
        _ => default.to_owned(),
    }
}

/// Shared handle on the live toolbar snapshot.
#[derive(Clone)]
pub struct ToolbarStateHandle {
    state: Rc<RefCell<ToolbarState>>,
    listener: UpdateListenerId,
    commands: [CommandListenerId; 2],
}

impl ToolbarStateHandle {
    /// Start projecting `editor`'s selection with its toolbar config.
    pub fn register(editor: &mut Editor) -> Self {
        let config = editor.config().toolbar.clone();
        let state = Rc::new(RefCell::new(ToolbarState::new(&config)));

        let snapshot = Rc::clone(&state);
        let listener = editor.register_update_listener(move |update| {
            let Some(Selection::Range(range)) = update.state.selection() else {
                return;
            };
            let (style, block_type) = project_style(update.state, range, &config);
            let mut snapshot = snapshot.borrow_mut();
            snapshot.style = style;
            snapshot.block_type = block_type;
        });

        let undo = Rc::clone(&state);
        let can_undo = editor.register_command(
            CommandKind::CanUndo,
            CommandPriority::Low,
            move |command, _| {
                if let EditorCommand::CanUndo(available) = command {
                    undo.borrow_mut().can_undo = *available;
                }
                false
            },
        );
        let redo = Rc::clone(&state);
        let can_redo = editor.register_command(
            CommandKind::CanRedo,
            CommandPriority::Low,
            move |command, _| {
                if let EditorCommand::CanRedo(available) = command {
                    redo.borrow_mut().can_redo = *available;
                }
                false
            },
        );

        Self {
            state,
            listener,
            commands: [can_undo, can_redo],
        }
    }

    pub fn get(&self) -> ToolbarState {
        self.state.borrow().clone()
    }

    /// Stop following `editor`. The last snapshot stays readable.
    pub fn unregister(&self, editor: &mut Editor) {
        editor.unregister_update_listener(self.listener);
        for id in self.commands {
            editor.unregister_command(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use speculoos::prelude::*;

    use super::*;
    use crate::dom::selection::Point;
    use crate::dom::NodeKey;
    use crate::{plugins, EditorConfig, TextAlign};

    fn editor(html: &str) -> (Editor, ToolbarStateHandle) {
        let mut editor = Editor::new(EditorConfig::default());
        plugins::register_plugins(&mut editor);
        let toolbar = ToolbarStateHandle::register(&mut editor);
        editor.set_content_from_html(html).unwrap();
        (editor, toolbar)
    }

    fn text_node(editor: &Editor, text: &str) -> NodeKey {
        let state = editor.state();
        state
            .document_order()
            .into_iter()
            .find(|k| state.get(k).and_then(DocNode::as_text).is_some_and(|t| t.text == text))
            .unwrap()
    }

    #[test]
    fn formats_come_from_the_selection() {
        let (mut editor, toolbar) = editor("<p><strong><em>both</em></strong> plain</p>");
        let key = text_node(&editor, "both");
        editor.set_selection(Some(Selection::range(
            Point::new(key.clone(), 0),
            Point::new(key, 4),
        )));
        let style = toolbar.get().style;
        assert_that!(style.bold).is_true();
        assert_that!(style.italic).is_true();
        assert_that!(style.underline).is_false();
        assert_that!(style.strikethrough).is_false();
        assert_that!(style.code).is_false();
    }

    #[test]
    fn blocks_lists_links_and_alignment() {
        let (mut editor, toolbar) = editor(indoc! {r#"
            <h2 style="text-align:center">Title</h2>
            <ol><li>first <a href="https://example.org">link</a></li></ol>
        "#});

        let title = text_node(&editor, "Title");
        editor.set_selection(Some(Selection::caret(title, 1)));
        let snapshot = toolbar.get();
        assert_that!(snapshot.block_type).is_equal_to(BlockType::H2);
        assert_that!(snapshot.style.text_align).is_equal_to(TextAlign::Center);
        assert_that!(snapshot.style.is_ordered_list).is_false();

        let link = text_node(&editor, "link");
        editor.set_selection(Some(Selection::caret(link, 2)));
        let snapshot = toolbar.get();
        assert_that!(snapshot.block_type).is_equal_to(BlockType::Paragraph);
        assert_that!(snapshot.style.is_ordered_list).is_true();
        assert_that!(snapshot.style.is_unordered_list).is_false();
        assert_that!(snapshot.style.is_link).is_true();
        assert_that!(snapshot.style.text_align).is_equal_to(TextAlign::Left);
    }

    #[test]
    fn colour_falls_back_to_the_palette_default() {
        let (mut editor, toolbar) = editor(
            r#"<p><span style="color: #FF0000">red</span>plain</p>"#,
        );
        let red = text_node(&editor, "red");
        editor.set_selection(Some(Selection::caret(red.clone(), 1)));
        assert_that!(toolbar.get().style.color).is_equal_to("#FF0000".to_owned());

        let plain = text_node(&editor, "plain");
        editor.set_selection(Some(Selection::range(Point::new(red, 0), Point::new(plain, 5))));
        assert_that!(toolbar.get().style.color).is_equal_to("#000000".to_owned());
    }

    #[test]
    fn node_selections_keep_the_previous_snapshot() {
        let (mut editor, toolbar) = editor("<p><strong>bold</strong></p>");
        let key = text_node(&editor, "bold");
        editor.set_selection(Some(Selection::caret(key.clone(), 1)));
        let before = toolbar.get();
        assert_that!(before.style.bold).is_true();

        editor.set_selection(Some(Selection::nodes([key])));
        assert_that!(toolbar.get()).is_equal_to(before.clone());
        editor.set_selection(None);
        assert_that!(toolbar.get()).is_equal_to(before);
    }

    #[test]
    fn history_availability_is_tracked() {
        let (mut editor, toolbar) = editor("<p>one</p>");
        assert_that!(toolbar.get().can_undo).is_true();
        assert_that!(toolbar.get().can_redo).is_false();
        editor.undo();
        assert_that!(toolbar.get().can_undo).is_false();
        assert_that!(toolbar.get().can_redo).is_true();
    }

    #[test]
    fn unregistered_handles_stop_updating() {
        let (mut editor, toolbar) = editor("<p><em>x</em>y</p>");
        toolbar.unregister(&mut editor);
        let key = text_node(&editor, "x");
        editor.set_selection(Some(Selection::caret(key, 0)));
        assert_that!(toolbar.get().style.italic).is_false();
    }
}
