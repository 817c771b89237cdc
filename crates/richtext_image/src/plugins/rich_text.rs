// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Text format, alignment and link handlers, plus the selection helpers the
//! toolbar actions share with them.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use crate::dom::nodes::{
    patch_style, DocNode, ElementKind, ElementNode, ListType, TextAlign, TextFormatType,
};
use crate::dom::selection::{Point, RangeSelection, Selection};
use crate::dom::{NodeKey, Transaction};
use crate::editor::commands::{
    CommandKind, CommandListenerId, CommandPriority, EditorCommand,
};
use crate::toolbar::actions::sanitize_url;
use crate::Editor;

pub fn register(editor: &mut Editor) -> Vec<CommandListenerId> {
    vec![
        editor.register_command(
            CommandKind::FormatText,
            CommandPriority::Editor,
            |command, txn| match command {
                EditorCommand::FormatText(format) => format_text(txn, *format),
                _ => false,
            },
        ),
        editor.register_command(
            CommandKind::FormatElement,
            CommandPriority::Editor,
            |command, txn| match command {
                EditorCommand::FormatElement(align) => format_element(txn, *align),
                _ => false,
            },
        ),
        editor.register_command(
            CommandKind::ToggleLink,
            CommandPriority::Editor,
            |command, txn| match command {
                EditorCommand::ToggleLink(Some(url)) => link(txn, &sanitize_url(url)),
                EditorCommand::ToggleLink(None) => unlink(txn),
                _ => false,
            },
        ),
        editor.register_command(
            CommandKind::InsertList,
            CommandPriority::Editor,
            |command, txn| match command {
                EditorCommand::InsertList(list_type) => toggle_list(txn, *list_type),
                _ => false,
            },
        ),
        editor.register_command(
            CommandKind::IndentContent,
            CommandPriority::Editor,
            |command, txn| matches!(command, EditorCommand::IndentContent) && shift_indent(txn, 1),
        ),
        editor.register_command(
            CommandKind::OutdentContent,
            CommandPriority::Editor,
            |command, txn| {
                matches!(command, EditorCommand::OutdentContent) && shift_indent(txn, -1)
            },
        ),
    ]
}

fn current_range(txn: &Transaction<'_>) -> Option<RangeSelection> {
    txn.selection().and_then(Selection::as_range).cloned()
}

/// Split the text nodes at both ends of the range selection so that every
/// text node it covers is covered completely. Returns the updated range.
pub(crate) fn split_at_range_edges(txn: &mut Transaction<'_>) -> Option<RangeSelection> {
    let range = current_range(txn)?;
    if range.is_collapsed() {
        return Some(range);
    }
    let (start, end) = txn.state().ordered_points(&range);
    // End first: splitting it leaves the start offsets untouched.
    txn.split_text(&end.key, end.offset);
    txn.split_text(&start.key, start.offset);
    current_range(txn)
}

/// Remove the leaves a range selection covers and collapse it onto the gap
/// they leave. The blocks holding them stay.
pub(crate) fn remove_selected_content(txn: &mut Transaction<'_>) -> bool {
    let Some(range) = split_at_range_edges(txn) else {
        return false;
    };
    if range.is_collapsed() {
        return false;
    }
    let (start, end) = txn.state().ordered_points(&range);
    let state = txn.state();
    let texts: BTreeSet<NodeKey> = state.text_nodes_in_range(&range).into_iter().collect();
    let covered: Vec<NodeKey> = state
        .document_order()
        .into_iter()
        .filter(|key| match state.get(key) {
            Some(DocNode::Text(_)) => texts.contains(key),
            Some(DocNode::Image(_)) | Some(DocNode::LineBreak) => {
                let Some(parent) = state.parent(key) else {
                    return false;
                };
                let Some(index) = state.children(parent).iter().position(|k| k == key) else {
                    return false;
                };
                let before = Point::new(parent.clone(), index);
                let after = Point::new(parent.clone(), index + 1);
                state.compare_points(&start, &before).is_some_and(Ordering::is_le)
                    && state.compare_points(&after, &end).is_some_and(Ordering::is_le)
            }
            _ => false,
        })
        .collect();
    txn.set_selection(Some(Selection::caret(start.key, start.offset)));
    for key in &covered {
        txn.remove(key);
    }
    !covered.is_empty()
}

/// Nodes the selection applies to: the covered text nodes of a range (or
/// the node the range sits in when it covers no text), or the selected
/// nodes of a node selection.
pub(crate) fn selected_nodes(txn: &Transaction<'_>) -> Vec<NodeKey> {
    match txn.selection() {
        Some(Selection::Range(range)) => {
            let covered = txn.state().text_nodes_in_range(range);
            if covered.is_empty() {
                vec![range.anchor.key.clone()]
            } else {
                covered
            }
        }
        Some(Selection::Node(nodes)) => nodes.keys.iter().cloned().collect(),
        None => Vec::new(),
    }
}

/// The distinct non-root blocks holding the selected nodes, in order.
pub(crate) fn selected_blocks(txn: &Transaction<'_>) -> Vec<NodeKey> {
    let mut seen = BTreeSet::new();
    selected_nodes(txn)
        .iter()
        .filter_map(|key| txn.state().nearest_block_element(key))
        .filter(|key| !key.is_root())
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Toggle an inline format. A caret only changes the format the next typed
/// text gets.
pub fn format_text(txn: &mut Transaction<'_>, format: TextFormatType) -> bool {
    let Some(range) = current_range(txn) else {
        return false;
    };
    if range.is_collapsed() {
        if let Some(caret) = txn.selection_mut().and_then(Selection::as_range_mut) {
            caret.toggle_format(format);
        }
        return true;
    }
    let set = !range.has_format(format);
    let Some(range) = split_at_range_edges(txn) else {
        return true;
    };
    for key in txn.state().text_nodes_in_range(&range) {
        if let Some(text) = txn.get_writable(&key).and_then(DocNode::as_text_mut) {
            text.format.set(format.flag(), set);
        }
    }
    txn.set_selection(Some(Selection::Range(range)));
    true
}

/// Set one inline style property on the selected text. A caret keeps it as
/// the style of the next typed text.
pub fn patch_text_style(txn: &mut Transaction<'_>, property: &str, value: &str) -> bool {
    let Some(range) = split_at_range_edges(txn) else {
        return false;
    };
    if range.is_collapsed() {
        if let Some(caret) = txn.selection_mut().and_then(Selection::as_range_mut) {
            caret.style = patch_style(&caret.style, property, value);
        }
        return true;
    }
    for key in txn.state().text_nodes_in_range(&range) {
        if let Some(text) = txn.get_writable(&key).and_then(DocNode::as_text_mut) {
            text.style = patch_style(&text.style, property, value);
        }
    }
    txn.set_selection(Some(Selection::Range(range)));
    true
}

pub fn format_element(txn: &mut Transaction<'_>, align: TextAlign) -> bool {
    let blocks = selected_blocks(txn);
    for key in &blocks {
        if let Some(element) = txn.get_writable(key).and_then(DocNode::as_element_mut) {
            element.format = Some(align);
        }
    }
    !blocks.is_empty()
}

/// The distinct top-level blocks holding the selected nodes, in order.
pub(crate) fn selected_top_level_blocks(txn: &Transaction<'_>) -> Vec<NodeKey> {
    let mut seen = BTreeSet::new();
    selected_nodes(txn)
        .iter()
        .filter_map(|key| txn.state().top_level_element(key))
        .filter(|key| !key.is_root())
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Change every selected top-level block into `kind`.
pub fn set_block_kind(txn: &mut Transaction<'_>, kind: ElementKind) -> bool {
    let mut changed = false;
    for key in selected_top_level_blocks(txn) {
        changed |= txn.set_block_kind(&key, kind.clone());
    }
    changed
}

fn is_list_of(txn: &Transaction<'_>, key: &NodeKey, list_type: ListType) -> bool {
    txn.get(key)
        .is_some_and(|n| n.is_element_of(|kind| kind == &ElementKind::List(list_type)))
}

/// Gather the selected top-level blocks into one list of `list_type`, one
/// item per block. Items of other lists join it as they are. When every
/// selected block already is such a list, its items become paragraphs.
pub fn toggle_list(txn: &mut Transaction<'_>, list_type: ListType) -> bool {
    let blocks = selected_top_level_blocks(txn);
    let Some(first) = blocks.first() else {
        return false;
    };
    if blocks.iter().all(|key| is_list_of(txn, key, list_type)) {
        for list in &blocks {
            remove_list(txn, list);
        }
        return true;
    }
    let list = txn.create(DocNode::Element(ElementNode::new(ElementKind::List(list_type))));
    txn.insert_before(first, &list);
    for block in &blocks {
        let Some(element) = txn.get(block).and_then(DocNode::as_element).cloned() else {
            continue;
        };
        if element.kind().is_list() {
            for item in element.children() {
                txn.append(&list, item);
            }
        } else {
            let mut item = ElementNode::new(ElementKind::ListItem);
            item.format = element.format;
            item.indent = element.indent;
            let item = txn.create(DocNode::Element(item));
            txn.append(&list, &item);
            for child in element.children() {
                txn.append(&item, child);
            }
        }
        txn.remove(block);
    }
    true
}

/// Replace a list by its items, each turned into a paragraph.
fn remove_list(txn: &mut Transaction<'_>, list: &NodeKey) {
    for item in txn.state().children(list).to_vec() {
        if txn
            .get(&item)
            .is_some_and(|n| n.is_element_of(|kind| kind == &ElementKind::ListItem))
        {
            txn.set_block_kind(&item, ElementKind::Paragraph);
        }
    }
    txn.unwrap(list);
}

/// Move the indent level of the selected blocks by `delta`, never below
/// zero. Returns whether any block moved.
pub fn shift_indent(txn: &mut Transaction<'_>, delta: i32) -> bool {
    let mut changed = false;
    for key in selected_blocks(txn) {
        let Some(indent) = txn.get(&key).and_then(DocNode::as_element).map(|e| e.indent) else {
            continue;
        };
        let next = indent.saturating_add_signed(delta);
        if next == indent {
            continue;
        }
        if let Some(element) = txn.get_writable(&key).and_then(DocNode::as_element_mut) {
            element.indent = next;
            changed = true;
        }
    }
    changed
}

/// Set the language of the code block holding the anchor.
pub fn set_code_language(txn: &mut Transaction<'_>, language: &str) -> bool {
    let Some(range) = current_range(txn) else {
        return false;
    };
    let Some(block) = txn.state().top_level_element(&range.anchor.key) else {
        return false;
    };
    match txn.get(&block).and_then(DocNode::as_element).map(ElementNode::kind) {
        Some(ElementKind::Code { .. }) => txn.set_block_kind(
            &block,
            ElementKind::Code {
                language: Some(language.to_owned()),
            },
        ),
        _ => false,
    }
}

/// Point the link around a caret at `url`.
pub fn set_link_url(txn: &mut Transaction<'_>, url: &str) -> bool {
    let Some(range) = current_range(txn).filter(RangeSelection::is_collapsed) else {
        return false;
    };
    match enclosing_link(txn, &range.anchor.key) {
        Some(link) => txn.set_block_kind(
            &link,
            ElementKind::Link {
                url: sanitize_url(url),
            },
        ),
        None => false,
    }
}

fn enclosing_link(txn: &Transaction<'_>, key: &NodeKey) -> Option<NodeKey> {
    txn.state()
        .nearest_matching(key, |n| n.is_element_of(ElementKind::is_link))
}

/// The link directly before `key` among its siblings, if it points at `url`.
fn preceding_link(txn: &Transaction<'_>, key: &NodeKey, url: &str) -> Option<NodeKey> {
    let parent = txn.parent(key)?;
    let siblings = txn.state().children(&parent);
    let index = siblings.iter().position(|k| k == key)?;
    let previous = siblings.get(index.checked_sub(1)?)?;
    match txn.get(previous)?.as_element()?.kind() {
        ElementKind::Link { url: existing } if existing == url => Some(previous.clone()),
        _ => None,
    }
}

fn link(txn: &mut Transaction<'_>, url: &str) -> bool {
    let Some(range) = split_at_range_edges(txn) else {
        return false;
    };
    let kind = ElementKind::Link {
        url: url.to_owned(),
    };
    if range.is_collapsed() {
        if let Some(existing) = enclosing_link(txn, &range.anchor.key) {
            txn.set_block_kind(&existing, kind);
        }
        return true;
    }
    for key in txn.state().text_nodes_in_range(&range) {
        if let Some(existing) = enclosing_link(txn, &key) {
            txn.set_block_kind(&existing, kind.clone());
        } else if let Some(previous) = preceding_link(txn, &key, url) {
            txn.append(&previous, &key);
        } else {
            txn.wrap_in_element(&key, ElementNode::new(kind.clone()));
        }
    }
    txn.set_selection(Some(Selection::Range(range)));
    true
}

fn unlink(txn: &mut Transaction<'_>) -> bool {
    let mut seen = BTreeSet::new();
    let links: Vec<NodeKey> = selected_nodes(txn)
        .iter()
        .filter_map(|key| enclosing_link(txn, key))
        .filter(|key| seen.insert(key.clone()))
        .collect();
    for key in &links {
        txn.unwrap(key);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::nodes::{TextFormat, TextNode};
    use crate::dom::selection::Point;
    use crate::EditorConfig;

    fn editor_with_text(text: &str) -> (Editor, NodeKey) {
        let mut editor = Editor::new(EditorConfig::default());
        register(&mut editor);
        let key = editor.update(|txn| {
            let p = txn.create(DocNode::Element(ElementNode::paragraph()));
            let t = txn.create(DocNode::Text(TextNode::new(text)));
            txn.append(&NodeKey::root(), &p);
            txn.append(&p, &t);
            t
        });
        (editor, key)
    }

    fn select(editor: &mut Editor, key: &NodeKey, from: usize, to: usize) {
        editor.set_selection(Some(Selection::range(
            Point::new(key.clone(), from),
            Point::new(key.clone(), to),
        )));
    }

    #[test]
    fn formatting_a_range_splits_the_text() {
        let (mut editor, key) = editor_with_text("hello world");
        select(&mut editor, &key, 6, 11);
        assert!(editor.dispatch_command(EditorCommand::FormatText(TextFormatType::Bold)));
        assert_eq!(editor.export_html(), "<p>hello <strong>world</strong></p>");

        let range = editor.state().selection().and_then(Selection::as_range).unwrap();
        assert!(range.has_format(TextFormatType::Bold));
    }

    #[test]
    fn formatting_a_bold_range_again_clears_it() {
        let (mut editor, key) = editor_with_text("hello");
        select(&mut editor, &key, 0, 5);
        editor.dispatch_command(EditorCommand::FormatText(TextFormatType::Italic));
        editor.dispatch_command(EditorCommand::FormatText(TextFormatType::Italic));
        assert_eq!(editor.export_html(), "<p>hello</p>");
    }

    #[test]
    fn a_caret_only_toggles_the_pending_format() {
        let (mut editor, key) = editor_with_text("hello");
        editor.set_selection(Some(Selection::caret(key.clone(), 2)));
        editor.dispatch_command(EditorCommand::FormatText(TextFormatType::Code));
        let caret = editor.state().selection().and_then(Selection::as_range).unwrap();
        assert_eq!(caret.format, TextFormat::CODE);
        assert_eq!(editor.export_html(), "<p>hello</p>");
    }

    #[test]
    fn alignment_applies_to_the_enclosing_block() {
        let (mut editor, key) = editor_with_text("hello");
        editor.set_selection(Some(Selection::caret(key, 0)));
        editor.dispatch_command(EditorCommand::FormatElement(TextAlign::Right));
        assert_eq!(editor.export_html(), "<p style=\"text-align:right\">hello</p>");
    }

    #[test]
    fn links_wrap_and_unwrap_the_selected_text() {
        let (mut editor, key) = editor_with_text("see docs");
        select(&mut editor, &key, 4, 8);
        editor.dispatch_command(EditorCommand::ToggleLink(Some(
            "https://example.org".to_owned(),
        )));
        assert_eq!(
            editor.export_html(),
            "<p>see <a href=\"https://example.org\">docs</a></p>"
        );

        editor.dispatch_command(EditorCommand::ToggleLink(None));
        assert_eq!(editor.export_html(), "<p>see docs</p>");
    }

    #[test]
    fn unsafe_link_targets_are_neutralised() {
        let (mut editor, key) = editor_with_text("x");
        select(&mut editor, &key, 0, 1);
        editor.dispatch_command(EditorCommand::ToggleLink(Some(
            "javascript:alert(1)".to_owned(),
        )));
        assert_eq!(editor.export_html(), "<p><a href=\"about:blank\">x</a></p>");
    }

    #[test]
    fn block_kinds_change_in_place() {
        let (mut editor, key) = editor_with_text("title");
        editor.set_selection(Some(Selection::caret(key, 0)));
        let changed = editor.update(|txn| {
            set_block_kind(txn, ElementKind::Heading(crate::HeadingTag::H2))
        });
        assert!(changed);
        assert_eq!(editor.export_html(), "<h2>title</h2>");
    }

    #[test]
    fn text_colour_is_patched_into_the_style() {
        let (mut editor, key) = editor_with_text("red");
        select(&mut editor, &key, 0, 3);
        editor.update(|txn| patch_text_style(txn, "color", "#FF0000"));
        assert_eq!(
            editor.export_html(),
            "<p><span style=\"color: #FF0000;\">red</span></p>"
        );
    }
}
