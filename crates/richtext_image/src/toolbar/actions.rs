// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! What the toolbar buttons do.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::dom::nodes::{
    DocNode, ElementKind, ImagePayload, ListType, TextAlign, TextFormatType,
};
use crate::dom::selection::Selection;
use crate::editor::commands::EditorCommand;
use crate::plugins::rich_text;
use crate::toolbar::BlockType;
use crate::Editor;

const SUPPORTED_URL_SCHEMES: [&str; 5] = ["http", "https", "mailto", "sms", "tel"];

static LINK_PROTOCOL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\w+:)?//").unwrap());

pub fn toggle_bold(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::FormatText(TextFormatType::Bold))
}

pub fn toggle_italic(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::FormatText(TextFormatType::Italic))
}

pub fn toggle_underline(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::FormatText(TextFormatType::Underline))
}

pub fn toggle_strikethrough(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::FormatText(TextFormatType::Strikethrough))
}

pub fn toggle_code(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::FormatText(TextFormatType::Code))
}

/// Turn the top-level blocks under a range selection into `block`.
pub fn set_block_type(editor: &mut Editor, block: BlockType) -> bool {
    editor.update(|txn| {
        if !matches!(txn.selection(), Some(Selection::Range(_))) {
            return false;
        }
        rich_text::set_block_kind(txn, block.element_kind())
    })
}

pub fn set_text_color(editor: &mut Editor, color: &str) -> bool {
    editor.update(|txn| rich_text::patch_text_style(txn, "color", color))
}

pub fn set_alignment(editor: &mut Editor, align: TextAlign) -> bool {
    editor.dispatch_command(EditorCommand::FormatElement(align))
}

/// Move the block at the anchor to the next configured alignment.
pub fn rotate_text_alignment(editor: &mut Editor) -> bool {
    let state = editor.state();
    let Some(Selection::Range(range)) = state.selection() else {
        return false;
    };
    let toolbar = &editor.config().toolbar;
    let current = state
        .nearest_block_element(&range.anchor.key)
        .and_then(|k| state.get(&k).and_then(DocNode::as_element)?.format)
        .unwrap_or_else(|| toolbar.default_alignment());
    let next = toolbar.next_alignment(current);
    set_alignment(editor, next)
}

pub fn toggle_unordered_list(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::InsertList(ListType::Unordered))
}

pub fn toggle_ordered_list(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::InsertList(ListType::Ordered))
}

pub fn indent(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::IndentContent)
}

pub fn outdent(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::OutdentContent)
}

/// Language of the code block holding the anchor, if it has one.
pub fn code_language(editor: &Editor) -> Option<String> {
    let state = editor.state();
    let Some(Selection::Range(range)) = state.selection() else {
        return None;
    };
    let block = state.top_level_element(&range.anchor.key)?;
    match state.get(&block)?.as_element()?.kind() {
        ElementKind::Code { language } => language.clone(),
        _ => None,
    }
}

pub fn set_code_language(editor: &mut Editor, language: &str) -> bool {
    editor.update(|txn| rich_text::set_code_language(txn, language))
}

pub fn insert_link(editor: &mut Editor, url: &str) -> bool {
    editor.dispatch_command(EditorCommand::ToggleLink(Some(url.to_owned())))
}

pub fn remove_link(editor: &mut Editor) -> bool {
    editor.dispatch_command(EditorCommand::ToggleLink(None))
}

/// URL of the link around a caret.
pub fn link_url(editor: &Editor) -> Option<String> {
    let state = editor.state();
    let range = state.selection().and_then(Selection::as_range)?;
    if !range.is_collapsed() {
        return None;
    }
    state
        .self_and_ancestors(&range.anchor.key)
        .iter()
        .find_map(|key| match state.get(key)?.as_element()?.kind() {
            ElementKind::Link { url } => Some(url.clone()),
            _ => None,
        })
}

/// Point the link around a caret at `url`. Whatever protocol `url` carries
/// is replaced by `https://`.
pub fn set_link_url(editor: &mut Editor, url: &str) -> bool {
    let url = format!("https://{}", LINK_PROTOCOL.replace(url.trim(), ""));
    editor.update(|txn| rich_text::set_link_url(txn, &url))
}

/// Replace links with unsupported schemes by `about:blank`. Strings that do
/// not parse as absolute URLs are returned unchanged.
pub fn sanitize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) if !SUPPORTED_URL_SCHEMES.contains(&parsed.scheme()) => {
            "about:blank".to_owned()
        }
        _ => url.to_owned(),
    }
}

/// Insert an image whose source the host has already resolved (e.g. a data
/// URL read from a picked file).
pub fn insert_image(editor: &mut Editor, src: &str, alt: &str) -> bool {
    editor.dispatch_command(EditorCommand::InsertImage(ImagePayload::new(src, alt)))
}

pub fn undo(editor: &mut Editor) -> bool {
    editor.undo()
}

pub fn redo(editor: &mut Editor) -> bool {
    editor.redo()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::selection::Point;
    use crate::{plugins, EditorConfig, NodeKey, ToolbarStateHandle};

    fn editor(html: &str) -> (Editor, ToolbarStateHandle) {
        let mut editor = Editor::new(EditorConfig::default());
        plugins::register_plugins(&mut editor);
        let toolbar = ToolbarStateHandle::register(&mut editor);
        editor.set_content_from_html(html).unwrap();
        (editor, toolbar)
    }

    fn select_all_of_first_text(editor: &mut Editor) -> NodeKey {
        let key = editor
            .state()
            .document_order()
            .into_iter()
            .find(|k| editor.state().get(k).and_then(DocNode::as_text).is_some())
            .unwrap();
        let len = editor.state().get(&key).and_then(DocNode::as_text).unwrap().len();
        editor.set_selection(Some(Selection::range(
            Point::new(key.clone(), 0),
            Point::new(key.clone(), len),
        )));
        key
    }

    fn text_key(editor: &Editor, text: &str) -> NodeKey {
        let state = editor.state();
        state
            .document_order()
            .into_iter()
            .find(|k| state.get(k).and_then(DocNode::as_text).is_some_and(|t| t.text == text))
            .unwrap()
    }

    fn select_between(editor: &mut Editor, from: &str, to: &str) {
        let start = text_key(editor, from);
        let end = text_key(editor, to);
        editor.set_selection(Some(Selection::range(
            Point::new(start, 0),
            Point::new(end, to.chars().count()),
        )));
    }

    #[test]
    fn sanitize_url_only_allows_known_schemes() {
        assert_eq!(sanitize_url("https://example.org/a?b"), "https://example.org/a?b");
        assert_eq!(sanitize_url("mailto:me@example.org"), "mailto:me@example.org");
        assert_eq!(sanitize_url("tel:+123"), "tel:+123");
        assert_eq!(sanitize_url("javascript:alert(1)"), "about:blank");
        assert_eq!(sanitize_url("ftp://example.org"), "about:blank");
        assert_eq!(sanitize_url("not a url"), "not a url");
        assert_eq!(sanitize_url(""), "");
    }

    #[test]
    fn toggles_update_the_toolbar() {
        let (mut editor, toolbar) = editor("<p>hello</p>");
        select_all_of_first_text(&mut editor);
        toggle_bold(&mut editor);
        toggle_underline(&mut editor);
        let style = toolbar.get().style;
        assert!(style.bold && style.underline);
        assert!(!style.italic);

        toggle_bold(&mut editor);
        assert!(!toolbar.get().style.bold);
    }

    #[test]
    fn block_types_follow_the_selection() {
        let (mut editor, toolbar) = editor("<p>hello</p>");
        select_all_of_first_text(&mut editor);
        assert!(set_block_type(&mut editor, BlockType::Quote));
        assert_eq!(toolbar.get().block_type, BlockType::Quote);
        assert_eq!(editor.export_html(), "<blockquote>hello</blockquote>");
        assert!(!set_block_type(&mut editor, BlockType::Quote));
    }

    #[test]
    fn block_types_need_a_range() {
        let (mut editor, _) = editor("<p>hello</p>");
        editor.set_selection(None);
        assert!(!set_block_type(&mut editor, BlockType::H1));
        assert_eq!(editor.export_html(), "<p>hello</p>");
    }

    #[test]
    fn alignment_rotates_and_wraps() {
        let (mut editor, toolbar) = editor("<p>hello</p>");
        select_all_of_first_text(&mut editor);
        let mut seen = Vec::new();
        for _ in 0..4 {
            rotate_text_alignment(&mut editor);
            seen.push(toolbar.get().style.text_align);
        }
        assert_eq!(
            seen,
            vec![
                TextAlign::Center,
                TextAlign::Right,
                TextAlign::Justify,
                TextAlign::Left
            ]
        );
    }

    #[test]
    fn text_colour_shows_up_in_the_toolbar() {
        let (mut editor, toolbar) = editor("<p>hello</p>");
        select_all_of_first_text(&mut editor);
        set_text_color(&mut editor, "#800080");
        assert_eq!(toolbar.get().style.color, "#800080");
    }

    #[test]
    fn links_can_be_added_and_removed() {
        let (mut editor, toolbar) = editor("<p>hello</p>");
        select_all_of_first_text(&mut editor);
        insert_link(&mut editor, "https://example.org");
        assert!(toolbar.get().style.is_link);
        remove_link(&mut editor);
        assert!(!toolbar.get().style.is_link);
    }

    #[test]
    fn lists_toggle_and_switch_type() {
        let (mut editor, toolbar) = editor("<p>one</p><p>two</p>");
        select_between(&mut editor, "one", "two");

        assert!(toggle_unordered_list(&mut editor));
        assert_eq!(editor.export_html(), "<ul><li>one</li><li>two</li></ul>");
        assert!(toolbar.get().style.is_unordered_list);

        assert!(toggle_ordered_list(&mut editor));
        assert_eq!(editor.export_html(), "<ol><li>one</li><li>two</li></ol>");
        let style = toolbar.get().style;
        assert!(style.is_ordered_list && !style.is_unordered_list);

        assert!(toggle_ordered_list(&mut editor));
        assert_eq!(editor.export_html(), "<p>one</p><p>two</p>");
        assert!(!toolbar.get().style.is_ordered_list);
    }

    #[test]
    fn list_items_keep_their_alignment() {
        let (mut editor, _) = editor(r#"<p style="text-align:center">one</p>"#);
        select_all_of_first_text(&mut editor);
        toggle_unordered_list(&mut editor);
        assert_eq!(
            editor.export_html(),
            "<ul><li style=\"text-align:center\">one</li></ul>"
        );
    }

    #[test]
    fn indent_stops_at_zero() {
        let (mut editor, _) = editor("<p>hello</p>");
        select_all_of_first_text(&mut editor);
        assert!(indent(&mut editor));
        assert!(indent(&mut editor));
        assert_eq!(
            editor.export_html(),
            "<p style=\"padding-inline-start:80px\">hello</p>"
        );

        assert!(outdent(&mut editor));
        assert!(outdent(&mut editor));
        assert!(!outdent(&mut editor));
        assert_eq!(editor.export_html(), "<p>hello</p>");
    }

    #[test]
    fn code_blocks_carry_a_language() {
        let (mut editor, _) = editor("<pre>let x</pre><p>prose</p>");
        let code = text_key(&editor, "let x");
        editor.set_selection(Some(Selection::caret(code, 1)));
        assert_eq!(code_language(&editor), None);

        assert!(set_code_language(&mut editor, "rust"));
        assert_eq!(code_language(&editor).as_deref(), Some("rust"));
        assert!(editor.export_html().starts_with("<pre data-language=\"rust\">"));
        assert!(!set_code_language(&mut editor, "rust"));

        let prose = text_key(&editor, "prose");
        editor.set_selection(Some(Selection::caret(prose, 0)));
        assert!(!set_code_language(&mut editor, "python"));
        assert_eq!(code_language(&editor), None);
    }

    #[test]
    fn the_link_at_the_caret_can_be_repointed() {
        let (mut editor, _) = editor("<p>see <a href=\"https://example.org\">docs</a></p>");
        let docs = text_key(&editor, "docs");
        editor.set_selection(Some(Selection::caret(docs.clone(), 2)));
        assert_eq!(link_url(&editor).as_deref(), Some("https://example.org"));

        assert!(set_link_url(&mut editor, " http://example.com/x "));
        assert_eq!(
            editor.export_html(),
            "<p>see <a href=\"https://example.com/x\">docs</a></p>"
        );
        assert!(set_link_url(&mut editor, "example.net"));
        assert_eq!(link_url(&editor).as_deref(), Some("https://example.net"));

        editor.set_selection(Some(Selection::range(
            Point::new(docs.clone(), 0),
            Point::new(docs, 4),
        )));
        assert_eq!(link_url(&editor), None);
        assert!(!set_link_url(&mut editor, "example.com"));
    }

    #[test]
    fn images_and_history() {
        let (mut editor, toolbar) = editor("");
        assert!(insert_image(&mut editor, "data:image/png;base64,AAAA", ""));
        assert_eq!(editor.state().images().len(), 1);
        assert!(toolbar.get().can_undo);

        assert!(undo(&mut editor));
        assert!(editor.state().images().is_empty());
        assert!(toolbar.get().can_redo);
        assert!(redo(&mut editor));
        assert_eq!(editor.state().images().len(), 1);
    }
}
