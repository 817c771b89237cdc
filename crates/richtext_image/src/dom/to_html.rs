// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Markup export of a whole document.
//!
//! Blocks map to their usual tags, inline formats become nested formatting
//! tags around escaped text, and images are rendered by
//! [`crate::export_markup`].

use crate::dom::image_markup::export_markup;
use crate::dom::nodes::{DocNode, ElementKind, ElementNode, TextFormat, TextNode};
use crate::dom::{EditorState, NodeKey};

/// Formats in nesting order, outermost first.
const FORMAT_TAGS: [(TextFormat, &str); 5] = [
    (TextFormat::CODE, "code"),
    (TextFormat::BOLD, "strong"),
    (TextFormat::ITALIC, "em"),
    (TextFormat::STRIKETHROUGH, "s"),
    (TextFormat::UNDERLINE, "u"),
];

/// Inline start padding per indent level.
pub(crate) const INDENT_PX: u32 = 40;

pub fn to_html(state: &EditorState) -> String {
    let mut html = String::new();
    write_children(state, &NodeKey::root(), &mut html);
    html
}

fn write_children(state: &EditorState, key: &NodeKey, html: &mut String) {
    for child in state.children(key) {
        write_node(state, child, html);
    }
}

fn write_node(state: &EditorState, key: &NodeKey, html: &mut String) {
    match state.get(key) {
        Some(DocNode::Text(text)) => write_text(text, html),
        Some(DocNode::LineBreak) => html.push_str("<br>"),
        Some(DocNode::Image(image)) => html.push_str(&export_markup(image)),
        Some(DocNode::Element(element)) => write_element(state, key, element, html),
        None => {}
    }
}

fn write_element(state: &EditorState, key: &NodeKey, element: &ElementNode, html: &mut String) {
    let tag = match element.kind() {
        ElementKind::Root => {
            write_children(state, key, html);
            return;
        }
        ElementKind::Paragraph => "p".to_owned(),
        ElementKind::Heading(tag) => tag.to_string(),
        ElementKind::Quote => "blockquote".to_owned(),
        ElementKind::Code { .. } => "pre".to_owned(),
        ElementKind::List(list) => list.tag().to_owned(),
        ElementKind::ListItem => "li".to_owned(),
        ElementKind::Link { .. } => "a".to_owned(),
    };
    html.push('<');
    html.push_str(&tag);
    match element.kind() {
        ElementKind::Link { url } => html.push_str(&format!(
            " href=\"{}\"",
            html_escape::encode_double_quoted_attribute(url)
        )),
        ElementKind::Code {
            language: Some(language),
        } => html.push_str(&format!(
            " data-language=\"{}\"",
            html_escape::encode_double_quoted_attribute(language)
        )),
        _ => {}
    }
    let mut style = Vec::new();
    if let Some(align) = element.format {
        style.push(format!("text-align:{align}"));
    }
    if element.indent > 0 {
        style.push(format!("padding-inline-start:{}px", element.indent * INDENT_PX));
    }
    if !style.is_empty() {
        html.push_str(&format!(" style=\"{}\"", style.join("; ")));
    }
    html.push('>');
    if element.children().is_empty() && !element.kind().is_inline() {
        html.push_str("<br>");
    }
    write_children(state, key, html);
    html.push_str(&format!("</{tag}>"));
}

fn write_text(text: &TextNode, html: &mut String) {
    let tags: Vec<&str> = FORMAT_TAGS
        .iter()
        .filter(|(flag, _)| text.format.contains(*flag))
        .map(|(_, tag)| *tag)
        .collect();
    if !text.style.is_empty() {
        html.push_str(&format!(
            "<span style=\"{}\">",
            html_escape::encode_double_quoted_attribute(&text.style)
        ));
    }
    for tag in &tags {
        html.push_str(&format!("<{tag}>"));
    }
    html.push_str(&html_escape::encode_text(&text.text));
    for tag in tags.iter().rev() {
        html.push_str(&format!("</{tag}>"));
    }
    if !text.style.is_empty() {
        html.push_str("</span>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::nodes::{ImageNode, TextAlign};
    use crate::dom::{KeyAllocator, Transaction};

    #[test]
    fn formatted_text_nests_in_a_fixed_order() {
        let mut keys = KeyAllocator::new();
        let mut txn = Transaction::begin(&EditorState::new(), &mut keys);
        let mut p = ElementNode::paragraph();
        p.format = Some(TextAlign::Center);
        let p = txn.create(DocNode::Element(p));
        txn.append(&NodeKey::root(), &p);
        let t = txn.create(DocNode::Text(
            TextNode::new("a<b")
                .with_format(TextFormat::BOLD | TextFormat::UNDERLINE)
                .with_style("color: #FF0000;"),
        ));
        txn.append(&p, &t);
        let (state, _) = txn.finish();
        assert_eq!(
            to_html(&state),
            "<p style=\"text-align:center\"><span style=\"color: #FF0000;\">\
             <strong><u>a&lt;b</u></strong></span></p>"
        );
    }

    #[test]
    fn images_and_empty_blocks() {
        let mut keys = KeyAllocator::new();
        let mut txn = Transaction::begin(&EditorState::new(), &mut keys);
        let p = txn.create(DocNode::Element(ElementNode::paragraph()));
        txn.append(&NodeKey::root(), &p);
        let empty = txn.create(DocNode::Element(ElementNode::paragraph()));
        txn.append(&NodeKey::root(), &empty);
        let image = ImageNode::new(NodeKey::from("9"), "a.png", "cat");
        let expected = export_markup(&image);
        let img = txn.create(DocNode::Image(image));
        txn.append(&p, &img);
        let (state, _) = txn.finish();
        assert_eq!(to_html(&state), format!("<p>{expected}</p><p><br></p>"));
    }
}
