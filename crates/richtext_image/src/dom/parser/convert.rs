// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Conversion rules from a [`MarkupTree`] to document nodes.
//!
//! Each element is offered to the rules in order: the image rule first, then
//! the block and link rules, then the inline formatting rules. The first rule
//! that claims the element produces its nodes; an element nobody claims is
//! unwrapped and its children are converted in its place. Inline formatting
//! is carried down the recursion and lands on the text nodes.

use crate::dom::nodes::text_node::patch_style;
use crate::dom::nodes::{
    DocNode, ElementKind, ElementNode, HeadingTag, ImageNode, ListType, TextAlign,
    TextFormat, TextNode,
};
use crate::dom::to_html::INDENT_PX;
use crate::dom::{NodeKey, Transaction};

use super::{MarkupElement, MarkupHandle, MarkupNode, MarkupTree};

#[derive(Clone, Debug, Default)]
struct InlineContext {
    format: TextFormat,
    style: String,
    in_code: bool,
}

/// Convert `tree` and append the result to the root. Inline runs at the top
/// level are wrapped in paragraphs. Returns the new top-level keys.
pub fn import_markup(txn: &mut Transaction, tree: &MarkupTree) -> Vec<NodeKey> {
    let document = tree.get_node(tree.document_handle()).children().to_vec();
    let nodes = convert_children(txn, tree, &document, &InlineContext::default());
    let root = NodeKey::root();
    let before = txn.state().children(&root).len();
    fill(txn, &root, nodes);
    txn.state().children(&root)[before..].to_vec()
}

fn convert_children(
    txn: &mut Transaction,
    tree: &MarkupTree,
    children: &[MarkupHandle],
    ctx: &InlineContext,
) -> Vec<NodeKey> {
    children
        .iter()
        .flat_map(|child| convert_node(txn, tree, child, ctx))
        .collect()
}

fn convert_node(
    txn: &mut Transaction,
    tree: &MarkupTree,
    handle: &MarkupHandle,
    ctx: &InlineContext,
) -> Vec<NodeKey> {
    match tree.get_node(handle) {
        MarkupNode::Text(text) => convert_text(txn, &text.content, ctx),
        MarkupNode::Element(element) => convert_element(txn, tree, element, ctx),
        MarkupNode::Document(document) => convert_children(txn, tree, &document.children, ctx),
        MarkupNode::Ignored => Vec::new(),
    }
}

fn convert_element(
    txn: &mut Transaction,
    tree: &MarkupTree,
    element: &MarkupElement,
    ctx: &InlineContext,
) -> Vec<NodeKey> {
    if let Some(image) = ImageNode::import_markup(element, txn.key_allocator()) {
        return vec![txn.create(DocNode::Image(image))];
    }
    let tag = element.tag().to_ascii_lowercase();
    if let Some(kind) = element_kind(&tag, element) {
        let mut inner = ctx.clone();
        if matches!(kind, ElementKind::Code { .. }) {
            inner.in_code = true;
        }
        let children = convert_children(txn, tree, element.children(), &inner);
        let mut node = ElementNode::new(kind);
        node.format = alignment_of(element);
        node.indent = indent_of(element);
        let key = txn.create(DocNode::Element(node));
        fill(txn, &key, children);
        return vec![key];
    }
    match tag.as_str() {
        "br" => vec![txn.create(DocNode::LineBreak)],
        "script" | "style" | "head" | "title" | "template" => Vec::new(),
        _ => {
            let inner = inline_context(&tag, element, ctx);
            convert_children(txn, tree, element.children(), &inner)
        }
    }
}

fn element_kind(tag: &str, element: &MarkupElement) -> Option<ElementKind> {
    let kind = match tag {
        "p" => ElementKind::Paragraph,
        "h1" => ElementKind::Heading(HeadingTag::H1),
        "h2" => ElementKind::Heading(HeadingTag::H2),
        "h3" | "h4" | "h5" | "h6" => ElementKind::Heading(HeadingTag::H3),
        "blockquote" => ElementKind::Quote,
        "pre" => ElementKind::Code {
            language: element.get_attr("data-language").map(str::to_owned),
        },
        "ul" => ElementKind::List(ListType::Unordered),
        "ol" => ElementKind::List(ListType::Ordered),
        "li" => ElementKind::ListItem,
        "a" => ElementKind::Link {
            url: element.get_attr("href").unwrap_or_default().to_owned(),
        },
        _ => return None,
    };
    Some(kind)
}

fn alignment_of(element: &MarkupElement) -> Option<TextAlign> {
    element
        .style_value("text-align")
        .as_deref()
        .or(element.get_attr("align"))
        .and_then(TextAlign::from_format)
}

fn indent_of(element: &MarkupElement) -> u32 {
    element
        .style_value("padding-inline-start")
        .and_then(|padding| padding.trim().trim_end_matches("px").parse::<f64>().ok())
        .map(|px| (px / f64::from(INDENT_PX)).round().max(0.0) as u32)
        .unwrap_or_default()
}

fn inline_context(tag: &str, element: &MarkupElement, ctx: &InlineContext) -> InlineContext {
    let mut inner = ctx.clone();
    match tag {
        "b" | "strong" => inner.format |= TextFormat::BOLD,
        "i" | "em" => inner.format |= TextFormat::ITALIC,
        "u" => inner.format |= TextFormat::UNDERLINE,
        "s" | "del" | "strike" => inner.format |= TextFormat::STRIKETHROUGH,
        "code" if !ctx.in_code => inner.format |= TextFormat::CODE,
        _ => {}
    }
    if element.contains_style("font-weight", "bold") || element.contains_style("font-weight", "700")
    {
        inner.format |= TextFormat::BOLD;
    }
    if element.contains_style("font-style", "italic") {
        inner.format |= TextFormat::ITALIC;
    }
    if element.contains_style("text-decoration", "underline") {
        inner.format |= TextFormat::UNDERLINE;
    }
    if element.contains_style("text-decoration", "line-through") {
        inner.format |= TextFormat::STRIKETHROUGH;
    }
    if let Some(color) = element.style_value("color") {
        inner.style = patch_style(&inner.style, "color", &color);
    }
    inner
}

fn convert_text(txn: &mut Transaction, content: &str, ctx: &InlineContext) -> Vec<NodeKey> {
    let text_node = |text: &str| {
        DocNode::Text(
            TextNode::new(text)
                .with_format(ctx.format)
                .with_style(ctx.style.clone()),
        )
    };
    if ctx.in_code {
        let mut out = Vec::new();
        for (i, line) in content.split('\n').enumerate() {
            if i > 0 {
                out.push(txn.create(DocNode::LineBreak));
            }
            if !line.is_empty() {
                out.push(txn.create(text_node(line)));
            }
        }
        return out;
    }
    // Indentation between tags.
    if content.trim().is_empty() && content.contains('\n') {
        return Vec::new();
    }
    vec![txn.create(text_node(&content.replace('\n', " ")))]
}

fn is_inline(txn: &Transaction, key: &NodeKey) -> bool {
    txn.get(key).is_some_and(DocNode::is_inline)
}

fn is_kind(txn: &Transaction, key: &NodeKey, predicate: impl Fn(&ElementKind) -> bool) -> bool {
    txn.get(key).is_some_and(|n| n.is_element_of(predicate))
}

/// Append converted nodes to `parent`, restructuring what the parent cannot
/// hold: inline runs under the root become paragraphs, list contents that are
/// not list items get one, and blocks inside inline-only elements are
/// replaced by their children.
fn fill(txn: &mut Transaction, parent: &NodeKey, children: Vec<NodeKey>) {
    let Some(kind) = txn.get(parent).and_then(DocNode::as_element).map(|e| e.kind().clone())
    else {
        return;
    };
    match kind {
        ElementKind::Root => {
            wrap_runs(txn, parent, children, |t, k| !is_inline(t, k), ElementNode::paragraph)
        }
        ElementKind::List(_) => wrap_runs(
            txn,
            parent,
            children,
            |t, k| is_kind(t, k, |kind| *kind == ElementKind::ListItem),
            || ElementNode::new(ElementKind::ListItem),
        ),
        ElementKind::ListItem => {
            for child in children {
                if is_inline(txn, &child) || is_kind(txn, &child, ElementKind::is_list) {
                    txn.append(parent, &child);
                } else {
                    hoist(txn, parent, &child);
                }
            }
        }
        _ => {
            for child in children {
                if is_inline(txn, &child) {
                    txn.append(parent, &child);
                } else {
                    if !txn.state().children(parent).is_empty() {
                        let br = txn.create(DocNode::LineBreak);
                        txn.append(parent, &br);
                    }
                    hoist(txn, parent, &child);
                }
            }
        }
    }
}

fn hoist(txn: &mut Transaction, parent: &NodeKey, block: &NodeKey) {
    let grandchildren = txn.state().children(block).to_vec();
    fill(txn, parent, grandchildren);
}

/// Append the nodes accepted as-is, and gather runs of the others into
/// fresh wrappers.
fn wrap_runs(
    txn: &mut Transaction,
    parent: &NodeKey,
    children: Vec<NodeKey>,
    accepted: impl Fn(&Transaction, &NodeKey) -> bool,
    wrapper: impl Fn() -> ElementNode,
) {
    let mut run: Vec<NodeKey> = Vec::new();
    for child in children {
        if accepted(&*txn, &child) {
            flush_run(txn, parent, &mut run, &wrapper);
            txn.append(parent, &child);
        } else {
            run.push(child);
        }
    }
    flush_run(txn, parent, &mut run, &wrapper);
}

fn flush_run(
    txn: &mut Transaction,
    parent: &NodeKey,
    run: &mut Vec<NodeKey>,
    wrapper: &impl Fn() -> ElementNode,
) {
    if run.is_empty() {
        return;
    }
    let key = txn.create(DocNode::Element(wrapper()));
    txn.append(parent, &key);
    fill(txn, &key, std::mem::take(run));
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::dom::nodes::{Dimension, TextFormatType};
    use crate::dom::parser::parse_markup;
    use crate::dom::{EditorState, KeyAllocator};

    fn import(html: &str) -> EditorState {
        let tree = parse_markup(html).unwrap();
        let mut keys = KeyAllocator::new();
        let mut txn = Transaction::begin(&EditorState::new(), &mut keys);
        import_markup(&mut txn, &tree);
        txn.finish().0
    }

    fn first_text(state: &EditorState) -> TextNode {
        state
            .document_order()
            .iter()
            .find_map(|k| state.get(k).and_then(DocNode::as_text).cloned())
            .unwrap()
    }

    #[test]
    fn root_level_inline_content_is_wrapped_in_a_paragraph() {
        let state = import("hello <b>world</b>");
        assert_eq!(
            state.to_tree(),
            indoc! {r#"
                root
                └>paragraph
                  ├>"hello "
                  └>"world"
            "#}
        );
    }

    #[test]
    fn images_are_claimed_before_other_rules() {
        let state = import(r#"<p><img src="a.png" alt="cat" width="64"></p>"#);
        let images = state.images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].src(), "a.png");
        assert_eq!(images[0].width(), Dimension::Pixels(64));
        assert_eq!(state.to_tree(), "root\n└>paragraph\n  └>img a.png\n");
    }

    #[test]
    fn a_bare_image_gets_a_paragraph() {
        let state = import(r#"<img src="b.png">"#);
        assert_eq!(state.to_tree(), "root\n└>paragraph\n  └>img b.png\n");
    }

    #[test]
    fn blocks_lists_and_links_convert() {
        let state = import(indoc! {r#"
            <h2 style="text-align: center">Title</h2>
            <ul>
              <li>one</li>
              <li><a href="https://example.org">two</a></li>
            </ul>
            <blockquote>quoted</blockquote>
            <pre>a
            b</pre>
        "#});
        assert_eq!(
            state.to_tree(),
            indoc! {r#"
                root
                ├>h2
                │ └>"Title"
                ├>ul
                │ ├>listitem
                │ │ └>"one"
                │ └>listitem
                │   └>a "https://example.org"
                │     └>"two"
                ├>quote
                │ └>"quoted"
                └>code
                  ├>"a"
                  ├>br
                  └>"b"
            "#}
        );
        let heading = state.children(&NodeKey::root())[0].clone();
        assert_eq!(
            state.get(&heading).and_then(DocNode::as_element).unwrap().format,
            Some(TextAlign::Center)
        );
    }

    #[test]
    fn block_padding_reads_as_indent() {
        let state = import(r#"<p style="padding-inline-start:80px">in</p><p>out</p>"#);
        let indents: Vec<u32> = state
            .children(&NodeKey::root())
            .iter()
            .filter_map(|k| state.get(k).and_then(DocNode::as_element))
            .map(|e| e.indent)
            .collect();
        assert_eq!(indents, vec![2, 0]);
    }

    #[test]
    fn formatting_and_color_land_on_text() {
        let state = import(r#"<span style="color: #FF0000"><em><strong>x</strong></em></span>"#);
        let text = first_text(&state);
        assert!(text.has_format(TextFormatType::Bold));
        assert!(text.has_format(TextFormatType::Italic));
        assert!(!text.has_format(TextFormatType::Underline));
        assert_eq!(text.style_value("color").as_deref(), Some("#FF0000"));
    }

    #[test]
    fn unknown_elements_are_unwrapped() {
        let state = import("<div><section><p>deep</p></section></div>");
        assert_eq!(state.to_tree(), "root\n└>paragraph\n  └>\"deep\"\n");
    }

    #[test]
    fn paragraphs_inside_list_items_are_flattened() {
        let state = import("<ol><li><p>a</p></li></ol>");
        assert_eq!(state.to_tree(), "root\n└>ol\n  └>listitem\n    └>\"a\"\n");
    }

    #[test]
    fn scripts_are_dropped() {
        let state = import("<p>a</p><script>alert(1)</script>");
        assert_eq!(state.text_content(), "a");
    }
}
