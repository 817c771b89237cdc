// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Markup import.
//!
//! Parsing happens in two steps. `html5ever` feeds a [`MarkupTree`] through
//! the [`tree_builder`] sink: a flat arena where parents refer to children by
//! [`MarkupHandle`]. The [`convert`] rules then turn that tree into document
//! nodes inside a transaction.

pub mod convert;
mod tree_builder;

use html5ever::{LocalName, Namespace, QualName};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::nodes::text_node::style_value;
use crate::error::MarkupError;

pub use convert::import_markup;

const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

static EMPTY_NAME: Lazy<QualName> = Lazy::new(|| qual_name(""));

/// `<meta>` tags copied along with clipboard contents confuse the fragment
/// parser.
static META_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<meta[^>]*>").unwrap());

pub(crate) fn qual_name(local_name: &str) -> QualName {
    QualName::new(
        None,
        Namespace::from(XHTML_NAMESPACE),
        LocalName::from(local_name),
    )
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MarkupHandle(usize);

#[derive(Clone, Debug, PartialEq)]
pub enum MarkupNode {
    Document(MarkupDocument),
    Element(MarkupElement),
    Text(MarkupText),
    /// Comments and processing instructions. They get a handle because the
    /// parser asks for one, but are never attached.
    Ignored,
}

impl MarkupNode {
    pub(crate) fn name(&self) -> &QualName {
        match self {
            MarkupNode::Element(element) => &element.name,
            _ => &EMPTY_NAME,
        }
    }

    pub fn children(&self) -> &[MarkupHandle] {
        match self {
            MarkupNode::Document(d) => &d.children,
            MarkupNode::Element(e) => &e.children,
            MarkupNode::Text(_) | MarkupNode::Ignored => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<MarkupHandle>> {
        match self {
            MarkupNode::Document(d) => Some(&mut d.children),
            MarkupNode::Element(e) => Some(&mut e.children),
            MarkupNode::Text(_) | MarkupNode::Ignored => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MarkupDocument {
    pub(crate) children: Vec<MarkupHandle>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkupText {
    pub content: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MarkupElement {
    pub(crate) name: QualName,
    pub(crate) attrs: Vec<(String, String)>,
    pub(crate) children: Vec<MarkupHandle>,
}

impl MarkupElement {
    pub fn tag(&self) -> &str {
        self.name.local.as_ref()
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _v)| n.eq_ignore_ascii_case(name))
            .map(|(_n, v)| v.as_str())
    }

    /// Value of one property of the inline `style` attribute.
    pub fn style_value(&self, property: &str) -> Option<String> {
        self.get_attr("style").and_then(|s| style_value(s, property))
    }

    pub fn contains_style(&self, property: &str, value: &str) -> bool {
        self.style_value(property)
            .is_some_and(|v| v.eq_ignore_ascii_case(value))
    }

    pub fn children(&self) -> &[MarkupHandle] {
        &self.children
    }
}

/// Arena of parsed markup nodes. May hold nodes the parser created and
/// later dropped; only what is reachable from the document counts.
#[derive(Clone, Debug, PartialEq)]
pub struct MarkupTree {
    nodes: Vec<MarkupNode>,
    document: MarkupHandle,
}

impl Default for MarkupTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![MarkupNode::Document(MarkupDocument::default())],
            document: MarkupHandle(0),
        }
    }

    pub fn document_handle(&self) -> &MarkupHandle {
        &self.document
    }

    pub(crate) fn add_node(&mut self, node: MarkupNode) -> MarkupHandle {
        self.nodes.push(node);
        MarkupHandle(self.nodes.len() - 1)
    }

    pub fn get_node(&self, handle: &MarkupHandle) -> &MarkupNode {
        &self.nodes[handle.0]
    }

    pub(crate) fn get_mut_node(&mut self, handle: &MarkupHandle) -> &mut MarkupNode {
        &mut self.nodes[handle.0]
    }

    pub(crate) fn parent_of(&self, child: &MarkupHandle) -> Option<MarkupHandle> {
        self.nodes
            .iter()
            .position(|node| node.children().contains(child))
            .map(MarkupHandle)
    }

    /// First element with the given tag, depth first from the document.
    pub fn find_element(&self, tag: &str) -> Option<&MarkupElement> {
        let mut stack = vec![self.document.clone()];
        while let Some(handle) = stack.pop() {
            let node = self.get_node(&handle);
            if let MarkupNode::Element(element) = node {
                if element.tag().eq_ignore_ascii_case(tag) {
                    return Some(element);
                }
            }
            stack.extend(node.children().iter().rev().cloned());
        }
        None
    }

    fn has_content(&self) -> bool {
        self.get_node(&self.document)
            .children()
            .iter()
            .any(|child| !self.get_node(child).children().is_empty())
    }
}

/// Parse a markup fragment.
///
/// The tree builder recovers from malformed input: its complaints are logged
/// and only fail the parse when nothing could be recovered at all.
pub fn parse_markup(html: &str) -> Result<MarkupTree, MarkupError> {
    let cleaned = META_TAG.replace_all(html, "");
    let (tree, parse_errors) = tree_builder::MarkupTreeBuilder::parse(&cleaned);
    if tree.get_node(tree.document_handle()).children().is_empty() {
        return Err(MarkupError::NoRoot);
    }
    if !parse_errors.is_empty() {
        if !tree.has_content() && !cleaned.trim().is_empty() {
            return Err(MarkupError::Parse { parse_errors });
        }
        for error in &parse_errors {
            log::warn!("Markup parse error: {error}");
        }
    }
    Ok(tree)
}
