// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Node variants of the document tree.
//!
//! Nodes are a tagged variant resolved by exhaustive matching. Elements own
//! the keys of their children; the tree itself (parents, versions) lives in
//! [`crate::dom::state::EditorState`].

pub mod image_node;
pub mod text_node;

use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

pub use image_node::{
    Dimension, ImageAlignment, ImageFloat, ImageNode, ImagePayload,
};
pub use text_node::{patch_style, style_value, TextFormat, TextFormatType, TextNode};

use crate::dom::NodeKey;

#[derive(Clone, Debug, PartialEq)]
pub enum DocNode {
    Element(ElementNode),
    Text(TextNode),
    Image(ImageNode),
    LineBreak,
}

impl DocNode {
    pub fn type_name(&self) -> &'static str {
        match self {
            DocNode::Element(e) => e.kind().type_name(),
            DocNode::Text(_) => "text",
            DocNode::Image(_) => image_node::IMAGE_NODE_TYPE,
            DocNode::LineBreak => "linebreak",
        }
    }

    /// Inline nodes live inside blocks; everything else is a block.
    pub fn is_inline(&self) -> bool {
        match self {
            DocNode::Element(e) => e.kind().is_inline(),
            DocNode::Text(_) | DocNode::Image(_) | DocNode::LineBreak => true,
        }
    }

    pub fn children(&self) -> &[NodeKey] {
        match self {
            DocNode::Element(e) => e.children(),
            _ => &[],
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            DocNode::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match self {
            DocNode::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextNode> {
        match self {
            DocNode::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextNode> {
        match self {
            DocNode::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageNode> {
        match self {
            DocNode::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageNode> {
        match self {
            DocNode::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn is_element_of(&self, predicate: impl Fn(&ElementKind) -> bool) -> bool {
        self.as_element().is_some_and(|e| predicate(e.kind()))
    }

    /// Number of positions a point inside this node can take.
    pub fn size(&self) -> usize {
        match self {
            DocNode::Element(e) => e.children().len(),
            DocNode::Text(t) => t.len(),
            DocNode::Image(_) | DocNode::LineBreak => 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ElementNode {
    kind: ElementKind,
    /// Block alignment. `None` is rendered and persisted as no format.
    pub format: Option<TextAlign>,
    pub indent: u32,
    children: Vec<NodeKey>,
}

impl ElementNode {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            format: None,
            indent: 0,
            children: Vec::new(),
        }
    }

    pub fn root() -> Self {
        Self::new(ElementKind::Root)
    }

    pub fn paragraph() -> Self {
        Self::new(ElementKind::Paragraph)
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub(crate) fn set_kind(&mut self, kind: ElementKind) {
        self.kind = kind;
    }

    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeKey> {
        &mut self.children
    }

    pub fn index_of(&self, child: &NodeKey) -> Option<usize> {
        self.children.iter().position(|c| c == child)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    Root,
    Paragraph,
    Heading(HeadingTag),
    Quote,
    Code { language: Option<String> },
    List(ListType),
    ListItem,
    Link { url: String },
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Root => "root",
            ElementKind::Paragraph => "paragraph",
            ElementKind::Heading(_) => "heading",
            ElementKind::Quote => "quote",
            ElementKind::Code { .. } => "code",
            ElementKind::List(_) => "list",
            ElementKind::ListItem => "listitem",
            ElementKind::Link { .. } => "link",
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, ElementKind::Link { .. })
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ElementKind::List(_))
    }

    pub fn is_link(&self) -> bool {
        matches!(self, ElementKind::Link { .. })
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum HeadingTag {
    H1,
    H2,
    H3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListType {
    Ordered,
    Unordered,
}

impl ListType {
    pub fn tag(&self) -> &'static str {
        match self {
            ListType::Ordered => "ol",
            ListType::Unordered => "ul",
        }
    }

    /// Name used in the persisted form.
    pub fn list_type_name(&self) -> &'static str {
        match self {
            ListType::Ordered => "number",
            ListType::Unordered => "bullet",
        }
    }

    pub fn from_list_type_name(name: &str) -> Self {
        match name {
            "number" => ListType::Ordered,
            _ => ListType::Unordered,
        }
    }
}

/// Alignment of a block element.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlign {
    /// Parse an element format string. Logical directions map onto their
    /// left-to-right equivalents; empty and unknown values mean no format.
    pub fn from_format(format: &str) -> Option<Self> {
        match format.trim().to_ascii_lowercase().as_str() {
            "start" => Some(TextAlign::Left),
            "end" => Some(TextAlign::Right),
            other => other.parse().ok(),
        }
    }
}
