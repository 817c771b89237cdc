// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Persisted JSON form of a document.
//!
//! The shape is `{"root": {...}}` where every node carries a `type` and a
//! `version`. Element nodes share one struct; fields that only some element
//! types use are optional. Unknown fields are ignored and missing ones take
//! their defaults, so documents written by other versions of the editor load.

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::DEFAULT_IMAGE_MAX_WIDTH;
use crate::dom::nodes::{
    DocNode, ElementKind, ElementNode, HeadingTag, ImageAlignment, ImageFloat,
    ImageNode, ListType, TextAlign, TextFormat, TextNode,
};
use crate::dom::{EditorState, KeyAllocator, NodeKey, Transaction};
use crate::error::StateError;

const NODE_VERSION: u32 = 1;

fn default_version() -> u32 {
    NODE_VERSION
}

fn default_max_width() -> u32 {
    DEFAULT_IMAGE_MAX_WIDTH
}

fn default_mode() -> String {
    "normal".to_owned()
}

/// Strings stay strings; anything else (`null`, numbers) reads as empty.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(value.as_str().unwrap_or_default().to_owned())
}

/// Whole pixels from any JSON number. Fractions round; zero, negative and
/// non-numeric values read as absent.
fn lenient_pixels<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let value = serde_json::Value::deserialize(d)?;
    Ok(value
        .as_f64()
        .map(f64::round)
        .filter(|px| *px >= 1.0)
        .map(|px| px as u32))
}

fn lenient_max_width<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(lenient_pixels(d)?.unwrap_or(DEFAULT_IMAGE_MAX_WIDTH))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedEditorState {
    pub root: SerializedNode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SerializedNode {
    #[serde(rename = "root")]
    Root(SerializedElementNode),
    #[serde(rename = "paragraph")]
    Paragraph(SerializedElementNode),
    #[serde(rename = "heading")]
    Heading(SerializedElementNode),
    #[serde(rename = "quote")]
    Quote(SerializedElementNode),
    #[serde(rename = "code")]
    Code(SerializedElementNode),
    #[serde(rename = "list")]
    List(SerializedElementNode),
    #[serde(rename = "listitem")]
    ListItem(SerializedElementNode),
    #[serde(rename = "link")]
    Link(SerializedElementNode),
    #[serde(rename = "text")]
    Text(SerializedTextNode),
    #[serde(rename = "linebreak")]
    LineBreak(SerializedLineBreakNode),
    #[serde(rename = "img")]
    Image(SerializedImageNode),
}

impl SerializedNode {
    pub fn type_name(&self) -> &'static str {
        match self {
            SerializedNode::Root(_) => "root",
            SerializedNode::Paragraph(_) => "paragraph",
            SerializedNode::Heading(_) => "heading",
            SerializedNode::Quote(_) => "quote",
            SerializedNode::Code(_) => "code",
            SerializedNode::List(_) => "list",
            SerializedNode::ListItem(_) => "listitem",
            SerializedNode::Link(_) => "link",
            SerializedNode::Text(_) => "text",
            SerializedNode::LineBreak(_) => "linebreak",
            SerializedNode::Image(_) => "img",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedElementNode {
    #[serde(default)]
    pub children: Vec<SerializedNode>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub format: String,
    #[serde(default)]
    pub indent: u32,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedTextNode {
    #[serde(default)]
    pub detail: u32,
    #[serde(default)]
    pub format: u32,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub style: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_version")]
    pub version: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedLineBreakNode {
    #[serde(default = "default_version")]
    pub version: u32,
}

/// Persisted form of an [`ImageNode`]. `width`/`height` are absent when the
/// node's dimension is `inherit`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedImageNode {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
    #[serde(
        rename = "maxWidth",
        default = "default_max_width",
        deserialize_with = "lenient_max_width"
    )]
    pub max_width: u32,
    #[serde(
        default,
        deserialize_with = "lenient_pixels",
        skip_serializing_if = "Option::is_none"
    )]
    pub width: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_pixels",
        skip_serializing_if = "Option::is_none"
    )]
    pub height: Option<u32>,
    #[serde(default)]
    pub alignment: ImageAlignment,
    #[serde(default)]
    pub float: ImageFloat,
}

impl SerializedEditorState {
    pub fn from_state(state: &EditorState) -> Self {
        Self {
            root: serialize_node(state, &NodeKey::root())
                .unwrap_or_else(|| SerializedNode::Root(empty_element())),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, StateError> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build a fresh document. Every node, images included, gets a new key
    /// from `keys`.
    pub fn to_state(&self, keys: &mut KeyAllocator) -> Result<EditorState, StateError> {
        let SerializedNode::Root(root) = &self.root else {
            return Err(StateError::InvalidRoot(self.root.type_name().to_owned()));
        };
        let empty = EditorState::new();
        let mut txn = Transaction::begin(&empty, keys);
        if let Some(element) = txn.get_writable(&NodeKey::root()).and_then(DocNode::as_element_mut)
        {
            element.format = TextAlign::from_format(&root.format);
            element.indent = root.indent;
        }
        for child in &root.children {
            let key = deserialize_node(&mut txn, child)?;
            txn.append(&NodeKey::root(), &key);
        }
        let (state, _) = txn.finish();
        Ok(state)
    }
}

fn empty_element() -> SerializedElementNode {
    SerializedElementNode {
        version: NODE_VERSION,
        ..Default::default()
    }
}

fn serialize_node(state: &EditorState, key: &NodeKey) -> Option<SerializedNode> {
    let node = match state.get(key)? {
        DocNode::Text(text) => SerializedNode::Text(SerializedTextNode {
            detail: 0,
            format: text.format.bits(),
            mode: default_mode(),
            style: text.style.clone(),
            text: text.text.clone(),
            version: NODE_VERSION,
        }),
        DocNode::LineBreak => SerializedNode::LineBreak(SerializedLineBreakNode {
            version: NODE_VERSION,
        }),
        DocNode::Image(image) => SerializedNode::Image(image.to_serialized()),
        DocNode::Element(element) => {
            let mut form = SerializedElementNode {
                children: element
                    .children()
                    .iter()
                    .filter_map(|child| serialize_node(state, child))
                    .collect(),
                format: element.format.map(|f| f.to_string()).unwrap_or_default(),
                indent: element.indent,
                ..empty_element()
            };
            match element.kind() {
                ElementKind::Root => SerializedNode::Root(form),
                ElementKind::Paragraph => SerializedNode::Paragraph(form),
                ElementKind::Heading(tag) => {
                    form.tag = Some(tag.to_string());
                    SerializedNode::Heading(form)
                }
                ElementKind::Quote => SerializedNode::Quote(form),
                ElementKind::Code { language } => {
                    form.language = language.clone();
                    SerializedNode::Code(form)
                }
                ElementKind::List(list) => {
                    form.tag = Some(list.tag().to_owned());
                    form.list_type = Some(list.list_type_name().to_owned());
                    form.start = Some(1);
                    SerializedNode::List(form)
                }
                ElementKind::ListItem => SerializedNode::ListItem(form),
                ElementKind::Link { url } => {
                    form.url = Some(url.clone());
                    SerializedNode::Link(form)
                }
            }
        }
    };
    Some(node)
}

fn deserialize_node(txn: &mut Transaction, form: &SerializedNode) -> Result<NodeKey, StateError> {
    let (kind, element) = match form {
        SerializedNode::Root(_) => return Err(StateError::NestedRoot),
        SerializedNode::Text(text) => {
            return Ok(txn.create(DocNode::Text(
                TextNode::new(text.text.clone())
                    .with_format(TextFormat::from_bits_truncate(text.format))
                    .with_style(text.style.clone()),
            )))
        }
        SerializedNode::LineBreak(_) => return Ok(txn.create(DocNode::LineBreak)),
        SerializedNode::Image(image) => {
            let key = txn.key_allocator().allocate();
            return Ok(txn.create(DocNode::Image(ImageNode::from_serialized(image, key))));
        }
        SerializedNode::Paragraph(e) => (ElementKind::Paragraph, e),
        SerializedNode::Heading(e) => (
            ElementKind::Heading(
                e.tag
                    .as_deref()
                    .and_then(|t| t.parse::<HeadingTag>().ok())
                    .unwrap_or(HeadingTag::H1),
            ),
            e,
        ),
        SerializedNode::Quote(e) => (ElementKind::Quote, e),
        SerializedNode::Code(e) => (
            ElementKind::Code {
                language: e.language.clone(),
            },
            e,
        ),
        SerializedNode::List(e) => (
            ElementKind::List(ListType::from_list_type_name(
                e.list_type.as_deref().unwrap_or_default(),
            )),
            e,
        ),
        SerializedNode::ListItem(e) => (ElementKind::ListItem, e),
        SerializedNode::Link(e) => (
            ElementKind::Link {
                url: e.url.clone().unwrap_or_default(),
            },
            e,
        ),
    };
    let mut node = ElementNode::new(kind);
    node.format = TextAlign::from_format(&element.format);
    node.indent = element.indent;
    let key = txn.create(DocNode::Element(node));
    for child in &element.children {
        let child = deserialize_node(txn, child)?;
        txn.append(&key, &child);
    }
    Ok(key)
}
