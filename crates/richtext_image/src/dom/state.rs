// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The committed document: an arena of node versions keyed by [`NodeKey`].
//!
//! Every slot sits behind an `Rc`. A transaction starts from a shallow copy
//! of the arena (cloning only the `Rc`s) and copies a slot on first write, so
//! the committed state and the history entries that share its slots are
//! never modified.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::nodes::{DocNode, ElementKind, ElementNode, ImageNode};
use crate::dom::selection::{Point, RangeSelection, Selection};
use crate::dom::NodeKey;

#[derive(Clone, Debug)]
pub struct NodeSlot {
    pub(crate) node: DocNode,
    pub(crate) parent: Option<NodeKey>,
    /// Commit counter of the transaction that produced this version.
    pub(crate) version: u64,
}

#[derive(Clone, Debug)]
pub struct EditorState {
    pub(crate) nodes: HashMap<NodeKey, Rc<NodeSlot>>,
    pub(crate) selection: Option<Selection>,
    pub(crate) version: u64,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

/// Sort key of a point: the child-index path of the node, plus the char
/// offset for text points. Element points address the gap before a child.
type Position = (Vec<usize>, Option<usize>);

impl EditorState {
    /// An empty document: just the root.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            NodeKey::root(),
            Rc::new(NodeSlot {
                node: DocNode::Element(ElementNode::root()),
                parent: None,
                version: 0,
            }),
        );
        Self {
            nodes,
            selection: None,
            version: 0,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn root(&self) -> &ElementNode {
        self.get(&NodeKey::root())
            .and_then(DocNode::as_element)
            .expect("The root node is always present")
    }

    pub fn get(&self, key: &NodeKey) -> Option<&DocNode> {
        self.nodes.get(key).map(|slot| &slot.node)
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Version of the slot currently holding `key`.
    pub fn node_version(&self, key: &NodeKey) -> Option<u64> {
        self.nodes.get(key).map(|slot| slot.version)
    }

    pub fn parent(&self, key: &NodeKey) -> Option<&NodeKey> {
        self.nodes.get(key).and_then(|slot| slot.parent.as_ref())
    }

    pub fn children(&self, key: &NodeKey) -> &[NodeKey] {
        self.get(key).map(DocNode::children).unwrap_or(&[])
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn image(&self, key: &NodeKey) -> Option<&ImageNode> {
        self.get(key).and_then(DocNode::as_image)
    }

    pub fn images(&self) -> Vec<&ImageNode> {
        self.document_order()
            .iter()
            .filter_map(|key| self.image(key))
            .collect()
    }

    /// `key` itself and then its ancestors up to the root.
    pub fn self_and_ancestors(&self, key: &NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut current = self.contains(key).then(|| key.clone());
        while let Some(k) = current {
            current = self.parent(&k).cloned();
            out.push(k);
        }
        out
    }

    pub fn nearest_matching(
        &self,
        key: &NodeKey,
        predicate: impl Fn(&DocNode) -> bool,
    ) -> Option<NodeKey> {
        self.self_and_ancestors(key)
            .into_iter()
            .find(|k| self.get(k).is_some_and(&predicate))
    }

    /// The ancestor directly below the root (the root itself for the root).
    pub fn top_level_element(&self, key: &NodeKey) -> Option<NodeKey> {
        if key.is_root() {
            return Some(NodeKey::root());
        }
        let chain = self.self_and_ancestors(key);
        match chain.last() {
            Some(last) if last.is_root() && chain.len() >= 2 => {
                Some(chain[chain.len() - 2].clone())
            }
            _ => None,
        }
    }

    /// Nearest element, starting at `key`, that is not inline.
    pub fn nearest_block_element(&self, key: &NodeKey) -> Option<NodeKey> {
        self.nearest_matching(key, |n| n.is_element_of(|k| !k.is_inline()))
    }

    pub fn nearest_list(&self, key: &NodeKey) -> Option<NodeKey> {
        self.nearest_matching(key, |n| n.is_element_of(ElementKind::is_list))
    }

    /// All keys reachable from the root, parents before children.
    pub fn document_order(&self) -> Vec<NodeKey> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![NodeKey::root()];
        while let Some(key) = stack.pop() {
            stack.extend(self.children(&key).iter().rev().cloned());
            out.push(key);
        }
        out
    }

    /// Child-index path from the root down to `key`.
    pub fn path(&self, key: &NodeKey) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = key.clone();
        while let Some(parent) = self.parent(&current) {
            let index = self.get(parent)?.as_element()?.index_of(&current)?;
            path.push(index);
            current = parent.clone();
        }
        if !current.is_root() {
            return None;
        }
        path.reverse();
        Some(path)
    }

    fn position(&self, point: &Point) -> Option<Position> {
        let mut path = self.path(&point.key)?;
        match self.get(&point.key)? {
            DocNode::Element(_) => {
                path.push(point.offset);
                Some((path, None))
            }
            _ => Some((path, Some(point.offset))),
        }
    }

    pub fn compare_points(&self, a: &Point, b: &Point) -> Option<Ordering> {
        Some(self.position(a)?.cmp(&self.position(b)?))
    }

    /// Anchor and focus in document order.
    pub fn ordered_points(&self, range: &RangeSelection) -> (Point, Point) {
        match self.compare_points(&range.anchor, &range.focus) {
            Some(Ordering::Greater) => (range.focus.clone(), range.anchor.clone()),
            _ => (range.anchor.clone(), range.focus.clone()),
        }
    }

    /// Text nodes touched by `range`, in document order. A caret touches the
    /// text node it sits in.
    pub fn text_nodes_in_range(&self, range: &RangeSelection) -> Vec<NodeKey> {
        let (start, end) = self.ordered_points(range);
        let (Some(s), Some(e)) = (self.position(&start), self.position(&end)) else {
            return Vec::new();
        };
        let collapsed = s == e;
        self.document_order()
            .into_iter()
            .filter(|key| {
                let Some(DocNode::Text(text)) = self.get(key) else {
                    return false;
                };
                let Some(path) = self.path(key) else {
                    return false;
                };
                let from = (path.clone(), Some(0));
                let to = (path, Some(text.len()));
                if collapsed {
                    from <= s && s <= to
                } else {
                    from < e && to > s
                }
            })
            .collect()
    }

    /// Concatenated text of the whole document, blocks separated by `\n`.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&NodeKey::root(), &mut out);
        out
    }

    fn collect_text(&self, key: &NodeKey, out: &mut String) {
        match self.get(key) {
            Some(DocNode::Text(t)) => out.push_str(&t.text),
            Some(DocNode::LineBreak) => out.push('\n'),
            Some(DocNode::Element(e)) => {
                for (i, child) in e.children().iter().enumerate() {
                    let is_block = self.get(child).is_some_and(|n| !n.is_inline());
                    if i > 0 && is_block {
                        out.push('\n');
                    }
                    self.collect_text(child, out);
                }
            }
            Some(DocNode::Image(_)) | None => {}
        }
    }

    /// Panic if parent links and child lists disagree.
    #[cfg(feature = "assert-invariants")]
    pub fn assert_invariants(&self) {
        for (key, slot) in &self.nodes {
            match &slot.parent {
                Some(parent) => assert!(
                    self.children(parent).contains(key),
                    "{key} is not a child of its parent {parent}"
                ),
                None => assert!(key.is_root(), "{key} is detached"),
            }
            for child in slot.node.children() {
                assert_eq!(self.parent(child), Some(key), "bad parent of {child}");
            }
        }
    }

    /// Debug representation of the tree.
    pub fn to_tree(&self) -> String {
        let mut out = String::new();
        self.fmt_tree(&NodeKey::root(), "", true, true, &mut out);
        out
    }

    fn fmt_tree(
        &self,
        key: &NodeKey,
        indent: &str,
        is_last: bool,
        is_root: bool,
        out: &mut String,
    ) {
        let Some(node) = self.get(key) else {
            return;
        };
        let label = match node {
            DocNode::Text(t) => format!("\"{}\"", t.text),
            DocNode::Image(i) => format!("img {}", i.src()),
            DocNode::LineBreak => "br".to_owned(),
            DocNode::Element(e) => match e.kind() {
                ElementKind::Heading(tag) => tag.to_string(),
                ElementKind::List(list) => list.tag().to_owned(),
                ElementKind::Link { url } => format!("a \"{url}\""),
                kind => kind.type_name().to_owned(),
            },
        };
        let child_indent = if is_root {
            out.push_str(&label);
            String::new()
        } else {
            out.push_str(indent);
            out.push_str(if is_last { "└>" } else { "├>" });
            out.push_str(&label);
            format!("{indent}{}", if is_last { "  " } else { "│ " })
        };
        out.push('\n');
        let children = node.children();
        for (i, child) in children.iter().enumerate() {
            self.fmt_tree(child, &child_indent, i + 1 == children.len(), false, out);
        }
    }
}
