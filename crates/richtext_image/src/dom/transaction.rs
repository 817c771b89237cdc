// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Copy-on-write drafts of the document.
//!
//! A [`Transaction`] starts from a committed [`EditorState`], collects
//! mutations on its own copy of the arena and is turned back into a state by
//! [`Transaction::finish`]. Nothing reachable from the committed state is
//! ever written to.

use std::collections::BTreeSet;
use std::rc::Rc;

use crate::dom::nodes::{DocNode, ElementKind, ElementNode};
use crate::dom::selection::{Point, RangeSelection, Selection};
use crate::dom::state::NodeSlot;
use crate::dom::{EditorState, KeyAllocator, NodeKey};

/// What a finished transaction touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Changes {
    /// Created, written and removed nodes.
    pub dirty: BTreeSet<NodeKey>,
    pub selection_changed: bool,
}

impl Changes {
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty() && !self.selection_changed
    }
}

pub struct Transaction<'a> {
    draft: EditorState,
    initial_selection: Option<Selection>,
    dirty: BTreeSet<NodeKey>,
    keys: &'a mut KeyAllocator,
}

impl<'a> Transaction<'a> {
    pub fn begin(state: &EditorState, keys: &'a mut KeyAllocator) -> Self {
        let mut draft = state.clone();
        draft.version = state.version + 1;
        Self {
            initial_selection: state.selection.clone(),
            draft,
            dirty: BTreeSet::new(),
            keys,
        }
    }

    /// Read view of the draft, including the mutations made so far.
    pub fn state(&self) -> &EditorState {
        &self.draft
    }

    pub fn get(&self, key: &NodeKey) -> Option<&DocNode> {
        self.draft.get(key)
    }

    pub fn contains(&self, key: &NodeKey) -> bool {
        self.draft.contains(key)
    }

    pub fn parent(&self, key: &NodeKey) -> Option<NodeKey> {
        self.draft.parent(key).cloned()
    }

    pub fn key_allocator(&mut self) -> &mut KeyAllocator {
        self.keys
    }

    fn slot_mut(&mut self, key: &NodeKey) -> Option<&mut NodeSlot> {
        let version = self.draft.version;
        let slot = Rc::make_mut(self.draft.nodes.get_mut(key)?);
        slot.version = version;
        self.dirty.insert(key.clone());
        Some(slot)
    }

    /// Writable copy of a node, registered against this transaction. The
    /// first call per node copies it out of the committed state.
    pub fn get_writable(&mut self, key: &NodeKey) -> Option<&mut DocNode> {
        self.slot_mut(key).map(|slot| &mut slot.node)
    }

    /// Add a detached node to the draft. Images keep their own key unless
    /// another node already uses it.
    pub fn create(&mut self, node: DocNode) -> NodeKey {
        let (key, node) = match node {
            DocNode::Image(image) => {
                let key = image.key().clone();
                if self.contains(&key) {
                    log::warn!("Image key {key} is taken, allocating a new one");
                    let fresh = self.keys.allocate();
                    (fresh.clone(), DocNode::Image(image.with_key(fresh)))
                } else {
                    self.keys.reserve(&key);
                    (key, DocNode::Image(image))
                }
            }
            node => (self.keys.allocate(), node),
        };
        self.draft.nodes.insert(
            key.clone(),
            Rc::new(NodeSlot {
                node,
                parent: None,
                version: self.draft.version,
            }),
        );
        self.dirty.insert(key.clone());
        key
    }

    fn child_index(&self, key: &NodeKey) -> Option<(NodeKey, usize)> {
        let parent = self.parent(key)?;
        let index = self.get(&parent)?.as_element()?.index_of(key)?;
        Some((parent, index))
    }

    fn detach(&mut self, key: &NodeKey) -> Option<(NodeKey, usize)> {
        let (parent, index) = self.child_index(key)?;
        if let Some(element) = self.get_writable(&parent).and_then(DocNode::as_element_mut)
        {
            element.children_mut().remove(index);
        }
        if let Some(slot) = self.slot_mut(key) {
            slot.parent = None;
        }
        Some((parent, index))
    }

    /// Move `child` (detaching it first if needed) to `index` under `parent`.
    /// Returns false when `parent` is not an element or the move would make a
    /// node its own ancestor.
    pub fn insert_child(&mut self, parent: &NodeKey, index: usize, child: &NodeKey) -> bool {
        if child.is_root() || self.draft.self_and_ancestors(parent).contains(child) {
            return false;
        }
        if !self.get(parent).is_some_and(|n| n.as_element().is_some())
            || !self.contains(child)
        {
            return false;
        }
        self.detach(child);
        let Some(element) = self.get_writable(parent).and_then(DocNode::as_element_mut) else {
            return false;
        };
        let index = index.min(element.children().len());
        element.children_mut().insert(index, child.clone());
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent.clone());
        }
        true
    }

    pub fn append(&mut self, parent: &NodeKey, child: &NodeKey) -> bool {
        let len = self.draft.children(parent).len();
        self.insert_child(parent, len, child)
    }

    pub fn insert_after(&mut self, sibling: &NodeKey, node: &NodeKey) -> bool {
        match self.child_index(sibling) {
            Some((parent, index)) => self.insert_child(&parent, index + 1, node),
            None => false,
        }
    }

    pub fn insert_before(&mut self, sibling: &NodeKey, node: &NodeKey) -> bool {
        match self.child_index(sibling) {
            Some((parent, index)) => self.insert_child(&parent, index, node),
            None => false,
        }
    }

    /// Remove a node and its subtree. Selection points inside the subtree
    /// collapse onto the gap it leaves. Returns false when nothing was
    /// removed.
    pub fn remove(&mut self, key: &NodeKey) -> bool {
        if key.is_root() || !self.contains(key) {
            return false;
        }
        let removed: BTreeSet<NodeKey> = self.subtree(key).into_iter().collect();
        let gap = self.detach(key);
        for k in &removed {
            self.draft.nodes.remove(k);
            self.dirty.insert(k.clone());
        }
        self.fix_selection_after_removal(&removed, gap);
        true
    }

    fn subtree(&self, key: &NodeKey) -> Vec<NodeKey> {
        let mut out = Vec::new();
        let mut stack = vec![key.clone()];
        while let Some(k) = stack.pop() {
            stack.extend(self.draft.children(&k).iter().cloned());
            out.push(k);
        }
        out
    }

    fn fix_selection_after_removal(
        &mut self,
        removed: &BTreeSet<NodeKey>,
        gap: Option<(NodeKey, usize)>,
    ) {
        let selection = match self.draft.selection.take() {
            Some(Selection::Range(mut range)) => {
                let mut valid = true;
                for point in [&mut range.anchor, &mut range.focus] {
                    if removed.contains(&point.key) {
                        match &gap {
                            Some((parent, index)) => {
                                *point = Point::new(parent.clone(), *index)
                            }
                            None => valid = false,
                        }
                    } else if let Some((parent, index)) = &gap {
                        if &point.key == parent && point.offset > *index {
                            point.offset -= 1;
                        }
                    }
                }
                valid.then_some(Selection::Range(range))
            }
            Some(Selection::Node(mut nodes)) => {
                nodes.keys.retain(|k| !removed.contains(k));
                (!nodes.keys.is_empty()).then_some(Selection::Node(nodes))
            }
            None => None,
        };
        self.draft.selection = selection;
    }

    /// Remove every child of the root.
    pub fn clear(&mut self) {
        for child in self.draft.children(&NodeKey::root()).to_vec() {
            self.remove(&child);
        }
        self.draft.selection = None;
    }

    /// Split a text node at a char offset. The tail becomes a new sibling and
    /// selection points past the offset move into it. Nothing happens at the
    /// edges of the text.
    pub fn split_text(&mut self, key: &NodeKey, offset: usize) -> Option<NodeKey> {
        let len = self.get(key)?.as_text()?.len();
        if offset == 0 || offset >= len {
            return None;
        }
        let tail = self.get_writable(key)?.as_text_mut()?.split_off(offset);
        let tail_key = self.create(DocNode::Text(tail));
        self.insert_after(key, &tail_key);
        if let Some(range) = self.draft.selection.as_mut().and_then(Selection::as_range_mut) {
            for point in [&mut range.anchor, &mut range.focus] {
                if &point.key == key && point.offset >= offset {
                    *point = Point::new(tail_key.clone(), point.offset - offset);
                }
            }
        }
        Some(tail_key)
    }

    /// Insert a detached node at the current selection and put the caret
    /// after it. A range inserts at its focus, a node selection after its
    /// last node, no selection at the end of the root.
    pub fn insert_node(&mut self, key: &NodeKey) -> bool {
        let inserted = match self.draft.selection.clone() {
            Some(Selection::Range(range)) => self.insert_at_point(&range.focus, key),
            Some(Selection::Node(nodes)) => {
                let order = self.draft.document_order();
                match order.iter().rev().find(|k| nodes.has(k)) {
                    Some(last) => self.insert_after(last, key),
                    None => self.append(&NodeKey::root(), key),
                }
            }
            None => self.append(&NodeKey::root(), key),
        };
        if inserted {
            if let Some((parent, index)) = self.child_index(key) {
                self.draft.selection = Some(Selection::caret(parent, index + 1));
            }
        }
        inserted
    }

    fn insert_at_point(&mut self, point: &Point, key: &NodeKey) -> bool {
        match self.get(&point.key) {
            Some(DocNode::Element(_)) => self.insert_child(&point.key, point.offset, key),
            Some(DocNode::Text(text)) => {
                if point.offset == 0 {
                    self.insert_before(&point.key, key)
                } else {
                    let at_end = point.offset >= text.len();
                    if !at_end {
                        self.split_text(&point.key, point.offset);
                    }
                    self.insert_after(&point.key, key)
                }
            }
            Some(_) => self.insert_after(&point.key, key),
            None => self.append(&NodeKey::root(), key),
        }
    }

    /// Put `key` inside a new element that takes its place in the tree.
    pub fn wrap_in_element(&mut self, key: &NodeKey, wrapper: ElementNode) -> Option<NodeKey> {
        let (parent, index) = self.child_index(key)?;
        let wrapper = self.create(DocNode::Element(wrapper));
        self.insert_child(&parent, index, &wrapper);
        self.append(&wrapper, key);
        Some(wrapper)
    }

    /// Move every child of `key` up in its place and remove `key`.
    pub fn unwrap(&mut self, key: &NodeKey) -> bool {
        let Some((parent, index)) = self.child_index(key) else {
            return false;
        };
        for (offset, child) in self.draft.children(key).to_vec().iter().enumerate() {
            self.insert_child(&parent, index + offset, child);
        }
        self.remove(key)
    }

    /// Caret at the end of the deepest last descendant of `key`.
    pub fn select_end(&mut self, key: &NodeKey) {
        let mut current = key.clone();
        let point = loop {
            match self.get(&current) {
                Some(DocNode::Element(e)) => match e.children().last() {
                    Some(last)
                        if matches!(
                            self.get(last),
                            Some(DocNode::Element(_)) | Some(DocNode::Text(_))
                        ) =>
                    {
                        current = last.clone();
                    }
                    _ => break Point::new(current, e.children().len()),
                },
                Some(DocNode::Text(t)) => break Point::new(current, t.len()),
                _ => return,
            }
        };
        self.set_selection(Some(Selection::Range(RangeSelection::new(
            point.clone(),
            point,
        ))));
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.draft.selection.as_ref()
    }

    /// Mutable access without re-reading the active format from the anchor,
    /// e.g. to toggle the pending format of a caret.
    pub fn selection_mut(&mut self) -> Option<&mut Selection> {
        self.draft.selection.as_mut()
    }

    /// Replace the selection. A range takes its active format and style from
    /// the text node its anchor sits in.
    pub fn set_selection(&mut self, selection: Option<Selection>) {
        let mut selection = selection;
        if let Some(range) = selection.as_mut().and_then(Selection::as_range_mut) {
            if let Some(DocNode::Text(text)) = self.draft.get(&range.anchor.key) {
                range.format = text.format;
                range.style = text.style.clone();
            }
        }
        self.draft.selection = selection;
    }

    /// Change the kind of a block element in place.
    pub fn set_block_kind(&mut self, key: &NodeKey, kind: ElementKind) -> bool {
        if key.is_root() || kind == ElementKind::Root {
            return false;
        }
        match self.get(key).and_then(DocNode::as_element) {
            Some(element) if element.kind() != &kind => {}
            _ => return false,
        }
        if let Some(element) = self.get_writable(key).and_then(DocNode::as_element_mut) {
            element.set_kind(kind);
        }
        true
    }

    /// Drop nodes created or detached in this transaction that ended up
    /// unreachable from the root.
    fn collect_garbage(&mut self) {
        let detached: Vec<NodeKey> = self
            .dirty
            .iter()
            .filter(|k| !k.is_root())
            .filter(|k| {
                self.draft
                    .self_and_ancestors(k)
                    .last()
                    .is_some_and(|top| !top.is_root())
            })
            .cloned()
            .collect();
        for key in detached {
            for k in self.subtree(&key) {
                self.draft.nodes.remove(&k);
            }
        }
    }

    pub fn finish(mut self) -> (EditorState, Changes) {
        self.collect_garbage();
        #[cfg(feature = "assert-invariants")]
        self.draft.assert_invariants();
        let selection_changed = self.draft.selection != self.initial_selection;
        (
            self.draft,
            Changes {
                dirty: self.dirty,
                selection_changed,
            },
        )
    }
}
