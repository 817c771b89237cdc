// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::borrow::Cow;
use std::cell::{Ref, RefCell};

use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{parse_fragment, Attribute, QualName};

use super::{qual_name, MarkupElement, MarkupHandle, MarkupNode, MarkupText, MarkupTree};

#[derive(Default)]
struct BuildState {
    tree: MarkupTree,
    parse_errors: Vec<String>,
}

pub(crate) struct MarkupTreeBuilder {
    state: RefCell<BuildState>,
}

impl MarkupTreeBuilder {
    /// Parse a fragment, returning the tree and whatever the tree builder
    /// complained about on the way.
    pub fn parse(html: &str) -> (MarkupTree, Vec<String>) {
        parse_fragment(
            MarkupTreeBuilder::default(),
            Default::default(),
            qual_name(""),
            vec![],
        )
        .from_utf8()
        .one(html.as_bytes())
    }

    fn attach(&self, parent: &MarkupHandle, index: Option<usize>, child: NodeOrText<MarkupHandle>) {
        let tree = &mut self.state.borrow_mut().tree;
        let child = match child {
            NodeOrText::AppendNode(handle) => {
                if matches!(tree.get_node(&handle), MarkupNode::Ignored) {
                    return;
                }
                handle
            }
            NodeOrText::AppendText(tendril) => {
                // Text directly after a text sibling extends it.
                let siblings = tree.get_node(parent).children();
                let previous = match index {
                    Some(0) => None,
                    Some(i) => siblings.get(i - 1),
                    None => siblings.last(),
                }
                .cloned();
                if let Some(previous) = previous {
                    if let MarkupNode::Text(text) = tree.get_mut_node(&previous) {
                        text.content += tendril.as_ref();
                        return;
                    }
                }
                tree.add_node(MarkupNode::Text(MarkupText {
                    content: tendril.as_ref().to_owned(),
                }))
            }
        };
        if let Some(children) = tree.get_mut_node(parent).children_mut() {
            match index {
                Some(i) => children.insert(i.min(children.len()), child),
                None => children.push(child),
            }
        }
    }
}

impl Default for MarkupTreeBuilder {
    fn default() -> Self {
        Self {
            state: RefCell::new(BuildState::default()),
        }
    }
}

impl TreeSink for MarkupTreeBuilder {
    type Handle = MarkupHandle;
    type Output = (MarkupTree, Vec<String>);
    type ElemName<'a> = Ref<'a, QualName>;

    fn finish(self) -> Self::Output {
        let state = self.state.into_inner();
        (state.tree, state.parse_errors)
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        self.state.borrow_mut().parse_errors.push(String::from(msg));
    }

    fn get_document(&self) -> Self::Handle {
        self.state.borrow().tree.document_handle().clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        Ref::map(self.state.borrow(), |state| state.tree.get_node(target).name())
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|attr| (attr.name.local.as_ref().to_owned(), attr.value.as_ref().to_owned()))
            .collect();
        self.state
            .borrow_mut()
            .tree
            .add_node(MarkupNode::Element(MarkupElement {
                name,
                attrs,
                children: Vec::new(),
            }))
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.state.borrow_mut().tree.add_node(MarkupNode::Ignored)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.state.borrow_mut().tree.add_node(MarkupNode::Ignored)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        self.attach(parent, None, child);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.state.borrow().tree.parent_of(element).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn append_before_sibling(
        &self,
        sibling: &Self::Handle,
        new_node: NodeOrText<Self::Handle>,
    ) {
        let position = {
            let state = self.state.borrow();
            state.tree.parent_of(sibling).and_then(|parent| {
                let index = state
                    .tree
                    .get_node(&parent)
                    .children()
                    .iter()
                    .position(|c| c == sibling)?;
                Some((parent, index))
            })
        };
        if let Some((parent, index)) = position {
            if let NodeOrText::AppendNode(handle) = &new_node {
                self.remove_from_parent(handle);
            }
            self.attach(&parent, Some(index), new_node);
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Attribute>) {
        let tree = &mut self.state.borrow_mut().tree;
        if let MarkupNode::Element(element) = tree.get_mut_node(target) {
            for attr in attrs {
                let name = attr.name.local.as_ref();
                if element.get_attr(name).is_none() {
                    element
                        .attrs
                        .push((name.to_owned(), attr.value.as_ref().to_owned()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        let tree = &mut self.state.borrow_mut().tree;
        if let Some(parent) = tree.parent_of(target) {
            if let Some(children) = tree.get_mut_node(&parent).children_mut() {
                children.retain(|c| c != target);
            }
        }
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let tree = &mut self.state.borrow_mut().tree;
        let moved = tree
            .get_mut_node(node)
            .children_mut()
            .map(std::mem::take)
            .unwrap_or_default();
        if let Some(children) = tree.get_mut_node(new_parent).children_mut() {
            children.extend(moved);
        }
    }

    fn pop(&self, _node: &Self::Handle) {}

    fn set_current_line(&self, _line_number: u64) {}
}
