// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::collections::BTreeSet;

use crate::dom::nodes::{TextFormat, TextFormatType};
use crate::dom::NodeKey;

/// A position in the document. For text nodes `offset` counts chars, for
/// elements it is a child index.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub key: NodeKey,
    pub offset: usize,
}

impl Point {
    pub fn new(key: impl Into<NodeKey>, offset: usize) -> Self {
        Self {
            key: key.into(),
            offset,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// A contiguous range (possibly collapsed to a caret).
    Range(RangeSelection),
    /// A set of whole nodes, e.g. a clicked image.
    Node(NodeSelection),
}

impl Selection {
    pub fn as_range(&self) -> Option<&RangeSelection> {
        match self {
            Selection::Range(r) => Some(r),
            Selection::Node(_) => None,
        }
    }

    pub fn as_range_mut(&mut self) -> Option<&mut RangeSelection> {
        match self {
            Selection::Range(r) => Some(r),
            Selection::Node(_) => None,
        }
    }

    pub fn caret(key: impl Into<NodeKey>, offset: usize) -> Self {
        let point = Point::new(key, offset);
        Selection::Range(RangeSelection::new(point.clone(), point))
    }

    pub fn range(anchor: Point, focus: Point) -> Self {
        Selection::Range(RangeSelection::new(anchor, focus))
    }

    pub fn nodes(keys: impl IntoIterator<Item = NodeKey>) -> Self {
        Selection::Node(NodeSelection {
            keys: keys.into_iter().collect(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeSelection {
    pub anchor: Point,
    pub focus: Point,
    /// Formats that apply at the selection; for a caret these are the
    /// formats the next typed text would get.
    pub format: TextFormat,
    /// Inline style that applies at the selection.
    pub style: String,
}

impl RangeSelection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            format: TextFormat::empty(),
            style: String::new(),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn has_format(&self, format: TextFormatType) -> bool {
        self.format.contains(format.flag())
    }

    pub fn toggle_format(&mut self, format: TextFormatType) {
        self.format.toggle(format.flag());
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeSelection {
    pub keys: BTreeSet<NodeKey>,
}

impl NodeSelection {
    pub fn has(&self, key: &NodeKey) -> bool {
        self.keys.contains(key)
    }
}
