// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::fmt;

use serde::{Deserialize, Serialize};

const ROOT_KEY: &str = "root";

/// Stable identity of a node within one document.
///
/// Keys are assigned when a node is created and never change afterwards,
/// unlike positions in the tree. They are not part of the persisted form:
/// loading a document assigns fresh keys.
#[derive(
    Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    pub fn root() -> Self {
        Self(ROOT_KEY.to_owned())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_KEY
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for NodeKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out unique keys for one editor.
#[derive(Clone, Debug, Default)]
pub struct KeyAllocator {
    next: u64,
}

impl KeyAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> NodeKey {
        self.next += 1;
        NodeKey(self.next.to_string())
    }

    /// Make sure keys supplied from outside (e.g. an insert payload carrying
    /// its own key) are never handed out again.
    pub(crate) fn reserve(&mut self, key: &NodeKey) {
        if let Ok(n) = key.as_str().parse::<u64>() {
            self.next = self.next.max(n);
        }
    }
}
