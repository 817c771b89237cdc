// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

pub mod image_markup;
pub mod node_key;
pub mod nodes;
pub mod parser;
pub mod selection;
pub mod serialize;
pub mod state;
pub mod to_html;
pub mod transaction;

pub use node_key::{KeyAllocator, NodeKey};
pub use state::EditorState;
pub use transaction::Transaction;
