// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! An embeddable image node and a toolbar state layer built on a small
//! transactional rich-text document model.
//!
//! The crate is organised leaf-first:
//!
//! - [`dom`] holds the document tree (an arena of copy-on-write node
//!   versions), selections, transactions, the persisted JSON form and the
//!   markup import/export boundaries, including the [`ImageNode`].
//! - [`editor`] commits transactions, dispatches [`EditorCommand`]s by
//!   priority and notifies update listeners after every commit.
//! - [`plugins`] registers the command handlers (insert/delete image and the
//!   core text formatting commands).
//! - [`toolbar`] projects the live selection into an immutable
//!   [`ToolbarState`] snapshot.
//! - [`image_controller`] is the per-image interaction state machine.
//! - [`editor_handle`] is the host-facing surface.

pub mod config;
pub mod dom;
pub mod editor;
pub mod editor_handle;
mod error;
pub mod image_controller;
pub mod plugins;
pub mod toolbar;

pub use crate::config::{EditorConfig, ImageConfig};
pub use crate::dom::image_markup::export_markup;
pub use crate::dom::node_key::{KeyAllocator, NodeKey};
pub use crate::dom::nodes::{
    Dimension, DocNode, ElementKind, ElementNode, HeadingTag, ImageAlignment,
    ImageFloat, ImageNode, ImagePayload, ListType, TextAlign, TextFormat,
    TextFormatType, TextNode,
};
pub use crate::dom::selection::{NodeSelection, Point, RangeSelection, Selection};
pub use crate::dom::serialize::{SerializedEditorState, SerializedImageNode};
pub use crate::dom::state::EditorState;
pub use crate::dom::transaction::Transaction;
pub use crate::editor::commands::{
    CommandKind, CommandListenerId, CommandPriority, EditorCommand,
};
pub use crate::editor::{Editor, TaskQueue, UpdateListenerId, UpdateNotification};
pub use crate::editor_handle::{EditorHandle, EditorValue, ValueLoad};
pub use crate::error::{MarkupError, StateError};
pub use crate::image_controller::{
    DisplayWidth, ImageControls, ImageController, ToolbarOption,
};
pub use crate::toolbar::{
    BlockType, EditorStyleState, ToolbarConfig, ToolbarState,
    ToolbarStateHandle,
};
