// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Insert and delete image handlers.

use crate::dom::nodes::{DocNode, ElementNode, ImageNode, ImagePayload};
use crate::dom::{NodeKey, Transaction};
use crate::editor::commands::{
    CommandKind, CommandListenerId, CommandPriority, EditorCommand,
};
use crate::plugins::rich_text::remove_selected_content;
use crate::Editor;

pub fn register(editor: &mut Editor) -> Vec<CommandListenerId> {
    let default_max_width = editor.config().image.default_max_width;
    vec![
        editor.register_command(
            CommandKind::InsertImage,
            CommandPriority::Editor,
            move |command, txn| match command {
                EditorCommand::InsertImage(payload) => {
                    insert_image(txn, payload, default_max_width);
                    true
                }
                _ => false,
            },
        ),
        editor.register_command(
            CommandKind::DeleteImage,
            CommandPriority::Editor,
            |command, txn| match command {
                EditorCommand::DeleteImage { key } => {
                    delete_image(txn, key);
                    true
                }
                _ => false,
            },
        ),
    ]
}

/// Insert a new image at the selection, replacing whatever a range covers.
/// An image that lands directly under the root gets a paragraph around it
/// and the caret moves to the end of that paragraph.
pub fn insert_image(
    txn: &mut Transaction<'_>,
    payload: &ImagePayload,
    default_max_width: u32,
) -> Option<NodeKey> {
    let key = match &payload.key {
        Some(key) => key.clone(),
        None => txn.key_allocator().allocate(),
    };
    remove_selected_content(txn);
    let image = ImageNode::from_payload(key, payload, default_max_width);
    let key = txn.create(DocNode::Image(image));
    if !txn.insert_node(&key) {
        log::warn!("Could not place image {key}");
        return None;
    }
    if txn.parent(&key).is_some_and(|parent| parent.is_root()) {
        if let Some(wrapper) = txn.wrap_in_element(&key, ElementNode::paragraph()) {
            txn.select_end(&wrapper);
        }
    }
    Some(key)
}

/// Remove the image with `key`. Missing keys and other node types are
/// ignored.
pub fn delete_image(txn: &mut Transaction<'_>, key: &NodeKey) -> bool {
    match txn.get(key) {
        Some(DocNode::Image(_)) => txn.remove(key),
        Some(other) => {
            log::debug!("Not deleting {key}: it is a {}", other.type_name());
            false
        }
        None => false,
    }
}
