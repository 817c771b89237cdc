// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Built-in command handlers, registered at [`CommandPriority::Editor`] so
//! that anything a host registers runs before them.
//!
//! [`CommandPriority::Editor`]: crate::CommandPriority::Editor

pub mod image;
pub mod rich_text;

use crate::editor::commands::CommandListenerId;
use crate::Editor;

/// Register every built-in handler. Returns the registrations so a host can
/// remove them again.
pub fn register_plugins(editor: &mut Editor) -> Vec<CommandListenerId> {
    let mut ids = image::register(editor);
    ids.extend(rich_text::register(editor));
    ids
}
