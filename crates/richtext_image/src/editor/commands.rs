// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Typed commands and the priority-ordered handler registry.

use std::cmp::Reverse;

use strum_macros::{AsRefStr, Display, EnumDiscriminants, EnumIter};

use crate::dom::nodes::{ImagePayload, ListType, TextAlign, TextFormatType};
use crate::dom::{NodeKey, Transaction};

#[derive(Clone, Debug, PartialEq, EnumDiscriminants)]
#[strum_discriminants(name(CommandKind), derive(Hash, Display, AsRefStr, EnumIter))]
pub enum EditorCommand {
    InsertImage(ImagePayload),
    DeleteImage { key: NodeKey },
    FormatText(TextFormatType),
    FormatElement(TextAlign),
    /// `Some(url)` links the selected text, `None` removes links around it.
    ToggleLink(Option<String>),
    /// Put the selected blocks in a list of this type, or take them out when
    /// they already are one.
    InsertList(ListType),
    IndentContent,
    OutdentContent,
    /// Emitted by the editor when undo availability changes.
    CanUndo(bool),
    /// Emitted by the editor when redo availability changes.
    CanRedo(bool),
}

impl EditorCommand {
    pub fn kind(&self) -> CommandKind {
        CommandKind::from(self)
    }
}

/// Handler tiers. Higher tiers run first; `Editor` is where the built-in
/// bindings live so anything registered by a host can override them.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr, EnumIter,
)]
pub enum CommandPriority {
    Editor = 0,
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

/// Returns `true` to claim the command, which stops the dispatch.
pub type CommandHandler = Box<dyn FnMut(&EditorCommand, &mut Transaction<'_>) -> bool>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CommandListenerId(u64);

struct Registration {
    id: CommandListenerId,
    kind: CommandKind,
    priority: CommandPriority,
    handler: CommandHandler,
}

#[derive(Default)]
pub(crate) struct CommandRegistry {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl CommandRegistry {
    pub fn register(
        &mut self,
        kind: CommandKind,
        priority: CommandPriority,
        handler: CommandHandler,
    ) -> CommandListenerId {
        self.next_id += 1;
        let id = CommandListenerId(self.next_id);
        self.registrations.push(Registration {
            id,
            kind,
            priority,
            handler,
        });
        id
    }

    pub fn unregister(&mut self, id: CommandListenerId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.id != id);
        self.registrations.len() != before
    }

    /// Offer `command` to its handlers, highest priority first and in
    /// registration order within a tier, until one claims it.
    pub fn dispatch(&mut self, command: &EditorCommand, txn: &mut Transaction) -> bool {
        let kind = command.kind();
        let mut order: Vec<usize> = self
            .registrations
            .iter()
            .enumerate()
            .filter(|(_, r)| r.kind == kind)
            .map(|(i, _)| i)
            .collect();
        order.sort_by_key(|&i| Reverse(self.registrations[i].priority));
        for i in order {
            if (self.registrations[i].handler)(command, txn) {
                log::debug!(
                    "{kind} claimed at priority {}",
                    self.registrations[i].priority
                );
                return true;
            }
        }
        false
    }
}
