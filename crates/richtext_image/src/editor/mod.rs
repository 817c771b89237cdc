// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The editor: committed state, commands, update notifications and history.
//!
//! Every change goes through one transaction at a time. Command handlers get
//! the open [`Transaction`]; update listeners only get read access to the
//! committed [`EditorState`], so a listener cannot start a nested
//! transaction. Follow-up work goes into the [`TaskQueue`] and runs after the
//! notifications, each task on its own.

pub mod commands;
mod history;

use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::rc::Rc;

use crate::config::EditorConfig;
use crate::dom::parser::{import_markup, parse_markup};
use crate::dom::selection::Selection;
use crate::dom::serialize::SerializedEditorState;
use crate::dom::to_html::to_html;
use crate::dom::transaction::Changes;
use crate::dom::{EditorState, KeyAllocator, NodeKey, Transaction};
use crate::error::{MarkupError, StateError};

use self::commands::{
    CommandKind, CommandListenerId, CommandPriority, CommandRegistry, EditorCommand,
};
use self::history::History;

/// What a listener sees after a commit.
pub struct UpdateNotification<'a> {
    pub state: &'a EditorState,
    pub prev_state: &'a EditorState,
    pub changes: &'a Changes,
}

pub type UpdateListener = Box<dyn FnMut(&UpdateNotification<'_>)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UpdateListenerId(u64);

pub type Task = Box<dyn FnOnce(&mut Editor)>;

/// Work scheduled from a notification or a handler, run once the current
/// update has been committed and announced.
#[derive(Clone, Default)]
pub struct TaskQueue(Rc<RefCell<VecDeque<Task>>>);

impl TaskQueue {
    pub fn defer(&self, task: impl FnOnce(&mut Editor) + 'static) {
        self.0.borrow_mut().push_back(Box::new(task));
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn pop(&self) -> Option<Task> {
        self.0.borrow_mut().pop_front()
    }
}

pub struct Editor {
    state: Rc<EditorState>,
    keys: KeyAllocator,
    commands: CommandRegistry,
    listeners: Vec<(UpdateListenerId, UpdateListener)>,
    next_listener_id: u64,
    history: History,
    /// Last undo/redo availability announced through `CanUndo`/`CanRedo`.
    announced: (bool, bool),
    tasks: TaskQueue,
    draining: bool,
    config: EditorConfig,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            state: Rc::new(EditorState::new()),
            keys: KeyAllocator::new(),
            commands: CommandRegistry::default(),
            listeners: Vec::new(),
            next_listener_id: 0,
            history: History::new(config.history_depth),
            announced: (false, false),
            tasks: TaskQueue::default(),
            draining: false,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn is_editable(&self) -> bool {
        self.config.editable
    }

    pub fn set_editable(&mut self, editable: bool) {
        self.config.editable = editable;
    }

    /// The committed state.
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn task_queue(&self) -> TaskQueue {
        self.tasks.clone()
    }

    pub fn register_command(
        &mut self,
        kind: CommandKind,
        priority: CommandPriority,
        handler: impl FnMut(&EditorCommand, &mut Transaction<'_>) -> bool + 'static,
    ) -> CommandListenerId {
        self.commands.register(kind, priority, Box::new(handler))
    }

    pub fn unregister_command(&mut self, id: CommandListenerId) -> bool {
        self.commands.unregister(id)
    }

    pub fn register_update_listener(
        &mut self,
        listener: impl FnMut(&UpdateNotification<'_>) + 'static,
    ) -> UpdateListenerId {
        self.next_listener_id += 1;
        let id = UpdateListenerId(self.next_listener_id);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unregister_update_listener(&mut self, id: UpdateListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(i, _)| *i != id);
        self.listeners.len() != before
    }

    /// Run `f` in a transaction and commit what it changed.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut Transaction<'_>) -> R) -> R {
        let mut txn = Transaction::begin(&self.state, &mut self.keys);
        let result = f(&mut txn);
        let (draft, changes) = txn.finish();
        self.commit(draft, changes, true);
        result
    }

    /// Offer `command` to the registered handlers inside one transaction.
    /// Returns whether a handler claimed it.
    pub fn dispatch_command(&mut self, command: EditorCommand) -> bool {
        let claimed = self.run_command(&command);
        self.drain_tasks();
        claimed
    }

    fn run_command(&mut self, command: &EditorCommand) -> bool {
        log::debug!("Dispatching {}", command.kind());
        let mut txn = Transaction::begin(&self.state, &mut self.keys);
        let claimed = self.commands.dispatch(command, &mut txn);
        let (draft, changes) = txn.finish();
        self.publish(draft, changes, true);
        claimed
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.update(|txn| txn.set_selection(selection));
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(Rc::clone(&self.state)) {
            Some(previous) => {
                self.restore(&previous, false);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(Rc::clone(&self.state)) {
            Some(next) => {
                self.restore(&next, false);
                true
            }
            None => false,
        }
    }

    /// Replace the whole document. The replaced document can be restored
    /// with [`Editor::undo`].
    pub fn set_editor_state(&mut self, state: EditorState) {
        self.restore(&state, true);
    }

    pub fn to_json(&self) -> Result<String, StateError> {
        SerializedEditorState::from_state(&self.state).to_json()
    }

    /// Build a state from its persisted form without committing it.
    pub fn parse_editor_state(
        &mut self,
        form: &SerializedEditorState,
    ) -> Result<EditorState, StateError> {
        form.to_state(&mut self.keys)
    }

    /// Replace the document with a persisted one. On error nothing changes.
    pub fn load_json(&mut self, json: &str) -> Result<(), StateError> {
        let form = SerializedEditorState::from_json(json)?;
        let state = self.parse_editor_state(&form)?;
        self.set_editor_state(state);
        Ok(())
    }

    pub fn export_html(&self) -> String {
        to_html(&self.state)
    }

    /// Replace the document with imported markup and put the caret at its
    /// end.
    pub fn set_content_from_html(&mut self, html: &str) -> Result<(), MarkupError> {
        let tree = parse_markup(html)?;
        self.update(|txn| {
            txn.clear();
            import_markup(txn, &tree);
            txn.select_end(&NodeKey::root());
        });
        Ok(())
    }

    fn restore(&mut self, target: &EditorState, record_history: bool) {
        let mut next = target.clone();
        next.version = self.state.version + 1;
        let changes = Changes {
            dirty: changed_keys(&self.state, &next),
            selection_changed: next.selection != self.state.selection,
        };
        self.commit(next, changes, record_history);
    }

    fn commit(&mut self, next: EditorState, changes: Changes, record_history: bool) {
        self.publish(next, changes, record_history);
        self.drain_tasks();
    }

    /// Make `next` the committed state and tell everyone about it.
    fn publish(&mut self, next: EditorState, changes: Changes, record_history: bool) {
        if !changes.is_empty() {
            let previous = std::mem::replace(&mut self.state, Rc::new(next));
            if record_history && !changes.dirty.is_empty() {
                self.history.push(Rc::clone(&previous));
            }
            log::debug!(
                "Committed version {} ({} dirty nodes)",
                self.state.version,
                changes.dirty.len()
            );
            let notification = UpdateNotification {
                state: &self.state,
                prev_state: &previous,
                changes: &changes,
            };
            for (_, listener) in self.listeners.iter_mut() {
                listener(&notification);
            }
            self.announce_history();
        }
    }

    fn announce_history(&mut self) {
        let (can_undo, can_redo) = (self.can_undo(), self.can_redo());
        let (announced_undo, announced_redo) = self.announced;
        self.announced = (can_undo, can_redo);
        if can_undo != announced_undo {
            self.run_command(&EditorCommand::CanUndo(can_undo));
        }
        if can_redo != announced_redo {
            self.run_command(&EditorCommand::CanRedo(can_redo));
        }
    }

    fn drain_tasks(&mut self) {
        if self.draining {
            return;
        }
        self.draining = true;
        while let Some(task) = self.tasks.pop() {
            task(self);
        }
        self.draining = false;
    }
}

/// Keys whose slot differs between two states.
fn changed_keys(a: &EditorState, b: &EditorState) -> BTreeSet<NodeKey> {
    let mut keys: BTreeSet<NodeKey> = a
        .nodes
        .iter()
        .filter(|(k, slot)| b.nodes.get(*k).is_none_or(|other| !Rc::ptr_eq(*slot, other)))
        .map(|(k, _)| k.clone())
        .collect();
    keys.extend(b.nodes.keys().filter(|k| !a.nodes.contains_key(*k)).cloned());
    keys
}
