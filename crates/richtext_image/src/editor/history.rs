// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Undo / redo over committed states.
//!
//! Committed states share every unchanged node, so keeping whole states on
//! the stacks costs one arena of `Rc`s per entry.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::dom::EditorState;

pub(crate) struct History {
    undo_stack: VecDeque<Rc<EditorState>>,
    redo_stack: Vec<Rc<EditorState>>,
    depth: usize,
}

impl History {
    pub fn new(depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            depth,
        }
    }

    /// Remember the state a new edit replaces. Forgets the redo branch and
    /// the oldest entry once the stack is full.
    pub fn push(&mut self, previous: Rc<EditorState>) {
        if self.depth == 0 {
            return;
        }
        self.undo_stack.push_back(previous);
        while self.undo_stack.len() > self.depth {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear();
    }

    pub fn undo(&mut self, current: Rc<EditorState>) -> Option<Rc<EditorState>> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(current);
        Some(previous)
    }

    pub fn redo(&mut self, current: Rc<EditorState>) -> Option<Rc<EditorState>> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}
