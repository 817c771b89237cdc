// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use thiserror::Error;

/// Failure to turn a persisted document into an [`crate::EditorState`].
///
/// Loads are the only fallible operations in the crate and callers on the
/// host side log and drop these (the document stays unchanged).
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Invalid editor state JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("The top-level node must be of type `root`, found `{0}`")]
    InvalidRoot(String),

    #[error("A `root` node can only appear at the top of the document")]
    NestedRoot,
}

/// Failure to import markup into the document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("Markup could not be parsed: {}", parse_errors.join(", "))]
    Parse { parse_errors: Vec<String> },

    #[error("The markup document has no root element")]
    NoRoot,
}
