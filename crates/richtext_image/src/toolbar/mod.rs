// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Toolbar state: a snapshot of the formatting at the selection, kept in sync
//! with the editor by the [`ToolbarStateHandle`], and the actions its
//! buttons run.

pub mod actions;
mod config;
mod projector;

use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::dom::nodes::{ElementKind, HeadingTag, TextAlign};

pub use self::config::{ToolbarConfig, CODE_LANGUAGES, DEFAULT_PALETTE};
pub use self::projector::{project_style, ToolbarStateHandle};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    #[default]
    Paragraph,
    H1,
    H2,
    H3,
    Code,
    Quote,
}

impl BlockType {
    /// Classify a top-level block.
    pub fn of(kind: &ElementKind) -> Self {
        match kind {
            ElementKind::Heading(HeadingTag::H1) => BlockType::H1,
            ElementKind::Heading(HeadingTag::H2) => BlockType::H2,
            ElementKind::Heading(HeadingTag::H3) => BlockType::H3,
            ElementKind::Quote => BlockType::Quote,
            ElementKind::Code { .. } => BlockType::Code,
            _ => BlockType::Paragraph,
        }
    }

    pub fn element_kind(&self) -> ElementKind {
        match self {
            BlockType::Paragraph => ElementKind::Paragraph,
            BlockType::H1 => ElementKind::Heading(HeadingTag::H1),
            BlockType::H2 => ElementKind::Heading(HeadingTag::H2),
            BlockType::H3 => ElementKind::Heading(HeadingTag::H3),
            BlockType::Code => ElementKind::Code { language: None },
            BlockType::Quote => ElementKind::Quote,
        }
    }
}

/// Formatting at the selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorStyleState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub is_unordered_list: bool,
    pub is_ordered_list: bool,
    pub is_link: bool,
    pub color: String,
    pub text_align: TextAlign,
}

impl EditorStyleState {
    pub fn new(config: &ToolbarConfig) -> Self {
        Self {
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            code: false,
            is_unordered_list: false,
            is_ordered_list: false,
            is_link: false,
            color: config.default_color().to_owned(),
            text_align: config.default_alignment(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolbarState {
    #[serde(flatten)]
    pub style: EditorStyleState,
    pub block_type: BlockType,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl ToolbarState {
    pub fn new(config: &ToolbarConfig) -> Self {
        Self {
            style: EditorStyleState::new(config),
            block_type: BlockType::default(),
            can_undo: false,
            can_redo: false,
        }
    }
}

impl Default for ToolbarState {
    fn default() -> Self {
        Self::new(&ToolbarConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_types_classify_and_build_elements() {
        for block in [BlockType::H2, BlockType::Quote, BlockType::Code] {
            assert_eq!(BlockType::of(&block.element_kind()), block);
        }
        assert_eq!(BlockType::of(&ElementKind::ListItem), BlockType::Paragraph);
        assert_eq!(BlockType::H3.to_string(), "h3");
    }

    #[test]
    fn snapshots_serialize_flat() {
        let json = serde_json::to_value(ToolbarState::default()).unwrap();
        assert_eq!(json["bold"], false);
        assert_eq!(json["color"], "#000000");
        assert_eq!(json["textAlign"], "left");
        assert_eq!(json["blockType"], "paragraph");
        assert_eq!(json["canUndo"], false);
    }
}
