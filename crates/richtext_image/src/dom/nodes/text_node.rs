// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use bitflags::bitflags;
use once_cell::sync::Lazy;
use regex::Regex;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

bitflags! {
    /// Inline formats of a text node. The bit values are part of the
    /// persisted form.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TextFormat: u32 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const STRIKETHROUGH = 1 << 2;
        const UNDERLINE = 1 << 3;
        const CODE = 1 << 4;
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "lowercase")]
pub enum TextFormatType {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
}

impl TextFormatType {
    pub fn flag(&self) -> TextFormat {
        match self {
            TextFormatType::Bold => TextFormat::BOLD,
            TextFormatType::Italic => TextFormat::ITALIC,
            TextFormatType::Underline => TextFormat::UNDERLINE,
            TextFormatType::Strikethrough => TextFormat::STRIKETHROUGH,
            TextFormatType::Code => TextFormat::CODE,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextNode {
    pub text: String,
    pub format: TextFormat,
    /// Inline CSS declarations, e.g. `color: #FF0000;`.
    pub style: String,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn has_format(&self, format: TextFormatType) -> bool {
        self.format.contains(format.flag())
    }

    /// Length in chars; offsets into text nodes are char offsets.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split at a char offset, keeping the head and returning the tail.
    pub(crate) fn split_off(&mut self, offset: usize) -> TextNode {
        let byte = self
            .text
            .char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
        let tail = self.text.split_off(byte);
        TextNode {
            text: tail,
            format: self.format,
            style: self.style.clone(),
        }
    }

    pub fn style_value(&self, property: &str) -> Option<String> {
        style_value(&self.style, property)
    }
}

static STYLE_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*([A-Za-z-]+)\s*:\s*([^;]*?)\s*(?:;|$)").unwrap()
});

/// Read one property out of an inline CSS string.
pub fn style_value(style: &str, property: &str) -> Option<String> {
    STYLE_DECLARATION
        .captures_iter(style)
        .filter(|c| c[1].eq_ignore_ascii_case(property))
        .map(|c| c[2].to_owned())
        .filter(|v| !v.is_empty())
        .last()
}

/// Set (or replace) one property in an inline CSS string.
pub fn patch_style(style: &str, property: &str, value: &str) -> String {
    let mut out: Vec<String> = STYLE_DECLARATION
        .captures_iter(style)
        .filter(|c| !c[1].eq_ignore_ascii_case(property))
        .map(|c| format!("{}: {};", &c[1], &c[2]))
        .collect();
    out.push(format!("{property}: {value};"));
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_values_are_found_case_insensitively() {
        let style = "font-weight: bold; Color: #FF0000;";
        assert_eq!(style_value(style, "color").as_deref(), Some("#FF0000"));
        assert_eq!(style_value(style, "background"), None);
    }

    #[test]
    fn style_value_without_trailing_semicolon() {
        assert_eq!(
            style_value("color:#00FF00", "color").as_deref(),
            Some("#00FF00")
        );
    }

    #[test]
    fn patching_replaces_an_existing_property() {
        let patched = patch_style("color: #000000; font-size: 12px;", "color", "#0000FF");
        assert_eq!(patched, "font-size: 12px; color: #0000FF;");
    }

    #[test]
    fn split_off_uses_char_offsets() {
        let mut node = TextNode::new("héllo").with_format(TextFormat::BOLD);
        let tail = node.split_off(2);
        assert_eq!(node.text, "hé");
        assert_eq!(tail.text, "llo");
        assert!(tail.has_format(TextFormatType::Bold));
    }
}
