// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use serde::Deserialize;

use crate::dom::nodes::TextAlign;

pub const DEFAULT_PALETTE: [&str; 15] = [
    "#000000", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#FFFFFF", "#808080", "#800000", "#808000", "#008000", "#800080", "#008080",
    "#000080",
];

/// Languages offered for code blocks, as `(value, label)`.
pub const CODE_LANGUAGES: [(&str, &str); 22] = [
    ("javascript", "JavaScript"),
    ("typescript", "TypeScript"),
    ("python", "Python"),
    ("java", "Java"),
    ("c", "C"),
    ("cpp", "C++"),
    ("csharp", "C#"),
    ("php", "PHP"),
    ("ruby", "Ruby"),
    ("go", "Go"),
    ("rust", "Rust"),
    ("swift", "Swift"),
    ("kotlin", "Kotlin"),
    ("sql", "SQL"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("json", "JSON"),
    ("xml", "XML"),
    ("yaml", "YAML"),
    ("markdown", "Markdown"),
    ("bash", "Bash"),
    ("powershell", "PowerShell"),
];

/// Colour palette and alignment cycle offered by the toolbar. The first
/// entry of each is the default.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolbarConfig {
    pub palette: Vec<String>,
    pub alignment_options: Vec<TextAlign>,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE.iter().map(|c| (*c).to_owned()).collect(),
            alignment_options: vec![
                TextAlign::Left,
                TextAlign::Center,
                TextAlign::Right,
                TextAlign::Justify,
            ],
        }
    }
}

impl ToolbarConfig {
    pub fn default_color(&self) -> &str {
        self.palette
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_PALETTE[0])
    }

    pub fn default_alignment(&self) -> TextAlign {
        self.alignment_options.first().copied().unwrap_or_default()
    }

    /// The option after `current`. Values missing from the list count as
    /// the first option.
    pub fn next_alignment(&self, current: TextAlign) -> TextAlign {
        let options = &self.alignment_options;
        if options.is_empty() {
            return current;
        }
        let index = options.iter().position(|a| *a == current).unwrap_or(0);
        options[(index + 1) % options.len()]
    }
}
