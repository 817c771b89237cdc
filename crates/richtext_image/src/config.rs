// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Construction-time configuration.
//!
//! Everything here is injected into the editor, the command bindings and the
//! toolbar projector when they are created. Hosts can build it in code or
//! deserialize it from camelCase JSON where every field is optional.

use serde::Deserialize;

use crate::toolbar::ToolbarConfig;

/// Default `maxWidth` of images inserted without one.
pub const DEFAULT_IMAGE_MAX_WIDTH: u32 = 500;

/// Default number of undo steps kept by the editor history.
pub const DEFAULT_HISTORY_DEPTH: usize = 300;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Read-only editors render images without interaction controls.
    pub editable: bool,
    pub history_depth: usize,
    pub image: ImageConfig,
    pub toolbar: ToolbarConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            editable: true,
            history_depth: DEFAULT_HISTORY_DEPTH,
            image: ImageConfig::default(),
            toolbar: ToolbarConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageConfig {
    pub default_max_width: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            default_max_width: DEFAULT_IMAGE_MAX_WIDTH,
        }
    }
}
