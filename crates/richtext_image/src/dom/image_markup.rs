// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Static markup for an [`ImageNode`].
//!
//! Independent of the persisted JSON: this is what a document looks like
//! outside the editor. The output depends only on the node's attributes.

use crate::dom::nodes::{ImageAlignment, ImageFloat, ImageNode};

/// Declarations of the inline `style` attribute, in output order.
fn style_declarations(node: &ImageNode) -> Vec<String> {
    let mut styles = vec!["max-width:100%".to_owned(), "height:auto".to_owned()];
    if let Some(width) = node.width().px() {
        styles.push(format!("width:{width}px"));
    }
    if let Some(height) = node.height().px() {
        styles.push(format!("height:{height}px"));
    }
    match node.float() {
        ImageFloat::Left => styles.extend([
            "float:left".to_owned(),
            "margin-right:16px".to_owned(),
            "margin-bottom:8px".to_owned(),
        ]),
        ImageFloat::Right => styles.extend([
            "float:right".to_owned(),
            "margin-left:16px".to_owned(),
            "margin-bottom:8px".to_owned(),
        ]),
        ImageFloat::None => {
            styles.push("display:block".to_owned());
            let (left, right) = match node.alignment() {
                ImageAlignment::Left => ("0", "auto"),
                ImageAlignment::Center => ("auto", "auto"),
                ImageAlignment::Right => ("auto", "0"),
            };
            styles.push(format!("margin-left:{left}"));
            styles.push(format!("margin-right:{right}"));
        }
    }
    styles
}

/// Render `node` as an `<img>` element.
///
/// Attributes come in the order `src`, `alt`, `width`, `height`, `style`;
/// the dimensions only when they are not `inherit`.
pub fn export_markup(node: &ImageNode) -> String {
    let mut html = String::from("<img");
    let mut attr = |name: &str, value: &str| {
        html.push_str(&format!(
            " {name}=\"{}\"",
            html_escape::encode_double_quoted_attribute(value)
        ));
    };
    attr("src", node.src());
    attr("alt", node.alt());
    if let Some(width) = node.width().px() {
        attr("width", &width.to_string());
    }
    if let Some(height) = node.height().px() {
        attr("height", &height.to_string());
    }
    attr("style", &style_declarations(node).join("; "));
    html.push('>');
    html
}
