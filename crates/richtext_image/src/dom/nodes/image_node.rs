// Copyright 2024 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The embeddable image node.
//!
//! An image carries its source, alternative text, display dimensions and a
//! placement. Placement is one of two mutually exclusive branches: an
//! alignment (`left`, `center`, `right`) while the image does not float, or a
//! float (`left`, `right`) during which the alignment is pinned to `left`.
//!
//! Mutators take `&mut self`; the only way to get one for a node in a
//! document is [`crate::Transaction::get_writable`], which copies the node
//! into the active transaction first. Committed versions are never touched.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::config::DEFAULT_IMAGE_MAX_WIDTH;
use crate::dom::parser::MarkupElement;
use crate::dom::serialize::SerializedImageNode;
use crate::dom::{KeyAllocator, NodeKey};

/// `type` discriminant of the persisted form.
pub const IMAGE_NODE_TYPE: &str = "img";
pub const IMAGE_NODE_VERSION: u32 = 1;

/// A display dimension: either left to the rendering (`inherit`) or an
/// explicit number of pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dimension {
    #[default]
    Inherit,
    Pixels(u32),
}

impl Dimension {
    /// Absent and zero sizes both mean `inherit`.
    pub fn from_px(px: Option<u32>) -> Self {
        match px {
            Some(px) if px > 0 => Dimension::Pixels(px),
            _ => Dimension::Inherit,
        }
    }

    pub fn px(&self) -> Option<u32> {
        match self {
            Dimension::Inherit => None,
            Dimension::Pixels(px) => Some(*px),
        }
    }

    pub fn is_inherit(&self) -> bool {
        matches!(self, Dimension::Inherit)
    }
}

impl From<u32> for Dimension {
    fn from(px: u32) -> Self {
        Dimension::from_px(Some(px))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Inherit => f.write_str("inherit"),
            Dimension::Pixels(px) => write!(f, "{px}"),
        }
    }
}

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
pub enum ImageAlignment {
    #[default]
    Left,
    Center,
    Right,
}

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
pub enum ImageFloat {
    #[default]
    None,
    Left,
    Right,
}

impl ImageFloat {
    pub fn is_floating(&self) -> bool {
        !matches!(self, ImageFloat::None)
    }
}

/// Parse a placement value, falling back to the default for anything
/// unrecognised (including `null` and non-strings).
pub(crate) fn parse_or_default<T: FromStr + Default>(value: &str) -> T {
    value.trim().to_ascii_lowercase().parse().unwrap_or_default()
}

fn deserialize_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .map(parse_or_default::<T>)
        .unwrap_or_default())
}

impl<'de> Deserialize<'de> for ImageAlignment {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        deserialize_or_default(d)
    }
}

impl<'de> Deserialize<'de> for ImageFloat {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        deserialize_or_default(d)
    }
}

/// Arguments of the insert-image command. Every optional field falls back to
/// its documented default when the node is built.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImagePayload {
    pub key: Option<NodeKey>,
    pub src: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub max_width: Option<u32>,
    pub alignment: Option<ImageAlignment>,
    pub float: Option<ImageFloat>,
}

impl ImagePayload {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageNode {
    key: NodeKey,
    src: String,
    alt: String,
    max_width: u32,
    width: Dimension,
    height: Dimension,
    alignment: ImageAlignment,
    float: ImageFloat,
}

impl ImageNode {
    pub fn new(
        key: NodeKey,
        src: impl Into<String>,
        alt: impl Into<String>,
    ) -> Self {
        Self {
            key,
            src: src.into(),
            alt: alt.into(),
            max_width: DEFAULT_IMAGE_MAX_WIDTH,
            width: Dimension::Inherit,
            height: Dimension::Inherit,
            alignment: ImageAlignment::Left,
            float: ImageFloat::None,
        }
    }

    /// Build a node from an insert payload. `key` is used only when the
    /// payload does not carry one.
    pub fn from_payload(
        key: NodeKey,
        payload: &ImagePayload,
        default_max_width: u32,
    ) -> Self {
        let node = Self::new(
            payload.key.clone().unwrap_or(key),
            payload.src.clone(),
            payload.alt.clone(),
        )
        .with_max_width(payload.max_width.unwrap_or(default_max_width))
        .with_width(Dimension::from_px(payload.width))
        .with_height(Dimension::from_px(payload.height));
        // Constructed placements are taken as given: a float with a
        // non-left alignment simply renders the float branch.
        Self {
            alignment: payload.alignment.unwrap_or_default(),
            float: payload.float.unwrap_or_default(),
            ..node
        }
    }

    pub(crate) fn with_key(self, key: NodeKey) -> Self {
        Self { key, ..self }
    }

    pub fn with_max_width(mut self, max_width: u32) -> Self {
        self.max_width = if max_width == 0 {
            DEFAULT_IMAGE_MAX_WIDTH
        } else {
            max_width
        };
        self
    }

    pub fn with_width(mut self, width: Dimension) -> Self {
        self.width = Dimension::from_px(width.px());
        self
    }

    pub fn with_height(mut self, height: Dimension) -> Self {
        self.height = Dimension::from_px(height.px());
        self
    }

    pub fn with_alignment(mut self, alignment: ImageAlignment) -> Self {
        self.set_alignment(alignment);
        self
    }

    pub fn with_float(mut self, float: ImageFloat) -> Self {
        self.set_float(float);
        self
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn alt(&self) -> &str {
        &self.alt
    }

    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    pub fn width(&self) -> Dimension {
        self.width
    }

    pub fn height(&self) -> Dimension {
        self.height
    }

    pub fn alignment(&self) -> ImageAlignment {
        self.alignment
    }

    pub fn float(&self) -> ImageFloat {
        self.float
    }

    pub fn set_width(&mut self, width: impl Into<Dimension>) {
        self.width = Dimension::from_px(width.into().px());
    }

    pub fn set_height(&mut self, height: impl Into<Dimension>) {
        self.height = Dimension::from_px(height.into().px());
    }

    /// Choosing an alignment leaves the float branch.
    pub fn set_alignment(&mut self, alignment: ImageAlignment) {
        self.alignment = alignment;
        self.float = ImageFloat::None;
    }

    /// Floating pins the alignment to `left`.
    pub fn set_float(&mut self, float: ImageFloat) {
        self.float = float;
        if float.is_floating() {
            self.alignment = ImageAlignment::Left;
        }
    }

    pub fn to_serialized(&self) -> SerializedImageNode {
        SerializedImageNode {
            version: IMAGE_NODE_VERSION,
            src: self.src.clone(),
            alt: self.alt.clone(),
            max_width: self.max_width,
            width: self.width.px(),
            height: self.height.px(),
            alignment: self.alignment,
            float: self.float,
        }
    }

    /// Missing dimensions and placements take their defaults, so documents
    /// persisted before those fields existed still load.
    pub fn from_serialized(form: &SerializedImageNode, key: NodeKey) -> Self {
        let node = Self::new(key, form.src.clone(), form.alt.clone())
            .with_max_width(form.max_width)
            .with_width(Dimension::from_px(form.width))
            .with_height(Dimension::from_px(form.height));
        Self {
            alignment: form.alignment,
            float: form.float,
            ..node
        }
    }

    /// Conversion rule for markup import. Only `<img>` elements are claimed;
    /// anything else is `None` so other rules get their turn.
    pub fn import_markup(
        element: &MarkupElement,
        keys: &mut KeyAllocator,
    ) -> Option<Self> {
        if !element.tag().eq_ignore_ascii_case("img") {
            return None;
        }
        let dimension = |name: &str| {
            element
                .get_attr(name)
                .and_then(parse_pixels)
                .or_else(|| element.style_value(name).as_deref().and_then(parse_pixels))
        };
        let width = dimension("width");
        let height = dimension("height");
        Some(
            Self::new(
                keys.allocate(),
                element.get_attr("src").unwrap_or_default(),
                element.get_attr("alt").unwrap_or_default(),
            )
            .with_width(Dimension::from_px(width))
            .with_height(Dimension::from_px(height)),
        )
    }
}

/// `"320"`, `"320px"` and `"320.4"` are pixel sizes; percentages and
/// keywords are not.
fn parse_pixels(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    let px = number.parse::<f64>().ok()?;
    if px.is_finite() && px >= 0.0 {
        Some(px.round() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::dom::parser::parse_markup;

    fn image() -> ImageNode {
        ImageNode::new(NodeKey::from("7"), "a.png", "cat")
    }

    #[test]
    fn new_image_has_documented_defaults() {
        let node = image();
        assert_eq!(node.width(), Dimension::Inherit);
        assert_eq!(node.height(), Dimension::Inherit);
        assert_eq!(node.max_width(), 500);
        assert_eq!(node.alignment(), ImageAlignment::Left);
        assert_eq!(node.float(), ImageFloat::None);
    }

    #[test]
    fn zero_and_missing_sizes_normalize_to_inherit() {
        let payload = ImagePayload {
            width: Some(0),
            height: None,
            max_width: Some(0),
            ..ImagePayload::new("a.png", "")
        };
        let node = ImageNode::from_payload(NodeKey::from("1"), &payload, 500);
        assert_eq!(node.width(), Dimension::Inherit);
        assert_eq!(node.height(), Dimension::Inherit);
        assert_eq!(node.max_width(), 500);

        let mut node = node;
        node.set_width(0);
        assert!(node.width().is_inherit());
    }

    #[test]
    fn payload_key_wins_over_allocated_key() {
        let payload = ImagePayload {
            key: Some(NodeKey::from("mine")),
            ..ImagePayload::new("a.png", "")
        };
        let node = ImageNode::from_payload(NodeKey::from("9"), &payload, 500);
        assert_eq!(node.key(), &NodeKey::from("mine"));
    }

    #[test]
    fn clone_keeps_key_and_attributes() {
        let node = image().with_width(Dimension::Pixels(20));
        let copy = node.clone();
        assert_eq!(copy, node);
        assert_eq!(copy.key(), node.key());
    }

    #[test]
    fn floating_forces_left_alignment() {
        for float in [ImageFloat::Left, ImageFloat::Right] {
            let mut node = image().with_alignment(ImageAlignment::Center);
            node.set_float(float);
            assert_eq!(node.alignment(), ImageAlignment::Left);
            assert_eq!(node.float(), float);
        }
    }

    #[test]
    fn aligning_clears_the_float() {
        for alignment in ImageAlignment::iter() {
            let mut node = image().with_float(ImageFloat::Right);
            node.set_alignment(alignment);
            assert_eq!(node.float(), ImageFloat::None);
            assert_eq!(node.alignment(), alignment);
        }
    }

    #[test]
    fn clearing_the_float_keeps_the_alignment() {
        let mut node = image().with_alignment(ImageAlignment::Right);
        node.set_float(ImageFloat::None);
        assert_eq!(node.alignment(), ImageAlignment::Right);
    }

    #[test]
    fn placement_setters_are_idempotent() {
        for alignment in ImageAlignment::iter() {
            let mut once = image();
            once.set_alignment(alignment);
            let mut twice = once.clone();
            twice.set_alignment(alignment);
            assert_eq!(once, twice);
        }
        for float in ImageFloat::iter() {
            let mut once = image();
            once.set_float(float);
            let mut twice = once.clone();
            twice.set_float(float);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn serialized_form_omits_inherit_dimensions() {
        let json = serde_json::to_value(image().to_serialized()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "version": 1,
                "src": "a.png",
                "alt": "cat",
                "maxWidth": 500,
                "alignment": "left",
                "float": "none",
            })
        );
    }

    #[test]
    fn serialized_round_trip_preserves_every_attribute() {
        for alignment in ImageAlignment::iter() {
            for float in ImageFloat::iter() {
                for (w, h) in [(None, None), (Some(320), None), (Some(320), Some(200))] {
                    let payload = ImagePayload {
                        width: w,
                        height: h,
                        max_width: Some(640),
                        alignment: Some(alignment),
                        float: Some(float),
                        ..ImagePayload::new("b.png", "dog")
                    };
                    let node =
                        ImageNode::from_payload(NodeKey::from("3"), &payload, 500);
                    let back = ImageNode::from_serialized(
                        &node.to_serialized(),
                        NodeKey::from("3"),
                    );
                    assert_eq!(back, node);
                }
            }
        }
    }

    #[test]
    fn older_persisted_forms_load_with_defaults() {
        let form: SerializedImageNode = serde_json::from_str(
            r#"{"version": 1, "src": "old.png", "alt": "", "maxWidth": 400}"#,
        )
        .unwrap();
        let node = ImageNode::from_serialized(&form, NodeKey::from("1"));
        assert_eq!(node.width(), Dimension::Inherit);
        assert_eq!(node.alignment(), ImageAlignment::Left);
        assert_eq!(node.float(), ImageFloat::None);
        assert_eq!(node.max_width(), 400);
    }

    #[test]
    fn unknown_placements_normalize_to_defaults() {
        let form: SerializedImageNode = serde_json::from_str(
            r#"{"version": 1, "src": "x.png", "alt": "", "maxWidth": 500,
                "alignment": "middle", "float": 3}"#,
        )
        .unwrap();
        assert_eq!(form.alignment, ImageAlignment::Left);
        assert_eq!(form.float, ImageFloat::None);
    }

    #[test]
    fn import_claims_img_elements() {
        let tree = parse_markup(r#"<img src="c.png" alt="bird" width="120" height="80">"#)
            .unwrap();
        let element = tree.find_element("img").unwrap();
        let mut keys = KeyAllocator::new();
        let node = ImageNode::import_markup(element, &mut keys).unwrap();
        assert_eq!(node.src(), "c.png");
        assert_eq!(node.alt(), "bird");
        assert_eq!(node.width(), Dimension::Pixels(120));
        assert_eq!(node.height(), Dimension::Pixels(80));
        assert_eq!(node.float(), ImageFloat::None);
    }

    #[test]
    fn import_reads_pixel_sizes_from_style() {
        let tree = parse_markup(r#"<img src="c.png" style="width: 64px; height: 50%">"#)
            .unwrap();
        let element = tree.find_element("img").unwrap();
        let node = ImageNode::import_markup(element, &mut KeyAllocator::new()).unwrap();
        assert_eq!(node.width(), Dimension::Pixels(64));
        assert_eq!(node.height(), Dimension::Inherit);
        assert_eq!(node.alt(), "");
    }

    #[test]
    fn import_declines_other_elements() {
        let tree = parse_markup("<p>hi</p>").unwrap();
        let element = tree.find_element("p").unwrap();
        let mut keys = KeyAllocator::new();
        assert!(ImageNode::import_markup(element, &mut keys).is_none());
        // Declining must not consume a key.
        assert_eq!(keys.allocate(), NodeKey::from("1"));
    }
}
