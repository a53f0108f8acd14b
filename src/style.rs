use crate::background::{
    parse_background_size, Background, BackgroundOverlay, BackgroundPosition, Texture,
};
use crate::error::{LayoutError, Result};
use crate::font::Typeface;
use crate::image::ImageRenderer;
use crate::spacing::{Border, Spacing};
use crate::types::{Color, Pt, Size};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

pub const DEFAULT_ROTATION_ANCHOR: &str = "left top";

/// Font settings; unset family and size fall back to the layout config.
#[derive(Debug, Clone)]
pub struct FontSpec {
    pub family: Option<String>,
    pub size: Option<Pt>,
    pub bold: bool,
    pub color: Color,
    pub typeface: Option<Typeface>,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: None,
            size: None,
            bold: false,
            color: Color::BLACK,
            typeface: None,
        }
    }
}

/// Bookkeeping owned by the external style cascade. Layout never reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeData {
    pub id: Option<String>,
    pub tag: Option<String>,
    pub classes: BTreeSet<String>,
    pub attributes: BTreeMap<String, String>,
    pub matched_rules: Vec<String>,
}

/// Rotation pivot as fractions of the box size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAnchor {
    horizontal: f32,
    vertical: f32,
}

impl Default for RotationAnchor {
    fn default() -> Self {
        Self {
            horizontal: 0.0,
            vertical: 0.0,
        }
    }
}

impl RotationAnchor {
    /// Parses `"<horizontal> [<vertical>]"`. Horizontal accepts `left`,
    /// `center`, `right` or a percentage; vertical accepts `top`, `center`,
    /// `bottom` or a percentage and defaults to `center`.
    pub fn parse(descriptor: &str) -> Result<Self> {
        let mut tokens = descriptor.split_whitespace();
        let Some(first) = tokens.next() else {
            return Ok(Self::default());
        };
        let horizontal = match first.to_ascii_lowercase().as_str() {
            "left" => 0.0,
            "center" => 0.5,
            "right" => 1.0,
            _ => parse_percent(first)?,
        };
        let vertical = match tokens.next() {
            None => 0.5,
            Some(token) => match token.to_ascii_lowercase().as_str() {
                "top" => 0.0,
                "center" => 0.5,
                "bottom" => 1.0,
                _ => parse_percent(token)?,
            },
        };
        if let Some(extra) = tokens.next() {
            return Err(LayoutError::UnknownAnchorKeyword(extra.to_string()));
        }
        Ok(Self {
            horizontal,
            vertical,
        })
    }

    /// Pivot point within a box of `size`.
    pub fn resolve(&self, size: Size) -> (f32, f32) {
        (
            size.width.to_f32() * self.horizontal,
            size.height.to_f32() * self.vertical,
        )
    }
}

fn parse_percent(token: &str) -> Result<f32> {
    token
        .strip_suffix('%')
        .and_then(|number| number.parse::<f32>().ok())
        .filter(|value| value.is_finite())
        .map(|value| value / 100.0)
        .ok_or_else(|| LayoutError::UnknownAnchorKeyword(token.to_string()))
}

/// Attributes shared by every box.
///
/// A width or height of zero means "use the content size".
#[derive(Debug, Clone)]
pub struct BoxStyle {
    pub margin: Spacing,
    pub border: Border,
    pub padding: Spacing,
    pub width: Pt,
    pub height: Pt,
    pub background: Background,
    pub font: FontSpec,
    /// Radians, clockwise in the y-down coordinate space.
    pub rotation: f32,
    pub rotation_anchor: String,
    pub inline: bool,
    pub cascade: CascadeData,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            margin: Spacing::default(),
            border: Border::default(),
            padding: Spacing::default(),
            width: Pt::ZERO,
            height: Pt::ZERO,
            background: Background::default(),
            font: FontSpec::default(),
            rotation: 0.0,
            rotation_anchor: DEFAULT_ROTATION_ANCHOR.to_string(),
            inline: false,
            cascade: CascadeData::default(),
        }
    }
}

impl BoxStyle {
    /// Style for boxes that take no margin, border or padding.
    pub fn unspaced() -> Self {
        Self {
            margin: Spacing::disabled(),
            border: Border::new(Spacing::disabled()),
            padding: Spacing::disabled(),
            ..Self::default()
        }
    }

    pub fn set_margin(&mut self, margin: Spacing) {
        self.margin = margin;
    }

    pub fn set_border(&mut self, border: Border) {
        self.border = border;
    }

    pub fn set_padding(&mut self, padding: Spacing) {
        self.padding = padding;
    }

    pub fn set_width(&mut self, width: Pt) {
        self.width = width;
    }

    pub fn set_height(&mut self, height: Pt) {
        self.height = height;
    }

    pub fn set_background_color(&mut self, color: Color) {
        self.background.color = Some(color);
    }

    /// Replaces any texture overlay.
    pub fn set_background_gradient(&mut self, from: Color, to: Color) {
        self.background.overlay = Some(BackgroundOverlay::Gradient { from, to });
    }

    /// Replaces any gradient overlay.
    pub fn set_background_texture(&mut self, texture: Texture) {
        self.background.overlay = Some(BackgroundOverlay::Texture(texture));
    }

    pub fn set_background_image(&mut self, renderer: Arc<dyn ImageRenderer>) {
        self.background.image = Some(renderer);
    }

    pub fn set_background_position(&mut self, value: &str) -> Result<()> {
        self.background.position = BackgroundPosition::parse(value)?;
        Ok(())
    }

    pub fn set_background_size(&mut self, value: &str) -> Result<()> {
        self.background.size = Some(parse_background_size(value)?);
        Ok(())
    }

    pub fn set_font_family(&mut self, family: impl Into<String>) {
        self.font.family = Some(family.into());
    }

    pub fn set_font_size(&mut self, size: Pt) {
        self.font.size = Some(size);
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.font.bold = bold;
    }

    pub fn set_font_color(&mut self, color: Color) {
        self.font.color = color;
    }

    pub fn set_typeface(&mut self, typeface: Typeface) {
        self.font.typeface = Some(typeface);
    }

    pub fn set_inline(&mut self, inline: bool) {
        self.inline = inline;
    }

    pub fn set_rotation(&mut self, radians: f32) {
        self.rotation = radians;
    }

    /// Validates the descriptor before storing it.
    pub fn set_rotation_anchor(&mut self, descriptor: &str) -> Result<()> {
        RotationAnchor::parse(descriptor)?;
        self.rotation_anchor = descriptor.to_string();
        Ok(())
    }

    pub fn anchor(&self) -> Result<RotationAnchor> {
        RotationAnchor::parse(&self.rotation_anchor)
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.cascade.id = Some(id.into());
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.cascade.tag = Some(tag.into());
    }

    pub fn add_class(&mut self, class: impl Into<String>) {
        self.cascade.classes.insert(class.into());
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.cascade.classes.contains(class)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cascade.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.cascade.attributes.get(name).map(String::as_str)
    }

    pub fn record_matched_rule(&mut self, rule: impl Into<String>) {
        self.cascade.matched_rules.push(rule.into());
    }

    pub fn is_rotated(&self) -> bool {
        self.rotation != 0.0
    }
}
