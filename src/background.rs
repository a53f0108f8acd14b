use crate::error::{LayoutError, Result};
use crate::image::{BitmapImage, ImageRenderer};
use crate::surface::Surface;
use crate::types::{Color, Pt, Rect, Shading, ShadingStop, Size};
use std::sync::Arc;

/// Horizontal placement of a background image inside the content box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundPosition {
    Left,
    #[default]
    Center,
}

impl BackgroundPosition {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(BackgroundPosition::Left),
            "center" => Ok(BackgroundPosition::Center),
            _ => Err(LayoutError::UnsupportedBackgroundPosition(value.to_string())),
        }
    }
}

/// Scale strategy applied to a background image before it is drawn.
pub trait BackgroundSize: std::fmt::Debug + Send + Sync {
    /// Returns `(scale_x, scale_y)` for an image of the given intrinsic size
    /// drawn into a content box of the given size.
    fn scale(
        &self,
        content_width: f32,
        content_height: f32,
        image_width: f32,
        image_height: f32,
    ) -> (f32, f32);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSize;

impl BackgroundSize for AutoSize {
    fn scale(&self, _: f32, _: f32, _: f32, _: f32) -> (f32, f32) {
        (1.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CoverSize;

impl BackgroundSize for CoverSize {
    fn scale(&self, cw: f32, ch: f32, iw: f32, ih: f32) -> (f32, f32) {
        if iw <= 0.0 || ih <= 0.0 {
            return (1.0, 1.0);
        }
        let s = (cw / iw).max(ch / ih);
        (s, s)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContainSize;

impl BackgroundSize for ContainSize {
    fn scale(&self, cw: f32, ch: f32, iw: f32, ih: f32) -> (f32, f32) {
        if iw <= 0.0 || ih <= 0.0 {
            return (1.0, 1.0);
        }
        let s = (cw / iw).min(ch / ih);
        (s, s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeValue {
    Auto,
    Px(f32),
    Percent(f32),
}

impl SizeValue {
    fn parse(token: &str) -> Option<Self> {
        if token == "auto" {
            return Some(SizeValue::Auto);
        }
        if let Some(number) = token.strip_suffix("px") {
            return number.parse().ok().map(SizeValue::Px);
        }
        if let Some(number) = token.strip_suffix('%') {
            return number.parse().ok().map(SizeValue::Percent);
        }
        None
    }

    fn resolve(self, available: f32) -> Option<f32> {
        match self {
            SizeValue::Auto => None,
            SizeValue::Px(value) => Some(value),
            SizeValue::Percent(percent) => Some(available * percent / 100.0),
        }
    }
}

/// Width and height given as pixels, percentages of the content box, or
/// `auto` (keeps the aspect ratio of the other axis).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplicitSize {
    pub width: SizeValue,
    pub height: SizeValue,
}

impl BackgroundSize for ExplicitSize {
    fn scale(&self, cw: f32, ch: f32, iw: f32, ih: f32) -> (f32, f32) {
        if iw <= 0.0 || ih <= 0.0 {
            return (1.0, 1.0);
        }
        let sx = self.width.resolve(cw).map(|w| w / iw);
        let sy = self.height.resolve(ch).map(|h| h / ih);
        match (sx, sy) {
            (Some(sx), Some(sy)) => (sx, sy),
            (Some(s), None) | (None, Some(s)) => (s, s),
            (None, None) => (1.0, 1.0),
        }
    }
}

/// Parses `auto`, `cover`, `contain`, or one or two of `<n>px`, `<n>%` and
/// `auto`. A single value sets the width and leaves the height `auto`.
pub fn parse_background_size(value: &str) -> Result<Arc<dyn BackgroundSize>> {
    let unsupported = || LayoutError::UnsupportedBackgroundSize(value.to_string());
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "auto" => return Ok(Arc::new(AutoSize)),
        "cover" => return Ok(Arc::new(CoverSize)),
        "contain" => return Ok(Arc::new(ContainSize)),
        _ => {}
    }
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    let (width, height) = match tokens.as_slice() {
        [w] => (SizeValue::parse(w).ok_or_else(unsupported)?, SizeValue::Auto),
        [w, h] => (
            SizeValue::parse(w).ok_or_else(unsupported)?,
            SizeValue::parse(h).ok_or_else(unsupported)?,
        ),
        _ => return Err(unsupported()),
    };
    Ok(Arc::new(ExplicitSize { width, height }))
}

/// Repeating image tile.
#[derive(Debug, Clone)]
pub struct Texture {
    pub image: BitmapImage,
    pub tile: Size,
}

impl Texture {
    /// Tiles at the image's intrinsic size.
    pub fn new(image: BitmapImage) -> Self {
        let tile = image.intrinsic_size();
        Self { image, tile }
    }
}

/// Overlay painted after the solid colour. Texture and gradient exclude each
/// other.
#[derive(Debug, Clone)]
pub enum BackgroundOverlay {
    Texture(Texture),
    Gradient { from: Color, to: Color },
}

/// Solid colour, optional overlay and optional image for one box.
#[derive(Debug, Clone, Default)]
pub struct Background {
    pub color: Option<Color>,
    pub overlay: Option<BackgroundOverlay>,
    pub image: Option<Arc<dyn ImageRenderer>>,
    pub position: BackgroundPosition,
    pub size: Option<Arc<dyn BackgroundSize>>,
}

impl Background {
    /// Draws the image, if any, into the content surface, scaled by the size
    /// strategy and placed per `position`.
    pub fn render_image(&self, surface: &mut Surface<'_>) -> Result<()> {
        let Some(renderer) = &self.image else {
            return Ok(());
        };
        let content = surface.bounds();
        let intrinsic = renderer.measure(surface.context())?;
        let (cw, ch) = (content.width.to_f32(), content.height.to_f32());
        let (iw, ih) = (intrinsic.width.to_f32(), intrinsic.height.to_f32());
        let (sx, sy) = match &self.size {
            Some(strategy) => strategy.scale(cw, ch, iw, ih),
            None => (1.0, 1.0),
        };
        let (x, y) = match self.position {
            BackgroundPosition::Left => (0.0, 0.0),
            BackgroundPosition::Center => ((cw - iw * sx) / 2.0, (ch - ih * sy) / 2.0),
        };

        let mut placed = surface.transformed(content);
        placed
            .canvas()
            .translate(Pt::from_f32(x), Pt::from_f32(y));
        if sx != 1.0 || sy != 1.0 {
            placed.canvas().scale(sx, sy);
        }
        renderer.render(&mut placed)
    }

    /// Paints colour then overlay over the whole surface. The image is drawn
    /// later, inside the padding box.
    pub fn paint(&self, surface: &mut Surface<'_>) {
        let bounds = surface.bounds();
        if let Some(color) = self.color {
            surface.canvas().fill_rect(Rect::from_size(bounds), color);
        }
        let Some(overlay) = &self.overlay else {
            return;
        };
        // Overlays fill the clip region, so bound them to the box first.
        let mut region = surface.sub_surface(Rect::from_size(bounds));
        let canvas = region.canvas();
        match overlay {
            BackgroundOverlay::Texture(texture) => {
                let id = texture.image.source_id().to_string();
                canvas.register_image(id.clone(), texture.image.pixels().clone());
                canvas.texture_fill(id, texture.tile);
            }
            BackgroundOverlay::Gradient { from, to } => {
                canvas.shading_fill(Shading::Axial {
                    x0: 0.0,
                    y0: 0.0,
                    x1: bounds.width.to_f32(),
                    y1: 0.0,
                    stops: vec![
                        ShadingStop {
                            offset: 0.0,
                            color: *from,
                        },
                        ShadingStop {
                            offset: 1.0,
                            color: *to,
                        },
                    ],
                });
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.overlay.is_none() && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, Command};
    use crate::context::LayoutContext;

    #[test]
    fn position_parses_supported_keywords() {
        assert_eq!(BackgroundPosition::parse("left").unwrap(), BackgroundPosition::Left);
        assert_eq!(BackgroundPosition::parse(" Center ").unwrap(), BackgroundPosition::Center);
        assert!(matches!(
            BackgroundPosition::parse("right"),
            Err(LayoutError::UnsupportedBackgroundPosition(v)) if v == "right"
        ));
    }

    #[test]
    fn keyword_sizes_scale_uniformly() {
        let cover = parse_background_size("cover").unwrap();
        assert_eq!(cover.scale(100.0, 50.0, 10.0, 10.0), (10.0, 10.0));
        let contain = parse_background_size("contain").unwrap();
        assert_eq!(contain.scale(100.0, 50.0, 10.0, 10.0), (5.0, 5.0));
        let auto = parse_background_size("auto").unwrap();
        assert_eq!(auto.scale(100.0, 50.0, 10.0, 10.0), (1.0, 1.0));
    }

    #[test]
    fn explicit_sizes_resolve_units() {
        let size = parse_background_size("20px 50%").unwrap();
        assert_eq!(size.scale(100.0, 40.0, 10.0, 10.0), (2.0, 2.0));
        let single = parse_background_size("50%").unwrap();
        assert_eq!(single.scale(100.0, 40.0, 10.0, 10.0), (5.0, 5.0));
    }

    #[test]
    fn unknown_unit_is_rejected_with_the_value() {
        let err = parse_background_size("3em").unwrap_err();
        assert_eq!(err.to_string(), "unsupported background-size value '3em'");
        assert!(parse_background_size("1px 2px 3px").is_err());
    }

    #[test]
    fn paint_order_is_color_then_gradient() {
        let ctx = LayoutContext::new();
        let mut canvas = Canvas::new(Size::from_f32(20.0, 10.0));
        let background = Background {
            color: Some(Color::WHITE),
            overlay: Some(BackgroundOverlay::Gradient {
                from: Color::BLACK,
                to: Color::WHITE,
            }),
            ..Background::default()
        };
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            background.paint(&mut surface);
        }
        let cmds = canvas.commands();
        let rect = cmds
            .iter()
            .position(|c| matches!(c, Command::DrawRect { .. }))
            .unwrap();
        let shading = cmds
            .iter()
            .position(|c| matches!(c, Command::ShadingFill(Shading::Axial { x1, .. }) if *x1 == 20.0))
            .unwrap();
        assert!(rect < shading);
    }

    #[test]
    fn texture_overlay_registers_its_tile_after_the_color() {
        let ctx = LayoutContext::new();
        let mut canvas = Canvas::new(Size::from_f32(20.0, 10.0));
        let tile = BitmapImage::from_pixels("tile", image::RgbaImage::new(4, 2));
        let background = Background {
            color: Some(Color::WHITE),
            overlay: Some(BackgroundOverlay::Texture(Texture::new(tile))),
            ..Background::default()
        };
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            background.paint(&mut surface);
        }
        assert_eq!(canvas.state_depth(), 0);
        let document = canvas.finish();
        let rect = document
            .commands
            .iter()
            .position(|c| matches!(c, Command::DrawRect { .. }))
            .unwrap();
        let texture = document
            .commands
            .iter()
            .position(|c| {
                *c == Command::TextureFill {
                    resource_id: "tile".to_string(),
                    tile_width: Pt::from_i32(4),
                    tile_height: Pt::from_i32(2),
                }
            })
            .unwrap();
        assert!(rect < texture);
        assert!(document.images.contains_key("tile"));
    }

    #[test]
    fn centered_image_is_offset_by_half_the_slack() {
        let ctx = LayoutContext::new();
        let image = BitmapImage::from_pixels("px", image::RgbaImage::new(4, 2));
        let background = Background {
            image: Some(Arc::new(image)),
            ..Background::default()
        };
        let mut canvas = Canvas::new(Size::from_f32(10.0, 10.0));
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            background.render_image(&mut surface).unwrap();
        }
        assert!(canvas
            .commands()
            .contains(&Command::Translate(Pt::from_i32(3), Pt::from_i32(4))));
        assert_eq!(canvas.state_depth(), 0);
    }
}
