use crate::canvas::{Command, Document, ImagePixels};
use crate::error::{LayoutError, Result};
use crate::font::{FontManager, detect_direction};
use crate::types::{Color, Pt, Shading, ShadingStop};
use rustybuzz::{Face as HbFace, UnicodeBuffer};
use std::collections::HashMap;
use tiny_skia::{
    FillRule, FilterQuality, GradientStop, LinearGradient, Mask, Paint, Path, PathBuilder,
    Pattern, Pixmap, PixmapPaint, Point, Rect, Shader, SpreadMode, Stroke, Transform,
};
use ttf_parser::{GlyphId, OutlineBuilder};

#[derive(Clone)]
struct RasterState {
    transform: Transform,
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_name: String,
    font_size: Pt,
    clip_mask: Option<Mask>,
}

impl Default for RasterState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_name: String::new(),
            font_size: Pt::from_f32(12.0),
            clip_mask: None,
        }
    }
}

/// Replays `document` onto a white pixmap. `scale` is pixels per point.
pub fn render_to_pixmap(document: &Document, scale: f32, fonts: &FontManager) -> Result<Pixmap> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(LayoutError::InvalidConfiguration(format!(
            "raster scale must be positive, got {scale}"
        )));
    }
    let width_px = pt_to_px(document.size.width, scale)?;
    let height_px = pt_to_px(document.size.height, scale)?;
    let mut pixmap = Pixmap::new(width_px, height_px).ok_or_else(|| {
        LayoutError::InvalidConfiguration(format!(
            "invalid raster size {width_px}x{height_px}"
        ))
    })?;
    pixmap.fill(tiny_skia::Color::from_rgba8(255, 255, 255, 255));

    let mut images = HashMap::with_capacity(document.images.len());
    for (id, pixels) in &document.images {
        match rgba_to_pixmap(pixels) {
            Some(image) => {
                images.insert(id.as_str(), image);
            }
            None => log::warn!("image '{}' has no pixels, skipping", id),
        }
    }

    let mut raster = Rasterizer {
        pixmap: &mut pixmap,
        images,
        fonts,
        base_transform: Transform::from_scale(scale, scale),
        state: RasterState::default(),
        stack: Vec::new(),
        path: PathBuilder::new(),
        has_path: false,
    };
    raster.run(&document.commands);
    log::debug!(
        "rasterized {} commands into {}x{} pixels",
        document.commands.len(),
        width_px,
        height_px
    );
    Ok(pixmap)
}

/// Rasterizes `document` and encodes the result as PNG.
pub fn render_to_png(document: &Document, scale: f32, fonts: &FontManager) -> Result<Vec<u8>> {
    let pixmap = render_to_pixmap(document, scale, fonts)?;
    pixmap
        .encode_png()
        .map_err(|err| LayoutError::resource("png", err.to_string()))
}

struct Rasterizer<'a> {
    pixmap: &'a mut Pixmap,
    images: HashMap<&'a str, Pixmap>,
    fonts: &'a FontManager,
    base_transform: Transform,
    state: RasterState,
    stack: Vec<RasterState>,
    path: PathBuilder,
    has_path: bool,
}

impl Rasterizer<'_> {
    fn device_transform(&self) -> Transform {
        self.base_transform.pre_concat(self.state.transform)
    }

    fn run(&mut self, commands: &[Command]) {
        for cmd in commands {
            match cmd {
                Command::SaveState => self.stack.push(self.state.clone()),
                Command::RestoreState => {
                    if let Some(restored) = self.stack.pop() {
                        self.state = restored;
                    }
                }
                Command::Translate(x, y) => {
                    self.state.transform = self.state.transform.pre_translate(x.to_f32(), y.to_f32());
                }
                Command::Scale(x, y) => {
                    self.state.transform = self.state.transform.pre_scale(*x, *y);
                }
                Command::Rotate(angle) => {
                    let deg = angle.to_degrees();
                    self.state.transform = self.state.transform.pre_concat(Transform::from_rotate(deg));
                }
                Command::SetFillColor(color) => self.state.fill_color = *color,
                Command::SetStrokeColor(color) => self.state.stroke_color = *color,
                Command::SetLineWidth(width) => self.state.line_width = width.max(Pt::ZERO),
                Command::SetFontName(name) => self.state.font_name = name.clone(),
                Command::SetFontSize(size) => self.state.font_size = *size,
                Command::ClipRect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    if let Some(rect) =
                        Rect::from_xywh(x.to_f32(), y.to_f32(), width.to_f32(), height.to_f32())
                    {
                        self.clip(&PathBuilder::from_rect(rect), FillRule::Winding);
                    } else {
                        // An empty clip hides everything drawn under it.
                        self.state.clip_mask = Mask::new(self.pixmap.width(), self.pixmap.height());
                    }
                }
                Command::ClipPath { evenodd } => {
                    if let Some(path) = self.take_path() {
                        self.clip(&path, fill_rule(*evenodd));
                    }
                }
                Command::ShadingFill(shading) => self.shading_fill(shading),
                Command::TextureFill {
                    resource_id,
                    tile_width,
                    tile_height,
                } => self.texture_fill(resource_id, tile_width.to_f32(), tile_height.to_f32()),
                Command::MoveTo { x, y } => {
                    self.path.move_to(x.to_f32(), y.to_f32());
                    self.has_path = true;
                }
                Command::LineTo { x, y } => {
                    self.path.line_to(x.to_f32(), y.to_f32());
                    self.has_path = true;
                }
                Command::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => {
                    self.path.cubic_to(
                        x1.to_f32(),
                        y1.to_f32(),
                        x2.to_f32(),
                        y2.to_f32(),
                        x.to_f32(),
                        y.to_f32(),
                    );
                    self.has_path = true;
                }
                Command::ClosePath => {
                    if self.has_path {
                        self.path.close();
                    }
                }
                Command::Fill => self.fill_current_path(FillRule::Winding),
                Command::FillEvenOdd => self.fill_current_path(FillRule::EvenOdd),
                Command::Stroke => self.stroke_current_path(),
                Command::DrawString { x, y, text } => self.draw_string(x.to_f32(), y.to_f32(), text),
                Command::DrawRect {
                    x,
                    y,
                    width,
                    height,
                } => {
                    if let Some(rect) =
                        Rect::from_xywh(x.to_f32(), y.to_f32(), width.to_f32(), height.to_f32())
                    {
                        let paint = fill_paint(self.state.fill_color);
                        let transform = self.device_transform();
                        self.pixmap.fill_path(
                            &PathBuilder::from_rect(rect),
                            &paint,
                            FillRule::Winding,
                            transform,
                            self.state.clip_mask.as_ref(),
                        );
                    }
                }
                Command::DrawImage {
                    x,
                    y,
                    width,
                    height,
                    resource_id,
                } => self.draw_image(
                    resource_id,
                    x.to_f32(),
                    y.to_f32(),
                    width.to_f32(),
                    height.to_f32(),
                ),
            }
        }
    }

    fn take_path(&mut self) -> Option<Path> {
        if !self.has_path {
            return None;
        }
        self.has_path = false;
        std::mem::replace(&mut self.path, PathBuilder::new()).finish()
    }

    fn clip(&mut self, path: &Path, rule: FillRule) {
        let transform = self.device_transform();
        if let Some(mask) = self.state.clip_mask.as_mut() {
            mask.intersect_path(path, rule, true, transform);
            return;
        }
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        mask.fill_path(path, rule, true, transform);
        self.state.clip_mask = Some(mask);
    }

    fn fill_current_path(&mut self, rule: FillRule) {
        let Some(path) = self.take_path() else {
            return;
        };
        let paint = fill_paint(self.state.fill_color);
        let transform = self.device_transform();
        self.pixmap
            .fill_path(&path, &paint, rule, transform, self.state.clip_mask.as_ref());
    }

    fn stroke_current_path(&mut self) {
        let Some(path) = self.take_path() else {
            return;
        };
        let paint = fill_paint(self.state.stroke_color);
        let stroke = Stroke {
            width: self.state.line_width.to_f32(),
            ..Stroke::default()
        };
        let transform = self.device_transform();
        self.pixmap
            .stroke_path(&path, &paint, &stroke, transform, self.state.clip_mask.as_ref());
    }

    fn shading_fill(&mut self, shading: &Shading) {
        let Shading::Axial {
            x0,
            y0,
            x1,
            y1,
            stops,
        } = shading;
        let shader = LinearGradient::new(
            Point::from_xy(*x0, *y0),
            Point::from_xy(*x1, *y1),
            gradient_stops(stops),
            SpreadMode::Pad,
            self.device_transform(),
        );
        match shader {
            Some(shader) => fill_region(self.pixmap, shader, self.state.clip_mask.as_ref()),
            None => log::debug!("degenerate shading skipped"),
        }
    }

    fn texture_fill(&mut self, resource_id: &str, tile_width: f32, tile_height: f32) {
        let Some(image) = self.images.get(resource_id) else {
            log::warn!("texture '{}' was never registered, skipping", resource_id);
            return;
        };
        if tile_width <= 0.0 || tile_height <= 0.0 {
            return;
        }
        let transform = self.device_transform().pre_scale(
            tile_width / image.width() as f32,
            tile_height / image.height() as f32,
        );
        let shader = Pattern::new(
            image.as_ref(),
            SpreadMode::Repeat,
            FilterQuality::Bilinear,
            1.0,
            transform,
        );
        fill_region(self.pixmap, shader, self.state.clip_mask.as_ref());
    }

    fn draw_image(&mut self, resource_id: &str, x: f32, y: f32, width: f32, height: f32) {
        let Some(image) = self.images.get(resource_id) else {
            log::warn!("image '{}' was never registered, skipping", resource_id);
            return;
        };
        let src_w = image.width() as f32;
        let src_h = image.height() as f32;
        let image_ts = Transform::from_row(width / src_w, 0.0, 0.0, height / src_h, x, y);
        let transform = self.base_transform.pre_concat(self.state.transform.pre_concat(image_ts));
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            transform,
            self.state.clip_mask.as_ref(),
        );
    }

    fn draw_string(&mut self, x: f32, baseline: f32, text: &str) {
        let font_size = self.state.font_size.to_f32();
        if text.is_empty() || font_size <= 0.0 {
            return;
        }
        let Some(data) = self.fonts.face_bytes_for_name(&self.state.font_name) else {
            log::debug!("no face for '{}', text not rasterized", self.state.font_name);
            return;
        };
        let Ok(face) = ttf_parser::Face::parse(&data, 0) else {
            log::warn!("face for '{}' failed to parse", self.state.font_name);
            return;
        };
        let paint = fill_paint(self.state.fill_color);
        let transform = self.device_transform();
        for glyph in layout_glyphs(&data, text, font_size, x, baseline) {
            let mut builder = GlyphPathBuilder::new(glyph.origin_x, glyph.origin_y, glyph.scale);
            if face.outline_glyph(GlyphId(glyph.glyph_id), &mut builder).is_none() {
                continue;
            }
            if let Some(path) = builder.finish() {
                self.pixmap.fill_path(
                    &path,
                    &paint,
                    FillRule::Winding,
                    transform,
                    self.state.clip_mask.as_ref(),
                );
            }
        }
    }
}

struct GlyphPlacement {
    glyph_id: u16,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

fn layout_glyphs(
    font_data: &[u8],
    text: &str,
    font_size: f32,
    x: f32,
    baseline: f32,
) -> Vec<GlyphPlacement> {
    let Some(face) = HbFace::from_slice(font_data, 0) else {
        return Vec::new();
    };
    let units = face.units_per_em().max(1) as f32;
    let scale = font_size / units;
    let mut buffer = UnicodeBuffer::new();
    buffer.set_direction(detect_direction(text));
    buffer.push_str(text);
    let output = rustybuzz::shape(&face, &[], buffer);

    let mut out = Vec::with_capacity(output.len());
    let mut pen_x = x;
    let mut pen_y = baseline;
    for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
        let gid = info.glyph_id as u16;
        if gid != 0 {
            out.push(GlyphPlacement {
                glyph_id: gid,
                origin_x: pen_x + pos.x_offset as f32 * scale,
                // Font units are y-up.
                origin_y: pen_y - pos.y_offset as f32 * scale,
                scale,
            });
        }
        pen_x += pos.x_advance as f32 * scale;
        pen_y -= pos.y_advance as f32 * scale;
    }
    out
}

/// Converts y-up font outlines into y-down user space.
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x, y) = self.point(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x2, y2) = self.point(x2, y2);
        let (x, y) = self.point(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

// Shader-backed fills cover the whole pixmap; the clip mask bounds them.
fn fill_region(pixmap: &mut Pixmap, shader: Shader<'_>, mask: Option<&Mask>) {
    let Some(region) = Rect::from_xywh(0.0, 0.0, pixmap.width() as f32, pixmap.height() as f32)
    else {
        return;
    };
    let paint = Paint {
        shader,
        anti_alias: true,
        ..Paint::default()
    };
    pixmap.fill_path(
        &PathBuilder::from_rect(region),
        &paint,
        FillRule::Winding,
        Transform::identity(),
        mask,
    );
}

fn fill_rule(evenodd: bool) -> FillRule {
    if evenodd {
        FillRule::EvenOdd
    } else {
        FillRule::Winding
    }
}

fn gradient_stops(stops: &[ShadingStop]) -> Vec<GradientStop> {
    if stops.is_empty() {
        return vec![
            GradientStop::new(0.0, to_sk_color(Color::BLACK)),
            GradientStop::new(1.0, to_sk_color(Color::BLACK)),
        ];
    }
    stops
        .iter()
        .map(|stop| GradientStop::new(stop.offset.clamp(0.0, 1.0), to_sk_color(stop.color)))
        .collect()
}

fn fill_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_sk_color(color));
    paint.anti_alias = true;
    paint
}

fn to_sk_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba(
        color.r.clamp(0.0, 1.0),
        color.g.clamp(0.0, 1.0),
        color.b.clamp(0.0, 1.0),
        1.0,
    )
    .unwrap_or_else(|| tiny_skia::Color::from_rgba8(0, 0, 0, 255))
}

fn pt_to_px(length: Pt, scale: f32) -> Result<u32> {
    let px = (length.to_f32() * scale).round();
    if !(px >= 1.0 && px <= u32::MAX as f32) {
        return Err(LayoutError::InvalidConfiguration(format!(
            "cannot rasterize a dimension of {} points at scale {scale}",
            length.to_f32()
        )));
    }
    Ok(px as u32)
}

fn rgba_to_pixmap(pixels: &ImagePixels) -> Option<Pixmap> {
    let (width, height) = pixels.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (src, dst) in pixels
        .as_raw()
        .chunks_exact(4)
        .zip(pixmap.data_mut().chunks_exact_mut(4))
    {
        let alpha = src[3];
        dst[0] = premul_u8(src[0], alpha);
        dst[1] = premul_u8(src[1], alpha);
        dst[2] = premul_u8(src[2], alpha);
        dst[3] = alpha;
    }
    Some(pixmap)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}
