use crate::canvas::Canvas;
use crate::context::LayoutContext;
use crate::error::Result;
use crate::font::{FontStyle, Typeface};
use crate::geometry::circular_placements;
use crate::style::FontSpec;
use crate::types::{Color, Pt, Size};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextPaint {
    pub color: Color,
}

impl Default for TextPaint {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub width: Pt,
    /// Baseline offset from the top of the block.
    pub baseline: Pt,
}

/// Shaped, bounded run of text lines ready to be drawn at an origin.
#[derive(Debug, Clone)]
pub struct TextBlock {
    lines: Vec<TextLine>,
    size: Size,
    font_name: String,
    font_size: Pt,
    color: Color,
}

impl TextBlock {
    pub fn new(lines: Vec<TextLine>, size: Size, typeface: &Typeface, paint: &TextPaint) -> Self {
        Self {
            lines,
            size,
            font_name: typeface.font_name(),
            font_size: typeface.size(),
            color: paint.color,
        }
    }

    pub fn lines(&self) -> &[TextLine] {
        &self.lines
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn draw(&self, canvas: &mut Canvas, x: Pt, y: Pt) {
        if self.lines.iter().all(|line| line.text.is_empty()) {
            return;
        }
        canvas.set_font_name(&self.font_name);
        canvas.set_font_size(self.font_size);
        canvas.set_fill_color(self.color);
        for line in &self.lines {
            if line.text.is_empty() {
                continue;
            }
            canvas.draw_string(x, y + line.baseline, line.text.clone());
        }
    }
}

/// Line breaking and measurement capability used by text leaves.
pub trait TextShaper: std::fmt::Debug + Send + Sync {
    fn layout(
        &self,
        text: &str,
        typeface: &Typeface,
        paint: &TextPaint,
        max_width: Option<Pt>,
    ) -> Result<TextBlock>;
}

/// Breaks at newlines and, given a wrap width, greedily at whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleShaper;

impl SimpleShaper {
    fn wrap(paragraph: &str, typeface: &Typeface, max_width: Pt) -> Vec<String> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{current} {word}");
            if typeface.measure_text(&candidate) > max_width {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            } else {
                current = candidate;
            }
        }
        lines.push(current);
        lines
    }
}

impl TextShaper for SimpleShaper {
    fn layout(
        &self,
        text: &str,
        typeface: &Typeface,
        paint: &TextPaint,
        max_width: Option<Pt>,
    ) -> Result<TextBlock> {
        let line_height = typeface.line_height();
        let ascent = typeface.ascent();

        let mut raw = Vec::new();
        for paragraph in text.split('\n') {
            match max_width {
                Some(limit) => raw.extend(Self::wrap(paragraph, typeface, limit)),
                None => raw.push(paragraph.to_string()),
            }
        }

        let mut width = Pt::ZERO;
        let mut lines = Vec::with_capacity(raw.len());
        for (index, text) in raw.into_iter().enumerate() {
            let line_width = typeface.measure_text(&text);
            width = width.max(line_width);
            lines.push(TextLine {
                text,
                width: line_width,
                baseline: line_height * index as i32 + ascent,
            });
        }
        let height = line_height * lines.len() as i32;
        Ok(TextBlock::new(lines, Size::new(width, height), typeface, paint))
    }
}

/// Text leaf content.
#[derive(Debug, Clone, Default)]
pub struct TextBox {
    text: String,
}

impl TextBox {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Explicit typeface, else a font-manager face, else a bare typeface
    /// built from the family name.
    pub fn typeface(font: &FontSpec, ctx: &LayoutContext) -> Typeface {
        if let Some(typeface) = &font.typeface {
            return typeface.clone();
        }
        let config = ctx.config();
        let family = font
            .family
            .as_deref()
            .unwrap_or(config.default_font_family.as_str());
        let size = font.size.unwrap_or(config.default_font_size);
        let style = FontStyle::from_bold(font.bold);
        ctx.fonts()
            .get_font(family, style, size)
            .unwrap_or_else(|| Typeface::new(family, style, size))
    }

    pub fn layout(&self, font: &FontSpec, ctx: &LayoutContext) -> Result<TextBlock> {
        let typeface = Self::typeface(font, ctx);
        let paint = TextPaint { color: font.color };
        ctx.shaper().layout(&self.text, &typeface, &paint, None)
    }
}

/// Draws `text` clockwise along a circle, one glyph at a time, each glyph
/// rotated to stand on the arc.
pub fn draw_text_on_circle(
    canvas: &mut Canvas,
    text: &str,
    typeface: &Typeface,
    paint: &TextPaint,
    center: (f32, f32),
    radius: f32,
    start_angle: f32,
) {
    let glyphs: Vec<String> = text.chars().map(String::from).collect();
    let advances: Vec<f32> = glyphs
        .iter()
        .map(|glyph| typeface.measure_text(glyph).to_f32())
        .collect();
    let placements = circular_placements(&advances, center, radius, start_angle);

    canvas.set_font_name(&typeface.font_name());
    canvas.set_font_size(typeface.size());
    canvas.set_fill_color(paint.color);
    for ((glyph, advance), placement) in glyphs.into_iter().zip(advances).zip(placements) {
        if glyph.trim().is_empty() {
            continue;
        }
        canvas.save_state();
        canvas.translate(Pt::from_f32(placement.x), Pt::from_f32(placement.y));
        canvas.rotate(placement.rotation);
        canvas.draw_string(Pt::from_f32(-advance / 2.0), Pt::ZERO, glyph);
        canvas.restore_state();
    }
}
