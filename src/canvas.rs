use crate::geometry::{Path, PathSegment};
use crate::types::{Color, Pt, Rect, Shading, Size};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SaveState,
    RestoreState,
    Translate(Pt, Pt),
    Scale(f32, f32),
    Rotate(f32),
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(Pt),
    SetFontName(String),
    SetFontSize(Pt),
    ClipRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    // Clip to the current path. The current path is consumed.
    ClipPath {
        evenodd: bool,
    },
    // Paint a shading over the whole clip region.
    ShadingFill(Shading),
    // Tile an image across the whole clip region.
    TextureFill {
        resource_id: String,
        tile_width: Pt,
        tile_height: Pt,
    },
    MoveTo {
        x: Pt,
        y: Pt,
    },
    LineTo {
        x: Pt,
        y: Pt,
    },
    CurveTo {
        x1: Pt,
        y1: Pt,
        x2: Pt,
        y2: Pt,
        x: Pt,
        y: Pt,
    },
    ClosePath,
    Fill,
    FillEvenOdd,
    Stroke,
    // `y` is the baseline.
    DrawString {
        x: Pt,
        y: Pt,
        text: String,
    },
    DrawRect {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
    },
    DrawImage {
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: String,
    },
}

/// Decoded RGBA pixels referenced by image and texture commands.
pub type ImagePixels = Arc<image::RgbaImage>;

#[derive(Debug, Clone)]
pub struct Document {
    pub size: Size,
    pub commands: Vec<Command>,
    pub images: HashMap<String, ImagePixels>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: Pt,
    font_size: Pt,
    font_name: String,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: Pt::from_f32(1.0),
            font_size: Pt::from_f32(12.0),
            font_name: String::new(),
        }
    }
}

/// Records drawing operations into a display list.
///
/// Coordinates are y-down with the origin at the top-left corner of the
/// canvas. Redundant state changes are dropped at record time.
#[derive(Debug)]
pub struct Canvas {
    size: Size,
    commands: Vec<Command>,
    images: HashMap<String, ImagePixels>,
    state_stack: Vec<GraphicsState>,
    current_state: GraphicsState,
}

impl Canvas {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            commands: Vec::new(),
            images: HashMap::new(),
            state_stack: Vec::new(),
            current_state: GraphicsState::default(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn save_state(&mut self) {
        self.state_stack.push(self.current_state.clone());
        self.commands.push(Command::SaveState);
    }

    pub fn restore_state(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.current_state = state;
            self.commands.push(Command::RestoreState);
        }
    }

    pub fn state_depth(&self) -> usize {
        self.state_stack.len()
    }

    pub fn translate(&mut self, x: Pt, y: Pt) {
        if x == Pt::ZERO && y == Pt::ZERO {
            return;
        }
        self.commands.push(Command::Translate(x, y));
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.commands.push(Command::Scale(x, y));
    }

    pub fn rotate(&mut self, angle_radians: f32) {
        self.commands.push(Command::Rotate(angle_radians));
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.current_state.fill_color == color {
            return;
        }
        self.current_state.fill_color = color;
        self.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.current_state.stroke_color == color {
            return;
        }
        self.current_state.stroke_color = color;
        self.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: Pt) {
        let width = width.max(Pt::ZERO);
        if self.current_state.line_width == width {
            return;
        }
        self.current_state.line_width = width;
        self.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_font_name(&mut self, name: &str) {
        if self.current_state.font_name == name {
            return;
        }
        self.current_state.font_name = name.to_string();
        self.commands
            .push(Command::SetFontName(self.current_state.font_name.clone()));
    }

    pub fn set_font_size(&mut self, size: Pt) {
        if self.current_state.font_size == size {
            return;
        }
        self.current_state.font_size = size;
        self.commands.push(Command::SetFontSize(size));
    }

    pub fn clip_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.commands.push(Command::ClipRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn clip_path(&mut self, evenodd: bool) {
        self.commands.push(Command::ClipPath { evenodd });
    }

    pub fn shading_fill(&mut self, shading: Shading) {
        self.commands.push(Command::ShadingFill(shading));
    }

    pub fn texture_fill(&mut self, resource_id: impl Into<String>, tile: Size) {
        self.commands.push(Command::TextureFill {
            resource_id: resource_id.into(),
            tile_width: tile.width,
            tile_height: tile.height,
        });
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        self.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        self.commands.push(Command::LineTo { x, y });
    }

    pub fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x: Pt, y: Pt) {
        self.commands.push(Command::CurveTo {
            x1,
            y1,
            x2,
            y2,
            x,
            y,
        });
    }

    pub fn close_path(&mut self) {
        self.commands.push(Command::ClosePath);
    }

    /// Adds every segment of `path` to the current path.
    pub fn append_path(&mut self, path: &Path) {
        for segment in path.segments() {
            match *segment {
                PathSegment::MoveTo { x, y } => self.move_to(Pt::from_f32(x), Pt::from_f32(y)),
                PathSegment::LineTo { x, y } => self.line_to(Pt::from_f32(x), Pt::from_f32(y)),
                PathSegment::CubicTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x,
                    y,
                } => self.curve_to(
                    Pt::from_f32(x1),
                    Pt::from_f32(y1),
                    Pt::from_f32(x2),
                    Pt::from_f32(y2),
                    Pt::from_f32(x),
                    Pt::from_f32(y),
                ),
                PathSegment::Close => self.close_path(),
            }
        }
    }

    pub fn fill(&mut self) {
        self.commands.push(Command::Fill);
    }

    pub fn fill_evenodd(&mut self) {
        self.commands.push(Command::FillEvenOdd);
    }

    pub fn stroke(&mut self) {
        self.commands.push(Command::Stroke);
    }

    pub fn draw_string(&mut self, x: Pt, y: Pt, text: impl Into<String>) {
        self.commands.push(Command::DrawString {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_rect(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.set_fill_color(color);
        self.draw_rect(rect.x, rect.y, rect.width, rect.height);
    }

    /// Makes decoded pixels available to later image and texture commands.
    pub fn register_image(&mut self, resource_id: impl Into<String>, pixels: ImagePixels) {
        self.images.entry(resource_id.into()).or_insert(pixels);
    }

    pub fn draw_image(
        &mut self,
        x: Pt,
        y: Pt,
        width: Pt,
        height: Pt,
        resource_id: impl Into<String>,
    ) {
        self.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.into(),
        });
    }

    pub fn finish(self) -> Document {
        Document {
            size: self.size,
            commands: self.commands,
            images: self.images,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redundant_state_changes_are_not_recorded() {
        let mut canvas = Canvas::new(Size::from_f32(10.0, 10.0));
        canvas.set_fill_color(Color::WHITE);
        canvas.set_fill_color(Color::WHITE);
        canvas.translate(Pt::ZERO, Pt::ZERO);
        assert_eq!(canvas.commands(), &[Command::SetFillColor(Color::WHITE)]);
    }

    #[test]
    fn restore_reverts_tracked_state() {
        let mut canvas = Canvas::new(Size::from_f32(10.0, 10.0));
        canvas.save_state();
        canvas.set_fill_color(Color::WHITE);
        canvas.restore_state();
        canvas.set_fill_color(Color::WHITE);
        let fills = canvas
            .commands()
            .iter()
            .filter(|cmd| matches!(cmd, Command::SetFillColor(_)))
            .count();
        assert_eq!(fills, 2);
        assert_eq!(canvas.state_depth(), 0);
    }

    #[test]
    fn unbalanced_restore_is_ignored() {
        let mut canvas = Canvas::new(Size::from_f32(10.0, 10.0));
        canvas.restore_state();
        assert!(canvas.commands().is_empty());
    }

    #[test]
    fn append_path_emits_segments_in_order() {
        let mut canvas = Canvas::new(Size::from_f32(10.0, 10.0));
        canvas.append_path(&Path::rect(1.0, 2.0, 3.0, 4.0));
        let cmds = canvas.commands();
        assert_eq!(cmds.len(), 5);
        assert_eq!(
            cmds[0],
            Command::MoveTo {
                x: Pt::from_f32(1.0),
                y: Pt::from_f32(2.0)
            }
        );
        assert_eq!(cmds[4], Command::ClosePath);
    }
}
