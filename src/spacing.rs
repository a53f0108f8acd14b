use crate::geometry::Path;
use crate::surface::Surface;
use crate::types::{Color, Pt, Rect, Size};

/// Per-side sizes falling back to one uniform size, plus paint and
/// enablement flags.
///
/// An inapplicable region takes no space and paints nothing. A region with
/// rendering switched off still reserves its inset.
#[derive(Debug, Clone, PartialEq)]
pub struct Spacing {
    top: Option<Pt>,
    left: Option<Pt>,
    bottom: Option<Pt>,
    right: Option<Pt>,
    size: Pt,
    applicable: bool,
    render: bool,
    paint: Option<Color>,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            top: None,
            left: None,
            bottom: None,
            right: None,
            size: Pt::ZERO,
            applicable: true,
            render: true,
            paint: None,
        }
    }
}

impl Spacing {
    pub fn uniform(size: Pt) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn painted(size: Pt, color: Color) -> Self {
        Self {
            size,
            paint: Some(color),
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            applicable: false,
            ..Self::default()
        }
    }

    pub fn top(&self) -> Pt {
        self.top.unwrap_or(self.size)
    }

    pub fn left(&self) -> Pt {
        self.left.unwrap_or(self.size)
    }

    pub fn bottom(&self) -> Pt {
        self.bottom.unwrap_or(self.size)
    }

    pub fn right(&self) -> Pt {
        self.right.unwrap_or(self.size)
    }

    pub fn size(&self) -> Pt {
        self.size
    }

    pub fn set_top(&mut self, value: Pt) {
        self.top = Some(value);
    }

    pub fn set_left(&mut self, value: Pt) {
        self.left = Some(value);
    }

    pub fn set_bottom(&mut self, value: Pt) {
        self.bottom = Some(value);
    }

    pub fn set_right(&mut self, value: Pt) {
        self.right = Some(value);
    }

    pub fn set_size(&mut self, size: Pt) {
        self.size = size;
    }

    /// Drops every side value, the uniform size and the paint.
    pub fn clear(&mut self) {
        self.top = None;
        self.left = None;
        self.bottom = None;
        self.right = None;
        self.size = Pt::ZERO;
        self.paint = None;
    }

    pub fn is_applicable(&self) -> bool {
        self.applicable
    }

    pub fn set_applicable(&mut self, applicable: bool) {
        self.applicable = applicable;
    }

    pub fn renders(&self) -> bool {
        self.render
    }

    pub fn set_render(&mut self, render: bool) {
        self.render = render;
    }

    pub fn paint(&self) -> Option<Color> {
        self.paint
    }

    pub fn set_paint(&mut self, paint: Option<Color>) {
        self.paint = paint;
    }

    /// Left plus right, or zero when inapplicable.
    pub fn horizontal(&self) -> Pt {
        if !self.applicable {
            return Pt::ZERO;
        }
        self.left() + self.right()
    }

    /// Top plus bottom, or zero when inapplicable.
    pub fn vertical(&self) -> Pt {
        if !self.applicable {
            return Pt::ZERO;
        }
        self.top() + self.bottom()
    }

    /// Grows a content size by the insets.
    pub fn expand(&self, size: Size) -> Size {
        Size::new(size.width + self.horizontal(), size.height + self.vertical())
    }

    /// `outer` shrunk by the insets, never negative.
    pub fn inner_rect(&self, outer: Size) -> Rect {
        if !self.applicable {
            return Rect::from_size(outer);
        }
        Rect::new(
            self.left(),
            self.top(),
            (outer.width - self.horizontal()).max(Pt::ZERO),
            (outer.height - self.vertical()).max(Pt::ZERO),
        )
    }

    fn is_zero(&self) -> bool {
        self.top() == Pt::ZERO
            && self.left() == Pt::ZERO
            && self.bottom() == Pt::ZERO
            && self.right() == Pt::ZERO
    }
}

/// Shape generation and rendering shared by every inset region.
pub trait Inset {
    fn spacing(&self) -> &Spacing;

    fn outer_shape(&self, size: Size) -> Path {
        Path::rect(0.0, 0.0, size.width.to_f32(), size.height.to_f32())
    }

    fn inner_shape(&self, size: Size) -> Path {
        let inner = self.spacing().inner_rect(size);
        Path::rect(
            inner.x.to_f32(),
            inner.y.to_f32(),
            inner.width.to_f32(),
            inner.height.to_f32(),
        )
    }

    /// Whether the inner shape is something other than the inner rectangle.
    fn has_curved_inner(&self) -> bool {
        false
    }

    /// Paints the region, then returns a surface whose origin is the inner
    /// corner and whose clip is the inner shape.
    fn render<'s>(&self, surface: &'s mut Surface<'_>) -> Surface<'s> {
        let spacing = self.spacing();
        if !spacing.is_applicable() {
            return surface.pass_through();
        }
        let size = surface.bounds();
        if let Some(color) = spacing.paint() {
            if spacing.renders() && !spacing.is_zero() {
                let outer = self.outer_shape(size);
                let inner = self.inner_shape(size);
                let canvas = surface.canvas();
                canvas.set_fill_color(color);
                canvas.append_path(&outer);
                canvas.append_path(&inner);
                canvas.fill_evenodd();
            }
        }
        let inner = spacing.inner_rect(size);
        let curved = self.has_curved_inner();
        let clip = curved.then(|| {
            self.inner_shape(size)
                .translated(-inner.x.to_f32(), -inner.y.to_f32())
        });
        let mut child = surface.sub_surface(inner);
        if let Some(path) = clip {
            let canvas = child.canvas();
            canvas.append_path(&path);
            canvas.clip_path(false);
        }
        child
    }
}

impl Inset for Spacing {
    fn spacing(&self) -> &Spacing {
        self
    }
}

/// Spacing with optional rounded corners.
///
/// Corner geometry assumes one thickness on all four sides: the inner radius
/// is the outer radius minus the uniform `size`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Border {
    spacing: Spacing,
    radius: Pt,
}

impl Border {
    pub fn new(spacing: Spacing) -> Self {
        Self {
            spacing,
            radius: Pt::ZERO,
        }
    }

    pub fn uniform(thickness: Pt, color: Color) -> Self {
        Self::new(Spacing::painted(thickness, color))
    }

    pub fn with_radius(mut self, radius: Pt) -> Self {
        self.radius = radius;
        self
    }

    pub fn radius(&self) -> Pt {
        self.radius
    }

    pub fn set_radius(&mut self, radius: Pt) {
        self.radius = radius;
    }

    pub fn spacing_mut(&mut self) -> &mut Spacing {
        &mut self.spacing
    }

    pub fn inner_radius(&self) -> Pt {
        (self.radius - self.spacing.size()).max(Pt::ZERO)
    }
}

impl Inset for Border {
    fn spacing(&self) -> &Spacing {
        &self.spacing
    }

    fn outer_shape(&self, size: Size) -> Path {
        Path::rounded_rect(
            0.0,
            0.0,
            size.width.to_f32(),
            size.height.to_f32(),
            self.radius.to_f32(),
        )
    }

    fn inner_shape(&self, size: Size) -> Path {
        let inner = self.spacing.inner_rect(size);
        // rounded_rect degrades to a plain rectangle for a zero radius
        Path::rounded_rect(
            inner.x.to_f32(),
            inner.y.to_f32(),
            inner.width.to_f32(),
            inner.height.to_f32(),
            self.inner_radius().to_f32(),
        )
    }

    fn has_curved_inner(&self) -> bool {
        self.inner_radius().is_positive()
    }
}
