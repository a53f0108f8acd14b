use crate::canvas::Canvas;
use crate::context::LayoutContext;
use crate::geometry::Path;
use crate::types::{Pt, Rect, Size};

pub struct Surface<'a> {
    canvas: &'a mut Canvas,
    context: &'a LayoutContext,
    bounds: Size,
    scoped: bool,
}

impl<'a> Surface<'a> {
    /// Root surface covering the whole canvas.
    pub fn new(canvas: &'a mut Canvas, context: &'a LayoutContext) -> Self {
        let bounds = canvas.size();
        Self {
            canvas,
            context,
            bounds,
            scoped: false,
        }
    }

    pub fn bounds(&self) -> Size {
        self.bounds
    }

    pub fn context(&self) -> &'a LayoutContext {
        self.context
    }

    pub fn canvas(&mut self) -> &mut Canvas {
        self.canvas
    }

    fn derive(&mut self, bounds: Size) -> Surface<'_> {
        self.canvas.save_state();
        Surface {
            canvas: &mut *self.canvas,
            context: self.context,
            bounds,
            scoped: true,
        }
    }

    /// Child surface whose origin is `rect`'s corner, clipped to `rect`.
    pub fn sub_surface(&mut self, rect: Rect) -> Surface<'_> {
        let child = self.derive(rect.size());
        child.canvas.translate(rect.x, rect.y);
        child
            .canvas
            .clip_rect(Pt::ZERO, Pt::ZERO, rect.width, rect.height);
        child
    }

    /// Child surface with identical origin, clip and bounds.
    pub fn pass_through(&mut self) -> Surface<'_> {
        let bounds = self.bounds;
        self.derive(bounds)
    }

    /// Child surface for callers that apply their own transform; `bounds`
    /// describes the area in the transformed coordinate space.
    pub fn transformed(&mut self, bounds: Size) -> Surface<'_> {
        self.derive(bounds)
    }

    /// Child surface additionally clipped to `path` (in local coordinates).
    pub fn clip_to_path(&mut self, path: &Path) -> Surface<'_> {
        let bounds = self.bounds;
        let child = self.derive(bounds);
        child.canvas.append_path(path);
        child.canvas.clip_path(false);
        child
    }
}

impl Drop for Surface<'_> {
    fn drop(&mut self) {
        if self.scoped {
            self.canvas.restore_state();
        }
    }
}
