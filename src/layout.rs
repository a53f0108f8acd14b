use crate::canvas::Canvas;
use crate::context::LayoutContext;
use crate::error::Result;
use crate::flow;
use crate::geometry::rotated_bounds;
use crate::spacing::Inset;
use crate::style::{BoxStyle, RotationAnchor};
use crate::surface::Surface;
use crate::table;
use crate::tree::{BoxId, BoxKind, BoxTree};
use crate::types::{Pt, Size};

/// Size of the box's own content, without insets or rotation.
pub fn measure_content(tree: &BoxTree, id: BoxId, ctx: &LayoutContext) -> Result<Size> {
    let node = tree.node(id)?;
    match node.kind() {
        BoxKind::Text(text) => Ok(text.layout(&node.style().font, ctx)?.size()),
        BoxKind::Image(image) => image.renderer().measure(ctx),
        BoxKind::Break => Ok(Size::ZERO),
        BoxKind::Flow(flow_box) => Ok(flow::layout(tree, id, flow_box, ctx)?.size),
        BoxKind::Table(_) => table::measure_table(tree, id, ctx),
        BoxKind::TableRow(_) => table::measure_row(tree, id, ctx),
        BoxKind::TableCell(_) => table::measure_cell_content(tree, id, ctx),
    }
}

/// Content grown to the explicit size, plus padding and border: the
/// rectangle that rotation applies to.
pub fn rotation_box(tree: &BoxTree, id: BoxId, ctx: &LayoutContext) -> Result<Size> {
    let style = tree.node(id)?.style();
    let content = measure_content(tree, id, ctx)?;
    let sized = Size::new(
        style.width.max(content.width),
        style.height.max(content.height),
    );
    Ok(style.border.spacing().expand(style.padding.expand(sized)))
}

pub fn measure(tree: &BoxTree, id: BoxId, ctx: &LayoutContext) -> Result<Size> {
    let style = tree.node(id)?.style();
    let mut frame = rotation_box(tree, id, ctx)?;
    if style.is_rotated() {
        let bounds = rotated_bounds(frame.width.to_f32(), frame.height.to_f32(), style.rotation);
        frame = Size::from_f32(bounds.width(), bounds.height());
    }
    Ok(style.margin.expand(frame))
}

/// Paints the box at the surface origin.
pub fn render(tree: &BoxTree, id: BoxId, surface: &mut Surface<'_>) -> Result<()> {
    let style = tree.node(id)?.style();
    let mut margin = style.margin.render(surface);
    if !style.is_rotated() {
        return paint_box(tree, id, style, &mut margin);
    }

    let anchor = style.anchor()?;
    let frame = rotation_box(tree, id, margin.context())?;
    let mut rotated = margin.transformed(frame);
    apply_rotation(rotated.canvas(), frame, style.rotation, anchor);
    paint_box(tree, id, style, &mut rotated)
}

// Shifts the rotated frame back into the positive quadrant, then rotates
// about the anchor.
fn apply_rotation(canvas: &mut Canvas, frame: Size, angle: f32, anchor: RotationAnchor) {
    let bounds = rotated_bounds(frame.width.to_f32(), frame.height.to_f32(), angle);
    let (ax, ay) = anchor.resolve(frame);
    canvas.translate(Pt::from_f32(-bounds.min_x), Pt::from_f32(-bounds.min_y));
    canvas.translate(Pt::from_f32(ax), Pt::from_f32(ay));
    canvas.rotate(angle);
    canvas.translate(Pt::from_f32(-ax), Pt::from_f32(-ay));
}

fn paint_box(tree: &BoxTree, id: BoxId, style: &BoxStyle, surface: &mut Surface<'_>) -> Result<()> {
    let outer = surface.bounds();
    let mut border = style.border.render(surface);
    style.background.paint(&mut border);
    let mut padding = style.padding.render(&mut border);

    let mut content = if style.border.radius().is_positive() {
        let border_inner = style.border.spacing().inner_rect(outer);
        let padding_inner = style.padding.inner_rect(border_inner.size());
        let shape = style.border.inner_shape(outer).translated(
            -(border_inner.x + padding_inner.x).to_f32(),
            -(border_inner.y + padding_inner.y).to_f32(),
        );
        padding.clip_to_path(&shape)
    } else {
        padding.pass_through()
    };

    style.background.render_image(&mut content)?;
    render_content(tree, id, &mut content)
}

fn render_content(tree: &BoxTree, id: BoxId, surface: &mut Surface<'_>) -> Result<()> {
    let node = tree.node(id)?;
    match node.kind() {
        BoxKind::Text(text) => {
            let block = text.layout(&node.style().font, surface.context())?;
            block.draw(surface.canvas(), Pt::ZERO, Pt::ZERO);
            Ok(())
        }
        BoxKind::Image(image) => image.renderer().render(surface),
        BoxKind::Break => Ok(()),
        BoxKind::Flow(flow_box) => flow::render(tree, id, flow_box, surface),
        BoxKind::Table(_) => table::render_table(tree, id, surface),
        BoxKind::TableRow(_) => table::render_row(tree, id, surface),
        BoxKind::TableCell(cell) => table::render_cell_content(tree, id, cell, surface),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, Command};
    use crate::spacing::{Border, Spacing};
    use crate::types::{Color, Rect};
    use std::f32::consts::FRAC_PI_2;

    // An image leaf with a fixed size, measured through the renderer.
    #[derive(Debug)]
    struct Fixed(Size);

    impl crate::image::ImageRenderer for Fixed {
        fn measure(&self, _ctx: &LayoutContext) -> Result<Size> {
            Ok(self.0)
        }

        fn render(&self, surface: &mut Surface<'_>) -> Result<()> {
            surface
                .canvas()
                .fill_rect(Rect::from_size(self.0), Color::BLACK);
            Ok(())
        }
    }

    fn fixed_box(tree: &mut BoxTree, w: f32, h: f32) -> BoxId {
        tree.add_image(std::sync::Arc::new(Fixed(Size::from_f32(w, h))))
    }

    fn spaced(tree: &mut BoxTree, id: BoxId) {
        let style = tree.style_mut(id).unwrap();
        style.set_margin(Spacing::uniform(Pt::from_i32(1)));
        style.set_border(Border::uniform(Pt::from_i32(2), Color::BLACK));
        style.set_padding(Spacing::uniform(Pt::from_i32(3)));
    }

    #[test]
    fn unrotated_measure_adds_all_insets() {
        let ctx = LayoutContext::new();
        let mut tree = BoxTree::new();
        let id = fixed_box(&mut tree, 40.0, 10.0);
        spaced(&mut tree, id);
        let content = tree.measure_content(id, &ctx).unwrap();
        assert_eq!(content, Size::from_f32(40.0, 10.0));
        let plain = tree.measure(id, &ctx).unwrap();
        assert_eq!(plain, Size::from_f32(52.0, 22.0));

        for anchor in ["right bottom", "50% 50%", "center"] {
            tree.style_mut(id).unwrap().set_rotation_anchor(anchor).unwrap();
            assert_eq!(tree.measure(id, &ctx).unwrap(), plain);
        }
    }

    #[test]
    fn explicit_size_is_a_minimum() {
        let ctx = LayoutContext::new();
        let mut tree = BoxTree::new();
        let id = fixed_box(&mut tree, 40.0, 10.0);
        let style = tree.style_mut(id).unwrap();
        style.set_width(Pt::from_i32(30));
        style.set_height(Pt::from_i32(25));
        assert_eq!(tree.measure(id, &ctx).unwrap(), Size::from_f32(40.0, 25.0));
    }

    #[test]
    fn quarter_turn_swaps_the_frame() {
        let ctx = LayoutContext::new();
        let mut tree = BoxTree::new();
        let id = fixed_box(&mut tree, 40.0, 10.0);
        tree.style_mut(id).unwrap().set_rotation(FRAC_PI_2);
        assert_eq!(tree.measure(id, &ctx).unwrap(), Size::from_f32(10.0, 40.0));
    }

    #[test]
    fn quarter_turn_is_exact_for_long_boxes() {
        let ctx = LayoutContext::new();
        let mut tree = BoxTree::new();
        for (w, h) in [(10.0, 100000.0), (3.0, 20000.0), (5000.0, 7.0)] {
            let id = fixed_box(&mut tree, w, h);
            tree.style_mut(id).unwrap().set_rotation(FRAC_PI_2);
            assert_eq!(tree.measure(id, &ctx).unwrap(), Size::from_f32(h, w));
        }
    }

    #[test]
    fn rotated_margin_is_added_after_rotation() {
        let ctx = LayoutContext::new();
        let mut tree = BoxTree::new();
        let id = fixed_box(&mut tree, 40.0, 10.0);
        let style = tree.style_mut(id).unwrap();
        style.set_rotation(FRAC_PI_2);
        style.set_margin(Spacing::uniform(Pt::from_i32(5)));
        assert_eq!(tree.measure(id, &ctx).unwrap(), Size::from_f32(20.0, 50.0));
    }

    #[test]
    fn render_paints_background_before_content_and_balances_state() {
        let ctx = LayoutContext::new();
        let mut tree = BoxTree::new();
        let id = fixed_box(&mut tree, 10.0, 10.0);
        spaced(&mut tree, id);
        tree.style_mut(id)
            .unwrap()
            .set_background_color(Color::WHITE);
        let size = tree.measure(id, &ctx).unwrap();
        let mut canvas = Canvas::new(size);
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            tree.render(id, &mut surface).unwrap();
        }
        let cmds = canvas.commands();
        let border_fill = cmds.iter().position(|c| *c == Command::FillEvenOdd).unwrap();
        let background = cmds
            .iter()
            .position(|c| *c == Command::SetFillColor(Color::WHITE))
            .unwrap();
        let content = cmds
            .iter()
            .rposition(|c| *c == Command::SetFillColor(Color::BLACK))
            .unwrap();
        assert!(border_fill < background);
        assert!(background < content);
        assert_eq!(canvas.state_depth(), 0);
    }

    #[test]
    fn rotated_render_pivots_about_the_anchor() {
        let ctx = LayoutContext::new();
        let mut tree = BoxTree::new();
        let id = fixed_box(&mut tree, 40.0, 10.0);
        let style = tree.style_mut(id).unwrap();
        style.set_rotation(FRAC_PI_2);
        style.set_rotation_anchor("50% 50%").unwrap();
        let mut canvas = Canvas::new(Size::from_f32(10.0, 40.0));
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            tree.render(id, &mut surface).unwrap();
        }
        let cmds = canvas.commands();
        let rotate = cmds
            .iter()
            .position(|c| *c == Command::Rotate(FRAC_PI_2))
            .unwrap();
        assert_eq!(
            cmds[rotate - 1],
            Command::Translate(Pt::from_i32(20), Pt::from_i32(5))
        );
        assert_eq!(
            cmds[rotate + 1],
            Command::Translate(Pt::from_i32(-20), Pt::from_i32(-5))
        );
    }

    #[test]
    fn invalid_anchor_fails_render_but_not_measure() {
        let ctx = LayoutContext::new();
        let mut tree = BoxTree::new();
        let id = fixed_box(&mut tree, 4.0, 4.0);
        let style = tree.style_mut(id).unwrap();
        style.set_rotation(0.5);
        style.rotation_anchor = "left middle".to_string();
        assert!(tree.measure(id, &ctx).is_ok());
        let mut canvas = Canvas::new(Size::from_f32(10.0, 10.0));
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            let err = tree.render(id, &mut surface).unwrap_err();
            assert_eq!(err.to_string(), "unknown rotation anchor keyword 'middle'");
        }
        assert_eq!(canvas.state_depth(), 0);
    }

    #[test]
    fn rounded_border_clips_content() {
        let ctx = LayoutContext::new();
        let mut tree = BoxTree::new();
        let id = fixed_box(&mut tree, 20.0, 20.0);
        tree.style_mut(id)
            .unwrap()
            .set_border(Border::uniform(Pt::from_i32(2), Color::BLACK).with_radius(Pt::from_i32(8)));
        let mut canvas = Canvas::new(Size::from_f32(24.0, 24.0));
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            tree.render(id, &mut surface).unwrap();
        }
        let clips = canvas
            .commands()
            .iter()
            .filter(|c| **c == Command::ClipPath { evenodd: false })
            .count();
        assert_eq!(clips, 2);
    }
}
