mod background;
mod canvas;
mod context;
mod error;
mod flow;
mod font;
mod geometry;
mod image;
mod layout;
mod raster;
mod spacing;
mod style;
mod surface;
mod table;
mod text;
mod tree;
mod types;

pub use crate::image::{BitmapImage, ImageBox, ImageRenderer};
pub use background::{
    AutoSize, Background, BackgroundOverlay, BackgroundPosition, BackgroundSize, ContainSize,
    CoverSize, ExplicitSize, SizeValue, Texture, parse_background_size,
};
pub use canvas::{Canvas, Command, Document, ImagePixels};
pub use context::{FONT_DIR_ENV, LayoutConfig, LayoutContext};
pub use error::{LayoutError, Result};
pub use flow::{FlowAlignment, FlowBox, FlowLayout};
pub use font::{FontManager, FontStyle, Typeface};
pub use geometry::{
    ArcCurve, Bounds, CircularPlacement, Path, PathSegment, arc_span, arc_to_bezier,
    circular_placements, deg_to_rad, rad_to_deg, rotated_bounds,
};
pub use raster::{render_to_pixmap, render_to_png};
pub use spacing::{Border, Inset, Spacing};
pub use style::{BoxStyle, CascadeData, DEFAULT_ROTATION_ANCHOR, FontSpec, RotationAnchor};
pub use surface::Surface;
pub use table::{
    CellPlacement, HorizontalAlign, TableBox, TableCell, TableGrid, TableMetrics, TableRow,
    VerticalAlign, collapse_borders,
};
pub use text::{
    SimpleShaper, TextBlock, TextBox, TextLine, TextPaint, TextShaper, draw_text_on_circle,
};
pub use tree::{BoxId, BoxKind, BoxNode, BoxTree};
pub use types::{Color, Pt, Rect, Shading, ShadingStop, Size};

/// Measures `root` and paints it onto a canvas of exactly that size.
pub fn render_tree(tree: &mut BoxTree, root: BoxId, ctx: &LayoutContext) -> Result<Document> {
    let size = tree.measure(root, ctx)?;
    let mut canvas = Canvas::new(size);
    {
        let mut surface = Surface::new(&mut canvas, ctx);
        tree.render(root, &mut surface)?;
    }
    log::debug!(
        "rendered box {} at {}x{} ({} commands)",
        root.0,
        size.width.to_f32(),
        size.height.to_f32(),
        canvas.commands().len()
    );
    Ok(canvas.finish())
}

/// [`render_tree`] followed by rasterization; `scale` is pixels per point.
pub fn render_tree_to_png(
    tree: &mut BoxTree,
    root: BoxId,
    ctx: &LayoutContext,
    scale: f32,
) -> Result<Vec<u8>> {
    let document = render_tree(tree, root, ctx)?;
    render_to_png(&document, scale, ctx.fonts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgba, RgbaImage};
    use std::f32::consts::FRAC_PI_2;
    use std::sync::Arc;

    const RED: Color = Color {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };

    fn sized_flow(tree: &mut BoxTree, width: i32, height: i32) -> BoxId {
        let flow = tree.add_flow(FlowAlignment::Left);
        let style = tree.style_mut(flow).unwrap();
        style.set_width(Pt::from_i32(width));
        style.set_height(Pt::from_i32(height));
        flow
    }

    fn solid(id: &str, width: u32, height: u32, rgba: [u8; 4]) -> Arc<BitmapImage> {
        Arc::new(BitmapImage::from_pixels(
            id,
            RgbaImage::from_pixel(width, height, Rgba(rgba)),
        ))
    }

    fn rgb(pixmap: &tiny_skia::Pixmap, x: u32, y: u32) -> [u8; 3] {
        let px = pixmap.pixel(x, y).unwrap();
        [px.red(), px.green(), px.blue()]
    }

    #[test]
    fn background_color_fills_the_box() {
        let mut tree = BoxTree::new();
        let root = sized_flow(&mut tree, 20, 10);
        tree.style_mut(root).unwrap().set_background_color(RED);
        let ctx = LayoutContext::new();

        let document = render_tree(&mut tree, root, &ctx).unwrap();
        assert_eq!(document.size, Size::from_f32(20.0, 10.0));
        let pixmap = render_to_pixmap(&document, 1.0, ctx.fonts()).unwrap();
        assert_eq!(rgb(&pixmap, 10, 5), [255, 0, 0]);

        let png = render_tree_to_png(&mut tree, root, &ctx, 2.0).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn painted_border_surrounds_content() {
        let mut tree = BoxTree::new();
        let root = sized_flow(&mut tree, 20, 10);
        tree.style_mut(root)
            .unwrap()
            .set_border(Border::uniform(Pt::from_i32(2), Color::BLACK));
        let ctx = LayoutContext::new();

        let document = render_tree(&mut tree, root, &ctx).unwrap();
        assert_eq!(document.size, Size::from_f32(24.0, 14.0));
        let pixmap = render_to_pixmap(&document, 1.0, ctx.fonts()).unwrap();
        assert_eq!(rgb(&pixmap, 0, 7), [0, 0, 0]);
        assert_eq!(rgb(&pixmap, 12, 0), [0, 0, 0]);
        assert_eq!(rgb(&pixmap, 12, 7), [255, 255, 255]);
    }

    #[test]
    fn table_cells_paint_side_by_side() {
        let mut tree = BoxTree::new();
        let table = tree.add_table();
        let row = tree.add_row();
        tree.append_child(table, row).unwrap();
        for image in [solid("red", 10, 5, [255, 0, 0, 255]), solid("blue", 6, 5, [0, 0, 255, 255])] {
            let cell = tree.add_cell();
            let leaf = tree.add_image(image);
            tree.append_child(row, cell).unwrap();
            tree.append_child(cell, leaf).unwrap();
        }
        let ctx = LayoutContext::new();

        let document = render_tree(&mut tree, table, &ctx).unwrap();
        assert_eq!(document.size, Size::from_f32(16.0, 5.0));
        assert_eq!(document.images.len(), 2);
        let pixmap = render_to_pixmap(&document, 1.0, ctx.fonts()).unwrap();
        let [r, _, b] = rgb(&pixmap, 4, 2);
        assert!(r > 250 && b < 5);
        let [r, _, b] = rgb(&pixmap, 13, 2);
        assert!(r < 5 && b > 250);
    }

    #[test]
    fn rotated_root_swaps_the_document_size() {
        let mut tree = BoxTree::new();
        let root = sized_flow(&mut tree, 40, 10);
        {
            let style = tree.style_mut(root).unwrap();
            style.set_rotation(FRAC_PI_2);
            style.set_background_color(RED);
        }
        let ctx = LayoutContext::new();

        let document = render_tree(&mut tree, root, &ctx).unwrap();
        assert_eq!(document.size, Size::from_f32(10.0, 40.0));
        let pixmap = render_to_pixmap(&document, 1.0, ctx.fonts()).unwrap();
        assert_eq!(rgb(&pixmap, 5, 30), [255, 0, 0]);
    }

    #[test]
    fn text_records_one_string_per_line() {
        let mut tree = BoxTree::new();
        let root = tree.add_flow(FlowAlignment::Left);
        let text = tree.add_text("first\nsecond");
        tree.append_child(root, text).unwrap();
        let ctx = LayoutContext::new();

        let document = render_tree(&mut tree, root, &ctx).unwrap();
        let strings: Vec<&str> = document
            .commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::DrawString { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(strings, vec!["first", "second"]);
        let saves = document
            .commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::SaveState))
            .count();
        let restores = document
            .commands
            .iter()
            .filter(|cmd| matches!(cmd, Command::RestoreState))
            .count();
        assert_eq!(saves, restores);
    }

    #[test]
    fn empty_root_cannot_be_rasterized() {
        let mut tree = BoxTree::new();
        let root = tree.add_flow(FlowAlignment::Left);
        let ctx = LayoutContext::new();
        let document = render_tree(&mut tree, root, &ctx).unwrap();
        assert_eq!(document.size, Size::ZERO);
        assert!(render_tree_to_png(&mut tree, root, &ctx, 1.0).is_err());
    }
}
