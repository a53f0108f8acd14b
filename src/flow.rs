use crate::context::LayoutContext;
use crate::error::{LayoutError, Result};
use crate::layout;
use crate::surface::Surface;
use crate::tree::{BoxId, BoxTree};
use crate::types::{Pt, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Container that lines up inline children and stacks block children.
#[derive(Debug, Clone, Default)]
pub struct FlowBox {
    pub alignment: FlowAlignment,
}

impl FlowBox {
    pub fn new(alignment: FlowAlignment) -> Self {
        Self { alignment }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlowLayout {
    pub placements: Vec<(BoxId, Rect)>,
    pub size: Size,
}

/// Places the children of `id`.
///
/// Inline children advance along the current line. A block child starts a
/// new line, is positioned per the alignment against the widest block child,
/// and the next child starts below it.
pub fn layout(tree: &BoxTree, id: BoxId, flow: &FlowBox, ctx: &LayoutContext) -> Result<FlowLayout> {
    if flow.alignment == FlowAlignment::Right {
        return Err(LayoutError::UnsupportedAlignment("right".to_string()));
    }
    let children = tree.children(id);

    let mut measured = Vec::with_capacity(children.len());
    let mut block_width = Pt::ZERO;
    for &child in children {
        let size = layout::measure(tree, child, ctx)?;
        let inline = tree.node(child)?.style().inline;
        if !inline {
            block_width = block_width.max(size.width);
        }
        measured.push((child, size, inline));
    }

    let mut placements = Vec::with_capacity(measured.len());
    let mut x = Pt::ZERO;
    let mut y = Pt::ZERO;
    let mut line_height = Pt::ZERO;
    for (child, size, inline) in measured {
        let rect = if inline {
            let rect = Rect::new(x, y, size.width, size.height);
            x += size.width;
            line_height = line_height.max(size.height);
            rect
        } else {
            y += line_height;
            line_height = Pt::ZERO;
            let left = match flow.alignment {
                FlowAlignment::Center => ((block_width - size.width) / 2).max(Pt::ZERO),
                _ => Pt::ZERO,
            };
            let rect = Rect::new(left, y, size.width, size.height);
            y += size.height;
            x = Pt::ZERO;
            rect
        };
        log::trace!(
            "flow {} placed child {} at ({}, {}) {}x{}",
            id.0,
            child.0,
            rect.x.to_f32(),
            rect.y.to_f32(),
            rect.width.to_f32(),
            rect.height.to_f32()
        );
        placements.push((child, rect));
    }

    let mut size = Size::ZERO;
    for (_, rect) in &placements {
        size.width = size.width.max(rect.right());
        size.height = size.height.max(rect.bottom());
    }
    Ok(FlowLayout { placements, size })
}

pub fn render(tree: &BoxTree, id: BoxId, flow: &FlowBox, surface: &mut Surface<'_>) -> Result<()> {
    let placed = layout(tree, id, flow, surface.context())?;
    for (child, rect) in placed.placements {
        let mut child_surface = surface.sub_surface(rect);
        layout::render(tree, child, &mut child_surface)?;
    }
    Ok(())
}
