use crate::context::LayoutContext;
use crate::error::{LayoutError, Result};
use crate::flow::{FlowAlignment, FlowBox};
use crate::image::{ImageBox, ImageRenderer};
use crate::layout;
use crate::style::BoxStyle;
use crate::surface::Surface;
use crate::table::{self, TableBox, TableCell, TableRow};
use crate::text::TextBox;
use crate::types::Size;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoxId(pub usize);

#[derive(Debug, Clone)]
pub enum BoxKind {
    Text(TextBox),
    Image(ImageBox),
    Break,
    Flow(FlowBox),
    Table(TableBox),
    TableRow(TableRow),
    TableCell(TableCell),
}

impl BoxKind {
    fn name(&self) -> &'static str {
        match self {
            BoxKind::Text(_) => "text",
            BoxKind::Image(_) => "image",
            BoxKind::Break => "break",
            BoxKind::Flow(_) => "flow",
            BoxKind::Table(_) => "table",
            BoxKind::TableRow(_) => "table row",
            BoxKind::TableCell(_) => "table cell",
        }
    }

    fn accepts(&self, child: &BoxKind, existing_children: usize) -> bool {
        let child_is_table_part = matches!(child, BoxKind::TableRow(_) | BoxKind::TableCell(_));
        match self {
            BoxKind::Text(_) | BoxKind::Image(_) | BoxKind::Break => false,
            BoxKind::Flow(_) => !child_is_table_part,
            BoxKind::Table(_) => matches!(child, BoxKind::TableRow(_)),
            BoxKind::TableRow(_) => matches!(child, BoxKind::TableCell(_)),
            BoxKind::TableCell(_) => !child_is_table_part && existing_children == 0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoxNode {
    parent: Option<BoxId>,
    children: Vec<BoxId>,
    style: BoxStyle,
    kind: BoxKind,
}

impl BoxNode {
    pub fn parent(&self) -> Option<BoxId> {
        self.parent
    }

    pub fn children(&self) -> &[BoxId] {
        &self.children
    }

    pub fn style(&self) -> &BoxStyle {
        &self.style
    }

    pub fn kind(&self) -> &BoxKind {
        &self.kind
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoxTree {
    nodes: Vec<BoxNode>,
}

impl BoxTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add_box(&mut self, style: BoxStyle, kind: BoxKind) -> BoxId {
        let id = BoxId(self.nodes.len());
        self.nodes.push(BoxNode {
            parent: None,
            children: Vec::new(),
            style,
            kind,
        });
        id
    }

    /// Inline text leaf without margin, border or padding.
    pub fn add_text(&mut self, text: impl Into<String>) -> BoxId {
        let mut style = BoxStyle::unspaced();
        style.inline = true;
        self.add_box(style, BoxKind::Text(TextBox::new(text)))
    }

    pub fn add_image(&mut self, renderer: Arc<dyn ImageRenderer>) -> BoxId {
        let style = BoxStyle {
            inline: true,
            ..BoxStyle::default()
        };
        self.add_box(style, BoxKind::Image(ImageBox::new(renderer)))
    }

    /// Block-level zero-size leaf that forces a new line in a flow.
    pub fn add_break(&mut self) -> BoxId {
        self.add_box(BoxStyle::unspaced(), BoxKind::Break)
    }

    pub fn add_flow(&mut self, alignment: FlowAlignment) -> BoxId {
        self.add_box(BoxStyle::default(), BoxKind::Flow(FlowBox::new(alignment)))
    }

    pub fn add_table(&mut self) -> BoxId {
        self.add_box(BoxStyle::default(), BoxKind::Table(TableBox::default()))
    }

    pub fn add_row(&mut self) -> BoxId {
        self.add_box(BoxStyle::default(), BoxKind::TableRow(TableRow))
    }

    pub fn add_cell(&mut self) -> BoxId {
        self.add_box(BoxStyle::default(), BoxKind::TableCell(TableCell::default()))
    }

    /// Attaches `child` as the last child of `parent`.
    ///
    /// Tables take rows, rows take cells, a cell takes one content box and
    /// leaves take nothing. A box can have only one parent.
    pub fn append_child(&mut self, parent: BoxId, child: BoxId) -> Result<()> {
        let child_node = self.node(child)?;
        if child_node.parent.is_some() {
            return Err(LayoutError::InvalidConfiguration(format!(
                "box {} already has a parent",
                child.0
            )));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(LayoutError::InvalidConfiguration(format!(
                "box {} cannot contain its own ancestor {}",
                parent.0, child.0
            )));
        }
        let parent_node = self.node(parent)?;
        if !parent_node
            .kind
            .accepts(&child_node.kind, parent_node.children.len())
        {
            return Err(LayoutError::InvalidConfiguration(format!(
                "a {} box cannot contain a {} box",
                parent_node.kind.name(),
                child_node.kind.name()
            )));
        }
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: BoxId, mut id: BoxId) -> bool {
        loop {
            if id == candidate {
                return true;
            }
            match self.nodes.get(id.0).and_then(|node| node.parent) {
                Some(parent) => id = parent,
                None => return false,
            }
        }
    }

    pub fn get(&self, id: BoxId) -> Option<&BoxNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node(&self, id: BoxId) -> Result<&BoxNode> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| LayoutError::InvalidConfiguration(format!("unknown box {}", id.0)))
    }

    pub fn parent(&self, id: BoxId) -> Option<BoxId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: BoxId) -> &[BoxId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn style(&self, id: BoxId) -> Option<&BoxStyle> {
        self.get(id).map(|node| &node.style)
    }

    pub fn style_mut(&mut self, id: BoxId) -> Option<&mut BoxStyle> {
        self.nodes.get_mut(id.0).map(|node| &mut node.style)
    }

    pub fn kind(&self, id: BoxId) -> Option<&BoxKind> {
        self.get(id).map(|node| &node.kind)
    }

    pub fn kind_mut(&mut self, id: BoxId) -> Option<&mut BoxKind> {
        self.nodes.get_mut(id.0).map(|node| &mut node.kind)
    }

    pub fn table_mut(&mut self, id: BoxId) -> Option<&mut TableBox> {
        match self.kind_mut(id) {
            Some(BoxKind::Table(table)) => Some(table),
            _ => None,
        }
    }

    pub fn cell_mut(&mut self, id: BoxId) -> Option<&mut TableCell> {
        match self.kind_mut(id) {
            Some(BoxKind::TableCell(cell)) => Some(cell),
            _ => None,
        }
    }

    pub fn flow_mut(&mut self, id: BoxId) -> Option<&mut FlowBox> {
        match self.kind_mut(id) {
            Some(BoxKind::Flow(flow)) => Some(flow),
            _ => None,
        }
    }

    /// Content size plus padding, border and margin, with rotation applied.
    pub fn measure(&mut self, id: BoxId, ctx: &LayoutContext) -> Result<Size> {
        self.prepare(id)?;
        layout::measure(self, id, ctx)
    }

    pub fn measure_content(&mut self, id: BoxId, ctx: &LayoutContext) -> Result<Size> {
        self.prepare(id)?;
        layout::measure_content(self, id, ctx)
    }

    /// Paints the subtree at the surface origin.
    pub fn render(&mut self, id: BoxId, surface: &mut Surface<'_>) -> Result<()> {
        self.prepare(id)?;
        layout::render(self, id, surface)
    }

    /// Applies pending border-collapse to every table in the subtree. Each
    /// table collapses at most once.
    fn prepare(&mut self, id: BoxId) -> Result<()> {
        let mut pending = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.node(current)?;
            if let BoxKind::Table(table) = &node.kind {
                if table.border_collapse && !table.is_collapsed() {
                    pending.push(current);
                }
            }
            stack.extend(node.children.iter().rev().copied());
        }
        for table_id in pending {
            table::collapse_borders(self, table_id)?;
            if let Some(table) = self.table_mut(table_id) {
                table.mark_collapsed();
            }
        }
        Ok(())
    }
}
