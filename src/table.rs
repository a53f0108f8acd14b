use crate::context::LayoutContext;
use crate::error::{LayoutError, Result};
use crate::layout;
use crate::surface::Surface;
use crate::tree::{BoxId, BoxKind, BoxTree};
use crate::types::{Pt, Rect, Size};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Default)]
pub struct TableBox {
    pub border_collapse: bool,
    collapsed: bool,
}

impl TableBox {
    pub fn new(border_collapse: bool) -> Self {
        Self {
            border_collapse,
            collapsed: false,
        }
    }

    /// Whether border-collapse has already rewritten the cell spacing.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    pub(crate) fn mark_collapsed(&mut self) {
        self.collapsed = true;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TableRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerticalAlign {
    Top,
    #[default]
    Center,
    Bottom,
}

/// A grid cell. A span of 0 reaches the last column or row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCell {
    pub colspan: usize,
    pub rowspan: usize,
    pub h_align: HorizontalAlign,
    pub v_align: VerticalAlign,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            colspan: 1,
            rowspan: 1,
            h_align: HorizontalAlign::default(),
            v_align: VerticalAlign::default(),
        }
    }
}

/// Where one cell landed in the grid, spans already resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPlacement {
    pub cell: BoxId,
    pub row: usize,
    pub column: usize,
    pub rowspan: usize,
    pub colspan: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableGrid {
    rows: usize,
    columns: usize,
    slots: Vec<Vec<Option<BoxId>>>,
    placements: Vec<CellPlacement>,
}

impl TableGrid {
    /// Places every cell of every row left to right, skipping slots that a
    /// cell from an earlier row already spans into.
    pub fn build(tree: &BoxTree, table: BoxId) -> Result<Self> {
        let rows = table_rows(tree, table)?;
        let mut cells = Vec::with_capacity(rows.len());
        for &row in &rows {
            let mut row_cells = Vec::new();
            for &cell_id in tree.children(row) {
                if let BoxKind::TableCell(cell) = tree.node(cell_id)?.kind() {
                    row_cells.push((cell_id, *cell));
                }
            }
            cells.push(row_cells);
        }

        // A zero colspan needs the column count, so count columns first with
        // zero colspans treated as one.
        let provisional = Self::place(&cells, None);
        let columns = provisional.columns;
        let grid = Self::place(&cells, Some(columns));
        log::debug!(
            "table {} grid: {} rows x {} columns, {} cells",
            table.0,
            grid.rows,
            grid.columns,
            grid.placements.len()
        );
        Ok(grid)
    }

    fn place(cells: &[Vec<(BoxId, TableCell)>], known_columns: Option<usize>) -> Self {
        let rows = cells.len();
        let mut slots: Vec<Vec<Option<BoxId>>> = vec![Vec::new(); rows];
        let mut placements = Vec::new();
        for (row, row_cells) in cells.iter().enumerate() {
            let mut column = 0usize;
            for &(cell_id, cell) in row_cells {
                while slots[row].get(column).is_some_and(Option::is_some) {
                    column += 1;
                }
                let colspan = match (cell.colspan, known_columns) {
                    (0, Some(columns)) => columns.saturating_sub(column).max(1),
                    (0, None) => 1,
                    (span, _) => span,
                };
                let rowspan = match cell.rowspan {
                    0 => rows - row,
                    span => span.min(rows - row),
                };
                for covered in &mut slots[row..row + rowspan] {
                    if covered.len() < column + colspan {
                        covered.resize(column + colspan, None);
                    }
                    for slot in &mut covered[column..column + colspan] {
                        *slot = Some(cell_id);
                    }
                }
                placements.push(CellPlacement {
                    cell: cell_id,
                    row,
                    column,
                    rowspan,
                    colspan,
                });
                column += colspan;
            }
        }
        let columns = slots.iter().map(Vec::len).max().unwrap_or(0);
        Self {
            rows,
            columns,
            slots,
            placements,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Owning cell of a grid slot.
    pub fn cell_at(&self, row: usize, column: usize) -> Option<BoxId> {
        self.slots.get(row)?.get(column).copied().flatten()
    }

    /// One entry per cell, in row then column order.
    pub fn placements(&self) -> &[CellPlacement] {
        &self.placements
    }
}

fn table_rows(tree: &BoxTree, table: BoxId) -> Result<Vec<BoxId>> {
    let node = tree.node(table)?;
    if !matches!(node.kind(), BoxKind::Table(_)) {
        return Err(LayoutError::InvalidConfiguration(format!(
            "box {} is not a table",
            table.0
        )));
    }
    let mut rows = Vec::new();
    for &child in node.children() {
        if matches!(tree.node(child)?.kind(), BoxKind::TableRow(_)) {
            rows.push(child);
        }
    }
    Ok(rows)
}

/// Resolved column widths and row heights for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct TableMetrics {
    pub grid: TableGrid,
    pub column_widths: Vec<Pt>,
    pub row_heights: Vec<Pt>,
}

impl TableMetrics {
    pub fn compute(tree: &BoxTree, table: BoxId, ctx: &LayoutContext) -> Result<Self> {
        let grid = TableGrid::build(tree, table)?;
        let mut minimums: HashMap<BoxId, Size> = HashMap::with_capacity(grid.placements.len());
        for placement in &grid.placements {
            let size = layout::measure(tree, placement.cell, ctx)?;
            minimums.insert(placement.cell, size);
        }
        let min_of = |cell: BoxId| minimums.get(&cell).copied().unwrap_or(Size::ZERO);

        let column_widths = resolve_track_sizes(
            grid.columns,
            &grid.placements,
            |p| (p.column, p.colspan),
            |p| min_of(p.cell).width,
        );
        let row_heights = resolve_track_sizes(
            grid.rows,
            &grid.placements,
            |p| (p.row, p.rowspan),
            |p| min_of(p.cell).height,
        );
        log::debug!(
            "table {} column widths {:?} row heights {:?}",
            table.0,
            column_widths.iter().map(|w| w.to_f32()).collect::<Vec<_>>(),
            row_heights.iter().map(|h| h.to_f32()).collect::<Vec<_>>()
        );
        Ok(Self {
            grid,
            column_widths,
            row_heights,
        })
    }

    pub fn size(&self) -> Size {
        Size::new(
            self.column_widths.iter().sum(),
            self.row_heights.iter().sum(),
        )
    }

    /// Pixel rectangle covered by a placed cell.
    pub fn cell_rect(&self, placement: &CellPlacement) -> Rect {
        let (x, width) = span_extent(&self.column_widths, placement.column, placement.colspan);
        let (y, height) = span_extent(&self.row_heights, placement.row, placement.rowspan);
        Rect::new(x, y, width, height)
    }
}

fn span_extent(sizes: &[Pt], start: usize, span: usize) -> (Pt, Pt) {
    let start = start.min(sizes.len());
    let end = start.saturating_add(span).min(sizes.len());
    let offset: Pt = sizes[..start].iter().sum();
    let extent: Pt = sizes[start..end].iter().sum();
    (offset, extent)
}

/// Sizes the tracks (columns or rows) of one axis.
///
/// Single-span cells set a floor on their own track first. Spanning cells
/// then top up any shortfall across their span.
fn resolve_track_sizes(
    count: usize,
    placements: &[CellPlacement],
    span_of: impl Fn(&CellPlacement) -> (usize, usize),
    min_of: impl Fn(&CellPlacement) -> Pt,
) -> Vec<Pt> {
    let mut tracks = vec![0i64; count];
    for placement in placements {
        let (start, span) = span_of(placement);
        if span == 1 && start < count {
            let required = min_of(placement).to_milli_i64();
            tracks[start] = tracks[start].max(required);
        }
    }

    let mut processed: HashSet<BoxId> = HashSet::new();
    for placement in placements {
        let (start, span) = span_of(placement);
        if span <= 1 || !processed.insert(placement.cell) {
            continue;
        }
        distribute_shortfall(&mut tracks, start, span, min_of(placement).to_milli_i64());
    }

    tracks.into_iter().map(Pt::from_milli_i64).collect()
}

/// Grows `tracks[start..start + span]` until they sum to `required`.
///
/// Each track takes the remaining shortfall divided by the tracks still
/// left, rounded up, so earlier tracks absorb any remainder.
fn distribute_shortfall(tracks: &mut [i64], start: usize, span: usize, required: i64) {
    if start >= tracks.len() {
        return;
    }
    let end = start.saturating_add(span).min(tracks.len());
    let current: i64 = tracks[start..end].iter().sum();
    let mut shortfall = required - current;
    if shortfall <= 0 {
        return;
    }
    let mut remaining = (end - start) as i64;
    for track in &mut tracks[start..end] {
        let increment = (shortfall + remaining - 1) / remaining;
        *track += increment;
        shortfall -= increment;
        remaining -= 1;
    }
}

pub fn measure_table(tree: &BoxTree, table: BoxId, ctx: &LayoutContext) -> Result<Size> {
    Ok(TableMetrics::compute(tree, table, ctx)?.size())
}

pub fn render_table(tree: &BoxTree, table: BoxId, surface: &mut Surface<'_>) -> Result<()> {
    let metrics = TableMetrics::compute(tree, table, surface.context())?;
    let mut rendered: HashSet<BoxId> = HashSet::new();
    for placement in metrics.grid.placements() {
        if !rendered.insert(placement.cell) {
            continue;
        }
        let rect = metrics.cell_rect(placement);
        let mut cell_surface = surface.sub_surface(rect);
        layout::render(tree, placement.cell, &mut cell_surface)?;
    }
    Ok(())
}

/// A row measured on its own lays its cells out left to right.
pub fn measure_row(tree: &BoxTree, row: BoxId, ctx: &LayoutContext) -> Result<Size> {
    let mut size = Size::ZERO;
    for &cell in tree.children(row) {
        let cell_size = layout::measure(tree, cell, ctx)?;
        size.width += cell_size.width;
        size.height = size.height.max(cell_size.height);
    }
    Ok(size)
}

pub fn render_row(tree: &BoxTree, row: BoxId, surface: &mut Surface<'_>) -> Result<()> {
    let height = surface.bounds().height;
    let mut x = Pt::ZERO;
    for &cell in tree.children(row) {
        let width = layout::measure(tree, cell, surface.context())?.width;
        let mut cell_surface = surface.sub_surface(Rect::new(x, Pt::ZERO, width, height));
        layout::render(tree, cell, &mut cell_surface)?;
        x += width;
    }
    Ok(())
}

fn cell_content(tree: &BoxTree, cell: BoxId) -> Option<BoxId> {
    tree.children(cell).first().copied()
}

pub fn measure_cell_content(tree: &BoxTree, cell: BoxId, ctx: &LayoutContext) -> Result<Size> {
    match cell_content(tree, cell) {
        Some(content) => layout::measure(tree, content, ctx),
        None => Ok(Size::ZERO),
    }
}

/// Places the cell's content inside the allotted area per its alignment.
pub fn render_cell_content(
    tree: &BoxTree,
    cell: BoxId,
    config: &TableCell,
    surface: &mut Surface<'_>,
) -> Result<()> {
    let Some(content) = cell_content(tree, cell) else {
        return Ok(());
    };
    let available = surface.bounds();
    let size = layout::measure(tree, content, surface.context())?;
    let slack_x = (available.width - size.width).max(Pt::ZERO);
    let slack_y = (available.height - size.height).max(Pt::ZERO);
    let x = match config.h_align {
        HorizontalAlign::Left => Pt::ZERO,
        HorizontalAlign::Center => slack_x / 2,
        HorizontalAlign::Right => slack_x,
    };
    let y = match config.v_align {
        VerticalAlign::Top => Pt::ZERO,
        VerticalAlign::Center => slack_y / 2,
        VerticalAlign::Bottom => slack_y,
    };
    let mut content_surface = surface.sub_surface(Rect::new(x, y, size.width, size.height));
    layout::render(tree, content, &mut content_surface)
}

/// Removes duplicate borders at inner grid lines.
///
/// The table loses its border and padding; every cell loses its margin, its
/// top border unless it sits in the first row, and its left border unless it
/// sits in the first column. Running it again changes nothing.
pub fn collapse_borders(tree: &mut BoxTree, table: BoxId) -> Result<()> {
    let grid = TableGrid::build(tree, table)?;
    if let Some(style) = tree.style_mut(table) {
        style.border.spacing_mut().clear();
        style.border.set_radius(Pt::ZERO);
        style.padding.clear();
    }

    let mut collapsed: HashSet<BoxId> = HashSet::new();
    for placement in grid.placements() {
        if !collapsed.insert(placement.cell) {
            continue;
        }
        let Some(style) = tree.style_mut(placement.cell) else {
            continue;
        };
        style.margin.clear();
        if placement.row != 0 {
            style.border.spacing_mut().set_top(Pt::ZERO);
        }
        if placement.column != 0 {
            style.border.spacing_mut().set_left(Pt::ZERO);
        }
    }
    log::debug!(
        "table {} border-collapse applied to {} cells",
        table.0,
        collapsed.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, Command};
    use crate::image::{ImageBox, ImageRenderer};
    use crate::spacing::{Border, Inset, Spacing};
    use crate::style::BoxStyle;
    use crate::types::Color;
    use std::sync::Arc;

    #[derive(Debug)]
    struct Fixed(Size);

    impl ImageRenderer for Fixed {
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

    struct Builder {
        tree: BoxTree,
        table: BoxId,
    }

    impl Builder {
        fn new() -> Self {
            let mut tree = BoxTree::new();
            let table = tree.add_table();
            Self { tree, table }
        }

        fn row(&mut self) -> BoxId {
            let row = self.tree.add_row();
            self.tree.append_child(self.table, row).unwrap();
            row
        }

        fn cell(&mut self, row: BoxId, w: f32, h: f32, colspan: usize, rowspan: usize) -> BoxId {
            let cell = self.tree.add_cell();
            let config = self.tree.cell_mut(cell).unwrap();
            config.colspan = colspan;
            config.rowspan = rowspan;
            let style = BoxStyle {
                inline: true,
                ..BoxStyle::default()
            };
            let content = self.tree.add_box(
                style,
                BoxKind::Image(ImageBox::new(Arc::new(Fixed(Size::from_f32(w, h))))),
            );
            self.tree.append_child(cell, content).unwrap();
            self.tree.append_child(row, cell).unwrap();
            cell
        }

        fn metrics(&self) -> TableMetrics {
            TableMetrics::compute(&self.tree, self.table, &LayoutContext::new()).unwrap()
        }
    }

    #[test]
    fn spanning_cell_shortfall_goes_to_earlier_columns() {
        let mut t = Builder::new();
        let r0 = t.row();
        t.cell(r0, 10.0, 5.0, 1, 1);
        t.cell(r0, 10.0, 5.0, 1, 1);
        let r1 = t.row();
        t.cell(r1, 20.005, 5.0, 2, 1);
        let metrics = t.metrics();
        assert_eq!(
            metrics.column_widths,
            vec![Pt::from_milli_i64(10_003), Pt::from_milli_i64(10_002)]
        );
        let total: Pt = metrics.column_widths.iter().sum();
        assert_eq!(total, Pt::from_milli_i64(20_005));
    }

    #[test]
    fn spanning_cell_that_fits_changes_nothing() {
        let mut t = Builder::new();
        let r0 = t.row();
        t.cell(r0, 10.0, 5.0, 1, 1);
        t.cell(r0, 12.0, 5.0, 1, 1);
        let r1 = t.row();
        t.cell(r1, 15.0, 5.0, 2, 1);
        assert_eq!(
            t.metrics().column_widths,
            vec![Pt::from_i32(10), Pt::from_i32(12)]
        );
    }

    #[test]
    fn distribution_matches_sequential_ceiling_division() {
        let mut tracks = vec![0i64, 0, 0];
        distribute_shortfall(&mut tracks, 0, 3, 10);
        assert_eq!(tracks, vec![4, 3, 3]);
        let mut tracks = vec![5i64, 0, 0, 7];
        distribute_shortfall(&mut tracks, 1, 2, 5);
        assert_eq!(tracks, vec![5, 3, 2, 7]);
    }

    #[test]
    fn zero_colspan_reaches_the_last_column() {
        let mut t = Builder::new();
        let r0 = t.row();
        for _ in 0..3 {
            t.cell(r0, 5.0, 5.0, 1, 1);
        }
        let r1 = t.row();
        let wide = t.cell(r1, 5.0, 5.0, 0, 1);
        let grid = TableGrid::build(&t.tree, t.table).unwrap();
        assert_eq!(grid.columns(), 3);
        for column in 0..3 {
            assert_eq!(grid.cell_at(1, column), Some(wide));
        }
        let placement = grid.placements().iter().find(|p| p.cell == wide).unwrap();
        assert_eq!((placement.column, placement.colspan), (0, 3));
    }

    #[test]
    fn zero_rowspan_reaches_the_last_row() {
        let mut t = Builder::new();
        let r0 = t.row();
        let tall = t.cell(r0, 5.0, 5.0, 1, 0);
        t.cell(r0, 5.0, 5.0, 1, 1);
        let mut rows = vec![r0];
        for _ in 0..3 {
            let row = t.row();
            t.cell(row, 5.0, 5.0, 1, 1);
            rows.push(row);
        }
        let grid = TableGrid::build(&t.tree, t.table).unwrap();
        assert_eq!(grid.rows(), 4);
        for row in 0..4 {
            assert_eq!(grid.cell_at(row, 0), Some(tall));
        }
        // later rows skip the slot the tall cell already owns
        let placement = grid
            .placements()
            .iter()
            .find(|p| p.row == 3)
            .unwrap();
        assert_eq!(placement.column, 1);
    }

    #[test]
    fn zero_spans_follow_the_current_grid() {
        let mut t = Builder::new();
        let r0 = t.row();
        t.cell(r0, 5.0, 5.0, 1, 1);
        t.cell(r0, 5.0, 5.0, 1, 1);
        let r1 = t.row();
        let wide = t.cell(r1, 5.0, 5.0, 0, 1);
        assert_eq!(TableGrid::build(&t.tree, t.table).unwrap().columns(), 2);
        t.cell(r0, 5.0, 5.0, 1, 1);
        let grid = TableGrid::build(&t.tree, t.table).unwrap();
        assert_eq!(grid.cell_at(1, 2), Some(wide));
    }

    #[test]
    fn border_collapse_is_idempotent() {
        let mut t = Builder::new();
        let r0 = t.row();
        let a = t.cell(r0, 5.0, 5.0, 1, 1);
        let b = t.cell(r0, 5.0, 5.0, 1, 1);
        let r1 = t.row();
        let c = t.cell(r1, 5.0, 5.0, 1, 1);
        let d = t.cell(r1, 5.0, 5.0, 1, 1);
        for id in [t.table, a, b, c, d] {
            let style = t.tree.style_mut(id).unwrap();
            style.set_margin(Spacing::uniform(Pt::from_i32(2)));
            style.set_border(Border::uniform(Pt::from_i32(1), Color::BLACK));
            style.set_padding(Spacing::uniform(Pt::from_i32(3)));
        }

        collapse_borders(&mut t.tree, t.table).unwrap();
        let snapshot = |tree: &BoxTree| {
            [t.table, a, b, c, d]
                .iter()
                .map(|id| {
                    let style = tree.style(*id).unwrap();
                    (style.margin.clone(), style.border.clone(), style.padding.clone())
                })
                .collect::<Vec<_>>()
        };
        let first = snapshot(&t.tree);
        collapse_borders(&mut t.tree, t.table).unwrap();
        assert_eq!(snapshot(&t.tree), first);

        let table_style = t.tree.style(t.table).unwrap();
        assert_eq!(table_style.padding.horizontal(), Pt::ZERO);
        let d_border = t.tree.style(d).unwrap().border.spacing();
        assert_eq!(d_border.top(), Pt::ZERO);
        assert_eq!(d_border.left(), Pt::ZERO);
        assert_eq!(d_border.right(), Pt::from_i32(1));
        let a_border = t.tree.style(a).unwrap().border.spacing();
        assert_eq!(a_border.top(), Pt::from_i32(1));
        assert_eq!(a_border.left(), Pt::from_i32(1));
        assert_eq!(t.tree.style(b).unwrap().border.spacing().left(), Pt::ZERO);
        assert_eq!(t.tree.style(c).unwrap().border.spacing().top(), Pt::ZERO);
        assert_eq!(t.tree.style(a).unwrap().margin.horizontal(), Pt::ZERO);
    }

    #[test]
    fn measuring_applies_pending_collapse_once() {
        let mut t = Builder::new();
        let r0 = t.row();
        let a = t.cell(r0, 5.0, 5.0, 1, 1);
        let b = t.cell(r0, 5.0, 5.0, 1, 1);
        for id in [a, b] {
            t.tree
                .style_mut(id)
                .unwrap()
                .set_border(Border::uniform(Pt::from_i32(1), Color::BLACK));
        }
        t.tree.table_mut(t.table).unwrap().border_collapse = true;
        let ctx = LayoutContext::new();
        let size = t.tree.measure_content(t.table, &ctx).unwrap();
        // a: 1 + 5 + 1, b: 5 + 1 (left border collapsed)
        assert_eq!(size, Size::from_f32(13.0, 7.0));
        assert!(t.tree.table_mut(t.table).unwrap().is_collapsed());
        assert_eq!(t.tree.measure_content(t.table, &ctx).unwrap(), size);
    }

    #[test]
    fn render_places_spanning_cells_by_prefix_sums() {
        let mut t = Builder::new();
        let r0 = t.row();
        t.cell(r0, 10.0, 4.0, 1, 1);
        t.cell(r0, 20.0, 4.0, 1, 1);
        let r1 = t.row();
        let wide = t.cell(r1, 5.0, 6.0, 2, 1);
        let metrics = t.metrics();
        let placement = metrics
            .grid
            .placements()
            .iter()
            .find(|p| p.cell == wide)
            .copied()
            .unwrap();
        assert_eq!(
            metrics.cell_rect(&placement),
            Rect::from_f32(0.0, 4.0, 30.0, 6.0)
        );

        let ctx = LayoutContext::new();
        let size = t.tree.measure(t.table, &ctx).unwrap();
        let mut canvas = Canvas::new(size);
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            t.tree.render(t.table, &mut surface).unwrap();
        }
        assert!(canvas.commands().contains(&Command::ClipRect {
            x: Pt::ZERO,
            y: Pt::ZERO,
            width: Pt::from_i32(30),
            height: Pt::from_i32(6),
        }));
        assert_eq!(canvas.state_depth(), 0);
    }

    #[test]
    fn cell_content_is_aligned_within_its_area() {
        let mut t = Builder::new();
        let r0 = t.row();
        let small = t.cell(r0, 4.0, 2.0, 1, 1);
        t.cell(r0, 4.0, 10.0, 1, 1);
        let r1 = t.row();
        t.cell(r1, 20.0, 2.0, 2, 1);
        {
            let config = t.tree.cell_mut(small).unwrap();
            config.h_align = HorizontalAlign::Right;
            config.v_align = VerticalAlign::Bottom;
        }
        let ctx = LayoutContext::new();
        let size = t.tree.measure(t.table, &ctx).unwrap();
        let mut canvas = Canvas::new(size);
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            t.tree.render(t.table, &mut surface).unwrap();
        }
        // column 0 is 10 wide after the spanning cell, row 0 is 10 tall
        assert!(canvas
            .commands()
            .contains(&Command::Translate(Pt::from_i32(6), Pt::from_i32(8))));
    }

    #[test]
    fn default_cell_content_is_vertically_centred() {
        let mut t = Builder::new();
        let r0 = t.row();
        t.cell(r0, 4.0, 2.0, 1, 1);
        t.cell(r0, 4.0, 10.0, 1, 1);
        let ctx = LayoutContext::new();
        let size = t.tree.measure(t.table, &ctx).unwrap();
        let mut canvas = Canvas::new(size);
        {
            let mut surface = Surface::new(&mut canvas, &ctx);
            t.tree.render(t.table, &mut surface).unwrap();
        }
        assert!(canvas
            .commands()
            .contains(&Command::Translate(Pt::ZERO, Pt::from_i32(4))));
    }

    #[test]
    fn standalone_row_lays_cells_left_to_right() {
        let mut t = Builder::new();
        let r0 = t.row();
        t.cell(r0, 4.0, 2.0, 1, 1);
        t.cell(r0, 6.0, 9.0, 1, 1);
        let ctx = LayoutContext::new();
        assert_eq!(
            t.tree.measure_content(r0, &ctx).unwrap(),
            Size::from_f32(10.0, 9.0)
        );
    }

    #[test]
    fn empty_table_measures_zero() {
        let mut t = Builder::new();
        let ctx = LayoutContext::new();
        assert_eq!(t.tree.measure_content(t.table, &ctx).unwrap(), Size::ZERO);
    }
}
