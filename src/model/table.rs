//! Table types.

use std::borrow::Cow;
use std::ops::Deref;

use super::page::expect_type;
use super::{BlockRef, BlockType, BoundingBox, EntityType, Page};
use crate::error::{Error, Result};
use crate::parser::ParseOptions;

/// Largest row or column count a table grid may have.
const MAX_TABLE_DIMENSION: usize = 1000;

#[derive(Debug)]
pub(crate) struct TableData {
    pub(crate) block: usize,
    pub(crate) row_count: usize,
    pub(crate) column_count: usize,
    pub(crate) cells: Vec<CellData>,
    /// `grid[row][column]` is an index into `cells`
    pub(crate) grid: Vec<Vec<Option<usize>>>,
    pub(crate) merged: Vec<MergedCellData>,
}

impl TableData {
    /// Reconstruct the cell grid of a TABLE block.
    pub(crate) fn build(block: BlockRef<'_>, options: &ParseOptions) -> Result<Self> {
        expect_type(&block, BlockType::Table)?;

        let mut cell_blocks = block.children_of_type(BlockType::Cell);
        let mut oversized = Vec::new();
        cell_blocks.retain(|cell| {
            let fits = (cell.row_index as usize) < MAX_TABLE_DIMENSION
                && (cell.column_index as usize) < MAX_TABLE_DIMENSION;
            if !fits {
                oversized.push(*cell);
            }
            fits
        });

        if let Some(cell) = oversized.first() {
            if !options.is_lenient() {
                return Err(Error::CellPositionTooLarge {
                    id: cell.id.clone(),
                    row: cell.row_index as usize,
                    column: cell.column_index as usize,
                    limit: MAX_TABLE_DIMENSION,
                });
            }
        }
        for cell in &oversized {
            log::warn!(
                "Table {}: skipping cell {} at ({}, {}) beyond the grid limit",
                block.id,
                cell.id,
                cell.row_index,
                cell.column_index
            );
        }

        let mut row_count = 0;
        let mut column_count = 0;
        for cell in &cell_blocks {
            row_count = row_count.max(cell.row_index as usize + 1);
            column_count = column_count.max(cell.column_index as usize + 1);
        }

        let mut grid = vec![vec![None; column_count]; row_count];
        let mut cells = Vec::with_capacity(cell_blocks.len());
        for cell_block in cell_blocks {
            let cell = CellData::new(cell_block)?;
            let slot = &mut grid[cell.row][cell.column];
            if slot.is_some() {
                log::warn!(
                    "Table {}: cell {} overlaps an earlier cell at ({}, {})",
                    block.id,
                    cell_block.id,
                    cell.row,
                    cell.column
                );
            } else {
                *slot = Some(cells.len());
            }
            cells.push(cell);
        }

        let merged = if options.merged_cells {
            cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.is_merged())
                .map(|(index, _)| MergedCellData::new(index, &cells))
                .collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            block: block.index(),
            row_count,
            column_count,
            cells,
            grid,
            merged,
        })
    }
}

#[derive(Debug)]
pub(crate) struct CellData {
    pub(crate) block: usize,
    pub(crate) row: usize,
    pub(crate) column: usize,
    pub(crate) row_span: usize,
    pub(crate) column_span: usize,
}

impl CellData {
    pub(crate) fn new(block: BlockRef<'_>) -> Result<Self> {
        expect_type(&block, BlockType::Cell)?;
        Ok(Self {
            block: block.index(),
            row: block.row_index as usize,
            column: block.column_index as usize,
            row_span: block.row_span.max(1) as usize,
            column_span: block.column_span.max(1) as usize,
        })
    }

    fn is_merged(&self) -> bool {
        self.row_span > 1 || self.column_span > 1
    }

    fn covers(&self, row: usize, column: usize) -> bool {
        (self.row..self.row.saturating_add(self.row_span)).contains(&row)
            && (self.column..self.column.saturating_add(self.column_span)).contains(&column)
    }
}

#[derive(Debug)]
pub(crate) struct MergedCellData {
    pub(crate) cell: usize,
    pub(crate) contained: Vec<usize>,
}

impl MergedCellData {
    /// Collect the other cells inside the span footprint, in row-major order.
    fn new(cell: usize, cells: &[CellData]) -> Self {
        let outer = &cells[cell];
        let mut contained: Vec<usize> = (0..cells.len())
            .filter(|&i| i != cell && outer.covers(cells[i].row, cells[i].column))
            .collect();
        contained.sort_by_key(|&i| (cells[i].row, cells[i].column));
        Self { cell, contained }
    }
}

/// A table reconstructed from a TABLE block's cells.
///
/// The grid is dense and sized `row_count x column_count`. Positions with no
/// CELL block (including positions covered by a spanning cell) are holes.
#[derive(Clone, Copy)]
pub struct Table<'a> {
    page: Page<'a>,
    data: &'a TableData,
}

impl<'a> Table<'a> {
    pub(crate) fn new(page: Page<'a>, data: &'a TableData) -> Self {
        Self { page, data }
    }

    fn cell(&self, index: usize) -> Cell<'a> {
        Cell {
            table: *self,
            data: &self.data.cells[index],
        }
    }

    /// Number of rows (one more than the largest row index).
    pub fn row_count(&self) -> usize {
        self.data.row_count
    }

    /// Number of columns (one more than the largest column index).
    pub fn column_count(&self) -> usize {
        self.data.column_count
    }

    /// Check if the table has no cells.
    pub fn is_empty(&self) -> bool {
        self.data.cells.is_empty()
    }

    /// All rows, top to bottom.
    pub fn rows(&self) -> Vec<TableRow<'a>> {
        (0..self.data.row_count)
            .map(|index| TableRow {
                table: *self,
                index,
            })
            .collect()
    }

    /// Get one row.
    pub fn row(&self, index: usize) -> Result<TableRow<'a>> {
        if index >= self.data.row_count {
            return Err(Error::RowOutOfRange(index, self.data.row_count));
        }
        Ok(TableRow {
            table: *self,
            index,
        })
    }

    /// All cells, in relationship order.
    pub fn cells(&self) -> Vec<Cell<'a>> {
        (0..self.data.cells.len()).map(|i| self.cell(i)).collect()
    }

    /// Cells spanning more than one row or column.
    pub fn merged_cells(&self) -> Vec<MergedCell<'a>> {
        self.data
            .merged
            .iter()
            .map(|data| MergedCell {
                cell: self.cell(data.cell),
                data,
            })
            .collect()
    }

    /// Check if the table has spanning cells.
    pub fn has_merged_cells(&self) -> bool {
        self.data.cells.iter().any(CellData::is_merged)
    }

    /// Cell at a grid position.
    ///
    /// Fails when the position is outside the grid; returns `Ok(None)` for a
    /// hole inside it.
    pub fn cell_by_position(&self, row: usize, column: usize) -> Result<Option<Cell<'a>>> {
        if row >= self.data.row_count || column >= self.data.column_count {
            return Err(Error::CellOutOfRange {
                row,
                column,
                rows: self.data.row_count,
                columns: self.data.column_count,
            });
        }
        Ok(self.data.grid[row][column].map(|i| self.cell(i)))
    }

    /// Cells tagged COLUMN_HEADER.
    pub fn header_cells(&self) -> Vec<Cell<'a>> {
        self.cells()
            .into_iter()
            .filter(|cell| cell.is_column_header())
            .collect()
    }

    /// Backing TABLE block.
    pub fn block(&self) -> BlockRef<'a> {
        BlockRef::new(self.page.document(), self.data.block)
    }

    /// Approximate plain text: rows joined by newlines, cells by tabs.
    pub fn text(&self) -> Cow<'a, str> {
        self.block().text()
    }

    /// Confidence score (0-100).
    pub fn confidence(&self) -> f64 {
        self.block().block().confidence
    }

    /// Bounding box of the table.
    pub fn bounding_box(&self) -> BoundingBox {
        self.block().block().bounding_box()
    }

    /// Owning page.
    pub fn page(&self) -> Page<'a> {
        self.page
    }
}

impl std::fmt::Debug for Table<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("rows", &self.data.row_count)
            .field("columns", &self.data.column_count)
            .field("cells", &self.data.cells.len())
            .finish()
    }
}

/// A table row.
#[derive(Clone, Copy, Debug)]
pub struct TableRow<'a> {
    table: Table<'a>,
    index: usize,
}

impl<'a> TableRow<'a> {
    /// Row index (0-indexed).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Cells present in this row, in column order. Holes are skipped.
    pub fn cells(&self) -> Vec<Cell<'a>> {
        self.table.data.grid[self.index]
            .iter()
            .flatten()
            .map(|&i| self.table.cell(i))
            .collect()
    }

    /// Cell at a column, or `None` for a hole or out-of-range column.
    pub fn cell(&self, column: usize) -> Option<Cell<'a>> {
        self.table.data.grid[self.index]
            .get(column)
            .copied()
            .flatten()
            .map(|i| self.table.cell(i))
    }

    /// Check if every present cell is a column header.
    pub fn is_header(&self) -> bool {
        let cells = self.cells();
        !cells.is_empty() && cells.iter().all(Cell::is_column_header)
    }

    /// Cell texts joined by tabs.
    pub fn text(&self) -> String {
        self.cells()
            .iter()
            .map(|c| c.text())
            .collect::<Vec<_>>()
            .join("\t")
    }

    /// Owning table.
    pub fn table(&self) -> Table<'a> {
        self.table
    }
}

/// A table cell.
#[derive(Clone, Copy)]
pub struct Cell<'a> {
    table: Table<'a>,
    data: &'a CellData,
}

impl<'a> Cell<'a> {
    /// Row index (0-indexed).
    pub fn row_index(&self) -> usize {
        self.data.row
    }

    /// Column index (0-indexed).
    pub fn column_index(&self) -> usize {
        self.data.column
    }

    /// Number of rows this cell spans.
    pub fn row_span(&self) -> usize {
        self.data.row_span
    }

    /// Number of columns this cell spans.
    pub fn column_span(&self) -> usize {
        self.data.column_span
    }

    /// Check if this cell spans multiple rows or columns.
    pub fn is_merged(&self) -> bool {
        self.data.is_merged()
    }

    /// Cell text: child texts joined by spaces.
    pub fn text(&self) -> Cow<'a, str> {
        self.block().text()
    }

    /// Confidence score (0-100).
    pub fn confidence(&self) -> f64 {
        self.block().block().confidence
    }

    /// Entity tags of the cell.
    pub fn entity_types(&self) -> &'a [EntityType] {
        &self.block().block().entity_types
    }

    /// Check if the cell is tagged COLUMN_HEADER.
    pub fn is_column_header(&self) -> bool {
        self.entity_types().contains(&EntityType::ColumnHeader)
    }

    /// Bounding box of the cell.
    pub fn bounding_box(&self) -> BoundingBox {
        self.block().block().bounding_box()
    }

    /// Backing CELL block.
    pub fn block(&self) -> BlockRef<'a> {
        BlockRef::new(self.table.page.document(), self.data.block)
    }

    /// Owning table.
    pub fn table(&self) -> Table<'a> {
        self.table
    }
}

impl std::fmt::Debug for Cell<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cell")
            .field("row", &self.data.row)
            .field("column", &self.data.column)
            .field("text", &self.text())
            .finish()
    }
}

/// A cell spanning more than one row or column.
#[derive(Clone, Copy)]
pub struct MergedCell<'a> {
    cell: Cell<'a>,
    data: &'a MergedCellData,
}

impl<'a> MergedCell<'a> {
    /// The spanning cell itself.
    pub fn cell(&self) -> Cell<'a> {
        self.cell
    }

    /// Other cells whose position lies inside the span, in row-major order.
    pub fn contained_cells(&self) -> Vec<Cell<'a>> {
        self.data
            .contained
            .iter()
            .map(|&i| self.cell.table.cell(i))
            .collect()
    }
}

impl<'a> Deref for MergedCell<'a> {
    type Target = Cell<'a>;

    fn deref(&self) -> &Cell<'a> {
        &self.cell
    }
}
