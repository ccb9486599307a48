//! Occupancy grid that stores multi-cell items behind a single anchor.

use std::fmt;

use plot_defence_core::{CellRectSize, TowerId};

/// Items that cover a rectangular footprint of grid cells.
pub trait Footprint {
    /// Number of columns covered by the item; at least one.
    fn width(&self) -> u32;

    /// Number of rows covered by the item; at least one.
    fn height(&self) -> u32;
}

/// Content of a single grid cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Cell<T> {
    /// Nothing occupies the cell.
    Empty,
    /// The cell is the canonical anchor (upper-left corner) of an item.
    Anchor(T),
    /// The cell is covered by the item anchored at `(x, y)`.
    Ref {
        /// Column of the anchor cell.
        x: u32,
        /// Row of the anchor cell.
        y: u32,
    },
}

/// Errors reported by [`Grid`] mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// The requested cell or footprint lies outside the grid.
    #[error("footprint {width}x{height} at ({x}, {y}) does not fit the grid")]
    OutOfBounds {
        /// Column of the requested cell.
        x: u32,
        /// Row of the requested cell.
        y: u32,
        /// Width of the requested footprint.
        width: u32,
        /// Height of the requested footprint.
        height: u32,
    },
}

/// Fixed-size, row-major occupancy map.
#[derive(Clone, Debug)]
pub struct Grid<T> {
    width: u32,
    height: u32,
    cells: Vec<Cell<T>>,
}

impl<T> Grid<T> {
    /// Creates an empty grid.
    ///
    /// # Panics
    ///
    /// Panics when either dimension is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "grid dimensions must be positive");
        let capacity = width as usize * height as usize;
        let mut cells = Vec::with_capacity(capacity);
        cells.resize_with(capacity, || Cell::Empty);
        Self {
            width,
            height,
            cells,
        }
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Raw cell content at `(x, y)` without resolving references.
    #[must_use]
    pub fn cell(&self, x: u32, y: u32) -> Option<&Cell<T>> {
        self.index(x, y).map(|index| &self.cells[index])
    }

    /// Item covering `(x, y)`, following back-references to the anchor.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<&T> {
        let (anchor_x, anchor_y) = self.anchor_of(x, y)?;
        match self.cell(anchor_x, anchor_y)? {
            Cell::Anchor(item) => Some(item),
            Cell::Empty | Cell::Ref { .. } => None,
        }
    }

    /// Anchor coordinate of the item covering `(x, y)`.
    #[must_use]
    pub fn anchor_of(&self, x: u32, y: u32) -> Option<(u32, u32)> {
        match self.cell(x, y)? {
            Cell::Empty => None,
            Cell::Anchor(_) => Some((x, y)),
            Cell::Ref { x, y } => Some((*x, *y)),
        }
    }

    /// Every anchored item together with its anchor coordinate, in row-major order.
    pub fn items(&self) -> impl Iterator<Item = (u32, u32, &T)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(index, cell)| match cell {
                Cell::Anchor(item) => {
                    let x = (index % width as usize) as u32;
                    let y = (index / width as usize) as u32;
                    Some((x, y, item))
                }
                Cell::Empty | Cell::Ref { .. } => None,
            })
    }

    /// Replaces every in-bounds cell of the rectangle with the value returned by `f`.
    ///
    /// The origin is signed so that rectangles partially outside the grid are
    /// clipped rather than rejected.
    pub fn for_item_area<F>(&mut self, x: i64, y: i64, width: u32, height: u32, mut f: F)
    where
        F: FnMut(u32, u32, Cell<T>) -> Cell<T>,
    {
        for (cx, cy) in self.clipped_area(x, y, width, height) {
            if let Some(index) = self.index(cx, cy) {
                let current = std::mem::replace(&mut self.cells[index], Cell::Empty);
                self.cells[index] = f(cx, cy, current);
            }
        }
    }

    /// Visits every in-bounds cell of the rectangle without modifying it.
    pub fn scan_area<F>(&self, x: i64, y: i64, width: u32, height: u32, mut f: F)
    where
        F: FnMut(u32, u32, &Cell<T>),
    {
        for (cx, cy) in self.clipped_area(x, y, width, height) {
            if let Some(cell) = self.cell(cx, cy) {
                f(cx, cy, cell);
            }
        }
    }

    /// Removes the item covering `(x, y)` and clears its whole footprint.
    pub fn remove_at(&mut self, x: u32, y: u32) -> Result<Option<T>, GridError>
    where
        T: Footprint,
    {
        if self.index(x, y).is_none() {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width: 1,
                height: 1,
            });
        }
        let Some((anchor_x, anchor_y)) = self.anchor_of(x, y) else {
            return Ok(None);
        };
        Ok(self.take_anchor(anchor_x, anchor_y))
    }

    fn take_anchor(&mut self, x: u32, y: u32) -> Option<T>
    where
        T: Footprint,
    {
        let index = self.index(x, y)?;
        let item = match std::mem::replace(&mut self.cells[index], Cell::Empty) {
            Cell::Anchor(item) => item,
            other => {
                self.cells[index] = other;
                return None;
            }
        };
        let (width, height) = (item.width(), item.height());
        self.for_item_area(i64::from(x), i64::from(y), width, height, |_, _, cell| {
            match cell {
                Cell::Ref { x: rx, y: ry } if rx == x && ry == y => Cell::Empty,
                other => other,
            }
        });
        Some(item)
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.width as usize + x as usize)
    }

    fn fits(&self, x: u32, y: u32, width: u32, height: u32) -> bool {
        width > 0
            && height > 0
            && u64::from(x) + u64::from(width) <= u64::from(self.width)
            && u64::from(y) + u64::from(height) <= u64::from(self.height)
    }

    fn clipped_area(
        &self,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    ) -> impl Iterator<Item = (u32, u32)> {
        let left = x.max(0);
        let top = y.max(0);
        let right = (x + i64::from(width)).min(i64::from(self.width));
        let bottom = (y + i64::from(height)).min(i64::from(self.height));
        (top..bottom).flat_map(move |row| (left..right).map(move |column| (column as u32, row as u32)))
    }
}

impl<T: Footprint> Grid<T> {
    /// Reports whether `item` could be anchored at `(x, y)`.
    #[must_use]
    pub fn can_add(&self, item: &T, x: u32, y: u32) -> bool {
        self.fits(x, y, item.width(), item.height()) && self.is_area_empty(x, y, item)
    }

    /// Anchors `item` at `(x, y)`, reserving its whole footprint.
    ///
    /// Returns `Ok(false)` without mutating the grid when any covered cell is
    /// occupied.
    pub fn add(&mut self, item: T, x: u32, y: u32) -> Result<bool, GridError> {
        let (width, height) = (item.width(), item.height());
        if !self.fits(x, y, width, height) {
            return Err(GridError::OutOfBounds {
                x,
                y,
                width,
                height,
            });
        }
        if !self.is_area_empty(x, y, &item) {
            return Ok(false);
        }

        self.for_item_area(i64::from(x), i64::from(y), width, height, |_, _, _| {
            Cell::Ref { x, y }
        });
        if let Some(index) = self.index(x, y) {
            self.cells[index] = Cell::Anchor(item);
        }
        Ok(true)
    }

    fn is_area_empty(&self, x: u32, y: u32, item: &T) -> bool {
        let mut empty = true;
        self.scan_area(
            i64::from(x),
            i64::from(y),
            item.width(),
            item.height(),
            |_, _, cell| empty &= matches!(cell, Cell::Empty),
        );
        empty
    }
}

impl<T: Footprint + PartialEq> Grid<T> {
    /// Removes the first anchored item equal to `item`, scanning in row-major order.
    pub fn remove(&mut self, item: &T) -> Option<T> {
        let (x, y) = self
            .items()
            .find(|(_, _, candidate)| *candidate == item)
            .map(|(x, y, _)| (x, y))?;
        self.take_anchor(x, y)
    }
}

impl<T> fmt::Display for Grid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.width as usize) {
            for cell in row {
                let symbol = match cell {
                    Cell::Empty => '-',
                    Cell::Ref { .. } => '*',
                    Cell::Anchor(_) => 'i',
                };
                write!(f, "{symbol}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Items stored in a layout's grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GridItem {
    /// A cell crossed by the enemy path, tagged with its path index.
    Path {
        /// Path index of the cell.
        index: u32,
    },
    /// A placed tower.
    Tower {
        /// Identifier of the tower.
        id: TowerId,
        /// Footprint of the tower.
        size: CellRectSize,
    },
}

impl Footprint for GridItem {
    fn width(&self) -> u32 {
        match self {
            Self::Path { .. } => 1,
            Self::Tower { size, .. } => size.width(),
        }
    }

    fn height(&self) -> u32 {
        match self {
            Self::Path { .. } => 1,
            Self::Tower { size, .. } => size.height(),
        }
    }
}
