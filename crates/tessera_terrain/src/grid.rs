//! # Grid Storage
//!
//! A fixed rectangular 2D array flattened into a `Vec`.
//!
//! Every layer above reuses this: a chunk is a `Grid<Tile>`, a terrain is a
//! `Grid<Chunk>`. Cells are stored row-major, so `linear_index(x, y)` is
//! `y * width + x`.

use crate::error::{TerrainError, TerrainResult};

/// Fixed-size 2D storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a grid by calling `f(x, y)` for every cell in row-major order.
    #[must_use]
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self { width, height, cells }
    }

    /// Grid width in cells.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height in cells.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the grid has no cells.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Returns true if `(x, y)` lies inside the grid.
    #[inline]
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as u64) < self.width as u64 && (y as u64) < self.height as u64
    }

    /// Flattens `(x, y)` to a cell index.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::IndexOutOfRange`] for negative or too-large
    /// coordinates.
    #[inline]
    pub fn linear_index(&self, x: i64, y: i64) -> TerrainResult<usize> {
        if self.contains(x, y) {
            Ok(y as usize * self.width + x as usize)
        } else {
            Err(TerrainError::IndexOutOfRange {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Inverse of [`linear_index`](Self::linear_index).
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::IndexOutOfRange`] when `index >= len()`.
    #[inline]
    pub fn square_index(&self, index: usize) -> TerrainResult<(usize, usize)> {
        if index < self.cells.len() {
            Ok((index % self.width, index / self.width))
        } else {
            Err(TerrainError::IndexOutOfRange {
                x: index as i64,
                y: 0,
                width: self.width,
                height: self.height,
            })
        }
    }

    /// Gets a cell.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::IndexOutOfRange`] outside the grid.
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> TerrainResult<&T> {
        let index = self.linear_index(x, y)?;
        Ok(&self.cells[index])
    }

    /// Gets a cell mutably.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::IndexOutOfRange`] outside the grid.
    #[inline]
    pub fn get_mut(&mut self, x: i64, y: i64) -> TerrainResult<&mut T> {
        let index = self.linear_index(x, y)?;
        Ok(&mut self.cells[index])
    }

    /// Replaces a cell.
    ///
    /// # Errors
    ///
    /// Returns [`TerrainError::IndexOutOfRange`] outside the grid.
    #[inline]
    pub fn set(&mut self, x: i64, y: i64, value: T) -> TerrainResult<()> {
        *self.get_mut(x, y)? = value;
        Ok(())
    }

    /// Iterates cells in row-major order.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.cells.iter()
    }

    /// Iterates cells mutably in row-major order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.cells.iter_mut()
    }
}

impl<T: Clone> Grid<T> {
    /// Creates a grid filled with `fill`.
    #[must_use]
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; width * height],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_and_square_index_are_inverse() {
        let grid = Grid::new(5, 3, 0u8);
        for y in 0..3 {
            for x in 0..5 {
                let i = grid.linear_index(x, y).unwrap();
                assert_eq!(i, (y * 5 + x) as usize);
                assert_eq!(grid.square_index(i).unwrap(), (x as usize, y as usize));
            }
        }
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let mut grid = Grid::new(4, 4, 0u8);
        assert!(matches!(
            grid.get(-1, 0),
            Err(TerrainError::IndexOutOfRange { x: -1, y: 0, .. })
        ));
        assert!(grid.get(4, 0).is_err());
        assert!(grid.get(0, 4).is_err());
        assert!(grid.set(0, -3, 1).is_err());
        assert!(grid.square_index(16).is_err());
    }

    #[test]
    fn test_set_then_get() {
        let mut grid = Grid::from_fn(3, 2, |x, y| x + y * 10);
        assert_eq!(*grid.get(2, 1).unwrap(), 12);
        grid.set(2, 1, 99).unwrap();
        assert_eq!(*grid.get(2, 1).unwrap(), 99);
        assert_eq!(grid.iter().copied().collect::<Vec<_>>(), vec![0, 1, 2, 10, 11, 99]);
    }
}
