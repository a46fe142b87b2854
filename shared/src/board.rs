//! Fixed-size rectangular grid of cells, stored row-major.

use crate::{Cell, Position};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Board {
    /// Creates a board of the given size covered in floor.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::Floor; width * height],
        }
    }

    /// Builds a board from rows of equal length. Returns `None` for ragged input.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return None;
        }

        Some(Self {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    fn index(&self, pos: Position) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.y as usize * self.width + pos.x as usize)
    }

    /// Cell at `pos`, or `None` outside the grid.
    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// Overwrites the cell at `pos`. Returns false if `pos` is outside the grid.
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        match self.index(pos) {
            Some(i) => {
                self.cells[i] = cell;
                true
            }
            None => false,
        }
    }

    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.width.max(1))
    }

    /// True when every ITEM and BLOCK has an identical cell mirrored through
    /// the grid center.
    pub fn is_point_symmetric(&self) -> bool {
        (0..self.height).all(|y| {
            (0..self.width).all(|x| {
                let cell = self.cells[y * self.width + x];
                if !matches!(cell, Cell::Item | Cell::Block) {
                    return true;
                }
                let mirror = (self.height - 1 - y) * self.width + (self.width - 1 - x);
                self.cells[mirror] == cell
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(layout: &[&str]) -> Vec<Vec<Cell>> {
        layout.iter()
            .map(|row| {
                row.chars()
                    .map(|c| Cell::from_code(c.to_digit(10).unwrap() as u8).unwrap())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_new_board_is_floor() {
        let board = Board::new(4, 3);
        assert_eq!(board.width(), 4);
        assert_eq!(board.height(), 3);
        assert_eq!(board.count(Cell::Floor), 12);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(Board::from_rows(rows(&["000", "00"])).is_none());
        assert!(Board::from_rows(rows(&["000", "000"])).is_some());
    }

    #[test]
    fn test_row_major_addressing() {
        let board = Board::from_rows(rows(&["023", "300"])).unwrap();
        assert_eq!(board.get(Position::new(1, 0)), Some(Cell::Block));
        assert_eq!(board.get(Position::new(2, 0)), Some(Cell::Item));
        assert_eq!(board.get(Position::new(0, 1)), Some(Cell::Item));
        assert_eq!(board.get(Position::new(3, 0)), None);
        assert_eq!(board.get(Position::new(0, -1)), None);
    }

    #[test]
    fn test_set() {
        let mut board = Board::new(2, 2);
        assert!(board.set(Position::new(1, 1), Cell::Block));
        assert_eq!(board.get(Position::new(1, 1)), Some(Cell::Block));
        assert!(!board.set(Position::new(2, 1), Cell::Block));
    }

    #[test]
    fn test_rows_iteration() {
        let board = Board::from_rows(rows(&["02", "30"])).unwrap();
        let collected: Vec<Vec<Cell>> = board.rows().map(|r| r.to_vec()).collect();
        assert_eq!(collected, rows(&["02", "30"]));
    }

    #[test]
    fn test_point_symmetry() {
        let symmetric = Board::from_rows(rows(&["200", "030", "002"])).unwrap();
        assert!(symmetric.is_point_symmetric());

        let asymmetric = Board::from_rows(rows(&["200", "030", "000"])).unwrap();
        assert!(!asymmetric.is_point_symmetric());

        // An item mirrored onto a block is still asymmetric.
        let mismatched = Board::from_rows(rows(&["300", "000", "002"])).unwrap();
        assert!(!mismatched.is_point_symmetric());
    }
}
