//! The 8x9 board model and its fog-of-war redaction.
//!
//! Each client holds a local replica of the board; the two replicas are
//! reconciled solely through protocol messages, never through shared
//! memory. The fog-of-war invariant lives here: a client's board must
//! never contain the true type of an opponent piece. Opponent pieces are
//! represented by [`Cell::Redacted`] (owner known, rank unknown) until they
//! lose combat, are revealed, or the game ends.
//!
//! No move legality is enforced at this level — callers (the game state
//! machine) enforce legality. All operations fail with
//! [`LinkError::OutOfBounds`] when a coordinate leaves the grid.

use serde::{Deserialize, Serialize};

use crate::error::LinkError;
use crate::rank::{Rank, STARTING_ROSTER};
use crate::rng::Pcg32;
use crate::Side;

/// Number of rows on the board.
pub const BOARD_ROWS: usize = 8;

/// Number of columns on the board.
pub const BOARD_COLS: usize = 9;

/// A coordinate on the board. Valid rows are `0..8`, valid columns `0..9`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row index, `0..8`.
    pub row: usize,
    /// Column index, `0..9`.
    pub col: usize,
}

impl Position {
    /// Creates a new position. Does not validate bounds; see
    /// [`Position::in_bounds`].
    #[inline]
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// Returns `true` if this position lies on the board.
    #[inline]
    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.row < BOARD_ROWS && self.col < BOARD_COLS
    }

    /// Returns `true` if `other` is orthogonally adjacent to this position
    /// (Manhattan distance exactly 1; diagonals are not adjacent).
    #[must_use]
    pub fn is_adjacent(self, other: Position) -> bool {
        let row_diff = self.row.abs_diff(other.row);
        let col_diff = self.col.abs_diff(other.col);
        (row_diff == 1 && col_diff == 0) || (row_diff == 0 && col_diff == 1)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The contents of one board cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Cell {
    /// No piece.
    #[default]
    Empty,
    /// A piece whose rank is known to the local observer. By construction
    /// this is always a piece of the local side (or a demo-board piece).
    Piece {
        /// The side owning the piece.
        owner: Side,
        /// The piece's rank.
        rank: Rank,
    },
    /// An opponent-owned piece whose rank is unknown: the fog-of-war
    /// marker. Occupancy and owner are visible, the rank is not.
    Redacted {
        /// The side owning the hidden piece.
        owner: Side,
    },
}

impl Cell {
    /// Returns the owner of the piece in this cell, if any.
    #[inline]
    #[must_use]
    pub const fn owner(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Piece { owner, .. } | Cell::Redacted { owner } => Some(owner),
        }
    }

    /// Returns `true` if the cell holds no piece.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

/// The 8x9 grid of cells: a local replica of the shared game board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Board {
    cells: [[Cell; BOARD_COLS]; BOARD_ROWS],
}

impl Board {
    /// Creates an empty board.
    #[must_use]
    pub fn new() -> Self {
        Board::default()
    }

    fn check(pos: Position) -> Result<(), LinkError> {
        if pos.in_bounds() {
            Ok(())
        } else {
            Err(LinkError::OutOfBounds {
                row: pos.row,
                col: pos.col,
            })
        }
    }

    /// Returns the cell at `pos`.
    pub fn get(&self, pos: Position) -> Result<Cell, LinkError> {
        Self::check(pos)?;
        Ok(self.cells[pos.row][pos.col])
    }

    /// Places `cell` at `pos`, replacing whatever was there.
    pub fn place(&mut self, pos: Position, cell: Cell) -> Result<(), LinkError> {
        Self::check(pos)?;
        self.cells[pos.row][pos.col] = cell;
        Ok(())
    }

    /// Empties the cell at `pos`, returning its previous contents.
    pub fn remove(&mut self, pos: Position) -> Result<Cell, LinkError> {
        Self::check(pos)?;
        Ok(std::mem::take(&mut self.cells[pos.row][pos.col]))
    }

    /// Moves the contents of `from` into `to`, leaving `from` empty.
    /// Whatever occupied `to` is overwritten. No legality is enforced.
    pub fn relocate(&mut self, from: Position, to: Position) -> Result<(), LinkError> {
        Self::check(from)?;
        Self::check(to)?;
        self.cells[to.row][to.col] = std::mem::take(&mut self.cells[from.row][from.col]);
        Ok(())
    }

    /// Swaps the contents of two cells. Used for rearrangement during the
    /// waiting and preparing phases.
    pub fn swap(&mut self, a: Position, b: Position) -> Result<(), LinkError> {
        Self::check(a)?;
        Self::check(b)?;
        let tmp = self.cells[a.row][a.col];
        self.cells[a.row][a.col] = self.cells[b.row][b.col];
        self.cells[b.row][b.col] = tmp;
        Ok(())
    }

    /// Counts the pieces (known or redacted) owned by `side`.
    #[must_use]
    pub fn piece_count(&self, side: Side) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.owner() == Some(side))
            .count()
    }

    /// Returns a view of this board with every cell owned by `side`
    /// replaced by a [`Cell::Redacted`] marker. Applied to a side's *own*
    /// pieces before a snapshot is transmitted, so the true ranks never
    /// leave the local replica.
    #[must_use]
    pub fn redact(&self, side: Side) -> Board {
        let mut view = self.clone();
        for row in &mut view.cells {
            for cell in row {
                if let Cell::Piece { owner, .. } = *cell {
                    if owner == side {
                        *cell = Cell::Redacted { owner };
                    }
                }
            }
        }
        view
    }

    /// Returns a view holding only the cells owned by `side`; every other
    /// cell is empty.
    #[must_use]
    pub fn own_pieces(&self, side: Side) -> Board {
        let mut view = Board::new();
        for (row_index, row) in self.cells.iter().enumerate() {
            for (col_index, cell) in row.iter().enumerate() {
                if cell.owner() == Some(side) {
                    view.cells[row_index][col_index] = *cell;
                }
            }
        }
        view
    }

    /// Fills locally-empty cells from `snapshot`; cells already known
    /// locally win. This is the one-time reconciliation performed right
    /// after the playing phase begins, placing the opponent's
    /// occupied-but-unknown markers at the correct coordinates.
    ///
    /// Idempotent: merging the same snapshot twice yields the same board.
    pub fn merge(&mut self, snapshot: &Board) {
        for (local_row, snapshot_row) in self.cells.iter_mut().zip(snapshot.cells.iter()) {
            for (local, remote) in local_row.iter_mut().zip(snapshot_row.iter()) {
                if local.is_empty() {
                    *local = *remote;
                }
            }
        }
    }

    fn place_random_home_rows(&mut self, side: Side, rng: &mut Pcg32) {
        let mut slots: Vec<Option<Rank>> = STARTING_ROSTER.iter().copied().map(Some).collect();
        slots.resize(3 * BOARD_COLS, None);
        rng.shuffle(&mut slots);

        let rows = side.home_rows();
        for (index, slot) in slots.into_iter().enumerate() {
            let row = rows[index / BOARD_COLS];
            let col = index % BOARD_COLS;
            self.cells[row][col] = match slot {
                Some(rank) => Cell::Piece { owner: side, rank },
                None => Cell::Empty,
            };
        }
    }

    /// Builds the idle-screen demo arrangement used during the waiting
    /// phase: both sides randomly placed, blue's ranks hidden. Free
    /// rearrangement of this board is allowed with no side restriction.
    #[must_use]
    pub fn demo(rng: &mut Pcg32) -> Board {
        let mut board = Board::new();
        board.place_random_home_rows(Side::Red, rng);
        board.place_random_home_rows(Side::Blue, rng);
        board.redact(Side::Blue)
    }

    /// Builds a fresh preparing-phase board: the local `side` randomly
    /// placed in its own home rows, every other cell empty.
    #[must_use]
    pub fn prep(side: Side, rng: &mut Pcg32) -> Board {
        let mut board = Board::new();
        board.place_random_home_rows(side, rng);
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    // ==========================================================================
    // Bounds checking
    // ==========================================================================

    #[test]
    fn get_rejects_out_of_bounds_row() {
        let board = Board::new();
        assert_eq!(
            board.get(Position::new(8, 0)),
            Err(LinkError::OutOfBounds { row: 8, col: 0 })
        );
    }

    #[test]
    fn place_rejects_out_of_bounds_col() {
        let mut board = Board::new();
        let err = board.place(Position::new(0, 9), Cell::Empty);
        assert_eq!(err, Err(LinkError::OutOfBounds { row: 0, col: 9 }));
    }

    #[test]
    fn relocate_rejects_either_end_out_of_bounds() {
        let mut board = Board::new();
        assert!(board
            .relocate(Position::new(0, 0), Position::new(0, 9))
            .is_err());
        assert!(board
            .relocate(Position::new(8, 0), Position::new(0, 0))
            .is_err());
    }

    #[test]
    fn corner_positions_are_in_bounds() {
        let board = Board::new();
        assert!(board.get(Position::new(0, 0)).is_ok());
        assert!(board.get(Position::new(7, 8)).is_ok());
    }

    // ==========================================================================
    // Cell operations
    // ==========================================================================

    #[test]
    fn place_and_remove_round_trip() {
        let mut board = Board::new();
        let piece = Cell::Piece {
            owner: Side::Red,
            rank: Rank::Captain,
        };
        board.place(Position::new(5, 4), piece).unwrap();
        assert_eq!(board.get(Position::new(5, 4)).unwrap(), piece);
        assert_eq!(board.remove(Position::new(5, 4)).unwrap(), piece);
        assert!(board.get(Position::new(5, 4)).unwrap().is_empty());
    }

    #[test]
    fn relocate_leaves_origin_empty() {
        let mut board = Board::new();
        let piece = Cell::Piece {
            owner: Side::Red,
            rank: Rank::Private,
        };
        board.place(Position::new(5, 0), piece).unwrap();
        board
            .relocate(Position::new(5, 0), Position::new(4, 0))
            .unwrap();
        assert!(board.get(Position::new(5, 0)).unwrap().is_empty());
        assert_eq!(board.get(Position::new(4, 0)).unwrap(), piece);
    }

    #[test]
    fn swap_exchanges_contents() {
        let mut board = Board::new();
        let piece = Cell::Piece {
            owner: Side::Blue,
            rank: Rank::Spy,
        };
        board.place(Position::new(1, 1), piece).unwrap();
        board.swap(Position::new(1, 1), Position::new(2, 2)).unwrap();
        assert!(board.get(Position::new(1, 1)).unwrap().is_empty());
        assert_eq!(board.get(Position::new(2, 2)).unwrap(), piece);
    }

    // ==========================================================================
    // Adjacency
    // ==========================================================================

    #[test]
    fn orthogonal_neighbors_are_adjacent() {
        let pos = Position::new(4, 4);
        assert!(pos.is_adjacent(Position::new(3, 4)));
        assert!(pos.is_adjacent(Position::new(5, 4)));
        assert!(pos.is_adjacent(Position::new(4, 3)));
        assert!(pos.is_adjacent(Position::new(4, 5)));
    }

    #[test]
    fn diagonals_and_distant_cells_are_not_adjacent() {
        let pos = Position::new(4, 4);
        assert!(!pos.is_adjacent(Position::new(3, 3)));
        assert!(!pos.is_adjacent(Position::new(5, 5)));
        assert!(!pos.is_adjacent(Position::new(4, 6)));
        assert!(!pos.is_adjacent(pos));
    }

    // ==========================================================================
    // Redaction and merge
    // ==========================================================================

    #[test]
    fn redact_hides_ranks_but_keeps_owner() {
        let mut rng = rng();
        let board = Board::prep(Side::Red, &mut rng);
        let view = board.redact(Side::Red);
        for row in 0..BOARD_ROWS {
            for col in 0..BOARD_COLS {
                let cell = view.get(Position::new(row, col)).unwrap();
                assert!(!matches!(cell, Cell::Piece { .. }));
                if let Cell::Redacted { owner } = cell {
                    assert_eq!(owner, Side::Red);
                }
            }
        }
        assert_eq!(view.piece_count(Side::Red), 21);
    }

    #[test]
    fn merge_never_reveals_redacted_cells() {
        let mut rng = rng();
        let mut local = Board::prep(Side::Red, &mut rng);
        let remote = Board::prep(Side::Blue, &mut rng);
        let snapshot = remote.own_pieces(Side::Blue).redact(Side::Blue);

        local.merge(&snapshot);

        for row in 0..BOARD_ROWS {
            for col in 0..BOARD_COLS {
                let cell = local.get(Position::new(row, col)).unwrap();
                if let Cell::Piece { owner, .. } = cell {
                    assert_eq!(owner, Side::Red, "opponent rank leaked at ({row}, {col})");
                }
            }
        }
        assert_eq!(local.piece_count(Side::Blue), 21);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut rng = rng();
        let mut local = Board::prep(Side::Red, &mut rng);
        let snapshot = Board::prep(Side::Blue, &mut rng).redact(Side::Blue);

        local.merge(&snapshot);
        let once = local.clone();
        local.merge(&snapshot);
        assert_eq!(local, once);
    }

    #[test]
    fn merge_prefers_locally_known_cells() {
        let mut local = Board::new();
        let known = Cell::Piece {
            owner: Side::Red,
            rank: Rank::Flag,
        };
        local.place(Position::new(5, 5), known).unwrap();

        let mut snapshot = Board::new();
        snapshot
            .place(Position::new(5, 5), Cell::Redacted { owner: Side::Blue })
            .unwrap();

        local.merge(&snapshot);
        assert_eq!(local.get(Position::new(5, 5)).unwrap(), known);
    }

    // ==========================================================================
    // Random placement
    // ==========================================================================

    #[test]
    fn prep_places_full_roster_in_home_rows() {
        let mut rng = rng();
        for side in [Side::Red, Side::Blue] {
            let board = Board::prep(side, &mut rng);
            assert_eq!(board.piece_count(side), 21);
            assert_eq!(board.piece_count(side.opponent()), 0);

            let mut flags = 0;
            let mut spies = 0;
            for row in 0..BOARD_ROWS {
                for col in 0..BOARD_COLS {
                    let cell = board.get(Position::new(row, col)).unwrap();
                    if let Cell::Piece { rank, .. } = cell {
                        assert!(side.home_rows().contains(&row), "piece outside home rows");
                        if rank == Rank::Flag {
                            flags += 1;
                        }
                        if rank == Rank::Spy {
                            spies += 1;
                        }
                    }
                }
            }
            assert_eq!(flags, 1);
            assert_eq!(spies, 2);
        }
    }

    #[test]
    fn demo_board_hides_blue_only() {
        let mut rng = rng();
        let board = Board::demo(&mut rng);
        assert_eq!(board.piece_count(Side::Red), 21);
        assert_eq!(board.piece_count(Side::Blue), 21);
        for row in 0..BOARD_ROWS {
            for col in 0..BOARD_COLS {
                match board.get(Position::new(row, col)).unwrap() {
                    Cell::Piece { owner, .. } => assert_eq!(owner, Side::Red),
                    Cell::Redacted { owner } => assert_eq!(owner, Side::Blue),
                    Cell::Empty => {}
                }
            }
        }
    }

    #[test]
    fn placement_varies_with_seed() {
        let mut a = Pcg32::seed_from_u64(1);
        let mut b = Pcg32::seed_from_u64(2);
        assert_ne!(Board::prep(Side::Red, &mut a), Board::prep(Side::Red, &mut b));
    }
}
