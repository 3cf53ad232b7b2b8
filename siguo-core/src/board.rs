//! Board occupancy snapshot
//!
//! A flat arena of optional pieces indexed by position. Cloning a board is a
//! plain vector copy, so simulated branches never share mutable state.

use std::sync::Arc;

use crate::pieces::{Piece, PieceId, Rank};
use crate::topology::{Position, Seat, Topology};

#[derive(Clone, Debug)]
pub struct Board {
    topology: Arc<Topology>,
    cells: Vec<Option<Piece>>,
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Board {
    pub fn empty(topology: Arc<Topology>) -> Self {
        let len = topology.size() as usize * topology.size() as usize;
        Self {
            topology,
            cells: vec![None; len],
        }
    }

    /// Empty standard 17x17 board
    pub fn standard() -> Self {
        Self::empty(Topology::standard())
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn shared_topology(&self) -> Arc<Topology> {
        Arc::clone(&self.topology)
    }

    fn slot(&self, pos: Position) -> usize {
        assert!(self.topology.contains(pos), "position {pos} is not a cell of the board");
        self.topology.index(pos)
    }

    /// Occupant of a cell; panics off the cross
    pub fn get(&self, pos: Position) -> Option<&Piece> {
        self.cells[self.slot(pos)].as_ref()
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut Piece> {
        let slot = self.slot(pos);
        self.cells[slot].as_mut()
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.get(pos).is_some()
    }

    /// Put a piece on a cell, returning any previous occupant
    pub fn place(&mut self, pos: Position, piece: Piece) -> Option<Piece> {
        let slot = self.slot(pos);
        self.cells[slot].replace(piece)
    }

    pub fn remove(&mut self, pos: Position) -> Option<Piece> {
        let slot = self.slot(pos);
        self.cells[slot].take()
    }

    /// Relocate a piece onto an empty cell
    pub fn move_piece(&mut self, from: Position, to: Position) {
        assert!(!self.is_occupied(to), "move onto occupied cell {to}");
        if let Some(piece) = self.remove(from) {
            self.place(to, piece);
        }
    }

    /// Every piece with its position, row-major
    pub fn pieces(&self) -> impl Iterator<Item = (Position, &Piece)> + '_ {
        let size = self.topology.size() as usize;
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.as_ref()
                .map(|piece| (Position::new((i / size) as i8, (i % size) as i8), piece))
        })
    }

    pub fn pieces_of(&self, seat: Seat) -> impl Iterator<Item = (Position, &Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.owner == seat)
    }

    pub fn count(&self, seat: Seat) -> usize {
        self.pieces_of(seat).count()
    }

    pub fn find(&self, id: PieceId) -> Option<Position> {
        self.pieces().find(|(_, p)| p.id == id).map(|(pos, _)| pos)
    }

    pub fn flag_position(&self, seat: Seat) -> Option<Position> {
        self.pieces_of(seat)
            .find(|(_, p)| p.rank == Rank::Flag)
            .map(|(pos, _)| pos)
    }

    /// Remove every piece of a seat
    pub fn clear_seat(&mut self, seat: Seat) -> usize {
        let mut removed = 0;
        for cell in self.cells.iter_mut() {
            if cell.map_or(false, |p| p.owner == seat) {
                *cell = None;
                removed += 1;
            }
        }
        removed
    }
}
