//! Move legality and move generation
//!
//! `is_valid_move` is the reference predicate. `possible_moves` enumerates
//! the same set without probing every cell: straight railway walks, corner
//! runs and an engineer flood fill.

use std::collections::VecDeque;

use crate::board::Board;
use crate::pieces::{Piece, Rank};
use crate::topology::{CellKind, Position, Topology, DIAGONAL, ORTHOGONAL};

// ============================================================================
// VALIDATION
// ============================================================================

/// Whether `piece`, standing on `from`, may legally move to `to`
pub fn is_valid_move(board: &Board, from: Position, to: Position, piece: &Piece) -> bool {
    let topo = board.topology();
    if from == to || !topo.contains(from) || !topo.contains(to) {
        return false;
    }
    match board.get(from) {
        Some(occupant) if occupant.id == piece.id => {}
        _ => return false,
    }
    if !destination_allowed(board, from, to, piece) {
        return false;
    }
    if topo.are_adjacent(from, to) {
        return true;
    }
    rail_path_exists(board, from, to, piece.rank == Rank::Engineer)
}

/// A piece inside its own team's headquarters never leaves it; an enemy
/// that walked in moves on as usual
fn frozen_in_headquarters(topo: &Topology, from: Position, piece: &Piece) -> bool {
    topo.classify(from) == CellKind::Headquarters
        && topo.zone_of(from).map_or(false, |seat| seat.is_teammate(piece.owner))
}

/// Rules that do not depend on the path taken
fn destination_allowed(board: &Board, from: Position, to: Position, piece: &Piece) -> bool {
    let topo = board.topology();

    if !piece.rank.is_mobile() || frozen_in_headquarters(topo, from, piece) {
        return false;
    }

    if topo.classify(to) == CellKind::Headquarters
        && topo.zone_of(to).map_or(false, |seat| seat.is_teammate(piece.owner))
    {
        return false;
    }

    if let Some(occupant) = board.get(to) {
        if topo.classify(to) == CellKind::Campsite || occupant.is_ally_of(piece) {
            return false;
        }
    }

    if topo.in_hub(to) && !topo.is_stoppable(to) {
        return false;
    }

    if topo.is_front_center(from) && topo.in_hub(to) && from.is_orthogonal_neighbor(to) {
        return false;
    }

    if piece.rank == Rank::Engineer && is_jammed(board, from) {
        return false;
    }

    true
}

fn is_jammed(board: &Board, from: Position) -> bool {
    board
        .topology()
        .jam_neighbors(from)
        .map_or(false, |[a, b]| board.is_occupied(a) && board.is_occupied(b))
}

fn rail_path_exists(board: &Board, from: Position, to: Position, engineer: bool) -> bool {
    let topo = board.topology();
    if !topo.is_railway(from) || !topo.is_railway(to) {
        return false;
    }
    if engineer {
        engineer_path(board, from, to)
    } else {
        straight_path(board, from, to) || corner_path(board, from, to)
    }
}

/// Whether a rail move from `from` to `to` is only open to an engineer
pub fn requires_engineer(board: &Board, from: Position, to: Position) -> bool {
    let topo = board.topology();
    !topo.are_adjacent(from, to)
        && topo.is_railway(from)
        && topo.is_railway(to)
        && !straight_path(board, from, to)
        && !corner_path(board, from, to)
}

/// Unbroken straight run of same-orientation track with empty interior
fn straight_path(board: &Board, from: Position, to: Position) -> bool {
    if from.row != to.row && from.col != to.col {
        return false;
    }
    let step = ((to.row - from.row).signum(), (to.col - from.col).signum());
    let topo = board.topology();
    let mut current = from;
    loop {
        let next = current.offset(step.0, step.1);
        if !topo.rail_linked(current, next) {
            return false;
        }
        if next == to {
            return true;
        }
        if board.is_occupied(next) {
            return false;
        }
        current = next;
    }
}

/// Outer depth line into a corner, the curve, and the outer depth line out
fn corner_path(board: &Board, from: Position, to: Position) -> bool {
    let topo = board.topology();
    topo.corners().iter().any(|&(a, b)| {
        [(a, b), (b, a)].into_iter().any(|(entry, exit)| {
            topo.on_through_line(from, entry)
                && topo.on_through_line(to, exit)
                && line_clear(board, from, entry)
                && line_clear(board, to, exit)
        })
    })
}

/// Cells after `start` up to and including `end` are empty. Both lie on one
/// straight line.
fn line_clear(board: &Board, start: Position, end: Position) -> bool {
    let step = ((end.row - start.row).signum(), (end.col - start.col).signum());
    let mut current = start;
    while current != end {
        current = current.offset(step.0, step.1);
        if board.is_occupied(current) {
            return false;
        }
    }
    true
}

/// Breadth-first search over the rail graph; only `to` may be occupied
fn engineer_path(board: &Board, from: Position, to: Position) -> bool {
    let topo = board.topology();
    let mut visited = vec![false; topo.size() as usize * topo.size() as usize];
    let mut queue = VecDeque::new();
    visited[topo.index(from)] = true;
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for &next in topo.rail_neighbors(current) {
            if next == to {
                return true;
            }
            let idx = topo.index(next);
            if visited[idx] || board.is_occupied(next) {
                continue;
            }
            visited[idx] = true;
            queue.push_back(next);
        }
    }
    false
}

// ============================================================================
// GENERATION
// ============================================================================

/// Every legal destination of the piece standing on `from`
pub fn possible_moves(board: &Board, from: Position) -> Vec<Position> {
    let piece = match board.get(from) {
        Some(p) => *p,
        None => return Vec::new(),
    };
    let topo = board.topology();
    if !piece.rank.is_mobile() || frozen_in_headquarters(topo, from, &piece) {
        return Vec::new();
    }

    let mut seen = vec![false; topo.size() as usize * topo.size() as usize];
    let mut targets = Vec::new();
    let mut push = |to: Position, targets: &mut Vec<Position>| {
        let idx = topo.index(to);
        if !seen[idx] && destination_allowed(board, from, to, &piece) {
            seen[idx] = true;
            targets.push(to);
        }
    };

    for (dr, dc) in ORTHOGONAL.iter().chain(DIAGONAL.iter()) {
        let to = from.offset(*dr, *dc);
        if topo.are_adjacent(from, to) {
            push(to, &mut targets);
        }
    }

    if topo.is_railway(from) {
        let rail_targets = if piece.rank == Rank::Engineer {
            engineer_reach(board, from)
        } else {
            let mut reach = straight_reach(board, from);
            reach.extend(corner_reach(board, from));
            reach
        };
        for to in rail_targets {
            if to != from && topo.is_railway(to) {
                push(to, &mut targets);
            }
        }
    }

    targets
}

/// Whether the piece on `from` has at least one legal destination
pub fn has_any_move(board: &Board, from: Position) -> bool {
    !possible_moves(board, from).is_empty()
}

fn straight_reach(board: &Board, from: Position) -> Vec<Position> {
    let topo = board.topology();
    let mut reach = Vec::new();
    for (dr, dc) in ORTHOGONAL {
        let mut current = from;
        loop {
            let next = current.offset(dr, dc);
            if !topo.rail_linked(current, next) {
                break;
            }
            reach.push(next);
            if board.is_occupied(next) {
                break;
            }
            current = next;
        }
    }
    reach
}

fn corner_reach(board: &Board, from: Position) -> Vec<Position> {
    let topo = board.topology();
    let mut reach = Vec::new();
    for &(a, b) in topo.corners() {
        for (entry, exit) in [(a, b), (b, a)] {
            if !topo.on_through_line(from, entry) || !line_clear(board, from, entry) {
                continue;
            }
            walk_through_line(topo, board, exit, &mut reach);
        }
    }
    reach
}

/// Walk outward from a corner cell along its depth line, stopping at the
/// first occupied cell
fn walk_through_line(topo: &Topology, board: &Board, corner: Position, reach: &mut Vec<Position>) {
    let Some((seat, _, lateral)) = topo.zone_local(corner) else {
        return;
    };
    for depth in 0..=topo.zone_depth() - 2 {
        let pos = topo.to_global(seat, depth, lateral);
        reach.push(pos);
        if board.is_occupied(pos) {
            break;
        }
    }
}

fn engineer_reach(board: &Board, from: Position) -> Vec<Position> {
    let topo = board.topology();
    let mut visited = vec![false; topo.size() as usize * topo.size() as usize];
    let mut queue = VecDeque::new();
    let mut reach = Vec::new();
    visited[topo.index(from)] = true;
    queue.push_back(from);

    while let Some(current) = queue.pop_front() {
        for &next in topo.rail_neighbors(current) {
            let idx = topo.index(next);
            if visited[idx] {
                continue;
            }
            visited[idx] = true;
            reach.push(next);
            if !board.is_occupied(next) {
                queue.push_back(next);
            }
        }
    }
    reach
}

// ============================================================================
// TESTS
// ============================================================================
