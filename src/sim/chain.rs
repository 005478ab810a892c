//! Explosive chain reactions
//!
//! Breadth-first over the hex adjacency with an explicit queue. The visited set
//! is keyed by grid coordinate, so every coordinate is looked at once no matter
//! how explosive cells are arranged (rings included).

use std::collections::{HashSet, VecDeque};

use super::cell::{CellMap, CellType, GridCoord, HexCell};

/// Cells removed by one chain reaction, in the order they were destroyed
#[derive(Debug, Default)]
pub struct ChainOutcome {
    pub destroyed: Vec<HexCell>,
    /// Coordinates examined (live or not)
    pub visited: usize,
}

/// Destroy everything adjacent to the explosive at `origin`, spreading through
/// any explosive neighbours.
///
/// `origin` must already be removed from `cells`; it is not part of the outcome.
pub fn resolve_chain(origin: GridCoord, cells: &mut CellMap) -> ChainOutcome {
    let mut visited: HashSet<GridCoord> = HashSet::from([origin]);
    let mut queue: VecDeque<GridCoord> = VecDeque::from([origin]);
    let mut destroyed = Vec::new();

    while let Some(coord) = queue.pop_front() {
        for neighbor in coord.neighbors() {
            if !visited.insert(neighbor) {
                continue;
            }
            let Some(cell) = cells.remove(&neighbor) else {
                continue;
            };
            if cell.kind.cell_type() == Some(CellType::Explosive) {
                queue.push_back(neighbor);
            }
            destroyed.push(cell);
        }
    }

    ChainOutcome {
        destroyed,
        visited: visited.len(),
    }
}
