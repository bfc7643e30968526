//! A fixed [`Topology`] for single processes, threads, and tests.

use crate::id::GRID_AXES;
use crate::traits::Topology;

/// A topology whose values are known up front.
///
/// Used when the rank and process count come from the command line or
/// from a thread index rather than from a communicator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticTopology {
    rank: usize,
    process_count: usize,
    grid: [u64; GRID_AXES],
}

impl StaticTopology {
    /// A topology with an explicit process grid.
    pub fn new(rank: usize, process_count: usize, grid: [u64; GRID_AXES]) -> Self {
        Self {
            rank,
            process_count,
            grid,
        }
    }

    /// A topology whose grid is `process_count` along `X` and 1 elsewhere.
    pub fn linear(rank: usize, process_count: usize) -> Self {
        Self::new(rank, process_count, [process_count as u64, 1, 1, 1, 1])
    }

    /// The same grid seen from a different rank.
    pub fn with_rank(&self, rank: usize) -> Self {
        Self { rank, ..self.clone() }
    }
}

impl Topology for StaticTopology {
    fn rank(&self) -> usize {
        self.rank
    }

    fn process_count(&self) -> usize {
        self.process_count
    }

    fn process_grid(&self) -> [u64; GRID_AXES] {
        self.grid
    }
}
