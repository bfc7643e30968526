//! Strongly-typed handles and the [`Dims`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// Maximum number of dimensions an array variable may declare.
pub const MAX_DIMS: usize = 5;

/// Number of axes in a process grid (`X`, `Y`, `Z`, `V`, `W`).
pub const GRID_AXES: usize = 5;

/// Per-dimension extents, offsets, or factors of an array.
///
/// Uses `SmallVec<[u64; 5]>` so every legal array rank (1..=5) stays
/// inline without a heap allocation.
pub type Dims = SmallVec<[u64; MAX_DIMS]>;

/// Identifies an open stream within one [`Transport`](crate::Transport).
///
/// Handles are issued by `open_stream` and are only meaningful to the
/// transport that issued them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamHandle(pub u32);

impl fmt::Display for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StreamHandle {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
