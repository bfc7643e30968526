//! The five-axis process grid and decomposition tokens.

use std::fmt;

use weir_core::{Topology, GRID_AXES};

use crate::error::DecompError;

/// Axis letters in grid order.
pub const AXIS_NAMES: [char; GRID_AXES] = ['X', 'Y', 'Z', 'V', 'W'];

/// Extents of the process grid along `X`, `Y`, `Z`, `V`, `W`.
///
/// The grid is how the run was launched; an array's decomposition picks
/// axes out of it per dimension. Every axis is at least 1.
///
/// # Examples
///
/// ```
/// use weir_decomp::ProcessGrid;
///
/// let grid = ProcessGrid::new([2, 3, 1, 1, 1]).unwrap();
/// assert_eq!(grid.factor("XY", 1).unwrap(), 6);
/// assert_eq!(grid.factor("y1", 2).unwrap(), 3);
/// assert!(grid.factor("Q", 1).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProcessGrid {
    axes: [u64; GRID_AXES],
}

impl ProcessGrid {
    /// Build a grid, rejecting zero-sized axes.
    pub fn new(axes: [u64; GRID_AXES]) -> Result<Self, DecompError> {
        if let Some(i) = axes.iter().position(|&a| a == 0) {
            return Err(DecompError::ZeroAxis {
                axis: AXIS_NAMES[i],
            });
        }
        Ok(Self { axes })
    }

    /// Build a grid from the first up-to-five extents; missing axes are 1.
    pub fn from_prefix(extents: &[u64]) -> Result<Self, DecompError> {
        let mut axes = [1; GRID_AXES];
        for (slot, &e) in axes.iter_mut().zip(extents) {
            *slot = e;
        }
        Self::new(axes)
    }

    /// The grid a topology reports.
    pub fn from_topology(topology: &dyn Topology) -> Result<Self, DecompError> {
        Self::new(topology.process_grid())
    }

    /// Extent along axis `i` (0 = `X`).
    pub fn axis(&self, i: usize) -> u64 {
        self.axes[i]
    }

    /// All axis extents.
    pub fn axes(&self) -> [u64; GRID_AXES] {
        self.axes
    }

    /// Product of all axes, saturating at `u64::MAX`.
    pub fn size(&self) -> u64 {
        self.axes.iter().fold(1u64, |acc, &a| acc.saturating_mul(a))
    }

    /// Decomposition factor for one array dimension.
    ///
    /// Each character of `token` contributes a multiplicative factor:
    /// `X`..`W` the matching axis extent, `1` nothing. Letters are
    /// case-insensitive. `dimension` is 1-based and only used in errors.
    pub fn factor(&self, token: &str, dimension: usize) -> Result<u64, DecompError> {
        let mut factor = 1u64;
        for (i, c) in token.chars().enumerate() {
            let upper = c.to_ascii_uppercase();
            let f = if upper == '1' {
                1
            } else if let Some(axis) = AXIS_NAMES.iter().position(|&a| a == upper) {
                self.axes[axis]
            } else {
                return Err(DecompError::InvalidIdentifier {
                    character: c,
                    position: i + 1,
                    dimension,
                });
            };
            factor = factor
                .checked_mul(f)
                .ok_or(DecompError::FactorOverflow { dimension })?;
        }
        Ok(factor)
    }
}

impl Default for ProcessGrid {
    fn default() -> Self {
        Self {
            axes: [1; GRID_AXES],
        }
    }
}

impl fmt::Display for ProcessGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x, y, z, v, w] = self.axes;
        write!(f, "X={x} Y={y} Z={z} V={v} W={w}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_axis_rejected_with_letter() {
        assert_eq!(
            ProcessGrid::new([2, 0, 1, 1, 1]),
            Err(DecompError::ZeroAxis { axis: 'Y' })
        );
    }

    #[test]
    fn prefix_pads_with_ones() {
        let g = ProcessGrid::from_prefix(&[4, 2]).unwrap();
        assert_eq!(g.axes(), [4, 2, 1, 1, 1]);
        assert_eq!(g.size(), 8);
    }

    #[test]
    fn literal_one_is_neutral() {
        let g = ProcessGrid::new([4, 1, 1, 1, 1]).unwrap();
        assert_eq!(g.factor("1", 1).unwrap(), 1);
        assert_eq!(g.factor("11X", 1).unwrap(), 4);
    }

    #[test]
    fn repeated_axis_multiplies() {
        let g = ProcessGrid::new([3, 1, 1, 1, 1]).unwrap();
        assert_eq!(g.factor("XX", 1).unwrap(), 9);
    }

    #[test]
    fn every_axis_letter_maps() {
        let g = ProcessGrid::new([2, 3, 5, 7, 11]).unwrap();
        assert_eq!(g.factor("x", 1).unwrap(), 2);
        assert_eq!(g.factor("Y", 1).unwrap(), 3);
        assert_eq!(g.factor("z", 1).unwrap(), 5);
        assert_eq!(g.factor("V", 1).unwrap(), 7);
        assert_eq!(g.factor("w", 1).unwrap(), 11);
        assert_eq!(g.factor("XYZVW", 1).unwrap(), 2310);
    }

    #[test]
    fn invalid_identifier_reports_position() {
        let g = ProcessGrid::default();
        let err = g.factor("X2", 3).unwrap_err();
        assert_eq!(
            err,
            DecompError::InvalidIdentifier {
                character: '2',
                position: 2,
                dimension: 3,
            }
        );
        assert!(err.to_string().contains("'2' for decomposition 3 in character position 2"));
    }

    #[test]
    fn display_lists_axes() {
        let g = ProcessGrid::new([2, 3, 1, 1, 1]).unwrap();
        assert_eq!(g.to_string(), "X=2 Y=3 Z=1 V=1 W=1");
    }
}
