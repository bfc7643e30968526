//! Local offset/count computation for one process.
//!
//! A global array of shape `S` decomposed by factors `D` is cut into
//! `D[i]` slices along each dimension `i`. Slices have `S[i] / D[i]`
//! elements, except the last slice along an axis, which also absorbs the
//! remainder of a non-divisible extent. The rule is deterministic so runs
//! with different process counts can be compared element by element.

use smallvec::smallvec;
use weir_core::{Dims, MAX_DIMS};

use crate::error::DecompError;
use crate::grid::ProcessGrid;

/// One process's share of a global array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalExtent {
    /// Process-count factor per dimension.
    pub decomposition: Dims,
    /// This process's coordinate in the decomposition.
    pub coord: Dims,
    /// Offset of the local box per dimension.
    pub start: Dims,
    /// Extent of the local box per dimension.
    pub count: Dims,
}

impl LocalExtent {
    /// Number of elements in the local box.
    pub fn element_count(&self) -> u64 {
        self.count.iter().product()
    }
}

/// Row-major unravel of a linear rank against per-dimension factors.
///
/// The last dimension varies fastest. Ranks beyond the product of the
/// factors wrap in the slowest dimension.
///
/// ```
/// use weir_decomp::unravel_rank;
///
/// assert_eq!(unravel_rank(5, &[2, 3]).as_slice(), &[1, 2]);
/// assert_eq!(unravel_rank(0, &[4]).as_slice(), &[0]);
/// ```
pub fn unravel_rank(rank: u64, factors: &[u64]) -> Dims {
    let mut coord: Dims = smallvec![0; factors.len()];
    let mut rest = rank;
    for (c, &f) in coord.iter_mut().zip(factors).rev() {
        let f = f.max(1);
        *c = rest % f;
        rest /= f;
    }
    coord
}

/// Offset and count of slice `coord` when `extent` is cut into `factor`
/// pieces.
///
/// ```
/// use weir_decomp::slice_along_axis;
///
/// // 10 cells over 3 processes: 3 + 3 + 4.
/// assert_eq!(slice_along_axis(10, 3, 0), (0, 3));
/// assert_eq!(slice_along_axis(10, 3, 1), (3, 3));
/// assert_eq!(slice_along_axis(10, 3, 2), (6, 4));
/// ```
pub fn slice_along_axis(extent: u64, factor: u64, coord: u64) -> (u64, u64) {
    let base = extent / factor.max(1);
    let start = base * coord;
    let count = if coord + 1 == factor && coord != 0 {
        extent - start
    } else {
        base
    };
    (start, count)
}

/// Parse decomposition tokens into per-dimension factors.
///
/// Checks that the factors multiply to `process_count`.
pub fn decomposition_factors<S: AsRef<str>>(
    tokens: &[S],
    grid: &ProcessGrid,
    process_count: usize,
) -> Result<Dims, DecompError> {
    let mut factors = Dims::new();
    let mut product = 1u64;
    for (i, token) in tokens.iter().enumerate() {
        let f = grid.factor(token.as_ref(), i + 1)?;
        product = product
            .checked_mul(f)
            .ok_or(DecompError::FactorOverflow { dimension: 0 })?;
        factors.push(f);
    }
    if product != process_count as u64 {
        return Err(DecompError::ProductMismatch {
            product,
            process_count,
        });
    }
    Ok(factors)
}

/// Local box of `rank` for a global array with numeric factors.
pub fn decompose(shape: &[u64], factors: &[u64], rank: usize) -> LocalExtent {
    let coord = unravel_rank(rank as u64, factors);
    let mut start = Dims::with_capacity(shape.len());
    let mut count = Dims::with_capacity(shape.len());
    for ((&extent, &factor), &c) in shape.iter().zip(factors).zip(&coord) {
        let (s, n) = slice_along_axis(extent, factor, c);
        start.push(s);
        count.push(n);
    }
    LocalExtent {
        decomposition: factors.iter().copied().collect(),
        coord,
        start,
        count,
    }
}

/// Compute this process's share of a global array from config tokens.
///
/// Validates the dimension count (1..=5, one token per dimension), that
/// every extent is non-zero, that every token is legal, that the factor
/// product equals `process_count`, and that `rank < process_count`.
pub fn compute_local_extent<S: AsRef<str>>(
    shape: &[u64],
    tokens: &[S],
    grid: &ProcessGrid,
    rank: usize,
    process_count: usize,
) -> Result<LocalExtent, DecompError> {
    if shape.is_empty() || shape.len() > MAX_DIMS || shape.len() != tokens.len() {
        return Err(DecompError::DimensionCount {
            shape: shape.len(),
            tokens: tokens.len(),
        });
    }
    if let Some(i) = shape.iter().position(|&e| e == 0) {
        return Err(DecompError::ZeroExtent { dimension: i + 1 });
    }
    let factors = decomposition_factors(tokens, grid, process_count)?;
    if rank >= process_count {
        return Err(DecompError::RankOutOfRange {
            rank,
            process_count,
        });
    }
    Ok(decompose(shape, &factors, rank))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn grid(axes: [u64; 5]) -> ProcessGrid {
        ProcessGrid::new(axes).unwrap()
    }

    #[test]
    fn unravel_last_dimension_fastest() {
        let coords: Vec<Vec<u64>> = (0..6).map(|r| unravel_rank(r, &[2, 3]).to_vec()).collect();
        assert_eq!(
            coords,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
    }

    #[test]
    fn single_factor_keeps_whole_extent() {
        assert_eq!(slice_along_axis(7, 1, 0), (0, 7));
    }

    #[test]
    fn more_factors_than_cells_puts_everything_last() {
        assert_eq!(slice_along_axis(2, 4, 0), (0, 0));
        assert_eq!(slice_along_axis(2, 4, 3), (0, 2));
    }

    #[test]
    fn four_ranks_over_four_cells() {
        let g = grid([4, 1, 1, 1, 1]);
        for rank in 0..4 {
            let e = compute_local_extent(&[4], &["X"], &g, rank, 4).unwrap();
            assert_eq!(e.start.as_slice(), &[rank as u64]);
            assert_eq!(e.count.as_slice(), &[1]);
        }
    }

    #[test]
    fn two_dimensional_split() {
        let g = grid([2, 3, 1, 1, 1]);
        let e = compute_local_extent(&[10, 20], &["X", "Y"], &g, 5, 6).unwrap();
        assert_eq!(e.coord.as_slice(), &[1, 2]);
        assert_eq!(e.start.as_slice(), &[5, 12]);
        assert_eq!(e.count.as_slice(), &[5, 8]);
        assert_eq!(e.element_count(), 40);
    }

    #[test]
    fn combined_token_and_undecomposed_dimension() {
        let g = grid([2, 2, 1, 1, 1]);
        let e = compute_local_extent(&[8, 3], &["XY", "1"], &g, 3, 4).unwrap();
        assert_eq!(e.decomposition.as_slice(), &[4, 1]);
        assert_eq!(e.start.as_slice(), &[6, 0]);
        assert_eq!(e.count.as_slice(), &[2, 3]);
    }

    #[test]
    fn product_mismatch_rejected() {
        let g = grid([2, 2, 1, 1, 1]);
        let err = compute_local_extent(&[8], &["X"], &g, 0, 4).unwrap_err();
        assert_eq!(
            err,
            DecompError::ProductMismatch {
                product: 2,
                process_count: 4
            }
        );
    }

    #[test]
    fn dimension_count_checked() {
        let g = ProcessGrid::default();
        assert!(matches!(
            compute_local_extent::<&str>(&[], &[], &g, 0, 1),
            Err(DecompError::DimensionCount { .. })
        ));
        assert!(matches!(
            compute_local_extent(&[1, 1, 1, 1, 1, 1], &["1"; 6], &g, 0, 1),
            Err(DecompError::DimensionCount { .. })
        ));
        assert!(matches!(
            compute_local_extent(&[4, 4], &["1"], &g, 0, 1),
            Err(DecompError::DimensionCount { .. })
        ));
    }

    #[test]
    fn zero_extent_rejected() {
        let g = ProcessGrid::default();
        assert_eq!(
            compute_local_extent(&[3, 0], &["1", "1"], &g, 0, 1),
            Err(DecompError::ZeroExtent { dimension: 2 })
        );
    }

    #[test]
    fn rank_out_of_range_rejected() {
        let g = grid([2, 1, 1, 1, 1]);
        assert_eq!(
            compute_local_extent(&[4], &["X"], &g, 2, 2),
            Err(DecompError::RankOutOfRange {
                rank: 2,
                process_count: 2
            })
        );
    }

    proptest! {
        #[test]
        fn slices_tile_the_axis(extent in 1u64..500, factor in 1u64..40) {
            let mut next = 0u64;
            let mut total = 0u64;
            for coord in 0..factor {
                let (start, count) = slice_along_axis(extent, factor, coord);
                if count > 0 {
                    prop_assert_eq!(start, next);
                    next = start + count;
                }
                total += count;
            }
            prop_assert_eq!(total, extent);
            prop_assert_eq!(next, extent);
        }

        #[test]
        fn factors_multiply_to_process_count_or_fail(
            axes in proptest::array::uniform5(1u64..5),
            tokens in proptest::collection::vec("[XYZVW1]{1,3}", 1..=5),
            process_count in 1usize..200,
        ) {
            let g = ProcessGrid::new(axes).unwrap();
            match decomposition_factors(&tokens, &g, process_count) {
                Ok(f) => prop_assert_eq!(f.iter().product::<u64>(), process_count as u64),
                Err(DecompError::ProductMismatch { product, .. }) => {
                    prop_assert_ne!(product, process_count as u64)
                }
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
        }

        #[test]
        fn every_rank_gets_an_in_bounds_box(
            shape in proptest::collection::vec(1u64..50, 1..=3),
            seed in proptest::collection::vec(1u64..4, 3),
        ) {
            let factors: Vec<u64> = seed[..shape.len()].to_vec();
            let nproc: u64 = factors.iter().product();
            let mut covered = 0u64;
            for rank in 0..nproc as usize {
                let e = decompose(&shape, &factors, rank);
                for i in 0..shape.len() {
                    prop_assert!(e.start[i] + e.count[i] <= shape[i]);
                }
                covered += e.element_count();
            }
            prop_assert_eq!(covered, shape.iter().product::<u64>());
        }
    }
}
