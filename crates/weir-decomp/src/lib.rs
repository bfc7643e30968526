//! Domain decomposition for Weir pipelines.
//!
//! Maps an array's per-dimension decomposition tokens (`X`, `Y`, `Z`,
//! `V`, `W`, `1`) and the launch-time [`ProcessGrid`] to concrete
//! factors, unravels a linear rank into a coordinate, and derives the
//! local offset and count of that rank's box.
//!
//! # Example
//!
//! ```
//! use weir_decomp::{compute_local_extent, ProcessGrid};
//!
//! // 2x2 processes, a 10x6 array split over both axes.
//! let grid = ProcessGrid::new([2, 2, 1, 1, 1]).unwrap();
//! let e = compute_local_extent(&[10, 6], &["X", "Y"], &grid, 3, 4).unwrap();
//! assert_eq!(e.start.as_slice(), &[5, 3]);
//! assert_eq!(e.count.as_slice(), &[5, 3]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod extent;
pub mod grid;

pub use error::DecompError;
pub use extent::{
    compute_local_extent, decompose, decomposition_factors, slice_along_axis, unravel_rank,
    LocalExtent,
};
pub use grid::{ProcessGrid, AXIS_NAMES};
