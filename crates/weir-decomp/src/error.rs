//! Error types for decomposition.

use std::fmt;

/// Errors arising from grid construction or local-extent computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecompError {
    /// A process-grid axis was given as zero.
    ZeroAxis {
        /// Axis letter (`X`..`W`).
        axis: char,
    },
    /// A decomposition token contains a character outside `XYZVW1`.
    InvalidIdentifier {
        /// The offending character, as written.
        character: char,
        /// 1-based position of the character in the token.
        position: usize,
        /// 1-based array dimension the token belongs to.
        dimension: usize,
    },
    /// The per-dimension factors do not multiply to the process count.
    ProductMismatch {
        /// Product of the factors.
        product: u64,
        /// Number of processes in the run.
        process_count: usize,
    },
    /// A factor product does not fit in `u64`.
    FactorOverflow {
        /// 1-based array dimension, or 0 for the product over dimensions.
        dimension: usize,
    },
    /// Shape and token lists have different lengths, or the rank is
    /// outside the supported range.
    DimensionCount {
        /// Number of shape entries.
        shape: usize,
        /// Number of decomposition tokens.
        tokens: usize,
    },
    /// A global extent is zero.
    ZeroExtent {
        /// 1-based array dimension.
        dimension: usize,
    },
    /// The process rank is not below the process count.
    RankOutOfRange {
        /// The rank that was given.
        rank: usize,
        /// Number of processes in the run.
        process_count: usize,
    },
}

impl fmt::Display for DecompError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroAxis { axis } => {
                write!(f, "process grid axis {axis} must be at least 1")
            }
            Self::InvalidIdentifier {
                character,
                position,
                dimension,
            } => write!(
                f,
                "Invalid identifier '{character}' for decomposition {dimension} in character \
                 position {position}. Only accepted characters are XYZVW and 1"
            ),
            Self::ProductMismatch {
                product,
                process_count,
            } => write!(
                f,
                "The product of the decompositions (here {product}) must equal the number \
                 of processes (here {process_count})"
            ),
            Self::FactorOverflow { dimension: 0 } => {
                write!(f, "product of the decompositions overflows")
            }
            Self::FactorOverflow { dimension } => {
                write!(f, "decomposition {dimension} overflows")
            }
            Self::DimensionCount { shape, tokens } => write!(
                f,
                "{shape} dimensions with {tokens} decomposition tokens; \
                 need between 1 and {} of each",
                weir_core::MAX_DIMS
            ),
            Self::ZeroExtent { dimension } => {
                write!(f, "dimension {dimension} must be at least 1")
            }
            Self::RankOutOfRange {
                rank,
                process_count,
            } => write!(f, "rank {rank} is not below the process count {process_count}"),
        }
    }
}

impl std::error::Error for DecompError {}
