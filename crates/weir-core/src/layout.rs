//! Element kinds and the per-process layout of a global array.

use std::fmt;

use crate::id::Dims;

/// Element type of an array variable.
///
/// Determines the byte width of every element in a local buffer and how
/// synthetic values are narrowed when a buffer is filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// IEEE-754 double precision (`double` in config text).
    Float64,
    /// IEEE-754 single precision (`float` in config text).
    Float32,
    /// Signed 32-bit integer (`int` in config text).
    Int32,
}

impl ElementKind {
    /// All supported kinds, in config-name order.
    pub const ALL: [ElementKind; 3] = [Self::Float64, Self::Float32, Self::Int32];

    /// Parse a config type name (`double`, `float`, `int`), ignoring case.
    pub fn from_config_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.config_name().eq_ignore_ascii_case(name))
    }

    /// The name used for this kind in config text.
    pub fn config_name(self) -> &'static str {
        match self {
            Self::Float64 => "double",
            Self::Float32 => "float",
            Self::Int32 => "int",
        }
    }

    /// Size of one element in bytes.
    pub fn width(self) -> usize {
        match self {
            Self::Float64 => 8,
            Self::Float32 => 4,
            Self::Int32 => 4,
        }
    }

    /// Overwrite every element of `buf` with `value` narrowed to this kind.
    ///
    /// Narrowing follows Rust `as` casts: `f32` rounds to nearest, `i32`
    /// truncates toward zero and saturates. A trailing partial element
    /// (when `buf.len()` is not a multiple of the width) is left untouched.
    pub fn fill(self, buf: &mut [u8], value: f64) {
        match self {
            Self::Float64 => fill_with(buf, &value.to_ne_bytes()),
            Self::Float32 => fill_with(buf, &(value as f32).to_ne_bytes()),
            Self::Int32 => fill_with(buf, &(value as i32).to_ne_bytes()),
        }
    }

    /// Bytes needed for an array of `dims` elements of this kind, or
    /// `None` if that exceeds the largest allocatable buffer.
    pub fn checked_bytes(self, dims: &[u64]) -> Option<usize> {
        element_count(dims)?
            .checked_mul(self.width())
            .filter(|&b| b <= isize::MAX as usize)
    }

    /// Decode element `index` of `buf` and widen it to `f64`.
    ///
    /// Returns `None` if the element lies outside the buffer.
    pub fn value_at(self, buf: &[u8], index: usize) -> Option<f64> {
        let w = self.width();
        let bytes = buf.get(index * w..(index + 1) * w)?;
        Some(match self {
            Self::Float64 => f64::from_ne_bytes(bytes.try_into().ok()?),
            Self::Float32 => f64::from(f32::from_ne_bytes(bytes.try_into().ok()?)),
            Self::Int32 => f64::from(i32::from_ne_bytes(bytes.try_into().ok()?)),
        })
    }
}

/// Product of `dims` as `usize`, or `None` on overflow.
fn element_count(dims: &[u64]) -> Option<usize> {
    dims.iter()
        .try_fold(1u64, |acc, &d| acc.checked_mul(d))
        .and_then(|n| usize::try_from(n).ok())
}

fn fill_with(buf: &mut [u8], pattern: &[u8]) {
    for chunk in buf.chunks_exact_mut(pattern.len()) {
        chunk.copy_from_slice(pattern);
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_name())
    }
}

/// Where one process's slice sits inside a global array.
///
/// `shape` is the full extent; `start` and `count` describe this
/// process's box. All three have one entry per array dimension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayLayout {
    /// Element type.
    pub kind: ElementKind,
    /// Global extent per dimension.
    pub shape: Dims,
    /// Offset of the local box per dimension.
    pub start: Dims,
    /// Extent of the local box per dimension.
    pub count: Dims,
}

impl ArrayLayout {
    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Number of elements in the local box.
    ///
    /// Saturates at `usize::MAX`; layouts that passed
    /// [`checked_global_bytes`](Self::checked_global_bytes) never do.
    pub fn local_elements(&self) -> usize {
        element_count(&self.count).unwrap_or(usize::MAX)
    }

    /// Size of the local box in bytes.
    pub fn local_bytes(&self) -> usize {
        self.local_elements().saturating_mul(self.kind.width())
    }

    /// Number of elements in the whole global array, saturating.
    pub fn global_elements(&self) -> usize {
        element_count(&self.shape).unwrap_or(usize::MAX)
    }

    /// Size of the whole global array in bytes, or `None` if it cannot
    /// be allocated in one buffer.
    ///
    /// The local box is never larger, so a layout that passes this check
    /// has a representable local size too.
    pub fn checked_global_bytes(&self) -> Option<usize> {
        self.kind.checked_bytes(&self.shape)
    }

    /// Whether the local box lies within the global shape.
    pub fn box_in_bounds(&self) -> bool {
        self.start.len() == self.ndim()
            && self.count.len() == self.ndim()
            && self
                .shape
                .iter()
                .zip(self.start.iter().zip(self.count.iter()))
                .all(|(&s, (&o, &c))| o.checked_add(c).is_some_and(|end| end <= s))
    }
}
