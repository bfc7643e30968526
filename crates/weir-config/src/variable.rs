//! Array variables and their per-process buffers.

use weir_core::{ArrayLayout, Dims, ElementKind};
use weir_decomp::LocalExtent;

/// One array variable as seen by this process.
///
/// Holds the global shape, the decomposition factors, this process's
/// box, and the byte buffer for that box. The buffer is allocated once
/// at build time and never resized; each step either copies transport
/// data into it or overwrites it with a synthetic value.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableSpec {
    name: String,
    layout: ArrayLayout,
    decomposition: Dims,
    buffer: Vec<u8>,
    supplied_by_upstream: bool,
}

impl VariableSpec {
    /// Create a variable from its global shape and this process's extent.
    ///
    /// The buffer is zero-initialised and sized to the local box.
    pub fn new(name: impl Into<String>, kind: ElementKind, shape: Dims, extent: LocalExtent) -> Self {
        let layout = ArrayLayout {
            kind,
            shape,
            start: extent.start,
            count: extent.count,
        };
        let buffer = vec![0u8; layout.local_bytes()];
        Self {
            name: name.into(),
            layout,
            decomposition: extent.decomposition,
            buffer,
            supplied_by_upstream: false,
        }
    }

    /// Variable name, unique within its group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Element type.
    pub fn kind(&self) -> ElementKind {
        self.layout.kind
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.layout.ndim()
    }

    /// Global extent per dimension.
    pub fn shape(&self) -> &[u64] {
        &self.layout.shape
    }

    /// Process-count factor per dimension.
    pub fn decomposition(&self) -> &[u64] {
        &self.decomposition
    }

    /// This process's offset per dimension.
    pub fn start(&self) -> &[u64] {
        &self.layout.start
    }

    /// This process's extent per dimension.
    pub fn count(&self) -> &[u64] {
        &self.layout.count
    }

    /// Kind, shape, and local box, as handed to a transport.
    pub fn layout(&self) -> &ArrayLayout {
        &self.layout
    }

    /// The local buffer.
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// The local buffer, for copy-in by a read.
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Name, layout, and buffer at once, for copying transport data in.
    pub fn read_target(&mut self) -> (&str, &ArrayLayout, &mut [u8]) {
        (&self.name, &self.layout, &mut self.buffer)
    }

    /// Number of elements in the local buffer.
    pub fn element_count(&self) -> usize {
        self.layout.local_elements()
    }

    /// Whether the most recent read in the current step supplied this
    /// variable's data.
    pub fn supplied_by_upstream(&self) -> bool {
        self.supplied_by_upstream
    }

    /// Record whether a read supplied this variable.
    pub fn set_supplied_by_upstream(&mut self, supplied: bool) {
        self.supplied_by_upstream = supplied;
    }

    /// Overwrite every local element with `value`, narrowed to the kind.
    pub fn fill(&mut self, value: f64) {
        self.layout.kind.fill(&mut self.buffer, value);
    }

    /// Element `index` of the local buffer, widened to `f64`.
    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.layout.kind.value_at(&self.buffer, index)
    }
}
