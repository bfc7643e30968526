//! In-memory stream transport for Weir pipelines.
//!
//! Ranks run as threads inside one OS process. Each thread owns a
//! [`MemoryTransport`]; all of them share one [`MemoryHub`]. Writers'
//! local boxes are assembled into whole global arrays per step, and
//! readers cut their own boxes back out, so producer and consumer sides
//! may decompose the same array differently.
//!
//! ```
//! use weir_core::{ArrayLayout, ElementKind, StepPolicy, StreamMode, Transport};
//! use weir_transport::{MemoryHub, MemoryTransport};
//!
//! let hub = MemoryHub::new();
//! let mut writer = MemoryTransport::new(hub.clone(), 0, 1);
//! let layout = ArrayLayout {
//!     kind: ElementKind::Float64,
//!     shape: [2].into_iter().collect(),
//!     start: [0].into_iter().collect(),
//!     count: [2].into_iter().collect(),
//! };
//! let h = writer.open_stream("demo", StreamMode::Write).unwrap();
//! writer.declare_variable(h, "x", &layout).unwrap();
//! writer.begin_step(h, StepPolicy::Append, None).unwrap();
//! writer.put(h, "x", &[0u8; 16]).unwrap();
//! writer.end_step(h).unwrap();
//! assert_eq!(hub.committed_steps("demo"), 1);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod boxcopy;
pub mod hub;
pub mod transport;

pub use hub::{GlobalArray, MemoryHub, StepData};
pub use transport::MemoryTransport;
