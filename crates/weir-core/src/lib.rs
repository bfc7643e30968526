//! Core types and traits for the Weir staging pipeline.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other crate in the workspace: array
//! layouts and element kinds, step and stream modes, the transport error
//! type, and the two collaborator traits the pipeline is driven through,
//! [`Transport`] and [`Topology`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod layout;
pub mod step;
pub mod topology;
pub mod traits;

pub use error::TransportError;
pub use id::{Dims, StreamHandle, GRID_AXES, MAX_DIMS};
pub use layout::{ArrayLayout, ElementKind};
pub use step::{GetOutcome, StepPolicy, StepStatus, StreamMode};
pub use topology::StaticTopology;
pub use traits::{Topology, Transport};
