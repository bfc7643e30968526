//! Command pipeline executor for Weir staging pipelines.
//!
//! Drives one process's [`Config`](weir_config::Config) through its
//! steps: opens the planned streams, replays sleep/write/read commands
//! with conditional gating, fills unsupplied variables with a
//! rank-and-step stamp, and reports a [`RunMetrics`] summary.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod condition;
pub mod error;
pub mod executor;
pub mod fill;
pub mod metrics;

pub use condition::ConditionTable;
pub use error::RunError;
pub use executor::PipelineExecutor;
pub use fill::{digits, expected_value, step_divisor};
pub use metrics::{RunMetrics, StreamMetrics};
