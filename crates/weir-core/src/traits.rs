//! Collaborator traits the pipeline is driven through.
//!
//! The executor never talks to a staging library or a communicator
//! directly. It sees one [`Transport`] and one [`Topology`] per process,
//! which keeps the core testable with in-memory or scripted doubles.

use std::time::Duration;

use crate::error::TransportError;
use crate::id::{StreamHandle, GRID_AXES};
use crate::layout::ArrayLayout;
use crate::step::{GetOutcome, StepPolicy, StepStatus, StreamMode};

/// This process's place in the run.
pub trait Topology {
    /// Linear rank of this process, `0..process_count()`.
    fn rank(&self) -> usize;

    /// Number of processes taking part in the run.
    fn process_count(&self) -> usize;

    /// Process-grid extents along `X`, `Y`, `Z`, `V`, `W`.
    ///
    /// Unused axes are 1.
    fn process_grid(&self) -> [u64; GRID_AXES];
}

/// Named-stream data exchange with step-boundary synchronization.
///
/// `begin_step` and `end_step` are the synchronization points between
/// cooperating processes; `begin_step`, `put` and `get` may block.
/// Implementations are owned by exactly one executor.
pub trait Transport {
    /// Open a named stream for writing or reading.
    fn open_stream(&mut self, name: &str, mode: StreamMode) -> Result<StreamHandle, TransportError>;

    /// Close a stream. The handle is invalid afterwards.
    fn close_stream(&mut self, handle: StreamHandle) -> Result<(), TransportError>;

    /// Register an array variable and this process's box on a write stream.
    fn declare_variable(
        &mut self,
        handle: StreamHandle,
        name: &str,
        layout: &ArrayLayout,
    ) -> Result<(), TransportError>;

    /// Open the next step on a stream.
    ///
    /// Writers pass [`StepPolicy::Append`] and no timeout. Readers pass
    /// their selection policy and an optional timeout; a timeout that
    /// expires surfaces as [`StepStatus::NotReady`], not as an error.
    fn begin_step(
        &mut self,
        handle: StreamHandle,
        policy: StepPolicy,
        timeout: Option<Duration>,
    ) -> Result<StepStatus, TransportError>;

    /// Close the current step.
    fn end_step(&mut self, handle: StreamHandle) -> Result<(), TransportError>;

    /// Publish this process's slice of a declared variable in the current step.
    fn put(&mut self, handle: StreamHandle, name: &str, data: &[u8]) -> Result<(), TransportError>;

    /// Fetch this process's box of a variable from the current step.
    ///
    /// Returns [`GetOutcome::NotFound`] when the step carries no variable
    /// of that name and element kind.
    fn get(
        &mut self,
        handle: StreamHandle,
        name: &str,
        layout: &ArrayLayout,
        data: &mut [u8],
    ) -> Result<GetOutcome, TransportError>;

    /// Names of the variables present in the current read step.
    fn available_variables(&self, handle: StreamHandle) -> Result<Vec<String>, TransportError>;
}
