//! Error types shared across the Weir workspace.
//!
//! Only transport failures live here; configuration errors belong to
//! `weir-config` and decomposition errors to `weir-decomp`.

use std::error::Error;
use std::fmt;

use crate::id::StreamHandle;
use crate::step::StepPolicy;

/// Errors surfaced by a [`Transport`](crate::Transport) implementation.
///
/// Every variant is fatal for the process's main loop: the executor
/// aborts immediately and does not retry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportError {
    /// The handle does not refer to an open stream.
    UnknownHandle {
        /// The offending handle.
        handle: StreamHandle,
    },
    /// The stream is already open in this transport.
    AlreadyOpen {
        /// Stream name.
        stream: String,
    },
    /// A step operation was issued in the wrong state (for example
    /// `end_step` without a matching `begin_step`).
    StepState {
        /// Stream name.
        stream: String,
        /// What was attempted.
        reason: String,
    },
    /// The step policy does not fit the stream mode (for example
    /// `Latest` on a write stream).
    PolicyMismatch {
        /// Stream name.
        stream: String,
        /// The rejected policy.
        policy: StepPolicy,
    },
    /// A variable was put without being declared first.
    UndeclaredVariable {
        /// Stream name.
        stream: String,
        /// Variable name.
        variable: String,
    },
    /// A buffer's size does not match the declared layout.
    SizeMismatch {
        /// Variable name.
        variable: String,
        /// Expected size in bytes.
        expected: usize,
        /// Actual size in bytes.
        actual: usize,
    },
    /// A requested box lies outside the global array.
    SelectionOutOfBounds {
        /// Variable name.
        variable: String,
    },
    /// A declared global array is too large to allocate.
    ArrayTooLarge {
        /// Variable name.
        variable: String,
    },
    /// Any other failure reported by the transport backend.
    Backend {
        /// Backend-provided message.
        message: String,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownHandle { handle } => write!(f, "unknown stream handle {handle}"),
            Self::AlreadyOpen { stream } => write!(f, "stream '{stream}' is already open"),
            Self::StepState { stream, reason } => {
                write!(f, "stream '{stream}': {reason}")
            }
            Self::PolicyMismatch { stream, policy } => {
                write!(f, "stream '{stream}' cannot begin a step with policy '{policy}'")
            }
            Self::UndeclaredVariable { stream, variable } => {
                write!(f, "variable '{variable}' was not declared on stream '{stream}'")
            }
            Self::SizeMismatch {
                variable,
                expected,
                actual,
            } => write!(
                f,
                "buffer for '{variable}' is {actual} bytes, layout requires {expected}"
            ),
            Self::SelectionOutOfBounds { variable } => {
                write!(f, "selection for '{variable}' lies outside the global shape")
            }
            Self::ArrayTooLarge { variable } => {
                write!(f, "global array '{variable}' is too large to allocate")
            }
            Self::Backend { message } => f.write_str(message),
        }
    }
}

impl Error for TransportError {}
