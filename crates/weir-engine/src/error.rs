//! Errors that stop a run.

use std::error::Error;
use std::fmt;

use weir_core::TransportError;

/// A failure that aborts the executor's main loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunError {
    /// The transport rejected an operation on a stream.
    Transport {
        /// Stream the operation addressed.
        stream: String,
        /// What the transport reported.
        source: TransportError,
    },
    /// A command names a stream missing from the stream plan.
    UnboundStream {
        /// Stream name.
        stream: String,
    },
    /// A command refers to a group the config does not have.
    UnknownGroup {
        /// Group name.
        group: String,
    },
    /// A command refers to a variable position its group does not have.
    MissingVariable {
        /// Group name.
        group: String,
        /// Position within the group.
        index: usize,
    },
}

impl RunError {
    pub(crate) fn transport(stream: &str) -> impl FnOnce(TransportError) -> RunError + '_ {
        move |source| RunError::Transport {
            stream: stream.to_string(),
            source,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport { stream, source } => write!(f, "stream '{stream}': {source}"),
            Self::UnboundStream { stream } => {
                write!(f, "stream '{stream}' is not in the stream plan")
            }
            Self::UnknownGroup { group } => write!(f, "group '{group}' is not defined"),
            Self::MissingVariable { group, index } => {
                write!(f, "group '{group}' has no variable at position {index}")
            }
        }
    }
}

impl Error for RunError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport { source, .. } => Some(source),
            _ => None,
        }
    }
}
