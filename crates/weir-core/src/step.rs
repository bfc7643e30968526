//! Stream modes and step-boundary vocabulary.

use std::fmt;

/// Direction in which a stream is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// The process produces steps on this stream.
    Write,
    /// The process consumes steps from this stream.
    Read,
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Write => write!(f, "write"),
            Self::Read => write!(f, "read"),
        }
    }
}

/// Which step a `begin_step` call should select.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepPolicy {
    /// Start a new output step (writers).
    Append,
    /// The oldest step this reader has not yet consumed.
    NextAvailable,
    /// The newest step available, discarding any older unread steps.
    Latest,
}

impl StepPolicy {
    /// Parse a read mode from config text (`next` or `latest`, any case).
    pub fn from_read_mode(mode: &str) -> Option<Self> {
        if mode.eq_ignore_ascii_case("next") {
            Some(Self::NextAvailable)
        } else if mode.eq_ignore_ascii_case("latest") {
            Some(Self::Latest)
        } else {
            None
        }
    }
}

impl fmt::Display for StepPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Append => write!(f, "append"),
            Self::NextAvailable => write!(f, "next"),
            Self::Latest => write!(f, "latest"),
        }
    }
}

/// Outcome of a `begin_step` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StepStatus {
    /// A step is open and may be used.
    Ok,
    /// No step became available before the timeout expired.
    NotReady,
    /// The producers have closed the stream and every step was consumed.
    EndOfStream,
}

impl StepStatus {
    /// Whether a step was actually opened.
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::NotReady => write!(f, "not ready"),
            Self::EndOfStream => write!(f, "end of stream"),
        }
    }
}

/// Outcome of fetching one variable from the current read step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GetOutcome {
    /// The variable was present and the buffer was filled.
    Found,
    /// The current step does not carry a matching variable.
    NotFound,
}
