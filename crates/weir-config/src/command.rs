//! The commands a process replays every step.

use std::fmt;
use std::time::Duration;

use weir_core::StepPolicy;

/// Default timeout for read `begin_step` calls, in seconds.
pub const DEFAULT_READ_TIMEOUT_SECS: f64 = 84600.0;

/// A stream, the group it carries, and the selected variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamIo {
    /// Stream name.
    pub stream: String,
    /// Group name.
    pub group: String,
    /// Position of the group in the config.
    pub group_index: usize,
    /// Selected variables as positions within the group, in selection
    /// order. Never empty unless the group itself is empty.
    pub variables: Vec<usize>,
    /// Whether the selection is the whole group by default.
    pub whole_group: bool,
}

/// What a command does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// Block the process.
    Sleep {
        /// Sleep length in whole microseconds.
        micros: u64,
    },
    /// Publish the selected variables as one step.
    Write(StreamIo),
    /// Consume one step into the selected variables.
    Read {
        /// Stream, group, and selection.
        io: StreamIo,
        /// Which step to select.
        policy: StepPolicy,
        /// How long `begin_step` may wait.
        timeout: Duration,
    },
}

/// One entry of the command pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    /// What to do.
    pub kind: CommandKind,
    /// Stream whose last read outcome gates this command, if any.
    pub condition: Option<String>,
}

impl Command {
    /// An ungated command.
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            condition: None,
        }
    }

    /// The stream I/O part of a write or read.
    pub fn stream_io(&self) -> Option<&StreamIo> {
        match &self.kind {
            CommandKind::Sleep { .. } => None,
            CommandKind::Write(io) | CommandKind::Read { io, .. } => Some(io),
        }
    }

    /// Short keyword for logs.
    pub fn keyword(&self) -> &'static str {
        match self.kind {
            CommandKind::Sleep { .. } => "sleep",
            CommandKind::Write(_) => "write",
            CommandKind::Read { .. } => "read",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            CommandKind::Sleep { micros } => write!(f, "Sleep for {micros} microseconds")?,
            CommandKind::Write(io) => {
                write!(f, "Write to output {} the group {}", io.stream, io.group)?
            }
            CommandKind::Read { io, policy, .. } => {
                let which = match policy {
                    StepPolicy::Latest => "latest step",
                    _ => "next available step",
                };
                write!(f, "Read {which} from {} using the group {}", io.stream, io.group)?
            }
        }
        if let Some(cond) = &self.condition {
            write!(f, " if the last read of '{cond}' succeeded")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn io() -> StreamIo {
        StreamIo {
            stream: "s".into(),
            group: "g".into(),
            group_index: 0,
            variables: vec![0],
            whole_group: true,
        }
    }

    #[test]
    fn sleep_has_no_stream() {
        let c = Command::new(CommandKind::Sleep { micros: 5 });
        assert!(c.stream_io().is_none());
        assert_eq!(c.keyword(), "sleep");
        assert_eq!(c.to_string(), "Sleep for 5 microseconds");
    }

    #[test]
    fn conditional_read_display() {
        let c = Command {
            kind: CommandKind::Read {
                io: io(),
                policy: StepPolicy::Latest,
                timeout: Duration::from_secs(1),
            },
            condition: Some("up".into()),
        };
        assert_eq!(c.stream_io().unwrap().stream, "s");
        assert_eq!(
            c.to_string(),
            "Read latest step from s using the group g if the last read of 'up' succeeded"
        );
    }
}
