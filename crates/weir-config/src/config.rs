//! The built, per-process configuration.

use std::fmt;

use indexmap::IndexMap;
use weir_core::StreamMode;

use crate::command::Command;
use crate::group::VariableGroup;

/// How a stream is used by this process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamBinding {
    /// Whether the process writes or reads the stream.
    pub mode: StreamMode,
    /// The group carried on the stream.
    pub group: String,
    /// Position of that group in the config.
    pub group_index: usize,
}

/// Everything one process needs to run the pipeline.
///
/// Built once by [`ConfigBuilder`](crate::ConfigBuilder) from config
/// text and this process's rank. Decomposition results are
/// rank-specific, so two processes of the same run hold different
/// `Config`s for the same text. Only variable buffers and their
/// upstream flags change after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub(crate) steps: u64,
    pub(crate) groups: IndexMap<String, VariableGroup>,
    pub(crate) commands: Vec<Command>,
    pub(crate) streams: IndexMap<String, StreamBinding>,
}

/// Mutable view of a config for the executor: commands and stream
/// bindings stay shared while group buffers are written.
pub struct ConfigParts<'a> {
    /// Steps to run.
    pub steps: u64,
    /// Commands in declared order.
    pub commands: &'a [Command],
    /// Streams in first-appearance order.
    pub streams: &'a IndexMap<String, StreamBinding>,
    /// Groups in declaration order.
    pub groups: &'a mut IndexMap<String, VariableGroup>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steps: 1,
            groups: IndexMap::new(),
            commands: Vec::new(),
            streams: IndexMap::new(),
        }
    }
}

impl Config {
    /// Number of steps to run.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Groups in declaration order.
    pub fn groups(&self) -> &IndexMap<String, VariableGroup> {
        &self.groups
    }

    /// Group by name.
    pub fn group(&self, name: &str) -> Option<&VariableGroup> {
        self.groups.get(name)
    }

    /// Group by name, mutably.
    pub fn group_mut(&mut self, name: &str) -> Option<&mut VariableGroup> {
        self.groups.get_mut(name)
    }

    /// Commands in declared order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Streams in the order they are first referenced by a command.
    pub fn streams(&self) -> &IndexMap<String, StreamBinding> {
        &self.streams
    }

    /// Split into shared command/stream views and mutable groups.
    pub fn parts_mut(&mut self) -> ConfigParts<'_> {
        ConfigParts {
            steps: self.steps,
            commands: &self.commands,
            streams: &self.streams,
            groups: &mut self.groups,
        }
    }

    /// A human-readable rendering of the whole config.
    pub fn summary(&self) -> ConfigSummary<'_> {
        ConfigSummary(self)
    }
}

/// Display adapter produced by [`Config::summary`].
pub struct ConfigSummary<'a>(&'a Config);

fn write_dims(f: &mut fmt::Formatter<'_>, dims: &[u64]) -> fmt::Result {
    write!(f, "{{")?;
    for (i, d) in dims.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{d}")?;
    }
    write!(f, "}}")
}

impl fmt::Display for ConfigSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cfg = self.0;
        writeln!(f, "Config:")?;
        writeln!(
            f,
            "    steps = {}    groups = {}    commands = {}",
            cfg.steps,
            cfg.groups.len(),
            cfg.commands.len()
        )?;
        for group in cfg.groups.values() {
            writeln!(f, "    Group {}:", group.name())?;
            for v in group.iter() {
                write!(f, "        {}  {}", v.kind(), v.name())?;
                write_dims(f, v.shape())?;
                write!(f, "  decomposed as ")?;
                write_dims(f, v.decomposition())?;
                write!(f, "  local start ")?;
                write_dims(f, v.start())?;
                write!(f, " count ")?;
                write_dims(f, v.count())?;
                writeln!(f)?;
            }
        }
        writeln!(f, "    Commands:")?;
        for cmd in &cfg.commands {
            write!(f, "        {cmd}")?;
            if let Some(io) = cmd.stream_io().filter(|io| !io.whole_group) {
                let group = &cfg.groups[io.group_index];
                write!(f, " with selected variables:")?;
                for v in io.variables.iter().filter_map(|&i| group.at(i)) {
                    write!(f, " {}", v.name())?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
