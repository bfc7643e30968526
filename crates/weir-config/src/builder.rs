//! Config text → [`Config`].
//!
//! [`ConfigBuilder`] walks the lexed lines once, dispatching on the first
//! word of each. Arrays are decomposed for this process's rank as they
//! are declared; `write`/`read` selections are resolved to positions in
//! their group immediately, so a later `array` line in the same group is
//! not picked up by an earlier command.

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, trace};
use weir_core::{Dims, ElementKind, StepPolicy, StreamMode, Topology, MAX_DIMS};
use weir_decomp::{compute_local_extent, ProcessGrid};

use crate::command::{Command, CommandKind, StreamIo, DEFAULT_READ_TIMEOUT_SECS};
use crate::config::{Config, StreamBinding};
use crate::error::{ConfigError, ConfigErrorKind};
use crate::group::VariableGroup;
use crate::lexer::{is_comment, lex};
use crate::variable::VariableSpec;

/// Per-process settings that shape the build but are not in the text.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildOptions {
    /// Role id of this process, matched against `app` lines.
    pub role: u64,
    /// Timeout given to every `read` command's `begin_step`.
    pub read_timeout: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            role: 0,
            read_timeout: Duration::from_secs_f64(DEFAULT_READ_TIMEOUT_SECS),
        }
    }
}

/// Builds a [`Config`] for one process.
///
/// # Examples
///
/// ```
/// use weir_config::{BuildOptions, ConfigBuilder};
/// use weir_core::StaticTopology;
///
/// let text = "steps 2\ngroup g\narray int v 1 4 X\nwrite out g\n";
/// let topo = StaticTopology::linear(3, 4);
/// let cfg = ConfigBuilder::new(&topo, BuildOptions::default())
///     .unwrap()
///     .build(text)
///     .unwrap();
/// let v = cfg.group("g").unwrap().get("v").unwrap();
/// assert_eq!(v.start(), &[3]);
/// assert_eq!(v.count(), &[1]);
/// ```
pub struct ConfigBuilder {
    rank: usize,
    process_count: usize,
    grid: ProcessGrid,
    options: BuildOptions,
    config: Config,
    current_group: Option<usize>,
    current_role: Option<u64>,
    line: usize,
}

impl ConfigBuilder {
    /// A builder for the process described by `topology`.
    ///
    /// Fails if the topology reports a zero-sized grid axis.
    pub fn new(topology: &dyn Topology, options: BuildOptions) -> Result<Self, ConfigError> {
        let grid = ProcessGrid::from_topology(topology).map_err(|source| {
            ConfigError::whole_file(ConfigErrorKind::Decomposition {
                array: String::new(),
                source,
            })
        })?;
        Ok(Self {
            rank: topology.rank(),
            process_count: topology.process_count(),
            grid,
            options,
            config: Config::default(),
            current_group: None,
            current_role: None,
            line: 0,
        })
    }

    /// Line number of the most recently processed line (0 before any).
    pub fn line(&self) -> usize {
        self.line
    }

    /// Parse `text` and produce the config.
    pub fn build(mut self, text: &str) -> Result<Config, ConfigError> {
        let verbose = self.rank == 0;
        for line in lex(text) {
            self.line = line.number;
            trace!(line = line.number, words = ?line.words, "config line");
            self.dispatch(&line.words, None)
                .map_err(|kind| ConfigError::at_line(line.number, kind))?;
        }
        if verbose {
            info!(
                steps = self.config.steps,
                groups = self.config.groups.len(),
                commands = self.config.commands.len(),
                streams = self.config.streams.len(),
                "config processed"
            );
        }
        Ok(self.config)
    }

    /// Read a config file and build it.
    pub fn build_file(self, path: &Path) -> Result<Config, ConfigError> {
        let text = read_config_text(path)?;
        if self.rank == 0 {
            info!(path = %path.display(), "processing config file");
        }
        self.build(&text)
    }

    fn dispatch(&mut self, words: &[&str], condition: Option<&str>) -> Result<(), ConfigErrorKind> {
        let key = words[0].to_ascii_lowercase();
        match key.as_str() {
            "cond" => {
                if condition.is_some() {
                    return Err(ConfigErrorKind::NestedCond);
                }
                let stream = word(words, 1, "'cond'")?;
                word(words, 2, "'cond'")?;
                if words[2].eq_ignore_ascii_case("cond") {
                    return Err(ConfigErrorKind::NestedCond);
                }
                self.dispatch(&words[2..], Some(stream))
            }
            "steps" => {
                self.config.steps = parse_u64(words, 1, "steps")?;
                debug!(steps = self.config.steps, "steps set");
                Ok(())
            }
            "group" => {
                let name = word(words, 1, "group")?;
                let entry = self.config.groups.entry(name.to_string());
                let index = entry.index();
                entry.or_insert_with(|| VariableGroup::new(name));
                self.current_group = Some(index);
                debug!(group = name, "new variable group");
                Ok(())
            }
            "app" => {
                let role = parse_u64(words, 1, "app")?;
                self.current_role = Some(role);
                debug!(role, "application id set");
                Ok(())
            }
            "array" => self.array(words),
            "sleep" => {
                let seconds = parse_seconds(words, 1, "sleep")?;
                let micros = (seconds * 1_000_000.0) as u64;
                self.push(CommandKind::Sleep { micros }, condition);
                Ok(())
            }
            "write" => {
                word(words, 2, "'write'")?;
                let io = self.stream_io(words[1], words[2], &words[3..], "write")?;
                if self.applies() {
                    self.bind(&io, StreamMode::Write)?;
                }
                self.push(CommandKind::Write(io), condition);
                Ok(())
            }
            "read" => {
                word(words, 3, "'read'")?;
                let policy = StepPolicy::from_read_mode(words[1]).ok_or_else(|| {
                    ConfigErrorKind::InvalidReadMode {
                        mode: words[1].to_string(),
                    }
                })?;
                let io = self.stream_io(words[2], words[3], &words[4..], "read")?;
                if self.applies() {
                    self.bind(&io, StreamMode::Read)?;
                }
                let timeout = self.options.read_timeout;
                self.push(
                    CommandKind::Read {
                        io,
                        policy,
                        timeout,
                    },
                    condition,
                );
                Ok(())
            }
            _ => Err(ConfigErrorKind::UnknownKeyword { keyword: key }),
        }
    }

    /// Whether command lines at this point belong to this process's role.
    fn applies(&self) -> bool {
        self.current_role.is_none_or(|r| r == self.options.role)
    }

    fn push(&mut self, kind: CommandKind, condition: Option<&str>) {
        let command = Command {
            kind,
            condition: condition.map(str::to_string),
        };
        if self.applies() {
            debug!(%command, "command added");
            self.config.commands.push(command);
        } else {
            trace!(%command, "command belongs to another role");
        }
    }

    fn stream_io(
        &self,
        stream: &str,
        group_name: &str,
        selection: &[&str],
        command: &'static str,
    ) -> Result<StreamIo, ConfigErrorKind> {
        let (group_index, _, group) =
            self.config
                .groups
                .get_full(group_name)
                .ok_or_else(|| ConfigErrorKind::UndefinedGroup {
                    command,
                    group: group_name.to_string(),
                })?;
        let mut variables = Vec::new();
        for &name in selection.iter().take_while(|w| !is_comment(w)) {
            let index = group
                .index_of(name)
                .ok_or_else(|| ConfigErrorKind::UndefinedVariable {
                    command,
                    group: group_name.to_string(),
                    variable: name.to_string(),
                })?;
            variables.push(index);
        }
        let whole_group = variables.is_empty();
        if whole_group {
            variables = (0..group.len()).collect();
        }
        Ok(StreamIo {
            stream: stream.to_string(),
            group: group_name.to_string(),
            group_index,
            variables,
            whole_group,
        })
    }

    fn bind(&mut self, io: &StreamIo, mode: StreamMode) -> Result<(), ConfigErrorKind> {
        match self.config.streams.get(&io.stream) {
            Some(existing) if existing.mode != mode => Err(ConfigErrorKind::StreamModeConflict {
                stream: io.stream.clone(),
                existing: existing.mode,
            }),
            Some(existing) if existing.group != io.group => {
                Err(ConfigErrorKind::StreamGroupConflict {
                    stream: io.stream.clone(),
                    existing: existing.group.clone(),
                    group: io.group.clone(),
                })
            }
            Some(_) => Ok(()),
            None => {
                self.config.streams.insert(
                    io.stream.clone(),
                    StreamBinding {
                        mode,
                        group: io.group.clone(),
                        group_index: io.group_index,
                    },
                );
                Ok(())
            }
        }
    }

    fn array(&mut self, words: &[&str]) -> Result<(), ConfigErrorKind> {
        if words.len() < 4 {
            return Err(ConfigErrorKind::TooFewArrayWords {
                needed: 4,
                found: words.len(),
            });
        }
        let kind = ElementKind::from_config_name(words[1]).ok_or_else(|| {
            ConfigErrorKind::UnsupportedType {
                name: words[1].to_string(),
            }
        })?;
        let name = words[2];
        let ndim = parse_u64(words, 3, &format!("number of dimensions of array {name}"))?;
        if ndim == 0 || ndim > MAX_DIMS as u64 {
            return Err(ConfigErrorKind::InvalidRank {
                array: name.to_string(),
                ndim,
            });
        }
        let ndim = ndim as usize;
        let needed = 4 + 2 * ndim;
        if words.len() < needed {
            return Err(ConfigErrorKind::TooFewArrayWords {
                needed,
                found: words.len(),
            });
        }

        let mut shape = Dims::with_capacity(ndim);
        for i in 0..ndim {
            shape.push(parse_u64(words, 4 + i, &format!("dimension {}", i + 1))?);
        }
        let tokens = &words[4 + ndim..needed];
        let group_index = self
            .current_group
            .ok_or_else(|| ConfigErrorKind::NoCurrentGroup {
                array: name.to_string(),
            })?;
        let extent = compute_local_extent(&shape, tokens, &self.grid, self.rank, self.process_count)
            .map_err(|source| ConfigErrorKind::Decomposition {
                array: name.to_string(),
                source,
            })?;
        if kind.checked_bytes(&shape).is_none() {
            return Err(ConfigErrorKind::ArrayTooLarge {
                array: name.to_string(),
            });
        }

        let (_, group) = self
            .config
            .groups
            .get_index_mut(group_index)
            .ok_or_else(|| ConfigErrorKind::NoCurrentGroup {
                array: name.to_string(),
            })?;

        let variable = VariableSpec::new(name, kind, shape, extent);
        trace!(
            rank = self.rank,
            array = name,
            %kind,
            shape = ?variable.shape(),
            start = ?variable.start(),
            count = ?variable.count(),
            bytes = variable.buffer().len(),
            "array decomposed"
        );
        let group_name = group.name().to_string();
        group
            .insert(variable)
            .map_err(|v| ConfigErrorKind::DuplicateVariable {
                group: group_name,
                variable: v.name().to_string(),
            })?;
        debug!(array = name, %kind, "variable added");
        Ok(())
    }
}

/// Read a config file's text. Failure is not attributed to any line.
pub fn read_config_text(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| {
        ConfigError::whole_file(ConfigErrorKind::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

/// Build a config from text for the process described by `topology`.
pub fn build_config(
    text: &str,
    topology: &dyn Topology,
    options: BuildOptions,
) -> Result<Config, ConfigError> {
    ConfigBuilder::new(topology, options)?.build(text)
}

/// Read and build a config file for the process described by `topology`.
pub fn load_config(
    path: &Path,
    topology: &dyn Topology,
    options: BuildOptions,
) -> Result<Config, ConfigError> {
    ConfigBuilder::new(topology, options)?.build_file(path)
}

// ── word helpers ────────────────────────────────────────────────

fn word<'a>(words: &[&'a str], pos: usize, what: &str) -> Result<&'a str, ConfigErrorKind> {
    words
        .get(pos)
        .copied()
        .ok_or_else(|| ConfigErrorKind::MissingArgument {
            what: what.to_string(),
            position: pos + 1,
        })
}

fn parse_u64(words: &[&str], pos: usize, what: &str) -> Result<u64, ConfigErrorKind> {
    let w = word(words, pos, what)?;
    w.parse::<u64>().map_err(|_| ConfigErrorKind::InvalidInteger {
        what: what.to_string(),
        value: w.to_string(),
    })
}

fn parse_seconds(words: &[&str], pos: usize, what: &str) -> Result<f64, ConfigErrorKind> {
    let w = word(words, pos, what)?;
    match w.parse::<f64>() {
        Ok(s) if s.is_finite() && s >= 0.0 => Ok(s),
        _ => Err(ConfigErrorKind::InvalidSeconds {
            what: what.to_string(),
            value: w.to_string(),
        }),
    }
}
