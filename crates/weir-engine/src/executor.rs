//! The per-process command loop.
//!
//! [`PipelineExecutor`] owns one process's [`Config`] and [`Transport`].
//! A run opens every stream of the stream plan, replays the command list
//! once per step, and closes the streams again:
//!
//! ```text
//! open streams (plan order)
//! for step in 1..=steps:
//!     clear supplied flags
//!     for command in commands:
//!         skip if gated on a stream whose last read failed
//!         sleep | write (fill, declare, begin, put, end) | read (begin, get, end)
//! close streams (plan order)
//! ```
//!
//! Transport errors abort the run. A read that finds no step is not an
//! error: it records the stream's condition as false and moves on.

use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, info, trace, warn};
use weir_config::{Command, CommandKind, Config, StreamBinding, StreamIo, VariableGroup};
use weir_core::{GetOutcome, StepPolicy, StreamHandle, Transport};

use crate::condition::ConditionTable;
use crate::error::RunError;
use crate::fill::expected_value;
use crate::metrics::RunMetrics;

/// One opened stream of the stream plan.
struct OpenStream {
    handle: StreamHandle,
    /// Variable positions already declared on a write stream.
    declared: HashSet<usize>,
}

/// Runs one process's command pipeline against a transport.
///
/// # Example
///
/// ```
/// use weir_config::{build_config, BuildOptions};
/// use weir_core::StaticTopology;
/// use weir_engine::PipelineExecutor;
/// use weir_transport::{MemoryHub, MemoryTransport};
///
/// let text = "steps 3\ngroup g\narray double x 1 8 X\nwrite out g\n";
/// let cfg = build_config(text, &StaticTopology::linear(0, 1), BuildOptions::default()).unwrap();
/// let hub = MemoryHub::new();
/// let mut exec = PipelineExecutor::new(cfg, MemoryTransport::new(hub.clone(), 0, 1), 0);
/// let metrics = exec.run().unwrap();
/// assert_eq!(metrics.steps, 3);
/// assert_eq!(hub.committed_steps("out"), 3);
/// ```
pub struct PipelineExecutor<T: Transport> {
    config: Config,
    transport: T,
    rank: usize,
    conditions: ConditionTable,
    metrics: RunMetrics,
    open: Vec<OpenStream>,
}

impl<T: Transport> PipelineExecutor<T> {
    /// An executor for `rank`, ready to [`run`](Self::run).
    pub fn new(config: Config, transport: T, rank: usize) -> Self {
        Self {
            config,
            transport,
            rank,
            conditions: ConditionTable::new(),
            metrics: RunMetrics::default(),
            open: Vec::new(),
        }
    }

    /// The config, including variable buffers as of the last step.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Outcome of the most recent read per stream.
    pub fn conditions(&self) -> &ConditionTable {
        &self.conditions
    }

    /// Give back the config and transport.
    pub fn into_parts(self) -> (Config, T) {
        (self.config, self.transport)
    }

    /// Run every step, then close all streams.
    pub fn run(&mut self) -> Result<RunMetrics, RunError> {
        let started = Instant::now();
        self.metrics = RunMetrics::default();
        self.open_streams()?;
        let steps = self.config.steps();
        for step in 1..=steps {
            self.run_step(step)?;
        }
        self.close_streams()?;
        self.metrics.wall = started.elapsed();
        if self.rank == 0 {
            info!(metrics = %self.metrics, "run complete");
        }
        Ok(self.metrics.clone())
    }

    fn open_streams(&mut self) -> Result<(), RunError> {
        self.open.clear();
        for (name, binding) in self.config.streams() {
            let handle = self
                .transport
                .open_stream(name, binding.mode)
                .map_err(RunError::transport(name))?;
            debug!(rank = self.rank, stream = %name, mode = %binding.mode, group = %binding.group, "stream opened");
            self.open.push(OpenStream {
                handle,
                declared: HashSet::new(),
            });
            self.metrics.stream_mut(name);
        }
        Ok(())
    }

    fn close_streams(&mut self) -> Result<(), RunError> {
        for ((name, _), stream) in self.config.streams().iter().zip(&self.open) {
            self.transport
                .close_stream(stream.handle)
                .map_err(RunError::transport(name))?;
            debug!(rank = self.rank, stream = %name, "stream closed");
        }
        self.open.clear();
        Ok(())
    }

    /// Execute every command once for 1-based `step`.
    fn run_step(&mut self, step: u64) -> Result<(), RunError> {
        let parts = self.config.parts_mut();
        if self.rank == 0 {
            info!("Step {step}:");
        }
        for group in parts.groups.values_mut() {
            for v in group.iter_mut() {
                v.set_supplied_by_upstream(false);
            }
        }

        let value = expected_value(self.rank, step, parts.steps);
        for command in parts.commands {
            if !self.conditions.allows(command.condition.as_deref()) {
                trace!(rank = self.rank, step, %command, "skipped");
                self.metrics.skipped_commands += 1;
                continue;
            }
            let mut ctx = StepContext {
                transport: &mut self.transport,
                conditions: &mut self.conditions,
                metrics: &mut self.metrics,
                open: &mut self.open,
                streams: parts.streams,
                rank: self.rank,
                step,
            };
            match &command.kind {
                CommandKind::Sleep { micros } => ctx.sleep(*micros),
                CommandKind::Write(io) => {
                    let group = group_mut(parts.groups, io)?;
                    ctx.write(command, io, group, value)?
                }
                CommandKind::Read {
                    io,
                    policy,
                    timeout,
                } => {
                    let group = group_mut(parts.groups, io)?;
                    ctx.read(io, group, *policy, *timeout)?
                }
            }
        }
        self.metrics.steps = step;
        Ok(())
    }
}

fn group_mut<'g>(
    groups: &'g mut IndexMap<String, VariableGroup>,
    io: &StreamIo,
) -> Result<&'g mut VariableGroup, RunError> {
    groups
        .get_index_mut(io.group_index)
        .map(|(_, g)| g)
        .ok_or_else(|| RunError::UnknownGroup {
            group: io.group.clone(),
        })
}

/// Borrowed executor state for one command.
struct StepContext<'a, T: Transport> {
    transport: &'a mut T,
    conditions: &'a mut ConditionTable,
    metrics: &'a mut RunMetrics,
    open: &'a mut [OpenStream],
    streams: &'a IndexMap<String, StreamBinding>,
    rank: usize,
    step: u64,
}

impl<T: Transport> StepContext<'_, T> {
    fn stream_index(&self, io: &StreamIo) -> Result<usize, RunError> {
        self.streams
            .get_index_of(&io.stream)
            .filter(|&i| i < self.open.len())
            .ok_or_else(|| RunError::UnboundStream {
                stream: io.stream.clone(),
            })
    }

    fn sleep(&mut self, micros: u64) {
        let d = Duration::from_micros(micros);
        trace!(rank = self.rank, step = self.step, micros, "sleep");
        thread::sleep(d);
        self.metrics.sleep += d;
    }

    fn write(
        &mut self,
        command: &Command,
        io: &StreamIo,
        group: &mut VariableGroup,
        value: f64,
    ) -> Result<(), RunError> {
        let idx = self.stream_index(io)?;
        let to_err = RunError::transport;
        let stream = &mut self.open[idx];

        for &i in &io.variables {
            let var = group.at_mut(i).ok_or_else(|| RunError::MissingVariable {
                group: io.group.clone(),
                index: i,
            })?;
            if !var.supplied_by_upstream() {
                if self.rank == 0 {
                    debug!(variable = var.name(), value, "fill array for output");
                }
                var.fill(value);
            }
            if stream.declared.insert(i) {
                self.transport
                    .declare_variable(stream.handle, var.name(), var.layout())
                    .map_err(to_err(&io.stream))?;
            }
        }

        if self.rank == 0 {
            debug!(step = self.step, %command, "write data");
        }
        let status = self
            .transport
            .begin_step(stream.handle, StepPolicy::Append, None)
            .map_err(to_err(&io.stream))?;
        if !status.is_ok() {
            warn!(rank = self.rank, stream = %io.stream, %status, "output step not available");
            return Ok(());
        }
        for &i in &io.variables {
            let var = group.at(i).ok_or_else(|| RunError::MissingVariable {
                group: io.group.clone(),
                index: i,
            })?;
            self.transport
                .put(stream.handle, var.name(), var.buffer())
                .map_err(to_err(&io.stream))?;
        }
        self.transport
            .end_step(stream.handle)
            .map_err(to_err(&io.stream))?;
        self.metrics.stream_mut(&io.stream).writes += 1;
        Ok(())
    }

    fn read(
        &mut self,
        io: &StreamIo,
        group: &mut VariableGroup,
        policy: StepPolicy,
        timeout: Duration,
    ) -> Result<(), RunError> {
        let idx = self.stream_index(io)?;
        let handle = self.open[idx].handle;
        let to_err = RunError::transport;

        let status = self
            .transport
            .begin_step(handle, policy, Some(timeout))
            .map_err(to_err(&io.stream))?;
        if !status.is_ok() {
            warn!(rank = self.rank, step = self.step, stream = %io.stream, %status, "read failed");
            self.conditions.record(&io.stream, false);
            self.metrics.stream_mut(&io.stream).failed_reads += 1;
            return Ok(());
        }

        let available: HashSet<String> = self
            .transport
            .available_variables(handle)
            .map_err(to_err(&io.stream))?
            .into_iter()
            .collect();
        if self.rank == 0 && self.step == 1 {
            debug!(stream = %io.stream, variables = ?available, "variables in input");
        }

        let (mut supplied, mut missing) = (0u64, 0u64);
        for &i in &io.variables {
            let var = group.at_mut(i).ok_or_else(|| RunError::MissingVariable {
                group: io.group.clone(),
                index: i,
            })?;
            let found = if available.contains(var.name()) {
                let (name, layout, buffer) = var.read_target();
                self.transport
                    .get(handle, name, layout, buffer)
                    .map_err(to_err(&io.stream))?
                    == GetOutcome::Found
            } else {
                false
            };
            var.set_supplied_by_upstream(found);
            if found {
                supplied += 1;
            } else {
                missing += 1;
                debug!(rank = self.rank, stream = %io.stream, variable = var.name(), "not in input");
            }
        }

        self.transport
            .end_step(handle)
            .map_err(to_err(&io.stream))?;
        self.conditions.record(&io.stream, true);
        let m = self.metrics.stream_mut(&io.stream);
        m.reads += 1;
        m.variables_supplied += supplied;
        m.variables_missing += missing;
        Ok(())
    }
}
