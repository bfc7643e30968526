//! Shared stream state for every rank of an in-process run.
//!
//! A [`MemoryHub`] owns the state of every stream name behind a
//! single mutex. Writers assemble each step into global arrays; a step
//! is committed once every writer rank has ended it, and committed steps
//! are shared with readers as `Arc<StepData>`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use tracing::{debug, trace};
use weir_core::{Dims, ElementKind, StepPolicy, StepStatus, TransportError};

/// One global array of a step.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobalArray {
    /// Element type.
    pub kind: ElementKind,
    /// Global extent per dimension.
    pub shape: Dims,
    /// Row-major element bytes of the whole array.
    pub data: Vec<u8>,
}

impl GlobalArray {
    fn zeroed(kind: ElementKind, shape: Dims, bytes: usize) -> Self {
        Self {
            kind,
            data: vec![0u8; bytes],
            shape,
        }
    }
}

/// A committed step: every array put by any writer rank.
#[derive(Debug, Default)]
pub struct StepData {
    /// Arrays in the order they were first put.
    pub arrays: IndexMap<String, GlobalArray>,
}

#[derive(Default)]
struct PendingStep {
    ended: usize,
    data: StepData,
}

#[derive(Default)]
struct StreamState {
    writer_ranks: usize,
    writers_opened: usize,
    writers_closed: usize,
    declared: HashMap<String, (ElementKind, Dims)>,
    pending: BTreeMap<u64, PendingStep>,
    committed: Vec<Arc<StepData>>,
}

impl StreamState {
    fn finished(&self) -> bool {
        self.writer_ranks > 0 && self.writers_closed == self.writer_ranks
    }

    fn commit_ready(&mut self, stream: &str) -> bool {
        let mut committed_any = false;
        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.committed.len() as u64 || entry.get().ended < self.writer_ranks {
                break;
            }
            let step = entry.remove();
            debug!(stream, step = self.committed.len(), arrays = step.data.arrays.len(), "step committed");
            self.committed.push(Arc::new(step.data));
            committed_any = true;
        }
        committed_any
    }
}

#[derive(Default)]
struct HubState {
    streams: HashMap<String, StreamState>,
}

#[derive(Default)]
struct HubInner {
    state: Mutex<HubState>,
    changed: Condvar,
}

/// Cloneable registry of in-memory streams shared by all ranks.
///
/// Every rank gets its own [`MemoryTransport`](crate::MemoryTransport)
/// from the same hub; the hub is the only state they share.
#[derive(Clone, Default)]
pub struct MemoryHub {
    inner: Arc<HubInner>,
}

/// Where a reader's `begin_step` landed.
pub(crate) struct ReadStep {
    pub(crate) index: usize,
    pub(crate) data: Arc<StepData>,
}

fn poisoned() -> TransportError {
    TransportError::Backend {
        message: "memory hub lock poisoned".to_string(),
    }
}

impl MemoryHub {
    /// An empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of committed steps on `stream` (0 for unknown streams).
    pub fn committed_steps(&self, stream: &str) -> usize {
        self.lock()
            .map(|s| s.streams.get(stream).map_or(0, |st| st.committed.len()))
            .unwrap_or(0)
    }

    /// Names of all streams any rank has opened.
    pub fn stream_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .lock()
            .map(|s| s.streams.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    fn lock(&self) -> Result<MutexGuard<'_, HubState>, TransportError> {
        self.inner.state.lock().map_err(|_| poisoned())
    }

    pub(crate) fn open_writer(&self, stream: &str, ranks: usize) -> Result<(), TransportError> {
        let mut state = self.lock()?;
        let st = state.streams.entry(stream.to_string()).or_default();
        if st.writer_ranks != 0 && st.writer_ranks != ranks {
            return Err(TransportError::Backend {
                message: format!(
                    "stream '{stream}' already has {} writer ranks, cannot join with {ranks}",
                    st.writer_ranks
                ),
            });
        }
        st.writer_ranks = ranks;
        st.writers_opened += 1;
        trace!(stream, opened = st.writers_opened, ranks, "writer joined");
        Ok(())
    }

    pub(crate) fn open_reader(&self, stream: &str) -> Result<(), TransportError> {
        let mut state = self.lock()?;
        state.streams.entry(stream.to_string()).or_default();
        Ok(())
    }

    pub(crate) fn close_writer(&self, stream: &str) -> Result<(), TransportError> {
        let mut state = self.lock()?;
        if let Some(st) = state.streams.get_mut(stream) {
            st.writers_closed += 1;
            trace!(stream, closed = st.writers_closed, "writer left");
        }
        drop(state);
        self.inner.changed.notify_all();
        Ok(())
    }

    pub(crate) fn declare(
        &self,
        stream: &str,
        name: &str,
        kind: ElementKind,
        shape: &Dims,
    ) -> Result<(), TransportError> {
        let mut state = self.lock()?;
        let st = state.streams.entry(stream.to_string()).or_default();
        match st.declared.get(name) {
            Some((k, s)) if *k != kind || s != shape => Err(TransportError::Backend {
                message: format!(
                    "variable '{name}' on stream '{stream}' was declared as {k} {s:?} by another rank"
                ),
            }),
            Some(_) => Ok(()),
            None => {
                st.declared.insert(name.to_string(), (kind, shape.clone()));
                Ok(())
            }
        }
    }

    /// Run `f` against the assembling array for `name` in writer step `step`.
    pub(crate) fn with_pending_array(
        &self,
        stream: &str,
        step: u64,
        name: &str,
        f: impl FnOnce(&mut GlobalArray),
    ) -> Result<(), TransportError> {
        let mut state = self.lock()?;
        let st = state
            .streams
            .get_mut(stream)
            .ok_or_else(|| TransportError::UndeclaredVariable {
                stream: stream.to_string(),
                variable: name.to_string(),
            })?;
        let (kind, shape) = st
            .declared
            .get(name)
            .cloned()
            .ok_or_else(|| TransportError::UndeclaredVariable {
                stream: stream.to_string(),
                variable: name.to_string(),
            })?;
        let bytes = kind
            .checked_bytes(&shape)
            .ok_or_else(|| TransportError::ArrayTooLarge {
                variable: name.to_string(),
            })?;
        let array = st
            .pending
            .entry(step)
            .or_default()
            .data
            .arrays
            .entry(name.to_string())
            .or_insert_with(|| GlobalArray::zeroed(kind, shape, bytes));
        f(array);
        Ok(())
    }

    pub(crate) fn end_writer_step(&self, stream: &str, step: u64) -> Result<(), TransportError> {
        let mut state = self.lock()?;
        let st = state.streams.entry(stream.to_string()).or_default();
        st.pending.entry(step).or_default().ended += 1;
        let committed = st.commit_ready(stream);
        drop(state);
        if committed {
            self.inner.changed.notify_all();
        }
        Ok(())
    }

    /// Wait for a step at or after `cursor` according to `policy`.
    pub(crate) fn begin_reader_step(
        &self,
        stream: &str,
        cursor: usize,
        policy: StepPolicy,
        timeout: Option<Duration>,
    ) -> Result<Result<ReadStep, StepStatus>, TransportError> {
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut state = self.lock()?;
        loop {
            let st = state.streams.entry(stream.to_string()).or_default();
            if st.committed.len() > cursor {
                let index = match policy {
                    StepPolicy::Latest => st.committed.len() - 1,
                    _ => cursor,
                };
                return Ok(Ok(ReadStep {
                    index,
                    data: Arc::clone(&st.committed[index]),
                }));
            }
            if st.finished() {
                return Ok(Err(StepStatus::EndOfStream));
            }
            state = match deadline {
                None => self.inner.changed.wait(state).map_err(|_| poisoned())?,
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(Err(StepStatus::NotReady));
                    }
                    self.inner
                        .changed
                        .wait_timeout(state, deadline - now)
                        .map_err(|_| poisoned())?
                        .0
                }
            };
        }
    }
}
