//! Test utilities and mock types for Weir development.
//!
//! Provides [`RecordingTransport`], a scripted [`Transport`] that logs
//! every call it receives, and a set of config [`fixtures`] shared by the
//! config, engine, and facade tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use weir_core::{
    ArrayLayout, ElementKind, GetOutcome, StepPolicy, StepStatus, StreamHandle, StreamMode,
    Transport, TransportError,
};

/// One call received by a [`RecordingTransport`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Open { stream: String, mode: StreamMode },
    Close { stream: String },
    Declare { stream: String, variable: String },
    BeginStep {
        stream: String,
        policy: StepPolicy,
        timeout: Option<Duration>,
    },
    EndStep { stream: String },
    Put {
        stream: String,
        variable: String,
        data: Vec<u8>,
    },
    Get { stream: String, variable: String },
}

impl Call {
    /// Name of the stream the call addressed.
    pub fn stream(&self) -> &str {
        match self {
            Call::Open { stream, .. }
            | Call::Close { stream }
            | Call::Declare { stream, .. }
            | Call::BeginStep { stream, .. }
            | Call::EndStep { stream }
            | Call::Put { stream, .. }
            | Call::Get { stream, .. } => stream,
        }
    }
}

struct OpenStream {
    name: String,
    open: bool,
}

/// A [`Transport`] double that answers from a script and records calls.
///
/// `begin_step` pops the next scripted status for the stream and returns
/// [`StepStatus::Ok`] once the script is exhausted. `get` fills the
/// caller's buffer with the value registered via
/// [`provide`](RecordingTransport::provide), converted to the caller's
/// element kind, and reports [`GetOutcome::NotFound`] for anything else.
#[derive(Default)]
pub struct RecordingTransport {
    streams: Vec<OpenStream>,
    scripts: HashMap<String, VecDeque<StepStatus>>,
    payloads: HashMap<String, HashMap<String, (ElementKind, f64)>>,
    calls: Vec<Call>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `statuses` as the next `begin_step` results on `stream`.
    pub fn script_steps(
        &mut self,
        stream: &str,
        statuses: impl IntoIterator<Item = StepStatus>,
    ) -> &mut Self {
        self.scripts
            .entry(stream.to_string())
            .or_default()
            .extend(statuses);
        self
    }

    /// Make `variable` available on `stream` with every element equal
    /// to `value`.
    pub fn provide(
        &mut self,
        stream: &str,
        variable: &str,
        kind: ElementKind,
        value: f64,
    ) -> &mut Self {
        self.payloads
            .entry(stream.to_string())
            .or_default()
            .insert(variable.to_string(), (kind, value));
        self
    }

    /// All calls received so far, in order.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// Calls addressed to one stream.
    pub fn calls_on<'a>(&'a self, stream: &'a str) -> impl Iterator<Item = &'a Call> + 'a {
        self.calls.iter().filter(move |c| c.stream() == stream)
    }

    /// Number of `put` calls for `variable` on `stream`.
    pub fn put_count(&self, stream: &str, variable: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Put { stream: s, variable: v, .. } if s == stream && v == variable))
            .count()
    }

    /// Data of the most recent `put` of `variable` on `stream`.
    pub fn last_put(&self, stream: &str, variable: &str) -> Option<&[u8]> {
        self.calls.iter().rev().find_map(|c| match c {
            Call::Put {
                stream: s,
                variable: v,
                data,
            } if s == stream && v == variable => Some(data.as_slice()),
            _ => None,
        })
    }

    fn name(&self, handle: StreamHandle) -> Result<String, TransportError> {
        self.streams
            .get(handle.0 as usize)
            .filter(|s| s.open)
            .map(|s| s.name.clone())
            .ok_or(TransportError::UnknownHandle { handle })
    }
}

impl Transport for RecordingTransport {
    fn open_stream(&mut self, name: &str, mode: StreamMode) -> Result<StreamHandle, TransportError> {
        if self.streams.iter().any(|s| s.open && s.name == name) {
            return Err(TransportError::AlreadyOpen {
                stream: name.to_string(),
            });
        }
        self.calls.push(Call::Open {
            stream: name.to_string(),
            mode,
        });
        self.streams.push(OpenStream {
            name: name.to_string(),
            open: true,
        });
        Ok(StreamHandle(self.streams.len() as u32 - 1))
    }

    fn close_stream(&mut self, handle: StreamHandle) -> Result<(), TransportError> {
        let stream = self.name(handle)?;
        self.streams[handle.0 as usize].open = false;
        self.calls.push(Call::Close { stream });
        Ok(())
    }

    fn declare_variable(
        &mut self,
        handle: StreamHandle,
        name: &str,
        _layout: &ArrayLayout,
    ) -> Result<(), TransportError> {
        let stream = self.name(handle)?;
        self.calls.push(Call::Declare {
            stream,
            variable: name.to_string(),
        });
        Ok(())
    }

    fn begin_step(
        &mut self,
        handle: StreamHandle,
        policy: StepPolicy,
        timeout: Option<Duration>,
    ) -> Result<StepStatus, TransportError> {
        let stream = self.name(handle)?;
        let status = self
            .scripts
            .get_mut(&stream)
            .and_then(VecDeque::pop_front)
            .unwrap_or(StepStatus::Ok);
        self.calls.push(Call::BeginStep {
            stream,
            policy,
            timeout,
        });
        Ok(status)
    }

    fn end_step(&mut self, handle: StreamHandle) -> Result<(), TransportError> {
        let stream = self.name(handle)?;
        self.calls.push(Call::EndStep { stream });
        Ok(())
    }

    fn put(&mut self, handle: StreamHandle, name: &str, data: &[u8]) -> Result<(), TransportError> {
        let stream = self.name(handle)?;
        self.calls.push(Call::Put {
            stream,
            variable: name.to_string(),
            data: data.to_vec(),
        });
        Ok(())
    }

    fn get(
        &mut self,
        handle: StreamHandle,
        name: &str,
        layout: &ArrayLayout,
        data: &mut [u8],
    ) -> Result<GetOutcome, TransportError> {
        let stream = self.name(handle)?;
        let found = self
            .payloads
            .get(&stream)
            .and_then(|vars| vars.get(name))
            .filter(|(kind, _)| *kind == layout.kind)
            .map(|&(_, value)| value);
        self.calls.push(Call::Get {
            stream,
            variable: name.to_string(),
        });
        match found {
            Some(value) => {
                layout.kind.fill(data, value);
                Ok(GetOutcome::Found)
            }
            None => Ok(GetOutcome::NotFound),
        }
    }

    fn available_variables(&self, handle: StreamHandle) -> Result<Vec<String>, TransportError> {
        let stream = self.name(handle)?;
        Ok(self
            .payloads
            .get(&stream)
            .map(|vars| vars.keys().cloned().collect())
            .unwrap_or_default())
    }
}
