//! One rank's [`Transport`] over a [`MemoryHub`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, trace};
use weir_core::{
    ArrayLayout, GetOutcome, StepPolicy, StepStatus, StreamHandle, StreamMode, Transport,
    TransportError,
};

use crate::boxcopy::{gather, scatter};
use crate::hub::{MemoryHub, StepData};

enum Side {
    Write {
        next_step: u64,
        in_step: bool,
        declared: HashMap<String, ArrayLayout>,
    },
    Read {
        cursor: usize,
        current: Option<Arc<StepData>>,
    },
}

struct Stream {
    name: String,
    open: bool,
    side: Side,
}

/// A rank's view of the in-memory streams.
///
/// Every writer of a stream must come from transports with the same
/// `process_count`; a step becomes visible to readers once that many
/// writers have ended it. Committed steps are kept for the lifetime of
/// the hub.
pub struct MemoryTransport {
    hub: MemoryHub,
    rank: usize,
    process_count: usize,
    streams: Vec<Stream>,
}

impl MemoryTransport {
    /// Transport for `rank` of `process_count` ranks sharing `hub`.
    pub fn new(hub: MemoryHub, rank: usize, process_count: usize) -> Self {
        Self {
            hub,
            rank,
            process_count,
            streams: Vec::new(),
        }
    }

    /// This transport's rank.
    pub fn rank(&self) -> usize {
        self.rank
    }

    fn stream(&mut self, handle: StreamHandle) -> Result<&mut Stream, TransportError> {
        self.streams
            .get_mut(handle.0 as usize)
            .filter(|s| s.open)
            .ok_or(TransportError::UnknownHandle { handle })
    }

    fn stream_ref(&self, handle: StreamHandle) -> Result<&Stream, TransportError> {
        self.streams
            .get(handle.0 as usize)
            .filter(|s| s.open)
            .ok_or(TransportError::UnknownHandle { handle })
    }
}

fn step_state(stream: &str, reason: &str) -> TransportError {
    TransportError::StepState {
        stream: stream.to_string(),
        reason: reason.to_string(),
    }
}

fn check_box(name: &str, layout: &ArrayLayout, data_len: usize) -> Result<(), TransportError> {
    if !layout.box_in_bounds() {
        return Err(TransportError::SelectionOutOfBounds {
            variable: name.to_string(),
        });
    }
    if data_len != layout.local_bytes() {
        return Err(TransportError::SizeMismatch {
            variable: name.to_string(),
            expected: layout.local_bytes(),
            actual: data_len,
        });
    }
    Ok(())
}

impl Transport for MemoryTransport {
    fn open_stream(&mut self, name: &str, mode: StreamMode) -> Result<StreamHandle, TransportError> {
        if self.streams.iter().any(|s| s.open && s.name == name) {
            return Err(TransportError::AlreadyOpen {
                stream: name.to_string(),
            });
        }
        let side = match mode {
            StreamMode::Write => {
                self.hub.open_writer(name, self.process_count)?;
                Side::Write {
                    next_step: 0,
                    in_step: false,
                    declared: HashMap::new(),
                }
            }
            StreamMode::Read => {
                self.hub.open_reader(name)?;
                Side::Read {
                    cursor: 0,
                    current: None,
                }
            }
        };
        debug!(rank = self.rank, stream = name, %mode, "stream opened");
        self.streams.push(Stream {
            name: name.to_string(),
            open: true,
            side,
        });
        Ok(StreamHandle(self.streams.len() as u32 - 1))
    }

    fn close_stream(&mut self, handle: StreamHandle) -> Result<(), TransportError> {
        let hub = self.hub.clone();
        let rank = self.rank;
        let stream = self.stream(handle)?;
        match &stream.side {
            Side::Write { in_step: true, .. } | Side::Read { current: Some(_), .. } => {
                return Err(step_state(&stream.name, "close_stream inside an open step"));
            }
            Side::Write { .. } => hub.close_writer(&stream.name)?,
            Side::Read { .. } => {}
        }
        stream.open = false;
        debug!(rank, stream = %stream.name, "stream closed");
        Ok(())
    }

    fn declare_variable(
        &mut self,
        handle: StreamHandle,
        name: &str,
        layout: &ArrayLayout,
    ) -> Result<(), TransportError> {
        let hub = self.hub.clone();
        let stream = self.stream(handle)?;
        let Side::Write { declared, .. } = &mut stream.side else {
            return Err(step_state(&stream.name, "declare_variable on a read stream"));
        };
        if !layout.box_in_bounds() {
            return Err(TransportError::SelectionOutOfBounds {
                variable: name.to_string(),
            });
        }
        if layout.checked_global_bytes().is_none() {
            return Err(TransportError::ArrayTooLarge {
                variable: name.to_string(),
            });
        }
        hub.declare(&stream.name, name, layout.kind, &layout.shape)?;
        declared.insert(name.to_string(), layout.clone());
        trace!(stream = %stream.name, variable = name, "variable declared");
        Ok(())
    }

    fn begin_step(
        &mut self,
        handle: StreamHandle,
        policy: StepPolicy,
        timeout: Option<Duration>,
    ) -> Result<StepStatus, TransportError> {
        let hub = self.hub.clone();
        let rank = self.rank;
        let stream = self.stream(handle)?;
        match &mut stream.side {
            Side::Write { in_step, .. } => {
                if policy != StepPolicy::Append {
                    return Err(TransportError::PolicyMismatch {
                        stream: stream.name.clone(),
                        policy,
                    });
                }
                if *in_step {
                    return Err(step_state(&stream.name, "begin_step while a step is open"));
                }
                *in_step = true;
                Ok(StepStatus::Ok)
            }
            Side::Read { cursor, current } => {
                if policy == StepPolicy::Append {
                    return Err(TransportError::PolicyMismatch {
                        stream: stream.name.clone(),
                        policy,
                    });
                }
                if current.is_some() {
                    return Err(step_state(&stream.name, "begin_step while a step is open"));
                }
                match hub.begin_reader_step(&stream.name, *cursor, policy, timeout)? {
                    Ok(step) => {
                        trace!(rank, stream = %stream.name, step = step.index, "read step opened");
                        *cursor = step.index + 1;
                        *current = Some(step.data);
                        Ok(StepStatus::Ok)
                    }
                    Err(status) => {
                        debug!(rank, stream = %stream.name, %status, "no step to read");
                        Ok(status)
                    }
                }
            }
        }
    }

    fn end_step(&mut self, handle: StreamHandle) -> Result<(), TransportError> {
        let hub = self.hub.clone();
        let stream = self.stream(handle)?;
        match &mut stream.side {
            Side::Write {
                next_step, in_step, ..
            } => {
                if !*in_step {
                    return Err(step_state(&stream.name, "end_step without begin_step"));
                }
                hub.end_writer_step(&stream.name, *next_step)?;
                *next_step += 1;
                *in_step = false;
            }
            Side::Read { current, .. } => {
                if current.take().is_none() {
                    return Err(step_state(&stream.name, "end_step without begin_step"));
                }
            }
        }
        Ok(())
    }

    fn put(&mut self, handle: StreamHandle, name: &str, data: &[u8]) -> Result<(), TransportError> {
        let hub = self.hub.clone();
        let stream = self.stream(handle)?;
        let Side::Write {
            next_step,
            in_step,
            declared,
        } = &stream.side
        else {
            return Err(step_state(&stream.name, "put on a read stream"));
        };
        if !*in_step {
            return Err(step_state(&stream.name, "put outside a step"));
        }
        let layout = declared
            .get(name)
            .ok_or_else(|| TransportError::UndeclaredVariable {
                stream: stream.name.clone(),
                variable: name.to_string(),
            })?;
        check_box(name, layout, data.len())?;
        hub.with_pending_array(&stream.name, *next_step, name, |array| {
            scatter(
                &mut array.data,
                data,
                &layout.shape,
                &layout.start,
                &layout.count,
                layout.kind.width(),
            );
        })
    }

    fn get(
        &mut self,
        handle: StreamHandle,
        name: &str,
        layout: &ArrayLayout,
        data: &mut [u8],
    ) -> Result<GetOutcome, TransportError> {
        let stream = self.stream_ref(handle)?;
        let Side::Read { current, .. } = &stream.side else {
            return Err(step_state(&stream.name, "get on a write stream"));
        };
        let step = current
            .as_ref()
            .ok_or_else(|| step_state(&stream.name, "get outside a step"))?;
        let Some(array) = step.arrays.get(name) else {
            return Ok(GetOutcome::NotFound);
        };
        if array.kind != layout.kind {
            return Ok(GetOutcome::NotFound);
        }
        check_box(name, layout, data.len())?;
        if array.shape != layout.shape {
            return Err(TransportError::SelectionOutOfBounds {
                variable: name.to_string(),
            });
        }
        gather(
            &array.data,
            data,
            &array.shape,
            &layout.start,
            &layout.count,
            layout.kind.width(),
        );
        Ok(GetOutcome::Found)
    }

    fn available_variables(&self, handle: StreamHandle) -> Result<Vec<String>, TransportError> {
        let stream = self.stream_ref(handle)?;
        match &stream.side {
            Side::Read {
                current: Some(step),
                ..
            } => Ok(step.arrays.keys().cloned().collect()),
            Side::Read { current: None, .. } => {
                Err(step_state(&stream.name, "available_variables outside a step"))
            }
            Side::Write { .. } => Err(step_state(
                &stream.name,
                "available_variables on a write stream",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;
    use weir_core::ElementKind;

    fn layout(kind: ElementKind, shape: &[u64], start: &[u64], count: &[u64]) -> ArrayLayout {
        ArrayLayout {
            kind,
            shape: shape.iter().copied().collect(),
            start: start.iter().copied().collect(),
            count: count.iter().copied().collect(),
        }
    }

    #[test]
    fn single_rank_round_trip() {
        let hub = MemoryHub::new();
        let mut w = MemoryTransport::new(hub.clone(), 0, 1);
        let mut r = MemoryTransport::new(hub.clone(), 0, 1);
        let l = layout(ElementKind::Int32, &[3], &[0], &[3]);
        let mut data = vec![0u8; 12];
        ElementKind::Int32.fill(&mut data, 7.0);

        let hw = w.open_stream("s", StreamMode::Write).unwrap();
        w.declare_variable(hw, "v", &l).unwrap();
        assert_eq!(w.begin_step(hw, StepPolicy::Append, None).unwrap(), StepStatus::Ok);
        w.put(hw, "v", &data).unwrap();
        w.end_step(hw).unwrap();
        assert_eq!(hub.committed_steps("s"), 1);

        let hr = r.open_stream("s", StreamMode::Read).unwrap();
        let status = r.begin_step(hr, StepPolicy::NextAvailable, None).unwrap();
        assert_eq!(status, StepStatus::Ok);
        assert_eq!(r.available_variables(hr).unwrap(), vec!["v".to_string()]);
        let mut out = vec![0u8; 12];
        assert_eq!(r.get(hr, "v", &l, &mut out).unwrap(), GetOutcome::Found);
        assert_eq!(out, data);
        r.end_step(hr).unwrap();
    }

    #[test]
    fn reader_times_out_then_sees_end_of_stream() {
        let hub = MemoryHub::new();
        let mut w = MemoryTransport::new(hub.clone(), 0, 1);
        let mut r = MemoryTransport::new(hub, 0, 1);
        let hw = w.open_stream("s", StreamMode::Write).unwrap();
        let hr = r.open_stream("s", StreamMode::Read).unwrap();
        let t = Some(Duration::from_millis(10));
        assert_eq!(
            r.begin_step(hr, StepPolicy::NextAvailable, t).unwrap(),
            StepStatus::NotReady
        );
        w.close_stream(hw).unwrap();
        assert_eq!(
            r.begin_step(hr, StepPolicy::NextAvailable, t).unwrap(),
            StepStatus::EndOfStream
        );
    }

    #[test]
    fn latest_skips_to_newest() {
        let hub = MemoryHub::new();
        let mut w = MemoryTransport::new(hub.clone(), 0, 1);
        let mut r = MemoryTransport::new(hub, 0, 1);
        let hw = w.open_stream("s", StreamMode::Write).unwrap();
        let l = layout(ElementKind::Float64, &[1], &[0], &[1]);
        w.declare_variable(hw, "x", &l).unwrap();
        for step in 0..3 {
            w.begin_step(hw, StepPolicy::Append, None).unwrap();
            w.put(hw, "x", &f64::from(step).to_ne_bytes()).unwrap();
            w.end_step(hw).unwrap();
        }
        w.close_stream(hw).unwrap();

        let hr = r.open_stream("s", StreamMode::Read).unwrap();
        assert!(r.begin_step(hr, StepPolicy::Latest, None).unwrap().is_ok());
        let mut out = [0u8; 8];
        r.get(hr, "x", &l, &mut out).unwrap();
        assert_eq!(f64::from_ne_bytes(out), 2.0);
        r.end_step(hr).unwrap();
        assert_eq!(
            r.begin_step(hr, StepPolicy::NextAvailable, None).unwrap(),
            StepStatus::EndOfStream
        );
    }

    #[test]
    fn kind_mismatch_is_not_found() {
        let hub = MemoryHub::new();
        let mut w = MemoryTransport::new(hub.clone(), 0, 1);
        let mut r = MemoryTransport::new(hub, 0, 1);
        let hw = w.open_stream("s", StreamMode::Write).unwrap();
        let l = layout(ElementKind::Float32, &[2], &[0], &[2]);
        w.declare_variable(hw, "x", &l).unwrap();
        w.begin_step(hw, StepPolicy::Append, None).unwrap();
        w.put(hw, "x", &[0u8; 8]).unwrap();
        w.end_step(hw).unwrap();

        let hr = r.open_stream("s", StreamMode::Read).unwrap();
        r.begin_step(hr, StepPolicy::NextAvailable, None).unwrap();
        let wanted = layout(ElementKind::Int32, &[2], &[0], &[2]);
        let mut out = [0u8; 8];
        assert_eq!(r.get(hr, "x", &wanted, &mut out).unwrap(), GetOutcome::NotFound);
        assert_eq!(r.get(hr, "y", &wanted, &mut out).unwrap(), GetOutcome::NotFound);
    }

    #[test]
    fn misuse_is_reported() {
        let hub = MemoryHub::new();
        let mut w = MemoryTransport::new(hub, 0, 1);
        let hw = w.open_stream("s", StreamMode::Write).unwrap();
        assert_eq!(
            w.open_stream("s", StreamMode::Write),
            Err(TransportError::AlreadyOpen { stream: "s".into() })
        );
        assert!(matches!(w.end_step(hw), Err(TransportError::StepState { .. })));
        assert!(matches!(
            w.begin_step(hw, StepPolicy::Latest, None),
            Err(TransportError::PolicyMismatch { .. })
        ));
        w.begin_step(hw, StepPolicy::Append, None).unwrap();
        assert!(matches!(
            w.put(hw, "nope", &[]),
            Err(TransportError::UndeclaredVariable { .. })
        ));
        let l = layout(ElementKind::Float64, &[4], &[0], &[2]);
        w.declare_variable(hw, "v", &l).unwrap();
        assert_eq!(
            w.put(hw, "v", &[0u8; 8]),
            Err(TransportError::SizeMismatch {
                variable: "v".into(),
                expected: 16,
                actual: 8
            })
        );
        let outside = ArrayLayout {
            start: smallvec![3],
            ..l
        };
        assert!(matches!(
            w.declare_variable(hw, "o", &outside),
            Err(TransportError::SelectionOutOfBounds { .. })
        ));
        let huge = layout(ElementKind::Int32, &[1 << 32, 1 << 32], &[0, 0], &[1, 1]);
        assert_eq!(
            w.declare_variable(hw, "h", &huge),
            Err(TransportError::ArrayTooLarge {
                variable: "h".into()
            })
        );
        assert!(matches!(
            w.close_stream(hw),
            Err(TransportError::StepState { .. })
        ));
        w.end_step(hw).unwrap();
        w.close_stream(hw).unwrap();
        assert_eq!(
            w.end_step(hw),
            Err(TransportError::UnknownHandle { handle: hw })
        );
    }
}
