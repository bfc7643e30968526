//! Writer and reader ranks on separate threads.

use std::thread;
use std::time::Duration;

use weir_core::{ArrayLayout, ElementKind, GetOutcome, StepPolicy, StepStatus, StreamMode, Transport};
use weir_transport::{MemoryHub, MemoryTransport};

const SHAPE: [u64; 2] = [6, 4];
const STEPS: usize = 3;

/// Rows split across `parts` ranks, last rank takes the remainder.
fn row_layout(rank: usize, parts: usize) -> ArrayLayout {
    let base = SHAPE[0] / parts as u64;
    let start = base * rank as u64;
    let rows = if rank == parts - 1 { SHAPE[0] - start } else { base };
    ArrayLayout {
        kind: ElementKind::Float64,
        shape: SHAPE.iter().copied().collect(),
        start: [start, 0].into_iter().collect(),
        count: [rows, SHAPE[1]].into_iter().collect(),
    }
}

fn whole() -> ArrayLayout {
    ArrayLayout {
        kind: ElementKind::Float64,
        shape: SHAPE.iter().copied().collect(),
        start: [0, 0].into_iter().collect(),
        count: SHAPE.iter().copied().collect(),
    }
}

#[test]
fn four_writers_one_reader() {
    let hub = MemoryHub::new();
    let writers = 4;

    let handles: Vec<_> = (0..writers)
        .map(|rank| {
            let hub = hub.clone();
            thread::spawn(move || {
                let mut t = MemoryTransport::new(hub, rank, writers);
                let layout = row_layout(rank, writers);
                let h = t.open_stream("grid", StreamMode::Write).unwrap();
                t.declare_variable(h, "t", &layout).unwrap();
                let mut buf = vec![0u8; layout.local_bytes()];
                for step in 0..STEPS {
                    ElementKind::Float64.fill(&mut buf, rank as f64 + step as f64 / 10.0);
                    t.begin_step(h, StepPolicy::Append, None).unwrap();
                    t.put(h, "t", &buf).unwrap();
                    t.end_step(h).unwrap();
                }
                t.close_stream(h).unwrap();
            })
        })
        .collect();

    let reader = thread::spawn(move || {
        let mut t = MemoryTransport::new(hub, 0, 1);
        let h = t.open_stream("grid", StreamMode::Read).unwrap();
        let layout = whole();
        let mut buf = vec![0u8; layout.local_bytes()];
        let mut seen = Vec::new();
        loop {
            match t
                .begin_step(h, StepPolicy::NextAvailable, Some(Duration::from_secs(10)))
                .unwrap()
            {
                StepStatus::Ok => {}
                StepStatus::EndOfStream => break,
                StepStatus::NotReady => panic!("writers stalled"),
            }
            assert_eq!(t.get(h, "t", &layout, &mut buf).unwrap(), GetOutcome::Found);
            // Ranks 0..=2 own one row each; rank 3 owns the last three.
            let rows: Vec<f64> = (0..SHAPE[0] as usize)
                .map(|r| ElementKind::Float64.value_at(&buf, r * SHAPE[1] as usize).unwrap())
                .collect();
            seen.push(rows);
            t.end_step(h).unwrap();
        }
        t.close_stream(h).unwrap();
        seen
    });

    for h in handles {
        h.join().unwrap();
    }
    let seen = reader.join().unwrap();
    assert_eq!(seen.len(), STEPS);
    for (step, rows) in seen.iter().enumerate() {
        let frac = step as f64 / 10.0;
        assert_eq!(rows, &vec![frac, 1.0 + frac, 2.0 + frac, 3.0 + frac, 3.0 + frac, 3.0 + frac]);
    }
}

#[test]
fn readers_keep_independent_cursors() {
    let hub = MemoryHub::new();
    let mut w = MemoryTransport::new(hub.clone(), 0, 1);
    let layout = whole();
    let h = w.open_stream("s", StreamMode::Write).unwrap();
    w.declare_variable(h, "t", &layout).unwrap();
    for _ in 0..2 {
        w.begin_step(h, StepPolicy::Append, None).unwrap();
        w.put(h, "t", &vec![0u8; layout.local_bytes()]).unwrap();
        w.end_step(h).unwrap();
    }
    w.close_stream(h).unwrap();

    let count_steps = |rank| {
        let mut r = MemoryTransport::new(hub.clone(), rank, 2);
        let h = r.open_stream("s", StreamMode::Read).unwrap();
        let mut n = 0;
        while r.begin_step(h, StepPolicy::NextAvailable, None).unwrap().is_ok() {
            n += 1;
            r.end_step(h).unwrap();
        }
        n
    };
    assert_eq!(count_steps(0), 2);
    assert_eq!(count_steps(1), 2);
}
