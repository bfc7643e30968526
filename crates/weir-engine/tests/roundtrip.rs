//! Producer and consumer roles exchanging data over the in-memory transport.

use std::thread;
use std::time::Duration;

use weir_config::{build_config, BuildOptions};
use weir_core::StaticTopology;
use weir_engine::{expected_value, PipelineExecutor, RunMetrics};
use weir_test_utils::fixtures;
use weir_transport::{MemoryHub, MemoryTransport};

const PRODUCERS: usize = 4;
const CONSUMERS: usize = 2;

fn spawn_role(
    hub: &MemoryHub,
    role: u64,
    ranks: usize,
    read_timeout: Duration,
) -> Vec<thread::JoinHandle<(RunMetrics, Vec<f64>)>> {
    (0..ranks)
        .map(|rank| {
            let hub = hub.clone();
            thread::spawn(move || {
                let options = BuildOptions { role, read_timeout };
                let cfg = build_config(
                    fixtures::PRODUCER_CONSUMER,
                    &StaticTopology::linear(rank, ranks),
                    options,
                )
                .unwrap();
                let mut exec = PipelineExecutor::new(cfg, MemoryTransport::new(hub, rank, ranks), rank);
                let metrics = exec.run().unwrap();
                let heat = exec.config().group("fields").unwrap().get("heat").unwrap();
                let values = (0..heat.element_count())
                    .map(|i| heat.value_at(i).unwrap())
                    .collect();
                (metrics, values)
            })
        })
        .collect()
}

#[test]
fn consumers_see_producer_stamps() {
    let hub = MemoryHub::new();
    let timeout = Duration::from_secs(30);
    let consumers = spawn_role(&hub, 1, CONSUMERS, timeout);
    let producers = spawn_role(&hub, 0, PRODUCERS, timeout);

    for p in producers {
        let (metrics, _) = p.join().unwrap();
        assert_eq!(metrics.stream("a.bp").unwrap().writes, 3);
    }
    for (rank, c) in consumers.into_iter().enumerate() {
        let (metrics, values) = c.join().unwrap();
        let input = metrics.stream("a.bp").unwrap();
        assert_eq!(input.reads, 3);
        assert_eq!(input.failed_reads, 0);

        // heat is 8x6 split along rows: producers own 2 rows each,
        // consumers 4. Each consumer box spans two producers.
        assert_eq!(values.len(), 4 * 6);
        for (row, chunk) in values.chunks(6).enumerate() {
            let producer = (rank * 4 + row) / 2;
            let want = expected_value(producer, 3, 3);
            assert!(chunk.iter().all(|&v| v == want), "row {row}: {chunk:?} != {want}");
        }
    }
}

#[test]
fn consumer_without_producer_times_out_every_step() {
    let hub = MemoryHub::new();
    let consumers = spawn_role(&hub, 1, 1, Duration::from_millis(5));
    let (metrics, values) = consumers.into_iter().next().unwrap().join().unwrap();
    let input = metrics.stream("a.bp").unwrap();
    assert_eq!((input.reads, input.failed_reads), (0, 3));
    // Nothing was read and nothing written, so the buffer is still zeroed.
    assert!(values.iter().all(|&v| v == 0.0));
}
