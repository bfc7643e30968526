//! Executor behaviour against a scripted transport.

use weir_config::{build_config, BuildOptions, Config};
use weir_core::{ElementKind, StaticTopology, StepPolicy, StepStatus, StreamMode};
use weir_engine::{expected_value, PipelineExecutor, RunError};
use weir_test_utils::{fixtures, Call, RecordingTransport};

fn config(text: &str, rank: usize, nproc: usize) -> Config {
    build_config(text, &StaticTopology::linear(rank, nproc), BuildOptions::default()).unwrap()
}

fn values(kind: ElementKind, data: &[u8]) -> Vec<f64> {
    (0..data.len() / kind.width())
        .map(|i| kind.value_at(data, i).unwrap())
        .collect()
}

#[test]
fn single_writer_call_sequence() {
    for rank in 0..4 {
        let mut exec = PipelineExecutor::new(
            config(fixtures::SINGLE_WRITER, rank, 4),
            RecordingTransport::new(),
            rank,
        );
        let metrics = exec.run().unwrap();
        assert_eq!(metrics.steps, 2);
        assert_eq!(metrics.stream("out").unwrap().writes, 2);

        let t = exec.transport();
        let kinds: Vec<&str> = t
            .calls()
            .iter()
            .map(|c| match c {
                Call::Open { .. } => "open",
                Call::Declare { .. } => "declare",
                Call::BeginStep { .. } => "begin",
                Call::Put { .. } => "put",
                Call::EndStep { .. } => "end",
                Call::Close { .. } => "close",
                Call::Get { .. } => "get",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["open", "declare", "begin", "put", "end", "begin", "put", "end", "close"]
        );
        assert_eq!(
            t.calls()[0],
            Call::Open {
                stream: "out".into(),
                mode: StreamMode::Write
            }
        );
        assert_eq!(
            t.calls()[2],
            Call::BeginStep {
                stream: "out".into(),
                policy: StepPolicy::Append,
                timeout: None
            }
        );
        // Int truncation drops the step fraction.
        let data = t.last_put("out", "v").unwrap();
        assert_eq!(values(ElementKind::Int32, data), vec![rank as f64]);
    }
}

#[test]
fn float_fill_carries_step_fraction() {
    let text = "steps 12\ngroup g\narray double d 1 2 X\nwrite out g\n";
    let mut exec = PipelineExecutor::new(config(text, 0, 1), RecordingTransport::new(), 1);
    exec.run().unwrap();
    let data = exec.transport().last_put("out", "d").unwrap();
    assert_eq!(values(ElementKind::Float64, data), vec![1.11, 1.11]);
    assert_eq!(expected_value(1, 12, 12), 1.11);
}

#[test]
fn gated_commands_stop_after_end_of_stream() {
    let mut t = RecordingTransport::new();
    t.script_steps(
        "in",
        [
            StepStatus::Ok,
            StepStatus::Ok,
            StepStatus::EndOfStream,
            StepStatus::EndOfStream,
        ],
    );
    let mut exec = PipelineExecutor::new(config(fixtures::GATED_PIPELINE, 0, 1), t, 0);
    let metrics = exec.run().unwrap();

    assert_eq!(metrics.steps, 4);
    assert_eq!(metrics.skipped_commands, 2);
    let input = metrics.stream("in").unwrap();
    assert_eq!((input.reads, input.failed_reads), (2, 2));
    assert_eq!(metrics.stream("out").unwrap().writes, 2);
    assert_eq!(exec.conditions().get("in"), Some(false));

    // The ungated read still runs every step.
    let begins = exec
        .transport()
        .calls_on("in")
        .filter(|c| matches!(c, Call::BeginStep { .. }))
        .count();
    assert_eq!(begins, 4);
    assert_eq!(exec.transport().put_count("out", "d"), 2);
}

#[test]
fn failed_read_does_not_end_step() {
    let mut t = RecordingTransport::new();
    t.script_steps("in", [StepStatus::NotReady]);
    let text = "steps 1\ngroup g\narray double d 1 4 X\nread next in g\n";
    let mut exec = PipelineExecutor::new(config(text, 0, 1), t, 0);
    exec.run().unwrap();
    let ends = exec
        .transport()
        .calls_on("in")
        .filter(|c| matches!(c, Call::EndStep { .. } | Call::Get { .. }))
        .count();
    assert_eq!(ends, 0);
}

#[test]
fn read_data_is_forwarded_instead_of_filled() {
    let mut t = RecordingTransport::new();
    t.provide("in", "d", ElementKind::Float64, 42.5);
    t.script_steps("in", [StepStatus::Ok, StepStatus::NotReady]);
    let text = "steps 2\ngroup g\narray double d 1 4 X\narray double e 1 4 X\n\
                read next in g\nwrite out g\n";
    let mut exec = PipelineExecutor::new(config(text, 0, 1), t, 0);
    let metrics = exec.run().unwrap();

    let t = exec.transport();
    let puts: Vec<Vec<f64>> = t
        .calls_on("out")
        .filter_map(|c| match c {
            Call::Put { variable, data, .. } if variable == "d" => {
                Some(values(ElementKind::Float64, data))
            }
            _ => None,
        })
        .collect();
    // Step 1 forwards the read value; step 2's read failed so the flag
    // was cleared and the fill value is written.
    assert_eq!(puts, vec![vec![42.5; 4], vec![0.1; 4]]);
    assert_eq!(values(ElementKind::Float64, t.last_put("out", "e").unwrap()), vec![0.1; 4]);

    let input = metrics.stream("in").unwrap();
    assert_eq!(input.variables_supplied, 1);
    assert_eq!(input.variables_missing, 1);
}

#[test]
fn kind_mismatch_counts_as_missing() {
    let mut t = RecordingTransport::new();
    t.provide("in", "d", ElementKind::Int32, 7.0);
    let text = "steps 1\ngroup g\narray double d 1 4 X\nread latest in g\nwrite out g\n";
    let mut exec = PipelineExecutor::new(config(text, 0, 1), t, 2);
    exec.run().unwrap();
    let g = exec.config().group("g").unwrap();
    assert!(!g.get("d").unwrap().supplied_by_upstream());
    let data = exec.transport().last_put("out", "d").unwrap();
    assert_eq!(values(ElementKind::Float64, data), vec![2.0; 4]);
}

#[test]
fn variables_declared_once_per_stream() {
    let text = "steps 3\ngroup g\narray float a 1 4 X\narray int b 1 4 X\n\
                write one g a\nwrite two g\n";
    let mut exec = PipelineExecutor::new(config(text, 0, 1), RecordingTransport::new(), 0);
    exec.run().unwrap();
    let declares: Vec<(String, String)> = exec
        .transport()
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::Declare { stream, variable } => Some((stream.clone(), variable.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        declares,
        vec![
            ("one".into(), "a".into()),
            ("two".into(), "a".into()),
            ("two".into(), "b".into()),
        ]
    );
    assert_eq!(exec.transport().put_count("one", "b"), 0);
    assert_eq!(exec.transport().put_count("two", "b"), 3);
}

#[test]
fn read_timeout_is_forwarded() {
    let text = "group g\narray double d 1 4 X\nread next in g\n";
    let options = BuildOptions {
        role: 0,
        read_timeout: std::time::Duration::from_millis(250),
    };
    let cfg = build_config(text, &StaticTopology::linear(0, 1), options).unwrap();
    let mut exec = PipelineExecutor::new(cfg, RecordingTransport::new(), 0);
    exec.run().unwrap();
    assert!(exec.transport().calls().contains(&Call::BeginStep {
        stream: "in".into(),
        policy: StepPolicy::NextAvailable,
        timeout: Some(std::time::Duration::from_millis(250)),
    }));
}

#[test]
fn sleep_time_is_accounted() {
    let text = "steps 2\nsleep 0.001\n";
    let mut exec = PipelineExecutor::new(config(text, 0, 1), RecordingTransport::new(), 0);
    let metrics = exec.run().unwrap();
    assert_eq!(metrics.sleep, std::time::Duration::from_millis(2));
    assert!(metrics.wall >= metrics.sleep);
    assert!(exec.transport().calls().is_empty());
}

#[test]
fn zero_steps_only_opens_and_closes() {
    let text = "steps 0\ngroup g\narray int v 1 4 X\nwrite out g\n";
    let mut exec = PipelineExecutor::new(config(text, 0, 1), RecordingTransport::new(), 0);
    let metrics = exec.run().unwrap();
    assert_eq!(metrics.steps, 0);
    assert_eq!(exec.transport().calls().len(), 2);
}

#[test]
fn transport_error_names_the_stream() {
    use weir_transport::{MemoryHub, MemoryTransport};
    use weir_core::Transport;

    let hub = MemoryHub::new();
    // Another writer set of a different size already owns the stream.
    let mut other = MemoryTransport::new(hub.clone(), 0, 3);
    other.open_stream("out", StreamMode::Write).unwrap();

    let mut exec = PipelineExecutor::new(
        config(fixtures::SINGLE_WRITER, 0, 1),
        MemoryTransport::new(hub, 0, 1),
        0,
    );
    match exec.run() {
        Err(RunError::Transport { stream, .. }) => assert_eq!(stream, "out"),
        other => panic!("expected transport error, got {other:?}"),
    }
}
