use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use reflex::config::CommandSettings;
use reflex::engine::{fan_out, filter_matching, Reflex};
use reflex::errors::ReflexError;
use reflex::exec::TerminalBackend;
use reflex::output::{self, OutputSink};
use reflex::types::SupervisorMode;
use reflex::watch::{Matcher, RegexMatcher};
use reflex_test_utils::capture::CaptureWriter;
use reflex_test_utils::fake_backend::{FakeBackend, FakeBehaviour};
use reflex_test_utils::{init_tracing, with_timeout};

fn settings(regex: &str, mode: SupervisorMode) -> CommandSettings {
    CommandSettings {
        source: "[command line]".to_string(),
        regex: regex.to_string(),
        inverse: false,
        argv: vec!["go".to_string(), "run".to_string(), "./main".to_string()],
        mode,
        shutdown_timeout: Duration::from_millis(50),
        quiet_interval: Duration::from_millis(30),
    }
}

fn sink() -> (CaptureWriter, OutputSink) {
    let writer = CaptureWriter::new();
    let (mux, sink) = output::channel(writer.clone());
    mux.spawn();
    (writer, sink)
}

fn backend(behaviour: FakeBehaviour) -> (FakeBackend, Arc<dyn TerminalBackend>) {
    let fake = FakeBackend::new(behaviour);
    let shared: Arc<dyn TerminalBackend> = Arc::new(fake.clone());
    (fake, shared)
}

async fn wait_for_spawns(backend: &FakeBackend, n: usize) {
    with_timeout(async {
        while backend.spawn_count() < n {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}

#[test]
fn describe_lists_source_id_matcher_and_command() {
    let (_fake, shared) = backend(FakeBehaviour::ExitOnSignal);
    let (mux, sink) = output::channel(CaptureWriter::new());
    drop(mux);
    let reflex = Reflex::from_settings(4, &settings(r"\.go$", SupervisorMode::Service), shared, sink)
        .unwrap();

    assert_eq!(
        reflex.describe(),
        "Reflex from [command line]\n\
         | ID: 4\n\
         | Regex match: \"\\\\.go$\"\n\
         | Command: [\"go\", \"run\", \"./main\"]\n\
         +---------\n"
    );
}

#[test]
fn invalid_pattern_fails_construction() {
    let (_fake, shared) = backend(FakeBehaviour::ExitOnSignal);
    let (_mux, sink) = output::channel(CaptureWriter::new());
    let err = Reflex::from_settings(0, &settings("(", SupervisorMode::Once), shared, sink)
        .unwrap_err();
    assert!(matches!(err, ReflexError::InvalidPattern(_)));
}

#[tokio::test]
async fn one_shot_runs_once_per_burst_of_matching_changes() {
    init_tracing();
    let (_writer, sink) = sink();
    let (fake, shared) = backend(FakeBehaviour::ExitImmediately { success: true });
    let reflex = Reflex::from_settings(0, &settings(r"\.go$", SupervisorMode::Once), shared, sink)
        .unwrap();

    let (tx, rx) = mpsc::channel(1);
    let _handle = reflex.start(rx);

    // Nothing runs before a change in one-shot mode.
    sleep(Duration::from_millis(100)).await;
    assert_eq!(fake.spawn_count(), 0);

    for path in ["main.go", "README.md", "util.go", "main.go"] {
        tx.send(path.to_string()).await.unwrap();
    }
    wait_for_spawns(&fake, 1).await;
    sleep(Duration::from_millis(150)).await;
    assert_eq!(fake.spawn_count(), 1);

    // Non-matching changes never reach the debouncer.
    tx.send("notes.txt".to_string()).await.unwrap();
    sleep(Duration::from_millis(150)).await;
    assert_eq!(fake.spawn_count(), 1);

    tx.send("main.go".to_string()).await.unwrap();
    wait_for_spawns(&fake, 2).await;
}

#[tokio::test]
async fn service_starts_immediately_and_restarts_on_change() {
    let (writer, sink) = sink();
    let (fake, shared) = backend(FakeBehaviour::ExitOnInterruptByte);
    let reflex = Reflex::from_settings(1, &settings(r"\.go$", SupervisorMode::Service), shared, sink)
        .unwrap();

    let (tx, rx) = mpsc::channel(1);
    let handle = reflex.start(rx);

    wait_for_spawns(&fake, 1).await;
    assert!(reflex.supervisor().is_running());

    tx.send("main.go".to_string()).await.unwrap();
    wait_for_spawns(&fake, 2).await;

    assert_eq!(fake.max_live(), 1);
    assert!(writer.wait_for_line("[01] Killing service", Duration::from_secs(1)).await);

    // Closing the input winds the pipeline down; the service stays up until
    // explicitly terminated.
    drop(tx);
    with_timeout(handle.join()).await;
    assert!(reflex.supervisor().is_running());
    with_timeout(reflex.supervisor().terminate()).await;
    assert_eq!(fake.live(), 0);
}

#[tokio::test]
async fn fan_out_feeds_every_reflex() {
    let (_writer, sink) = sink();
    let (go_fake, go_backend) = backend(FakeBehaviour::ExitImmediately { success: true });
    let (md_fake, md_backend) = backend(FakeBehaviour::ExitImmediately { success: true });

    let go = Reflex::from_settings(0, &settings(r"\.go$", SupervisorMode::Once), go_backend, sink.clone())
        .unwrap();
    let md = Reflex::from_settings(1, &settings(r"\.md$", SupervisorMode::Once), md_backend, sink)
        .unwrap();

    let (go_tx, go_rx) = mpsc::channel(1);
    let (md_tx, md_rx) = mpsc::channel(1);
    let _go = go.start(go_rx);
    let _md = md.start(md_rx);

    let (tx, rx) = mpsc::channel(1);
    tokio::spawn(fan_out(rx, vec![go_tx, md_tx]));

    tx.send("README.md".to_string()).await.unwrap();
    wait_for_spawns(&md_fake, 1).await;
    sleep(Duration::from_millis(100)).await;
    assert_eq!(go_fake.spawn_count(), 0);

    tx.send("main.go".to_string()).await.unwrap();
    wait_for_spawns(&go_fake, 1).await;
    assert_eq!(md_fake.spawn_count(), 1);
}

#[tokio::test]
async fn filter_stage_forwards_only_matches() {
    let matcher: Arc<dyn Matcher> = Arc::new(RegexMatcher::new("^vendor/", true).unwrap());
    let (in_tx, in_rx) = mpsc::channel(1);
    let (out_tx, mut out_rx) = mpsc::channel(4);
    let stage = tokio::spawn(filter_matching(matcher, in_rx, out_tx));

    for path in ["vendor/lib.go", "main.go", "vendor/", "cmd/tool.go"] {
        in_tx.send(path.to_string()).await.unwrap();
    }
    drop(in_tx);
    with_timeout(stage).await.unwrap();

    let mut forwarded = Vec::new();
    while let Some(path) = out_rx.recv().await {
        forwarded.push(path);
    }
    assert_eq!(forwarded, vec!["main.go", "cmd/tool.go"]);
}
