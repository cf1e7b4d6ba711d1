use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use reflex::config::CommandSettings;
use reflex::engine::Reflex;
use reflex::exec::{Supervisor, SupervisorOptions, SupervisorPhase};
use reflex::output;
use reflex::shutdown::ShutdownCoordinator;
use reflex::types::SupervisorMode;
use reflex_test_utils::capture::CaptureWriter;
use reflex_test_utils::fake_backend::{FakeBackend, FakeBehaviour};
use reflex_test_utils::{init_tracing, with_timeout};

const REASON: &str = "Interrupted (interrupt). Cleaning up children...";

struct Fixture {
    writer: CaptureWriter,
    backends: Vec<FakeBackend>,
    supervisors: Vec<Arc<Supervisor>>,
    coordinator: Arc<ShutdownCoordinator>,
}

fn setup(behaviours: &[FakeBehaviour]) -> Fixture {
    let writer = CaptureWriter::new();
    let (mux, sink) = output::channel(writer.clone());
    mux.spawn();

    let mut backends = Vec::new();
    let mut supervisors = Vec::new();
    for (id, behaviour) in behaviours.iter().enumerate() {
        let backend = FakeBackend::new(*behaviour);
        let mut options = SupervisorOptions::new(id as u32, vec!["server".to_string()]);
        options.shutdown_timeout = Duration::from_millis(30);
        supervisors.push(Arc::new(Supervisor::new(
            options,
            Arc::new(backend.clone()),
            sink.clone(),
        )));
        backends.push(backend);
    }

    let coordinator = Arc::new(ShutdownCoordinator::new(
        supervisors.clone(),
        sink,
        Duration::from_millis(10),
    ));
    Fixture {
        writer,
        backends,
        supervisors,
        coordinator,
    }
}

#[tokio::test]
async fn shutdown_terminates_every_running_supervisor() {
    let f = setup(&[FakeBehaviour::ExitOnInterruptByte, FakeBehaviour::ExitOnKill]);
    for sup in &f.supervisors {
        sup.start("").await;
    }
    assert!(f.backends.iter().all(|b| b.live() == 1));

    assert!(with_timeout(f.coordinator.shutdown(REASON)).await);

    assert!(f.backends.iter().all(|b| b.live() == 0));
    for sup in &f.supervisors {
        assert_eq!(sup.phase(), SupervisorPhase::Stopped);
    }
    assert!(
        f.writer
            .wait_for_line(&format!("[info] {REASON}"), Duration::from_secs(1))
            .await
    );
}

#[tokio::test]
async fn idle_supervisors_are_left_alone() {
    let f = setup(&[FakeBehaviour::ExitOnSignal, FakeBehaviour::ExitOnSignal]);
    f.supervisors[1].start("").await;

    assert!(with_timeout(f.coordinator.shutdown(REASON)).await);

    assert_eq!(f.backends[0].spawn_count(), 0);
    assert_eq!(f.supervisors[0].phase(), SupervisorPhase::Idle);
    assert_eq!(f.supervisors[1].phase(), SupervisorPhase::Stopped);
}

#[tokio::test]
async fn shutdown_runs_only_once() {
    let f = setup(&[FakeBehaviour::ExitOnSignal]);
    f.supervisors[0].start("").await;

    let (a, b) = with_timeout(async {
        tokio::join!(f.coordinator.shutdown(REASON), f.coordinator.shutdown(REASON))
    })
    .await;
    assert!(a ^ b, "exactly one caller performs the shutdown");
    assert!(!with_timeout(f.coordinator.shutdown(REASON)).await);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let reasons = f
        .writer
        .lines()
        .into_iter()
        .filter(|l| l.starts_with("[info]"))
        .count();
    assert_eq!(reasons, 1);
}

#[tokio::test]
async fn queued_change_does_not_start_a_child_after_shutdown() {
    init_tracing();
    let writer = CaptureWriter::new();
    let (mux, sink) = output::channel(writer.clone());
    mux.spawn();

    let backend = FakeBackend::new(FakeBehaviour::ExitOnSignal);
    let settings = CommandSettings {
        source: "[command line]".to_string(),
        regex: r"\.go$".to_string(),
        inverse: false,
        argv: vec!["go".to_string(), "test".to_string()],
        mode: SupervisorMode::Once,
        shutdown_timeout: Duration::from_millis(30),
        quiet_interval: Duration::from_millis(20),
    };
    let reflex =
        Reflex::from_settings(0, &settings, Arc::new(backend.clone()), sink.clone()).unwrap();
    let (tx, rx) = mpsc::channel(1);
    let _handle = reflex.start(rx);

    tx.send("a.go".to_string()).await.unwrap();
    with_timeout(async {
        while backend.spawn_count() < 1 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;

    // Lands in the backlog while the first run is still going.
    tx.send("b.go".to_string()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(backend.spawn_count(), 1);

    let coordinator =
        ShutdownCoordinator::new(vec![reflex.supervisor()], sink, Duration::from_millis(10));
    assert!(with_timeout(coordinator.shutdown(REASON)).await);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.spawn_count(), 1);
    assert_eq!(backend.live(), 0);
    assert!(reflex.supervisor().is_shutting_down());
}
