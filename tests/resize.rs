#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use nix::sys::signal::{Signal, raise};
use reflex::exec::{Supervisor, SupervisorOptions, TermSize};
use reflex::output;
use reflex::types::SupervisorMode;
use reflex_test_utils::capture::CaptureWriter;
use reflex_test_utils::fake_backend::{FakeBackend, FakeBehaviour};
use reflex_test_utils::{init_tracing, with_timeout};

const SIZE: TermSize = TermSize { rows: 40, cols: 120 };

fn fixed_size() -> Option<TermSize> {
    Some(SIZE)
}

fn supervisor(backend: &FakeBackend) -> Supervisor {
    let (mux, sink) = output::channel(CaptureWriter::new());
    mux.spawn();
    let mut options = SupervisorOptions::new(0, vec!["server".to_string()]);
    options.mode = SupervisorMode::Service;
    options.shutdown_timeout = Duration::from_millis(30);
    options.terminal_size = fixed_size;
    Supervisor::new(options, Arc::new(backend.clone()), sink)
}

async fn wait_for_resizes(backend: &FakeBackend, pid: u32, count: usize) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if backend.resizes_of(pid).len() >= count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    false
}

#[tokio::test]
async fn window_changes_reach_the_child_until_it_stops() {
    init_tracing();
    let backend = FakeBackend::new(FakeBehaviour::ExitOnInterruptByte).with_terminal();
    let sup = supervisor(&backend);

    sup.start("").await;
    assert!(
        wait_for_resizes(&backend, 1000, 1).await,
        "initial size never applied"
    );
    assert_eq!(backend.resizes_of(1000)[0].1, SIZE);

    raise(Signal::SIGWINCH).expect("raise SIGWINCH");
    assert!(
        wait_for_resizes(&backend, 1000, 2).await,
        "window change not forwarded"
    );
    assert!(backend.resizes_of(1000).iter().all(|(_, size)| *size == SIZE));

    with_timeout(sup.terminate()).await;
    let after_stop = backend.resizes_of(1000).len();

    raise(Signal::SIGWINCH).expect("raise SIGWINCH");
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(backend.resizes_of(1000).len(), after_stop);
}

#[tokio::test]
async fn children_without_a_terminal_are_never_resized() {
    let backend = FakeBackend::new(FakeBehaviour::ExitOnInterruptByte);
    let sup = supervisor(&backend);

    sup.start("").await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    with_timeout(sup.terminate()).await;

    assert!(backend.resizes_of(1000).is_empty());
}
