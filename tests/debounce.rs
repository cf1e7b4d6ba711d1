use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Instant};

use reflex::engine::{handoff, Debouncer};

const QUIET: Duration = Duration::from_millis(300);

fn start_debouncer() -> (mpsc::Sender<String>, handoff::Taker<String>) {
    let (tx, rx) = mpsc::channel(1);
    let (giver, taker) = handoff::channel();
    tokio::spawn(Debouncer::new(QUIET).run(rx, giver));
    (tx, taker)
}

#[tokio::test(start_paused = true)]
async fn burst_of_five_dispatches_once_after_quiet_interval() {
    let (tx, taker) = start_debouncer();

    for i in 0..5 {
        if i > 0 {
            sleep(Duration::from_millis(40)).await;
        }
        tx.send(format!("file{i}.go")).await.unwrap();
    }
    let last_sent = Instant::now();

    let dispatched = taker.take().await;
    assert_eq!(dispatched.as_deref(), Some("file0.go"));
    assert!(last_sent.elapsed() >= QUIET);

    // Nothing else is pending.
    assert!(timeout(Duration::from_secs(2), taker.take()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn dispatch_scheduled_quiet_interval_after_last_notification() {
    let (tx, taker) = start_debouncer();
    let start = Instant::now();

    tx.send("a".to_string()).await.unwrap();
    sleep(Duration::from_millis(50)).await;
    tx.send("b".to_string()).await.unwrap();
    sleep(Duration::from_millis(50)).await;
    tx.send("c".to_string()).await.unwrap();

    assert_eq!(taker.take().await.as_deref(), Some("a"));
    let at = start.elapsed();
    assert!(at >= Duration::from_millis(400), "dispatched too early: {at:?}");
    assert!(at < Duration::from_millis(410), "dispatched too late: {at:?}");
}

#[tokio::test(start_paused = true)]
async fn separate_bursts_dispatch_separately() {
    let (tx, taker) = start_debouncer();

    tx.send("first".to_string()).await.unwrap();
    assert_eq!(taker.take().await.as_deref(), Some("first"));

    sleep(Duration::from_secs(1)).await;
    tx.send("second".to_string()).await.unwrap();
    assert_eq!(taker.take().await.as_deref(), Some("second"));
}

#[tokio::test(start_paused = true)]
async fn changes_while_consumer_busy_wait_in_backlog() {
    let (tx, taker) = start_debouncer();

    tx.send("a".to_string()).await.unwrap();
    assert_eq!(taker.take().await.as_deref(), Some("a"));

    // Consumer is "busy" (not taking); new changes still get accepted.
    tx.send("x".to_string()).await.unwrap();
    tx.send("y".to_string()).await.unwrap();
    sleep(Duration::from_secs(2)).await;
    tx.send("z".to_string()).await.unwrap();

    // Only the first pending path survives.
    assert_eq!(taker.take().await.as_deref(), Some("x"));
    assert!(timeout(Duration::from_secs(2), taker.take()).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn closing_input_flushes_pending_then_ends() {
    let (tx, taker) = start_debouncer();

    tx.send("last".to_string()).await.unwrap();
    drop(tx);

    assert_eq!(taker.take().await.as_deref(), Some("last"));
    assert_eq!(taker.take().await, None);
}
