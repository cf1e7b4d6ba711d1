use reflex::output::{self, format_message, MessageSource, OutputMessage};
use reflex_test_utils::capture::CaptureWriter;
use reflex_test_utils::with_timeout;

#[test]
fn tags_are_zero_padded_ids_or_info() {
    assert_eq!(MessageSource::Supervisor(0).to_string(), "[00]");
    assert_eq!(MessageSource::Supervisor(7).to_string(), "[07]");
    assert_eq!(MessageSource::Supervisor(123).to_string(), "[123]");
    assert_eq!(MessageSource::Info.to_string(), "[info]");
}

#[test]
fn exactly_one_trailing_newline() {
    let plain = format_message(&OutputMessage::supervisor(1, "listening"));
    assert_eq!(plain, "[01] listening\n");

    let terminated = format_message(&OutputMessage::info("done\n"));
    assert_eq!(terminated, "[info] done\n");

    let empty = format_message(&OutputMessage::supervisor(2, ""));
    assert_eq!(empty, "[02] \n");
}

#[tokio::test]
async fn mux_serializes_all_sinks_in_arrival_order() {
    let writer = CaptureWriter::new();
    let (mux, sink) = output::channel(writer.clone());
    let handle = mux.spawn();

    let other = sink.clone();
    assert!(sink.send(OutputMessage::supervisor(0, "a")).await);
    assert!(other.send(OutputMessage::supervisor(1, "b")).await);
    assert!(sink.info("c").await);

    drop(sink);
    drop(other);
    with_timeout(handle).await.unwrap().unwrap();

    assert_eq!(writer.contents(), "[00] a\n[01] b\n[info] c\n");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_senders_are_multiplexed_too() {
    let writer = CaptureWriter::new();
    let (mux, sink) = output::channel(writer.clone());
    let handle = mux.spawn();

    let threads: Vec<_> = (0..3u32)
        .map(|id| {
            let sink = sink.clone();
            std::thread::spawn(move || {
                for n in 0..10 {
                    assert!(sink.blocking_send(OutputMessage::supervisor(id, format!("line {n}"))));
                }
            })
        })
        .collect();
    drop(sink);
    for t in threads {
        t.join().unwrap();
    }
    with_timeout(handle).await.unwrap().unwrap();

    let lines = writer.lines();
    assert_eq!(lines.len(), 30);
    for id in 0..3u32 {
        let own: Vec<_> = lines
            .iter()
            .filter(|l| l.starts_with(&format!("[{id:02}]")))
            .cloned()
            .collect();
        let expected: Vec<_> = (0..10).map(|n| format!("[{id:02}] line {n}")).collect();
        assert_eq!(own, expected);
    }
}

#[tokio::test]
async fn send_reports_a_closed_mux() {
    let (mux, sink) = output::channel(CaptureWriter::new());
    drop(mux);
    assert!(!sink.info("nobody listens").await);
}
