// src/output.rs

//! Output multiplexing.
//!
//! Every supervisor forwards its child's output, line by line, through an
//! [`OutputSink`]. A single [`OutputMux`] task drains the sink and writes
//! framed lines to one writer (stdout in production):
//!
//! ```text
//! [00] listening on :8080
//! [info] Interrupted (interrupt). Cleaning up children...
//! ```

use std::fmt;
use std::io::{self, Write};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// How many framed lines may wait for the writer before senders block.
pub const OUTPUT_BUFFER: usize = 16;

/// Who a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// Informational message not tied to a supervisor.
    Info,
    Supervisor(u32),
}

impl fmt::Display for MessageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageSource::Info => f.write_str("[info]"),
            MessageSource::Supervisor(id) => write!(f, "[{id:02}]"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMessage {
    pub source: MessageSource,
    pub text: String,
}

impl OutputMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            source: MessageSource::Info,
            text: text.into(),
        }
    }

    pub fn supervisor(id: u32, text: impl Into<String>) -> Self {
        Self {
            source: MessageSource::Supervisor(id),
            text: text.into(),
        }
    }
}

/// Render a message as `<tag> <text>` with exactly one trailing newline.
pub fn format_message(msg: &OutputMessage) -> String {
    let mut line = format!("{} {}", msg.source, msg.text);
    if !line.ends_with('\n') {
        line.push('\n');
    }
    line
}

/// Cloneable handle used to submit lines to the [`OutputMux`].
#[derive(Debug, Clone)]
pub struct OutputSink {
    tx: mpsc::Sender<OutputMessage>,
}

impl OutputSink {
    /// Submit a message. Returns `false` once the mux is gone.
    pub async fn send(&self, msg: OutputMessage) -> bool {
        self.tx.send(msg).await.is_ok()
    }

    /// Submit a message from a blocking thread (e.g. a pty reader).
    ///
    /// Must not be called from within an async context.
    pub fn blocking_send(&self, msg: OutputMessage) -> bool {
        self.tx.blocking_send(msg).is_ok()
    }

    pub async fn info(&self, text: impl Into<String>) -> bool {
        self.send(OutputMessage::info(text)).await
    }
}

/// Serializes messages from all sinks into one writer.
pub struct OutputMux<W> {
    rx: mpsc::Receiver<OutputMessage>,
    writer: W,
}

/// Create a mux writing to `writer` and the first sink feeding it.
pub fn channel<W>(writer: W) -> (OutputMux<W>, OutputSink)
where
    W: Write + Send + 'static,
{
    let (tx, rx) = mpsc::channel(OUTPUT_BUFFER);
    (OutputMux { rx, writer }, OutputSink { tx })
}

impl<W> OutputMux<W>
where
    W: Write + Send + 'static,
{
    pub fn spawn(self) -> JoinHandle<io::Result<()>> {
        tokio::spawn(self.run())
    }

    /// Write messages in arrival order until every sink has been dropped.
    pub async fn run(mut self) -> io::Result<()> {
        while let Some(msg) = self.rx.recv().await {
            let line = format_message(&msg);
            self.writer.write_all(line.as_bytes())?;
            self.writer.flush()?;
        }
        debug!("all output sinks dropped; mux finished");
        Ok(())
    }
}

impl<W> fmt::Debug for OutputMux<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputMux").finish_non_exhaustive()
    }
}
