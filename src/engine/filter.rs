// src/engine/filter.rs

//! Stages between the watcher and the debouncers.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::watch::Matcher;

/// Forward only the paths `matcher` accepts.
pub async fn filter_matching(
    matcher: Arc<dyn Matcher>,
    mut input: mpsc::Receiver<String>,
    output: mpsc::Sender<String>,
) {
    while let Some(path) = input.recv().await {
        if !matcher.matches(&path) {
            trace!(path = %path, matcher = %matcher, "path rejected");
            continue;
        }
        if output.send(path).await.is_err() {
            break;
        }
    }
    debug!(matcher = %matcher, "filter stage finished");
}

/// Copy every change to each output, in order. Outputs whose receiver is
/// gone are dropped; the stage ends when none are left.
pub async fn fan_out(mut input: mpsc::Receiver<String>, mut outputs: Vec<mpsc::Sender<String>>) {
    while let Some(path) = input.recv().await {
        let mut closed = Vec::new();
        for (idx, output) in outputs.iter().enumerate() {
            if output.send(path.clone()).await.is_err() {
                closed.push(idx);
            }
        }
        for idx in closed.into_iter().rev() {
            outputs.remove(idx);
        }
        if outputs.is_empty() {
            break;
        }
    }
    debug!("fan-out stage finished");
}
