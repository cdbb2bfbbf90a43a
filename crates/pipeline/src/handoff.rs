//! Single-slot handoff between the detection worker and the frame loop.
//!
//! `Ordered` applies backpressure: the worker blocks until the loop has
//! taken the previous result, so nothing is lost. `Latest` never blocks
//! the worker: a result the loop has not picked up yet is overwritten by
//! the next one, dropping the oldest undelivered frame.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};

/// How detection results reach the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffMode {
    /// Every result is delivered; the worker waits for the loop.
    #[default]
    Ordered,
    /// Only the newest result is kept.
    Latest,
}

impl HandoffMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Latest => "latest",
        }
    }
}

impl std::str::FromStr for HandoffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ordered" => Ok(Self::Ordered),
            "latest" => Ok(Self::Latest),
            other => Err(format!(
                "unknown pipeline mode '{other}' (expected ordered or latest)"
            )),
        }
    }
}

/// Returned by [`HandoffSender::send_blocking`] once the receiver is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffClosed;

/// Worker side. Must only be used from a blocking thread.
#[derive(Debug)]
pub enum HandoffSender<T> {
    Ordered(mpsc::Sender<T>),
    Latest(watch::Sender<Option<T>>),
}

/// Frame-loop side.
#[derive(Debug)]
pub enum HandoffReceiver<T> {
    Ordered(mpsc::Receiver<T>),
    Latest(watch::Receiver<Option<T>>),
}

/// Create a connected sender/receiver pair.
pub fn handoff<T>(mode: HandoffMode) -> (HandoffSender<T>, HandoffReceiver<T>) {
    match mode {
        HandoffMode::Ordered => {
            let (tx, rx) = mpsc::channel(1);
            (HandoffSender::Ordered(tx), HandoffReceiver::Ordered(rx))
        }
        HandoffMode::Latest => {
            let (tx, rx) = watch::channel(None);
            (HandoffSender::Latest(tx), HandoffReceiver::Latest(rx))
        }
    }
}

impl<T> HandoffSender<T> {
    pub fn send_blocking(&self, item: T) -> Result<(), HandoffClosed> {
        match self {
            Self::Ordered(tx) => tx.blocking_send(item).map_err(|_| HandoffClosed),
            Self::Latest(tx) => tx.send(Some(item)).map_err(|_| HandoffClosed),
        }
    }
}

impl<T: Clone> HandoffReceiver<T> {
    /// Wait for the next result. `None` once the sender is gone and every
    /// deliverable result has been taken.
    pub async fn recv(&mut self) -> Option<T> {
        match self {
            Self::Ordered(rx) => rx.recv().await,
            Self::Latest(rx) => loop {
                rx.changed().await.ok()?;
                if let Some(item) = rx.borrow_and_update().clone() {
                    return Some(item);
                }
            },
        }
    }
}
