use futures::{Stream, StreamExt as _};
use serde::Serialize;
use std::{
    pin::Pin,
    task::{Context, Poll},
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// The phase of a pricing run that a progress event belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Computing a price per territory
    Calculating,
    /// Matching prices to the storefront's tiers
    Resolving,
    /// Removing previously scheduled price changes
    Deleting,
    /// Submitting the new prices
    Submitting,
}

/// A single line of a progress stream.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProgressEvent<T> {
    /// Work advanced
    Progress {
        /// Units of work done in the current phase
        completed: usize,
        /// Units of work in the current phase
        total: usize,
        /// The current phase
        #[serde(skip_serializing_if = "Option::is_none")]
        phase: Option<Phase>,
    },
    /// The operation finished; always the last event
    Done {
        /// The outcome of the operation
        result: T,
    },
    /// The operation failed; always the last event
    Error {
        /// What went wrong
        message: String,
        /// Units of work done before the failure, if known
        #[serde(skip_serializing_if = "Option::is_none")]
        completed: Option<usize>,
        /// Units of work in the failed phase, if known
        #[serde(skip_serializing_if = "Option::is_none")]
        total: Option<usize>,
    },
}

/// Create a connected progress writer and stream.
///
/// The channel is unbounded, so a slow consumer never stalls the producer.
pub fn progress_channel<T>() -> (ProgressWriter<T>, ProgressStream<T>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        ProgressWriter {
            sender: Some(sender),
        },
        ProgressStream {
            inner: UnboundedReceiverStream::new(receiver),
        },
    )
}

/// The producing half of a progress channel.
///
/// After [`done`](Self::done) or [`error`](Self::error) the writer is closed
/// and every further write is silently dropped, so a stream carries at most
/// one terminal event. A writer dropped while still open emits an error event.
#[derive(Debug)]
pub struct ProgressWriter<T> {
    sender: Option<mpsc::UnboundedSender<ProgressEvent<T>>>,
}

impl<T> ProgressWriter<T> {
    /// Report progress within a phase
    pub fn progress(&self, completed: usize, total: usize, phase: Option<Phase>) {
        self.send(ProgressEvent::Progress {
            completed,
            total,
            phase,
        });
    }

    /// Report success and close the stream
    pub fn done(&mut self, result: T) {
        self.send(ProgressEvent::Done { result });
        self.sender = None;
    }

    /// Report failure and close the stream
    pub fn error(
        &mut self,
        message: impl Into<String>,
        completed: Option<usize>,
        total: Option<usize>,
    ) {
        self.send(ProgressEvent::Error {
            message: message.into(),
            completed,
            total,
        });
        self.sender = None;
    }

    /// Whether a terminal event has been written
    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }

    fn send(&self, event: ProgressEvent<T>) {
        if let Some(sender) = &self.sender {
            // the consumer may have hung up, which is not the producer's problem
            let _ = sender.send(event);
        }
    }
}

impl<T> Drop for ProgressWriter<T> {
    fn drop(&mut self) {
        if !self.is_closed() {
            self.error("operation ended without a result", None, None);
        }
    }
}

/// The consuming half of a progress channel.
///
/// The stream ends once a terminal event has been delivered.
#[derive(Debug)]
pub struct ProgressStream<T> {
    inner: UnboundedReceiverStream<ProgressEvent<T>>,
}

impl<T> Stream for ProgressStream<T> {
    type Item = ProgressEvent<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl<T: Serialize + Send + 'static> ProgressStream<T> {
    /// The events as newline-terminated JSON lines
    pub fn ndjson(self) -> impl Stream<Item = Result<String, serde_json::Error>> + Send + 'static {
        self.map(|event| {
            serde_json::to_string(&event).map(|mut line| {
                line.push('\n');
                line
            })
        })
    }
}
