use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;
use tokio::sync::oneshot;

/// Errors reported by a transport collaborator.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying socket or connection failed.
    #[error("transport I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The transport does not implement the requested primitive.
    #[error("transport does not support '{primitive}'")]
    Unsupported {
        /// Name of the unsupported primitive (`event`, `check`, ...).
        primitive: &'static str,
    },

    /// The transport dropped the completion side without reporting a result.
    #[error("transport dropped the completion handle before reporting a result")]
    Dropped,
}

/// The kind of a metric point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonic count increment.
    Count,
    /// A last-write-wins gauge value.
    Gauge,
    /// A single histogram sample.
    Histogram,
}

/// A single metric point handed to a transport.
///
/// The name is already fully prefixed and the tag set already includes the
/// client's base tags; transports serialize and ship the point verbatim.
#[derive(Debug, Clone, Copy)]
pub struct MetricPoint<'a> {
    /// Fully prefixed metric name.
    pub name: &'a str,
    /// Point kind.
    pub kind: MetricKind,
    /// Point value. Counts are integral values in disguise.
    pub value: f64,
    /// Client-side sample rate, if any. `None` means "transport default".
    pub sample_rate: Option<f64>,
    /// Effective tag set (call-site tags first, then base tags).
    pub tags: &'a [String],
    /// Host label to attach to the point, if the wire format has room for one.
    pub host: Option<&'a str>,
}

/// Priority of a Datadog event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPriority {
    /// Normal priority (the Datadog default).
    Normal,
    /// Low priority.
    Low,
}

/// Alert type of a Datadog event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventAlertType {
    /// Informational event (the Datadog default).
    Info,
    /// Error event.
    Error,
    /// Warning event.
    Warning,
    /// Success event.
    Success,
}

/// Optional fields of a Datadog event.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventOptions<'a> {
    /// Key used to aggregate related events together.
    pub aggregation_key: Option<&'a str>,
    /// Event priority.
    pub priority: Option<EventPriority>,
    /// Source type name shown in the event stream.
    pub source_type_name: Option<&'a str>,
    /// Alert type.
    pub alert_type: Option<EventAlertType>,
}

/// A Datadog event handed to a transport.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Event title.
    pub title: &'a str,
    /// Event body text.
    pub text: &'a str,
    /// Optional event fields.
    pub options: EventOptions<'a>,
    /// Effective tag set (call-site tags first, then base tags).
    pub tags: &'a [String],
    /// Host label, if any.
    pub host: Option<&'a str>,
}

/// Status of a service check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    /// The checked service is healthy.
    Ok,
    /// The checked service is degraded.
    Warning,
    /// The checked service is down.
    Critical,
    /// The check could not determine a status.
    Unknown,
}

impl CheckStatus {
    /// Numeric wire encoding of the status.
    pub const fn as_u8(self) -> u8 {
        match self {
            CheckStatus::Ok => 0,
            CheckStatus::Warning => 1,
            CheckStatus::Critical => 2,
            CheckStatus::Unknown => 3,
        }
    }
}

/// A service check handed to a transport.
#[derive(Debug, Clone, Copy)]
pub struct ServiceCheck<'a> {
    /// Check name.
    pub name: &'a str,
    /// Check status.
    pub status: CheckStatus,
    /// Optional human-readable message.
    pub message: Option<&'a str>,
    /// Effective tag set (call-site tags first, then base tags).
    pub tags: &'a [String],
    /// Host label, if any.
    pub host: Option<&'a str>,
}

/// Fulfilment side of a [`Handle`].
///
/// A transport that completes asynchronously holds on to the completion and
/// fulfils it when the write finishes. Dropping it without calling
/// [`complete`](Completion::complete) resolves the handle to
/// [`TransportError::Dropped`].
pub struct Completion<T>(oneshot::Sender<Result<T, TransportError>>);

impl<T> Completion<T> {
    /// Fulfils the paired handle with `result`.
    ///
    /// Has no effect if the handle was already dropped.
    pub fn complete(self, result: Result<T, TransportError>) {
        let _ = self.0.send(result);
    }
}

/// Eventual result of a transport operation.
///
/// Resolves once the transport's completion side fires; if the transport
/// drops the completion without fulfilling it, the handle resolves to
/// [`TransportError::Dropped`].
pub struct Handle<T>(oneshot::Receiver<Result<T, TransportError>>);

/// Eventual byte count of a send-style transport operation.
pub type SendHandle = Handle<u64>;

/// Eventual outcome of a transport close.
pub type CloseHandle = Handle<()>;

impl<T> Handle<T> {
    /// Creates a pending handle together with its completion side.
    pub fn pending() -> (Completion<T>, Handle<T>) {
        let (tx, rx) = oneshot::channel();
        (Completion(tx), Handle(rx))
    }

    /// Creates a handle that is already resolved to `result`.
    pub fn ready(result: Result<T, TransportError>) -> Handle<T> {
        let (completion, handle) = Handle::pending();
        completion.complete(result);
        handle
    }
}

impl<T> Future for Handle<T> {
    type Output = Result<T, TransportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.0).poll(cx).map(|recv| match recv {
            Ok(result) => result,
            Err(_) => Err(TransportError::Dropped),
        })
    }
}

/// A metrics transport collaborator.
///
/// Implementations own all network-level concerns: connection state,
/// buffering, reconnects, backpressure. The client never retries; whatever a
/// handle resolves to is the final word on that operation.
pub trait Transport: Send + Sync {
    /// Ships a single metric point.
    ///
    /// The send must already be in flight (or terminally failed) by the time
    /// this returns; the handle only reports completion, awaiting it is
    /// optional.
    fn send(&self, point: MetricPoint<'_>) -> SendHandle;

    /// Tears down the transport connection.
    fn close(&self) -> CloseHandle;

    /// Ships a Datadog event, where the wire format supports one.
    fn event(&self, event: Event<'_>) -> SendHandle {
        let _ = event;
        SendHandle::ready(Err(TransportError::Unsupported { primitive: "event" }))
    }

    /// Ships a service check, where the wire format supports one.
    fn check(&self, check: ServiceCheck<'_>) -> SendHandle {
        let _ = check;
        SendHandle::ready(Err(TransportError::Unsupported { primitive: "check" }))
    }
}

#[cfg(test)]
mod tests {
    use super::{CheckStatus, Handle, TransportError};

    #[tokio::test]
    async fn ready_handle_resolves_immediately() {
        let handle = Handle::ready(Ok(42u64));
        assert_eq!(handle.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn pending_handle_resolves_when_completed() {
        let (completion, handle) = Handle::pending();
        completion.complete(Ok(7u64));
        assert_eq!(handle.await.unwrap(), 7);
    }

    #[tokio::test]
    async fn dropped_completion_resolves_to_dropped() {
        let (completion, handle) = Handle::<u64>::pending();
        drop(completion);
        assert!(matches!(handle.await, Err(TransportError::Dropped)));
    }

    #[test]
    fn check_status_wire_encoding() {
        assert_eq!(CheckStatus::Ok.as_u8(), 0);
        assert_eq!(CheckStatus::Warning.as_u8(), 1);
        assert_eq!(CheckStatus::Critical.as_u8(), 2);
        assert_eq!(CheckStatus::Unknown.as_u8(), 3);
    }
}
