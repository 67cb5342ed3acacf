//! A thin, mockable Datadog metrics client.
//!
//! # Usage
//!
//! Build a client once, then fire counts/gauges/histograms at it:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use dogclient::{DogClientBuilder, Transport};
//! # async fn example(transport: Arc<dyn Transport>) {
//! let (client, _status) = DogClientBuilder::new("production")
//!     .with_tags(["service:checkout"])
//!     .with_prefix("checkout")
//!     .with_host("worker-1")
//!     .build(transport)
//!     .await;
//!
//! // Fire-and-forget: the send is in flight before the call returns, and
//! // awaiting the result is optional.
//! let _ = client.send_count_one("orders.accepted");
//! # }
//! ```
//!
//! # Mock mode
//!
//! In mock mode no transport is set up and no traffic is produced; every
//! send is accumulated into an in-memory ledger keyed by metric name and
//! tag, so tests can assert on emitted values:
//!
//! ```
//! # use dogclient::DogClientBuilder;
//! let client = DogClientBuilder::new("test")
//!     .with_tags(["tag:1"])
//!     .with_prefix("test.prefix")
//!     .build_mocked();
//!
//! let _ = client.send_count("fake.metric", 2);
//! assert_eq!(client.get_metric("fake.metric", "tag:1"), 2.0);
//! assert_eq!(client.get_metric("fake.metric", "env:test"), 2.0);
//! ```
//!
//! The ledger records metrics under their bare (unprefixed) names, while
//! the wire path sends prefixed names. Existing test suites assert on bare
//! names, so that asymmetry is kept on purpose.
//!
//! # Failure posture
//!
//! Instrumentation must never crash the instrumented program: setup and
//! transport failures are logged and surfaced as [`Response::Error`] on the
//! affected call only, never as a panic.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![deny(missing_docs)]

mod client;
pub use self::client::{DogClient, DogClientBuilder, Emit, FinalFlush, Response};

mod config;
mod ledger;

mod credentials;
pub use self::credentials::{CredentialFuture, CredentialStore, EnvCredentials, StaticCredentials};

mod transport;
pub use self::transport::{
    CheckStatus, CloseHandle, Completion, Event, EventAlertType, EventOptions, EventPriority,
    Handle, MetricKind, MetricPoint, SendHandle, ServiceCheck, Transport, TransportError,
};
