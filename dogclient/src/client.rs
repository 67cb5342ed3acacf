use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::ledger::MockLedger;
use crate::transport::{
    CheckStatus, Event, EventOptions, MetricKind, MetricPoint, SendHandle, ServiceCheck,
    Transport, TransportError,
};

/// Outcome of an initialization or send operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Setup succeeded, or the transport confirmed the operation.
    Ok,
    /// Setup or the transport reported a failure. Details were logged; the
    /// failure never propagates as a panic.
    Error,
    /// Mock mode: the operation was accounted in memory, no traffic produced.
    Mocked,
}

enum Mode {
    Mock,
    Real(Arc<dyn Transport>),
}

/// Eventual [`Response`] of a send-style call.
///
/// The underlying transport send (if any) is already in flight when an
/// `Emit` is handed back; dropping it without awaiting is fine and does not
/// cancel anything. In mock mode the ledger was already updated before the
/// call returned.
pub struct Emit(EmitState);

enum EmitState {
    Ready(Response),
    InFlight(SendHandle),
}

impl Emit {
    fn ready(response: Response) -> Self {
        Emit(EmitState::Ready(response))
    }

    fn in_flight(handle: SendHandle) -> Self {
        Emit(EmitState::InFlight(handle))
    }
}

impl Future for Emit {
    type Output = Response;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.0 {
            EmitState::Ready(response) => Poll::Ready(*response),
            EmitState::InFlight(handle) => match Pin::new(handle).poll(cx) {
                Poll::Ready(Ok(_)) => Poll::Ready(Response::Ok),
                Poll::Ready(Err(err)) => {
                    error!(error = %err, "Transport send failed.");
                    Poll::Ready(Response::Error)
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

/// Eventual byte count of [`DogClient::send_count_one_and_close`].
pub struct FinalFlush(FlushState);

enum FlushState {
    Ready(Option<Result<u64, TransportError>>),
    InFlight(Pin<Box<dyn Future<Output = Result<u64, TransportError>> + Send>>),
}

impl Future for FinalFlush {
    type Output = Result<u64, TransportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.0 {
            FlushState::Ready(result) => {
                Poll::Ready(result.take().expect("FinalFlush polled after completion"))
            }
            FlushState::InFlight(fut) => fut.as_mut().poll(cx),
        }
    }
}

/// Builder for a [`DogClient`].
///
/// ```no_run
/// # use std::sync::Arc;
/// # use dogclient::{DogClientBuilder, Transport};
/// # async fn example(transport: Arc<dyn Transport>) {
/// let (client, status) = DogClientBuilder::new("production")
///     .with_tags(["service:checkout"])
///     .with_prefix("checkout")
///     .with_host("worker-1")
///     .build(transport)
///     .await;
/// # }
/// ```
pub struct DogClientBuilder {
    environment: String,
    tags: Vec<String>,
    prefix: String,
    host: String,
    build_id: Option<String>,
    credentials: Option<Arc<dyn CredentialStore>>,
}

impl DogClientBuilder {
    /// Starts a builder for the given environment name.
    ///
    /// The environment becomes the always-present `env:<name>` base tag and
    /// the namespace under which credentials are looked up.
    pub fn new(environment: impl Into<String>) -> Self {
        DogClientBuilder {
            environment: environment.into(),
            tags: Vec::new(),
            prefix: String::new(),
            host: String::new(),
            build_id: None,
            credentials: None,
        }
    }

    /// Sets the caller-supplied base tags. Duplicates are kept verbatim.
    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the dot-delimited metric-name prefix. A trailing delimiter is
    /// stripped; the wire path always joins with exactly one dot.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the host label attached to emitted points. Never part of the
    /// metric name.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Adds a `build:<id>` tag to the base tag set.
    #[must_use]
    pub fn with_build_id(mut self, build_id: impl Into<String>) -> Self {
        self.build_id = Some(build_id.into());
        self
    }

    /// Supplies the credential collaborator consulted by [`build`](Self::build).
    ///
    /// Without one, `build` skips credential resolution entirely.
    #[must_use]
    pub fn with_credentials(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credentials = Some(store);
        self
    }

    fn into_config(self) -> (ClientConfig, Option<Arc<dyn CredentialStore>>) {
        let config = ClientConfig::new(
            &self.environment,
            self.tags,
            self.prefix,
            self.host,
            self.build_id.as_deref(),
        );
        (config, self.credentials)
    }

    /// Builds a mock-mode client.
    ///
    /// No transport setup and no credential fetch of any kind happens; every
    /// send is accounted into the in-memory ledger and resolves
    /// [`Response::Mocked`].
    pub fn build_mocked(self) -> DogClient {
        let (config, _) = self.into_config();
        DogClient { config, mode: Mode::Mock, status: Response::Mocked, ledger: Mutex::default() }
    }

    /// Builds a client that emits through `transport`.
    ///
    /// If a credential store was supplied, both per-environment Datadog keys
    /// are resolved first; a missing key is a setup failure, reported as
    /// [`Response::Error`] rather than an error type so the caller can still
    /// decide to proceed uninstrumented with the returned client.
    pub async fn build(self, transport: Arc<dyn Transport>) -> (DogClient, Response) {
        let environment = self.environment.clone();
        let (config, credentials) = self.into_config();

        let status = match credentials {
            Some(store) => {
                let app_key = store.fetch(&format!("{environment}.datadog.appkey")).await;
                let api_key = store.fetch(&format!("{environment}.datadog.apikey")).await;
                if app_key.is_some() && api_key.is_some() {
                    Response::Ok
                } else {
                    error!(%environment, "Could not resolve Datadog credentials.");
                    Response::Error
                }
            }
            None => Response::Ok,
        };

        debug!(%environment, ?status, "Metrics client initialized.");
        let client =
            DogClient { config, mode: Mode::Real(transport), status, ledger: Mutex::default() };
        (client, status)
    }
}

/// A thin, mockable Datadog metrics client.
///
/// Owns the tag/prefix configuration and routes every send either to the
/// injected [`Transport`] or, in mock mode, to an in-memory ledger that
/// tests inspect through [`get_metric`](Self::get_metric).
pub struct DogClient {
    config: ClientConfig,
    mode: Mode,
    status: Response,
    ledger: Mutex<MockLedger>,
}

impl DogClient {
    /// The initialization outcome: [`Response::Mocked`] for mock-mode
    /// clients, otherwise whatever [`DogClientBuilder::build`] reported.
    pub fn status(&self) -> Response {
        self.status
    }

    /// Appends each tag not already present in the base tag set, preserving
    /// first-seen order. Re-adding a present tag is a no-op.
    pub fn add_tags<I, T>(&mut self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.config.add_tags(tags);
    }

    /// Nests a further namespace segment under the current prefix.
    pub fn add_prefix(&mut self, segment: &str) {
        self.config.add_prefix(segment);
    }

    /// Current base tag set, in order.
    pub fn base_tags(&self) -> &[String] {
        self.config.base_tags()
    }

    /// Sends a one-count for `metric`.
    pub fn send_count_one(&self, metric: &str) -> Emit {
        self.dispatch(metric, MetricKind::Count, 1.0, &[])
    }

    /// Sends a one-count for `metric` with extra call-site tags.
    pub fn send_count_one_with_tags(&self, metric: &str, tags: &[&str]) -> Emit {
        self.dispatch(metric, MetricKind::Count, 1.0, tags)
    }

    /// Sends a count for `metric`.
    pub fn send_count(&self, metric: &str, count: i64) -> Emit {
        self.dispatch(metric, MetricKind::Count, count as f64, &[])
    }

    /// Sends a count for `metric` with extra call-site tags.
    pub fn send_count_with_tags(&self, metric: &str, count: i64, tags: &[&str]) -> Emit {
        self.dispatch(metric, MetricKind::Count, count as f64, tags)
    }

    /// Sends a gauge value for `metric`.
    pub fn send_gauge(&self, metric: &str, value: f64) -> Emit {
        self.dispatch(metric, MetricKind::Gauge, value, &[])
    }

    /// Sends a gauge value for `metric` with extra call-site tags.
    pub fn send_gauge_with_tags(&self, metric: &str, value: f64, tags: &[&str]) -> Emit {
        self.dispatch(metric, MetricKind::Gauge, value, tags)
    }

    /// Sends a histogram sample for `metric`.
    pub fn histogram(&self, metric: &str, value: f64, tags: &[&str]) -> Emit {
        self.dispatch(metric, MetricKind::Histogram, value, tags)
    }

    /// Sends a one-count and then closes the transport, for exit paths where
    /// closing first could drop the buffered point.
    ///
    /// The close starts only after the send's completion fires. A close
    /// failure is logged and swallowed; the send's byte count is still
    /// returned. In mock mode the count is accounted and the result is an
    /// immediate `Ok(0)`.
    pub fn send_count_one_and_close(&self, metric: &str, tags: &[&str]) -> FinalFlush {
        let effective = self.config.effective_tags(tags);
        match &self.mode {
            Mode::Mock => {
                self.record(metric, 1.0, &effective);
                FinalFlush(FlushState::Ready(Some(Ok(0))))
            }
            Mode::Real(transport) => {
                let name = self.config.full_name(metric);
                let handle = transport.send(MetricPoint {
                    name: &name,
                    kind: MetricKind::Count,
                    value: 1.0,
                    sample_rate: None,
                    tags: &effective,
                    host: Some(self.config.host()),
                });
                let transport = Arc::clone(transport);
                FinalFlush(FlushState::InFlight(Box::pin(async move {
                    let bytes = handle.await?;
                    if let Err(err) = transport.close().await {
                        error!(error = %err, "Failed to close metrics transport.");
                    }
                    Ok(bytes)
                })))
            }
        }
    }

    /// Emits a Datadog event through transports that support one.
    ///
    /// Mock mode resolves [`Response::Mocked`] without touching the ledger;
    /// an event carries nothing summable.
    pub fn event(
        &self,
        title: &str,
        text: &str,
        options: EventOptions<'_>,
        tags: &[&str],
    ) -> Emit {
        match &self.mode {
            Mode::Mock => Emit::ready(Response::Mocked),
            Mode::Real(transport) => {
                let effective = self.config.effective_tags(tags);
                Emit::in_flight(transport.event(Event {
                    title,
                    text,
                    options,
                    tags: &effective,
                    host: Some(self.config.host()),
                }))
            }
        }
    }

    /// Emits a service check through transports that support one.
    pub fn check(
        &self,
        name: &str,
        status: CheckStatus,
        message: Option<&str>,
        tags: &[&str],
    ) -> Emit {
        match &self.mode {
            Mode::Mock => Emit::ready(Response::Mocked),
            Mode::Real(transport) => {
                let effective = self.config.effective_tags(tags);
                Emit::in_flight(transport.check(ServiceCheck {
                    name,
                    status,
                    message,
                    tags: &effective,
                    host: Some(self.config.host()),
                }))
            }
        }
    }

    /// Accumulated mock value for `(metric, tag)`, `0.0` for anything
    /// unseen. Reads the BARE metric name, without the prefix.
    pub fn get_metric(&self, metric: &str, tag: &str) -> f64 {
        self.ledger().get(metric, tag)
    }

    /// Discards all mock accounting, typically between test cases. Never
    /// happens implicitly.
    pub fn clear_mock_data(&self) {
        self.ledger().clear();
    }

    // A poisoned ledger lock is recovered, not propagated: the ledger holds
    // plain sums and stays coherent, and accounting must never panic the
    // instrumented program.
    fn ledger(&self) -> std::sync::MutexGuard<'_, MockLedger> {
        self.ledger.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn record(&self, metric: &str, amount: f64, effective_tags: &[String]) {
        self.ledger().record(metric, amount, effective_tags);
    }

    fn dispatch(&self, metric: &str, kind: MetricKind, value: f64, tags: &[&str]) -> Emit {
        let effective = self.config.effective_tags(tags);
        match &self.mode {
            Mode::Mock => {
                // Accounted under the bare name, before the call returns.
                self.record(metric, value, &effective);
                Emit::ready(Response::Mocked)
            }
            Mode::Real(transport) => {
                let name = self.config.full_name(metric);
                Emit::in_flight(transport.send(MetricPoint {
                    name: &name,
                    kind,
                    value,
                    sample_rate: None,
                    tags: &effective,
                    host: Some(self.config.host()),
                }))
            }
        }
    }
}
