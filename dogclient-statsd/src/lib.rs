//! UDP [dogstatsd][dsd] transport for [`dogclient`].
//!
//! [dsd]: https://docs.datadoghq.com/developers/dogstatsd/
//!
//! One datagram per point; no buffering, no reconnect machinery (UDP has no
//! connection to lose). Every completion handle is fulfilled before `send`
//! returns, with the datagram's byte count or the socket error.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use dogclient::DogClientBuilder;
//! # use dogclient_statsd::{default_agent_addr, UdpTransport};
//! # async fn example() -> std::io::Result<()> {
//! let transport = Arc::new(UdpTransport::connect(default_agent_addr())?);
//! let (client, _status) = DogClientBuilder::new("production")
//!     .with_prefix("checkout")
//!     .build(transport)
//!     .await;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![deny(missing_docs)]

use std::io;
use std::net::{ToSocketAddrs, UdpSocket};

use dogclient::{
    CloseHandle, Event, MetricPoint, SendHandle, ServiceCheck, Transport, TransportError,
};
use tracing::debug;

mod line;

/// The conventional dogstatsd agent address for this process.
///
/// On Kubernetes (detected through `KUBERNETES_SERVICE_HOST`) the agent is
/// reached through the `datadog-statsd` service in the `default` namespace;
/// everywhere else it is assumed to run on localhost.
pub fn default_agent_addr() -> &'static str {
    if std::env::var_os("KUBERNETES_SERVICE_HOST").is_some() {
        "datadog-statsd.default:8125"
    } else {
        "127.0.0.1:8125"
    }
}

/// A [`Transport`] that ships each point as one UDP dogstatsd datagram.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds an ephemeral local socket and associates it with the agent
    /// address.
    ///
    /// # Errors
    ///
    /// Returns the underlying socket error if binding or associating fails;
    /// name resolution happens here, not per send.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<UdpTransport> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.connect(addr)?;
        if let Ok(peer) = socket.peer_addr() {
            debug!(%peer, "Associated dogstatsd transport.");
        }
        Ok(UdpTransport { socket })
    }

    fn ship(&self, line: &str) -> SendHandle {
        let result =
            self.socket.send(line.as_bytes()).map(|bytes| bytes as u64).map_err(TransportError::Io);
        SendHandle::ready(result)
    }
}

impl Transport for UdpTransport {
    fn send(&self, point: MetricPoint<'_>) -> SendHandle {
        self.ship(&line::metric_line(&point))
    }

    fn close(&self) -> CloseHandle {
        // Nothing to tear down; the socket drops with the transport.
        CloseHandle::ready(Ok(()))
    }

    fn event(&self, event: Event<'_>) -> SendHandle {
        self.ship(&line::event_line(&event))
    }

    fn check(&self, check: ServiceCheck<'_>) -> SendHandle {
        self.ship(&line::check_line(&check))
    }
}

#[cfg(test)]
mod tests {
    use std::net::UdpSocket;
    use std::sync::Arc;
    use std::time::Duration;

    use dogclient::{DogClientBuilder, Response};

    use super::UdpTransport;

    fn local_server() -> (UdpSocket, String) {
        let server = UdpSocket::bind("127.0.0.1:0").expect("bind server socket");
        server.set_read_timeout(Some(Duration::from_secs(5))).expect("set read timeout");
        let addr = server.local_addr().expect("server addr").to_string();
        (server, addr)
    }

    fn recv_line(server: &UdpSocket) -> String {
        let mut buf = [0u8; 2048];
        let (len, _) = server.recv_from(&mut buf).expect("receive datagram");
        String::from_utf8(buf[..len].to_vec()).expect("utf-8 datagram")
    }

    #[tokio::test]
    async fn sends_one_datagram_per_point() {
        let (server, addr) = local_server();
        let transport = Arc::new(UdpTransport::connect(addr).expect("connect transport"));

        let (client, status) = DogClientBuilder::new("test")
            .with_tags(["tag:1"])
            .with_prefix("test.prefix")
            .with_host("testhost")
            .build(transport)
            .await;
        assert_eq!(status, Response::Ok);

        assert_eq!(client.send_count_with_tags("fake.metric", 5, &["tag:2"]).await, Response::Ok);
        assert_eq!(
            recv_line(&server),
            "test.prefix.fake.metric:5|c|#tag:2,tag:1,env:test,host:testhost"
        );

        assert_eq!(client.send_gauge("fake.gauge", 2.5).await, Response::Ok);
        assert_eq!(
            recv_line(&server),
            "test.prefix.fake.gauge:2.5|g|#tag:1,env:test,host:testhost"
        );
    }

    #[tokio::test]
    async fn close_after_final_count_returns_the_byte_count() {
        let (server, addr) = local_server();
        let transport = Arc::new(UdpTransport::connect(addr).expect("connect transport"));

        let (client, _) = DogClientBuilder::new("test")
            .with_prefix("test.prefix")
            .build(transport)
            .await;

        let bytes = client.send_count_one_and_close("exit.metric", &[]).await.expect("flush");
        let line = recv_line(&server);
        assert_eq!(line, "test.prefix.exit.metric:1|c|#env:test");
        assert_eq!(bytes, line.len() as u64);
    }
}
