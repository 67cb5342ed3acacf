//! Mock-mode behavior: accounting, zero reads, clearing, tag composition.

use dogclient::{DogClient, DogClientBuilder, Response};

fn mocked_client() -> DogClient {
    DogClientBuilder::new("test")
        .with_tags(["tag:1"])
        .with_prefix("test.prefix")
        .with_host("testhost")
        .build_mocked()
}

#[tokio::test]
async fn counts_accumulate_per_tag() {
    let client = mocked_client();
    assert_eq!(client.status(), Response::Mocked);

    assert_eq!(client.send_count_one("fake.metric").await, Response::Mocked);
    assert_eq!(client.get_metric("fake.metric", "tag:1"), 1.0);
    assert_eq!(client.get_metric("fake.metric", "env:test"), 1.0);

    assert_eq!(client.send_count("fake.metric", 2).await, Response::Mocked);
    assert_eq!(client.get_metric("fake.metric", "tag:1"), 3.0);
    assert_eq!(client.get_metric("fake.metric", "env:test"), 3.0);

    assert_eq!(client.send_count_with_tags("fake.metric", 5, &["tag:2"]).await, Response::Mocked);
    assert_eq!(client.get_metric("fake.metric", "tag:1"), 8.0);
    assert_eq!(client.get_metric("fake.metric", "env:test"), 8.0);
    assert_eq!(client.get_metric("fake.metric", "tag:2"), 5.0);
}

#[test]
fn recording_happens_before_the_call_returns() {
    let client = mocked_client();

    // The returned future is dropped unawaited; the ledger only sees the
    // send because mock accounting is synchronous.
    drop(client.send_count("fake.metric", 4));
    assert_eq!(client.get_metric("fake.metric", "tag:1"), 4.0);
}

#[tokio::test]
async fn gauge_then_clear_reads_zero() {
    let client = mocked_client();

    assert_eq!(client.send_gauge("fake.gauge", 5.0).await, Response::Mocked);
    assert_eq!(client.get_metric("fake.gauge", "tag:1"), 5.0);

    client.clear_mock_data();
    assert_eq!(client.get_metric("fake.gauge", "tag:1"), 0.0);
}

#[tokio::test]
async fn histogram_and_tagged_one_counts_account_their_values() {
    let client = mocked_client();

    assert_eq!(client.send_count_one_with_tags("req.done", &["code:200"]).await, Response::Mocked);
    assert_eq!(client.send_count_one_with_tags("req.done", &["code:200"]).await, Response::Mocked);
    assert_eq!(client.get_metric("req.done", "code:200"), 2.0);
    assert_eq!(client.get_metric("req.done", "env:test"), 2.0);

    assert_eq!(client.histogram("req.latency", 12.5, &["code:200"]).await, Response::Mocked);
    assert_eq!(client.histogram("req.latency", 7.5, &[]).await, Response::Mocked);
    assert_eq!(client.get_metric("req.latency", "code:200"), 12.5);
    assert_eq!(client.get_metric("req.latency", "env:test"), 20.0);
}

#[test]
fn unseen_metric_or_tag_reads_zero() {
    let client = mocked_client();
    assert_eq!(client.get_metric("never.sent", "tag:1"), 0.0);

    drop(client.send_count_one("fake.metric"));
    assert_eq!(client.get_metric("fake.metric", "tag:unknown"), 0.0);
}

#[test]
fn ledger_keys_are_bare_metric_names() {
    // The wire path would send "test.prefix.fake.metric"; the ledger is
    // keyed by the bare name, matching what callers assert on.
    let client = mocked_client();
    drop(client.send_count_one("fake.metric"));
    assert_eq!(client.get_metric("fake.metric", "env:test"), 1.0);
    assert_eq!(client.get_metric("test.prefix.fake.metric", "env:test"), 0.0);
}

#[tokio::test]
async fn send_count_one_and_close_records_and_returns_zero_bytes() {
    let client = mocked_client();

    let bytes = client.send_count_one_and_close("exit.failure", &["reason:oom"]).await;
    assert_eq!(bytes.unwrap(), 0);
    assert_eq!(client.get_metric("exit.failure", "reason:oom"), 1.0);
    assert_eq!(client.get_metric("exit.failure", "env:test"), 1.0);
}

#[tokio::test]
async fn events_and_checks_resolve_mocked_without_accounting() {
    use dogclient::{CheckStatus, EventOptions};

    let client = mocked_client();
    let status = client.event("deploy", "rolled out", EventOptions::default(), &[]).await;
    assert_eq!(status, Response::Mocked);

    let status = client.check("db.reachable", CheckStatus::Ok, None, &[]).await;
    assert_eq!(status, Response::Mocked);

    assert_eq!(client.get_metric("deploy", "env:test"), 0.0);
    assert_eq!(client.get_metric("db.reachable", "env:test"), 0.0);
}

#[test]
fn add_tags_is_idempotent() {
    let mut client = mocked_client();
    assert_eq!(client.base_tags(), ["tag:1", "env:test"]);

    client.add_tags(["tag:2", "tag:1"]);
    assert_eq!(client.base_tags(), ["tag:1", "env:test", "tag:2"]);

    client.add_tags(["tag:2"]);
    assert_eq!(client.base_tags(), ["tag:1", "env:test", "tag:2"]);
}

#[test]
fn added_tags_reach_later_sends_only() {
    let mut client = mocked_client();
    drop(client.send_count_one("fake.metric"));
    assert_eq!(client.get_metric("fake.metric", "dc:use1"), 0.0);

    client.add_tags(["dc:use1"]);
    drop(client.send_count_one("fake.metric"));
    assert_eq!(client.get_metric("fake.metric", "dc:use1"), 1.0);
    assert_eq!(client.get_metric("fake.metric", "env:test"), 2.0);
}
