use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Eventual result of a credential lookup.
pub type CredentialFuture<'a> = Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

/// A credential-fetch collaborator.
///
/// The client resolves two keys per environment, `<env>.datadog.appkey` and
/// `<env>.datadog.apikey`, during non-mock initialization. How and where the
/// secrets live is the implementation's concern.
pub trait CredentialStore: Send + Sync {
    /// Resolves `key`, or `None` if the store has no value for it.
    fn fetch<'a>(&'a self, key: &'a str) -> CredentialFuture<'a>;
}

/// A fixed, map-backed store. Intended for tests and local development.
#[derive(Debug, Default)]
pub struct StaticCredentials {
    entries: HashMap<String, String>,
}

impl StaticCredentials {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entry, replacing any previous value for `key`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn fetch<'a>(&'a self, key: &'a str) -> CredentialFuture<'a> {
        Box::pin(std::future::ready(self.entries.get(key).cloned()))
    }
}

/// A store backed by process environment variables.
///
/// Keys are mapped to variable names by uppercasing and replacing `.` with
/// `_`: `test.datadog.apikey` reads `TEST_DATADOG_APIKEY`.
#[derive(Debug, Default)]
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn fetch<'a>(&'a self, key: &'a str) -> CredentialFuture<'a> {
        let var = key.replace('.', "_").to_uppercase();
        Box::pin(std::future::ready(std::env::var(var).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::{CredentialStore, StaticCredentials};

    #[tokio::test]
    async fn static_store_resolves_known_keys() {
        let store = StaticCredentials::new().with("test.datadog.apikey", "api-123");
        assert_eq!(store.fetch("test.datadog.apikey").await.as_deref(), Some("api-123"));
        assert_eq!(store.fetch("test.datadog.appkey").await, None);
    }
}
