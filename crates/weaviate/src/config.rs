use std::collections::BTreeMap;
use std::env;
use std::fmt::{self, Debug, Formatter};

const DEFAULT_SCHEME: &str = "http";

/// Configuration of a [`WeaviateClient`](crate::WeaviateClient).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct WeaviateConfig {
    pub(crate) host: String,
    pub(crate) scheme: String,
    pub(crate) headers: BTreeMap<String, String>,
}

impl WeaviateConfig {
    /// Creates a configuration for the given `host[:port]`, using plain
    /// HTTP.
    #[inline]
    pub fn with_host<S: Into<String>>(host: S) -> Self {
        Self {
            host: host.into(),
            scheme: DEFAULT_SCHEME.to_owned(),
            headers: BTreeMap::new(),
        }
    }

    /// Creates a configuration from the `WEAVIATE_HOST` and
    /// `WEAVIATE_SCHEME` environment variables.
    ///
    /// When `OPENAI_API_KEY` is set, it is forwarded in the
    /// `X-OpenAI-Api-Key` header so the server side vectorizer can use it.
    pub fn from_env() -> Option<Self> {
        let host = env::var("WEAVIATE_HOST").ok()?;
        let mut config = Self::with_host(host);
        if let Ok(scheme) = env::var("WEAVIATE_SCHEME") {
            config = config.with_scheme(scheme);
        }
        if let Ok(api_key) = env::var("OPENAI_API_KEY") {
            config = config.with_header("X-OpenAI-Api-Key", api_key);
        }
        Some(config)
    }

    /// Sets the URL scheme, `http` or `https`.
    #[inline]
    pub fn with_scheme<S: Into<String>>(mut self, scheme: S) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Adds a header sent with every request.
    #[inline]
    pub fn with_header<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Returns the base URL of the server.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host.trim_end_matches('/'))
    }
}

impl Debug for WeaviateConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // Headers usually carry credentials of the vectorizer modules.
        let header_names: Vec<_> = self.headers.keys().collect();
        f.debug_struct("WeaviateConfig")
            .field("host", &self.host)
            .field("scheme", &self.scheme)
            .field("headers", &header_names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_and_redaction() {
        let config = WeaviateConfig::with_host("localhost:8080/")
            .with_header("X-OpenAI-Api-Key", "sk-secret");
        assert_eq!(config.base_url(), "http://localhost:8080");

        let debug = format!("{config:?}");
        assert!(debug.contains("X-OpenAI-Api-Key"));
        assert!(!debug.contains("sk-secret"));
    }
}
