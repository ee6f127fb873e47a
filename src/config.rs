//! Configuration types.

use std::time::Duration;

use crate::error::ConfigError;

/// Default backend address.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the inference backend, without trailing slash.
    pub backend_url: String,
    /// Time allowed to establish a TCP/TLS connection.
    pub connect_timeout: Duration,
    /// Time allowed for the backend to produce a response. Model generation
    /// is slow, so this is generous.
    pub read_timeout: Duration,
    /// Time allowed to upload the request body.
    pub write_timeout: Duration,
    /// Conversation id forwarded with `/ask` so the backend can keep history.
    pub session_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(120),
            write_timeout: Duration::from_secs(30),
            session_id: None,
        }
    }
}

impl ClientConfig {
    /// Build a config from `SMARTTA_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset or unparseable
    /// timeouts fall back to the defaults; the result is validated.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let secs = |key: &str, fallback: Duration| -> Duration {
            lookup(key)
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(fallback)
        };

        let backend_url = lookup("SMARTTA_BACKEND_URL")
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.backend_url);

        let session_id = lookup("SMARTTA_SESSION_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let config = Self {
            backend_url,
            connect_timeout: secs("SMARTTA_CONNECT_TIMEOUT_SECS", defaults.connect_timeout),
            read_timeout: secs("SMARTTA_READ_TIMEOUT_SECS", defaults.read_timeout),
            write_timeout: secs("SMARTTA_WRITE_TIMEOUT_SECS", defaults.write_timeout),
            session_id,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the URL is http(s) and no timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.backend_url.starts_with("http://") || self.backend_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                url: self.backend_url.clone(),
                reason: "scheme must be http or https".to_string(),
            });
        }

        for (key, value) in [
            ("connect_timeout", self.connect_timeout),
            ("read_timeout", self.read_timeout),
            ("write_timeout", self.write_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Join an endpoint path onto the backend URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.backend_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.read_timeout, Duration::from_secs(120));
        assert_eq!(config.write_timeout, Duration::from_secs(30));
        assert!(config.session_id.is_none());
    }

    #[test]
    fn env_overrides_and_trailing_slash_trimmed() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SMARTTA_BACKEND_URL", "https://ta.example.com/"),
            ("SMARTTA_READ_TIMEOUT_SECS", "300"),
            ("SMARTTA_SESSION_ID", "  s-1 "),
        ]))
        .unwrap();
        assert_eq!(config.backend_url, "https://ta.example.com");
        assert_eq!(config.read_timeout, Duration::from_secs(300));
        assert_eq!(config.session_id.as_deref(), Some("s-1"));
    }

    #[test]
    fn unparseable_timeout_falls_back() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("SMARTTA_CONNECT_TIMEOUT_SECS", "soon")]))
                .unwrap();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ClientConfig::from_lookup(lookup_from(&[("SMARTTA_WRITE_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "write_timeout"));
    }

    #[test]
    fn non_http_url_rejected() {
        let err = ClientConfig::from_lookup(lookup_from(&[("SMARTTA_BACKEND_URL", "ftp://x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn endpoint_joins_with_single_slash() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint("/ask"), "http://localhost:8000/ask");
        assert_eq!(config.endpoint("generate_docs"), "http://localhost:8000/generate_docs");
    }
}
