//! Shared HTTP transport.
//!
//! One `reqwest::Client` per process, built lazily on first use and reused by
//! every dispatch call so the connection pool is shared. The service is
//! created once in the composition root and handed around as an `Arc`.

pub mod codec;

use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::Form;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::TransportError;

pub use codec::JSON_CONTENT_TYPE;

/// Timeouts applied to the shared client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
    pub write: Duration,
}

impl Timeouts {
    /// Overall per-request deadline. reqwest has no separate write timeout,
    /// so the upload budget is added to the read budget.
    pub fn total(&self) -> Duration {
        self.read + self.write
    }
}

impl From<&ClientConfig> for Timeouts {
    fn from(config: &ClientConfig) -> Self {
        Self {
            connect: config.connect_timeout,
            read: config.read_timeout,
            write: config.write_timeout,
        }
    }
}

/// Process-wide HTTP client holder.
pub struct TransportService {
    timeouts: Timeouts,
    client: OnceLock<reqwest::Client>,
    build_lock: Mutex<()>,
    #[cfg(test)]
    builds: std::sync::atomic::AtomicUsize,
}

impl TransportService {
    /// Create the service. The client itself is built on first use.
    pub fn new(config: &ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            timeouts: Timeouts::from(config),
            client: OnceLock::new(),
            build_lock: Mutex::new(()),
            #[cfg(test)]
            builds: std::sync::atomic::AtomicUsize::new(0),
        })
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Return the shared client, building it on the first call.
    ///
    /// Every call returns the same instance, and at most one client is ever
    /// built. Construction is serialized; a failed build leaves the slot
    /// empty so a later call can retry.
    pub fn initialize(&self) -> Result<&reqwest::Client, TransportError> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }

        let _building = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = self.client.get() {
            return Ok(client);
        }

        let built = reqwest::Client::builder()
            .connect_timeout(self.timeouts.connect)
            .read_timeout(self.timeouts.read)
            .timeout(self.timeouts.total())
            .build()
            .map_err(TransportError::ClientBuild)?;
        #[cfg(test)]
        self.builds.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        debug!(
            connect = ?self.timeouts.connect,
            read = ?self.timeouts.read,
            write = ?self.timeouts.write,
            "HTTP client initialized"
        );
        Ok(self.client.get_or_init(|| built))
    }

    /// POST a JSON body and return the raw response text.
    pub async fn send_json(&self, url: &str, body: Vec<u8>) -> Result<String, TransportError> {
        let request = self
            .initialize()?
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body);
        self.execute(url, request).await
    }

    /// POST a multipart form and return the raw response text.
    pub async fn send_multipart(&self, url: &str, form: Form) -> Result<String, TransportError> {
        let request = self.initialize()?.post(url).multipart(form);
        self.execute(url, request).await
    }

    /// GET a resource and return the raw response text.
    pub async fn get(&self, url: &str) -> Result<String, TransportError> {
        let request = self.initialize()?.get(url);
        self.execute(url, request).await
    }

    async fn execute(
        &self,
        url: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<String, TransportError> {
        let response = request.send().await.map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url, status = status.as_u16(), "Backend returned error status");
            return Err(TransportError::Status {
                url: url.to_string(),
                code: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(url, e)
            } else {
                TransportError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                timeout: self.timeouts.total(),
            }
        } else {
            TransportError::Network {
                url: url.to_string(),
                source: e,
            }
        }
    }
}
