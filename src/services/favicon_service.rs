//! Favicon Service for Acme.
//!
//! Favicon fetches run on a worker pool so the caller's thread never waits on
//! the network. Completed fetches are queued and only written into the
//! [`ImageCache`] when the owning thread calls [`FaviconService::drain`],
//! which keeps every cache mutation on one thread. Results apply in
//! completion order: a slow fetch for an earlier page can land after a newer
//! one.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};
use url::Url;

use crate::services::image_cache::{ImageCache, ImageStore};
use crate::types::bookmark::favicon_key;
use crate::types::errors::{AppError, FetchError};
use crate::types::settings::NetworkSettings;

/// Stored in place of a favicon the service could not provide.
pub const PLACEHOLDER_FAVICON: &[u8] = b"acme:placeholder-favicon";

/// Fetches the favicon bytes for a page.
pub trait FaviconFetcher: Send + Sync + 'static {
    fn fetch(&self, page_url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// Fetches favicons from a favicon lookup service over HTTPS.
pub struct HttpFaviconFetcher {
    client: reqwest::blocking::Client,
    service_url: String,
}

impl HttpFaviconFetcher {
    pub fn new(settings: &NetworkSettings) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Ok(Self {
            client,
            service_url: settings.favicon_service_url.clone(),
        })
    }

    /// The service URL with the page URL appended, forced onto `https`.
    pub fn request_url(&self, page_url: &Url) -> Result<Url, FetchError> {
        request_url(&self.service_url, page_url)
    }
}

fn request_url(service_url: &str, page_url: &Url) -> Result<Url, FetchError> {
    let raw = format!("{}{}", service_url, page_url.as_str());
    let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;
    url.set_scheme("https")
        .map_err(|_| FetchError::InvalidUrl(raw.clone()))?;
    Ok(url)
}

impl FaviconFetcher for HttpFaviconFetcher {
    fn fetch(&self, page_url: &Url) -> Result<Vec<u8>, FetchError> {
        let url = self.request_url(page_url)?;
        let bytes = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.bytes())
            .map_err(|e| FetchError::Network(e.to_string()))?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(bytes.to_vec())
    }
}

/// A finished fetch waiting to be written into the cache.
#[derive(Debug, Clone)]
pub struct FaviconResult {
    pub key: String,
    pub page_url: Url,
    pub image: Vec<u8>,
}

/// Runs favicon fetches off-thread and queues their results.
pub struct FaviconService {
    runtime: Option<Runtime>,
    fetcher: Arc<dyn FaviconFetcher>,
    tx: Sender<FaviconResult>,
    rx: Receiver<FaviconResult>,
}

impl FaviconService {
    pub fn new(fetcher: Arc<dyn FaviconFetcher>) -> Result<Self, AppError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(4)
            .thread_name("acme-favicon")
            .enable_all()
            .build()
            .map_err(|e| AppError::Runtime(e.to_string()))?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            runtime: Some(runtime),
            fetcher,
            tx,
            rx,
        })
    }

    /// Starts fetching the favicon for `page_url`. Never blocks.
    ///
    /// Transport failures are logged and dropped; any other failure queues
    /// [`PLACEHOLDER_FAVICON`] instead.
    pub fn request(&self, page_url: &Url) {
        let Some(runtime) = self.runtime.as_ref() else {
            warn!(url = %page_url, error = %FetchError::ServiceUnavailable, "Favicon not requested");
            return;
        };
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let page_url = page_url.clone();

        runtime.spawn_blocking(move || {
            let image = match fetcher.fetch(&page_url) {
                Ok(image) => image,
                Err(FetchError::Network(e)) => {
                    warn!(url = %page_url, error = %e, "Favicon fetch failed");
                    return;
                }
                Err(e) => {
                    debug!(url = %page_url, error = %e, "Using placeholder favicon");
                    PLACEHOLDER_FAVICON.to_vec()
                }
            };
            let result = FaviconResult {
                key: favicon_key(&page_url),
                page_url,
                image,
            };
            if tx.send(result).is_err() {
                debug!("Favicon service dropped before fetch completed");
            }
        });
    }

    /// Writes every completed fetch into `cache`. Returns how many were applied.
    pub fn drain<S: ImageStore>(&self, cache: &mut ImageCache<S>) -> usize {
        let mut applied = 0;
        while let Ok(result) = self.rx.try_recv() {
            Self::apply(cache, result);
            applied += 1;
        }
        applied
    }

    /// Like [`drain`](Self::drain), but waits up to `timeout` for at least
    /// `expected` results to arrive.
    pub fn drain_within<S: ImageStore>(
        &self,
        cache: &mut ImageCache<S>,
        expected: usize,
        timeout: Duration,
    ) -> usize {
        let deadline = Instant::now() + timeout;
        let mut applied = 0;
        while applied < expected {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(result) => {
                    Self::apply(cache, result);
                    applied += 1;
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        applied + self.drain(cache)
    }

    fn apply<S: ImageStore>(cache: &mut ImageCache<S>, result: FaviconResult) {
        if let Err(e) = cache.save(&result.key, result.image) {
            warn!(url = %result.page_url, key = %result.key, error = %e, "Failed to cache favicon");
        }
    }
}

impl Drop for FaviconService {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
