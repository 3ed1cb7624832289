//! Retry-aware, poll-aware fetching of dashboard data.
//!
//! [`Fetcher::invoke`] performs one logical read: a hard-timed backend call, linear
//! backoff retries for transient failures, and interpretation of the reply into a
//! [`FetchResult`]. [`Fetcher::subscribe`] wraps that in a [`Subscription`] that keeps
//! polling while the backend reports it is still processing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::backend::{BackendResponse, StatsBackend};
use crate::config::FetchConfig;
use crate::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RETRY_BACKOFF_MS, DEFAULT_TIMEOUT_MS, MSG_HTTP_STATUS,
    MSG_PROCESSING_DEFAULT, RATE_LIMIT_MARKERS, STATUS_PROCESSING,
};

pub mod loading;
pub mod result;
pub mod subscription;

pub use loading::{LoadingContext, LoadingGuard};
pub use result::{FetchError, FetchResult};
pub use subscription::Subscription;

/// Per-call fetch behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Hard timeout for each attempt
    pub timeout_ms: u64,
    /// Retries after the first attempt, for timeouts and connection failures only
    pub max_retries: u32,
    /// Retry `n` waits `retry_backoff_ms * n`
    pub retry_backoff_ms: u64,
    /// Delay between polls while the backend is processing
    pub poll_interval_ms: u64,
    /// Raise the shared loading indicator while a call is in flight
    pub show_global_indicator: bool,
    /// Also raise it for background poll ticks
    pub indicator_while_polling: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            show_global_indicator: true,
            indicator_while_polling: false,
        }
    }
}

impl From<&FetchConfig> for FetchOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
            poll_interval_ms: config.poll_interval_ms,
            show_global_indicator: config.show_global_indicator,
            indicator_while_polling: config.indicator_while_polling,
        }
    }
}

impl FetchOptions {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    pub fn with_global_indicator(mut self, show: bool) -> Self {
        self.show_global_indicator = show;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Delay before retry number `retry` (1-based)
    pub fn retry_delay(&self, retry: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(retry)))
    }
}

/// What a backend reply means, before decoding into a concrete type
#[derive(Debug, Clone, PartialEq)]
enum Reply {
    Data(Value),
    Processing(String),
    Failed(FetchError),
}

/// Cache key: endpoint plus the serialized payload
type RequestKey = (String, String);

fn request_key(endpoint: &str, payload: &Value) -> RequestKey {
    (endpoint.to_string(), payload.to_string())
}

/// Fetch front-end shared by every panel.
///
/// Cloning is cheap; clones share the backend, the loading indicator and the cache.
#[derive(Clone)]
pub struct Fetcher {
    backend: Arc<dyn StatsBackend>,
    loading: LoadingContext,
    cache: Arc<Mutex<HashMap<RequestKey, Value>>>,
}

impl Fetcher {
    pub fn new(backend: Arc<dyn StatsBackend>, loading: LoadingContext) -> Self {
        Self {
            backend,
            loading,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn loading(&self) -> &LoadingContext {
        &self.loading
    }

    /// One logical read of `endpoint`.
    ///
    /// A cached successful payload for the same request is returned without a call.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &Value,
        options: &FetchOptions,
    ) -> FetchResult<T> {
        self.run(endpoint, payload, options, false).await
    }

    /// Drop any cached result for the request and read it again
    pub async fn refresh<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &Value,
        options: &FetchOptions,
    ) -> FetchResult<T> {
        self.invalidate(endpoint, payload);
        self.invoke(endpoint, payload, options).await
    }

    /// Create an idle subscription; call [`Subscription::start`] to begin fetching
    pub fn subscribe<T>(&self, endpoint: impl Into<String>, payload: Value, options: FetchOptions) -> Subscription<T>
    where
        T: DeserializeOwned + Clone + Send + 'static,
    {
        Subscription::new(self.clone(), endpoint.into(), payload, options)
    }

    /// Remove the cached result for one request; returns whether one existed
    pub fn invalidate(&self, endpoint: &str, payload: &Value) -> bool {
        let key = request_key(endpoint, payload);
        match self.cache.lock() {
            Ok(mut cache) => cache.remove(&key).is_some(),
            Err(_) => false,
        }
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    pub fn is_cached(&self, endpoint: &str, payload: &Value) -> bool {
        self.cached_value(&request_key(endpoint, payload)).is_some()
    }

    fn cached_value(&self, key: &RequestKey) -> Option<Value> {
        self.cache.lock().ok().and_then(|cache| cache.get(key).cloned())
    }

    fn store(&self, key: RequestKey, value: Value) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, value);
        }
    }

    /// `polling` marks background ticks, which only raise the indicator when configured
    pub(crate) async fn run<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        payload: &Value,
        options: &FetchOptions,
        polling: bool,
    ) -> FetchResult<T> {
        let key = request_key(endpoint, payload);
        if let Some(value) = self.cached_value(&key) {
            debug!("{}: serving cached result", endpoint);
            return decode(endpoint, value);
        }

        let _indicator = (options.show_global_indicator && (!polling || options.indicator_while_polling))
            .then(|| self.loading.show());

        let response = match self.call_with_retry(endpoint, payload, options).await {
            Ok(response) => response,
            Err(e) => {
                error!("{}: giving up: {}", endpoint, e);
                return FetchResult::Error(e);
            }
        };

        match interpret(response) {
            Reply::Processing(message) => {
                info!("{}: backend still processing: {}", endpoint, message);
                FetchResult::Processing(message)
            }
            Reply::Failed(e) => {
                warn!("{}: {}", endpoint, e);
                FetchResult::Error(e)
            }
            Reply::Data(value) => {
                let result = decode(endpoint, value.clone());
                if result.data().is_some() {
                    self.store(key, value);
                }
                result
            }
        }
    }

    async fn call_with_retry(
        &self,
        endpoint: &str,
        payload: &Value,
        options: &FetchOptions,
    ) -> Result<BackendResponse, FetchError> {
        let timeout = options.timeout();
        let mut retry = 0;

        loop {
            // Dropping the transport future on timeout cancels the underlying request
            let attempt = match tokio::time::timeout(timeout, self.backend.post_json(endpoint, payload, timeout)).await
            {
                Ok(result) => result.map_err(|e| FetchError::from_backend(e, options.timeout_ms)),
                Err(_) => Err(FetchError::Timeout {
                    timeout_ms: options.timeout_ms,
                }),
            };

            match attempt {
                Err(e) if e.is_transient() && retry < options.max_retries => {
                    retry += 1;
                    let delay = options.retry_delay(retry);
                    warn!(
                        "{}: attempt {}/{} failed: {}; retrying in {:?}",
                        endpoint,
                        retry,
                        options.max_retries + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> FetchResult<T> {
    match serde_json::from_value(value) {
        Ok(data) => FetchResult::Success(data),
        Err(e) => {
            error!("{}: unexpected response shape: {}", endpoint, e);
            FetchResult::Error(FetchError::Decode(e.to_string()))
        }
    }
}

/// Map a raw reply onto data, a processing marker or a failure
fn interpret(response: BackendResponse) -> Reply {
    let json = response.json();

    if response.status == STATUS_PROCESSING {
        let message = json
            .as_ref()
            .and_then(|v| v.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(MSG_PROCESSING_DEFAULT);
        return Reply::Processing(message.to_string());
    }

    if response.is_success() {
        return match json {
            Some(value) => match processing_message(&value) {
                Some(message) => Reply::Processing(message),
                None => Reply::Data(value),
            },
            None if response.body.trim().is_empty() => Reply::Data(Value::Null),
            None => Reply::Failed(FetchError::Decode("response body is not JSON".to_string())),
        };
    }

    let message = json
        .as_ref()
        .and_then(error_message)
        .unwrap_or_else(|| MSG_HTTP_STATUS.replace("{}", &response.status.to_string()));

    let lowered = message.to_lowercase();
    if RATE_LIMIT_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        let minutes_to_reset = json
            .as_ref()
            .and_then(|v| v.pointer("/rate_limit_info/minutes_to_reset"))
            .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0).ceil() as u64)));
        return Reply::Failed(FetchError::RateLimited {
            message,
            minutes_to_reset,
        });
    }

    Reply::Failed(FetchError::Http {
        status: response.status,
        message,
    })
}

/// A 2xx object carrying nothing but `message` is the backend saying "not ready yet"
fn processing_message(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.get("message").and_then(Value::as_str).map(str::to_string)
}

fn error_message(value: &Value) -> Option<String> {
    ["error", "detail", "message"]
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}
