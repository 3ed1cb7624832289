//! Per-consumer polling task.

use std::sync::{Arc, Mutex};

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{FetchOptions, FetchResult, Fetcher};

/// A consumer's view of one endpoint.
///
/// Starts [`FetchResult::Idle`]. [`start`](Self::start) spawns a task that fetches,
/// and while the backend answers "processing" fetches again every
/// `poll_interval_ms` until a terminal result arrives. The task is aborted by
/// [`cancel`](Self::cancel), by a restart, and when the subscription is dropped.
pub struct Subscription<T> {
    fetcher: Fetcher,
    endpoint: String,
    payload: Value,
    options: FetchOptions,
    state: Arc<Mutex<FetchResult<T>>>,
    updates: Option<mpsc::UnboundedReceiver<FetchResult<T>>>,
    task: Option<JoinHandle<()>>,
}

impl<T> Subscription<T>
where
    T: DeserializeOwned + Clone + Send + 'static,
{
    pub(crate) fn new(fetcher: Fetcher, endpoint: String, payload: Value, options: FetchOptions) -> Self {
        Self {
            fetcher,
            endpoint,
            payload,
            options,
            state: Arc::new(Mutex::new(FetchResult::Idle)),
            updates: None,
            task: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Begin fetching, replacing any task already running
    pub fn start(&mut self) {
        self.cancel();

        let (tx, rx) = mpsc::unbounded_channel();
        self.updates = Some(rx);

        let fetcher = self.fetcher.clone();
        let endpoint = self.endpoint.clone();
        let payload = self.payload.clone();
        let options = self.options.clone();
        let state = Arc::clone(&self.state);

        debug!("{}: subscription started", endpoint);
        self.task = Some(tokio::spawn(async move {
            let publish = |next: FetchResult<T>| {
                if let Ok(mut current) = state.lock() {
                    *current = next.clone();
                }
                let _ = tx.send(next);
            };

            let mut tick: u64 = 0;
            loop {
                publish(FetchResult::Loading);
                let result = fetcher.run::<T>(&endpoint, &payload, &options, tick > 0).await;
                let processing = result.is_processing();
                publish(result);

                if !processing {
                    break;
                }
                tick += 1;
                debug!("{}: poll #{} in {:?}", endpoint, tick, options.poll_interval());
                tokio::time::sleep(options.poll_interval()).await;
            }
            debug!("{}: subscription reached a terminal state", endpoint);
        }));
    }

    /// Explicit user refresh: drop the cached result and fetch again
    pub fn refresh(&mut self) {
        self.fetcher.invalidate(&self.endpoint, &self.payload);
        self.start();
    }

    /// Stop any scheduled or in-flight fetch. The last published state is kept.
    pub fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            if !task.is_finished() {
                debug!("{}: subscription cancelled", self.endpoint);
            }
            task.abort();
        }
    }

    /// Whether a fetch or poll is still scheduled
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Latest published state
    pub fn snapshot(&self) -> FetchResult<T> {
        self.state
            .lock()
            .map(|state| state.clone())
            .unwrap_or(FetchResult::Idle)
    }

    /// Next state transition, in order. `None` once the current run has ended and
    /// every transition has been delivered, or if the subscription was never started.
    pub async fn next_update(&mut self) -> Option<FetchResult<T>> {
        match self.updates.as_mut() {
            Some(updates) => updates.recv().await,
            None => None,
        }
    }

    /// Wait until the current run reaches Success or Error
    pub async fn wait_for_terminal(&mut self) -> FetchResult<T> {
        while let Some(update) = self.next_update().await {
            if update.is_terminal() {
                return update;
            }
        }
        self.snapshot()
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
