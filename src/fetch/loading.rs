//! Shared "something is loading" indicator.
//!
//! Every in-flight call holds a [`LoadingGuard`]; the indicator stays raised until
//! the last guard is dropped, so one call finishing never hides another that is
//! still running. Dropping the guard also covers calls that are aborted mid-flight.

use std::sync::{Arc, Mutex};

use log::debug;
use tokio::sync::watch;

#[derive(Debug)]
struct Inner {
    active: Mutex<usize>,
    visible: watch::Sender<bool>,
}

/// Reference-counted loading indicator, cloned into every fetcher that shares it
#[derive(Debug, Clone)]
pub struct LoadingContext {
    inner: Arc<Inner>,
}

impl LoadingContext {
    pub fn new() -> Self {
        let (visible, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                active: Mutex::new(0),
                visible,
            }),
        }
    }

    /// Raise the indicator for as long as the returned guard lives
    #[must_use = "the indicator is lowered as soon as the guard is dropped"]
    pub fn show(&self) -> LoadingGuard {
        if let Ok(mut active) = self.inner.active.lock() {
            *active += 1;
            if *active == 1 {
                debug!("Loading indicator raised");
                self.inner.visible.send_replace(true);
            }
        }
        LoadingGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.active_calls() > 0
    }

    /// Number of guards currently alive
    pub fn active_calls(&self) -> usize {
        self.inner.active.lock().map(|active| *active).unwrap_or(0)
    }

    /// Observe indicator transitions
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.inner.visible.subscribe()
    }
}

impl Default for LoadingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the indicator raised until dropped
#[derive(Debug)]
pub struct LoadingGuard {
    inner: Arc<Inner>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if let Ok(mut active) = self.inner.active.lock() {
            *active = active.saturating_sub(1);
            if *active == 0 {
                debug!("Loading indicator lowered");
                self.inner.visible.send_replace(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_guards_keep_indicator_raised() {
        let loading = LoadingContext::new();
        assert!(!loading.is_loading());

        let first = loading.show();
        let second = loading.show();
        assert_eq!(loading.active_calls(), 2);

        drop(first);
        assert!(loading.is_loading());

        drop(second);
        assert!(!loading.is_loading());
    }

    #[test]
    fn watchers_see_only_edge_transitions() {
        let loading = LoadingContext::new();
        let watcher = loading.watch();
        assert!(!*watcher.borrow());

        let a = loading.show();
        assert!(*watcher.borrow());
        let b = loading.clone().show();
        drop(a);
        assert!(*watcher.borrow());
        drop(b);
        assert!(!*watcher.borrow());
    }
}
