//! Connectivity tracking
//!
//! Online status is a capability injected into the monitor rather than an
//! ambient global. [`ConnectivityMonitor`] publishes changes over a
//! `tokio::sync::watch` channel and to registered callbacks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::external::StatisticsProvider;

/// Callback invoked with the new status whenever it changes
pub type StatusCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Handle returned by [`ConnectivityObserver::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Source of online/offline status
pub trait ConnectivityObserver: Send + Sync {
    fn subscribe(&self, callback: StatusCallback) -> SubscriptionId;
    fn unsubscribe(&self, id: SubscriptionId);
    fn current_status(&self) -> bool;
}

pub struct ConnectivityMonitor {
    status: watch::Sender<bool>,
    callbacks: Mutex<Vec<(SubscriptionId, StatusCallback)>>,
    next_id: AtomicU64,
}

impl ConnectivityMonitor {
    pub fn new(initially_online: bool) -> Self {
        let (status, _) = watch::channel(initially_online);
        Self {
            status,
            callbacks: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Receiver for async consumers
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }

    /// Publish a status; subscribers are notified only on change
    pub fn set_online(&self, online: bool) {
        let changed = self.status.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });

        if !changed {
            return;
        }

        if online {
            tracing::info!("Connectivity restored");
        } else {
            tracing::warn!("Connectivity lost, serving from offline cache");
        }

        let callbacks: Vec<StatusCallback> =
            self.lock_callbacks().iter().map(|(_, cb)| cb.clone()).collect();
        for callback in callbacks {
            callback(online);
        }
    }

    fn lock_callbacks(&self) -> MutexGuard<'_, Vec<(SubscriptionId, StatusCallback)>> {
        // A panicking callback must not disable connectivity tracking
        self.callbacks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityObserver for ConnectivityMonitor {
    fn subscribe(&self, callback: StatusCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_callbacks().push((id, callback));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.lock_callbacks().retain(|(sid, _)| *sid != id);
    }

    fn current_status(&self) -> bool {
        *self.status.borrow()
    }
}

/// Periodically probe the statistics provider and publish the result
pub fn spawn_probe(
    monitor: Arc<ConnectivityMonitor>,
    provider: Arc<dyn StatisticsProvider>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let online = match provider.probe().await {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!(error = %e, "Connectivity probe failed");
                    false
                }
            };
            monitor.set_online(online);
        }
    })
}
