use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::sync::watch;

/// At most one in-flight operation per key. Callers arriving while one is
/// running wait for it and receive a clone of its result.
pub struct SingleFlight<T> {
    calls: Mutex<HashMap<String, watch::Sender<Option<T>>>>,
}

impl<T> Default for SingleFlight<T> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }
}

/// Removes the leader's entry even if its future is dropped mid-flight,
/// which wakes the waiters with a closed channel.
struct Leader<'a, T> {
    calls: &'a Mutex<HashMap<String, watch::Sender<Option<T>>>>,
    key: &'a str,
}

impl<T> Leader<'_, T> {
    fn finish(self, value: T) {
        let sender = self
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.key);
        if let Some(sender) = sender {
            sender.send_replace(Some(value));
        }
        std::mem::forget(self);
    }
}

impl<T> Drop for Leader<'_, T> {
    fn drop(&mut self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(self.key);
    }
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self, key: &str) -> bool {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub async fn run<F, Fut>(&self, key: &str, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let waiter = {
            let mut calls = self.calls.lock().unwrap_or_else(PoisonError::into_inner);
            match calls.get(key) {
                Some(sender) => Some(sender.subscribe()),
                None => {
                    let (sender, _) = watch::channel(None);
                    calls.insert(key.to_string(), sender);
                    None
                }
            }
        };

        if let Some(mut rx) = waiter {
            if let Ok(result) = rx.wait_for(Option::is_some).await {
                if let Some(value) = result.as_ref() {
                    return value.clone();
                }
            }
            log::debug!("In-flight operation for {} was abandoned, running it here", key);
            return operation().await;
        }

        let leader = Leader {
            calls: &self.calls,
            key,
        };
        let value = operation().await;
        leader.finish(value.clone());
        value
    }
}
