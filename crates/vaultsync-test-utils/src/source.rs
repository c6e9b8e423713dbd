//! [`MemorySource`]: scripted item source

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use vaultsync_core::{Error, ItemSource, Result};
use vaultsync_model::Item;

/// Item source whose responses are set by the test.
///
/// `fetch_items` returns queued responses first, then the current item list.
#[derive(Debug, Default)]
pub struct MemorySource {
    items: Mutex<Vec<Item>>,
    queued: Mutex<VecDeque<Result<Vec<Item>>>>,
    auth_results: Mutex<VecDeque<bool>>,
    fetch_calls: AtomicUsize,
    auth_calls: AtomicUsize,
}

impl MemorySource {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
            ..Self::default()
        }
    }

    /// Replace the items returned once the queue is drained.
    pub fn set_items(&self, items: Vec<Item>) {
        *self.items.lock().unwrap() = items;
    }

    /// Queue one response for the next unqueued fetch.
    pub fn queue_fetch(&self, response: Vec<Item>) {
        self.queued.lock().unwrap().push_back(Ok(response));
    }

    /// Queue a transient transport failure for the next fetch.
    pub fn queue_transport_failure(&self, message: &str) {
        self.queued
            .lock()
            .unwrap()
            .push_back(Err(Error::transport(message)));
    }

    /// Queue the result of the next `authenticate` call. Unqueued calls
    /// succeed.
    pub fn queue_auth(&self, ok: bool) {
        self.auth_results.lock().unwrap().push_back(ok);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn auth_calls(&self) -> usize {
        self.auth_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemSource for MemorySource {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(response) = self.queued.lock().unwrap().pop_front() {
            return response;
        }
        Ok(self.items.lock().unwrap().clone())
    }

    async fn authenticate(&self) -> Result<bool> {
        self.auth_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.auth_results.lock().unwrap().pop_front().unwrap_or(true))
    }
}
