//! In-process [`DocumentStore`] for tests, demos and local play

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use tandem_protocol::{ChoiceKey, DocumentPath, TurnChoice};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock, mpsc};

use crate::store::{DocumentStore, StoreError, StoreItem, Subscription};

/// Holds every choice write until dropped
pub struct WriteHold {
    _guard: OwnedRwLockWriteGuard<()>,
}

/// A document store that lives in memory.
///
/// Besides implementing [`DocumentStore`], it lets the caller play the
/// authority: publish documents, inject stream and write failures, move
/// the server clock and inspect every write.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, serde_json::Value>>,
    subscribers: Mutex<HashMap<String, Vec<mpsc::UnboundedSender<StoreItem>>>>,
    offset: Mutex<Option<i64>>,
    offset_error: Mutex<Option<StoreError>>,
    writes: Mutex<Vec<(ChoiceKey, TurnChoice)>>,
    write_failures: Mutex<VecDeque<StoreError>>,
    gate: Arc<RwLock<()>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a document and notify its subscribers
    pub fn publish<T: Serialize>(&self, path: &DocumentPath, doc: &T) -> serde_json::Result<()> {
        let value = serde_json::to_value(doc)?;
        self.set_value(path, Some(value));
        Ok(())
    }

    /// Delete a document; subscribers receive `None`
    pub fn remove(&self, path: &DocumentPath) {
        self.set_value(path, None);
    }

    /// Deliver a raw value, bypassing serialization
    pub fn publish_raw(&self, path: &DocumentPath, value: serde_json::Value) {
        self.set_value(path, Some(value));
    }

    /// Push a failure to every subscriber of `path`
    pub fn fail(&self, path: &DocumentPath, error: StoreError) {
        self.notify(&path.to_string(), Err(error));
    }

    /// Current value of a document
    pub fn get(&self, path: &DocumentPath) -> Option<serde_json::Value> {
        self.lock_docs().get(&path.to_string()).cloned()
    }

    /// Stored choice for a key, if any
    pub fn choice(&self, key: &ChoiceKey) -> Option<TurnChoice> {
        let value = self.get(&key.path())?;
        serde_json::from_value(value).ok()
    }

    pub fn set_server_offset(&self, offset_ms: i64) {
        *lock(&self.offset) = Some(offset_ms);
        *lock(&self.offset_error) = None;
    }

    /// Make clock read-backs fail until the next `set_server_offset`
    pub fn fail_server_offset(&self, error: StoreError) {
        *lock(&self.offset_error) = Some(error);
    }

    /// Fail the next write with `error` (queued, one per write)
    pub fn fail_next_write(&self, error: StoreError) {
        lock(&self.write_failures).push_back(error);
    }

    /// Every successful write in order
    pub fn writes(&self) -> Vec<(ChoiceKey, TurnChoice)> {
        lock(&self.writes).clone()
    }

    pub fn write_count(&self) -> usize {
        lock(&self.writes).len()
    }

    /// Number of live subscriptions to `path`
    pub fn subscriber_count(&self, path: &DocumentPath) -> usize {
        lock(&self.subscribers)
            .get(&path.to_string())
            .map(|subs| subs.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    /// Block choice writes until the returned hold is dropped
    pub async fn hold_writes(&self) -> WriteHold {
        WriteHold {
            _guard: self.gate.clone().write_owned().await,
        }
    }

    fn set_value(&self, path: &DocumentPath, value: Option<serde_json::Value>) {
        let key = path.to_string();
        {
            let mut docs = self.lock_docs();
            match &value {
                Some(v) => docs.insert(key.clone(), v.clone()),
                None => docs.remove(&key),
            };
        }
        self.notify(&key, Ok(value));
    }

    fn notify(&self, key: &str, item: StoreItem) {
        if let Some(subs) = lock(&self.subscribers).get_mut(key) {
            subs.retain(|tx| tx.send(item.clone()).is_ok());
        }
    }

    fn lock_docs(&self) -> std::sync::MutexGuard<'_, HashMap<String, serde_json::Value>> {
        lock(&self.docs)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn subscribe(&self, path: &DocumentPath) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let key = path.to_string();

        // Deliver the current value first, then register for changes
        let current = self.lock_docs().get(&key).cloned();
        if tx.send(Ok(current)).is_ok() {
            lock(&self.subscribers).entry(key).or_default().push(tx);
        }
        rx
    }

    async fn server_offset_millis(&self) -> Result<i64, StoreError> {
        if let Some(error) = lock(&self.offset_error).clone() {
            return Err(error);
        }
        Ok(lock(&self.offset).unwrap_or(0))
    }

    async fn write_choice(&self, key: &ChoiceKey, choice: &TurnChoice) -> Result<(), StoreError> {
        let _open = self.gate.read().await;

        if let Some(error) = lock(&self.write_failures).pop_front() {
            return Err(error);
        }

        let value = serde_json::to_value(choice).map_err(|e| StoreError::Rejected(e.to_string()))?;
        lock(&self.writes).push((key.clone(), choice.clone()));
        self.set_value(&key.path(), Some(value));
        Ok(())
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
