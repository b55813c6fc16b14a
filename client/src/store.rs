//! The replicated document store a session talks to

use async_trait::async_trait;
use tandem_protocol::{ChoiceKey, DocumentPath, TurnChoice};
use thiserror::Error;
use tokio::sync::mpsc;

/// Failures reported by a document store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Store closed")]
    Closed,
}

impl StoreError {
    /// Check if retrying the same request could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// One delivery on a subscription: the document's current value (`None`
/// if it does not exist) or a stream failure
pub type StoreItem = Result<Option<serde_json::Value>, StoreError>;

/// Push channel for one subscribed document. Dropping it unsubscribes.
pub type Subscription = mpsc::UnboundedReceiver<StoreItem>;

/// Keyed document store with change notification.
///
/// Implementations must deliver the current value right after
/// [`subscribe`](Self::subscribe) and again on every change, and must
/// apply each [`write_choice`](Self::write_choice) atomically.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Subscribe to a document
    fn subscribe(&self, path: &DocumentPath) -> Subscription;

    /// Best-effort estimate of `server_now - local_now` in milliseconds
    async fn server_offset_millis(&self) -> Result<i64, StoreError>;

    /// Write (or overwrite) one player's choice for one turn
    async fn write_choice(&self, key: &ChoiceKey, choice: &TurnChoice) -> Result<(), StoreError>;
}
