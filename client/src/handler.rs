use std::sync::Arc;

use async_trait::async_trait;
use tandem_protocol::{PrivateMirror, PublicProjection, SessionMeta, StreamKind, TurnChoice};

/// Trait for reacting to battle session updates.
///
/// All methods have default no-op implementations, so you only need to
/// implement the events you care about. Nothing is called after the
/// session is closed.
///
/// # Example
///
/// ```ignore
/// struct Announcer;
///
/// #[async_trait]
/// impl SessionHandler for Announcer {
///     async fn on_meta(&mut self, meta: Arc<SessionMeta>) {
///         println!("turn {} is {}", meta.turn, meta.phase);
///     }
/// }
/// ```
#[async_trait]
pub trait SessionHandler: Send {
    /// Called when new session metadata arrives.
    async fn on_meta(&mut self, meta: Arc<SessionMeta>) {
        let _ = meta;
    }

    /// Called when the public projection changes.
    async fn on_public(&mut self, public: Arc<PublicProjection>) {
        let _ = public;
    }

    /// Called when our private mirror changes.
    async fn on_private(&mut self, private: Arc<PrivateMirror>) {
        let _ = private;
    }

    /// Called when a document disappears from the store.
    async fn on_cleared(&mut self, stream: StreamKind) {
        let _ = stream;
    }

    /// Called when a stream delivers an error or an undecodable document.
    /// The other streams keep running.
    async fn on_stream_error(&mut self, stream: StreamKind, message: &str) {
        let _ = (stream, message);
    }

    /// Called after the store acknowledged one of our choices.
    async fn on_choice_committed(&mut self, turn: u32, choice: &TurnChoice) {
        let _ = (turn, choice);
    }
}
