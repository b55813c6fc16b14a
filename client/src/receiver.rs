use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::Stream;
use tandem_protocol::{PrivateMirror, PublicProjection, SessionMeta, StreamKind, TurnChoice};
use tokio::sync::mpsc;

use crate::handler::SessionHandler;

/// One accepted change to a session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Meta(Arc<SessionMeta>),
    Public(Arc<PublicProjection>),
    Private(Arc<PrivateMirror>),
    Cleared(StreamKind),
    StreamFailed { stream: StreamKind, message: String },
    ChoiceCommitted { turn: u32, choice: TurnChoice },
}

/// Receives session events and dispatches them to a handler.
pub struct SessionReceiver {
    incoming: mpsc::UnboundedReceiver<SessionEvent>,
    closed: Arc<AtomicBool>,
}

impl SessionReceiver {
    pub(crate) fn new(incoming: mpsc::UnboundedReceiver<SessionEvent>, closed: Arc<AtomicBool>) -> Self {
        Self { incoming, closed }
    }

    /// Run the event loop, dispatching events to the handler.
    ///
    /// This will run until the session is closed.
    pub async fn run<H: SessionHandler>(&mut self, handler: &mut H) {
        while let Some(event) = self.next_event().await {
            dispatch_event(handler, event).await;
        }
    }

    /// Get the next event, or `None` once the session is closed
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.incoming.recv().await?;
        if self.closed.load(Ordering::SeqCst) {
            self.incoming.close();
            return None;
        }
        Some(event)
    }

    /// Consume the receiver as a stream of events
    pub fn into_stream(self) -> impl Stream<Item = SessionEvent> {
        futures_util::stream::unfold(self, |mut receiver| async move {
            let event = receiver.next_event().await?;
            Some((event, receiver))
        })
    }
}

/// Dispatch a single event to the appropriate handler method
async fn dispatch_event<H: SessionHandler>(handler: &mut H, event: SessionEvent) {
    match event {
        SessionEvent::Meta(meta) => handler.on_meta(meta).await,
        SessionEvent::Public(public) => handler.on_public(public).await,
        SessionEvent::Private(private) => handler.on_private(private).await,
        SessionEvent::Cleared(stream) => handler.on_cleared(stream).await,
        SessionEvent::StreamFailed { stream, message } => {
            handler.on_stream_error(stream, &message).await
        }
        SessionEvent::ChoiceCommitted { turn, choice } => {
            handler.on_choice_committed(turn, &choice).await
        }
    }
}
