//! Latest-value replica of the three battle documents

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tandem_battle::BattleView;
use tandem_protocol::{
    BattleId, DocumentPath, PlayerId, PrivateMirror, PublicProjection, SessionMeta, StreamKind,
    decode_document,
};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::SessionError;
use crate::receiver::{SessionEvent, SessionReceiver};
use crate::store::{DocumentStore, StoreItem, Subscription};

#[derive(Debug, Default)]
struct Failures {
    per_stream: [Option<String>; 3],
    latest: Option<SessionError>,
}

struct Shared {
    battle_id: BattleId,
    view: RwLock<BattleView>,
    failures: Mutex<Failures>,
    closed: Arc<AtomicBool>,
    revision: watch::Sender<u64>,
    events: Mutex<Option<mpsc::UnboundedSender<SessionEvent>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

/// Holds the latest meta, public and private documents for one player.
///
/// Each document has its own subscription and listener task. A failure on
/// one stream is recorded and the others keep going. Documents are
/// replaced wholesale and handed out as `Arc`s, so readers never see a
/// half-applied update.
#[derive(Clone)]
pub struct StateReplica {
    shared: Arc<Shared>,
}

impl StateReplica {
    /// Subscribe to the three documents of `battle_id` as `identity`
    pub fn open(
        store: &dyn DocumentStore,
        battle_id: BattleId,
        identity: PlayerId,
    ) -> (Self, SessionReceiver) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (revision, _) = watch::channel(0);
        let closed = Arc::new(AtomicBool::new(false));

        let shared = Arc::new(Shared {
            battle_id: battle_id.clone(),
            view: RwLock::new(BattleView::new(identity.clone())),
            failures: Mutex::new(Failures::default()),
            closed: closed.clone(),
            revision,
            events: Mutex::new(Some(event_tx)),
            tasks: Mutex::new(Vec::with_capacity(StreamKind::ALL.len())),
        });

        let tasks = StreamKind::ALL
            .iter()
            .map(|&kind| {
                let path = DocumentPath::for_stream(kind, &battle_id, &identity);
                tracing::debug!(battle_id = %battle_id, stream = %kind, path = %path, "Subscribing");
                let subscription = store.subscribe(&path);
                tokio::spawn(listen(shared.clone(), kind, subscription))
            })
            .collect();
        *lock(&shared.tasks) = tasks;

        let receiver = SessionReceiver::new(event_rx, closed);
        (Self { shared }, receiver)
    }

    /// Copy of the current view; documents are shared, not cloned
    pub fn view(&self) -> BattleView {
        read(&self.shared.view).clone()
    }

    pub fn battle_id(&self) -> &BattleId {
        &self.shared.battle_id
    }

    pub fn is_ready(&self) -> bool {
        read(&self.shared.view).is_ready()
    }

    /// Latest error from any stream, cleared once that stream recovers
    pub fn last_error(&self) -> Option<SessionError> {
        lock(&self.shared.failures).latest.clone()
    }

    /// Latest error recorded for one stream
    pub fn stream_error(&self, stream: StreamKind) -> Option<String> {
        lock(&self.shared.failures).per_stream[stream.index()].clone()
    }

    /// Receiver that changes whenever any document is accepted or cleared
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.shared.revision.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Stop all listeners and drop their subscriptions. Idempotent.
    pub fn close(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for task in lock(&self.shared.tasks).drain(..) {
            task.abort();
        }
        lock(&self.shared.events).take();
        tracing::debug!(battle_id = %self.shared.battle_id, "Replica closed");
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        self.shared.emit(event);
    }
}

impl Shared {
    fn emit(&self, event: SessionEvent) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        if let Some(tx) = lock(&self.events).as_ref() {
            let _ = tx.send(event);
        }
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    fn apply(&self, kind: StreamKind, item: StoreItem) {
        let event = match item {
            Ok(Some(value)) => match self.accept(kind, value) {
                Ok(event) => event,
                Err(message) => return self.record_failure(kind, message),
            },
            Ok(None) => {
                let mut view = write(&self.view);
                match kind {
                    StreamKind::Meta => view.meta = None,
                    StreamKind::Public => view.public = None,
                    StreamKind::Private => view.private = None,
                }
                tracing::debug!(battle_id = %self.battle_id, stream = %kind, "Document absent");
                SessionEvent::Cleared(kind)
            }
            Err(e) => return self.record_failure(kind, e.to_string()),
        };

        self.clear_failure(kind);
        self.bump();
        self.emit(event);
    }

    fn accept(&self, kind: StreamKind, value: serde_json::Value) -> Result<SessionEvent, String> {
        let event = match kind {
            StreamKind::Meta => {
                let meta: Arc<SessionMeta> =
                    Arc::new(decode_document(kind, value).map_err(|e| e.to_string())?);
                tracing::debug!(
                    battle_id = %self.battle_id,
                    turn = meta.turn,
                    version = meta.version,
                    phase = %meta.phase,
                    "Meta updated"
                );
                write(&self.view).meta = Some(meta.clone());
                SessionEvent::Meta(meta)
            }
            StreamKind::Public => {
                let public: Arc<PublicProjection> =
                    Arc::new(decode_document(kind, value).map_err(|e| e.to_string())?);
                write(&self.view).public = Some(public.clone());
                SessionEvent::Public(public)
            }
            StreamKind::Private => {
                let private: Arc<PrivateMirror> =
                    Arc::new(decode_document(kind, value).map_err(|e| e.to_string())?);
                write(&self.view).private = Some(private.clone());
                SessionEvent::Private(private)
            }
        };
        Ok(event)
    }

    fn record_failure(&self, stream: StreamKind, message: String) {
        tracing::warn!(battle_id = %self.battle_id, stream = %stream, error = %message, "Stream failed");
        {
            let mut failures = lock(&self.failures);
            failures.per_stream[stream.index()] = Some(message.clone());
            failures.latest = Some(SessionError::Subscription {
                stream,
                message: message.clone(),
            });
        }
        self.emit(SessionEvent::StreamFailed { stream, message });
    }

    fn clear_failure(&self, stream: StreamKind) {
        let mut failures = lock(&self.failures);
        failures.per_stream[stream.index()] = None;
        if matches!(&failures.latest, Some(SessionError::Subscription { stream: s, .. }) if *s == stream)
        {
            failures.latest = None;
        }
    }
}

async fn listen(shared: Arc<Shared>, kind: StreamKind, mut subscription: Subscription) {
    while let Some(item) = subscription.recv().await {
        if shared.closed.load(Ordering::SeqCst) {
            break;
        }
        shared.apply(kind, item);
    }
    tracing::debug!(battle_id = %shared.battle_id, stream = %kind, "Subscription ended");
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
