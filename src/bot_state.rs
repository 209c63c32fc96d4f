use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::{Mutex, RwLock};

use crate::models::Session;
use crate::notify::Notifier;
use crate::repository::ReservationRepository;
use crate::scheduler::ReminderScheduler;

pub type SharedSession = Arc<Mutex<Session>>;

/// Process-wide map of in-progress conversations. An entry is created on
/// first contact or on a flow-start command, mutated one step at a time and
/// removed when its flow completes. Each entry carries its own mutex so a
/// double-send from one conversation is serialized without blocking any
/// other conversation. Sessions are never persisted; a restart drops them.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<ChatId, SharedSession>>>,
}

impl SessionStore {
    pub async fn get(&self, chat_id: ChatId) -> Option<SharedSession> {
        self.inner.read().await.get(&chat_id).cloned()
    }

    /// Starts a fresh session, discarding whatever the conversation had.
    pub async fn start(&self, chat_id: ChatId, session: Session) -> SharedSession {
        let entry = Arc::new(Mutex::new(session));
        self.inner.write().await.insert(chat_id, Arc::clone(&entry));
        entry
    }

    pub async fn remove(&self, chat_id: ChatId) {
        self.inner.write().await.remove(&chat_id);
    }

    /// True while `entry` is still the live session for this conversation.
    /// A queued duplicate message can hold a handle to a session that
    /// another handler already completed and removed; such a message must be
    /// treated as first contact, not applied to the dead session.
    pub async fn is_current(&self, chat_id: ChatId, entry: &SharedSession) -> bool {
        self.inner
            .read()
            .await
            .get(&chat_id)
            .is_some_and(|current| Arc::ptr_eq(current, entry))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn ReservationRepository>,
    pub sessions: SessionStore,
    pub reminders: ReminderScheduler,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(repo: Arc<dyn ReservationRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repo,
            sessions: SessionStore::default(),
            reminders: ReminderScheduler::new(),
            notifier,
        }
    }
}
