use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast;

use super::model::{DrawerSnapshot, Notification, NotificationId, StoreChange};
use super::store::NotificationStore;
use crate::transport::EventEnvelope;

/// Cloneable handle to one `NotificationStore`.
///
/// Created once at startup and handed to the push client and to every
/// consumer. Each call holds the lock for exactly one store operation.
#[derive(Clone)]
pub struct NotificationCenter {
    store: Arc<Mutex<NotificationStore>>,
    changes: broadcast::Sender<StoreChange>,
}

impl NotificationCenter {
    pub fn new(capacity: usize) -> Self {
        Self::from_store(NotificationStore::new(capacity))
    }

    pub fn from_store(store: NotificationStore) -> Self {
        let changes = store.change_sender();
        Self {
            store: Arc::new(Mutex::new(store)),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, NotificationStore> {
        // A panic mid-operation cannot leave the store half-updated in a way
        // later calls depend on, so keep serving.
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_notification(&self, envelope: EventEnvelope) -> NotificationId {
        self.lock().add_notification(envelope)
    }

    pub fn mark_as_read(&self, id: &str) -> bool {
        self.lock().mark_as_read(id)
    }

    pub fn mark_all_as_read(&self) -> usize {
        self.lock().mark_all_as_read()
    }

    pub fn delete_notification(&self, id: &str) -> bool {
        self.lock().delete_notification(id)
    }

    pub fn clear_all_notifications(&self) -> usize {
        self.lock().clear_all_notifications()
    }

    pub fn toggle_notification_drawer(&self) -> bool {
        self.lock().toggle_notification_drawer()
    }

    pub fn set_notification_drawer(&self, visible: bool) {
        self.lock().set_notification_drawer(visible)
    }

    pub fn show_notification_drawer(&self) -> bool {
        self.lock().show_notification_drawer()
    }

    pub fn unread_count(&self) -> usize {
        self.lock().unread_count()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn get(&self, id: &str) -> Option<Notification> {
        self.lock().get(id).cloned()
    }

    pub fn snapshot(&self) -> DrawerSnapshot {
        self.lock().snapshot()
    }

    /// Subscribe to store changes without taking the store lock.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::from_store(NotificationStore::default())
    }
}
