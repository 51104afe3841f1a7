use std::collections::VecDeque;

use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::model::{DrawerSnapshot, Notification, NotificationId, StoreChange};
use crate::transport::EventEnvelope;

pub const DEFAULT_CAPACITY: usize = 200;
const CHANGE_CHANNEL_CAPACITY: usize = 256;

type IdGenerator = Box<dyn FnMut() -> String + Send>;

/// Notification list, unread count and drawer visibility.
///
/// All mutations are synchronous. Notifications are kept newest first and
/// bounded by `capacity`; the oldest entries are evicted once it is exceeded.
pub struct NotificationStore {
    items: VecDeque<Notification>,
    unread: usize,
    drawer_open: bool,
    capacity: usize,
    next_id: IdGenerator,
    changes: broadcast::Sender<StoreChange>,
}

impl NotificationStore {
    pub fn new(capacity: usize) -> Self {
        Self::with_id_generator(capacity, || Uuid::new_v4().to_string())
    }

    /// Build a store that takes notification ids from `next_id`.
    pub fn with_id_generator(
        capacity: usize,
        next_id: impl FnMut() -> String + Send + 'static,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            items: VecDeque::new(),
            unread: 0,
            drawer_open: false,
            capacity: capacity.max(1),
            next_id: Box::new(next_id),
            changes,
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Record an inbound event as a new unread notification.
    pub fn add_notification(&mut self, envelope: EventEnvelope) -> NotificationId {
        let id = self.fresh_id();
        let notification = Notification::from_envelope(id.clone(), envelope, Utc::now());
        self.items.push_front(notification);
        self.unread += 1;
        self.emit(StoreChange::Added { id: id.clone() });

        let mut evicted_any = false;
        while self.items.len() > self.capacity {
            let Some(evicted) = self.items.pop_back() else {
                break;
            };
            tracing::debug!(id = %evicted.id, "evicted oldest notification");
            self.emit(StoreChange::Evicted { id: evicted.id });
            evicted_any = true;
        }
        if evicted_any {
            self.recount_unread();
        }
        id
    }

    /// Returns false if the id is unknown or the notification was already read.
    pub fn mark_as_read(&mut self, id: &str) -> bool {
        let Some(notification) = self.items.iter_mut().find(|n| n.id == *id) else {
            return false;
        };
        if !notification.mark_read() {
            return false;
        }
        self.unread = self.unread.saturating_sub(1);
        self.emit(StoreChange::Read {
            id: NotificationId::from(id),
        });
        true
    }

    /// Returns the number of notifications that were unread.
    pub fn mark_all_as_read(&mut self) -> usize {
        let count = self
            .items
            .iter_mut()
            .map(|n| n.mark_read())
            .filter(|changed| *changed)
            .count();
        self.unread = 0;
        if count > 0 {
            self.emit(StoreChange::AllRead { count });
        }
        count
    }

    pub fn delete_notification(&mut self, id: &str) -> bool {
        let Some(idx) = self.items.iter().position(|n| n.id == *id) else {
            return false;
        };
        let removed = self.items.remove(idx);
        self.recount_unread();
        if let Some(removed) = removed {
            self.emit(StoreChange::Deleted { id: removed.id });
        }
        true
    }

    /// Returns the number of notifications removed.
    pub fn clear_all_notifications(&mut self) -> usize {
        let count = self.items.len();
        self.items.clear();
        self.unread = 0;
        if count > 0 {
            self.emit(StoreChange::Cleared { count });
        }
        count
    }

    /// Flip drawer visibility and return the new value.
    pub fn toggle_notification_drawer(&mut self) -> bool {
        self.drawer_open = !self.drawer_open;
        self.emit(StoreChange::DrawerVisibility {
            visible: self.drawer_open,
        });
        self.drawer_open
    }

    pub fn set_notification_drawer(&mut self, visible: bool) {
        if self.drawer_open != visible {
            self.drawer_open = visible;
            self.emit(StoreChange::DrawerVisibility { visible });
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub fn show_notification_drawer(&self) -> bool {
        self.drawer_open
    }

    /// Notifications, newest first.
    pub fn notifications(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.items.iter().find(|n| n.id == *id)
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn snapshot(&self) -> DrawerSnapshot {
        DrawerSnapshot {
            notifications: self.items.iter().cloned().collect(),
            unread_count: self.unread,
            show_notification_drawer: self.drawer_open,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    pub(crate) fn change_sender(&self) -> broadcast::Sender<StoreChange> {
        self.changes.clone()
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn fresh_id(&mut self) -> NotificationId {
        let candidate = (self.next_id)();
        if self.get(&candidate).is_none() {
            return NotificationId::new(candidate);
        }
        tracing::warn!(id = %candidate, "id generator produced a live id, using a random id");
        loop {
            let id = Uuid::new_v4().to_string();
            if self.get(&id).is_none() {
                return NotificationId::new(id);
            }
        }
    }

    fn recount_unread(&mut self) {
        self.unread = self.items.iter().filter(|n| !n.is_read()).count();
    }

    fn emit(&self, change: StoreChange) {
        // Nobody bound to the store is a normal state.
        let _ = self.changes.send(change);
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
