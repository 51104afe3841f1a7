//! Client-side notification state.
//!
//! `NotificationStore` is the reducer: an ordered, bounded list of received
//! notifications plus the unread count and the drawer visibility flag.
//! `NotificationCenter` is the shared handle the push client and the drawer
//! both hold.

mod center;
mod model;
mod store;


pub use center::NotificationCenter;
pub use model::{DrawerSnapshot, Notification, NotificationId, StoreChange};
pub use store::{NotificationStore, DEFAULT_CAPACITY};
