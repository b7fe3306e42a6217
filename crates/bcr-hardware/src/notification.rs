//! In-process notification transport.
//!
//! The scanner reports captured barcodes as broadcast notifications: an action
//! name plus a bag of typed extras. Receivers register with a
//! [`NotificationBus`] under an [`ActionFilter`] and are invoked synchronously,
//! on the sender's thread, for every matching notification.
//!
//! ```text
//! ┌──────────┐  send()   ┌─────────────────┐  on_receive()  ┌──────────┐
//! │ Scanner  │──────────►│ NotificationBus │───────────────►│ Receiver │
//! └──────────┘           │ (action filter) │                └──────────┘
//!                        └─────────────────┘
//! ```
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use bcr_hardware::notification::{ActionFilter, Notification, NotificationBus, NotificationReceiver};
//!
//! struct Counter(AtomicUsize);
//!
//! impl NotificationReceiver for Counter {
//!     fn on_receive(&self, _notification: &Notification) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let bus = NotificationBus::new();
//! let counter = Arc::new(Counter(AtomicUsize::new(0)));
//! let id = bus.register(ActionFilter::new("scan.rcv.message"), counter.clone());
//!
//! bus.send(&Notification::new("scan.rcv.message"));
//! bus.send(&Notification::new("battery.low"));
//! assert_eq!(counter.0.load(Ordering::SeqCst), 1);
//!
//! assert!(bus.unregister(id));
//! ```

use bcr_core::constants::{EXTRA_BARCODE, EXTRA_BARCODE_TYPE, EXTRA_LENGTH, SCAN_FEEDBACK_ACTION};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, trace};

/// Typed value carried by a notification extra.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extra {
    /// Raw byte array.
    Bytes(Vec<u8>),

    /// 32-bit signed integer.
    Int(i32),

    /// Single signed byte.
    Byte(i8),
}

/// A broadcast notification.
///
/// Extra getters follow broadcast semantics: a missing key, or a key holding a
/// value of another type, yields the caller's default.
#[derive(Debug, Clone)]
pub struct Notification {
    action: String,
    extras: HashMap<String, Extra>,
    sent_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification with no extras.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            extras: HashMap::new(),
            sent_at: Utc::now(),
        }
    }

    /// Create a scan feedback notification as the scanner firmware emits it.
    ///
    /// # Examples
    ///
    /// ```
    /// use bcr_hardware::notification::Notification;
    ///
    /// let n = Notification::scan_feedback(b"A12345".to_vec(), 6, 1);
    /// assert_eq!(n.action(), "scan.rcv.message");
    /// assert_eq!(n.int_extra("length", 0), 6);
    /// ```
    pub fn scan_feedback(payload: Vec<u8>, length: i32, type_tag: i8) -> Self {
        Self::new(SCAN_FEEDBACK_ACTION)
            .with_extra(EXTRA_BARCODE, Extra::Bytes(payload))
            .with_extra(EXTRA_LENGTH, Extra::Int(length))
            .with_extra(EXTRA_BARCODE_TYPE, Extra::Byte(type_tag))
    }

    /// Attach an extra, replacing any previous value under the same key.
    pub fn with_extra(mut self, key: impl Into<String>, value: Extra) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Action name.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// When the notification was created.
    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    /// Byte array extra, if present with that type.
    pub fn byte_array_extra(&self, key: &str) -> Option<&[u8]> {
        match self.extras.get(key) {
            Some(Extra::Bytes(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Integer extra, or `default`.
    pub fn int_extra(&self, key: &str, default: i32) -> i32 {
        match self.extras.get(key) {
            Some(Extra::Int(value)) => *value,
            _ => default,
        }
    }

    /// Byte extra, or `default`.
    pub fn byte_extra(&self, key: &str, default: i8) -> i8 {
        match self.extras.get(key) {
            Some(Extra::Byte(value)) => *value,
            _ => default,
        }
    }
}

/// Action name a receiver is interested in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFilter {
    action: String,
}

impl ActionFilter {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
        }
    }

    /// Whether `action` passes the filter.
    pub fn matches(&self, action: &str) -> bool {
        self.action == action
    }
}

/// Callback invoked by the bus for matching notifications.
///
/// Runs on the sender's thread and must not block.
pub trait NotificationReceiver: Send + Sync {
    fn on_receive(&self, notification: &Notification);
}

/// Registration token returned by [`NotificationBus::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReceiverId(u64);

struct Registration {
    id: ReceiverId,
    filter: ActionFilter,
    receiver: Arc<dyn NotificationReceiver>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    registrations: Vec<Registration>,
}

/// Broadcast bus delivering notifications to registered receivers.
///
/// Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Arc<Mutex<BusInner>>,
}

impl NotificationBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `receiver` for notifications passing `filter`.
    pub fn register(
        &self,
        filter: ActionFilter,
        receiver: Arc<dyn NotificationReceiver>,
    ) -> ReceiverId {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = ReceiverId(inner.next_id);
        inner.next_id += 1;
        debug!(?id, ?filter, "Registering notification receiver");
        inner.registrations.push(Registration {
            id,
            filter,
            receiver,
        });
        id
    }

    /// Remove a registration. Returns `false` if `id` was not registered.
    pub fn unregister(&self, id: ReceiverId) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.registrations.len();
        inner.registrations.retain(|r| r.id != id);
        let removed = inner.registrations.len() != before;
        debug!(?id, removed, "Unregistering notification receiver");
        removed
    }

    /// Whether `id` is currently registered.
    pub fn is_registered(&self, id: ReceiverId) -> bool {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.registrations.iter().any(|r| r.id == id)
    }

    /// Number of registered receivers.
    pub fn receiver_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.registrations.len()
    }

    /// Deliver `notification` to every matching receiver.
    ///
    /// Receivers are invoked after the registry lock is released, so a
    /// receiver may register or unregister without deadlocking. Returns the
    /// number of receivers invoked.
    pub fn send(&self, notification: &Notification) -> usize {
        let targets: Vec<Arc<dyn NotificationReceiver>> = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner
                .registrations
                .iter()
                .filter(|r| r.filter.matches(notification.action()))
                .map(|r| Arc::clone(&r.receiver))
                .collect()
        };

        trace!(
            action = notification.action(),
            receivers = targets.len(),
            "Dispatching notification"
        );

        for receiver in &targets {
            receiver.on_receive(notification);
        }
        targets.len()
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl NotificationReceiver for Counter {
        fn on_receive(&self, _notification: &Notification) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Counter {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_scan_feedback_extras() {
        let n = Notification::scan_feedback(b"A12345".to_vec(), 6, 1);
        assert_eq!(n.action(), SCAN_FEEDBACK_ACTION);
        assert_eq!(n.byte_array_extra(EXTRA_BARCODE), Some(&b"A12345"[..]));
        assert_eq!(n.int_extra(EXTRA_LENGTH, 0), 6);
        assert_eq!(n.byte_extra(EXTRA_BARCODE_TYPE, 0), 1);
    }

    #[test]
    fn test_extra_defaults() {
        let n = Notification::new(SCAN_FEEDBACK_ACTION)
            .with_extra(EXTRA_LENGTH, Extra::Byte(6));

        assert_eq!(n.byte_array_extra(EXTRA_BARCODE), None);
        // Wrong type falls back to the default
        assert_eq!(n.int_extra(EXTRA_LENGTH, 0), 0);
        assert_eq!(n.byte_extra(EXTRA_BARCODE_TYPE, 9), 9);
    }

    #[test]
    fn test_action_filter() {
        let filter = ActionFilter::new(SCAN_FEEDBACK_ACTION);
        assert!(filter.matches(SCAN_FEEDBACK_ACTION));
        assert!(!filter.matches("scan.rcv"));
        assert!(!filter.matches(""));
    }

    #[test]
    fn test_sent_at_is_creation_time() {
        let before = Utc::now();
        let n = Notification::scan_feedback(b"A".to_vec(), 1, 1);
        assert!(n.sent_at() >= before);
        assert!(n.sent_at() <= Utc::now());

        // Clones keep the original timestamp
        assert_eq!(n.clone().sent_at(), n.sent_at());
    }

    #[test]
    fn test_bus_delivers_only_matching() {
        let bus = NotificationBus::new();
        let counter = Arc::new(Counter::default());
        bus.register(ActionFilter::new(SCAN_FEEDBACK_ACTION), counter.clone());

        assert_eq!(bus.send(&Notification::new(SCAN_FEEDBACK_ACTION)), 1);
        assert_eq!(bus.send(&Notification::new("other.action")), 0);
        assert_eq!(counter.count(), 1);
    }

    #[test]
    fn test_bus_unregister() {
        let bus = NotificationBus::new();
        let counter = Arc::new(Counter::default());
        let id = bus.register(ActionFilter::new("x"), counter.clone());

        assert!(bus.is_registered(id));
        assert_eq!(bus.receiver_count(), 1);
        assert!(bus.unregister(id));
        assert!(!bus.unregister(id));
        assert!(!bus.is_registered(id));

        bus.send(&Notification::new("x"));
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn test_bus_clone_shares_registry() {
        let bus = NotificationBus::new();
        let clone = bus.clone();
        let counter = Arc::new(Counter::default());
        clone.register(ActionFilter::new("x"), counter.clone());

        bus.send(&Notification::new("x"));
        assert_eq!(counter.count(), 1);
    }

    struct SelfRemoving {
        bus: NotificationBus,
        id: Mutex<Option<ReceiverId>>,
    }

    impl NotificationReceiver for SelfRemoving {
        fn on_receive(&self, _notification: &Notification) {
            if let Some(id) = self.id.lock().unwrap().take() {
                self.bus.unregister(id);
            }
        }
    }

    #[test]
    fn test_receiver_may_unregister_during_dispatch() {
        let bus = NotificationBus::new();
        let receiver = Arc::new(SelfRemoving {
            bus: bus.clone(),
            id: Mutex::new(None),
        });
        let id = bus.register(ActionFilter::new("x"), receiver.clone());
        *receiver.id.lock().unwrap() = Some(id);

        assert_eq!(bus.send(&Notification::new("x")), 1);
        assert_eq!(bus.receiver_count(), 0);
    }
}
