//! Per-recipient publish/subscribe hub.
//!
//! [`SignalHub`] maps a topic key to a [`Topic`] holding the bounded queues
//! of every live subscriber. Topics are created lazily on first subscribe
//! and are never evicted.
//!
//! Locking is two-level: the registry `RwLock` is only write-locked to
//! insert a brand-new topic, and each topic has its own `Mutex` serialising
//! listener mutation and fan-out. Publishers for different keys never
//! contend, and nothing here awaits, so a stalled consumer can never stall a
//! producer: a full queue just loses that one message.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Default per-subscriber queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

// ---------------------------------------------------------------------------
// Errors / results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    /// No topic exists for the key, or it has no listeners. Expected
    /// whenever the recipient has no live session.
    #[error("Topic has no live subscribers")]
    EmptyTopic,
}

/// Outcome of a successful [`SignalHub::publish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Queues the message was appended to.
    pub delivered: usize,
    /// Queues that were full, or whose reader had gone away.
    pub dropped: usize,
}

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

struct Listener<M> {
    id: u64,
    sender: mpsc::Sender<M>,
}

struct TopicState<M> {
    next_id: u64,
    listeners: Vec<Listener<M>>,
}

/// Live listener set for one key, guarded by a lock scoped to that key.
pub struct Topic<M> {
    state: Mutex<TopicState<M>>,
}

impl<M> Topic<M> {
    fn new() -> Self {
        Self {
            state: Mutex::new(TopicState {
                next_id: 0,
                listeners: Vec::new(),
            }),
        }
    }

    // A panic while holding the lock cannot leave the listener list
    // half-updated, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, TopicState<M>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach(&self, capacity: usize) -> (u64, mpsc::Receiver<M>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push(Listener { id, sender });
        (id, receiver)
    }

    /// Remove one listener by identity. Dropping its sender closes the
    /// queue; the reader still drains whatever was already buffered.
    fn detach(&self, id: u64) -> bool {
        let mut state = self.lock();
        let before = state.listeners.len();
        state.listeners.retain(|l| l.id != id);
        state.listeners.len() != before
    }

    fn len(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl<M: Clone> Topic<M> {
    /// Non-blocking enqueue onto every listener, in insertion order.
    ///
    /// Returns `None` when no listener is left once closed queues have been
    /// pruned.
    fn fan_out(&self, message: &M) -> Option<PublishReport> {
        let mut state = self.lock();
        if state.listeners.is_empty() {
            return None;
        }

        let mut report = PublishReport::default();
        state
            .listeners
            .retain(|listener| match listener.sender.try_send(message.clone()) {
                Ok(()) => {
                    report.delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    true
                }
                // Reader dropped without releasing; prune it.
                Err(TrySendError::Closed(_)) => {
                    report.dropped += 1;
                    false
                }
            });

        if state.listeners.is_empty() {
            return None;
        }
        Some(report)
    }
}

// ---------------------------------------------------------------------------
// ReleaseHandle
// ---------------------------------------------------------------------------

/// Capability to detach one subscription from its topic.
///
/// Holds only a weak reference to the topic and the identity of its own
/// queue. [`release`](Self::release) may be called any number of times;
/// dropping the handle releases as well.
pub struct ReleaseHandle<M> {
    topic: Weak<Topic<M>>,
    listener_id: u64,
    released: AtomicBool,
}

impl<M> ReleaseHandle<M> {
    /// Remove this subscription's queue from its topic and close it.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(topic) = self.topic.upgrade() {
            let removed = topic.detach(self.listener_id);
            tracing::trace!(listener_id = self.listener_id, removed, "Subscription released");
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl<M> Drop for ReleaseHandle<M> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<M> fmt::Debug for ReleaseHandle<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseHandle")
            .field("listener_id", &self.listener_id)
            .field("released", &self.is_released())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SignalHub
// ---------------------------------------------------------------------------

/// Keyed fan-out hub with bounded, drop-on-full subscriber queues.
///
/// Designed to be shared via `Arc<SignalHub<_, _>>`.
///
/// ```rust
/// use herald_events::hub::SignalHub;
///
/// let hub: SignalHub<String, &'static str> = SignalHub::with_capacity(4);
/// let (mut rx, release) = hub.subscribe("user-1");
///
/// hub.publish("user-1", "hello").unwrap();
/// assert_eq!(rx.try_recv().unwrap(), "hello");
///
/// release.release();
/// assert!(hub.publish("user-1", "gone").is_err());
/// ```
pub struct SignalHub<K, M> {
    topics: RwLock<HashMap<K, Arc<Topic<M>>>>,
    capacity: usize,
}

impl<K, M> SignalHub<K, M>
where
    K: Eq + Hash + Clone + fmt::Debug,
    M: Clone,
{
    /// Create a hub whose subscriber queues hold [`DEFAULT_QUEUE_CAPACITY`]
    /// messages.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a hub with a specific per-subscriber queue capacity (min 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Register a new bounded queue on `key`'s topic.
    ///
    /// Returns the reading end and the handle that detaches it. Never
    /// blocks on consumers and never fails.
    pub fn subscribe<Q>(&self, key: &Q) -> (mpsc::Receiver<M>, ReleaseHandle<M>)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + fmt::Debug + ?Sized,
    {
        self.subscribe_with_capacity(key, self.capacity)
    }

    /// Like [`subscribe`](Self::subscribe), but with a queue capacity for
    /// this one subscriber (min 1).
    pub fn subscribe_with_capacity<Q>(
        &self,
        key: &Q,
        capacity: usize,
    ) -> (mpsc::Receiver<M>, ReleaseHandle<M>)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + fmt::Debug + ?Sized,
    {
        let topic = self.topic_or_create(key);
        let (listener_id, receiver) = topic.attach(capacity.max(1));

        tracing::debug!(topic = ?key, listener_id, "Subscribed to topic");

        let handle = ReleaseHandle {
            topic: Arc::downgrade(&topic),
            listener_id,
            released: AtomicBool::new(false),
        };
        (receiver, handle)
    }

    /// Offer `message` to every listener of `key` without blocking.
    ///
    /// Full queues drop the message for that listener only. Fails with
    /// [`HubError::EmptyTopic`] when nobody is subscribed.
    pub fn publish<Q>(&self, key: &Q, message: M) -> Result<PublishReport, HubError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + fmt::Debug + ?Sized,
    {
        let topic = self.topic(key).ok_or(HubError::EmptyTopic)?;
        let report = topic.fan_out(&message).ok_or(HubError::EmptyTopic)?;

        if report.dropped > 0 {
            tracing::debug!(
                topic = ?key,
                delivered = report.delivered,
                dropped = report.dropped,
                "Dropped message for slow or closed subscribers"
            );
        }
        Ok(report)
    }

    /// Number of live listeners on `key` (zero if the topic was never created).
    pub fn listener_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.topic(key).map_or(0, |topic| topic.len())
    }

    /// Number of topics ever created. Topics are not evicted, so this only
    /// grows.
    pub fn topic_count(&self) -> usize {
        self.read_topics().len()
    }

    fn read_topics(&self) -> std::sync::RwLockReadGuard<'_, HashMap<K, Arc<Topic<M>>>> {
        self.topics.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn topic<Q>(&self, key: &Q) -> Option<Arc<Topic<M>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read_topics().get(key).cloned()
    }

    /// Load-or-create under the registry write lock, so concurrent first
    /// subscribers always share one topic.
    fn topic_or_create<Q>(&self, key: &Q) -> Arc<Topic<M>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
    {
        if let Some(topic) = self.topic(key) {
            return topic;
        }
        let mut topics = self.topics.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            topics
                .entry(key.to_owned())
                .or_insert_with(|| Arc::new(Topic::new())),
        )
    }
}

impl<K, M> Default for SignalHub<K, M>
where
    K: Eq + Hash + Clone + fmt::Debug,
    M: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
