use parking_lot::{Mutex, ReentrantMutex};
use std::cell::Cell;
use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

use super::state::{Session, SessionUpdate};

type Callback = Arc<dyn Fn(&Session) + Send + Sync>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    callbacks: Vec<(u64, Callback)>,
}

struct Inner {
    state: Mutex<Session>,
    subscribers: Mutex<Subscribers>,
    // Applied snapshots not yet delivered, oldest first
    pending: Mutex<VecDeque<Session>>,
    // Held while delivering. The flag is set while this thread drains
    // `pending`, so updates made from inside a callback only enqueue.
    delivery: ReentrantMutex<Cell<bool>>,
    latest: watch::Sender<Session>,
}

struct Draining<'a>(&'a Cell<bool>);

impl Drop for Draining<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Observable single source of truth for the session
///
/// Reads are open to everyone. Writes are crate-private and only issued by
/// the session controller.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let initial = Session::default();
        let (latest, _) = watch::channel(initial.clone());
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(initial),
                subscribers: Mutex::new(Subscribers::default()),
                pending: Mutex::new(VecDeque::new()),
                delivery: ReentrantMutex::new(Cell::new(false)),
                latest,
            }),
        }
    }

    /// Current session snapshot
    pub fn snapshot(&self) -> Session {
        self.inner.state.lock().clone()
    }

    /// Register `callback` to run synchronously after every update
    ///
    /// The callback receives each merged snapshot in order. It may read the
    /// store or drive the controller, but must not block on another thread
    /// that is itself waiting to update the store.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let mut subscribers = self.inner.subscribers.lock();
        subscribers.next_id += 1;
        let id = subscribers.next_id;
        subscribers.callbacks.push((id, Arc::new(callback)));

        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Latest-value view for async consumers
    ///
    /// Unlike callback subscribers, a slow receiver only sees the newest
    /// snapshot.
    pub fn watch(&self) -> watch::Receiver<Session> {
        self.inner.latest.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().callbacks.len()
    }

    /// Merge `update` into the state and notify every subscriber
    ///
    /// Every subscriber sees every snapshot in the order they were applied.
    /// An update made from inside a callback is delivered once the current
    /// snapshot has reached all subscribers.
    pub(crate) fn update(&self, update: SessionUpdate) -> Session {
        let delivery = self.inner.delivery.lock();

        let snapshot = {
            let mut state = self.inner.state.lock();
            update.apply(&mut state);
            state.clone()
        };
        self.inner.latest.send_replace(snapshot.clone());
        self.inner.pending.lock().push_back(snapshot.clone());

        if delivery.replace(true) {
            return snapshot;
        }
        let _draining = Draining(&delivery);

        loop {
            let next = self.inner.pending.lock().pop_front();
            let Some(next) = next else {
                break;
            };

            let callbacks: Vec<Callback> = self
                .inner
                .subscribers
                .lock()
                .callbacks
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect();
            for callback in callbacks {
                callback(&next);
            }
        }

        snapshot
    }
}

/// Handle returned by [`SessionStore::subscribe`]; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    inner: Weak<Inner>,
}

impl Subscription {
    /// Consume the handle; its `Drop` deregisters the callback
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .subscribers
                .lock()
                .callbacks
                .retain(|(id, _)| *id != self.id);
        }
    }
}
