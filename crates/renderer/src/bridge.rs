//! Theme signal observed by the host and forwarded to a [`Background`].
//!
//! A [`ThemeSignal`] is the shared theme attribute: any thread may set it,
//! and each subscriber receives the new value over a channel. The
//! [`HostBridge`] drains its subscription on the host thread, so the renderer
//! only ever sees theme changes between frames.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::background::Background;
use crate::platform::Platform;

#[derive(Debug, Default)]
struct SignalState {
    value: String,
    next_observer: u64,
    observers: Vec<(u64, Sender<String>)>,
}

/// A string-valued theme attribute whose changes can be observed.
#[derive(Debug, Clone, Default)]
pub struct ThemeSignal {
    inner: Arc<Mutex<SignalState>>,
}

impl ThemeSignal {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SignalState {
                value: initial.into(),
                next_observer: 0,
                observers: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> String {
        self.lock().value.clone()
    }

    /// Updates the attribute and notifies observers. Setting the current
    /// value again is not a change.
    pub fn set(&self, value: impl Into<String>) {
        let value = value.into();
        let mut state = self.lock();
        if state.value == value {
            return;
        }
        state.value.clone_from(&value);
        state
            .observers
            .retain(|(_, observer)| observer.send(value.clone()).is_ok());
    }

    /// Number of connected observers.
    pub fn observer_count(&self) -> usize {
        self.lock().observers.len()
    }

    fn subscribe(&self) -> Subscription {
        let (sender, receiver) = unbounded();
        let mut state = self.lock();
        let id = state.next_observer;
        state.next_observer += 1;
        state.observers.push((id, sender));
        Subscription {
            id,
            current: state.value.clone(),
            changes: receiver,
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.lock().observers.retain(|(observer, _)| *observer != id);
    }

    fn lock(&self) -> MutexGuard<'_, SignalState> {
        // A panicking writer cannot leave the string half-written.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Subscription {
    id: u64,
    current: String,
    changes: Receiver<String>,
}

/// Connects a [`ThemeSignal`] to a background renderer.
pub struct HostBridge<P: Platform> {
    background: Background<P>,
    signal: ThemeSignal,
    subscription: Option<Subscription>,
}

impl<P: Platform> HostBridge<P> {
    /// Initializes `background`, applies the signal's current value, and
    /// starts observing. Returns `None` when the renderer could not start;
    /// the host then simply has no animated background.
    pub fn start(mut background: Background<P>, signal: &ThemeSignal) -> Option<Self> {
        if !background.init() {
            return None;
        }
        let subscription = signal.subscribe();
        background.set_theme(&subscription.current);
        tracing::debug!(theme = %subscription.current, "observing theme signal");
        Some(Self {
            background,
            signal: signal.clone(),
            subscription: Some(subscription),
        })
    }

    /// Forwards every change observed since the last pump. Returns the number
    /// of changes applied.
    pub fn pump(&mut self) -> usize {
        let Some(subscription) = &self.subscription else {
            return 0;
        };
        let mut applied = 0;
        for value in subscription.changes.try_iter() {
            self.background.set_theme(&value);
            applied += 1;
        }
        applied
    }

    pub fn is_observing(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn background(&self) -> &Background<P> {
        &self.background
    }

    pub fn background_mut(&mut self) -> &mut Background<P> {
        &mut self.background
    }

    /// Stops observing and destroys the renderer. Further calls do nothing.
    pub fn teardown(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        self.signal.unsubscribe(subscription.id);
        self.background.destroy();
        tracing::debug!("host bridge torn down");
    }
}

impl<P: Platform> Drop for HostBridge<P> {
    fn drop(&mut self) {
        self.teardown();
    }
}
