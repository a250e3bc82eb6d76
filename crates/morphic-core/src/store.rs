//! Immutable state store with cursors.
//!
//! The store owns the current state snapshot and the reducer that produces
//! the next one. Every dispatch replaces the snapshot with a new `Arc`, so a
//! [`StoreCursor`] taken before the dispatch keeps observing the old state and
//! compares unequal to a cursor taken afterwards.
//!
//! # Examples
//!
//! ```
//! use morphic_core::{builder, Cursor, Store, StoreHandle};
//!
//! let counter = builder(0_i32, |count: &i32, delta: i32| count + delta);
//! let handle = StoreHandle::new(Store::from_builder(&counter));
//!
//! let cursor = handle.cursor();
//! cursor.dispatch(2);
//! assert_eq!(*cursor.state(), 0);
//! assert_eq!(*handle.cursor().state(), 2);
//! ```

use crate::comparable::{Canonical, Comparable};
use crate::cursor::Cursor;
use crate::reducer::{Builder, Reducer};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::trace;

/// Current state snapshot and the reducer that replaces it.
pub struct Store<S, A> {
    state: Arc<S>,
    reducer: Arc<dyn Reducer<S, A>>,
}

impl<S, A> Store<S, A> {
    /// Create a store with an initial state.
    pub fn new<R>(initial: S, reducer: R) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        Self {
            state: Arc::new(initial),
            reducer: Arc::new(reducer),
        }
    }

    /// Create a store starting from a builder's empty state.
    pub fn from_builder(builder: &Builder<S, A>) -> Self
    where
        S: Clone,
    {
        Self {
            state: Arc::new(builder.empty().clone()),
            reducer: builder.reducer(),
        }
    }

    /// Current state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<S> {
        Arc::clone(&self.state)
    }

    /// Reduce the current state by `action`, replacing the snapshot.
    pub fn dispatch(&mut self, action: A) {
        self.state = Arc::new(self.reducer.reduce(&self.state, action));
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

type Listener<S, A> = Arc<dyn Fn(&StoreCursor<S, A>) + Send + Sync>;

/// Shared handle to a store, the source of cursors.
///
/// Listeners run after the store lock is released, so they may read from or
/// dispatch to the handle.
pub struct StoreHandle<S, A> {
    store: Arc<RwLock<Store<S, A>>>,
    listeners: Arc<RwLock<Vec<Listener<S, A>>>>,
}

impl<S, A> StoreHandle<S, A> {
    /// Wrap a store in a shared handle.
    pub fn new(store: Store<S, A>) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            listeners: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> Arc<S> {
        self.store.read().expect("store lock poisoned").snapshot()
    }

    /// Cursor over the current state snapshot.
    pub fn cursor(&self) -> StoreCursor<S, A> {
        StoreCursor {
            state: self.state(),
            store: self.clone(),
        }
    }

    /// Dispatch an action and return a cursor over the resulting state.
    pub fn dispatch(&self, action: A) -> StoreCursor<S, A> {
        let state = {
            let mut store = self.store.write().expect("store lock poisoned");
            store.dispatch(action);
            store.snapshot()
        };
        let cursor = StoreCursor {
            state,
            store: self.clone(),
        };
        self.notify(&cursor);
        cursor
    }

    /// Call `listener` with a cursor over every new snapshot.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&StoreCursor<S, A>) + Send + Sync + 'static,
    {
        self.listeners
            .write()
            .expect("listener lock poisoned")
            .push(Arc::new(listener));
    }

    fn notify(&self, cursor: &StoreCursor<S, A>) {
        let listeners = self.listeners.read().expect("listener lock poisoned").clone();
        trace!(listeners = listeners.len(), "store dispatch");
        for listener in &listeners {
            listener(cursor);
        }
    }
}

impl<S, A> Clone for StoreHandle<S, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<S, A> fmt::Debug for StoreHandle<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreHandle").finish_non_exhaustive()
    }
}

/// Cursor over one snapshot of a store.
pub struct StoreCursor<S, A> {
    state: Arc<S>,
    store: StoreHandle<S, A>,
}

impl<S, A> StoreCursor<S, A> {
    /// The snapshot this cursor reads.
    pub fn snapshot(&self) -> &Arc<S> {
        &self.state
    }

    /// The handle dispatches are sent to.
    pub const fn store(&self) -> &StoreHandle<S, A> {
        &self.store
    }
}

impl<S, A> Cursor for StoreCursor<S, A> {
    type State = S;
    type Action = A;

    fn state(&self) -> &S {
        &self.state
    }

    fn dispatch(&self, action: A) {
        self.store.dispatch(action);
    }
}

/// Cursors compare by the identity of the snapshot they read.
impl<S, A> Comparable for StoreCursor<S, A> {
    fn canonical(&self) -> Canonical {
        Canonical::shared(&self.state)
    }
}

impl<S, A> Clone for StoreCursor<S, A> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            store: self.store.clone(),
        }
    }
}

impl<S: fmt::Debug, A> fmt::Debug for StoreCursor<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreCursor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
