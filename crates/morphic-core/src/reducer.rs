//! Reducers and reducer builders.
//!
//! A reducer is a pure function `(state, action) -> next state`. Plain
//! closures are reducers; a [`Builder`] additionally carries the empty state
//! used before any action has been applied and composes extra action handlers,
//! including the reserved [`Action::Replace`].
//!
//! # Examples
//!
//! ```
//! use morphic_core::{builder, Action};
//!
//! let counter = builder(0_i32, |count: &i32, delta: i32| count + delta);
//! assert_eq!(counter.reduce_from(None, 5), 5);
//!
//! let replaceable = counter.replaceable();
//! assert_eq!(replaceable.reduce_from(Some(&5), Action::Apply(1)), 6);
//! assert_eq!(replaceable.reduce_from(Some(&5), Action::Replace(40)), 40);
//! ```

use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A pure state transition function.
pub trait Reducer<S, A>: Send + Sync {
    /// Compute the next state from the current state and an action.
    fn reduce(&self, state: &S, action: A) -> S;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, A) -> S + Send + Sync,
{
    fn reduce(&self, state: &S, action: A) -> S {
        self(state, action)
    }
}

/// Normalize anything that supplies a reducer into a shared plain reducer.
pub fn get_reducer<S, A, R>(reducer: R) -> Arc<dyn Reducer<S, A>>
where
    R: Reducer<S, A> + 'static,
{
    Arc::new(reducer)
}

/// An action that either replaces the whole state or is applied to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action<S, A> {
    /// Substitute the entire state with the payload
    Replace(S),
    /// Apply an ordinary action
    Apply(A),
}

impl<S, A> Action<S, A> {
    /// Create a replace action.
    pub const fn replace(state: S) -> Self {
        Self::Replace(state)
    }

    /// Create an ordinary action.
    pub const fn apply(action: A) -> Self {
        Self::Apply(action)
    }

    /// Check if this is the reserved replace action.
    #[must_use]
    pub const fn is_replace(&self) -> bool {
        matches!(self, Self::Replace(_))
    }
}

/// A reducer paired with the state it starts from.
pub struct Builder<S, A> {
    empty: S,
    reduce: Arc<dyn Reducer<S, A>>,
}

/// Create a builder from an empty state and a reducer.
pub fn builder<S, A, R>(empty: S, reducer: R) -> Builder<S, A>
where
    R: Reducer<S, A> + 'static,
{
    Builder::new(empty, reducer)
}

impl<S, A> Builder<S, A> {
    /// Create a builder from an empty state and a reducer.
    pub fn new<R>(empty: S, reducer: R) -> Self
    where
        R: Reducer<S, A> + 'static,
    {
        Self {
            empty,
            reduce: get_reducer(reducer),
        }
    }

    /// The state used when no state exists yet.
    pub const fn empty(&self) -> &S {
        &self.empty
    }

    /// Reduce, substituting the empty state when `state` is `None`.
    pub fn reduce_from(&self, state: Option<&S>, action: A) -> S {
        self.reduce.reduce(state.unwrap_or(&self.empty), action)
    }

    /// Shared plain reducer for this builder.
    pub fn reducer(&self) -> Arc<dyn Reducer<S, A>> {
        Arc::clone(&self.reduce)
    }
}

impl<S, A> Builder<S, A>
where
    S: 'static,
    A: 'static,
{
    /// Compose a handler that runs before the existing reducer.
    ///
    /// When the handler returns `Some`, that is the next state and the
    /// existing reducer is skipped.
    pub fn action<H>(self, handler: H) -> Self
    where
        H: Fn(&S, &A) -> Option<S> + Send + Sync + 'static,
    {
        let inner = self.reduce;
        Self {
            empty: self.empty,
            reduce: Arc::new(move |state: &S, action: A| -> S {
                match handler(state, &action) {
                    Some(next) => next,
                    None => inner.reduce(state, action),
                }
            }),
        }
    }

    /// Compose the reserved replace action.
    ///
    /// `Action::Replace(v)` yields `v` verbatim; `Action::Apply(a)` is handed
    /// to the existing reducer.
    pub fn replaceable(self) -> Builder<S, Action<S, A>> {
        let inner = self.reduce;
        Builder {
            empty: self.empty,
            reduce: Arc::new(move |state: &S, action: Action<S, A>| -> S {
                match action {
                    Action::Replace(next) => {
                        trace!("replacing whole state");
                        next
                    }
                    Action::Apply(action) => inner.reduce(state, action),
                }
            }),
        }
    }
}

impl<S: Clone, A> Clone for Builder<S, A> {
    fn clone(&self) -> Self {
        Self {
            empty: self.empty.clone(),
            reduce: Arc::clone(&self.reduce),
        }
    }
}

impl<S: Send + Sync, A> Reducer<S, A> for Builder<S, A> {
    fn reduce(&self, state: &S, action: A) -> S {
        self.reduce.reduce(state, action)
    }
}

impl<S: fmt::Debug, A> fmt::Debug for Builder<S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("empty", &self.empty)
            .finish_non_exhaustive()
    }
}
