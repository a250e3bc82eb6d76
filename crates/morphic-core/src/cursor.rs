//! Cursor abstraction over an immutable state.
//!
//! A cursor pairs a read-only snapshot of some state with a way to dispatch
//! actions against whatever owns that state. Renderers receive cursors and
//! never construct them; dispatching does not mutate the snapshot held by the
//! cursor, the owner produces a new state (and a new cursor) instead.

/// Read the current state and dispatch actions against it.
pub trait Cursor {
    /// State visible through this cursor.
    type State;
    /// Actions accepted by this cursor.
    type Action;

    /// The state snapshot this cursor was created over.
    fn state(&self) -> &Self::State;

    /// Dispatch an action to the owner of the state.
    fn dispatch(&self, action: Self::Action);
}

impl<C: Cursor + ?Sized> Cursor for &C {
    type State = C::State;
    type Action = C::Action;

    fn state(&self) -> &Self::State {
        (**self).state()
    }

    fn dispatch(&self, action: Self::Action) {
        (**self).dispatch(action);
    }
}
