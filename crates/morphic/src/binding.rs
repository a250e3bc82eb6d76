//! Binding props to a store cursor.
//!
//! Renderers receive their props together with a cursor in a [`Bound`]
//! value: `props` is whatever the caller supplies and `binding` is the
//! cursor the component reads from and dispatches to.

use morphic_core::{Canonical, Comparable, Props, StoreCursor, StoreHandle};
use std::borrow::Cow;

/// Prop key under which the cursor is compared.
pub const BINDING_KEY: &str = "binding";

/// Props paired with the cursor a component is bound to.
#[derive(Debug, Clone)]
pub struct Bound<P, C> {
    /// Caller supplied props
    pub props: P,
    /// Cursor over the bound state
    pub binding: C,
}

impl<P, C> Bound<P, C> {
    /// Pair props with a cursor.
    pub const fn new(props: P, binding: C) -> Self {
        Self { props, binding }
    }

    /// Replace the cursor, keeping the props.
    pub fn rebind<C2>(self, binding: C2) -> Bound<P, C2> {
        Bound {
            props: self.props,
            binding,
        }
    }
}

impl<P: Props, C: Comparable> Props for Bound<P, C> {
    fn entries(&self) -> Vec<(Cow<'_, str>, Canonical)> {
        let mut entries = self.props.entries();
        entries.push((Cow::Borrowed(BINDING_KEY), self.binding.canonical()));
        entries
    }
}

/// Bind props to a cursor over the store's current state.
pub fn bind_to_store<P, S, A>(store: &StoreHandle<S, A>, props: P) -> Bound<P, StoreCursor<S, A>> {
    Bound::new(props, store.cursor())
}
