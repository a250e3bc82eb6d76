//! Core abstractions for Morphic.
//!
//! This crate provides the pieces the polymorphic state registry and the
//! render optimizer are built on:
//! - Prop comparison: [`Comparable`], [`Canonical`], [`Props`], [`shallow_equal`]
//! - State transitions: [`Reducer`], [`Builder`], [`Action`]
//! - State access: [`Cursor`], [`Store`], [`StoreHandle`], [`StoreCursor`]
//! - Render output: [`Element`]

mod comparable;
mod cursor;
mod element;
mod reducer;
mod store;

pub use comparable::{shallow_equal, Canonical, Comparable, IgnoreSet, PropMap, Props, Shared};
pub use cursor::Cursor;
pub use element::{Element, TEXT_TAG};
pub use reducer::{builder, get_reducer, Action, Builder, Reducer};
pub use store::{Store, StoreCursor, StoreHandle};
