//! Morphic: polymorphic component state and render suppression.
//!
//! Components read their state through a [`Cursor`] and render an
//! [`Element`] tree. This crate adds two things on top of the core
//! abstractions:
//!
//! - [`optimize`] wraps a pure render function so it only re-runs when a
//!   non-ignored prop changed.
//! - [`polymorph`] defines a family of state variants sharing a base state.
//!   Each variant brings its own reducer and renderer, and [`render`]
//!   dispatches to the renderer of whichever variant the state currently is.
//!
//! # Examples
//!
//! ```
//! use morphic::{
//!     bind_to_store, builder, optimize, polymorph, render, Action, Bound, Cursor, Element,
//!     PolyAction, Polymorph, Store, StoreCursor, StoreHandle,
//! };
//!
//! type Props = Bound<(), StoreCursor<Polymorph<u32, ()>, PolyAction<u32, ()>>>;
//!
//! let def = polymorph(builder(0_u32, |n: &u32, _: ()| *n));
//! let number = def.derive::<u32, (), _, _>(
//!     |n: &u32, (): ()| n + 1,
//!     |props| Element::text(props.binding.state().to_string()),
//! );
//!
//! let store = StoreHandle::new(Store::from_builder(def.reduce()));
//! store.dispatch(Action::Replace(number.create(41)));
//! store.dispatch(Action::Apply(().into()));
//!
//! let mut view = optimize(|props: &Props| render(props), &[]);
//! let tree = view.mount(bind_to_store(&store, ())).clone().unwrap();
//! assert_eq!(tree.text_content(), "42");
//! ```

mod binding;
mod error;
mod optimize;
mod polymorph;

pub use morphic_core::*;

pub use binding::{bind_to_store, Bound, BINDING_KEY};
pub use error::{ConfigError, PolymorphError};
pub use optimize::{optimize, OptimizeOptions, Optimized, Update};
pub use polymorph::{
    polymorph, render, Definition, DescriptorId, Factory, PolyAction, PolyCursor, Polymorph,
    Variant, VariantAction, VariantCursor,
};
