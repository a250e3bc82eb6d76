//! Polymorphic component state.
//!
//! A [`Definition`] describes a family of state variants that share a common
//! base state `S` and action type `A`. Each call to [`Definition::derive`]
//! registers one variant, pairing a reducer with a renderer, and returns a
//! [`Factory`] that builds tagged [`Polymorph`] values for that variant.
//!
//! # Tagging
//!
//! A [`Polymorph`] carries its variant's payload next to a descriptor minted
//! by `derive`. Variant membership is decided by descriptor identity only, so
//! two variants with structurally identical payload types never alias.
//! Reducing a polymorph keeps its descriptor; the reserved
//! [`Action::Replace`] is the only way to move a state to another variant.
//!
//! # Actions
//!
//! A variant may declare its own action type `DA` as long as base actions
//! convert into it (`DA: From<A>`). Polymorph actions carry either a base
//! action, which every variant accepts, or a boxed variant action addressed
//! to one descriptor. A variant action reaching a state of another variant
//! leaves that state unchanged.
//!
//! # Examples
//!
//! ```
//! use morphic::{builder, polymorph, render, Bound, Cursor, Element, Store, StoreHandle, Action};
//!
//! #[derive(Clone, Default)]
//! struct Field {
//!     label: String,
//! }
//!
//! let def = polymorph(builder(Field::default(), |f: &Field, _: ()| f.clone()));
//! let plain = def.derive::<Field, (), _, _>(
//!     |f: &Field, _: ()| f.clone(),
//!     |props| Element::new("label").child(Element::text(&props.binding.state().label)),
//! );
//!
//! let handle = StoreHandle::new(Store::from_builder(def.reduce()));
//! handle.dispatch(Action::Replace(plain.create(Field { label: "Name".into() })));
//!
//! let cursor = handle.cursor();
//! assert!(plain.is_cursor(&cursor));
//! let tree = render(&Bound::new((), cursor)).unwrap();
//! assert_eq!(tree.text_content(), "Name");
//! ```

use crate::binding::Bound;
use crate::error::PolymorphError;
use morphic_core::{get_reducer, Action, Builder, Canonical, Comparable, Cursor, Element, Reducer};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// Actions accepted by a polymorphic state.
pub type PolyAction<S, A, P = ()> = Action<Polymorph<S, A, P>, VariantAction<A>>;

/// Cursor over a polymorphic state.
pub type PolyCursor<'a, S, A, P = ()> =
    dyn Cursor<State = Polymorph<S, A, P>, Action = PolyAction<S, A, P>> + 'a;

/// A variant's own state, exposing the base state it extends.
///
/// Every type is a variant of itself, so variants that add no fields of
/// their own can use the base state type directly.
pub trait Variant<S>: Send + Sync + 'static {
    /// The shared base portion of this state.
    fn base(&self) -> &S;
}

impl<S: Send + Sync + 'static> Variant<S> for S {
    fn base(&self) -> &S {
        self
    }
}

/// Type-erased variant payload.
trait Erased<S>: Send + Sync {
    fn base(&self) -> &S;
    fn as_any(&self) -> &dyn Any;
}

impl<S, D: Variant<S>> Erased<S> for D {
    fn base(&self) -> &S {
        Variant::base(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

static NEXT_DESCRIPTOR: AtomicU64 = AtomicU64::new(1);

/// Identifier of a variant descriptor, for diagnostics.
///
/// Membership checks compare descriptors by identity, never by this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(u64);

impl DescriptorId {
    fn next() -> Self {
        Self(NEXT_DESCRIPTOR.fetch_add(1, Ordering::Relaxed))
    }

    /// Numeric value of this id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "descriptor#{}", self.0)
    }
}

/// An action applied to a polymorphic state.
pub enum VariantAction<A> {
    /// A base action, converted into whichever variant's action type
    Base(A),
    /// A variant's own action, applied only to states of `target`
    Variant {
        target: DescriptorId,
        action: Box<dyn Any + Send>,
    },
}

impl<A> VariantAction<A> {
    /// Address `action` to the variant with descriptor `target`.
    pub fn variant<DA: Send + 'static>(target: DescriptorId, action: DA) -> Self {
        Self::Variant {
            target,
            action: Box::new(action),
        }
    }

    /// Check if this is a base action.
    #[must_use]
    pub const fn is_base(&self) -> bool {
        matches!(self, Self::Base(_))
    }
}

impl<A> From<A> for VariantAction<A> {
    fn from(action: A) -> Self {
        Self::Base(action)
    }
}

impl<A: fmt::Debug> fmt::Debug for VariantAction<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base(action) => f.debug_tuple("Base").field(action).finish(),
            Self::Variant { target, .. } => f
                .debug_struct("Variant")
                .field("target", target)
                .finish_non_exhaustive(),
        }
    }
}

/// Reduce and render entry points of one registered variant.
trait VariantOps<S, A, P>: Send + Sync {
    fn reduce(&self, state: &dyn Erased<S>, action: VariantAction<A>)
        -> Option<Arc<dyn Erased<S>>>;
    fn render(&self, props: &P, cursor: &PolyCursor<'_, S, A, P>) -> Option<Element>;
}

struct Ops<D, DA, F> {
    reducer: Arc<dyn Reducer<D, DA>>,
    renderer: F,
}

impl<S, A, P, D, DA, F> VariantOps<S, A, P> for Ops<D, DA, F>
where
    S: 'static,
    A: 'static,
    P: 'static,
    D: Variant<S>,
    DA: From<A> + Send + 'static,
    F: for<'a> Fn(Bound<&'a P, VariantCursor<'a, S, A, P, D, DA>>) -> Element + Send + Sync,
{
    fn reduce(
        &self,
        state: &dyn Erased<S>,
        action: VariantAction<A>,
    ) -> Option<Arc<dyn Erased<S>>> {
        let state = state.as_any().downcast_ref::<D>()?;
        let action = match action {
            VariantAction::Base(action) => DA::from(action),
            VariantAction::Variant { action, .. } => *action.downcast::<DA>().ok()?,
        };
        let next: Arc<dyn Erased<S>> = Arc::new(self.reducer.reduce(state, action));
        Some(next)
    }

    fn render(&self, props: &P, cursor: &PolyCursor<'_, S, A, P>) -> Option<Element> {
        let state = cursor.state().payload().as_any().downcast_ref::<D>()?;
        let binding = VariantCursor {
            inner: cursor,
            state,
            action: PhantomData,
        };
        Some((self.renderer)(Bound::new(props, binding)))
    }
}

struct Descriptor<S, A, P> {
    id: DescriptorId,
    name: Option<String>,
    // None marks the stub carried by `Definition::empty`
    ops: Option<Box<dyn VariantOps<S, A, P>>>,
}

impl<S, A, P> Descriptor<S, A, P> {
    fn label(&self) -> &str {
        match (&self.name, &self.ops) {
            (Some(name), _) => name.as_str(),
            (None, None) => "<empty>",
            (None, Some(_)) => "<anonymous>",
        }
    }
}

/// A tagged polymorphic state value.
///
/// Cloning is cheap: the descriptor and the payload are shared.
pub struct Polymorph<S, A, P = ()> {
    descriptor: Arc<Descriptor<S, A, P>>,
    state: Arc<dyn Erased<S>>,
}

impl<S, A, P> Polymorph<S, A, P> {
    /// Id of the descriptor this state is tagged with.
    #[must_use]
    pub fn descriptor(&self) -> DescriptorId {
        self.descriptor.id
    }

    /// Name given to the variant at registration, if any.
    #[must_use]
    pub fn variant_name(&self) -> Option<&str> {
        self.descriptor.name.as_deref()
    }

    /// The base state shared by all variants.
    #[must_use]
    pub fn base(&self) -> &S {
        self.payload().base()
    }

    /// Check if this is still the empty state of its definition.
    #[must_use]
    pub fn is_stub(&self) -> bool {
        self.descriptor.ops.is_none()
    }

    /// Check if both states carry the same descriptor.
    #[must_use]
    pub fn same_variant(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.descriptor, &other.descriptor)
    }

    /// Check if both values are the same tagged state (same descriptor and
    /// the same payload allocation).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.same_variant(other) && self.canonical() == other.canonical()
    }

    fn payload(&self) -> &dyn Erased<S> {
        &*self.state
    }

    /// Apply an ordinary action, keeping this state's descriptor.
    fn reduced(&self, action: VariantAction<A>) -> Self {
        let Some(ops) = &self.descriptor.ops else {
            return self.clone();
        };
        if let VariantAction::Variant { target, .. } = &action {
            if *target != self.descriptor.id {
                trace!(
                    descriptor = %self.descriptor.id,
                    target = %target,
                    "ignored action for another variant"
                );
                return self.clone();
            }
        }
        match ops.reduce(self.payload(), action) {
            Some(state) => {
                trace!(descriptor = %self.descriptor.id, "reduced polymorph");
                Self {
                    descriptor: Arc::clone(&self.descriptor),
                    state,
                }
            }
            None => self.clone(),
        }
    }
}

impl<S, A, P> Clone for Polymorph<S, A, P> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            state: Arc::clone(&self.state),
        }
    }
}

/// Polymorphs compare by the identity of their payload.
impl<S, A, P> Comparable for Polymorph<S, A, P> {
    fn canonical(&self) -> Canonical {
        Canonical::shared(&self.state)
    }
}

impl<S: fmt::Debug, A, P> fmt::Debug for Polymorph<S, A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Polymorph")
            .field("descriptor", &self.descriptor.id)
            .field("variant", &self.descriptor.label())
            .field("base", self.base())
            .finish()
    }
}

/// Cursor narrowed to one variant's state.
///
/// Reads the variant payload directly. Variant actions of type `DA` are
/// forwarded to the polymorphic cursor as [`Action::Apply`], addressed to
/// this variant.
pub struct VariantCursor<'a, S, A, P, D, DA = A> {
    inner: &'a PolyCursor<'a, S, A, P>,
    state: &'a D,
    action: PhantomData<fn(DA)>,
}

impl<'a, S, A, P, D, DA> VariantCursor<'a, S, A, P, D, DA> {
    /// The polymorphic cursor this one was narrowed from.
    #[must_use]
    pub fn polymorphic(&self) -> &'a PolyCursor<'a, S, A, P> {
        self.inner
    }

    /// The tagged state behind this cursor.
    #[must_use]
    pub fn tagged(&self) -> &'a Polymorph<S, A, P> {
        self.inner.state()
    }

    /// Switch the underlying state to another variant.
    pub fn replace(&self, next: Polymorph<S, A, P>) {
        self.inner.dispatch(Action::Replace(next));
    }

    /// Dispatch a base action.
    pub fn dispatch_base(&self, action: A) {
        self.inner.dispatch(Action::Apply(VariantAction::Base(action)));
    }

    /// The base state shared by all variants.
    #[must_use]
    pub fn base(&self) -> &'a S
    where
        D: Variant<S>,
    {
        Variant::base(self.state)
    }
}

impl<S, A, P, D, DA: Send + 'static> Cursor for VariantCursor<'_, S, A, P, D, DA> {
    type State = D;
    type Action = DA;

    fn state(&self) -> &D {
        self.state
    }

    fn dispatch(&self, action: DA) {
        let target = self.tagged().descriptor();
        self.inner
            .dispatch(Action::Apply(VariantAction::variant(target, action)));
    }
}

impl<S, A, P, D, DA> Comparable for VariantCursor<'_, S, A, P, D, DA> {
    fn canonical(&self) -> Canonical {
        self.inner.state().canonical()
    }
}

impl<S, A, P, D, DA> Clone for VariantCursor<'_, S, A, P, D, DA> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, A, P, D, DA> Copy for VariantCursor<'_, S, A, P, D, DA> {}

impl<S, A, P, D: fmt::Debug, DA> fmt::Debug for VariantCursor<'_, S, A, P, D, DA> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantCursor")
            .field("descriptor", &self.tagged().descriptor())
            .field("state", self.state)
            .finish()
    }
}

/// Constructor and type guards for one registered variant.
pub struct Factory<S, A, P, D, DA = A> {
    descriptor: Arc<Descriptor<S, A, P>>,
    variant: PhantomData<fn() -> (D, DA)>,
}

impl<S, A, P, D: Variant<S>, DA> Factory<S, A, P, D, DA> {
    /// Build a freshly tagged state for this variant.
    pub fn create(&self, init: D) -> Polymorph<S, A, P> {
        Polymorph {
            descriptor: Arc::clone(&self.descriptor),
            state: Arc::new(init),
        }
    }

    /// Check if `state` was produced by this variant.
    #[must_use]
    pub fn is_instance(&self, state: &Polymorph<S, A, P>) -> bool {
        Arc::ptr_eq(&state.descriptor, &self.descriptor)
    }

    /// Check if the state behind `cursor` was produced by this variant.
    #[must_use]
    pub fn is_cursor<C>(&self, cursor: &C) -> bool
    where
        C: Cursor<State = Polymorph<S, A, P>> + ?Sized,
    {
        self.is_instance(cursor.state())
    }

    /// This variant's payload, if `state` belongs to it.
    #[must_use]
    pub fn narrow<'s>(&self, state: &'s Polymorph<S, A, P>) -> Option<&'s D> {
        if self.is_instance(state) {
            state.payload().as_any().downcast_ref::<D>()
        } else {
            None
        }
    }

    /// Like [`narrow`](Self::narrow), reporting which variant was found.
    pub fn try_narrow<'s>(&self, state: &'s Polymorph<S, A, P>) -> Result<&'s D, PolymorphError> {
        self.narrow(state).ok_or(PolymorphError::VariantMismatch {
            expected: self.descriptor.id,
            found: state.descriptor.id,
        })
    }

    /// A variant-typed cursor, if the state behind `cursor` belongs to this
    /// variant.
    #[must_use]
    pub fn narrow_cursor<'a>(
        &self,
        cursor: &'a PolyCursor<'a, S, A, P>,
    ) -> Option<VariantCursor<'a, S, A, P, D, DA>> {
        let state = self.narrow(cursor.state())?;
        Some(VariantCursor {
            inner: cursor,
            state,
            action: PhantomData,
        })
    }
}

impl<S, A, P, D, DA: Send + 'static> Factory<S, A, P, D, DA> {
    /// Wrap one of this variant's own actions for dispatch to a polymorphic
    /// cursor or store.
    pub fn action(&self, action: DA) -> PolyAction<S, A, P> {
        Action::Apply(VariantAction::variant(self.descriptor.id, action))
    }
}

impl<S, A, P, D, DA> Factory<S, A, P, D, DA> {
    /// Id of this variant's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> DescriptorId {
        self.descriptor.id
    }

    /// Name given at registration, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.descriptor.name.as_deref()
    }
}

impl<S, A, P, D, DA> Clone for Factory<S, A, P, D, DA> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            variant: PhantomData,
        }
    }
}

impl<S, A, P, D, DA> fmt::Debug for Factory<S, A, P, D, DA> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("descriptor", &self.descriptor.id)
            .field("variant", &self.descriptor.label())
            .finish()
    }
}

/// A family of polymorphic variants sharing base state `S` and actions `A`.
///
/// `P` is the type of the extra props every variant renderer receives.
pub struct Definition<S, A, P = ()> {
    base: Builder<S, A>,
    empty: Polymorph<S, A, P>,
    reduce: Builder<Polymorph<S, A, P>, PolyAction<S, A, P>>,
}

/// Define a polymorphic state family from its base reducer.
///
/// The base builder supplies the empty state. Variant reducers handle the
/// base actions themselves, typically by delegating to
/// [`Definition::base`].
pub fn polymorph<S, A>(base: Builder<S, A>) -> Definition<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: 'static,
{
    Definition::with_base(base)
}

impl<S, A, P> Definition<S, A, P>
where
    S: Clone + Send + Sync + 'static,
    A: 'static,
    P: 'static,
{
    fn with_base(base: Builder<S, A>) -> Self {
        let stub = Arc::new(Descriptor {
            id: DescriptorId::next(),
            name: None,
            ops: None,
        });
        let empty = Polymorph {
            descriptor: stub,
            state: Arc::new(base.empty().clone()),
        };
        let reduce = Builder::new(
            empty.clone(),
            |state: &Polymorph<S, A, P>, action: VariantAction<A>| state.reduced(action),
        )
        .replaceable()
        .action(|state: &Polymorph<S, A, P>, action: &PolyAction<S, A, P>| {
            if let Action::Replace(next) = action {
                debug!(
                    from = %state.descriptor.id,
                    to = %next.descriptor.id,
                    variant = next.descriptor.label(),
                    "replaced polymorph variant"
                );
            }
            None
        });
        Self { base, empty, reduce }
    }

    /// The empty state, tagged with this definition's stub descriptor.
    #[must_use]
    pub const fn empty(&self) -> &Polymorph<S, A, P> {
        &self.empty
    }

    /// Check if `state` still carries this definition's stub descriptor.
    #[must_use]
    pub fn is_empty(&self, state: &Polymorph<S, A, P>) -> bool {
        self.empty.same_variant(state)
    }

    /// The base builder this definition was created from.
    #[must_use]
    pub const fn base(&self) -> &Builder<S, A> {
        &self.base
    }

    /// Reducer builder over tagged states, including the replace action.
    #[must_use]
    pub const fn reduce(&self) -> &Builder<Polymorph<S, A, P>, PolyAction<S, A, P>> {
        &self.reduce
    }

    /// Plain reducer over tagged states.
    #[must_use]
    pub fn reducer(&self) -> Arc<dyn Reducer<Polymorph<S, A, P>, PolyAction<S, A, P>>> {
        self.reduce.reducer()
    }

    /// Reduce `state` (or the empty state when `None`) by `action`.
    pub fn apply(
        &self,
        state: Option<&Polymorph<S, A, P>>,
        action: PolyAction<S, A, P>,
    ) -> Polymorph<S, A, P> {
        self.reduce.reduce_from(state, action)
    }

    /// Register a variant with its reducer and renderer.
    ///
    /// The reducer takes the variant's own action type `DA`; base actions
    /// reach it through `DA::from`.
    pub fn derive<D, DA, R, F>(&self, reducer: R, renderer: F) -> Factory<S, A, P, D, DA>
    where
        D: Variant<S>,
        DA: From<A> + Send + 'static,
        R: Reducer<D, DA> + 'static,
        F: for<'a> Fn(Bound<&'a P, VariantCursor<'a, S, A, P, D, DA>>) -> Element
            + Send
            + Sync
            + 'static,
    {
        self.register(None, reducer, renderer)
    }

    /// Register a variant under a name used in diagnostics.
    pub fn derive_named<D, DA, R, F>(
        &self,
        name: impl Into<String>,
        reducer: R,
        renderer: F,
    ) -> Factory<S, A, P, D, DA>
    where
        D: Variant<S>,
        DA: From<A> + Send + 'static,
        R: Reducer<D, DA> + 'static,
        F: for<'a> Fn(Bound<&'a P, VariantCursor<'a, S, A, P, D, DA>>) -> Element
            + Send
            + Sync
            + 'static,
    {
        self.register(Some(name.into()), reducer, renderer)
    }

    fn register<D, DA, R, F>(
        &self,
        name: Option<String>,
        reducer: R,
        renderer: F,
    ) -> Factory<S, A, P, D, DA>
    where
        D: Variant<S>,
        DA: From<A> + Send + 'static,
        R: Reducer<D, DA> + 'static,
        F: for<'a> Fn(Bound<&'a P, VariantCursor<'a, S, A, P, D, DA>>) -> Element
            + Send
            + Sync
            + 'static,
    {
        let ops: Box<dyn VariantOps<S, A, P>> = Box::new(Ops {
            reducer: get_reducer(reducer),
            renderer,
        });
        let descriptor = Arc::new(Descriptor {
            id: DescriptorId::next(),
            name,
            ops: Some(ops),
        });
        debug!(
            descriptor = %descriptor.id,
            variant = descriptor.label(),
            "derived polymorph variant"
        );
        Factory {
            descriptor,
            variant: PhantomData,
        }
    }

    /// The same definition with renderers taking props of type `P2`.
    ///
    /// The result has its own empty state and accepts its own variants.
    #[must_use]
    pub fn props<P2: 'static>(&self) -> Definition<S, A, P2> {
        Definition::with_base(self.base.clone())
    }
}

impl<S: fmt::Debug, A, P> fmt::Debug for Definition<S, A, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("empty", &self.empty)
            .finish_non_exhaustive()
    }
}

/// Render a polymorphic state with the renderer of its variant.
///
/// The renderer receives the same props with the cursor narrowed to the
/// variant's state type.
pub fn render<S, A, P, C>(props: &Bound<P, C>) -> Result<Element, PolymorphError>
where
    C: Cursor<State = Polymorph<S, A, P>, Action = PolyAction<S, A, P>>,
{
    let descriptor = &props.binding.state().descriptor;
    let Some(ops) = &descriptor.ops else {
        return Err(PolymorphError::StubRender {
            descriptor: descriptor.id,
        });
    };
    trace!(descriptor = %descriptor.id, variant = descriptor.label(), "rendering polymorph");
    ops.render(&props.props, &props.binding)
        .ok_or(PolymorphError::PayloadType {
            descriptor: descriptor.id,
        })
}
