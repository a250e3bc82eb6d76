//! Canonical comparison payloads for props.
//!
//! Shallow prop comparison never looks at a prop value directly. Each value
//! exposes a [`Canonical`] payload through the [`Comparable`] trait and two
//! values are considered unchanged when their payloads are strictly equal.
//!
//! Plain values (numbers, strings, booleans) compare by value, including when
//! wrapped in an `Arc`. Payloads without a value of their own (store snapshots
//! behind cursors, anything wrapped in [`Shared`]) compare by identity, so two
//! distinct cursor handles over the same state snapshot are equal while two
//! structurally identical snapshots are not.
//!
//! # Examples
//!
//! ```
//! use morphic_core::{shallow_equal, IgnoreSet, PropMap};
//!
//! let old = PropMap::new().with("label", "Name").with("width", 200);
//! let new = PropMap::new().with("label", "Name").with("width", 200);
//! assert!(shallow_equal(&old, &new, &IgnoreSet::new()));
//! ```

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Set of prop keys excluded from comparison.
pub type IgnoreSet = BTreeSet<String>;

/// The comparable payload of a single prop value.
///
/// Equality is strict: `Float(f64::NAN)` is not equal to itself.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Canonical {
    /// The prop is absent (or explicitly empty).
    #[default]
    Absent,
    /// Boolean value
    Bool(bool),
    /// Any integer value
    Int(i128),
    /// Any floating point value
    Float(f64),
    /// String value
    Str(Arc<str>),
    /// Address of an immutable shared payload
    Shared(usize),
}

impl Canonical {
    /// Identity payload of a shared allocation.
    #[must_use]
    pub fn shared<T: ?Sized>(value: &Arc<T>) -> Self {
        Self::Shared(Arc::as_ptr(value).cast::<()>() as usize)
    }

    /// Check if this is the absence sentinel.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl fmt::Display for Canonical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "<absent>"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Shared(addr) => write!(f, "<shared {addr:#x}>"),
        }
    }
}

/// A value that can expose a canonical comparable payload.
pub trait Comparable {
    /// Payload used for shallow prop comparison.
    fn canonical(&self) -> Canonical;
}

impl Comparable for Canonical {
    fn canonical(&self) -> Canonical {
        self.clone()
    }
}

impl Comparable for bool {
    fn canonical(&self) -> Canonical {
        Canonical::Bool(*self)
    }
}

macro_rules! int_comparable {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Comparable for $ty {
                fn canonical(&self) -> Canonical {
                    Canonical::Int(*self as i128)
                }
            }
        )*
    };
}

int_comparable!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl Comparable for f32 {
    fn canonical(&self) -> Canonical {
        Canonical::Float(f64::from(*self))
    }
}

impl Comparable for f64 {
    fn canonical(&self) -> Canonical {
        Canonical::Float(*self)
    }
}

impl Comparable for char {
    fn canonical(&self) -> Canonical {
        Canonical::Str(Arc::from(self.to_string()))
    }
}

impl Comparable for str {
    fn canonical(&self) -> Canonical {
        Canonical::Str(Arc::from(self))
    }
}

impl Comparable for String {
    fn canonical(&self) -> Canonical {
        Canonical::Str(Arc::from(self.as_str()))
    }
}

impl<T: Comparable> Comparable for Option<T> {
    fn canonical(&self) -> Canonical {
        self.as_ref().map_or(Canonical::Absent, Comparable::canonical)
    }
}

impl<T: Comparable + ?Sized> Comparable for &T {
    fn canonical(&self) -> Canonical {
        (**self).canonical()
    }
}

/// An `Arc` compares by the value it wraps.
impl<T: Comparable + ?Sized> Comparable for Arc<T> {
    fn canonical(&self) -> Canonical {
        (**self).canonical()
    }
}

/// A shared payload compared by identity instead of by value.
///
/// Two `Shared` handles are equal only when they point at the same
/// allocation, whatever the payload contains.
#[derive(Debug, Default)]
pub struct Shared<T: ?Sized>(Arc<T>);

impl<T> Shared<T> {
    /// Move `value` into a new shared allocation.
    pub fn new(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl<T: ?Sized> Shared<T> {
    /// Check if both handles point at the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// The underlying `Arc`.
    #[must_use]
    pub const fn as_arc(&self) -> &Arc<T> {
        &self.0
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> From<Arc<T>> for Shared<T> {
    fn from(value: Arc<T>) -> Self {
        Self(value)
    }
}

impl<T: ?Sized> Comparable for Shared<T> {
    fn canonical(&self) -> Canonical {
        Canonical::shared(&self.0)
    }
}

/// A flat mapping of prop keys to canonical payloads.
///
/// Keys that are absent from `entries` are treated as [`Canonical::Absent`].
pub trait Props {
    /// Present prop keys with their canonical payloads.
    fn entries(&self) -> Vec<(Cow<'_, str>, Canonical)>;
}

impl Props for () {
    fn entries(&self) -> Vec<(Cow<'_, str>, Canonical)> {
        Vec::new()
    }
}

impl<T: Props + ?Sized> Props for &T {
    fn entries(&self) -> Vec<(Cow<'_, str>, Canonical)> {
        (**self).entries()
    }
}

impl<T: Props + ?Sized> Props for Arc<T> {
    fn entries(&self) -> Vec<(Cow<'_, str>, Canonical)> {
        (**self).entries()
    }
}

type PropValue = Arc<dyn Comparable + Send + Sync>;

/// Dynamic string-keyed prop bag.
///
/// Values are retained, so identity payloads stay valid for as long as the
/// map that produced them is alive.
#[derive(Clone, Default)]
pub struct PropMap {
    values: BTreeMap<String, PropValue>,
}

impl PropMap {
    /// Create an empty prop map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prop, builder style.
    #[must_use]
    pub fn with<V>(mut self, key: impl Into<String>, value: V) -> Self
    where
        V: Comparable + Send + Sync + 'static,
    {
        self.insert(key, value);
        self
    }

    /// Insert or replace a prop.
    pub fn insert<V>(&mut self, key: impl Into<String>, value: V)
    where
        V: Comparable + Send + Sync + 'static,
    {
        self.values.insert(key.into(), Arc::new(value));
    }

    /// Remove a prop, returning whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    /// Canonical payload of a prop, [`Canonical::Absent`] when missing.
    #[must_use]
    pub fn get(&self, key: &str) -> Canonical {
        self.values
            .get(key)
            .map_or(Canonical::Absent, |value| (**value).canonical())
    }

    /// Check if a key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of props.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no props.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over present keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl Props for PropMap {
    fn entries(&self) -> Vec<(Cow<'_, str>, Canonical)> {
        self.values
            .iter()
            .map(|(key, value)| (Cow::Borrowed(key.as_str()), (**value).canonical()))
            .collect()
    }
}

impl fmt::Debug for PropMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.values.iter().map(|(k, v)| (k, (**v).canonical())))
            .finish()
    }
}

/// Compare two prop sets the way an update is judged redundant.
///
/// Returns `true` (no observable change) when both hold:
///
/// 1. every key present in `new` is ignored or was present in `old`;
/// 2. every non-ignored key of either side has the same canonical payload on
///    both sides, a missing key counting as [`Canonical::Absent`].
///
/// The second check walks the union of keys so a removed key is a change.
pub fn shallow_equal<P>(old: &P, new: &P, ignore: &IgnoreSet) -> bool
where
    P: Props + ?Sized,
{
    let old_entries = old.entries();
    let new_entries = new.entries();
    let old: BTreeMap<&str, &Canonical> = old_entries.iter().map(|(k, v)| (&**k, v)).collect();
    let new: BTreeMap<&str, &Canonical> = new_entries.iter().map(|(k, v)| (&**k, v)).collect();

    let no_new_keys = new
        .keys()
        .all(|key| ignore.contains(*key) || old.contains_key(key));
    if !no_new_keys {
        return false;
    }

    let absent = Canonical::Absent;
    old.keys()
        .chain(new.keys())
        .filter(|key| !ignore.contains(**key))
        .all(|key| {
            new.get(key).copied().unwrap_or(&absent) == old.get(key).copied().unwrap_or(&absent)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ignore(keys: &[&str]) -> IgnoreSet {
        keys.iter().map(|k| (*k).to_string()).collect()
    }

    // =========================================================================
    // Canonical Tests
    // =========================================================================

    #[test]
    fn test_canonical_primitives() {
        assert_eq!(42_i32.canonical(), Canonical::Int(42));
        assert_eq!(42_u64.canonical(), Canonical::Int(42));
        assert_eq!(true.canonical(), Canonical::Bool(true));
        assert_eq!("a".canonical(), Canonical::Str(Arc::from("a")));
        assert_eq!(String::from("a").canonical(), "a".canonical());
        assert_eq!('x'.canonical(), "x".canonical());
    }

    #[test]
    fn test_canonical_float_nan_is_not_equal() {
        assert_ne!(f64::NAN.canonical(), f64::NAN.canonical());
        assert_eq!(1.5_f32.canonical(), 1.5_f64.canonical());
    }

    #[test]
    fn test_canonical_option() {
        let none: Option<i32> = None;
        assert!(none.canonical().is_absent());
        assert_eq!(Some(3).canonical(), Canonical::Int(3));
    }

    #[test]
    fn test_canonical_arc_unwraps_value() {
        assert_eq!(Arc::<str>::from("Name").canonical(), Arc::<str>::from("Name").canonical());
        assert_eq!(Arc::new(5_i32).canonical(), Arc::new(5_i32).canonical());
        assert_eq!(Arc::new(5_i32).canonical(), Canonical::Int(5));
        assert_ne!(Arc::new(5_i32).canonical(), Arc::new(6_i32).canonical());
    }

    #[test]
    fn test_canonical_shared_identity() {
        let a = Shared::new(vec![1, 2, 3]);
        let b = a.clone();
        let c = Shared::new(vec![1, 2, 3]);
        assert_eq!(a.canonical(), b.canonical());
        assert_ne!(a.canonical(), c.canonical());
        assert!(a.ptr_eq(&b));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn test_canonical_display() {
        assert_eq!(Canonical::Absent.to_string(), "<absent>");
        assert_eq!(Canonical::Int(7).to_string(), "7");
        assert_eq!("hi".canonical().to_string(), "\"hi\"");
    }

    // =========================================================================
    // PropMap Tests
    // =========================================================================

    #[test]
    fn test_prop_map_basics() {
        let mut props = PropMap::new().with("a", 1).with("b", "two");
        assert_eq!(props.len(), 2);
        assert!(props.contains_key("a"));
        assert_eq!(props.get("b"), "two".canonical());
        assert!(props.get("missing").is_absent());

        assert!(props.remove("a"));
        assert!(!props.remove("a"));
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_prop_map_debug_shows_payloads() {
        let props = PropMap::new().with("n", 5);
        let debug = format!("{props:?}");
        assert!(debug.contains("\"n\""));
        assert!(debug.contains("Int(5)"));
    }

    // =========================================================================
    // Shallow Comparison Tests
    // =========================================================================

    #[test]
    fn test_shallow_equal_identical() {
        let a = PropMap::new().with("x", 1).with("y", "s");
        let b = PropMap::new().with("x", 1).with("y", "s");
        assert!(shallow_equal(&a, &b, &IgnoreSet::new()));
    }

    #[test]
    fn test_shallow_equal_value_changed() {
        let a = PropMap::new().with("x", 1);
        let b = PropMap::new().with("x", 2);
        assert!(!shallow_equal(&a, &b, &IgnoreSet::new()));
    }

    #[test]
    fn test_shallow_equal_key_removed() {
        let a = PropMap::new().with("x", 1).with("y", 2);
        let b = PropMap::new().with("x", 1);
        assert!(!shallow_equal(&a, &b, &IgnoreSet::new()));
    }

    #[test]
    fn test_shallow_equal_key_added() {
        let a = PropMap::new().with("x", 1);
        let b = PropMap::new().with("x", 1).with("y", 2);
        assert!(!shallow_equal(&a, &b, &IgnoreSet::new()));
    }

    #[test]
    fn test_shallow_equal_added_absent_key_is_a_change() {
        let a = PropMap::new().with("x", 1);
        let b = PropMap::new().with("x", 1).with("y", None::<i32>);
        assert!(!shallow_equal(&a, &b, &IgnoreSet::new()));
    }

    #[test]
    fn test_shallow_equal_ignored_keys() {
        let a = PropMap::new().with("x", 1).with("on_change", 10);
        let b = PropMap::new().with("x", 1).with("on_change", 11);
        assert!(shallow_equal(&a, &b, &ignore(&["on_change"])));

        let c = PropMap::new().with("x", 1);
        assert!(shallow_equal(&a, &c, &ignore(&["on_change"])));
        assert!(shallow_equal(&c, &a, &ignore(&["on_change"])));
    }

    #[test]
    fn test_shallow_equal_shared_identity() {
        let shared = Shared::new(String::from("payload"));
        let a = PropMap::new().with("data", shared.clone());
        let b = PropMap::new().with("data", shared);
        let c = PropMap::new().with("data", Shared::new(String::from("payload")));
        assert!(shallow_equal(&a, &b, &IgnoreSet::new()));
        assert!(!shallow_equal(&a, &c, &IgnoreSet::new()));
    }

    #[test]
    fn test_shallow_equal_distinct_arcs_same_value() {
        let a = PropMap::new()
            .with("label", Arc::<str>::from("Name"))
            .with("width", Arc::new(5_i32));
        let b = PropMap::new()
            .with("label", Arc::<str>::from("Name"))
            .with("width", Arc::new(5_i32));
        assert!(shallow_equal(&a, &b, &IgnoreSet::new()));

        let c = PropMap::new()
            .with("label", Arc::<str>::from("Name"))
            .with("width", Arc::new(6_i32));
        assert!(!shallow_equal(&a, &c, &IgnoreSet::new()));
    }

    #[test]
    fn test_shallow_equal_unit_props() {
        assert!(shallow_equal(&(), &(), &IgnoreSet::new()));
    }

    proptest! {
        #[test]
        fn prop_equal_maps_compare_equal(values in proptest::collection::btree_map("[a-e]", any::<i64>(), 0..5)) {
            let mut a = PropMap::new();
            let mut b = PropMap::new();
            for (k, v) in &values {
                a.insert(k.clone(), *v);
                b.insert(k.clone(), *v);
            }
            prop_assert!(shallow_equal(&a, &b, &IgnoreSet::new()));
        }

        #[test]
        fn prop_changes_in_ignored_keys_are_invisible(x in any::<i32>(), before in any::<i32>(), after in any::<i32>()) {
            let a = PropMap::new().with("x", x).with("callback", before);
            let b = PropMap::new().with("x", x).with("callback", after);
            prop_assert!(shallow_equal(&a, &b, &ignore(&["callback"])));
        }

        #[test]
        fn prop_non_ignored_change_is_detected(x in any::<i32>(), y in any::<i32>()) {
            prop_assume!(x != y);
            let a = PropMap::new().with("x", x);
            let b = PropMap::new().with("x", y);
            prop_assert!(!shallow_equal(&a, &b, &ignore(&["other"])));
        }
    }
}
