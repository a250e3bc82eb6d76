//! Render suppression for pure render functions.
//!
//! [`optimize`] wraps a function `props -> tree` in an [`Optimized`] value
//! that keeps the last props and output. New props are compared shallowly
//! against the previous ones; when nothing but ignored keys changed, the
//! previous output is kept and the render function is not called.
//!
//! # Examples
//!
//! ```
//! use morphic::{optimize, Element, PropMap, Update};
//!
//! let mut label = optimize(
//!     |props: &PropMap| Element::new("span").attr("text", props.get("text")),
//!     &["on_click"],
//! );
//! label.mount(PropMap::new().with("text", "Save").with("on_click", 1));
//!
//! let update = label.receive(PropMap::new().with("text", "Save").with("on_click", 2));
//! assert_eq!(update, Update::Suppressed);
//! assert_eq!(label.render_count(), 1);
//! ```

use crate::error::ConfigError;
use morphic_core::{shallow_equal, Element, IgnoreSet, Props};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Outcome of handing new props to an [`Optimized`] wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// The render function was invoked
    Rendered,
    /// The previous output was kept
    Suppressed,
}

impl Update {
    /// Check if the render function ran.
    #[must_use]
    pub const fn rendered(self) -> bool {
        matches!(self, Self::Rendered)
    }
}

/// Settings for an optimized renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeOptions {
    /// Prop keys whose changes never trigger a render
    pub ignore: Vec<String>,
}

impl OptimizeOptions {
    /// Options ignoring the given keys.
    #[must_use]
    pub fn ignoring<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            ignore: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse options from a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every ignored key is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ignore.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidValue {
                field: "ignore",
                reason: "empty key".to_string(),
            });
        }
        Ok(())
    }

    fn ignore_set(&self) -> IgnoreSet {
        self.ignore.iter().cloned().collect()
    }
}

type RenderFn<P, E> = Box<dyn Fn(&P) -> E + Send + Sync>;

/// A render function that skips redundant renders.
///
/// The wrapper holds the props of the most recent update, whether or not it
/// rendered, and the output of the most recent render.
pub struct Optimized<P, E = Element> {
    render: RenderFn<P, E>,
    ignore: IgnoreSet,
    props: Option<P>,
    output: Option<E>,
    renders: usize,
}

/// Wrap `render` so it only runs when a non-ignored prop changed.
pub fn optimize<P, E, F>(render: F, ignore: &[&str]) -> Optimized<P, E>
where
    P: Props,
    F: Fn(&P) -> E + Send + Sync + 'static,
{
    Optimized::with_options(render, &OptimizeOptions::ignoring(ignore.iter().copied()))
}

impl<P: Props, E> Optimized<P, E> {
    /// Wrap `render` with explicit options.
    pub fn with_options<F>(render: F, options: &OptimizeOptions) -> Self
    where
        F: Fn(&P) -> E + Send + Sync + 'static,
    {
        Self {
            render: Box::new(render),
            ignore: options.ignore_set(),
            props: None,
            output: None,
            renders: 0,
        }
    }

    /// Render for the first time, or unconditionally re-render.
    pub fn mount(&mut self, props: P) -> &E {
        self.renders += 1;
        trace!(renders = self.renders, "optimized render mounted");
        let output = (self.render)(&props);
        self.props = Some(props);
        self.output.insert(output)
    }

    /// Check if `next` differs from the current props in a non-ignored key.
    ///
    /// An unmounted wrapper always updates.
    #[must_use]
    pub fn should_update(&self, next: &P) -> bool {
        match &self.props {
            Some(current) => !shallow_equal(current, next, &self.ignore),
            None => true,
        }
    }

    /// Hand new props to the wrapper, rendering only if needed.
    pub fn receive(&mut self, props: P) -> Update {
        if self.output.is_none() {
            self.mount(props);
            return Update::Rendered;
        }
        if self.should_update(&props) {
            self.renders += 1;
            trace!(renders = self.renders, "props changed, rendering");
            self.output = Some((self.render)(&props));
            self.props = Some(props);
            Update::Rendered
        } else {
            trace!(renders = self.renders, "props unchanged, render suppressed");
            self.props = Some(props);
            Update::Suppressed
        }
    }

    /// Output of the most recent render.
    #[must_use]
    pub const fn output(&self) -> Option<&E> {
        self.output.as_ref()
    }

    /// Props of the most recent update.
    #[must_use]
    pub const fn props(&self) -> Option<&P> {
        self.props.as_ref()
    }

    /// Number of times the render function has run.
    #[must_use]
    pub const fn render_count(&self) -> usize {
        self.renders
    }

    /// Check if the wrapper has rendered at least once.
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.output.is_some()
    }

    /// Keys excluded from comparison.
    #[must_use]
    pub const fn ignored(&self) -> &IgnoreSet {
        &self.ignore
    }

    /// Drop the held props, returning the last output.
    pub fn unmount(&mut self) -> Option<E> {
        self.props = None;
        self.output.take()
    }
}

impl<P, E> fmt::Debug for Optimized<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Optimized")
            .field("ignore", &self.ignore)
            .field("mounted", &self.output.is_some())
            .field("renders", &self.renders)
            .finish_non_exhaustive()
    }
}
