//! Error types for morphic.

use crate::polymorph::DescriptorId;
use thiserror::Error;

/// Misuse of a polymorphic state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolymorphError {
    /// The state still carries the empty stub descriptor.
    #[error("cannot render empty polymorph ({descriptor}): no variant has been selected")]
    StubRender { descriptor: DescriptorId },

    /// The state belongs to another variant.
    #[error("expected variant {expected}, found {found}")]
    VariantMismatch {
        expected: DescriptorId,
        found: DescriptorId,
    },

    /// The payload does not have the state type its descriptor was derived with.
    #[error("payload of {descriptor} does not match its variant state type")]
    PayloadType { descriptor: DescriptorId },
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value parsed but is not usable.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}
