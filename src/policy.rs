//! # Failure policy and tagged query results
//!
//! Every query on an [`Ephemerist`](crate::ephemerist::Ephemerist) context can
//! fail inside the external ephemeris provider. How such a failure surfaces is
//! controlled by the context's [`ErrorPolicy`]:
//!
//! - [`ErrorPolicy::Propagate`] translates provider failures into
//!   [`EphemeristError`](crate::ephemerist_errors::EphemeristError) values and
//!   returns them to the caller.
//! - [`ErrorPolicy::SilentDefault`] absorbs the failure and substitutes a
//!   documented neutral value (zero vector for positions and states, identity
//!   for transforms, `false`/empty for boolean and listing queries).
//!
//! In both cases the provider's internal error state is cleared as a side
//! effect of the translation, so subsequent calls are not contaminated.
//!
//! A substituted neutral value would otherwise be indistinguishable from a
//! legitimate "at origin" result, so queries return a [`Computed`] wrapper
//! that tags every value with its provenance: exact, estimated, or a
//! degraded default carrying the diagnostic that caused it.

/// Failure handling mode, stored as a field of the context and
/// readable/mutable at any time.
///
/// [`InvalidPath`](crate::ephemerist_errors::EphemeristError::InvalidPath) and
/// [`UnknownHandle`](crate::ephemerist_errors::EphemeristError::UnknownHandle)
/// indicate caller errors and are reported under both policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Surface provider failures and coverage misses as errors.
    #[default]
    Propagate,
    /// Absorb provider failures and coverage misses, returning a neutral
    /// default tagged as [`Computed::Defaulted`].
    SilentDefault,
}

/// A query result together with the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum Computed<T> {
    /// The provider answered directly at the requested instant.
    Exact(T),
    /// The requested instant fell outside all loaded coverage; the value was
    /// obtained from the nearest coverage boundaries instead.
    Estimated(T),
    /// A failure was absorbed under [`ErrorPolicy::SilentDefault`]; `value`
    /// is the documented neutral default and `diagnostic` the reason it was
    /// substituted.
    Defaulted { value: T, diagnostic: String },
}

impl<T> Computed<T> {
    /// Borrow the carried value regardless of provenance.
    pub fn value(&self) -> &T {
        match self {
            Computed::Exact(value) | Computed::Estimated(value) => value,
            Computed::Defaulted { value, .. } => value,
        }
    }

    /// Consume the wrapper, discarding provenance.
    pub fn into_value(self) -> T {
        match self {
            Computed::Exact(value) | Computed::Estimated(value) => value,
            Computed::Defaulted { value, .. } => value,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Computed::Exact(_))
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, Computed::Estimated(_))
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Computed::Defaulted { .. })
    }

    /// Transform the carried value while keeping the provenance tag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Computed<U> {
        match self {
            Computed::Exact(value) => Computed::Exact(f(value)),
            Computed::Estimated(value) => Computed::Estimated(f(value)),
            Computed::Defaulted { value, diagnostic } => Computed::Defaulted {
                value: f(value),
                diagnostic,
            },
        }
    }
}
