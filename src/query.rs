//! # Query engine: exact evaluation with graceful degradation
//!
//! Position, state, and frame-transform queries against an
//! [`Ephemerist`](crate::ephemerist::Ephemerist) context. Each query decides
//! between the **exact** path (the provider evaluates at the requested
//! instant) and the **estimation** path (the provider evaluates only at
//! covered boundary instants, optionally interpolating):
//!
//! - Position and state queries consult the position coverage index for both
//!   participants up front. Both covered → exact call. Exactly one covered →
//!   the uncovered participant is estimated, with the result negated when the
//!   roles had to be swapped (position of A relative to B is the negation of
//!   B relative to A). Neither covered → `NoCoverage`, subject to the
//!   failure policy.
//! - Transform queries attempt the exact call first and fall back to the
//!   estimation path on failure; coverage is failure-checked, not
//!   pre-checked.
//!
//! Estimation classifies the requested instant against the identifier's
//! boundary set: before all boundaries → evaluate at the first; after all →
//! evaluate at the last (no extrapolation in either case); bracketed →
//! evaluate at both neighbors and interpolate linearly, component-wise for
//! vectors and matrices and scalar-wise for light time.

use nalgebra::Matrix3;

use crate::constants::{BodyId, Et, ORIGIN_ID};
use crate::ephemerist::Ephemerist;
use crate::ephemerist_errors::EphemeristError;
use crate::kernel::BoundaryNeighbors;
use crate::policy::{Computed, ErrorPolicy};
use crate::provider::{AberrationCorrection, EphemerisProvider, TargetPosition, TargetState};

/// Linear interpolation with weight `w` in `[0, 1]`: exactly `earlier` at
/// `w = 0` and exactly `later` at `w = 1`.
fn lerp<T>(earlier: T, later: T, w: f64) -> T
where
    T: std::ops::Mul<f64, Output = T> + std::ops::Add<Output = T>,
{
    earlier * (1.0 - w) + later * w
}

impl<P: EphemerisProvider> Ephemerist<P> {
    /// Position of `target` relative to `observer` at `et`, expressed in
    /// `frame`.
    ///
    /// Arguments
    /// -----------------
    /// * `target`: Name of the target body.
    /// * `observer`: Name of the observing body.
    /// * `frame`: Name of the reference frame for the returned vector.
    /// * `correction`: Aberration correction applied by the provider.
    /// * `et`: Requested instant, TDB seconds past J2000.
    ///
    /// Return
    /// ----------
    /// * The tagged position result, or an [`EphemeristError`] under
    ///   [`ErrorPolicy::Propagate`].
    ///
    /// See also
    /// ------------
    /// * [`state`](Self::state) – Position and velocity together.
    /// * [`Computed`] – Provenance tags on the returned value.
    pub fn position(
        &mut self,
        target: &str,
        observer: &str,
        frame: &str,
        correction: AberrationCorrection,
        et: Et,
    ) -> Result<Computed<TargetPosition>, EphemeristError> {
        let Some(target_id) = self.provider.resolve_identifier(target) else {
            return self.unresolved(target, TargetPosition::zeros());
        };
        let Some(observer_id) = self.provider.resolve_identifier(observer) else {
            return self.unresolved(observer, TargetPosition::zeros());
        };

        let target_covered = self.has_position_coverage(target_id, et);
        let observer_covered = self.has_position_coverage(observer_id, et);

        if !target_covered && !observer_covered {
            return self.degraded(
                EphemeristError::NoCoverage {
                    target: target_id,
                    observer: observer_id,
                    et,
                },
                TargetPosition::zeros(),
            );
        }

        if target_covered && observer_covered {
            return match self
                .provider
                .exact_position(target, et, frame, correction, observer)
            {
                Some(position) => Ok(Computed::Exact(position)),
                None => self.provider_failure(
                    format!(
                        "Error getting position from '{target}' to '{observer}' in frame \
                         '{frame}' at time {et}"
                    ),
                    TargetPosition::zeros(),
                ),
            };
        }

        if target_covered {
            // Only the observer lacks coverage: estimate it with the roles
            // swapped and negate.
            let swapped =
                self.estimated_position(observer, observer_id, target, frame, correction, et)?;
            Ok(swapped.map(|mut estimate| {
                estimate.position = -estimate.position;
                estimate
            }))
        } else {
            self.estimated_position(target, target_id, observer, frame, correction, et)
        }
    }

    /// Position and velocity of `target` relative to `observer` at `et`,
    /// expressed in `frame`.
    ///
    /// Follows the same coverage policy as [`position`](Self::position);
    /// velocity is negated along with position when the roles are swapped,
    /// and interpolated alongside it on the estimation path.
    ///
    /// # Panics
    ///
    /// If `target` and `observer` are the same name: a precondition
    /// violation, not a runtime query failure.
    pub fn state(
        &mut self,
        target: &str,
        observer: &str,
        frame: &str,
        correction: AberrationCorrection,
        et: Et,
    ) -> Result<Computed<TargetState>, EphemeristError> {
        assert!(target != observer, "Target and observer must be different");

        let Some(target_id) = self.provider.resolve_identifier(target) else {
            return self.unresolved(target, TargetState::zeros());
        };
        let Some(observer_id) = self.provider.resolve_identifier(observer) else {
            return self.unresolved(observer, TargetState::zeros());
        };

        let target_covered = self.has_position_coverage(target_id, et);
        let observer_covered = self.has_position_coverage(observer_id, et);

        if !target_covered && !observer_covered {
            return self.degraded(
                EphemeristError::NoCoverage {
                    target: target_id,
                    observer: observer_id,
                    et,
                },
                TargetState::zeros(),
            );
        }

        if target_covered && observer_covered {
            return match self
                .provider
                .exact_state(target, et, frame, correction, observer)
            {
                Some(state) => Ok(Computed::Exact(state)),
                None => self.provider_failure(
                    format!(
                        "Error retrieving state of target '{target}' viewed from observer \
                         '{observer}' in reference frame '{frame}' at time {et}"
                    ),
                    TargetState::zeros(),
                ),
            };
        }

        if target_covered {
            let swapped =
                self.estimated_state(observer, observer_id, target, frame, correction, et)?;
            Ok(swapped.map(|mut estimate| {
                estimate.position = -estimate.position;
                estimate.velocity = -estimate.velocity;
                estimate
            }))
        } else {
            self.estimated_state(target, target_id, observer, frame, correction, et)
        }
    }

    /// Rotation taking vectors from frame `from` to frame `to` at `et`.
    ///
    /// The exact call is attempted first; on failure the provider's error
    /// state is cleared and the estimation path runs unconditionally over
    /// the source frame's orientation coverage.
    pub fn transform(
        &mut self,
        from: &str,
        to: &str,
        et: Et,
    ) -> Result<Computed<Matrix3<f64>>, EphemeristError> {
        if let Some(matrix) = self.provider.exact_transform(from, to, et) {
            return Ok(Computed::Exact(matrix));
        }
        self.provider.clear_error_state();
        self.estimated_transform(from, to, et)
    }

    /// Estimate a position for a participant without coverage at `et`.
    ///
    /// # Panics
    ///
    /// If `target` and `observer` are the same name.
    fn estimated_position(
        &mut self,
        target: &str,
        target_id: BodyId,
        observer: &str,
        frame: &str,
        correction: AberrationCorrection,
        et: Et,
    ) -> Result<Computed<TargetPosition>, EphemeristError> {
        assert!(target != observer, "Target and observer must be different");

        if target_id == ORIGIN_ID {
            // The solar-system barycenter has no kernel data; it is the
            // origin by definition.
            return Ok(Computed::Exact(TargetPosition::zeros()));
        }

        let neighbors = match self.position_coverage.nearest_boundaries(target_id, et) {
            Ok(neighbors) => neighbors,
            Err(err) => return self.degraded(err, TargetPosition::zeros()),
        };

        let context = format!(
            "Error estimating position for '{target}' with observer '{observer}' in frame \
             '{frame}'"
        );
        match neighbors {
            BoundaryNeighbors::BeforeAll(boundary) | BoundaryNeighbors::AfterAll(boundary) => {
                match self
                    .provider
                    .exact_position(target, boundary, frame, correction, observer)
                {
                    Some(position) => Ok(Computed::Estimated(position)),
                    None => self.provider_failure(context, TargetPosition::zeros()),
                }
            }
            BoundaryNeighbors::Bracketed(lo, hi) => {
                let earlier = self
                    .provider
                    .exact_position(target, lo, frame, correction, observer);
                let later = self
                    .provider
                    .exact_position(target, hi, frame, correction, observer);
                match (earlier, later) {
                    (Some(earlier), Some(later)) => {
                        let w = (et - lo) / (hi - lo);
                        Ok(Computed::Estimated(TargetPosition {
                            position: lerp(earlier.position, later.position, w),
                            light_time: lerp(earlier.light_time, later.light_time, w),
                        }))
                    }
                    _ => self.provider_failure(context, TargetPosition::zeros()),
                }
            }
        }
    }

    /// Estimate a full state for a participant without coverage at `et`.
    ///
    /// # Panics
    ///
    /// If `target` and `observer` are the same name.
    fn estimated_state(
        &mut self,
        target: &str,
        target_id: BodyId,
        observer: &str,
        frame: &str,
        correction: AberrationCorrection,
        et: Et,
    ) -> Result<Computed<TargetState>, EphemeristError> {
        assert!(target != observer, "Target and observer must be different");

        if target_id == ORIGIN_ID {
            return Ok(Computed::Exact(TargetState::zeros()));
        }

        let neighbors = match self.position_coverage.nearest_boundaries(target_id, et) {
            Ok(neighbors) => neighbors,
            Err(err) => return self.degraded(err, TargetState::zeros()),
        };

        let context = format!(
            "Error estimating state for '{target}' with observer '{observer}' in frame '{frame}'"
        );
        match neighbors {
            BoundaryNeighbors::BeforeAll(boundary) | BoundaryNeighbors::AfterAll(boundary) => {
                match self
                    .provider
                    .exact_state(target, boundary, frame, correction, observer)
                {
                    Some(state) => Ok(Computed::Estimated(state)),
                    None => self.provider_failure(context, TargetState::zeros()),
                }
            }
            BoundaryNeighbors::Bracketed(lo, hi) => {
                let earlier = self
                    .provider
                    .exact_state(target, lo, frame, correction, observer);
                let later = self
                    .provider
                    .exact_state(target, hi, frame, correction, observer);
                match (earlier, later) {
                    (Some(earlier), Some(later)) => {
                        let w = (et - lo) / (hi - lo);
                        Ok(Computed::Estimated(TargetState {
                            position: lerp(earlier.position, later.position, w),
                            velocity: lerp(earlier.velocity, later.velocity, w),
                            light_time: lerp(earlier.light_time, later.light_time, w),
                        }))
                    }
                    _ => self.provider_failure(context, TargetState::zeros()),
                }
            }
        }
    }

    /// Estimate a frame transform from the source frame's orientation
    /// coverage boundaries.
    fn estimated_transform(
        &mut self,
        from: &str,
        to: &str,
        et: Et,
    ) -> Result<Computed<Matrix3<f64>>, EphemeristError> {
        let Some(from_id) = self.provider.resolve_identifier(from) else {
            return self.unresolved(from, Matrix3::identity());
        };

        let neighbors = match self.orientation_coverage.nearest_boundaries(from_id, et) {
            Ok(neighbors) => neighbors,
            Err(err) => return self.degraded(err, Matrix3::identity()),
        };

        let context =
            format!("Error estimating transform matrix from frame '{from}' to '{to}' at time {et}");
        match neighbors {
            BoundaryNeighbors::BeforeAll(boundary) | BoundaryNeighbors::AfterAll(boundary) => {
                match self.provider.exact_transform(from, to, boundary) {
                    Some(matrix) => Ok(Computed::Estimated(matrix)),
                    None => self.provider_failure(context, Matrix3::identity()),
                }
            }
            BoundaryNeighbors::Bracketed(lo, hi) => {
                let earlier = self.provider.exact_transform(from, to, lo);
                let later = self.provider.exact_transform(from, to, hi);
                match (earlier, later) {
                    (Some(earlier), Some(later)) => {
                        let w = (et - lo) / (hi - lo);
                        Ok(Computed::Estimated(lerp(earlier, later, w)))
                    }
                    _ => self.provider_failure(context, Matrix3::identity()),
                }
            }
        }
    }

    /// Translate a provider failure: read the diagnostic, clear the error
    /// state, then report or default per the policy.
    fn provider_failure<T>(
        &mut self,
        context: String,
        neutral: T,
    ) -> Result<Computed<T>, EphemeristError> {
        let message = self.provider.last_error_message();
        self.provider.clear_error_state();
        let diagnostic = format!("{context}: {message}");
        match self.policy {
            ErrorPolicy::Propagate => Err(EphemeristError::ProviderFailure(diagnostic)),
            ErrorPolicy::SilentDefault => Ok(Computed::Defaulted {
                value: neutral,
                diagnostic,
            }),
        }
    }

    /// A name the provider could not resolve, per the policy.
    fn unresolved<T>(&self, name: &str, neutral: T) -> Result<Computed<T>, EphemeristError> {
        let diagnostic = format!("Could not find identifier of '{name}'");
        match self.policy {
            ErrorPolicy::Propagate => Err(EphemeristError::ProviderFailure(diagnostic)),
            ErrorPolicy::SilentDefault => Ok(Computed::Defaulted {
                value: neutral,
                diagnostic,
            }),
        }
    }

    /// A coverage miss (`NoCoverage` / `NoCoverageData`), per the policy.
    fn degraded<T>(
        &self,
        err: EphemeristError,
        neutral: T,
    ) -> Result<Computed<T>, EphemeristError> {
        match self.policy {
            ErrorPolicy::Propagate => Err(err),
            ErrorPolicy::SilentDefault => Ok(Computed::Defaulted {
                value: neutral,
                diagnostic: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn lerp_is_exact_at_the_endpoints() {
        let earlier = Vector3::new(1.0, -2.0, 3.0);
        let later = Vector3::new(7.0, 11.0, -5.0);
        assert_eq!(lerp(earlier, later, 0.0), earlier);
        assert_eq!(lerp(earlier, later, 1.0), later);
        assert_eq!(lerp(earlier, later, 0.5), (earlier + later) * 0.5);

        assert_eq!(lerp(2.0, 4.0, 0.0), 2.0);
        assert_eq!(lerp(2.0, 4.0, 1.0), 4.0);
    }

    #[test]
    fn computed_map_preserves_provenance() {
        assert_eq!(Computed::Exact(2.0).map(|v| v * 2.0), Computed::Exact(4.0));
        assert_eq!(
            Computed::Estimated(2.0).map(|v| v * 2.0),
            Computed::Estimated(4.0)
        );
        let defaulted = Computed::Defaulted {
            value: 1.0,
            diagnostic: "why".to_string(),
        }
        .map(|v| v * 2.0);
        assert_eq!(
            defaulted,
            Computed::Defaulted {
                value: 2.0,
                diagnostic: "why".to_string(),
            }
        );
    }
}
