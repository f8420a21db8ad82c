//! # Ephemerist: kernel lifecycle, coverage index, and query context
//!
//! This module defines the [`Ephemerist`](crate::ephemerist::Ephemerist)
//! struct, the central façade that wires together:
//!
//! 1. **Ephemeris provider access** — the external computation engine behind
//!    the [`EphemerisProvider`](crate::provider::EphemerisProvider) trait,
//!    invoked for exact evaluations and coverage extraction.
//! 2. **Kernel registry** — loaded data files under reference counting with
//!    stable [`KernelHandle`](crate::kernel::KernelHandle)s.
//! 3. **Coverage indexes** — one
//!    [`CoverageIndex`](crate::kernel::CoverageIndex) per binary kernel
//!    class (position-type and orientation-type), populated on load.
//! 4. **Failure policy** — the per-context
//!    [`ErrorPolicy`](crate::policy::ErrorPolicy) read by every operation
//!    that can fail.
//!
//! The context is owned by the caller and passed explicitly; there is no
//! process-wide instance, so independent contexts (e.g. in tests) cannot
//! observe each other.
//!
//! ## Typical usage
//!
//! ```rust,ignore
//! use ephemerist::ephemerist::Ephemerist;
//! use ephemerist::provider::AberrationCorrection;
//!
//! let mut context = Ephemerist::new(provider);
//! let handle = context.load_kernel(Utf8Path::new("data/mission.bsp"))?;
//!
//! let result = context.position(
//!     "CASSINI",
//!     "SATURN BARYCENTER",
//!     "GALACTIC",
//!     AberrationCorrection::default(),
//!     et,
//! )?;
//!
//! context.unload_kernel(handle)?;
//! ```
//!
//! ## Notes
//!
//! - Coverage windows **accumulate**: unloading a kernel never removes the
//!   windows it contributed, so estimation keeps working across load/unload
//!   churn. [`forget_coverage`](Ephemerist::forget_coverage) drops an
//!   identifier's history explicitly.
//! - Loading is a synchronous, potentially I/O-bound operation; keep it off
//!   hot per-frame paths.
//!
//! ## See also
//! ------------
//! * [`EphemerisProvider`](crate::provider::EphemerisProvider) – Capability
//!   set consumed from the computation engine.
//! * [`CoverageIndex`](crate::kernel::CoverageIndex) – Interval index and
//!   boundary search.
//! * [`ErrorPolicy`](crate::policy::ErrorPolicy) – Failure translation
//!   policy.

use camino::{Utf8Path, Utf8PathBuf};

use crate::constants::{BodyId, Et, ORIGIN_ID};
use crate::ephemerist_errors::EphemeristError;
use crate::kernel::registry::{self, KernelRelease};
use crate::kernel::{CoverageIndex, KernelHandle, KernelRegistry};
use crate::policy::ErrorPolicy;
use crate::provider::{CoverageKind, EphemerisProvider};

#[derive(Debug, Clone)]
pub struct Ephemerist<P> {
    pub(crate) provider: P,
    pub(crate) registry: KernelRegistry,
    pub(crate) position_coverage: CoverageIndex,
    pub(crate) orientation_coverage: CoverageIndex,
    pub(crate) policy: ErrorPolicy,
}

impl<P: EphemerisProvider> Ephemerist<P> {
    /// Construct a new context around a ready ephemeris provider, with the
    /// default [`ErrorPolicy::Propagate`] policy.
    pub fn new(provider: P) -> Self {
        Self::with_policy(provider, ErrorPolicy::default())
    }

    /// Construct a new context with an explicit failure policy.
    pub fn with_policy(provider: P, policy: ErrorPolicy) -> Self {
        Ephemerist {
            provider,
            registry: KernelRegistry::new(),
            position_coverage: CoverageIndex::new(),
            orientation_coverage: CoverageIndex::new(),
            policy,
        }
    }

    /// The current failure policy.
    pub fn error_policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Switch the failure policy; takes effect for every subsequent
    /// operation.
    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    /// Load a kernel file, or register another interest in an
    /// already-loaded one.
    ///
    /// The path is canonicalized first; a missing file or parent directory
    /// fails with [`EphemeristError::InvalidPath`] under **both** policies.
    /// If the canonical path is already tracked, its reference count is
    /// bumped and the existing handle returned without touching the
    /// provider or re-extracting coverage. Otherwise the provider loads the
    /// file (receiving the kernel's containing directory as the base for
    /// relative sub-references), coverage is extracted for recognized
    /// binary classes, and a fresh handle is assigned.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: Location of the kernel file; relative paths resolve
    ///   against the process working directory during canonicalization.
    ///
    /// Return
    /// ----------
    /// * The stable [`KernelHandle`] for this kernel, or an
    ///   [`EphemeristError`].
    ///
    /// See also
    /// ------------
    /// * [`unload_kernel`](Self::unload_kernel) – Release by handle.
    /// * [`unload_kernel_by_path`](Self::unload_kernel_by_path) – Release by
    ///   path.
    pub fn load_kernel(&mut self, path: &Utf8Path) -> Result<KernelHandle, EphemeristError> {
        let canonical = registry::canonical_kernel_path(path)?;

        if let Some(handle) = self.registry.acquire_existing(&canonical) {
            return Ok(handle);
        }

        // Meta-kernels reference sub-files relative to their own directory.
        let base_dir = canonical.parent().unwrap_or(Utf8Path::new("/"));

        log::info!("Loading ephemeris kernel '{canonical}'");
        if !self.provider.load_file(&canonical, base_dir) {
            let message = self.provider.last_error_message();
            self.provider.clear_error_state();
            if self.policy == ErrorPolicy::Propagate {
                return Err(EphemeristError::ProviderFailure(format!(
                    "Kernel loading: {message}"
                )));
            }
        }

        if let Some(kind) = CoverageKind::from_extension(canonical.extension()) {
            self.extract_coverage(&canonical, kind)?;
        }

        Ok(self.registry.insert(canonical))
    }

    fn extract_coverage(
        &mut self,
        path: &Utf8Path,
        kind: CoverageKind,
    ) -> Result<(), EphemeristError> {
        match self.provider.extract_coverage(path, kind) {
            Some(entries) => {
                let index = match kind {
                    CoverageKind::Position => &mut self.position_coverage,
                    CoverageKind::Orientation => &mut self.orientation_coverage,
                };
                for (id, start, end) in entries {
                    index.record_window(id, start, end);
                }
                Ok(())
            }
            None => {
                let message = self.provider.last_error_message();
                self.provider.clear_error_state();
                match self.policy {
                    ErrorPolicy::Propagate => Err(EphemeristError::ProviderFailure(format!(
                        "Error finding {kind} coverage: {message}"
                    ))),
                    ErrorPolicy::SilentDefault => Ok(()),
                }
            }
        }
    }

    /// Release one interest in a kernel by handle.
    ///
    /// With a single outstanding interest the provider unloads the file and
    /// the record is removed; otherwise only the count drops. A handle that
    /// no record currently holds fails with
    /// [`EphemeristError::UnknownHandle`] under both policies, since it
    /// indicates a caller error.
    pub fn unload_kernel(&mut self, handle: KernelHandle) -> Result<(), EphemeristError> {
        match self.registry.release_by_handle(handle)? {
            KernelRelease::Unloaded(path) => {
                log::info!("Unloading ephemeris kernel '{path}'");
                self.provider.unload_file(&path);
            }
            KernelRelease::Retained(refs) => {
                log::debug!("Reducing reference counter to: {refs}");
            }
        }
        Ok(())
    }

    /// Release one interest in a kernel by path.
    ///
    /// Same semantics as [`unload_kernel`](Self::unload_kernel), resolved by
    /// canonical path. A path matching no loaded kernel fails with
    /// [`EphemeristError::UnknownKernel`] under [`ErrorPolicy::Propagate`]
    /// but is a **silent no-op** under [`ErrorPolicy::SilentDefault`].
    pub fn unload_kernel_by_path(&mut self, path: &Utf8Path) -> Result<(), EphemeristError> {
        let lookup = registry::normalized_lookup_path(path);
        match self.registry.release_by_path(&lookup) {
            Ok(KernelRelease::Unloaded(canonical)) => {
                log::info!("Unloading ephemeris kernel '{canonical}'");
                self.provider.unload_file(&canonical);
                Ok(())
            }
            Ok(KernelRelease::Retained(refs)) => {
                log::debug!("Reducing reference counter to: {refs}");
                Ok(())
            }
            Err(err) => match self.policy {
                ErrorPolicy::Propagate => Err(err),
                ErrorPolicy::SilentDefault => Ok(()),
            },
        }
    }

    /// Canonical paths of all loaded kernels, in load order.
    pub fn loaded_kernels(&self) -> Vec<Utf8PathBuf> {
        self.registry.loaded_paths()
    }

    /// True iff position-type data strictly covers `et` for `id`.
    ///
    /// The origin identifier is implicitly covered at all times: the
    /// solar-system barycenter needs no kernel data.
    pub fn has_position_coverage(&self, id: BodyId, et: Et) -> bool {
        id == ORIGIN_ID || self.position_coverage.has_coverage(id, et)
    }

    /// True iff orientation-type data strictly covers `et` for the frame
    /// `id`.
    pub fn has_orientation_coverage(&self, id: BodyId, et: Et) -> bool {
        self.orientation_coverage.has_coverage(id, et)
    }

    /// All recorded position-type coverage windows for `id`, in arrival
    /// order; empty if the identifier was never covered by a loaded file.
    pub fn position_coverage_windows(&self, id: BodyId) -> &[(Et, Et)] {
        self.position_coverage.windows(id)
    }

    /// All recorded orientation-type coverage windows for `id`.
    ///
    /// When the bare identifier has no windows, `id * 1000` is retried:
    /// orientation data for a spacecraft is conventionally filed under the
    /// thousandfold bus-frame number.
    pub fn orientation_coverage_windows(&self, id: BodyId) -> &[(Et, Et)] {
        let windows = self.orientation_coverage.windows(id);
        if windows.is_empty() {
            self.orientation_coverage.windows(id * 1000)
        } else {
            windows
        }
    }

    /// Drop the accumulated coverage history (both kinds) for one
    /// identifier. Returns whether anything was removed.
    ///
    /// Coverage otherwise outlives the kernels that contributed it; this is
    /// the explicit escape hatch for callers that want estimation to stop
    /// consulting stale windows.
    pub fn forget_coverage(&mut self, id: BodyId) -> bool {
        let position = self.position_coverage.forget(id);
        let orientation = self.orientation_coverage.forget(id);
        position || orientation
    }

    /// Resolve a body or frame name through the provider.
    pub fn resolve_identifier(&self, name: &str) -> Option<BodyId> {
        self.provider.resolve_identifier(name)
    }
}
