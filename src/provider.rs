//! # Ephemeris provider capability set
//!
//! The coverage-and-query layer never computes positions itself; it delegates
//! every exact evaluation to an external **ephemeris provider** behind the
//! [`EphemerisProvider`] trait. The trait mirrors the capability set of a
//! NAIF-style computation engine:
//!
//! 1. **Kernel file lifecycle** — [`load_file`](EphemerisProvider::load_file)
//!    / [`unload_file`](EphemerisProvider::unload_file).
//! 2. **Name resolution** —
//!    [`resolve_identifier`](EphemerisProvider::resolve_identifier).
//! 3. **Exact evaluation** — position, state, and frame-transform queries at
//!    a single instant.
//! 4. **Coverage extraction** — enumeration of the objects/frames a binary
//!    kernel covers and their time windows.
//! 5. **Stateful diagnostics** — a last-error message that survives a failed
//!    call until explicitly cleared.
//!
//! Fallible evaluations return `Option`: `None` means the provider failed and
//! left a diagnostic retrievable via
//! [`last_error_message`](EphemerisProvider::last_error_message). Callers are
//! expected to read the message and then
//! [`clear_error_state`](EphemerisProvider::clear_error_state) so later calls
//! start clean. The [`Ephemerist`](crate::ephemerist::Ephemerist) context does
//! this for every failure it translates.
//!
//! Meta-kernels commonly reference sub-files relative to their own directory,
//! so [`load_file`](EphemerisProvider::load_file) receives the kernel's
//! containing directory as an explicit `base_dir` argument; implementations
//! must resolve relative sub-references against it rather than against the
//! process working directory.

use camino::Utf8Path;
use nalgebra::{Matrix3, Vector3};

use crate::constants::{BodyId, Et};

/// The two binary kernel classes for which coverage is indexed, distinguished
/// by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoverageKind {
    /// Position-type data (`.bsp`).
    Position,
    /// Orientation-type data (`.bc`).
    Orientation,
}

impl CoverageKind {
    /// Classify a kernel file extension, case-insensitively. Returns `None`
    /// for text kernels and other unrecognized classes, which carry no
    /// extractable coverage.
    pub fn from_extension(extension: Option<&str>) -> Option<Self> {
        let ext = extension?;
        if ext.eq_ignore_ascii_case("bsp") {
            Some(CoverageKind::Position)
        } else if ext.eq_ignore_ascii_case("bc") {
            Some(CoverageKind::Orientation)
        } else {
            None
        }
    }
}

impl std::fmt::Display for CoverageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoverageKind::Position => write!(f, "position"),
            CoverageKind::Orientation => write!(f, "orientation"),
        }
    }
}

/// Aberration correction applied by the provider during exact evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AberrationKind {
    #[default]
    None,
    LightTime,
    LightTimeStellar,
    ConvergedNewtonian,
    ConvergedNewtonianStellar,
}

/// Direction of the light-time solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AberrationDirection {
    #[default]
    Reception,
    Transmission,
}

/// The (kind, direction) pair selecting an aberration correction, together
/// with its canonical string identifier (`NONE`, `LT`, `LT+S`, `CN`, `CN+S`,
/// and the `X`-prefixed transmission variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AberrationCorrection {
    pub kind: AberrationKind,
    pub direction: AberrationDirection,
}

impl AberrationCorrection {
    pub fn new(kind: AberrationKind, direction: AberrationDirection) -> Self {
        Self { kind, direction }
    }

    /// Parse one of the nine canonical identifiers. Returns `None` for
    /// anything else.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        use AberrationDirection::{Reception, Transmission};
        use AberrationKind::*;
        let (kind, direction) = match identifier {
            "NONE" => (None, Reception),
            "LT" => (LightTime, Reception),
            "LT+S" => (LightTimeStellar, Reception),
            "CN" => (ConvergedNewtonian, Reception),
            "CN+S" => (ConvergedNewtonianStellar, Reception),
            "XLT" => (LightTime, Transmission),
            "XLT+S" => (LightTimeStellar, Transmission),
            "XCN" => (ConvergedNewtonian, Transmission),
            "XCN+S" => (ConvergedNewtonianStellar, Transmission),
            _ => return Option::None,
        };
        Some(Self { kind, direction })
    }

    /// The canonical string identifier for this correction.
    pub fn as_identifier(&self) -> &'static str {
        let reception = self.direction == AberrationDirection::Reception;
        match self.kind {
            AberrationKind::None => "NONE",
            AberrationKind::LightTime => {
                if reception {
                    "LT"
                } else {
                    "XLT"
                }
            }
            AberrationKind::LightTimeStellar => {
                if reception {
                    "LT+S"
                } else {
                    "XLT+S"
                }
            }
            AberrationKind::ConvergedNewtonian => {
                if reception {
                    "CN"
                } else {
                    "XCN"
                }
            }
            AberrationKind::ConvergedNewtonianStellar => {
                if reception {
                    "CN+S"
                } else {
                    "XCN+S"
                }
            }
        }
    }
}

impl std::fmt::Display for AberrationCorrection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_identifier())
    }
}

/// Position of a target relative to an observer, with the one-way light time
/// of the solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetPosition {
    /// Position in kilometers, expressed in the requested reference frame.
    pub position: Vector3<f64>,
    /// One-way light time in seconds.
    pub light_time: f64,
}

impl TargetPosition {
    /// The neutral value substituted under the silent failure policy.
    pub fn zeros() -> Self {
        Self {
            position: Vector3::zeros(),
            light_time: 0.0,
        }
    }
}

/// Position and velocity of a target relative to an observer, with the
/// one-way light time of the solution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetState {
    /// Position in kilometers, expressed in the requested reference frame.
    pub position: Vector3<f64>,
    /// Velocity in kilometers per second.
    pub velocity: Vector3<f64>,
    /// One-way light time in seconds.
    pub light_time: f64,
}

impl TargetState {
    /// The neutral value substituted under the silent failure policy.
    pub fn zeros() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            light_time: 0.0,
        }
    }
}

/// One coverage window extracted from a kernel: the covered identifier and
/// the window's start and end instants.
pub type CoverageEntry = (BodyId, Et, Et);

/// Capability set consumed from the external ephemeris computation engine.
///
/// Exact evaluations take body and frame **names**; the provider performs its
/// own resolution internally. The coverage layer resolves names through
/// [`resolve_identifier`](Self::resolve_identifier) only to key its own
/// interval index.
pub trait EphemerisProvider {
    /// Load a kernel file. `base_dir` is the kernel's containing directory;
    /// relative sub-references inside meta-kernels resolve against it.
    /// Returns `false` on failure, leaving a diagnostic in the error state.
    fn load_file(&mut self, path: &Utf8Path, base_dir: &Utf8Path) -> bool;

    /// Unload a previously loaded kernel file.
    fn unload_file(&mut self, path: &Utf8Path);

    /// Resolve a body or frame name to its integer identifier.
    fn resolve_identifier(&self, name: &str) -> Option<BodyId>;

    /// Position of `target` relative to `observer` at `et`, in `frame`.
    fn exact_position(
        &self,
        target: &str,
        et: Et,
        frame: &str,
        correction: AberrationCorrection,
        observer: &str,
    ) -> Option<TargetPosition>;

    /// Position and velocity of `target` relative to `observer` at `et`, in
    /// `frame`.
    fn exact_state(
        &self,
        target: &str,
        et: Et,
        frame: &str,
        correction: AberrationCorrection,
        observer: &str,
    ) -> Option<TargetState>;

    /// Rotation taking vectors from `from` to `to` at `et`.
    fn exact_transform(&self, from: &str, to: &str, et: Et) -> Option<Matrix3<f64>>;

    /// Enumerate the identifiers covered by a loaded binary kernel of the
    /// given class, with their coverage windows.
    fn extract_coverage(&self, path: &Utf8Path, kind: CoverageKind) -> Option<Vec<CoverageEntry>>;

    /// Diagnostic message of the most recent failure.
    fn last_error_message(&self) -> String;

    /// Clear the internal error state so subsequent calls start clean.
    fn clear_error_state(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aberration_identifiers_round_trip() {
        for id in [
            "NONE", "LT", "LT+S", "CN", "CN+S", "XLT", "XLT+S", "XCN", "XCN+S",
        ] {
            let correction =
                AberrationCorrection::from_identifier(id).expect("identifier should parse");
            assert_eq!(correction.as_identifier(), id);
        }
        assert_eq!(AberrationCorrection::from_identifier("LT-S"), None);
        assert_eq!(AberrationCorrection::from_identifier(""), None);
    }

    #[test]
    fn coverage_kind_from_extension() {
        assert_eq!(
            CoverageKind::from_extension(Some("bsp")),
            Some(CoverageKind::Position)
        );
        assert_eq!(
            CoverageKind::from_extension(Some("BSP")),
            Some(CoverageKind::Position)
        );
        assert_eq!(
            CoverageKind::from_extension(Some("bc")),
            Some(CoverageKind::Orientation)
        );
        assert_eq!(
            CoverageKind::from_extension(Some("BC")),
            Some(CoverageKind::Orientation)
        );
        assert_eq!(CoverageKind::from_extension(Some("tls")), None);
        assert_eq!(CoverageKind::from_extension(None), None);
    }
}
