#![allow(dead_code)]

//! Shared test fixtures: a scripted ephemeris provider and on-disk kernel
//! files.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use camino::{Utf8Path, Utf8PathBuf};
use nalgebra::{Matrix3, Vector3};
use tempfile::TempDir;

use ephemerist::constants::{BodyId, Et};
use ephemerist::provider::{
    AberrationCorrection, CoverageEntry, CoverageKind, EphemerisProvider, TargetPosition,
    TargetState,
};

/// Create a dummy kernel file on disk and return its canonical path.
pub fn kernel_fixture(dir: &TempDir, name: &str) -> Utf8PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"mock kernel payload").expect("fixture write");
    let canonical = path.canonicalize().expect("fixture canonicalize");
    Utf8PathBuf::from_path_buf(canonical).expect("fixture path is UTF-8")
}

/// A deterministic, scripted stand-in for the external computation engine.
///
/// Every evaluation is a fixed analytic function of the identifier and the
/// instant, so tests can compute expected values independently. Calls are
/// recorded through interior mutability, since the trait's evaluation
/// methods take `&self`.
#[derive(Debug, Default)]
pub struct MockProvider {
    identifiers: HashMap<String, BodyId>,
    /// Coverage scripted per (file name, kind).
    coverage: HashMap<(String, CoverageKind), Vec<CoverageEntry>>,
    /// Closed intervals in which `exact_transform` succeeds.
    transform_windows: Vec<(Et, Et)>,
    failing_loads: HashSet<String>,
    pub fail_positions: Cell<bool>,
    pub load_calls: RefCell<Vec<(Utf8PathBuf, Utf8PathBuf)>>,
    pub unload_calls: RefCell<Vec<Utf8PathBuf>>,
    pub extract_calls: RefCell<Vec<(Utf8PathBuf, CoverageKind)>>,
    pub position_calls: RefCell<Vec<(String, Et)>>,
    error_message: RefCell<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifier(mut self, name: &str, id: BodyId) -> Self {
        self.identifiers.insert(name.to_string(), id);
        self
    }

    pub fn with_coverage(
        mut self,
        file_name: &str,
        kind: CoverageKind,
        entries: Vec<CoverageEntry>,
    ) -> Self {
        self.coverage.insert((file_name.to_string(), kind), entries);
        self
    }

    pub fn with_transform_window(mut self, start: Et, end: Et) -> Self {
        self.transform_windows.push((start, end));
        self
    }

    pub fn with_failing_load(mut self, file_name: &str) -> Self {
        self.failing_loads.insert(file_name.to_string());
        self
    }

    /// Barycentric position of a body: linear in `et` so interpolation is
    /// exactly checkable.
    pub fn body_position(id: BodyId, et: Et) -> Vector3<f64> {
        Vector3::new(1000.0 * id as f64 + et, 2.0 * et, -et)
    }

    pub fn body_velocity(id: BodyId, et: Et) -> Vector3<f64> {
        Vector3::new(et / 10.0, id as f64, 3.0)
    }

    pub fn relative_position(target: BodyId, observer: BodyId, et: Et) -> Vector3<f64> {
        Self::body_position(target, et) - Self::body_position(observer, et)
    }

    pub fn relative_velocity(target: BodyId, observer: BodyId, et: Et) -> Vector3<f64> {
        Self::body_velocity(target, et) - Self::body_velocity(observer, et)
    }

    pub fn light_time_for(target: BodyId, et: Et) -> f64 {
        0.001 * et + target as f64
    }

    pub fn transform_at(et: Et) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::new(1.0 + 0.001 * et, 1.0 - 0.001 * et, 1.0))
    }

    fn set_error(&self, message: &str) {
        *self.error_message.borrow_mut() = message.to_string();
    }

    fn resolve_pair(&self, target: &str, observer: &str) -> Option<(BodyId, BodyId)> {
        match (
            self.identifiers.get(target),
            self.identifiers.get(observer),
        ) {
            (Some(&target_id), Some(&observer_id)) => Some((target_id, observer_id)),
            _ => {
                self.set_error("unresolvable body name");
                None
            }
        }
    }

    fn transform_defined_at(&self, et: Et) -> bool {
        self.transform_windows
            .iter()
            .any(|&(start, end)| start <= et && et <= end)
    }
}

impl EphemerisProvider for MockProvider {
    fn load_file(&mut self, path: &Utf8Path, base_dir: &Utf8Path) -> bool {
        self.load_calls
            .borrow_mut()
            .push((path.to_owned(), base_dir.to_owned()));
        let failing = path
            .file_name()
            .is_some_and(|name| self.failing_loads.contains(name));
        if failing {
            self.set_error("corrupt kernel file");
        }
        !failing
    }

    fn unload_file(&mut self, path: &Utf8Path) {
        self.unload_calls.borrow_mut().push(path.to_owned());
    }

    fn resolve_identifier(&self, name: &str) -> Option<BodyId> {
        self.identifiers.get(name).copied()
    }

    fn exact_position(
        &self,
        target: &str,
        et: Et,
        _frame: &str,
        _correction: AberrationCorrection,
        observer: &str,
    ) -> Option<TargetPosition> {
        let (target_id, observer_id) = self.resolve_pair(target, observer)?;
        if self.fail_positions.get() {
            self.set_error("no ephemeris data at requested epoch");
            return None;
        }
        self.position_calls
            .borrow_mut()
            .push((target.to_string(), et));
        Some(TargetPosition {
            position: Self::relative_position(target_id, observer_id, et),
            light_time: Self::light_time_for(target_id, et),
        })
    }

    fn exact_state(
        &self,
        target: &str,
        et: Et,
        _frame: &str,
        _correction: AberrationCorrection,
        observer: &str,
    ) -> Option<TargetState> {
        let (target_id, observer_id) = self.resolve_pair(target, observer)?;
        if self.fail_positions.get() {
            self.set_error("no ephemeris data at requested epoch");
            return None;
        }
        Some(TargetState {
            position: Self::relative_position(target_id, observer_id, et),
            velocity: Self::relative_velocity(target_id, observer_id, et),
            light_time: Self::light_time_for(target_id, et),
        })
    }

    fn exact_transform(&self, from: &str, to: &str, et: Et) -> Option<Matrix3<f64>> {
        if self.identifiers.get(from).is_none() || self.identifiers.get(to).is_none() {
            self.set_error("unresolvable frame name");
            return None;
        }
        if !self.transform_defined_at(et) {
            self.set_error("no orientation data at requested epoch");
            return None;
        }
        Some(Self::transform_at(et))
    }

    fn extract_coverage(&self, path: &Utf8Path, kind: CoverageKind) -> Option<Vec<CoverageEntry>> {
        self.extract_calls
            .borrow_mut()
            .push((path.to_owned(), kind));
        let file_name = path.file_name()?.to_string();
        Some(
            self.coverage
                .get(&(file_name, kind))
                .cloned()
                .unwrap_or_default(),
        )
    }

    fn last_error_message(&self) -> String {
        self.error_message.borrow().clone()
    }

    fn clear_error_state(&mut self) {
        self.error_message.borrow_mut().clear();
    }
}
