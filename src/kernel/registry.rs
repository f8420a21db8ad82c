//! # Kernel registry
//!
//! Bookkeeping for loaded kernel files: canonical paths, stable handles, and
//! reference counts. The registry tracks *interest* in a kernel, not the
//! kernel data itself — the ephemeris provider owns the loaded data, and the
//! [`Ephemerist`](crate::ephemerist::Ephemerist) façade invokes the
//! provider's load/unload primitives around the registry's acquire/release
//! operations.
//!
//! Handles start at 1, grow monotonically, and are never reused for the
//! lifetime of a registry, so a stale handle can never alias a newer kernel.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

use crate::ephemerist_errors::EphemeristError;

/// Stable identifier of a loaded kernel. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelHandle(u32);

impl KernelHandle {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for KernelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tracked kernel: canonical path, handle, and the number of outstanding
/// logical interests.
#[derive(Debug, Clone)]
struct KernelRecord {
    path: Utf8PathBuf,
    handle: KernelHandle,
    refs: u32,
}

/// Outcome of a release operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KernelRelease {
    /// The last interest was dropped; the kernel must be unloaded from the
    /// provider. Carries the canonical path.
    Unloaded(Utf8PathBuf),
    /// Other interests remain; carries the remaining count.
    Retained(u32),
}

#[derive(Debug, Clone, Default)]
pub struct KernelRegistry {
    records: Vec<KernelRecord>,
    last_assigned: u32,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the reference count of an already-tracked canonical path and
    /// return its handle, or `None` if the path is not tracked.
    pub(crate) fn acquire_existing(&mut self, path: &Utf8Path) -> Option<KernelHandle> {
        let record = self.records.iter_mut().find(|record| record.path == path)?;
        record.refs += 1;
        Some(record.handle)
    }

    /// Track a freshly loaded kernel with a new handle and a count of 1.
    pub(crate) fn insert(&mut self, path: Utf8PathBuf) -> KernelHandle {
        self.last_assigned += 1;
        let handle = KernelHandle(self.last_assigned);
        self.records.push(KernelRecord {
            path,
            handle,
            refs: 1,
        });
        handle
    }

    /// Release one interest by handle.
    ///
    /// Return
    /// ----------
    /// * [`KernelRelease::Unloaded`] with the path when the count reached
    ///   zero and the record was removed, [`KernelRelease::Retained`]
    ///   otherwise, or [`EphemeristError::UnknownHandle`] if no record
    ///   currently holds the handle.
    pub(crate) fn release_by_handle(
        &mut self,
        handle: KernelHandle,
    ) -> Result<KernelRelease, EphemeristError> {
        let position = self
            .records
            .iter()
            .position(|record| record.handle == handle)
            .ok_or(EphemeristError::UnknownHandle(handle))?;
        Ok(self.release_at(position))
    }

    /// Release one interest by canonical path.
    pub(crate) fn release_by_path(
        &mut self,
        path: &Utf8Path,
    ) -> Result<KernelRelease, EphemeristError> {
        let position = self
            .records
            .iter()
            .position(|record| record.path == path)
            .ok_or_else(|| EphemeristError::UnknownKernel(path.to_owned()))?;
        Ok(self.release_at(position))
    }

    fn release_at(&mut self, position: usize) -> KernelRelease {
        if self.records[position].refs == 1 {
            let record = self.records.remove(position);
            KernelRelease::Unloaded(record.path)
        } else {
            let record = &mut self.records[position];
            record.refs -= 1;
            KernelRelease::Retained(record.refs)
        }
    }

    /// Canonical paths of all tracked kernels, in load order.
    pub fn loaded_paths(&self) -> Vec<Utf8PathBuf> {
        self.records.iter().map(|record| record.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Canonicalize a kernel path for loading.
///
/// Fails with [`EphemeristError::InvalidPath`] if the file does not exist or
/// its parent directory does not exist; these indicate caller errors and are
/// never silenced.
pub(crate) fn canonical_kernel_path(path: &Utf8Path) -> Result<Utf8PathBuf, EphemeristError> {
    if !path.is_file() {
        return Err(EphemeristError::InvalidPath(format!(
            "file '{path}' does not exist"
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() && !parent.is_dir() {
            return Err(EphemeristError::InvalidPath(format!(
                "file '{path}' exists, but directory '{parent}' does not"
            )));
        }
    }
    path.canonicalize_utf8()
        .map_err(|err| EphemeristError::InvalidPath(format!("unable to canonicalize '{path}': {err}")))
}

/// Normalize a path for unload-by-path lookup. Unlike
/// [`canonical_kernel_path`] this never fails: a path that cannot be
/// canonicalized (e.g. it no longer exists) is matched as given, and simply
/// finds no record.
pub(crate) fn normalized_lookup_path(path: &Utf8Path) -> Utf8PathBuf {
    path.canonicalize_utf8().unwrap_or_else(|_| path.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_monotonic_and_never_reused() {
        let mut registry = KernelRegistry::new();
        let first = registry.insert("/data/a.bsp".into());
        let second = registry.insert("/data/b.bsp".into());
        assert!(first.get() >= 1);
        assert!(second > first);

        assert_eq!(
            registry.release_by_handle(first),
            Ok(KernelRelease::Unloaded("/data/a.bsp".into()))
        );
        let third = registry.insert("/data/c.bsp".into());
        assert!(third > second);
    }

    #[test]
    fn refcount_release_sequence() {
        let mut registry = KernelRegistry::new();
        let handle = registry.insert("/data/a.bsp".into());
        assert_eq!(registry.acquire_existing(Utf8Path::new("/data/a.bsp")), Some(handle));

        assert_eq!(
            registry.release_by_handle(handle),
            Ok(KernelRelease::Retained(1))
        );
        assert_eq!(
            registry.release_by_handle(handle),
            Ok(KernelRelease::Unloaded("/data/a.bsp".into()))
        );
        assert_eq!(
            registry.release_by_handle(handle),
            Err(EphemeristError::UnknownHandle(handle))
        );
    }

    #[test]
    fn release_by_unknown_path() {
        let mut registry = KernelRegistry::new();
        registry.insert("/data/a.bsp".into());
        assert_eq!(
            registry.release_by_path(Utf8Path::new("/data/missing.bsp")),
            Err(EphemeristError::UnknownKernel("/data/missing.bsp".into()))
        );
    }

    #[test]
    fn loaded_paths_in_load_order() {
        let mut registry = KernelRegistry::new();
        registry.insert("/data/a.bsp".into());
        registry.insert("/data/b.bc".into());
        assert_eq!(
            registry.loaded_paths(),
            vec![
                Utf8PathBuf::from("/data/a.bsp"),
                Utf8PathBuf::from("/data/b.bc")
            ]
        );
    }
}
