use camino::Utf8PathBuf;
use thiserror::Error;

use crate::constants::{BodyId, Et};
use crate::kernel::KernelHandle;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EphemeristError {
    #[error("Invalid kernel path: {0}")]
    InvalidPath(String),

    #[error("Unknown kernel handle: {0}")]
    UnknownHandle(KernelHandle),

    #[error("'{0}' did not correspond to a loaded kernel")]
    UnknownKernel(Utf8PathBuf),

    #[error("No coverage data recorded for identifier {0}")]
    NoCoverageData(BodyId),

    #[error("Neither target {target} nor observer {observer} has coverage at time {et}")]
    NoCoverage {
        target: BodyId,
        observer: BodyId,
        et: Et,
    },

    #[error("Ephemeris provider failure: {0}")]
    ProviderFailure(String),

    #[error("Unable to parse epoch: {0}")]
    InvalidEpoch(String),
}
