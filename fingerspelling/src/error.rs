use std::{error::Error, fmt, io};

use machine_learning::MlErr;

use crate::composer::ComposeErr;

/// The fingerspelling module's result type.
pub type Result<T> = std::result::Result<T, FingerspellErr>;

/// Everything that can go wrong while running a recognition session.
#[derive(Debug)]
pub enum FingerspellErr {
    /// A model, layout or labels source could not be read or parsed.
    ModelLoad(String),
    /// The model sources were read but describe an inconsistent network.
    ModelCorrupt(String),
    /// The camera could not be acquired, the caller may try again.
    CameraAccess(String),
    /// The configuration is out of its accepted ranges.
    InvalidConfig(String),
    /// The text buffer refused a mutation.
    Compose(ComposeErr),
    /// An underlying I/O error not covered by the above variants.
    Io(io::Error),
}

impl FingerspellErr {
    /// Returns whether the error ends the session for good.
    ///
    /// Model failures leave nothing to recognize with and are never retried, the camera
    /// can be requested again.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ModelLoad(_) | Self::ModelCorrupt(_))
    }
}

impl fmt::Display for FingerspellErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModelLoad(msg) => write!(f, "model load error: {msg}"),
            Self::ModelCorrupt(msg) => write!(f, "model corrupt: {msg}"),
            Self::CameraAccess(msg) => write!(f, "camera access error: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Compose(e) => write!(f, "compose error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for FingerspellErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Compose(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for FingerspellErr {
    fn from(e: MlErr) -> Self {
        if e.is_corrupt() {
            Self::ModelCorrupt(e.to_string())
        } else {
            Self::ModelLoad(e.to_string())
        }
    }
}

impl From<ComposeErr> for FingerspellErr {
    fn from(e: ComposeErr) -> Self {
        Self::Compose(e)
    }
}

impl From<io::Error> for FingerspellErr {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
