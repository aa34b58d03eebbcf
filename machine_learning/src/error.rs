use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    /// A model source could not be read at all.
    Unreachable {
        what: &'static str,
        source: io::Error,
    },
    /// A model source was read but its contents could not be parsed.
    Malformed {
        what: &'static str,
        detail: String,
    },
    /// Two sizes that must agree do not.
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    /// The parameter cursor was asked for more values than remain in the blob.
    Truncated {
        layer: String,
        requested: usize,
        remaining: usize,
    },
    /// The parameter cursor still holds values after every layer was consumed.
    TrailingParams { remaining: usize },
}

impl MlErr {
    /// Tells apart a structurally inconsistent model from a source that could not be
    /// read or parsed.
    ///
    /// # Returns
    /// `true` if the sources were readable but describe an inconsistent network.
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            MlErr::SizeMismatch { .. } | MlErr::Truncated { .. } | MlErr::TrailingParams { .. }
        )
    }
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::Unreachable { what, source } => write!(f, "cannot read {what}: {source}"),
            MlErr::Malformed { what, detail } => write!(f, "malformed {what}: {detail}"),
            MlErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
            ),
            MlErr::Truncated {
                layer,
                requested,
                remaining,
            } => write!(
                f,
                "weight blob ended early while reading layer {layer}: requested {requested} values, {remaining} left"
            ),
            MlErr::TrailingParams { remaining } => write!(
                f,
                "weight blob has {remaining} values left over after the last layer"
            ),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Unreachable { source, .. } => Some(source),
            _ => None,
        }
    }
}
