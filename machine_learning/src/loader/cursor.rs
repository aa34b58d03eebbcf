use crate::{MlErr, Result};

/// A forward-only reader over the flat weight blob.
///
/// Every read is bounds checked, so a blob that is too short fails on the layer that runs
/// out of values, and `finish` fails if values are left once the last layer was read.
pub struct ParamCursor<'a> {
    params: &'a [f32],
    pos: usize,
}

impl<'a> ParamCursor<'a> {
    pub fn new(params: &'a [f32]) -> Self {
        Self { params, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.params.len() - self.pos
    }

    /// Takes the next `n` values and advances the cursor past them.
    ///
    /// # Arguments
    /// * `layer` - Name of the layer being read, for error reporting.
    /// * `n` - Amount of values to take.
    pub fn take(&mut self, layer: &str, n: usize) -> Result<&'a [f32]> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(MlErr::Truncated {
                layer: layer.to_string(),
                requested: n,
                remaining,
            });
        }

        let start = self.pos;
        self.pos += n;
        Ok(&self.params[start..self.pos])
    }

    /// Consumes the cursor, checking that it landed exactly at the end of the blob.
    pub fn finish(self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(MlErr::TrailingParams { remaining }),
        }
    }
}
