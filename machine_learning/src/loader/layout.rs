use serde::{Deserialize, Serialize};

use crate::{MlErr, Result};

/// The shapes of one dense layer as described by the layout document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub kernel_shape: [usize; 2],
    pub bias_shape: [usize; 1],
}

impl LayerSpec {
    pub fn inputs(&self) -> usize {
        self.kernel_shape[0]
    }

    pub fn outputs(&self) -> usize {
        self.kernel_shape[1]
    }

    /// # Errors
    /// `MlErr::Malformed` if the declared shape does not fit in a `usize`.
    pub fn kernel_size(&self) -> Result<usize> {
        self.inputs()
            .checked_mul(self.outputs())
            .ok_or_else(|| self.too_large())
    }

    /// Amount of values this layer consumes from the weight blob.
    pub fn size(&self) -> Result<usize> {
        self.kernel_size()?
            .checked_add(self.bias_shape[0])
            .ok_or_else(|| self.too_large())
    }

    fn too_large(&self) -> MlErr {
        MlErr::Malformed {
            what: "layer layout",
            detail: format!(
                "layer {} declares {:?} + {:?}, more values than can be addressed",
                self.name, self.kernel_shape, self.bias_shape
            ),
        }
    }
}

/// Ordered layer shapes, the whole network description besides the raw weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerLayout {
    pub layers: Vec<LayerSpec>,
}

impl LayerLayout {
    /// Parses the layout document.
    ///
    /// # Errors
    /// `MlErr::Malformed` if the document is not valid JSON of the expected shape or lists
    /// no layers.
    pub fn from_json(doc: &str) -> Result<Self> {
        let layout: Self = serde_json::from_str(doc).map_err(|e| MlErr::Malformed {
            what: "layer layout",
            detail: e.to_string(),
        })?;

        if layout.layers.is_empty() {
            return Err(MlErr::Malformed {
                what: "layer layout",
                detail: "no layers declared".into(),
            });
        }

        Ok(layout)
    }

    /// Total amount of values the weight blob must hold for this layout.
    ///
    /// # Errors
    /// `MlErr::Malformed` if the total does not fit in a `usize`.
    pub fn num_params(&self) -> Result<usize> {
        self.layers.iter().try_fold(0usize, |total, layer| {
            total.checked_add(layer.size()?).ok_or_else(|| MlErr::Malformed {
                what: "layer layout",
                detail: "total parameter count overflows".into(),
            })
        })
    }

    /// Checks the declared shapes agree with each other.
    ///
    /// Every bias must be as wide as its kernel's outputs and every kernel must take as
    /// many inputs as the previous layer outputs.
    pub fn validate(&self) -> Result<()> {
        self.num_params()?;

        let mut prev_out = None;

        for layer in &self.layers {
            if layer.bias_shape[0] != layer.outputs() {
                return Err(MlErr::SizeMismatch {
                    a: "bias shape",
                    b: "kernel outputs",
                    got: layer.bias_shape[0],
                    expected: layer.outputs(),
                });
            }

            match prev_out {
                Some(prev_out) if layer.inputs() != prev_out => {
                    return Err(MlErr::SizeMismatch {
                        a: "kernel inputs",
                        b: "previous layer outputs",
                        got: layer.inputs(),
                        expected: prev_out,
                    });
                }
                _ => {}
            }

            prev_out = Some(layer.outputs());
        }

        Ok(())
    }
}
