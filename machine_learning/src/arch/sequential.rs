use ndarray::{Array1, ArrayView1};

use super::layers::Dense;
use crate::{MlErr, Result};

/// A sequential model: information flows forward through its layers, the output of each
/// layer being the input of the next one.
#[derive(Clone, Debug)]
pub struct Sequential {
    layers: Vec<Dense>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance, or an error if the list is empty or two adjacent layers
    /// disagree on their shared width.
    pub fn new<I>(layers: I) -> Result<Self>
    where
        I: IntoIterator<Item = Dense>,
    {
        let layers: Vec<Dense> = layers.into_iter().collect();

        if layers.is_empty() {
            return Err(MlErr::SizeMismatch {
                a: "layers",
                b: "minimum layers",
                got: 0,
                expected: 1,
            });
        }

        for pair in layers.windows(2) {
            let (_, prev_out) = pair[0].dim();
            let (next_in, _) = pair[1].dim();

            if prev_out != next_in {
                return Err(MlErr::SizeMismatch {
                    a: "layer inputs",
                    b: "previous layer outputs",
                    got: next_in,
                    expected: prev_out,
                });
            }
        }

        Ok(Self { layers })
    }

    /// Returns the amount of parameters in the model.
    pub fn size(&self) -> usize {
        self.layers.iter().map(Dense::size).sum()
    }

    pub fn input_width(&self) -> usize {
        self.layers[0].dim().0
    }

    pub fn output_width(&self) -> usize {
        self.layers[self.layers.len() - 1].dim().1
    }

    pub fn layers(&self) -> &[Dense] {
        &self.layers
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `x` - A single input sample.
    ///
    /// # Returns
    /// The output of the last layer or an error if the input has the wrong width.
    pub fn forward(&self, x: ArrayView1<f32>) -> Result<Array1<f32>> {
        let mut layers = self.layers.iter();

        // SAFETY: `new` refuses to build an empty model.
        let mut a = layers.next().unwrap().forward(x)?;
        for layer in layers {
            a = layer.forward(a.view())?;
        }

        Ok(a)
    }
}
