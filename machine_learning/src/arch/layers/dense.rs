use ndarray::prelude::*;

use crate::{MlErr, Result, arch::activations::ActFn};

/// A fully connected layer, `a = act_fn(x · w + b)`.
///
/// The kernel is stored row-major with shape `(inputs, outputs)`, the same order the
/// weights are laid out in the flat parameter blob.
#[derive(Clone, Debug)]
pub struct Dense {
    w: Array2<f32>,
    b: Array1<f32>,
    act_fn: ActFn,
}

impl Dense {
    /// Creates a new `Dense` layer from raw parameter slices.
    ///
    /// # Arguments
    /// * `dim` - The `(inputs, outputs)` shape of the kernel.
    /// * `kernel` - `inputs * outputs` values in row-major order.
    /// * `bias` - `outputs` values.
    /// * `act_fn` - The activation applied to the affine output.
    ///
    /// # Returns
    /// A new `Dense` instance or a size mismatch error.
    pub fn new(dim: (usize, usize), kernel: &[f32], bias: &[f32], act_fn: ActFn) -> Result<Self> {
        let w = ArrayView2::from_shape(dim, kernel)
            .map_err(|_| MlErr::SizeMismatch {
                a: "kernel",
                b: "kernel shape",
                got: kernel.len(),
                expected: dim.0.saturating_mul(dim.1),
            })?
            .to_owned();

        if bias.len() != dim.1 {
            return Err(MlErr::SizeMismatch {
                a: "bias",
                b: "kernel outputs",
                got: bias.len(),
                expected: dim.1,
            });
        }

        Ok(Self {
            w,
            b: Array1::from(bias.to_vec()),
            act_fn,
        })
    }

    /// Returns the `(inputs, outputs)` shape of this layer.
    pub fn dim(&self) -> (usize, usize) {
        self.w.dim()
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.w.len() + self.b.len()
    }

    pub fn act_fn(&self) -> &ActFn {
        &self.act_fn
    }

    pub fn forward(&self, x: ArrayView1<f32>) -> Result<Array1<f32>> {
        let (inputs, _) = self.dim();
        if x.len() != inputs {
            return Err(MlErr::SizeMismatch {
                a: "input",
                b: "layer inputs",
                got: x.len(),
                expected: inputs,
            });
        }

        let z = x.dot(&self.w) + &self.b;
        Ok(self.act_fn.apply(z))
    }
}
