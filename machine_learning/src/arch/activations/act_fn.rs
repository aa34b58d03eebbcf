use ndarray::Array1;

use super::{Relu, Softmax};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActFn {
    Relu(Relu),
    Softmax(Softmax),
}

impl ActFn {
    pub fn relu() -> Self {
        Self::Relu(Relu)
    }

    pub fn softmax() -> Self {
        Self::Softmax(Softmax)
    }

    /// Applies the activation over a whole pre-activation vector.
    ///
    /// Element-wise activations map each value independently, vector activations (softmax)
    /// need the full row to normalize it.
    pub fn apply(&self, z: Array1<f32>) -> Array1<f32> {
        match self {
            Self::Relu(a) => z.mapv_into(|z| a.f(z)),
            Self::Softmax(a) => a.normalize(z),
        }
    }
}
