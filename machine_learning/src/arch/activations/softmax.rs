use ndarray::Array1;

/// Normalized exponential, turns raw scores into a probability distribution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Softmax;

impl Softmax {
    pub fn normalize(&self, mut z: Array1<f32>) -> Array1<f32> {
        // Shift by the max so `exp` never overflows, the result is unchanged.
        let max = z.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
        z.mapv_inplace(|v| (v - max).exp());

        let sum = z.sum();
        z /= sum;
        z
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn sums_to_one() {
        let p = Softmax.normalize(array![1.0, 2.0, 3.0, -4.0]);
        assert!((p.sum() - 1.0).abs() < 1e-6);
        assert!(p[2] > p[1] && p[1] > p[0] && p[0] > p[3]);
    }

    #[test]
    fn large_scores_do_not_overflow() {
        let p = Softmax.normalize(array![1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-6);
        assert!((p[1] - 0.5).abs() < 1e-6);
    }
}
