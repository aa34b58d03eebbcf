use std::path::{Path, PathBuf};

use log::info;
use machine_learning::{arch::Sequential, loader};
use ndarray::{Array1, ArrayView1};

use crate::{
    error::{FingerspellErr, Result},
    labels::{Labels, Token},
    landmarks::{FEATURE_LEN, FeatureVector},
};

/// Output width of the letter network, 26 letters plus `space` and `back`.
pub const NUM_CLASSES: usize = 28;

/// Where the three model assets live.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub weights: PathBuf,
    pub layout: PathBuf,
    pub labels: PathBuf,
}

impl ModelPaths {
    /// The conventional asset names inside a model directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            weights: dir.join("weights.bin"),
            layout: dir.join("weights_info.json"),
            labels: dir.join("labels.json"),
        }
    }
}

/// The most likely class of one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prediction {
    pub token: Token,
    /// `round(max_probability * 100)`.
    pub confidence: u8,
}

/// Anything able to turn a feature vector into a letter.
pub trait Predict {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction>;
}

/// The letter network together with the names of its classes.
#[derive(Debug, Clone)]
pub struct Classifier {
    model: Sequential,
    labels: Labels,
}

impl Classifier {
    /// Pairs a loaded network with its labels.
    ///
    /// # Errors
    /// `ModelCorrupt` if the network does not map `FEATURE_LEN` inputs to `NUM_CLASSES`
    /// outputs or the label count differs from the output width.
    pub fn new(model: Sequential, labels: Labels) -> Result<Self> {
        let check = |what: &str, got: usize, expected: usize| {
            if got == expected {
                Ok(())
            } else {
                Err(FingerspellErr::ModelCorrupt(format!(
                    "{what} is {got}, expected {expected}"
                )))
            }
        };

        check("model input width", model.input_width(), FEATURE_LEN)?;
        check("model output width", model.output_width(), NUM_CLASSES)?;
        check("label count", labels.len(), NUM_CLASSES)?;

        Ok(Self { model, labels })
    }

    /// Loads the network, its layout and its labels from disk.
    pub fn load(paths: &ModelPaths) -> Result<Self> {
        let labels = Labels::from_file(&paths.labels)?;
        let model = loader::load_files(&paths.weights, &paths.layout)?;
        let classifier = Self::new(model, labels)?;

        info!(classes = classifier.labels.len(); "classifier ready");
        Ok(classifier)
    }

    /// Runs one forward pass.
    ///
    /// # Returns
    /// The probability of each of the `NUM_CLASSES` classes.
    pub fn classify(&self, features: &FeatureVector) -> Result<Array1<f32>> {
        let x = ArrayView1::from(features.as_slice());
        Ok(self.model.forward(x)?)
    }
}

impl Predict for Classifier {
    fn predict(&self, features: &FeatureVector) -> Result<Prediction> {
        let probabilities = self.classify(features)?;

        // First maximum wins on ties.
        let (index, max) = probabilities
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &p)| {
                if p > best.1 { (i, p) } else { best }
            });

        // SAFETY: `new` checked the label count against the output width.
        let token = self.labels.get(index).unwrap();
        let confidence = (max * 100.).round().clamp(0., 100.) as u8;

        Ok(Prediction { token, confidence })
    }
}
