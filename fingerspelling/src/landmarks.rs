use serde::{Deserialize, Serialize};

use crate::labels::Token;

/// Points the landmark extractor reports per hand.
pub const NUM_LANDMARKS: usize = 21;
/// Width of the classifier input, `(x, y)` of every landmark.
pub const FEATURE_LEN: usize = NUM_LANDMARKS * 2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

/// One detected hand as reported by the landmark extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hand {
    /// Image space points normalized to `[0, 1]`, only used for display.
    pub landmarks: [Landmark; NUM_LANDMARKS],
    /// Metric scale points, the classifier input.
    pub world_landmarks: [Landmark; NUM_LANDMARKS],
}

/// The classifier input derived from one hand in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f32; FEATURE_LEN]);

impl FeatureVector {
    /// Flattens the world landmarks, in index order, into `[x0, y0, x1, y1, ...]`.
    pub fn from_world(world: &[Landmark; NUM_LANDMARKS]) -> Self {
        let mut values = [0.; FEATURE_LEN];
        for (pair, lm) in values.chunks_exact_mut(2).zip(world) {
            pair[0] = lm.x;
            pair[1] = lm.y;
        }

        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<[f32; FEATURE_LEN]> for FeatureVector {
    fn from(values: [f32; FEATURE_LEN]) -> Self {
        Self(values)
    }
}

/// What the pipeline concluded about one video frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub token: Option<Token>,
    /// Integer percentage in `0..=100`.
    pub confidence: u8,
    pub landmarks: Option<Vec<Landmark>>,
    pub world_landmarks: Option<Vec<Landmark>>,
}

impl DetectionResult {
    /// The result of a frame without a hand in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The predicted label, empty when there is none.
    pub fn letter(&self) -> String {
        self.token.map(|t| t.to_string()).unwrap_or_default()
    }

    pub fn has_hand(&self) -> bool {
        self.landmarks.is_some()
    }
}
