use std::time::Duration;

use log::warn;
use tokio::time::Instant;

use crate::{
    classifier::Predict,
    error::Result,
    landmarks::{DetectionResult, FeatureVector, Hand},
};

/// A capture backend the sampler can read frames from.
pub trait VideoSource {
    type Frame;

    /// Whether a decodable frame is available right now.
    fn ready(&self) -> bool;

    /// Playback timestamp of the current frame, in seconds.
    fn current_time(&self) -> f64;

    /// The frame at `current_time`. Only called while `ready` holds.
    fn frame(&self) -> &Self::Frame;

    /// Whether the source will never produce another frame.
    fn ended(&self) -> bool {
        false
    }
}

/// Finds at most one hand in a frame.
///
/// `timestamp` is monotonic over the lifetime of the extractor.
pub trait LandmarkExtractor<F> {
    fn detect(&mut self, frame: &F, timestamp: Duration) -> Result<Option<Hand>>;
}

/// Runs the extractor and the classifier on every new video frame.
pub struct FrameSampler<E> {
    extractor: E,
    last_time: Option<f64>,
    epoch: Instant,
}

impl<E> FrameSampler<E> {
    pub fn new(extractor: E, epoch: Instant) -> Self {
        Self {
            extractor,
            last_time: None,
            epoch,
        }
    }

    /// Forgets the last processed frame, so the next call samples whatever is on display.
    pub fn reset(&mut self) {
        self.last_time = None;
    }

    /// Performs one detection cycle.
    ///
    /// # Args
    /// * `video` - The source to read the current frame from.
    /// * `model` - The classifier.
    /// * `now` - The current tick, used to timestamp the frame for the extractor.
    ///
    /// # Returns
    /// The new result, or `None` when there was no new frame to look at or the pipeline
    /// failed on it. A failed frame leaves the previous result in place.
    pub fn sample<V>(&mut self, video: &V, model: &dyn Predict, now: Instant) -> Option<DetectionResult>
    where
        V: VideoSource,
        E: LandmarkExtractor<V::Frame>,
    {
        if !video.ready() {
            return None;
        }

        let time = video.current_time();
        if self.last_time == Some(time) {
            return None;
        }
        self.last_time = Some(time);

        let timestamp = now.saturating_duration_since(self.epoch);
        match self.detect(video.frame(), timestamp, model) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("missed frame at {time:.3}s: {e}");
                None
            }
        }
    }

    fn detect<F>(&mut self, frame: &F, timestamp: Duration, model: &dyn Predict) -> Result<DetectionResult>
    where
        E: LandmarkExtractor<F>,
    {
        let Some(hand) = self.extractor.detect(frame, timestamp)? else {
            return Ok(DetectionResult::empty());
        };

        let features = FeatureVector::from_world(&hand.world_landmarks);
        let prediction = model.predict(&features)?;

        Ok(DetectionResult {
            token: Some(prediction.token),
            confidence: prediction.confidence,
            landmarks: Some(hand.landmarks.to_vec()),
            world_landmarks: Some(hand.world_landmarks.to_vec()),
        })
    }
}
