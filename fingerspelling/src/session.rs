use log::{debug, info};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::{
    camera::{CameraSlot, MediaStream},
    classifier::Predict,
    composer::{Feedback, LogFeedback, TextComposer},
    config::RecognizerConfig,
    error::Result,
    labels::Token,
    landmarks::{DetectionResult, Landmark},
    sampler::{FrameSampler, LandmarkExtractor, VideoSource},
    stabilizer::StabilizationController,
    state::{DetectionState, Thresholds},
};

/// One recognition session, from camera start to teardown.
///
/// Every frame tick feeds the same freshly sampled result to the state resolver and to the
/// stabilization controller. Nothing here reads the clock, callers pass the tick instant.
pub struct Session<E> {
    config: RecognizerConfig,
    thresholds: Thresholds,
    model: Option<Box<dyn Predict>>,
    sampler: FrameSampler<E>,
    controller: StabilizationController,
    composer: TextComposer,
    /// The haptic actuator while vibration is turned off.
    muted: Option<Box<dyn Feedback>>,
    camera: CameraSlot,
    latest: Option<DetectionResult>,
    cancel: CancellationToken,
}

impl<E> Session<E> {
    /// Creates a session waiting for its model.
    ///
    /// # Args
    /// * `config` - The validated user options.
    /// * `extractor` - The landmark extractor frames are handed to.
    /// * `now` - Start of the session, the origin of extractor timestamps.
    pub fn new(config: RecognizerConfig, extractor: E, now: Instant) -> Self {
        let mut session = Self {
            controller: StabilizationController::new(config.auto_add_delay()),
            sampler: FrameSampler::new(extractor, now),
            thresholds: Thresholds::default(),
            model: None,
            composer: TextComposer::new(),
            muted: None,
            camera: CameraSlot::new(),
            latest: None,
            cancel: CancellationToken::new(),
            config,
        };
        session.install_feedback(Box::new(LogFeedback));
        session
    }

    /// Replaces the haptic actuator. It only pulses while vibration feedback is on.
    pub fn with_feedback(mut self, feedback: Box<dyn Feedback>) -> Self {
        self.install_feedback(feedback);
        self
    }

    fn install_feedback(&mut self, feedback: Box<dyn Feedback>) {
        if self.config.vibration_feedback() {
            self.composer.set_feedback(Some(feedback));
        } else {
            self.muted = Some(feedback);
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Hands over the loaded classifier, the session leaves the loading state.
    pub fn set_model(&mut self, model: Box<dyn Predict>) {
        self.model = Some(model);
        info!("model ready");
    }

    pub fn model_ready(&self) -> bool {
        self.model.is_some()
    }

    /// Applies new user options. A change of delay restarts the auto-add session.
    pub fn set_config(&mut self, config: RecognizerConfig) {
        if config.auto_add_delay() != self.config.auto_add_delay() {
            self.controller.set_delay(config.auto_add_delay());
        }
        match (self.config.vibration_feedback(), config.vibration_feedback()) {
            (true, false) => self.muted = self.composer.take_feedback(),
            (false, true) => self.composer.set_feedback(self.muted.take()),
            _ => {}
        }
        self.config = config;
    }

    pub fn config(&self) -> &RecognizerConfig {
        &self.config
    }

    pub fn set_auto_mode(&mut self, auto_mode: bool) {
        self.controller.set_auto_mode(auto_mode);
        debug!("auto mode {}", if auto_mode { "on" } else { "off" });
    }

    pub fn is_auto_mode(&self) -> bool {
        self.controller.is_auto_mode()
    }

    /// Runs one frame tick.
    ///
    /// # Returns
    /// Whether a new detection result was produced.
    pub fn on_frame<V>(&mut self, video: &V, now: Instant) -> bool
    where
        V: VideoSource,
        E: LandmarkExtractor<V::Frame>,
    {
        if self.is_stopped() {
            return false;
        }

        let Some(model) = self.model.as_deref() else {
            return false;
        };

        let Some(result) = self.sampler.sample(video, model, now) else {
            return false;
        };

        let state = self.thresholds.resolve(true, Some(&result));
        debug!("frame: {:?} {}% {state:?}", result.letter(), result.confidence);
        self.controller.observe(state, result.token, now);
        self.latest = Some(result);
        true
    }

    /// Fires the controller's timer.
    ///
    /// # Returns
    /// The token committed by this call, if any.
    pub fn on_timer(&mut self, now: Instant) -> Option<Token> {
        self.controller.on_timer(now, &mut self.composer)
    }

    /// When `on_timer` has to be called next.
    pub fn deadline(&self) -> Option<Instant> {
        self.controller.deadline()
    }

    pub fn detection_state(&self) -> DetectionState {
        self.thresholds.resolve(self.model_ready(), self.latest.as_ref())
    }

    pub fn result(&self) -> Option<&DetectionResult> {
        self.latest.as_ref()
    }

    pub fn progress(&self) -> f32 {
        self.controller.progress()
    }

    /// Landmarks to draw over the video, `None` when the overlay is hidden or there is no
    /// hand.
    pub fn overlay(&self) -> Option<&[Landmark]> {
        if !self.config.pose_overlay_visible() {
            return None;
        }
        self.latest.as_ref()?.landmarks.as_deref()
    }

    /// Commits the current prediction, whatever its confidence.
    pub fn add_current(&mut self) -> Result<Option<Token>> {
        let candidate = self.latest.as_ref().and_then(|r| r.token);
        Ok(self.controller.commit_manual(candidate, &mut self.composer)?)
    }

    pub fn space(&mut self) -> Result<()> {
        Ok(self.composer.space()?)
    }

    pub fn backspace(&mut self) -> Result<()> {
        Ok(self.composer.backspace()?)
    }

    pub fn clear(&mut self) -> Result<()> {
        Ok(self.composer.clear()?)
    }

    pub fn text(&self) -> &str {
        self.composer.read()
    }

    pub fn copy_text(&self) -> String {
        self.composer.copy()
    }

    /// Hands a freshly opened camera to the session.
    ///
    /// # Returns
    /// `false` if the session was already stopped, the stream has then been stopped too.
    pub fn attach_camera(&mut self, stream: Box<dyn MediaStream>) -> bool {
        self.camera.attach(stream)
    }

    pub fn camera(&self) -> &CameraSlot {
        &self.camera
    }

    /// The token cancelled by `stop`.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled() && !self.camera.is_live()
    }

    /// Halts the frame loop, drops the pending timer, releases the camera and closes the
    /// text buffer. Calling it again does nothing.
    pub fn stop(&mut self) {
        if self.is_stopped() {
            return;
        }

        self.cancel.cancel();
        self.controller.cancel();
        self.camera.release();
        self.composer.close();
        self.sampler.reset();
        info!(chars = self.composer.read().chars().count(); "session stopped");
    }
}
