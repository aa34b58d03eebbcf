//! Turns a stream of noisy per-frame predictions into deliberate text entry.
//!
//! A letter has to be held at high confidence for the whole debounce delay before it is
//! committed, and it is committed once per streak. The delete gesture is the exception:
//! after its first commit it keeps deleting, one character per delay, for as long as it is
//! held.
//!
//! The controller never reads the clock. Callers feed it observations and wake it up at
//! `deadline()`, the one timer it needs at any moment.

use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use crate::{
    composer::{ComposeErr, TextSink},
    labels::Token,
    state::DetectionState,
};

/// How often the accumulation progress is refreshed.
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Accumulating {
        token: Token,
        started: Instant,
        next_sample: Instant,
    },
    /// Only ever entered by `Token::Back`.
    Repeating { next_fire: Instant },
}

/// The auto-add state of one recognition session.
#[derive(Debug)]
pub struct StabilizationController {
    delay: Duration,
    auto_mode: bool,
    phase: Phase,
    /// The token that may not be accumulated again until the hand leaves the frame. Set by
    /// a committed letter and by an aborted commit, never by a successful delete.
    latched: Option<Token>,
    progress: f32,
}

impl StabilizationController {
    /// Creates an idle controller in automatic mode.
    ///
    /// # Args
    /// * `delay` - How long a letter must be held before it is committed, also the delete
    ///   repeat interval.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            auto_mode: true,
            phase: Phase::Idle,
            latched: None,
            progress: 0.,
        }
    }

    /// Accumulation progress in `0..=100`, for display only.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_auto_mode(&self) -> bool {
        self.auto_mode
    }

    /// The token currently being accumulated, if any.
    pub fn candidate(&self) -> Option<Token> {
        match self.phase {
            Phase::Accumulating { token, .. } => Some(token),
            Phase::Repeating { .. } => Some(Token::Back),
            Phase::Idle => None,
        }
    }

    pub fn last_committed(&self) -> Option<Token> {
        self.latched
    }

    pub fn is_repeating(&self) -> bool {
        matches!(self.phase, Phase::Repeating { .. })
    }

    /// When `on_timer` must be called next, `None` while idle.
    pub fn deadline(&self) -> Option<Instant> {
        match self.phase {
            Phase::Idle => None,
            Phase::Accumulating { next_sample, .. } => Some(next_sample),
            Phase::Repeating { next_fire } => Some(next_fire),
        }
    }

    pub fn set_auto_mode(&mut self, auto_mode: bool) {
        self.auto_mode = auto_mode;
        if !auto_mode {
            self.reset();
        }
    }

    /// Changes the debounce delay, restarting any session in progress.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
        self.reset();
    }

    /// Drops the active session and its timer, keeping the latched letter.
    pub fn cancel(&mut self) {
        self.reset();
    }

    /// Feeds the state resolved for the latest detection result.
    ///
    /// # Args
    /// * `state` - The resolved detection state.
    /// * `candidate` - The predicted token of the same result.
    /// * `now` - When the result was produced.
    pub fn observe(&mut self, state: DetectionState, candidate: Option<Token>, now: Instant) {
        let qualifying = match state {
            DetectionState::HighConfidence if self.auto_mode => candidate,
            _ => None,
        };

        let Some(token) = qualifying else {
            self.reset();
            if state == DetectionState::NoHand {
                self.latched = None;
            }
            return;
        };

        match self.phase {
            Phase::Accumulating { token: current, .. } if current == token => return,
            Phase::Repeating { .. } if token.is_back() => return,
            _ => {}
        }

        self.reset();
        if self.latched == Some(token) {
            return;
        }

        debug!("accumulating {token}");
        self.phase = Phase::Accumulating {
            token,
            started: now,
            next_sample: self.next_sample(now, now),
        };
    }

    /// Advances the active timer.
    ///
    /// # Returns
    /// The token committed to `sink`, if this call committed one.
    pub fn on_timer(&mut self, now: Instant, sink: &mut dyn TextSink) -> Option<Token> {
        match self.phase {
            Phase::Idle => None,
            Phase::Accumulating {
                token,
                started,
                next_sample,
            } => {
                if now < next_sample {
                    return None;
                }

                let elapsed = now.saturating_duration_since(started);
                if elapsed < self.delay {
                    self.progress =
                        (elapsed.as_secs_f32() / self.delay.as_secs_f32() * 100.).min(100.);
                    self.phase = Phase::Accumulating {
                        token,
                        started,
                        next_sample: self.next_sample(started, now),
                    };
                    return None;
                }

                self.progress = 0.;
                self.commit(token, sink)?;

                self.phase = if token.is_back() {
                    Phase::Repeating {
                        next_fire: now + self.delay,
                    }
                } else {
                    self.latched = Some(token);
                    Phase::Idle
                };
                Some(token)
            }
            Phase::Repeating { next_fire } => {
                if now < next_fire {
                    return None;
                }

                self.commit(Token::Back, sink)?;
                self.phase = Phase::Repeating {
                    next_fire: now + self.delay,
                };
                Some(Token::Back)
            }
        }
    }

    /// Commits the current prediction right away, without debounce or suppression.
    ///
    /// Any automatic session in progress is dropped so the same letter is not committed
    /// twice.
    ///
    /// # Returns
    /// The committed token, `None` if there was nothing to commit.
    pub fn commit_manual(
        &mut self,
        candidate: Option<Token>,
        sink: &mut dyn TextSink,
    ) -> Result<Option<Token>, ComposeErr> {
        self.reset();

        let Some(token) = candidate else {
            return Ok(None);
        };

        sink.commit(token)?;
        debug!("committed {token} manually");
        if !token.is_back() {
            self.latched = Some(token);
        }
        Ok(Some(token))
    }

    /// Commits `token`, aborting the session on failure.
    fn commit(&mut self, token: Token, sink: &mut dyn TextSink) -> Option<()> {
        match sink.commit(token) {
            Ok(()) => {
                debug!("committed {token}");
                Some(())
            }
            Err(e) => {
                warn!("dropping {token}, commit failed: {e}");
                self.reset();
                self.latched = Some(token);
                None
            }
        }
    }

    /// The next progress sample, never later than the commit deadline.
    fn next_sample(&self, started: Instant, now: Instant) -> Instant {
        (now + SAMPLE_INTERVAL).min(started + self.delay)
    }

    fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.progress = 0.;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(500);
    const A: Token = Token::Letter('A');
    const B: Token = Token::Letter('B');

    #[derive(Default)]
    struct Recorder {
        tokens: Vec<Token>,
        fail: bool,
    }

    impl TextSink for Recorder {
        fn commit(&mut self, token: Token) -> Result<(), ComposeErr> {
            if self.fail {
                return Err(ComposeErr::Closed);
            }
            self.tokens.push(token);
            Ok(())
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Fires every timer due up to `until`, returning when each commit happened.
    fn run_until(
        c: &mut StabilizationController,
        sink: &mut Recorder,
        t0: Instant,
        until: Duration,
    ) -> Vec<(Duration, Token)> {
        let mut commits = Vec::new();
        while let Some(deadline) = c.deadline() {
            if deadline > t0 + until {
                break;
            }
            if let Some(token) = c.on_timer(deadline, sink) {
                commits.push((deadline - t0, token));
            }
        }
        commits
    }

    #[test]
    fn held_letter_commits_once_at_the_delay() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(A), t0);
        assert_eq!(run_until(&mut c, &mut sink, t0, ms(500)), vec![(ms(500), A)]);
        assert_eq!(c.progress(), 0.);
        assert_eq!(c.last_committed(), Some(A));

        // The streak continues on the same letter.
        for t in (516..3000).step_by(16) {
            c.observe(DetectionState::HighConfidence, Some(A), t0 + ms(t));
            assert!(run_until(&mut c, &mut sink, t0, ms(t)).is_empty());
        }
        assert_eq!(sink.tokens, vec![A]);
    }

    #[test]
    fn progress_is_sampled_while_accumulating() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(A), t0);
        assert_eq!(c.deadline(), Some(t0 + SAMPLE_INTERVAL));

        run_until(&mut c, &mut sink, t0, ms(250));
        assert!((c.progress() - 50.).abs() < 1e-3);
        assert_eq!(c.candidate(), Some(A));
        assert!(sink.tokens.is_empty());
    }

    #[test]
    fn delay_off_the_sampling_grid_still_commits_on_time() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(ms(1234));
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(A), t0);
        assert_eq!(run_until(&mut c, &mut sink, t0, ms(2000)), vec![(ms(1234), A)]);
    }

    #[test]
    fn held_delete_repeats_every_delay() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(Token::Back), t0);
        let commits = run_until(&mut c, &mut sink, t0, ms(1600));

        assert_eq!(
            commits,
            vec![
                (ms(500), Token::Back),
                (ms(1000), Token::Back),
                (ms(1500), Token::Back),
            ]
        );
        assert!(c.is_repeating());

        // Frames keep coming while the gesture is held, they do not restart the timer.
        c.observe(DetectionState::HighConfidence, Some(Token::Back), t0 + ms(1600));
        assert_eq!(c.deadline(), Some(t0 + ms(2000)));
    }

    #[test]
    fn releasing_delete_stops_it_at_once() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(Token::Back), t0);
        run_until(&mut c, &mut sink, t0, ms(1100));
        assert_eq!(sink.tokens.len(), 2);

        c.observe(DetectionState::LowConfidence, Some(Token::Back), t0 + ms(1100));
        assert_eq!(c.deadline(), None);
        assert_eq!(c.progress(), 0.);
        assert!(!c.is_repeating());
        assert!(run_until(&mut c, &mut sink, t0, ms(5000)).is_empty());
        assert_eq!(sink.tokens.len(), 2);
    }

    #[test]
    fn delete_is_never_latched() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(Token::Back), t0);
        run_until(&mut c, &mut sink, t0, ms(600));
        c.observe(DetectionState::LowConfidence, None, t0 + ms(600));
        c.observe(DetectionState::HighConfidence, Some(Token::Back), t0 + ms(700));

        assert_eq!(run_until(&mut c, &mut sink, t0, ms(1200)), vec![(ms(1200), Token::Back)]);
    }

    #[test]
    fn letter_change_restarts_the_debounce() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(A), t0);
        run_until(&mut c, &mut sink, t0, ms(300));
        assert!(c.progress() > 0.);

        c.observe(DetectionState::HighConfidence, Some(B), t0 + ms(300));
        assert_eq!(c.progress(), 0.);
        assert_eq!(run_until(&mut c, &mut sink, t0, ms(2000)), vec![(ms(800), B)]);
    }

    #[test]
    fn alternating_letters_commit_each_time() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        for (i, token) in [A, B, A].into_iter().enumerate() {
            let start = ms(1000 * i as u64);
            c.observe(DetectionState::HighConfidence, Some(token), t0 + start);
            run_until(&mut c, &mut sink, t0, start + ms(900));
        }
        assert_eq!(sink.tokens, vec![A, B, A]);
    }

    #[test]
    fn removing_the_hand_allows_the_same_letter_again() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(A), t0);
        run_until(&mut c, &mut sink, t0, ms(600));

        // Low confidence alone keeps the latch.
        c.observe(DetectionState::LowConfidence, Some(A), t0 + ms(600));
        c.observe(DetectionState::HighConfidence, Some(A), t0 + ms(650));
        assert_eq!(c.deadline(), None);

        c.observe(DetectionState::NoHand, None, t0 + ms(700));
        assert_eq!(c.last_committed(), None);
        c.observe(DetectionState::HighConfidence, Some(A), t0 + ms(800));
        assert_eq!(run_until(&mut c, &mut sink, t0, ms(2000)), vec![(ms(1300), A)]);
        assert_eq!(sink.tokens, vec![A, A]);
    }

    #[test]
    fn manual_mode_cancels_and_commits_on_demand() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(A), t0);
        run_until(&mut c, &mut sink, t0, ms(200));
        c.set_auto_mode(false);
        assert_eq!(c.deadline(), None);
        assert_eq!(c.progress(), 0.);

        c.observe(DetectionState::HighConfidence, Some(A), t0 + ms(300));
        assert_eq!(c.deadline(), None);

        assert_eq!(c.commit_manual(Some(A), &mut sink), Ok(Some(A)));
        assert_eq!(c.commit_manual(Some(A), &mut sink), Ok(Some(A)));
        assert_eq!(c.commit_manual(None, &mut sink), Ok(None));
        assert_eq!(sink.tokens, vec![A, A]);
    }

    #[test]
    fn failed_commit_aborts_without_retry() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder {
            fail: true,
            ..Default::default()
        };

        c.observe(DetectionState::HighConfidence, Some(A), t0);
        assert!(run_until(&mut c, &mut sink, t0, ms(600)).is_empty());
        assert_eq!(c.deadline(), None);
        assert_eq!(c.progress(), 0.);

        // Still held: no second attempt.
        c.observe(DetectionState::HighConfidence, Some(A), t0 + ms(700));
        assert_eq!(c.deadline(), None);

        // A new streak may try again.
        sink.fail = false;
        c.observe(DetectionState::NoHand, None, t0 + ms(800));
        c.observe(DetectionState::HighConfidence, Some(A), t0 + ms(900));
        assert_eq!(run_until(&mut c, &mut sink, t0, ms(2000)), vec![(ms(1400), A)]);
    }

    #[test]
    fn failed_repeat_stops_deleting() {
        let t0 = Instant::now();
        let mut c = StabilizationController::new(DELAY);
        let mut sink = Recorder::default();

        c.observe(DetectionState::HighConfidence, Some(Token::Back), t0);
        run_until(&mut c, &mut sink, t0, ms(600));
        assert!(c.is_repeating());

        sink.fail = true;
        assert!(run_until(&mut c, &mut sink, t0, ms(3000)).is_empty());
        assert_eq!(c.deadline(), None);
        assert_eq!(sink.tokens, vec![Token::Back]);
    }
}
