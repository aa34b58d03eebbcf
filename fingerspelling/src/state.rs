use crate::landmarks::DetectionResult;

/// Lowest confidence, in percent, at which a hand counts as detected.
pub const LOW_CONFIDENCE: u8 = 40;
/// Lowest confidence, in percent, at which a letter may be committed.
pub const HIGH_CONFIDENCE: u8 = 80;

/// What the pipeline currently sees, derived from the latest result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    Loading,
    NoHand,
    LowConfidence,
    HighConfidence,
    PoorConditions,
}

/// Confidence policy of the resolver.
///
/// `poor_conditions_below` is off by default, in which case every hand under
/// `LOW_CONFIDENCE` collapses into `NoHand`. When set, a hand whose confidence lies in
/// `[poor_conditions_below, LOW_CONFIDENCE)` resolves to `PoorConditions` instead: the hand
/// is there but the letter cannot be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Thresholds {
    pub poor_conditions_below: Option<u8>,
}

impl Thresholds {
    /// Maps model readiness and the latest result to a detection state.
    pub fn resolve(&self, model_ready: bool, result: Option<&DetectionResult>) -> DetectionState {
        if !model_ready {
            return DetectionState::Loading;
        }

        let Some(result) = result.filter(|r| r.has_hand()) else {
            return DetectionState::NoHand;
        };

        match result.confidence {
            c if c >= HIGH_CONFIDENCE => DetectionState::HighConfidence,
            c if c >= LOW_CONFIDENCE => DetectionState::LowConfidence,
            c => match self.poor_conditions_below {
                Some(floor) if c >= floor => DetectionState::PoorConditions,
                _ => DetectionState::NoHand,
            },
        }
    }
}

/// Resolves with the default policy.
pub fn resolve(model_ready: bool, result: Option<&DetectionResult>) -> DetectionState {
    Thresholds::default().resolve(model_ready, result)
}
