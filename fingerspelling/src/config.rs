use std::{fs, ops::RangeInclusive, path::Path, time::Duration};

use serde::Deserialize;

use crate::error::{FingerspellErr, Result};

/// Accepted debounce durations, in milliseconds.
pub const AUTO_ADD_DELAY_RANGE_MS: RangeInclusive<u64> = 500..=2000;

const DEFAULT_AUTO_ADD_DELAY_MS: u64 = 500;

/// User facing options as they appear in the settings document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigDraft {
    #[serde(default = "default_delay")]
    auto_add_delay_ms: u64,
    #[serde(default = "enabled")]
    vibration_feedback: bool,
    #[serde(default = "enabled")]
    pose_overlay_visible: bool,
}

fn default_delay() -> u64 {
    DEFAULT_AUTO_ADD_DELAY_MS
}

fn enabled() -> bool {
    true
}

/// Validated options of a recognition session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognizerConfig {
    auto_add_delay: Duration,
    vibration_feedback: bool,
    pose_overlay_visible: bool,
}

impl RecognizerConfig {
    /// Creates a new configuration.
    ///
    /// # Args
    /// * `auto_add_delay_ms` - Debounce and repeat interval, within `AUTO_ADD_DELAY_RANGE_MS`.
    /// * `vibration_feedback` - Whether text mutations pulse the haptic motor.
    /// * `pose_overlay_visible` - Whether the consumer should draw the hand landmarks.
    ///
    /// # Returns
    /// The configuration, or `InvalidConfig` if the delay is out of range.
    pub fn new(
        auto_add_delay_ms: u64,
        vibration_feedback: bool,
        pose_overlay_visible: bool,
    ) -> Result<Self> {
        if !AUTO_ADD_DELAY_RANGE_MS.contains(&auto_add_delay_ms) {
            return Err(FingerspellErr::InvalidConfig(format!(
                "autoAddDelayMs ({auto_add_delay_ms}) must be within {}..={}",
                AUTO_ADD_DELAY_RANGE_MS.start(),
                AUTO_ADD_DELAY_RANGE_MS.end()
            )));
        }

        Ok(Self {
            auto_add_delay: Duration::from_millis(auto_add_delay_ms),
            vibration_feedback,
            pose_overlay_visible,
        })
    }

    /// Parses and validates a JSON settings document, missing keys take their defaults.
    pub fn from_json(doc: &str) -> Result<Self> {
        let draft: ConfigDraft = serde_json::from_str(doc)
            .map_err(|e| FingerspellErr::InvalidConfig(format!("invalid JSON: {e}")))?;

        Self::new(
            draft.auto_add_delay_ms,
            draft.vibration_feedback,
            draft.pose_overlay_visible,
        )
    }

    /// Loads a settings document from disk.
    pub fn from_file(path: &Path) -> Result<Self> {
        let doc = fs::read_to_string(path).map_err(|e| {
            FingerspellErr::InvalidConfig(format!("cannot read '{}': {e}", path.display()))
        })?;
        Self::from_json(&doc)
    }

    pub fn auto_add_delay(&self) -> Duration {
        self.auto_add_delay
    }

    pub fn vibration_feedback(&self) -> bool {
        self.vibration_feedback
    }

    /// Only gates landmark drawing on the consumer side, the pipeline ignores it.
    pub fn pose_overlay_visible(&self) -> bool {
        self.pose_overlay_visible
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            auto_add_delay: Duration::from_millis(DEFAULT_AUTO_ADD_DELAY_MS),
            vibration_feedback: true,
            pose_overlay_visible: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_takes_defaults() {
        let cfg = RecognizerConfig::from_json("{}").unwrap();
        assert_eq!(cfg, RecognizerConfig::default());
        assert_eq!(cfg.auto_add_delay(), Duration::from_millis(500));
    }

    #[test]
    fn reads_camel_case_keys() {
        let cfg = RecognizerConfig::from_json(
            r#"{ "autoAddDelayMs": 1200, "vibrationFeedback": false, "poseOverlayVisible": false }"#,
        )
        .unwrap();

        assert_eq!(cfg.auto_add_delay(), Duration::from_millis(1200));
        assert!(!cfg.vibration_feedback());
        assert!(!cfg.pose_overlay_visible());
    }

    #[test]
    fn delay_bounds_are_inclusive() {
        assert!(RecognizerConfig::new(500, true, true).is_ok());
        assert!(RecognizerConfig::new(2000, true, true).is_ok());
        assert!(RecognizerConfig::new(499, true, true).is_err());
        assert!(RecognizerConfig::new(2001, true, true).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RecognizerConfig::from_json(r#"{ "autoAddDelay": 700 }"#).unwrap_err();
        assert!(matches!(err, FingerspellErr::InvalidConfig(_)));
        assert!(!err.is_fatal());
    }
}
