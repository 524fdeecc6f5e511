use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("video watch threshold must be between 1 and 100, got {0}")]
    InvalidWatchThreshold(u8),

    #[error("write retries must be > 0")]
    InvalidWriteRetries,
}

/// Tunables for completion tracking.
///
/// Passive units complete once the learner has dwelt on them for
/// `min_dwell_secs`; videos additionally need `video_watch_threshold` percent
/// watched. `max_write_retries` bounds the compare-and-swap loop when two
/// submissions race on the same progress record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSettings {
    min_dwell_secs: u32,
    video_watch_threshold: u8,
    max_write_retries: u32,
}

/// Unvalidated settings as read from flags, env, or storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionSettingsDraft {
    pub min_dwell_secs: Option<u32>,
    pub video_watch_threshold: Option<u8>,
    pub max_write_retries: Option<u32>,
}

impl CompletionSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill missing values with defaults and check ranges.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a provided value is out of range.
    pub fn validate(self) -> Result<CompletionSettings, SettingsError> {
        let defaults = CompletionSettings::default();

        let video_watch_threshold = self
            .video_watch_threshold
            .unwrap_or(defaults.video_watch_threshold);
        if !(1..=100).contains(&video_watch_threshold) {
            return Err(SettingsError::InvalidWatchThreshold(video_watch_threshold));
        }

        let max_write_retries = self.max_write_retries.unwrap_or(defaults.max_write_retries);
        if max_write_retries == 0 {
            return Err(SettingsError::InvalidWriteRetries);
        }

        Ok(CompletionSettings {
            min_dwell_secs: self.min_dwell_secs.unwrap_or(defaults.min_dwell_secs),
            video_watch_threshold,
            max_write_retries,
        })
    }
}

impl CompletionSettings {
    #[must_use]
    pub fn min_dwell_secs(&self) -> u32 {
        self.min_dwell_secs
    }

    #[must_use]
    pub fn video_watch_threshold(&self) -> u8 {
        self.video_watch_threshold
    }

    #[must_use]
    pub fn max_write_retries(&self) -> u32 {
        self.max_write_retries
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            min_dwell_secs: 5,
            video_watch_threshold: 90,
            max_write_retries: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_draft_yields_defaults() {
        let settings = CompletionSettingsDraft::new().validate().unwrap();
        assert_eq!(settings, CompletionSettings::default());
        assert_eq!(settings.video_watch_threshold(), 90);
    }

    #[test]
    fn zero_watch_threshold_is_rejected() {
        let draft = CompletionSettingsDraft {
            video_watch_threshold: Some(0),
            ..CompletionSettingsDraft::default()
        };
        assert_eq!(
            draft.validate().unwrap_err(),
            SettingsError::InvalidWatchThreshold(0)
        );
    }

    #[test]
    fn zero_retries_are_rejected() {
        let draft = CompletionSettingsDraft {
            max_write_retries: Some(0),
            ..CompletionSettingsDraft::default()
        };
        assert_eq!(draft.validate().unwrap_err(), SettingsError::InvalidWriteRetries);
    }

    #[test]
    fn provided_values_override_defaults() {
        let draft = CompletionSettingsDraft {
            min_dwell_secs: Some(0),
            video_watch_threshold: Some(75),
            max_write_retries: None,
        };
        let settings = draft.validate().unwrap();
        assert_eq!(settings.min_dwell_secs(), 0);
        assert_eq!(settings.video_watch_threshold(), 75);
        assert_eq!(settings.max_write_retries(), 3);
    }
}
