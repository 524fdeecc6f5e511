use serde_json::Value;

use crate::model::{CompletionSettings, ReflectionContent};

/// A reflection counts once it has non-blank text of the configured length.
#[must_use]
pub fn is_reflection_submitted(content: &ReflectionContent, text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    content
        .min_length
        .is_none_or(|min| trimmed.chars().count() >= min)
}

/// The whiteboard payload is opaque; only emptiness is checked.
#[must_use]
pub fn is_whiteboard_submitted(payload: &Value) -> bool {
    match payload {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Dwell check for text, image and resource units.
#[must_use]
pub fn is_dwell_satisfied(dwell_secs: u32, settings: &CompletionSettings) -> bool {
    dwell_secs >= settings.min_dwell_secs()
}

/// Watch check for video units.
#[must_use]
pub fn is_watch_satisfied(watched_percentage: Option<u8>, settings: &CompletionSettings) -> bool {
    watched_percentage.is_some_and(|watched| watched >= settings.video_watch_threshold())
}
