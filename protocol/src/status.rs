//! User-facing status reporting for the intake widget.

use serde::Deserialize;
use serde::Serialize;
use strum_macros::Display;

/// Visual tone attached to a status line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusTone {
    #[default]
    Neutral,
    Progress,
    Success,
    Error,
    Info,
}

/// One line of status text plus its tone. Every widget outcome, including
/// errors, is surfaced through this instead of being thrown at the host.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StatusLine {
    pub text: String,
    pub tone: StatusTone,
}

impl StatusLine {
    pub fn neutral() -> Self {
        Self::default()
    }

    pub fn progress(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: StatusTone::Progress,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: StatusTone::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: StatusTone::Error,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: StatusTone::Info,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.tone == StatusTone::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_line_is_neutral_and_empty() {
        let line = StatusLine::neutral();
        assert!(line.is_neutral());
        assert_eq!(line.text, "");
    }

    #[test]
    fn tones_render_snake_case() {
        assert_eq!(StatusTone::Progress.to_string(), "progress");
        assert_eq!(StatusTone::Neutral.to_string(), "neutral");
    }

    #[test]
    fn constructors_set_tone_and_text() {
        let line = StatusLine::error("Image batch exceeds 25 MB limit.");
        assert_eq!(line.tone, StatusTone::Error);
        assert_eq!(line.text, "Image batch exceeds 25 MB limit.");
        assert!(!line.is_neutral());
    }
}
