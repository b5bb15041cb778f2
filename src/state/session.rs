use crate::config::Config;
use crate::types::{ChatRequest, Mode};

/// Personality tags the server understands. The client treats the tag as
/// opaque; this list only drives command validation and help text.
pub const KNOWN_PERSONALITIES: [&str; 4] = ["friendly", "professional", "quirky", "coder"];

/// Per-user request settings. Changes produce a new value instead of
/// mutating shared state, so request construction stays a pure function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    personality: String,
    mode: Mode,
    code_mode: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            personality: KNOWN_PERSONALITIES[0].to_string(),
            mode: Mode::Chat,
            code_mode: false,
        }
    }
}

impl Session {
    pub fn from_config(config: &Config) -> Self {
        Self {
            personality: config.personality.clone(),
            mode: config.mode,
            code_mode: config.code_mode,
        }
    }

    pub fn personality(&self) -> &str {
        &self.personality
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn code_mode(&self) -> bool {
        self.code_mode
    }

    pub fn with_personality(&self, personality: impl Into<String>) -> Self {
        Self {
            personality: personality.into(),
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: Mode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_code_mode_toggled(&self) -> Self {
        Self {
            code_mode: !self.code_mode,
            ..self.clone()
        }
    }

    /// Coder mode forces debug requests regardless of the selected mode.
    pub fn request_mode(&self) -> Mode {
        if self.code_mode {
            Mode::Debug
        } else {
            self.mode
        }
    }

    /// Build the request for one submission. Blank input yields `None` and no
    /// request is sent.
    pub fn build_request(&self, input: &str) -> Option<ChatRequest> {
        let message = input.trim();
        if message.is_empty() {
            return None;
        }
        Some(ChatRequest {
            mode: self.request_mode(),
            personality: self.personality.clone(),
            message: message.to_string(),
        })
    }
}
