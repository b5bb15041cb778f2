use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-side behaviour selector sent with every chat request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Chat,
    Debug,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Chat => "chat",
            Mode::Debug => "debug",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "chat" => Ok(Mode::Chat),
            "debug" => Ok(Mode::Debug),
            other => Err(format!("unknown mode '{other}': expected 'chat' or 'debug'")),
        }
    }
}

/// Body of `POST /api/stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub mode: Mode,
    pub personality: String,
    pub message: String,
}

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub code: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub language: String,
    #[serde(default)]
    pub analysis: String,
}

/// One classified record of the reply stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Start,
    Data(String),
    End,
}
