use thiserror::Error;

/// Failures talking to the chatbot server. Every variant is terminal for the
/// request that produced it.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error (HTTP {status})")]
    Status { status: u16, url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("stream interrupted: {0}")]
    Interrupted(String),
}

impl ClientError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub(crate) fn map_request_error(error: reqwest::Error, url: &str) -> ClientError {
    if let Some(status) = error.status() {
        return ClientError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        };
    }
    ClientError::Transport {
        url: url.to_string(),
        source: error,
    }
}
