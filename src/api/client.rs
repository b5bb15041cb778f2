use super::error::{map_request_error, ClientError};
use super::logging::{debug_payload_enabled, emit_debug_payload};
use crate::config::Config;
use crate::types::{AnalyzeRequest, AnalyzeResponse, ChatRequest};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use reqwest::StatusCode;
use serde::Serialize;
use std::pin::Pin;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ClientError>> + Send>>;

pub const STREAM_PATH: &str = "/api/stream";
pub const ANALYZE_PATH: &str = "/api/analyze";

/// The two server calls the client makes. Implemented over HTTP by
/// [`ApiClient`] and in-process by `MockApiClient`.
pub trait ChatTransport: Send + Sync {
    /// Open the reply stream for one chat message. Resolves once the server has
    /// answered with a success status; body chunks follow on the stream.
    fn open_stream<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<ByteStream, ClientError>>;

    fn analyze<'a>(
        &'a self,
        request: &'a AnalyzeRequest,
    ) -> BoxFuture<'a, Result<AnalyzeResponse, ClientError>>;
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    server_url: String,
}

impl ApiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            server_url: config.server_url.clone(),
        }
    }

    pub fn stream_url(&self) -> String {
        join_url(&self.server_url, STREAM_PATH)
    }

    pub fn analyze_url(&self) -> String {
        join_url(&self.server_url, ANALYZE_PATH)
    }

    fn post_json<T: Serialize>(&self, url: &str, payload: &T) -> reqwest::RequestBuilder {
        if debug_payload_enabled() {
            match serde_json::to_value(payload) {
                Ok(value) => emit_debug_payload(url, &value),
                Err(error) => tracing::debug!(%error, "payload not representable as JSON"),
            }
        }
        self.http
            .post(url)
            .header("content-type", "application/json")
            .json(payload)
    }

    async fn open_stream_inner(&self, request: &ChatRequest) -> Result<ByteStream, ClientError> {
        let url = self.stream_url();
        tracing::info!(
            mode = %request.mode,
            personality = %request.personality,
            message_len = request.message.len(),
            "opening reply stream"
        );

        let response = self
            .post_json(&url, request)
            .send()
            .await
            .map_err(|error| map_request_error(error, &url))?;
        check_stream_status(response.status(), &url)?;

        let url_for_stream = url.clone();
        let stream = response
            .bytes_stream()
            .map(move |item| item.map_err(|error| map_request_error(error, &url_for_stream)));
        Ok(Box::pin(stream))
    }

    async fn analyze_inner(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, ClientError> {
        let url = self.analyze_url();
        tracing::info!(
            language = %request.language,
            code_len = request.code.len(),
            "requesting code analysis"
        );

        let response = self
            .post_json(&url, request)
            .send()
            .await
            .map_err(|error| map_request_error(error, &url))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| map_request_error(error, &url))?;
        decode_analysis(status, url, &body)
    }
}

fn check_stream_status(status: StatusCode, url: &str) -> Result<(), ClientError> {
    if status.is_success() {
        return Ok(());
    }
    tracing::warn!(%url, status = status.as_u16(), "reply stream rejected");
    Err(ClientError::Status {
        status: status.as_u16(),
        url: url.to_string(),
    })
}

/// The server reports model failures as a 500 carrying a normal JSON body, so
/// the body decides before the status does.
fn decode_analysis(
    status: StatusCode,
    url: String,
    body: &[u8],
) -> Result<AnalyzeResponse, ClientError> {
    match serde_json::from_slice::<AnalyzeResponse>(body) {
        Ok(parsed) => Ok(parsed),
        Err(_) if !status.is_success() => Err(ClientError::Status {
            status: status.as_u16(),
            url,
        }),
        Err(error) => Err(ClientError::Decode {
            url,
            message: error.to_string(),
        }),
    }
}

impl ChatTransport for ApiClient {
    fn open_stream<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<ByteStream, ClientError>> {
        self.open_stream_inner(request).boxed()
    }

    fn analyze<'a>(
        &'a self,
        request: &'a AnalyzeRequest,
    ) -> BoxFuture<'a, Result<AnalyzeResponse, ClientError>> {
        self.analyze_inner(request).boxed()
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim().trim_end_matches('/'), path)
}
