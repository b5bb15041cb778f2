use super::client::{ByteStream, ChatTransport};
use super::error::ClientError;
use crate::types::{AnalyzeRequest, AnalyzeResponse, ChatRequest};
use bytes::Bytes;
use futures::future::{self, BoxFuture};
use futures::{stream, FutureExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

/// Scripted reply for one `open_stream` call.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Success status, then the given raw chunks verbatim.
    Chunks(Vec<Vec<u8>>),
    /// Non-success status before any body is read.
    Status(u16),
    /// Success status, the given chunks, then a read failure.
    Interrupted { chunks: Vec<Vec<u8>>, reason: String },
}

impl MockReply {
    pub fn text_chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MockReply::Chunks(
            chunks
                .into_iter()
                .map(|chunk| chunk.into().into_bytes())
                .collect(),
        )
    }
}

#[derive(Default)]
struct MockState {
    replies: VecDeque<MockReply>,
    analyses: VecDeque<Result<AnalyzeResponse, u16>>,
    chat_requests: Vec<ChatRequest>,
    analyze_requests: Vec<AnalyzeRequest>,
}

/// In-process transport that replays scripted replies and records what it was asked.
#[derive(Clone, Default)]
pub struct MockApiClient {
    state: Arc<Mutex<MockState>>,
}

impl MockApiClient {
    pub fn new(replies: Vec<MockReply>) -> Self {
        let client = Self::default();
        client.lock().replies.extend(replies);
        client
    }

    pub fn push_reply(&self, reply: MockReply) {
        self.lock().replies.push_back(reply);
    }

    pub fn push_analysis(&self, response: AnalyzeResponse) {
        self.lock().analyses.push_back(Ok(response));
    }

    pub fn push_analysis_status(&self, status: u16) {
        self.lock().analyses.push_back(Err(status));
    }

    pub fn chat_requests(&self) -> Vec<ChatRequest> {
        self.lock().chat_requests.clone()
    }

    pub fn analyze_requests(&self) -> Vec<AnalyzeRequest> {
        self.lock().analyze_requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        // A panicking test thread must not hide the recorded requests from others.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_stream(&self, request: &ChatRequest) -> Result<ByteStream, ClientError> {
        let mut state = self.lock();
        state.chat_requests.push(request.clone());
        let Some(reply) = state.replies.pop_front() else {
            return Err(ClientError::Interrupted(
                "MockApiClient: no more replies configured".to_string(),
            ));
        };

        match reply {
            MockReply::Status(status) => Err(ClientError::Status {
                status,
                url: "mock://api/stream".to_string(),
            }),
            MockReply::Chunks(chunks) => {
                let items: Vec<Result<Bytes, ClientError>> =
                    chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
                Ok(Box::pin(stream::iter(items)))
            }
            MockReply::Interrupted { chunks, reason } => {
                let mut items: Vec<Result<Bytes, ClientError>> =
                    chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
                items.push(Err(ClientError::Interrupted(reason)));
                Ok(Box::pin(stream::iter(items)))
            }
        }
    }

    fn next_analysis(&self, request: &AnalyzeRequest) -> Result<AnalyzeResponse, ClientError> {
        let mut state = self.lock();
        state.analyze_requests.push(request.clone());
        match state.analyses.pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(status)) => Err(ClientError::Status {
                status,
                url: "mock://api/analyze".to_string(),
            }),
            None => Err(ClientError::Interrupted(
                "MockApiClient: no more analyses configured".to_string(),
            )),
        }
    }
}

impl ChatTransport for MockApiClient {
    fn open_stream<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> BoxFuture<'a, Result<ByteStream, ClientError>> {
        future::ready(self.next_stream(request)).boxed()
    }

    fn analyze<'a>(
        &'a self,
        request: &'a AnalyzeRequest,
    ) -> BoxFuture<'a, Result<AnalyzeResponse, ClientError>> {
        future::ready(self.next_analysis(request)).boxed()
    }
}
