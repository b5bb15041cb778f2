mod api;

pub use api::{AnalyzeRequest, AnalyzeResponse, ChatRequest, Mode, StreamEvent};
