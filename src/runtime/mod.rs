pub mod consumer;
pub mod frontend;
pub mod r#loop;
pub mod update;

pub use consumer::{run_analysis, stream_reply, AnalysisOutcome, RenderTarget, ReplyOutcome};
pub use frontend::{AnalysisPanel, FrontendAdapter, MessageId, MessageRole, RenderPort, UserInputEvent};
pub use update::{UiUpdate, UpdateSink};
