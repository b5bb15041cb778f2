use crate::app::App;
use crate::api::ChatTransport;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(pub u64);

/// Hands out message ids. Clones share one counter, so ids stay unique across
/// every port that renders into the same conversation.
#[derive(Clone, Debug, Default)]
pub struct MessageIds(Arc<AtomicU64>);

impl MessageIds {
    pub fn next(&self) -> MessageId {
        MessageId(self.0.fetch_add(1, Ordering::Relaxed) + 1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Bot,
    Typing,
}

/// State of the code analyzer result area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnalysisPanel {
    Prompt,
    Analyzing,
    Result(String),
    Failed(String),
}

impl AnalysisPanel {
    pub fn markup(&self) -> &str {
        match self {
            AnalysisPanel::Prompt => "Please paste some code to analyze.",
            AnalysisPanel::Analyzing => "Analyzing...",
            AnalysisPanel::Result(markup) | AnalysisPanel::Failed(markup) => markup,
        }
    }
}

/// The display surface the stream consumer renders into.
pub trait RenderPort {
    fn show_typing(&mut self) -> MessageId;
    /// Removing an indicator that is already gone is a no-op.
    fn hide_typing(&mut self, id: MessageId);
    /// Start an empty, append-only bot reply.
    fn open_reply(&mut self) -> MessageId;
    fn append_to_reply(&mut self, id: MessageId, markup: &str);
    /// Seal the reply; later appends are ignored.
    fn close_reply(&mut self, id: MessageId);
    fn append_message(&mut self, role: MessageRole, markup: String) -> MessageId;
    fn scroll_to_latest(&mut self);
    fn show_analysis(&mut self, panel: AnalysisPanel);
}

pub enum UserInputEvent {
    Submit(String),
    ToggleCodeMode,
    Analyze { code: String, language: String },
    Quit,
}

pub trait FrontendAdapter<T: ChatTransport + 'static> {
    fn poll_user_input(&mut self, app: &App<T>) -> Option<UserInputEvent>;
    fn render(&mut self, app: &App<T>);
    fn should_quit(&self) -> bool;
    /// New content arrived; jump the history view to the bottom.
    fn follow_latest(&mut self) {}
}
