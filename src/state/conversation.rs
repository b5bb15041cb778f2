use crate::runtime::frontend::{AnalysisPanel, MessageId, MessageIds, MessageRole, RenderPort};
use crate::runtime::update::{UiUpdate, UpdateSink};
use tokio::sync::mpsc;

pub const TYPING_TEXT: &str = "Typing...";
pub const WELCOME_TEXT: &str =
    "Welcome! Ask me anything, or press Ctrl+K to open the code analyzer.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: MessageRole,
    pub markup: String,
    pub sealed: bool,
}

/// In-memory view of the chat: the ordered message list, the analyzer panel,
/// and whether the view should jump to the newest content.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    ids: MessageIds,
    welcome_visible: bool,
    follow_latest: bool,
    analysis: Option<AnalysisPanel>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            welcome_visible: true,
            follow_latest: true,
            ..Self::default()
        }
    }

    /// A channel-backed port sharing this conversation's id space.
    pub fn sink(&self, tx: mpsc::UnboundedSender<UiUpdate>) -> UpdateSink {
        UpdateSink::new(tx, self.ids.clone())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn welcome_visible(&self) -> bool {
        self.welcome_visible
    }

    pub fn analysis(&self) -> Option<&AnalysisPanel> {
        self.analysis.as_ref()
    }

    /// Consume the pending scroll request, if any.
    pub fn take_follow_latest(&mut self) -> bool {
        std::mem::take(&mut self.follow_latest)
    }

    pub fn apply(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::ShowTyping(id) => self.insert(id, MessageRole::Typing, TYPING_TEXT, false),
            UiUpdate::HideTyping(id) => self.remove_typing(id),
            UiUpdate::OpenReply(id) => self.insert(id, MessageRole::Bot, "", false),
            UiUpdate::AppendToReply { id, markup } => self.append_to(id, &markup),
            UiUpdate::CloseReply(id) => self.seal(id),
            UiUpdate::AppendMessage { id, role, markup } => self.insert(id, role, &markup, true),
            UiUpdate::ScrollToLatest => self.follow_latest = true,
            UiUpdate::ShowAnalysis(panel) => self.analysis = Some(panel),
        }
    }

    fn insert(&mut self, id: MessageId, role: MessageRole, markup: &str, sealed: bool) {
        if role != MessageRole::Typing {
            self.welcome_visible = false;
        }
        self.messages.push(ChatMessage {
            id,
            role,
            markup: markup.to_string(),
            sealed,
        });
        self.follow_latest = true;
    }

    fn remove_typing(&mut self, id: MessageId) {
        self.messages
            .retain(|m| !(m.id == id && m.role == MessageRole::Typing));
    }

    fn append_to(&mut self, id: MessageId, markup: &str) {
        match self.messages.iter_mut().find(|m| m.id == id) {
            Some(message) if !message.sealed => message.markup.push_str(markup),
            Some(_) => tracing::warn!(id = id.0, "ignoring append to a sealed reply"),
            None => tracing::warn!(id = id.0, "ignoring append to an unknown reply"),
        }
    }

    fn seal(&mut self, id: MessageId) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.sealed = true;
        }
    }
}

impl RenderPort for Conversation {
    fn show_typing(&mut self) -> MessageId {
        let id = self.ids.next();
        self.apply(UiUpdate::ShowTyping(id));
        id
    }

    fn hide_typing(&mut self, id: MessageId) {
        self.apply(UiUpdate::HideTyping(id));
    }

    fn open_reply(&mut self) -> MessageId {
        let id = self.ids.next();
        self.apply(UiUpdate::OpenReply(id));
        id
    }

    fn append_to_reply(&mut self, id: MessageId, markup: &str) {
        self.append_to(id, markup);
    }

    fn close_reply(&mut self, id: MessageId) {
        self.seal(id);
    }

    fn append_message(&mut self, role: MessageRole, markup: String) -> MessageId {
        let id = self.ids.next();
        self.apply(UiUpdate::AppendMessage { id, role, markup });
        id
    }

    fn scroll_to_latest(&mut self) {
        self.follow_latest = true;
    }

    fn show_analysis(&mut self, panel: AnalysisPanel) {
        self.analysis = Some(panel);
    }
}
