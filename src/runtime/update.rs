use super::frontend::{AnalysisPanel, MessageId, MessageIds, MessageRole, RenderPort};
use tokio::sync::mpsc;

/// Render operations shipped from a reply task to the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiUpdate {
    ShowTyping(MessageId),
    HideTyping(MessageId),
    OpenReply(MessageId),
    AppendToReply { id: MessageId, markup: String },
    CloseReply(MessageId),
    AppendMessage { id: MessageId, role: MessageRole, markup: String },
    ScrollToLatest,
    ShowAnalysis(AnalysisPanel),
}

/// A [`RenderPort`] that forwards every operation over a channel. Each spawned
/// reply owns its own sink, so concurrent replies never share a target.
#[derive(Clone)]
pub struct UpdateSink {
    tx: mpsc::UnboundedSender<UiUpdate>,
    ids: MessageIds,
}

impl UpdateSink {
    pub fn new(tx: mpsc::UnboundedSender<UiUpdate>, ids: MessageIds) -> Self {
        Self { tx, ids }
    }

    fn send(&self, update: UiUpdate) {
        if self.tx.send(update).is_err() {
            tracing::debug!("ui loop closed; dropping render update");
        }
    }
}

impl RenderPort for UpdateSink {
    fn show_typing(&mut self) -> MessageId {
        let id = self.ids.next();
        self.send(UiUpdate::ShowTyping(id));
        id
    }

    fn hide_typing(&mut self, id: MessageId) {
        self.send(UiUpdate::HideTyping(id));
    }

    fn open_reply(&mut self) -> MessageId {
        let id = self.ids.next();
        self.send(UiUpdate::OpenReply(id));
        id
    }

    fn append_to_reply(&mut self, id: MessageId, markup: &str) {
        self.send(UiUpdate::AppendToReply {
            id,
            markup: markup.to_string(),
        });
    }

    fn close_reply(&mut self, id: MessageId) {
        self.send(UiUpdate::CloseReply(id));
    }

    fn append_message(&mut self, role: MessageRole, markup: String) -> MessageId {
        let id = self.ids.next();
        self.send(UiUpdate::AppendMessage { id, role, markup });
        id
    }

    fn scroll_to_latest(&mut self) {
        self.send(UiUpdate::ScrollToLatest);
    }

    fn show_analysis(&mut self, panel: AnalysisPanel) {
        self.send(UiUpdate::ShowAnalysis(panel));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_forwards_operations_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sink = UpdateSink::new(tx, MessageIds::default());

        let typing = sink.show_typing();
        let reply = sink.open_reply();
        sink.append_to_reply(reply, "Hi");
        sink.hide_typing(typing);

        assert_eq!(rx.try_recv(), Ok(UiUpdate::ShowTyping(typing)));
        assert_eq!(rx.try_recv(), Ok(UiUpdate::OpenReply(reply)));
        assert_eq!(
            rx.try_recv(),
            Ok(UiUpdate::AppendToReply {
                id: reply,
                markup: "Hi".to_string()
            })
        );
        assert_eq!(rx.try_recv(), Ok(UiUpdate::HideTyping(typing)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn sink_survives_a_closed_ui_loop() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let mut sink = UpdateSink::new(tx, MessageIds::default());
        let id = sink.open_reply();
        sink.append_to_reply(id, "lost");
        sink.close_reply(id);
    }
}
