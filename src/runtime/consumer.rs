//! Drives one chat reply (or one analysis) from request to rendered markup.

use super::frontend::{AnalysisPanel, MessageId, MessageRole, RenderPort};
use crate::api::stream::into_events;
use crate::api::ChatTransport;
use crate::format::{escape_html, format_message, plain_text};
use crate::types::{AnalyzeRequest, ChatRequest, StreamEvent};
use futures::StreamExt;

/// Append-only markup buffer for one in-progress bot reply.
///
/// Sealing consumes the target, so a finished reply cannot be written again.
pub struct RenderTarget {
    id: MessageId,
    markup: String,
}

impl RenderTarget {
    pub fn open<P: RenderPort + ?Sized>(port: &mut P) -> Self {
        Self {
            id: port.open_reply(),
            markup: String::new(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn append<P: RenderPort + ?Sized>(&mut self, port: &mut P, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        self.markup.push_str(fragment);
        port.append_to_reply(self.id, fragment);
    }

    pub fn seal<P: RenderPort + ?Sized>(self, port: &mut P) -> (MessageId, String) {
        port.close_reply(self.id);
        (self.id, self.markup)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Completed {
        reply: MessageId,
        markup: String,
    },
    Failed {
        reply: Option<MessageId>,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Rejected,
    Completed { language: String },
    Failed { error: String },
}

/// Stream one reply into `port`.
///
/// A typing indicator is shown until the first event arrives or the request
/// ends. Failures never touch content already rendered; they add one separate
/// error message instead.
pub async fn stream_reply<T, P>(transport: &T, request: &ChatRequest, port: &mut P) -> ReplyOutcome
where
    T: ChatTransport + ?Sized,
    P: RenderPort + ?Sized,
{
    let mut typing = Some(port.show_typing());
    port.scroll_to_latest();

    let bytes = match transport.open_stream(request).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(%error, "chat request failed");
            let error = error.to_string();
            report_failure(port, typing.take(), &error);
            return ReplyOutcome::Failed { reply: None, error };
        }
    };

    let mut target = RenderTarget::open(port);
    let mut events = into_events(bytes);
    let mut data_records = 0usize;

    while let Some(item) = events.next().await {
        if let Some(indicator) = typing.take() {
            port.hide_typing(indicator);
        }
        match item {
            Ok(StreamEvent::Data(payload)) => {
                data_records += 1;
                target.append(port, &format_message(&payload));
            }
            Ok(StreamEvent::Start) => tracing::debug!("reply stream opened"),
            Ok(StreamEvent::End) => tracing::debug!("reply stream end marker"),
            Err(error) => {
                tracing::warn!(%error, data_records, "reply stream failed mid-way");
                let (reply, _) = target.seal(port);
                let error = error.to_string();
                report_failure(port, None, &error);
                return ReplyOutcome::Failed {
                    reply: Some(reply),
                    error,
                };
            }
        }
        port.scroll_to_latest();
    }

    if let Some(indicator) = typing.take() {
        port.hide_typing(indicator);
    }
    port.scroll_to_latest();
    let (reply, markup) = target.seal(port);
    tracing::info!(data_records, markup_len = markup.len(), "reply complete");
    ReplyOutcome::Completed { reply, markup }
}

fn report_failure<P: RenderPort + ?Sized>(port: &mut P, typing: Option<MessageId>, error: &str) {
    if let Some(indicator) = typing {
        port.hide_typing(indicator);
    }
    port.append_message(MessageRole::Bot, plain_text(&format!("Error: {error}")));
    port.scroll_to_latest();
}

/// Run one code analysis into the analyzer panel. Blank code is rejected
/// locally with a prompt and no request.
pub async fn run_analysis<T, P>(
    transport: &T,
    code: &str,
    language: &str,
    port: &mut P,
) -> AnalysisOutcome
where
    T: ChatTransport + ?Sized,
    P: RenderPort + ?Sized,
{
    let code = code.trim();
    if code.is_empty() {
        port.show_analysis(AnalysisPanel::Prompt);
        return AnalysisOutcome::Rejected;
    }

    port.show_analysis(AnalysisPanel::Analyzing);
    let request = AnalyzeRequest {
        code: code.to_string(),
        language: language.to_string(),
    };

    match transport.analyze(&request).await {
        Ok(response) => {
            let markup = format!(
                "<strong>Language:</strong> {}<br><br>{}",
                escape_html(&response.language),
                format_message(&response.analysis)
            );
            port.show_analysis(AnalysisPanel::Result(markup));
            AnalysisOutcome::Completed {
                language: response.language,
            }
        }
        Err(error) => {
            tracing::warn!(%error, "code analysis failed");
            let error = error.to_string();
            port.show_analysis(AnalysisPanel::Failed(plain_text(&format!("Error: {error}"))));
            AnalysisOutcome::Failed { error }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockApiClient, MockReply};
    use crate::state::Conversation;
    use crate::types::Mode;

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            mode: Mode::Chat,
            personality: "friendly".to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn typing_indicator_is_gone_after_completion() {
        let client = MockApiClient::new(vec![MockReply::text_chunks(["data: hi\n\n"])]);
        let mut conversation = Conversation::new();

        let outcome = stream_reply(&client, &request("hello"), &mut conversation).await;

        assert!(matches!(outcome, ReplyOutcome::Completed { ref markup, .. } if markup == "hi"));
        assert!(conversation
            .messages()
            .iter()
            .all(|m| m.role != MessageRole::Typing));
    }

    #[tokio::test]
    async fn empty_stream_leaves_an_empty_sealed_reply() {
        let client = MockApiClient::new(vec![MockReply::Chunks(Vec::new())]);
        let mut conversation = Conversation::new();

        let outcome = stream_reply(&client, &request("hello"), &mut conversation).await;

        let ReplyOutcome::Completed { reply, markup } = outcome else {
            panic!("expected completion");
        };
        assert!(markup.is_empty());
        let message = conversation.message(reply).expect("reply exists");
        assert!(message.sealed);
        assert_eq!(conversation.messages().len(), 1);
    }

    #[tokio::test]
    async fn payload_markup_is_escaped_before_rendering() {
        let client = MockApiClient::new(vec![MockReply::text_chunks([
            "data: <img src=x onerror='boom'>\n\n",
            "data: ### Done\\n**ok**\n\n",
        ])]);
        let mut conversation = Conversation::new();

        let outcome = stream_reply(&client, &request("hello"), &mut conversation).await;

        let ReplyOutcome::Completed { markup, .. } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(
            markup,
            "&lt;img src=x onerror=&#039;boom&#039;&gt;<h3>Done</h3><br><strong>ok</strong>"
        );
    }

    #[test]
    fn render_target_seal_reports_accumulated_markup() {
        let mut conversation = Conversation::new();
        let mut target = RenderTarget::open(&mut conversation);
        target.append(&mut conversation, "a");
        target.append(&mut conversation, "");
        target.append(&mut conversation, "b");
        assert_eq!(target.markup(), "ab");
        let id = target.id();

        let (sealed_id, markup) = target.seal(&mut conversation);
        assert_eq!(sealed_id, id);
        assert_eq!(markup, "ab");
        assert!(conversation.message(id).map(|m| m.sealed).unwrap_or(false));
    }
}
