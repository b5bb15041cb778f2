use crate::api::ChatTransport;
use crate::config::Config;
use crate::format::{code_block, format_message, is_code_like};
use crate::runtime::consumer::{run_analysis, stream_reply, AnalysisOutcome, ReplyOutcome};
use crate::runtime::frontend::{AnalysisPanel, MessageRole, RenderPort, UserInputEvent};
use crate::runtime::update::UiUpdate;
use crate::state::session::KNOWN_PERSONALITIES;
use crate::state::{Conversation, Session};
use crate::types::Mode;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const ANALYZE_LANGUAGES: [&str; 14] = [
    "auto",
    "python",
    "javascript",
    "java",
    "c",
    "cpp",
    "csharp",
    "php",
    "sql",
    "html",
    "css",
    "bash",
    "react",
    "flask",
];

/// Result of handing one line of input to the app.
pub enum SubmitOutcome {
    /// Blank input: nothing rendered, nothing sent.
    Ignored,
    /// Handled locally as a command.
    Command,
    /// A reply is streaming in the background.
    Sent(JoinHandle<ReplyOutcome>),
}

/// Owns the session, the conversation view, and the channel replies render
/// through. Reply tasks never touch the conversation directly; the UI loop
/// applies their updates in arrival order.
pub struct App<T: ChatTransport + 'static> {
    transport: Arc<T>,
    session: Session,
    conversation: Conversation,
    analyze_language: String,
    server_label: String,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
    update_rx: mpsc::UnboundedReceiver<UiUpdate>,
    quit_requested: bool,
}

impl<T: ChatTransport + 'static> App<T> {
    pub fn new(transport: T, session: Session) -> Self {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        Self {
            transport: Arc::new(transport),
            session,
            conversation: Conversation::new(),
            analyze_language: ANALYZE_LANGUAGES[0].to_string(),
            server_label: String::new(),
            update_tx,
            update_rx,
            quit_requested: false,
        }
    }

    pub fn from_config(transport: T, config: &Config) -> Self {
        let mut app = Self::new(transport, Session::from_config(config));
        app.analyze_language = config.analyze_language.clone();
        app.server_label = config.server_url.clone();
        app
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn conversation_mut(&mut self) -> &mut Conversation {
        &mut self.conversation
    }

    pub fn analyze_language(&self) -> &str {
        &self.analyze_language
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn status_line(&self) -> String {
        let coder = if self.session.code_mode() { "on" } else { "off" };
        let mut status = format!(
            "personality:{} mode:{} coder:{}",
            self.session.personality(),
            self.session.request_mode(),
            coder
        );
        if !self.server_label.is_empty() {
            status.push_str(" server:");
            status.push_str(&self.server_label);
        }
        status
    }

    pub fn handle_input(&mut self, event: UserInputEvent) {
        match event {
            UserInputEvent::Submit(text) => {
                self.submit(&text);
            }
            UserInputEvent::ToggleCodeMode => self.toggle_code_mode(),
            UserInputEvent::Analyze { code, language } => {
                self.analyze(&code, &language);
            }
            UserInputEvent::Quit => self.quit_requested = true,
        }
    }

    pub fn submit(&mut self, input: &str) -> SubmitOutcome {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return SubmitOutcome::Ignored;
        }
        if self.handle_command(trimmed) {
            return SubmitOutcome::Command;
        }
        let Some(request) = self.session.build_request(trimmed) else {
            return SubmitOutcome::Ignored;
        };

        let markup = if is_code_like(&request.message) {
            code_block(&request.message)
        } else {
            format_message(&request.message)
        };
        self.conversation.append_message(MessageRole::User, markup);
        self.conversation.scroll_to_latest();

        let transport = Arc::clone(&self.transport);
        let mut sink = self.conversation.sink(self.update_tx.clone());
        let handle = tokio::spawn(async move {
            stream_reply(transport.as_ref(), &request, &mut sink).await
        });
        SubmitOutcome::Sent(handle)
    }

    /// Returns the spawned task, or `None` when blank code was rejected locally.
    pub fn analyze(&mut self, code: &str, language: &str) -> Option<JoinHandle<AnalysisOutcome>> {
        let language = if language.trim().is_empty() {
            self.analyze_language.clone()
        } else {
            language.trim().to_string()
        };
        self.analyze_language = language.clone();

        if code.trim().is_empty() {
            self.conversation.show_analysis(AnalysisPanel::Prompt);
            return None;
        }

        let transport = Arc::clone(&self.transport);
        let code = code.to_string();
        let mut sink = self.conversation.sink(self.update_tx.clone());
        Some(tokio::spawn(async move {
            run_analysis(transport.as_ref(), &code, &language, &mut sink).await
        }))
    }

    pub fn toggle_code_mode(&mut self) {
        self.session = self.session.with_code_mode_toggled();
        let notice = if self.session.code_mode() {
            "Coder mode: ON"
        } else {
            "Coder mode: OFF"
        };
        self.push_notice(notice);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.session = self.session.with_mode(mode);
        self.push_notice(&format!("Switched to {mode} mode."));
    }

    pub fn set_personality(&mut self, personality: &str) -> bool {
        let personality = personality.trim().to_ascii_lowercase();
        if !KNOWN_PERSONALITIES.contains(&personality.as_str()) {
            self.push_notice(&format!(
                "Unknown personality '{personality}'. Try one of: {}.",
                KNOWN_PERSONALITIES.join(", ")
            ));
            return false;
        }
        self.session = self.session.with_personality(personality.clone());
        self.push_notice(&format!("Personality set to {personality}."));
        true
    }

    /// Apply every pending render update. Returns how many were applied.
    pub fn drain_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.update_rx.try_recv() {
            self.conversation.apply(update);
            applied += 1;
        }
        applied
    }

    fn handle_command(&mut self, input: &str) -> bool {
        let (command, argument) = split_command(input);

        match command {
            "/quit" | "/exit" => {
                self.quit_requested = true;
                true
            }
            "/code" => {
                self.toggle_code_mode();
                true
            }
            "/mode" => {
                match argument.parse::<Mode>() {
                    Ok(mode) => self.set_mode(mode),
                    Err(message) => self.push_notice(&message),
                }
                true
            }
            "/personality" => {
                self.set_personality(argument);
                true
            }
            "/analyze" => {
                let language = self.analyze_language.clone();
                self.analyze(argument, &language);
                true
            }
            _ => false,
        }
    }

    fn push_notice(&mut self, text: &str) {
        self.conversation
            .append_message(MessageRole::Bot, format_message(text));
        self.conversation.scroll_to_latest();
    }
}

/// Split `/name rest` into the command word and its trimmed argument.
fn split_command(input: &str) -> (&str, &str) {
    let mut parts = input.splitn(2, char::is_whitespace);
    let command = parts.next().unwrap_or_default();
    let argument = parts.next().map(str::trim).unwrap_or_default();
    (command, argument)
}

/// True when submitting `input` runs the code analyzer.
pub fn is_analyze_command(input: &str) -> bool {
    split_command(input.trim_start()).0 == "/analyze"
}
