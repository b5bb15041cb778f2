use anyhow::Result;
use botpane::api::logging::init_tracing;
use botpane::api::ApiClient;
use botpane::app::{is_analyze_command, App};
use botpane::config::Config;
use botpane::runtime::frontend::{FrontendAdapter, UserInputEvent};
use botpane::runtime::r#loop::run;
use botpane::terminal;
use botpane::ui::analyzer::{AnalyzerAction, AnalyzerDraft};
use botpane::ui::editor::{InputAction, InputEditor, ScrollAction};
use botpane::ui::input_metrics::wrap_styled_lines;
use botpane::ui::layout::split_chat_panes;
use botpane::ui::render::{
    history_lines, input_visual_rows, render_analyzer, render_history, render_input,
    render_status_line, scroll_offset,
};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::widgets::Clear;
use std::time::Duration;

const MAX_INPUT_ROWS: usize = 8;

struct TuiFrontend {
    terminal: terminal::TerminalType,
    quit: bool,
    input: InputEditor,
    analyzer: Option<AnalyzerDraft>,
    /// Rows between the bottom of the history view and the newest line.
    from_bottom: usize,
    viewport_rows: usize,
}

impl TuiFrontend {
    fn new() -> Result<Self> {
        Ok(Self {
            terminal: terminal::setup()?,
            quit: false,
            input: InputEditor::new(),
            analyzer: None,
            from_bottom: 0,
            viewport_rows: 1,
        })
    }

    fn scroll(&mut self, action: ScrollAction) {
        let page = self.viewport_rows.saturating_sub(1).max(1);
        self.from_bottom = match action {
            ScrollAction::PageUp => self.from_bottom.saturating_add(page),
            ScrollAction::PageDown => self.from_bottom.saturating_sub(page),
            ScrollAction::Top => usize::MAX,
            ScrollAction::Bottom => 0,
        };
    }

    fn map_chat_key(&mut self, key: KeyEvent, language: &str) -> Option<UserInputEvent> {
        match self.input.apply_key(key) {
            InputAction::None => None,
            InputAction::Submit(text) => {
                self.from_bottom = 0;
                if is_analyze_command(&text) {
                    self.analyzer = Some(AnalyzerDraft::new(language));
                }
                Some(UserInputEvent::Submit(text))
            }
            InputAction::ToggleCodeMode => Some(UserInputEvent::ToggleCodeMode),
            InputAction::OpenAnalyzer => {
                self.analyzer = Some(AnalyzerDraft::new(language));
                None
            }
            InputAction::Scroll(action) => {
                self.scroll(action);
                None
            }
            InputAction::Quit => Some(UserInputEvent::Quit),
        }
    }

    fn map_analyzer_key(&mut self, key: KeyEvent) -> Option<UserInputEvent> {
        let draft = self.analyzer.as_mut()?;
        match draft.apply_key(key) {
            AnalyzerAction::None => None,
            AnalyzerAction::Run { code, language } => {
                Some(UserInputEvent::Analyze { code, language })
            }
            AnalyzerAction::Close => {
                self.analyzer = None;
                None
            }
            AnalyzerAction::Quit => Some(UserInputEvent::Quit),
        }
    }
}

impl Drop for TuiFrontend {
    fn drop(&mut self) {
        terminal::restore();
    }
}

impl FrontendAdapter<ApiClient> for TuiFrontend {
    fn poll_user_input(&mut self, app: &App<ApiClient>) -> Option<UserInputEvent> {
        // Never block here: reply tasks share this thread.
        let has_event = match event::poll(Duration::ZERO) {
            Ok(has_event) => has_event,
            Err(error) => {
                tracing::error!(%error, "terminal event poll failed");
                self.quit = true;
                return None;
            }
        };
        if !has_event {
            return None;
        }

        let ev = match event::read() {
            Ok(ev) => ev,
            Err(error) => {
                tracing::error!(%error, "terminal event read failed");
                self.quit = true;
                return None;
            }
        };

        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Release => None,
            Event::Key(key) if self.analyzer.is_some() => self.map_analyzer_key(key),
            Event::Key(key) => self.map_chat_key(key, app.analyze_language()),
            Event::Paste(text) => {
                match self.analyzer.as_mut() {
                    Some(draft) => draft.paste(&text),
                    None => self.input.insert_str(&text.replace("\r\n", "\n")),
                }
                None
            }
            _ => None,
        }
    }

    fn render(&mut self, app: &App<ApiClient>) {
        let status = app.status_line();
        let history = history_lines(app.conversation());
        let panel = app.conversation().analysis();
        let input = self.input.buffer();
        let cursor = self.input.cursor();
        let analyzer = self.analyzer.as_ref();
        let mut from_bottom = self.from_bottom;
        let mut viewport_rows = self.viewport_rows;

        let drawn = self.terminal.draw(|frame| {
            let area = frame.area();
            frame.render_widget(Clear, area);
            let input_width = area.width.saturating_sub(2).max(1) as usize;
            let input_rows = input_visual_rows(input, input_width).min(MAX_INPUT_ROWS) as u16;
            let panes = split_chat_panes(area, input_rows);

            let wrapped = wrap_styled_lines(history, panes.history.width as usize);
            viewport_rows = panes.history.height as usize;
            from_bottom = from_bottom.min(wrapped.len().saturating_sub(viewport_rows));
            let offset = scroll_offset(wrapped.len(), viewport_rows, from_bottom);

            render_status_line(frame, panes.status, &status);
            render_history(frame, panes.history, &wrapped, offset);
            render_input(frame, panes.input, input, cursor);
            if let Some(draft) = analyzer {
                render_analyzer(frame, draft, panel);
            }
        });

        self.from_bottom = from_bottom;
        self.viewport_rows = viewport_rows.max(1);
        if let Err(error) = drawn {
            tracing::error!(%error, "terminal draw failed");
            self.quit = true;
        }
    }

    fn should_quit(&self) -> bool {
        self.quit
    }

    fn follow_latest(&mut self) {
        self.from_bottom = 0;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing()?;
    let config = Config::load()?;
    config.validate()?;
    tracing::info!(server = %config.server_url, personality = %config.personality, "starting");

    let mut app = App::from_config(ApiClient::new(&config), &config);
    let mut frontend = TuiFrontend::new()?;
    run(&mut app, &mut frontend).await;
    tracing::info!("exiting");
    Ok(())
}
