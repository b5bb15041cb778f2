use super::editor::InputEditor;
use crate::app::ANALYZE_LANGUAGES;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum AnalyzerAction {
    None,
    Run { code: String, language: String },
    Close,
    Quit,
}

/// The analyzer overlay's local state: the code being edited and the
/// selected language. The result panel itself lives in the conversation.
#[derive(Debug)]
pub struct AnalyzerDraft {
    code: InputEditor,
    language_index: usize,
}

impl AnalyzerDraft {
    pub fn new(language: &str) -> Self {
        let language_index = ANALYZE_LANGUAGES
            .iter()
            .position(|candidate| candidate.eq_ignore_ascii_case(language))
            .unwrap_or(0);
        Self {
            code: InputEditor::new(),
            language_index,
        }
    }

    pub fn code(&self) -> &InputEditor {
        &self.code
    }

    pub fn language(&self) -> &'static str {
        ANALYZE_LANGUAGES[self.language_index]
    }

    pub fn cycle_language(&mut self, forward: bool) {
        let count = ANALYZE_LANGUAGES.len();
        self.language_index = if forward {
            (self.language_index + 1) % count
        } else {
            (self.language_index + count - 1) % count
        };
    }

    pub fn paste(&mut self, text: &str) {
        self.code.insert_str(&text.replace("\r\n", "\n"));
    }

    /// Plain Enter inserts a newline here; running is Ctrl+R.
    pub fn apply_key(&mut self, key: KeyEvent) -> AnalyzerAction {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if control => return AnalyzerAction::Quit,
            KeyCode::Esc => return AnalyzerAction::Close,
            KeyCode::Char('r') if control => {
                return AnalyzerAction::Run {
                    code: self.code.buffer().to_string(),
                    language: self.language().to_string(),
                }
            }
            KeyCode::Tab => self.cycle_language(true),
            KeyCode::BackTab => self.cycle_language(false),
            KeyCode::Enter => self.code.insert_str("\n"),
            _ => {
                self.code.apply_edit_key(key);
            }
        }
        AnalyzerAction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn starts_on_the_configured_language() {
        assert_eq!(AnalyzerDraft::new("Python").language(), "python");
        assert_eq!(AnalyzerDraft::new("cobol").language(), "auto");
    }

    #[test]
    fn tab_cycles_and_wraps() {
        let mut draft = AnalyzerDraft::new("auto");
        draft.apply_key(key(KeyCode::BackTab));
        assert_eq!(draft.language(), "flask");
        draft.apply_key(key(KeyCode::Tab));
        draft.apply_key(key(KeyCode::Tab));
        assert_eq!(draft.language(), "python");
    }

    #[test]
    fn ctrl_r_runs_with_the_current_code_and_language() {
        let mut draft = AnalyzerDraft::new("bash");
        draft.paste("echo hi\r\nls");
        draft.apply_key(key(KeyCode::Enter));

        let action = draft.apply_key(KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL));
        assert_eq!(
            action,
            AnalyzerAction::Run {
                code: "echo hi\nls\n".to_string(),
                language: "bash".to_string(),
            }
        );
        assert_eq!(draft.apply_key(key(KeyCode::Esc)), AnalyzerAction::Close);
    }
}
