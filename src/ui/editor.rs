use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollAction {
    PageUp,
    PageDown,
    Top,
    Bottom,
}

#[derive(Debug, PartialEq, Eq)]
pub enum InputAction {
    None,
    Submit(String),
    ToggleCodeMode,
    OpenAnalyzer,
    Scroll(ScrollAction),
    Quit,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Draft {
    buffer: String,
    cursor: usize,
}

/// Multi-line text buffer with a byte cursor kept on char boundaries.
/// Used for both the chat prompt and the analyzer's code box.
#[derive(Debug, Default)]
pub struct InputEditor {
    draft: Draft,
    history: Vec<String>,
    history_index: Option<usize>,
    history_stash: Option<Draft>,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.draft.buffer
    }

    pub fn cursor(&self) -> usize {
        self.draft.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.draft.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.draft = Draft::default();
        self.history_index = None;
        self.history_stash = None;
    }

    fn clamp_left(&self, idx: usize) -> usize {
        let mut idx = idx.min(self.draft.buffer.len());
        while idx > 0 && !self.draft.buffer.is_char_boundary(idx) {
            idx -= 1;
        }
        idx
    }

    fn prev_char_boundary(&self, idx: usize) -> usize {
        let i = self.clamp_left(idx);
        self.draft.buffer[..i]
            .chars()
            .next_back()
            .map_or(0, |ch| i - ch.len_utf8())
    }

    fn next_char_boundary(&self, idx: usize) -> usize {
        let i = self.clamp_left(idx);
        self.draft.buffer[i..]
            .chars()
            .next()
            .map_or(self.draft.buffer.len(), |ch| i + ch.len_utf8())
    }

    fn detach_history(&mut self) {
        self.history_index = None;
        self.history_stash = None;
    }

    pub fn insert_str(&mut self, value: &str) {
        self.detach_history();
        let cursor = self.clamp_left(self.draft.cursor);
        self.draft.buffer.insert_str(cursor, value);
        self.draft.cursor = cursor + value.len();
    }

    pub fn backspace(&mut self) {
        let end = self.clamp_left(self.draft.cursor);
        if end == 0 {
            return;
        }
        self.detach_history();
        let start = self.prev_char_boundary(end);
        self.draft.buffer.replace_range(start..end, "");
        self.draft.cursor = start;
    }

    pub fn delete(&mut self) {
        let start = self.clamp_left(self.draft.cursor);
        if start >= self.draft.buffer.len() {
            return;
        }
        self.detach_history();
        let end = self.next_char_boundary(start);
        self.draft.buffer.replace_range(start..end, "");
        self.draft.cursor = start;
    }

    pub fn move_left(&mut self) {
        self.draft.cursor = self.prev_char_boundary(self.draft.cursor);
    }

    pub fn move_right(&mut self) {
        self.draft.cursor = self.next_char_boundary(self.draft.cursor);
    }

    pub fn move_home(&mut self) {
        self.draft.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.draft.cursor = self.draft.buffer.len();
    }

    /// Take the buffer for sending. Blank buffers are left alone and yield `None`.
    pub fn submit(&mut self) -> Option<String> {
        let value = self.draft.buffer.trim().to_string();
        if value.is_empty() {
            return None;
        }
        self.history.push(value.clone());
        self.clear();
        Some(value)
    }

    pub fn history_up(&mut self) {
        if self.history.is_empty() {
            return;
        }
        if self.history_index.is_none() {
            self.history_stash = Some(self.draft.clone());
        }
        let next = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.show_history_entry(next);
    }

    pub fn history_down(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };
        if idx + 1 < self.history.len() {
            self.show_history_entry(idx + 1);
            return;
        }
        self.history_index = None;
        self.draft = self.history_stash.take().unwrap_or_default();
    }

    fn show_history_entry(&mut self, idx: usize) {
        self.history_index = Some(idx);
        self.draft.buffer = self.history[idx].clone();
        self.draft.cursor = self.draft.buffer.len();
    }

    /// Edit keys shared by the prompt and the code box. Returns false when
    /// the key is not an editing key.
    pub fn apply_edit_key(&mut self, key: KeyEvent) -> bool {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('j') if control => self.insert_str("\n"),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => self.insert_str("\n"),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home if !control => self.move_home(),
            KeyCode::End if !control => self.move_end(),
            KeyCode::Char(ch) if !control && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.insert_str(ch.encode_utf8(&mut [0; 4]))
            }
            _ => return false,
        }
        true
    }

    /// Key map for the chat prompt.
    pub fn apply_key(&mut self, key: KeyEvent) -> InputAction {
        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if control => return InputAction::Quit,
            KeyCode::Char('d') if control => {
                if self.is_empty() {
                    return InputAction::Quit;
                }
            }
            KeyCode::Char('k') if control => return InputAction::OpenAnalyzer,
            KeyCode::Char('t') if control => return InputAction::ToggleCodeMode,
            KeyCode::Enter if !key.modifiers.contains(KeyModifiers::SHIFT) => {
                return self.submit().map_or(InputAction::None, InputAction::Submit);
            }
            KeyCode::Up => self.history_up(),
            KeyCode::Down => self.history_down(),
            KeyCode::PageUp => return InputAction::Scroll(ScrollAction::PageUp),
            KeyCode::PageDown => return InputAction::Scroll(ScrollAction::PageDown),
            KeyCode::Home if control => return InputAction::Scroll(ScrollAction::Top),
            KeyCode::End if control => return InputAction::Scroll(ScrollAction::Bottom),
            _ => {
                self.apply_edit_key(key);
            }
        }
        InputAction::None
    }
}
