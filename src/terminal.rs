use crossterm::{
    cursor::Show,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::sync::Once;

pub type TerminalType = Terminal<CrosstermBackend<Stdout>>;

static PANIC_HOOK: Once = Once::new();

/// Restore the terminal before the default hook prints, so panic output is
/// readable instead of landing in the alternate screen.
pub fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            previous(info);
        }));
    });
}

/// Raw mode plus alternate screen. Bracketed paste is on so pasted code
/// arrives as one event rather than a burst of keystrokes.
pub fn setup() -> anyhow::Result<TerminalType> {
    install_panic_hook();

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, EnableBracketedPaste)?;

    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;
    Ok(terminal)
}

/// Best effort: every step runs even if an earlier one failed.
pub fn restore() {
    if let Err(error) = disable_raw_mode() {
        tracing::warn!(%error, "failed to leave raw mode");
    }
    if let Err(error) = execute!(
        io::stdout(),
        LeaveAlternateScreen,
        DisableBracketedPaste,
        Show
    ) {
        tracing::warn!(%error, "failed to restore terminal screen");
    }
}
