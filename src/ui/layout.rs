use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatPanes {
    pub status: Rect,
    pub history: Rect,
    pub input: Rect,
}

/// Status line on top, chat history in the middle, the prompt at the bottom.
pub fn split_chat_panes(area: Rect, input_rows: u16) -> ChatPanes {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(input_rows.max(1)),
        ])
        .split(area);

    ChatPanes {
        status: chunks[0],
        history: chunks[1],
        input: chunks[2],
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnalyzerPanes {
    pub frame: Rect,
    pub code: Rect,
    pub result: Rect,
}

/// Centered analyzer modal: code box above, result panel below.
pub fn analyzer_panes(area: Rect) -> AnalyzerPanes {
    let width = area.width.saturating_mul(4) / 5;
    let height = area.height.saturating_mul(4) / 5;
    let frame = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    let inner = Rect::new(
        frame.x.saturating_add(1),
        frame.y.saturating_add(1),
        frame.width.saturating_sub(2),
        frame.height.saturating_sub(2),
    );
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(inner);

    AnalyzerPanes {
        frame,
        code: chunks[0],
        result: chunks[1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_panes_split_top_to_bottom() {
        let panes = split_chat_panes(Rect::new(0, 0, 80, 20), 4);

        assert_eq!(panes.status.height, 1);
        assert_eq!(panes.history.height, 15);
        assert_eq!(panes.input.height, 4);
        assert_eq!(panes.history.y, 1);
        assert_eq!(panes.input.y, 16);
    }

    #[test]
    fn analyzer_modal_is_centered_inside_the_screen() {
        let area = Rect::new(0, 0, 100, 50);
        let panes = analyzer_panes(area);

        assert_eq!(panes.frame, Rect::new(10, 5, 80, 40));
        assert_eq!(panes.code.width, 78);
        assert_eq!(panes.code.height + panes.result.height, 38);
        assert!(panes.result.y >= panes.code.y + panes.code.height);
    }
}
