use crate::runtime::frontend::{AnalysisPanel, MessageRole};
use crate::state::conversation::WELCOME_TEXT;
use crate::state::Conversation;
use crate::ui::analyzer::AnalyzerDraft;
use crate::ui::input_metrics::{
    cursor_row_col, truncate_with_ellipsis, wrap_input_lines, wrap_styled_lines,
};
use crate::ui::layout::analyzer_panes;
use crate::ui::markup::markup_to_lines;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn input_visual_rows(input: &str, width: usize) -> usize {
    wrap_input_lines(input, width).len().max(1)
}

/// Styled, unwrapped lines for the whole chat history.
pub fn history_lines(conversation: &Conversation) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if conversation.welcome_visible() {
        lines.push(Line::from(Span::styled(
            WELCOME_TEXT,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::default());
    }

    for message in conversation.messages() {
        match message.role {
            MessageRole::Typing => {
                lines.push(Line::from(vec![
                    role_label(MessageRole::Bot),
                    Span::styled(
                        message.markup.clone(),
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    ),
                ]));
            }
            role => {
                let mut body = markup_to_lines(&message.markup, Style::default());
                if let Some(first) = body.first_mut() {
                    first.spans.insert(0, role_label(role));
                }
                lines.extend(body);
            }
        }
        lines.push(Line::default());
    }
    lines
}

fn role_label(role: MessageRole) -> Span<'static> {
    match role {
        MessageRole::User => Span::styled(
            "you  ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        MessageRole::Bot | MessageRole::Typing => Span::styled(
            "bot  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
    }
}

/// Top row index for a viewport of `viewport` rows that sits `from_bottom`
/// rows above the end of `total` rows.
pub fn scroll_offset(total: usize, viewport: usize, from_bottom: usize) -> usize {
    let max_offset = total.saturating_sub(viewport);
    max_offset.saturating_sub(from_bottom)
}

/// `lines` must already be wrapped to `area.width`.
pub fn render_history(frame: &mut Frame<'_>, area: Rect, lines: &[Line<'static>], offset: usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let visible: Vec<Line<'static>> = lines
        .iter()
        .skip(offset)
        .take(area.height as usize)
        .cloned()
        .collect();
    frame.render_widget(
        Paragraph::new(visible).style(Style::default().fg(Color::White)),
        area,
    );
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize) {
    if area.height == 0 || area.width <= 2 {
        return;
    }

    let input_width = area.width.saturating_sub(2).max(1) as usize;
    let lines = wrap_input_lines(input, input_width);
    let (cursor_row, cursor_col) = cursor_row_col(input, cursor_byte, input_width);
    let visible_rows = area.height as usize;
    let window_start = cursor_row.saturating_add(1).saturating_sub(visible_rows);

    let rendered: Vec<Line<'static>> = (0..visible_rows)
        .map(|offset| {
            let row_index = window_start + offset;
            let prefix = if row_index == 0 { "> " } else { "  " };
            let line = lines.get(row_index).cloned().unwrap_or_default();
            Line::from(format!("{prefix}{line}"))
        })
        .collect();

    frame.render_widget(
        Paragraph::new(rendered).style(Style::default().fg(Color::Gray).bg(Color::Rgb(24, 24, 24))),
        area,
    );

    let cursor_y = area
        .y
        .saturating_add(cursor_row.saturating_sub(window_start) as u16);
    let cursor_x = area
        .x
        .saturating_add(2 + cursor_col as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, cursor_y));
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    frame.render_widget(
        Paragraph::new(truncate_with_ellipsis(status, area.width as usize))
            .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

/// Analyzer modal over the chat: editable code on top, the last result below.
pub fn render_analyzer(frame: &mut Frame<'_>, draft: &AnalyzerDraft, panel: Option<&AnalysisPanel>) {
    let panes = analyzer_panes(frame.area());
    if panes.code.height == 0 || panes.code.width <= 2 {
        return;
    }
    frame.render_widget(Clear, panes.frame);
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(
                " Code analyzer [{}]  Tab language  Ctrl+R run  Esc close ",
                draft.language()
            ))
            .style(Style::default().fg(Color::Yellow)),
        panes.frame,
    );

    let result_lines = match panel {
        Some(panel) => markup_to_lines(panel.markup(), Style::default().fg(Color::White)),
        None => vec![Line::from(Span::styled(
            AnalysisPanel::Prompt.markup().to_string(),
            Style::default().fg(Color::DarkGray),
        ))],
    };
    let width = panes.result.width.max(1) as usize;
    let wrapped = wrap_styled_lines(result_lines, width);
    frame.render_widget(
        Paragraph::new(wrapped).block(Block::default().borders(Borders::TOP).title(" Result ")),
        panes.result,
    );

    render_input(frame, panes.code, draft.code().buffer(), draft.code().cursor());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::frontend::RenderPort;

    fn text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn welcome_shows_until_the_first_message() {
        let mut conversation = Conversation::new();
        assert_eq!(text(&history_lines(&conversation)[0]), WELCOME_TEXT);

        conversation.append_message(MessageRole::User, "hi".to_string());
        let lines = history_lines(&conversation);
        assert_eq!(text(&lines[0]), "you  hi");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn bot_markup_spans_multiple_lines_with_one_label() {
        let mut conversation = Conversation::new();
        let id = conversation.open_reply();
        conversation.append_to_reply(id, "<strong>a</strong><br>b");

        let lines = history_lines(&conversation);
        assert_eq!(text(&lines[0]), "bot  a");
        assert_eq!(text(&lines[1]), "b");
    }

    #[test]
    fn typing_indicator_renders_as_a_dim_bot_line() {
        let mut conversation = Conversation::new();
        conversation.show_typing();

        let lines = history_lines(&conversation);
        assert_eq!(text(&lines[0]), WELCOME_TEXT);
        assert_eq!(text(&lines[2]), "bot  Typing...");
    }

    #[test]
    fn scroll_offset_clamps_to_the_top() {
        assert_eq!(scroll_offset(100, 20, 0), 80);
        assert_eq!(scroll_offset(100, 20, 30), 50);
        assert_eq!(scroll_offset(100, 20, 500), 0);
        assert_eq!(scroll_offset(5, 20, 0), 0);
    }
}
