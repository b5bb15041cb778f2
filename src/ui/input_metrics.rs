use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn char_display_width(ch: char) -> usize {
    UnicodeWidthChar::width(ch).unwrap_or(0)
}

pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Hard-wrap `input` at `width` columns, honoring explicit newlines.
pub fn wrap_input_lines(input: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = vec![String::new()];
    let mut used = 0usize;

    for ch in input.chars().filter(|ch| *ch != '\r') {
        if ch == '\n' {
            lines.push(String::new());
            used = 0;
            continue;
        }
        let ch_width = char_display_width(ch);
        if used + ch_width > width && used > 0 {
            lines.push(String::new());
            used = 0;
        }
        if let Some(line) = lines.last_mut() {
            line.push(ch);
        }
        used += ch_width;
    }
    lines
}

/// Visual (row, column) of a byte cursor under the same wrapping rules.
pub fn cursor_row_col(input: &str, cursor_byte: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let mut row = 0usize;
    let mut col = 0usize;

    for (idx, ch) in input.char_indices() {
        if idx >= cursor_byte {
            break;
        }
        match ch {
            '\r' => {}
            '\n' => {
                row += 1;
                col = 0;
            }
            _ => {
                let ch_width = char_display_width(ch);
                if col + ch_width > width && col > 0 {
                    row += 1;
                    col = 0;
                }
                col += ch_width;
            }
        }
    }

    if col >= width {
        row += 1;
        col = 0;
    }
    (row, col)
}

/// Hard-wrap styled lines to `width` columns, keeping each span's style.
/// Empty lines stay as one empty row.
pub fn wrap_styled_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    let width = width.max(1);
    let mut out = Vec::with_capacity(lines.len());

    for line in lines {
        let mut row: Vec<Span<'static>> = Vec::new();
        let mut used = 0usize;
        for span in line.spans {
            let mut piece = String::new();
            for ch in span.content.chars() {
                let ch_width = char_display_width(ch);
                if used + ch_width > width && used > 0 {
                    if !piece.is_empty() {
                        row.push(Span::styled(std::mem::take(&mut piece), span.style));
                    }
                    out.push(Line::from(std::mem::take(&mut row)));
                    used = 0;
                }
                piece.push(ch);
                used += ch_width;
            }
            if !piece.is_empty() {
                row.push(Span::styled(piece, span.style));
            }
        }
        out.push(Line::from(row));
    }
    out
}

/// Cut `text` to `width` columns, ending in `...` when something was dropped.
pub fn truncate_with_ellipsis(text: &str, width: usize) -> String {
    let width = width.max(1);
    if display_width(text) <= width {
        return text.to_string();
    }
    let (budget, suffix) = if width >= 4 { (width - 3, "...") } else { (width, "") };

    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > budget {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out.push_str(suffix);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_breaks_on_width_and_newlines() {
        assert_eq!(wrap_input_lines("abcdef\ngh", 4), ["abcd", "ef", "gh"]);
        assert_eq!(wrap_input_lines("", 4), [""]);
    }

    #[test]
    fn wide_chars_wrap_by_display_width() {
        assert_eq!(wrap_input_lines("日本語", 4), ["日本", "語"]);
        assert_eq!(cursor_row_col("日本語", "日本".len(), 4), (1, 0));
    }

    #[test]
    fn cursor_tracks_newlines() {
        assert_eq!(cursor_row_col("ab\ncd", 4, 10), (1, 1));
    }

    #[test]
    fn styled_wrap_splits_spans_and_keeps_empty_lines() {
        use ratatui::style::{Modifier, Style};

        let bold = Style::default().add_modifier(Modifier::BOLD);
        let lines = vec![
            Line::from(vec![Span::raw("abc"), Span::styled("defgh", bold)]),
            Line::from(""),
        ];
        let wrapped = wrap_styled_lines(lines, 4);

        let texts: Vec<String> = wrapped
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(texts, ["abcd", "efgh", ""]);
        assert_eq!(wrapped[0].spans[1].style, bold);
        assert_eq!(wrapped[1].spans.len(), 1);
    }

    #[test]
    fn truncation_adds_ellipsis_only_when_needed() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("personality:friendly", 10), "persona...");
        assert_eq!(truncate_with_ellipsis("abcdef", 3), "abc");
    }
}
