//! Turns formatter markup into styled terminal lines.
//!
//! Only the tag set the formatter emits is understood: `h1`-`h3`, `strong`,
//! `em`, `code`, `pre` and `br`, plus the five entities `escape_html` writes.
//! Anything else passes through as literal text.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

pub fn markup_to_lines(markup: &str, base: Style) -> Vec<Line<'static>> {
    let mut writer = MarkupWriter::new(base);
    let mut rest = markup;

    while let Some(ch) = rest.chars().next() {
        match ch {
            '<' => match rest.find('>').and_then(|end| writer.tag(&rest[1..end]).then_some(end)) {
                Some(end) => rest = &rest[end + 1..],
                None => {
                    writer.push('<');
                    rest = &rest[1..];
                }
            },
            '&' => match decode_entity(rest) {
                Some((decoded, len)) => {
                    writer.push(decoded);
                    rest = &rest[len..];
                }
                None => {
                    writer.push('&');
                    rest = &rest[1..];
                }
            },
            '\n' => {
                writer.break_line();
                rest = &rest[1..];
            }
            '\r' => rest = &rest[1..],
            other => {
                writer.push(other);
                rest = &rest[other.len_utf8()..];
            }
        }
    }

    writer.finish()
}

fn decode_entity(input: &str) -> Option<(char, usize)> {
    const ENTITIES: [(&str, char); 6] = [
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#039;", '\''),
        ("&#39;", '\''),
    ];
    ENTITIES
        .iter()
        .find(|(entity, _)| input.starts_with(entity))
        .map(|(entity, ch)| (*ch, entity.len()))
}

struct MarkupWriter {
    base: Style,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    text: String,
    heading: Option<u8>,
    strong: usize,
    em: usize,
    code: usize,
}

impl MarkupWriter {
    fn new(base: Style) -> Self {
        Self {
            base,
            lines: Vec::new(),
            spans: Vec::new(),
            text: String::new(),
            heading: None,
            strong: 0,
            em: 0,
            code: 0,
        }
    }

    /// Returns false for tags this renderer does not know.
    fn tag(&mut self, raw: &str) -> bool {
        let name = raw.trim().trim_end_matches('/').trim();
        let (closing, name) = match name.strip_prefix('/') {
            Some(name) => (true, name),
            None => (false, name),
        };

        match name {
            "br" => self.break_line(),
            "pre" => {}
            "h1" | "h2" | "h3" => {
                self.flush();
                self.heading = if closing {
                    None
                } else {
                    name[1..].parse().ok()
                };
            }
            "strong" => {
                self.flush();
                self.strong = bump(self.strong, closing);
            }
            "em" => {
                self.flush();
                self.em = bump(self.em, closing);
            }
            "code" => {
                self.flush();
                self.code = bump(self.code, closing);
            }
            _ => return false,
        }
        true
    }

    fn style(&self) -> Style {
        let mut style = self.base;
        match self.heading {
            Some(1) => {
                style = style
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
            }
            Some(2) => style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD),
            Some(_) => style = style.add_modifier(Modifier::BOLD),
            None => {}
        }
        if self.strong > 0 {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.em > 0 {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.code > 0 {
            style = style.fg(Color::Yellow);
        }
        style
    }

    fn push(&mut self, ch: char) {
        self.text.push(ch);
    }

    fn flush(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let style = self.style();
        self.spans
            .push(Span::styled(std::mem::take(&mut self.text), style));
    }

    fn break_line(&mut self) {
        self.flush();
        self.lines.push(Line::from(std::mem::take(&mut self.spans)));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.break_line();
        self.lines
    }
}

fn bump(depth: usize, closing: bool) -> usize {
    if closing {
        depth.saturating_sub(1)
    } else {
        depth + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{code_block, format_message};

    fn line_text(line: &Line<'_>) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn breaks_split_lines_and_tags_style_spans() {
        let lines = markup_to_lines("Hi <strong>there</strong><br>next", Style::default());

        assert_eq!(lines.len(), 2);
        assert_eq!(line_text(&lines[0]), "Hi there");
        assert_eq!(lines[0].spans.len(), 2);
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert!(!lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line_text(&lines[1]), "next");
    }

    #[test]
    fn entities_decode_back_to_the_original_text() {
        let markup = format_message("a < b && \"c\" > 'd'");
        let lines = markup_to_lines(&markup, Style::default());
        assert_eq!(line_text(&lines[0]), "a < b && \"c\" > 'd'");
    }

    #[test]
    fn code_block_keeps_newlines_and_angle_brackets() {
        let lines = markup_to_lines(&code_block("fn f() {\n  <T>\n}"), Style::default());

        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert_eq!(texts, ["fn f() {", "  <T>", "}"]);
        assert!(lines
            .iter()
            .flat_map(|line| line.spans.iter())
            .all(|span| span.style.fg == Some(Color::Yellow)));
    }

    #[test]
    fn nested_emphasis_combines_modifiers() {
        let lines = markup_to_lines(&format_message("**a*b*c**"), Style::default());
        let spans = &lines[0].spans;

        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "b");
        assert!(spans[1]
            .style
            .add_modifier
            .contains(Modifier::BOLD | Modifier::ITALIC));
        assert!(!spans[2].style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn headings_are_bold() {
        let lines = markup_to_lines(&format_message("# Title\nbody"), Style::default());
        assert_eq!(line_text(&lines[0]), "Title");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(line_text(&lines[1]), "body");
        assert!(lines[1].spans[0].style.fg.is_none());
    }

    #[test]
    fn unknown_tags_and_bare_ampersands_stay_literal() {
        let lines = markup_to_lines("<div>x & y</div>", Style::default());
        assert_eq!(line_text(&lines[0]), "<div>x & y</div>");
    }
}
