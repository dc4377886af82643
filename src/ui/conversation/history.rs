//! Conversation history display component

use crate::conversation::ConversationStore;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Scrollbar, ScrollbarOrientation, ScrollbarState, StatefulWidget, Widget},
};

/// Newest-first view over a session's entries
pub struct ConversationHistory<'a> {
    store: &'a ConversationStore,
    notices: &'a [String],
    scroll: u16,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(store: &'a ConversationStore, notices: &'a [String], scroll: u16) -> Self {
        Self {
            store,
            notices,
            scroll,
        }
    }

    /// Every line the view would draw at `width`, top to bottom
    pub fn lines(&self, width: u16) -> Vec<Line<'a>> {
        let text_width = width.saturating_sub(2) as usize;
        let mut lines = Vec::new();

        for notice in self.notices {
            for text in wrap_text(notice, text_width) {
                lines.push(Line::from(Span::styled(text, Style::default().fg(Color::Yellow))));
            }
            lines.push(Line::from(""));
        }

        let label = Style::default().add_modifier(Modifier::BOLD);
        for entry in self.store.newest_first() {
            lines.push(Line::from(Span::styled("You asked:", label.fg(Color::Blue))));
            for text in wrap_text(entry.question(), text_width.saturating_sub(2)) {
                lines.push(Line::from(vec![
                    Span::styled("> ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text, Style::default().fg(Color::Blue)),
                ]));
            }
            lines.push(Line::from(Span::styled("AI Response:", label.fg(Color::Green))));
            for text in wrap_text(entry.answer(), text_width) {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(text, Style::default().fg(Color::Green)),
                ]));
            }
            lines.push(Line::from(Span::styled(
                "─".repeat(width.saturating_sub(2) as usize),
                Style::default().fg(Color::DarkGray),
            )));
        }

        lines
    }

    /// Furthest the view can scroll when drawn into `area`
    pub fn max_scroll(&self, area: Rect) -> u16 {
        if self.is_empty() {
            return 0;
        }
        let inner = Block::default().borders(Borders::ALL).inner(area);
        let max = self.lines(inner.width).len().saturating_sub(inner.height as usize);
        u16::try_from(max).unwrap_or(u16::MAX)
    }

    fn is_empty(&self) -> bool {
        self.store.is_empty() && self.notices.is_empty()
    }
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("💬 Conversation History");

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.is_empty() {
            let welcome_lines = [
                Line::from(Span::styled("No questions yet.", Style::default().fg(Color::Green))),
                Line::from(""),
                Line::from(Span::styled(
                    "Type below and press Enter. Type / for commands.",
                    Style::default().fg(Color::DarkGray),
                )),
            ];

            for (i, line) in welcome_lines.iter().enumerate().take(inner_area.height as usize) {
                buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
            }
            return;
        }

        let all_lines = self.lines(inner_area.width);
        let height = inner_area.height as usize;
        let max_scroll = all_lines.len().saturating_sub(height);
        let offset = (self.scroll as usize).min(max_scroll);

        for (i, line) in all_lines.iter().skip(offset).take(height).enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }

        if max_scroll > 0 {
            let mut state = ScrollbarState::new(max_scroll).position(offset);
            Scrollbar::default()
                .orientation(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .render(area, buf, &mut state);
        }
    }
}

/// Word-wrap each paragraph of `text` to `width` columns
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + 1 + word_width > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ConversationEntry;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn wraps_words_and_keeps_paragraphs() {
        let wrapped = wrap_text("one two three four\n\nfive", 9);
        assert_eq!(wrapped, vec!["one two", "three", "four", "", "five"]);
    }

    #[test]
    fn long_words_stay_whole() {
        assert_eq!(wrap_text("supercalifragilistic ok", 5), vec!["supercalifragilistic", "ok"]);
    }

    #[test]
    fn newest_entry_is_drawn_first() {
        let mut store = ConversationStore::new();
        store.append("first question", "first answer");
        store.append("second question", "second answer");
        let view = ConversationHistory::new(&store, &[], 0);
        let text: Vec<String> = view.lines(60).iter().map(plain).collect();

        let second = text.iter().position(|l| l.contains("second question")).unwrap();
        let first = text.iter().position(|l| l.contains("first question")).unwrap();
        assert!(second < first);
        assert_eq!(text[0], "You asked:");
        assert_eq!(text[1], "> second question");
        assert_eq!(text[2], "AI Response:");
        assert_eq!(text[3], "  second answer");
    }

    #[test]
    fn renders_into_small_buffer_without_panicking() {
        let mut store = ConversationStore::new();
        for i in 0..20 {
            store.append(format!("q{i}"), "a fairly long answer that wraps");
        }
        let area = Rect::new(0, 0, 20, 8);
        let mut buf = Buffer::empty(area);
        ConversationHistory::new(&store, &[], 500).render(area, &mut buf);
    }

    #[test]
    fn max_scroll_matches_overflow() {
        let mut store = ConversationStore::new();
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(ConversationHistory::new(&store, &[], 0).max_scroll(area), 0);

        store.append("q", "a");
        // four lines per entry inside an 8-line inner area
        assert_eq!(ConversationHistory::new(&store, &[], 0).max_scroll(area), 0);
        for _ in 0..4 {
            store.append("q", "a");
        }
        assert_eq!(ConversationHistory::new(&store, &[], 0).max_scroll(area), 12);
        assert_eq!(store.all()[0], ConversationEntry::new("q", "a"));
    }
}
