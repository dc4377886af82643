use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use std::time::Instant;

/// One-line indicator above the composer: thinking dots or the last error
#[derive(Clone, Debug, Default)]
pub struct StatusLine {
    waiting_since: Option<Instant>,
    error: Option<String>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A question went out; any previous error is stale.
    pub fn start_waiting(&mut self) {
        self.waiting_since = Some(Instant::now());
        self.error = None;
    }

    pub fn stop_waiting(&mut self) {
        self.waiting_since = None;
    }

    pub fn show_error(&mut self, message: String) {
        self.waiting_since = None;
        self.error = Some(message);
    }

    pub fn clear(&mut self) {
        self.waiting_since = None;
        self.error = None;
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting_since.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl Widget for StatusLine {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let line = if let Some(since) = self.waiting_since {
            let dots = match (since.elapsed().as_millis() / 300) % 4 {
                0 => ".",
                1 => "..",
                2 => "...",
                _ => "",
            };
            Line::from(vec![
                Span::styled("🤔 Thinking", Style::default().fg(Color::Green)),
                Span::styled(dots, Style::default().fg(Color::Yellow)),
            ])
        } else if let Some(error) = self.error {
            Line::from(Span::styled(error, Style::default().fg(Color::Red)))
        } else {
            return;
        };

        buf.set_line(area.x, area.y, &line, area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_question_clears_previous_error() {
        let mut status = StatusLine::new();
        status.show_error("❌ Error: boom".to_string());
        assert_eq!(status.error(), Some("❌ Error: boom"));
        assert!(!status.is_waiting());

        status.start_waiting();
        assert!(status.is_waiting());
        assert_eq!(status.error(), None);
    }
}
