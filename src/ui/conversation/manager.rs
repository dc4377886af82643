use crate::config::FlowSettings;
use crate::error::FlowError;
use crate::events::AppEvent;
use crate::flow::FlowClient;
use crate::session::ChatSession;
use crate::ui::conversation::{
    ComposerResult, ConversationComposer, ConversationHistory, ParsedCommand, SlashCommand,
    StatusLine, get_help_text,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use std::sync::Arc;
use tokio::sync::mpsc;

const SCROLL_STEP: u16 = 5;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Manages the conversation flow and UI components
pub struct ConversationManager {
    settings: FlowSettings,
    client: Arc<FlowClient>,
    session: ChatSession,
    composer: ConversationComposer,
    status: StatusLine,
    notices: Vec<String>,
    scroll: u16,
    max_scroll: u16,
    event_tx: mpsc::UnboundedSender<AppEvent>,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl ConversationManager {
    pub fn new(settings: FlowSettings, client: FlowClient) -> Self {
        let client = Arc::new(client);
        let session = ChatSession::new(Arc::clone(&client), settings.tweaks.clone());
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            composer: ConversationComposer::new(settings.placeholder.clone()),
            settings,
            client,
            session,
            status: StatusLine::new(),
            notices: Vec::new(),
            scroll: 0,
            max_scroll: 0,
            event_tx,
            event_rx,
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Send a question on a background task; the reply arrives as an event
    pub fn handle_input(&mut self, input: String) {
        let pending = match self.session.begin(&input) {
            Ok(pending) => pending,
            Err(err) if err.is_silent() => return,
            Err(err) => {
                self.status.show_error(err.user_message());
                return;
            }
        };

        self.notices.clear();
        self.scroll = 0;
        self.status.start_waiting();
        self.composer.set_waiting(true);

        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::Reply(pending.send().await));
        });
    }

    /// Drain finished replies (called from the main loop)
    pub fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::Reply(answered) => match self.session.finish(answered) {
                    Ok(_) => {
                        self.composer.set_waiting(false);
                        self.status.stop_waiting();
                        self.scroll = 0;
                    }
                    Err(FlowError::Stale) => {}
                    Err(err) => {
                        self.composer.set_waiting(false);
                        self.status.show_error(err.user_message());
                    }
                },
            }
        }
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind == KeyEventKind::Press {
            match key.code {
                KeyCode::PageUp => {
                    self.scroll = self.scroll.saturating_sub(SCROLL_STEP);
                    return ConversationAction::None;
                }
                KeyCode::PageDown => {
                    self.scroll = self.scroll.saturating_add(SCROLL_STEP).min(self.max_scroll);
                    return ConversationAction::None;
                }
                _ => {}
            }
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.handle_input(input);
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    /// End the current session and start an empty one
    pub fn restart_session(&mut self) {
        self.session = ChatSession::new(Arc::clone(&self.client), self.settings.tweaks.clone());
        self.status.clear();
        self.composer.set_waiting(false);
        self.composer.clear();
        self.notices.clear();
        self.scroll = 0;
    }

    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        if self.session.is_waiting() && !command.command.available_while_waiting() {
            self.notices.push(format!(
                "/{} is not available while a question is in flight",
                command.command.command()
            ));
            return ConversationAction::None;
        }

        match command.command {
            SlashCommand::Bye => ConversationAction::Exit,
            SlashCommand::New => {
                self.restart_session();
                ConversationAction::None
            }
            SlashCommand::Help => {
                self.notices.push(get_help_text());
                ConversationAction::None
            }
            SlashCommand::Profile => {
                let id = self.session.id().simple().to_string();
                self.notices.push(format!(
                    "Profile '{}': {}{} • session {} since {} • {} answered",
                    self.settings.name,
                    self.client.url(),
                    if self.settings.tweaks.is_some() { " (with tweaks)" } else { "" },
                    &id[..8],
                    self.session.started_at().format("%H:%M:%S"),
                    self.session.store().len()
                ));
                ConversationAction::None
            }
        }
    }

    /// Render the conversation UI components
    pub fn render_conversation_ui(&mut self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Header
                Constraint::Min(6),    // History
                Constraint::Length(1), // Status
                Constraint::Length(5), // Composer
                Constraint::Length(1), // Footer
            ])
            .split(area);

        self.render_header(chunks[0], buf);

        let history = ConversationHistory::new(self.session.store(), &self.notices, self.scroll);
        self.max_scroll = history.max_scroll(chunks[1]);
        self.scroll = self.scroll.min(self.max_scroll);
        history.render(chunks[1], buf);

        self.status.clone().render(chunks[2], buf);
        self.composer.clone().render(chunks[3], buf);

        Paragraph::new(Line::from(Span::styled(
            "Powered by Langflow API • Built with ratatui",
            Style::default().fg(Color::DarkGray),
        )))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(Span::styled(
            format!("🤖 {}", self.settings.title),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
        buf.set_line(area.x, area.y, &title, area.width);

        if area.height > 1 {
            let intro = Line::from(Span::styled(
                self.settings.intro.as_str(),
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(area.x, area.y + 1, &intro, area.width);
        }
    }
}
