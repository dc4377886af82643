use std::str::FromStr;

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Commands that can be invoked by starting a message with a leading slash.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum SlashCommand {
    /// Show the active profile and run URL
    Profile,
    /// End this session and start an empty one
    New,
    /// Show help
    Help,
    /// Exit the application
    Bye,
}

pub fn command_entries() -> Vec<CommandEntry> {
    SlashCommand::iter()
        .map(|command| CommandEntry {
            command,
            keyword: command.command(),
            description: command.description(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: SlashCommand,
    pub argument: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: SlashCommand,
    pub keyword: &'static str,
    pub description: &'static str,
}

impl SlashCommand {
    /// User-visible description shown in help.
    pub fn description(self) -> &'static str {
        match self {
            SlashCommand::Profile => "show the active flow profile",
            SlashCommand::New => "end this session and start a new one",
            SlashCommand::Help => "show available commands",
            SlashCommand::Bye => "exit the application",
        }
    }

    /// Command string without the leading '/'.
    pub fn command(self) -> &'static str {
        self.into()
    }

    /// Whether this command can run while a question is in flight.
    pub fn available_while_waiting(self) -> bool {
        !matches!(self, SlashCommand::New)
    }
}

/// Parse a slash command from user input
pub fn parse_slash_command(input: &str) -> Option<ParsedCommand> {
    let rest = input.trim_start().strip_prefix('/')?;

    let mut parts = rest.split_whitespace();
    let head = parts.next()?.to_lowercase();
    let tail: Vec<&str> = parts.collect();

    let command = SlashCommand::from_str(&head).ok().or_else(|| match head.as_str() {
        "q" | "quit" | "exit" => Some(SlashCommand::Bye),
        "p" => Some(SlashCommand::Profile),
        "h" | "?" => Some(SlashCommand::Help),
        _ => None,
    })?;

    let argument = if tail.is_empty() {
        None
    } else {
        Some(tail.join(" "))
    };

    Some(ParsedCommand { command, argument })
}

/// Get help text for all available commands
pub fn get_help_text() -> String {
    let mut help = String::from("Available commands:\n");
    for command in SlashCommand::iter() {
        help.push_str(&format!("/{} - {}\n", command.command(), command.description()));
    }
    help.push_str("Aliases: /q, /quit, /exit for /bye. Enter sends, Shift+Enter adds a line, PgUp/PgDn scroll.");
    help
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_keywords_and_aliases() {
        assert_eq!(parse_slash_command("/new").unwrap().command, SlashCommand::New);
        assert_eq!(parse_slash_command("/q").unwrap().command, SlashCommand::Bye);
        assert_eq!(parse_slash_command("  /EXIT").unwrap().command, SlashCommand::Bye);
        assert_eq!(parse_slash_command("/profile").unwrap().command, SlashCommand::Profile);
    }

    #[test]
    fn keeps_argument_text() {
        let parsed = parse_slash_command("/help me   please").unwrap();
        assert_eq!(parsed.command, SlashCommand::Help);
        assert_eq!(parsed.argument.as_deref(), Some("me please"));
    }

    #[test]
    fn ordinary_text_is_not_a_command() {
        assert!(parse_slash_command("what about /new?").is_none());
        assert!(parse_slash_command("/unknown").is_none());
        assert!(parse_slash_command("/").is_none());
    }

    #[test]
    fn entries_cover_every_command() {
        let keywords: Vec<_> = command_entries().iter().map(|e| e.keyword).collect();
        assert_eq!(keywords, vec!["profile", "new", "help", "bye"]);
        assert!(get_help_text().contains("/bye - exit the application"));
    }
}
