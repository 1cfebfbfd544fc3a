//! Parsing of interactive input lines.

use pomo_core::session::SessionKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Empty line: start, pause or resume depending on state.
    Toggle,
    Start,
    Pause,
    Resume,
    Reset,
    Switch(SessionKind),
    Status,
    /// Reissue the current value, as after returning to the terminal.
    Sync,
    ResetRotation,
    Migrate,
    SkipMigration,
    Help,
    Quit,
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command.to_lowercase().as_str() {
            "" | "t" | "toggle" => Input::Toggle,
            "s" | "start" => Input::Start,
            "p" | "pause" => Input::Pause,
            "r" | "resume" => Input::Resume,
            "reset" => Input::Reset,
            "switch" | "k" => match parse_kind(rest) {
                Some(kind) => Input::Switch(kind),
                None => Input::Unknown(line.to_string()),
            },
            "focus" => Input::Switch(SessionKind::Focus),
            "short" => Input::Switch(SessionKind::ShortBreak),
            "long" => Input::Switch(SessionKind::LongBreak),
            "status" | "?" => Input::Status,
            "sync" => Input::Sync,
            "reset-rotation" => Input::ResetRotation,
            "migrate" => Input::Migrate,
            "skip-migration" => Input::SkipMigration,
            "h" | "help" => Input::Help,
            "q" | "quit" | "exit" => Input::Quit,
            _ => Input::Unknown(line.to_string()),
        }
    }
}

fn parse_kind(text: &str) -> Option<SessionKind> {
    match text.to_lowercase().as_str() {
        "focus" | "f" => Some(SessionKind::Focus),
        "short" | "s" => Some(SessionKind::ShortBreak),
        "long" | "l" => Some(SessionKind::LongBreak),
        other => other.parse().ok(),
    }
}

pub const HELP: &str = "\
Commands:
  <Enter> / toggle     start, pause or resume
  start | pause | resume
  reset                abandon the current segment and restore its duration
  switch <focus|short|long>   (or just: focus, short, long)
  status               show the timer
  sync                 recompute the timer from the reference clock
  reset-rotation       set completed pomodoros back to 0
  migrate | skip-migration    copy local settings to your account, or don't
  quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Input::parse(""), Input::Toggle);
        assert_eq!(Input::parse("  Pause "), Input::Pause);
        assert_eq!(Input::parse("switch long"), Input::Switch(SessionKind::LongBreak));
        assert_eq!(Input::parse("switch SHORT_BREAK"), Input::Switch(SessionKind::ShortBreak));
        assert_eq!(Input::parse("focus"), Input::Switch(SessionKind::Focus));
        assert_eq!(Input::parse("q"), Input::Quit);
    }

    #[test]
    fn test_unknown_input_is_kept() {
        assert_eq!(Input::parse("switch nap"), Input::Unknown("switch nap".to_string()));
        assert_eq!(Input::parse("dance"), Input::Unknown("dance".to_string()));
    }
}
