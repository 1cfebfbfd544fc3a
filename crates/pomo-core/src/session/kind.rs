use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PomoError;

/// The category of a timed segment.
///
/// Serialized with the persistence façade's wire names
/// (`POMODORO`, `SHORT_BREAK`, `LONG_BREAK`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    #[serde(rename = "POMODORO")]
    Focus,
    #[serde(rename = "SHORT_BREAK")]
    ShortBreak,
    #[serde(rename = "LONG_BREAK")]
    LongBreak,
}

impl SessionKind {
    pub const ALL: [SessionKind; 3] = [Self::Focus, Self::ShortBreak, Self::LongBreak];

    /// Wire name used by the persistence façade.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Focus => "POMODORO",
            Self::ShortBreak => "SHORT_BREAK",
            Self::LongBreak => "LONG_BREAK",
        }
    }

    /// Human readable label for status lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::ShortBreak => "Short Break",
            Self::LongBreak => "Long Break",
        }
    }

    pub fn is_focus(&self) -> bool {
        matches!(self, Self::Focus)
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionKind {
    type Err = PomoError;

    /// Accepts wire names as well as the short forms typed at the prompt
    /// (`focus`, `short`, `long`, `shortBreak`, `long-break`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "focus" | "pomodoro" | "work" => Ok(Self::Focus),
            "short" | "shortbreak" => Ok(Self::ShortBreak),
            "long" | "longbreak" => Ok(Self::LongBreak),
            _ => Err(PomoError::validation(
                "sessionType",
                format!("unrecognized session kind '{}'", s.trim()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_roundtrip_through_serde() {
        for kind in SessionKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_api_str()));
        }
        let parsed: SessionKind = serde_json::from_str("\"SHORT_BREAK\"").unwrap();
        assert_eq!(parsed, SessionKind::ShortBreak);
    }

    #[test]
    fn test_from_str_accepts_prompt_forms() {
        assert_eq!("focus".parse::<SessionKind>().unwrap(), SessionKind::Focus);
        assert_eq!("POMODORO".parse::<SessionKind>().unwrap(), SessionKind::Focus);
        assert_eq!("shortBreak".parse::<SessionKind>().unwrap(), SessionKind::ShortBreak);
        assert_eq!("long-break".parse::<SessionKind>().unwrap(), SessionKind::LongBreak);
        assert_eq!("LONG_BREAK".parse::<SessionKind>().unwrap(), SessionKind::LongBreak);
    }

    #[test]
    fn test_from_str_rejects_unknown() {
        let err = "nap".parse::<SessionKind>().unwrap_err();
        assert!(err.is_validation());
    }
}
