use serde::{Deserialize, Serialize};

use crate::session::SessionKind;

/// Notification published by the countdown.
///
/// For one segment, `Updated` values are non-increasing until a reset or a new
/// start, and `Completed` is emitted exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerSignal {
    Updated {
        seconds_remaining: u32,
        kind: SessionKind,
    },
    Paused {
        seconds_remaining: u32,
        kind: SessionKind,
    },
    Resumed {
        seconds_remaining: u32,
        kind: SessionKind,
    },
    Completed {
        kind: SessionKind,
    },
}

impl TimerSignal {
    pub fn kind(&self) -> SessionKind {
        match self {
            Self::Updated { kind, .. }
            | Self::Paused { kind, .. }
            | Self::Resumed { kind, .. }
            | Self::Completed { kind } => *kind,
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
