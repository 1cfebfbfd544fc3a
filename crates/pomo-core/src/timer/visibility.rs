use serde::{Deserialize, Serialize};

/// Whether the host surface is in front of the user.
///
/// While backgrounded, the host may throttle or suspend tick callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Foreground,
    Background,
}
