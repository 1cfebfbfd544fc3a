//! Identity predicate.
//!
//! The core only asks "is there an authenticated identity?". Credentials live
//! with whoever implements [`IdentityProvider`].

use serde::{Deserialize, Serialize};

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

pub trait IdentityProvider: Send + Sync {
    /// Returns the current identity, or `None` for anonymous use.
    fn current_identity(&self) -> Option<Identity>;

    fn is_authenticated(&self) -> bool {
        self.current_identity().is_some()
    }
}

/// Provider for anonymous use; never yields an identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl IdentityProvider for Anonymous {
    fn current_identity(&self) -> Option<Identity> {
        None
    }
}

/// Provider backed by a fixed identity.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Identity);

impl IdentityProvider for StaticIdentity {
    fn current_identity(&self) -> Option<Identity> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_providers() {
        assert!(!Anonymous.is_authenticated());
        let provider = StaticIdentity(Identity::new("user-1"));
        assert!(provider.is_authenticated());
        assert_eq!(provider.current_identity().unwrap().id, "user-1");
    }
}
