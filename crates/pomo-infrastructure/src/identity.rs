use pomo_core::identity::{Identity, IdentityProvider};

use crate::config::ApiConfig;

/// Identity derived from the `[api]` configuration.
///
/// An identity exists only when a façade URL, a session token and a user id
/// are all configured; otherwise the timer runs anonymously.
#[derive(Debug, Clone)]
pub struct ConfiguredIdentity {
    identity: Option<Identity>,
}

impl ConfiguredIdentity {
    pub fn from_config(api: &ApiConfig) -> Self {
        let identity = match (&api.base_url, &api.session_token, &api.user_id) {
            (Some(_), Some(_), Some(user_id)) => Some(Identity::new(user_id.clone())),
            _ => None,
        };
        Self { identity }
    }
}

impl IdentityProvider for ConfiguredIdentity {
    fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}
