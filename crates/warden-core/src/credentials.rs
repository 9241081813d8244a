//! Raw credentials handed from the request adapter to an authenticator

use std::fmt;

use crate::profile::UserProfile;

/// A raw token, the client that must process it, and the resolved profile
///
/// The profile slot stays empty until an [`Authenticator`](crate::Authenticator)
/// validates the token. `Debug` output never includes the token itself.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    token: String,
    client_name: String,
    profile: Option<UserProfile>,
}

impl Credentials {
    /// Wrap a token extracted from a request
    pub fn new(token: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client_name: client_name.into(),
            profile: None,
        }
    }

    /// The raw token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Name of the client responsible for these credentials
    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    /// Resolved profile, present only after successful validation
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Fill the profile slot
    pub fn set_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
    }

    /// Move the resolved profile out, leaving the slot empty
    pub fn take_profile(&mut self) -> Option<UserProfile> {
        self.profile.take()
    }

    /// Consume the credentials, keeping only the profile
    pub fn into_profile(self) -> Option<UserProfile> {
        self.profile
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("client_name", &self.client_name)
            .field("profile", &self.profile)
            .finish()
    }
}
