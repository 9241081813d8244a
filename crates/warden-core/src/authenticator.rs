//! The authenticator contract every backend implements
//!
//! Protocol backends (JWT, CAS, OAuth2, SAML, ...) all expose the same single
//! operation, so downstream authorization code handles them polymorphically.

use std::collections::HashMap;
use std::fmt::Debug;

use crate::credentials::Credentials;
use crate::error::AuthResult;

/// Read-only view of the request that carried the credentials
///
/// Request adapters implement this over their framework's request type.
/// Lookups are case-sensitive unless the implementation says otherwise.
pub trait RequestContext {
    /// Value of a request header
    fn request_header(&self, name: &str) -> Option<&str>;

    /// Value of a query or form parameter
    fn request_parameter(&self, name: &str) -> Option<&str>;
}

/// Context for callers that have no request at hand
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyContext;

impl RequestContext for EmptyContext {
    fn request_header(&self, _name: &str) -> Option<&str> {
        None
    }

    fn request_parameter(&self, _name: &str) -> Option<&str> {
        None
    }
}

/// In-memory request context, handy for tests and batch jobs
///
/// Header names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MapContext {
    headers: HashMap<String, String>,
    parameters: HashMap<String, String>,
}

impl MapContext {
    /// Empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Add a request parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }
}

impl RequestContext for MapContext {
    fn request_header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn request_parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }
}

/// Validates credentials and resolves them into a profile
///
/// On success the implementation fills the credentials' profile slot and
/// returns `Ok(())`. It never returns `Ok(())` with the slot left empty.
/// Implementations are `Send + Sync`: they are configured once and then shared
/// between threads without further mutation.
pub trait Authenticator: Send + Sync + Debug {
    /// Validate `credentials`, populating their profile on success
    ///
    /// # Errors
    ///
    /// Returns the [`AuthError`](crate::AuthError) describing why the
    /// credentials were rejected.
    fn validate(&self, credentials: &mut Credentials, context: &dyn RequestContext)
    -> AuthResult<()>;
}

impl<A: Authenticator + ?Sized> Authenticator for std::sync::Arc<A> {
    fn validate(
        &self,
        credentials: &mut Credentials,
        context: &dyn RequestContext,
    ) -> AuthResult<()> {
        (**self).validate(credentials, context)
    }
}

impl<A: Authenticator + ?Sized> Authenticator for Box<A> {
    fn validate(
        &self,
        credentials: &mut Credentials,
        context: &dyn RequestContext,
    ) -> AuthResult<()> {
        (**self).validate(credentials, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context() {
        let context = EmptyContext;
        assert!(context.request_header("Authorization").is_none());
        assert!(context.request_parameter("token").is_none());
    }

    #[test]
    fn test_map_context_headers_ignore_case() {
        let context = MapContext::new()
            .with_header("Authorization", "Bearer abc")
            .with_parameter("clientName", "HeaderClient");

        assert_eq!(context.request_header("authorization"), Some("Bearer abc"));
        assert_eq!(context.request_header("AUTHORIZATION"), Some("Bearer abc"));
        assert_eq!(context.request_parameter("clientName"), Some("HeaderClient"));
        assert!(context.request_parameter("clientname").is_none());
    }
}
