//! Authenticator contract: backends are interchangeable behind `dyn Authenticator`

use std::collections::HashMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use warden_core::{
    AuthError, AuthResult, Authenticator, Credentials, EmptyContext, ErrorKind, MapContext,
    RequestContext, UserProfile,
};

/// Accepts tokens from a fixed table, the way a test double or API-key backend would
#[derive(Debug, Default)]
struct StaticTokenAuthenticator {
    tokens: HashMap<String, String>,
}

impl StaticTokenAuthenticator {
    fn with_token(mut self, token: &str, user: &str) -> Self {
        self.tokens.insert(token.to_string(), user.to_string());
        self
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn validate(
        &self,
        credentials: &mut Credentials,
        _context: &dyn RequestContext,
    ) -> AuthResult<()> {
        let user = self
            .tokens
            .get(credentials.token())
            .ok_or_else(|| AuthError::malformed("unknown token"))?;
        let mut profile = UserProfile::new("StaticProfile", user.clone());
        profile.set_client_name(credentials.client_name());
        credentials.set_profile(profile);
        Ok(())
    }
}

/// Requires a header to be present on the request
#[derive(Debug)]
struct HeaderGuard;

impl Authenticator for HeaderGuard {
    fn validate(
        &self,
        credentials: &mut Credentials,
        context: &dyn RequestContext,
    ) -> AuthResult<()> {
        let tenant = context
            .request_header("X-Tenant")
            .ok_or_else(|| AuthError::malformed("missing tenant header"))?;
        let mut profile = UserProfile::new("TenantProfile", credentials.token());
        profile.add_attribute("tenant", tenant);
        credentials.set_profile(profile);
        Ok(())
    }
}

#[test]
fn test_backends_are_polymorphic() {
    let backends: Vec<Arc<dyn Authenticator>> = vec![
        Arc::new(StaticTokenAuthenticator::default().with_token("t1", "alice")),
        Arc::new(HeaderGuard),
    ];
    let context = MapContext::new().with_header("X-Tenant", "acme");

    let mut resolved = Vec::new();
    for backend in &backends {
        let mut credentials = Credentials::new("t1", "SharedClient");
        backend.validate(&mut credentials, &context).unwrap();
        resolved.push(credentials.into_profile().unwrap().typed_id());
    }

    assert_eq!(resolved, vec!["StaticProfile:alice", "TenantProfile:t1"]);
}

#[test]
fn test_failure_leaves_profile_slot_empty() {
    let backend = StaticTokenAuthenticator::default().with_token("t1", "alice");
    let mut credentials = Credentials::new("nope", "SharedClient");

    let error = backend.validate(&mut credentials, &EmptyContext).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::Malformed);
    assert!(credentials.profile().is_none());
}

#[test]
fn test_client_name_reaches_profile() {
    let backend: Box<dyn Authenticator> =
        Box::new(StaticTokenAuthenticator::default().with_token("t1", "alice"));
    let mut credentials = Credentials::new("t1", "ParameterClient");

    backend.validate(&mut credentials, &EmptyContext).unwrap();

    let profile = credentials.profile().unwrap();
    assert_eq!(profile.client_name(), Some("ParameterClient"));
}
