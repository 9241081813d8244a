//! Mapping between claim sets and user profiles
//!
//! The typed id travels as `sub`. Roles and permissions use the internal
//! `$int_roles` / `$int_perms` claims. Other registered claims are kept on the
//! profile as authentication attributes; everything else is a user attribute.

use chrono::{DateTime, Utc};
use serde_json::Value;
use warden_core::{AuthError, AuthResult, ProfileType, UserProfile};

use crate::claims::{
    self, AUDIENCE, Claims, EXPIRATION_TIME, INTERNAL_PERMISSIONS, INTERNAL_ROLES, ISSUED_AT,
    ISSUER, JWT_ID, NOT_BEFORE, SUBJECT,
};

/// Profile type given to subjects that carry no type prefix
pub const DEFAULT_PROFILE_TYPE: &str = "JwtProfile";

/// Build the claim set for `profile`
///
/// `sub` is the typed id and `iat` is `now`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidConfiguration`] if the typed id could not be
/// split back into the same type and id, and
/// [`AuthError::ReservedClaimCollision`] if an attribute is named like a
/// registered or internal claim.
pub fn claims_from_profile(profile: &UserProfile, now: DateTime<Utc>) -> AuthResult<Claims> {
    if !profile.has_restorable_typed_id() {
        return Err(AuthError::invalid_configuration(format!(
            "profile type {:?} with id {:?} cannot be carried in 'sub'",
            profile.profile_type().as_str(),
            profile.id()
        )));
    }
    if let Some(key) = profile
        .attributes()
        .keys()
        .find(|key| claims::is_reserved(key) || claims::is_internal(key))
    {
        return Err(AuthError::ReservedClaimCollision { claim: key.clone() });
    }

    let mut claims = Claims::new();
    claims.set_subject(profile.typed_id());
    claims.set_issued_at(now);
    for (key, value) in profile.attributes() {
        claims.insert(key.clone(), value.clone());
    }
    if !profile.roles().is_empty() {
        claims.set_string_list(INTERNAL_ROLES, profile.roles().iter().cloned());
    }
    if !profile.permissions().is_empty() {
        claims.set_string_list(INTERNAL_PERMISSIONS, profile.permissions().iter().cloned());
    }
    Ok(claims)
}

/// Materialize a profile from verified claims
///
/// # Errors
///
/// Returns [`AuthError::Malformed`] if `sub` is missing or not a string, or if
/// the roles or permissions claims are not lists of strings.
pub fn profile_from_claims(claims: &Claims, default_type: &ProfileType) -> AuthResult<UserProfile> {
    let subject = claims
        .subject()
        .filter(|subject| !subject.is_empty())
        .ok_or_else(|| AuthError::malformed("JWT must contain a subject ('sub' claim)"))?;
    let mut profile = UserProfile::from_typed_id(subject, default_type);

    for (key, value) in claims.iter() {
        match key.as_str() {
            SUBJECT | INTERNAL_ROLES | INTERNAL_PERMISSIONS => {}
            name if claims::is_reserved(name) => {
                profile.add_authentication_attribute(name, value.clone());
            }
            name => profile.add_attribute(name, value.clone()),
        }
    }
    if let Some(roles) = claims.string_list(INTERNAL_ROLES)? {
        profile.add_roles(roles);
    }
    if let Some(permissions) = claims.string_list(INTERNAL_PERMISSIONS)? {
        profile.add_permissions(permissions);
    }
    Ok(profile)
}

/// Token-derived accessors on a [`UserProfile`] built by the JWT authenticator
pub trait JwtProfileExt {
    /// Subject: the profile id
    fn subject(&self) -> &str;
    /// `iss` claim
    fn issuer(&self) -> Option<&str>;
    /// `aud` claim, as a list
    fn audience(&self) -> Vec<String>;
    /// `exp` claim
    fn expiration_date(&self) -> Option<DateTime<Utc>>;
    /// `iat` claim
    fn issued_at(&self) -> Option<DateTime<Utc>>;
    /// `nbf` claim
    fn not_before(&self) -> Option<DateTime<Utc>>;
    /// `jti` claim
    fn token_id(&self) -> Option<&str>;
}

impl JwtProfileExt for UserProfile {
    fn subject(&self) -> &str {
        self.id()
    }

    fn issuer(&self) -> Option<&str> {
        self.authentication_attribute(ISSUER).and_then(Value::as_str)
    }

    fn audience(&self) -> Vec<String> {
        match self.authentication_attribute(AUDIENCE) {
            Some(Value::String(audience)) => vec![audience.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.authentication_attribute(EXPIRATION_TIME)
            .and_then(claims::numeric_date)
    }

    fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.authentication_attribute(ISSUED_AT)
            .and_then(claims::numeric_date)
    }

    fn not_before(&self) -> Option<DateTime<Utc>> {
        self.authentication_attribute(NOT_BEFORE)
            .and_then(claims::numeric_date)
    }

    fn token_id(&self) -> Option<&str> {
        self.authentication_attribute(JWT_ID).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use warden_core::ErrorKind;

    fn default_type() -> ProfileType {
        ProfileType::new(DEFAULT_PROFILE_TYPE)
    }

    #[test]
    fn test_profile_to_claims() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut profile = UserProfile::new("FacebookProfile", "12345");
        profile.add_attribute("name", "Jerome");
        profile.add_roles(["role1".to_string(), "role2".to_string()]);

        let claims = claims_from_profile(&profile, now).unwrap();

        assert_eq!(claims.subject(), Some("FacebookProfile:12345"));
        assert_eq!(claims.issued_at().unwrap(), Some(now));
        assert_eq!(claims.get("name"), Some(&json!("Jerome")));
        assert_eq!(claims.get(INTERNAL_ROLES), Some(&json!(["role1", "role2"])));
        assert!(!claims.contains(INTERNAL_PERMISSIONS));
    }

    #[test]
    fn test_reserved_attribute_rejected() {
        for key in ["sub", "exp", "iat", "$int_roles"] {
            let mut profile = UserProfile::new("JwtProfile", "alice");
            profile.add_attribute(key, "x");
            let error = claims_from_profile(&profile, Utc::now()).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::ReservedClaimCollision, "{key}");
            assert!(error.to_string().contains(key));
        }
    }

    #[test]
    fn test_unrestorable_typed_id_rejected() {
        for (profile_type, id) in [
            ("Google Profile", "42"),
            ("org:Profile", "42"),
            ("GitHubProfile", ""),
        ] {
            let profile = UserProfile::new(profile_type, id);
            let error = claims_from_profile(&profile, Utc::now()).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidConfiguration, "{profile_type:?}");
        }
    }

    #[test]
    fn test_claims_to_profile() {
        let claims: Claims = [
            ("sub", json!("GitHubProfile:99")),
            ("iss", json!("https://issuer.example")),
            ("exp", json!(1_900_000_000)),
            ("aud", json!(["api", "admin"])),
            ("jti", json!("abc")),
            ("login", json!("octocat")),
            ("$int_roles", json!(["admin"])),
            ("$int_perms", json!(["read", "write"])),
        ]
        .into_iter()
        .collect();

        let profile = profile_from_claims(&claims, &default_type()).unwrap();

        assert_eq!(profile.typed_id(), "GitHubProfile:99");
        assert_eq!(profile.subject(), "99");
        assert_eq!(profile.attribute("login"), Some(&json!("octocat")));
        assert_eq!(profile.attributes().len(), 1);
        assert!(profile.has_role("admin"));
        assert!(profile.has_permission("write"));
        assert_eq!(profile.issuer(), Some("https://issuer.example"));
        assert_eq!(profile.audience(), vec!["api".to_string(), "admin".to_string()]);
        assert_eq!(profile.token_id(), Some("abc"));
        assert_eq!(
            profile.expiration_date(),
            Utc.timestamp_opt(1_900_000_000, 0).single()
        );
        assert!(profile.not_before().is_none());
    }

    #[test]
    fn test_untyped_subject_uses_default_type() {
        let claims: Claims = [("sub", json!("alice@example.org"))].into_iter().collect();
        let profile = profile_from_claims(&claims, &default_type()).unwrap();
        assert_eq!(profile.typed_id(), "JwtProfile:alice@example.org");
    }

    #[test]
    fn test_missing_subject_is_malformed() {
        let claims: Claims = [("name", json!("nobody"))].into_iter().collect();
        let error = profile_from_claims(&claims, &default_type()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Malformed);
    }
}
