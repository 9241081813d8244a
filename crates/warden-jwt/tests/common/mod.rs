//! Common test utilities for integration tests
//!
//! Shared keys, profiles and token builders for the JWT round-trip and
//! rejection scenarios.

#![allow(dead_code)]

use serde_json::json;
use warden_core::UserProfile;
use warden_jwt::{
    JwtAuthenticator, JwtGenerator, SecretEncryptionConfiguration, SecretSignatureConfiguration,
};

/// 32-byte HMAC secret
pub const MAC_SECRET: &str = "12345678901234567890123456789012";

/// Second 32-byte HMAC secret
pub const MAC_SECRET2: &str = "abcdefghijklmnopqrstuvwxyzABCDEF";

/// 32-byte secret for `dir` + `A256GCM`
pub const KEY2: &str = "02ez4f7dsq==drrdz54z---++-6ef78=";

/// Second 32-byte encryption secret
pub const KEY3: &str = "ZYXWVUTSRQPONMLKJIHGFEDCBAzyxwvu";

/// 64-byte secret for `dir` + `A256CBC-HS512`
pub const KEY64: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// Install a test subscriber once so `tracing` output shows up with `--nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warden_jwt=debug")),
        )
        .with_test_writer()
        .try_init();
}

pub fn mac(secret: &str) -> SecretSignatureConfiguration {
    SecretSignatureConfiguration::new(secret).expect("valid HMAC secret")
}

pub fn enc(secret: &str) -> SecretEncryptionConfiguration {
    SecretEncryptionConfiguration::new(secret).expect("valid encryption secret")
}

/// Profile with attributes, roles and permissions
pub fn facebook_profile() -> UserProfile {
    let mut profile = UserProfile::new("FacebookProfile", "12345");
    profile.add_attribute("name", "Jerome");
    profile.add_attribute("email", "jerome@example.org");
    profile.add_attribute("verified", true);
    profile.add_attribute("locale", json!({ "language": "fr", "region": "FR" }));
    profile.add_roles(["role1".to_string(), "role2".to_string()]);
    profile.add_permissions(["perm1".to_string()]);
    profile
}

/// Signing-only generator and matching authenticator
pub fn signed_pair() -> (JwtGenerator, JwtAuthenticator) {
    (
        JwtGenerator::new().with_signature(mac(MAC_SECRET)),
        JwtAuthenticator::builder().signature(mac(MAC_SECRET)).build(),
    )
}
