//! Claim sets carried by tokens
//!
//! [`Claims`] is an ordered JSON object. Reserved registered claims (RFC 7519
//! section 4.1) have typed accessors; timestamps travel as NumericDate seconds
//! and surface as `chrono::DateTime<Utc>`.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use warden_core::{AuthError, AuthResult};

/// Subject claim
pub const SUBJECT: &str = "sub";
/// Issuer claim
pub const ISSUER: &str = "iss";
/// Audience claim
pub const AUDIENCE: &str = "aud";
/// Expiration time claim
pub const EXPIRATION_TIME: &str = "exp";
/// Issued-at claim
pub const ISSUED_AT: &str = "iat";
/// Not-before claim
pub const NOT_BEFORE: &str = "nbf";
/// Token id claim
pub const JWT_ID: &str = "jti";

/// Claim names managed by the generator and authenticator
pub const RESERVED_CLAIMS: [&str; 7] = [
    SUBJECT,
    ISSUER,
    AUDIENCE,
    EXPIRATION_TIME,
    ISSUED_AT,
    NOT_BEFORE,
    JWT_ID,
];

/// Claim carrying the profile roles
pub const INTERNAL_ROLES: &str = "$int_roles";
/// Claim carrying the profile permissions
pub const INTERNAL_PERMISSIONS: &str = "$int_perms";

/// Whether `name` is a registered claim name
pub fn is_reserved(name: &str) -> bool {
    RESERVED_CLAIMS.contains(&name)
}

/// Whether `name` is one of the keys used to carry roles and permissions
pub fn is_internal(name: &str) -> bool {
    name == INTERNAL_ROLES || name == INTERNAL_PERMISSIONS
}

/// Interpret a JSON value as a NumericDate.
///
/// Integral and fractional seconds are accepted; anything else is `None`.
pub fn numeric_date(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(seconds) = value.as_i64() {
        return Utc.timestamp_opt(seconds, 0).single();
    }
    let seconds = value.as_f64()?;
    if !seconds.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
}

/// Ordered claim name to value mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Empty claim set
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Parse a claim set from JSON bytes
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] unless the bytes hold a JSON object.
    pub fn from_json(bytes: &[u8]) -> AuthResult<Self> {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(_) => Err(AuthError::malformed("claims are not a JSON object")),
            Err(e) => Err(AuthError::malformed(format!("invalid claims JSON: {e}"))),
        }
    }

    /// Serialize to compact JSON
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Crypto`] if serialization fails.
    pub fn to_json(&self) -> AuthResult<Vec<u8>> {
        serde_json::to_vec(&self.0)
            .map_err(|e| AuthError::Crypto(format!("cannot serialize claims: {e}")))
    }

    /// Underlying JSON object
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consume into the underlying JSON object
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Raw claim value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Set a claim, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Remove a claim
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Whether a claim is present
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Number of claims
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the claim set is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over claims in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// `sub`, when present and a string
    pub fn subject(&self) -> Option<&str> {
        self.get(SUBJECT).and_then(Value::as_str)
    }

    /// Set `sub`
    pub fn set_subject(&mut self, subject: impl Into<String>) {
        self.insert(SUBJECT, subject.into());
    }

    /// `iss`, when present and a string
    pub fn issuer(&self) -> Option<&str> {
        self.get(ISSUER).and_then(Value::as_str)
    }

    /// Set `iss`
    pub fn set_issuer(&mut self, issuer: impl Into<String>) {
        self.insert(ISSUER, issuer.into());
    }

    /// `aud`, accepting both the single-string and the array forms
    pub fn audience(&self) -> Vec<String> {
        match self.get(AUDIENCE) {
            Some(Value::String(audience)) => vec![audience.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Set `aud`; a single audience is written as a plain string
    pub fn set_audience<I, S>(&mut self, audience: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values: Vec<Value> = audience
            .into_iter()
            .map(|a| Value::String(a.into()))
            .collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        self.insert(AUDIENCE, value);
    }

    /// `exp`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] if the claim is present but not a NumericDate.
    pub fn expiration_time(&self) -> AuthResult<Option<DateTime<Utc>>> {
        self.timestamp(EXPIRATION_TIME)
    }

    /// Set `exp` (truncated to whole seconds)
    pub fn set_expiration_time(&mut self, at: DateTime<Utc>) {
        self.set_timestamp(EXPIRATION_TIME, at);
    }

    /// `iat`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] if the claim is present but not a NumericDate.
    pub fn issued_at(&self) -> AuthResult<Option<DateTime<Utc>>> {
        self.timestamp(ISSUED_AT)
    }

    /// Set `iat` (truncated to whole seconds)
    pub fn set_issued_at(&mut self, at: DateTime<Utc>) {
        self.set_timestamp(ISSUED_AT, at);
    }

    /// `nbf`
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] if the claim is present but not a NumericDate.
    pub fn not_before(&self) -> AuthResult<Option<DateTime<Utc>>> {
        self.timestamp(NOT_BEFORE)
    }

    /// Set `nbf` (truncated to whole seconds)
    pub fn set_not_before(&mut self, at: DateTime<Utc>) {
        self.set_timestamp(NOT_BEFORE, at);
    }

    /// `jti`, when present and a string
    pub fn jwt_id(&self) -> Option<&str> {
        self.get(JWT_ID).and_then(Value::as_str)
    }

    /// Set `jti`
    pub fn set_jwt_id(&mut self, id: impl Into<String>) {
        self.insert(JWT_ID, id.into());
    }

    /// Claim holding a list of strings
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Malformed`] if the claim is not an array of strings.
    pub fn string_list(&self, name: &str) -> AuthResult<Option<Vec<String>>> {
        let Some(value) = self.get(name) else {
            return Ok(None);
        };
        let Value::Array(items) = value else {
            return Err(AuthError::malformed(format!(
                "claim '{name}' is not a list"
            )));
        };
        items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    AuthError::malformed(format!("claim '{name}' holds a non-string entry"))
                })
            })
            .collect::<AuthResult<Vec<_>>>()
            .map(Some)
    }

    /// Set a claim to a list of strings
    pub fn set_string_list<I, S>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<Value> = values.into_iter().map(|v| Value::String(v.into())).collect();
        self.insert(name, Value::Array(values));
    }

    fn timestamp(&self, name: &str) -> AuthResult<Option<DateTime<Utc>>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => numeric_date(value).map(Some).ok_or_else(|| {
                AuthError::malformed(format!("claim '{name}' is not a NumericDate"))
            }),
        }
    }

    fn set_timestamp(&mut self, name: &str, at: DateTime<Utc>) {
        self.insert(name, at.timestamp());
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Claims {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
