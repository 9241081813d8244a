//! Normalized identity record
//!
//! A [`UserProfile`] is what every authentication backend produces on success,
//! whatever the protocol. Its typed id (`<profile type>:<id>`) is unique across
//! identity sources, so two providers handing out the same raw id never collide.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Separator between the profile type and the id in a typed id
pub const TYPED_ID_SEPARATOR: &str = ":";

/// Discriminator naming the identity source a profile came from
///
/// Examples: `"JwtProfile"`, `"GitHubProfile"`, `"CasProfile"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileType(String);

impl ProfileType {
    /// Create a profile type from its name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The discriminator as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `name` can be used as a discriminator inside a typed id.
    ///
    /// Discriminators are non-empty and limited to ASCII alphanumerics,
    /// `_`, `-` and `.` so that the separator is never ambiguous.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    }

    /// Whether this discriminator can be restored from a typed id
    pub fn is_valid(&self) -> bool {
        Self::is_valid_name(&self.0)
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProfileType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ProfileType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Identity record produced by a successful authentication
///
/// Attribute writes overwrite (last write wins). Roles and permissions are
/// sets, kept sorted so serialized forms are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    id: String,
    profile_type: ProfileType,
    #[serde(default)]
    attributes: BTreeMap<String, Value>,
    /// Facts about the authentication event itself (issuer, expiration, ...)
    #[serde(default)]
    authentication_attributes: BTreeMap<String, Value>,
    #[serde(default)]
    roles: BTreeSet<String>,
    #[serde(default)]
    permissions: BTreeSet<String>,
    #[serde(default)]
    remembered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    client_name: Option<String>,
}

impl UserProfile {
    /// Create an empty profile of the given type
    pub fn new(profile_type: impl Into<ProfileType>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            profile_type: profile_type.into(),
            attributes: BTreeMap::new(),
            authentication_attributes: BTreeMap::new(),
            roles: BTreeSet::new(),
            permissions: BTreeSet::new(),
            remembered: false,
            client_name: None,
        }
    }

    /// Rebuild a profile from a typed id.
    ///
    /// A typed id whose prefix is a valid [`ProfileType`] name restores that
    /// type; anything else is used verbatim as the id of a `default_type`
    /// profile.
    ///
    /// Subjects issued by other systems that happen to look typed are split
    /// too: `mailto:alice` becomes id `alice` of type `mailto`.
    pub fn from_typed_id(typed_id: &str, default_type: &ProfileType) -> Self {
        match Self::split_typed_id(typed_id) {
            Some((profile_type, id)) => Self::new(profile_type, id),
            None => Self::new(default_type.clone(), typed_id),
        }
    }

    /// Split `"<type>:<id>"` into its parts
    pub fn split_typed_id(typed_id: &str) -> Option<(&str, &str)> {
        typed_id
            .split_once(TYPED_ID_SEPARATOR)
            .filter(|(profile_type, id)| {
                ProfileType::is_valid_name(profile_type) && !id.is_empty()
            })
    }

    /// Whether [`UserProfile::from_typed_id`] restores this profile's type and id
    ///
    /// False for an empty id or a type name outside the discriminator
    /// alphabet, such as one containing a space or the separator.
    pub fn has_restorable_typed_id(&self) -> bool {
        self.profile_type.is_valid() && !self.id.is_empty()
    }

    /// Raw id as issued by the identity source
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id qualified by profile type, unique across identity sources
    pub fn typed_id(&self) -> String {
        format!("{}{}{}", self.profile_type, TYPED_ID_SEPARATOR, self.id)
    }

    /// Identity source discriminator
    pub fn profile_type(&self) -> &ProfileType {
        &self.profile_type
    }

    /// All user attributes
    pub fn attributes(&self) -> &BTreeMap<String, Value> {
        &self.attributes
    }

    /// Single user attribute
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Set an attribute, replacing any previous value
    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Set several attributes, later entries winning over earlier ones
    pub fn add_attributes<K, V>(&mut self, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        for (key, value) in attributes {
            self.add_attribute(key, value);
        }
    }

    /// Remove an attribute, returning its previous value
    pub fn remove_attribute(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    /// Attributes describing the authentication event
    pub fn authentication_attributes(&self) -> &BTreeMap<String, Value> {
        &self.authentication_attributes
    }

    /// Single authentication attribute
    pub fn authentication_attribute(&self, key: &str) -> Option<&Value> {
        self.authentication_attributes.get(key)
    }

    /// Set an authentication attribute, replacing any previous value
    pub fn add_authentication_attribute(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.authentication_attributes
            .insert(key.into(), value.into());
    }

    /// Granted roles
    pub fn roles(&self) -> &BTreeSet<String> {
        &self.roles
    }

    /// Add a single role
    pub fn add_role(&mut self, role: impl Into<String>) {
        self.roles.insert(role.into());
    }

    /// Add several roles
    pub fn add_roles(&mut self, roles: impl IntoIterator<Item = String>) {
        self.roles.extend(roles);
    }

    /// Check whether the profile holds a role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    /// Granted permissions
    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permissions
    }

    /// Add a single permission
    pub fn add_permission(&mut self, permission: impl Into<String>) {
        self.permissions.insert(permission.into());
    }

    /// Add several permissions
    pub fn add_permissions(&mut self, permissions: impl IntoIterator<Item = String>) {
        self.permissions.extend(permissions);
    }

    /// Check whether the profile holds a permission
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Whether the user asked to be remembered across sessions
    pub fn is_remembered(&self) -> bool {
        self.remembered
    }

    /// Set the remember-me flag
    pub fn set_remembered(&mut self, remembered: bool) {
        self.remembered = remembered;
    }

    /// Name of the client that authenticated this profile
    pub fn client_name(&self) -> Option<&str> {
        self.client_name.as_deref()
    }

    /// Record the client that authenticated this profile
    pub fn set_client_name(&mut self, client_name: impl Into<String>) {
        self.client_name = Some(client_name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_typed_id() {
        let profile = UserProfile::new("FacebookProfile", "12345");
        assert_eq!(profile.id(), "12345");
        assert_eq!(profile.typed_id(), "FacebookProfile:12345");
        assert_eq!(profile.profile_type().as_str(), "FacebookProfile");
    }

    #[test]
    fn test_attribute_last_write_wins() {
        let mut profile = UserProfile::new("JwtProfile", "alice");
        profile.add_attribute("name", "Alice");
        profile.add_attribute("name", "Alicia");
        profile.add_attributes([("verified", json!(true)), ("name", json!("Al"))]);

        assert_eq!(profile.attribute("name"), Some(&json!("Al")));
        assert_eq!(profile.attribute("verified"), Some(&json!(true)));
        assert_eq!(profile.attributes().len(), 2);
        assert_eq!(profile.remove_attribute("name"), Some(json!("Al")));
        assert!(profile.attribute("name").is_none());
    }

    #[test]
    fn test_roles_and_permissions_are_sets() {
        let mut profile = UserProfile::new("JwtProfile", "alice");
        profile.add_roles(["role1".to_string(), "role2".to_string()]);
        profile.add_role("role1");
        profile.add_permissions(["perm1".to_string()]);

        assert_eq!(profile.roles().len(), 2);
        assert!(profile.has_role("role2"));
        assert!(profile.has_permission("perm1"));
        assert!(!profile.has_permission("perm2"));
    }

    #[test]
    fn test_restorable_typed_id() {
        let default_type = ProfileType::new("JwtProfile");

        for (profile_type, id) in [("FacebookProfile", "12345"), ("Saml2.v2", "urn:x:42")] {
            let profile = UserProfile::new(profile_type, id);
            assert!(profile.has_restorable_typed_id(), "{profile_type}");
            let restored = UserProfile::from_typed_id(&profile.typed_id(), &default_type);
            assert_eq!(restored.profile_type(), profile.profile_type());
            assert_eq!(restored.id(), profile.id());
        }

        assert!(!UserProfile::new("Google Profile", "42").has_restorable_typed_id());
        assert!(!UserProfile::new("org:Profile", "42").has_restorable_typed_id());
        assert!(!UserProfile::new("", "42").has_restorable_typed_id());
        assert!(!UserProfile::new("FacebookProfile", "").has_restorable_typed_id());
    }

    #[test]
    fn test_from_typed_id() {
        let default_type = ProfileType::new("JwtProfile");

        let profile = UserProfile::from_typed_id("FacebookProfile:12345", &default_type);
        assert_eq!(profile.profile_type().as_str(), "FacebookProfile");
        assert_eq!(profile.id(), "12345");

        let profile = UserProfile::from_typed_id("user@example.org", &default_type);
        assert_eq!(profile.profile_type(), &default_type);
        assert_eq!(profile.id(), "user@example.org");

        // Prefix is not a valid discriminator, keep the subject whole
        let profile = UserProfile::from_typed_id("not a type:42", &default_type);
        assert_eq!(profile.id(), "not a type:42");

        // Ids may themselves contain the separator
        let profile = UserProfile::from_typed_id("CasProfile:urn:user:7", &default_type);
        assert_eq!(profile.profile_type().as_str(), "CasProfile");
        assert_eq!(profile.id(), "urn:user:7");

        // Foreign subjects that look typed are split as well
        let profile = UserProfile::from_typed_id("mailto:alice", &default_type);
        assert_eq!(profile.profile_type().as_str(), "mailto");
        assert_eq!(profile.id(), "alice");
    }

    #[test]
    fn test_serde_round_trip() {
        let mut profile = UserProfile::new("GitHubProfile", "99");
        profile.add_attribute("login", "octocat");
        profile.add_role("admin");
        profile.set_remembered(true);
        profile.set_client_name("GitHubClient");

        let json = serde_json::to_string(&profile).unwrap();
        let restored: UserProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, profile);
    }
}
