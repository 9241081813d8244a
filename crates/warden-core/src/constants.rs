//! Parameter, header and session key names shared by Warden integrations
//!
//! These are plain `&'static str` constants: request adapters, session stores
//! and authorization filters agree on them at compile time.

/// Session key holding the URL requested before redirecting to an identity provider
pub const REQUESTED_URL: &str = "wardenRequestedUrl";

/// Session key holding the authenticated user profile
pub const USER_PROFILE: &str = "wardenUserProfile";

/// Session key holding the session identifier
pub const SESSION_ID: &str = "wardenSessionId";

/// Configuration and request parameter naming the client to use
pub const CLIENT_NAME: &str = "clientName";

/// Value of the AJAX marker header
pub const AJAX_HEADER_VALUE: &str = "XMLHttpRequest";

/// Name of the AJAX marker header
pub const AJAX_HEADER_NAME: &str = "X-Requested-With";

/// Request parameter forcing a request to be treated as AJAX
pub const IS_AJAX_REQUEST: &str = "is_ajax_request";

/// Configuration parameter listing roles of which at least one is required
pub const REQUIRE_ANY_ROLE: &str = "requireAnyRole";

/// Configuration parameter listing roles that are all required
pub const REQUIRE_ALL_ROLES: &str = "requireAllRoles";

/// Configuration parameter for the post-login target URL
pub const TARGET_URL: &str = "targetUrl";

/// Whether direct (stateless) clients may still store profiles in the web session
pub const USE_SESSION_FOR_DIRECT_CLIENT: &str = "useSessionForDirectClient";

/// Whether the client may be chosen per request
pub const ALLOW_DYNAMIC_CLIENT_SELECTION: &str = "allowDynamicClientSelection";

/// Configuration parameter naming an authorizer
pub const AUTHORIZER_NAME: &str = "authorizerName";

/// Configuration parameter for the default URL
pub const DEFAULT_URL: &str = "defaultUrl";

/// Default URL: the root path
pub const DEFAULT_URL_VALUE: &str = "/";

/// Request parameter carrying a URL
pub const URL: &str = "url";

/// Configuration parameter restricting logout redirect targets
pub const LOGOUT_URL_PATTERN: &str = "logoutUrlPattern";

/// Default logout pattern: relative URLs only
pub const DEFAULT_LOGOUT_URL_PATTERN_VALUE: &str = "/.*";

/// Configuration parameter naming a configuration factory
pub const CONFIG_FACTORY: &str = "configFactory";
