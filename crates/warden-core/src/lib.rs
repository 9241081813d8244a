//! # Warden Core - Credentials, Profiles and the Authenticator Contract
//!
//! Protocol-agnostic foundation shared by every Warden authentication backend.
//! A request adapter wraps a raw token in [`Credentials`], an [`Authenticator`]
//! validates it and fills in a [`UserProfile`], and authorization code reads
//! that profile back without caring which protocol produced it.
//!
//! ## Architecture
//!
//! - [`profile`] - Normalized identity record (`UserProfile`, `ProfileType`)
//! - [`credentials`] - Raw token plus the slot for the resolved profile
//! - [`authenticator`] - The `validate(credentials, context)` contract
//! - [`error`] - Tagged error taxonomy shared by all backends
//! - [`constants`] - Immutable parameter and session key names
//!
//! ## Quick Start
//!
//! ```rust
//! use warden_core::{ProfileType, UserProfile};
//!
//! let mut profile = UserProfile::new(ProfileType::new("GitHubProfile"), "1234");
//! profile.add_attribute("name", "Alice");
//! profile.add_roles(["admin".to_string()]);
//!
//! assert_eq!(profile.typed_id(), "GitHubProfile:1234");
//! assert!(profile.has_role("admin"));
//! ```
//!
//! ## Concurrency
//!
//! Authenticators are `Send + Sync` and are meant to be configured once during
//! single-threaded setup, then shared read-only. `Credentials` and
//! `UserProfile` values are per-request and never shared between calls.

pub mod authenticator;
pub mod constants;
pub mod credentials;
pub mod error;
pub mod profile;

#[doc(inline)]
pub use authenticator::{Authenticator, EmptyContext, MapContext, RequestContext};
#[doc(inline)]
pub use credentials::Credentials;
#[doc(inline)]
pub use error::{AuthError, AuthResult, ErrorKind};
#[doc(inline)]
pub use profile::{ProfileType, TYPED_ID_SEPARATOR, UserProfile};
