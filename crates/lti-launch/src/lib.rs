//! # LTI Launch - Launch Authentication and Message Translation
//!
//! The platform side of an LTI launch: translating one launch description between the
//! legacy flat-parameter wire format (LTI 1.0/1.1) and the signed claims format
//! (LTI 1.3), and running the OIDC third-party login that ends in a signed `id_token`.
//!
//! ## Architecture
//!
//! - [`vocabulary`] - Role and context-type translation (legacy URN, LIS v2, handles)
//! - [`claims`] - Flat parameters ↔ claims, plus the content-item graph transform
//! - [`substitution`] - `$Person.name.full`-style placeholder resolution
//! - [`jwt`] - Signing keys, JWKS and the token codec
//! - [`launch`] - Request builder and launch authenticator
//! - [`config`] - Platform configuration (file + `LTI_LAUNCH__*` environment)
//! - [`error`] - Error types
//!
//! ## Quick Start
//!
//! ```rust
//! use lti_launch::{ClaimConverter, FlatParams};
//!
//! let converter = ClaimConverter::default();
//! let mut params = FlatParams::new();
//! params.insert("user_id".into(), "42".into());
//! params.insert("roles".into(), "Instructor,Learner".into());
//!
//! let claims = converter.params_to_claims(&params);
//! assert_eq!(claims["sub"], "42");
//! assert_eq!(
//!     claims["https://purl.imsglobal.org/spec/lti/claim/roles"][0],
//!     "http://purl.imsglobal.org/vocab/lis/v2/membership#Instructor"
//! );
//! ```
//!
//! ## Collaborators
//!
//! Persistence and user sessions stay with the host application. The authenticator
//! reaches them through [`RegistrationRepository`], [`UserAuthenticator`] and
//! [`VariableSubstitutorFactory`].

pub mod claims;
pub mod config;
pub mod error;
pub mod jwt;
pub mod launch;
pub mod logging;
pub mod substitution;
pub mod types;
pub mod vocabulary;

#[doc(inline)]
pub use claims::{ClaimConverter, Claims, FlatParams, convert_content_items_modern_to_legacy};

#[doc(inline)]
pub use config::{ConfigError, LoggingConfig, PlatformConfig};

#[doc(inline)]
pub use error::{
    AuthenticationError, ContentItemError, ErrorKind, RequestField, Result, TokenError,
};

#[doc(inline)]
pub use jwt::{KeySet, SigningKey, TokenCodec};

#[doc(inline)]
pub use launch::{
    AuthenticationRequest, AuthenticationResponse, LaunchAuthenticator, LaunchRequest,
    LaunchRequestBuilder, LaunchState, LoginInitiation, Platform,
};

#[doc(inline)]
pub use substitution::{
    ResolutionContext, StandardSubstitutor, StandardSubstitutorFactory, VariableSubstitutor,
    VariableSubstitutorFactory,
};

#[doc(inline)]
pub use types::{
    AuthResult, DisclosurePolicy, LtiVersion, RegistrationRepository, ToolRegistration,
    UserAuthenticator, UserIdentity,
};

#[doc(inline)]
pub use vocabulary::Vocabulary;
