//! Signed token infrastructure
//!
//! Both tokens in a launch go through here:
//! - the `lti_message_hint` the platform signs for itself at login initiation
//! - the `id_token` handed to the tool after authentication
//!
//! # Modules
//!
//! - `keys` - signing keys and the published JWKS
//! - `codec` - signing and verification

pub mod codec;
pub mod keys;

pub use codec::{ASYMMETRIC_ALGORITHMS, DEFAULT_LEEWAY, TokenCodec};
pub use keys::{KeySet, SigningKey};
