//! Authentication module
//!
//! Supports: API Key (header or query), Basic, Bearer, Custom Headers
//!
//! Credentials are applied to every freshly built request, on every attempt,
//! so a retried request always carries current values.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, Location};
