//! Authenticator implementation
//!
//! Handles applying credentials to outbound requests.

use super::types::{AuthConfig, Location};
use crate::http::RequestSpec;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Authenticator handles applying authentication to HTTP requests
#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    config: AuthConfig,
}

impl Authenticator {
    /// Create a new authenticator with the given config
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// The credentials this authenticator applies
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Apply authentication to a request
    pub fn apply(&self, request: &mut RequestSpec) {
        match &self.config {
            AuthConfig::None => {}

            AuthConfig::ApiKey {
                location,
                name,
                prefix,
                value,
            } => {
                let val = format!("{}{}", prefix.as_deref().unwrap_or(""), value);
                match location {
                    Location::Header => {
                        let header = name.as_deref().unwrap_or("Authorization");
                        request.headers.insert(header, val);
                    }
                    Location::Query => {
                        let param = name.as_deref().unwrap_or("api_key");
                        request.query.insert(param.to_string(), val);
                    }
                }
            }

            AuthConfig::Basic { username, password } => {
                let encoded = STANDARD.encode(format!("{username}:{password}"));
                request
                    .headers
                    .insert("Authorization", format!("Basic {encoded}"));
            }

            AuthConfig::Bearer { token } => {
                request
                    .headers
                    .insert("Authorization", format!("Bearer {token}"));
            }

            AuthConfig::CustomHeaders { headers } => {
                for (key, value) in headers {
                    request.headers.insert(key, value.clone());
                }
            }
        }
    }
}
