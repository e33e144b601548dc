//! Connection parameters and where they come from.
//!
//! The controller asks a [`CredentialResolver`] for fresh parameters at the start
//! of every connection attempt, so a rotated token is picked up on reconnect.

use crate::{config::EndpointConfig, error::CredentialError};
use std::fmt;

/// The endpoint address and access token for one connection attempt.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub endpoint: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Supplies connection parameters. A failure is fatal and never retried.
pub trait CredentialResolver: Send + Sync {
    fn resolve(&self) -> Result<Credentials, CredentialError>;
}

/// Always returns the same credentials.
#[derive(Debug, Clone)]
pub struct StaticCredentialResolver {
    credentials: Credentials,
}

impl StaticCredentialResolver {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            credentials: Credentials {
                endpoint: endpoint.into(),
                token: token.into(),
            },
        }
    }
}

impl CredentialResolver for StaticCredentialResolver {
    fn resolve(&self) -> Result<Credentials, CredentialError> {
        if self.credentials.token.is_empty() {
            return Err(CredentialError::MissingToken {
                var: "<static>".to_string(),
            });
        }
        Ok(self.credentials.clone())
    }
}

/// Reads the token and endpoint from the process environment, falling back to
/// the values in [`EndpointConfig`].
///
/// An empty variable counts as unset.
#[derive(Debug, Clone)]
pub struct EnvCredentialResolver {
    token_var: String,
    endpoint_var: String,
    fallback_endpoint: Option<String>,
    fallback_token: Option<String>,
}

impl EnvCredentialResolver {
    pub fn new(token_var: impl Into<String>, endpoint_var: impl Into<String>) -> Self {
        Self {
            token_var: token_var.into(),
            endpoint_var: endpoint_var.into(),
            fallback_endpoint: None,
            fallback_token: None,
        }
    }

    pub fn from_config(config: &EndpointConfig) -> Self {
        Self {
            token_var: config.token_env.clone(),
            endpoint_var: config.endpoint_env.clone(),
            fallback_endpoint: Some(config.url.clone()).filter(|url| !url.is_empty()),
            fallback_token: config.x_token.clone().filter(|token| !token.is_empty()),
        }
    }
}

impl CredentialResolver for EnvCredentialResolver {
    fn resolve(&self) -> Result<Credentials, CredentialError> {
        let token = non_empty_var(&self.token_var)
            .or_else(|| self.fallback_token.clone())
            .ok_or_else(|| CredentialError::MissingToken {
                var: self.token_var.clone(),
            })?;
        let endpoint = non_empty_var(&self.endpoint_var)
            .or_else(|| self.fallback_endpoint.clone())
            .ok_or_else(|| CredentialError::MissingEndpoint {
                var: self.endpoint_var.clone(),
            })?;
        Ok(Credentials { endpoint, token })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}
