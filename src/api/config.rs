//! Backend endpoint configuration.
//!
//! This module defines the TOML-deserializable endpoint configuration for
//! the orders and vault backends, with a validation pass rejecting insecure
//! endpoints before any client is built.

use serde::Deserialize;
use url::Url;

use crate::error::{Result, SubmitError};

/// Endpoints of the backends the bridge talks to.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Orders API base URL; order ids are appended as path segments.
    pub orders_url: String,
    /// Vault setup-token API base URL; tokens are appended as path segments.
    pub vault_url: String,
    /// GraphQL endpoint for vault mutations.
    pub graphql_url: String,
}

impl ApiConfig {
    /// Parses and validates a TOML configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::ApiConfig`] when the document does not parse
    /// or an endpoint fails validation.
    ///
    /// # Examples
    ///
    /// ```
    /// use card_fields_bridge::api::ApiConfig;
    ///
    /// let toml = r#"
    ///     orders_url = "https://api.example.com/v2/checkout/orders"
    ///     vault_url = "https://api.example.com/v3/vault/setup-tokens"
    ///     graphql_url = "https://api.example.com/graphql"
    /// "#;
    ///
    /// let config = ApiConfig::from_toml(toml)?;
    /// assert!(config.orders_url.starts_with("https://"));
    /// # Ok::<(), card_fields_bridge::SubmitError>(())
    /// ```
    pub fn from_toml(document: &str) -> Result<Self> {
        let config: Self = toml::from_str(document)
            .map_err(|e| SubmitError::ApiConfig(format!("invalid endpoint config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every endpoint.
    ///
    /// Endpoints must be HTTPS and must not point at localhost or loopback
    /// addresses.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::ApiConfig`] naming the offending endpoint.
    pub fn validate(&self) -> Result<()> {
        let endpoints = [
            ("orders_url", &self.orders_url),
            ("vault_url", &self.vault_url),
            ("graphql_url", &self.graphql_url),
        ];

        for (name, endpoint) in endpoints {
            validate_endpoint(name, endpoint)?;
        }

        Ok(())
    }
}

/// Validates a single backend endpoint URL.
fn validate_endpoint(name: &str, raw: &str) -> Result<()> {
    let url = Url::parse(raw)
        .map_err(|e| SubmitError::ApiConfig(format!("invalid {name} '{raw}': {e}")))?;

    if url.scheme() != "https" {
        return Err(SubmitError::ApiConfig(format!(
            "{name} must use HTTPS, got: {}",
            url.scheme()
        )));
    }

    if let Some(host) = url.host_str() {
        let host_lower = host.to_lowercase();
        if host_lower == "localhost"
            || host_lower == "::1"
            || host_lower == "[::1]"
            || host_lower.starts_with("127.")
        {
            return Err(SubmitError::ApiConfig(format!(
                "{name} must not be localhost or loopback: {host}"
            )));
        }
    }

    Ok(())
}
