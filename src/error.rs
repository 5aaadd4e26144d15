//! Error types for the card fields bridge.
//!
//! All errors implement the standard [`std::error::Error`] trait via
//! [`thiserror::Error`].
//!
//! # Error Categories
//!
//! - **Configuration errors** ([`SubmitError::DisallowedCheckoutField`],
//!   [`SubmitError::MissingVaultField`], [`SubmitError::MissingCheckoutField`],
//!   [`SubmitError::MissingFlow`], [`SubmitError::ApiConfig`]): raised
//!   synchronously before any network I/O, never reported to telemetry
//! - **Format errors** ([`SubmitError::InvalidExpiry`]): malformed card input,
//!   also synchronous and pre-I/O
//! - **Remote errors** ([`SubmitError::Http`], [`SubmitError::Api`]): a backend
//!   round-trip failed
//! - **Callback errors** ([`SubmitError::OrderFactory`],
//!   [`SubmitError::TokenFactory`], [`SubmitError::ApprovalCallback`]): a
//!   caller-supplied callback rejected

use thiserror::Error;

/// Result type alias for bridge operations.
///
/// This is a convenience type that uses [`SubmitError`] as the error type.
/// All fallible functions in this crate return this type.
pub type Result<T> = std::result::Result<T, SubmitError>;

/// Opaque failure surfaced by a caller-supplied callback.
///
/// Callbacks belong to the caller, so the bridge makes no assumption about
/// their error type beyond it being a sendable [`std::error::Error`].
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by caller-supplied callbacks.
pub type CallbackResult<T> = std::result::Result<T, CallbackError>;

/// Errors that can occur while submitting card fields.
///
/// Configuration and format variants are produced before any I/O and are
/// never reported to telemetry. Remote and callback variants are reported to
/// telemetry with the best available context (order id or vault setup token,
/// once minted), forwarded to the caller's error callback when supplied, and
/// then returned to the original caller. There are no automatic retries
/// anywhere; re-submission is a fresh, independent pipeline run.
#[must_use = "errors should be handled, propagated, or explicitly panicked"]
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A checkout-only field was supplied together with the vault token
    /// factory. The two flows are mutually exclusive.
    #[error("do not pass {0} when saving card fields")]
    DisallowedCheckoutField(&'static str),

    /// A field required by the vault-without-purchase flow is missing.
    #[error("{0} is required when saving card fields")]
    MissingVaultField(&'static str),

    /// A field required by the checkout flow is missing.
    #[error("{0} is required to confirm an order")]
    MissingCheckoutField(&'static str),

    /// Neither flow was configured.
    #[error("must pass either create_vault_setup_token or create_order")]
    MissingFlow,

    /// The backend endpoint configuration was rejected.
    #[error("invalid API configuration: {0}")]
    ApiConfig(String),

    /// The field-collection collaborator reported no submittable fields.
    ///
    /// Raised before any network call and never reported to telemetry.
    #[error("card fields not available to submit")]
    FieldsUnavailable,

    /// The card expiry did not match any accepted shape.
    ///
    /// The message embeds the offending input verbatim.
    #[error("can not convert invalid expiry date: {0}")]
    InvalidExpiry(String),

    /// The order-creation callback resolved with a non-string value.
    #[error("expected create_order to resolve with the order id as a string")]
    OrderIdType,

    /// HTTP transport failure while talking to a backend.
    ///
    /// Wraps [`reqwest::Error`]: timeouts, connection failures, TLS errors.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A backend accepted the request but answered with a failure.
    #[error("API request failed: {0}")]
    Api(String),

    /// The caller's order-creation callback rejected.
    #[error("create_order callback failed: {source}")]
    OrderFactory {
        /// The caller's error.
        #[source]
        source: CallbackError,
    },

    /// The caller's vault-setup-token factory rejected.
    #[error("create_vault_setup_token callback failed: {source}")]
    TokenFactory {
        /// The caller's error.
        #[source]
        source: CallbackError,
    },

    /// The caller's approval callback rejected.
    #[error("on_approve callback failed: {source}")]
    ApprovalCallback {
        /// The caller's error.
        #[source]
        source: CallbackError,
    },

    /// Restarting a submission is not supported.
    #[error("restart is not supported when submitting card fields")]
    RestartUnsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disallowed_field_display() {
        let error = SubmitError::DisallowedCheckoutField("create_order");
        assert_eq!(error.to_string(), "do not pass create_order when saving card fields");
    }

    #[test]
    fn test_invalid_expiry_embeds_input() {
        let error = SubmitError::InvalidExpiry("2023/02".to_owned());
        assert!(error.to_string().contains("2023/02"));
    }

    #[test]
    fn test_callback_error_chains_source() {
        let source: CallbackError = "merchant declined".into();
        let error = SubmitError::TokenFactory { source };
        assert!(std::error::Error::source(&error).is_some());
        assert!(error.to_string().contains("create_vault_setup_token"));
    }

    #[test]
    fn test_fields_unavailable_message_is_fixed() {
        assert_eq!(
            SubmitError::FieldsUnavailable.to_string(),
            "card fields not available to submit"
        );
    }
}
