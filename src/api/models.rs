//! Wire models for the orders and vault backends.
//!
//! The normalized payment source keeps camelCase naming (the attach
//! mutation's input format); the order-confirmation call expects the
//! snake_case projection. [`WireCard`] is that boundary-only reformatting
//! and is never embedded back into the normalized record.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::card::{NormalizedCard, NormalizedPaymentSource};

/// snake_case billing address projection.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WireBillingAddress {
    /// Postal code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// snake_case card projection sent to the order-confirmation call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WireCard {
    /// Card number.
    pub number: String,
    /// Expiry in `YYYY-MM` form.
    pub expiry: String,
    /// CVV/CVC.
    pub security_code: String,
    /// Cardholder name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Billing address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<WireBillingAddress>,
}

impl From<&NormalizedCard> for WireCard {
    fn from(card: &NormalizedCard) -> Self {
        Self {
            number: card.number.clone(),
            expiry: card.expiry.clone(),
            security_code: card.security_code.clone(),
            name: card.name.clone(),
            billing_address: card.billing_address.as_ref().map(|address| WireBillingAddress {
                postal_code: address.postal_code.clone(),
            }),
        }
    }
}

/// snake_case payment source wrapper.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WirePaymentSource {
    /// The wire-formatted card.
    pub card: WireCard,
}

impl From<&NormalizedPaymentSource> for WirePaymentSource {
    fn from(source: &NormalizedPaymentSource) -> Self {
        Self { card: WireCard::from(&source.card) }
    }
}

/// Body of the order-confirmation call.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfirmOrderRequest {
    /// The funding instrument confirming the order.
    pub payment_source: WirePaymentSource,
}

/// Per-call options for the order-confirmation call.
#[derive(Debug, Clone)]
pub struct ConfirmOrderOptions {
    /// Scoped bearer credential authorizing the confirmation.
    pub facilitator_access_token: String,
    /// Partner attribution id forwarded to the backend; empty when the
    /// integration carries none.
    pub partner_attribution_id: String,
}

/// Order confirmation payload returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmOrderResponse {
    /// Id of the confirmed order.
    pub id: String,
    /// Order status, when the backend reports one.
    #[serde(default)]
    pub status: Option<String>,
    /// Echo of the accepted payment source, when present.
    #[serde(default)]
    pub payment_source: Option<Value>,
}

/// Lifecycle status of a vault setup token.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VaultTokenStatus {
    /// Payer approved the token.
    Approved,
    /// Token minted, nothing attached yet.
    Created,
    /// Payer interaction required before the token can be used.
    PayerActionRequired,
    /// A payment source is attached.
    Tokenized,
    /// The instrument is vaulted.
    Vaulted,
}

/// Customer the vault setup token belongs to.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultCustomer {
    /// Customer id.
    pub id: String,
}

/// HATEOAS link returned with a vault setup token.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultLink {
    /// Link target.
    pub href: String,
    /// Relation: `approve`, `confirm` or `self`.
    pub rel: String,
    /// HTTP method for the link.
    pub method: String,
}

/// Vault setup token as returned by the verify read.
#[derive(Debug, Clone, Deserialize)]
pub struct VaultSetupTokenResponse {
    /// The token id.
    pub id: String,
    /// Owning customer.
    pub customer: VaultCustomer,
    /// Current lifecycle status.
    pub status: VaultTokenStatus,
    /// Attached payment source, when any.
    #[serde(default)]
    pub payment_source: Option<Value>,
    /// Follow-up links.
    #[serde(default)]
    pub links: Vec<VaultLink>,
}

/// Result of the attach mutation.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateVaultSetupTokenResponse {
    /// The token id.
    pub id: String,
    /// Status after the attach.
    pub status: VaultTokenStatus,
}

/// Parameters of the attach mutation.
#[derive(Debug, Clone)]
pub struct UpdateVaultSetupToken<'a> {
    /// Client id the mutation is performed under.
    pub client_id: &'a str,
    /// Payer identity token; optional for backward compatibility.
    pub id_token: Option<&'a str>,
    /// The token being attached to.
    pub vault_setup_token: &'a str,
    /// The normalized payment source to attach.
    pub payment_source: &'a NormalizedPaymentSource,
}

/// GraphQL variables of the attach mutation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UpdateVaultSetupTokenVariables<'a> {
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<&'a str>,
    pub vault_setup_token: &'a str,
    pub payment_source: &'a NormalizedPaymentSource,
}

/// Envelope for a GraphQL call.
#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

/// Envelope for a GraphQL response.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct GraphQlResponse<T> {
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// Single GraphQL error entry.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
}

/// Response data of the attach mutation.
#[derive(Debug, Deserialize)]
pub(crate) struct UpdateVaultSetupTokenData {
    #[serde(rename = "updateVaultSetupToken")]
    pub update_vault_setup_token: UpdateVaultSetupTokenResponse,
}
