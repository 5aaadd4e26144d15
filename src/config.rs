//! Caller configuration and callback capabilities.
//!
//! Callers configure a submission by supplying callbacks: a factory for the
//! thing being created (an order, or a vault setup token), an approval
//! callback, and an optional error callback. The callbacks form a capability
//! interface, injected as trait objects rather than looked up ambiently.
//!
//! [`CardFieldsConfig::validate`] enforces the flow invariants synchronously,
//! before any network I/O, and produces the [`SubmissionConfig`] tagged union
//! the orchestrator executes.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CallbackResult, Result, SubmitError};

/// Caller-supplied order factory for the checkout flow.
#[async_trait]
pub trait CreateOrder: Send + Sync {
    /// Resolves the order id for this purchase.
    ///
    /// The value crosses an untyped boundary; the orchestrator rejects any
    /// resolution that is not a JSON string.
    async fn create_order(&self) -> CallbackResult<Value>;
}

/// Caller-supplied token factory for the vault-without-purchase flow.
#[async_trait]
pub trait CreateVaultSetupToken: Send + Sync {
    /// Mints a new vault setup token for this submission attempt.
    async fn create_vault_setup_token(&self) -> CallbackResult<String>;
}

/// Payload delivered to the approval callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Approval {
    /// A purchase order was confirmed.
    Order {
        /// Id of the confirmed order.
        order_id: String,
    },
    /// A payment instrument was vaulted for later use.
    Vault {
        /// The attached vault setup token.
        vault_setup_token: String,
    },
}

/// Follow-up actions handed to the approval callback.
///
/// Constructed by the orchestrator; callers only receive a reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApprovalActions;

impl ApprovalActions {
    /// Restarting a submission is not supported in these flows.
    ///
    /// # Errors
    ///
    /// Always returns [`SubmitError::RestartUnsupported`].
    pub fn restart(&self) -> Result<()> {
        Err(SubmitError::RestartUnsupported)
    }
}

/// Caller-supplied approval callback.
#[async_trait]
pub trait OnApprove: Send + Sync {
    /// Invoked after the remote protocol completed successfully.
    async fn on_approve(
        &self,
        approval: Approval,
        actions: &ApprovalActions,
    ) -> CallbackResult<()>;
}

/// Caller-supplied error callback.
#[async_trait]
pub trait OnError: Send + Sync {
    /// Invoked with the failure before it is returned to the caller.
    async fn on_error(&self, error: &SubmitError);
}

/// Raw caller configuration for one submission.
///
/// Exactly one of [`create_order`](Self::create_order) and
/// [`create_vault_setup_token`](Self::create_vault_setup_token) may be
/// supplied; [`validate`](Self::validate) rejects every other combination.
#[derive(Clone)]
pub struct CardFieldsConfig {
    /// Scoped bearer credential authorizing order and vault operations on
    /// the payer's behalf.
    pub facilitator_access_token: String,
    /// Client id the vault attach mutation is performed under.
    pub client_id: String,
    /// Order factory; configures the checkout flow.
    pub create_order: Option<Arc<dyn CreateOrder>>,
    /// Vault setup token factory; configures the vault-without-purchase flow.
    pub create_vault_setup_token: Option<Arc<dyn CreateVaultSetupToken>>,
    /// Approval callback, required by both flows.
    pub on_approve: Option<Arc<dyn OnApprove>>,
    /// Error callback, optional in both flows.
    pub on_error: Option<Arc<dyn OnError>>,
    /// Payer identity token, required by the vault-without-purchase flow.
    pub id_token: Option<String>,
}

impl fmt::Debug for CardFieldsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardFieldsConfig")
            .field("client_id", &self.client_id)
            .field("create_order", &self.create_order.is_some())
            .field("create_vault_setup_token", &self.create_vault_setup_token.is_some())
            .field("on_approve", &self.on_approve.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("id_token", &self.id_token.is_some())
            .finish_non_exhaustive()
    }
}

impl CardFieldsConfig {
    /// Validates the configuration and selects the submission flow.
    ///
    /// Checks run in fixed order: disallowed field combinations first (each
    /// checkout-only field is checked independently and the first violation
    /// is reported), then completeness of the selected flow. Validation
    /// never invokes a callback and has no side effects.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the offending field, or
    /// [`SubmitError::MissingFlow`] when neither factory is supplied.
    pub fn validate(&self) -> Result<SubmissionConfig> {
        if let Some(create_vault_setup_token) = &self.create_vault_setup_token {
            // Checkout-only fields, each checked independently in fixed order.
            let checkout_only = [("create_order", self.create_order.is_some())];
            for (field, present) in checkout_only {
                if present {
                    return Err(SubmitError::DisallowedCheckoutField(field));
                }
            }

            let on_approve = self
                .on_approve
                .clone()
                .ok_or(SubmitError::MissingVaultField("on_approve"))?;
            let id_token = self
                .id_token
                .clone()
                .filter(|token| !token.is_empty())
                .ok_or(SubmitError::MissingVaultField("id_token"))?;

            return Ok(SubmissionConfig::Vault(VaultConfig {
                create_vault_setup_token: Arc::clone(create_vault_setup_token),
                on_approve,
                on_error: self.on_error.clone(),
                facilitator_access_token: self.facilitator_access_token.clone(),
                client_id: self.client_id.clone(),
                id_token,
            }));
        }

        if let Some(create_order) = &self.create_order {
            let on_approve = self
                .on_approve
                .clone()
                .ok_or(SubmitError::MissingCheckoutField("on_approve"))?;

            return Ok(SubmissionConfig::Checkout(CheckoutConfig {
                create_order: Arc::clone(create_order),
                on_approve,
                on_error: self.on_error.clone(),
                facilitator_access_token: self.facilitator_access_token.clone(),
            }));
        }

        Err(SubmitError::MissingFlow)
    }
}

/// Validated configuration: exactly one flow.
#[derive(Clone)]
pub enum SubmissionConfig {
    /// Create-and-confirm a purchase order.
    Checkout(CheckoutConfig),
    /// Vault a payment instrument without a purchase.
    Vault(VaultConfig),
}

impl fmt::Debug for SubmissionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkout(_) => f.write_str("SubmissionConfig::Checkout"),
            Self::Vault(_) => f.write_str("SubmissionConfig::Vault"),
        }
    }
}

/// Validated checkout-flow configuration.
#[derive(Clone)]
pub struct CheckoutConfig {
    /// Order factory.
    pub create_order: Arc<dyn CreateOrder>,
    /// Approval callback.
    pub on_approve: Arc<dyn OnApprove>,
    /// Error callback.
    pub on_error: Option<Arc<dyn OnError>>,
    /// Bearer credential for the order-confirmation call.
    pub facilitator_access_token: String,
}

impl fmt::Debug for CheckoutConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckoutConfig")
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

/// Validated vault-without-purchase configuration.
#[derive(Clone)]
pub struct VaultConfig {
    /// Vault setup token factory.
    pub create_vault_setup_token: Arc<dyn CreateVaultSetupToken>,
    /// Approval callback.
    pub on_approve: Arc<dyn OnApprove>,
    /// Error callback.
    pub on_error: Option<Arc<dyn OnError>>,
    /// Bearer credential for the vault verify call.
    pub facilitator_access_token: String,
    /// Client id for the attach mutation.
    pub client_id: String,
    /// Payer identity token forwarded to the attach mutation.
    pub id_token: String,
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("client_id", &self.client_id)
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}
