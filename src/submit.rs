//! Top-level card-fields submission pipeline.
//!
//! One submission is one strict sequential async chain: validate the caller
//! configuration, reset the shared validation-error state, check the field
//! snapshot, normalize the card, then run exactly one of the two remote
//! protocols. The engine provides no internal mutual exclusion across
//! concurrent submissions; callers sharing a [`ValidationErrors`] handle
//! must serialize.

use std::{fmt, sync::Arc};

use tracing::{info, instrument};

use crate::{
    api::{ConfirmOrderOptions, ConfirmOrderRequest, PaymentsApi, WirePaymentSource},
    card::{self, CardInput, NormalizedPaymentSource},
    config::{Approval, ApprovalActions, CardFieldsConfig, CheckoutConfig, SubmissionConfig},
    error::{Result, SubmitError},
    telemetry::{TelemetryEvent, TrackingLogger},
    validation::ValidationErrors,
    vault,
};

/// Field state handed over by the field-collection collaborator.
///
/// The collaborator decides validity; the engine does not re-derive it. The
/// card values are an immutable snapshot taken once per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFieldsSnapshot {
    /// Whether the collected fields are complete enough to submit.
    pub fields_available: bool,
    /// The captured card values.
    pub card: CardInput,
}

/// Drives card-fields submissions against the payments backend.
///
/// Holds the injected collaborators: the backend seam, the telemetry sink
/// and the shared validation-error handle. Configuration and field values
/// are per-submission inputs.
#[derive(Clone)]
pub struct CardFieldsSubmitter {
    api: Arc<dyn PaymentsApi>,
    telemetry: Arc<dyn TrackingLogger>,
    validation_errors: ValidationErrors,
}

impl fmt::Debug for CardFieldsSubmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardFieldsSubmitter")
            .field("validation_errors", &self.validation_errors)
            .finish_non_exhaustive()
    }
}

impl CardFieldsSubmitter {
    /// Creates a submitter from its collaborators.
    ///
    /// Share `validation_errors` with the API implementation (see
    /// [`crate::api::RestPaymentsApi::new`]) so backend field errors land in
    /// the same state this engine resets.
    #[must_use]
    pub fn new(
        api: Arc<dyn PaymentsApi>,
        telemetry: Arc<dyn TrackingLogger>,
        validation_errors: ValidationErrors,
    ) -> Self {
        Self { api, telemetry, validation_errors }
    }

    /// Submits the captured card fields.
    ///
    /// Selects the vault-without-purchase flow when the configuration
    /// carries a vault setup token factory, and the checkout flow when it
    /// carries an order factory. Configuration and card-format failures are
    /// synchronous, happen before any network call, and are not reported to
    /// telemetry. Remote and callback failures are reported, forwarded to
    /// the caller's error callback when supplied, and returned.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the pipeline; see [`SubmitError`] for
    /// the taxonomy.
    #[instrument(skip_all)]
    pub async fn submit_card_fields(
        &self,
        snapshot: &CardFieldsSnapshot,
        config: &CardFieldsConfig,
    ) -> Result<()> {
        let submission = config.validate()?;

        // Stale errors from a previous attempt are cleared even when this
        // attempt fails before reaching the backend.
        self.validation_errors.reset();

        if !snapshot.fields_available {
            return Err(SubmitError::FieldsUnavailable);
        }

        let payment_source = card::normalize(&snapshot.card)?;

        match submission {
            SubmissionConfig::Vault(vault_config) => {
                vault::save_payment_source(
                    self.api.as_ref(),
                    self.telemetry.as_ref(),
                    &vault_config,
                    &payment_source,
                )
                .await
            }
            SubmissionConfig::Checkout(checkout_config) => {
                self.confirm_order_flow(&checkout_config, &payment_source).await
            }
        }
    }

    /// Checkout path: create the order through the caller, confirm it with
    /// the wire-formatted card, then approve.
    async fn confirm_order_flow(
        &self,
        config: &CheckoutConfig,
        payment_source: &NormalizedPaymentSource,
    ) -> Result<()> {
        // No order id exists until the callback resolves, so these failures
        // are reported without one.
        let order_value = match config.create_order.create_order().await {
            Ok(value) => value,
            Err(source) => {
                let error = SubmitError::OrderFactory { source };
                return Err(self.report_failure(config, None, error).await);
            }
        };

        let Some(order_id) = order_value.as_str().map(str::to_owned) else {
            return Err(self.report_failure(config, None, SubmitError::OrderIdType).await);
        };

        info!(order_id = %order_id, "order created");

        let request =
            ConfirmOrderRequest { payment_source: WirePaymentSource::from(payment_source) };
        let options = ConfirmOrderOptions {
            facilitator_access_token: config.facilitator_access_token.clone(),
            partner_attribution_id: String::new(),
        };
        if let Err(error) = self.api.confirm_order(&order_id, &request, &options).await {
            return Err(self.report_failure(config, Some(&order_id), error).await);
        }

        let approval = Approval::Order { order_id: order_id.clone() };
        if let Err(source) = config.on_approve.on_approve(approval, &ApprovalActions).await {
            let error = SubmitError::ApprovalCallback { source };
            return Err(self.report_failure(config, Some(&order_id), error).await);
        }

        self.telemetry.track_event(&TelemetryEvent::TransactionSuccess { order_id });

        Ok(())
    }

    /// Shared checkout failure path: telemetry with the order id once known,
    /// then the caller's error callback, then the error back to the caller.
    async fn report_failure(
        &self,
        config: &CheckoutConfig,
        order_id: Option<&str>,
        error: SubmitError,
    ) -> SubmitError {
        self.telemetry.track_event(&TelemetryEvent::TransactionError {
            error: error.to_string(),
            order_id: order_id.map(str::to_owned),
        });

        if let Some(on_error) = &config.on_error {
            on_error.on_error(&error).await;
        }

        error
    }
}
