//! Backend client for the order and vault protocols.
//!
//! The orchestrator talks to the backends through the [`PaymentsApi`] trait
//! so it stays transport-agnostic and testable. [`RestPaymentsApi`] is the
//! production implementation: REST for the order confirmation and the vault
//! verify read, GraphQL for the attach mutation.

pub mod config;
pub mod models;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use tracing::{info, instrument};

pub use config::ApiConfig;
pub use models::{
    ConfirmOrderOptions, ConfirmOrderRequest, ConfirmOrderResponse, UpdateVaultSetupToken,
    UpdateVaultSetupTokenResponse, VaultCustomer, VaultLink, VaultSetupTokenResponse,
    VaultTokenStatus, WireBillingAddress, WireCard, WirePaymentSource,
};

use crate::{
    error::{Result, SubmitError},
    validation::ValidationErrors,
};

/// Attach mutation sent to the GraphQL endpoint.
const UPDATE_VAULT_SETUP_TOKEN_QUERY: &str = "\
mutation UpdateVaultSetupToken(
  $clientId: String!
  $idToken: String
  $vaultSetupToken: String!
  $paymentSource: PaymentSource
) {
  updateVaultSetupToken(
    clientId: $clientId
    idToken: $idToken
    vaultSetupToken: $vaultSetupToken
    paymentSource: $paymentSource
  ) {
    id
    status
  }
}";

/// Remote operations the submission pipeline depends on.
///
/// Every operation is independently fallible and performs no retries;
/// sequencing and failure policy belong to the orchestrator.
#[async_trait]
pub trait PaymentsApi: Send + Sync {
    /// Confirms an order with the wire-formatted payment source.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be sent or the backend
    /// answers with a failure status.
    async fn confirm_order(
        &self,
        order_id: &str,
        request: &ConfirmOrderRequest,
        options: &ConfirmOrderOptions,
    ) -> Result<ConfirmOrderResponse>;

    /// Reads a vault setup token. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be sent, the backend answers
    /// with a failure status, or the payload does not parse.
    async fn get_vault_setup_token(
        &self,
        vault_setup_token: &str,
        facilitator_access_token: &str,
    ) -> Result<VaultSetupTokenResponse>;

    /// Attaches a payment source to a vault setup token.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be sent or the mutation is
    /// rejected.
    async fn update_vault_setup_token(
        &self,
        params: UpdateVaultSetupToken<'_>,
    ) -> Result<UpdateVaultSetupTokenResponse>;
}

/// Creates the configured HTTP client with connection pooling.
///
/// Transport-level timeouts are the only timeouts in the pipeline: 30
/// seconds total, 10 seconds to connect, at most 10 idle connections per
/// host.
///
/// # Errors
///
/// Returns an error if client configuration fails.
pub fn create_http_client() -> Result<Client> {
    Client::builder()
        .pool_max_idle_per_host(10)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .map_err(SubmitError::Http)
}

/// REST/GraphQL implementation of [`PaymentsApi`].
#[derive(Debug, Clone)]
pub struct RestPaymentsApi {
    client: Client,
    config: ApiConfig,
    validation_errors: ValidationErrors,
}

impl RestPaymentsApi {
    /// Builds the client against a validated endpoint configuration.
    ///
    /// Field-level validation errors parsed from failure responses are
    /// recorded into `validation_errors`, which the caller shares with the
    /// field-rendering layer.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::ApiConfig`] when an endpoint is invalid, or an
    /// HTTP error when the client cannot be constructed.
    pub fn new(config: ApiConfig, validation_errors: ValidationErrors) -> Result<Self> {
        config.validate()?;
        Ok(Self { client: create_http_client()?, config, validation_errors })
    }

    /// Turns a failure response into a domain error, recording any
    /// field-level validation details it carries.
    async fn failure(&self, operation: &'static str, response: Response) -> SubmitError {
        let status = response.status();
        let body = response.bytes().await.unwrap_or_default();
        self.record_field_errors(&body);

        let message = serde_json::from_slice::<Value>(&body)
            .ok()
            .and_then(|value| value.get("message").and_then(Value::as_str).map(str::to_owned));

        match message {
            Some(message) => SubmitError::Api(format!("{operation} returned status {status}: {message}")),
            None => SubmitError::Api(format!("{operation} returned status {status}")),
        }
    }

    /// Records `details[].field` entries from a failure body.
    fn record_field_errors(&self, body: &[u8]) {
        let Ok(value) = serde_json::from_slice::<Value>(body) else {
            return;
        };
        let Some(details) = value.get("details").and_then(Value::as_array) else {
            return;
        };
        let fields = details
            .iter()
            .filter_map(|detail| detail.get("field").and_then(Value::as_str))
            .map(str::to_owned);
        self.validation_errors.record(fields);
    }
}

#[async_trait]
impl PaymentsApi for RestPaymentsApi {
    #[instrument(skip(self, request, options), fields(order_id = %order_id))]
    async fn confirm_order(
        &self,
        order_id: &str,
        request: &ConfirmOrderRequest,
        options: &ConfirmOrderOptions,
    ) -> Result<ConfirmOrderResponse> {
        info!("confirming order");

        let url = format!(
            "{}/{order_id}/confirm-payment-source",
            self.config.orders_url.trim_end_matches('/')
        );

        let mut builder = self
            .client
            .post(url)
            .bearer_auth(&options.facilitator_access_token)
            .json(request);
        if !options.partner_attribution_id.is_empty() {
            builder = builder.header("Partner-Attribution-Id", &options.partner_attribution_id);
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            return Err(self.failure("order confirmation", response).await);
        }

        let confirmation: ConfirmOrderResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::Api(format!("failed to parse order confirmation: {e}")))?;

        Ok(confirmation)
    }

    #[instrument(skip(self, facilitator_access_token), fields(vault_setup_token = %vault_setup_token))]
    async fn get_vault_setup_token(
        &self,
        vault_setup_token: &str,
        facilitator_access_token: &str,
    ) -> Result<VaultSetupTokenResponse> {
        info!("reading vault setup token");

        let url =
            format!("{}/{vault_setup_token}", self.config.vault_url.trim_end_matches('/'));

        let response =
            self.client.get(url).bearer_auth(facilitator_access_token).send().await?;
        if !response.status().is_success() {
            return Err(self.failure("vault setup token read", response).await);
        }

        let token: VaultSetupTokenResponse = response
            .json()
            .await
            .map_err(|e| SubmitError::Api(format!("failed to parse vault setup token: {e}")))?;

        Ok(token)
    }

    #[instrument(skip(self, params), fields(vault_setup_token = %params.vault_setup_token))]
    async fn update_vault_setup_token(
        &self,
        params: UpdateVaultSetupToken<'_>,
    ) -> Result<UpdateVaultSetupTokenResponse> {
        info!("attaching payment source to vault setup token");

        let request = models::GraphQlRequest {
            query: UPDATE_VAULT_SETUP_TOKEN_QUERY,
            variables: models::UpdateVaultSetupTokenVariables {
                client_id: params.client_id,
                id_token: params.id_token,
                vault_setup_token: params.vault_setup_token,
                payment_source: params.payment_source,
            },
        };

        let response =
            self.client.post(&self.config.graphql_url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(self.failure("vault setup token attach", response).await);
        }

        let envelope: models::GraphQlResponse<models::UpdateVaultSetupTokenData> = response
            .json()
            .await
            .map_err(|e| SubmitError::Api(format!("failed to parse attach response: {e}")))?;

        if let Some(error) = envelope.errors.first() {
            return Err(SubmitError::Api(format!(
                "vault setup token attach rejected: {}",
                error.message
            )));
        }

        let data = envelope.data.ok_or_else(|| {
            SubmitError::Api("vault setup token attach returned no data".to_owned())
        })?;

        Ok(data.update_vault_setup_token)
    }
}
