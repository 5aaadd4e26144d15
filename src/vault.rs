//! Vault-without-purchase: mint, verify, attach, approve.
//!
//! A strictly sequential protocol. Every hop is independently fallible and
//! nothing is retried; the first failure is reported and returned. Once the
//! token factory has resolved, the minted token accompanies every failure
//! event, which is what the single shared failure path below guarantees.

use tracing::{info, instrument};

use crate::{
    api::{PaymentsApi, UpdateVaultSetupToken},
    card::NormalizedPaymentSource,
    config::{Approval, ApprovalActions, VaultConfig},
    error::{Result, SubmitError},
    telemetry::{TelemetryEvent, TrackingLogger},
};

/// Runs the vault-without-purchase protocol to completion or first failure.
///
/// Hops, in order: caller's token factory, verify read, attach mutation,
/// caller's approval callback. Failure at any hop emits failure telemetry
/// (with the token once minted), invokes the caller's error callback when
/// supplied, and returns the error. Full success emits success telemetry
/// with the token.
#[instrument(skip_all)]
pub(crate) async fn save_payment_source(
    api: &dyn PaymentsApi,
    telemetry: &dyn TrackingLogger,
    config: &VaultConfig,
    payment_source: &NormalizedPaymentSource,
) -> Result<()> {
    let vault_setup_token =
        match config.create_vault_setup_token.create_vault_setup_token().await {
            Ok(token) => token,
            Err(source) => {
                let error = SubmitError::TokenFactory { source };
                return Err(report_failure(telemetry, config, None, error).await);
            }
        };

    info!("vault setup token minted");

    if let Err(error) = api
        .get_vault_setup_token(&vault_setup_token, &config.facilitator_access_token)
        .await
    {
        return Err(report_failure(telemetry, config, Some(&vault_setup_token), error).await);
    }

    let update = UpdateVaultSetupToken {
        client_id: &config.client_id,
        id_token: Some(&config.id_token),
        vault_setup_token: &vault_setup_token,
        payment_source,
    };
    if let Err(error) = api.update_vault_setup_token(update).await {
        return Err(report_failure(telemetry, config, Some(&vault_setup_token), error).await);
    }

    let approval = Approval::Vault { vault_setup_token: vault_setup_token.clone() };
    if let Err(source) = config.on_approve.on_approve(approval, &ApprovalActions).await {
        let error = SubmitError::ApprovalCallback { source };
        return Err(report_failure(telemetry, config, Some(&vault_setup_token), error).await);
    }

    telemetry
        .track_event(&TelemetryEvent::VaultWithoutPurchaseSuccess { vault_token: vault_setup_token });

    Ok(())
}

/// Shared failure path for every hop.
///
/// `vault_token` is `None` only before the factory has resolved; afterwards
/// the minted token is always attached to the failure event.
async fn report_failure(
    telemetry: &dyn TrackingLogger,
    config: &VaultConfig,
    vault_token: Option<&str>,
    error: SubmitError,
) -> SubmitError {
    telemetry.track_event(&TelemetryEvent::VaultWithoutPurchaseError {
        error: error.to_string(),
        vault_token: vault_token.map(str::to_owned),
    });

    if let Some(on_error) = &config.on_error {
        on_error.on_error(&error).await;
    }

    error
}
