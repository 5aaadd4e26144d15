//! Submission outcome telemetry.
//!
//! The bridge reports every terminal submission outcome as a named event
//! with a flat key/value payload. The transport is an external collaborator:
//! implement [`TrackingLogger`] to route events wherever the surrounding
//! system sends them. [`TracingLogger`] is the default implementation and
//! emits through [`tracing`] on a dedicated target.

use tracing::info;

/// Terminal outcome of a submission pipeline.
///
/// Failure events carry the order id or vault setup token only once it is
/// known; a token minted before the failure always accompanies the event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelemetryEvent {
    /// A purchase order was confirmed and approved.
    TransactionSuccess {
        /// Id of the confirmed order.
        order_id: String,
    },
    /// The checkout path failed.
    TransactionError {
        /// Rendered failure.
        error: String,
        /// Order id, when order creation had already resolved.
        order_id: Option<String>,
    },
    /// A payment instrument was vaulted without a purchase.
    VaultWithoutPurchaseSuccess {
        /// The attached vault setup token.
        vault_token: String,
    },
    /// The vault-without-purchase path failed.
    VaultWithoutPurchaseError {
        /// Rendered failure.
        error: String,
        /// Vault setup token, when the factory had already minted one.
        vault_token: Option<String>,
    },
}

impl TelemetryEvent {
    /// Stable event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TransactionSuccess { .. } => "transaction_success",
            Self::TransactionError { .. } => "transaction_error",
            Self::VaultWithoutPurchaseSuccess { .. } => "vault_without_purchase_success",
            Self::VaultWithoutPurchaseError { .. } => "vault_without_purchase_error",
        }
    }

    /// Flat key/value payload. Optional keys are absent, never blank.
    #[must_use]
    pub fn payload(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::TransactionSuccess { order_id } => {
                vec![("orderID", order_id.clone())]
            }
            Self::TransactionError { error, order_id } => {
                let mut payload = vec![("error", error.clone())];
                if let Some(order_id) = order_id {
                    payload.push(("orderID", order_id.clone()));
                }
                payload
            }
            Self::VaultWithoutPurchaseSuccess { vault_token } => {
                vec![("vaultToken", vault_token.clone())]
            }
            Self::VaultWithoutPurchaseError { error, vault_token } => {
                let mut payload = vec![("error", error.clone())];
                if let Some(vault_token) = vault_token {
                    payload.push(("vaultToken", vault_token.clone()));
                }
                payload
            }
        }
    }
}

/// Transport-agnostic telemetry sink.
///
/// The orchestrator only ever hands over an event name and a flat payload;
/// batching, enrichment and delivery belong to the implementation.
pub trait TrackingLogger: Send + Sync {
    /// Records one event.
    fn track(&self, event_name: &str, payload: &[(&'static str, String)]);

    /// Records a [`TelemetryEvent`] through [`track`](Self::track).
    fn track_event(&self, event: &TelemetryEvent) {
        self.track(event.name(), &event.payload());
    }
}

/// Default sink emitting events through [`tracing`] with target
/// `"telemetry"`, so they can be filtered and routed independently of
/// diagnostic logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TrackingLogger for TracingLogger {
    fn track(&self, event_name: &str, payload: &[(&'static str, String)]) {
        info!(target: "telemetry", event = %event_name, payload = ?payload, "TRACK");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let events = [
            (
                TelemetryEvent::TransactionSuccess { order_id: "ord-1".to_owned() },
                "transaction_success",
            ),
            (
                TelemetryEvent::TransactionError { error: "boom".to_owned(), order_id: None },
                "transaction_error",
            ),
            (
                TelemetryEvent::VaultWithoutPurchaseSuccess { vault_token: "vst-1".to_owned() },
                "vault_without_purchase_success",
            ),
            (
                TelemetryEvent::VaultWithoutPurchaseError {
                    error: "boom".to_owned(),
                    vault_token: None,
                },
                "vault_without_purchase_error",
            ),
        ];

        for (event, name) in events {
            assert_eq!(event.name(), name);
        }
    }

    #[test]
    fn test_success_payloads() {
        let event = TelemetryEvent::TransactionSuccess { order_id: "ord-1".to_owned() };
        assert_eq!(event.payload(), vec![("orderID", "ord-1".to_owned())]);

        let event = TelemetryEvent::VaultWithoutPurchaseSuccess { vault_token: "vst-1".to_owned() };
        assert_eq!(event.payload(), vec![("vaultToken", "vst-1".to_owned())]);
    }

    #[test]
    fn test_error_payload_omits_unknown_token() {
        let event =
            TelemetryEvent::VaultWithoutPurchaseError { error: "boom".to_owned(), vault_token: None };
        let payload = event.payload();
        assert_eq!(payload.len(), 1);
        assert!(payload.iter().all(|(key, _)| *key != "vaultToken"));
    }

    #[test]
    fn test_error_payload_carries_minted_token() {
        let event = TelemetryEvent::VaultWithoutPurchaseError {
            error: "boom".to_owned(),
            vault_token: Some("vst-1".to_owned()),
        };
        let payload = event.payload();
        assert!(payload.contains(&("vaultToken", "vst-1".to_owned())));
    }

    #[test]
    fn test_transaction_error_payload_with_order_id() {
        let event = TelemetryEvent::TransactionError {
            error: "declined".to_owned(),
            order_id: Some("ord-9".to_owned()),
        };
        let payload = event.payload();
        assert!(payload.contains(&("error", "declined".to_owned())));
        assert!(payload.contains(&("orderID", "ord-9".to_owned())));
    }
}
