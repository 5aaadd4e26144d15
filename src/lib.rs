//! Card Fields Bridge: payment submission and vault-setup-token orchestration.
//!
//! This library takes locally collected card-instrument data, validates the
//! caller's configuration, normalizes the card into the backend wire formats,
//! and drives one of two mutually exclusive remote protocols:
//!
//! - **Checkout**: create an order through the caller's callback, then
//!   confirm it against the orders backend with the wire-formatted card.
//! - **Vault without purchase**: mint a vault setup token through the
//!   caller's callback, verify it, attach the card as a payment source, and
//!   approve — storing the instrument for later use without a purchase.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────┐
//! │  Field collection │  cross-frame extraction (external collaborator)
//! └─────────┬─────────┘
//!           │ CardFieldsSnapshot + CardFieldsConfig
//! ┌─────────▼────────────────────────────────────┐
//! │       CardFieldsSubmitter (this crate)       │
//! │  ┌──────────────┐    ┌─────────────────────┐ │
//! │  │ config       │    │ card normalization  │ │
//! │  │ validation   │    │ + wire formatting   │ │
//! │  └──────────────┘    └─────────────────────┘ │
//! │  ┌──────────────┐    ┌─────────────────────┐ │
//! │  │ checkout     │    │ vault-without-      │ │
//! │  │ path         │    │ purchase path       │ │
//! │  └──────┬───────┘    └──────────┬──────────┘ │
//! └─────────┼───────────────────────┼────────────┘
//!           │ REST (confirm order)  │ REST (verify) + GraphQL (attach)
//! ┌─────────▼───────────────────────▼────────────┐
//! │              Payments backend                │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Every submission is a single-flight sequential chain: each asynchronous
//! step starts only after the previous one settled, there is no fan-out, no
//! retry and no cancellation once started. Terminal outcomes are reported
//! through the [`telemetry`] event contract.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use card_fields_bridge::{
//!     CardFieldsSnapshot, CardFieldsSubmitter,
//!     api::{ApiConfig, RestPaymentsApi},
//!     card::CardInput,
//!     config::{Approval, ApprovalActions, CardFieldsConfig, CreateOrder, OnApprove},
//!     error::CallbackResult,
//!     telemetry::TracingLogger,
//!     validation::ValidationErrors,
//! };
//!
//! struct MyOrders;
//!
//! #[async_trait]
//! impl CreateOrder for MyOrders {
//!     async fn create_order(&self) -> CallbackResult<serde_json::Value> {
//!         // Usually a call to your own server, which creates the order.
//!         Ok(serde_json::Value::String("ord-123".to_owned()))
//!     }
//! }
//!
//! struct MyApprove;
//!
//! #[async_trait]
//! impl OnApprove for MyApprove {
//!     async fn on_approve(
//!         &self,
//!         approval: Approval,
//!         _actions: &ApprovalActions,
//!     ) -> CallbackResult<()> {
//!         println!("approved: {approval:?}");
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> card_fields_bridge::Result<()> {
//! let api_config = ApiConfig {
//!     orders_url: "https://api.example.com/v2/checkout/orders".to_owned(),
//!     vault_url: "https://api.example.com/v3/vault/setup-tokens".to_owned(),
//!     graphql_url: "https://api.example.com/graphql".to_owned(),
//! };
//!
//! let validation_errors = ValidationErrors::new();
//! let api = RestPaymentsApi::new(api_config, validation_errors.clone())?;
//! let submitter = CardFieldsSubmitter::new(
//!     Arc::new(api),
//!     Arc::new(TracingLogger),
//!     validation_errors,
//! );
//!
//! let config = CardFieldsConfig {
//!     facilitator_access_token: "A21AA...".to_owned(),
//!     client_id: "client-1".to_owned(),
//!     create_order: Some(Arc::new(MyOrders)),
//!     create_vault_setup_token: None,
//!     on_approve: Some(Arc::new(MyApprove)),
//!     on_error: None,
//!     id_token: None,
//! };
//!
//! let snapshot = CardFieldsSnapshot {
//!     fields_available: true,
//!     card: CardInput {
//!         number: "4111111111111111".to_owned(),
//!         expiry: "12/27".to_owned(),
//!         security_code: "123".to_owned(),
//!         name: Some("Jo Doe".to_owned()),
//!         postal_code: None,
//!     },
//! };
//!
//! submitter.submit_card_fields(&snapshot, &config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! To vault an instrument instead, supply `create_vault_setup_token`, an
//! `id_token` and no `create_order`; the configuration validator rejects
//! every other combination before a single callback or network call runs.
//!
//! # Module Organization
//!
//! - [`card`]: card input snapshot and payment-source normalization
//! - [`config`]: caller configuration, callback capability traits, flow
//!   selection
//! - [`api`]: backend seam ([`api::PaymentsApi`]) and its REST/GraphQL
//!   implementation, wire models, endpoint configuration
//! - [`telemetry`]: submission outcome events and the tracking interface
//! - [`validation`]: shared server-side validation error state
//! - [`submit`]: the submission pipeline
//! - [`error`]: error taxonomy

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod api;
pub mod card;
pub mod config;
pub mod error;
pub mod submit;
pub mod telemetry;
pub mod validation;

pub(crate) mod vault;

pub use error::{Result, SubmitError};
pub use submit::{CardFieldsSnapshot, CardFieldsSubmitter};
