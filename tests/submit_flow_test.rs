//! Integration tests for the card-fields submission pipeline.
//!
//! Exercises both remote protocols end to end against in-memory doubles for
//! the backend seam, the caller callbacks and the telemetry sink.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use card_fields_bridge::{
    CardFieldsSnapshot, CardFieldsSubmitter, SubmitError,
    api::{
        ConfirmOrderOptions, ConfirmOrderRequest, ConfirmOrderResponse, PaymentsApi,
        UpdateVaultSetupToken, UpdateVaultSetupTokenResponse, VaultCustomer,
        VaultSetupTokenResponse, VaultTokenStatus,
    },
    card::CardInput,
    config::{
        Approval, ApprovalActions, CardFieldsConfig, CreateOrder, CreateVaultSetupToken,
        OnApprove, OnError,
    },
    error::{CallbackResult, Result},
    telemetry::TrackingLogger,
    validation::ValidationErrors,
};
use serde_json::{Value, json};

/// Backend double recording every operation in call order.
#[derive(Default)]
struct StubApi {
    fail_confirm: bool,
    fail_verify: bool,
    fail_attach: bool,
    calls: Mutex<Vec<String>>,
    confirm_bodies: Mutex<Vec<Value>>,
    attach_id_tokens: Mutex<Vec<Option<String>>>,
}

impl StubApi {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentsApi for StubApi {
    async fn confirm_order(
        &self,
        order_id: &str,
        request: &ConfirmOrderRequest,
        _options: &ConfirmOrderOptions,
    ) -> Result<ConfirmOrderResponse> {
        self.calls.lock().unwrap().push(format!("confirm:{order_id}"));
        self.confirm_bodies.lock().unwrap().push(serde_json::to_value(request).unwrap());
        if self.fail_confirm {
            return Err(SubmitError::Api("order confirmation returned status 422".to_owned()));
        }
        Ok(ConfirmOrderResponse {
            id: order_id.to_owned(),
            status: Some("COMPLETED".to_owned()),
            payment_source: None,
        })
    }

    async fn get_vault_setup_token(
        &self,
        vault_setup_token: &str,
        _facilitator_access_token: &str,
    ) -> Result<VaultSetupTokenResponse> {
        self.calls.lock().unwrap().push(format!("verify:{vault_setup_token}"));
        if self.fail_verify {
            return Err(SubmitError::Api("vault setup token read returned status 404".to_owned()));
        }
        Ok(VaultSetupTokenResponse {
            id: vault_setup_token.to_owned(),
            customer: VaultCustomer { id: "cus-1".to_owned() },
            status: VaultTokenStatus::Created,
            payment_source: None,
            links: Vec::new(),
        })
    }

    async fn update_vault_setup_token(
        &self,
        params: UpdateVaultSetupToken<'_>,
    ) -> Result<UpdateVaultSetupTokenResponse> {
        self.calls.lock().unwrap().push(format!("attach:{}", params.vault_setup_token));
        self.attach_id_tokens.lock().unwrap().push(params.id_token.map(str::to_owned));
        if self.fail_attach {
            return Err(SubmitError::Api("vault setup token attach rejected".to_owned()));
        }
        Ok(UpdateVaultSetupTokenResponse {
            id: params.vault_setup_token.to_owned(),
            status: VaultTokenStatus::Tokenized,
        })
    }
}

/// Telemetry double capturing (event name, payload) pairs.
#[derive(Default)]
struct RecordingLogger {
    events: Mutex<Vec<(String, Vec<(&'static str, String)>)>>,
}

impl RecordingLogger {
    fn events(&self) -> Vec<(String, Vec<(&'static str, String)>)> {
        self.events.lock().unwrap().clone()
    }
}

impl TrackingLogger for RecordingLogger {
    fn track(&self, event_name: &str, payload: &[(&'static str, String)]) {
        self.events.lock().unwrap().push((event_name.to_owned(), payload.to_vec()));
    }
}

struct OrderFactory {
    value: Value,
    fail: bool,
    calls: AtomicUsize,
}

impl OrderFactory {
    fn resolving(value: Value) -> Arc<Self> {
        Arc::new(Self { value, fail: false, calls: AtomicUsize::new(0) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { value: Value::Null, fail: true, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl CreateOrder for OrderFactory {
    async fn create_order(&self) -> CallbackResult<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err("order creation failed upstream".into());
        }
        Ok(self.value.clone())
    }
}

struct TokenFactory {
    fail: bool,
    calls: AtomicUsize,
}

impl TokenFactory {
    fn minting() -> Arc<Self> {
        Arc::new(Self { fail: false, calls: AtomicUsize::new(0) })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl CreateVaultSetupToken for TokenFactory {
    async fn create_vault_setup_token(&self) -> CallbackResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err("token service unavailable".into());
        }
        Ok("vst-1".to_owned())
    }
}

struct ApproveRecorder {
    fail: bool,
    approvals: Mutex<Vec<Approval>>,
}

impl ApproveRecorder {
    fn accepting() -> Arc<Self> {
        Arc::new(Self { fail: false, approvals: Mutex::new(Vec::new()) })
    }

    fn rejecting() -> Arc<Self> {
        Arc::new(Self { fail: true, approvals: Mutex::new(Vec::new()) })
    }

    fn approvals(&self) -> Vec<Approval> {
        self.approvals.lock().unwrap().clone()
    }
}

#[async_trait]
impl OnApprove for ApproveRecorder {
    async fn on_approve(
        &self,
        approval: Approval,
        _actions: &ApprovalActions,
    ) -> CallbackResult<()> {
        self.approvals.lock().unwrap().push(approval);
        if self.fail {
            return Err("approval handler rejected".into());
        }
        Ok(())
    }
}

#[derive(Default)]
struct ErrorRecorder {
    errors: Mutex<Vec<String>>,
}

impl ErrorRecorder {
    fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

#[async_trait]
impl OnError for ErrorRecorder {
    async fn on_error(&self, error: &SubmitError) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

struct Harness {
    api: Arc<StubApi>,
    telemetry: Arc<RecordingLogger>,
    validation_errors: ValidationErrors,
    submitter: CardFieldsSubmitter,
}

fn harness(api: StubApi) -> Harness {
    let api = Arc::new(api);
    let telemetry = Arc::new(RecordingLogger::default());
    let validation_errors = ValidationErrors::new();
    let submitter = CardFieldsSubmitter::new(
        Arc::clone(&api) as Arc<dyn PaymentsApi>,
        Arc::clone(&telemetry) as Arc<dyn TrackingLogger>,
        validation_errors.clone(),
    );
    Harness { api, telemetry, validation_errors, submitter }
}

fn snapshot() -> CardFieldsSnapshot {
    CardFieldsSnapshot {
        fields_available: true,
        card: CardInput {
            number: "4111111111111111".to_owned(),
            expiry: "12/27".to_owned(),
            security_code: "123".to_owned(),
            name: Some("Jo Doe".to_owned()),
            postal_code: Some("94025".to_owned()),
        },
    }
}

fn checkout_config(
    create_order: Arc<OrderFactory>,
    on_approve: Arc<ApproveRecorder>,
    on_error: Option<Arc<ErrorRecorder>>,
) -> CardFieldsConfig {
    CardFieldsConfig {
        facilitator_access_token: "facilitator-token".to_owned(),
        client_id: "client-1".to_owned(),
        create_order: Some(create_order),
        create_vault_setup_token: None,
        on_approve: Some(on_approve),
        on_error: on_error.map(|recorder| recorder as Arc<dyn OnError>),
        id_token: None,
    }
}

fn vault_config(
    create_vault_setup_token: Arc<TokenFactory>,
    on_approve: Arc<ApproveRecorder>,
    on_error: Option<Arc<ErrorRecorder>>,
) -> CardFieldsConfig {
    CardFieldsConfig {
        facilitator_access_token: "facilitator-token".to_owned(),
        client_id: "client-1".to_owned(),
        create_order: None,
        create_vault_setup_token: Some(create_vault_setup_token),
        on_approve: Some(on_approve),
        on_error: on_error.map(|recorder| recorder as Arc<dyn OnError>),
        id_token: Some("id-token".to_owned()),
    }
}

#[tokio::test]
async fn checkout_happy_path_confirms_approves_and_tracks() {
    let harness = harness(StubApi::default());
    let orders = OrderFactory::resolving(json!("ord-1"));
    let approve = ApproveRecorder::accepting();
    let config = checkout_config(Arc::clone(&orders), Arc::clone(&approve), None);

    harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap();

    assert_eq!(harness.api.calls(), vec!["confirm:ord-1".to_owned()]);

    let body = harness.api.confirm_bodies.lock().unwrap()[0].clone();
    assert_eq!(body["payment_source"]["card"]["security_code"], "123");
    assert_eq!(body["payment_source"]["card"]["expiry"], "2027-12");
    assert_eq!(body["payment_source"]["card"]["billing_address"]["postal_code"], "94025");

    assert_eq!(approve.approvals(), vec![Approval::Order { order_id: "ord-1".to_owned() }]);
    assert_eq!(
        harness.telemetry.events(),
        vec![("transaction_success".to_owned(), vec![("orderID", "ord-1".to_owned())])]
    );
}

#[tokio::test]
async fn vault_happy_path_verifies_attaches_approves_and_tracks() {
    let harness = harness(StubApi::default());
    let tokens = TokenFactory::minting();
    let approve = ApproveRecorder::accepting();
    let config = vault_config(Arc::clone(&tokens), Arc::clone(&approve), None);

    harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap();

    assert_eq!(harness.api.calls(), vec!["verify:vst-1".to_owned(), "attach:vst-1".to_owned()]);
    assert_eq!(
        harness.api.attach_id_tokens.lock().unwrap().clone(),
        vec![Some("id-token".to_owned())]
    );
    assert_eq!(
        approve.approvals(),
        vec![Approval::Vault { vault_setup_token: "vst-1".to_owned() }]
    );
    assert_eq!(
        harness.telemetry.events(),
        vec![(
            "vault_without_purchase_success".to_owned(),
            vec![("vaultToken", "vst-1".to_owned())]
        )]
    );
}

#[tokio::test]
async fn conflicting_config_fails_before_any_callback_or_network_call() {
    let harness = harness(StubApi::default());
    let orders = OrderFactory::resolving(json!("ord-1"));
    let tokens = TokenFactory::minting();
    let approve = ApproveRecorder::accepting();

    let mut config = checkout_config(Arc::clone(&orders), Arc::clone(&approve), None);
    config.create_vault_setup_token = Some(Arc::clone(&tokens) as Arc<dyn CreateVaultSetupToken>);
    config.id_token = Some("id-token".to_owned());

    let error = harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::DisallowedCheckoutField("create_order")));
    assert_eq!(orders.calls.load(Ordering::SeqCst), 0);
    assert_eq!(tokens.calls.load(Ordering::SeqCst), 0);
    assert!(harness.api.calls().is_empty());
    assert!(harness.telemetry.events().is_empty());
}

#[tokio::test]
async fn unavailable_fields_fail_without_telemetry_but_still_reset_state() {
    let harness = harness(StubApi::default());
    harness.validation_errors.record(["expiry".to_owned()]);

    let orders = OrderFactory::resolving(json!("ord-1"));
    let config = checkout_config(orders, ApproveRecorder::accepting(), None);

    let mut unavailable = snapshot();
    unavailable.fields_available = false;

    let error = harness.submitter.submit_card_fields(&unavailable, &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::FieldsUnavailable));
    assert_eq!(error.to_string(), "card fields not available to submit");
    assert!(harness.api.calls().is_empty());
    assert!(harness.telemetry.events().is_empty());
    // The stale state from the previous attempt is gone regardless.
    assert!(harness.validation_errors.snapshot().is_empty());
}

#[tokio::test]
async fn malformed_expiry_fails_before_any_network_call() {
    let harness = harness(StubApi::default());
    let orders = OrderFactory::resolving(json!("ord-1"));
    let config = checkout_config(Arc::clone(&orders), ApproveRecorder::accepting(), None);

    let mut bad = snapshot();
    bad.card.expiry = "2023/02".to_owned();

    let error = harness.submitter.submit_card_fields(&bad, &config).await.unwrap_err();

    assert!(error.to_string().contains("2023/02"));
    assert_eq!(orders.calls.load(Ordering::SeqCst), 0);
    assert!(harness.api.calls().is_empty());
    assert!(harness.telemetry.events().is_empty());
}

#[tokio::test]
async fn order_factory_failure_tracks_without_order_id_and_skips_confirmation() {
    let harness = harness(StubApi::default());
    let errors = Arc::new(ErrorRecorder::default());
    let config =
        checkout_config(OrderFactory::failing(), ApproveRecorder::accepting(), Some(Arc::clone(&errors)));

    let error = harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::OrderFactory { .. }));
    assert!(harness.api.calls().is_empty());

    let events = harness.telemetry.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "transaction_error");
    assert!(events[0].1.iter().all(|(key, _)| *key != "orderID"));

    assert_eq!(errors.errors().len(), 1);
    assert!(errors.errors()[0].contains("create_order"));
}

#[tokio::test]
async fn non_string_order_id_is_a_type_error_and_skips_confirmation() {
    let harness = harness(StubApi::default());
    let orders = OrderFactory::resolving(json!(42));
    let config = checkout_config(orders, ApproveRecorder::accepting(), None);

    let error = harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::OrderIdType));
    assert!(harness.api.calls().is_empty());

    let events = harness.telemetry.events();
    assert_eq!(events[0].0, "transaction_error");
    assert!(events[0].1.iter().all(|(key, _)| *key != "orderID"));
}

#[tokio::test]
async fn confirmation_failure_tracks_with_order_id_and_skips_approval() {
    let harness = harness(StubApi { fail_confirm: true, ..StubApi::default() });
    let approve = ApproveRecorder::accepting();
    let errors = Arc::new(ErrorRecorder::default());
    let config = checkout_config(
        OrderFactory::resolving(json!("ord-1")),
        Arc::clone(&approve),
        Some(Arc::clone(&errors)),
    );

    let error = harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::Api(_)));
    assert!(approve.approvals().is_empty());

    let events = harness.telemetry.events();
    assert_eq!(events[0].0, "transaction_error");
    assert!(events[0].1.contains(&("orderID", "ord-1".to_owned())));
    assert_eq!(errors.errors().len(), 1);
}

#[tokio::test]
async fn checkout_approval_failure_tracks_with_order_id() {
    let harness = harness(StubApi::default());
    let approve = ApproveRecorder::rejecting();
    let config =
        checkout_config(OrderFactory::resolving(json!("ord-1")), Arc::clone(&approve), None);

    let error = harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::ApprovalCallback { .. }));
    assert_eq!(approve.approvals().len(), 1);

    let events = harness.telemetry.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "transaction_error");
    assert!(events[0].1.contains(&("orderID", "ord-1".to_owned())));
}

#[tokio::test]
async fn token_factory_failure_tracks_without_token_and_stops() {
    let harness = harness(StubApi::default());
    let errors = Arc::new(ErrorRecorder::default());
    let config =
        vault_config(TokenFactory::failing(), ApproveRecorder::accepting(), Some(Arc::clone(&errors)));

    let error = harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::TokenFactory { .. }));
    assert!(harness.api.calls().is_empty());

    let events = harness.telemetry.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "vault_without_purchase_error");
    assert!(events[0].1.iter().all(|(key, _)| *key != "vaultToken"));
    assert_eq!(errors.errors().len(), 1);
}

#[tokio::test]
async fn verify_failure_tracks_minted_token_and_skips_attach_and_approval() {
    let harness = harness(StubApi { fail_verify: true, ..StubApi::default() });
    let approve = ApproveRecorder::accepting();
    let config = vault_config(TokenFactory::minting(), Arc::clone(&approve), None);

    let error = harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::Api(_)));
    assert_eq!(harness.api.calls(), vec!["verify:vst-1".to_owned()]);
    assert!(approve.approvals().is_empty());

    let events = harness.telemetry.events();
    assert_eq!(events[0].0, "vault_without_purchase_error");
    assert!(events[0].1.contains(&("vaultToken", "vst-1".to_owned())));
}

#[tokio::test]
async fn attach_failure_tracks_minted_token_and_skips_approval() {
    let harness = harness(StubApi { fail_attach: true, ..StubApi::default() });
    let approve = ApproveRecorder::accepting();
    let errors = Arc::new(ErrorRecorder::default());
    let config =
        vault_config(TokenFactory::minting(), Arc::clone(&approve), Some(Arc::clone(&errors)));

    let error = harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::Api(_)));
    assert_eq!(harness.api.calls(), vec!["verify:vst-1".to_owned(), "attach:vst-1".to_owned()]);
    assert!(approve.approvals().is_empty());

    let events = harness.telemetry.events();
    assert_eq!(events[0].0, "vault_without_purchase_error");
    assert!(events[0].1.contains(&("vaultToken", "vst-1".to_owned())));
    assert_eq!(errors.errors().len(), 1);
}

#[tokio::test]
async fn vault_approval_failure_tracks_minted_token() {
    let harness = harness(StubApi::default());
    let approve = ApproveRecorder::rejecting();
    let config = vault_config(TokenFactory::minting(), Arc::clone(&approve), None);

    let error = harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap_err();

    assert!(matches!(error, SubmitError::ApprovalCallback { .. }));

    let events = harness.telemetry.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].0, "vault_without_purchase_error");
    assert!(events[0].1.contains(&("vaultToken", "vst-1".to_owned())));
}

#[tokio::test]
async fn each_submission_resets_validation_errors_before_branching() {
    let harness = harness(StubApi::default());
    harness.validation_errors.record(["security_code".to_owned()]);

    let config =
        checkout_config(OrderFactory::resolving(json!("ord-1")), ApproveRecorder::accepting(), None);

    harness.submitter.submit_card_fields(&snapshot(), &config).await.unwrap();

    assert!(harness.validation_errors.snapshot().is_empty());
}
