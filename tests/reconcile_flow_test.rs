use acquirer_feedback::acquirers::{authorize, stripe};
use acquirer_feedback::application::reconciler::FeedbackReconciler;
use acquirer_feedback::domain::acquirer::{AcquirerConfig, Environment};
use acquirer_feedback::domain::amount::Amount;
use acquirer_feedback::domain::notification::{Notification, Outcome};
use acquirer_feedback::domain::ports::TransactionStore;
use acquirer_feedback::domain::transaction::{Transaction, TransactionState};
use acquirer_feedback::error::ReconcileError;
use acquirer_feedback::infrastructure::in_memory::{InMemoryTransactionStore, StaticConfigProvider};
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;

const WEBHOOK_SECRET: &str = "whsec_flow";

fn relay_response(reference: &str, code: &str) -> Notification {
    let hash = authorize::fingerprint("api_login", "11445529", "1446529775", "320.00", "trans_key")
        .unwrap();
    Notification::from_form([
        ("x_invoice_num", reference.to_string()),
        ("x_trans_id", "2217460311".to_string()),
        ("x_response_code", code.to_string()),
        ("x_amount", "320.00".to_string()),
        ("x_fp_sequence", "11445529".to_string()),
        ("x_fp_timestamp", "1446529775".to_string()),
        ("x_fp_hash", hash),
    ])
}

async fn setup(stripe_config: AcquirerConfig) -> (InMemoryTransactionStore, FeedbackReconciler) {
    let store = InMemoryTransactionStore::new();
    store
        .insert(Transaction::new(
            "SO004",
            "authorize",
            Amount::new(dec!(320.0)).unwrap(),
            "USD",
        ))
        .await
        .unwrap();
    store
        .insert(Transaction::new(
            "SO100",
            "stripe",
            Amount::new(dec!(4700)).unwrap(),
            "EUR",
        ))
        .await
        .unwrap();

    let configs = StaticConfigProvider::new([
        AcquirerConfig::new("authorize", "api_login", "trans_key"),
        stripe_config,
    ]);
    let reconciler = FeedbackReconciler::new(Box::new(store.clone()), Box::new(configs));
    (store, reconciler)
}

#[tokio::test]
async fn test_concurrent_duplicate_deliveries_apply_once() {
    let (store, reconciler) = setup(AcquirerConfig::new("stripe", "", "sk_test")).await;
    let reconciler = Arc::new(reconciler);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let reconciler = Arc::clone(&reconciler);
        handles.push(tokio::spawn(async move {
            reconciler
                .reconcile("authorize", &relay_response("SO004", "1"))
                .await
                .unwrap()
        }));
    }

    let mut applied = 0;
    for handle in handles {
        let result = handle.await.unwrap();
        assert_eq!(result.state, TransactionState::Done);
        if result.applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);

    let tx = store.find_by_reference("SO004").await.unwrap().unwrap();
    assert_eq!(tx.acquirer_reference.as_deref(), Some("2217460311"));
}

#[tokio::test]
async fn test_signed_stripe_delivery_in_production() {
    let config = AcquirerConfig::new("stripe", "", "sk_live")
        .with_environment(Environment::Production)
        .with_webhook_secret(WEBHOOK_SECRET);
    let (store, reconciler) = setup(config).await;

    let body = serde_json::to_vec(&json!({
        "id": "ch_172xfnGMfVJxozLwEjSfpfxD",
        "metadata": {"reference": "SO100"},
        "status": "succeeded",
    }))
    .unwrap();

    let unsigned = Notification::from_json_body(&body).unwrap();
    let err = reconciler.reconcile("stripe", &unsigned).await.unwrap_err();
    assert!(matches!(err, ReconcileError::Authenticity(_)));
    assert!(err.is_retryable_by_gateway());
    let untouched = store.find_by_reference("SO100").await.unwrap().unwrap();
    assert_eq!(untouched.state, TransactionState::Draft);

    let header =
        stripe::signature_header(WEBHOOK_SECRET, chrono::Utc::now().timestamp(), &body).unwrap();
    let signed = Notification::from_json_body(&body)
        .unwrap()
        .with_signature(header);
    let result = reconciler.reconcile("stripe", &signed).await.unwrap();

    assert_eq!(result.outcome, Outcome::Approved);
    assert_eq!(result.state, TransactionState::Done);
    assert_eq!(
        result.acquirer_reference.as_deref(),
        Some("ch_172xfnGMfVJxozLwEjSfpfxD")
    );
}

#[tokio::test]
async fn test_unsigned_stripe_rejected_in_production() {
    let config =
        AcquirerConfig::new("stripe", "", "sk_live").with_environment(Environment::Production);
    let (store, reconciler) = setup(config).await;

    let notification = Notification::from_fields(
        json!({"id": "ch_1", "metadata": {"reference": "SO100"}, "status": "succeeded"})
            .as_object()
            .unwrap()
            .clone(),
    );
    assert!(matches!(
        reconciler.reconcile("stripe", &notification).await,
        Err(ReconcileError::Authenticity(_))
    ));
    let tx = store.find_by_reference("SO100").await.unwrap().unwrap();
    assert_eq!(tx.state, TransactionState::Draft);
}

#[tokio::test]
async fn test_declined_is_acknowledged_not_raised() {
    let (store, reconciler) = setup(AcquirerConfig::new("stripe", "", "sk_test")).await;

    let result = reconciler
        .reconcile("authorize", &relay_response("SO004", "2"))
        .await
        .unwrap();
    assert_eq!(result.outcome, Outcome::Declined);
    assert_eq!(result.state, TransactionState::Error);

    let tx = store.find_by_reference("SO004").await.unwrap().unwrap();
    assert!(tx.acquirer_reference.is_none());
    assert!(tx.date_validate.is_none());
}
