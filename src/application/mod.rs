//! Application layer orchestrating notification reconciliation.
//!
//! `FeedbackReconciler` is the single entry point: it owns the transaction
//! store, the acquirer configuration provider and the rule registry, and
//! drives the transaction state machine from gateway feedback.

pub mod reconciler;
