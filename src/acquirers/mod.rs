//! Per-gateway notification rules and the registry that selects them.

pub mod authorize;
pub mod stripe;

use crate::domain::ports::{AcquirerRules, AcquirerRulesBox};
use crate::error::{ReconcileError, Result};
use std::collections::HashMap;

/// Rule sets keyed by gateway name.
#[derive(Default)]
pub struct AcquirerRegistry {
    rules: HashMap<&'static str, AcquirerRulesBox>,
}

impl AcquirerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every acquirer this crate ships.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(authorize::AuthorizeRules));
        registry.register(Box::new(stripe::StripeRules));
        registry
    }

    pub fn register(&mut self, rules: AcquirerRulesBox) {
        self.rules.insert(rules.name(), rules);
    }

    pub fn get(&self, gateway: &str) -> Result<&dyn AcquirerRules> {
        self.rules
            .get(gateway)
            .map(|rules| rules.as_ref())
            .ok_or_else(|| ReconcileError::UnknownGateway(gateway.to_string()))
    }
}
