use serde::{Deserialize, Serialize};

/// Whether the acquirer account points at the gateway sandbox or the live system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Test,
    Production,
}

/// What a successful authorization turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoConfirm {
    /// Finalize immediately: approved payments go straight to `done`.
    #[default]
    ConfirmSo,
    /// Hold the funds: approved payments stop at `authorized` until captured.
    Authorize,
}

/// Static per-gateway configuration, handed to the reconciler on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquirerConfig {
    /// Gateway identifier, e.g. `authorize` or `stripe`.
    pub name: String,
    /// API login id.
    #[serde(default)]
    pub login: String,
    /// Shared secret: the Authorize.Net transaction key or the Stripe secret key.
    pub secret_key: String,
    /// Signing secret for webhook deliveries, when the gateway provides one.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub auto_confirm: AutoConfirm,
}

impl AcquirerConfig {
    pub fn new(name: impl Into<String>, login: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            login: login.into(),
            secret_key: secret_key.into(),
            webhook_secret: None,
            environment: Environment::Test,
            auto_confirm: AutoConfirm::ConfirmSo,
        }
    }

    pub fn with_auto_confirm(mut self, auto_confirm: AutoConfirm) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook_secret = Some(secret.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_json() {
        let json = r#"{"name": "authorize", "login": "api_login", "secret_key": "key"}"#;
        let config: AcquirerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.environment, Environment::Test);
        assert_eq!(config.auto_confirm, AutoConfirm::ConfirmSo);
        assert!(config.webhook_secret.is_none());
    }

    #[test]
    fn test_auto_confirm_wire_names() {
        let config: AcquirerConfig = serde_json::from_str(
            r#"{"name": "authorize", "secret_key": "k", "auto_confirm": "authorize", "environment": "production"}"#,
        )
        .unwrap();

        assert_eq!(config.auto_confirm, AutoConfirm::Authorize);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(
            serde_json::to_string(&AutoConfirm::ConfirmSo).unwrap(),
            "\"confirm_so\""
        );
    }
}
