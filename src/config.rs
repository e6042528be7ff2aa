//! Acquirer configuration loading.
//!
//! Settings come from a JSON file listing one entry per acquirer. Credentials
//! can be kept out of that file: `<NAME>_LOGIN`, `<NAME>_SECRET_KEY` and
//! `<NAME>_WEBHOOK_SECRET` environment variables (a `.env` file is honoured)
//! override the corresponding fields, e.g. `AUTHORIZE_SECRET_KEY`.

use crate::domain::acquirer::AcquirerConfig;
use crate::error::{ReconcileError, Result};
use crate::infrastructure::in_memory::StaticConfigProvider;
use serde::Deserialize;
use std::collections::HashSet;
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub acquirers: Vec<AcquirerConfig>,
}

impl Settings {
    /// Reads the settings file, then applies environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        dotenvy::dotenv().ok();

        let raw = std::fs::read_to_string(path.as_ref())?;
        let mut settings = Self::from_json(&raw)?;
        settings.apply_overrides(|key| env::var(key).ok());
        Ok(settings)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Replaces credentials with values returned by `lookup`, when present.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for acquirer in &mut self.acquirers {
            let prefix = acquirer.name.to_ascii_uppercase().replace('-', "_");
            if let Some(login) = lookup(&format!("{}_LOGIN", prefix)) {
                acquirer.login = login;
            }
            if let Some(secret) = lookup(&format!("{}_SECRET_KEY", prefix)) {
                acquirer.secret_key = secret;
            }
            if let Some(secret) = lookup(&format!("{}_WEBHOOK_SECRET", prefix)) {
                acquirer.webhook_secret = Some(secret);
            }
        }
    }

    pub fn into_provider(self) -> StaticConfigProvider {
        StaticConfigProvider::new(self.acquirers)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for acquirer in &self.acquirers {
            if acquirer.name.trim().is_empty() {
                return Err(ReconcileError::Config("acquirer name must not be empty".into()));
            }
            if !seen.insert(acquirer.name.as_str()) {
                return Err(ReconcileError::Config(format!(
                    "acquirer '{}' configured twice",
                    acquirer.name
                )));
            }
        }
        Ok(())
    }
}
