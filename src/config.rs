use config::{Case, Config, ConfigError, Environment, File};
use parking_lot::RwLock;
use serde::Deserialize;
use tokio::sync::watch;

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// OpenWeatherMap API key, when already known at startup. The host's
    /// settings flow can also push one later through the credential store.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the OpenWeatherMap API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Temperature units: metric or imperial
    #[serde(default = "default_units")]
    pub units: String,

    /// Request language override; auto-detected from the runtime locale
    /// when unset
    #[serde(default)]
    pub language: Option<String>,

    /// Number of forecast days to request
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
}

fn default_api_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_forecast_days() -> u32 {
    5
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: default_api_base_url(),
            units: default_units(),
            language: None,
            forecast_days: default_forecast_days(),
        }
    }
}

impl ProviderConfig {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let config = Config::builder()
            .set_default("api_base_url", default_api_base_url())?
            .set_default("units", default_units())?
            .set_default("forecast_days", default_forecast_days())?
            // Load from config file if present
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config.local").required(false))
            // Override with environment variables (prefixed with OWMPROVIDER_)
            .add_source(
                Environment::with_prefix("OWMPROVIDER")
                    .prefix_separator("_")
                    .separator("__")
                    .convert_case(Case::Snake)
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Whether the configured API key is unverified, known-invalid, or
/// confirmed working based on the most recent call outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    Invalid,
    PendingVerification,
    Verified,
}

#[derive(Debug)]
struct CredentialState {
    api_key: Option<String>,
    verification: VerificationState,
}

/// Holds the provider credential and its verification flag. User edits land
/// here (flipping the state back to pending) and are pushed to subscribers;
/// the dispatcher records verification outcomes after each provider call.
#[derive(Debug)]
pub struct CredentialStore {
    inner: RwLock<CredentialState>,
    tx: watch::Sender<Option<String>>,
}

impl CredentialStore {
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = normalize_key(api_key);
        let verification = if api_key.is_some() {
            VerificationState::PendingVerification
        } else {
            VerificationState::Invalid
        };
        let (tx, _) = watch::channel(api_key.clone());
        Self {
            inner: RwLock::new(CredentialState {
                api_key,
                verification,
            }),
            tx,
        }
    }

    pub fn api_key(&self) -> Option<String> {
        self.inner.read().api_key.clone()
    }

    /// Replace the credential. Always resets the verification flag: a fresh
    /// key is unproven until a provider call succeeds with it.
    pub fn set_api_key(&self, api_key: Option<String>) {
        let api_key = normalize_key(api_key);
        {
            let mut state = self.inner.write();
            state.verification = if api_key.is_some() {
                VerificationState::PendingVerification
            } else {
                VerificationState::Invalid
            };
            state.api_key = api_key.clone();
        }
        tracing::debug!(configured = api_key.is_some(), "API key has changed");
        let _ = self.tx.send(api_key);
    }

    pub fn verification_state(&self) -> VerificationState {
        self.inner.read().verification
    }

    pub fn set_verification_state(&self, verification: VerificationState) {
        self.inner.write().verification = verification;
    }

    /// Subscribe to credential changes. The receiver yields the latest key
    /// whenever the settings flow replaces it.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }
}

/// Blank keys are no keys.
fn normalize_key(api_key: Option<String>) -> Option<String> {
    api_key.filter(|key| !key.trim().is_empty())
}
