use config::{Config as Cfg, File};
use docspace_core::config as core_config;
use docspace_core::error::AppError;
use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    /// Base URL of the hosted identity/data provider.
    pub url: String,
    /// Anonymous API key sent with every provider request.
    pub api_key: SecretString,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            api_key: SecretString::new("anon".to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Cache keys starting with this prefix are the unit of cleanup on
    /// sign-out or detected invalidation.
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    /// Logging deadline for the background profile-ensure task. Does not
    /// gate the authenticated transition.
    #[serde(default = "default_profile_ensure_timeout_ms")]
    pub profile_ensure_timeout_ms: u64,
    /// Delay before the route guard re-checks an unauthenticated redirect.
    #[serde(default = "default_guard_recheck_delay_ms")]
    pub guard_recheck_delay_ms: u64,
    /// Role assigned to freshly created profiles when the identity
    /// metadata carries none.
    #[serde(default = "default_role")]
    pub default_role: String,
}

fn default_key_prefix() -> String {
    "docspace-session-".to_string()
}

fn default_profile_ensure_timeout_ms() -> u64 {
    3_000
}

fn default_guard_recheck_delay_ms() -> u64 {
    50
}

fn default_role() -> String {
    "member".to_string()
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            profile_ensure_timeout_ms: default_profile_ensure_timeout_ms(),
            guard_recheck_delay_ms: default_guard_recheck_delay_ms(),
            default_role: default_role(),
        }
    }
}

impl SessionSettings {
    pub fn profile_ensure_timeout(&self) -> Duration {
        Duration::from_millis(self.profile_ensure_timeout_ms)
    }

    pub fn guard_recheck_delay(&self) -> Duration {
        Duration::from_millis(self.guard_recheck_delay_ms)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            common: core_config::Config::default(),
            provider: ProviderSettings::default(),
            session: SessionSettings::default(),
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
