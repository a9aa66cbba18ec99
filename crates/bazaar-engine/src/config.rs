//! # Engine Configuration
//!
//! Where the rules come from, how unmatched weights are priced, and where the
//! cart is kept.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BAZAAR_SERVICE_URL=https://api.bazaar.example                      │
//! │     BAZAAR_UNMATCHED_WEIGHT=reject                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $BAZAAR_CONFIG, or                                                 │
//! │     ~/.config/storefront/engine.toml (Linux)                           │
//! │     ~/Library/Application Support/com.bazaar.storefront/engine.toml    │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8080/api, 10 s timeout, free unmatched delivery   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [service]
//! base_url = "https://api.bazaar.example/v1"
//! delivery_path = "/delivery-charges"
//! tax_path = "/tax-settings"
//! timeout_secs = 10
//!
//! [pricing]
//! unmatched_weight = "free"  # free | reject
//!
//! [cart]
//! storage_key = "cart"
//! storage_dir = "/var/lib/bazaar/cart"  # optional
//! ```

use std::path::PathBuf;

use bazaar_core::UnmatchedWeightPolicy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{EngineError, EngineResult};
use crate::store::DEFAULT_STORAGE_KEY;

// =============================================================================
// Service Settings
// =============================================================================

/// The remote configuration service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Base URL the paths below are appended to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_delivery_path")]
    pub delivery_path: String,

    #[serde(default = "default_tax_path")]
    pub tax_path: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_delivery_path() -> String {
    "/delivery-charges".to_string()
}

fn default_tax_path() -> String {
    "/tax-settings".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            base_url: default_base_url(),
            delivery_path: default_delivery_path(),
            tax_path: default_tax_path(),
            timeout_secs: default_timeout(),
        }
    }
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Pricing behaviour not carried by the remote rules.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// What to charge when no delivery tier covers the cart weight.
    #[serde(default)]
    pub unmatched_weight: UnmatchedWeightPolicy,
}

// =============================================================================
// Cart Settings
// =============================================================================

/// Cart persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSettings {
    /// Key the cart is saved under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Directory for the file store. Platform data dir when unset.
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for CartSettings {
    fn default() -> Self {
        CartSettings {
            storage_key: default_storage_key(),
            storage_dir: None,
        }
    }
}

// =============================================================================
// Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub service: ServiceSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub cart: CartSettings,
}

impl EngineConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$BAZAAR_CONFIG`, or the platform path)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        let path = config_path
            .or_else(|| std::env::var_os("BAZAAR_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);
        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| EngineError::ConfigLoadFailed(format!("{}: {e}", path.display())))?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        let url = Url::parse(&self.service.base_url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(EngineError::InvalidUrl(format!(
                "Service URL must be http:// or https://, got: {}",
                self.service.base_url
            )));
        }

        if self.service.timeout_secs == 0 {
            return Err(EngineError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.cart.storage_key.trim().is_empty() {
            return Err(EngineError::InvalidConfig("storage_key must not be empty".into()));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("BAZAAR_SERVICE_URL") {
            debug!(url = %url, "Overriding service URL from environment");
            self.service.base_url = url;
        }

        if let Ok(secs) = std::env::var("BAZAAR_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(s) => self.service.timeout_secs = s,
                Err(_) => warn!(value = %secs, "Ignoring non-numeric BAZAAR_TIMEOUT_SECS"),
            }
        }

        if let Ok(policy) = std::env::var("BAZAAR_UNMATCHED_WEIGHT") {
            match policy.parse::<UnmatchedWeightPolicy>() {
                Ok(parsed) => {
                    debug!(policy = %policy, "Overriding unmatched weight policy from environment");
                    self.pricing.unmatched_weight = parsed;
                }
                Err(_) => warn!(policy = %policy, "Unknown unmatched weight policy in environment"),
            }
        }

        if let Ok(key) = std::env::var("BAZAAR_CART_KEY") {
            self.cart.storage_key = key;
        }

        if let Some(dir) = std::env::var_os("BAZAAR_CART_DIR") {
            self.cart.storage_dir = Some(PathBuf::from(dir));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "bazaar", "storefront")
            .map(|dirs| dirs.config_dir().join("engine.toml"))
    }

    /// The unmatched weight policy.
    pub fn unmatched_weight(&self) -> UnmatchedWeightPolicy {
        self.pricing.unmatched_weight
    }
}
