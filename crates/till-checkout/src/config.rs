//! # Checkout Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TILL_TAX_RATE=0.0825                                               │
//! │     TILL_ROUNDING_MODE=nearest_5                                       │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/till-pos/checkout.toml (Linux)                           │
//! │     ~/Library/Application Support/com.till.pos/checkout.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     no tax, no rounding, 30 s settlement timeout                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # checkout.toml
//! [organization]
//! name = "Salon Aurora"
//! currency_code = "USD"
//! currency_symbol = "$"
//!
//! [pricing]
//! tax_rate = "0.0825"
//! rounding_mode = "nearest_5"
//!
//! [settlement]
//! timeout_secs = 30
//! allow_non_cash_overpayment = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use till_core::{Money, RoundingMode, TaxRate};
use tracing::{debug, info, warn};

use crate::error::{CheckoutError, CheckoutResult};

// =============================================================================
// Organization
// =============================================================================

/// Organization reference data printed on receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationConfig {
    #[serde(default = "default_org_name")]
    pub name: String,

    /// ISO 4217 code.
    #[serde(default = "default_currency_code")]
    pub currency_code: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_org_name() -> String {
    "Till POS".to_string()
}

fn default_currency_code() -> String {
    "USD".to_string()
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

impl Default for OrganizationConfig {
    fn default() -> Self {
        OrganizationConfig {
            name: default_org_name(),
            currency_code: default_currency_code(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Pricing
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Tax rate as a fraction (`"0.0825"` is 8.25%).
    #[serde(default)]
    pub tax_rate: TaxRate,

    /// Rounding applied to the grand total.
    #[serde(default)]
    pub rounding_mode: RoundingMode,
}

// =============================================================================
// Settlement
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// How long to wait for the transaction collaborator.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Allow change larger than the cash tendered (card/voucher overpayment).
    #[serde(default)]
    pub allow_non_cash_overpayment: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SettlementConfig {
    fn default() -> Self {
        SettlementConfig {
            timeout_secs: default_timeout_secs(),
            allow_non_cash_overpayment: false,
        }
    }
}

impl SettlementConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

// =============================================================================
// Checkout Configuration
// =============================================================================

/// Complete checkout configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub organization: OrganizationConfig,

    #[serde(default)]
    pub pricing: PricingConfig,

    #[serde(default)]
    pub settlement: SettlementConfig,
}

impl CheckoutConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (checkout.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CheckoutResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading checkout config from file");
                let contents = std::fs::read_to_string(&path)?;
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
            warn!("Failed to load checkout config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CheckoutResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CheckoutError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CheckoutError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| CheckoutError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Checkout config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CheckoutResult<()> {
        if self.organization.name.trim().is_empty() {
            return Err(CheckoutError::InvalidConfig(
                "organization.name must not be empty".into(),
            ));
        }

        let code = &self.organization.currency_code;
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CheckoutError::InvalidConfig(format!(
                "currency_code must be a 3-letter ISO code, got: '{}'",
                code
            )));
        }

        TaxRate::from_fraction(self.pricing.tax_rate.fraction())
            .map_err(|e| CheckoutError::InvalidConfig(e.to_string()))?;

        if self.settlement.timeout_secs == 0 {
            return Err(CheckoutError::InvalidConfig(
                "settlement.timeout_secs must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(rate) = std::env::var("TILL_TAX_RATE") {
            match rate.parse::<TaxRate>() {
                Ok(parsed) => {
                    debug!(tax_rate = %rate, "Overriding tax rate from environment");
                    self.pricing.tax_rate = parsed;
                }
                Err(e) => warn!(tax_rate = %rate, error = %e, "Ignoring invalid TILL_TAX_RATE"),
            }
        }

        if let Ok(mode) = std::env::var("TILL_ROUNDING_MODE") {
            match mode.parse::<RoundingMode>() {
                Ok(parsed) => {
                    debug!(mode = %parsed, "Overriding rounding mode from environment");
                    self.pricing.rounding_mode = parsed;
                }
                Err(e) => warn!(mode = %mode, error = %e, "Ignoring invalid TILL_ROUNDING_MODE"),
            }
        }

        if let Ok(name) = std::env::var("TILL_ORG_NAME") {
            self.organization.name = name;
        }

        if let Ok(code) = std::env::var("TILL_CURRENCY") {
            self.organization.currency_code = code.to_uppercase();
        }

        if let Ok(secs) = std::env::var("TILL_SETTLEMENT_TIMEOUT_SECS") {
            if let Ok(s) = secs.parse::<u64>() {
                debug!(timeout_secs = s, "Overriding settlement timeout from environment");
                self.settlement.timeout_secs = s;
            }
        }

        if let Ok(flag) = std::env::var("TILL_ALLOW_NON_CASH_OVERPAYMENT") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.settlement.allow_non_cash_overpayment = true,
                "0" | "false" | "no" => self.settlement.allow_non_cash_overpayment = false,
                _ => warn!(value = %flag, "Unknown TILL_ALLOW_NON_CASH_OVERPAYMENT value"),
            }
        }
    }

    /// Per-user config file used when no path is given:
    /// `<config dir>/checkout.toml`. `None` when the platform has no home
    /// directory.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "till", "pos")
            .map(|dirs| dirs.config_dir().join("checkout.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn tax_rate(&self) -> TaxRate {
        self.pricing.tax_rate
    }

    pub fn rounding_mode(&self) -> RoundingMode {
        self.pricing.rounding_mode
    }

    /// Formats an amount for display with the organization's symbol.
    ///
    /// ## Example
    /// ```rust
    /// use till_checkout::CheckoutConfig;
    /// use till_core::Money;
    ///
    /// let config = CheckoutConfig::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
    /// assert_eq!(config.format_currency(Money::from_cents(-50)), "-$0.50");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        format!(
            "{}{}{}",
            if amount.round_for_display().is_negative() { "-" } else { "" },
            self.organization.currency_symbol,
            amount.abs()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_default_config() {
        let config = CheckoutConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.tax_rate().is_zero());
        assert_eq!(config.rounding_mode(), RoundingMode::None);
        assert_eq!(config.settlement.timeout(), Duration::from_secs(30));
        assert!(!config.settlement.allow_non_cash_overpayment);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [organization]
            name = "Salon Aurora"
            currency_code = "EUR"
            currency_symbol = "€"

            [pricing]
            tax_rate = "0.0825"
            rounding_mode = "nearest_5"

            [settlement]
            timeout_secs = 10
        "#;
        let config: CheckoutConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.organization.name, "Salon Aurora");
        assert_eq!(config.tax_rate().fraction(), Decimal::new(825, 4));
        assert_eq!(config.rounding_mode(), RoundingMode::Nearest5);
        assert_eq!(config.settlement.timeout_secs, 10);
        assert!(!config.settlement.allow_non_cash_overpayment);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: CheckoutConfig = toml::from_str("[pricing]\nrounding_mode = \"nearest_10\"\n").unwrap();
        assert_eq!(config.rounding_mode(), RoundingMode::Nearest10);
        assert_eq!(config.organization.currency_code, "USD");
        assert_eq!(config.settlement.timeout_secs, 30);
    }

    #[test]
    fn test_config_validation() {
        let mut config = CheckoutConfig::default();

        config.organization.currency_code = "dollars".to_string();
        assert!(config.validate().is_err());

        config.organization.currency_code = "GBP".to_string();
        config.settlement.timeout_secs = 0;
        assert!(config.validate().is_err());

        config.settlement.timeout_secs = 5;
        config.organization.name = " ".to_string();
        assert!(config.validate().is_err());

        let out_of_range: CheckoutConfig = toml::from_str("[pricing]\ntax_rate = \"1.5\"\n").unwrap();
        assert!(out_of_range.validate().is_err());
    }

    #[test]
    fn test_default_config_path() {
        // CI containers may have no home directory
        if let Some(path) = CheckoutConfig::default_config_path() {
            assert!(path.ends_with("checkout.toml"));
        }
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("till-checkout-does-not-exist.toml");
        let config = CheckoutConfig::load_or_default(Some(path));
        assert_eq!(config.organization.name, "Till POS");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = std::env::temp_dir().join(format!("till-checkout-{}.toml", uuid::Uuid::new_v4()));
        let mut config = CheckoutConfig::default();
        config.organization.name = "Front Desk".to_string();
        config.pricing.rounding_mode = RoundingMode::Nearest5;
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[organization]"));
        let loaded: CheckoutConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded.organization.name, "Front Desk");
        assert_eq!(loaded.rounding_mode(), RoundingMode::Nearest5);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn test_format_currency() {
        let config = CheckoutConfig::default();
        assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
        assert_eq!(config.format_currency(Money::zero()), "$0.00");
        assert_eq!(config.format_currency(Money::from_cents(-1234)), "-$12.34");
        assert_eq!(
            config.format_currency(Money::parse("123.456").unwrap()),
            "$123.46"
        );
    }
}
