//! Configuration loading.
//!
//! Everything is read from environment variables through a lookup function, so
//! tests can feed a map instead of mutating the process environment.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration as StdDuration;

use thiserror::Error;

use ledgersync_core::CompanyId;
use ledgersync_tax::{CompanyType, TaxProfile};

pub const ENV_FORECAST_TTL_HOURS: &str = "LEDGERSYNC_FORECAST_TTL_HOURS";
pub const ENV_FORECAST_INTERVAL_SECS: &str = "LEDGERSYNC_FORECAST_INTERVAL_SECS";
pub const ENV_VAT_RATE: &str = "LEDGERSYNC_VAT_RATE";
pub const ENV_TRADE_TAX_MULTIPLIER: &str = "LEDGERSYNC_TRADE_TAX_MULTIPLIER";
pub const ENV_CORP_TAX_RATE: &str = "LEDGERSYNC_CORP_TAX_RATE";
pub const ENV_SOLIDARITY_RATE: &str = "LEDGERSYNC_SOLIDARITY_RATE";
pub const ENV_PAYROLL_BASE_RATE: &str = "LEDGERSYNC_PAYROLL_BASE_RATE";
pub const ENV_COMPANY_TYPE: &str = "LEDGERSYNC_COMPANY_TYPE";
pub const ENV_SMALL_BUSINESS: &str = "LEDGERSYNC_SMALL_BUSINESS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration value {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("no tax profile configured for company {0}")]
    MissingProfile(CompanyId),
}

/// Engine-level knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// How long a stored forecast may be reused instead of recomputed.
    pub forecast_ttl: chrono::Duration,
    /// Period of the background forecast worker.
    pub forecast_interval: StdDuration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            forecast_ttl: chrono::Duration::hours(24),
            forecast_interval: StdDuration::from_secs(3_600),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset keys fall back to the defaults; malformed ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let forecast_ttl = match lookup(ENV_FORECAST_TTL_HOURS) {
            Some(raw) => chrono::Duration::hours(parse_number::<i64>(ENV_FORECAST_TTL_HOURS, &raw)?),
            None => defaults.forecast_ttl,
        };
        let forecast_interval = match lookup(ENV_FORECAST_INTERVAL_SECS) {
            Some(raw) => StdDuration::from_secs(parse_number::<u64>(ENV_FORECAST_INTERVAL_SECS, &raw)?),
            None => defaults.forecast_interval,
        };
        Ok(Self {
            forecast_ttl,
            forecast_interval,
        })
    }
}

/// Read a tax profile from the environment.
pub fn tax_profile_from_env() -> Result<TaxProfile, ConfigError> {
    tax_profile_from_lookup(|key| std::env::var(key).ok())
}

/// Every rate is required; a forecast without rates is meaningless.
pub fn tax_profile_from_lookup(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<TaxProfile, ConfigError> {
    let rate = |key: &'static str| -> Result<f64, ConfigError> {
        let raw = lookup(key).ok_or(ConfigError::Missing(key))?;
        parse_number::<f64>(key, &raw)
    };

    let company_type = match lookup(ENV_COMPANY_TYPE) {
        Some(raw) => raw.parse::<CompanyType>().map_err(|e| ConfigError::Invalid {
            key: ENV_COMPANY_TYPE,
            value: raw.clone(),
            reason: e.to_string(),
        })?,
        None => return Err(ConfigError::Missing(ENV_COMPANY_TYPE)),
    };

    let small_business = match lookup(ENV_SMALL_BUSINESS) {
        Some(raw) => parse_bool(ENV_SMALL_BUSINESS, &raw)?,
        None => false,
    };

    let profile = TaxProfile {
        company_type,
        small_business,
        vat_rate: rate(ENV_VAT_RATE)?,
        trade_tax_multiplier: rate(ENV_TRADE_TAX_MULTIPLIER)?,
        corp_tax_rate: rate(ENV_CORP_TAX_RATE)?,
        solidarity_rate: rate(ENV_SOLIDARITY_RATE)?,
        payroll_base_rate: rate(ENV_PAYROLL_BASE_RATE)?,
    };
    profile.validate().map_err(|e| ConfigError::Invalid {
        key: "tax profile",
        value: format!("{profile:?}"),
        reason: e.to_string(),
    })?;
    Ok(profile)
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

/// Where the tax forecast gets each company's rates.
pub trait TaxProfileSource: Send + Sync {
    fn profile(&self, company: CompanyId) -> Result<TaxProfile, ConfigError>;
}

/// Per-company profiles with an optional shared fallback.
#[derive(Debug, Default)]
pub struct StaticTaxProfiles {
    fallback: Option<TaxProfile>,
    per_company: RwLock<HashMap<CompanyId, TaxProfile>>,
}

impl StaticTaxProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fallback(profile: TaxProfile) -> Self {
        Self {
            fallback: Some(profile),
            per_company: RwLock::new(HashMap::new()),
        }
    }

    /// Fallback profile loaded from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::with_fallback(tax_profile_from_env()?))
    }

    pub fn set(&self, company: CompanyId, profile: TaxProfile) {
        self.per_company
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(company, profile);
    }
}

impl TaxProfileSource for StaticTaxProfiles {
    fn profile(&self, company: CompanyId) -> Result<TaxProfile, ConfigError> {
        let specific = self
            .per_company
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&company)
            .cloned();
        specific
            .or_else(|| self.fallback.clone())
            .ok_or(ConfigError::MissingProfile(company))
    }
}
