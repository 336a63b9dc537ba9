//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;

/// Which registry backend the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageProfile {
    /// Everything lives in process memory and is lost on restart.
    #[default]
    Memory,
    Postgres,
}

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `STORAGE_PROFILE` (optional): `memory` or `postgres`, defaults to `memory`
/// - `DATABASE_URL` (required for `postgres`): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DEFAULT_OVERDRAFT_LIMIT_CENTS` (optional): overdraft for new checking accounts, defaults to 0
/// - `SAVINGS_MINIMUM_BALANCE_CENTS` (optional): floor for new savings accounts, defaults to 10000
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage_profile: StorageProfile,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default)]
    pub default_overdraft_limit_cents: i64,

    #[serde(default = "default_savings_minimum")]
    pub savings_minimum_balance_cents: i64,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_savings_minimum() -> i64 {
    10_000
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envy::Error),

    #[error("DATABASE_URL is required when STORAGE_PROFILE is postgres")]
    MissingDatabaseUrl,

    #[error("{0} must not be negative")]
    NegativePolicy(&'static str),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Environment variable values cannot be parsed into expected types
    /// - The postgres profile is selected without a `DATABASE_URL`
    /// - A policy default is negative
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        envy::from_env::<Config>()?.validated()
    }

    /// Same as [`Config::from_env`] but from explicit pairs.
    pub fn from_pairs<I>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Config>(pairs)?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.storage_profile == StorageProfile::Postgres && self.database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }
        if self.default_overdraft_limit_cents < 0 {
            return Err(ConfigError::NegativePolicy("DEFAULT_OVERDRAFT_LIMIT_CENTS"));
        }
        if self.savings_minimum_balance_cents < 0 {
            return Err(ConfigError::NegativePolicy("SAVINGS_MINIMUM_BALANCE_CENTS"));
        }
        Ok(self)
    }

    pub fn account_defaults(&self) -> AccountDefaults {
        AccountDefaults {
            overdraft_limit_cents: self.default_overdraft_limit_cents,
            savings_minimum_balance_cents: self.savings_minimum_balance_cents,
        }
    }
}

/// Policy parameters applied to new accounts when the request omits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountDefaults {
    pub overdraft_limit_cents: i64,
    pub savings_minimum_balance_cents: i64,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            overdraft_limit_cents: 0,
            savings_minimum_balance_cents: default_savings_minimum(),
        }
    }
}
