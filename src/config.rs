use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::currency::{CurrencyCode, CurrencyInfo, CurrencyRegistry};
use crate::error::BankError;
use crate::rates::RateTable;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    #[serde(default)]
    pub bank: BankConfig,
}

/// Money-movement bootstrap data
#[derive(Debug, Default, Serialize, Deserialize, Clone)]
pub struct BankConfig {
    /// Registered currencies
    #[serde(default)]
    pub currencies: Vec<CurrencySpec>,
    /// Seed quotes fed into the rate table at startup
    #[serde(default)]
    pub rates: Vec<RateSpec>,
    /// Pivot currency for two-leg conversion paths
    #[serde(default)]
    pub pivot: Option<String>,
    /// Refuse quotes older than this many milliseconds
    #[serde(default)]
    pub max_quote_age_ms: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CurrencySpec {
    pub code: String,
    pub name: String,
    pub minor_units: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RateSpec {
    pub from: String,
    pub to: String,
    /// Quoted as a string in YAML so the decimal parses exactly
    pub rate: Decimal,
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}

impl BankConfig {
    /// Build the currency registry from the configured currencies
    pub fn build_registry(&self) -> Result<CurrencyRegistry, BankError> {
        let mut registry = CurrencyRegistry::new();
        for spec in &self.currencies {
            let code = CurrencyCode::new(&spec.code)?;
            registry.register(CurrencyInfo::new(code, &spec.name, spec.minor_units));
        }
        Ok(registry)
    }

    /// Build the rate table and feed it the seed quotes
    pub fn build_rate_table(&self, registry: Arc<CurrencyRegistry>) -> Result<RateTable, BankError> {
        let mut table = RateTable::new(registry);
        if let Some(pivot) = &self.pivot {
            table = table.with_pivot(CurrencyCode::new(pivot)?);
        }
        if let Some(max_age) = self.max_quote_age_ms {
            table = table.with_max_quote_age(max_age);
        }
        for spec in &self.rates {
            table.apply_quote(
                CurrencyCode::new(&spec.from)?,
                CurrencyCode::new(&spec.to)?,
                spec.rate,
            )?;
        }
        Ok(table)
    }
}
