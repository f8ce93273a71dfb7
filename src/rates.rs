//! Exchange rate table
//!
//! Holds the current rate per currency pair, quoted by an external feed
//! through [`RateTable::apply_quote`]. Consumers never cache rates: the
//! workflow re-resolves at the moment it needs one, so a transfer always
//! binds the rate effective at execution time.
//!
//! # Resolution order
//! 1. Same currency: rate 1, no table consulted.
//! 2. Direct entry `(from, to)`.
//! 3. Reciprocal of the reverse entry `(to, from)`.
//! 4. Two-leg path through the configured pivot currency.
//!
//! The first match wins. A stale winner is an error, not a reason to fall
//! through: silently rerouting would mask a dead feed.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::core_types::TimestampMs;
use crate::currency::{CurrencyCode, CurrencyRegistry};
use crate::error::BankError;
use crate::money::round_to_minor_units;

/// One table entry, as last quoted by the feed
#[derive(Debug, Clone, Serialize)]
pub struct ExchangeRate {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    /// Units of `to` per one unit of `from`; strictly positive
    pub rate: Decimal,
    /// Quote time (epoch millis)
    pub effective_at: TimestampMs,
}

/// The rate a caller resolved at one instant
///
/// Recorded onto transfer requests so a record shows exactly which rate
/// produced its converted amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSnapshot {
    pub rate: Decimal,
    /// Quote time of the underlying entry (epoch millis); for a pivot
    /// path, the older of the two legs
    pub effective_at: TimestampMs,
    /// Set when the rate was composed through the pivot currency
    pub pivot: Option<CurrencyCode>,
}

/// Concurrent rate table
///
/// Reads and feed refreshes interleave freely; each lookup observes one
/// consistent entry (or pair of pivot legs) at its instant.
pub struct RateTable {
    registry: Arc<CurrencyRegistry>,
    rates: DashMap<(CurrencyCode, CurrencyCode), ExchangeRate>,
    pivot: Option<CurrencyCode>,
    /// Quotes older than this are refused with `Transient`
    max_quote_age_ms: Option<i64>,
}

impl RateTable {
    pub fn new(registry: Arc<CurrencyRegistry>) -> Self {
        Self {
            registry,
            rates: DashMap::new(),
            pivot: None,
            max_quote_age_ms: None,
        }
    }

    /// Route lookups with no direct/reverse entry through `pivot`
    pub fn with_pivot(mut self, pivot: CurrencyCode) -> Self {
        self.pivot = Some(pivot);
        self
    }

    /// Refuse quotes older than `max_age_ms` at lookup time
    pub fn with_max_quote_age(mut self, max_age_ms: i64) -> Self {
        self.max_quote_age_ms = Some(max_age_ms);
        self
    }

    /// The registry this table validates codes against
    pub fn registry(&self) -> &CurrencyRegistry {
        &self.registry
    }

    /// Feed-facing refresh, stamped with the current time
    pub fn apply_quote(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        rate: Decimal,
    ) -> Result<(), BankError> {
        self.apply_quote_at(from, to, rate, Utc::now().timestamp_millis())
    }

    /// Feed-facing refresh with the feed's own quote timestamp
    pub fn apply_quote_at(
        &self,
        from: CurrencyCode,
        to: CurrencyCode,
        rate: Decimal,
        effective_at: TimestampMs,
    ) -> Result<(), BankError> {
        if !self.registry.contains(&from) {
            return Err(BankError::CurrencyNotFound(from.to_string()));
        }
        if !self.registry.contains(&to) {
            return Err(BankError::CurrencyNotFound(to.to_string()));
        }
        if from == to || rate <= Decimal::ZERO {
            return Err(BankError::InvalidRate);
        }

        debug!(from = %from, to = %to, rate = %rate, "Rate quote applied");
        self.rates.insert(
            (from.clone(), to.clone()),
            ExchangeRate {
                from,
                to,
                rate,
                effective_at,
            },
        );
        Ok(())
    }

    /// Resolve the current rate for a pair.
    ///
    /// Same-currency pairs resolve to 1 without consulting the table.
    /// Fails `CurrencyNotFound` for unregistered codes, `NoConversionPath`
    /// when no direct/reverse/pivot route exists, and `Transient` when the
    /// winning quote is older than the configured maximum age.
    pub fn get_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<RateSnapshot, BankError> {
        if !self.registry.contains(from) {
            return Err(BankError::CurrencyNotFound(from.to_string()));
        }
        if !self.registry.contains(to) {
            return Err(BankError::CurrencyNotFound(to.to_string()));
        }

        let now = Utc::now().timestamp_millis();
        if from == to {
            return Ok(RateSnapshot {
                rate: Decimal::ONE,
                effective_at: now,
                pivot: None,
            });
        }

        if let Some((rate, effective_at)) = self.pair_rate(from, to) {
            self.check_fresh(effective_at, now)?;
            return Ok(RateSnapshot {
                rate,
                effective_at,
                pivot: None,
            });
        }

        if let Some(pivot) = &self.pivot
            && pivot != from
            && pivot != to
            && let Some((leg_in, ts_in)) = self.pair_rate(from, pivot)
            && let Some((leg_out, ts_out)) = self.pair_rate(pivot, to)
        {
            self.check_fresh(ts_in, now)?;
            self.check_fresh(ts_out, now)?;
            let rate = leg_in.checked_mul(leg_out).ok_or(BankError::Overflow)?;
            return Ok(RateSnapshot {
                rate,
                effective_at: ts_in.min(ts_out),
                pivot: Some(pivot.clone()),
            });
        }

        Err(BankError::NoConversionPath {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Convert `amount` of `from` into `to`, rounding half-even to the
    /// target's minor units. Returns the snapshot actually used.
    pub fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<(Decimal, RateSnapshot), BankError> {
        let snapshot = self.get_rate(from, to)?;
        let converted = self.convert_with(&snapshot, amount, to)?;
        Ok((converted, snapshot))
    }

    /// Convert with an already-resolved snapshot (the confirmation path
    /// resolves once, then converts with what it resolved)
    pub fn convert_with(
        &self,
        snapshot: &RateSnapshot,
        amount: Decimal,
        to: &CurrencyCode,
    ) -> Result<Decimal, BankError> {
        let minor_units = self.registry.minor_units(to)?;
        let raw = amount.checked_mul(snapshot.rate).ok_or(BankError::Overflow)?;
        Ok(round_to_minor_units(raw, minor_units))
    }

    /// Rate-table dump for display
    pub fn list(&self) -> Vec<ExchangeRate> {
        self.rates.iter().map(|e| e.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Direct entry, or the reciprocal of the reverse entry
    fn pair_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Option<(Decimal, TimestampMs)> {
        if let Some(entry) = self.rates.get(&(from.clone(), to.clone())) {
            return Some((entry.rate, entry.effective_at));
        }
        if let Some(entry) = self.rates.get(&(to.clone(), from.clone())) {
            // rate is validated strictly positive at apply_quote
            return Decimal::ONE
                .checked_div(entry.rate)
                .map(|r| (r, entry.effective_at));
        }
        None
    }

    fn check_fresh(&self, effective_at: TimestampMs, now: TimestampMs) -> Result<(), BankError> {
        if let Some(max_age) = self.max_quote_age_ms {
            let age = now - effective_at;
            if age > max_age {
                return Err(BankError::Transient(format!(
                    "rate quote is stale ({age}ms old, max {max_age}ms)"
                )));
            }
        }
        Ok(())
    }
}
