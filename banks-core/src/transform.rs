//! Currency conversion: derive GBP, EUR and INR columns from the USD metric.

use crate::domain::{BankRecord, Currency, RawTable, Table};
use crate::numeric::round_half_even_2;
use crate::rates::RateTable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("exchange rate for {currency} is missing")]
    RateMissing { currency: Currency },

    #[error("exchange rate for {currency} is not a positive number: '{value}'")]
    InvalidRate { currency: Currency, value: String },
}

/// Resolved multipliers for every target currency.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Multipliers {
    gbp: f64,
    eur: f64,
    inr: f64,
}

impl Multipliers {
    fn resolve(rates: &RateTable) -> Result<Self, TransformError> {
        Ok(Self {
            gbp: rates.rate(Currency::Gbp)?,
            eur: rates.rate(Currency::Eur)?,
            inr: rates.rate(Currency::Inr)?,
        })
    }
}

/// Convert a USD amount, rounding half to even at two decimals.
///
/// `None` propagates, and a product that overflows `f64` becomes `None`.
pub fn convert(usd: Option<f64>, rate: f64) -> Option<f64> {
    usd.map(|v| v * rate)
        .filter(|v| v.is_finite())
        .map(round_half_even_2)
}

/// Add the three derived currency columns.
///
/// Every rate is resolved before any row is built, so a missing or bad rate
/// fails the whole call and nothing partial is returned.
pub fn transform(raw: RawTable, rates: &RateTable) -> Result<Table, TransformError> {
    let m = Multipliers::resolve(rates)?;

    let records = raw
        .rows
        .into_iter()
        .map(|row| BankRecord {
            mc_gbp_billion: convert(row.mc_usd_billion, m.gbp),
            mc_eur_billion: convert(row.mc_usd_billion, m.eur),
            mc_inr_billion: convert(row.mc_usd_billion, m.inr),
            mc_usd_billion: row.mc_usd_billion,
            name: row.name,
        })
        .collect();

    let table = Table::from_records(records);
    tracing::info!(rows = table.len(), nulls = table.null_count(), "converted currencies");
    Ok(table)
}
