//! Domain types flowing through the pipeline.
//!
//! Extraction produces a [`RawTable`] (name + USD metric). Conversion consumes it
//! and produces a [`Table`] that always carries the full five-column set, so a
//! table with only some currency columns can never reach a sink.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Target currencies derived from the USD metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    Gbp,
    Eur,
    Inr,
}

impl Currency {
    /// Every currency the converter derives, in output column order.
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Inr];

    /// ISO 4217 code as it appears in the rate file.
    pub fn code(self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }

    /// Output column holding this currency's market cap.
    pub fn column(self) -> &'static str {
        match self {
            Currency::Gbp => "MC_GBP_Billion",
            Currency::Eur => "MC_EUR_Billion",
            Currency::Inr => "MC_INR_Billion",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One extracted entity before currency conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub name: String,
    /// `None` when the source cell did not coerce to a number.
    pub mc_usd_billion: Option<f64>,
}

impl RawRow {
    pub fn new(name: impl Into<String>, mc_usd_billion: Option<f64>) -> Self {
        Self {
            name: name.into(),
            mc_usd_billion,
        }
    }
}

/// Extraction output, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(rows: Vec<RawRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A fully converted row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub name: String,
    pub mc_usd_billion: Option<f64>,
    pub mc_gbp_billion: Option<f64>,
    pub mc_eur_billion: Option<f64>,
    pub mc_inr_billion: Option<f64>,
}

impl BankRecord {
    /// Derived market cap for a currency.
    pub fn converted(&self, currency: Currency) -> Option<f64> {
        match currency {
            Currency::Gbp => self.mc_gbp_billion,
            Currency::Eur => self.mc_eur_billion,
            Currency::Inr => self.mc_inr_billion,
        }
    }
}

/// Converted table handed to the sinks. Read-only after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<BankRecord>,
}

impl Table {
    /// Column set, in output order.
    pub const COLUMNS: [&'static str; 5] = [
        "Name",
        "MC_USD_Billion",
        "MC_GBP_Billion",
        "MC_EUR_Billion",
        "MC_INR_Billion",
    ];

    pub(crate) fn from_records(rows: Vec<BankRecord>) -> Self {
        Self { rows }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &Self::COLUMNS
    }

    pub fn rows(&self) -> &[BankRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows whose USD metric failed to coerce.
    pub fn null_count(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| r.mc_usd_billion.is_none())
            .count()
    }
}
