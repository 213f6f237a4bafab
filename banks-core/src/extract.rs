//! Extraction of the ranked bank table from an HTML page.
//!
//! The ranking is the first `<tbody>` in the document that yields at least one
//! row. The HTML parser inserts a `<tbody>` into every `<table>` written
//! without one, so a leading layout table with no bank rows is passed over
//! rather than mistaken for the ranking.
//!
//! Each row of that body contributes one [`RawRow`]:
//! - name: text of the *second* `<a>` in the second cell (the first link is a
//!   flag or footnote marker)
//! - metric: first text node of the third cell, coerced with
//!   [`coerce_metric`]
//!
//! Rows and cells are the direct children of their parent, and links inside a
//! table nested in a cell are not counted, so nested markup cannot shift the
//! positions. Rows with fewer than [`MIN_CELLS`] cells, or without a second
//! link, are skipped; a bad metric becomes `None`.

use crate::domain::{RawRow, RawTable};
use crate::numeric::coerce_metric;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Minimum `<td>` cells a row needs to be considered.
pub const MIN_CELLS: usize = 3;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document has no <tbody>")]
    NoTableBody,

    #[error("table body has no usable rows")]
    NoRows,

    #[error("invalid selector {0}")]
    Selector(String),
}

struct Selectors {
    tbody: Selector,
    a: Selector,
}

impl Selectors {
    fn new() -> Result<Self, ExtractionError> {
        Ok(Self {
            tbody: parse_selector("tbody")?,
            a: parse_selector("a")?,
        })
    }
}

fn parse_selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::Selector(format!("'{css}': {e:?}")))
}

/// Element children of `parent` with the given tag name.
fn child_elements<'a>(
    parent: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |e| e.value().name() == tag)
}

/// Parse the document and pull out (name, USD market cap) rows in order.
pub fn extract(document: &str) -> Result<RawTable, ExtractionError> {
    let sel = Selectors::new()?;
    let html = Html::parse_document(document);

    let mut saw_body = false;
    for (position, body) in html.select(&sel.tbody).enumerate() {
        saw_body = true;
        let rows = body_rows(body, &sel.a);
        if rows.is_empty() {
            tracing::debug!(body = position, "skipping table body without bank rows");
            continue;
        }
        tracing::info!(rows = rows.len(), body = position, "extracted table");
        return Ok(RawTable::new(rows));
    }

    if saw_body {
        Err(ExtractionError::NoRows)
    } else {
        Err(ExtractionError::NoTableBody)
    }
}

fn body_rows(body: ElementRef<'_>, link: &Selector) -> Vec<RawRow> {
    let mut rows = Vec::new();
    for (index, tr) in child_elements(body, "tr").enumerate() {
        let cells: Vec<ElementRef<'_>> = child_elements(tr, "td").collect();
        if cells.len() < MIN_CELLS {
            continue;
        }

        let Some(name) = entity_name(cells[1], link) else {
            tracing::debug!(row = index, "skipping row without a second link");
            continue;
        };

        let raw_metric = cells[2].text().next().unwrap_or("");
        let mc_usd_billion = coerce_metric(raw_metric);
        if mc_usd_billion.is_none() {
            tracing::debug!(row = index, name = %name, raw = raw_metric.trim(), "metric did not coerce");
        }

        rows.push(RawRow::new(name, mc_usd_billion));
    }
    rows
}

/// True when `node` sits inside a `<table>` nested within `cell`.
fn in_nested_table(node: ElementRef<'_>, cell: ElementRef<'_>) -> bool {
    node.ancestors()
        .take_while(|n| *n != *cell)
        .any(|n| n.value().as_element().is_some_and(|e| e.name() == "table"))
}

/// Text of the second hyperlink in a cell, if present and non-empty.
fn entity_name(cell: ElementRef<'_>, link: &Selector) -> Option<String> {
    let anchor = cell
        .select(link)
        .filter(|a| !in_nested_table(*a, cell))
        .nth(1)?;
    let text = anchor.text().collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
