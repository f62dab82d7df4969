//! Live-table extraction strategy
//!
//! Turns a rendered arrivals view into raw row records. Extraction is pure
//! over the view source: the session driver supplies the HTML, these
//! functions never touch the network, which keeps them testable against
//! fixture documents.

use crate::extract::raw::RawRow;
use crate::extract::ExtractError;
use scraper::{ElementRef, Html, Selector};

/// Selector for arrival parent rows
pub const PARENT_ROW_SELECTOR: &str = "tr.parentrow.toggleFlightDetails";

/// Selector for transfer child rows inside the nested manifest table
pub const CHILD_ROW_SELECTOR: &str = "tr.detailsrow";

/// One arrival row with its nested transfer-manifest rows
#[derive(Debug, Clone)]
pub struct RawFlightRow {
    pub cells: RawRow,
    pub children: Vec<RawRow>,
}

/// Extracts arrival rows and their nested transfer children from a view
///
/// Rows come back in render order, which is stable within one extraction.
/// A view without any parent rows (the portal's "no data" rendering) yields
/// an empty Vec, which is a valid, non-error outcome of a cycle. A parent
/// row without a structural sibling child table yields an empty child list,
/// never an error.
pub fn extract_flight_rows(html: &str) -> Result<Vec<RawFlightRow>, ExtractError> {
    let parent_selector = parse_selector(PARENT_ROW_SELECTOR)?;
    let child_selector = parse_selector(CHILD_ROW_SELECTOR)?;
    let table_selector = parse_selector("table")?;
    let cell_selector = parse_selector("td")?;

    let document = Html::parse_document(html);
    let mut rows = Vec::new();

    for parent in document.select(&parent_selector) {
        let cells = row_cells(parent, &cell_selector);
        let children = extract_children(parent, &table_selector, &child_selector, &cell_selector);
        rows.push(RawFlightRow {
            cells: RawRow::new(cells),
            children,
        });
    }

    Ok(rows)
}

/// Extracts the transfer rows nested under a parent's immediate sibling
///
/// The manifest lives in the next element sibling row (class `childrow`); if
/// that sibling or its inner table is missing, the flight simply has no
/// onward connections.
fn extract_children(
    parent: ElementRef<'_>,
    table_selector: &Selector,
    child_selector: &Selector,
    cell_selector: &Selector,
) -> Vec<RawRow> {
    let sibling = match parent.next_siblings().find_map(ElementRef::wrap) {
        Some(el) => el,
        None => return Vec::new(),
    };

    if !has_class(sibling, "childrow") {
        return Vec::new();
    }

    let table = match sibling.select(table_selector).next() {
        Some(t) => t,
        None => return Vec::new(),
    };

    table
        .select(child_selector)
        .map(|row| RawRow::new(row_cells(row, cell_selector)))
        .collect()
}

/// Collects the trimmed text of each cell in a row
fn row_cells(row: ElementRef<'_>, cell_selector: &Selector) -> Vec<String> {
    row.select(cell_selector)
        .map(|cell| cell.text().collect::<String>().trim().to_string())
        .collect()
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element
        .value()
        .attr("class")
        .map(|c| c.split_whitespace().any(|part| part == class))
        .unwrap_or(false)
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|e| ExtractError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}
