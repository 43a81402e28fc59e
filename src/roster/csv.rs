//! Roster ingestion from a CSV export of the input sheet.
//!
//! The sheet carries required columns `Nom` and `Prénom`, optional external-ID
//! columns (`ID Scopus`, `OpenAlex`, `ORCID`), and — for the member-database
//! shape — one membership-status column per fiscal year (`2023-2024`, ...).
//!
//! # Example
//!
//! ```
//! use refsearch::roster::{Roster, csv::parse_roster_csv};
//!
//! let input = "Nom,Prénom,ID Scopus\nCharette,Paul,111\nHunter,Ian,222";
//! let rows = parse_roster_csv(input).unwrap();
//! let (roster, _warnings) = Roster::from_rows(rows, 2020, 2023).unwrap();
//! assert_eq!(roster.len(), 2);
//! ```

use crate::error::SearchError;
use crate::roster::RosterRow;
use csv::ReaderBuilder;
use regex::Regex;
use std::sync::LazyLock;

static YEAR_COLUMN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{4}$").unwrap());

const COLUMN_LAST_NAME: &str = "Nom";
const COLUMN_FIRST_NAME: &str = "Prénom";
const COLUMN_SCOPUS_ID: &str = "ID Scopus";
const COLUMN_OPENALEX: &str = "OpenAlex";
const COLUMN_ORCID: &str = "ORCID";

/// Parse CSV text into raw roster rows.
///
/// All cell values are whitespace-trimmed; rows are not filtered here
/// (that is [`Roster::from_rows`](crate::roster::Roster::from_rows)'s job).
///
/// # Errors
///
/// Returns [`SearchError::MissingColumn`] when `Nom` or `Prénom` is absent,
/// and propagates CSV syntax errors.
pub fn parse_roster_csv(input: &str) -> Result<Vec<RosterRow>, SearchError> {
    if input.trim().is_empty() {
        return Err(SearchError::EmptyInput);
    }

    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

    let position_of = |name: &str| headers.iter().position(|h| h == name);
    let last_name_col = position_of(COLUMN_LAST_NAME)
        .ok_or(SearchError::MissingColumn(COLUMN_LAST_NAME))?;
    let first_name_col = position_of(COLUMN_FIRST_NAME)
        .ok_or(SearchError::MissingColumn(COLUMN_FIRST_NAME))?;
    let scopus_col = position_of(COLUMN_SCOPUS_ID);
    let openalex_col = position_of(COLUMN_OPENALEX);
    let orcid_col = position_of(COLUMN_ORCID);
    let year_cols: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| YEAR_COLUMN_REGEX.is_match(h))
        .map(|(i, _)| i)
        .collect();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cell = |col: Option<usize>| -> Option<String> {
            col.and_then(|i| record.get(i))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        rows.push(RosterRow {
            last_name: cell(Some(last_name_col)).unwrap_or_default(),
            first_name: cell(Some(first_name_col)).unwrap_or_default(),
            scopus_id: cell(scopus_col),
            openalex_id: cell(openalex_col),
            orcid: cell(orcid_col),
            yearly_status: year_cols
                .iter()
                .filter_map(|&i| {
                    record
                        .get(i)
                        .map(|status| (headers[i].clone(), status.trim().to_string()))
                })
                .collect(),
        });
    }

    Ok(rows)
}
