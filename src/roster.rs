//! The roster of known local authors, loaded once per run and immutable
//! thereafter.
//!
//! Member order is insertion order from the input sheet and matters only for
//! output row ordering. The identifier→index maps are built once at
//! construction and passed around by reference, so the matcher and
//! deduplicator stay referentially transparent.

#[cfg(feature = "csv")]
pub mod csv;

use crate::error::{SearchError, Warning};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

static OPENALEX_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^A\d{10}$").unwrap());

static ORCID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]{4}-[A-Za-z0-9]{4}-[A-Za-z0-9]{4}-[A-Za-z0-9]{4}$").unwrap()
});

static YEAR_RANGE_COLUMN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{4}$").unwrap());

/// A known local author with their optional external identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    pub last_name: String,
    pub first_name: String,
    /// Scopus author ID; `None` when the input sheet holds no valid integer.
    pub scopus_id: Option<u64>,
    /// OpenAlex author ID, `A` followed by ten digits.
    pub openalex_id: Option<String>,
    /// ORCID in `XXXX-XXXX-XXXX-XXXX` form.
    pub orcid: Option<String>,
}

impl RosterMember {
    pub fn new(last_name: &str, first_name: &str) -> Self {
        Self {
            last_name: last_name.to_string(),
            first_name: first_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_scopus_id(last_name: &str, first_name: &str, scopus_id: u64) -> Self {
        Self {
            scopus_id: Some(scopus_id),
            ..Self::new(last_name, first_name)
        }
    }

    /// "Last, First" display form used in diagnostics.
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.last_name, self.first_name)
    }
}

/// One raw row of the input sheet, before identifier validation and
/// membership filtering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterRow {
    pub last_name: String,
    pub first_name: String,
    pub scopus_id: Option<String>,
    pub openalex_id: Option<String>,
    pub orcid: Option<String>,
    /// Year-tagged membership status columns, e.g. `("2023-2024", "Régulier")`.
    /// Empty for the plain name-list roster shape.
    pub yearly_status: Vec<(String, String)>,
}

/// Insertion-ordered roster plus precomputed identifier→index maps.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<RosterMember>,
    scopus_index: HashMap<u64, usize>,
    openalex_index: HashMap<String, usize>,
}

impl Roster {
    /// Build a roster and its lookup maps. On duplicate identifiers the
    /// first (lowest-index) member wins.
    pub fn new(members: Vec<RosterMember>) -> Self {
        let mut scopus_index = HashMap::new();
        let mut openalex_index = HashMap::new();
        for (index, member) in members.iter().enumerate() {
            if let Some(id) = member.scopus_id {
                scopus_index.entry(id).or_insert(index);
            }
            if let Some(id) = &member.openalex_id {
                openalex_index.entry(id.clone()).or_insert(index);
            }
        }
        Self {
            members,
            scopus_index,
            openalex_index,
        }
    }

    /// Build a roster from raw sheet rows for the given query year range.
    ///
    /// Two roster shapes are accepted:
    /// - a plain name list (no `YYYY-YYYY` columns): all rows are kept;
    /// - a member database with year-tagged status columns covering the
    ///   query range: rows whose status over the range never reads
    ///   "Régulier" are filtered out.
    ///
    /// Year columns that exist but do not cover the requested range are a
    /// fatal configuration error, as is an empty result.
    pub fn from_rows(
        rows: Vec<RosterRow>,
        year_first: i32,
        year_last: i32,
    ) -> Result<(Self, Vec<Warning>), SearchError> {
        let rows: Vec<RosterRow> = rows
            .into_iter()
            .filter(|row| !row.last_name.trim().is_empty())
            .collect();
        if rows.is_empty() {
            return Err(SearchError::EmptyInput);
        }

        let has_year_columns = rows.iter().any(|row| {
            row.yearly_status
                .iter()
                .any(|(column, _)| YEAR_RANGE_COLUMN_REGEX.is_match(column))
        });

        let rows = if has_year_columns {
            let required: Vec<String> = (year_first..=year_last)
                .map(|year| format!("{year}-{}", year + 1))
                .collect();
            let covered = rows.iter().all(|row| {
                required
                    .iter()
                    .all(|column| row.yearly_status.iter().any(|(c, _)| c == column))
            });
            if !covered {
                return Err(SearchError::YearRangeOutsideRosterData {
                    first: year_first,
                    last: year_last,
                });
            }
            let regulars: Vec<RosterRow> = rows
                .into_iter()
                .filter(|row| {
                    row.yearly_status
                        .iter()
                        .any(|(column, status)| {
                            required.contains(column) && status.contains("Régulier")
                        })
                })
                .collect();
            if regulars.is_empty() {
                return Err(SearchError::EmptyRoster {
                    first: year_first,
                    last: year_last,
                });
            }
            regulars
        } else {
            rows
        };

        let mut warnings = Vec::new();
        let members = rows
            .into_iter()
            .map(|row| validate_row(row, &mut warnings))
            .collect();
        Ok((Self::new(members), warnings))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[RosterMember] {
        &self.members
    }

    pub fn get(&self, index: usize) -> Option<&RosterMember> {
        self.members.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RosterMember> {
        self.members.iter()
    }

    /// O(1) lookup of a roster member by Scopus author ID.
    pub fn index_of_scopus_id(&self, id: u64) -> Option<usize> {
        self.scopus_index.get(&id).copied()
    }

    /// Lookup by the string form external APIs return.
    pub fn index_of_scopus_id_str(&self, id: &str) -> Option<usize> {
        id.trim().parse().ok().and_then(|id| self.index_of_scopus_id(id))
    }

    /// O(1) lookup of a roster member by OpenAlex author ID.
    pub fn index_of_openalex_id(&self, id: &str) -> Option<usize> {
        self.openalex_index.get(id).copied()
    }
}

/// Validate one row's identifiers into a typed member. Malformed non-empty
/// identifiers are dropped to `None` with a warning, never a hard failure.
fn validate_row(row: RosterRow, warnings: &mut Vec<Warning>) -> RosterMember {
    let mut warn_invalid = |value: &str| {
        let warning = Warning::InvalidExternalId {
            last_name: row.last_name.trim().to_string(),
            first_name: row.first_name.trim().to_string(),
            value: value.to_string(),
        };
        tracing::warn!("{warning}");
        warnings.push(warning);
    };

    let scopus_id = row.scopus_id.as_deref().and_then(|raw| {
        let raw = raw.trim();
        match raw.parse::<u64>() {
            Ok(id) if id > 0 => Some(id),
            // Placeholder text ("-", "aucun", ...) is common in the sheet
            // and not worth a warning.
            _ => None,
        }
    });

    let openalex_id = row.openalex_id.as_deref().and_then(|raw| {
        let raw = raw.trim().trim_start_matches("https://openalex.org/");
        if OPENALEX_ID_REGEX.is_match(raw) {
            Some(raw.to_string())
        } else {
            if !raw.is_empty() {
                warn_invalid(raw);
            }
            None
        }
    });

    let orcid = row.orcid.as_deref().and_then(|raw| {
        let raw = raw.trim().trim_start_matches("https://orcid.org/");
        if ORCID_REGEX.is_match(raw) {
            Some(raw.to_string())
        } else {
            if !raw.is_empty() {
                warn_invalid(raw);
            }
            None
        }
    });

    RosterMember {
        last_name: row.last_name.trim().to_string(),
        first_name: row.first_name.trim().to_string(),
        scopus_id,
        openalex_id,
        orcid,
    }
}
