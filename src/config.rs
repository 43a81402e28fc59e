//! Run configuration: TOML deserialization, eager validation, and output
//! file naming.
//!
//! Every configuration problem is caught here, before the first external
//! query; a run that has started querying never aborts on configuration.

use crate::error::{SearchError, Warning};
use crate::matcher::LocalAffiliations;
use crate::patents::RetryPolicy;
use crate::Source;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static RESULTS_FILE_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{8})\.xlsx$").unwrap());

static ISO_DATE_SUFFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}$").unwrap());

/// Age past which cached search results are flagged for refresh.
const STALE_RESULTS_DAYS: i64 = 30;

/// What the run searches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum SearchKind {
    Publications,
    Profils,
}

impl SearchKind {
    fn parse(value: &str) -> Result<Self, SearchError> {
        match value {
            "Publications" => Ok(SearchKind::Publications),
            "Profils" => Ok(SearchKind::Profils),
            other => Err(SearchError::InvalidSearchKind(other.to_string())),
        }
    }
}

/// The configuration file as written, before validation. Field names mirror
/// the TOML keys.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfig {
    pub search_type: String,
    #[serde(default = "default_database")]
    pub publications_search_database: String,
    pub in_excel_file: String,
    #[serde(default)]
    pub in_excel_file_author_sheet: Option<String>,
    pub pub_year_first: i32,
    pub pub_year_last: i32,
    #[serde(default)]
    pub extract_search_results_diff: bool,
    /// `[label, code]` pairs, e.g. `["Articles", "ar"]`.
    #[serde(default)]
    pub publication_types: Vec<(String, String)>,
    /// `[name, affiliation ID]` pairs.
    #[serde(default)]
    pub local_affiliations: Vec<(String, u64)>,
    #[serde(default = "default_true")]
    pub uspto_patent_search: bool,
    #[serde(default = "default_true")]
    pub espacenet_patent_search: bool,
    #[serde(default = "default_max_retries")]
    pub espacenet_max_retries: u32,
    #[serde(default)]
    pub espacenet_patent_search_results_file: Option<String>,
}

fn default_database() -> String {
    "Scopus".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_retries() -> u32 {
    RetryPolicy::default().max_attempts
}

/// One publication category of the run: the sheet/summary label and the
/// database-specific type code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationType {
    pub label: String,
    pub code: String,
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub kind: SearchKind,
    pub database: Source,
    pub input_file: PathBuf,
    pub author_sheet: Option<String>,
    pub year_first: i32,
    pub year_last: i32,
    /// Report only the results absent from the previous run. Forced off in
    /// January: the first run of the year must be a full baseline.
    pub differential: bool,
    pub publication_types: Vec<PublicationType>,
    pub local_affiliations: LocalAffiliations,
    pub local_affiliation_ids: Vec<u64>,
    pub uspto_patent_search: bool,
    pub espacenet_patent_search: bool,
    pub patent_retry: RetryPolicy,
    pub espacenet_results_file: Option<PathBuf>,
}

impl SearchConfig {
    /// Parse and validate a configuration file, with `today` taken from the
    /// system clock.
    ///
    /// # Errors
    ///
    /// Returns the first configuration problem found: TOML syntax, unknown
    /// search kind or database, inverted year range, or Scopus runs
    /// configured with OpenAlex type codes.
    pub fn from_toml_str(input: &str) -> Result<Self, SearchError> {
        Self::from_toml_str_at(input, chrono::Local::now().date_naive())
    }

    /// [`from_toml_str`](Self::from_toml_str) with an explicit date, for the
    /// January rule.
    pub fn from_toml_str_at(input: &str, today: NaiveDate) -> Result<Self, SearchError> {
        let raw: RawConfig = toml::from_str(input)?;
        Self::from_raw(raw, today)
    }

    pub fn from_raw(raw: RawConfig, today: NaiveDate) -> Result<Self, SearchError> {
        let kind = SearchKind::parse(&raw.search_type)?;
        let database = match raw.publications_search_database.as_str() {
            "Scopus" => Source::Scopus,
            "OpenAlex" => Source::OpenAlex,
            other => return Err(SearchError::InvalidDatabase(other.to_string())),
        };

        if raw.pub_year_first > raw.pub_year_last {
            return Err(SearchError::InvalidYearRange {
                first: raw.pub_year_first,
                last: raw.pub_year_last,
            });
        }

        // Scopus and OpenAlex use different type codes for the same
        // categories; a Scopus run configured with OpenAlex codes would
        // silently return nothing.
        if database == Source::Scopus
            && raw
                .publication_types
                .iter()
                .any(|(label, code)| label == "Articles" && code != "ar")
        {
            return Err(SearchError::PublicationTypeMismatch);
        }

        Ok(Self {
            kind,
            database,
            input_file: PathBuf::from(&raw.in_excel_file),
            author_sheet: raw.in_excel_file_author_sheet,
            year_first: raw.pub_year_first,
            year_last: raw.pub_year_last,
            differential: raw.extract_search_results_diff && today.month() != 1,
            publication_types: raw
                .publication_types
                .iter()
                .map(|(label, code)| PublicationType {
                    label: label.clone(),
                    code: code.clone(),
                })
                .collect(),
            local_affiliations: LocalAffiliations::new(
                raw.local_affiliations.iter().map(|(name, _)| name),
            ),
            local_affiliation_ids: raw.local_affiliations.iter().map(|&(_, id)| id).collect(),
            uspto_patent_search: raw.uspto_patent_search,
            espacenet_patent_search: raw.espacenet_patent_search,
            patent_retry: RetryPolicy {
                max_attempts: raw.espacenet_max_retries,
                ..RetryPolicy::default()
            },
            espacenet_results_file: raw.espacenet_patent_search_results_file.map(PathBuf::from),
        })
    }

    /// `(code, label)` pairs in configuration order, as the summary sheet
    /// wants them.
    pub fn subtype_labels(&self) -> Vec<(String, String)> {
        self.publication_types
            .iter()
            .map(|t| (t.code.clone(), t.label.clone()))
            .collect()
    }

    /// Output file for this run, derived from the input file name.
    ///
    /// Publication runs are dated so successive runs never overwrite each
    /// other; profile runs are not, the roster audit is a living document.
    pub fn output_file(&self, today: NaiveDate) -> PathBuf {
        let stem = self
            .input_file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let suffix = self
            .input_file
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("xlsx");
        let name = match self.kind {
            SearchKind::Publications => format!(
                "{stem}_{}-{}_publications_{today}.{suffix}",
                self.year_first, self.year_last
            ),
            SearchKind::Profils => format!("{stem}_profils.{suffix}"),
        };
        self.input_file.with_file_name(name)
    }

    /// Output file for a differential run, tagged with the date of the
    /// previous results it was diffed against.
    pub fn diff_output_file(&self, today: NaiveDate, previous: &Path) -> PathBuf {
        let output = self.output_file(today);
        let stem = output
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let previous_stem = previous
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        // The previous publications file ends in its ISO run date.
        let previous_date = ISO_DATE_SUFFIX_REGEX
            .find(previous_stem)
            .map(|m| m.as_str())
            .unwrap_or(previous_stem);
        output.with_file_name(format!("{stem}_SCOPUS_DIFF_{previous_date}.xlsx"))
    }
}

/// Extract the run date from a cached results file named
/// `<filename>YYYYMMDD.xlsx`.
pub fn results_file_date(file_name: &str) -> Result<NaiveDate, SearchError> {
    RESULTS_FILE_DATE_REGEX
        .captures(file_name)
        .and_then(|captures| {
            NaiveDate::parse_from_str(captures.get(1)?.as_str(), "%Y%m%d").ok()
        })
        .ok_or_else(|| SearchError::UndatedResultsFile(file_name.to_string()))
}

/// Check a cached results file for staleness. Old results are a warning, not
/// an error: the reviewer may be re-running a historical query on purpose.
pub fn check_results_file_age(
    file_name: &str,
    today: NaiveDate,
) -> Result<Option<Warning>, SearchError> {
    let file_date = results_file_date(file_name)?;
    let age_days = (today - file_date).num_days();
    if age_days >= STALE_RESULTS_DAYS {
        let warning = Warning::StaleResultsFile {
            file: file_name.to_string(),
            age_days: STALE_RESULTS_DAYS,
        };
        tracing::warn!("{warning}");
        Ok(Some(warning))
    } else {
        Ok(None)
    }
}
