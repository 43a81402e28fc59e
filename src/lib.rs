//! A library for reconciling bibliographic and patent search results against
//! a roster of known local authors.
//!
//! `refsearch` is the reconciliation core of a reference-discovery pipeline:
//! external databases (Scopus, OpenAlex, USPTO, INPADOC) are queried once per
//! roster author by out-of-scope client code, and the per-author result sets
//! are handed to this crate, which
//!
//! - normalizes free-text names for accent/hyphen/case-insensitive comparison
//!   ([`normalize`]),
//! - decides which names and identifiers correspond to roster members
//!   ([`matcher`], [`roster`]),
//! - merges the per-author result sets into one canonical set of records with
//!   local co-author lists and joint-work counts attached ([`dedupe`]),
//! - computes the summary and per-author tabulations the report writer needs
//!   ([`aggregate`]).
//!
//! # Basic usage
//!
//! ```rust
//! use refsearch::{Deduplicator, Publication, Roster, RosterMember, SortKey, Source};
//!
//! let roster = Roster::new(vec![
//!     RosterMember::with_scopus_id("Charette", "Paul", 111),
//!     RosterMember::with_scopus_id("Hunter", "Ian", 222),
//! ]);
//!
//! // The same document fetched by two different per-author queries.
//! let fetch = |queried_for: usize, ids: &[&str]| Publication {
//!     id: Some("EID1".to_string()),
//!     title: "A Study of Things".to_string(),
//!     author_ids: ids.iter().map(|s| s.to_string()).collect(),
//!     source: Source::Scopus,
//!     queried_for,
//!     ..Publication::default()
//! };
//! let records = vec![fetch(0, &["111", "999"]), fetch(1, &["111", "222", "999"])];
//!
//! let (unique, warnings) =
//!     Deduplicator::new().deduplicate(records, &roster, SortKey::CoverDate);
//! assert_eq!(unique.len(), 1);
//! assert_eq!(unique[0].local_authors, vec![0, 1]);
//! assert_eq!(unique[0].local_author_count, Some(2));
//! assert!(warnings.is_empty());
//! ```
//!
//! # Warnings vs errors
//!
//! Fatal conditions (bad configuration, unavailable external service) are
//! [`SearchError`] values propagated with `?`. Data-quality findings (a record
//! with no matched local author, a roster entry without an external ID) are
//! [`Warning`] values: the run completes, the warnings are logged through
//! [`tracing`] and returned so the report can surface them to a reviewer.

use serde::{Deserialize, Serialize};

pub mod aggregate;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod patents;
pub mod profile;
pub mod roster;

// Reexports
pub use aggregate::{SummaryRow, SummaryTable};
pub use config::{SearchConfig, SearchKind};
pub use dedupe::{Deduplicator, Matched, MergeKey, Record, SortKey};
pub use error::{SearchError, Warning};
pub use matcher::{LocalAffiliations, ProfileFlag};
pub use roster::{Roster, RosterMember};

/// External system a record was fetched from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    #[default]
    Scopus,
    OpenAlex,
    Crossref,
    Uspto,
    Inpadoc,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Scopus => "Scopus",
            Source::OpenAlex => "OpenAlex",
            Source::Crossref => "Crossref",
            Source::Uspto => "USPTO",
            Source::Inpadoc => "INPADOC",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A publication record as fetched by one per-author query, validated at the
/// API-response boundary into named fields.
///
/// Records for the same real-world document may arrive multiple times, once
/// per author query that retrieved it; [`Deduplicator`](dedupe::Deduplicator)
/// merges them by [`id`](Publication::id) (or by normalized title when no
/// stable identifier exists, e.g. OpenAlex records enriched from Crossref).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    /// Stable identifier (Scopus EID or DOI), when the source provides one.
    pub id: Option<String>,
    pub title: String,
    /// Publication type code ("ar", "cp", ... for Scopus; "article",
    /// "preprint", ... for OpenAlex).
    pub subtype: String,
    /// ISO-8601 cover date; may be empty (empty sorts last).
    pub cover_date: String,
    /// Author display names, in document order.
    pub author_names: Vec<String>,
    /// Per-author external identifiers (Scopus author IDs); may be empty
    /// for sources that only return display names.
    pub author_ids: Vec<String>,
    /// Journal or venue name.
    pub publication_name: Option<String>,
    pub volume: Option<String>,
    pub doi: Option<String>,
    pub source: Source,
    /// Roster index of the author whose query fetched this record
    /// (provenance for data-quality diagnostics).
    pub queried_for: usize,
}

/// Patent lifecycle category, used both for INPADOC family members and for
/// the USPTO application/grant split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatentStatus {
    #[default]
    Pending,
    Granted,
}

/// A patent or patent-application record from USPTO or INPADOC.
///
/// Grant dates are unreliable for range filtering at search time, so patents
/// carry explicit validated dates and are filtered in post by
/// [`patents::granted_in_range`] / [`patents::filed_in_range`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patent {
    /// USPTO application ID, or INPADOC family ID.
    pub application_id: String,
    pub title: String,
    /// ISO-8601 filing date of the earliest application; may be empty.
    pub filing_date: String,
    /// ISO-8601 grant date; empty while the application is pending.
    pub grant_date: String,
    /// Inventor display names, formatted "First Last (CC)".
    pub inventors: Vec<String>,
    pub assignees: Vec<String>,
    pub status: PatentStatus,
    pub source: Source,
    /// Roster index of the author whose query fetched this record.
    pub queried_for: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_display() {
        assert_eq!(format!("{}", Source::Scopus), "Scopus");
        assert_eq!(format!("{}", Source::Uspto), "USPTO");
        assert_eq!(format!("{}", Source::Inpadoc), "INPADOC");
    }

    #[test]
    fn test_publication_default_has_no_id() {
        let publication = Publication::default();
        assert!(publication.id.is_none());
        assert!(publication.author_names.is_empty());
        assert_eq!(publication.source, Source::Scopus);
    }
}
