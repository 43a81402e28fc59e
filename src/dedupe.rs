//! Merging per-author result sets into one canonical record set.
//!
//! Every roster author is queried separately, so a co-authored document
//! arrives once per local co-author. Deduplication groups records by
//! [`MergeKey`], merges duplicate groups field-by-field (the more complete
//! value wins), attaches the roster indices of local co-authors, and drops
//! records in which no local author could be matched at all — those indicate
//! an identifier problem upstream and are reported, not silently kept.

use crate::error::Warning;
use crate::matcher::any_name_matches;
use crate::normalize::{normalize_cached, normalize_title};
use crate::roster::Roster;
use crate::{Patent, PatentStatus, Publication};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Identity of a record for grouping purposes.
///
/// Records with a stable source identifier group by it; records without one
/// (e.g. OpenAlex works enriched from Crossref) fall back to the normalized
/// title. The two keyspaces never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MergeKey {
    Id(String),
    Title(String),
}

/// A record that can be grouped, merged, and matched against the roster.
pub trait Record {
    fn merge_key(&self) -> MergeKey;
    fn title(&self) -> &str;
    /// Free-text author or inventor names, for name-based matching.
    fn candidate_names(&self) -> &[String];
    /// Per-author external identifiers, for ID-based matching. Empty when the
    /// source returns display names only.
    fn external_author_ids(&self) -> &[String];
    /// Roster index of the author whose query fetched this record.
    fn queried_for(&self) -> usize;
    /// Date used by [`SortKey::CoverDate`]; may be empty.
    fn sort_date(&self) -> &str;
    /// Absorb a duplicate of the same document. For each field the more
    /// complete value wins: longer author list, non-empty over empty.
    fn merge_from(&mut self, other: Self);
}

impl Record for Publication {
    fn merge_key(&self) -> MergeKey {
        match &self.id {
            Some(id) => MergeKey::Id(id.clone()),
            None => MergeKey::Title(normalize_title(&self.title)),
        }
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn candidate_names(&self) -> &[String] {
        &self.author_names
    }

    fn external_author_ids(&self) -> &[String] {
        &self.author_ids
    }

    fn queried_for(&self) -> usize {
        self.queried_for
    }

    fn sort_date(&self) -> &str {
        &self.cover_date
    }

    fn merge_from(&mut self, other: Self) {
        if self.id.is_none() {
            self.id = other.id;
        }
        if self.title.is_empty() {
            self.title = other.title;
        }
        if self.subtype.is_empty() {
            self.subtype = other.subtype;
        }
        if self.cover_date.is_empty() {
            self.cover_date = other.cover_date;
        }
        if other.author_names.len() > self.author_names.len() {
            self.author_names = other.author_names;
        }
        if other.author_ids.len() > self.author_ids.len() {
            self.author_ids = other.author_ids;
        }
        if self.publication_name.is_none() {
            self.publication_name = other.publication_name;
        }
        if self.volume.is_none() {
            self.volume = other.volume;
        }
        if self.doi.is_none() {
            self.doi = other.doi;
        }
    }
}

impl Record for Patent {
    fn merge_key(&self) -> MergeKey {
        MergeKey::Id(self.application_id.clone())
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn candidate_names(&self) -> &[String] {
        &self.inventors
    }

    fn external_author_ids(&self) -> &[String] {
        // Patent offices return inventor names, not author IDs.
        &[]
    }

    fn queried_for(&self) -> usize {
        self.queried_for
    }

    fn sort_date(&self) -> &str {
        if self.grant_date.is_empty() {
            &self.filing_date
        } else {
            &self.grant_date
        }
    }

    fn merge_from(&mut self, other: Self) {
        if self.title.is_empty() {
            self.title = other.title;
        }
        if self.filing_date.is_empty() {
            self.filing_date = other.filing_date;
        }
        if self.grant_date.is_empty() {
            self.grant_date = other.grant_date;
        }
        if other.inventors.len() > self.inventors.len() {
            self.inventors = other.inventors;
        }
        if other.assignees.len() > self.assignees.len() {
            self.assignees = other.assignees;
        }
        // A grant supersedes the pending application it grew out of.
        if other.status == PatentStatus::Granted {
            self.status = PatentStatus::Granted;
        }
    }
}

/// A deduplicated record with its matched local co-authors attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matched<R> {
    pub record: R,
    /// Roster indices of matched local co-authors, in roster order.
    pub local_authors: Vec<usize>,
    /// `Some(n)` only for joint work (`n > 1` local co-authors); single-author
    /// records carry `None` so the joint-work column stays blank, not zero.
    pub local_author_count: Option<usize>,
}

impl<R: Record> Record for Matched<R> {
    fn merge_key(&self) -> MergeKey {
        self.record.merge_key()
    }

    fn title(&self) -> &str {
        self.record.title()
    }

    fn candidate_names(&self) -> &[String] {
        self.record.candidate_names()
    }

    fn external_author_ids(&self) -> &[String] {
        self.record.external_author_ids()
    }

    fn queried_for(&self) -> usize {
        self.record.queried_for()
    }

    fn sort_date(&self) -> &str {
        self.record.sort_date()
    }

    fn merge_from(&mut self, other: Self) {
        self.record.merge_from(other.record);
        self.local_authors.extend(other.local_authors);
        self.local_authors.sort_unstable();
        self.local_authors.dedup();
        self.local_author_count = joint_count(&self.local_authors);
    }
}

/// Output ordering of the deduplicated set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortKey {
    /// Ascending by date, records without a date last. Used for publications.
    CoverDate,
    /// Ascending by normalized title. Used for patents, whose grant dates are
    /// often absent.
    Title,
}

fn joint_count(local_authors: &[usize]) -> Option<usize> {
    match local_authors.len() {
        0 | 1 => None,
        n => Some(n),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicator;

impl Deduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Deduplicate, match, and sort one result set.
    ///
    /// Records grouping to the same [`MergeKey`] are merged in arrival order
    /// (first arrival keeps provenance). Local co-authors are then matched by
    /// external author ID when the record carries IDs, by name containment
    /// otherwise. Records with zero matched local authors are dropped and
    /// reported as [`Warning::NoLocalAuthors`].
    pub fn deduplicate<R: Record>(
        &self,
        records: Vec<R>,
        roster: &Roster,
        sort: SortKey,
    ) -> (Vec<Matched<R>>, Vec<Warning>) {
        let mut unique: Vec<R> = Vec::new();
        let mut index_of: HashMap<MergeKey, usize> = HashMap::new();
        for record in records {
            match index_of.get(&record.merge_key()) {
                Some(&index) => unique[index].merge_from(record),
                None => {
                    index_of.insert(record.merge_key(), unique.len());
                    unique.push(record);
                }
            }
        }

        let mut warnings = Vec::new();
        let mut matched: Vec<Matched<R>> = unique
            .into_iter()
            .filter_map(|record| {
                let local_authors = self.match_local_authors(&record, roster);
                if local_authors.is_empty() {
                    let warning = no_local_authors_warning(&record, roster);
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                    return None;
                }
                Some(Matched {
                    local_author_count: joint_count(&local_authors),
                    local_authors,
                    record,
                })
            })
            .collect();

        match sort {
            SortKey::CoverDate => matched.sort_by(|a, b| {
                let key = |m: &Matched<R>| {
                    (m.record.sort_date().is_empty(), m.record.sort_date().to_string())
                };
                key(a).cmp(&key(b))
            }),
            SortKey::Title => matched.sort_by_key(|m| normalize_title(m.record.title())),
        }

        (matched, warnings)
    }

    /// Roster indices of local co-authors, in roster order.
    fn match_local_authors<R: Record>(&self, record: &R, roster: &Roster) -> Vec<usize> {
        let author_ids = record.external_author_ids();
        if author_ids.is_empty() {
            roster
                .iter()
                .enumerate()
                .filter(|(_, member)| any_name_matches(member, record.candidate_names()))
                .map(|(index, _)| index)
                .collect()
        } else {
            let mut indices: Vec<usize> = author_ids
                .iter()
                .filter_map(|id| {
                    roster
                        .index_of_scopus_id_str(id)
                        .or_else(|| roster.index_of_openalex_id(id))
                })
                .collect();
            indices.sort_unstable();
            indices.dedup();
            indices
        }
    }
}

fn no_local_authors_warning<R: Record>(record: &R, roster: &Roster) -> Warning {
    let queried = roster.get(record.queried_for());
    // When the queried author's last name does appear among the free-text
    // author names, the record was almost certainly theirs but fetched under
    // an identifier the roster does not know.
    let probable_cause = queried.filter(|member| {
        let last = normalize_cached(&member.last_name);
        record
            .candidate_names()
            .iter()
            .any(|name| normalize_cached(name).contains(&last))
    });
    Warning::NoLocalAuthors {
        title: record.title().to_string(),
        queried_for: queried
            .map(|member| member.display_name())
            .unwrap_or_default(),
        probable_cause: probable_cause.map(|member| member.last_name.clone()),
    }
}

/// Keep only the records whose normalized title is absent from a previous
/// result set. Supports differential reporting against last month's output.
pub fn difference_by_title<R: Record>(
    current: Vec<Matched<R>>,
    previous_titles: &[String],
) -> Vec<Matched<R>> {
    let previous: HashSet<String> = previous_titles
        .iter()
        .map(|title| normalize_title(title))
        .collect();
    current
        .into_iter()
        .filter(|m| !previous.contains(&normalize_title(m.record.title())))
        .collect()
}
