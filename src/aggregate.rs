//! Tabulations for the summary sheet of the output report.
//!
//! Counting conventions follow the report's blank-cell convention throughout:
//! a count that would read zero is rendered as an absent value, so the sheet
//! shows an empty cell instead of a distracting `0`.

use crate::dedupe::{Matched, Record};
use crate::roster::Roster;
use crate::{Patent, Publication, Source, patents};
use compact_str::CompactString;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;

/// Publication count for one subtype: `(total, joint)`. `joint` counts the
/// records with more than one local co-author and is `None` when zero.
pub fn count_by_subtype(
    publications: &[Matched<Publication>],
    subtype: &str,
) -> (usize, Option<usize>) {
    let of_type = publications
        .iter()
        .filter(|m| m.record.subtype == subtype);
    let (total, joint) = of_type.fold((0, 0), |(total, joint), m| {
        (total + 1, joint + usize::from(m.local_author_count.is_some()))
    });
    (total, (joint > 0).then_some(joint))
}

/// Record totals per subtype, for logging what an unfiltered result set held.
pub fn subtype_totals(publications: &[Matched<Publication>]) -> HashMap<CompactString, usize> {
    publications
        .iter()
        .map(|m| CompactString::new(&m.record.subtype))
        .counts()
}

/// Per-roster-member record counts, in roster order. Members with no record
/// get `None`, not zero.
pub fn tabulate_per_author<R: Record>(
    records: &[Matched<R>],
    roster: &Roster,
) -> Vec<Option<usize>> {
    let mut counts = vec![0usize; roster.len()];
    for matched in records {
        for &index in &matched.local_authors {
            if let Some(count) = counts.get_mut(index) {
                *count += 1;
            }
        }
    }
    counts
        .into_iter()
        .map(|count| (count > 0).then_some(count))
        .collect()
}

/// One row of the summary sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
    /// Joint-work count for record-count rows; `None` for header rows and
    /// zero counts.
    pub joint: Option<usize>,
}

impl SummaryRow {
    fn header(label: &str, value: impl ToString) -> Self {
        Self {
            label: label.to_string(),
            value: value.to_string(),
            joint: None,
        }
    }
}

/// The summary sheet: run parameters followed by per-category counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    /// Start a summary with the run-parameter header rows.
    pub fn new(database: Source, author_count: usize, year_first: i32, year_last: i32) -> Self {
        Self {
            rows: vec![
                SummaryRow::header("Base de données", database),
                SummaryRow::header("Nombre de chercheur.e.s", author_count),
                SummaryRow::header("Année de début", year_first),
                SummaryRow::header("Année de fin", year_last),
            ],
        }
    }

    pub fn push_count(&mut self, label: &str, value: usize, joint: Option<usize>) {
        self.rows.push(SummaryRow {
            label: label.to_string(),
            value: value.to_string(),
            joint,
        });
    }

    /// Add one count row per `(subtype code, label)` pair, in the order the
    /// run's configuration listed them.
    pub fn push_publication_counts(
        &mut self,
        publications: &[Matched<Publication>],
        subtypes: &[(String, String)],
    ) {
        for (code, label) in subtypes {
            let (total, joint) = count_by_subtype(publications, code);
            self.push_count(label, total, joint);
        }
    }

    /// Add the granted-patent and pending-application rows for the query
    /// range.
    pub fn push_patent_counts(
        &mut self,
        patents: &[Matched<Patent>],
        year_first: i32,
        year_last: i32,
    ) {
        let count = |keep: &dyn Fn(&Patent) -> bool| {
            let selected = patents.iter().filter(|m| keep(&m.record));
            let (total, joint) = selected.fold((0, 0), |(total, joint), m| {
                (total + 1, joint + usize::from(m.local_author_count.is_some()))
            });
            (total, (joint > 0).then_some(joint))
        };
        let (granted, granted_joint) =
            count(&|p| patents::granted_in_range(p, year_first, year_last));
        self.push_count("Brevets octroyés", granted, granted_joint);
        let (pending, pending_joint) =
            count(&|p| patents::filed_in_range(p, year_first, year_last));
        self.push_count("Demandes de brevet", pending, pending_joint);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RosterMember;
    use crate::PatentStatus;
    use pretty_assertions::assert_eq;

    fn matched(subtype: &str, locals: &[usize]) -> Matched<Publication> {
        Matched {
            record: Publication {
                subtype: subtype.to_string(),
                ..Publication::default()
            },
            local_authors: locals.to_vec(),
            local_author_count: (locals.len() > 1).then_some(locals.len()),
        }
    }

    fn sample_publications() -> Vec<Matched<Publication>> {
        vec![
            matched("ar", &[0]),
            matched("ar", &[0, 1]),
            matched("ar", &[1, 2]),
            matched("cp", &[0]),
            matched("cp", &[2]),
        ]
    }

    #[test]
    fn test_count_by_subtype() {
        let publications = sample_publications();
        assert_eq!(count_by_subtype(&publications, "ar"), (3, Some(2)));
        // No joint conference paper: blank cell, not zero.
        assert_eq!(count_by_subtype(&publications, "cp"), (2, None));
        assert_eq!(count_by_subtype(&publications, "re"), (0, None));
    }

    #[test]
    fn test_subtype_totals() {
        let totals = subtype_totals(&sample_publications());
        assert_eq!(totals.get("ar"), Some(&3));
        assert_eq!(totals.get("cp"), Some(&2));
    }

    #[test]
    fn test_tabulate_per_author() {
        let roster = Roster::new(vec![
            RosterMember::new("Charette", "Paul"),
            RosterMember::new("Hunter", "Ian"),
            RosterMember::new("Doe", "Jane"),
            RosterMember::new("Smith", "Ann"),
        ]);
        let counts = tabulate_per_author(&sample_publications(), &roster);
        assert_eq!(counts, vec![Some(3), Some(2), Some(2), None]);
    }

    #[test]
    fn test_summary_table_rows() {
        let mut table = SummaryTable::new(Source::Scopus, 12, 2020, 2023);
        table.push_publication_counts(
            &sample_publications(),
            &[
                ("ar".to_string(), "Articles".to_string()),
                ("cp".to_string(), "Conf.".to_string()),
            ],
        );

        let expected = [
            ("Base de données", "Scopus", None),
            ("Nombre de chercheur.e.s", "12", None),
            ("Année de début", "2020", None),
            ("Année de fin", "2023", None),
            ("Articles", "3", Some(2)),
            ("Conf.", "2", None),
        ];
        assert_eq!(table.rows.len(), expected.len());
        for (row, (label, value, joint)) in table.rows.iter().zip(expected) {
            assert_eq!(row.label, label);
            assert_eq!(row.value, value);
            assert_eq!(row.joint, joint);
        }
    }

    fn matched_patent(status: PatentStatus, date: &str, locals: &[usize]) -> Matched<Patent> {
        let mut record = Patent {
            status,
            ..Patent::default()
        };
        match status {
            PatentStatus::Granted => record.grant_date = date.to_string(),
            PatentStatus::Pending => record.filing_date = date.to_string(),
        }
        Matched {
            record,
            local_authors: locals.to_vec(),
            local_author_count: (locals.len() > 1).then_some(locals.len()),
        }
    }

    #[test]
    fn test_summary_patent_rows_respect_year_range() {
        let patents = vec![
            matched_patent(PatentStatus::Granted, "2022-09-13", &[0, 1]),
            matched_patent(PatentStatus::Granted, "2012-01-01", &[0]),
            matched_patent(PatentStatus::Pending, "2021-03-01", &[0]),
        ];
        let mut table = SummaryTable::new(Source::Uspto, 2, 2020, 2023);
        table.push_patent_counts(&patents, 2020, 2023);

        let granted = &table.rows[4];
        assert_eq!(granted.label, "Brevets octroyés");
        assert_eq!(granted.value, "1");
        assert_eq!(granted.joint, Some(1));

        let pending = &table.rows[5];
        assert_eq!(pending.label, "Demandes de brevet");
        assert_eq!(pending.value, "1");
        assert_eq!(pending.joint, None);
    }
}
