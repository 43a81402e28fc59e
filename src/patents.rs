//! Patent-specific post-processing shared by the USPTO and INPADOC paths.
//!
//! Patent office APIs cannot filter on the criteria the report needs (inventor
//! country, grant-vs-application overlap, family jurisdiction), so results are
//! fetched wide and narrowed here. Dates are ISO-8601 strings and compare
//! lexicographically.

use crate::error::SearchError;
use crate::roster::RosterMember;
use crate::{Patent, PatentStatus, Source};
use std::collections::HashSet;
use std::time::Duration;

/// Jurisdictions whose family members are considered when picking the
/// representative filing and grant of an INPADOC family.
const FAMILY_JURISDICTIONS: [&str; 3] = ["US", "CA", "WO"];

/// True iff any inventor string carries the Canadian country tag.
///
/// Inventor names are formatted "First Last (CC)"; roster authors work in
/// Canada, so a family with no Canadian inventor cannot be theirs even if a
/// name matched.
pub fn has_canadian_inventor(patent: &Patent) -> bool {
    patent.inventors.iter().any(|name| name.contains("(CA)"))
}

/// Drop patents with no Canadian inventor.
pub fn retain_canadian(patents: Vec<Patent>) -> Vec<Patent> {
    patents.into_iter().filter(has_canadian_inventor).collect()
}

/// Drop pending applications superseded by a granted patent.
///
/// USPTO grant and application searches run separately and both return rows
/// for a granted patent; the grant row is authoritative.
pub fn remove_granted_applications(patents: Vec<Patent>) -> Vec<Patent> {
    let granted: HashSet<String> = patents
        .iter()
        .filter(|p| p.status == PatentStatus::Granted)
        .map(|p| p.application_id.clone())
        .collect();
    patents
        .into_iter()
        .filter(|p| {
            p.status == PatentStatus::Granted || !granted.contains(&p.application_id)
        })
        .collect()
}

/// One publication event inside an INPADOC patent family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyMember {
    /// Document number, e.g. "US11223344" or "WO2021123456".
    pub number: String,
    /// Kind code, e.g. "A1" (application) or "B2" (grant).
    pub kind: String,
    /// ISO-8601 publication date.
    pub date: String,
}

impl FamilyMember {
    fn jurisdiction(&self) -> &str {
        self.number.get(..2).unwrap_or_default()
    }

    /// Grant kinds are `B*` (US, WO) and `C*` (CA re-examined grants).
    fn is_grant(&self) -> bool {
        self.kind.starts_with('B') || self.kind.starts_with('C')
    }
}

/// Representative filing and grant events of one INPADOC family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyDates {
    /// Earliest application in a relevant jurisdiction, preferring the WO
    /// (PCT) filing on equal dates.
    pub application: Option<FamilyMember>,
    /// Earliest grant in a relevant jurisdiction.
    pub grant: Option<FamilyMember>,
}

/// Reduce an INPADOC family to its representative application and grant.
///
/// Only US, CA, and WO members are considered; other jurisdictions duplicate
/// the same invention under filing rules the report does not track.
pub fn family_dates(members: &[FamilyMember]) -> FamilyDates {
    let relevant: Vec<&FamilyMember> = members
        .iter()
        .filter(|m| FAMILY_JURISDICTIONS.contains(&m.jurisdiction()))
        .filter(|m| !m.date.is_empty())
        .collect();

    let application = relevant
        .iter()
        .filter(|m| !m.is_grant())
        .min_by_key(|m| {
            // WO wins ties: the PCT filing is the family's canonical start.
            (m.date.as_str(), m.jurisdiction() != "WO")
        })
        .map(|&m| m.clone());
    let grant = relevant
        .iter()
        .filter(|m| m.is_grant())
        .min_by_key(|m| m.date.as_str())
        .map(|&m| m.clone());

    FamilyDates { application, grant }
}

/// Convert an INPADOC family into one report record, or `None` when the
/// family has no member in a relevant jurisdiction.
pub fn family_to_patent(
    family_id: &str,
    title: &str,
    inventors: Vec<String>,
    members: &[FamilyMember],
    queried_for: usize,
) -> Option<Patent> {
    let dates = family_dates(members);
    let application = dates.application.as_ref();
    let grant = dates.grant.as_ref();
    if application.is_none() && grant.is_none() {
        return None;
    }
    Some(Patent {
        application_id: family_id.to_string(),
        title: title.to_string(),
        filing_date: application.map(|m| m.date.clone()).unwrap_or_default(),
        grant_date: grant.map(|m| m.date.clone()).unwrap_or_default(),
        inventors,
        assignees: Vec::new(),
        status: if grant.is_some() {
            PatentStatus::Granted
        } else {
            PatentStatus::Pending
        },
        source: Source::Inpadoc,
        queried_for,
    })
}

/// True iff the ISO date falls within the inclusive year range. Empty dates
/// never match.
pub fn date_in_year_range(date: &str, year_first: i32, year_last: i32) -> bool {
    !date.is_empty()
        && date >= format!("{year_first}-01-01").as_str()
        && date <= format!("{year_last}-12-31").as_str()
}

/// Report filter for granted patents: granted within the query years.
pub fn granted_in_range(patent: &Patent, year_first: i32, year_last: i32) -> bool {
    patent.status == PatentStatus::Granted
        && date_in_year_range(&patent.grant_date, year_first, year_last)
}

/// Report filter for pending applications: filed within the query years.
pub fn filed_in_range(patent: &Patent, year_first: i32, year_last: i32) -> bool {
    patent.status == PatentStatus::Pending
        && date_in_year_range(&patent.filing_date, year_first, year_last)
}

/// Retry policy for patent searches: patent office APIs rate-limit
/// aggressively but recover after a short fixed delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Run `operation` up to `max_attempts` times, sleeping `delay` between
    /// attempts, and surface the last error once the cap is reached.
    pub fn run<T, E>(&self, mut operation: impl FnMut() -> Result<T, E>) -> Result<T, E> {
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) if attempt >= self.max_attempts => return Err(error),
                Err(_) => {
                    tracing::warn!(attempt, "recherche de brevets échouée, nouvelle tentative");
                    std::thread::sleep(self.delay);
                    attempt += 1;
                }
            }
        }
    }

    /// [`run`](Self::run) for one author's patent search, converting
    /// exhaustion into [`SearchError::PatentSearchExhausted`] with the
    /// author's name in the diagnostic.
    pub fn run_for_member<T, E>(
        &self,
        member: &RosterMember,
        operation: impl FnMut() -> Result<T, E>,
    ) -> Result<T, SearchError> {
        self.run(operation).map_err(|_| SearchError::PatentSearchExhausted {
            last_name: member.last_name.clone(),
            first_name: member.first_name.clone(),
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn patent(id: &str, status: PatentStatus, inventors: &[&str]) -> Patent {
        Patent {
            application_id: id.to_string(),
            title: format!("Patent {id}"),
            inventors: inventors.iter().map(|s| s.to_string()).collect(),
            status,
            ..Patent::default()
        }
    }

    #[test]
    fn test_canadian_inventor_filter() {
        let patents = vec![
            patent("1", PatentStatus::Pending, &["Paul Charette (CA)", "Jane Doe (US)"]),
            patent("2", PatentStatus::Pending, &["John Smith (US)"]),
            patent("3", PatentStatus::Pending, &[]),
        ];
        let kept = retain_canadian(patents);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].application_id, "1");
    }

    #[test]
    fn test_granted_patent_supersedes_application() {
        let patents = vec![
            patent("17123456", PatentStatus::Pending, &[]),
            patent("17123456", PatentStatus::Granted, &[]),
            patent("17999999", PatentStatus::Pending, &[]),
        ];
        let kept = remove_granted_applications(patents);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].status, PatentStatus::Granted);
        assert_eq!(kept[1].application_id, "17999999");
    }

    fn member(number: &str, kind: &str, date: &str) -> FamilyMember {
        FamilyMember {
            number: number.to_string(),
            kind: kind.to_string(),
            date: date.to_string(),
        }
    }

    #[test]
    fn test_family_dates_picks_earliest_relevant_members() {
        let members = vec![
            member("EP3456789", "A1", "2019-01-01"),
            member("US16123456", "A1", "2020-05-01"),
            member("WO2020123456", "A1", "2020-02-01"),
            member("US11223344", "B2", "2022-09-13"),
            member("CA3098765", "C", "2023-01-10"),
        ];
        let dates = family_dates(&members);
        // The EP member is earlier but out of jurisdiction.
        assert_eq!(dates.application.unwrap().number, "WO2020123456");
        assert_eq!(dates.grant.unwrap().number, "US11223344");
    }

    #[test]
    fn test_family_dates_wo_wins_application_tie() {
        let members = vec![
            member("US16123456", "A1", "2020-02-01"),
            member("WO2020123456", "A1", "2020-02-01"),
        ];
        let dates = family_dates(&members);
        assert_eq!(dates.application.unwrap().number, "WO2020123456");
        assert_eq!(dates.grant, None);
    }

    #[test]
    fn test_family_to_patent() {
        let members = vec![
            member("WO2020123456", "A1", "2020-02-01"),
            member("US11223344", "B2", "2022-09-13"),
        ];
        let p = family_to_patent(
            "F123",
            "Optical Sensor",
            vec!["Paul Charette (CA)".to_string()],
            &members,
            0,
        )
        .unwrap();
        assert_eq!(p.filing_date, "2020-02-01");
        assert_eq!(p.grant_date, "2022-09-13");
        assert_eq!(p.status, PatentStatus::Granted);
        assert_eq!(p.source, Source::Inpadoc);

        let irrelevant = vec![member("EP3456789", "A1", "2019-01-01")];
        assert!(family_to_patent("F124", "T", vec![], &irrelevant, 0).is_none());
    }

    #[rstest]
    #[case("2021-06-15", 2020, 2023, true)]
    #[case("2020-01-01", 2020, 2023, true)]
    #[case("2023-12-31", 2020, 2023, true)]
    #[case("2019-12-31", 2020, 2023, false)]
    #[case("2024-01-01", 2020, 2023, false)]
    #[case("", 2020, 2023, false)]
    fn test_date_in_year_range(
        #[case] date: &str,
        #[case] first: i32,
        #[case] last: i32,
        #[case] expected: bool,
    ) {
        assert_eq!(date_in_year_range(date, first, last), expected);
    }

    #[test]
    fn test_range_filters_respect_status() {
        let mut granted = patent("1", PatentStatus::Granted, &[]);
        granted.grant_date = "2022-09-13".to_string();
        granted.filing_date = "2020-02-01".to_string();
        assert!(granted_in_range(&granted, 2022, 2023));
        assert!(!granted_in_range(&granted, 2018, 2019));
        // A granted patent is never reported as a pending filing.
        assert!(!filed_in_range(&granted, 2020, 2023));

        let mut pending = patent("2", PatentStatus::Pending, &[]);
        pending.filing_date = "2021-03-01".to_string();
        assert!(filed_in_range(&pending, 2021, 2021));
        assert!(!granted_in_range(&pending, 2021, 2021));
    }

    #[test]
    fn test_retry_policy_retries_until_success() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::ZERO,
        };
        let mut calls = 0;
        let result: Result<u32, &str> = policy.run(|| {
            calls += 1;
            if calls < 3 { Err("rate limited") } else { Ok(42) }
        });
        assert_eq!(result, Ok(42));
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_retry_for_member_reports_exhaustion() {
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::ZERO,
        };
        let member = crate::roster::RosterMember::new("Charette", "Paul");
        let result: Result<u32, SearchError> =
            policy.run_for_member(&member, || Err::<u32, _>("rate limited"));
        match result {
            Err(SearchError::PatentSearchExhausted {
                last_name,
                attempts,
                ..
            }) => {
                assert_eq!(last_name, "Charette");
                assert_eq!(attempts, 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_retry_policy_gives_up_after_cap() {
        let policy = RetryPolicy {
            max_attempts: 2,
            delay: Duration::ZERO,
        };
        let mut calls = 0;
        let result: Result<u32, &str> = policy.run(|| {
            calls += 1;
            Err("rate limited")
        });
        assert_eq!(result, Err("rate limited"));
        assert_eq!(calls, 2);
    }
}
