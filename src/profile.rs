//! Reconciling external author profiles against the roster.
//!
//! The profile search exists to audit the roster itself: for each member the
//! external database is queried for author profiles, and every hit is checked
//! for surname agreement and local affiliation. Discrepancies land in a
//! reviewer-facing "Erreurs" column rather than failing the run, because the
//! usual fix is editing the roster sheet, not the query.

use crate::error::Warning;
use crate::matcher::{LocalAffiliations, ProfileFlag, flag_profile};
use crate::roster::Roster;
use serde::{Deserialize, Serialize};

pub const ERROR_NO_SCOPUS_ID: &str = "Aucun identifiant Scopus";
pub const ERROR_SURNAME_MISMATCH: &str = "Disparité de noms de famille";
pub const ERROR_NON_LOCAL_AFFILIATION: &str = "Affiliation non locale";

/// One author profile returned by an external database, validated at the
/// API-response boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorProfile {
    /// Scopus author ID or OpenAlex author ID, as returned by the source.
    pub external_id: String,
    pub surname: String,
    pub given_name: String,
    /// Current affiliation display name.
    pub affiliation: Option<String>,
    /// Parent institution, when the affiliation is a department or centre.
    pub parent_affiliation: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    /// Publication-activity range, e.g. "2003-2024".
    pub active_range: Option<String>,
    pub document_count: Option<u64>,
}

impl AuthorProfile {
    /// Affiliation text used for the local check: the parent institution when
    /// present (departments rarely carry the institution name), otherwise the
    /// affiliation itself.
    fn affiliation_for_matching(&self) -> Option<&str> {
        self.parent_affiliation
            .as_deref()
            .or(self.affiliation.as_deref())
    }
}

/// One output row: a roster member paired with one profile hit (or none).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub roster_index: usize,
    /// `None` when the search returned no profile for this member.
    pub profile: Option<AuthorProfile>,
    pub flag: Option<ProfileFlag>,
    /// Number of profiles the member's query returned; values above one mean
    /// homonyms (or duplicate profiles) the reviewer must disambiguate.
    pub hit_count: usize,
    /// Reviewer-facing discrepancy summary, `" / "`-joined.
    pub erreurs: Option<String>,
}

/// The reconciled profile report: one row per (member, profile hit) pair in
/// roster order, plus the warnings collected along the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileReport {
    pub rows: Vec<ProfileRow>,
    pub warnings: Vec<Warning>,
}

/// Reconcile per-member profile search results against the roster.
///
/// `hits[i]` holds the profiles returned for roster member `i`; a member with
/// several hits produces several consecutive rows.
pub fn reconcile_profiles(
    roster: &Roster,
    hits: Vec<Vec<AuthorProfile>>,
    local_affiliations: &LocalAffiliations,
) -> ProfileReport {
    debug_assert_eq!(hits.len(), roster.len());

    let mut report = ProfileReport::default();
    for (roster_index, (member, profiles)) in roster.iter().zip(hits).enumerate() {
        let mut member_errors = Vec::new();
        if member.scopus_id.is_none() {
            member_errors.push(ERROR_NO_SCOPUS_ID);
            let warning = Warning::MissingScopusId {
                last_name: member.last_name.clone(),
                first_name: member.first_name.clone(),
            };
            tracing::warn!("{warning}");
            report.warnings.push(warning);
        }

        if profiles.is_empty() {
            report.rows.push(ProfileRow {
                roster_index,
                erreurs: join_errors(&member_errors),
                ..ProfileRow::default()
            });
            continue;
        }

        let hit_count = profiles.len();
        for profile in profiles {
            let mut errors = member_errors.clone();
            let (flag, mismatch) = flag_profile(
                roster,
                &profile.external_id,
                &profile.surname,
                profile.affiliation_for_matching(),
                local_affiliations,
            );
            if let Some(mismatch) = mismatch {
                errors.push(ERROR_SURNAME_MISMATCH);
                report.warnings.push(mismatch);
            }
            let affiliation_local = matches!(
                flag,
                Some(ProfileFlag::AffiliationAndId | ProfileFlag::Affiliation)
            );
            if !affiliation_local {
                errors.push(ERROR_NON_LOCAL_AFFILIATION);
                if let Some(affiliation) = profile.affiliation_for_matching() {
                    let warning = Warning::NonLocalAffiliation {
                        last_name: member.last_name.clone(),
                        first_name: member.first_name.clone(),
                        affiliation: affiliation.to_string(),
                    };
                    tracing::warn!("{warning}");
                    report.warnings.push(warning);
                }
            }
            report.rows.push(ProfileRow {
                roster_index,
                profile: Some(profile),
                flag,
                hit_count,
                erreurs: join_errors(&errors),
            });
        }
    }
    report
}

fn join_errors(errors: &[&str]) -> Option<String> {
    if errors.is_empty() {
        None
    } else {
        Some(errors.join(" / "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::RosterMember;
    use pretty_assertions::assert_eq;

    fn local() -> LocalAffiliations {
        LocalAffiliations::new(["Université de Sherbrooke"])
    }

    fn test_roster() -> Roster {
        Roster::new(vec![
            RosterMember::with_scopus_id("Charette", "Paul", 111),
            RosterMember::new("Hunter", "Ian"),
        ])
    }

    fn profile(id: &str, surname: &str, affiliation: &str) -> AuthorProfile {
        AuthorProfile {
            external_id: id.to_string(),
            surname: surname.to_string(),
            given_name: "X".to_string(),
            affiliation: Some(affiliation.to_string()),
            ..AuthorProfile::default()
        }
    }

    #[test]
    fn test_clean_profile_has_no_errors() {
        let hits = vec![
            vec![profile("111", "Charette", "Université de Sherbrooke")],
            vec![],
        ];
        let report = reconcile_profiles(&test_roster(), hits, &local());
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].flag, Some(ProfileFlag::AffiliationAndId));
        assert_eq!(report.rows[0].erreurs, None);
        assert_eq!(report.rows[0].hit_count, 1);
    }

    #[test]
    fn test_missing_scopus_id_is_reported() {
        let hits = vec![
            vec![profile("111", "Charette", "Université de Sherbrooke")],
            vec![],
        ];
        let report = reconcile_profiles(&test_roster(), hits, &local());
        let hunter = &report.rows[1];
        assert_eq!(hunter.roster_index, 1);
        assert_eq!(hunter.profile, None);
        assert_eq!(hunter.erreurs.as_deref(), Some(ERROR_NO_SCOPUS_ID));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::MissingScopusId { .. })));
    }

    #[test]
    fn test_surname_and_affiliation_discrepancies_combine() {
        let hits = vec![vec![profile("111", "Smith", "MIT")], vec![]];
        let report = reconcile_profiles(&test_roster(), hits, &local());
        assert_eq!(
            report.rows[0].erreurs.as_deref(),
            Some("Disparité de noms de famille / Affiliation non locale")
        );
        assert_eq!(report.rows[0].flag, None);
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::SurnameMismatch { .. })));
        assert!(report
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::NonLocalAffiliation { .. })));
    }

    #[test]
    fn test_parent_affiliation_is_preferred_for_matching() {
        let mut departmental = profile("111", "Charette", "Département de génie électrique");
        departmental.parent_affiliation = Some("Université de Sherbrooke".to_string());
        let report = reconcile_profiles(&test_roster(), vec![vec![departmental], vec![]], &local());
        assert_eq!(report.rows[0].flag, Some(ProfileFlag::AffiliationAndId));
        assert_eq!(report.rows[0].erreurs, None);
    }

    #[test]
    fn test_homonyms_produce_one_row_each() {
        let hits = vec![
            vec![
                profile("111", "Charette", "Université de Sherbrooke"),
                profile("9999", "Charette", "Université Laval"),
            ],
            vec![],
        ];
        let report = reconcile_profiles(&test_roster(), hits, &local());
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.rows[0].hit_count, 2);
        assert_eq!(report.rows[1].hit_count, 2);
        // The homonym matches neither the known ID nor a local affiliation.
        assert_eq!(
            report.rows[1].erreurs.as_deref(),
            Some(ERROR_NON_LOCAL_AFFILIATION)
        );
    }
}
