//! Deciding whether free-text names, identifiers, and affiliation strings
//! correspond to roster members.
//!
//! Name matching is deliberately substring-based (not exact) so that middle
//! initials, suffixes, and formatting differences still match; the cost is
//! possible false positives on short names ("Li" inside "Lima"). This
//! tolerance is a documented property of the system, not a bug.

use crate::Warning;
use crate::normalize::{normalize, normalize_cached};
use crate::roster::{Roster, RosterMember};
use serde::{Deserialize, Serialize};

/// True iff both the normalized last name and the normalized first name are
/// substrings of the normalized candidate text.
///
/// # Examples
///
/// ```
/// use refsearch::matcher::name_matches;
///
/// assert!(name_matches("Charette", "Paul", "Paul Charette (CA)"));
/// assert!(name_matches("Charette", "P", "P. Charette (CA)"));
/// // Misspellings do not match: substring, not fuzzy distance.
/// assert!(!name_matches("Charette", "Paul", "Paul Charrette"));
/// ```
pub fn name_matches(last_name: &str, first_name: &str, candidate: &str) -> bool {
    let candidate = normalize_cached(candidate);
    candidate.contains(&normalize_cached(last_name))
        && candidate.contains(&normalize_cached(first_name))
}

/// True iff any candidate name in the list matches the member.
pub fn any_name_matches(member: &RosterMember, candidates: &[String]) -> bool {
    candidates
        .iter()
        .any(|candidate| name_matches(&member.last_name, &member.first_name, candidate))
}

/// The list of local-affiliation names to match against, pre-normalized once
/// at configuration load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalAffiliations(Vec<String>);

impl LocalAffiliations {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(names.into_iter().map(|s| normalize(s.as_ref())).collect())
    }

    /// True iff any local-affiliation name is a substring of the normalized
    /// affiliation text.
    pub fn matches(&self, affiliation: &str) -> bool {
        let affiliation = normalize_cached(affiliation);
        self.0.iter().any(|name| affiliation.contains(name))
    }

    /// True iff any of the given affiliation strings matches.
    pub fn matches_any(&self, affiliations: &[String]) -> bool {
        affiliations.iter().any(|a| self.matches(a))
    }
}

/// Which of the affiliation-match and ID-match checks succeeded for an
/// author-profile row. Reviewer-facing only; no control flow depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileFlag {
    AffiliationAndId,
    Affiliation,
    Id,
}

impl ProfileFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileFlag::AffiliationAndId => "Affl. + ID",
            ProfileFlag::Affiliation => "Affl.",
            ProfileFlag::Id => "ID",
        }
    }

    fn from_checks(affiliation_match: bool, id_match: bool) -> Option<Self> {
        match (affiliation_match, id_match) {
            (true, true) => Some(ProfileFlag::AffiliationAndId),
            (true, false) => Some(ProfileFlag::Affiliation),
            (false, true) => Some(ProfileFlag::Id),
            (false, false) => None,
        }
    }
}

impl std::fmt::Display for ProfileFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flag one external author-profile row against the roster.
///
/// The ID check is an exact map lookup cross-checked against the profile
/// surname: an ID hit whose surname does not match the roster member does
/// not count as an ID match, and produces a [`Warning::SurnameMismatch`]
/// rather than being silently trusted.
pub fn flag_profile(
    roster: &Roster,
    profile_id: &str,
    profile_surname: &str,
    profile_affiliation: Option<&str>,
    local_affiliations: &LocalAffiliations,
) -> (Option<ProfileFlag>, Option<Warning>) {
    let affiliation_match = profile_affiliation
        .is_some_and(|affiliation| local_affiliations.matches(affiliation));

    let roster_index = roster
        .index_of_scopus_id_str(profile_id)
        .or_else(|| roster.index_of_openalex_id(profile_id));
    let mut warning = None;
    let id_match = match roster_index.and_then(|index| roster.get(index)) {
        Some(member) => {
            let surnames_agree = normalize_cached(&member.last_name)
                == normalize_cached(profile_surname);
            if !surnames_agree {
                let mismatch = Warning::SurnameMismatch {
                    external_id: profile_id.to_string(),
                    roster_last_name: member.last_name.clone(),
                    profile_last_name: profile_surname.to_string(),
                };
                tracing::warn!("{mismatch}");
                warning = Some(mismatch);
            }
            surnames_agree
        }
        None => false,
    };

    (ProfileFlag::from_checks(affiliation_match, id_match), warning)
}
