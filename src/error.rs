//! Error and warning types for reference-search reconciliation.
//!
//! Failures follow a two-tier taxonomy: anything that would corrupt the
//! meaning of the output (bad year range, invalid search kind, unreadable
//! input) is a [`SearchError`] and aborts the run; anything that only affects
//! the completeness of one row (a missing ID, a non-local affiliation) is a
//! [`Warning`], collected and surfaced in the output for a human reviewer.
//!
//! Library code never terminates the process; errors propagate to a single
//! top-level handler that decides exit code and message.

use serde::Serialize;
use thiserror::Error;

/// Fatal errors: configuration problems detected before any external query,
/// and external-service failures with no recovery path.
///
/// User-facing diagnostics are in French, matching the rest of the report.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("'{0}' est un type de recherche invalide, doit être 'Publications' ou 'Profils'")]
    InvalidSearchKind(String),

    #[error(
        "L'année de début de recherche ({first}) doit être antérieure \
         à l'année de fin de recherche ({last})"
    )]
    InvalidYearRange { first: i32, last: i32 },

    #[error(
        "L'intervalle de recherche [{first}-{last}] dépasse l'étendue \
         des données du fichier d'entrée"
    )]
    YearRangeOutsideRosterData { first: i32, last: i32 },

    #[error("Aucun membre régulier n'a été trouvé pour la période de recherche [{first}-{last}]")]
    EmptyRoster { first: i32, last: i32 },

    #[error("Le fichier d'entrée est vide")]
    EmptyInput,

    #[error("Colonne requise absente du fichier d'entrée: '{0}'")]
    MissingColumn(&'static str),

    #[error("recherche Scopus avec paramètres 'publication_types' OpenAlex")]
    PublicationTypeMismatch,

    #[error("'{0}' est une base de données invalide, doit être 'Scopus' ou 'OpenAlex'")]
    InvalidDatabase(String),

    /// Scopus errors are fatal without retry: they usually indicate a
    /// systemic problem (unknown ID, or access outside the university
    /// network where a VPN is required).
    #[error(
        "Erreur dans la recherche Scopus pour '{last_name}, {first_name}' - {message} - \
         causes possibles: identifiant Scopus inconnu ou accès hors du réseau \
         universitaire (VPN requis)"
    )]
    ScopusUnavailable {
        last_name: String,
        first_name: String,
        message: String,
    },

    /// Patent searches are retried with a fixed delay before giving up;
    /// this is the post-cap diagnostic.
    #[error(
        "Recherche de brevets interrompue pour '{last_name}, {first_name}' \
         après {attempts} tentatives - cause probable: limitation de débit"
    )]
    PatentSearchExhausted {
        last_name: String,
        first_name: String,
        attempts: u32,
    },

    #[error(
        "Impossible d'extraire la date du fichier de résultats '{0}', \
         qui doit être en format '<filename>YYYYMMDD.xlsx'"
    )]
    UndatedResultsFile(String),

    #[error("Erreur de configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Non-fatal data-quality findings.
///
/// The run completes despite these; they are logged as they occur and
/// rendered into a reviewer-facing "Erreurs" column of the output.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// An author-scoped query returned a record in which no roster member
    /// matched. `probable_cause` names the roster member whose last name
    /// does appear in the free-text author list, if any (the usual culprit
    /// is an author with more than one Scopus ID).
    #[error(
        "Le document '{title}' n'a pas d'auteur.e local.e dans la liste d'auteur.e.s{}",
        probable_cause.as_deref().map(|a| format!(
            " - cause probable: l'auteur.e '{a}' a plus d'un identifiant Scopus")).unwrap_or_default()
    )]
    NoLocalAuthors {
        title: String,
        /// Last name of the roster member whose query fetched the record.
        queried_for: String,
        probable_cause: Option<String>,
    },

    #[error("L'auteur.e '{last_name}, {first_name}' n'a pas d'identifiant Scopus")]
    MissingScopusId {
        last_name: String,
        first_name: String,
    },

    #[error(
        "Identifiant {external_id}: le nom de famille '{roster_last_name}' \
         diffère de '{profile_last_name}' dans la base de données externe"
    )]
    SurnameMismatch {
        external_id: String,
        roster_last_name: String,
        profile_last_name: String,
    },

    #[error("L'affiliation '{affiliation}' de '{last_name}, {first_name}' est non locale")]
    NonLocalAffiliation {
        last_name: String,
        first_name: String,
        affiliation: String,
    },

    #[error("Identifiant externe invalide '{value}' pour '{last_name}, {first_name}'")]
    InvalidExternalId {
        last_name: String,
        first_name: String,
        value: String,
    },

    #[error("Les résultats du fichier '{file}' ont plus de {age_days} jours")]
    StaleResultsFile { file: String, age_days: i64 },
}
