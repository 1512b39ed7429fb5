use std::collections::{BTreeMap, BTreeSet};

use super::domain::{
    ApplicantRow, ApplicationChoice, EnrichedApplication, NewUser, University, UniversityId, User,
    UserId,
};

/// Read-only registry of partner universities.
pub trait UniversityCatalog: Send + Sync {
    fn lookup(&self, id: UniversityId) -> Result<Option<University>, RepositoryError>;
    /// Every catalog entry, ordered by id.
    fn list_all(&self) -> Result<Vec<University>, RepositoryError>;
}

/// Student accounts keyed by internal id and by issued UUID.
pub trait UserDirectory: Send + Sync {
    fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>, RepositoryError>;
    /// Fails with `Conflict` when the email or UUID is already registered.
    fn register(&self, user: NewUser, modify_quota: u32) -> Result<User, RepositoryError>;
}

/// Application records plus the joins the ranking and profile views need.
///
/// Reads only ever observe committed state.
pub trait ApplicationLedger: Send + Sync {
    type Transaction<'a>: LedgerTransaction
    where
        Self: 'a;

    /// Application × university rows for one student, ordered by choice.
    fn applications_for(&self, user_id: UserId)
        -> Result<Vec<EnrichedApplication>, RepositoryError>;

    /// User × application rows for one university in insertion order.
    fn applicants_for(&self, university_id: UniversityId)
        -> Result<Vec<ApplicantRow>, RepositoryError>;

    /// Sparse: universities without applications are absent from the map.
    fn applicant_counts(
        &self,
        university_ids: &BTreeSet<UniversityId>,
    ) -> Result<BTreeMap<UniversityId, u64>, RepositoryError>;

    /// Open a write transaction holding the user's row lock until commit or drop.
    fn begin(&self, user_id: UserId) -> Result<Self::Transaction<'_>, RepositoryError>;
}

/// Write half of the ledger. Dropping without `commit` rolls everything back.
pub trait LedgerTransaction {
    /// The user row as locked at `begin`, including staged changes.
    fn user(&self) -> &User;
    /// Discard every application of the locked user and stage `choices` in their place.
    fn replace_for_user(&mut self, choices: &[ApplicationChoice]) -> Result<(), RepositoryError>;
    /// Stage a one-step budget decrement and return the new remaining budget.
    fn decrement_budget(&mut self) -> Result<u32, RepositoryError>;
    fn commit(self) -> Result<(), RepositoryError>;
}

/// Everything the exchange service needs from persistence.
pub trait ExchangeStore: UniversityCatalog + UserDirectory + ApplicationLedger {}

impl<T> ExchangeStore for T where T: UniversityCatalog + UserDirectory + ApplicationLedger {}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
