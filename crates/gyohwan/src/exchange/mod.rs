//! Partner-university catalog, application ledger, ranking, and the
//! application-update transaction.

pub mod choices;
pub mod domain;
pub mod memory;
pub mod ranking;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use choices::{accept_submission, ChoiceViolation, SubmittedChoice};
pub use domain::{
    ApplicantRow, Application, ApplicationChoice, ApplicationId, EnrichedApplication, NewUser,
    University, UniversityId, User, UserId, MAX_CHOICES,
};
pub use memory::{MemoryExchangeStore, MemoryTransaction};
pub use ranking::{rank_applicants, RankedApplicant, RankingEngine};
pub use repository::{
    ApplicationLedger, ExchangeStore, LedgerTransaction, RepositoryError, UniversityCatalog,
    UserDirectory,
};
pub use router::{exchange_router, LoginRequest, UpdateApplicationsRequest};
pub use service::{ExchangeService, ExchangeServiceError};
pub use views::{
    ApplicantView, ApplicationDetailView, IdentitySummary, PrivateProfileView, PublicProfileView,
    SessionView, UniversityDetailView, UniversitySummaryView,
};
