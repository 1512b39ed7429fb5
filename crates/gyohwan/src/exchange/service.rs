use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{bearer_token, TokenError, TokenService};
use crate::config::ExchangePolicy;

use super::choices::{check_structure, ChoiceViolation};
use super::domain::{ApplicationChoice, EnrichedApplication, NewUser, UniversityId, User, UserId};
use super::ranking::RankingEngine;
use super::repository::{ExchangeStore, LedgerTransaction, RepositoryError};
use super::views::{
    ApplicantView, ApplicationDetailView, IdentitySummary, PrivateProfileView, PublicProfileView,
    SessionView, UniversityDetailView, UniversitySummaryView,
};

/// Service composing the store, the token issuer, and the ranking queries.
pub struct ExchangeService<S, T> {
    store: Arc<S>,
    tokens: Arc<T>,
    ranking: RankingEngine<S>,
    policy: ExchangePolicy,
}

impl<S, T> ExchangeService<S, T>
where
    S: ExchangeStore + 'static,
    T: TokenService + 'static,
{
    pub fn new(store: Arc<S>, tokens: Arc<T>, policy: ExchangePolicy) -> Self {
        let ranking = RankingEngine::new(store.clone());
        Self {
            store,
            tokens,
            ranking,
            policy,
        }
    }

    pub fn ranking(&self) -> &RankingEngine<S> {
        &self.ranking
    }

    /// Exchange a pre-issued UUID for a bearer token.
    pub fn login(&self, uuid: &str) -> Result<SessionView, ExchangeServiceError> {
        let user = self
            .store
            .find_by_uuid(uuid.trim())?
            .ok_or(ExchangeServiceError::UnknownIdentity)?;
        let access_token = self.tokens.issue(&user.uuid)?;
        info!(user_id = %user.id, "session issued");

        Ok(SessionView {
            access_token,
            token_type: "bearer",
            user: IdentitySummary {
                id: user.id,
                nickname: user.nickname,
            },
        })
    }

    /// Resolve an `Authorization` header to the student it was issued for.
    ///
    /// Every credential problem collapses into `Unauthenticated`.
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<User, ExchangeServiceError> {
        let token = bearer_token(authorization).ok_or(ExchangeServiceError::Unauthenticated)?;
        let subject = self.tokens.verify(token).map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            ExchangeServiceError::Unauthenticated
        })?;

        self.store
            .find_by_uuid(&subject)?
            .ok_or(ExchangeServiceError::Unauthenticated)
    }

    pub fn register(&self, user: NewUser) -> Result<PrivateProfileView, ExchangeServiceError> {
        let user = self.store.register(user, self.policy.modify_quota)?;
        info!(user_id = %user.id, "student registered");
        self.private_view(user)
    }

    pub fn profile(&self, user_id: UserId) -> Result<PrivateProfileView, ExchangeServiceError> {
        let user = self.user(user_id)?;
        self.private_view(user)
    }

    pub fn public_profile(
        &self,
        user_id: UserId,
    ) -> Result<PublicProfileView, ExchangeServiceError> {
        let user = self.user(user_id)?;
        let applications = self.application_details(user.id)?;
        Ok(PublicProfileView {
            id: user.id,
            nickname: user.nickname,
            grade: user.grade,
            lang: user.lang,
            applications,
        })
    }

    /// Replace every application of the student and spend one modification.
    ///
    /// Checks run in a fixed order: list length, rank sequence, repeated
    /// universities, catalog membership, then the remaining budget. Nothing is
    /// written unless all of them pass.
    ///
    /// The returned profile is the state this update committed; only the
    /// applicant totals are read afterwards and may include later writers.
    pub fn update_applications(
        &self,
        user_id: UserId,
        choices: Vec<ApplicationChoice>,
    ) -> Result<PrivateProfileView, ExchangeServiceError> {
        let (user, rows) = match self.replace_applications(user_id, &choices) {
            Ok(committed) => committed,
            Err(err) => {
                warn!(user_id = %user_id, error = %err, "application update rejected");
                return Err(err);
            }
        };
        info!(
            user_id = %user_id,
            choices = rows.len(),
            remaining = user.modify_count,
            "applications replaced"
        );

        let applications = self.detail_views(rows)?;
        Ok(private_profile(user, applications))
    }

    fn replace_applications(
        &self,
        user_id: UserId,
        choices: &[ApplicationChoice],
    ) -> Result<(User, Vec<EnrichedApplication>), ExchangeServiceError> {
        check_structure(choices)?;
        let mut rows = Vec::with_capacity(choices.len());
        for choice in choices {
            let university = self
                .store
                .lookup(choice.university_id)?
                .ok_or(ChoiceViolation::UnknownUniversity(choice.university_id))?;
            rows.push(EnrichedApplication {
                choice: choice.choice,
                university,
            });
        }
        rows.sort_by_key(|row| row.choice);

        let mut transaction = self.store.begin(user_id).map_err(|err| match err {
            RepositoryError::NotFound => ExchangeServiceError::UserNotFound(user_id),
            other => other.into(),
        })?;
        if transaction.user().modify_count == 0 {
            return Err(ExchangeServiceError::BudgetExhausted);
        }

        transaction.replace_for_user(choices)?;
        transaction.decrement_budget()?;
        let user = transaction.user().clone();
        transaction.commit()?;
        Ok((user, rows))
    }

    /// Every catalog entry with its current applicant count.
    pub fn universities(&self) -> Result<Vec<UniversitySummaryView>, ExchangeServiceError> {
        let universities = self.store.list_all()?;
        let ids: BTreeSet<UniversityId> = universities.iter().map(|u| u.id).collect();
        let counts = self.ranking.applicant_counts(&ids)?;

        Ok(universities
            .into_iter()
            .map(|university| UniversitySummaryView {
                applicant_count: counts.get(&university.id).copied().unwrap_or(0),
                id: university.id,
                name: university.name,
                country: university.country,
                slot: university.slot,
            })
            .collect())
    }

    /// Roster of a university ranked by grade.
    pub fn university_detail(
        &self,
        requester: &User,
        university_id: UniversityId,
    ) -> Result<UniversityDetailView, ExchangeServiceError> {
        let university = self
            .store
            .lookup(university_id)?
            .ok_or(ExchangeServiceError::UniversityNotFound(university_id))?;
        let ranked = self.ranking.applicants_for(university_id)?;

        if self.policy.detail_requires_application
            && !ranked.iter().any(|entry| entry.user_id == requester.id)
        {
            return Err(ExchangeServiceError::AccessDenied(university_id));
        }

        let applicants: Vec<ApplicantView> = ranked
            .into_iter()
            .map(|entry| ApplicantView {
                id: entry.user_id,
                rank: entry.rank,
                choice: entry.choice,
                nickname: entry.nickname,
                grade: entry.grade,
                lang: entry.lang,
            })
            .collect();

        Ok(UniversityDetailView {
            name: university.name,
            country: university.country,
            slot: university.slot,
            total_applicants: applicants.len() as u64,
            applicants,
        })
    }

    fn user(&self, user_id: UserId) -> Result<User, ExchangeServiceError> {
        self.store
            .find(user_id)?
            .ok_or(ExchangeServiceError::UserNotFound(user_id))
    }

    fn private_view(&self, user: User) -> Result<PrivateProfileView, ExchangeServiceError> {
        let applications = self.application_details(user.id)?;
        Ok(private_profile(user, applications))
    }

    fn application_details(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ApplicationDetailView>, ExchangeServiceError> {
        let rows = self.store.applications_for(user_id)?;
        self.detail_views(rows)
    }

    fn detail_views(
        &self,
        rows: Vec<EnrichedApplication>,
    ) -> Result<Vec<ApplicationDetailView>, ExchangeServiceError> {
        let ids: BTreeSet<UniversityId> = rows.iter().map(|row| row.university.id).collect();
        let counts = self.ranking.applicant_counts(&ids)?;

        Ok(rows
            .into_iter()
            .map(|row| ApplicationDetailView {
                choice: row.choice,
                total_applicants: counts.get(&row.university.id).copied().unwrap_or(0),
                university_id: row.university.id,
                university_name: row.university.name,
                country: row.university.country,
                slot: row.university.slot,
            })
            .collect())
    }
}

fn private_profile(user: User, applications: Vec<ApplicationDetailView>) -> PrivateProfileView {
    PrivateProfileView {
        id: user.id,
        email: user.email,
        nickname: user.nickname,
        grade: user.grade,
        lang: user.lang,
        modify_count: user.modify_count,
        applications,
    }
}

/// Error raised by the exchange service.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeServiceError {
    #[error(transparent)]
    Validation(#[from] ChoiceViolation),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("no modifications remain for this account")]
    BudgetExhausted,
    #[error("no student is registered with that identifier")]
    UnknownIdentity,
    #[error("user {0} not found")]
    UserNotFound(UserId),
    #[error("university {0} not found")]
    UniversityNotFound(UniversityId),
    #[error("not authenticated")]
    Unauthenticated,
    #[error("applicants of university {0} are only visible to students who applied")]
    AccessDenied(UniversityId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Token(#[from] TokenError),
}
