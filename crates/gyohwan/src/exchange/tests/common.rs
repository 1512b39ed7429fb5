use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::auth::JwtTokenService;
use crate::config::{AuthConfig, ExchangePolicy};
use crate::exchange::domain::{
    ApplicantRow, ApplicationChoice, EnrichedApplication, NewUser, University, UniversityId, User,
    UserId,
};
use crate::exchange::memory::{MemoryExchangeStore, MemoryTransaction};
use crate::exchange::repository::{
    ApplicationLedger, LedgerTransaction, RepositoryError, UniversityCatalog, UserDirectory,
};
use crate::exchange::service::ExchangeService;

pub(super) type MemoryService = ExchangeService<MemoryExchangeStore, JwtTokenService>;

pub(super) fn university(id: u32, name: &str, country: &str, slot: u32) -> University {
    University {
        id: UniversityId(id),
        name: name.to_string(),
        country: country.to_string(),
        slot,
        duration: "1 semester".to_string(),
    }
}

pub(super) fn catalog() -> Vec<University> {
    vec![
        university(3, "University of Tsukuba", "Japan", 2),
        university(7, "Uppsala University", "Sweden", 1),
        university(9, "University of Leeds", "United Kingdom", 3),
        university(12, "National Taiwan University", "Taiwan", 2),
        university(15, "University of Helsinki", "Finland", 1),
        university(21, "Monash University", "Australia", 4),
    ]
}

pub(super) fn student(tag: &str, grade: f64) -> NewUser {
    NewUser {
        email: format!("{tag}@knu.ac.kr"),
        uuid: format!("00000000-0000-4000-8000-{tag:0>12}"),
        nickname: Some(tag.to_string()),
        grade,
        lang: "TOEIC 900".to_string(),
    }
}

pub(super) fn tokens() -> Arc<JwtTokenService> {
    Arc::new(JwtTokenService::new(&AuthConfig {
        token_secret: "test-secret".to_string(),
        token_ttl_minutes: 60,
    })
    .expect("valid token lifetime"))
}

pub(super) fn build_service(policy: ExchangePolicy) -> (Arc<MemoryService>, Arc<MemoryExchangeStore>) {
    let store = Arc::new(MemoryExchangeStore::new(catalog()));
    let service = Arc::new(ExchangeService::new(store.clone(), tokens(), policy));
    (service, store)
}

pub(super) fn register(store: &MemoryExchangeStore, tag: &str, grade: f64, quota: u32) -> User {
    store.register(student(tag, grade), quota).expect("signup succeeds")
}

pub(super) fn choices(pairs: &[(u32, u32)]) -> Vec<ApplicationChoice> {
    pairs
        .iter()
        .map(|(university, rank)| ApplicationChoice::new(*university, *rank))
        .collect()
}

pub(super) fn ledger_snapshot<L: ApplicationLedger + UserDirectory>(
    store: &L,
    user_id: UserId,
) -> (u32, Vec<(UniversityId, u32)>) {
    let budget = store
        .find(user_id)
        .expect("find succeeds")
        .expect("user present")
        .modify_count;
    let rows = store
        .applications_for(user_id)
        .expect("read succeeds")
        .into_iter()
        .map(|row| (row.university.id, row.choice))
        .collect();
    (budget, rows)
}

/// What a [`ScriptedStore`] transaction does when committed.
#[derive(Clone)]
pub(super) enum CommitScript {
    /// Commit never reaches storage.
    Fail,
    /// Commit succeeds, then another writer immediately replaces the rows.
    ThenOverwrite(Vec<ApplicationChoice>),
}

/// Memory store with a scripted commit step.
pub(super) struct ScriptedStore {
    pub(super) inner: MemoryExchangeStore,
    script: CommitScript,
}

impl ScriptedStore {
    pub(super) fn new(script: CommitScript) -> Self {
        Self {
            inner: MemoryExchangeStore::new(catalog()),
            script,
        }
    }
}

impl UniversityCatalog for ScriptedStore {
    fn lookup(&self, id: UniversityId) -> Result<Option<University>, RepositoryError> {
        self.inner.lookup(id)
    }

    fn list_all(&self) -> Result<Vec<University>, RepositoryError> {
        self.inner.list_all()
    }
}

impl UserDirectory for ScriptedStore {
    fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.find(id)
    }

    fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>, RepositoryError> {
        self.inner.find_by_uuid(uuid)
    }

    fn register(&self, user: NewUser, modify_quota: u32) -> Result<User, RepositoryError> {
        self.inner.register(user, modify_quota)
    }
}

impl ApplicationLedger for ScriptedStore {
    type Transaction<'a> = ScriptedTransaction<'a>
    where
        Self: 'a;

    fn applications_for(
        &self,
        user_id: UserId,
    ) -> Result<Vec<EnrichedApplication>, RepositoryError> {
        self.inner.applications_for(user_id)
    }

    fn applicants_for(
        &self,
        university_id: UniversityId,
    ) -> Result<Vec<ApplicantRow>, RepositoryError> {
        self.inner.applicants_for(university_id)
    }

    fn applicant_counts(
        &self,
        university_ids: &BTreeSet<UniversityId>,
    ) -> Result<BTreeMap<UniversityId, u64>, RepositoryError> {
        self.inner.applicant_counts(university_ids)
    }

    fn begin(&self, user_id: UserId) -> Result<ScriptedTransaction<'_>, RepositoryError> {
        Ok(ScriptedTransaction {
            store: &self.inner,
            inner: self.inner.begin(user_id)?,
            script: self.script.clone(),
        })
    }
}

pub(super) struct ScriptedTransaction<'a> {
    store: &'a MemoryExchangeStore,
    inner: MemoryTransaction<'a>,
    script: CommitScript,
}

impl LedgerTransaction for ScriptedTransaction<'_> {
    fn user(&self) -> &User {
        self.inner.user()
    }

    fn replace_for_user(&mut self, choices: &[ApplicationChoice]) -> Result<(), RepositoryError> {
        self.inner.replace_for_user(choices)
    }

    fn decrement_budget(&mut self) -> Result<u32, RepositoryError> {
        self.inner.decrement_budget()
    }

    fn commit(self) -> Result<(), RepositoryError> {
        match self.script {
            CommitScript::Fail => {
                Err(RepositoryError::Unavailable("database offline".to_string()))
            }
            CommitScript::ThenOverwrite(choices) => {
                let user_id = self.inner.user().id;
                self.inner.commit()?;
                let mut follow_up = self.store.begin(user_id)?;
                follow_up.replace_for_user(&choices)?;
                follow_up.commit()
            }
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
