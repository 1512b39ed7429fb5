use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{
    ApplicantRow, Application, ApplicationChoice, ApplicationId, EnrichedApplication, NewUser,
    University, UniversityId, User, UserId,
};
use super::repository::{
    ApplicationLedger, LedgerTransaction, RepositoryError, UniversityCatalog, UserDirectory,
};

/// In-process store backing the service and the test suites.
///
/// The catalog is fixed at construction. Users and applications live behind a
/// single mutex; a [`MemoryTransaction`] keeps that mutex locked until it is
/// committed or dropped, so write transactions are serialized and readers never
/// see staged rows.
#[derive(Debug, Default)]
pub struct MemoryExchangeStore {
    catalog: BTreeMap<UniversityId, University>,
    state: Mutex<LedgerState>,
}

#[derive(Debug, Default)]
struct LedgerState {
    users: BTreeMap<UserId, User>,
    applications: Vec<Application>,
    next_user_id: u64,
    next_application_id: u64,
}

impl LedgerState {
    fn next_application_id(&mut self) -> ApplicationId {
        self.next_application_id += 1;
        ApplicationId(self.next_application_id)
    }
}

impl MemoryExchangeStore {
    /// Later entries win when two universities share an id.
    pub fn new(universities: impl IntoIterator<Item = University>) -> Self {
        let catalog = universities
            .into_iter()
            .map(|university| (university.id, university))
            .collect();

        Self {
            catalog,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn university_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn user_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.lock()?.users.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("ledger lock poisoned".to_string()))
    }
}

impl UniversityCatalog for MemoryExchangeStore {
    fn lookup(&self, id: UniversityId) -> Result<Option<University>, RepositoryError> {
        Ok(self.catalog.get(&id).cloned())
    }

    fn list_all(&self) -> Result<Vec<University>, RepositoryError> {
        Ok(self.catalog.values().cloned().collect())
    }
}

impl UserDirectory for MemoryExchangeStore {
    fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn find_by_uuid(&self, uuid: &str) -> Result<Option<User>, RepositoryError> {
        let state = self.lock()?;
        Ok(state.users.values().find(|user| user.uuid == uuid).cloned())
    }

    fn register(&self, user: NewUser, modify_quota: u32) -> Result<User, RepositoryError> {
        let mut state = self.lock()?;
        let taken = state
            .users
            .values()
            .any(|existing| existing.email == user.email || existing.uuid == user.uuid);
        if taken {
            return Err(RepositoryError::Conflict);
        }

        state.next_user_id += 1;
        let now = Utc::now();
        let record = User {
            id: UserId(state.next_user_id),
            uuid: user.uuid,
            email: user.email,
            nickname: user.nickname,
            grade: user.grade,
            lang: user.lang,
            modify_count: modify_quota,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(record.id, record.clone());
        Ok(record)
    }
}

impl ApplicationLedger for MemoryExchangeStore {
    type Transaction<'a> = MemoryTransaction<'a>
    where
        Self: 'a;

    fn applications_for(
        &self,
        user_id: UserId,
    ) -> Result<Vec<EnrichedApplication>, RepositoryError> {
        let state = self.lock()?;
        let mut rows: Vec<EnrichedApplication> = state
            .applications
            .iter()
            .filter(|application| application.user_id == user_id)
            .filter_map(|application| {
                self.catalog
                    .get(&application.university_id)
                    .map(|university| EnrichedApplication {
                        choice: application.choice,
                        university: university.clone(),
                    })
            })
            .collect();
        rows.sort_by_key(|row| row.choice);
        Ok(rows)
    }

    fn applicants_for(
        &self,
        university_id: UniversityId,
    ) -> Result<Vec<ApplicantRow>, RepositoryError> {
        let state = self.lock()?;
        Ok(state
            .applications
            .iter()
            .filter(|application| application.university_id == university_id)
            .filter_map(|application| {
                state
                    .users
                    .get(&application.user_id)
                    .map(|user| ApplicantRow {
                        application_id: application.id,
                        user_id: user.id,
                        nickname: user.nickname.clone(),
                        grade: user.grade,
                        lang: user.lang.clone(),
                        choice: application.choice,
                    })
            })
            .collect())
    }

    fn applicant_counts(
        &self,
        university_ids: &BTreeSet<UniversityId>,
    ) -> Result<BTreeMap<UniversityId, u64>, RepositoryError> {
        let state = self.lock()?;
        let mut counts = BTreeMap::new();
        for application in &state.applications {
            if university_ids.contains(&application.university_id) {
                *counts.entry(application.university_id).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    fn begin(&self, user_id: UserId) -> Result<MemoryTransaction<'_>, RepositoryError> {
        let state = self.lock()?;
        let user = state
            .users
            .get(&user_id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        Ok(MemoryTransaction {
            state,
            user,
            staged_choices: None,
        })
    }
}

/// Open write transaction over [`MemoryExchangeStore`].
pub struct MemoryTransaction<'a> {
    state: MutexGuard<'a, LedgerState>,
    user: User,
    staged_choices: Option<Vec<ApplicationChoice>>,
}

impl LedgerTransaction for MemoryTransaction<'_> {
    fn user(&self) -> &User {
        &self.user
    }

    fn replace_for_user(&mut self, choices: &[ApplicationChoice]) -> Result<(), RepositoryError> {
        self.staged_choices = Some(choices.to_vec());
        Ok(())
    }

    fn decrement_budget(&mut self) -> Result<u32, RepositoryError> {
        self.user.modify_count = self
            .user
            .modify_count
            .checked_sub(1)
            .ok_or(RepositoryError::Conflict)?;
        Ok(self.user.modify_count)
    }

    fn commit(mut self) -> Result<(), RepositoryError> {
        let user_id = self.user.id;
        let state = &mut *self.state;

        if let Some(choices) = self.staged_choices.take() {
            state
                .applications
                .retain(|application| application.user_id != user_id);
            for choice in choices {
                let id = state.next_application_id();
                state.applications.push(Application {
                    id,
                    user_id,
                    university_id: choice.university_id,
                    choice: choice.choice,
                });
            }
        }

        self.user.updated_at = Utc::now();
        state.users.insert(user_id, self.user.clone());
        Ok(())
    }
}
