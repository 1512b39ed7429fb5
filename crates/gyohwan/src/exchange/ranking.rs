use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use super::domain::{ApplicantRow, UniversityId, UserId};
use super::repository::{ApplicationLedger, RepositoryError};

/// An applicant with their position in a university's roster.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedApplicant {
    pub rank: usize,
    pub user_id: UserId,
    pub nickname: Option<String>,
    pub grade: f64,
    pub lang: String,
    pub choice: u32,
}

/// Order rows by grade, highest first; equal grades keep application order.
///
/// Positions are derived on every call and never persisted.
pub fn rank_applicants(mut rows: Vec<ApplicantRow>) -> Vec<RankedApplicant> {
    rows.sort_by(|left, right| match right.grade.total_cmp(&left.grade) {
        Ordering::Equal => left.application_id.cmp(&right.application_id),
        other => other,
    });

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| RankedApplicant {
            rank: index + 1,
            user_id: row.user_id,
            nickname: row.nickname,
            grade: row.grade,
            lang: row.lang,
            choice: row.choice,
        })
        .collect()
}

/// Read-side queries over the ledger for roster and count views.
pub struct RankingEngine<L> {
    ledger: Arc<L>,
}

impl<L: ApplicationLedger> RankingEngine<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    pub fn applicants_for(
        &self,
        university_id: UniversityId,
    ) -> Result<Vec<RankedApplicant>, RepositoryError> {
        let rows = self.ledger.applicants_for(university_id)?;
        Ok(rank_applicants(rows))
    }

    pub fn applicant_count(&self, university_id: UniversityId) -> Result<u64, RepositoryError> {
        let ids = BTreeSet::from([university_id]);
        let counts = self.ledger.applicant_counts(&ids)?;
        Ok(counts.get(&university_id).copied().unwrap_or(0))
    }

    /// Sparse like the underlying ledger query: zero-applicant ids are omitted.
    pub fn applicant_counts(
        &self,
        university_ids: &BTreeSet<UniversityId>,
    ) -> Result<BTreeMap<UniversityId, u64>, RepositoryError> {
        if university_ids.is_empty() {
            return Ok(BTreeMap::new());
        }
        self.ledger.applicant_counts(university_ids)
    }
}
