use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest number of universities a student may rank at once.
pub const MAX_CHOICES: usize = 5;

/// Internal numeric identifier of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a partner university in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UniversityId(pub u32);

impl fmt::Display for UniversityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store-assigned sequence number; increases with every inserted application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub u64);

/// Student account as issued by the exchange office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub uuid: String,
    pub email: String,
    pub nickname: Option<String>,
    pub grade: f64,
    pub lang: String,
    pub modify_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Signup payload; the store assigns the id and the starting budget comes from policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub uuid: String,
    #[serde(default)]
    pub nickname: Option<String>,
    pub grade: f64,
    pub lang: String,
}

/// Partner university; `slot` is informational and never enforced as a cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct University {
    pub id: UniversityId,
    pub name: String,
    pub country: String,
    pub slot: u32,
    pub duration: String,
}

/// One ranked preference as submitted by a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationChoice {
    pub university_id: UniversityId,
    pub choice: u32,
}

impl ApplicationChoice {
    pub fn new(university_id: u32, choice: u32) -> Self {
        Self {
            university_id: UniversityId(university_id),
            choice,
        }
    }
}

/// Persisted link between a student and a university.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub university_id: UniversityId,
    pub choice: u32,
}

/// Flat user × application row for one university, before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantRow {
    pub application_id: ApplicationId,
    pub user_id: UserId,
    pub nickname: Option<String>,
    pub grade: f64,
    pub lang: String,
    pub choice: u32,
}

/// Flat application × university row for one student.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedApplication {
    pub choice: u32,
    pub university: University,
}
