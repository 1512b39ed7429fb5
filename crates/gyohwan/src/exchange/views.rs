use serde::Serialize;

use super::domain::{UniversityId, UserId};

/// One ranked university on a profile, with that university's current demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDetailView {
    pub choice: u32,
    pub university_id: UniversityId,
    pub university_name: String,
    pub country: String,
    pub slot: u32,
    pub total_applicants: u64,
}

/// Profile returned to its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateProfileView {
    pub id: UserId,
    pub email: String,
    pub nickname: Option<String>,
    pub grade: f64,
    pub lang: String,
    pub modify_count: u32,
    pub applications: Vec<ApplicationDetailView>,
}

/// Profile visible to other students; no email or budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfileView {
    pub id: UserId,
    pub nickname: Option<String>,
    pub grade: f64,
    pub lang: String,
    pub applications: Vec<ApplicationDetailView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversitySummaryView {
    pub id: UniversityId,
    pub name: String,
    pub country: String,
    pub slot: u32,
    pub applicant_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantView {
    pub id: UserId,
    pub rank: usize,
    pub choice: u32,
    pub nickname: Option<String>,
    pub grade: f64,
    pub lang: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UniversityDetailView {
    pub name: String,
    pub country: String,
    pub slot: u32,
    pub total_applicants: u64,
    pub applicants: Vec<ApplicantView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySummary {
    pub id: UserId,
    pub nickname: Option<String>,
}

/// Credential issued in exchange for a known UUID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub access_token: String,
    pub token_type: &'static str,
    pub user: IdentitySummary,
}
