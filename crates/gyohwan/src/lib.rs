//! Exchange-programme application backend.
//!
//! Students authenticate with a pre-issued UUID, rank up to five partner
//! universities, and browse per-university applicant rosters ordered by
//! grade. Storage, ranking and the application-update transaction live in
//! `exchange`; `auth` and `seed` are wired around it by the HTTP shell.

pub mod auth;
pub mod config;
pub mod error;
pub mod exchange;
pub mod seed;
pub mod telemetry;
