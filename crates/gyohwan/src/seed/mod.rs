//! CSV import of the partner-university catalog and the student roster.
//!
//! Both files are issued by the exchange office; this service only reads them.

mod parser;

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use crate::exchange::domain::{NewUser, University, UniversityId};
use crate::exchange::memory::MemoryExchangeStore;
use crate::exchange::repository::{RepositoryError, UserDirectory};

#[derive(Debug, thiserror::Error)]
pub enum SeedImportError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("university {0} appears more than once in the catalog")]
    DuplicateUniversity(UniversityId),
    #[error("roster lists '{0}' more than once")]
    DuplicateStudent(String),
    #[error("roster grade for '{email}' is not a finite number")]
    InvalidGrade { email: String },
    #[error("could not load seed data into the store: {0}")]
    Store(#[from] RepositoryError),
}

/// Build a store from imported reference data; every student starts with `modify_quota`.
pub fn hydrate_store(
    universities: Vec<University>,
    students: Vec<NewUser>,
    modify_quota: u32,
) -> Result<MemoryExchangeStore, SeedImportError> {
    let store = MemoryExchangeStore::new(universities);
    for student in students {
        store.register(student, modify_quota)?;
    }
    Ok(store)
}

pub struct CatalogImporter;

impl CatalogImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<University>, SeedImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Columns: `id,name,country,slot,duration`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<University>, SeedImportError> {
        let universities = parser::parse_universities(reader)?;
        let mut seen = BTreeSet::new();
        for university in &universities {
            if !seen.insert(university.id) {
                return Err(SeedImportError::DuplicateUniversity(university.id));
            }
        }
        Ok(universities)
    }
}

pub struct RosterImporter;

impl RosterImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<NewUser>, SeedImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Columns: `email,uuid,nickname,grade,lang`; an empty nickname is kept as none.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<NewUser>, SeedImportError> {
        let students = parser::parse_students(reader)?;
        let mut emails = BTreeSet::new();
        let mut uuids = BTreeSet::new();
        for student in &students {
            if !student.grade.is_finite() {
                return Err(SeedImportError::InvalidGrade {
                    email: student.email.clone(),
                });
            }
            if !emails.insert(student.email.as_str()) {
                return Err(SeedImportError::DuplicateStudent(student.email.clone()));
            }
            if !uuids.insert(student.uuid.as_str()) {
                return Err(SeedImportError::DuplicateStudent(student.uuid.clone()));
            }
        }
        Ok(students)
    }
}
