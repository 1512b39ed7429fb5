use serde::{Deserialize, Deserializer};
use std::io::Read;

use crate::exchange::domain::{NewUser, University, UniversityId};

pub(crate) fn parse_universities<R: Read>(reader: R) -> Result<Vec<University>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut universities = Vec::new();

    for record in csv_reader.deserialize::<UniversityRow>() {
        let row = record?;
        universities.push(University {
            id: UniversityId(row.id),
            name: row.name,
            country: row.country,
            slot: row.slot,
            duration: row.duration.unwrap_or_default(),
        });
    }

    Ok(universities)
}

pub(crate) fn parse_students<R: Read>(reader: R) -> Result<Vec<NewUser>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut students = Vec::new();

    for record in csv_reader.deserialize::<StudentRow>() {
        let row = record?;
        students.push(NewUser {
            email: row.email,
            uuid: row.uuid,
            nickname: row.nickname,
            grade: row.grade,
            lang: row.lang,
        });
    }

    Ok(students)
}

#[derive(Debug, Deserialize)]
struct UniversityRow {
    id: u32,
    name: String,
    country: String,
    slot: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StudentRow {
    email: String,
    uuid: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    nickname: Option<String>,
    grade: f64,
    lang: String,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
