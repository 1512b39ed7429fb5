use std::collections::BTreeSet;

use serde::Deserialize;

use super::domain::{ApplicationChoice, UniversityId, MAX_CHOICES};

/// Reasons a submitted choice list is rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChoiceViolation {
    #[error("at most {max} universities may be ranked, {submitted} were submitted")]
    TooManyChoices { submitted: usize, max: usize },
    #[error("choice ranks must run from 1 to the number of choices without gaps or repeats (got {choices:?})")]
    InvalidChoiceSequence { choices: Vec<i64> },
    #[error("university {0} is ranked more than once")]
    DuplicateUniversity(UniversityId),
    #[error("university {0} does not exist")]
    UnknownUniversity(UniversityId),
}

/// Structural checks that need no storage access, in the order they are reported.
pub fn check_structure(choices: &[ApplicationChoice]) -> Result<(), ChoiceViolation> {
    if choices.len() > MAX_CHOICES {
        return Err(ChoiceViolation::TooManyChoices {
            submitted: choices.len(),
            max: MAX_CHOICES,
        });
    }

    let ranks: Vec<i64> = choices.iter().map(|choice| i64::from(choice.choice)).collect();
    check_sequence(ranks)?;

    let mut seen = BTreeSet::new();
    for choice in choices {
        if !seen.insert(choice.university_id) {
            return Err(ChoiceViolation::DuplicateUniversity(choice.university_id));
        }
    }

    Ok(())
}

fn check_sequence(mut ranks: Vec<i64>) -> Result<(), ChoiceViolation> {
    ranks.sort_unstable();
    let contiguous = ranks
        .iter()
        .zip(1_i64..)
        .all(|(rank, expected)| *rank == expected);
    if contiguous {
        Ok(())
    } else {
        Err(ChoiceViolation::InvalidChoiceSequence { choices: ranks })
    }
}

/// A choice as submitted over HTTP, before the rank is known to be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedChoice {
    pub university_id: UniversityId,
    pub choice: i64,
}

/// Convert a submitted list, rejecting ranks that cannot be valid with the
/// same violations [`check_structure`] reports.
pub fn accept_submission(
    submitted: &[SubmittedChoice],
) -> Result<Vec<ApplicationChoice>, ChoiceViolation> {
    if submitted.len() > MAX_CHOICES {
        return Err(ChoiceViolation::TooManyChoices {
            submitted: submitted.len(),
            max: MAX_CHOICES,
        });
    }

    let mut choices = Vec::with_capacity(submitted.len());
    for entry in submitted {
        let Ok(choice) = u32::try_from(entry.choice) else {
            let mut ranks: Vec<i64> = submitted.iter().map(|entry| entry.choice).collect();
            ranks.sort_unstable();
            return Err(ChoiceViolation::InvalidChoiceSequence { choices: ranks });
        };
        choices.push(ApplicationChoice {
            university_id: entry.university_id,
            choice,
        });
    }
    Ok(choices)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choices(pairs: &[(u32, u32)]) -> Vec<ApplicationChoice> {
        pairs
            .iter()
            .map(|(university, rank)| ApplicationChoice::new(*university, *rank))
            .collect()
    }

    #[test]
    fn empty_list_is_a_valid_clear() {
        assert_eq!(check_structure(&[]), Ok(()));
    }

    #[test]
    fn accepts_unordered_contiguous_ranks() {
        let submitted = choices(&[(3, 2), (7, 1), (9, 3)]);
        assert_eq!(check_structure(&submitted), Ok(()));
    }

    #[test]
    fn rejects_more_than_five_choices() {
        let submitted = choices(&[(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6)]);
        assert_eq!(
            check_structure(&submitted),
            Err(ChoiceViolation::TooManyChoices {
                submitted: 6,
                max: 5
            })
        );
    }

    #[test]
    fn rejects_gaps_repeats_and_zero() {
        for pairs in [
            vec![(7, 1), (3, 1)],
            vec![(7, 1), (3, 3)],
            vec![(7, 2)],
            vec![(7, 0), (3, 1)],
        ] {
            let submitted = choices(&pairs);
            assert!(
                matches!(
                    check_structure(&submitted),
                    Err(ChoiceViolation::InvalidChoiceSequence { .. })
                ),
                "{pairs:?} should be rejected"
            );
        }
    }

    #[test]
    fn sequence_errors_win_over_duplicate_universities() {
        let submitted = choices(&[(7, 1), (7, 1)]);
        assert_eq!(
            check_structure(&submitted),
            Err(ChoiceViolation::InvalidChoiceSequence {
                choices: vec![1, 1]
            })
        );

        let submitted = choices(&[(7, 1), (7, 2)]);
        assert_eq!(
            check_structure(&submitted),
            Err(ChoiceViolation::DuplicateUniversity(UniversityId(7)))
        );
    }

    #[test]
    fn negative_ranks_are_sequence_violations() {
        let submitted = [
            SubmittedChoice {
                university_id: UniversityId(7),
                choice: -1,
            },
            SubmittedChoice {
                university_id: UniversityId(3),
                choice: 1,
            },
        ];
        assert_eq!(
            accept_submission(&submitted),
            Err(ChoiceViolation::InvalidChoiceSequence {
                choices: vec![-1, 1]
            })
        );
    }

    #[test]
    fn list_length_is_checked_before_rank_values() {
        let submitted: Vec<SubmittedChoice> = (0..6)
            .map(|index| SubmittedChoice {
                university_id: UniversityId(index),
                choice: -(index as i64),
            })
            .collect();
        assert!(matches!(
            accept_submission(&submitted),
            Err(ChoiceViolation::TooManyChoices { submitted: 6, .. })
        ));
    }

    #[test]
    fn in_range_submissions_convert_unchanged() {
        let submitted = [SubmittedChoice {
            university_id: UniversityId(9),
            choice: 2,
        }];
        assert_eq!(
            accept_submission(&submitted),
            Ok(vec![ApplicationChoice::new(9, 2)])
        );
    }

    #[test]
    fn violation_messages_name_the_failed_rule() {
        let message = ChoiceViolation::UnknownUniversity(UniversityId(999)).to_string();
        assert!(message.contains("999"));
        let message = ChoiceViolation::InvalidChoiceSequence {
            choices: vec![1, 1],
        }
        .to_string();
        assert!(message.contains("[1, 1]"));
    }
}
