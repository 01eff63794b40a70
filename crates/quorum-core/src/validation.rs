use serde_json::Value;
use thiserror::Error;

pub const MAX_QUESTION_LEN: usize = 500;
pub const MAX_OPTION_LEN: usize = 200;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Question is required.")]
    QuestionRequired,
    #[error("Question must be 500 characters or less.")]
    QuestionTooLong,
    #[error("At least two options are required.")]
    TooFewOptions,
    #[error("Maximum 10 options allowed.")]
    TooManyOptions,
    #[error("All options must have content.")]
    BlankOption,
    #[error("Each option must be 200 characters or less.")]
    OptionTooLong,
    #[error("Invalid poll ID.")]
    InvalidPollId,
    #[error("Invalid option index.")]
    InvalidOptionIndex,
}

/// Question and options after validation, trimmed and ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollInput {
    pub question: String,
    pub options: Vec<String>,
}

/// Checks a submitted question and option list.
///
/// Options that are exactly empty (unfilled form fields) are dropped before
/// counting. Options that are present but blank are kept and rejected, so the
/// caller learns about them instead of having them vanish. Lengths are
/// measured on the raw input in characters.
pub fn validate_poll_input(question: &str, options: &[String]) -> Result<PollInput, ValidationError> {
    if question.trim().is_empty() {
        return Err(ValidationError::QuestionRequired);
    }
    if question.chars().count() > MAX_QUESTION_LEN {
        return Err(ValidationError::QuestionTooLong);
    }

    let options: Vec<&String> = options.iter().filter(|opt| !opt.is_empty()).collect();
    if options.len() < MIN_OPTIONS {
        return Err(ValidationError::TooFewOptions);
    }
    if options.len() > MAX_OPTIONS {
        return Err(ValidationError::TooManyOptions);
    }

    for option in &options {
        if option.trim().is_empty() {
            return Err(ValidationError::BlankOption);
        }
        if option.chars().count() > MAX_OPTION_LEN {
            return Err(ValidationError::OptionTooLong);
        }
    }

    Ok(PollInput {
        question: question.trim().to_string(),
        options: options.iter().map(|opt| opt.trim().to_string()).collect(),
    })
}

pub fn validate_poll_id(poll_id: &str) -> Result<(), ValidationError> {
    if poll_id.trim().is_empty() {
        return Err(ValidationError::InvalidPollId);
    }
    Ok(())
}

pub fn validate_option_index(option_index: i64) -> Result<usize, ValidationError> {
    usize::try_from(option_index).map_err(|_| ValidationError::InvalidOptionIndex)
}

/// Accepts JSON integers only: `1` and `-1` pass, `1.5`, `"1"` and `null` do
/// not. Floats with no fractional part (`2.0`) are treated as integers.
///
/// Integers beyond the `i64` range saturate, so an oversized index is still
/// an integer and fails the poll's bounds check instead.
pub fn option_index_from_json(value: &Value) -> Result<i64, ValidationError> {
    if let Some(index) = value.as_i64() {
        return Ok(index);
    }
    if let Some(index) = value.as_u64() {
        return Ok(i64::try_from(index).unwrap_or(i64::MAX));
    }
    match value.as_f64() {
        // `as` saturates at the i64 bounds.
        Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        _ => Err(ValidationError::InvalidOptionIndex),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn opts(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn accepts_and_trims_valid_input() {
        let input = validate_poll_input("  Best color?  ", &opts(&[" Red", "Blue "])).unwrap();
        assert_eq!(input.question, "Best color?");
        assert_eq!(input.options, opts(&["Red", "Blue"]));
    }

    #[test]
    fn rejects_blank_question() {
        assert_eq!(
            validate_poll_input("", &opts(&["a", "b"])),
            Err(ValidationError::QuestionRequired)
        );
        assert_eq!(
            validate_poll_input(" \t\n", &opts(&["a", "b"])),
            Err(ValidationError::QuestionRequired)
        );
    }

    #[test]
    fn question_length_boundary() {
        let exactly = "q".repeat(MAX_QUESTION_LEN);
        assert!(validate_poll_input(&exactly, &opts(&["a", "b"])).is_ok());

        for extra in [1, 2, 100] {
            let long = "q".repeat(MAX_QUESTION_LEN + extra);
            assert_eq!(
                validate_poll_input(&long, &opts(&["a", "b"])),
                Err(ValidationError::QuestionTooLong)
            );
        }
    }

    #[test]
    fn question_length_counts_characters_not_bytes() {
        let accented = "é".repeat(MAX_QUESTION_LEN);
        assert!(validate_poll_input(&accented, &opts(&["a", "b"])).is_ok());
    }

    #[test]
    fn option_count_bounds() {
        for count in 0..=12 {
            let options: Vec<String> = (0..count).map(|i| format!("option {i}")).collect();
            let result = validate_poll_input("Q", &options);
            match count {
                0 | 1 => assert_eq!(result, Err(ValidationError::TooFewOptions), "{count} options"),
                2..=10 => assert!(result.is_ok(), "{count} options"),
                _ => assert_eq!(result, Err(ValidationError::TooManyOptions), "{count} options"),
            }
        }
    }

    #[test]
    fn empty_options_are_dropped_before_counting() {
        assert_eq!(
            validate_poll_input("Q", &opts(&["a", "", ""])),
            Err(ValidationError::TooFewOptions)
        );
        let input = validate_poll_input("Q", &opts(&["a", "", "b"])).unwrap();
        assert_eq!(input.options, opts(&["a", "b"]));
    }

    #[test]
    fn blank_options_are_rejected() {
        assert_eq!(
            validate_poll_input("Q", &opts(&["a", "   "])),
            Err(ValidationError::BlankOption)
        );
    }

    #[test]
    fn option_length_boundary() {
        let ok = "o".repeat(MAX_OPTION_LEN);
        assert!(validate_poll_input("Q", &[ok, "b".into()]).is_ok());
        let long = "o".repeat(MAX_OPTION_LEN + 1);
        assert_eq!(
            validate_poll_input("Q", &[long, "b".into()]),
            Err(ValidationError::OptionTooLong)
        );
    }

    #[test]
    fn poll_id_must_not_be_blank() {
        assert_eq!(validate_poll_id(""), Err(ValidationError::InvalidPollId));
        assert_eq!(validate_poll_id("  "), Err(ValidationError::InvalidPollId));
        assert!(validate_poll_id("abc").is_ok());
    }

    #[test]
    fn option_index_must_be_non_negative() {
        assert_eq!(validate_option_index(0), Ok(0));
        assert_eq!(validate_option_index(7), Ok(7));
        assert_eq!(validate_option_index(-1), Err(ValidationError::InvalidOptionIndex));
    }

    #[test]
    fn option_index_from_json_accepts_integers_only() {
        assert_eq!(option_index_from_json(&json!(3)), Ok(3));
        assert_eq!(option_index_from_json(&json!(-2)), Ok(-2));
        assert_eq!(option_index_from_json(&json!(2.0)), Ok(2));
        assert_eq!(
            option_index_from_json(&json!(1.5)),
            Err(ValidationError::InvalidOptionIndex)
        );
        assert_eq!(
            option_index_from_json(&json!("1")),
            Err(ValidationError::InvalidOptionIndex)
        );
        assert_eq!(
            option_index_from_json(&json!(null)),
            Err(ValidationError::InvalidOptionIndex)
        );
    }

    #[test]
    fn oversized_option_index_saturates() {
        assert_eq!(option_index_from_json(&json!(u64::MAX)), Ok(i64::MAX));
        assert_eq!(option_index_from_json(&json!(1e20)), Ok(i64::MAX));
        assert_eq!(option_index_from_json(&json!(-1e20)), Ok(i64::MIN));
        assert_eq!(
            validate_option_index(i64::MIN),
            Err(ValidationError::InvalidOptionIndex)
        );
    }
}
