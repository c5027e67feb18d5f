// validation.rs
use crate::error::{PollError, Result};
use crate::models::PollId;

pub const INVALID_CREATE_PAYLOAD: &str = "Invalid payload for creating a poll.";
pub const INVALID_VOTE_PARAMS: &str = "Invalid parameters for voting.";
pub const INVALID_RESULTS_ID: &str = "Invalid pollId for retrieving results.";
pub const INVALID_DELETE_ID: &str = "Invalid pollId for deleting the poll.";
pub const INVALID_CLOSE_ID: &str = "Invalid pollId for closing the poll.";

/// Checks a creation payload before anything touches storage.
pub fn validate_new_poll(question: &str, labels: &[String]) -> Result<()> {
    if question.is_empty() || labels.is_empty() {
        return Err(PollError::validation(INVALID_CREATE_PAYLOAD));
    }
    if labels.iter().any(|label| label.is_empty()) {
        return Err(PollError::validation(INVALID_CREATE_PAYLOAD));
    }
    Ok(())
}

pub fn validate_option_text(option_text: &str) -> Result<()> {
    if option_text.is_empty() {
        return Err(PollError::validation(INVALID_VOTE_PARAMS));
    }
    Ok(())
}

/// Parses a poll id, reporting `message` when it is malformed.
pub fn parse_poll_id(raw: &str, message: &str) -> Result<PollId> {
    raw.parse().map_err(|_| PollError::validation(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn accepts_single_option() {
        assert!(validate_new_poll("Lunch?", &labels(&["Pizza"])).is_ok());
    }

    #[test]
    fn rejects_empty_question_or_no_options() {
        assert!(matches!(validate_new_poll("", &labels(&["A"])), Err(PollError::Validation(_))));
        assert!(matches!(validate_new_poll("Q?", &[]), Err(PollError::Validation(_))));
    }

    #[test]
    fn whitespace_counts_as_content() {
        assert!(validate_new_poll("   ", &labels(&["A"])).is_ok());
        assert!(validate_new_poll("Q?", &labels(&["A", " "])).is_ok());
    }

    #[test]
    fn rejects_empty_label() {
        let err = validate_new_poll("Q?", &labels(&["A", ""])).unwrap_err();
        assert_eq!(err.to_string(), INVALID_CREATE_PAYLOAD);
    }

    #[test]
    fn option_text_must_be_present() {
        assert!(validate_option_text("Blue").is_ok());
        assert!(validate_option_text("").is_err());
    }

    #[test]
    fn bad_id_reports_the_given_message() {
        let err = parse_poll_id("zzz", INVALID_DELETE_ID).unwrap_err();
        assert_eq!(err.to_string(), INVALID_DELETE_ID);

        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        assert_eq!(parse_poll_id(raw, INVALID_RESULTS_ID).unwrap().to_string(), raw);
        assert!(parse_poll_id(&format!(" {raw} "), INVALID_RESULTS_ID).is_err());
    }
}
