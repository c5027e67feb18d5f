// models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque poll identifier, used as the storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PollId(Uuid);

impl PollId {
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for PollId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for PollId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for PollId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub option_text: String,
    pub votes: u64,
}

impl PollOption {
    pub fn new(option_text: impl Into<String>) -> Self {
        Self {
            option_text: option_text.into(),
            votes: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Poll {
    pub id: PollId,
    pub question: String,
    pub options: Vec<PollOption>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Poll {
    /// Builds an open poll with every option at zero votes, keeping label order.
    pub fn open(id: PollId, question: impl Into<String>, labels: &[String]) -> Self {
        Self {
            id,
            question: question.into(),
            options: labels.iter().map(|label| PollOption::new(label.as_str())).collect(),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Position of the first option whose label matches exactly.
    pub fn option_index(&self, option_text: &str) -> Option<usize> {
        self.options
            .iter()
            .position(|option| option.option_text == option_text)
    }

    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|option| option.votes).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePollRequest {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub option_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_id_parses_hyphenated_uuid() {
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let id: PollId = raw.parse().unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn poll_id_rejects_garbage() {
        assert!("not-a-poll".parse::<PollId>().is_err());
        assert!("".parse::<PollId>().is_err());
        assert!(" 67e55044-10b1-426f-9247-bb680e5fe0c8".parse::<PollId>().is_err());
    }

    #[test]
    fn poll_serializes_camel_case() {
        let id = PollId::new(Uuid::nil());
        let poll = Poll::open(id, "Best color?", &["Red".to_string(), "Blue".to_string()]);
        let json = serde_json::to_value(&poll).unwrap();

        assert_eq!(json["id"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["options"][1]["optionText"], "Blue");
        assert_eq!(json["options"][1]["votes"], 0);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn option_index_takes_first_duplicate() {
        let labels = vec!["Yes".to_string(), "No".to_string(), "Yes".to_string()];
        let poll = Poll::open(PollId::new(Uuid::nil()), "Again?", &labels);
        assert_eq!(poll.option_index("Yes"), Some(0));
        assert_eq!(poll.option_index("yes"), None);
    }
}
