// src/poll.rs
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::db::{MemoryPollMap, PollMap};
use crate::error::{PollError, Result, StorageError};
use crate::ids::{IdGenerator, RandomIds};
use crate::models::Poll;
use crate::validation::{
    parse_poll_id, validate_new_poll, validate_option_text, INVALID_CLOSE_ID, INVALID_DELETE_ID,
    INVALID_RESULTS_ID, INVALID_VOTE_PARAMS,
};

/// Attempts at finding an unused id before giving up.
pub const MAX_ID_ATTEMPTS: u32 = 8;

pub const VOTE_RECORDED: &str = "Vote recorded.";
pub const POLL_DELETED: &str = "Poll deleted.";

/// Owns every poll record and enforces the voting rules.
///
/// Cheap to clone; clones share the same map.
#[derive(Clone)]
pub struct PollStore {
    map: Arc<dyn PollMap>,
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for PollStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollStore").finish_non_exhaustive()
    }
}

impl PollStore {
    pub fn new(map: Arc<dyn PollMap>, ids: Arc<dyn IdGenerator>) -> Self {
        Self { map, ids }
    }

    /// In-memory store with random ids.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryPollMap::new()), Arc::new(RandomIds))
    }

    pub async fn create(&self, question: &str, labels: &[String]) -> Result<Poll> {
        validate_new_poll(question, labels)?;

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let poll = Poll::open(self.ids.generate(), question, labels);
            if self.map.insert_new(&poll).await? {
                info!(poll_id = %poll.id, options = poll.options.len(), "poll created");
                return Ok(poll);
            }
            warn!(poll_id = %poll.id, attempt, "generated poll id already in use, regenerating");
        }
        Err(StorageError::IdSpaceExhausted(MAX_ID_ATTEMPTS).into())
    }

    pub async fn vote(&self, poll_id: &str, option_text: &str) -> Result<&'static str> {
        let id = parse_poll_id(poll_id, INVALID_VOTE_PARAMS)?;
        validate_option_text(option_text)?;

        let poll = self
            .map
            .update(&id, &|poll: &mut Poll| {
                if !poll.is_active {
                    return Err(PollError::Inactive);
                }
                let index = poll.option_index(option_text).ok_or(PollError::OptionNotFound)?;
                let option = &mut poll.options[index];
                option.votes = option.votes.checked_add(1).ok_or_else(|| {
                    StorageError::Corrupt(format!("vote counter for {:?} is saturated", option.option_text))
                })?;
                Ok(())
            })
            .await?;

        debug!(poll_id = %id, option = option_text, total = poll.total_votes(), "vote recorded");
        Ok(VOTE_RECORDED)
    }

    pub async fn get(&self, poll_id: &str) -> Result<Poll> {
        let id = parse_poll_id(poll_id, INVALID_RESULTS_ID)?;
        self.map.get(&id).await?.ok_or(PollError::NotFound)
    }

    pub async fn delete(&self, poll_id: &str) -> Result<&'static str> {
        let id = parse_poll_id(poll_id, INVALID_DELETE_ID)?;
        if !self.map.remove(&id).await? {
            return Err(PollError::NotFound);
        }
        info!(poll_id = %id, "poll deleted");
        Ok(POLL_DELETED)
    }

    pub async fn list_active(&self) -> Result<Vec<Poll>> {
        let polls = self.map.values().await?;
        Ok(polls.into_iter().filter(|poll| poll.is_active).collect())
    }

    /// Stops a poll from taking further votes. Closing twice is a no-op.
    pub async fn close(&self, poll_id: &str) -> Result<Poll> {
        let id = parse_poll_id(poll_id, INVALID_CLOSE_ID)?;
        let poll = self
            .map
            .update(&id, &|poll: &mut Poll| {
                poll.is_active = false;
                Ok(())
            })
            .await?;
        info!(poll_id = %id, total = poll.total_votes(), "poll closed");
        Ok(poll)
    }

    /// Number of stored polls, open or closed.
    pub async fn count(&self) -> Result<usize> {
        Ok(self.map.len().await?)
    }
}
