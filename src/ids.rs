// ids.rs
use uuid::Uuid;

use crate::models::PollId;

/// Source of fresh poll identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> PollId;
}

/// UUIDv4 ids built from 16 bytes of OS randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn generate(&self) -> PollId {
        PollId::new(Uuid::new_v4())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_ids_are_v4_and_distinct() {
        let ids: HashSet<_> = (0..1000).map(|_| RandomIds.generate()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.as_uuid().get_version_num() == 4));
    }
}
