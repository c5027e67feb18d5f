// src/db.rs
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use crate::error::{PollError, Result, StorageError};
use crate::models::{Poll, PollId, PollOption};

/// Edit applied to a copy of a stored poll. Returning an error aborts the write.
pub type Mutation<'a> = &'a (dyn Fn(&mut Poll) -> Result<()> + Send + Sync);

/// Ordered key-value map from poll id to poll record.
///
/// Every method is atomic with respect to a single key. `values` returns a
/// consistent snapshot in key order.
#[async_trait]
pub trait PollMap: Send + Sync {
    async fn get(&self, id: &PollId) -> std::result::Result<Option<Poll>, StorageError>;

    /// Inserts only if the key is free. Returns `false` and writes nothing otherwise.
    async fn insert_new(&self, poll: &Poll) -> std::result::Result<bool, StorageError>;

    /// Read-modify-write under the key. Fails with `NotFound` if the key is absent.
    ///
    /// Unlike the other methods this returns `PollError`: the mutation runs while
    /// the key is locked and its rule errors (`Inactive`, `OptionNotFound`) must
    /// reach the caller unchanged.
    async fn update(&self, id: &PollId, mutate: Mutation<'_>) -> Result<Poll>;

    async fn remove(&self, id: &PollId) -> std::result::Result<bool, StorageError>;

    async fn values(&self) -> std::result::Result<Vec<Poll>, StorageError>;

    /// Number of stored polls, reported by the health endpoint.
    async fn len(&self) -> std::result::Result<usize, StorageError>;
}

/// Process-local map. Lives as long as the process does.
#[derive(Debug, Default)]
pub struct MemoryPollMap {
    polls: RwLock<BTreeMap<PollId, Poll>>,
}

impl MemoryPollMap {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PollMap for MemoryPollMap {
    async fn get(&self, id: &PollId) -> std::result::Result<Option<Poll>, StorageError> {
        Ok(self.polls.read().get(id).cloned())
    }

    async fn insert_new(&self, poll: &Poll) -> std::result::Result<bool, StorageError> {
        let mut polls = self.polls.write();
        if polls.contains_key(&poll.id) {
            return Ok(false);
        }
        polls.insert(poll.id, poll.clone());
        Ok(true)
    }

    async fn update(&self, id: &PollId, mutate: Mutation<'_>) -> Result<Poll> {
        let mut polls = self.polls.write();
        let current = polls.get(id).ok_or(PollError::NotFound)?;
        let mut next = current.clone();
        mutate(&mut next)?;
        polls.insert(*id, next.clone());
        Ok(next)
    }

    async fn remove(&self, id: &PollId) -> std::result::Result<bool, StorageError> {
        Ok(self.polls.write().remove(id).is_some())
    }

    async fn values(&self) -> std::result::Result<Vec<Poll>, StorageError> {
        Ok(self.polls.read().values().cloned().collect())
    }

    async fn len(&self) -> std::result::Result<usize, StorageError> {
        Ok(self.polls.read().len())
    }
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> std::result::Result<Pool<Postgres>, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[derive(sqlx::FromRow)]
struct PollRow {
    id: Uuid,
    question: String,
    options: Json<Vec<PollOption>>,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<PollRow> for Poll {
    type Error = StorageError;

    fn try_from(row: PollRow) -> std::result::Result<Self, Self::Error> {
        let Json(options) = row.options;
        if options.is_empty() {
            return Err(StorageError::Corrupt(format!("poll {} has no options", row.id)));
        }
        Ok(Poll {
            id: PollId::new(row.id),
            question: row.question,
            options,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

const SELECT_POLL: &str = "SELECT id, question, options, is_active, created_at FROM polls";

/// PostgreSQL-backed map over a single `polls` table.
#[derive(Debug, Clone)]
pub struct PgPollMap {
    pool: PgPool,
}

impl PgPollMap {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the `polls` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> std::result::Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS polls (
                id UUID PRIMARY KEY,
                question TEXT NOT NULL,
                options JSONB NOT NULL,
                is_active BOOLEAN NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl PollMap for PgPollMap {
    async fn get(&self, id: &PollId) -> std::result::Result<Option<Poll>, StorageError> {
        let row = sqlx::query_as::<_, PollRow>(&format!("{SELECT_POLL} WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Poll::try_from).transpose()
    }

    async fn insert_new(&self, poll: &Poll) -> std::result::Result<bool, StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO polls (id, question, options, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(poll.id.as_uuid())
        .bind(&poll.question)
        .bind(Json(&poll.options))
        .bind(poll.is_active)
        .bind(poll.created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update(&self, id: &PollId, mutate: Mutation<'_>) -> Result<Poll> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent writers on this id until commit.
        let row = sqlx::query_as::<_, PollRow>(&format!("{SELECT_POLL} WHERE id = $1 FOR UPDATE"))
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(PollError::NotFound);
        };

        let mut poll = Poll::try_from(row)?;
        mutate(&mut poll)?;

        sqlx::query("UPDATE polls SET options = $2, is_active = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(Json(&poll.options))
            .bind(poll.is_active)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(poll)
    }

    async fn remove(&self, id: &PollId) -> std::result::Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM polls WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn values(&self) -> std::result::Result<Vec<Poll>, StorageError> {
        sqlx::query_as::<_, PollRow>(&format!("{SELECT_POLL} ORDER BY id"))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Poll::try_from)
            .collect()
    }

    async fn len(&self) -> std::result::Result<usize, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM polls")
            .fetch_one(&self.pool)
            .await?;
        usize::try_from(count).map_err(|_| StorageError::Corrupt(format!("negative row count {count}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poll(id: u128, labels: &[&str]) -> Poll {
        let labels: Vec<String> = labels.iter().map(|s| s.to_string()).collect();
        Poll::open(PollId::new(Uuid::from_u128(id)), "Question?", &labels)
    }

    #[tokio::test]
    async fn insert_new_refuses_existing_key() {
        let map = MemoryPollMap::new();
        let first = poll(1, &["A"]);
        let mut second = poll(1, &["B"]);
        second.question = "Other?".into();

        assert!(map.insert_new(&first).await.unwrap());
        assert!(!map.insert_new(&second).await.unwrap());

        let stored = map.get(&first.id).await.unwrap().unwrap();
        assert_eq!(stored, first);
        assert_eq!(map.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_mutation_writes_nothing() {
        let map = MemoryPollMap::new();
        let original = poll(7, &["A", "B"]);
        map.insert_new(&original).await.unwrap();

        let err = map
            .update(&original.id, &|p: &mut Poll| {
                p.options[0].votes += 1;
                Err(PollError::OptionNotFound)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::OptionNotFound));
        assert_eq!(map.get(&original.id).await.unwrap().unwrap(), original);
    }

    #[tokio::test]
    async fn update_on_missing_key_is_not_found() {
        let map = MemoryPollMap::new();
        let id = PollId::new(Uuid::from_u128(99));
        let err = map.update(&id, &|_: &mut Poll| Ok(())).await.unwrap_err();
        assert!(matches!(err, PollError::NotFound));
    }

    #[tokio::test]
    async fn values_come_back_in_key_order() {
        let map = MemoryPollMap::new();
        for id in [3, 1, 2] {
            map.insert_new(&poll(id, &["A"])).await.unwrap();
        }
        let ids: Vec<u128> = map
            .values()
            .await
            .unwrap()
            .iter()
            .map(|p| p.id.as_uuid().as_u128())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        assert!(map.remove(&PollId::new(Uuid::from_u128(2))).await.unwrap());
        assert!(!map.remove(&PollId::new(Uuid::from_u128(2))).await.unwrap());
        assert_eq!(map.len().await.unwrap(), 2);
    }

    /// Needs a reachable PostgreSQL in `DATABASE_URL`.
    #[tokio::test]
    #[ignore]
    async fn postgres_round_trip() {
        let url = std::env::var("DATABASE_URL").unwrap();
        let pool = create_pool(&url, 2).await.unwrap();
        let map = PgPollMap::new(pool);
        map.ensure_schema().await.unwrap();

        let created = Poll::open(
            PollId::new(Uuid::new_v4()),
            "Best color?",
            &["Red".to_string(), "Blue".to_string()],
        );
        assert!(map.insert_new(&created).await.unwrap());
        assert!(!map.insert_new(&created).await.unwrap());

        let voted = map
            .update(&created.id, &|p: &mut Poll| {
                p.options[1].votes += 1;
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(voted.options[1].votes, 1);

        let fetched = map.get(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.options, voted.options);
        assert!(map.values().await.unwrap().iter().any(|p| p.id == created.id));

        assert!(map.remove(&created.id).await.unwrap());
        assert!(map.get(&created.id).await.unwrap().is_none());
    }
}
