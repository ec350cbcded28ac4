//! Face-score ledger: per-message score records and per-user aggregates.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Score record for one message. Phrase and reaction contributions are kept
/// apart so either side can be corrected without touching the other.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageFaceScore {
    pub message_id: Uuid,
    pub user_id: Uuid,
    pub positive_phrase_count: u32,
    pub negative_phrase_count: u32,
    pub positive_reaction_count: u32,
    pub negative_reaction_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MessageFaceScore {
    pub fn new(message_id: Uuid, user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            message_id,
            user_id,
            positive_phrase_count: 0,
            negative_phrase_count: 0,
            positive_reaction_count: 0,
            negative_reaction_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn positive_total(&self) -> u64 {
        u64::from(self.positive_phrase_count) + u64::from(self.positive_reaction_count)
    }

    pub fn negative_total(&self) -> u64 {
        u64::from(self.negative_phrase_count) + u64::from(self.negative_reaction_count)
    }

    pub fn total(&self) -> i64 {
        self.positive_total() as i64 - self.negative_total() as i64
    }
}

/// Aggregate of all score records belonging to one user.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserFaceCount {
    pub user_id: Uuid,
    pub positive_phrase_count: u64,
    pub negative_phrase_count: u64,
    pub positive_reaction_count: u64,
    pub negative_reaction_count: u64,
    pub total_score: i64,
}

impl UserFaceCount {
    pub fn positive_total(&self) -> u64 {
        self.positive_phrase_count + self.positive_reaction_count
    }

    pub fn negative_total(&self) -> u64 {
        self.negative_phrase_count + self.negative_reaction_count
    }

    pub fn has_any_changes(&self) -> bool {
        self.positive_total() != 0 || self.negative_total() != 0
    }

    fn absorb(&mut self, score: &MessageFaceScore) {
        self.positive_phrase_count += u64::from(score.positive_phrase_count);
        self.negative_phrase_count += u64::from(score.negative_phrase_count);
        self.positive_reaction_count += u64::from(score.positive_reaction_count);
        self.negative_reaction_count += u64::from(score.negative_reaction_count);
        self.total_score += score.total();
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),
}

#[async_trait]
pub trait FaceScoreRepository: Send + Sync {
    async fn message_face_score(
        &self,
        message_id: Uuid,
    ) -> Result<Option<MessageFaceScore>, StoreError>;

    /// Inserts or replaces the record for `score.message_id`. The original
    /// creation timestamp survives replacement.
    async fn upsert_message_face_score(&self, score: MessageFaceScore) -> Result<(), StoreError>;

    /// Removing an absent record is not an error.
    async fn delete_message_face_score(&self, message_id: Uuid) -> Result<(), StoreError>;

    async fn user_face_count(&self, user_id: Uuid) -> Result<UserFaceCount, StoreError>;

    async fn user_face_counts(&self) -> Result<Vec<UserFaceCount>, StoreError>;
}

/// The shipped store. Schema-backed persistence is intentionally out of
/// scope; deployments that need durability put their own implementation
/// behind [`FaceScoreRepository`].
#[derive(Default)]
pub struct InMemoryFaceScoreRepository {
    scores: RwLock<HashMap<Uuid, MessageFaceScore>>,
}

impl InMemoryFaceScoreRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FaceScoreRepository for InMemoryFaceScoreRepository {
    async fn message_face_score(
        &self,
        message_id: Uuid,
    ) -> Result<Option<MessageFaceScore>, StoreError> {
        Ok(self.scores.read().await.get(&message_id).cloned())
    }

    async fn upsert_message_face_score(&self, mut score: MessageFaceScore) -> Result<(), StoreError> {
        let mut scores = self.scores.write().await;
        if let Some(existing) = scores.get(&score.message_id) {
            score.created_at = existing.created_at;
        }
        score.updated_at = Utc::now();
        scores.insert(score.message_id, score);
        Ok(())
    }

    async fn delete_message_face_score(&self, message_id: Uuid) -> Result<(), StoreError> {
        self.scores.write().await.remove(&message_id);
        Ok(())
    }

    async fn user_face_count(&self, user_id: Uuid) -> Result<UserFaceCount, StoreError> {
        let scores = self.scores.read().await;
        let mut count = UserFaceCount { user_id, ..UserFaceCount::default() };
        for score in scores.values().filter(|score| score.user_id == user_id) {
            count.absorb(score);
        }
        Ok(count)
    }

    async fn user_face_counts(&self) -> Result<Vec<UserFaceCount>, StoreError> {
        let scores = self.scores.read().await;
        let mut by_user: HashMap<Uuid, UserFaceCount> = HashMap::new();
        for score in scores.values() {
            by_user
                .entry(score.user_id)
                .or_insert_with(|| UserFaceCount { user_id: score.user_id, ..Default::default() })
                .absorb(score);
        }
        Ok(by_user.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{FaceScoreRepository, InMemoryFaceScoreRepository, MessageFaceScore};

    fn score(message: u128, user: u128, pos_phrase: u32, neg_reaction: u32) -> MessageFaceScore {
        MessageFaceScore {
            positive_phrase_count: pos_phrase,
            negative_reaction_count: neg_reaction,
            ..MessageFaceScore::new(Uuid::from_u128(message), Uuid::from_u128(user))
        }
    }

    #[tokio::test]
    async fn upsert_then_read_round_trips() {
        let repo = InMemoryFaceScoreRepository::new();
        let record = score(1, 10, 3, 1);

        repo.upsert_message_face_score(record.clone()).await.expect("upsert");
        let stored = repo
            .message_face_score(record.message_id)
            .await
            .expect("read")
            .expect("record present");

        assert_eq!(stored.positive_phrase_count, 3);
        assert_eq!(stored.negative_reaction_count, 1);
        assert_eq!(stored.total(), 2);
    }

    #[tokio::test]
    async fn replacement_preserves_creation_time() {
        let repo = InMemoryFaceScoreRepository::new();
        let first = score(1, 10, 1, 0);
        let created_at = first.created_at;
        repo.upsert_message_face_score(first).await.expect("insert");

        let replacement = score(1, 10, 5, 0);
        repo.upsert_message_face_score(replacement).await.expect("replace");

        let stored =
            repo.message_face_score(Uuid::from_u128(1)).await.expect("read").expect("present");
        assert_eq!(stored.created_at, created_at);
        assert_eq!(stored.positive_phrase_count, 5);
        assert!(stored.updated_at >= created_at);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let repo = InMemoryFaceScoreRepository::new();
        repo.upsert_message_face_score(score(1, 10, 1, 0)).await.expect("insert");

        repo.delete_message_face_score(Uuid::from_u128(1)).await.expect("delete");
        repo.delete_message_face_score(Uuid::from_u128(1)).await.expect("repeat delete");

        assert!(repo
            .message_face_score(Uuid::from_u128(1))
            .await
            .expect("read")
            .is_none());
    }

    #[tokio::test]
    async fn user_aggregate_sums_across_messages() {
        let repo = InMemoryFaceScoreRepository::new();
        repo.upsert_message_face_score(score(1, 10, 3, 0)).await.expect("insert");
        repo.upsert_message_face_score(score(2, 10, 0, 2)).await.expect("insert");
        repo.upsert_message_face_score(score(3, 20, 1, 0)).await.expect("insert");

        let count = repo.user_face_count(Uuid::from_u128(10)).await.expect("aggregate");
        assert_eq!(count.positive_phrase_count, 3);
        assert_eq!(count.negative_reaction_count, 2);
        assert_eq!(count.total_score, 1);
        assert!(count.has_any_changes());

        let all = repo.user_face_counts().await.expect("aggregates");
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn unknown_user_aggregate_is_empty() {
        let repo = InMemoryFaceScoreRepository::new();
        let count = repo.user_face_count(Uuid::from_u128(99)).await.expect("aggregate");
        assert_eq!(count.total_score, 0);
        assert!(!count.has_any_changes());
    }
}
