use application::{ApplicationError, CandidateRepository};
use async_trait::async_trait;
use domain::{Candidate, CandidateId};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument};

/// Insertion-ordered candidate collection behind a single reader-writer lock.
/// Writers hold the lock for the whole mutation, so readers only ever see a
/// complete collection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCandidateRepository {
    records: Arc<RwLock<Vec<Candidate>>>,
}

impl InMemoryCandidateRepository {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

#[async_trait]
impl CandidateRepository for InMemoryCandidateRepository {
    #[instrument(skip(self, candidate), fields(candidate_id = %candidate.id()))]
    async fn insert(&self, candidate: Candidate) -> Result<(), ApplicationError> {
        debug!("Inserting candidate into in-memory store");
        let mut records = self.records.write().await;
        if records.iter().any(|existing| existing.id() == candidate.id()) {
            error!("Refusing to insert candidate: identity already present");
            return Err(ApplicationError::DuplicateIdentity(
                candidate.id().to_string(),
            ));
        }
        records.push(candidate);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &CandidateId) -> Result<Candidate, ApplicationError> {
        debug!("Getting candidate from in-memory store");
        self.records
            .read()
            .await
            .iter()
            .find(|candidate| candidate.id() == id)
            .cloned()
            .ok_or_else(|| ApplicationError::NotFound(id.to_string()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &CandidateId) -> Result<Candidate, ApplicationError> {
        debug!("Deleting candidate from in-memory store");
        let mut records = self.records.write().await;
        match records.iter().position(|candidate| candidate.id() == id) {
            Some(position) => Ok(records.remove(position)),
            None => Err(ApplicationError::NotFound(id.to_string())),
        }
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Candidate>, ApplicationError> {
        debug!("Listing all candidates from in-memory store");
        Ok(self.records.read().await.clone())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> Result<usize, ApplicationError> {
        let count = self.records.read().await.len();
        debug!(count, "Counted candidates in in-memory store");
        Ok(count)
    }
}
