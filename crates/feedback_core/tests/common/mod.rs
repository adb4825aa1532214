#![allow(dead_code)]

use async_trait::async_trait;
use feedback_core::{
    CollectionPaths, Document, DocumentRepository, EnvironmentProbe, FeedbackStore, Fields,
    RepoError, RepoResult, SqliteDocumentRepository, WriteBatch,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn memory_repo() -> Arc<SqliteDocumentRepository> {
    Arc::new(SqliteDocumentRepository::open_in_memory().unwrap())
}

pub fn store<R, E>(repo: R, probe: E) -> FeedbackStore<R, E>
where
    R: DocumentRepository,
    E: EnvironmentProbe,
{
    FeedbackStore::new(repo, probe, CollectionPaths::default())
}

/// Repository whose every call fails and which counts the attempts.
#[derive(Default)]
pub struct UnreachableRepository {
    pub calls: AtomicUsize,
}

impl UnreachableRepository {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> RepoResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(RepoError::Unavailable("network unreachable".to_string()))
    }
}

#[async_trait]
impl DocumentRepository for UnreachableRepository {
    async fn list_documents(&self, _collection: &str) -> RepoResult<Vec<Document>> {
        self.fail()
    }

    async fn get_document(&self, _collection: &str, _id: &str) -> RepoResult<Option<Document>> {
        self.fail()
    }

    async fn set_document(&self, _collection: &str, _id: &str, _fields: Fields) -> RepoResult<()> {
        self.fail()
    }

    async fn add_document(&self, _collection: &str, _fields: Fields) -> RepoResult<String> {
        self.fail()
    }

    async fn delete_document(&self, _collection: &str, _id: &str) -> RepoResult<()> {
        self.fail()
    }

    async fn query_array_contains(
        &self,
        _collection: &str,
        _field: &str,
        _value: &str,
    ) -> RepoResult<Vec<Document>> {
        self.fail()
    }

    async fn commit_batch(&self, _batch: WriteBatch) -> RepoResult<()> {
        self.fail()
    }
}

/// Delegates to an inner repository but sabotages batch commits by
/// appending an update of a document that does not exist, so the batch
/// fails after its real writes were already applied inside the transaction.
pub struct SabotagedCommitRepository<R> {
    pub inner: R,
}

#[async_trait]
impl<R: DocumentRepository> DocumentRepository for SabotagedCommitRepository<R> {
    async fn list_documents(&self, collection: &str) -> RepoResult<Vec<Document>> {
        self.inner.list_documents(collection).await
    }

    async fn get_document(&self, collection: &str, id: &str) -> RepoResult<Option<Document>> {
        self.inner.get_document(collection, id).await
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> RepoResult<()> {
        self.inner.set_document(collection, id, fields).await
    }

    async fn add_document(&self, collection: &str, fields: Fields) -> RepoResult<String> {
        self.inner.add_document(collection, fields).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> RepoResult<()> {
        self.inner.delete_document(collection, id).await
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> RepoResult<Vec<Document>> {
        self.inner.query_array_contains(collection, field, value).await
    }

    async fn commit_batch(&self, mut batch: WriteBatch) -> RepoResult<()> {
        batch.update("sabotage/data/missing", "does-not-exist", Fields::new());
        self.inner.commit_batch(batch).await
    }
}
