//! Document repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide collection-scoped read/write/query APIs over stored documents.
//! - Provide an atomic multi-document batch commit.
//!
//! # Invariants
//! - `set_document` fully replaces the field payload and keeps `create_time`.
//! - `commit_batch` runs in one immediate transaction; any failing write
//!   rolls back every earlier write of the same batch.
//! - Read paths reject stored payloads that are not JSON objects.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::repo::document::{
    now_epoch_ms, resolve_fields, Document, DocumentData, Fields, WriteBatch, WriteOp,
};
use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const DOCUMENT_SELECT_SQL: &str = "SELECT
    doc_id,
    data,
    create_time,
    update_time
FROM documents";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for document persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { collection: String, id: String },
    InvalidData(String),
    /// The backing connection cannot be used any more.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(_) => write!(f, "database operation failed"),
            Self::NotFound { collection, id } => {
                write!(f, "document not found: {collection}/{id}")
            }
            Self::InvalidData(message) => write!(f, "invalid document data: {message}"),
            Self::Unavailable(message) => write!(f, "document store unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Collection-scoped document database contract.
///
/// Collection arguments are slash-separated collection paths such as
/// `feedback_site/data/categories`.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Reads every document of a collection, ordered by document key.
    async fn list_documents(&self, collection: &str) -> RepoResult<Vec<Document>>;
    /// Reads one document by key.
    async fn get_document(&self, collection: &str, id: &str) -> RepoResult<Option<Document>>;
    /// Creates or fully overwrites the document under `id`.
    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> RepoResult<()>;
    /// Creates a document under a repository-assigned key and returns it.
    async fn add_document(&self, collection: &str, fields: Fields) -> RepoResult<String>;
    /// Deletes one document. Absent documents are not an error.
    async fn delete_document(&self, collection: &str, id: &str) -> RepoResult<()>;
    /// Finds documents whose array `field` contains the string `value`.
    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> RepoResult<Vec<Document>>;
    /// Applies every write of `batch` or none of them.
    async fn commit_batch(&self, batch: WriteBatch) -> RepoResult<()>;
}

#[async_trait]
impl<R: DocumentRepository + ?Sized> DocumentRepository for Arc<R> {
    async fn list_documents(&self, collection: &str) -> RepoResult<Vec<Document>> {
        (**self).list_documents(collection).await
    }

    async fn get_document(&self, collection: &str, id: &str) -> RepoResult<Option<Document>> {
        (**self).get_document(collection, id).await
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> RepoResult<()> {
        (**self).set_document(collection, id, fields).await
    }

    async fn add_document(&self, collection: &str, fields: Fields) -> RepoResult<String> {
        (**self).add_document(collection, fields).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> RepoResult<()> {
        (**self).delete_document(collection, id).await
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> RepoResult<Vec<Document>> {
        (**self).query_array_contains(collection, field, value).await
    }

    async fn commit_batch(&self, batch: WriteBatch) -> RepoResult<()> {
        (**self).commit_batch(batch).await
    }
}

/// SQLite-backed document repository.
///
/// Work happens synchronously under the connection lock; no lock is held
/// across an await point.
pub struct SqliteDocumentRepository {
    conn: Mutex<Connection>,
}

impl SqliteDocumentRepository {
    /// Wraps a migrated/ready connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (or creates) a database file with the document schema.
    pub fn open(path: impl AsRef<Path>) -> RepoResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> RepoResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Returns the connection, ending the repository lifecycle.
    pub fn into_connection(self) -> RepoResult<Connection> {
        self.conn
            .into_inner()
            .map_err(|_| RepoError::Unavailable("connection lock poisoned".to_string()))
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> RepoResult<T>) -> RepoResult<T> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| RepoError::Unavailable("connection lock poisoned".to_string()))?;
        f(&mut *conn)
    }
}

#[async_trait]
impl DocumentRepository for SqliteDocumentRepository {
    async fn list_documents(&self, collection: &str) -> RepoResult<Vec<Document>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{DOCUMENT_SELECT_SQL}
                 WHERE collection = ?1
                 ORDER BY doc_id ASC;"
            ))?;
            let mut rows = stmt.query([collection])?;
            let mut documents = Vec::new();
            while let Some(row) = rows.next()? {
                documents.push(parse_document_row(row)?);
            }
            Ok(documents)
        })
    }

    async fn get_document(&self, collection: &str, id: &str) -> RepoResult<Option<Document>> {
        self.with_conn(|conn| load_document(conn, collection, id))
    }

    async fn set_document(&self, collection: &str, id: &str, fields: Fields) -> RepoResult<()> {
        let now = now_epoch_ms();
        self.with_conn(|conn| upsert_document(conn, collection, id, &resolve_fields(fields, now), now))
    }

    async fn add_document(&self, collection: &str, fields: Fields) -> RepoResult<String> {
        let now = now_epoch_ms();
        let id = generate_document_id();
        let data = resolve_fields(fields, now);
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO documents (
                    collection,
                    doc_id,
                    data,
                    create_time,
                    update_time
                ) VALUES (?1, ?2, ?3, ?4, ?4);",
                params![collection, id.as_str(), encode_data(&data)?, now],
            )?;
            Ok(())
        })?;
        Ok(id)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> RepoResult<()> {
        self.with_conn(|conn| remove_document(conn, collection, id))
    }

    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> RepoResult<Vec<Document>> {
        let path = json_field_path(field)?;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "{DOCUMENT_SELECT_SQL}
                 WHERE collection = ?1
                   AND json_type(data, ?2) = 'array'
                   AND EXISTS (
                       SELECT 1
                       FROM json_each(documents.data, ?2) AS element
                       WHERE element.type = 'text'
                         AND element.value = ?3
                   )
                 ORDER BY doc_id ASC;"
            ))?;
            let mut rows = stmt.query(params![collection, path.as_str(), value])?;
            let mut documents = Vec::new();
            while let Some(row) = rows.next()? {
                documents.push(parse_document_row(row)?);
            }
            Ok(documents)
        })
    }

    async fn commit_batch(&self, batch: WriteBatch) -> RepoResult<()> {
        let now = now_epoch_ms();
        let writes = batch.len();
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            for op in batch.into_ops() {
                apply_write(&tx, op, now)?;
            }
            tx.commit()?;
            Ok(())
        })?;
        debug!("event=batch_commit module=repo status=ok writes={writes}");
        Ok(())
    }
}

fn apply_write(conn: &Connection, op: WriteOp, now: i64) -> RepoResult<()> {
    match op {
        WriteOp::Set {
            collection,
            id,
            fields,
        } => upsert_document(conn, &collection, &id, &resolve_fields(fields, now), now),
        WriteOp::Update {
            collection,
            id,
            fields,
        } => {
            let Some(existing) = load_document(conn, &collection, &id)? else {
                return Err(RepoError::NotFound { collection, id });
            };
            let mut data = existing.data;
            data.extend(resolve_fields(fields, now));
            conn.execute(
                "UPDATE documents
                 SET
                    data = ?3,
                    update_time = ?4
                 WHERE collection = ?1
                   AND doc_id = ?2;",
                params![collection, id, encode_data(&data)?, now],
            )?;
            Ok(())
        }
        WriteOp::Delete { collection, id } => remove_document(conn, &collection, &id),
    }
}

fn load_document(conn: &Connection, collection: &str, id: &str) -> RepoResult<Option<Document>> {
    let mut stmt = conn.prepare(&format!(
        "{DOCUMENT_SELECT_SQL}
         WHERE collection = ?1
           AND doc_id = ?2;"
    ))?;
    let document = stmt
        .query_row(params![collection, id], |row| Ok(parse_document_row(row)))
        .optional()?;
    document.transpose()
}

fn upsert_document(
    conn: &Connection,
    collection: &str,
    id: &str,
    data: &DocumentData,
    now: i64,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO documents (
            collection,
            doc_id,
            data,
            create_time,
            update_time
        ) VALUES (?1, ?2, ?3, ?4, ?4)
        ON CONFLICT (collection, doc_id) DO UPDATE SET
            data = excluded.data,
            update_time = excluded.update_time;",
        params![collection, id, encode_data(data)?, now],
    )?;
    Ok(())
}

fn remove_document(conn: &Connection, collection: &str, id: &str) -> RepoResult<()> {
    conn.execute(
        "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
        params![collection, id],
    )?;
    Ok(())
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<Document> {
    let id: String = row.get("doc_id")?;
    let raw: String = row.get("data")?;
    let data = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return Err(RepoError::InvalidData(format!(
                "document `{id}` payload is not a JSON object"
            )));
        }
        Err(err) => {
            return Err(RepoError::InvalidData(format!(
                "document `{id}` payload is not valid JSON: {err}"
            )));
        }
    };

    Ok(Document {
        id,
        data,
        create_time: row.get("create_time")?,
        update_time: row.get("update_time")?,
    })
}

fn encode_data(data: &DocumentData) -> RepoResult<String> {
    serde_json::to_string(data)
        .map_err(|err| RepoError::InvalidData(format!("unable to encode document: {err}")))
}

fn json_field_path(field: &str) -> RepoResult<String> {
    if field.is_empty() || field.contains('"') {
        return Err(RepoError::InvalidData(format!(
            "unsupported query field name `{field}`"
        )));
    }
    Ok(format!("$.\"{field}\""))
}

fn generate_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::{json_field_path, RepoError};
    use crate::db::DbError;
    use std::error::Error;

    #[test]
    fn db_variant_leaves_the_cause_to_source() {
        let err = RepoError::from(rusqlite::Error::QueryReturnedNoRows);
        let cause = rusqlite::Error::QueryReturnedNoRows.to_string();

        assert_eq!(err.to_string(), "database operation failed");
        let source = err.source().unwrap();
        assert!(source.downcast_ref::<DbError>().is_some());
        assert_eq!(source.to_string(), cause);
    }

    #[test]
    fn field_paths_are_quoted() {
        assert_eq!(json_field_path("categories").unwrap(), "$.\"categories\"");
        assert!(json_field_path("").is_err());
    }
}
