use feedback_core::db::schema::{stored_schema_version, SCHEMA_VERSION};
use feedback_core::{
    DocumentRepository, FieldValue, Fields, RepoError, SqliteDocumentRepository, WriteBatch,
};
use serde_json::json;

const COLLECTION: &str = "feedback_site/data/feedback_items";

fn fields(pairs: &[(&str, FieldValue)]) -> Fields {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn tagged(text: &str, categories: &[&str]) -> Fields {
    fields(&[
        ("text", FieldValue::from(text)),
        ("categories", FieldValue::from(json!(categories))),
    ])
}

#[tokio::test]
async fn set_overwrites_whole_document_and_keeps_create_time() {
    let repo = SqliteDocumentRepository::open_in_memory().unwrap();
    repo.set_document(
        COLLECTION,
        "doc-1",
        fields(&[
            ("text", FieldValue::from("first")),
            ("extra", FieldValue::from("x")),
        ]),
    )
    .await
    .unwrap();
    let first = repo.get_document(COLLECTION, "doc-1").await.unwrap().unwrap();

    repo.set_document(COLLECTION, "doc-1", fields(&[("text", FieldValue::from("second"))]))
        .await
        .unwrap();
    let second = repo.get_document(COLLECTION, "doc-1").await.unwrap().unwrap();

    assert_eq!(second.str_field("text"), Some("second"));
    assert!(second.data.get("extra").is_none());
    assert_eq!(second.create_time, first.create_time);
    assert!(second.update_time >= first.update_time);
}

#[tokio::test]
async fn add_assigns_distinct_keys_and_resolves_server_timestamp() {
    let repo = SqliteDocumentRepository::open_in_memory().unwrap();
    let with_timestamp = fields(&[
        ("text", FieldValue::from("hello")),
        ("timestamp", FieldValue::ServerTimestamp),
    ]);

    let first = repo.add_document(COLLECTION, with_timestamp.clone()).await.unwrap();
    let second = repo.add_document(COLLECTION, with_timestamp).await.unwrap();
    assert_ne!(first, second);

    let stored = repo.get_document(COLLECTION, &first).await.unwrap().unwrap();
    assert_eq!(stored.i64_field("timestamp"), Some(stored.create_time));
}

#[tokio::test]
async fn collections_are_isolated_and_listed_by_key() {
    let repo = SqliteDocumentRepository::open_in_memory().unwrap();
    repo.set_document(COLLECTION, "b", tagged("b", &[])).await.unwrap();
    repo.set_document(COLLECTION, "a", tagged("a", &[])).await.unwrap();
    repo.set_document("other/data/items", "c", tagged("c", &[]))
        .await
        .unwrap();

    let listed = repo.list_documents(COLLECTION).await.unwrap();
    let ids: Vec<&str> = listed.iter().map(|doc| doc.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn delete_is_a_no_op_for_absent_documents() {
    let repo = SqliteDocumentRepository::open_in_memory().unwrap();
    repo.set_document(COLLECTION, "keep", tagged("keep", &[]))
        .await
        .unwrap();

    repo.delete_document(COLLECTION, "missing").await.unwrap();
    repo.delete_document(COLLECTION, "keep").await.unwrap();
    repo.delete_document(COLLECTION, "keep").await.unwrap();

    assert!(repo.get_document(COLLECTION, "keep").await.unwrap().is_none());
}

#[tokio::test]
async fn array_contains_matches_exact_elements_of_array_fields_only() {
    let repo = SqliteDocumentRepository::open_in_memory().unwrap();
    repo.set_document(COLLECTION, "hit", tagged("hit", &["assessment", "lesson-planning"]))
        .await
        .unwrap();
    repo.set_document(COLLECTION, "prefix", tagged("prefix", &["assessment-extra"]))
        .await
        .unwrap();
    repo.set_document(
        COLLECTION,
        "scalar",
        fields(&[
            ("text", FieldValue::from("scalar")),
            ("categories", FieldValue::from("assessment")),
        ]),
    )
    .await
    .unwrap();
    repo.set_document(COLLECTION, "none", fields(&[("text", FieldValue::from("none"))]))
        .await
        .unwrap();

    let found = repo
        .query_array_contains(COLLECTION, "categories", "assessment")
        .await
        .unwrap();
    let ids: Vec<&str> = found.iter().map(|doc| doc.id.as_str()).collect();
    assert_eq!(ids, vec!["hit"]);
}

#[tokio::test]
async fn array_contains_rejects_quoted_field_names() {
    let repo = SqliteDocumentRepository::open_in_memory().unwrap();
    let err = repo
        .query_array_contains(COLLECTION, "bad\"field", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}

#[tokio::test]
async fn batch_update_merges_fields() {
    let repo = SqliteDocumentRepository::open_in_memory().unwrap();
    repo.set_document(COLLECTION, "doc", tagged("keep me", &["a", "b"]))
        .await
        .unwrap();

    let mut batch = WriteBatch::new();
    batch.update(
        COLLECTION,
        "doc",
        fields(&[("categories", FieldValue::from(json!(["b"])))]),
    );
    repo.commit_batch(batch).await.unwrap();

    let stored = repo.get_document(COLLECTION, "doc").await.unwrap().unwrap();
    assert_eq!(stored.str_field("text"), Some("keep me"));
    assert_eq!(stored.data.get("categories"), Some(&json!(["b"])));
}

#[tokio::test]
async fn failing_batch_rolls_back_every_earlier_write() {
    let repo = SqliteDocumentRepository::open_in_memory().unwrap();
    repo.set_document(COLLECTION, "existing", tagged("existing", &["a"]))
        .await
        .unwrap();

    let mut batch = WriteBatch::new();
    batch
        .delete(COLLECTION, "existing")
        .set(COLLECTION, "new", tagged("new", &[]))
        .update(COLLECTION, "missing", Fields::new());
    assert_eq!(batch.len(), 3);

    let err = repo.commit_batch(batch).await.unwrap_err();
    assert!(matches!(err, RepoError::NotFound { ref id, .. } if id == "missing"));

    assert!(repo.get_document(COLLECTION, "existing").await.unwrap().is_some());
    assert!(repo.get_document(COLLECTION, "new").await.unwrap().is_none());
}

#[tokio::test]
async fn file_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite3");

    {
        let repo = SqliteDocumentRepository::open(&path).unwrap();
        repo.set_document(COLLECTION, "durable", tagged("durable", &["x"]))
            .await
            .unwrap();
    }

    let reopened = SqliteDocumentRepository::open(&path).unwrap();
    let stored = reopened
        .get_document(COLLECTION, "durable")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.str_field("text"), Some("durable"));

    let conn = reopened.into_connection().unwrap();
    assert_eq!(stored_schema_version(&conn).unwrap(), SCHEMA_VERSION);
}
