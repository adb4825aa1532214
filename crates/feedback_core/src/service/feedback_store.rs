//! Feedback/category store façade.
//!
//! # Responsibility
//! - Expose load/add/delete for categories and feedback items behind one
//!   mode-independent surface.
//! - Map stored documents into domain records.
//!
//! # Invariants
//! - The environment probe is consulted on every call; local mode never
//!   touches the repository.
//! - Reads never fail: a failed read (and, under the default policy, an
//!   empty read) degrades to the mock dataset once, without retry.
//! - Writes always surface repository failures to the caller.
//! - Deleting a category removes the category document and its id from
//!   every referencing feedback item in one atomic batch.

use crate::config::{CollectionPaths, StoreConfig};
use crate::env::{EnvironmentProbe, Mode, ModeSetting};
use crate::fixtures::{mock_categories, mock_feedback};
use crate::model::category::{Category, CategoryId};
use crate::model::feedback::FeedbackItem;
use crate::repo::document::{now_epoch_ms, Document, FieldValue, Fields, WriteBatch};
use crate::repo::document_repo::{DocumentRepository, RepoError};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const FIELD_NAME: &str = "name";
const FIELD_TEXT: &str = "text";
const FIELD_CATEGORIES: &str = "categories";
const FIELD_TIMESTAMP: &str = "timestamp";
const FIELD_CREATED_AT: &str = "createdAt";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure surfaced by a write operation.
#[derive(Debug)]
pub enum StoreError {
    Write {
        operation: &'static str,
        source: RepoError,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Write { operation, .. } => write!(f, "{operation} failed"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write { source, .. } => Some(source),
        }
    }
}

/// When a remote bulk read is replaced by the mock dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Empty collections and failed reads both yield mock data.
    #[default]
    FallbackOnEmptyOrError,
    /// Only failed reads yield mock data; an empty collection stays empty.
    FallbackOnError,
}

/// Why a remote read returned mock data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    Empty,
    ReadFailed,
}

/// Where a bulk load's items came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Local mode.
    Mock,
    Remote,
    Fallback(FallbackReason),
}

impl DataSource {
    fn label(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Remote => "remote",
            Self::Fallback(FallbackReason::Empty) => "fallback_empty",
            Self::Fallback(FallbackReason::ReadFailed) => "fallback_read_failed",
        }
    }
}

/// Items of a bulk load along with their origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub source: DataSource,
}

/// Feedback store over an injected document repository.
pub struct FeedbackStore<R, E = ModeSetting> {
    repo: R,
    probe: E,
    collections: CollectionPaths,
    read_policy: ReadPolicy,
}

impl<R: DocumentRepository> FeedbackStore<R, ModeSetting> {
    /// Builds a store using the configured mode, read policy and collections.
    pub fn from_config(repo: R, config: &StoreConfig) -> Self {
        Self::new(repo, config.mode, config.collections.clone())
            .with_read_policy(config.read_policy)
    }
}

impl<R, E> FeedbackStore<R, E>
where
    R: DocumentRepository,
    E: EnvironmentProbe,
{
    pub fn new(repo: R, probe: E, collections: CollectionPaths) -> Self {
        Self {
            repo,
            probe,
            collections,
            read_policy: ReadPolicy::default(),
        }
    }

    pub fn with_read_policy(mut self, read_policy: ReadPolicy) -> Self {
        self.read_policy = read_policy;
        self
    }

    /// Mode the probe reports right now.
    pub fn mode(&self) -> Mode {
        self.probe.mode()
    }

    pub fn read_policy(&self) -> ReadPolicy {
        self.read_policy
    }

    pub fn collections(&self) -> &CollectionPaths {
        &self.collections
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Ends the store lifecycle and hands the repository back.
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// Loads every category. Never fails; see [`ReadPolicy`].
    pub async fn load_categories(&self) -> Vec<Category> {
        self.load_categories_with_source().await.items
    }

    pub async fn load_categories_with_source(&self) -> Loaded<Category> {
        self.load_with_fallback(
            "load_categories",
            &self.collections.categories,
            mock_categories,
            category_from_document,
        )
        .await
    }

    /// Loads every feedback item. Never fails; see [`ReadPolicy`].
    pub async fn load_feedback(&self) -> Vec<FeedbackItem> {
        self.load_feedback_with_source().await.items
    }

    pub async fn load_feedback_with_source(&self) -> Loaded<FeedbackItem> {
        self.load_with_fallback(
            "load_feedback",
            &self.collections.feedback_items,
            mock_feedback,
            feedback_from_document,
        )
        .await
    }

    /// Stores `{name}` under the caller-chosen key `id`.
    ///
    /// No collision check is made: an existing category with the same id is
    /// overwritten.
    pub async fn add_category(
        &self,
        name: impl Into<String>,
        id: impl Into<CategoryId>,
    ) -> StoreResult<Category> {
        let category = Category::new(id, name);
        if self.probe.mode() == Mode::Local {
            info!(
                "event=add_category module=store status=ok mode=local persisted=false category_id={}",
                category.id
            );
            return Ok(category);
        }

        let mut fields = Fields::new();
        fields.insert(FIELD_NAME.to_string(), FieldValue::from(category.name.as_str()));
        self.repo
            .set_document(&self.collections.categories, &category.id, fields)
            .await
            .map_err(write_failure("add_category"))?;

        info!(
            "event=add_category module=store status=ok mode=remote category_id={}",
            category.id
        );
        Ok(category)
    }

    /// Stores a new feedback item under a repository-assigned key.
    pub async fn add_feedback(
        &self,
        text: impl Into<String>,
        categories: Vec<CategoryId>,
    ) -> StoreResult<FeedbackItem> {
        let text = text.into();
        if self.probe.mode() == Mode::Local {
            let item = FeedbackItem::new(local_feedback_id(), text, categories);
            info!(
                "event=add_feedback module=store status=ok mode=local persisted=false feedback_id={} category_count={}",
                item.id,
                item.categories.len()
            );
            return Ok(item);
        }

        let mut fields = Fields::new();
        fields.insert(FIELD_TEXT.to_string(), FieldValue::from(text.as_str()));
        fields.insert(
            FIELD_CATEGORIES.to_string(),
            FieldValue::from(categories.clone()),
        );
        fields.insert(FIELD_TIMESTAMP.to_string(), FieldValue::ServerTimestamp);
        let id = self
            .repo
            .add_document(&self.collections.feedback_items, fields)
            .await
            .map_err(write_failure("add_feedback"))?;

        info!(
            "event=add_feedback module=store status=ok mode=remote feedback_id={} category_count={}",
            id,
            categories.len()
        );
        Ok(FeedbackItem::new(id, text, categories))
    }

    /// Deletes a category and strips its id from every feedback item, all in
    /// one atomic batch.
    pub async fn delete_category(&self, id: &str) -> StoreResult<()> {
        if self.probe.mode() == Mode::Local {
            info!(
                "event=delete_category module=store status=ok mode=local persisted=false category_id={id}"
            );
            return Ok(());
        }

        let referencing = self
            .repo
            .query_array_contains(&self.collections.feedback_items, FIELD_CATEGORIES, id)
            .await
            .map_err(write_failure("delete_category"))?;

        let mut batch = WriteBatch::new();
        batch.delete(&self.collections.categories, id);
        for document in &referencing {
            let mut fields = Fields::new();
            fields.insert(
                FIELD_CATEGORIES.to_string(),
                FieldValue::Value(Value::Array(categories_without(document, id))),
            );
            batch.update(&self.collections.feedback_items, &document.id, fields);
        }

        self.repo
            .commit_batch(batch)
            .await
            .map_err(write_failure("delete_category"))?;

        info!(
            "event=delete_category module=store status=ok mode=remote category_id={id} references_cleaned={}",
            referencing.len()
        );
        Ok(())
    }

    /// Deletes one feedback item. Deleting an absent id succeeds.
    pub async fn delete_feedback(&self, id: &str) -> StoreResult<()> {
        if self.probe.mode() == Mode::Local {
            info!(
                "event=delete_feedback module=store status=ok mode=local persisted=false feedback_id={id}"
            );
            return Ok(());
        }

        self.repo
            .delete_document(&self.collections.feedback_items, id)
            .await
            .map_err(write_failure("delete_feedback"))?;

        info!("event=delete_feedback module=store status=ok mode=remote feedback_id={id}");
        Ok(())
    }

    async fn load_with_fallback<T>(
        &self,
        event: &'static str,
        collection: &str,
        fallback: fn() -> Vec<T>,
        map: fn(&Document) -> T,
    ) -> Loaded<T> {
        if self.probe.mode() == Mode::Local {
            return finish_load(event, fallback(), DataSource::Mock);
        }

        let documents = match self.repo.list_documents(collection).await {
            Ok(documents) => documents,
            Err(err) => {
                error!(
                    "event={event} module=store status=fallback reason=read_failed collection={collection} error={err}"
                );
                return finish_load(
                    event,
                    fallback(),
                    DataSource::Fallback(FallbackReason::ReadFailed),
                );
            }
        };

        let items: Vec<T> = documents.iter().map(map).collect();

        if items.is_empty() && self.read_policy == ReadPolicy::FallbackOnEmptyOrError {
            warn!("event={event} module=store status=fallback reason=empty collection={collection}");
            return finish_load(event, fallback(), DataSource::Fallback(FallbackReason::Empty));
        }

        finish_load(event, items, DataSource::Remote)
    }
}

fn finish_load<T>(event: &'static str, items: Vec<T>, source: DataSource) -> Loaded<T> {
    info!(
        "event={event} module=store status=ok source={} count={}",
        source.label(),
        items.len()
    );
    Loaded { items, source }
}

fn write_failure(operation: &'static str) -> impl FnOnce(RepoError) -> StoreError {
    move |source| {
        error!("event={operation} module=store status=error error={source}");
        StoreError::Write { operation, source }
    }
}

/// Unique id for feedback created in local mode: creation time plus a
/// random suffix, so two calls in the same millisecond still differ.
fn local_feedback_id() -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("mock-{}-{}", now_epoch_ms(), &random[..8])
}

fn categories_without(document: &Document, id: &str) -> Vec<Value> {
    match document.data.get(FIELD_CATEGORIES) {
        Some(Value::Array(values)) => values
            .iter()
            .filter(|value| value.as_str() != Some(id))
            .cloned()
            .collect(),
        _ => Vec::new(),
    }
}

/// Missing or non-string `name` maps to an empty name.
fn category_from_document(document: &Document) -> Category {
    Category::new(
        document.id.clone(),
        document.str_field(FIELD_NAME).unwrap_or_default(),
    )
}

/// Missing `text` maps to empty text; a missing or non-array `categories`
/// field maps to no categories, and non-string entries are dropped.
fn feedback_from_document(document: &Document) -> FeedbackItem {
    let categories = match document.data.get(FIELD_CATEGORIES) {
        Some(Value::Array(values)) => values
            .iter()
            .filter_map(|value| value.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };

    let created_at = document
        .i64_field(FIELD_TIMESTAMP)
        .or_else(|| document.i64_field(FIELD_CREATED_AT));

    FeedbackItem {
        id: document.id.clone(),
        text: document.str_field(FIELD_TEXT).unwrap_or_default().to_string(),
        categories,
        created_at,
    }
}
