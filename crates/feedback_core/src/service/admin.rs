//! Administrative one-shot operations: data seeding and security rules.
//!
//! # Responsibility
//! - Write the fixed seed datasets through atomic batches.
//! - Render the security-rules document for manual application.
//!
//! # Invariants
//! - Each dataset is written by exactly one batch; a failed batch leaves its
//!   collection untouched and does not stop the next batch.

use crate::config::CollectionPaths;
use crate::fixtures::{seed_categories, seed_feedback};
use crate::repo::document::{FieldValue, Fields, WriteBatch};
use crate::repo::document_repo::{DocumentRepository, RepoError};
use log::{error, info};

/// Seeding stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedStep {
    Categories,
    Feedback,
}

impl SeedStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Feedback => "feedback",
        }
    }
}

#[derive(Debug)]
pub struct SeedFailure {
    pub step: SeedStep,
    pub error: RepoError,
}

/// Outcome of [`seed_store`].
#[derive(Debug, Default)]
pub struct SeedReport {
    pub categories_written: usize,
    pub feedback_written: usize,
    pub failures: Vec<SeedFailure>,
}

impl SeedReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes the seed categories, then the seed feedback.
///
/// Categories are keyed by their ids; feedback items are keyed
/// `feedback-<n>` (1-based) and carry a server-assigned `createdAt`.
/// Re-running overwrites the same documents.
pub async fn seed_store<R>(repo: &R, collections: &CollectionPaths) -> SeedReport
where
    R: DocumentRepository + ?Sized,
{
    let mut report = SeedReport::default();
    info!("event=seed module=admin status=start");

    let categories = seed_categories();
    let mut batch = WriteBatch::new();
    for category in &categories {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), FieldValue::from(category.name.as_str()));
        batch.set(&collections.categories, &category.id, fields);
    }
    match repo.commit_batch(batch).await {
        Ok(()) => report.categories_written = categories.len(),
        Err(err) => record_failure(&mut report, SeedStep::Categories, err),
    }

    let feedback = seed_feedback();
    let mut batch = WriteBatch::new();
    for (index, (text, category_ids)) in feedback.iter().enumerate() {
        let mut fields = Fields::new();
        fields.insert("text".to_string(), FieldValue::from(text.as_str()));
        fields.insert(
            "categories".to_string(),
            FieldValue::from(category_ids.clone()),
        );
        fields.insert("createdAt".to_string(), FieldValue::ServerTimestamp);
        batch.set(
            &collections.feedback_items,
            &format!("feedback-{}", index + 1),
            fields,
        );
    }
    match repo.commit_batch(batch).await {
        Ok(()) => report.feedback_written = feedback.len(),
        Err(err) => record_failure(&mut report, SeedStep::Feedback, err),
    }

    info!(
        "event=seed module=admin status={} categories_written={} feedback_written={}",
        if report.is_complete() { "ok" } else { "error" },
        report.categories_written,
        report.feedback_written
    );
    report
}

fn record_failure(report: &mut SeedReport, step: SeedStep, error: RepoError) {
    error!(
        "event=seed module=admin status=error step={} error={error}",
        step.as_str()
    );
    report.failures.push(SeedFailure { step, error });
}

/// Security rules: public read and authenticated write on the two
/// collections, everything else denied.
pub fn security_rules(collections: &CollectionPaths) -> String {
    format!(
        "rules_version = '2';
service cloud.firestore {{
  match /databases/{{database}}/documents {{
    // Public read access to the feedback and categories collections
    match /{categories}/{{document=**}} {{
      allow read: if true;
      allow write: if request.auth != null;
    }}
    match /{feedback_items}/{{document=**}} {{
      allow read: if true;
      allow write: if request.auth != null;
    }}
    // Default - block everything else
    match /{{document=**}} {{
      allow read, write: if false;
    }}
  }}
}}",
        categories = collections.categories,
        feedback_items = collections.feedback_items,
    )
}

/// Console page where the rules are applied by hand.
pub fn rules_console_url(project_id: &str) -> String {
    format!("https://console.firebase.google.com/project/{project_id}/firestore/rules")
}

/// Manual steps shown after the rules text.
pub fn rules_instructions(project_id: &str) -> String {
    format!(
        "Security rules cannot be applied from here. Update them manually:\n\
         1. Go to {}\n\
         2. Replace the existing rules with the rules printed above\n\
         3. Click 'Publish' to save the changes",
        rules_console_url(project_id)
    )
}
