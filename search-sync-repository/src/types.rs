//! Request and response types for search backend operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::SearchIndexError;

/// Write semantics of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    /// Insert new documents. Importing an id that already exists is a per-document failure.
    Create,
    /// Insert new documents or fully replace existing ones.
    Upsert,
}

impl ImportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Upsert => "upsert",
        }
    }
}

impl fmt::Display for ImportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an import for a single document.
///
/// Indicates whether the backend accepted the document and carries the error
/// details if it was rejected.
#[derive(Debug, Clone)]
pub struct ImportResult {
    /// The document identifier.
    pub document_id: String,
    /// Whether the document was written.
    pub success: bool,
    /// Error if the document was rejected.
    pub error: Option<SearchIndexError>,
}

impl ImportResult {
    pub fn succeeded(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(document_id: impl Into<String>, error: SearchIndexError) -> Self {
        Self {
            document_id: document_id.into(),
            success: false,
            error: Some(error),
        }
    }
}

/// Summary of an import containing aggregate statistics and individual results.
///
/// A bulk import can partially succeed; the summary lets callers report
/// rejected documents without treating the whole call as failed.
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Total number of documents in the import.
    pub total: usize,
    /// Number of documents written.
    pub succeeded: usize,
    /// Number of documents rejected.
    pub failed: usize,
    /// Individual results for each document.
    pub results: Vec<ImportResult>,
}

impl ImportSummary {
    /// Build a summary from individual results.
    pub fn from_results(results: Vec<ImportResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: ImportSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.results.extend(other.results);
    }

    /// Results of the rejected documents.
    pub fn failures(&self) -> impl Iterator<Item = &ImportResult> {
        self.results.iter().filter(|r| !r.success)
    }
}
