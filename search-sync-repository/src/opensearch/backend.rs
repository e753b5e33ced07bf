//! OpenSearch backend implementation.
//!
//! This module provides the concrete implementation of `SearchBackend`
//! using the OpenSearch Rust crate.

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    BulkParts, DeleteParts, OpenSearch,
};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};
use url::Url;

use search_sync_shared::ChangeRecord;

use crate::errors::SearchIndexError;
use crate::interfaces::SearchBackend;
use crate::opensearch::index_config::IndexConfig;
use crate::types::{ImportAction, ImportResult, ImportSummary};

/// OpenSearch backend implementation.
///
/// Imports go through the `_bulk` API: inserts use `create` actions, so an id
/// that already exists is reported as a per-document failure, and upserts use
/// `index` actions, which replace the whole document.
///
/// # Example
///
/// ```ignore
/// use search_sync_repository::opensearch::{IndexConfig, OpenSearchBackend};
/// let backend = OpenSearchBackend::new("http://localhost:9200", IndexConfig::default())?;
/// backend.ping().await?;
/// backend.delete("articles", "42").await?;
/// ```
pub struct OpenSearchBackend {
    client: OpenSearch,
    index_config: IndexConfig,
}

impl OpenSearchBackend {
    /// Create a new OpenSearch backend for the specified URL.
    ///
    /// No request is sent; use [`OpenSearchBackend::ping`] to check reachability.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `index_config` - Mapping from collection names to index names
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchBackend)` - A new backend instance
    /// * `Err(SearchIndexError)` - If the URL or transport setup is invalid
    pub fn new(url: &str, index_config: IndexConfig) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %url,
            prefix = ?index_config.prefix,
            "Created OpenSearch backend"
        );

        Ok(Self {
            client,
            index_config,
        })
    }

    /// Check that the cluster answers requests.
    pub async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping failed with status {}",
                status
            )));
        }
        Ok(())
    }

    /// Bulk action name used for an import action.
    fn bulk_action(action: ImportAction) -> &'static str {
        match action {
            ImportAction::Create => "create",
            ImportAction::Upsert => "index",
        }
    }

    /// Build the newline-delimited bulk body: one action line and one source line per record.
    fn bulk_operations(
        records: &[ChangeRecord],
        action: ImportAction,
    ) -> Result<Vec<Value>, SearchIndexError> {
        let bulk_action = Self::bulk_action(action);
        let mut operations = Vec::with_capacity(records.len() * 2);

        for (position, record) in records.iter().enumerate() {
            let id = record.id().ok_or_else(|| {
                SearchIndexError::validation(format!("record at position {} has no id", position))
            })?;

            let mut header = Map::new();
            header.insert(bulk_action.to_string(), json!({ "_id": id }));
            operations.push(Value::Object(header));
            operations.push(record.clone().into_value());
        }

        Ok(operations)
    }

    /// Describe a bulk item error object as `type: reason`.
    fn describe_item_error(error: &Value) -> String {
        let kind = error.get("type").and_then(Value::as_str);
        let reason = error.get("reason").and_then(Value::as_str);
        match (kind, reason) {
            (Some(kind), Some(reason)) => format!("{}: {}", kind, reason),
            (None, Some(reason)) => reason.to_string(),
            _ => error.to_string(),
        }
    }

    /// Turn a bulk response into per-document results.
    ///
    /// Items come back in request order, so they are matched to records by position.
    fn parse_bulk_response(
        records: &[ChangeRecord],
        action: ImportAction,
        response: &Value,
    ) -> Result<ImportSummary, SearchIndexError> {
        let items = response
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchIndexError::parse("Bulk response has no items"))?;

        if items.len() != records.len() {
            return Err(SearchIndexError::parse(format!(
                "Bulk response has {} items for {} documents",
                items.len(),
                records.len()
            )));
        }

        let bulk_action = Self::bulk_action(action);
        let results = items
            .iter()
            .zip(records)
            .map(|(item, record)| {
                let document_id = record.id().unwrap_or_default();
                let Some(outcome) = item.get(bulk_action) else {
                    return ImportResult::failed(
                        document_id,
                        SearchIndexError::parse(format!("Bulk item has no '{}' entry", bulk_action)),
                    );
                };

                if let Some(item_error) = outcome.get("error") {
                    return ImportResult::failed(
                        document_id,
                        SearchIndexError::import(Self::describe_item_error(item_error)),
                    );
                }

                match outcome.get("status").and_then(Value::as_u64) {
                    Some(status) if (200..300).contains(&status) => {
                        ImportResult::succeeded(document_id)
                    }
                    Some(status) => ImportResult::failed(
                        document_id,
                        SearchIndexError::import(format!("Document rejected with status {}", status)),
                    ),
                    None => ImportResult::failed(
                        document_id,
                        SearchIndexError::unknown("Bulk item has no status"),
                    ),
                }
            })
            .collect();

        Ok(ImportSummary::from_results(results))
    }
}

#[async_trait]
impl SearchBackend for OpenSearchBackend {
    /// Import documents with a single `_bulk` request.
    ///
    /// # Returns
    ///
    /// * `Ok(ImportSummary)` - Per-document outcome parsed from the bulk response
    /// * `Err(SearchIndexError)` - If the request fails or the response cannot be parsed
    async fn import(
        &self,
        collection: &str,
        records: &[ChangeRecord],
        action: ImportAction,
    ) -> Result<ImportSummary, SearchIndexError> {
        if records.is_empty() {
            return Ok(ImportSummary::default());
        }

        let index = self.index_config.index_name(collection);
        let body: Vec<JsonBody<Value>> = Self::bulk_operations(records, action)?
            .into_iter()
            .map(Into::into)
            .collect();

        let response = self
            .client
            .bulk(BulkParts::Index(&index))
            .body(body)
            .send()
            .await
            .map_err(|e| SearchIndexError::import(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, index = %index, "Bulk request failed");
            return Err(SearchIndexError::import(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        let summary = Self::parse_bulk_response(records, action, &response_body)?;

        debug!(
            index = %index,
            action = %action,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk import completed"
        );
        Ok(summary)
    }

    /// Delete a document. A missing document (404) counts as deleted.
    async fn delete(&self, collection: &str, document_id: &str) -> Result<(), SearchIndexError> {
        let index = self.index_config.index_name(collection);

        let response = self
            .client
            .delete(DeleteParts::IndexId(&index, document_id))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(index = %index, document_id = %document_id, "Document deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<ChangeRecord> {
        vec![
            ChangeRecord::with_id("1").with_field("title", json!("Dune")),
            ChangeRecord::with_id("2").with_field("title", json!("Emma")),
        ]
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let result = OpenSearchBackend::new("not a url", IndexConfig::default());
        assert!(matches!(result, Err(SearchIndexError::ConnectionError(_))));
    }

    #[test]
    fn test_bulk_operations_create() {
        let operations = OpenSearchBackend::bulk_operations(&records(), ImportAction::Create).unwrap();

        assert_eq!(operations.len(), 4);
        assert_eq!(operations[0], json!({"create": {"_id": "1"}}));
        assert_eq!(operations[1], json!({"id": "1", "title": "Dune"}));
        assert_eq!(operations[2], json!({"create": {"_id": "2"}}));
    }

    #[test]
    fn test_bulk_operations_upsert_uses_index_action() {
        let operations = OpenSearchBackend::bulk_operations(&records(), ImportAction::Upsert).unwrap();

        assert_eq!(operations[0], json!({"index": {"_id": "1"}}));
        assert_eq!(operations[2], json!({"index": {"_id": "2"}}));
    }

    #[test]
    fn test_bulk_operations_requires_id() {
        let result =
            OpenSearchBackend::bulk_operations(&[ChangeRecord::new()], ImportAction::Create);
        assert!(matches!(result, Err(SearchIndexError::ValidationError(_))));
    }

    #[test]
    fn test_parse_bulk_response_all_succeeded() {
        let response = json!({
            "took": 3,
            "errors": false,
            "items": [
                {"create": {"_id": "1", "status": 201}},
                {"create": {"_id": "2", "status": 201}}
            ]
        });

        let summary =
            OpenSearchBackend::parse_bulk_response(&records(), ImportAction::Create, &response)
                .unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 0);
    }

    #[test]
    fn test_parse_bulk_response_partial_failure() {
        let response = json!({
            "errors": true,
            "items": [
                {"create": {"_id": "1", "status": 201}},
                {"create": {
                    "_id": "2",
                    "status": 409,
                    "error": {"type": "version_conflict_engine_exception", "reason": "document already exists"}
                }}
            ]
        });

        let summary =
            OpenSearchBackend::parse_bulk_response(&records(), ImportAction::Create, &response)
                .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        let failure = summary.failures().next().unwrap();
        assert_eq!(failure.document_id, "2");
        match &failure.error {
            Some(SearchIndexError::ImportError(msg)) => {
                assert_eq!(msg, "version_conflict_engine_exception: document already exists")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_parse_bulk_response_wrong_action_key() {
        let response = json!({
            "items": [
                {"index": {"_id": "1", "status": 200}},
                {"index": {"_id": "2", "status": 200}}
            ]
        });

        let summary =
            OpenSearchBackend::parse_bulk_response(&records(), ImportAction::Create, &response)
                .unwrap();

        assert_eq!(summary.failed, 2);
    }

    #[test]
    fn test_parse_bulk_response_item_count_mismatch() {
        let response = json!({"items": [{"index": {"_id": "1", "status": 200}}]});

        let result =
            OpenSearchBackend::parse_bulk_response(&records(), ImportAction::Upsert, &response);

        assert!(matches!(result, Err(SearchIndexError::ParseError(_))));
    }

    #[test]
    fn test_parse_bulk_response_missing_items() {
        let result =
            OpenSearchBackend::parse_bulk_response(&records(), ImportAction::Upsert, &json!({}));
        assert!(matches!(result, Err(SearchIndexError::ParseError(_))));
    }
}
