use crate::connection::{Connection, DatabaseInner};
use crate::errors::{StoreError, StoreResult};
use crate::query::{order_key, Filter, Query};
use crate::subscriber::{ChangeCallback, Subscription};
use crate::Document;
use dashmap::DashMap;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{instrument, trace};
use ulid::Ulid;

/// Handle on one named collection of schema-less documents. Documents are
/// keyed by id; bodies are json objects that never contain the id itself.
#[derive(Clone)]
pub struct Collection {
    database: Arc<DatabaseInner>,
    documents: Arc<DashMap<String, JsonValue>>,
    name: String,
}

impl Collection {
    pub(crate) fn new(connection: &Connection, name: &str) -> Self {
        let documents = connection
            .database
            .collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(DashMap::new()))
            .value()
            .clone();

        Self {
            database: connection.database.clone(),
            documents,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self))]
    pub fn get<T: Document>(&self, document_id: &str) -> StoreResult<Option<T>> {
        trace!("Get document");
        let stored = self
            .documents
            .get(document_id)
            .map(|entry| entry.value().clone());

        match stored {
            Some(value) => {
                let mut document: T =
                    serde_json::from_value(value).map_err(StoreError::parse_error)?;
                document.set_document_id(document_id);
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    /// Upserts the full document body under its id.
    #[instrument(skip(self, document))]
    pub fn set<T: Document>(&self, document: &T) -> StoreResult<()> {
        trace!("Save document");
        let document_id = document.get_document_id();
        if document_id.is_empty() {
            return Err(StoreError::operation_failed(
                "cannot save a document without an id",
            ));
        }

        let value = serde_json::to_value(document).map_err(StoreError::parse_error)?;
        let old = self.documents.insert(document_id.clone(), value.clone());
        self.database
            .notify_change(&self.name, &document_id, old.as_ref(), Some(&value));
        Ok(())
    }

    /// Creates a document and returns its definitive id: a provided id is
    /// honored (duplicates rejected), an empty one gets a fresh ulid.
    #[instrument(skip(self, document))]
    pub fn add<T: Document>(&self, document: &T) -> StoreResult<String> {
        trace!("Add document");
        let mut document_id = document.get_document_id();
        if document_id.is_empty() {
            document_id = Ulid::new().to_string();
        } else if self.documents.contains_key(&document_id) {
            return Err(StoreError::duplicate(&self.name, &document_id));
        }

        let value = serde_json::to_value(document).map_err(StoreError::parse_error)?;
        self.documents.insert(document_id.clone(), value.clone());
        self.database
            .notify_change(&self.name, &document_id, None, Some(&value));
        Ok(document_id)
    }

    /// Merges the given fields into the stored body, last writer wins per
    /// field. Untouched fields keep their current value.
    #[instrument(skip(self, fields))]
    pub fn update_fields(&self, document_id: &str, fields: JsonValue) -> StoreResult<()> {
        trace!("Update document fields");
        let patch = match fields {
            JsonValue::Object(map) => map,
            _ => {
                return Err(StoreError::operation_failed(
                    "field update requires a json object",
                ))
            }
        };

        let mut entry = self
            .documents
            .get_mut(document_id)
            .ok_or_else(|| StoreError::not_found(&self.name, document_id))?;
        let old = entry.value().clone();

        match entry.value_mut() {
            JsonValue::Object(body) => {
                for (key, value) in patch {
                    body.insert(key, value);
                }
            }
            _ => {
                return Err(StoreError::operation_failed(
                    "stored document is not a json object",
                ))
            }
        }

        let new = entry.value().clone();
        // Release the entry guard before notifying so callbacks can read.
        drop(entry);
        self.database
            .notify_change(&self.name, document_id, Some(&old), Some(&new));
        Ok(())
    }

    /// Idempotent: deleting an absent document is not an error.
    #[instrument(skip(self))]
    pub fn delete(&self, document_id: &str) -> StoreResult<()> {
        trace!("Delete document");
        if let Some((_, old)) = self.documents.remove(document_id) {
            self.database
                .notify_change(&self.name, document_id, Some(&old), None);
        }
        Ok(())
    }

    /// Returns matching documents, ordered ascending by the query's numeric
    /// order field with ties (and the no-order case) resolved by id.
    #[instrument(skip(self, query))]
    pub fn find<T: Document>(&self, query: &Query) -> StoreResult<Vec<T>> {
        trace!("Find matching documents");
        let mut matching: Vec<(String, JsonValue)> = self
            .documents
            .iter()
            .filter(|entry| query.filter.matches(entry.key(), entry.value()))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        match &query.order_by {
            Some(field) => matching.sort_by(|(a_id, a), (b_id, b)| {
                order_key(a, field)
                    .partial_cmp(&order_key(b, field))
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a_id.cmp(b_id))
            }),
            None => matching.sort_by(|(a_id, _), (b_id, _)| a_id.cmp(b_id)),
        }

        matching
            .into_iter()
            .map(|(document_id, value)| {
                let mut document: T =
                    serde_json::from_value(value).map_err(StoreError::parse_error)?;
                document.set_document_id(&document_id);
                Ok(document)
            })
            .collect()
    }

    #[instrument(skip(self))]
    pub fn get_document_list(&self) -> StoreResult<Vec<String>> {
        trace!("Get document list");
        let mut ids: Vec<String> = self.documents.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }

    pub fn subscribe<F>(&self, filter: Filter, callback: F) -> StoreResult<Subscription>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let callback: ChangeCallback = Arc::new(callback);
        let id = self.database.register_watcher(&self.name, filter, callback);
        Ok(Subscription {
            database: Arc::downgrade(&self.database),
            id,
        })
    }
}
