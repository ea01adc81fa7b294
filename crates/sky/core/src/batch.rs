//! Batch operation results.

use serde_json::{Map, Value};

use crate::ApiError;

/// Outcome for one requested identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem {
    Ok { id: String },
    Err { id: String, error: ApiError },
}

impl BatchItem {
    /// The identifier the caller asked for.
    pub fn id(&self) -> &str {
        match self {
            BatchItem::Ok { id } | BatchItem::Err { id, .. } => id,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, BatchItem::Ok { .. })
    }

    fn to_json(&self) -> Map<String, Value> {
        let mut entry = Map::new();
        entry.insert("_id".into(), self.id().into());
        if let BatchItem::Err { error, .. } = self {
            entry.insert("_type".into(), "error".into());
            error.write_fields(&mut entry);
        }
        entry
    }
}

impl serde::Serialize for BatchItem {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Ordered outcomes of a batch, one entry per input identifier.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct BatchResponse {
    items: Vec<BatchItem>,
}

impl BatchResponse {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push_ok(&mut self, id: impl Into<String>) {
        self.items.push(BatchItem::Ok { id: id.into() });
    }

    pub fn push_err(&mut self, id: impl Into<String>, error: ApiError) {
        self.items.push(BatchItem::Err {
            id: id.into(),
            error,
        });
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
