//! Document, field and batch types shared by repository implementations.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

/// Field payload of a stored document.
pub type DocumentData = Map<String, Value>;

/// One stored document as read back from a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Document key, unique within its collection.
    pub id: String,
    pub data: DocumentData,
    /// Epoch milliseconds of the first write.
    pub create_time: i64,
    /// Epoch milliseconds of the latest write.
    pub update_time: i64,
}

impl Document {
    /// Returns a string field, if present and a string.
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.data.get(name).and_then(Value::as_str)
    }

    /// Returns an integer field, if present and an integer.
    pub fn i64_field(&self, name: &str) -> Option<i64> {
        self.data.get(name).and_then(Value::as_i64)
    }
}

/// Value written into a document field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Value(Value),
    /// Replaced by the repository with its own clock at write time.
    ServerTimestamp,
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::Value(Value::from(value))
    }
}

/// Field set of one write.
pub type Fields = BTreeMap<String, FieldValue>;

/// Resolves `ServerTimestamp` sentinels against `now_ms`.
pub fn resolve_fields(fields: Fields, now_ms: i64) -> DocumentData {
    fields
        .into_iter()
        .map(|(name, value)| {
            let resolved = match value {
                FieldValue::Value(value) => value,
                FieldValue::ServerTimestamp => Value::from(now_ms),
            };
            (name, resolved)
        })
        .collect()
}

/// One mutation inside a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Creates or fully overwrites a document.
    Set {
        collection: String,
        id: String,
        fields: Fields,
    },
    /// Merges fields into an existing document; fails the batch if absent.
    Update {
        collection: String,
        id: String,
        fields: Fields,
    },
    Delete { collection: String, id: String },
}

/// Ordered set of writes committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, collection: &str, id: &str, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn update(&mut self, collection: &str, id: &str, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.to_string(),
            id: id.to_string(),
            fields,
        });
        self
    }

    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{resolve_fields, FieldValue, Fields};
    use serde_json::json;

    #[test]
    fn server_timestamp_resolves_to_given_clock() {
        let mut fields = Fields::new();
        fields.insert("text".to_string(), FieldValue::from("hello"));
        fields.insert("timestamp".to_string(), FieldValue::ServerTimestamp);

        let data = resolve_fields(fields, 1_700_000_000_000);
        assert_eq!(data.get("text"), Some(&json!("hello")));
        assert_eq!(data.get("timestamp"), Some(&json!(1_700_000_000_000_i64)));
    }
}
