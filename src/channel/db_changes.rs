use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbOperation {
    #[serde(alias = "INSERT")]
    Insert,
    #[serde(alias = "UPDATE")]
    Update,
    #[serde(alias = "DELETE")]
    Delete,
}

impl DbOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

pub type Record = HashMap<String, Value>;

/// One row-change notification from the database-change feed.
///
/// Accepts both the short field names (`operation`, `new`, `old`,
/// `timestamp`) and the long ones (`type`, `record`, `old_record`,
/// `commit_timestamp`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbChange {
    pub table: String,
    #[serde(alias = "type")]
    pub operation: DbOperation,
    #[serde(default, alias = "record", deserialize_with = "null_as_empty")]
    pub new: Record,
    #[serde(
        default,
        alias = "old_record",
        skip_serializing_if = "Option::is_none"
    )]
    pub old: Option<Record>,
    #[serde(alias = "commit_timestamp")]
    pub timestamp: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Record, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Record>::deserialize(deserializer)?.unwrap_or_default())
}

/// Client-side filter over the change feed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbChangeFilter {
    pub table: Option<String>,
    pub operation: Option<DbOperation>,
}

impl DbChangeFilter {
    /// Matches every change
    pub fn all() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn operation(mut self, operation: DbOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn matches(&self, change: &DbChange) -> bool {
        if let Some(table) = &self.table
            && table != &change.table
        {
            return false;
        }
        if let Some(operation) = self.operation
            && operation != change.operation
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_short_form() {
        let json = r#"{
            "table": "todos",
            "operation": "insert",
            "new": {"id": 1, "title": "milk"},
            "timestamp": "2025-11-27T16:16:54.545Z"
        }"#;

        let change: DbChange = serde_json::from_str(json).unwrap();
        assert_eq!(change.table, "todos");
        assert_eq!(change.operation, DbOperation::Insert);
        assert_eq!(change.new.get("title").unwrap().as_str().unwrap(), "milk");
        assert!(change.old.is_none());
    }

    #[test]
    fn test_deserialize_long_form_update() {
        let json = r#"{
            "schema": "public",
            "table": "users",
            "type": "UPDATE",
            "record": {"id": 47, "name": "new_name"},
            "old_record": {"id": 47, "name": "old_name"},
            "commit_timestamp": "2025-11-27T16:20:00.000Z",
            "errors": null
        }"#;

        let change: DbChange = serde_json::from_str(json).unwrap();
        assert_eq!(change.operation, DbOperation::Update);
        assert_eq!(change.new.get("name").unwrap().as_str().unwrap(), "new_name");
        assert_eq!(
            change
                .old
                .as_ref()
                .and_then(|old| old.get("name"))
                .and_then(Value::as_str),
            Some("old_name")
        );
        assert_eq!(change.timestamp, "2025-11-27T16:20:00.000Z");
    }

    #[test]
    fn test_deserialize_delete_with_null_new() {
        let json = r#"{
            "table": "users",
            "operation": "delete",
            "new": null,
            "old": {"id": 47},
            "timestamp": "2025-11-27T16:25:00.000Z"
        }"#;

        let change: DbChange = serde_json::from_str(json).unwrap();
        assert_eq!(change.operation, DbOperation::Delete);
        assert!(change.new.is_empty());
        assert!(change.old.is_some());
    }

    #[test]
    fn test_filter_matching() {
        let change = DbChange {
            table: "todos".to_string(),
            operation: DbOperation::Delete,
            new: Record::new(),
            old: None,
            timestamp: "t".to_string(),
        };

        assert!(DbChangeFilter::all().matches(&change));
        assert!(DbChangeFilter::all().table("todos").matches(&change));
        assert!(!DbChangeFilter::all().table("users").matches(&change));
        assert!(
            !DbChangeFilter::all()
                .operation(DbOperation::Insert)
                .matches(&change)
        );
        assert!(
            DbChangeFilter::all()
                .table("todos")
                .operation(DbOperation::Delete)
                .matches(&change)
        );
    }
}
