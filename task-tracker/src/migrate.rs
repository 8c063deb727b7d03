//! Backfill for records written by older versions of the task file.
//!
//! Runs on raw JSON after parsing and before records are typed, so it can be
//! exercised without touching the filesystem. Applying it twice is the same
//! as applying it once.

use crate::task::Status;
use serde_json::{Map, Value};

/// Fills in fields missing from older records. Non-object elements pass
/// through unchanged.
pub fn migrate(values: Vec<Value>, now: &str) -> Vec<Value> {
    values
        .into_iter()
        .map(|value| match value {
            Value::Object(mut fields) => {
                migrate_fields(&mut fields, now);
                Value::Object(fields)
            }
            other => other,
        })
        .collect()
}

fn migrate_fields(fields: &mut Map<String, Value>, now: &str) {
    fields
        .entry("due_date")
        .or_insert_with(|| Value::String(String::new()));
    fields
        .entry("createdAt")
        .or_insert_with(|| Value::String(now.to_string()));
    fields
        .entry("updatedAt")
        .or_insert_with(|| Value::String(now.to_string()));
    if !fields.contains_key("status") {
        let done = fields.get("done").and_then(Value::as_bool).unwrap_or(false);
        fields.insert(
            "status".to_string(),
            Value::String(Status::from_done(done).as_str().to_string()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const NOW: &str = "2025-06-01T12:00:00.000000";

    #[test]
    fn backfills_legacy_record() {
        // Arrange
        let legacy = vec![json!({"id": 2, "title": "t2", "description": "d2", "done": false})];

        // Act
        let migrated = migrate(legacy, NOW);

        // Assert
        assert_eq!(
            migrated,
            vec![json!({
                "id": 2,
                "title": "t2",
                "description": "d2",
                "done": false,
                "due_date": "",
                "createdAt": NOW,
                "updatedAt": NOW,
                "status": "todo"
            })]
        );
    }

    #[test]
    fn done_legacy_record_becomes_done_status() {
        let migrated = migrate(vec![json!({"id": 5, "done": true})], NOW);

        assert_eq!(migrated[0]["status"], "done");
    }

    #[test]
    fn existing_status_is_not_overwritten() {
        let migrated = migrate(
            vec![json!({"id": 1, "done": true, "status": "in-progress"})],
            NOW,
        );

        assert_eq!(migrated[0]["status"], "in-progress");
    }

    #[test]
    fn only_missing_timestamp_is_filled() {
        let migrated = migrate(
            vec![json!({"id": 1, "createdAt": "2024-01-01T00:00:00.000000"})],
            NOW,
        );

        assert_eq!(migrated[0]["createdAt"], "2024-01-01T00:00:00.000000");
        assert_eq!(migrated[0]["updatedAt"], NOW);
    }

    #[test]
    fn existing_due_date_is_kept() {
        let migrated = migrate(vec![json!({"id": 1, "due_date": "2025-11-11"})], NOW);

        assert_eq!(migrated[0]["due_date"], "2025-11-11");
    }

    #[test]
    fn missing_id_is_not_backfilled() {
        let migrated = migrate(vec![json!({"title": "noid"})], NOW);

        assert!(migrated[0].get("id").is_none());
    }

    #[test]
    fn non_objects_pass_through() {
        let values = vec![json!(1), json!("loose"), json!(null), json!([1, 2])];

        let migrated = migrate(values.clone(), NOW);

        assert_eq!(migrated, values);
    }

    #[test]
    fn migration_is_idempotent() {
        // Arrange
        let legacy = vec![
            json!({"id": 1, "title": "a", "done": true}),
            json!("junk"),
            json!({"title": "noid"}),
        ];

        // Act
        let once = migrate(legacy, NOW);
        let twice = migrate(once.clone(), "2030-01-01T00:00:00.000000");

        // Assert
        assert_eq!(once, twice);
    }
}
