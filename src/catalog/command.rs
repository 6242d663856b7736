use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// A named shell invocation belonging to exactly one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandItem {
    pub id: String,
    pub name: String,
    pub command: String,
    /// Launch without waiting for completion or capturing output
    #[serde(
        default,
        alias = "is_detached",
        deserialize_with = "null_as_false"
    )]
    pub is_detached: bool,
}

impl CommandItem {
    /// Create a command with a freshly generated id.
    #[must_use]
    pub fn new(name: impl Into<String>, command: impl Into<String>, is_detached: bool) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            command: command.into(),
            is_detached,
        }
    }
}

/// Older catalogs store the flag as an optional value and write `null` when unset.
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_accepts_legacy_spellings() {
        let snake: CommandItem = serde_json::from_str(
            r#"{"id": "a", "name": "A", "command": "true", "is_detached": true}"#,
        )
        .unwrap();
        assert!(snake.is_detached);

        let null: CommandItem = serde_json::from_str(
            r#"{"id": "a", "name": "A", "command": "true", "is_detached": null}"#,
        )
        .unwrap();
        assert!(!null.is_detached);

        let missing: CommandItem =
            serde_json::from_str(r#"{"id": "a", "name": "A", "command": "true"}"#).unwrap();
        assert!(!missing.is_detached);
    }

    #[test]
    fn test_detached_always_serialized() {
        let item = CommandItem {
            id: "a".to_string(),
            name: "A".to_string(),
            command: "true".to_string(),
            is_detached: false,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["isDetached"], serde_json::Value::Bool(false));
    }

    #[test]
    fn test_new_generates_unique_ids() {
        let a = CommandItem::new("a", "true", false);
        let b = CommandItem::new("a", "true", false);
        assert_ne!(a.id, b.id);
    }
}
