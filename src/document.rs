//! Serialized form of the catalog used for persistence, export and import

use std::collections::HashSet;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Catalog, CommandGroup};

/// Errors raised while reading a catalog document
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Unable to parse catalog document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate ID in catalog document: {0}")]
    DuplicateId(String),
    #[error("Invalid catalog document: {0}")]
    Invalid(String),
}

/// Accepted shapes of an incoming document.
///
/// The keyed form is what older desktop releases persisted; it carries no ordering
/// beyond the key order in the file.
#[derive(Deserialize)]
#[serde(untagged)]
enum IncomingDocument {
    Ordered { groups: Vec<CommandGroup> },
    Keyed { groups: serde_json::Map<String, serde_json::Value> },
    Bare(Vec<CommandGroup>),
}

#[derive(Serialize)]
struct OutgoingDocument<'a> {
    groups: &'a [CommandGroup],
}

/// Render the catalog as a pretty-printed JSON document.
///
/// # Errors
///
/// Returns `FormatError::Json` if serialization fails.
pub fn to_document(catalog: &Catalog) -> Result<String, FormatError> {
    Ok(serde_json::to_string_pretty(&OutgoingDocument {
        groups: &catalog.groups,
    })?)
}

/// Parse and validate a catalog document.
///
/// # Errors
///
/// Returns `FormatError` if the text is not valid JSON, matches none of the accepted
/// shapes, or violates the id/name invariants.
pub fn from_document(text: &str) -> Result<Catalog, FormatError> {
    let groups = match serde_json::from_str::<IncomingDocument>(text)? {
        IncomingDocument::Ordered { groups } | IncomingDocument::Bare(groups) => groups,
        IncomingDocument::Keyed { groups } => {
            debug!("Reading keyed catalog document with {} groups", groups.len());
            groups
                .into_iter()
                .map(|(_, value)| serde_json::from_value::<CommandGroup>(value))
                .collect::<Result<Vec<_>, _>>()?
        }
    };
    let catalog = Catalog { groups };
    validate(&catalog)?;
    Ok(catalog)
}

/// Validate the catalog for duplicate ids and empty values. Group ids are unique across
/// the catalog, command ids only within their group.
///
/// # Errors
///
/// Returns `FormatError::DuplicateId` or `FormatError::Invalid` on the first violation.
pub fn validate(catalog: &Catalog) -> Result<(), FormatError> {
    check_duplicates(catalog)?;
    check_empty_values(catalog)?;
    Ok(())
}

fn check_duplicates(catalog: &Catalog) -> Result<(), FormatError> {
    let mut group_ids = HashSet::new();
    for group in &catalog.groups {
        if !group_ids.insert(group.id.as_str()) {
            return Err(FormatError::DuplicateId(group.id.clone()));
        }
        // command ids are scoped to their group
        let mut command_ids = HashSet::new();
        for cmd in &group.commands {
            if !command_ids.insert(cmd.id.as_str()) {
                return Err(FormatError::DuplicateId(cmd.id.clone()));
            }
        }
    }
    Ok(())
}

fn check_empty_values(catalog: &Catalog) -> Result<(), FormatError> {
    for group in &catalog.groups {
        if group.id.trim().is_empty() {
            return Err(FormatError::Invalid(format!(
                "Group '{}' has an empty id",
                group.name
            )));
        }
        if group.name.trim().is_empty() {
            return Err(FormatError::Invalid(format!(
                "Group with id '{}' has an empty name",
                group.id
            )));
        }
        for cmd in &group.commands {
            if cmd.id.trim().is_empty() {
                return Err(FormatError::Invalid(format!(
                    "Command '{}' has an empty id",
                    cmd.name
                )));
            }
            if cmd.name.trim().is_empty() {
                return Err(FormatError::Invalid(format!(
                    "Command with id '{}' has an empty name",
                    cmd.id
                )));
            }
            if cmd.command.trim().is_empty() {
                return Err(FormatError::Invalid(format!(
                    "Command '{}' has an empty command string",
                    cmd.name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CommandItem;

    fn make_cmd(id: &str) -> CommandItem {
        CommandItem {
            id: id.to_string(),
            name: id.to_string(),
            command: "echo test".to_string(),
            is_detached: false,
        }
    }

    fn make_group(id: &str, commands: Vec<CommandItem>) -> CommandGroup {
        CommandGroup {
            id: id.to_string(),
            name: id.to_string(),
            commands,
        }
    }

    #[test]
    fn test_document_shape() {
        let catalog = Catalog {
            groups: vec![make_group("dev", vec![make_cmd("build")])],
        };
        insta::assert_snapshot!(to_document(&catalog).unwrap(), @r#"
        {
          "groups": [
            {
              "id": "dev",
              "name": "dev",
              "commands": [
                {
                  "id": "build",
                  "name": "build",
                  "command": "echo test",
                  "isDetached": false
                }
              ]
            }
          ]
        }
        "#);
    }

    #[test]
    fn test_keyed_document_is_accepted() {
        let catalog = from_document(
            r#"{
                "groups": {
                    "g1": {
                        "id": "g1",
                        "name": "Tools",
                        "commands": [
                            {"id": "c1", "name": "List", "command": "ls", "is_detached": null}
                        ]
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(catalog.groups.len(), 1);
        assert_eq!(catalog.groups[0].commands[0].name, "List");
        assert!(!catalog.groups[0].commands[0].is_detached);
    }

    #[test]
    fn test_bare_array_is_accepted() {
        let catalog =
            from_document(r#"[{"id": "g1", "name": "Tools", "commands": []}]"#).unwrap();
        assert_eq!(catalog.groups[0].id, "g1");
    }

    #[test]
    fn test_same_command_id_in_different_groups() {
        let catalog = Catalog {
            groups: vec![
                make_group("g1", vec![make_cmd("c1")]),
                make_group("g2", vec![make_cmd("c1")]),
            ],
        };
        assert!(validate(&catalog).is_ok());
    }

    #[test]
    fn test_duplicate_command_id_within_group() {
        let catalog = Catalog {
            groups: vec![make_group("g1", vec![make_cmd("dup"), make_cmd("dup")])],
        };
        match validate(&catalog).unwrap_err() {
            FormatError::DuplicateId(id) => assert_eq!(id, "dup"),
            other => panic!("Expected DuplicateId, got: {other:?}"),
        }
    }

    #[test]
    fn test_empty_command_rejected() {
        let mut cmd = make_cmd("c1");
        cmd.command = "  ".to_string();
        let catalog = Catalog {
            groups: vec![make_group("g1", vec![cmd])],
        };
        match validate(&catalog).unwrap_err() {
            FormatError::Invalid(msg) => assert!(msg.contains("empty command"), "got: {msg}"),
            other => panic!("Expected Invalid, got: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(matches!(
            from_document("{\"groups\": [").unwrap_err(),
            FormatError::Json(_)
        ));
        assert!(matches!(
            from_document(r#"{"groups": 5}"#).unwrap_err(),
            FormatError::Json(_)
        ));
    }
}
