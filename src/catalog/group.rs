use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::command::CommandItem;

/// A named, ordered collection of commands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub commands: Vec<CommandItem>,
}

impl CommandGroup {
    /// Create an empty group with a freshly generated id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            commands: Vec::new(),
        }
    }

    #[must_use]
    pub fn command(&self, command_id: &str) -> Option<&CommandItem> {
        self.commands.iter().find(|c| c.id == command_id)
    }
}

/// The full set of groups, in creation order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub groups: Vec<CommandGroup>,
}

impl Catalog {
    #[must_use]
    pub fn group(&self, group_id: &str) -> Option<&CommandGroup> {
        self.groups.iter().find(|g| g.id == group_id)
    }

    pub fn group_mut(&mut self, group_id: &str) -> Option<&mut CommandGroup> {
        self.groups.iter_mut().find(|g| g.id == group_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups_are_scoped_to_group() {
        let mut first = CommandGroup::new("first");
        first.commands.push(CommandItem {
            id: "c1".to_string(),
            name: "a".to_string(),
            command: "true".to_string(),
            is_detached: false,
        });
        let second = CommandGroup::new("second");
        let second_id = second.id.clone();
        let first_id = first.id.clone();
        let mut catalog = Catalog {
            groups: vec![first, second],
        };

        assert_eq!(catalog.group(&first_id).unwrap().command("c1").unwrap().name, "a");
        assert!(catalog.group(&second_id).unwrap().command("c1").is_none());
        catalog.group_mut(&second_id).unwrap().name = "renamed".to_string();
        assert_eq!(catalog.groups[1].name, "renamed");
        assert!(catalog.group("missing").is_none());
    }
}
