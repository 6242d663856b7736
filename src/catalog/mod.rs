//! Data model for the command catalog: groups holding ordered, named shell commands.

pub mod command;
pub mod group;

pub use command::CommandItem;
pub use group::{Catalog, CommandGroup};
