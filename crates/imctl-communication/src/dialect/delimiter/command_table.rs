//! Delimiter command table
//!
//! Each command is identified by a category, a name and a numeric token.
//! Tokens are assigned by the instrument software and are treated as
//! opaque values.

use std::fmt;

/// Command category, first field of every payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Get,
    Set,
    Command,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "Get",
            Self::Set => "Set",
            Self::Command => "Command",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Table entry for one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub category: Category,
    pub name: &'static str,
    pub token: &'static str,
}

const fn spec(category: Category, name: &'static str, token: &'static str) -> CommandSpec {
    CommandSpec {
        category,
        name,
        token,
    }
}

/// Every command known to the dialect
pub const COMMAND_TABLE: &[CommandSpec] = &[
    spec(Category::Get, "IMVersion", "10982031"),
    spec(Category::Get, "IMStatus", "19487256"),
    spec(Category::Get, "XAxis", "19662438"),
    // Same token as XAxis on the instrument side.
    spec(Category::Get, "YAxis", "19662438"),
    spec(Category::Get, "ZAxis", "19736510"),
    spec(Category::Get, "ObjectiveNo", "1030281479"),
    spec(Category::Get, "LightNo", "1032592535"),
    spec(Category::Get, "WellCoordinate", "19813767"),
    spec(Category::Get, "ZStackCenter", "19841627"),
    spec(Category::Command, "OpenLid", "17248828"),
    spec(Category::Command, "CloseLid", "8809857"),
    spec(Category::Command, "GotoXYAxis", "19901915"),
    spec(Category::Command, "GotoZAxis", "1655963"),
    spec(Category::Set, "ScriptFile", "2930926"),
    spec(Category::Command, "StartScript", "1403806682"),
    spec(Category::Command, "StopScript", "1403833090"),
];

/// Find a table entry by command name
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMAND_TABLE.iter().find(|spec| spec.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let spec = lookup("GotoZAxis").unwrap();
        assert_eq!(spec.category, Category::Command);
        assert_eq!(spec.token, "1655963");
        assert!(lookup("GotoXYZ").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in COMMAND_TABLE.iter().enumerate() {
            for b in &COMMAND_TABLE[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }
}
