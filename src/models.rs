// src/models.rs
use std::collections::BTreeMap;

/// Everything a menu key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    SystemMonitor,
    BackupHome,
    ListUsers,
    CreateUser,
    PingTest,
    FetchUrl,
    BackgroundTask,
    ViewLogs,
    Exit,
}

/// One line of the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub key: char,
    pub label: &'static str,
    pub action: Action,
}

impl MenuItem {
    pub fn new(key: char, label: &'static str, action: Action) -> Self {
        Self { key, label, action }
    }
}

/// Fixed, key-ordered set of menu entries.
#[derive(Debug, Clone)]
pub struct Menu {
    entries: BTreeMap<char, MenuItem>,
}

impl Menu {
    /// Fails when two items share a key.
    pub fn new(items: impl IntoIterator<Item = MenuItem>) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        for item in items {
            let key = item.key;
            if entries.insert(key, item).is_some() {
                anyhow::bail!("duplicate menu key '{}'", key);
            }
        }
        Ok(Self { entries })
    }

    /// Entries sorted by key.
    pub fn iter(&self) -> impl Iterator<Item = &MenuItem> {
        self.entries.values()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entry whose key is exactly `input`. Anything longer than one character
    /// never matches.
    pub fn resolve(&self, input: &str) -> Option<&MenuItem> {
        let mut chars = input.chars();
        match (chars.next(), chars.next()) {
            (Some(key), None) => self.entries.get(&key),
            _ => None,
        }
    }
}
