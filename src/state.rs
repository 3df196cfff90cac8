// Shared tab structs.
// The list keeps its active marker once, at list level, and only spreads it
// into per-record `active` flags at the serde boundary.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TAB_NAME: &str = "New Tab";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Tab {
    pub id: String,
    pub name: String,
    pub content: String,
    pub result: String,
    pub errors: String,
}

impl Tab {
    /// A blank tab named "New Tab".
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: DEFAULT_TAB_NAME.to_string(),
            content: String::new(),
            result: String::new(),
            errors: String::new(),
        }
    }

    /// Shallow merge: every field present in the patch overwrites ours.
    pub fn apply(&mut self, patch: TabPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(result) = patch.result {
            self.result = result;
        }
        if let Some(errors) = patch.errors {
            self.errors = errors;
        }
    }
}

/// Partial tab sent by the editor. `id` and `active` are not patchable.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TabPatch {
    pub name: Option<String>,
    pub content: Option<String>,
    pub result: Option<String>,
    pub errors: Option<String>,
}

impl TabPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.content.is_none() && self.result.is_none() && self.errors.is_none()
    }
}

/// Wire form of a tab: what lands on disk under `tabs` and what the
/// frontend renders.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct StoredTab {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(default)]
    pub errors: String,
}

/// Ordered tabs plus the id of the single active one.
///
/// A non-empty list always has exactly one active tab; an empty list has
/// none. The mutators in `modules::tabs` keep that true.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<StoredTab>", into = "Vec<StoredTab>")]
pub struct TabList {
    pub(crate) tabs: Vec<Tab>,
    pub(crate) active: Option<String>,
}

impl TabList {
    /// One default tab, active.
    pub fn seeded(id: impl Into<String>) -> Self {
        let tab = Tab::new(id);
        Self {
            active: Some(tab.id.clone()),
            tabs: vec![tab],
        }
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active_id().and_then(|id| self.get(id))
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active_id() == Some(id)
    }

    pub fn get(&self, id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    pub fn to_records(&self) -> Vec<StoredTab> {
        self.tabs
            .iter()
            .map(|tab| StoredTab {
                id: tab.id.clone(),
                name: tab.name.clone(),
                content: tab.content.clone(),
                result: tab.result.clone(),
                active: Some(self.is_active(&tab.id)),
                errors: tab.errors.clone(),
            })
            .collect()
    }
}

impl From<Vec<StoredTab>> for TabList {
    /// Normalizes whatever was persisted: later duplicates of an id are
    /// dropped, the first `active: true` wins, and a non-empty list with no
    /// active record gets its first tab activated.
    fn from(records: Vec<StoredTab>) -> Self {
        let mut tabs: Vec<Tab> = Vec::with_capacity(records.len());
        let mut active: Option<String> = None;

        for record in records {
            if tabs.iter().any(|t| t.id == record.id) {
                log::warn!("[Tabs] Dropping duplicate tab id {} from persisted list", record.id);
                continue;
            }
            if record.active == Some(true) {
                if active.is_none() {
                    active = Some(record.id.clone());
                } else {
                    log::warn!("[Tabs] Tab {} also marked active, ignoring", record.id);
                }
            }
            tabs.push(Tab {
                id: record.id,
                name: record.name,
                content: record.content,
                result: record.result,
                errors: record.errors,
            });
        }

        if active.is_none() {
            if let Some(first) = tabs.first() {
                log::warn!("[Tabs] No active tab persisted, activating {}", first.id);
                active = Some(first.id.clone());
            }
        }

        Self { tabs, active }
    }
}

impl From<TabList> for Vec<StoredTab> {
    fn from(list: TabList) -> Self {
        list.to_records()
    }
}

/// Root object of the persisted store: `{ "tabs": [...] }`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabsRoot {
    #[serde(default)]
    pub tabs: TabList,
}

impl TabsRoot {
    pub fn seeded(id: impl Into<String>) -> Self {
        Self {
            tabs: TabList::seeded(id),
        }
    }
}
