// Tab list transforms - Pure logic, no store or Tauri imports.
// Every function takes the live list and either applies the whole change or
// returns an error having touched nothing.

use crate::error::TabError;
use crate::state::{Tab, TabList, TabPatch};

/// What `remove_logic` did about the active marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The removed tab was inactive; the active tab is unchanged.
    Inactive,
    /// The removed tab was active and this sibling took over.
    Promoted(String),
    /// The last tab was removed and a fresh default tab replaced it.
    Reseeded(String),
}

/// Appends a blank tab with `id` and makes it the only active one.
pub fn add_logic(list: &mut TabList, id: String) {
    debug_assert!(!list.contains(&id), "duplicate tab id {}", id);
    list.tabs.push(Tab::new(id.clone()));
    list.active = Some(id);
}

/// Merges `patch` into the tab with `id`. Other tabs are not touched.
pub fn update_logic(list: &mut TabList, id: &str, patch: TabPatch) -> Result<(), TabError> {
    let tab = list
        .tabs
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| TabError::NotFound(id.to_string()))?;
    tab.apply(patch);
    Ok(())
}

pub fn activate_logic(list: &mut TabList, id: &str) -> Result<(), TabError> {
    if !list.contains(id) {
        return Err(TabError::NotFound(id.to_string()));
    }
    list.active = Some(id.to_string());
    Ok(())
}

/// Removes the tab with `id`.
///
/// If it was active, the next sibling takes over, or the previous one when
/// it was last. Removing the only tab seeds a default one with `reseed_id()`.
pub fn remove_logic(
    list: &mut TabList,
    id: &str,
    reseed_id: impl FnOnce() -> String,
) -> Result<RemoveOutcome, TabError> {
    let index = list
        .position(id)
        .ok_or_else(|| TabError::NotFound(id.to_string()))?;
    let was_active = list.is_active(id);

    list.tabs.remove(index);

    if list.tabs.is_empty() {
        *list = TabList::seeded(reseed_id());
        let seeded = list.active.clone().unwrap_or_default();
        return Ok(RemoveOutcome::Reseeded(seeded));
    }

    if !was_active {
        return Ok(RemoveOutcome::Inactive);
    }

    // After removal the old next sibling sits at `index`
    let replacement = list
        .tabs
        .get(index)
        .or_else(|| index.checked_sub(1).and_then(|i| list.tabs.get(i)))
        .map(|t| t.id.clone())
        .ok_or_else(|| TabError::NotFound(id.to_string()))?;
    list.active = Some(replacement.clone());
    Ok(RemoveOutcome::Promoted(replacement))
}
