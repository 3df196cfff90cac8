use std::path::Path;

use crate::error::{StoreError, TabError};
use crate::ids::{IdGenerator, UuidGenerator};
use crate::modules::evaluation::EvaluationOutput;
use crate::modules::tabs::{self, RemoveOutcome};
use crate::settings::StoreSettings;
use crate::state::{StoredTab, Tab, TabList, TabPatch, TabsRoot};
use crate::store::PersistentStore;

const MAX_ID_ATTEMPTS: usize = 8;

/// The editor's tab list, persisted under `tabs` in the configured store.
///
/// Every operation is one atomic read-transform-write on the store.
pub struct TabListManager {
    store: PersistentStore<TabsRoot>,
    ids: Box<dyn IdGenerator>,
}

impl TabListManager {
    pub fn open(settings: &StoreSettings) -> Result<Self, StoreError> {
        Self::open_with(settings, Box::new(UuidGenerator))
    }

    /// Loads the persisted list, seeding one default tab if nothing usable
    /// was stored.
    pub fn open_with(settings: &StoreSettings, ids: Box<dyn IdGenerator>) -> Result<Self, StoreError> {
        let store = PersistentStore::open(settings.store_path(), settings.store_options(), || {
            TabsRoot::seeded(ids.next_id())
        })?;
        let manager = Self { store, ids };

        if manager.store.read(|root| root.tabs.is_empty()) {
            log::info!("[Tabs] Persisted list is empty, seeding default tab");
            manager.store.update(|root| {
                if root.tabs.is_empty() {
                    root.tabs = TabList::seeded(manager.ids.next_id());
                }
            });
        }

        Ok(manager)
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    fn fresh_id(&self, list: &TabList) -> String {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            if !list.contains(&id) {
                return id;
            }
            log::warn!("[Tabs] Id generator repeated {}, retrying", id);
        }
        log::warn!("[Tabs] Id generator keeps colliding, falling back to uuid");
        loop {
            let id = UuidGenerator.next_id();
            if !list.contains(&id) {
                return id;
            }
        }
    }

    /// Appends a blank "New Tab", makes it the only active tab and returns
    /// its id.
    pub fn add_tab(&self) -> String {
        let id = self.store.update(|root| {
            let id = self.fresh_id(&root.tabs);
            tabs::add_logic(&mut root.tabs, id.clone());
            id
        });
        log::debug!("[Tabs] Added tab {}", id);
        id
    }

    /// Merges `patch` into the tab. An unknown id is ignored.
    pub fn update_tab(&self, id: &str, patch: TabPatch) {
        if patch.is_empty() {
            return;
        }
        match self.store.try_update(|root| tabs::update_logic(&mut root.tabs, id, patch)) {
            Ok(()) => log::debug!("[Tabs] Updated tab {}", id),
            Err(e) => log::debug!("[Tabs] Update skipped: {}", e),
        }
    }

    pub fn activate_tab(&self, id: &str) -> Result<(), TabError> {
        self.store
            .try_update(|root| tabs::activate_logic(&mut root.tabs, id))?;
        log::debug!("[Tabs] Activated tab {}", id);
        Ok(())
    }

    /// Removes the tab, promoting a sibling if it was active. Removing the
    /// last tab leaves a fresh default tab in its place.
    pub fn remove_tab(&self, id: &str) -> Result<(), TabError> {
        let outcome = self
            .store
            .try_update(|root| tabs::remove_logic(&mut root.tabs, id, || self.ids.next_id()))?;
        match outcome {
            RemoveOutcome::Inactive => log::debug!("[Tabs] Removed tab {}", id),
            RemoveOutcome::Promoted(next) => {
                log::debug!("[Tabs] Removed active tab {}, activated {}", id, next)
            }
            RemoveOutcome::Reseeded(fresh) => {
                log::debug!("[Tabs] Removed last tab {}, seeded {}", id, fresh)
            }
        }
        Ok(())
    }

    /// Stores an evaluation run's output as the tab's result and errors.
    pub fn apply_evaluation(&self, id: &str, output: &EvaluationOutput) {
        self.update_tab(
            id,
            TabPatch {
                result: Some(output.result_text()),
                errors: Some(output.error_text()),
                ..Default::default()
            },
        );
    }

    /// The list in wire form, as the frontend renders it.
    pub fn tabs(&self) -> Vec<StoredTab> {
        self.store.read(|root| root.tabs.to_records())
    }

    pub fn snapshot(&self) -> TabList {
        self.store.read(|root| root.tabs.clone())
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.store.read(|root| root.tabs.active_tab().cloned())
    }

    pub fn get(&self, id: &str) -> Option<Tab> {
        self.store.read(|root| root.tabs.get(id).cloned())
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.store.save()
    }

    /// Writes pending changes before the process exits. Hosts that keep the
    /// manager alive until exit (Tauri managed state is never dropped) must
    /// call this, since the deferred save would otherwise be lost.
    pub fn shutdown(&self) -> Result<(), StoreError> {
        self.flush()?;
        log::info!("[Tabs] Flushed {:?} on shutdown", self.store_path());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;
    use crate::store::SaveStrategy;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn settings(dir: &TempDir) -> StoreSettings {
        let mut settings = StoreSettings::in_dir(dir.path());
        settings.save_strategy = SaveStrategy::Manual;
        settings
    }

    fn open(dir: &TempDir) -> TabListManager {
        TabListManager::open_with(&settings(dir), Box::new(SequentialIds::default())).unwrap()
    }

    fn active_ids(manager: &TabListManager) -> Vec<String> {
        manager
            .tabs()
            .into_iter()
            .filter(|t| t.active == Some(true))
            .map(|t| t.id)
            .collect()
    }

    #[test]
    fn test_fresh_store_seeds_one_active_tab() {
        let dir = TempDir::new().unwrap();
        let manager = open(&dir);

        let tabs = manager.tabs();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].id, "tab-0");
        assert_eq!(tabs[0].name, "New Tab");
        assert_eq!(tabs[0].active, Some(true));
    }

    #[test]
    fn test_add_tab_activates_new_tab() {
        let dir = TempDir::new().unwrap();
        let manager = open(&dir);

        let id = manager.add_tab();
        let second = manager.add_tab();

        assert_eq!(manager.tabs().len(), 3);
        assert_eq!(active_ids(&manager), vec![second.clone()]);
        assert_ne!(id, second);
    }

    #[test]
    fn test_update_unknown_tab_is_noop() {
        let dir = TempDir::new().unwrap();
        let manager = open(&dir);
        manager.add_tab();
        let before = manager.snapshot();

        manager.update_tab(
            "missing",
            TabPatch {
                name: Some("x".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(manager.snapshot(), before);
    }

    #[test]
    fn test_activate_tab() {
        let dir = TempDir::new().unwrap();
        let manager = open(&dir);
        manager.add_tab();

        manager.activate_tab("tab-0").unwrap();
        assert_eq!(active_ids(&manager), vec!["tab-0".to_string()]);

        let err = manager.activate_tab("missing").unwrap_err();
        assert_eq!(err, TabError::NotFound("missing".to_string()));
        assert_eq!(active_ids(&manager), vec!["tab-0".to_string()]);
    }

    #[test]
    fn test_remove_reads_live_list() {
        let dir = TempDir::new().unwrap();
        let manager = open(&dir);
        let t1 = manager.add_tab();
        let t2 = manager.add_tab();
        manager.activate_tab("tab-0").unwrap();

        manager.remove_tab("tab-0").unwrap();

        let ids: Vec<String> = manager.tabs().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![t1.clone(), t2]);
        assert_eq!(active_ids(&manager), vec![t1]);
    }

    #[test]
    fn test_remove_unknown_tab_errors() {
        let dir = TempDir::new().unwrap();
        let manager = open(&dir);
        let before = manager.snapshot();

        assert!(manager.remove_tab("missing").is_err());
        assert_eq!(manager.snapshot(), before);
    }

    #[test]
    fn test_remove_only_tab_reseeds() {
        let dir = TempDir::new().unwrap();
        let manager = open(&dir);

        manager.remove_tab("tab-0").unwrap();

        let tabs = manager.tabs();
        assert_eq!(tabs.len(), 1);
        assert_ne!(tabs[0].id, "tab-0");
        assert_eq!(tabs[0].active, Some(true));
    }

    #[test]
    fn test_apply_evaluation_sets_result_and_errors() {
        use crate::modules::evaluation::LineValue;

        let dir = TempDir::new().unwrap();
        let manager = open(&dir);
        let output = EvaluationOutput {
            values: vec![
                LineValue { line: 1, value: json!(3) },
                LineValue { line: 2, value: json!("ok") },
            ],
            errors: vec!["boom".to_string()],
        };

        manager.apply_evaluation("tab-0", &output);

        let tab = manager.get("tab-0").unwrap();
        assert_eq!(tab.result, "3\nok\n");
        assert_eq!(tab.errors, "boom");
    }

    #[test]
    fn test_editor_session_scenario() {
        let dir = TempDir::new().unwrap();
        let manager = open(&dir);
        let t0 = manager.active_tab().unwrap().id;

        let t1 = manager.add_tab();
        assert_eq!(active_ids(&manager), vec![t1.clone()]);

        manager.update_tab(
            &t0,
            TabPatch {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(manager.get(&t0).unwrap().name, "Renamed");
        assert_eq!(manager.get(&t1).unwrap().name, "New Tab");

        manager.remove_tab(&t1).unwrap();

        let tabs = manager.tabs();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].id, t0);
        assert_eq!(tabs[0].name, "Renamed");
        assert_eq!(tabs[0].active, Some(true));
    }

    #[test]
    fn test_persisted_list_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let manager = open(&dir);
            let id = manager.add_tab();
            manager.update_tab(
                &id,
                TabPatch {
                    content: Some("1 + 2".to_string()),
                    ..Default::default()
                },
            );
            manager.flush().unwrap();
        }

        let manager = TabListManager::open_with(&settings(&dir), Box::new(SequentialIds::default())).unwrap();
        let tabs = manager.tabs();
        assert_eq!(tabs.len(), 2);
        assert_eq!(tabs[1].content, "1 + 2");
        assert_eq!(tabs[1].active, Some(true));
    }

    #[test]
    fn test_reset_on_start_discards_persisted_list() {
        let dir = TempDir::new().unwrap();
        {
            let manager = open(&dir);
            manager.add_tab();
            manager.flush().unwrap();
        }

        let mut reset = settings(&dir);
        reset.reset_on_start = true;
        let manager = TabListManager::open_with(&reset, Box::new(SequentialIds::default())).unwrap();

        assert_eq!(manager.tabs().len(), 1);
    }

    #[test]
    fn test_empty_persisted_list_is_reseeded() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        fs::create_dir_all(&settings.data_dir).unwrap();
        fs::write(settings.store_path(), r#"{"tabs": []}"#).unwrap();

        let manager = TabListManager::open_with(&settings, Box::new(SequentialIds::default())).unwrap();

        assert_eq!(active_ids(&manager), vec!["tab-0".to_string()]);
    }

    #[test]
    fn test_fresh_id_skips_ids_already_in_list() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir);
        fs::create_dir_all(&settings.data_dir).unwrap();
        fs::write(
            settings.store_path(),
            r#"{"tabs": [{"id": "tab-0", "name": "Old", "content": "", "result": "", "active": true, "errors": ""}]}"#,
        )
        .unwrap();

        let manager = TabListManager::open_with(&settings, Box::new(SequentialIds::default())).unwrap();
        let id = manager.add_tab();

        assert_eq!(id, "tab-1");
    }

    struct StuckIds;

    impl IdGenerator for StuckIds {
        fn next_id(&self) -> String {
            "tab-0".to_string()
        }
    }

    #[test]
    fn test_fresh_id_gives_up_on_stuck_generator() {
        let dir = TempDir::new().unwrap();
        let manager = TabListManager::open_with(&settings(&dir), Box::new(StuckIds)).unwrap();

        let id = manager.add_tab();

        assert_ne!(id, "tab-0");
        assert_eq!(manager.tabs().len(), 2);
        assert_eq!(active_ids(&manager), vec![id]);
    }

    #[test]
    fn test_shutdown_writes_pending_debounced_changes() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir);
        settings.save_strategy = SaveStrategy::Debounce;
        settings.save_interval_ms = 60_000;
        let manager = TabListManager::open_with(&settings, Box::new(SequentialIds::default())).unwrap();
        manager.update_tab(
            "tab-0",
            TabPatch {
                content: Some("last edit".to_string()),
                ..Default::default()
            },
        );

        manager.shutdown().unwrap();

        // Read before the manager drops, as a host killed at exit would leave it
        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(manager.store_path()).unwrap()).unwrap();
        assert_eq!(on_disk["tabs"][0]["content"], json!("last edit"));
    }

    #[test]
    fn test_immediate_strategy_writes_wire_format() {
        let dir = TempDir::new().unwrap();
        let mut settings = settings(&dir);
        settings.save_strategy = SaveStrategy::Immediate;
        let manager = TabListManager::open_with(&settings, Box::new(SequentialIds::default())).unwrap();

        manager.add_tab();

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(manager.store_path()).unwrap()).unwrap();
        assert_eq!(on_disk["tabs"][0]["active"], json!(false));
        assert_eq!(on_disk["tabs"][1]["active"], json!(true));
        assert_eq!(on_disk["tabs"][1]["id"], json!("tab-1"));
    }
}
