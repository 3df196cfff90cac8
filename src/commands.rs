// Tauri command surface for the tab list.
// Register with `manage(app)` in setup, list the commands in the app's
// `generate_handler!`, and forward run events to `handle_run_event` so the
// store is flushed on exit. Every mutation emits `tabs-changed` to sync the UI.

use tauri::{AppHandle, Emitter, Manager, RunEvent, Runtime, State};

use crate::modules::evaluation::EvaluationOutput;
use crate::modules::manager::TabListManager;
use crate::settings::StoreSettings;
use crate::state::{StoredTab, TabPatch};

pub const TABS_CHANGED_EVENT: &str = "tabs-changed";
const SETTINGS_FILE: &str = "tab_store.json";

/// Opens the tab store under the app data dir and hands it to Tauri.
pub fn manage<R: Runtime>(app: &AppHandle<R>) -> Result<(), String> {
    let data_dir = app.path().app_data_dir().map_err(|e| e.to_string())?;
    let mut settings = StoreSettings::load(&data_dir.join(SETTINGS_FILE));
    settings.data_dir = data_dir;

    let manager = TabListManager::open(&settings).map_err(|e| e.to_string())?;
    log::info!("[Tabs] Store ready at {:?}", manager.store_path());
    app.manage(manager);
    Ok(())
}

/// Flushes the tab store when the app is about to exit. Managed state is
/// not dropped at exit, so pending deferred saves are written here:
///
/// ```ignore
/// app.run(|handle, event| scratchpad_tabs_lib::commands::handle_run_event(handle, &event));
/// ```
pub fn handle_run_event<R: Runtime>(app: &AppHandle<R>, event: &RunEvent) {
    if matches!(event, RunEvent::ExitRequested { .. } | RunEvent::Exit) {
        if let Some(manager) = app.try_state::<TabListManager>() {
            if let Err(e) = manager.shutdown() {
                log::error!("[Tabs] Failed to flush on exit: {}", e);
            }
        }
    }
}

fn emit_tabs<R: Runtime>(app: &AppHandle<R>, manager: &TabListManager) {
    let list = manager.snapshot();
    let _ = app.emit(
        TABS_CHANGED_EVENT,
        serde_json::json!({
            "tabs": list.to_records(),
            "activeTabId": list.active_id()
        }),
    );
}

#[tauri::command]
pub fn get_tabs(state: State<'_, TabListManager>) -> Vec<StoredTab> {
    state.tabs()
}

#[tauri::command]
pub fn add_tab<R: Runtime>(app: AppHandle<R>, state: State<'_, TabListManager>) -> Result<String, String> {
    let id = state.add_tab();
    emit_tabs(&app, &state);
    Ok(id)
}

#[tauri::command]
pub fn update_tab<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, TabListManager>,
    tab_id: String,
    patch: TabPatch,
) -> Result<(), String> {
    state.update_tab(&tab_id, patch);
    emit_tabs(&app, &state);
    Ok(())
}

#[tauri::command]
pub fn activate_tab<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, TabListManager>,
    tab_id: String,
) -> Result<(), String> {
    state.activate_tab(&tab_id).map_err(|e| e.to_string())?;
    emit_tabs(&app, &state);
    Ok(())
}

#[tauri::command]
pub fn remove_tab<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, TabListManager>,
    tab_id: String,
) -> Result<(), String> {
    state.remove_tab(&tab_id).map_err(|e| e.to_string())?;
    emit_tabs(&app, &state);
    Ok(())
}

#[tauri::command]
pub fn apply_evaluation<R: Runtime>(
    app: AppHandle<R>,
    state: State<'_, TabListManager>,
    tab_id: String,
    output: EvaluationOutput,
) -> Result<(), String> {
    state.apply_evaluation(&tab_id, &output);
    emit_tabs(&app, &state);
    Ok(())
}

#[tauri::command]
pub fn flush_tabs(state: State<'_, TabListManager>) -> Result<(), String> {
    state.flush().map_err(|e| e.to_string())
}
