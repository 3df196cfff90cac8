// Scratchpad Tabs Library Entry Point
// Persisted tab list for the scratchpad editor. The desktop shell pulls in
// the Tauri commands with the `gui` feature.

pub mod error;
pub mod ids;
pub mod settings;
pub mod store;

// Shared state
pub mod state;

// Pure logic modules (no Tauri imports)
pub mod modules;

#[cfg(feature = "gui")]
pub mod commands;

pub use error::{StoreError, TabError};
pub use ids::{IdGenerator, UuidGenerator};
pub use modules::evaluation::{render_result, EvaluationOutput, LineValue};
pub use modules::manager::TabListManager;
pub use settings::StoreSettings;
pub use state::{StoredTab, Tab, TabList, TabPatch, TabsRoot};
pub use store::{PersistentStore, SaveStrategy, StoreOptions};
