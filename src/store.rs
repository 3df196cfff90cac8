// Persisted key-value root with serialized updates and deferred saving.
//
// Updates run under one mutex, so two transforms never interleave. Saving is
// handed to a flusher thread that coalesces bursts of changes according to
// the configured strategy; dropping the store flushes whatever is pending.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SaveStrategy {
    /// Write inside every update.
    Immediate,
    /// Write once no change has arrived for a full interval.
    #[default]
    Debounce,
    /// Write at most once per interval, counted from the first unsaved change.
    Throttle,
    /// Only `save()` writes.
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    pub save_on_change: bool,
    pub save_strategy: SaveStrategy,
    pub save_interval: Duration,
    /// Ignore the persisted value and start from the seed.
    pub reset_on_start: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            save_on_change: true,
            save_strategy: SaveStrategy::Debounce,
            save_interval: Duration::from_millis(500),
            reset_on_start: false,
        }
    }
}

enum Signal {
    Changed,
    Shutdown,
}

enum SaveMode {
    Immediate,
    Deferred(Sender<Signal>),
    Manual,
}

struct Shared<T> {
    value: Mutex<T>,
    path: PathBuf,
    // Held across snapshot + write so an older snapshot never lands last.
    write_lock: Mutex<()>,
}

impl<T: Serialize> Shared<T> {
    fn persist(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let json = {
            let value = self.value.lock();
            serde_json::to_string_pretty(&*value)?
        };
        write_atomic(&self.path, &json)
    }

    fn persist_logged(&self) {
        match self.persist() {
            Ok(()) => log::debug!("[TabStore] Saved {:?}", self.path),
            Err(e) => log::error!("[TabStore] Failed to save {:?}: {}", self.path, e),
        }
    }
}

pub struct PersistentStore<T> {
    shared: Arc<Shared<T>>,
    mode: SaveMode,
    flusher: Option<JoinHandle<()>>,
}

impl<T> PersistentStore<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + 'static,
{
    /// Loads `path` if it holds a value, otherwise starts from `seed()`.
    ///
    /// An unreadable or corrupt file is logged and replaced by the seed; a
    /// corrupt one is first renamed to `*.corrupt`.
    /// A seeded value is scheduled for saving like any other change.
    pub fn open(
        path: impl Into<PathBuf>,
        options: StoreOptions,
        seed: impl FnOnce() -> T,
    ) -> Result<Self, StoreError> {
        let path = path.into();
        let (value, seeded) = if options.reset_on_start {
            log::info!("[TabStore] Reset on start, seeding {:?}", path);
            (seed(), true)
        } else {
            match Self::load(&path) {
                Some(value) => (value, false),
                None => (seed(), true),
            }
        };

        let shared = Arc::new(Shared {
            value: Mutex::new(value),
            path,
            write_lock: Mutex::new(()),
        });

        let (mode, flusher) = match (options.save_on_change, options.save_strategy) {
            (false, _) | (true, SaveStrategy::Manual) => (SaveMode::Manual, None),
            (true, SaveStrategy::Immediate) => (SaveMode::Immediate, None),
            (true, strategy) => {
                let (tx, rx) = mpsc::channel();
                let worker = Arc::clone(&shared);
                let interval = options.save_interval;
                let handle = thread::Builder::new()
                    .name("tab-store-flusher".to_string())
                    .spawn(move || flusher_loop(worker, rx, strategy, interval))
                    .map_err(StoreError::Flusher)?;
                (SaveMode::Deferred(tx), Some(handle))
            }
        };

        let store = Self {
            shared,
            mode,
            flusher,
        };
        if seeded {
            store.changed();
        }
        Ok(store)
    }

    fn load(path: &Path) -> Option<T> {
        if !path.exists() {
            log::info!("[TabStore] No store at {:?}, seeding", path);
            return None;
        }
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(value) => {
                    log::info!("[TabStore] Loaded {:?}", path);
                    Some(value)
                }
                Err(e) => {
                    log::warn!("[TabStore] Failed to parse {:?}: {}, seeding", path, e);
                    Self::quarantine(path);
                    None
                }
            },
            Err(e) => {
                log::warn!("[TabStore] Failed to read {:?}: {}, seeding", path, e);
                None
            }
        }
    }

    /// Moves an unparsable store aside so the seed doesn't overwrite it.
    fn quarantine(path: &Path) {
        let corrupt_path = path.with_extension("corrupt");
        match fs::rename(path, &corrupt_path) {
            Ok(()) => log::warn!("[TabStore] Kept unreadable store as {:?}", corrupt_path),
            Err(e) => log::error!("[TabStore] Failed to move {:?} aside: {}", path, e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.shared.value.lock().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.shared.value.lock())
    }

    /// Applies `f` to the current value and schedules a save.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let out = f(&mut *self.shared.value.lock());
        self.changed();
        out
    }

    /// Applies `f` to a working copy; the copy replaces the current value and
    /// a save is scheduled only when `f` succeeds.
    pub fn try_update<R, E>(&self, f: impl FnOnce(&mut T) -> Result<R, E>) -> Result<R, E> {
        let out = {
            let mut value = self.shared.value.lock();
            let mut draft = value.clone();
            let out = f(&mut draft)?;
            *value = draft;
            out
        };
        self.changed();
        Ok(out)
    }

    /// Writes the current value now, whatever the strategy.
    pub fn save(&self) -> Result<(), StoreError> {
        self.shared.persist()
    }

    fn changed(&self) {
        match &self.mode {
            SaveMode::Immediate => self.shared.persist_logged(),
            SaveMode::Deferred(tx) => {
                let _ = tx.send(Signal::Changed);
            }
            SaveMode::Manual => {}
        }
    }
}

impl<T> Drop for PersistentStore<T> {
    fn drop(&mut self) {
        if let SaveMode::Deferred(tx) = &self.mode {
            let _ = tx.send(Signal::Shutdown);
        }
        if let Some(handle) = self.flusher.take() {
            if handle.join().is_err() {
                log::error!("[TabStore] Flusher thread panicked");
            }
        }
    }
}

fn flusher_loop<T: Serialize>(
    shared: Arc<Shared<T>>,
    rx: Receiver<Signal>,
    strategy: SaveStrategy,
    interval: Duration,
) {
    loop {
        // Idle until something changes
        match rx.recv() {
            Ok(Signal::Changed) => {}
            Ok(Signal::Shutdown) | Err(_) => return,
        }

        let mut deadline = Instant::now() + interval;
        let mut shutdown = false;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(timeout) {
                Ok(Signal::Changed) => {
                    if strategy == SaveStrategy::Debounce {
                        deadline = Instant::now() + interval;
                    }
                }
                Ok(Signal::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                    shutdown = true;
                    break;
                }
                Err(RecvTimeoutError::Timeout) => break,
            }
        }

        shared.persist_logged();

        if shutdown {
            return;
        }
    }
}

/// Atomic write: tmp + rename, creating parent directories.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, contents).map_err(|e| StoreError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}
