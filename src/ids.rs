use uuid::Uuid;

/// Source of tab ids. Ids must be unique for the lifetime of a store.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic ids for tests: `tab-0`, `tab-1`, ...
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct SequentialIds(std::sync::atomic::AtomicUsize);

#[cfg(test)]
impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        format!("tab-{}", n)
    }
}
