use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::err::{LockHeldSnafu, Result};

/// Supplies the mutual-exclusion primitive guarding a namespace against
/// concurrent index writers. The namespace manager only obtains and drops
/// locks; the policy lives entirely in the factory.
pub trait LockFactory: Send + Sync + 'static {
    fn obtain(&self, name: &str) -> Result<NamespaceLock>;
}

/// Held lock; releases when dropped.
pub struct NamespaceLock {
    name: String,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl NamespaceLock {
    pub fn new(name: &str, release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name: name.to_string(),
            release: Some(Box::new(release)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NamespaceLock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
            debug!("released lock {}", self.name);
        }
    }
}

impl std::fmt::Debug for NamespaceLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceLock").field("name", &self.name).finish()
    }
}

/// Lock factory for namespaces with a single participating process. All
/// exclusion happens in this instance's table, so every opener of the same
/// namespace must share the same factory.
#[derive(Debug, Default)]
pub struct SingleInstanceLockFactory {
    held: Arc<Mutex<HashSet<String>>>,
}

impl SingleInstanceLockFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockFactory for SingleInstanceLockFactory {
    fn obtain(&self, name: &str) -> Result<NamespaceLock> {
        let mut held = self.held.lock().expect("lock table poisoned");
        if !held.insert(name.to_string()) {
            return LockHeldSnafu { name }.fail();
        }
        drop(held);

        let table = self.held.clone();
        let owned = name.to_string();
        Ok(NamespaceLock::new(name, move || {
            table.lock().expect("lock table poisoned").remove(&owned);
        }))
    }
}
