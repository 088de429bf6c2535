use bytes::Bytes;
use dashmap::DashMap;

use crate::err::Result;
use crate::ClusterMap;

/// Process-local map backend. This is what tests and single-node
/// deployments run against; a clustered deployment swaps in a backend that
/// speaks to the real distributed map behind the same trait.
#[derive(Debug, Default)]
pub struct MemoryMap {
    name: String,
    entries: DashMap<String, Bytes>,
}

impl MemoryMap {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ClusterMap for MemoryMap {
    fn get(&self, name: &str) -> Result<Option<Bytes>> {
        Ok(self.entries.get(name).map(|entry| entry.value().clone()))
    }

    fn put(&self, name: &str, value: Bytes) -> Result<()> {
        self.entries.insert(name.to_string(), value);
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<Option<Bytes>> {
        Ok(self.entries.remove(name).map(|(_, value)| value))
    }

    fn contains_key(&self, name: &str) -> Result<bool> {
        Ok(self.entries.contains_key(name))
    }

    fn key_set(&self) -> Result<Vec<String>> {
        Ok(self.entries.iter().map(|entry| entry.key().clone()).collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    fn clear(&self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
