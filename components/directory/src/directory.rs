use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use snafu::{ensure, OptionExt};
use tracing::{debug, instrument};

use kura_store::{
    open_store, ClusterMapRef, LockFactory, NamespaceLock, SingleInstanceLockFactory,
};
use kura_types::codec::{BincodeCodec, FileCodec};
use kura_types::ChunkedFile;
use kura_utils::readable_size::ReadableSize;

use crate::config::DirectoryConfig;
use crate::err::{DirectoryClosedSnafu, FileNotFoundSnafu, Result};
use crate::reader::FileReader;
use crate::writer::FileWriter;

/// Directory-level facade over the cluster map: the only component that
/// talks to the store. Maps names to published chunked files, hands out
/// writers and readers, and keeps the namespace-wide capacity counter.
///
/// The counter is best-effort accounting, not a consistency-critical
/// quantity: it grows at chunk-allocation time (before the file is even
/// published) and only through writers this instance created, so it can
/// transiently overcount, and it goes negative when a file created through
/// another directory handle is deleted here.
pub struct MapDirectory {
    store: ClusterMapRef,
    codec: Arc<dyn FileCodec>,
    lock_factory: Arc<dyn LockFactory>,
    size_in_bytes: Arc<AtomicI64>,
    open: AtomicBool,
}

impl MapDirectory {
    pub fn new(store: ClusterMapRef, lock_factory: Arc<dyn LockFactory>) -> Self {
        Self::with_codec(store, lock_factory, Arc::new(BincodeCodec))
    }

    pub fn with_codec(
        store: ClusterMapRef,
        lock_factory: Arc<dyn LockFactory>,
        codec: Arc<dyn FileCodec>,
    ) -> Self {
        Self {
            store,
            codec,
            lock_factory,
            size_in_bytes: Arc::new(AtomicI64::new(0)),
            open: AtomicBool::new(true),
        }
    }

    /// Convenience constructor wiring the configured store backend with
    /// the default codec and a process-local lock factory.
    pub fn open(config: &DirectoryConfig) -> Result<Self> {
        let store = open_store(&config.store_dsn)?;
        Ok(Self::new(store, Arc::new(SingleInstanceLockFactory::new())))
    }

    fn ensure_open(&self) -> Result<()> {
        ensure!(self.open.load(Ordering::Acquire), DirectoryClosedSnafu);
        Ok(())
    }

    /// Every name currently mapped, in no particular order.
    pub fn list_all(&self) -> Result<Vec<String>> {
        self.ensure_open()?;
        Ok(self.store.key_set()?)
    }

    /// Creates `name` and returns the writer producing its content. The
    /// empty file is published immediately, so the name is visible to the
    /// namespace before the first byte is written; content lands on the
    /// writer's flush. An existing name is silently displaced, exactly as
    /// a rename would displace it.
    #[instrument(skip(self))]
    pub fn create_output(&self, name: &str) -> Result<FileWriter> {
        self.ensure_open()?;
        let file = ChunkedFile::new();
        let encoded = self.codec.encode(&file)?;
        self.store.put(name, encoded)?;
        debug!("created {}", name);
        Ok(FileWriter::new(
            name,
            file,
            self.store.clone(),
            self.codec.clone(),
            self.size_in_bytes.clone(),
        ))
    }

    /// Reader over the published snapshot of `name`, windowed to its
    /// logical length.
    #[instrument(skip(self))]
    pub fn open_input(&self, name: &str) -> Result<FileReader> {
        self.ensure_open()?;
        let encoded = self
            .store
            .get(name)?
            .context(FileNotFoundSnafu { name })?;
        let file = self.codec.decode(&encoded)?;
        FileReader::new(name, Arc::new(file))
    }

    #[instrument(skip(self))]
    pub fn delete_file(&self, name: &str) -> Result<()> {
        self.ensure_open()?;
        let removed = self
            .store
            .remove(name)?
            .context(FileNotFoundSnafu { name })?;
        let file = self.codec.decode(&removed)?;
        self.size_in_bytes
            .fetch_sub(file.size_in_bytes() as i64, Ordering::Relaxed);
        debug!(
            "deleted {} ({} allocated)",
            name,
            ReadableSize(file.size_in_bytes())
        );
        Ok(())
    }

    pub fn file_length(&self, name: &str) -> Result<u64> {
        self.ensure_open()?;
        let encoded = self
            .store
            .get(name)?
            .context(FileNotFoundSnafu { name })?;
        Ok(self.codec.decode(&encoded)?.length())
    }

    /// Moves `source` to `dest` as insert-then-remove. The two store calls
    /// are not atomic: a concurrent opener can observe both names mapped,
    /// or a displaced `dest` already replaced while `source` lingers.
    /// Callers needing atomicity serialize renames through a namespace
    /// lock.
    #[instrument(skip(self))]
    pub fn rename_file(&self, source: &str, dest: &str) -> Result<()> {
        self.ensure_open()?;
        let encoded = self
            .store
            .get(source)?
            .context(FileNotFoundSnafu { name: source })?;
        self.store.put(dest, encoded)?;
        self.store.remove(source)?;
        debug!("renamed {} -> {}", source, dest);
        Ok(())
    }

    /// Durability belongs to the backing store; this exists only so the
    /// consumer's flush-then-sync protocol has something to call.
    pub fn sync<S: AsRef<str>>(&self, _names: &[S]) -> Result<()> {
        self.ensure_open()
    }

    /// The running capacity counter. Approximate by design; see the type
    /// docs.
    pub fn ram_bytes_used(&self) -> Result<i64> {
        self.ensure_open()?;
        Ok(self.size_in_bytes.load(Ordering::Relaxed))
    }

    /// Mutual exclusion for index writers, delegated to the injected
    /// factory.
    pub fn obtain_lock(&self, name: &str) -> Result<NamespaceLock> {
        self.ensure_open()?;
        Ok(self.lock_factory.obtain(name)?)
    }

    /// Marks this handle closed; every other operation fails afterwards.
    /// The shared store is left untouched, it outlives any one
    /// participant.
    pub fn close(&self) {
        self.open.store(false, Ordering::Release);
    }
}
