use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use snafu::ensure;
use strum_macros::EnumString;
use tracing::debug;

pub mod err;
pub mod lock;
pub mod mem;

pub use err::{Error, Result};
pub use lock::{LockFactory, NamespaceLock, SingleInstanceLockFactory};
pub use mem::MemoryMap;

use err::UnsupportedStoreDsnSnafu;

/// The distributed associative store the namespace manager publishes into:
/// a map from file name to the file's serialized snapshot. Values are
/// opaque bytes here; the wire layout belongs to the codec. Implementations
/// own their own timeout and retry policy, every call is synchronous, and a
/// `put`/`get` pair must round-trip values byte-exact.
pub trait ClusterMap: Send + Sync + 'static {
    fn get(&self, name: &str) -> Result<Option<Bytes>>;
    fn put(&self, name: &str, value: Bytes) -> Result<()>;
    fn remove(&self, name: &str) -> Result<Option<Bytes>>;
    fn contains_key(&self, name: &str) -> Result<bool>;
    fn key_set(&self) -> Result<Vec<String>>;
    fn len(&self) -> Result<usize>;
    fn clear(&self) -> Result<()>;
}

pub type ClusterMapRef = Arc<dyn ClusterMap>;

#[derive(Debug, EnumString)]
enum StoreKinds {
    #[strum(serialize = "mem", serialize = "memory")]
    Memory,
}

impl StoreKinds {
    fn build(&self, path: &str) -> ClusterMapRef {
        match self {
            StoreKinds::Memory => {
                debug!("store [memory] is built with map name: {}", path);
                Arc::new(MemoryMap::new(path))
            }
        }
    }
}

/// Opens a map backend from a `kind://:path` dsn, e.g. `mem://:kura`.
pub fn open_store(dsn: &str) -> Result<ClusterMapRef> {
    let x = dsn.splitn(2, "://:").collect::<Vec<_>>();
    ensure!(x.len() == 2, UnsupportedStoreDsnSnafu { dsn });
    let kind = StoreKinds::from_str(x[0]).map_err(|_| {
        UnsupportedStoreDsnSnafu { dsn }.build()
    })?;
    Ok(kind.build(x[1]))
}
