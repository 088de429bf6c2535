use serde::{Deserialize, Serialize};

/// Settings for opening a namespace. The dsn picks the map backend and the
/// map it publishes into, `kind://:name` (see `kura_store::open_store`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    pub store_dsn: String,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            store_dsn: "mem://:kura-directory".to_string(),
        }
    }
}
