//! Persistence seam between the ledger and a durable key-value backend.

use anyhow::Result;
use std::collections::HashMap;
use std::sync::RwLock;

pub const BLOCK_PREFIX: &str = "block/";
pub const HEIGHT_PREFIX: &str = "height/";

/// Durable byte map the ledger writes blocks into.
///
/// `entries` makes no promise about ordering; the ledger derives chain order
/// from its own height keys.
pub trait BlockStore: Send + Sync {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;
    fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
    fn flush(&self) -> Result<()>;
}

pub fn block_key(digest: &str) -> Vec<u8> {
    format!("{BLOCK_PREFIX}{digest}").into_bytes()
}

/// Zero-padded so lexical and numeric order agree.
pub fn height_key(index: u64) -> Vec<u8> {
    format!("{HEIGHT_PREFIX}{index:020}").into_bytes()
}

/// Process-local store, used by tests and by nodes run without a data dir.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.read().map(|m| m.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlockStore for MemoryStore {
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut map = self
            .map
            .write()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        map.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let map = self
            .map
            .read()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
