use anyhow::{Context, Result};
use ledger_core::BlockStore;
use sled::{Db, Tree};
use std::path::Path;
use tracing::info;

const TREE_BLOCKS: &str = "blocks";

/// sled-backed [`BlockStore`]. All ledger keys live in the `blocks` tree.
#[derive(Clone)]
pub struct SledStore {
  db: Db,
  blocks: Tree,
}

impl SledStore {
  pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let db = sled::open(path).with_context(|| format!("opening sled at {}", path.display()))?;
    let blocks = db.open_tree(TREE_BLOCKS).context("opening blocks tree")?;
    info!(path = %path.display(), "sled store opened");
    Ok(Self { db, blocks })
  }

  /// Throwaway store that lives only as long as the process.
  pub fn temporary() -> Result<Self> {
    let db = sled::Config::new().temporary(true).open()?;
    let blocks = db.open_tree(TREE_BLOCKS)?;
    Ok(Self { db, blocks })
  }

  pub fn len(&self) -> usize {
    self.blocks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.blocks.is_empty()
  }

  pub fn clear(&self) -> Result<()> {
    self.blocks.clear()?;
    self.db.flush()?;
    Ok(())
  }
}

impl BlockStore for SledStore {
  fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
    self.blocks.insert(key, value)?;
    Ok(())
  }

  fn entries(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
    self
      .blocks
      .iter()
      .map(|kv| -> Result<(Vec<u8>, Vec<u8>)> {
        let (k, v) = kv?;
        Ok((k.to_vec(), v.to_vec()))
      })
      .collect()
  }

  fn flush(&self) -> Result<()> {
    self.db.flush()?;
    Ok(())
  }
}
