use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::constants::{GENESIS_DATA, GENESIS_INDEX, GENESIS_PREVIOUS_HASH, GENESIS_PROOF};
use crate::digest;
use crate::error::Result;
use crate::transaction::Transaction;

/// Block body. Serialized flattened into the block, so a block object carries
/// either a `"data"` or a `"transactions"` key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Data(String),
    Transactions(Vec<Transaction>),
}

impl Payload {
    /// Text form fed to the proof-of-work puzzle. Free text is used verbatim,
    /// a transaction list as its canonical JSON.
    pub fn canonical_string(&self) -> Result<String> {
        match self {
            Payload::Data(data) => Ok(data.clone()),
            Payload::Transactions(txs) => digest::canonical_string(txs),
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        match self {
            Payload::Data(_) => &[],
            Payload::Transactions(txs) => txs,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub timestamp: u64,
    #[serde(flatten)]
    pub payload: Payload,
    pub proof: u64,
    pub previous_hash: String,
}

impl Block {
    pub fn new(index: u64, previous_hash: impl Into<String>, proof: u64, payload: Payload) -> Self {
        Self {
            index,
            timestamp: unix_now(),
            payload,
            proof,
            previous_hash: previous_hash.into(),
        }
    }

    pub fn genesis() -> Self {
        Self::new(
            GENESIS_INDEX,
            GENESIS_PREVIOUS_HASH,
            GENESIS_PROOF,
            Payload::Data(GENESIS_DATA.to_string()),
        )
    }

    /// Hex SHA-256 over the canonical, key-sorted JSON of the whole block.
    pub fn digest(&self) -> Result<String> {
        digest::digest(self)
    }

    pub fn transactions(&self) -> &[Transaction] {
        self.payload.transactions()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
