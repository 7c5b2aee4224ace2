use anyhow::Context;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::block::{Block, Payload};
use crate::constants::{DEFAULT_FEE_ADDRESS, GENESIS_INDEX};
use crate::digest::canonical_json;
use crate::error::{LedgerError, Result};
use crate::fee::{fee_for, FeeSource, RandomFee};
use crate::pow;
use crate::store::{block_key, height_key, BlockStore, BLOCK_PREFIX, HEIGHT_PREFIX};
use crate::transaction::Transaction;

#[derive(Clone, Debug)]
pub struct LedgerConfig {
    /// Account that collects transfer fees.
    pub fee_address: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            fee_address: DEFAULT_FEE_ADDRESS.to_string(),
        }
    }
}

/// The pair of transactions staged by a successful [`Ledger::send_money`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Transfer {
    pub transfer: Transaction,
    pub fee: Transaction,
}

/// Single-writer chain plus its pending transaction pool.
///
/// Every append is written to the store before it becomes visible in memory,
/// so a failed write leaves the chain and the pool as they were.
pub struct Ledger<S: BlockStore> {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    store: Arc<S>,
    fee_source: Box<dyn FeeSource>,
    config: LedgerConfig,
}

impl<S: BlockStore> Ledger<S> {
    /// Replay `store` into memory, or write a fresh genesis block if it is empty.
    pub fn open(store: Arc<S>, config: LedgerConfig) -> Result<Self> {
        let chain = load_chain(store.as_ref())?;
        let mut ledger = Self {
            chain,
            pending: Vec::new(),
            store,
            fee_source: Box::new(RandomFee),
            config,
        };

        if ledger.chain.is_empty() {
            let genesis = Block::genesis();
            ledger.persist(&genesis)?;
            ledger.chain.push(genesis);
            info!("created genesis block");
        } else {
            info!(height = ledger.chain.len(), "chain loaded from store");
        }
        Ok(ledger)
    }

    pub fn with_fee_source(mut self, source: impl FeeSource + 'static) -> Self {
        self.fee_source = Box::new(source);
        self
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: genesis is created on open.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn previous_block(&self) -> &Block {
        // open() guarantees at least the genesis block
        &self.chain[self.chain.len() - 1]
    }

    pub fn mine_block(&mut self, data: impl Into<String>) -> Result<Block> {
        self.mine(Payload::Data(data.into()))
    }

    /// Mine the pending pool into a block and clear the pool.
    pub fn mine_transaction_block(&mut self) -> Result<Block> {
        let block = self.mine(Payload::Transactions(self.pending.clone()))?;
        self.pending.clear();
        Ok(block)
    }

    /// Stage a transaction without any balance check. Returns the index of the
    /// block that will hold it once mined.
    pub fn add_transaction(
        &mut self,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
    ) -> u64 {
        let tx = Transaction::new(sender, recipient, amount);
        debug!(sender = %tx.sender, recipient = %tx.recipient, amount, "transaction staged");
        self.pending.push(tx);
        self.previous_block().index + 1
    }

    /// Stage a transfer and its fee, provided `sender` can cover both.
    pub fn send_money(&mut self, sender: &str, recipient: &str, amount: f64) -> Result<Transfer> {
        if !amount.is_finite() {
            return Err(LedgerError::InvalidAmount { amount });
        }
        let available = self.balance(sender);
        let fee = fee_for(amount, self.fee_source.fee_percent());
        let needed = amount + fee;
        if available < needed {
            warn!(sender, needed, available, "transfer rejected");
            return Err(LedgerError::InsufficientFunds { needed, available });
        }

        let transfer = Transaction::new(sender, recipient, amount);
        let fee = Transaction::new(sender, self.config.fee_address.clone(), fee);
        self.pending.push(transfer.clone());
        self.pending.push(fee.clone());
        debug!(sender, recipient, amount, fee = fee.amount, "transfer staged");
        Ok(Transfer { transfer, fee })
    }

    /// Net of all mined transactions touching `address`. Data blocks carry no
    /// transactions and contribute nothing; the pending pool is not counted.
    pub fn balance(&self, address: &str) -> f64 {
        self.chain
            .iter()
            .flat_map(Block::transactions)
            .map(|tx| tx.delta_for(address))
            .sum()
    }

    /// Check hash links and proofs from the second block on, stopping at the
    /// first failure.
    pub fn validate(&self) -> Result<()> {
        for pair in self.chain.windows(2) {
            let (previous, block) = (&pair[0], &pair[1]);
            if block.previous_hash != previous.digest()? {
                return Err(invalid(block.index, "does not link to the preceding block"));
            }
            let payload = block.payload.canonical_string()?;
            if !pow::is_valid_proof(previous.proof, block.index, &payload, block.proof) {
                return Err(invalid(block.index, "has an invalid proof of work"));
            }
        }
        Ok(())
    }

    pub fn is_chain_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(err) => {
                warn!(%err, "chain validation failed");
                false
            }
        }
    }

    fn mine(&mut self, payload: Payload) -> Result<Block> {
        // JSON has no encoding for NaN or infinity; such a block could not be reloaded
        if let Some(tx) = payload.transactions().iter().find(|tx| !tx.amount.is_finite()) {
            warn!(amount = tx.amount, "refusing to mine non-finite amount");
            return Err(LedgerError::InvalidAmount { amount: tx.amount });
        }
        let previous = self.previous_block();
        let index = self.chain.len() as u64 + 1;
        let previous_hash = previous.digest()?;
        let proof = pow::solve(previous.proof, index, &payload.canonical_string()?);

        let block = Block::new(index, previous_hash, proof, payload);
        self.persist(&block)?;
        self.chain.push(block.clone());
        info!(index, proof, txs = block.transactions().len(), "block appended");
        Ok(block)
    }

    /// Block value first, then its height pointer. The pointer is the commit
    /// record: a block without one is ignored on reload.
    fn persist(&self, block: &Block) -> Result<()> {
        let digest = block.digest()?;
        let value = canonical_json(block)?;
        let write = || -> anyhow::Result<()> {
            self.store
                .put(&block_key(&digest), &value)
                .with_context(|| format!("writing block {}", block.index))?;
            self.store
                .put(&height_key(block.index), digest.as_bytes())
                .with_context(|| format!("writing height pointer {}", block.index))?;
            self.store.flush().context("flushing block store")?;
            Ok(())
        };
        write().map_err(LedgerError::Persistence)
    }
}

fn invalid(index: u64, reason: &str) -> LedgerError {
    LedgerError::InvalidChain {
        index,
        reason: reason.to_string(),
    }
}

/// Rebuild the chain from height pointers. Never relies on the order in which
/// the store yields its entries.
fn load_chain<S: BlockStore + ?Sized>(store: &S) -> Result<Vec<Block>> {
    let entries = store.entries().map_err(LedgerError::Persistence)?;

    let mut blocks: HashMap<String, Vec<u8>> = HashMap::new();
    let mut heights: BTreeMap<u64, String> = BTreeMap::new();
    for (key, value) in entries {
        let Ok(key) = std::str::from_utf8(&key) else {
            continue;
        };
        if let Some(digest) = key.strip_prefix(BLOCK_PREFIX) {
            blocks.insert(digest.to_string(), value);
        } else if let Some(height) = key.strip_prefix(HEIGHT_PREFIX) {
            let height: u64 = height
                .parse()
                .map_err(|_| LedgerError::Corrupt(format!("bad height key {key}")))?;
            let digest = String::from_utf8(value)
                .map_err(|_| LedgerError::Corrupt(format!("bad digest under {key}")))?;
            heights.insert(height, digest);
        }
    }

    let mut chain = Vec::with_capacity(heights.len());
    for (expected, (height, digest)) in (GENESIS_INDEX..).zip(heights) {
        if height != expected {
            return Err(LedgerError::Corrupt(format!(
                "missing block at height {expected}"
            )));
        }
        let bytes = blocks.get(&digest).ok_or_else(|| {
            LedgerError::Corrupt(format!("height {height} points at unknown block {digest}"))
        })?;
        let block: Block = serde_json::from_slice(bytes)?;
        if block.index != height {
            return Err(LedgerError::Corrupt(format!(
                "block stored at height {height} has index {}",
                block.index
            )));
        }
        if block.digest()? != digest {
            return Err(LedgerError::Corrupt(format!(
                "block at height {height} does not match its digest"
            )));
        }
        chain.push(block);
    }
    Ok(chain)
}
