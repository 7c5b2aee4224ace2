//! Chain core: canonical digests, proof-of-work, blocks and the ledger that
//! links them, plus the storage seam the ledger persists through.

pub mod block;
pub mod constants;
pub mod digest;
pub mod error;
pub mod family;
pub mod fee;
pub mod ledger;
pub mod pow;
pub mod store;
pub mod transaction;

pub use block::{Block, Payload};
pub use error::{LedgerError, Result};
pub use fee::{FeeSource, FixedFee, RandomFee};
pub use ledger::{Ledger, LedgerConfig, Transfer};
pub use store::{BlockStore, MemoryStore};
pub use transaction::Transaction;
