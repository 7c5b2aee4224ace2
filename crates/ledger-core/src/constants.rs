pub const HASH_SIZE: usize = 32;
pub const HASH_HEX_SIZE: usize = HASH_SIZE * 2;
pub const DIFFICULTY_PREFIX: &str = "0000";
pub const GENESIS_INDEX: u64 = 1;
pub const GENESIS_PROOF: u64 = 1;
pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_DATA: &str = "genesis block";
pub const DEFAULT_FEE_ADDRESS: &str = "fee_address";
pub const FEE_PERCENT_MIN: f64 = 0.25;
pub const FEE_PERCENT_MAX: f64 = 2.5;
