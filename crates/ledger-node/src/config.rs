use clap::Parser;
use ledger_core::constants::DEFAULT_FEE_ADDRESS;
use ledger_core::LedgerConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "ledger-node")]
#[command(about = "HTTP node for the proof-of-work ledger")]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080
    #[arg(long, env = "LEDGER_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Data directory for sled
    #[arg(long, env = "LEDGER_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Account credited with transfer fees
    #[arg(long, env = "LEDGER_FEE_ADDRESS", default_value = DEFAULT_FEE_ADDRESS)]
    pub fee_address: String,
}

impl Args {
    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            fee_address: self.fee_address.clone(),
        }
    }
}
