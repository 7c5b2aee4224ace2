use clap::Parser;
use ledger_core::Ledger;
use ledger_node::{router, serve, AppState, Args};
use ledger_storage::SledStore;
use std::{net::SocketAddr, sync::Arc};
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let store = Arc::new(SledStore::open(&args.data_dir)?);
    let ledger = Ledger::open(store, args.ledger_config())?;

    let app = router(AppState::new(ledger));
    let addr: SocketAddr = args.listen.parse()?;
    serve(tokio::net::TcpListener::bind(addr).await?, app).await
}
