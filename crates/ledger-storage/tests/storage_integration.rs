mod helpers;

use helpers::{create_temp_dir, create_temp_store, teardown_store};
use ledger_core::store::{block_key, height_key};
use ledger_core::{Block, BlockStore, FixedFee, Ledger, LedgerConfig, LedgerError, Payload};
use ledger_storage::SledStore;
use std::sync::Arc;

#[tokio::test]
async fn test_storage_put_and_entries() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    store.put(b"b", b"2")?;
    store.put(b"a", b"1")?;
    store.put(b"a", b"3")?;
    store.flush()?;
    let mut entries = store.entries()?;
    entries.sort();
    assert_eq!(
        entries,
        vec![(b"a".to_vec(), b"3".to_vec()), (b"b".to_vec(), b"2".to_vec())]
    );
    assert_eq!(store.len(), 2);
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_storage_empty_database() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    assert!(store.is_empty());
    assert!(store.entries()?.is_empty());

    // Opening a ledger writes genesis and its height pointer
    let store = Arc::new(store);
    let ledger = Ledger::open(store.clone(), LedgerConfig::default())?;
    assert_eq!(ledger.len(), 1);
    assert_eq!(store.len(), 2);
    let genesis = ledger.previous_block().clone();
    drop(ledger);

    let store = Arc::try_unwrap(store).map_err(|_| anyhow::anyhow!("store still shared"))?;
    let pointer = store
        .entries()?
        .into_iter()
        .find(|(k, _)| k == &height_key(1))
        .map(|(_, v)| v)
        .expect("height pointer for genesis");
    assert_eq!(pointer, genesis.digest()?.into_bytes());
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_ledger_persistence_round_trip() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();
    let original = {
        let store = Arc::new(SledStore::open(&db_path)?);
        let mut ledger =
            Ledger::open(store, LedgerConfig::default())?.with_fee_source(FixedFee(1.0));
        ledger.mine_block("hello")?;
        ledger.add_transaction("faucet", "alice", 100.0);
        ledger.mine_transaction_block()?;
        ledger.send_money("alice", "bob", 12.5)?;
        ledger.mine_transaction_block()?;
        assert!(ledger.is_chain_valid());
        ledger.chain().to_vec()
        // store dropped here -> lock released
    };

    let store = Arc::new(SledStore::open(&db_path)?);
    let reopened = Ledger::open(store, LedgerConfig::default())?;
    assert_eq!(reopened.chain(), original.as_slice());
    assert!(reopened.is_chain_valid());
    assert_eq!(reopened.balance("bob"), 12.5);
    assert_eq!(reopened.balance("fee_address"), 0.125);
    assert_eq!(reopened.balance("alice"), 100.0 - 12.5 - 0.125);
    drop(reopened);

    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_storage_layout() -> anyhow::Result<()> {
    let (temp_dir, store) = create_temp_store();
    let store = Arc::new(store);
    let mut ledger = Ledger::open(store.clone(), LedgerConfig::default())?;
    let block = ledger.mine_block("layout")?;
    drop(ledger);

    let entries = store.entries()?;
    assert_eq!(entries.len(), 4);
    let digest = block.digest()?;
    let value = entries
        .iter()
        .find(|(k, _)| k == &block_key(&digest))
        .map(|(_, v)| v.clone())
        .expect("block stored under its digest");
    let decoded: Block = serde_json::from_slice(&value)?;
    assert_eq!(decoded, block);
    assert_eq!(decoded.payload, Payload::Data("layout".into()));
    assert!(std::str::from_utf8(&value)?.starts_with(r#"{"data":"layout","index":2,"#));

    let store = Arc::try_unwrap(store).map_err(|_| anyhow::anyhow!("store still shared"))?;
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_storage_data_integrity() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();

    // 1) Write a valid chain
    let digest = {
        let store = Arc::new(SledStore::open(&db_path)?);
        let mut ledger = Ledger::open(store, LedgerConfig::default())?;
        ledger.mine_block("precious")?.digest()?
    };

    // 2) Reopen raw sled and overwrite the block with invalid bytes
    {
        let sled_db = sled::open(&db_path)?;
        let blocks = sled_db.open_tree("blocks")?;
        let previous = blocks.insert(block_key(&digest), vec![0u8; 10])?;
        assert!(previous.is_some(), "Expected to overwrite the stored block");
        sled_db.flush()?;
    }

    // 3) Reopening the ledger must refuse the damaged store
    let store = Arc::new(SledStore::open(&db_path)?);
    let result = Ledger::open(store, LedgerConfig::default());
    assert!(matches!(result, Err(LedgerError::Encoding(_))));

    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_storage_repeated_open_close() -> anyhow::Result<()> {
    let (temp_dir, db_path) = create_temp_dir();
    for round in 0..3u64 {
        let store = Arc::new(SledStore::open(&db_path)?);
        let mut ledger = Ledger::open(store, LedgerConfig::default())?;
        assert_eq!(ledger.len() as u64, round + 1);
        assert!(ledger.is_chain_valid());
        ledger.mine_block(format!("round {round}"))?;
    } // Store goes out of scope and is closed here
    let store = Arc::new(SledStore::open(&db_path)?);
    let ledger = Ledger::open(store, LedgerConfig::default())?;
    assert_eq!(ledger.len(), 4);
    assert!(ledger.is_chain_valid());
    drop(ledger);
    temp_dir.close()?;
    Ok(())
}

#[tokio::test]
async fn test_storage_concurrency() -> anyhow::Result<()> {
    use tokio::task;
    let (temp_dir, store) = create_temp_store();
    let store = Arc::new(store);
    let mut handles = Vec::new();
    // Concurrently write keys
    for i in 0..50u64 {
        let store_clone = Arc::clone(&store);
        handles.push(task::spawn(async move {
            store_clone
                .put(&height_key(i), format!("value-{i}").as_bytes())
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await?;
    }
    store.flush()?;
    assert_eq!(store.entries()?.len(), 50);
    let store = Arc::try_unwrap(store).map_err(|_| anyhow::anyhow!("store still shared"))?;
    teardown_store(temp_dir, store);
    Ok(())
}

#[tokio::test]
async fn test_temporary_store() -> anyhow::Result<()> {
    let store = Arc::new(SledStore::temporary()?);
    let mut ledger = Ledger::open(store, LedgerConfig::default())?;
    ledger.mine_block("scratch")?;
    assert_eq!(ledger.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_storage_trait_compliance() -> anyhow::Result<()> {
    fn assert_block_store<T: BlockStore>() {}
    assert_block_store::<SledStore>();
    Ok(())
}
