//! CLI commands for the multisig wallet
//!
//! Each command loads the wallet, performs one operation on behalf of the
//! `--caller` identity, and saves the result.

use crate::multisig::{EffectMode, EngineConfig, MultisigEngine, TxState};
use crate::storage::{Storage, StorageConfig, WalletState};
use std::path::{Path, PathBuf};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub wallet: WalletState,
    pub storage: Storage,
}

impl AppState {
    /// Load an existing wallet from the data directory
    pub fn new(data_dir: PathBuf) -> CliResult<Self> {
        let storage = open_storage(&data_dir)?;

        if !storage.exists() {
            return Err(format!(
                "no wallet in {:?}; create one with: multisig init --owners <a,b,c> --threshold <m>",
                data_dir
            )
            .into());
        }

        let wallet = storage.load()?;
        log::debug!("Loaded wallet {} from {:?}", wallet.engine.address(), data_dir);

        Ok(Self { wallet, storage })
    }

    /// Save the current state
    pub fn save(&self) -> CliResult<()> {
        self.storage.save(&self.wallet)?;
        Ok(())
    }
}

/// Parse a hex payload, with or without a `0x` prefix
pub fn parse_data(data: Option<&str>) -> CliResult<Vec<u8>> {
    match data {
        None => Ok(Vec::new()),
        Some(s) => {
            let s = s.trim();
            let s = s.strip_prefix("0x").unwrap_or(s);
            Ok(hex::decode(s).map_err(|e| format!("invalid hex payload: {}", e))?)
        }
    }
}

/// Create a new wallet
pub fn cmd_init(
    data_dir: &Path,
    owners: &[String],
    threshold: usize,
    effect: EffectMode,
    call_function: Option<String>,
    force: bool,
) -> CliResult<()> {
    let storage = open_storage(data_dir)?;

    if storage.exists() && !force {
        println!("⚠️  Wallet already exists at {:?}", data_dir);
        println!("   Use --force to reinitialize (this will delete existing data)");
        return Ok(());
    }

    let mut config = EngineConfig {
        effect,
        ..Default::default()
    };
    if let Some(function) = call_function {
        config.call_function = function;
    }

    let engine = MultisigEngine::with_owners(owners, threshold, config)?;
    let state = WalletState::new(engine);
    storage.save(&state)?;

    let engine = &state.engine;
    println!("✅ Multisig wallet initialized!");
    println!("   📁 Data directory: {:?}", data_dir);
    println!("   📍 Address: {}", engine.address());
    println!("   🔐 Policy: {}", engine.registry().description());
    println!("   ⚙️  Effect: {}", engine.config().effect);
    for owner in engine.registry().owners() {
        println!("   └─ Owner: {}", owner);
    }

    Ok(())
}

/// Send coins into the wallet
pub fn cmd_deposit(state: &mut AppState, caller: &str, amount: u64) -> CliResult<()> {
    state.wallet.engine.receive(caller, amount)?;
    state.save()?;

    println!("📥 Deposited {} coins from {}", amount, caller);
    println!("   💰 Wallet balance: {}", state.wallet.engine.balance());
    Ok(())
}

/// Submit a new transaction
pub fn cmd_submit(
    state: &mut AppState,
    caller: &str,
    to: &str,
    value: u64,
    data: Option<&str>,
) -> CliResult<()> {
    let data = parse_data(data)?;
    let id = state.wallet.engine.submit(caller, to, value, data)?;
    state.save()?;

    println!("📝 Transaction submitted!");
    println!("   ID: {}", id);
    println!("   To: {}", to);
    println!("   Value: {} coins", value);
    println!(
        "   Approvals needed: {}",
        state.wallet.engine.threshold()
    );
    Ok(())
}

/// Approve a transaction
pub fn cmd_approve(state: &mut AppState, caller: &str, id: u64) -> CliResult<()> {
    state.wallet.engine.approve(caller, id)?;
    state.save()?;

    let engine = &state.wallet.engine;
    println!("✍️  {} approved transaction {}", caller, id);
    println!(
        "   Approvals: {}/{}",
        engine.approval_count(id),
        engine.threshold()
    );
    if engine.is_executable(id) {
        println!("   ✅ Ready to execute");
    }
    Ok(())
}

/// Execute a transaction
pub fn cmd_execute(state: &mut AppState, caller: &str, id: u64) -> CliResult<()> {
    let WalletState { engine, host } = &mut state.wallet;
    engine.execute(caller, id, host)?;
    state.save()?;

    let tx = state.wallet.engine.transaction(id)?;
    println!("🚀 Transaction {} executed!", id);
    println!("   To: {}", tx.to);
    println!("   Value: {} coins", tx.value);
    println!(
        "   💰 Wallet balance: {}",
        state.wallet.engine.balance()
    );
    Ok(())
}

/// Revoke an approval
pub fn cmd_revoke(state: &mut AppState, caller: &str, id: u64) -> CliResult<()> {
    state.wallet.engine.revoke(caller, id)?;
    state.save()?;

    println!("↩️  {} revoked approval of transaction {}", caller, id);
    println!(
        "   Approvals: {}/{}",
        state.wallet.engine.approval_count(id),
        state.wallet.engine.threshold()
    );
    Ok(())
}

/// Display wallet info
pub fn cmd_info(state: &AppState) -> CliResult<()> {
    let engine = &state.wallet.engine;
    let pending = engine.pending().count();

    println!("🔐 Multisig Wallet");
    println!("   ├─ Address: {}", engine.address());
    println!("   ├─ Policy: {}", engine.registry().description());
    println!("   ├─ Effect: {}", engine.config().effect);
    println!("   ├─ Balance: {} coins", engine.balance());
    println!("   ├─ Transactions: {} ({} pending)", engine.transaction_count(), pending);
    println!("   └─ Owners:");
    for owner in engine.registry().owners() {
        println!("      └─ {}", owner);
    }
    Ok(())
}

/// Display one transaction
pub fn cmd_tx(state: &AppState, id: u64) -> CliResult<()> {
    let status = state.wallet.engine.status(id)?;
    let tx = &status.transaction;

    println!("📄 Transaction {}", id);
    println!("   ├─ To: {}", tx.to);
    println!("   ├─ Value: {} coins", tx.value);
    println!("   ├─ Data: 0x{}", hex::encode(&tx.data));
    println!("   ├─ State: {:?}", status.state);
    println!("   ├─ Approvals: {}/{}", status.approvals, status.threshold);
    println!("   └─ Approved by: {}", status.approved_by.join(", "));
    Ok(())
}

/// List transactions
pub fn cmd_list(state: &AppState, pending_only: bool) -> CliResult<()> {
    let engine = &state.wallet.engine;

    if engine.transaction_count() == 0 {
        println!("📭 No transactions yet. Submit one with: multisig submit");
        return Ok(());
    }

    println!("📋 Transactions:");
    for tx in engine.transactions() {
        let status = engine.status(tx.id)?;
        if pending_only && status.state == TxState::Executed {
            continue;
        }
        println!(
            "   #{} | {} coins -> {} | {:?} | {}/{}",
            tx.id, tx.value, tx.to, status.state, status.approvals, status.threshold
        );
    }
    Ok(())
}

/// Show the event journal
pub fn cmd_events(state: &AppState, from: u64) -> CliResult<()> {
    let records = state.wallet.engine.events_since(from);

    println!("📜 Events (from #{}):", from);
    for record in records {
        println!(
            "   #{} | {} | {}",
            record.sequence,
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            serde_json::to_string(&record.event)?
        );
    }
    Ok(())
}

/// Show coins paid out by executed transactions
pub fn cmd_payouts(state: &AppState) -> CliResult<()> {
    let host = &state.wallet.host;

    println!("💸 Payouts:");
    for (address, amount) in host.balances() {
        println!("   {} - {} coins", address, amount);
    }
    if !host.calls().is_empty() {
        println!("\n   Calls:");
        for call in host.calls() {
            println!(
                "   └─ {}.{}(0x{}) with {} coins",
                call.to,
                call.function,
                hex::encode(&call.data),
                call.coins
            );
        }
    }
    Ok(())
}

/// Export wallet state to file
pub fn cmd_export(state: &AppState, path: &Path) -> CliResult<()> {
    crate::storage::save_to_file(&state.wallet, path)?;
    println!("📦 Wallet exported to {:?}", path);
    Ok(())
}

/// List the rotating backups kept next to the wallet
pub fn cmd_backups(data_dir: &Path) -> CliResult<()> {
    let storage = open_storage(data_dir)?;
    let backups = storage.list_backups();

    if backups.is_empty() {
        println!("📭 No backups in {:?}", data_dir);
        return Ok(());
    }

    println!("🗄️  Backups (0 is the most recent):");
    for index in backups {
        match storage.restore_backup(index) {
            Ok(wallet) => println!(
                "   #{} | {} transactions | balance {} | {} events",
                index,
                wallet.engine.transaction_count(),
                wallet.engine.balance(),
                wallet.engine.events().len()
            ),
            Err(e) => println!("   #{} | unreadable: {}", index, e),
        }
    }
    Ok(())
}

/// Replace the wallet with one of its backups
///
/// The current wallet becomes backup 0, so a restore can be undone.
pub fn cmd_restore(data_dir: &Path, index: usize) -> CliResult<()> {
    let storage = open_storage(data_dir)?;
    let wallet = storage.restore_backup(index)?;
    storage.save(&wallet)?;

    println!("♻️  Wallet restored from backup #{}", index);
    println!("   Address: {}", wallet.engine.address());
    println!("   Transactions: {}", wallet.engine.transaction_count());
    println!("   💰 Balance: {}", wallet.engine.balance());
    Ok(())
}

fn open_storage(data_dir: &Path) -> CliResult<Storage> {
    Ok(Storage::new(StorageConfig {
        data_dir: data_dir.to_path_buf(),
        ..Default::default()
    })?)
}

/// Import wallet state from file
pub fn cmd_import(data_dir: &Path, path: &Path) -> CliResult<()> {
    let wallet = crate::storage::load_from_file(path)?;
    open_storage(data_dir)?.save(&wallet)?;

    println!("📥 Wallet imported from {:?}", path);
    println!("   Address: {}", wallet.engine.address());
    println!("   Transactions: {}", wallet.engine.transaction_count());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owners() -> Vec<String> {
        vec!["alice".to_string(), "bob".to_string(), "carol".to_string()]
    }

    #[test]
    fn test_parse_data() {
        assert_eq!(parse_data(None).unwrap(), Vec::<u8>::new());
        assert_eq!(parse_data(Some("0xdead")).unwrap(), vec![0xde, 0xad]);
        assert_eq!(parse_data(Some("BEEF")).unwrap(), vec![0xbe, 0xef]);
        assert!(parse_data(Some("xyz")).is_err());
    }

    #[test]
    fn test_load_requires_init() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(AppState::new(temp_dir.path().to_path_buf()).is_err());
    }

    #[test]
    fn test_command_flow_persists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();

        cmd_init(&dir, &owners(), 2, EffectMode::Transfer, None, false).unwrap();

        let mut state = AppState::new(dir.clone()).unwrap();
        cmd_deposit(&mut state, "funder", 500).unwrap();
        cmd_submit(&mut state, "alice", "dave", 100, Some("0x01")).unwrap();
        cmd_approve(&mut state, "alice", 0).unwrap();
        assert!(cmd_execute(&mut state, "alice", 0).is_err());
        cmd_approve(&mut state, "bob", 0).unwrap();
        cmd_execute(&mut state, "carol", 0).unwrap();

        let reloaded = AppState::new(dir).unwrap();
        assert!(reloaded.wallet.engine.transaction(0).unwrap().executed);
        assert_eq!(reloaded.wallet.engine.balance(), 400);
        assert_eq!(reloaded.wallet.host.balance_of("dave"), 100);
    }

    #[test]
    fn test_restore_backup() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();

        cmd_init(&dir, &owners(), 2, EffectMode::Transfer, None, false).unwrap();
        let mut state = AppState::new(dir.clone()).unwrap();
        cmd_deposit(&mut state, "funder", 10).unwrap();
        cmd_deposit(&mut state, "funder", 5).unwrap();
        cmd_backups(&dir).unwrap();

        // Backup 0 holds the wallet as it was before the second deposit
        cmd_restore(&dir, 0).unwrap();
        let restored = AppState::new(dir.clone()).unwrap();
        assert_eq!(restored.wallet.engine.balance(), 10);

        assert!(cmd_restore(&dir, 4).is_err());
    }

    #[test]
    fn test_import_rejects_invalid_wallet() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("wallet");
        let file = temp_dir.path().join("import.json");

        let engine = MultisigEngine::with_owners(&owners(), 2, EngineConfig::default()).unwrap();
        let mut json = serde_json::to_value(WalletState::new(engine)).unwrap();
        json["engine"]["registry"]["threshold"] = serde_json::json!(0);
        std::fs::write(&file, serde_json::to_vec(&json).unwrap()).unwrap();

        assert!(cmd_import(&dir, &file).is_err());
        assert!(AppState::new(dir).is_err());
    }

    #[test]
    fn test_init_does_not_overwrite() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().to_path_buf();

        cmd_init(&dir, &owners(), 2, EffectMode::Transfer, None, false).unwrap();
        cmd_init(&dir, &owners(), 1, EffectMode::Call, None, false).unwrap();

        let state = AppState::new(dir).unwrap();
        assert_eq!(state.wallet.engine.threshold(), 2);
    }
}
